//! Field extractors: pure functions pulling a typed value out of free text.
//!
//! Each extractor is total: a miss is `None`, never an error.

use std::sync::LazyLock;

use regex::Regex;

/// `local@domain.tld`, tld alphabetic and at least two characters.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+\-]+@[a-zA-Z0-9\-]+(?:\.[a-zA-Z0-9\-]+)*\.[a-zA-Z]{2,}").unwrap()
});

/// Digit runs with optional leading `+` and common separators.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().\-]{7,}\d").unwrap());

/// A number annotated with years/yrs.
static EXPERIENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:years?|yrs?)\b").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

const MIN_PHONE_DIGITS: usize = 10;

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Returns the digits of the first phone-like run carrying at least ten digits.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find_iter(text).find_map(|m| {
        let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
        (digits.len() >= MIN_PHONE_DIGITS).then_some(digits)
    })
}

/// Years of experience. Prefers a number followed by "year(s)"/"yr(s)",
/// otherwise takes the first bare number in the text.
pub fn extract_experience(text: &str) -> Option<f64> {
    if let Some(years) = EXPERIENCE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        return Some(years);
    }
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_found_inside_sentence() {
        assert_eq!(
            extract_email("you can reach me at jane.doe+jobs@mail.example.org thanks"),
            Some("jane.doe+jobs@mail.example.org".to_string())
        );
    }

    #[test]
    fn test_email_prefers_first_occurrence() {
        assert_eq!(
            extract_email("a@first.com or b@second.com"),
            Some("a@first.com".to_string())
        );
    }

    #[test]
    fn test_email_missing() {
        assert_eq!(extract_email("no address here"), None);
        assert_eq!(extract_email("broken@domain"), None);
    }

    #[test]
    fn test_phone_normalizes_separators() {
        assert_eq!(
            extract_phone("+1 415 555 8899"),
            Some("14155558899".to_string())
        );
        assert_eq!(
            extract_phone("call (415) 555-8899 please"),
            Some("4155558899".to_string())
        );
        assert_eq!(
            extract_phone("98765.43210"),
            Some("9876543210".to_string())
        );
    }

    #[test]
    fn test_phone_requires_ten_digits() {
        assert_eq!(extract_phone("555-8899"), None);
        assert_eq!(extract_phone("123 456 789"), None);
        assert_eq!(extract_phone("2.5 years"), None);
    }

    #[test]
    fn test_phone_skips_short_runs_before_a_real_number() {
        assert_eq!(
            extract_phone("2019-2023, then 9876543210"),
            Some("9876543210".to_string())
        );
    }

    #[test]
    fn test_experience_annotated_years() {
        assert_eq!(extract_experience("2.5 years"), Some(2.5));
        assert_eq!(extract_experience("I have 3 yrs"), Some(3.0));
        assert_eq!(extract_experience("around 4 Years in industry"), Some(4.0));
        assert_eq!(extract_experience("1yr"), Some(1.0));
    }

    #[test]
    fn test_experience_prefers_annotated_over_bare_number() {
        assert_eq!(
            extract_experience("team of 12, 6 years total"),
            Some(6.0)
        );
    }

    #[test]
    fn test_experience_falls_back_to_bare_number() {
        assert_eq!(extract_experience("2"), Some(2.0));
        assert_eq!(extract_experience("about 0.5"), Some(0.5));
    }

    #[test]
    fn test_experience_missing() {
        assert_eq!(extract_experience("no numbers here"), None);
    }
}
