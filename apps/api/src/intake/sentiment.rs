//! Rule-based mood tag for the closing message. No external model.

const POSITIVE_WORDS: &[&str] = &[
    "great", "awesome", "good", "nice", "cool", "happy", "pleased", "delighted", "excellent",
    "wonderful", "love", "thanks", "thank", "you",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "sad", "upset", "angry", "frustrated", "terrible", "poor", "hate", "sorry", "issue",
    "problem",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

impl Mood {
    pub fn tag(&self) -> &'static str {
        match self {
            Mood::Positive => "🙂",
            Mood::Neutral => "😐",
            Mood::Negative => "😕",
        }
    }
}

/// Counts positive and negative words; a margin greater than one decides the mood.
pub fn rule_sentiment(text: &str) -> Mood {
    let (mut positive, mut negative) = (0i32, 0i32);
    for token in text.split_whitespace() {
        let token = token
            .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
            .to_lowercase();
        if POSITIVE_WORDS.contains(&token.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&token.as_str()) {
            negative += 1;
        }
    }
    match positive - negative {
        d if d > 1 => Mood::Positive,
        d if d < -1 => Mood::Negative,
        _ => Mood::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_needs_margin_above_one() {
        assert_eq!(rule_sentiment("great, thanks!"), Mood::Positive);
        assert_eq!(rule_sentiment("great"), Mood::Neutral);
    }

    #[test]
    fn test_negative() {
        assert_eq!(
            rule_sentiment("This was terrible and I am upset"),
            Mood::Negative
        );
    }

    #[test]
    fn test_mixed_is_neutral() {
        assert_eq!(rule_sentiment("good but bad"), Mood::Neutral);
        assert_eq!(Mood::Neutral.tag(), "😐");
    }
}
