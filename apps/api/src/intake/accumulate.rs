//! Profile accumulator: classifies the fragments of one user turn and fills
//! empty profile fields.
//!
//! Priority per fragment: explicit label → email → phone → experience →
//! position / tech-stack / location keywords → full-name fallback.
//! This is a best-effort heuristic classifier, not a parser.

use crate::intake::extract::{extract_email, extract_experience, extract_phone};
use crate::intake::profile::{CandidateProfile, Field};

const POSITION_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "scientist",
    "analyst",
    "manager",
    "intern",
    "architect",
    "designer",
    "consultant",
    "administrator",
    "lead",
];

const TECH_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "sql",
    "postgresql",
    "mysql",
    "django",
    "flask",
    "fastapi",
    "react",
    "node",
    "pytorch",
    "tensorflow",
    "pandas",
    "numpy",
    "ml",
    "machine learning",
    "rust",
    "golang",
    "c++",
    "docker",
    "kubernetes",
    "aws",
    "spark",
];

const LOCATION_KEYWORDS: &[&str] = &[
    "nagpur",
    "pune",
    "mumbai",
    "delhi",
    "bangalore",
    "bengaluru",
    "hyderabad",
    "chennai",
    "kolkata",
    "remote",
    "india",
    "usa",
    "uk",
    "europe",
    "london",
    "berlin",
    "singapore",
    "canada",
    "germany",
    "new york",
    "san francisco",
    "seattle",
    "toronto",
];

/// Recognised `label:` prefixes, lower-cased.
const LABELS: &[(&str, Field)] = &[
    ("name", Field::FullName),
    ("full name", Field::FullName),
    ("email", Field::Email),
    ("e-mail", Field::Email),
    ("email address", Field::Email),
    ("phone", Field::Phone),
    ("phone number", Field::Phone),
    ("mobile", Field::Phone),
    ("contact number", Field::Phone),
    ("experience", Field::Experience),
    ("years of experience", Field::Experience),
    ("position", Field::Position),
    ("desired position", Field::Position),
    ("role", Field::Position),
    ("location", Field::Location),
    ("current location", Field::Location),
    ("city", Field::Location),
    ("tech stack", Field::TechStack),
    ("stack", Field::TechStack),
    ("skills", Field::TechStack),
];

const MAX_NAME_WORDS: usize = 5;

/// Categorical values collected across a turn, assigned once at the end.
#[derive(Default)]
struct Pending {
    position: Vec<String>,
    location: Vec<String>,
    tech_stack: Vec<String>,
}

impl Pending {
    fn push(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let bucket = match field {
            Field::Position => &mut self.position,
            Field::Location => &mut self.location,
            Field::TechStack => &mut self.tech_stack,
            _ => return,
        };
        bucket.push(value.to_string());
    }
}

/// Applies one user turn to the profile. Returns the fields this turn filled, in fill order.
///
/// Fields already set are never touched, so replaying a turn changes nothing.
pub fn accumulate(profile: &mut CandidateProfile, text: &str) -> Vec<Field> {
    let mut filled = Vec::new();
    let mut pending = Pending::default();

    for line in text.lines() {
        // Set after a `Tech stack:` label so the rest of that line follows it.
        let mut tech_continuation = false;

        for fragment in split_fragments(line) {
            if let Some((field, value)) = split_label(fragment) {
                tech_continuation = field == Field::TechStack;
                apply_labeled(profile, &mut pending, &mut filled, field, value);
                continue;
            }

            if let Some(email) = extract_email(fragment) {
                record(&mut filled, Field::Email, profile.fill_text(Field::Email, &email));
                continue;
            }
            if let Some(phone) = extract_phone(fragment) {
                record(&mut filled, Field::Phone, profile.fill_text(Field::Phone, &phone));
                continue;
            }
            if let Some(years) = extract_experience(fragment) {
                record(&mut filled, Field::Experience, profile.fill_experience(years));
                continue;
            }

            let lower = fragment.to_lowercase();
            if contains_any(&lower, POSITION_KEYWORDS) {
                pending.push(Field::Position, fragment);
            } else if contains_any(&lower, TECH_KEYWORDS) {
                pending.push(Field::TechStack, fragment);
            } else if contains_any(&lower, LOCATION_KEYWORDS) {
                pending.push(Field::Location, fragment);
            } else if tech_continuation {
                pending.push(Field::TechStack, fragment);
            } else if looks_like_name(fragment) {
                record(
                    &mut filled,
                    Field::FullName,
                    profile.fill_text(Field::FullName, &title_case(fragment)),
                );
            }
        }
    }

    for (field, values) in [
        (Field::Position, pending.position),
        (Field::Location, pending.location),
        (Field::TechStack, pending.tech_stack),
    ] {
        if !values.is_empty() {
            record(&mut filled, field, profile.fill_text(field, &values.join(", ")));
        }
    }

    filled
}

fn record(filled: &mut Vec<Field>, field: Field, stored: bool) {
    if stored {
        filled.push(field);
    }
}

fn apply_labeled(
    profile: &mut CandidateProfile,
    pending: &mut Pending,
    filled: &mut Vec<Field>,
    field: Field,
    value: &str,
) {
    match field {
        Field::FullName => {
            let stored = profile.fill_text(field, &title_case(value));
            record(filled, field, stored);
        }
        Field::Email => {
            if let Some(email) = extract_email(value) {
                record(filled, field, profile.fill_text(field, &email));
            }
        }
        Field::Phone => {
            if let Some(phone) = extract_phone(value) {
                record(filled, field, profile.fill_text(field, &phone));
            }
        }
        Field::Experience => {
            if let Some(years) = extract_experience(value) {
                record(filled, field, profile.fill_experience(years));
            }
        }
        Field::Position | Field::Location | Field::TechStack => pending.push(field, value),
    }
}

/// Comma separated pieces of one line, with list bullets and blanks removed.
fn split_fragments(line: &str) -> impl Iterator<Item = &str> {
    line.split(',')
        .map(|f| f.trim().trim_start_matches(|c: char| matches!(c, '-' | '*' | '•')).trim())
        .filter(|f| !f.is_empty())
}

fn split_label(fragment: &str) -> Option<(Field, &str)> {
    let (label, value) = fragment.split_once(':')?;
    let label = label.trim().to_lowercase();
    LABELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|&(_, field)| (field, value.trim()))
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| contains_word(lower, kw))
}

/// Whole-word containment, so "ml" does not fire inside "html" and "uk" not inside "ukulele".
fn contains_word(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn looks_like_name(fragment: &str) -> bool {
    let trimmed = fragment.trim();
    trimmed.contains(' ')
        && !trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed.split_whitespace().count() <= MAX_NAME_WORDS
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
