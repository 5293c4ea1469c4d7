use serde::{Deserialize, Serialize};

/// One of the seven candidate fields, in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    Email,
    Phone,
    Experience,
    Position,
    Location,
    TechStack,
}

impl Field {
    /// Fixed priority order. Drives both the next question and the open slot shown to clients.
    pub const ORDER: [Field; 7] = [
        Field::FullName,
        Field::Email,
        Field::Phone,
        Field::Experience,
        Field::Position,
        Field::Location,
        Field::TechStack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Experience => "experience",
            Field::Position => "position",
            Field::Location => "location",
            Field::TechStack => "tech_stack",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::Experience => "Experience",
            Field::Position => "Position",
            Field::Location => "Location",
            Field::TechStack => "Tech Stack",
        }
    }
}

/// The candidate record. Fields only ever move from empty to set; restart
/// replaces the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<f64>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Option<String>,
}

impl CandidateProfile {
    /// Experience is checked by presence, so 0 years counts as set.
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Experience => self.experience.is_some(),
            other => self
                .text(other)
                .is_some_and(|v| !v.trim().is_empty()),
        }
    }

    pub fn is_complete(&self) -> bool {
        next_missing_field(self).is_none()
    }

    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::FullName => self.full_name.as_deref(),
            Field::Email => self.email.as_deref(),
            Field::Phone => self.phone.as_deref(),
            Field::Position => self.position.as_deref(),
            Field::Location => self.location.as_deref(),
            Field::TechStack => self.tech_stack.as_deref(),
            Field::Experience => None,
        }
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::FullName => Some(&mut self.full_name),
            Field::Email => Some(&mut self.email),
            Field::Phone => Some(&mut self.phone),
            Field::Position => Some(&mut self.position),
            Field::Location => Some(&mut self.location),
            Field::TechStack => Some(&mut self.tech_stack),
            Field::Experience => None,
        }
    }

    /// Stores a text value if the field is still empty. Returns whether it was stored.
    pub fn fill_text(&mut self, field: Field, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.is_set(field) {
            return false;
        }
        match self.text_slot(field) {
            Some(slot) => {
                *slot = Some(value.to_string());
                true
            }
            None => false,
        }
    }

    /// Stores years of experience if not yet known. Negative or non-finite values are ignored.
    pub fn fill_experience(&mut self, years: f64) -> bool {
        if self.experience.is_some() || !years.is_finite() || years < 0.0 {
            return false;
        }
        self.experience = Some(years);
        true
    }

    /// Human-facing value for a field, `None` when missing.
    pub fn display(&self, field: Field) -> Option<String> {
        match field {
            Field::Experience => self.experience.map(|y| format!("{y} years")),
            other => self
                .text(other)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// Summary card rows in ask order; missing values read "Missing".
    pub fn summary(&self) -> Vec<SummaryLine> {
        Field::ORDER
            .iter()
            .map(|&field| SummaryLine {
                field,
                label: field.label(),
                value: display_value(self.display(field).as_deref()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryLine {
    pub field: Field,
    pub label: &'static str,
    pub value: String,
}

pub fn display_value(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "Missing".to_string(),
    }
}

/// First field in `Field::ORDER` that is still empty.
pub fn next_missing_field(profile: &CandidateProfile) -> Option<Field> {
    Field::ORDER.into_iter().find(|&f| !profile.is_set(f))
}
