//! Structured street addresses and the flattened snapshot format
//!
//! Invitations store a single flattened string (what the email shows);
//! homes keep the structured fields. Corrections supplied by the invited
//! client at acceptance win field-by-field over the cleaner's snapshot.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Structured address as submitted by API clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(max = 255))]
    pub line1: Option<String>,
    #[validate(length(max = 255))]
    pub line2: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AddressInput {
    /// An address is usable once it has a street line
    pub fn is_usable(&self) -> bool {
        non_blank(&self.line1).is_some()
    }

    /// Merge corrections over this address; a correction wins per field
    /// whenever it is present and non-blank.
    pub fn merged_with(&self, corrections: Option<&AddressInput>) -> AddressInput {
        let Some(corrections) = corrections else {
            return self.clone();
        };

        let pick = |base: &Option<String>, correction: &Option<String>| {
            non_blank(correction)
                .or_else(|| non_blank(base))
                .map(str::to_string)
        };

        AddressInput {
            line1: pick(&self.line1, &corrections.line1),
            line2: pick(&self.line2, &corrections.line2),
            city: pick(&self.city, &corrections.city),
            state: pick(&self.state, &corrections.state),
            postal_code: pick(&self.postal_code, &corrections.postal_code),
        }
    }

    /// Serialize to the single-string form stored on the invitation
    /// snapshot. JSON keeps the fields recoverable for the field-by-field
    /// merge at acceptance.
    pub fn to_stored(&self) -> Option<String> {
        if !self.is_usable() {
            return None;
        }
        serde_json::to_string(self).ok()
    }

    /// Recover a structured address from the stored snapshot string.
    /// Older rows hold a plain formatted string; those come back as a
    /// bare street line.
    pub fn from_stored(stored: &str) -> AddressInput {
        serde_json::from_str(stored).unwrap_or_else(|_| AddressInput {
            line1: Some(stored.to_string()),
            ..Default::default()
        })
    }

    /// Human-readable single line, e.g. "12 Elm St, Apt 4, Springfield, IL 62704"
    pub fn formatted(&self) -> Option<String> {
        if !self.is_usable() {
            return None;
        }

        let mut parts: Vec<String> = Vec::new();
        if let Some(line1) = non_blank(&self.line1) {
            parts.push(line1.to_string());
        }
        if let Some(line2) = non_blank(&self.line2) {
            parts.push(line2.to_string());
        }
        if let Some(city) = non_blank(&self.city) {
            parts.push(city.to_string());
        }
        match (non_blank(&self.state), non_blank(&self.postal_code)) {
            (Some(state), Some(zip)) => parts.push(format!("{} {}", state, zip)),
            (Some(state), None) => parts.push(state.to_string()),
            (None, Some(zip)) => parts.push(zip.to_string()),
            (None, None) => {}
        }

        Some(parts.join(", "))
    }
}
