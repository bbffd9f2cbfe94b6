//! Field-keyed validation errors for form input.
//!
//! Validation runs before a mutation reaches the network, so callers can
//! annotate the offending input field directly. Each invalid field gets
//! exactly one message, keyed by its wire name (e.g. `transactionDate`).

use std::collections::BTreeMap;
use std::fmt::Display;

/// The validation errors for a single piece of form input.
///
/// Keys are the wire names of the invalid fields. A field that passed
/// validation never appears in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    /// Create an empty set of validation errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field`, replacing any earlier message for
    /// the same field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// The message recorded for `field`, if the field was invalid.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Whether every field passed validation.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The number of invalid fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }

            write!(f, "{field}: {message}")?;
            first = false;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::ValidationErrors;

    #[test]
    fn add_records_one_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("amount", "Amount must be a positive number");
        errors.add("amount", "Amount is required");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("amount"), Some("Amount is required"));
        assert_eq!(errors.get("transactionDate"), None);
    }

    #[test]
    fn display_joins_fields_in_name_order() {
        let mut errors = ValidationErrors::new();
        errors.add("transactionDate", "Transaction date is required");
        errors.add("amount", "Amount is required");

        assert_eq!(
            errors.to_string(),
            "amount: Amount is required; transactionDate: Transaction date is required"
        );
    }
}
