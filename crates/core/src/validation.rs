//! Field-keyed validation errors.
//!
//! Errors are collected per input field instead of failing on the first
//! problem, so a dashboard form can highlight every offending input at once.
//! Nested lists (e.g. the variants of a smartphone) report one entry per
//! submitted item, with an empty entry for items that passed.

use std::collections::BTreeMap;

use serde::Serialize;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Errors reported for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// Plain messages for a scalar field.
    Messages(Vec<String>),
    /// Per-item errors for a nested list, index-aligned with the input.
    Items(Vec<ValidationErrors>),
}

/// Validation errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, ErrorDetail>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let entry = self
            .fields
            .entry(field.into())
            .or_insert_with(|| ErrorDetail::Messages(Vec::new()));
        match entry {
            ErrorDetail::Messages(messages) => messages.push(message.into()),
            // A nested list already failed item-wise; keep the item errors.
            ErrorDetail::Items(_) => {}
        }
    }

    /// Record a message that is not tied to one field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    /// Record per-item errors for a nested list field.
    ///
    /// Nothing is recorded when every item is clean.
    pub fn add_items(&mut self, field: impl Into<String>, items: Vec<ValidationErrors>) {
        if items.iter().all(ValidationErrors::is_empty) {
            return;
        }
        self.fields.insert(field.into(), ErrorDetail::Items(items));
    }

    pub fn get(&self, field: &str) -> Option<&ErrorDetail> {
        self.fields.get(field)
    }

    /// Messages recorded for `field` (empty when none or when the field is a nested list).
    pub fn messages(&self, field: &str) -> &[String] {
        match self.fields.get(field) {
            Some(ErrorDetail::Messages(messages)) => messages,
            _ => &[],
        }
    }

    /// Per-item errors for a nested list field.
    pub fn items(&self, field: &str) -> Option<&[ValidationErrors]> {
        match self.fields.get(field) {
            Some(ErrorDetail::Items(items)) => Some(items),
            _ => None,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, detail) in other.fields {
            match detail {
                ErrorDetail::Messages(messages) => {
                    for message in messages {
                        self.add(field.clone(), message);
                    }
                }
                ErrorDetail::Items(items) => self.add_items(field, items),
            }
        }
    }

    /// `Ok(value)` when no errors were recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, detail) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match detail {
                ErrorDetail::Messages(messages) => write!(f, "{field}: {}", messages.join(" "))?,
                ErrorDetail::Items(items) => {
                    let failed = items.iter().filter(|e| !e.is_empty()).count();
                    write!(f, "{field}: {failed} invalid item(s)")?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_like_a_form_error_body() {
        let mut item = ValidationErrors::new();
        item.add("product", "Product ID mismatch");

        let mut errors = ValidationErrors::new();
        errors.add("slug", "This field is required.");
        errors.add_items("variants", vec![ValidationErrors::new(), item]);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "slug": ["This field is required."],
                "variants": [{}, {"product": ["Product ID mismatch"]}],
            })
        );
    }

    #[test]
    fn clean_items_are_not_recorded() {
        let mut errors = ValidationErrors::new();
        errors.add_items("variants", vec![ValidationErrors::new(), ValidationErrors::new()]);
        assert!(errors.is_empty());
        assert_eq!(errors.into_result(7), Ok(7));
    }

    #[test]
    fn merge_appends_messages() {
        let mut a = ValidationErrors::new();
        a.add("width", "A valid number is required.");
        let mut b = ValidationErrors::new();
        b.add("width", "Ensure that there are no more than 4 digits in total.");
        b.add_non_field("broken");
        a.merge(b);

        assert_eq!(a.messages("width").len(), 2);
        assert_eq!(a.messages(NON_FIELD_ERRORS), ["broken".to_string()]);
        assert_eq!(a.len(), 2);
    }
}
