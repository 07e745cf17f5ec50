//! Field extraction from candidate fragments.
//!
//! Extraction is driven by an ordered table of [`FieldRule`]s. Each rule pairs a field with a
//! regular expression whose first capture group is the value, plus the default used when nothing
//! matches. Rules are evaluated independently per fragment and the first matching rule for a field
//! wins. A miss is never an error: the field silently takes its default, which keeps the pipeline
//! producing records even when upstream output drifts from the expected convention.

use crate::constants::{DEFAULT_CATEGORY, DEFAULT_IDENTIFIER, DEFAULT_NAME};
use crate::{ScoutError, ScoutResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static NAME_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"###[ \t]*([^\r\n]+)").unwrap());
static TYPE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bTYPE:[ \t]*([^\r\n]+)").unwrap());
static NPI_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNPI:[ \t]*(\d+)").unwrap());
static URL_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:URL|LINK|SOURCE):[ \t]*(\S+)").unwrap());

/// The named fields a fragment can yield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Category,
    Identifier,
    ReferenceUrl,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Name,
        Field::Category,
        Field::Identifier,
        Field::ReferenceUrl,
    ];

}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Category => "category",
            Field::Identifier => "identifier",
            Field::ReferenceUrl => "reference_url",
        })
    }
}

/// One row of the extraction table.
#[derive(Clone, Debug)]
pub struct FieldRule {
    field: Field,
    pattern: Regex,
    default: String,
}

impl FieldRule {
    /// Builds a rule from a pattern string.
    ///
    /// The pattern must contain at least one capture group; group 1 is the field value.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::InvalidPattern` if the pattern does not compile, or
    /// `ScoutError::InvalidInput` if it has no capture group.
    pub fn new(field: Field, pattern: &str, default: impl Into<String>) -> ScoutResult<Self> {
        let pattern = Regex::new(pattern).map_err(|source| ScoutError::InvalidPattern {
            field: field.to_string(),
            source,
        })?;
        Self::from_regex(field, pattern, default)
    }

    pub fn from_regex(field: Field, pattern: Regex, default: impl Into<String>) -> ScoutResult<Self> {
        if pattern.captures_len() < 2 {
            return Err(ScoutError::InvalidInput(format!(
                "pattern for {field} needs a capture group"
            )));
        }
        Ok(Self {
            field,
            pattern,
            default: default.into(),
        })
    }

    /// Returns the first capture in `text`, cut at the first line break and trimmed.
    fn capture(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.get(1)?.as_str();
        let line = raw.lines().next().unwrap_or_default();
        let value = line.trim_matches(|c: char| c == '*' || c.is_whitespace());
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Values pulled out of one fragment. Every field is always populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: String,
    pub category: String,
    pub identifier: String,
    pub reference_url: String,
}

impl ExtractedFields {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Category => self.category = value,
            Field::Identifier => self.identifier = value,
            Field::ReferenceUrl => self.reference_url = value,
        }
    }
}

/// Table-driven extractor.
#[derive(Clone, Debug)]
pub struct FieldExtractor {
    rules: Vec<FieldRule>,
}

impl FieldExtractor {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// The extraction table for the `### name` / `TYPE:` / `NPI:` / `URL:` convention.
    pub fn standard() -> Self {
        let rule = |field, pattern: &Lazy<Regex>, default: &str| FieldRule {
            field,
            pattern: Regex::clone(pattern),
            default: default.to_string(),
        };

        Self::new(vec![
            rule(Field::Name, &NAME_HEADER, DEFAULT_NAME),
            rule(Field::Category, &TYPE_LABEL, DEFAULT_CATEGORY),
            rule(Field::Identifier, &NPI_LABEL, DEFAULT_IDENTIFIER),
            rule(Field::ReferenceUrl, &URL_LABEL, ""),
        ])
    }

    /// Adds a rule that takes precedence over every existing rule for the same field.
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        let position = self
            .rules
            .iter()
            .position(|r| r.field == rule.field)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, rule);
        self
    }

    /// Extracts every field from `text`.
    ///
    /// For each field the first matching rule (in table order) supplies the value. A field with no
    /// match takes the default of its first rule, or an empty string if the table has no rule for it.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields {
            name: String::new(),
            category: String::new(),
            identifier: String::new(),
            reference_url: String::new(),
        };

        for field in Field::ALL {
            let mut candidates = self.rules.iter().filter(|r| r.field == field).peekable();
            let default = candidates
                .peek()
                .map(|r| r.default.clone())
                .unwrap_or_default();
            let value = candidates
                .find_map(|rule| rule.capture(text))
                .unwrap_or(default);
            fields.set(field, value);
        }

        fields
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANA: &str = "### Dr. Ana Li\nTYPE: Cardiologist\nNPI: 1234567890\nKeynote speaker at TED.";

    #[test]
    fn extracts_labelled_fields() {
        let fields = FieldExtractor::standard().extract(ANA);

        assert_eq!(fields.name, "Dr. Ana Li");
        assert_eq!(fields.category, "Cardiologist");
        assert_eq!(fields.identifier, "1234567890");
        assert_eq!(fields.reference_url, "");
    }

    #[test]
    fn missing_header_falls_back_to_placeholders() {
        let fields = FieldExtractor::standard()
            .extract("A cardiologist who gave a keynote at a regional summit last spring.");

        assert_eq!(fields.name, DEFAULT_NAME);
        assert_eq!(fields.category, DEFAULT_CATEGORY);
        assert_eq!(fields.identifier, DEFAULT_IDENTIFIER);
    }

    #[test]
    fn values_stop_at_the_line_break() {
        let fields = FieldExtractor::standard()
            .extract("### Prof. Sam Okoro\r\nTYPE: Oncologist\r\nURL: https://example.org/okoro\nBio");

        assert_eq!(fields.name, "Prof. Sam Okoro");
        assert_eq!(fields.category, "Oncologist");
        assert_eq!(fields.reference_url, "https://example.org/okoro");
    }

    #[test]
    fn non_numeric_npi_is_a_miss() {
        let fields = FieldExtractor::standard().extract("### Jo Park\nNPI: unknown\nplenty of text");
        assert_eq!(fields.identifier, DEFAULT_IDENTIFIER);
    }

    #[test]
    fn markdown_emphasis_is_stripped_from_values() {
        let fields = FieldExtractor::standard().extract("### **Dr. Mira Sen**\nTYPE: *Neurologist*");
        assert_eq!(fields.name, "Dr. Mira Sen");
        assert_eq!(fields.category, "Neurologist");
    }

    #[test]
    fn first_match_wins_for_repeated_labels() {
        let fields = FieldExtractor::standard()
            .extract("### First Name\n### Second Name\nTYPE: Surgeon\nTYPE: Dentist");
        assert_eq!(fields.name, "First Name");
        assert_eq!(fields.category, "Surgeon");
    }

    #[test]
    fn added_rule_takes_precedence_and_keeps_fallthrough() {
        let extractor = FieldExtractor::standard().with_rule(
            FieldRule::new(Field::Category, r"SPECIALTY:[ \t]*([^\r\n]+)", "Generalist")
                .expect("valid rule"),
        );

        let with_specialty = extractor.extract("### A\nSPECIALTY: Radiology\nTYPE: Surgeon");
        assert_eq!(with_specialty.category, "Radiology");

        let with_type_only = extractor.extract("### A\nTYPE: Surgeon");
        assert_eq!(with_type_only.category, "Surgeon");

        let with_neither = extractor.extract("### A");
        assert_eq!(with_neither.category, "Generalist");
    }

    #[test]
    fn rule_without_capture_group_is_rejected() {
        let err = FieldRule::new(Field::Name, r"###", "x").expect_err("should reject");
        assert!(matches!(err, ScoutError::InvalidInput(_)));

        let err = FieldRule::new(Field::Name, r"(", "x").expect_err("should reject");
        assert!(matches!(err, ScoutError::InvalidPattern { .. }));
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = FieldExtractor::standard();
        assert_eq!(extractor.extract(ANA), extractor.extract(ANA));
    }
}
