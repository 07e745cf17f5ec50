//! Validated text primitives shared by the scout crates.
//!
//! Records arriving from external callers carry free-form strings. The types here guarantee the
//! minimum shape the pipeline relies on (non-empty, trimmed, single line) once constructed, so the
//! rest of the code never re-checks them.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The input spans more than one line
    #[error("text must be a single line")]
    MultiLine,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a `NonEmptyText` that must also fit on one line.
    ///
    /// Used for values that end up as a single spreadsheet cell or a display label.
    pub fn single_line(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.contains(['\n', '\r']) {
            return Err(TextError::MultiLine);
        }
        Ok(text)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  Dr. Ana Li \n").expect("valid text");
        assert_eq!(text.into_string(), "Dr. Ana Li");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(NonEmptyText::new("   \t"), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn single_line_rejects_embedded_breaks() {
        assert_eq!(
            NonEmptyText::single_line("Dr. Ana Li\nTYPE: Cardiologist"),
            Err(TextError::MultiLine)
        );
        assert!(NonEmptyText::single_line("Dr. Ana Li\n").is_ok());
    }
}
