//! Observable cell values

use std::fmt;

/// The value a cell presents to readers
///
/// An empty cell reads as `Text("")`. Arithmetic failures are carried as the
/// [`CellError`] variant rather than as a Rust error: they flow through
/// dependent formulas like any other value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Evaluation failure (#ARITHM!)
    Error(CellError),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is an error value
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Why a formula failed to produce a number
///
/// Both kinds render as the same `#ARITHM!` token; the distinction only
/// matters to code inspecting the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// Division by zero, overflow, or a non-finite result
    Arithmetic,
    /// A referenced text cell whose content is not numeric
    Value,
}

impl CellError {
    /// Get the display token for this error
    ///
    /// Every evaluation failure renders as the same token.
    pub fn as_str(&self) -> &'static str {
        "#ARITHM!"
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(3.14), CellValue::Number(3.14));

        let s = CellValue::from("hello");
        assert_eq!(s.as_text(), Some("hello"));
        assert_eq!(s.as_number(), None);
    }

    #[test]
    fn test_default_is_empty_text() {
        assert_eq!(CellValue::default(), CellValue::Text(String::new()));
    }

    #[test]
    fn test_cell_error_display() {
        assert_eq!(CellError::Arithmetic.to_string(), "#ARITHM!");
        assert_eq!(CellError::Value.to_string(), "#ARITHM!");
        assert_eq!(
            CellValue::Error(CellError::Arithmetic).to_string(),
            "#ARITHM!"
        );
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::text("abc").to_string(), "abc");
    }
}
