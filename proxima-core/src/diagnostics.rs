//! Diagnostics - Errors and warnings returned from lifecycle entry points
//!
//! Entry points never fail with a `Result`; they report what went wrong as a
//! list of diagnostics, the same way a declarative host expects them.

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single error or warning
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.summary)?;
        if let Some(ref detail) = self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Ordered list of diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap any error as a single error diagnostic, keeping its message verbatim
    pub fn from_err(err: impl std::error::Error) -> Self {
        let mut diags = Self::new();
        let mut diag = Diagnostic::error(err.to_string());
        if let Some(source) = err.source() {
            diag = diag.with_detail(source.to_string());
        }
        diags.push(diag);
        diags
    }

    pub fn from_result<E: std::error::Error>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::new(),
            Err(e) => Self::from_err(e),
        }
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    #[test]
    fn from_err_keeps_message() {
        let diags = Diagnostics::from_err(ProviderError::transport("connection refused"));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "connection refused");
    }

    #[test]
    fn warnings_are_not_errors() {
        let diags: Diagnostics = Diagnostic::warning("comment ignored").into();
        assert!(!diags.has_errors());
        assert_eq!(diags.errors().count(), 0);
    }

    #[test]
    fn from_result_ok_is_empty() {
        let diags = Diagnostics::from_result::<ProviderError>(Ok(()));
        assert!(diags.is_empty());
    }
}
