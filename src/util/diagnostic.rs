//! User-friendly diagnostic messages.
//!
//! Every resolution error should tell the user what failed, what it was
//! doing at the time, and what to try next.

use std::fmt;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when an alias cannot be found in any registry.
    pub const UNKNOWN_ALIAS: &str = "Run `floe list` to see the registered aliases";

    /// Suggestion when a registry alias needs to be added first.
    pub const ADD_ALIAS: &str = "Run `floe add <alias> <flake-ref>` to register it";

    /// Suggestion for fetch failures.
    pub const FETCH_FAILED: &str = "Check your network connection and that the source exists";

    /// Suggestion when a lock update is requested for a remote flake.
    pub const NOT_UPDATABLE: &str =
        "Locks apply to local checkouts; remote references are already pinned by their revision";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional context and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add a context line.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render the diagnostic for terminal output.
    pub fn format(&self) -> String {
        let mut out = format!("{}: {}", self.severity, self.message);
        for line in &self.context {
            out.push_str(&format!("\n  note: {line}"));
        }
        for suggestion in &self.suggestions {
            out.push_str(&format!("\n  help: {suggestion}"));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
