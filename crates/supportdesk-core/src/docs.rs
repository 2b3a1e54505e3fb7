use crate::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One topic entry of the reference documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDoc {
    /// Short topic title, e.g. "Password Reset".
    pub title: String,
    /// Full answer text returned or quoted for this topic.
    pub content: String,
}

impl ReferenceDoc {
    /// Creates a new documentation entry.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// The static knowledge base, loaded once at startup and never mutated.
///
/// Entry order is significant: the local fallback provider returns the first
/// matching entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocSet {
    entries: Vec<ReferenceDoc>,
}

impl DocSet {
    /// Build a set from already-parsed entries, keeping their order.
    pub fn new(entries: Vec<ReferenceDoc>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of `{ "title": ..., "content": ... }` objects.
    pub fn from_json_str(json: &str) -> DeskResult<Self> {
        let entries: Vec<ReferenceDoc> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Read and parse a JSON documentation file.
    pub fn from_json_file(path: &Path) -> DeskResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            DeskError::Config(format!(
                "Failed to read documentation file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&data)
    }

    /// The two topics the desk ships with when no documentation file exists.
    pub fn builtin() -> Self {
        Self::new(vec![
            ReferenceDoc::new(
                "Password Reset",
                "To reset your password, click \"Forgot password\" on the login page and \
                 enter the email address linked to your account. You will receive a reset \
                 link that stays valid for 24 hours. If the email does not arrive, check \
                 your spam folder or contact support.",
            ),
            ReferenceDoc::new(
                "Refund Policy",
                "Refunds are available within 30 days of purchase for unused products. \
                 Submit a refund request from the Orders page; approved refunds are \
                 returned to the original payment method within 5-7 business days.",
            ),
        ])
    }

    /// Entries in their stored order.
    pub fn entries(&self) -> &[ReferenceDoc] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no documentation was loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowercased titles, in order, for "I can help you with" listings.
    pub fn topics(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.title.to_lowercase()).collect()
    }

    /// Grounding text handed to the providers: `"<title>: <content>"` per
    /// entry, separated by a blank line.
    pub fn reference_text(&self) -> String {
        self.entries
            .iter()
            .map(|d| format!("{}: {}", d.title, d.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
