//! Dimensional metadata attached to facts.

use serde::{Deserialize, Serialize};

/// One axis/member pair qualifying a fact.
///
/// A dimensioned fact reports a slice of a line item (revenue for one
/// product line, equity for one share class) rather than the consolidated
/// total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// The axis concept (e.g. "srt:ProductOrServiceAxis")
    pub axis: String,
    /// The member concept (e.g. "us-gaap:ProductMember")
    pub member: String,
    /// Human-readable member label, when the filing provides one
    pub member_label: Option<String>,
}

impl Dimension {
    /// Creates a dimension without a member label.
    pub fn new(axis: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            axis: axis.into(),
            member: member.into(),
            member_label: None,
        }
    }

    /// Attaches a human-readable member label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.member_label = Some(label.into());
        self
    }

    /// The axis name without its namespace prefix.
    pub fn axis_local_name(&self) -> &str {
        self.axis.rsplit(':').next().unwrap_or(&self.axis)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.axis, self.member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_local_name() {
        let dim = Dimension::new("srt:ProductOrServiceAxis", "us-gaap:ProductMember");
        assert_eq!(dim.axis_local_name(), "ProductOrServiceAxis");

        let unprefixed = Dimension::new("CustomAxis", "CustomMember");
        assert_eq!(unprefixed.axis_local_name(), "CustomAxis");
    }

    #[test]
    fn test_with_label() {
        let dim = Dimension::new("srt:ProductOrServiceAxis", "us-gaap:ProductMember")
            .with_label("Products");
        assert_eq!(dim.member_label.as_deref(), Some("Products"));
    }
}
