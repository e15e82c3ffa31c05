//! Statement types and the structural containers discovered in a filing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical financial statement types a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// Statement of financial position
    BalanceSheet,
    /// Statement of income / operations
    IncomeStatement,
    /// Statement of cash flows
    CashFlowStatement,
    /// Statement of comprehensive income
    ComprehensiveIncome,
    /// Statement of changes in stockholders' equity
    StatementOfEquity,
}

impl StatementType {
    /// All canonical statement types.
    pub const ALL: [Self; 5] = [
        Self::BalanceSheet,
        Self::IncomeStatement,
        Self::CashFlowStatement,
        Self::ComprehensiveIncome,
        Self::StatementOfEquity,
    ];
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BalanceSheet => "balance sheet",
            Self::IncomeStatement => "income statement",
            Self::CashFlowStatement => "cash flow statement",
            Self::ComprehensiveIncome => "comprehensive income statement",
            Self::StatementOfEquity => "statement of equity",
        };
        f.write_str(s)
    }
}

/// One node of a role's presentation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationNode {
    /// Namespace-qualified concept name
    pub concept: String,
    /// Preferred display label, when declared
    pub label: Option<String>,
    /// Abstract nodes are headings; they carry no value
    pub is_abstract: bool,
    /// Declared ordering among siblings
    pub order: u32,
    /// Child nodes in presentation order
    pub children: Vec<PresentationNode>,
}

impl PresentationNode {
    /// Creates a leaf line-item node.
    pub fn line_item(concept: impl Into<String>, order: u32) -> Self {
        Self {
            concept: concept.into(),
            label: None,
            is_abstract: false,
            order,
            children: Vec::new(),
        }
    }

    /// Creates an abstract heading node with children.
    pub fn heading(concept: impl Into<String>, order: u32, children: Vec<Self>) -> Self {
        Self {
            concept: concept.into(),
            label: None,
            is_abstract: true,
            order,
            children,
        }
    }

    /// Attaches a preferred label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One signed, weighted roll-up edge from a role's calculation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationEdge {
    /// The total being rolled up into
    pub parent: String,
    /// The contributing concept
    pub child: String,
    /// Contribution weight, +1.0 or -1.0 in practice
    pub weight: f64,
}

/// A structural container discovered in the source document.
///
/// Each role carries a presentation tree (display order), a calculation
/// tree (roll-up arithmetic), and — when the filing declares one — the
/// definition-linkbase set of axes valid on the statement face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRole {
    /// Role URI or identifier from the linkbase
    pub role_id: String,
    /// Human-readable role definition text
    pub definition: String,
    /// Statement type hinted by the document loader, if any
    pub declared_type: Option<StatementType>,
    /// Presentation tree roots
    pub presentation: Vec<PresentationNode>,
    /// Calculation roll-up edges
    pub calculation: Vec<CalculationEdge>,
    /// Axes the definition linkbase declares valid for this role.
    /// `None` means the filing has no definition linkbase for this role,
    /// which is distinct from an empty declared set.
    pub declared_axes: Option<BTreeSet<String>>,
    /// Position of this role among the filing's declared roles
    pub presentation_order: usize,
}

impl StatementRole {
    /// Creates a role with no trees attached.
    pub fn new(role_id: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            definition: definition.into(),
            declared_type: None,
            presentation: Vec::new(),
            calculation: Vec::new(),
            declared_axes: None,
            presentation_order: 0,
        }
    }

    /// All non-abstract concepts in the presentation tree, in display order.
    pub fn line_item_concepts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        fn walk<'a>(nodes: &'a [PresentationNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                if !node.is_abstract {
                    out.push(node.concept.as_str());
                }
                walk(&node.children, out);
            }
        }
        walk(&self.presentation, &mut out);
        out
    }

    /// Returns true if a definition linkbase declares the axis valid here.
    pub fn declares_axis(&self, axis: &str) -> bool {
        self.declared_axes
            .as_ref()
            .is_some_and(|axes| axes.contains(axis))
    }

    /// Returns true if the filing carries definition-linkbase data for
    /// this role at all.
    pub const fn has_definition_linkbase(&self) -> bool {
        self.declared_axes.is_some()
    }
}
