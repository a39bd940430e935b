//! Configured category labels, exposed for informational listings

use serde::{Deserialize, Serialize};

use crate::state::CategoryLabel;

/// Static set of query categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog {
    labels: Vec<CategoryLabel>,
}

impl CategoryCatalog {
    /// Build from labels, dropping blanks and repeats while keeping order
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<CategoryLabel> = Vec::new();
        for label in labels {
            let label = label.into();
            if !label.trim().is_empty() && !unique.contains(&label) {
                unique.push(label);
            }
        }
        Self { labels: unique }
    }

    pub fn labels(&self) -> &[CategoryLabel] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::new([
            "Billing",
            "Technical Support",
            "Account",
            "Delivery",
            "General Inquiry",
        ])
    }
}
