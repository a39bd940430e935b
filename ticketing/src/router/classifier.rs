//! Classifier gateway
//!
//! The model that turns message text into a category label lives outside
//! this crate. Intake only sees the [`Classifier`] trait; whatever label comes
//! back is used verbatim as the routing key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::CategoryLabel;

/// The classifier could not produce a label (model down, timeout, no rule matched)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Classification unavailable: {reason}")]
pub struct ClassificationUnavailable {
    pub reason: String,
}

impl ClassificationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Text → category label
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify arbitrary UTF-8 text, including the empty string
    async fn classify(&self, text: &str) -> Result<CategoryLabel, ClassificationUnavailable>;
}

/// One category and the phrases that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: CategoryLabel,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            category: category.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Deterministic rule-based classifier.
///
/// Rules are tried in declaration order; the first rule with a keyword
/// contained in the message (case-insensitive) wins. With no match the
/// default label is returned, or the classification is unavailable when no
/// default is configured.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
    default_label: Option<CategoryLabel>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
                category: rule.category,
            })
            .collect();
        Self {
            rules,
            default_label: None,
        }
    }

    /// Label returned when no rule matches
    pub fn with_default(mut self, label: impl Into<String>) -> Self {
        self.default_label = Some(label.into());
        self
    }

    /// Rule set used when nothing is configured
    pub fn with_default_rules() -> Self {
        Self::new(vec![
            KeywordRule::new(
                "Billing",
                &["invoice", "bill", "charged", "payment", "refund", "price"],
            ),
            KeywordRule::new(
                "Technical Support",
                &["error", "crash", "not working", "bug", "login", "password"],
            ),
            KeywordRule::new("Delivery", &["delivery", "parcel", "shipping", "tracking"]),
            KeywordRule::new("Account", &["account", "profile", "subscription", "cancel"]),
        ])
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Synchronous core of [`Classifier::classify`]
    pub fn classify_text(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|rule| rule.category.as_str())
            .or(self.default_label.as_deref())
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<CategoryLabel, ClassificationUnavailable> {
        self.classify_text(text)
            .map(str::to_string)
            .ok_or_else(|| ClassificationUnavailable::new("no keyword rule matched"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let classifier = KeywordClassifier::new(vec![
            KeywordRule::new("Billing", &["refund"]),
            KeywordRule::new("Delivery", &["parcel", "refund"]),
        ]);
        assert_eq!(
            classifier.classify_text("Parcel lost, I want a REFUND"),
            Some("Billing")
        );
        assert_eq!(classifier.classify_text("parcel lost"), Some("Delivery"));
    }

    #[test]
    fn test_no_match_without_default() {
        let classifier = KeywordClassifier::with_default_rules();
        assert_eq!(classifier.classify_text(""), None);
        assert_eq!(classifier.classify_text("hello there"), None);
    }

    #[test]
    fn test_blank_keywords_are_ignored() {
        let classifier = KeywordClassifier::new(vec![KeywordRule::new("Billing", &["", "  "])]);
        assert_eq!(classifier.classify_text("anything"), None);
    }

    #[tokio::test]
    async fn test_default_label_on_no_match() {
        let classifier = KeywordClassifier::with_default_rules().with_default("General Inquiry");
        assert_eq!(
            classifier.classify("hello there").await.unwrap(),
            "General Inquiry"
        );
        assert_eq!(
            classifier.classify("my invoice is wrong").await.unwrap(),
            "Billing"
        );
    }

    #[tokio::test]
    async fn test_unavailable_when_nothing_matches() {
        let classifier = KeywordClassifier::new(Vec::new());
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(err.to_string().contains("no keyword rule matched"));
    }
}
