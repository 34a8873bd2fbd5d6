//! Domain classification
//!
//! Decides which domain agents a message concerns. The keyword classifier
//! is a thin heuristic: a domain is selected iff any of its keywords is a
//! substring of the lower-cased message. Domains are not exclusive.

use tracing::debug;

use crate::types::Domain;

/// Maps a message to the domains that should handle it
pub trait DomainClassifier: Send + Sync {
    /// Selected domains in configured order, without duplicates.
    /// An empty result means the general path.
    fn classify(&self, message: &str) -> Vec<Domain>;
}

/// Substring keyword matcher over an ordered list of (domain, keywords)
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Domain, Vec<String>)>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<(Domain, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(domain, keywords)| {
                (
                    domain,
                    keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { rules }
    }
}

impl Default for KeywordClassifier {
    /// Aviation back-office keyword sets; "schedule" alone selects no domain.
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self::new(vec![
            (
                Domain::Hr,
                words(&[
                    "employee",
                    "staff",
                    "training",
                    "certification",
                    "hire",
                    "onboard",
                    "hr",
                    "personnel",
                ]),
            ),
            (
                Domain::Meeting,
                words(&["meeting", "room", "book", "conference", "reservation", "calendar"]),
            ),
            (
                Domain::SupplyChain,
                words(&[
                    "inventory",
                    "parts",
                    "supplier",
                    "order",
                    "stock",
                    "procurement",
                    "purchase",
                ]),
            ),
        ])
    }
}

impl DomainClassifier for KeywordClassifier {
    fn classify(&self, message: &str) -> Vec<Domain> {
        let lower = message.to_lowercase();
        let mut selected: Vec<Domain> = Vec::new();
        for (domain, keywords) in &self.rules {
            if selected.contains(domain) {
                continue;
            }
            if let Some(hit) = keywords.iter().find(|k| lower.contains(k.as_str())) {
                debug!("Classified as {} (matched '{}')", domain, hit);
                selected.push(*domain);
            }
        }
        if selected.is_empty() {
            debug!("No domain keywords matched, using general path");
        }
        selected
    }
}
