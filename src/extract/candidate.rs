use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scored email address found on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCandidate {
    /// Lowercase address; the identity used for deduplication
    pub address: String,

    /// Page the address was found on
    pub source_url: String,

    pub discovered_at: DateTime<Utc>,

    /// Heuristic score in [0, 1]
    pub confidence: f64,

    /// Surrounding text, or a fixed label for mailto links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EmailCandidate {
    /// Returns the part after the `@`
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }
}

/// Insertion-ordered set of candidates keyed by address
///
/// When two candidates share an address, the one with strictly higher
/// confidence is kept in the slot of the first one seen; ties keep the
/// first seen.
#[derive(Debug, Clone, Default)]
pub struct EmailSet {
    index: HashMap<String, usize>,
    items: Vec<EmailCandidate>,
}

impl EmailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a candidate, returning true if the set changed
    pub fn insert(&mut self, candidate: EmailCandidate) -> bool {
        match self.index.get(&candidate.address) {
            Some(&slot) => {
                if candidate.confidence > self.items[slot].confidence {
                    self.items[slot] = candidate;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(candidate.address.clone(), self.items.len());
                self.items.push(candidate);
                true
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<&EmailCandidate> {
        self.index.get(address).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmailCandidate> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<EmailCandidate> {
        self.items
    }
}

impl Extend<EmailCandidate> for EmailSet {
    fn extend<I: IntoIterator<Item = EmailCandidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}

impl FromIterator<EmailCandidate> for EmailSet {
    fn from_iter<I: IntoIterator<Item = EmailCandidate>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for EmailSet {
    type Item = EmailCandidate;
    type IntoIter = std::vec::IntoIter<EmailCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Deduplicates candidates by address, keeping the highest-confidence one
pub fn deduplicate(candidates: Vec<EmailCandidate>) -> Vec<EmailCandidate> {
    candidates.into_iter().collect::<EmailSet>().into_vec()
}

/// Keeps candidates whose domain ends with one of `allowed_domains`
///
/// An empty list keeps every candidate.
pub fn filter_by_domain(
    candidates: Vec<EmailCandidate>,
    allowed_domains: &[String],
) -> Vec<EmailCandidate> {
    if allowed_domains.is_empty() {
        return candidates;
    }

    let allowed: Vec<String> = allowed_domains.iter().map(|d| d.to_lowercase()).collect();
    candidates
        .into_iter()
        .filter(|c| {
            let domain = c.domain();
            allowed.iter().any(|a| domain.ends_with(a.as_str()))
        })
        .collect()
}
