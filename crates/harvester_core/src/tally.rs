use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of reporting a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveVerdict {
    /// First time this content was stored for the category during the run.
    Counted,
    /// Identical content was already counted for the category.
    Duplicate,
    /// The category was already full when the artifact arrived.
    Surplus,
}

/// Per-run quota and host-tolerance bookkeeping.
///
/// Counts only ever grow and never pass the limit. A host is penalized once its failure count is
/// strictly greater than the tolerance.
#[derive(Debug, Clone)]
pub struct Tally {
    limit: u64,
    tolerance: u32,
    counts: BTreeMap<String, u64>,
    failures: HashMap<String, u32>,
    seen: HashSet<(String, String)>,
}

impl Tally {
    pub fn new(categories: &[String], limit: u64, tolerance: u32) -> Self {
        Self {
            limit,
            tolerance,
            counts: categories.iter().map(|c| (c.clone(), 0)).collect(),
            failures: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    pub fn record_saved(&mut self, category: &str, digest: &str) -> SaveVerdict {
        let key = (category.to_string(), digest.to_string());
        if self.seen.contains(&key) {
            return SaveVerdict::Duplicate;
        }
        if let Some(count) = self.counts.get_mut(category) {
            if *count >= self.limit {
                return SaveVerdict::Surplus;
            }
            *count += 1;
        }
        self.seen.insert(key);
        SaveVerdict::Counted
    }

    /// Returns the host's failure count after the increment.
    pub fn record_failure(&mut self, host: &str) -> u32 {
        let count = self.failures.entry(host.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn failures(&self, host: &str) -> u32 {
        self.failures.get(host).copied().unwrap_or(0)
    }

    pub fn is_penalized(&self, host: &str) -> bool {
        self.failures(host) > self.tolerance
    }

    pub fn is_complete(&self) -> bool {
        self.counts.values().all(|&count| count >= self.limit)
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            limit: self.limit,
            counts: self.counts.clone(),
            penalized: self
                .failures
                .iter()
                .filter(|(_, &n)| n > self.tolerance)
                .map(|(host, _)| host.clone())
                .collect(),
        }
    }
}

/// Read-only view of a [`Tally`] handed to workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    pub limit: u64,
    pub counts: BTreeMap<String, u64>,
    pub penalized: HashSet<String>,
}

impl TallySnapshot {
    pub fn is_open(&self, category: &str) -> bool {
        self.counts
            .get(category)
            .is_some_and(|&count| count < self.limit)
    }

    pub fn is_penalized(&self, host: &str) -> bool {
        self.penalized.contains(host)
    }

    pub fn is_complete(&self) -> bool {
        self.counts.values().all(|&count| count >= self.limit)
    }
}
