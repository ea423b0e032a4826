use crate::{ArchiveRecord, TypeRule, TypeRules};

/// Why a record was not considered for any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Status,
    PenalizedHost,
}

/// Resolved rules for the requested categories, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    rules: Vec<TypeRule>,
}

impl RecordFilter {
    pub fn new(categories: &[String], rules: &TypeRules) -> Self {
        Self {
            rules: categories.iter().map(|c| rules.rule_for(c)).collect(),
        }
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Categories the record should be saved under.
    ///
    /// `is_penalized` is consulted before any rule so a penalized host never
    /// reaches category matching; `is_open` reports whether a category still
    /// needs files.
    pub fn select<'a>(
        &'a self,
        record: &ArchiveRecord,
        is_penalized: impl FnOnce(&str) -> bool,
        is_open: impl Fn(&str) -> bool,
    ) -> Result<Vec<&'a str>, Rejection> {
        if !record.is_ok_status() {
            return Err(Rejection::Status);
        }
        if is_penalized(&record.host) {
            return Err(Rejection::PenalizedHost);
        }
        Ok(self
            .rules
            .iter()
            .filter(|rule| is_open(&rule.category))
            .filter(|rule| rule.matches(record))
            .map(|rule| rule.category.as_str())
            .collect())
    }
}
