use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::ArchiveRecord;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("could not read type rules from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed type rules: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a record is recognised as belonging to a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub category: String,
    pub mime: Option<String>,
    pub extensions: BTreeSet<String>,
}

impl TypeRule {
    /// Rule used when the rule table has no entry: the category name is the
    /// only accepted extension.
    pub fn fallback(category: &str) -> Self {
        Self {
            category: category.to_string(),
            mime: None,
            extensions: BTreeSet::from([format!(".{category}")]),
        }
    }

    /// A rule with a mime type matches on that alone; the extension set is
    /// only consulted when no mime type is configured.
    pub fn matches(&self, record: &ArchiveRecord) -> bool {
        match self.mime.as_deref() {
            Some(mime) => record.mime_detected == mime,
            None => record
                .extension
                .as_deref()
                .is_some_and(|ext| self.extensions.contains(ext)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(rename = "mime-detected", default)]
    mime_detected: Option<String>,
    #[serde(default)]
    ext: Vec<String>,
}

/// Immutable category -> rule table loaded once per harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRules {
    rules: BTreeMap<String, TypeRule>,
}

impl TypeRules {
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let text = fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, RulesError> {
        let raw: BTreeMap<String, RawRule> = serde_json::from_str(text)?;
        let rules = raw
            .into_iter()
            .map(|(category, rule)| {
                let rule = TypeRule {
                    category: category.clone(),
                    mime: rule.mime_detected.filter(|m| !m.is_empty()),
                    extensions: rule.ext.into_iter().collect(),
                };
                (category, rule)
            })
            .collect();
        Ok(Self { rules })
    }

    pub fn get(&self, category: &str) -> Option<&TypeRule> {
        self.rules.get(category)
    }

    /// Rule for `category`, falling back to [`TypeRule::fallback`].
    pub fn rule_for(&self, category: &str) -> TypeRule {
        self.rules
            .get(category)
            .cloned()
            .unwrap_or_else(|| TypeRule::fallback(category))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
