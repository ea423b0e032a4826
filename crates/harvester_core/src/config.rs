use std::collections::HashSet;
use std::path::PathBuf;

use crate::{RecordFilter, TypeRules};

pub const DEFAULT_TOLERANCE: u32 = 10;
pub const DEFAULT_PARALLELISM: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("limit must be a positive number")]
    ZeroLimit,
    #[error("tolerance must be a positive number of failed downloads per host")]
    ZeroTolerance,
    #[error("at least one file type is required")]
    NoCategories,
    #[error("file type {0:?} requested more than once")]
    DuplicateCategory(String),
    #[error("file type {0:?} is not usable as a directory name")]
    InvalidCategory(String),
    #[error("parallelism must be between 1 and {max}, got {requested}")]
    Parallelism { requested: usize, max: usize },
    #[error("output path {} exists and is not a directory", .0.display())]
    OutputNotDirectory(PathBuf),
}

/// Settings for a single harvest run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub categories: Vec<String>,
    pub limit: u64,
    pub parallelism: usize,
    pub output_dir: PathBuf,
    pub tolerance: u32,
    pub type_rules: TypeRules,
}

impl HarvestConfig {
    pub fn new(
        categories: Vec<String>,
        limit: u64,
        parallelism: usize,
        output_dir: PathBuf,
        tolerance: u32,
        type_rules: TypeRules,
        max_parallelism: usize,
    ) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if tolerance == 0 {
            return Err(ConfigError::ZeroTolerance);
        }
        if categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        let mut seen = HashSet::new();
        for category in &categories {
            if category.is_empty()
                || category.starts_with('.')
                || category.contains(['/', '\\'])
            {
                return Err(ConfigError::InvalidCategory(category.clone()));
            }
            if !seen.insert(category.as_str()) {
                return Err(ConfigError::DuplicateCategory(category.clone()));
            }
        }
        if parallelism == 0 || parallelism > max_parallelism {
            return Err(ConfigError::Parallelism {
                requested: parallelism,
                max: max_parallelism,
            });
        }
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ConfigError::OutputNotDirectory(output_dir));
        }
        Ok(Self {
            categories,
            limit,
            parallelism,
            output_dir,
            tolerance,
            type_rules,
        })
    }

    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter::new(&self.categories, &self.type_rules)
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.output_dir.join(category)
    }

    pub fn index_dir(&self, index_name: &str) -> PathBuf {
        self.output_dir.join(index_name)
    }
}
