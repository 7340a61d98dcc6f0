use std::fmt;

use serde::{Deserialize, Serialize};

use super::index::ColumnSet;
use super::keywords::Keywords;
use super::pheno::PhenoData;

/// One of the three independently persisted metadata categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaCategory {
    /// Column descriptors
    Params,
    /// Instrument keywords
    Keywords,
    /// Phenotype attributes
    PhenoData,
}

impl MetaCategory {
    /// Every category, in flush order
    pub const ALL: [MetaCategory; 3] = [
        MetaCategory::Params,
        MetaCategory::Keywords,
        MetaCategory::PhenoData,
    ];

    pub(crate) fn slot(self) -> usize {
        match self {
            MetaCategory::Params => 0,
            MetaCategory::Keywords => 1,
            MetaCategory::PhenoData => 2,
        }
    }
}

impl fmt::Display for MetaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaCategory::Params => write!(f, "params"),
            MetaCategory::Keywords => write!(f, "keywords"),
            MetaCategory::PhenoData => write!(f, "pdata"),
        }
    }
}

/// In-process holder of a frame's metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaCache {
    /// Column descriptors and their indices
    pub columns: ColumnSet,
    /// Instrument keywords
    pub keywords: Keywords,
    /// Phenotype attributes
    pub pheno: PhenoData,
}

impl MetaCache {
    /// Bundle the three categories
    pub fn new(columns: ColumnSet, keywords: Keywords, pheno: PhenoData) -> Self {
        Self {
            columns,
            keywords,
            pheno,
        }
    }
}
