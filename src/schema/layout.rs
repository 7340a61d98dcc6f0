use std::fmt;
use std::path::{Path, PathBuf};

/// The four sections of a store directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Event matrix (`mat/mat.parquet`)
    Matrix,
    /// Column descriptors (`params/params.parquet`)
    Params,
    /// Instrument keywords (`keywords/keywords.parquet`)
    Keywords,
    /// Phenotype attributes (`pdata/pdata.parquet`)
    PhenoData,
}

impl Section {
    /// Every section, in write order
    pub const ALL: [Section; 4] = [
        Section::Matrix,
        Section::Params,
        Section::Keywords,
        Section::PhenoData,
    ];

    /// Sub-directory name under the store root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Section::Matrix => "mat",
            Section::Params => "params",
            Section::Keywords => "keywords",
            Section::PhenoData => "pdata",
        }
    }

    /// Parquet file name inside the section directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Section::Matrix => "mat.parquet",
            Section::Params => "params.parquet",
            Section::Keywords => "keywords.parquet",
            Section::PhenoData => "pdata.parquet",
        }
    }

    /// Section directory under `root`
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(self.dir_name())
    }

    /// Section file under `root`
    pub fn path(&self, root: &Path) -> PathBuf {
        self.dir(root).join(self.file_name())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
