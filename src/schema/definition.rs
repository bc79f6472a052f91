use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::table::TableError;

/// A table generator as authored on disk:
///
/// ```ron
/// (
///     name: "Tavern",
///     template: "The [[adjective]] [[animal]]",
///     tables: {
///         "adjective": ["drunken", "[[color]]"],
///         "animal": ["goat", "pony|mule"],
///         "color": ["red", "green"],
///     },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGeneratorDefinition {
    pub name: String,
    pub template: String,
    pub tables: HashMap<String, Vec<String>>,
}

impl TableGeneratorDefinition {
    pub fn load_from_ron(path: &Path) -> Result<TableGeneratorDefinition, TableError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<TableGeneratorDefinition, TableError> {
        Ok(ron::from_str(input)?)
    }
}

/// The kind of data file a manifest entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// `<stem>.ron` holding a trained Markov model.
    Markov,
    /// `<stem>.txt` word list, trained when loaded.
    WordList,
    /// `<stem>.ron` holding a [`TableGeneratorDefinition`].
    Tables,
}

impl GeneratorKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markov | Self::Tables => "ron",
            Self::WordList => "txt",
        }
    }
}

/// One line of a generator manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name without extension, relative to the data directory.
    pub stem: String,
    pub kind: GeneratorKind,
    /// Display name for word lists. Defaults to the last path component of `stem`.
    #[serde(default)]
    pub name: Option<String>,
}

impl ManifestEntry {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.kind.extension())
    }

    pub fn display_name(&self) -> &str {
        match self.name {
            Some(ref name) => name,
            None => self.stem.rsplit('/').next().unwrap_or(&self.stem),
        }
    }
}

/// Ordered list of generators to load from a data directory.
pub type GeneratorManifest = Vec<ManifestEntry>;
