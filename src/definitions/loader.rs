//! Loading a complete definition document.
//!
//! [`TriggerDefinitions`] is only ever constructed from a document whose
//! cross references all resolve: every filter named by a leg exists for
//! that leg's object kind, and every path named by a combination exists.
//! Anything else is an error before the first event is looked at.
//!
//! The year never selects behaviour. It only picks which document to read
//! through [`TriggerDefinitions::for_year`]; all year-specific constants
//! live in the document.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::core::DataKind;
use crate::error::{Result, TriggerError};

use super::combination::CombinationCatalog;
use super::filter_bits::FilterBitTable;
use super::paths::{PathKind, TriggerPathCatalog};
use super::schema::DefinitionFile;

/// Validated trigger tables of one definition document.
#[derive(Clone, Debug)]
pub struct TriggerDefinitions {
    year: Option<u32>,
    filter_bits: FilterBitTable,
    paths: TriggerPathCatalog,
    data: CombinationCatalog,
    mc: CombinationCatalog,
}

impl TriggerDefinitions {
    /// File name convention for per-year documents.
    #[must_use]
    pub fn file_for_year(dir: impl AsRef<Path>, year: u32) -> PathBuf {
        dir.as_ref().join(format!("tau_triggers_{year}.json"))
    }

    /// Load the document for `year` from `dir`.
    pub fn for_year(dir: impl AsRef<Path>, year: u32) -> Result<Self> {
        let definitions = Self::load(Self::file_for_year(dir, year))?;
        if let Some(declared) = definitions.year.filter(|&y| y != year) {
            tracing::warn!(requested = year, declared, "Definition document declares a different year");
        }
        Ok(definitions)
    }

    /// Load a document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TriggerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loading trigger definitions");
        Self::from_json_str(&text)
    }

    /// Load a document from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: DefinitionFile = serde_json::from_reader(reader)?;
        Self::from_document(&document)
    }

    /// Load a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: DefinitionFile = serde_json::from_str(json)?;
        Self::from_document(&document)
    }

    /// Validate a parsed document and build the tables.
    pub fn from_document(document: &DefinitionFile) -> Result<Self> {
        let filter_bits = FilterBitTable::from_raw(&document.filterbits)?;
        let paths = TriggerPathCatalog::from_raw(&document.hltpaths, &filter_bits)?;

        let mut data = CombinationCatalog::new(DataKind::Data);
        let mut mc = CombinationCatalog::new(DataKind::Mc);
        for (key, channels) in &document.hltcombs {
            let kind = DataKind::from_key(key).ok_or_else(|| {
                TriggerError::schema(format!(
                    "unknown data type '{key}' in hltcombs (expected data or mc)"
                ))
            })?;
            let catalog = CombinationCatalog::from_raw(kind, channels, &paths)?;
            match kind {
                DataKind::Data => data = catalog,
                DataKind::Mc => mc = catalog,
            }
        }

        tracing::debug!(
            year = ?document.year,
            filters = filter_bits.len(),
            paths = paths.len(),
            data_channels = data.len(),
            mc_channels = mc.len(),
            "Trigger definitions loaded"
        );

        Ok(Self {
            year: document.year,
            filter_bits,
            paths,
            data,
            mc,
        })
    }

    /// Year declared by the document, if any.
    #[must_use]
    pub const fn year(&self) -> Option<u32> {
        self.year
    }

    /// The filter-bit table.
    #[must_use]
    pub const fn filter_bits(&self) -> &FilterBitTable {
        &self.filter_bits
    }

    /// The path catalog.
    #[must_use]
    pub const fn paths(&self) -> &TriggerPathCatalog {
        &self.paths
    }

    /// Combinations for a data kind.
    #[must_use]
    pub const fn combinations(&self, kind: DataKind) -> &CombinationCatalog {
        match kind {
            DataKind::Data => &self.data,
            DataKind::Mc => &self.mc,
        }
    }

    /// Human-readable overview of the tables.
    #[must_use]
    pub fn summary(&self) -> DefinitionSummary<'_> {
        DefinitionSummary { definitions: self }
    }
}

/// Display adapter returned by [`TriggerDefinitions::summary`].
pub struct DefinitionSummary<'a> {
    definitions: &'a TriggerDefinitions,
}

impl fmt::Display for DefinitionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defs = self.definitions;
        if let Some(year) = defs.year {
            writeln!(f, "Trigger definitions for {year}")?;
        }

        for kind in [DataKind::Data, DataKind::Mc] {
            let catalog = defs.combinations(kind);
            if catalog.is_empty() {
                continue;
            }
            writeln!(f, "{kind} trigger requirements:")?;
            for comb in catalog.iter() {
                writeln!(f, "  {:>14}:  {}", comb.name, comb.description())?;
            }
        }

        let pair_paths: Vec<_> = defs.paths.iter().filter(|p| p.kind.is_pair()).collect();
        if !pair_paths.is_empty() {
            writeln!(f, "paths with two objects:")?;
            for path in pair_paths {
                let label = match path.kind {
                    PathKind::Cross => "cross",
                    _ => "double",
                };
                write!(f, "  {} ({label})", path.name)?;
                if let Some(range) = path.run_range {
                    write!(f, " runs {range}")?;
                }
                writeln!(f)?;
                for leg in path.legs() {
                    writeln!(
                        f,
                        "    {:>8} leg: {} = {}",
                        leg.object.to_string(),
                        leg.filters.join("+"),
                        leg.bits
                    )?;
                }
            }
        }

        for kind in defs.filter_bits.kinds() {
            writeln!(f, "{kind} filter bits:")?;
            for (name, bit) in defs.filter_bits.filters(kind) {
                writeln!(f, "  {bit:>6}: {name}")?;
            }
        }
        Ok(())
    }
}
