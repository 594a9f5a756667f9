use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::PathBuf, str::FromStr};

/// The three canonical datasets every country can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Pin,
    History,
    Severity,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Pin, DatasetKind::History, DatasetKind::Severity];

    /// Key used under `sheets:` in a country config.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Pin => "pin",
            DatasetKind::History => "history",
            DatasetKind::Severity => "severity",
        }
    }

    /// File stem of the cached snapshot.
    pub fn snapshot_stem(&self) -> &'static str {
        match self {
            DatasetKind::Pin => "pin",
            DatasetKind::History => "hist",
            DatasetKind::Severity => "sev",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pin" => Ok(DatasetKind::Pin),
            "history" | "hist" => Ok(DatasetKind::History),
            "severity" | "sev" => Ok(DatasetKind::Severity),
            other => Err(format!("unknown dataset kind `{}`", other)),
        }
    }
}

/// A sheet is addressed either by its tab name or by its zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetId {
    Index(usize),
    Name(String),
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetId::Index(i) => write!(f, "#{}", i),
            SheetId::Name(n) => f.write_str(n),
        }
    }
}

/// Right-hand side of a `column_mapping` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSource {
    Single(String),
    Many(Vec<String>),
}

impl ColumnSource {
    pub fn names(&self) -> Vec<&str> {
        match self {
            ColumnSource::Single(s) => vec![s.as_str()],
            ColumnSource::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// One `canonical: source` entry, kept in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub canonical: String,
    pub source: ColumnSource,
}

fn default_header_row() -> usize {
    2
}

fn default_start_row() -> usize {
    3
}

fn default_no_data_tags() -> Vec<String> {
    vec!["NoPIN26".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default = "default_start_row")]
    pub start_row: usize,
    /// Tags some exports embed in numeric cells (e.g. `NoPIN26 1200`).
    #[serde(default = "default_no_data_tags")]
    pub no_data_tags: Vec<String>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            header_row: default_header_row(),
            start_row: default_start_row(),
            no_data_tags: default_no_data_tags(),
        }
    }
}

fn default_pcode_col() -> String {
    "Admin 2 P-Code".to_string()
}

fn default_admin_cols() -> Vec<String> {
    vec!["Admin 1".to_string(), "Admin 2".to_string()]
}

fn default_group_col() -> String {
    "Population Group".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default = "default_pcode_col")]
    pub pcode_col: String,
    /// Property of the boundary features the geo key joins against.
    #[serde(default)]
    pub geojson_key: Option<String>,
    /// Parent-area display names carried alongside the geo key.
    #[serde(default = "default_admin_cols")]
    pub admin_cols: Vec<String>,
    /// Population-group marker that signals several rows per area.
    #[serde(default = "default_group_col")]
    pub group_col: String,
}

impl Default for Geo {
    fn default() -> Self {
        Self {
            pcode_col: default_pcode_col(),
            geojson_key: None,
            admin_cols: default_admin_cols(),
            group_col: default_group_col(),
        }
    }
}

/// A validated, immutable country configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryConfig {
    pub iso: String,
    pub name: String,
    pub file_path: PathBuf,
    pub sheets: BTreeMap<DatasetKind, SheetId>,
    pub params: Params,
    pub column_mapping: Vec<MappingEntry>,
    pub sectors: Vec<String>,
    pub geo: Geo,
}

impl CountryConfig {
    pub fn sheet(&self, kind: DatasetKind) -> Option<&SheetId> {
        self.sheets.get(&kind)
    }

    pub fn geojson_key(&self) -> &str {
        self.geo.geojson_key.as_deref().unwrap_or(&self.geo.pcode_col)
    }

    pub fn is_sector(&self, name: &str) -> bool {
        self.sectors.iter().any(|s| s == name)
    }

    /// Sector-like names of the history sheet: `<sector> - old` / `<sector> - new`.
    pub fn is_history_sector(&self, name: &str) -> bool {
        [OLD_SUFFIX, NEW_SUFFIX].iter().any(|suffix| {
            name.strip_suffix(suffix)
                .map_or(false, |sector| self.is_sector(sector))
        })
    }

    pub fn old_col(sector: &str) -> String {
        format!("{}{}", sector, OLD_SUFFIX)
    }

    pub fn new_col(sector: &str) -> String {
        format!("{}{}", sector, NEW_SUFFIX)
    }
}

pub const OLD_SUFFIX: &str = " - old";
pub const NEW_SUFFIX: &str = " - new";
