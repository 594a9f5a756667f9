use glob::glob;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

use super::types::{
    ColumnSource, CountryConfig, DatasetKind, Geo, MappingEntry, Params, SheetId,
};
use crate::error::{EtlError, Result};

/// On-disk shape of `<ISO>.yaml`; required keys are optional here so that
/// their absence surfaces as `ConfigInvalid` rather than a parse error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    name: Option<String>,
    file_path: Option<String>,
    sheets: Option<BTreeMap<String, SheetId>>,
    #[serde(default)]
    params: Params,
    #[serde(default)]
    column_mapping: serde_yaml::Mapping,
    #[serde(default)]
    sectors: Vec<String>,
    #[serde(default)]
    geo: Geo,
}

/// Loads `<config_dir>/<ISO>.yaml`, memoising each parsed config for the
/// lifetime of the resolver.
pub struct ConfigResolver {
    dir: PathBuf,
    data_root: PathBuf,
    memo: RwLock<HashMap<String, Arc<CountryConfig>>>,
}

impl ConfigResolver {
    pub fn new(dir: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            data_root: data_root.into(),
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the config for `country` (case-insensitive).
    pub fn resolve(&self, country: &str) -> Result<Arc<CountryConfig>> {
        let iso = normalize_iso(country);
        if iso.is_empty() {
            return Err(EtlError::ConfigNotFound { country: iso });
        }

        if let Some(cfg) = self.memo.read().unwrap_or_else(PoisonError::into_inner).get(&iso) {
            return Ok(Arc::clone(cfg));
        }

        let path = self.dir.join(format!("{}.yaml", iso));
        if !path.is_file() {
            return Err(EtlError::ConfigNotFound { country: iso });
        }
        let text = fs::read_to_string(&path)?;
        let cfg = Arc::new(parse_config(&iso, &text, &self.data_root)?);
        debug!(country = %iso, path = %path.display(), "loaded config");

        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(iso, Arc::clone(&cfg));
        Ok(cfg)
    }

    /// ISO codes of every `*.yaml` file in the config directory, sorted.
    pub fn countries(&self) -> Result<Vec<String>> {
        let pattern = format!("{}/*.yaml", self.dir.display());
        let paths = glob(&pattern).map_err(|e| EtlError::ConfigInvalid {
            country: String::new(),
            reason: format!("bad config directory pattern {}: {}", pattern, e),
        })?;

        let mut out = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        out.push(normalize_iso(stem));
                    }
                }
                Err(e) => warn!("cannot read config entry: {}", e),
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }
}

pub fn normalize_iso(country: &str) -> String {
    country.trim().to_uppercase()
}

/// Parse and validate one country config. A relative `file_path` is
/// resolved against `data_root`.
pub fn parse_config(iso: &str, text: &str, data_root: &Path) -> Result<CountryConfig> {
    let invalid = |reason: String| EtlError::ConfigInvalid {
        country: iso.to_string(),
        reason,
    };

    let raw: RawConfig = serde_yaml::from_str(text).map_err(|e| invalid(e.to_string()))?;

    let mut missing = Vec::new();
    if raw.file_path.as_deref().map_or(true, |p| p.trim().is_empty()) {
        missing.push("file_path");
    }
    if raw.sheets.is_none() {
        missing.push("sheets");
    }
    if !missing.is_empty() {
        return Err(invalid(format!("missing required keys: {}", missing.join(", "))));
    }

    let file_path = PathBuf::from(raw.file_path.unwrap_or_default());
    let file_path = if file_path.is_relative() {
        data_root.join(file_path)
    } else {
        file_path
    };

    let mut sheets = BTreeMap::new();
    for (key, sheet) in raw.sheets.unwrap_or_default() {
        match key.parse::<DatasetKind>() {
            Ok(kind) => {
                sheets.insert(kind, sheet);
            }
            Err(_) => warn!(country = %iso, key = %key, "ignoring unknown sheet key"),
        }
    }

    let mut column_mapping = Vec::with_capacity(raw.column_mapping.len());
    for (key, value) in raw.column_mapping {
        let canonical = match key {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(invalid(format!(
                    "column_mapping key must be a string, got {:?}",
                    other
                )))
            }
        };
        let source: ColumnSource = serde_yaml::from_value(value).map_err(|e| {
            invalid(format!(
                "column_mapping `{}` must be a string or list of strings: {}",
                canonical, e
            ))
        })?;
        column_mapping.push(MappingEntry { canonical, source });
    }

    Ok(CountryConfig {
        iso: iso.to_string(),
        name: raw.name.unwrap_or_else(|| iso.to_string()),
        file_path,
        sheets,
        params: raw.params,
        column_mapping,
        sectors: raw.sectors,
        geo: raw.geo,
    })
}
