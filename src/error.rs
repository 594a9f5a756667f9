use std::path::PathBuf;
use thiserror::Error;

use crate::config::DatasetKind;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("configuration for {country} not found")]
    ConfigNotFound { country: String },

    #[error("configuration for {country} is invalid: {reason}")]
    ConfigInvalid { country: String, reason: String },

    #[error("configuration for {country} declares no sheet for dataset `{kind}`")]
    SheetNotConfigured { country: String, kind: DatasetKind },

    #[error("source {} (sheet {sheet}) unavailable: {reason}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        sheet: String,
        reason: String,
    },

    #[error("snapshot cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("patch for {country} failed: {reason}")]
    Patch { country: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// True for the failures a page renders as "not available" for a country:
    /// nothing usable can be produced until the config or source is fixed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EtlError::ConfigNotFound { .. }
                | EtlError::ConfigInvalid { .. }
                | EtlError::SheetNotConfigured { .. }
                | EtlError::SourceUnavailable { .. }
        )
    }

    pub(crate) fn cache(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EtlError::Cache {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_covers_config_and_source_failures() {
        let not_found = EtlError::ConfigNotFound {
            country: "MOZ".into(),
        };
        let missing_sheet = EtlError::SheetNotConfigured {
            country: "MOZ".into(),
            kind: DatasetKind::History,
        };
        let source = EtlError::SourceUnavailable {
            path: PathBuf::from("book.xlsx"),
            sheet: "PiN".into(),
            reason: "no such file".into(),
        };
        assert!(not_found.is_unavailable());
        assert!(missing_sheet.is_unavailable());
        assert!(source.is_unavailable());

        let patch = EtlError::Patch {
            country: "COL".into(),
            reason: "boom".into(),
        };
        assert!(!patch.is_unavailable());
    }

    #[test]
    fn messages_name_the_country_and_kind() {
        let err = EtlError::SheetNotConfigured {
            country: "SSD".into(),
            kind: DatasetKind::Severity,
        };
        assert_eq!(
            err.to_string(),
            "configuration for SSD declares no sheet for dataset `severity`"
        );
    }
}
