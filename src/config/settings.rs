use clap::Args;
use std::path::PathBuf;

/// Where configs, source workbooks and snapshots live.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Directory holding one `<ISO>.yaml` per country
    #[arg(long, env = "PINSCRAPER_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Root of the snapshot cache (`<cache_dir>/<ISO>/<kind>.parquet`)
    #[arg(long, env = "PINSCRAPER_CACHE_DIR", default_value = "precomputed")]
    pub cache_dir: PathBuf,

    /// Base for relative `file_path` entries in country configs
    #[arg(long, env = "PINSCRAPER_DATA_ROOT", default_value = ".")]
    pub data_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            cache_dir: PathBuf::from("precomputed"),
            data_root: PathBuf::from("."),
        }
    }
}
