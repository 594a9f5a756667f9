//! Canonical column names shared by the pipeline and its consumers.

pub const FINAL_PIN: &str = "Final PiN";
pub const POPULATION: &str = "Population";
pub const PCT_PIN: &str = "% PiN";

pub const OLD_PIN: &str = "Old PiN";
pub const NEW_PIN: &str = "New PiN";
pub const PIN_DELTA: &str = "PiN Delta";
pub const PIN_DELTA_PCT: &str = "PiN Delta %";

pub const FINAL_SEVERITY: &str = "Final Severity";
pub const SEVERITY: &str = "Severity";

/// Per-sector share of the population, e.g. `Health%`.
pub fn sector_share(sector: &str) -> String {
    format!("{}%", sector)
}
