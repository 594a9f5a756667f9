use tracing::{debug, warn};

use super::aggregate::{aggregate_by_area, sum_present, AggregationPolicy};
use crate::config::CountryConfig;
use crate::table::names::{
    sector_share, FINAL_PIN, NEW_PIN, OLD_PIN, PCT_PIN, PIN_DELTA, PIN_DELTA_PCT, POPULATION,
};
use crate::table::CanonicalTable;

/// `numerator / denominator`, missing when either side is missing or the
/// denominator is zero.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

fn column_ratio(table: &CanonicalTable, numerator: &str, denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    let num = table.numbers(numerator);
    denominator
        .iter()
        .enumerate()
        .map(|(i, d)| ratio(num.and_then(|n| n[i]), *d))
        .collect()
}

/// `% PiN` plus a `<sector>%` share for every sector column the sheet does
/// not already provide. Needs a numeric `Population` column.
pub fn derive_pin(table: &mut CanonicalTable, sectors: &[String]) {
    let Some(population) = table.numbers(POPULATION).map(<[_]>::to_vec) else {
        warn!("no numeric `{}` column; PiN ratios not derived", POPULATION);
        return;
    };
    if !table.has(FINAL_PIN) {
        debug!("no `{}` column; `{}` will be missing throughout", FINAL_PIN, PCT_PIN);
    }

    let pct = column_ratio(table, FINAL_PIN, &population);
    table.put_numbers(PCT_PIN, pct);

    for sector in sectors {
        let share_col = sector_share(sector);
        if table.numbers(sector).is_none() || table.has(&share_col) {
            continue;
        }
        let share = column_ratio(table, sector, &population);
        table.put_numbers(&share_col, share);
    }
}

/// Sectors carrying both a numeric `<sector> - old` and `<sector> - new`.
pub fn paired_sectors<'a>(table: &CanonicalTable, sectors: &'a [String]) -> Vec<&'a str> {
    sectors
        .iter()
        .filter(|s| {
            table.numbers(&CountryConfig::old_col(s)).is_some()
                && table.numbers(&CountryConfig::new_col(s)).is_some()
        })
        .map(String::as_str)
        .collect()
}

/// Year-over-year totals over the paired sectors: `Old PiN`, `New PiN`,
/// `PiN Delta`, `PiN Delta %`. A sector missing either side is left out of
/// all four. Returns the sectors used.
pub fn derive_history<'a>(table: &mut CanonicalTable, sectors: &'a [String]) -> Vec<&'a str> {
    let paired = paired_sectors(table, sectors);
    if paired.is_empty() {
        warn!("no sector has both old and new figures; trend totals not derived");
        return paired;
    }
    let unpaired: Vec<&String> = sectors.iter().filter(|s| !paired.contains(&s.as_str())).collect();
    if !unpaired.is_empty() {
        debug!(sectors = ?unpaired, "sectors excluded from trend totals");
    }

    let olds: Vec<&[Option<f64>]> = paired
        .iter()
        .filter_map(|s| table.numbers(&CountryConfig::old_col(s)))
        .collect();
    let news: Vec<&[Option<f64>]> = paired
        .iter()
        .filter_map(|s| table.numbers(&CountryConfig::new_col(s)))
        .collect();

    let n = table.len();
    let old_pin: Vec<Option<f64>> = (0..n).map(|i| sum_present(olds.iter().map(|c| c[i]))).collect();
    let new_pin: Vec<Option<f64>> = (0..n).map(|i| sum_present(news.iter().map(|c| c[i]))).collect();
    let delta: Vec<Option<f64>> = old_pin
        .iter()
        .zip(&new_pin)
        .map(|(o, n)| match (o, n) {
            (Some(o), Some(n)) => Some(n - o),
            _ => None,
        })
        .collect();
    let delta_pct: Vec<Option<f64>> = delta
        .iter()
        .zip(&old_pin)
        .map(|(d, o)| ratio(*d, *o))
        .collect();

    table.put_numbers(OLD_PIN, old_pin);
    table.put_numbers(NEW_PIN, new_pin);
    table.put_numbers(PIN_DELTA, delta);
    table.put_numbers(PIN_DELTA_PCT, delta_pct);
    paired
}

/// Severity is single-valued per area: keep the first row for each geo
/// key, and treat any value of `ordinal_cols` outside 1..=5 (or
/// non-integral) as missing.
pub fn derive_severity(table: CanonicalTable, geo_key: &str, ordinal_cols: &[String]) -> CanonicalTable {
    let mut table = aggregate_by_area(table, geo_key, "", AggregationPolicy::FirstOccurrence);
    for col in ordinal_cols {
        let Some(values) = table.numbers(col) else { continue };
        let mut rejected = 0usize;
        let cleaned: Vec<Option<f64>> = values
            .iter()
            .map(|v| {
                let kept = v.filter(|x| x.fract() == 0.0 && (1.0..=5.0).contains(x));
                if v.is_some() && kept.is_none() {
                    rejected += 1;
                }
                kept
            })
            .collect();
        if rejected > 0 {
            debug!(column = %col, rejected, "severity values outside 1..=5 set to missing");
        }
        table.put_numbers(col, cleaned);
    }
    table
}
