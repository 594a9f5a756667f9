use std::collections::HashMap;
use tracing::{info, warn};

use super::{ColombiaHistoryPatch, CountryPatch, PatchContext};
use crate::config::normalize_iso;
use crate::table::CanonicalTable;

/// ISO code → patches for that country. The only place a country code
/// appears in code.
#[derive(Default)]
pub struct PatchRegistry {
    patches: HashMap<String, Vec<Box<dyn CountryPatch>>>,
}

impl PatchRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The patches shipped with the crate.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        reg.register("COL", Box::new(ColombiaHistoryPatch::default()));
        reg
    }

    pub fn register(&mut self, country: &str, patch: Box<dyn CountryPatch>) {
        self.patches
            .entry(normalize_iso(country))
            .or_default()
            .push(patch);
    }

    pub fn has_patches(&self, country: &str) -> bool {
        self.patches.contains_key(&normalize_iso(country))
    }

    /// Run every applicable patch. Each one works on a copy; a failing
    /// patch is logged and the table it was given is kept.
    pub fn apply(&self, ctx: &PatchContext<'_>, table: CanonicalTable) -> CanonicalTable {
        let Some(patches) = self.patches.get(&ctx.config.iso) else {
            return table;
        };

        let mut current = table;
        for patch in patches.iter().filter(|p| p.applies(ctx.kind)) {
            let mut candidate = current.clone();
            match patch.apply(ctx, &mut candidate) {
                Ok(true) => {
                    info!(country = %ctx.config.iso, kind = %ctx.kind, patch = patch.name(), "patch applied");
                    current = candidate;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        country = %ctx.config.iso,
                        kind = %ctx.kind,
                        patch = patch.name(),
                        "patch failed, keeping unpatched table: {}",
                        e
                    );
                }
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, CountryConfig, DatasetKind};
    use crate::error::{EtlError, Result};
    use crate::table::Column;
    use std::path::Path;

    struct Doubler;
    struct Broken;

    impl CountryPatch for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }
        fn applies(&self, kind: DatasetKind) -> bool {
            kind == DatasetKind::Pin
        }
        fn apply(&self, _ctx: &PatchContext<'_>, table: &mut CanonicalTable) -> Result<bool> {
            let doubled = table
                .numbers("v")
                .map(|v| v.iter().map(|x| x.map(|x| x * 2.0)).collect())
                .unwrap_or_default();
            table.put_numbers("v", doubled);
            Ok(true)
        }
    }

    impl CountryPatch for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn applies(&self, _kind: DatasetKind) -> bool {
            true
        }
        fn apply(&self, _ctx: &PatchContext<'_>, table: &mut CanonicalTable) -> Result<bool> {
            // a half-finished edit must not leak out
            table.put_numbers("v", vec![Some(-1.0)]);
            Err(EtlError::Patch {
                country: "ZZZ".into(),
                reason: "boom".into(),
            })
        }
    }

    fn config(iso: &str) -> CountryConfig {
        parse_config(iso, "file_path: x.xlsx\nsheets: {pin: 0}\n", Path::new(".")).unwrap()
    }

    fn table() -> CanonicalTable {
        CanonicalTable::new(vec![Column::number("v", vec![Some(2.0)])]).unwrap()
    }

    fn no_pin() -> Result<CanonicalTable> {
        Ok(CanonicalTable::default())
    }

    #[test]
    fn patches_only_their_own_country_and_kind() {
        let mut reg = PatchRegistry::empty();
        reg.register("zzz", Box::new(Doubler));

        let zzz = config("ZZZ");
        let out = reg.apply(&PatchContext::new(&zzz, DatasetKind::Pin, &no_pin), table());
        assert_eq!(out.numbers("v"), Some(&[Some(4.0)][..]));

        let out = reg.apply(&PatchContext::new(&zzz, DatasetKind::History, &no_pin), table());
        assert_eq!(out, table());

        let moz = config("MOZ");
        let out = reg.apply(&PatchContext::new(&moz, DatasetKind::Pin, &no_pin), table());
        assert_eq!(out, table());
    }

    #[test]
    fn failure_keeps_the_unpatched_table() {
        let mut reg = PatchRegistry::empty();
        reg.register("ZZZ", Box::new(Broken));
        let zzz = config("ZZZ");
        let out = reg.apply(&PatchContext::new(&zzz, DatasetKind::Pin, &no_pin), table());
        assert_eq!(out, table());
    }

    #[test]
    fn builtin_names_only_colombia() {
        let reg = PatchRegistry::builtin();
        assert!(reg.has_patches("col"));
        assert!(!reg.has_patches("MOZ"));
    }
}
