//! Country-specific remediation. The generic pipeline never names a
//! country; it hands every finished table to a [`PatchRegistry`].

pub mod colombia;
pub mod registry;

pub use colombia::ColombiaHistoryPatch;
pub use registry::PatchRegistry;

use crate::config::{CountryConfig, DatasetKind};
use crate::error::Result;
use crate::table::CanonicalTable;

/// What a patch may look at besides the table it fixes.
pub struct PatchContext<'a> {
    pub config: &'a CountryConfig,
    pub kind: DatasetKind,
    pin: &'a dyn Fn() -> Result<CanonicalTable>,
}

impl<'a> PatchContext<'a> {
    pub fn new(
        config: &'a CountryConfig,
        kind: DatasetKind,
        pin: &'a dyn Fn() -> Result<CanonicalTable>,
    ) -> Self {
        Self { config, kind, pin }
    }

    /// The country's canonical PiN table, loaded through the same
    /// read-through cache as any other dataset.
    pub fn pin_table(&self) -> Result<CanonicalTable> {
        (self.pin)()
    }
}

pub trait CountryPatch: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies(&self, kind: DatasetKind) -> bool;

    /// Fix `table` in place. `Ok(false)` means the patch had nothing to do.
    fn apply(&self, ctx: &PatchContext<'_>, table: &mut CanonicalTable) -> Result<bool>;
}
