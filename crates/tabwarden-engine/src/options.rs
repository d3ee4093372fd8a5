//! Options bootstrap.

use tabwarden_core::types::Options;

use crate::error::StoreError;
use crate::host::OptionsSource;

/// Load options, writing the defaults first if the source has never been
/// populated. Called once at startup; handlers afterwards just `load`.
pub fn ensure_defaults<O: OptionsSource>(source: &mut O) -> Result<Options, StoreError> {
    if let Some(options) = source.load()? {
        return Ok(options);
    }
    let defaults = Options::default();
    source.store(&defaults)?;
    Ok(defaults)
}
