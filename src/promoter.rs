//! Product-mode promotion
//!
//! Reclassifies the alternate compiler's experimental flags as product flags
//! and turns on `EnableJVMCIProduct`. The defaults that product mode implies
//! for `EnableJVMCI` and `UseJVMCICompiler` are left to the consistency
//! validator so that explicit settings keep precedence.

use crate::error::{Error, Result};
use crate::flags::table::names::ENABLE_JVMCI_PRODUCT;
use crate::flags::table::PRODUCT_MODE_FLAGS;
use crate::flags::{FlagOrigin, FlagRegistry, FlagValue};
use tracing::debug;

/// Promote [`PRODUCT_MODE_FLAGS`] and set `EnableJVMCIProduct` from `origin`
pub fn enable_product_mode(registry: &mut FlagRegistry, origin: FlagOrigin) -> Result<()> {
    promote_flags(registry, PRODUCT_MODE_FLAGS, origin)
}

/// Promote an explicit flag list
///
/// An unknown name means the list and the registry disagree, which is an
/// internal error. Flags already reclassified stay reclassified when a later
/// step fails.
pub fn promote_flags(
    registry: &mut FlagRegistry,
    names: &[&str],
    origin: FlagOrigin,
) -> Result<()> {
    for name in names {
        let flag = registry.find_mut(name).ok_or_else(|| {
            Error::internal(format!("product mode flag {} is not declared", name))
        })?;
        flag.set_product();
    }

    registry
        .set(ENABLE_JVMCI_PRODUCT, FlagValue::Bool(true), origin)
        .map_err(|e| match e {
            Error::OriginPrecedence { .. } => e,
            other => Error::internal(format!("cannot enable product mode: {}", other)),
        })?;

    debug!(flags = names.len(), %origin, "JVMCI flags promoted to product");
    Ok(())
}
