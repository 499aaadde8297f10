//! GC compatibility gate
//!
//! The alternate compiler emits barriers for a fixed set of collectors. With
//! any other collector it is switched off and the runtime keeps its baseline
//! compilers; this is a warning, not a startup failure.

use crate::env::GcKind;
use crate::error::Result;
use crate::flags::table::names::{ENABLE_JVMCI, USE_JVMCI_COMPILER};
use crate::flags::{FlagRegistry, FlagValue};
use tracing::warn;

/// Collectors the alternate compiler fully supports
pub const SUPPORTED_GCS: &[GcKind] = &[GcKind::Serial, GcKind::Parallel, GcKind::G1];

/// Whether `gc` fully supports the alternate compiler
pub fn gc_supports_jvmci(gc: GcKind) -> bool {
    SUPPORTED_GCS.contains(&gc)
}

/// Turn the alternate compiler off if `gc` cannot run with it.
///
/// Returns `true` when the compiler was disabled by this call.
pub fn check_supported_gc(registry: &mut FlagRegistry, gc: GcKind) -> Result<bool> {
    if !registry.get_bool(ENABLE_JVMCI)? || gc_supports_jvmci(gc) {
        return Ok(false);
    }
    warn!(
        target: "gc::jvmci",
        "Setting EnableJVMCI to false as selected GC does not support JVMCI: {}",
        gc.hs_err_name()
    );
    registry.set_default(ENABLE_JVMCI, FlagValue::Bool(false))?;
    registry.set_default(USE_JVMCI_COMPILER, FlagValue::Bool(false))?;
    Ok(true)
}
