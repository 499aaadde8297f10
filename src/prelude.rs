//! Prelude module for convenient imports
//!
//! ```no_run
//! use jitctl::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut ctx = JitContext::new(VmEnvironment::new().with_gc(GcKind::Z));
//!     ctx.startup(&["-XX:+EnableJVMCIProduct"])?;
//!     assert!(matches!(ctx.instance(), Err(Error::NotEnabled)));
//!     Ok(())
//! }
//! ```

// Error handling
pub use crate::error::{Error, ErrorKind, Result};

// Flags
pub use crate::flags::{FlagKind, FlagOrigin, FlagRegistry, FlagType, FlagValue};

// Environment
pub use crate::env::{CompLevel, GcKind, NativeLibraryLocator, VmEnvironment};

// Startup
pub use crate::startup::{JitContext, StartupPhase};
pub use crate::validator::ValidatedConfig;

// Compiler controller
pub use crate::compiler::{
    AltCompiler, CodeCache, CodeInstallStats, CompileEnv, CompileQueue, CompileRequest,
    CompiledCode, CompilerBackend, CompilerConfig, CompilerState, DirectiveSet, EntryBci,
    FatalHandler, InstalledCode, MethodDescriptor, ThreadedBroker,
};
