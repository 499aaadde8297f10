//! jitctl: configuration gating and instance control for a pluggable JIT compiler
//!
//! A managed runtime can hand its optimizing tier to an alternate compiler.
//! This crate decides at startup whether that compiler may run, reconciling a
//! table of interdependent flags, and then controls the single compiler
//! instance: its bootstrap, its counters and its code install statistics.
//!
//! # Quick Start
//!
//! ```no_run
//! use jitctl::prelude::*;
//!
//! fn main() -> jitctl::Result<()> {
//!     let mut ctx = JitContext::new(VmEnvironment::new());
//!     ctx.startup(&["-XX:+EnableJVMCIProduct", "-XX:+UseG1GC"])?;
//!     println!("JVMCI enabled: {}", ctx.registry().get_bool("EnableJVMCI")?);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! Startup flows: arguments → [`flags`] → [`promoter`] → [`validator`] → [`gc_gate`] → [`compiler`]
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Configuration** | [`flags`], [`env`], [`error`](Error) |
//! | **Startup checks** | [`validator`], [`promoter`], [`gc_gate`], [`jni_config`] |
//! | **Controller** | [`compiler`], [`startup`] |

pub mod compiler;
pub mod env;
pub mod flags;
pub mod gc_gate;
pub mod jni_config;
pub mod prelude;
pub mod promoter;
pub mod startup;
pub mod validator;

mod error;

pub use error::{messages, Error, ErrorKind, Result};
pub use startup::JitContext;

/// jitctl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
