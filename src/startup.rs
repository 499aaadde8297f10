//! Startup sequence
//!
//! [`JitContext`] replaces process-wide globals: it owns the flag registry,
//! the VM environment and at most one [`AltCompiler`]. Startup runs in a fixed
//! order and every step checks that the previous one has happened:
//!
//! 1. [`JitContext::apply_args`] parses `-XX:` options, handling unlock
//!    options, collector selection, `TieredStopAtLevel` and product mode
//! 2. [`JitContext::validate`] runs the consistency validator
//! 3. [`JitContext::check_gc`] runs the GC compatibility gate
//! 4. [`JitContext::create_compiler`] constructs the controller

use crate::compiler::{AltCompiler, CodeCache, CompilerBackend, CompilerConfig, CompilerState};
use crate::compiler::{ExitOnFatal, FatalHandler};
use crate::env::{CompLevel, GcKind, VmEnvironment};
use crate::error::{Error, Result};
use crate::flags::args::{parse_all, Setting, VmOption};
use crate::flags::table::names::{ENABLE_JVMCI, ENABLE_JVMCI_PRODUCT};
use crate::flags::{FlagKind, FlagOrigin, FlagRegistry, FlagType, FlagValue};
use crate::gc_gate::check_supported_gc;
use crate::promoter::enable_product_mode;
use crate::validator::{check_flags_are_consistent, ValidatedConfig};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const UNLOCK_EXPERIMENTAL: &str = "UnlockExperimentalVMOptions";
pub const UNLOCK_DIAGNOSTIC: &str = "UnlockDiagnosticVMOptions";
pub const TIERED_STOP_AT_LEVEL: &str = "TieredStopAtLevel";

/// How far startup has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StartupPhase {
    Created,
    ArgumentsApplied,
    Validated,
    GcChecked,
    CompilerCreated,
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartupPhase::Created => "created",
            StartupPhase::ArgumentsApplied => "arguments applied",
            StartupPhase::Validated => "validated",
            StartupPhase::GcChecked => "gc checked",
            StartupPhase::CompilerCreated => "compiler created",
        };
        f.write_str(name)
    }
}

/// Owner of the startup state and the single compiler instance
pub struct JitContext {
    registry: FlagRegistry,
    env: VmEnvironment,
    phase: StartupPhase,
    unlock_experimental: bool,
    unlock_diagnostic: bool,
    validated: Option<ValidatedConfig>,
    compiler: Option<Arc<AltCompiler>>,
    fatal_handler: Arc<dyn FatalHandler>,
    bootstrap_poll_interval: Option<Duration>,
}

impl JitContext {
    pub fn new(env: VmEnvironment) -> Self {
        Self::with_registry(FlagRegistry::new(), env)
    }

    pub fn with_registry(registry: FlagRegistry, env: VmEnvironment) -> Self {
        Self {
            registry,
            env,
            phase: StartupPhase::Created,
            unlock_experimental: false,
            unlock_diagnostic: false,
            validated: None,
            compiler: None,
            fatal_handler: Arc::new(ExitOnFatal),
            bootstrap_poll_interval: None,
        }
    }

    /// Handler given to the compiler created by this context
    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal_handler = handler;
        self
    }

    pub fn with_bootstrap_poll_interval(mut self, interval: Duration) -> Self {
        self.bootstrap_poll_interval = Some(interval);
        self
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    pub fn env(&self) -> &VmEnvironment {
        &self.env
    }

    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn validated(&self) -> Option<&ValidatedConfig> {
        self.validated.as_ref()
    }

    fn require_phase(&self, operation: &'static str, allowed: &[StartupPhase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::invalid_state(operation, self.phase))
        }
    }

    /// Apply command line options
    ///
    /// Unlock options take effect for the whole list regardless of position,
    /// and `-XX:+EnableJVMCIProduct` promotes the product flags before any
    /// other option is applied.
    pub fn apply_args<S: AsRef<str>>(&mut self, args: &[S]) -> Result<()> {
        self.require_phase(
            "apply arguments",
            &[StartupPhase::Created, StartupPhase::ArgumentsApplied],
        )?;
        let options = parse_all(args)?;

        for option in &options {
            if option.is_enable(UNLOCK_EXPERIMENTAL) {
                self.unlock_experimental = true;
            } else if option.is_enable(UNLOCK_DIAGNOSTIC) {
                self.unlock_diagnostic = true;
            }
        }
        if options.iter().any(|o| o.is_enable(ENABLE_JVMCI_PRODUCT)) {
            enable_product_mode(&mut self.registry, FlagOrigin::CommandLine)?;
        }

        for option in &options {
            self.apply_option(option)?;
        }
        self.phase = StartupPhase::ArgumentsApplied;
        Ok(())
    }

    fn apply_option(&mut self, option: &VmOption) -> Result<()> {
        let name = option.name.as_str();
        match name {
            UNLOCK_EXPERIMENTAL | UNLOCK_DIAGNOSTIC => return Ok(()),
            TIERED_STOP_AT_LEVEL => {
                let Setting::Assign(text) = &option.setting else {
                    return Err(type_mismatch(option, FlagType::Int));
                };
                let level = match FlagValue::parse(FlagType::Int, name, text)? {
                    FlagValue::Int(level) => level,
                    _ => return Err(type_mismatch(option, FlagType::Int)),
                };
                self.env.tier_stop_at_level = CompLevel::from_level(level)?;
                return Ok(());
            }
            _ => {}
        }

        if let Some(gc) = GcKind::from_flag(name) {
            if option.as_bool() == Some(true) {
                self.env.gc = gc;
            }
            return Ok(());
        }
        if option.is_enable(ENABLE_JVMCI_PRODUCT) {
            // Applied together with the promotion
            return Ok(());
        }

        let flag = self.registry.lookup(name)?;
        match flag.kind {
            FlagKind::Experimental if !self.unlock_experimental => {
                return Err(Error::FlagLocked {
                    flag: name.to_string(),
                    kind: "experimental",
                    unlock: UNLOCK_EXPERIMENTAL,
                });
            }
            FlagKind::Diagnostic if !self.unlock_diagnostic => {
                return Err(Error::FlagLocked {
                    flag: name.to_string(),
                    kind: "diagnostic",
                    unlock: UNLOCK_DIAGNOSTIC,
                });
            }
            FlagKind::Develop if !cfg!(debug_assertions) => {
                return Err(Error::DevelopOnly(name.to_string()));
            }
            _ => {}
        }

        let value = match (&option.setting, flag.flag_type) {
            (Setting::Assign(text), ty) => FlagValue::parse(ty, name, text)?,
            (_, FlagType::Bool) => FlagValue::Bool(option.setting == Setting::Enable),
            (_, ty) => return Err(type_mismatch(option, ty)),
        };
        debug!(flag = name, %value, "option applied");
        self.registry.set(name, value, FlagOrigin::CommandLine)
    }

    /// Run the consistency validator over the applied options
    pub fn validate(&mut self) -> Result<&ValidatedConfig> {
        self.require_phase(
            "validate",
            &[StartupPhase::Created, StartupPhase::ArgumentsApplied],
        )?;
        let validated = check_flags_are_consistent(&mut self.registry, &self.env).map_err(|e| {
            error!("{}", e);
            e
        })?;
        self.phase = StartupPhase::Validated;
        Ok(self.validated.insert(validated))
    }

    /// Disable the alternate compiler if the selected collector cannot run it
    pub fn check_gc(&mut self) -> Result<bool> {
        self.require_phase("check gc", &[StartupPhase::Validated])?;
        let disabled = check_supported_gc(&mut self.registry, self.env.gc)?;
        self.phase = StartupPhase::GcChecked;
        Ok(disabled)
    }

    /// Apply, validate and gate in one go
    pub fn startup<S: AsRef<str>>(&mut self, args: &[S]) -> Result<()> {
        self.apply_args(args)?;
        self.validate()?;
        self.check_gc()?;
        Ok(())
    }

    /// Write the required native interface entries to the dump file, if one was requested
    pub fn dump_jni_config(&mut self) -> Result<Option<PathBuf>> {
        let Some(dump) = self.validated.as_mut().and_then(|v| v.jni_config.as_mut()) else {
            return Ok(None);
        };
        dump.write_required()?;
        dump.flush()?;
        Ok(Some(dump.path().to_path_buf()))
    }

    /// Typed configuration for the controller
    pub fn compiler_config(&self) -> Result<CompilerConfig> {
        let config = CompilerConfig::from_registry(&self.registry, &self.env)?;
        Ok(match self.bootstrap_poll_interval {
            Some(interval) => config.with_bootstrap_poll_interval(interval),
            None => config,
        })
    }

    /// Construct the single compiler instance
    pub fn create_compiler(
        &mut self,
        backend: Arc<dyn CompilerBackend>,
        code_cache: Arc<dyn CodeCache>,
    ) -> Result<Arc<AltCompiler>> {
        if self.compiler.is_some() {
            return Err(Error::InstanceAlreadyCreated);
        }
        self.require_phase("create compiler", &[StartupPhase::GcChecked])?;
        if !self.registry.get_bool(ENABLE_JVMCI)? {
            return Err(Error::NotEnabled);
        }

        let compiler = AltCompiler::new(self.compiler_config()?, backend, code_cache)
            .with_fatal_handler(Arc::clone(&self.fatal_handler));
        let compiler = Arc::new(compiler);
        debug!(compiler = compiler.name(), "compiler instance created");
        self.compiler = Some(Arc::clone(&compiler));
        self.phase = StartupPhase::CompilerCreated;
        Ok(compiler)
    }

    /// The live compiler instance
    pub fn instance(&self) -> Result<&Arc<AltCompiler>> {
        if !self.registry.get_bool(ENABLE_JVMCI)? {
            return Err(Error::NotEnabled);
        }
        self.compiler.as_ref().ok_or(Error::InstanceNotCreated)
    }

    pub fn compiler_state(&self) -> CompilerState {
        self.compiler
            .as_ref()
            .map_or(CompilerState::Uninitialized, |c| c.state())
    }
}

impl fmt::Debug for JitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitContext")
            .field("phase", &self.phase)
            .field("env", &self.env)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

fn type_mismatch(option: &VmOption, expected: FlagType) -> Error {
    let value = match &option.setting {
        Setting::Enable => "+".to_string(),
        Setting::Disable => "-".to_string(),
        Setting::Assign(text) => text.clone(),
    };
    Error::FlagTypeMismatch {
        flag: option.name.clone(),
        expected: expected.name(),
        value,
    }
}
