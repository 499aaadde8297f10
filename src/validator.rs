//! Startup consistency validation for the alternate compiler's flags
//!
//! Runs once, after argument parsing and before any compilation. It derives
//! defaults implied by product mode, enforces the guard relationships in
//! [`COMPILER_GUARDED`] and [`ENABLE_GUARDED`], rejects incompatible
//! combinations and opens the native interface dump file when requested.
//!
//! The first inconsistency aborts validation; nothing is aggregated.
//!
//! In debug builds every compiler flag must be visited by exactly the logic
//! below. A flag added to the table without a matching check trips an
//! assertion at the end of a successful pass.

use crate::env::{CompLevel, VmEnvironment};
use crate::error::{messages, Error, Result};
use crate::flags::table::names::*;
use crate::flags::table::SHARED_FLAGS;
use crate::flags::{FlagRegistry, FlagValue};
use crate::jni_config::JniConfigDump;
use std::path::Path;
use tracing::{debug, warn};

/// `flag` must stay at its default unless `guard` is true
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyRule {
    pub flag: &'static str,
    pub guard: &'static str,
}

const fn rule(flag: &'static str, guard: &'static str) -> ConsistencyRule {
    ConsistencyRule { flag, guard }
}

/// Flags that only mean something when the alternate compiler is the default compiler
pub static COMPILER_GUARDED: &[ConsistencyRule] = &[
    rule(BOOTSTRAP_JVMCI, USE_JVMCI_COMPILER),
    rule(PRINT_BOOTSTRAP, USE_JVMCI_COMPILER),
    rule(JVMCI_THREADS, USE_JVMCI_COMPILER),
    rule(JVMCI_HOST_THREADS, USE_JVMCI_COMPILER),
];

/// Flags that only mean something when the alternate compiler is enabled
pub static ENABLE_GUARDED: &[ConsistencyRule] = &[
    rule(JVMCI_EVENT_LOG_LEVEL, ENABLE_JVMCI),
    rule(JVMCI_TRACE_LEVEL, ENABLE_JVMCI),
    rule(JVMCI_COUNTER_SIZE, ENABLE_JVMCI),
    rule(JVMCI_COUNTERS_EXCLUDE_COMPILER, ENABLE_JVMCI),
    rule(JVMCI_USE_FAST_LOCKING, ENABLE_JVMCI),
    rule(JVMCI_NMETHOD_SIZE_LIMIT, ENABLE_JVMCI),
    rule(JVMCI_PRINT_PROPERTIES, ENABLE_JVMCI),
    rule(METHOD_PROFILE_WIDTH, ENABLE_JVMCI),
    rule(JVMCI_THREADS_PER_NATIVE_LIBRARY_RUNTIME, ENABLE_JVMCI),
    rule(JVMCI_COMPILER_IDLE_DELAY, ENABLE_JVMCI),
    rule(USE_JVMCI_NATIVE_LIBRARY, ENABLE_JVMCI),
    rule(JVMCI_NATIVE_LIBRARY_THREAD_FRACTION, ENABLE_JVMCI),
    rule(JVMCI_LIB_PATH, ENABLE_JVMCI),
    rule(JVMCI_NATIVE_LIBRARY_ERROR_FILE, ENABLE_JVMCI),
    rule(JVMCI_LIB_DUMP_JNI_CONFIG, ENABLE_JVMCI),
];

/// Outcome of a successful validation
#[derive(Debug, Default)]
pub struct ValidatedConfig {
    /// Dump file opened because `JVMCILibDumpJNIConfig` was set
    pub jni_config: Option<JniConfigDump>,
    /// Non-fatal adjustments reported while validating
    pub warnings: Vec<String>,
}

/// Validate `registry` against `env`, adjusting derived defaults in place
pub fn check_flags_are_consistent(
    registry: &mut FlagRegistry,
    env: &VmEnvironment,
) -> Result<ValidatedConfig> {
    ConsistencyValidator::new(registry, env).run()
}

/// Single-use validation pass
pub struct ConsistencyValidator<'a> {
    registry: &'a mut FlagRegistry,
    env: &'a VmEnvironment,
    checked: Vec<bool>,
    warnings: Vec<String>,
}

impl<'a> ConsistencyValidator<'a> {
    pub fn new(registry: &'a mut FlagRegistry, env: &'a VmEnvironment) -> Self {
        let checked = registry
            .iter()
            .map(|flag| SHARED_FLAGS.contains(&flag.name))
            .collect();
        Self {
            registry,
            env,
            checked,
            warnings: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<ValidatedConfig> {
        self.derive_product_defaults()?;

        for rule in COMPILER_GUARDED {
            self.check_not_set(rule)?;
        }

        if self.registry.get_bool(USE_JVMCI_COMPILER)? {
            self.check_compiler_requirements()?;
        }

        if !self.registry.get_bool(ENABLE_JVMCI)? && self.registry.get_bool(EAGER_JVMCI)? {
            // Not an error so that tests can pass EagerJVMCI unconditionally.
            self.registry.set_default(EAGER_JVMCI, FlagValue::Bool(false))?;
            debug!("EagerJVMCI switched off because EnableJVMCI is false");
        }
        self.mark_checked(EAGER_JVMCI);

        for rule in ENABLE_GUARDED {
            self.check_not_set(rule)?;
        }

        #[cfg(debug_assertions)]
        self.assert_all_checked();

        let jni_config = match self.registry.get_str(JVMCI_LIB_DUMP_JNI_CONFIG)? {
            Some(path) => Some(JniConfigDump::create(Path::new(path))?),
            None => None,
        };

        Ok(ValidatedConfig {
            jni_config,
            warnings: self.warnings,
        })
    }

    fn derive_product_defaults(&mut self) -> Result<()> {
        if self.registry.get_bool(ENABLE_JVMCI_PRODUCT)? {
            if self.registry.is_default(ENABLE_JVMCI)? {
                self.registry.set_default(ENABLE_JVMCI, FlagValue::Bool(true))?;
                debug!("EnableJVMCI defaulted to true by EnableJVMCIProduct");
            } else if !self.registry.get_bool(ENABLE_JVMCI)? {
                return Err(Error::incompatible(messages::cannot_be_disabled(
                    ENABLE_JVMCI_PRODUCT,
                    ENABLE_JVMCI,
                )));
            }

            if self.registry.get_bool(ENABLE_JVMCI)? {
                if self.env.tier_stop_at_level != CompLevel::FullOptimization {
                    // The alternate compiler is only used at the full optimization level
                    if self.registry.get_bool(USE_JVMCI_COMPILER)? {
                        if !self.registry.is_default(USE_JVMCI_COMPILER)? {
                            let message = format!(
                                "disabling UseJVMCICompiler because TieredStopAtLevel != {}",
                                CompLevel::FullOptimization
                            );
                            warn!("{}", message);
                            self.warnings.push(message);
                        }
                        self.registry.set_ergo(USE_JVMCI_COMPILER, FlagValue::Bool(false))?;
                    }
                } else if self.registry.is_default(USE_JVMCI_COMPILER)? {
                    self.registry.set_default(USE_JVMCI_COMPILER, FlagValue::Bool(true))?;
                    debug!("UseJVMCICompiler defaulted to true by EnableJVMCIProduct");
                }
            }
        }

        self.mark_checked(USE_JVMCI_COMPILER);
        self.mark_checked(ENABLE_JVMCI);
        self.mark_checked(ENABLE_JVMCI_PRODUCT);
        Ok(())
    }

    fn check_compiler_requirements(&mut self) -> Result<()> {
        if self.registry.is_default(USE_JVMCI_NATIVE_LIBRARY)?
            && !self.registry.get_bool(USE_JVMCI_NATIVE_LIBRARY)?
        {
            let lib_dir = self.registry.get_str(JVMCI_LIB_PATH)?.map(Path::new);
            if let Some(path) = self.env.locate_native_library(lib_dir) {
                self.registry
                    .set_default(USE_JVMCI_NATIVE_LIBRARY, FlagValue::Bool(true))?;
                debug!(library = %path.display(), "UseJVMCINativeLibrary defaulted to true");
            }
        }

        if !self.registry.is_default(ENABLE_JVMCI)? && !self.registry.get_bool(ENABLE_JVMCI)? {
            return Err(Error::incompatible(messages::cannot_be_disabled(
                USE_JVMCI_COMPILER,
                ENABLE_JVMCI,
            )));
        }
        if self.registry.is_default(ENABLE_JVMCI)? {
            self.registry.set_default(ENABLE_JVMCI, FlagValue::Bool(true))?;
        }

        let bootstrap = self.registry.get_bool(BOOTSTRAP_JVMCI)?;
        if bootstrap && self.registry.get_bool(USE_JVMCI_NATIVE_LIBRARY)? {
            return Err(Error::incompatible(messages::not_compatible_with_flag(
                BOOTSTRAP_JVMCI,
                USE_JVMCI_NATIVE_LIBRARY,
            )));
        }
        if bootstrap && self.env.tier_stop_at_level < CompLevel::FullOptimization {
            return Err(Error::incompatible(messages::not_compatible_with_value(
                BOOTSTRAP_JVMCI,
                "TieredStopAtLevel",
                self.env.tier_stop_at_level,
            )));
        }
        Ok(())
    }

    fn check_not_set(&mut self, rule: &ConsistencyRule) -> Result<()> {
        self.mark_checked(rule.flag);
        if !self.registry.get_bool(rule.guard)? && !self.registry.is_default(rule.flag)? {
            return Err(Error::improper_option(rule.flag, rule.guard));
        }
        Ok(())
    }

    fn mark_checked(&mut self, name: &str) {
        if let Some(i) = self.registry.index_of(name) {
            self.checked[i] = true;
        }
    }

    #[cfg(debug_assertions)]
    fn assert_all_checked(&self) {
        for (flag, checked) in self.registry.iter().zip(&self.checked) {
            assert!(*checked, "{} flag not checked", flag.name);
        }
    }
}
