//! Typed snapshot of the flags the controller reads after startup

use crate::env::VmEnvironment;
use crate::error::Result;
use crate::flags::table::names::*;
use crate::flags::table::LIBJVMCI_ERR_FILE;
use crate::flags::FlagRegistry;
use std::path::PathBuf;
use std::time::Duration;

/// Sleep between queue polls while bootstrapping
pub const DEFAULT_BOOTSTRAP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Holder prefixes of the compiler's own classes
pub const DEFAULT_COMPILER_MODULE_PREFIXES: &[&str] = &["jdk.vm.ci.", "jdk.graal.compiler."];

/// Controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Compile a fixed method set before the first application compile
    pub bootstrap: bool,
    /// Log bootstrap progress and summary
    pub print_bootstrap: bool,
    /// Compiler runs from the native shared library
    pub native_library: bool,
    pub threads: usize,
    pub host_threads: usize,
    /// How long an idle compiler thread waits before reporting an empty queue
    pub idle_delay: Duration,
    pub native_library_thread_fraction: f64,
    pub threads_per_native_library_runtime: u64,
    pub nmethod_size_limit: usize,
    pub trace_level: i64,
    /// Crash log for the native library, `%p` already expanded
    pub native_library_error_file: PathBuf,
    pub lib_path: Option<PathBuf>,
    pub bootstrap_poll_interval: Duration,
    /// Classes kept at the baseline tier while bootstrapping
    pub compiler_module_prefixes: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            bootstrap: false,
            print_bootstrap: true,
            native_library: false,
            threads: 1,
            host_threads: 1,
            idle_delay: Duration::from_millis(crate::flags::table::DEFAULT_COMPILER_IDLE_DELAY),
            native_library_thread_fraction: 0.33,
            threads_per_native_library_runtime: 1,
            nmethod_size_limit: 655_360,
            trace_level: 0,
            native_library_error_file: PathBuf::from(LIBJVMCI_ERR_FILE),
            lib_path: None,
            bootstrap_poll_interval: DEFAULT_BOOTSTRAP_POLL_INTERVAL,
            compiler_module_prefixes: default_module_prefixes(),
        }
    }
}

impl CompilerConfig {
    /// Read the validated registry
    pub fn from_registry(registry: &FlagRegistry, env: &VmEnvironment) -> Result<Self> {
        let error_file = registry
            .get_str(JVMCI_NATIVE_LIBRARY_ERROR_FILE)?
            .unwrap_or(LIBJVMCI_ERR_FILE);

        Ok(Self {
            bootstrap: registry.get_bool(BOOTSTRAP_JVMCI)?,
            print_bootstrap: registry.get_bool(PRINT_BOOTSTRAP)?,
            native_library: registry.get_bool(USE_JVMCI_NATIVE_LIBRARY)?,
            threads: to_count(registry.get_int(JVMCI_THREADS)?),
            host_threads: to_count(registry.get_int(JVMCI_HOST_THREADS)?),
            idle_delay: Duration::from_millis(registry.get_uint(JVMCI_COMPILER_IDLE_DELAY)?),
            native_library_thread_fraction: registry
                .get_double(JVMCI_NATIVE_LIBRARY_THREAD_FRACTION)?,
            threads_per_native_library_runtime: registry
                .get_uint(JVMCI_THREADS_PER_NATIVE_LIBRARY_RUNTIME)?,
            nmethod_size_limit: usize::try_from(registry.get_int(JVMCI_NMETHOD_SIZE_LIMIT)?)
                .unwrap_or(0),
            trace_level: registry.get_int(JVMCI_TRACE_LEVEL)?,
            native_library_error_file: PathBuf::from(env.expand_pid(error_file)),
            lib_path: registry.get_str(JVMCI_LIB_PATH)?.map(PathBuf::from),
            bootstrap_poll_interval: DEFAULT_BOOTSTRAP_POLL_INTERVAL,
            compiler_module_prefixes: default_module_prefixes(),
        })
    }

    pub fn with_bootstrap_poll_interval(mut self, interval: Duration) -> Self {
        self.bootstrap_poll_interval = interval;
        self
    }

    pub fn with_compiler_module_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiler_module_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

fn default_module_prefixes() -> Vec<String> {
    DEFAULT_COMPILER_MODULE_PREFIXES
        .iter()
        .map(|prefix| prefix.to_string())
        .collect()
}

fn to_count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(1).max(1)
}
