//! Alternate compiler instance controller
//!
//! [`AltCompiler`] is the single live compiler object of a [`JitContext`].
//! It owns the bootstrap state machine, the compilation counters and the two
//! install statistics, and delegates code generation to a [`CompilerBackend`]
//! and code storage to a [`CodeCache`].
//!
//! ```text
//! Uninitialized -> Constructed -> (Bootstrapping) -> Active -> Stopped
//! ```
//!
//! Compiler worker threads share the controller as `Arc<AltCompiler>`; every
//! piece of mutable state is an atomic.
//!
//! [`JitContext`]: crate::startup::JitContext

pub mod broker;
pub mod config;
pub mod stats;

pub use broker::{
    CodeCache, CompileEnv, CompileQueue, CompileRequest, CompiledCode, CompilerBackend,
    CompilerThreadInfo, DirectiveSet, EntryBci, InstalledCode, MethodDescriptor, QueueHandle,
    ThreadedBroker,
};
pub use config::{CompilerConfig, DEFAULT_COMPILER_MODULE_PREFIXES};
pub use stats::{CodeInstallStats, ElapsedTimer, InstallSnapshot};

use crate::error::{Error, Result};
use std::any::Any;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// Holder of the methods compiled while bootstrapping
pub const BOOTSTRAP_HOLDER: &str = "java.lang.Object";

/// Methods queued by [`AltCompiler::bootstrap`], as `(name, signature)`
pub const BOOTSTRAP_METHODS: &[(&str, &str)] = &[
    ("<init>", "()V"),
    ("equals", "(Ljava/lang/Object;)Z"),
    ("toString", "()Ljava/lang/String;"),
    ("wait", "()V"),
    ("wait", "(J)V"),
    ("finalize", "()V"),
];

const PROGRESS_STEP: u64 = 100;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompilerState {
    /// No controller has been constructed
    Uninitialized = 0,
    Constructed = 1,
    Bootstrapping = 2,
    Active = 3,
    Stopped = 4,
}

impl CompilerState {
    fn from_u8(value: u8) -> CompilerState {
        match value {
            1 => CompilerState::Constructed,
            2 => CompilerState::Bootstrapping,
            3 => CompilerState::Active,
            4 => CompilerState::Stopped,
            _ => CompilerState::Uninitialized,
        }
    }

    /// Compile requests are serviced in this state
    pub fn accepts_compiles(self) -> bool {
        matches!(self, CompilerState::Bootstrapping | CompilerState::Active)
    }
}

impl fmt::Display for CompilerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompilerState::Uninitialized => "uninitialized",
            CompilerState::Constructed => "constructed",
            CompilerState::Bootstrapping => "bootstrapping",
            CompilerState::Active => "active",
            CompilerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Receives compilation failures the process cannot survive
pub trait FatalHandler: Send + Sync {
    fn on_fatal(&self, error: &Error);
}

/// Logs the failure and terminates the process
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitOnFatal;

impl FatalHandler for ExitOnFatal {
    fn on_fatal(&self, error: &Error) {
        error!("{}", error);
        std::process::exit(1);
    }
}

/// The alternate compiler
pub struct AltCompiler {
    config: CompilerConfig,
    state: AtomicU8,
    bootstrapping: AtomicBool,
    bootstrap_request_handled: AtomicBool,
    methods_compiled: AtomicU64,
    global_compilation_ticks: AtomicU64,
    stopped_threads: AtomicU64,
    compile_timer: ElapsedTimer,
    jit_code_installs: CodeInstallStats,
    hosted_code_installs: CodeInstallStats,
    backend: Arc<dyn CompilerBackend>,
    code_cache: Arc<dyn CodeCache>,
    fatal_handler: Arc<dyn FatalHandler>,
}

impl AltCompiler {
    pub fn new(
        config: CompilerConfig,
        backend: Arc<dyn CompilerBackend>,
        code_cache: Arc<dyn CodeCache>,
    ) -> Self {
        Self {
            config,
            state: AtomicU8::new(CompilerState::Constructed as u8),
            bootstrapping: AtomicBool::new(false),
            bootstrap_request_handled: AtomicBool::new(false),
            methods_compiled: AtomicU64::new(0),
            global_compilation_ticks: AtomicU64::new(0),
            stopped_threads: AtomicU64::new(0),
            compile_timer: ElapsedTimer::new(),
            jit_code_installs: CodeInstallStats::new(),
            hosted_code_installs: CodeInstallStats::new(),
            backend,
            code_cache,
            fatal_handler: Arc::new(ExitOnFatal),
        }
    }

    /// Replace the default [`ExitOnFatal`] handler
    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal_handler = handler;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn state(&self) -> CompilerState {
        CompilerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `JVMCI-native` when running from the shared library
    pub fn name(&self) -> &'static str {
        if self.config.native_library {
            "JVMCI-native"
        } else {
            "JVMCI"
        }
    }

    pub fn supports_native(&self) -> bool {
        true
    }

    pub fn supports_osr(&self) -> bool {
        true
    }

    fn transition(&self, from: CompilerState, to: CompilerState, operation: &'static str) -> Result<()> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| Error::invalid_state(operation, CompilerState::from_u8(actual)))
    }

    /// Leave `Constructed`, towards `Bootstrapping` if bootstrap was requested
    pub fn initialize(&self) -> Result<()> {
        let next = if self.config.bootstrap {
            CompilerState::Bootstrapping
        } else {
            CompilerState::Active
        };
        self.transition(CompilerState::Constructed, next, "initialize")?;
        debug!(compiler = self.name(), state = %next, "compiler initialized");
        Ok(())
    }

    /// Compile the bootstrap method set through `queue` and wait for it to drain
    ///
    /// Returns the number of methods compiled while bootstrapping.
    pub fn bootstrap(&self, queue: &dyn CompileQueue) -> Result<u64> {
        let state = self.state();
        if state != CompilerState::Bootstrapping {
            return Err(Error::invalid_state("bootstrap", state));
        }

        let start = Instant::now();
        let compiled_before = self.methods_compiled();
        self.bootstrapping.store(true, Ordering::Release);

        for (name, signature) in BOOTSTRAP_METHODS {
            let method = MethodDescriptor::new(BOOTSTRAP_HOLDER, *name, *signature);
            if let Err(e) = queue.enqueue(CompileRequest::new(method)) {
                self.bootstrapping.store(false, Ordering::Release);
                return Err(e);
            }
        }

        let mut first_round = true;
        let mut reported = 0;
        loop {
            // Wait until the workers have picked something up
            let pending = loop {
                thread::sleep(self.config.bootstrap_poll_interval);
                let pending = queue.len();
                if self.bootstrap_compilation_request_handled() || !first_round || pending != 0 {
                    break pending;
                }
            };
            first_round = false;

            if self.config.print_bootstrap {
                let compiled = self.methods_compiled() - compiled_before;
                if compiled / PROGRESS_STEP > reported {
                    reported = compiled / PROGRESS_STEP;
                    info!("bootstrap: {} methods compiled", compiled);
                }
            }

            if pending == 0 && queue.is_empty() {
                break;
            }
        }

        self.bootstrapping.store(false, Ordering::Release);
        let compiled = self.methods_compiled() - compiled_before;
        // A shutdown that raced with bootstrap wins
        let _ = self.transition(CompilerState::Bootstrapping, CompilerState::Active, "bootstrap");

        if self.config.print_bootstrap {
            info!(
                "Bootstrapping JVMCI in {} ms (compiled {} methods)",
                start.elapsed().as_millis(),
                compiled
            );
        }
        Ok(compiled)
    }

    /// Compile and install one method
    ///
    /// Backend and install failures go to the fatal handler before being
    /// returned. Calling outside `Bootstrapping`/`Active` is an
    /// [`Error::InvalidState`].
    pub fn compile_method(
        &self,
        env: &CompileEnv,
        method: &MethodDescriptor,
        entry_bci: EntryBci,
        directives: DirectiveSet,
    ) -> Result<()> {
        let state = self.state();
        if !state.accepts_compiles() {
            return Err(Error::invalid_state("compile", state));
        }
        let bci = entry_bci.raw()?;

        let _compiling = self.compile_timer.start();
        let code = catch_panic("backend", || {
            self.backend.compile(env, method, entry_bci, directives)
        })
        .map_err(|e| self.fatal(method, e))?;

        let stats = self.code_install_stats(env.hosted);
        {
            let _installing = stats.timer().start();
            let installed = catch_panic("code cache", || self.code_cache.install(method, code))
                .map_err(|e| self.fatal(method, e))?;
            stats.on_install(installed.as_ref());
        }

        self.methods_compiled.fetch_add(1, Ordering::Relaxed);
        self.inc_global_compilation_ticks();
        if directives.contains(DirectiveSet::LOG) {
            debug!(id = env.compile_id, %method, bci, "method compiled");
        }
        Ok(())
    }

    /// Whether `method` must stay at the baseline tier
    ///
    /// Only the compiler's own classes are affected, and only while
    /// bootstrapping. Never true for the native library, which does not run
    /// on the managed heap.
    pub fn force_comp_at_level_simple(&self, method: &MethodDescriptor) -> bool {
        if self.config.native_library || !self.is_bootstrapping() {
            return false;
        }
        self.config
            .compiler_module_prefixes
            .iter()
            .any(|prefix| method.holder.starts_with(prefix.as_str()))
    }

    fn fatal(&self, method: &MethodDescriptor, cause: anyhow::Error) -> Error {
        let error = Error::compilation_failed(method.to_string(), format!("{:#}", cause));
        self.fatal_handler.on_fatal(&error);
        error
    }

    /// Worker hook for a drained queue
    ///
    /// The broker may call this with its queue lock held, so the queue is
    /// only used for identification here.
    pub fn on_empty_queue(&self, queue: &dyn CompileQueue, thread: &CompilerThreadInfo) {
        if self.bootstrapping.load(Ordering::Acquire)
            && !self.bootstrap_request_handled.swap(true, Ordering::AcqRel)
        {
            debug!(queue = queue.name(), thread = %thread.name, "bootstrap compilation request handled");
        }
    }

    /// Worker hook for a compiler thread that is about to exit
    pub fn stopping_compiler_thread(&self, thread: &CompilerThreadInfo) {
        self.stopped_threads.fetch_add(1, Ordering::Relaxed);
        debug!(thread = %thread.name, "compiler thread stopping");
    }

    pub fn stopped_compiler_threads(&self) -> u64 {
        self.stopped_threads.load(Ordering::Relaxed)
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrapping.load(Ordering::Acquire)
    }

    /// Set once the queue drained during bootstrap; never reset
    pub fn bootstrap_compilation_request_handled(&self) -> bool {
        self.bootstrap_request_handled.load(Ordering::Acquire)
    }

    pub fn methods_compiled(&self) -> u64 {
        self.methods_compiled.load(Ordering::Relaxed)
    }

    pub fn inc_global_compilation_ticks(&self) {
        self.global_compilation_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn global_compilation_ticks(&self) -> u64 {
        self.global_compilation_ticks.load(Ordering::Relaxed)
    }

    /// Hosted installs come from the compiler itself, the rest from the broker
    pub fn code_install_stats(&self, hosted: bool) -> &CodeInstallStats {
        if hosted {
            &self.hosted_code_installs
        } else {
            &self.jit_code_installs
        }
    }

    pub fn print_timers(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} compiler timers:", self.name())?;
        writeln!(
            out,
            "  Compile {:7.3} s (methods compiled: {})",
            self.compile_timer.seconds(),
            self.methods_compiled()
        )?;
        self.jit_code_installs.print_on(out, "  JIT ")?;
        self.hosted_code_installs.print_on(out, "  Hosted ")
    }

    /// Reject all further compiles
    pub fn shutdown(&self) {
        let previous = self.state.swap(CompilerState::Stopped as u8, Ordering::AcqRel);
        if previous != CompilerState::Stopped as u8 {
            debug!(compiler = self.name(), "compiler stopped");
        }
    }
}

/// Run a collaborator call, turning a panic into an ordinary failure
fn catch_panic<T>(
    what: &str,
    call: impl FnOnce() -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(anyhow::anyhow!("{} panicked: {}", what, panic_message(&*payload)))
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

impl fmt::Debug for AltCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AltCompiler")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("methods_compiled", &self.methods_compiled())
            .field("bootstrapping", &self.is_bootstrapping())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Blob(usize);

    impl InstalledCode for Blob {
        fn total_size(&self) -> usize {
            self.0 + 32
        }
        fn code_size(&self) -> usize {
            self.0
        }
    }

    struct FixedBackend(usize);

    impl CompilerBackend for FixedBackend {
        fn compile(
            &self,
            _env: &CompileEnv,
            _method: &MethodDescriptor,
            _entry_bci: EntryBci,
            _directives: DirectiveSet,
        ) -> anyhow::Result<CompiledCode> {
            Ok(CompiledCode {
                instructions: vec![0x90; self.0],
                data_size: 0,
            })
        }
    }

    struct FailingBackend;

    impl CompilerBackend for FailingBackend {
        fn compile(
            &self,
            _env: &CompileEnv,
            _method: &MethodDescriptor,
            _entry_bci: EntryBci,
            _directives: DirectiveSet,
        ) -> anyhow::Result<CompiledCode> {
            anyhow::bail!("unsupported bytecode")
        }
    }

    struct PanickingBackend;

    impl CompilerBackend for PanickingBackend {
        fn compile(
            &self,
            _env: &CompileEnv,
            method: &MethodDescriptor,
            _entry_bci: EntryBci,
            _directives: DirectiveSet,
        ) -> anyhow::Result<CompiledCode> {
            panic!("no lowering for {}", method.name)
        }
    }

    struct BlobCache;

    impl CodeCache for BlobCache {
        fn install(
            &self,
            _method: &MethodDescriptor,
            code: CompiledCode,
        ) -> anyhow::Result<Arc<dyn InstalledCode>> {
            Ok(Arc::new(Blob(code.instructions.len())))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl FatalHandler for Recorder {
        fn on_fatal(&self, error: &Error) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    fn compiler(config: CompilerConfig) -> AltCompiler {
        AltCompiler::new(config, Arc::new(FixedBackend(16)), Arc::new(BlobCache))
    }

    fn method() -> MethodDescriptor {
        MethodDescriptor::new("Foo", "bar", "()V")
    }

    #[test]
    fn test_initialize_transitions() {
        let c = compiler(CompilerConfig::default());
        assert_eq!(c.state(), CompilerState::Constructed);
        c.initialize().unwrap();
        assert_eq!(c.state(), CompilerState::Active);
        assert!(matches!(c.initialize(), Err(Error::InvalidState { .. })));

        let c = compiler(CompilerConfig {
            bootstrap: true,
            ..CompilerConfig::default()
        });
        c.initialize().unwrap();
        assert_eq!(c.state(), CompilerState::Bootstrapping);
    }

    #[test]
    fn test_name() {
        assert_eq!(compiler(CompilerConfig::default()).name(), "JVMCI");
        let native = compiler(CompilerConfig {
            native_library: true,
            ..CompilerConfig::default()
        });
        assert_eq!(native.name(), "JVMCI-native");
        assert!(native.supports_osr());
        assert!(native.supports_native());
    }

    #[test]
    fn test_compile_records_stats() {
        let c = compiler(CompilerConfig::default());
        c.initialize().unwrap();
        c.compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap();
        c.compile_method(&CompileEnv::new(2), &method(), EntryBci::Osr(4), DirectiveSet::LOG)
            .unwrap();
        let hosted = CompileEnv {
            compile_id: 3,
            hosted: true,
        };
        c.compile_method(&hosted, &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap();

        assert_eq!(c.methods_compiled(), 3);
        assert_eq!(c.global_compilation_ticks(), 3);
        let jit = c.code_install_stats(false).snapshot();
        assert_eq!(jit.count, 2);
        assert_eq!(jit.code_size, 32);
        assert_eq!(jit.total_size, 96);
        assert_eq!(c.code_install_stats(true).count(), 1);
        assert_eq!(c.code_install_stats(false).timer().intervals(), 2);
    }

    #[test]
    fn test_compile_rejected_before_initialize_and_after_shutdown() {
        let c = compiler(CompilerConfig::default());
        let err = c
            .compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        c.initialize().unwrap();
        c.shutdown();
        c.shutdown();
        assert_eq!(c.state(), CompilerState::Stopped);
        assert!(c
            .compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .is_err());
        assert_eq!(c.methods_compiled(), 0);
    }

    #[test]
    fn test_compile_failure_is_fatal() {
        let recorder = Arc::new(Recorder::default());
        let c = AltCompiler::new(
            CompilerConfig::default(),
            Arc::new(FailingBackend),
            Arc::new(BlobCache),
        )
        .with_fatal_handler(recorder.clone());
        c.initialize().unwrap();

        let err = c
            .compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            ["Fatal error during compilation of Foo.bar()V: unsupported bytecode"]
        );
        assert_eq!(c.methods_compiled(), 0);
        assert_eq!(c.code_install_stats(false).count(), 0);
    }

    #[test]
    fn test_backend_panic_is_fatal() {
        let recorder = Arc::new(Recorder::default());
        let c = AltCompiler::new(
            CompilerConfig::default(),
            Arc::new(PanickingBackend),
            Arc::new(BlobCache),
        )
        .with_fatal_handler(recorder.clone());
        c.initialize().unwrap();

        let err = c
            .compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            ["Fatal error during compilation of Foo.bar()V: backend panicked: no lowering for bar"]
        );
        assert_eq!(c.methods_compiled(), 0);
        assert_eq!(c.compile_timer.intervals(), 1);
    }

    #[test]
    fn test_unencodable_osr_bci_rejected() {
        let recorder = Arc::new(Recorder::default());
        let c = compiler(CompilerConfig::default()).with_fatal_handler(recorder.clone());
        c.initialize().unwrap();
        let err = c
            .compile_method(&CompileEnv::new(1), &method(), EntryBci::Osr(u32::MAX), DirectiveSet::empty())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
        assert!(recorder.0.lock().unwrap().is_empty());
        assert_eq!(c.methods_compiled(), 0);
    }

    #[test]
    fn test_force_simple_only_for_compiler_classes_while_bootstrapping() {
        let own = MethodDescriptor::new("jdk.vm.ci.hotspot.HotSpotJVMCIRuntime", "compileMethod", "()V");
        let graal = MethodDescriptor::new("jdk.graal.compiler.phases.Phase", "apply", "()V");
        let app = method();

        let c = compiler(CompilerConfig::default());
        assert!(!c.force_comp_at_level_simple(&own));

        c.bootstrapping.store(true, Ordering::Release);
        assert!(c.force_comp_at_level_simple(&own));
        assert!(c.force_comp_at_level_simple(&graal));
        assert!(!c.force_comp_at_level_simple(&app));

        c.bootstrapping.store(false, Ordering::Release);
        assert!(!c.force_comp_at_level_simple(&own));
    }

    #[test]
    fn test_force_simple_never_for_native_library() {
        let c = compiler(CompilerConfig {
            native_library: true,
            ..CompilerConfig::default()
        });
        c.bootstrapping.store(true, Ordering::Release);
        let own = MethodDescriptor::new("jdk.vm.ci.code.CodeCacheProvider", "installCode", "()V");
        assert!(!c.force_comp_at_level_simple(&own));
    }

    #[test]
    fn test_force_simple_custom_prefixes() {
        let c = compiler(CompilerConfig::default().with_compiler_module_prefixes(["org.example.jit."]));
        c.bootstrapping.store(true, Ordering::Release);
        assert!(c.force_comp_at_level_simple(&MethodDescriptor::new("org.example.jit.Lower", "run", "()V")));
        assert!(!c.force_comp_at_level_simple(&MethodDescriptor::new("jdk.vm.ci.meta.JavaKind", "of", "()V")));
    }

    #[test]
    fn test_empty_queue_marks_bootstrap_handled_once() {
        struct Idle;
        impl CompileQueue for Idle {
            fn name(&self) -> &str {
                "idle"
            }
            fn enqueue(&self, _request: CompileRequest) -> Result<()> {
                Ok(())
            }
            fn is_empty(&self) -> bool {
                true
            }
            fn len(&self) -> usize {
                0
            }
        }

        let thread = CompilerThreadInfo {
            id: 0,
            name: "t0".to_string(),
        };
        let c = compiler(CompilerConfig::default());
        c.on_empty_queue(&Idle, &thread);
        assert!(!c.bootstrap_compilation_request_handled());

        c.bootstrapping.store(true, Ordering::Release);
        c.on_empty_queue(&Idle, &thread);
        c.on_empty_queue(&Idle, &thread);
        assert!(c.bootstrap_compilation_request_handled());

        c.bootstrapping.store(false, Ordering::Release);
        assert!(c.bootstrap_compilation_request_handled());
    }

    #[test]
    fn test_bootstrap_compiles_seed_methods() {
        let config = CompilerConfig {
            bootstrap: true,
            ..CompilerConfig::default()
        }
        .with_bootstrap_poll_interval(Duration::from_millis(5));
        let c = Arc::new(compiler(config));
        c.initialize().unwrap();

        let broker = ThreadedBroker::start("test", Arc::clone(&c), 2, Duration::from_millis(10)).unwrap();
        let compiled = c.bootstrap(broker.queue()).unwrap();
        assert_eq!(compiled, BOOTSTRAP_METHODS.len() as u64);
        assert_eq!(c.state(), CompilerState::Active);
        assert!(!c.is_bootstrapping());
        assert!(c.bootstrap_compilation_request_handled());

        broker.shutdown();
        assert_eq!(c.stopped_compiler_threads(), 2);
    }

    #[test]
    fn test_bootstrap_requires_bootstrapping_state() {
        let c = Arc::new(compiler(CompilerConfig::default()));
        c.initialize().unwrap();
        let broker = ThreadedBroker::start("test", Arc::clone(&c), 1, Duration::from_millis(10)).unwrap();
        assert!(matches!(
            c.bootstrap(broker.queue()),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_print_timers() {
        let c = compiler(CompilerConfig::default());
        c.initialize().unwrap();
        c.compile_method(&CompileEnv::new(1), &method(), EntryBci::Invocation, DirectiveSet::empty())
            .unwrap();
        let mut out = Vec::new();
        c.print_timers(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("JVMCI compiler timers:"));
        assert!(text.contains("(methods compiled: 1)"));
        assert!(text.contains("  JIT "));
        assert!(text.contains("  Hosted "));
    }
}
