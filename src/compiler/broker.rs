//! Collaborator interfaces of the compiler controller
//!
//! The controller never generates or stores machine code itself. It drives a
//! [`CompilerBackend`] and a [`CodeCache`], and is driven by a compile queue
//! ([`CompileQueue`]) whose worker threads call back into it.
//!
//! [`ThreadedBroker`] is a small in-process queue with a fixed worker pool,
//! enough to run the controller end to end from tests and the CLI.

use super::{panic_message, AltCompiler};
use crate::error::{Error, Result};
use bitflags::bitflags;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

/// Handle to code that has been installed in the code cache
pub trait InstalledCode: Send + Sync {
    /// Size of the whole blob (header, relocation info, code, data)
    fn total_size(&self) -> usize;
    /// Size of the instructions only
    fn code_size(&self) -> usize;
}

/// Raw `entry_bci` value denoting a normal (non-OSR) compile
pub const INVOCATION_ENTRY_BCI: i32 = -1;

/// Where compiled code is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryBci {
    /// Method entry
    Invocation,
    /// On-stack replacement at a bytecode index
    Osr(u32),
}

impl EntryBci {
    pub fn from_raw(bci: i32) -> Result<EntryBci> {
        match bci {
            INVOCATION_ENTRY_BCI => Ok(EntryBci::Invocation),
            b if b >= 0 => Ok(EntryBci::Osr(b as u32)),
            b => Err(Error::internal(format!("invalid entry bci {}", b))),
        }
    }

    /// The raw `entry_bci`; OSR indices beyond `i32::MAX` have no encoding
    pub fn raw(self) -> Result<i32> {
        match self {
            EntryBci::Invocation => Ok(INVOCATION_ENTRY_BCI),
            EntryBci::Osr(bci) => i32::try_from(bci)
                .map_err(|_| Error::internal(format!("invalid entry bci {}", bci))),
        }
    }

    pub fn is_osr(self) -> bool {
        matches!(self, EntryBci::Osr(_))
    }
}

bitflags! {
    /// Per-compile code generation directives
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirectiveSet: u32 {
        const BACKGROUND_COMPILATION = 1 << 0;
        const PRINT_ASSEMBLY = 1 << 1;
        const PRINT_INLINING = 1 << 2;
        const BREAK_AT_COMPILE = 1 << 3;
        const LOG = 1 << 4;
        const DISABLE_INTRINSICS = 1 << 5;
    }
}

/// A method the backend can compile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub holder: String,
    pub name: String,
    pub signature: String,
}

impl MethodDescriptor {
    pub fn new(holder: impl Into<String>, name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            holder: holder.into(),
            name: name.into(),
            signature: signature.into(),
        }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.holder, self.name, self.signature)
    }
}

/// Per-compile environment handed over by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileEnv {
    pub compile_id: u64,
    /// Install into the hosted category instead of the broker one
    pub hosted: bool,
}

impl CompileEnv {
    pub fn new(compile_id: u64) -> Self {
        Self {
            compile_id,
            hosted: false,
        }
    }
}

/// Machine code produced by the backend, not yet installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCode {
    pub instructions: Vec<u8>,
    pub data_size: usize,
}

/// Bytecode to machine code translation
pub trait CompilerBackend: Send + Sync {
    fn compile(
        &self,
        env: &CompileEnv,
        method: &MethodDescriptor,
        entry_bci: EntryBci,
        directives: DirectiveSet,
    ) -> anyhow::Result<CompiledCode>;
}

/// Storage for installed machine code
pub trait CodeCache: Send + Sync {
    fn install(
        &self,
        method: &MethodDescriptor,
        code: CompiledCode,
    ) -> anyhow::Result<Arc<dyn InstalledCode>>;
}

/// A queued compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub method: MethodDescriptor,
    pub entry_bci: EntryBci,
    pub directives: DirectiveSet,
}

impl CompileRequest {
    pub fn new(method: MethodDescriptor) -> Self {
        Self {
            method,
            entry_bci: EntryBci::Invocation,
            directives: DirectiveSet::BACKGROUND_COMPILATION,
        }
    }

    pub fn osr(method: MethodDescriptor, bci: u32) -> Self {
        Self {
            entry_bci: EntryBci::Osr(bci),
            ..Self::new(method)
        }
    }
}

/// The compile queue as seen by the controller
pub trait CompileQueue: Send + Sync {
    fn name(&self) -> &str;
    fn enqueue(&self, request: CompileRequest) -> Result<()>;
    /// Nothing pending and nothing in flight
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
}

/// Identity of a compiler worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerThreadInfo {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<CompileRequest>,
    in_flight: usize,
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    name: String,
    state: Mutex<QueueState>,
    available: Condvar,
    next_compile_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Queue view handed to controller hooks
#[derive(Debug, Clone)]
pub struct QueueHandle {
    shared: Arc<Shared>,
}

impl CompileQueue for QueueHandle {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn enqueue(&self, request: CompileRequest) -> Result<()> {
        let mut state = self.shared.lock();
        if state.shutdown {
            return Err(Error::invalid_state("enqueue", "queue is shut down"));
        }
        state.pending.push_back(request);
        self.shared.available.notify_one();
        Ok(())
    }

    fn is_empty(&self) -> bool {
        let state = self.shared.lock();
        state.pending.is_empty() && state.in_flight == 0
    }

    fn len(&self) -> usize {
        let state = self.shared.lock();
        state.pending.len() + state.in_flight
    }
}

/// In-process compile queue with a fixed pool of worker threads
pub struct ThreadedBroker {
    queue: QueueHandle,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadedBroker {
    /// Start `threads` workers feeding `compiler`
    ///
    /// Idle workers wake up every `idle_delay` and report an empty queue.
    pub fn start(
        name: &str,
        compiler: Arc<AltCompiler>,
        threads: usize,
        idle_delay: Duration,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            name: name.to_string(),
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            next_compile_id: AtomicU64::new(1),
        });
        let queue = QueueHandle { shared };

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads.max(1) {
            let info = CompilerThreadInfo {
                id,
                name: format!("{} CompilerThread{}", name, id),
            };
            let queue = queue.clone();
            let compiler = Arc::clone(&compiler);
            let handle = thread::Builder::new()
                .name(info.name.clone())
                .spawn(move || worker_loop(queue, compiler, info, idle_delay))?;
            workers.push(handle);
        }

        Ok(Self { queue, workers })
    }

    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    /// Stop accepting work, let workers drain the queue and join them
    pub fn shutdown(mut self) {
        self.stop_workers();
    }

    fn stop_workers(&mut self) {
        {
            let mut state = self.queue.shared.lock();
            state.shutdown = true;
        }
        self.queue.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if let Err(payload) = handle.join() {
                error!("compiler thread panicked: {}", panic_message(&*payload));
            }
        }
    }
}

impl Drop for ThreadedBroker {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

impl fmt::Debug for ThreadedBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedBroker")
            .field("name", &self.queue.shared.name)
            .field("workers", &self.workers.len())
            .finish()
    }
}

fn worker_loop(
    queue: QueueHandle,
    compiler: Arc<AltCompiler>,
    thread: CompilerThreadInfo,
    idle_delay: Duration,
) {
    debug!(thread = %thread.name, "compiler thread started");
    loop {
        let request = {
            let mut state = queue.shared.lock();
            loop {
                if let Some(request) = state.pending.pop_front() {
                    state.in_flight += 1;
                    break Some(request);
                }
                if state.shutdown {
                    break None;
                }
                let (guard, _timeout) = queue
                    .shared
                    .available
                    .wait_timeout(state, idle_delay)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                state = guard;
                if state.pending.is_empty() && state.in_flight == 0 {
                    compiler.on_empty_queue(&queue, &thread);
                }
            }
        };

        let Some(request) = request else { break };

        let _in_flight = InFlight {
            queue: &queue,
            compiler: &compiler,
            thread: &thread,
        };
        let env = CompileEnv::new(queue.shared.next_compile_id.fetch_add(1, Ordering::Relaxed));
        // Failures are reported through the controller's fatal handler
        let _ = compiler.compile_method(&env, &request.method, request.entry_bci, request.directives);
    }
    compiler.stopping_compiler_thread(&thread);
}

/// Retires one in-flight request, also when the worker unwinds
struct InFlight<'a> {
    queue: &'a QueueHandle,
    compiler: &'a AltCompiler,
    thread: &'a CompilerThreadInfo,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.shared.lock();
        if state.pending.is_empty() {
            // Before the in-flight count drops so that observers of an empty
            // queue also observe the hook.
            self.compiler.on_empty_queue(self.queue, self.thread);
        }
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}
