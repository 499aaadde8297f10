//! Shared test helpers for integration tests

use jitctl::compiler::{
    AltCompiler, CodeCache, CompileEnv, CompiledCode, CompilerBackend, DirectiveSet, EntryBci,
    FatalHandler, InstalledCode, MethodDescriptor,
};
use jitctl::env::VmEnvironment;
use jitctl::{Error, JitContext};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Run the startup sequence over `args` with a default environment
pub fn startup(args: &[&str]) -> jitctl::Result<JitContext> {
    startup_with(VmEnvironment::new(), args)
}

/// Run the startup sequence over `args`
#[allow(dead_code)]
pub fn startup_with(env: VmEnvironment, args: &[&str]) -> jitctl::Result<JitContext> {
    let mut ctx = JitContext::new(env)
        .with_bootstrap_poll_interval(Duration::from_millis(5))
        .with_fatal_handler(Arc::new(FatalRecorder::default()));
    ctx.startup(args)?;
    Ok(ctx)
}

/// Blob whose code size is the number of instructions
pub struct Blob {
    pub code: usize,
}

/// Bytes added to every blob for header and metadata
pub const BLOB_OVERHEAD: usize = 48;

impl InstalledCode for Blob {
    fn total_size(&self) -> usize {
        self.code + BLOB_OVERHEAD
    }

    fn code_size(&self) -> usize {
        self.code
    }
}

/// Backend producing `size` bytes per method
pub struct FixedBackend {
    pub size: usize,
}

impl CompilerBackend for FixedBackend {
    fn compile(
        &self,
        _env: &CompileEnv,
        _method: &MethodDescriptor,
        _entry_bci: EntryBci,
        _directives: DirectiveSet,
    ) -> anyhow::Result<CompiledCode> {
        Ok(CompiledCode {
            instructions: vec![0xcc; self.size],
            data_size: 0,
        })
    }
}

/// Backend that rejects methods with the given name
#[allow(dead_code)]
pub struct RejectingBackend {
    pub size: usize,
    pub reject: &'static str,
}

impl CompilerBackend for RejectingBackend {
    fn compile(
        &self,
        _env: &CompileEnv,
        method: &MethodDescriptor,
        _entry_bci: EntryBci,
        _directives: DirectiveSet,
    ) -> anyhow::Result<CompiledCode> {
        if method.name == self.reject {
            anyhow::bail!("cannot compile {}", method.name);
        }
        Ok(CompiledCode {
            instructions: vec![0xcc; self.size],
            data_size: 0,
        })
    }
}

pub struct BlobCache;

impl CodeCache for BlobCache {
    fn install(
        &self,
        _method: &MethodDescriptor,
        code: CompiledCode,
    ) -> anyhow::Result<Arc<dyn InstalledCode>> {
        Ok(Arc::new(Blob {
            code: code.instructions.len(),
        }))
    }
}

/// Fatal handler that remembers failures instead of exiting
#[derive(Default)]
pub struct FatalRecorder {
    pub messages: Mutex<Vec<String>>,
}

impl FatalHandler for FatalRecorder {
    fn on_fatal(&self, error: &Error) {
        self.messages.lock().unwrap().push(error.to_string());
    }
}

/// Start up with `args` and create an initialized compiler
#[allow(dead_code)]
pub fn started_compiler(args: &[&str], size: usize) -> (JitContext, Arc<AltCompiler>) {
    let mut ctx = startup(args).unwrap();
    let compiler = ctx
        .create_compiler(Arc::new(FixedBackend { size }), Arc::new(BlobCache))
        .unwrap();
    compiler.initialize().unwrap();
    (ctx, compiler)
}

#[allow(dead_code)]
pub fn method(i: usize) -> MethodDescriptor {
    MethodDescriptor::new("Workload", format!("m{}", i), "()V")
}
