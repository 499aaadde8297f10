//! jitctl CLI
//!
//! Runs the alternate compiler's startup checks over a `-XX:` option list and
//! can drive a simulated compile workload through the controller.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use jitctl::compiler::{
    AltCompiler, CodeCache, CompileEnv, CompileQueue, CompileRequest, CompiledCode,
    CompilerBackend, DirectiveSet, EntryBci, InstalledCode, MethodDescriptor, ThreadedBroker,
};
use jitctl::env::VmEnvironment;
use jitctl::{JitContext, VERSION};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jitctl")]
#[command(author, version, about = "Startup gating and instance control for an alternate JIT compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory searched for the native compiler library
    #[arg(long, value_name = "DIR", global = true)]
    lib_dir: Option<PathBuf>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an option list and report the outcome
    Check {
        /// VM options, e.g. -XX:+EnableJVMCIProduct
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },

    /// Print the final flag table after startup
    Flags {
        /// Print JSON instead of the text table
        #[arg(long)]
        json: bool,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },

    /// Start the compiler and run a synthetic compile workload
    Simulate {
        /// Number of methods to compile
        #[arg(long, default_value_t = 1000)]
        methods: usize,

        /// Instruction bytes generated per method
        #[arg(long, default_value_t = 256)]
        size: usize,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut env = VmEnvironment::new();
    if let Some(dir) = cli.lib_dir {
        env = env.with_dll_dir(dir);
    }

    let result = match cli.command {
        Commands::Check { options } => run_check(env, &options),
        Commands::Flags { json, options } => print_flags(env, &options, json),
        Commands::Simulate {
            methods,
            size,
            options,
        } => run_simulation(env, &options, methods, size),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn startup(env: VmEnvironment, options: &[String]) -> anyhow::Result<JitContext> {
    let mut ctx = JitContext::new(env);
    ctx.startup(options)?;
    Ok(ctx)
}

fn run_check(env: VmEnvironment, options: &[String]) -> anyhow::Result<()> {
    let mut ctx = startup(env, options)?;

    if let Some(validated) = ctx.validated() {
        for warning in &validated.warnings {
            println!("warning: {}", warning);
        }
    }
    if let Some(path) = ctx.dump_jni_config()? {
        println!("JNI config written to {}", path.display());
    }

    let registry = ctx.registry();
    println!("jitctl {}", VERSION);
    println!("  EnableJVMCI:           {}", registry.get_bool("EnableJVMCI")?);
    println!("  UseJVMCICompiler:      {}", registry.get_bool("UseJVMCICompiler")?);
    println!("  UseJVMCINativeLibrary: {}", registry.get_bool("UseJVMCINativeLibrary")?);
    println!("  collector:             {}", ctx.env().gc);
    println!("  TieredStopAtLevel:     {}", ctx.env().tier_stop_at_level);
    Ok(())
}

fn print_flags(env: VmEnvironment, options: &[String], json: bool) -> anyhow::Result<()> {
    let ctx = startup(env, options)?;
    if json {
        println!("{}", ctx.registry().to_json()?);
    } else {
        let stdout = io::stdout();
        ctx.registry().print_on(&mut stdout.lock())?;
    }
    Ok(())
}

fn run_simulation(
    env: VmEnvironment,
    options: &[String],
    methods: usize,
    size: usize,
) -> anyhow::Result<()> {
    let mut ctx = startup(env, options)?;
    if !ctx.registry().get_bool("UseJVMCICompiler")? {
        bail!("UseJVMCICompiler is off; pass -XX:+EnableJVMCIProduct or enable it explicitly");
    }

    let compiler = ctx.create_compiler(
        Arc::new(SimulatedBackend { size }),
        Arc::new(SimulatedCodeCache),
    )?;
    compiler.initialize()?;

    let config = compiler.config().clone();
    let broker = ThreadedBroker::start(
        compiler.name(),
        Arc::clone(&compiler),
        config.threads,
        config.idle_delay,
    )
    .context("failed to start compiler threads")?;

    if config.bootstrap {
        compiler.bootstrap(broker.queue())?;
    }

    let start = Instant::now();
    for i in 0..methods {
        let method = MethodDescriptor::new(format!("Workload{}", i % 16), format!("m{}", i), "()V");
        let request = if i % 10 == 9 {
            CompileRequest::osr(method, 8)
        } else {
            CompileRequest::new(method)
        };
        broker.queue().enqueue(request)?;
    }
    while !broker.queue().is_empty() {
        thread::sleep(Duration::from_millis(1));
    }
    let elapsed = start.elapsed();

    broker.shutdown();
    compiler.shutdown();

    println!(
        "{}: compiled {} methods in {} ms",
        compiler.name(),
        compiler.methods_compiled(),
        elapsed.as_millis()
    );
    print_timers(&compiler)?;
    Ok(())
}

fn print_timers(compiler: &AltCompiler) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    compiler.print_timers(&mut out)?;
    out.flush()
}

/// Emits a fixed-size blob of no-ops per method
struct SimulatedBackend {
    size: usize,
}

impl CompilerBackend for SimulatedBackend {
    fn compile(
        &self,
        _env: &CompileEnv,
        method: &MethodDescriptor,
        entry_bci: EntryBci,
        _directives: DirectiveSet,
    ) -> anyhow::Result<CompiledCode> {
        if method.name.is_empty() {
            bail!("method without a name");
        }
        // OSR entries carry a migration prologue
        let prologue = if entry_bci.is_osr() { 16 } else { 0 };
        Ok(CompiledCode {
            instructions: vec![0x90; self.size + prologue],
            data_size: self.size / 4,
        })
    }
}

struct SimulatedCodeCache;

struct SimulatedBlob {
    code: usize,
    data: usize,
}

/// Header and relocation overhead per blob
const BLOB_HEADER_SIZE: usize = 64;

impl InstalledCode for SimulatedBlob {
    fn total_size(&self) -> usize {
        BLOB_HEADER_SIZE + self.code + self.data
    }

    fn code_size(&self) -> usize {
        self.code
    }
}

impl CodeCache for SimulatedCodeCache {
    fn install(
        &self,
        _method: &MethodDescriptor,
        code: CompiledCode,
    ) -> anyhow::Result<Arc<dyn InstalledCode>> {
        Ok(Arc::new(SimulatedBlob {
            code: code.instructions.len(),
            data: code.data_size,
        }))
    }
}
