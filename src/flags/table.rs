//! Declared flags of the alternate compiler
//!
//! One record per flag; the registry, the validator's exhaustiveness check,
//! the promoter and the CLI all consume this list.

use super::{FlagDecl, FlagDefault, FlagKind, FlagRange};

/// Default wait before an idle compiler queue detaches from its runtime (ms)
pub const DEFAULT_COMPILER_IDLE_DELAY: u64 = 1000;

/// Default name of the native library error file, `%p` is the pid
pub const LIBJVMCI_ERR_FILE: &str = "hs_err_pid%p_libjvmci.log";

/// Base name of the shared library holding the out-of-process compiler
pub const JVMCI_SHARED_LIBRARY_NAME: &str = "jvmcicompiler";

const MAX_JINT: i64 = i32::MAX as i64;
const K: i64 = 1024;
const WORD_SIZE: i64 = 8;

/// Flag names
pub mod names {
    pub const ENABLE_JVMCI: &str = "EnableJVMCI";
    pub const ENABLE_JVMCI_PRODUCT: &str = "EnableJVMCIProduct";
    pub const JVMCI_THREADS_PER_NATIVE_LIBRARY_RUNTIME: &str = "JVMCIThreadsPerNativeLibraryRuntime";
    pub const JVMCI_COMPILER_IDLE_DELAY: &str = "JVMCICompilerIdleDelay";
    pub const USE_JVMCI_COMPILER: &str = "UseJVMCICompiler";
    pub const JVMCI_PRINT_PROPERTIES: &str = "JVMCIPrintProperties";
    pub const BOOTSTRAP_JVMCI: &str = "BootstrapJVMCI";
    pub const EAGER_JVMCI: &str = "EagerJVMCI";
    pub const PRINT_BOOTSTRAP: &str = "PrintBootstrap";
    pub const JVMCI_THREADS: &str = "JVMCIThreads";
    pub const JVMCI_HOST_THREADS: &str = "JVMCIHostThreads";
    pub const MAX_VECTOR_SIZE: &str = "MaxVectorSize";
    pub const REDUCE_INITIAL_CARD_MARKS: &str = "ReduceInitialCardMarks";
    pub const JVMCI_EVENT_LOG_LEVEL: &str = "JVMCIEventLogLevel";
    pub const JVMCI_TRACE_LEVEL: &str = "JVMCITraceLevel";
    pub const JVMCI_COUNTER_SIZE: &str = "JVMCICounterSize";
    pub const JVMCI_COUNTERS_EXCLUDE_COMPILER: &str = "JVMCICountersExcludeCompiler";
    pub const JVMCI_USE_FAST_LOCKING: &str = "JVMCIUseFastLocking";
    pub const JVMCI_NMETHOD_SIZE_LIMIT: &str = "JVMCINMethodSizeLimit";
    pub const METHOD_PROFILE_WIDTH: &str = "MethodProfileWidth";
    pub const JVMCI_LIB_PATH: &str = "JVMCILibPath";
    pub const JVMCI_LIB_DUMP_JNI_CONFIG: &str = "JVMCILibDumpJNIConfig";
    pub const USE_JVMCI_NATIVE_LIBRARY: &str = "UseJVMCINativeLibrary";
    pub const JVMCI_NATIVE_LIBRARY_THREAD_FRACTION: &str = "JVMCINativeLibraryThreadFraction";
    pub const JVMCI_NATIVE_LIBRARY_ERROR_FILE: &str = "JVMCINativeLibraryErrorFile";
    pub const USE_MULTIPLY_TO_LEN_INTRINSIC: &str = "UseMultiplyToLenIntrinsic";
    pub const USE_SQUARE_TO_LEN_INTRINSIC: &str = "UseSquareToLenIntrinsic";
    pub const USE_MUL_ADD_INTRINSIC: &str = "UseMulAddIntrinsic";
    pub const USE_MONTGOMERY_MULTIPLY_INTRINSIC: &str = "UseMontgomeryMultiplyIntrinsic";
    pub const USE_MONTGOMERY_SQUARE_INTRINSIC: &str = "UseMontgomerySquareIntrinsic";
}

use names::*;

const fn flag(
    name: &'static str,
    kind: FlagKind,
    default: FlagDefault,
    doc: &'static str,
) -> FlagDecl {
    FlagDecl {
        name,
        kind,
        default,
        range: None,
        doc,
    }
}

const fn ranged(
    name: &'static str,
    kind: FlagKind,
    default: FlagDefault,
    range: FlagRange,
    doc: &'static str,
) -> FlagDecl {
    FlagDecl {
        name,
        kind,
        default,
        range: Some(range),
        doc,
    }
}

use FlagDefault::{Bool, Double, Int, Str, Uint};
use FlagKind::{Develop, Diagnostic, Experimental, Product};

/// All flags, in declaration order
pub static FLAGS: &[FlagDecl] = &[
    flag(ENABLE_JVMCI, Experimental, Bool(false),
        "Enable JVMCI. Defaults to true if EnableJVMCIProduct is true."),
    flag(ENABLE_JVMCI_PRODUCT, Experimental, Bool(false),
        "Allow JVMCI to be used in product mode. This alters a subset of JVMCI flags \
         to be non-experimental and defaults UseJVMCICompiler and EnableJVMCI to true."),
    flag(JVMCI_THREADS_PER_NATIVE_LIBRARY_RUNTIME, Experimental, Uint(1),
        "Max number of threads per JVMCI native runtime. Specify 0 to force use of a \
         single JVMCI native runtime. Specify 1 to force a single JVMCI native runtime per thread."),
    flag(JVMCI_COMPILER_IDLE_DELAY, Experimental, Uint(DEFAULT_COMPILER_IDLE_DELAY),
        "Number of milliseconds a JVMCI compiler queue should wait for a compilation task \
         before being considered idle."),
    flag(USE_JVMCI_COMPILER, Experimental, Bool(false),
        "Use JVMCI as the default compiler. Defaults to true if EnableJVMCIProduct is true."),
    flag(JVMCI_PRINT_PROPERTIES, Experimental, Bool(false),
        "Prints properties used by the JVMCI compiler and exits"),
    flag(BOOTSTRAP_JVMCI, Experimental, Bool(false),
        "Bootstrap JVMCI before running the main method. This initializes the compile \
         queue with a small set of methods and processes the queue until it is empty."),
    flag(EAGER_JVMCI, Experimental, Bool(false),
        "Force eager JVMCI initialization"),
    flag(PRINT_BOOTSTRAP, Experimental, Bool(true),
        "Print JVMCI bootstrap progress and summary"),
    ranged(JVMCI_THREADS, Experimental, Int(1), FlagRange::Int(1, MAX_JINT),
        "Force number of JVMCI compiler threads to use. Ignored if UseJVMCICompiler is false."),
    ranged(JVMCI_HOST_THREADS, Experimental, Int(1), FlagRange::Int(1, MAX_JINT),
        "Force number of C1 compiler threads. Ignored if UseJVMCICompiler is false."),
    ranged(MAX_VECTOR_SIZE, Product, Int(64), FlagRange::Int(0, MAX_JINT),
        "Max vector size in bytes, actual size could be less depending on elements type"),
    flag(REDUCE_INITIAL_CARD_MARKS, Product, Bool(true),
        "Defer write barriers of young objects"),
    flag(JVMCI_EVENT_LOG_LEVEL, Experimental, Int(1),
        "Event log level for JVMCI"),
    ranged(JVMCI_TRACE_LEVEL, Experimental, Int(0), FlagRange::Int(0, 6),
        "Trace level for JVMCI"),
    ranged(JVMCI_COUNTER_SIZE, Experimental, Int(0), FlagRange::Int(0, 1_000_000),
        "Reserved size for benchmark counters"),
    flag(JVMCI_COUNTERS_EXCLUDE_COMPILER, Experimental, Bool(true),
        "Exclude JVMCI compiler threads from benchmark counters"),
    flag(JVMCI_USE_FAST_LOCKING, Develop, Bool(true),
        "Use fast inlined locking code"),
    ranged(JVMCI_NMETHOD_SIZE_LIMIT, Experimental, Int(80 * K * WORD_SIZE),
        FlagRange::Int(0, MAX_JINT),
        "Maximum size of a compiled method."),
    flag(METHOD_PROFILE_WIDTH, Experimental, Int(0),
        "Number of methods to record in call profile"),
    flag(JVMCI_LIB_PATH, Experimental, Str(None),
        "LD path for loading the JVMCI shared library"),
    flag(JVMCI_LIB_DUMP_JNI_CONFIG, Experimental, Str(None),
        "Dumps to the given file a description of the classes, fields and methods the \
         JVMCI shared library must provide"),
    flag(USE_JVMCI_NATIVE_LIBRARY, Experimental, Bool(false),
        "Execute JVMCI code from a shared library instead of executing it on the managed \
         heap. Defaults to true if UseJVMCICompiler is true and a JVMCI native library is available."),
    ranged(JVMCI_NATIVE_LIBRARY_THREAD_FRACTION, Experimental, Double(0.33),
        FlagRange::Double(0.0, 1.0),
        "The fraction of compiler threads used by libjvmci. The remaining compiler \
         threads are used by C1."),
    flag(JVMCI_NATIVE_LIBRARY_ERROR_FILE, Experimental, Str(None),
        "If an error in the JVMCI native library occurs, save the error data to this file \
         [default: ./hs_err_pid%p_libjvmci.log] (%p replaced with pid)"),
    flag(USE_MULTIPLY_TO_LEN_INTRINSIC, Diagnostic, Bool(false),
        "Enables intrinsification of BigInteger.multiplyToLen()"),
    flag(USE_SQUARE_TO_LEN_INTRINSIC, Diagnostic, Bool(false),
        "Enables intrinsification of BigInteger.squareToLen()"),
    flag(USE_MUL_ADD_INTRINSIC, Diagnostic, Bool(false),
        "Enables intrinsification of BigInteger.mulAdd()"),
    flag(USE_MONTGOMERY_MULTIPLY_INTRINSIC, Diagnostic, Bool(false),
        "Enables intrinsification of BigInteger.montgomeryMultiply()"),
    flag(USE_MONTGOMERY_SQUARE_INTRINSIC, Diagnostic, Bool(false),
        "Enables intrinsification of BigInteger.montgomerySquare()"),
];

/// Flags reclassified to product by [`crate::promoter::enable_product_mode`]
pub static PRODUCT_MODE_FLAGS: &[&str] = &[
    ENABLE_JVMCI,
    ENABLE_JVMCI_PRODUCT,
    USE_JVMCI_COMPILER,
    JVMCI_THREADS_PER_NATIVE_LIBRARY_RUNTIME,
    JVMCI_COMPILER_IDLE_DELAY,
    JVMCI_PRINT_PROPERTIES,
    EAGER_JVMCI,
    JVMCI_THREADS,
    JVMCI_COUNTER_SIZE,
    JVMCI_COUNTERS_EXCLUDE_COMPILER,
    JVMCI_NMETHOD_SIZE_LIMIT,
    JVMCI_EVENT_LOG_LEVEL,
    JVMCI_TRACE_LEVEL,
    JVMCI_LIB_PATH,
    JVMCI_LIB_DUMP_JNI_CONFIG,
    USE_JVMCI_NATIVE_LIBRARY,
    JVMCI_NATIVE_LIBRARY_THREAD_FRACTION,
    JVMCI_NATIVE_LIBRARY_ERROR_FILE,
];

/// Flags declared alongside the compiler's but owned by other subsystems;
/// the consistency pass does not visit them.
pub static SHARED_FLAGS: &[&str] = &[
    MAX_VECTOR_SIZE,
    REDUCE_INITIAL_CARD_MARKS,
    USE_MULTIPLY_TO_LEN_INTRINSIC,
    USE_SQUARE_TO_LEN_INTRINSIC,
    USE_MUL_ADD_INTRINSIC,
    USE_MONTGOMERY_MULTIPLY_INTRINSIC,
    USE_MONTGOMERY_SQUARE_INTRINSIC,
];
