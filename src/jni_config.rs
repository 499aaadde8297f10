//! Native interface description dump
//!
//! When `JVMCILibDumpJNIConfig` names a file, the validator opens it and the
//! runtime writes one line per class, field and method the out-of-process
//! compiler library has to provide. The format is line oriented:
//!
//! ```text
//! class jdk.vm.ci.hotspot.CompilerToVM
//! method jdk.vm.ci.hotspot.CompilerToVM getBytecode (Ljdk/vm/ci/hotspot/HotSpotResolvedJavaMethodImpl;J)[B
//! field jdk.vm.ci.hotspot.HotSpotCompilationRequestResult failureMessage Ljava/lang/String;
//! ```

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A single required entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JniEntry {
    Class(&'static str),
    Field {
        class: &'static str,
        name: &'static str,
        signature: &'static str,
    },
    Method {
        class: &'static str,
        name: &'static str,
        signature: &'static str,
    },
}

const COMPILER_TO_VM: &str = "jdk.vm.ci.hotspot.CompilerToVM";
const REQUEST_RESULT: &str = "jdk.vm.ci.hotspot.HotSpotCompilationRequestResult";
const RUNTIME: &str = "jdk.vm.ci.hotspot.HotSpotJVMCIRuntime";

/// Entries every native compiler library must export
pub static REQUIRED_ENTRIES: &[JniEntry] = &[
    JniEntry::Class(RUNTIME),
    JniEntry::Method {
        class: RUNTIME,
        name: "runtime",
        signature: "()Ljdk/vm/ci/hotspot/HotSpotJVMCIRuntime;",
    },
    JniEntry::Method {
        class: RUNTIME,
        name: "compileMethod",
        signature: "(Ljdk/vm/ci/hotspot/HotSpotResolvedJavaMethod;IJI)Ljdk/vm/ci/hotspot/HotSpotCompilationRequestResult;",
    },
    JniEntry::Method {
        class: RUNTIME,
        name: "bootstrapFinished",
        signature: "()V",
    },
    JniEntry::Method {
        class: RUNTIME,
        name: "shutdown",
        signature: "()V",
    },
    JniEntry::Class(REQUEST_RESULT),
    JniEntry::Field {
        class: REQUEST_RESULT,
        name: "failureMessage",
        signature: "Ljava/lang/String;",
    },
    JniEntry::Field {
        class: REQUEST_RESULT,
        name: "retry",
        signature: "Z",
    },
    JniEntry::Field {
        class: REQUEST_RESULT,
        name: "inlinedBytecodes",
        signature: "I",
    },
    JniEntry::Class(COMPILER_TO_VM),
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "registerNatives",
        signature: "()V",
    },
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "getBytecode",
        signature: "(Ljdk/vm/ci/hotspot/HotSpotResolvedJavaMethodImpl;J)[B",
    },
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "isCompilable",
        signature: "(Ljdk/vm/ci/hotspot/HotSpotResolvedJavaMethodImpl;J)Z",
    },
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "installCode0",
        signature: "(JJZLjdk/vm/ci/hotspot/HotSpotCompiledCode;[Ljava/lang/Object;Ljdk/vm/ci/code/InstalledCode;J[B)I",
    },
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "resetCompilationStatistics",
        signature: "()V",
    },
    JniEntry::Method {
        class: COMPILER_TO_VM,
        name: "readConfiguration",
        signature: "()[Ljava/lang/Object;",
    },
];

/// Open dump file
#[derive(Debug)]
pub struct JniConfigDump {
    path: PathBuf,
    out: BufWriter<File>,
    entries: usize,
}

impl JniConfigDump {
    /// Create (truncate) the dump file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| Error::DumpFileOpen {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written so far
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn write_entry(&mut self, entry: &JniEntry) -> Result<()> {
        match entry {
            JniEntry::Class(name) => writeln!(self.out, "class {}", name)?,
            JniEntry::Field { class, name, signature } => {
                writeln!(self.out, "field {} {} {}", class, name, signature)?
            }
            JniEntry::Method { class, name, signature } => {
                writeln!(self.out, "method {} {} {}", class, name, signature)?
            }
        }
        self.entries += 1;
        Ok(())
    }

    /// Write [`REQUIRED_ENTRIES`] and flush
    pub fn write_required(&mut self) -> Result<()> {
        for entry in REQUIRED_ENTRIES {
            self.write_entry(entry)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
