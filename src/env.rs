//! VM environment consumed by the startup checks
//!
//! Everything the consistency validator and GC gate need that is not one of
//! the alternate compiler's own flags: the tiered compilation cutoff, the
//! collector chosen by the GC subsystem, where native libraries live, and the
//! process id used to expand `%p` in file names.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compilation tier, ordered by optimization aggressiveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompLevel {
    /// Interpreter only
    None = 0,
    /// Baseline compiler without profiling
    Simple = 1,
    /// Baseline compiler with invocation and backedge counters
    LimitedProfile = 2,
    /// Baseline compiler with full profiling
    FullProfile = 3,
    /// Optimizing compiler
    FullOptimization = 4,
}

impl CompLevel {
    pub fn from_level(level: i64) -> Result<CompLevel> {
        match level {
            0 => Ok(CompLevel::None),
            1 => Ok(CompLevel::Simple),
            2 => Ok(CompLevel::LimitedProfile),
            3 => Ok(CompLevel::FullProfile),
            4 => Ok(CompLevel::FullOptimization),
            _ => Err(Error::FlagOutOfRange {
                flag: "TieredStopAtLevel".to_string(),
                value: level.to_string(),
                min: "0".to_string(),
                max: "4".to_string(),
            }),
        }
    }

    pub fn level(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for CompLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Garbage collector identities the runtime can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcKind {
    Serial,
    Parallel,
    G1,
    Z,
    Shenandoah,
    Epsilon,
}

impl GcKind {
    /// Name used in crash reports and warnings
    pub fn hs_err_name(&self) -> &'static str {
        match self {
            GcKind::Serial => "serial gc",
            GcKind::Parallel => "parallel gc",
            GcKind::G1 => "g1 gc",
            GcKind::Z => "z gc",
            GcKind::Shenandoah => "shenandoah gc",
            GcKind::Epsilon => "epsilon gc",
        }
    }

    /// Map a `-XX:+Use<Name>GC` flag name to a collector
    pub fn from_flag(name: &str) -> Option<GcKind> {
        match name {
            "UseSerialGC" => Some(GcKind::Serial),
            "UseParallelGC" => Some(GcKind::Parallel),
            "UseG1GC" => Some(GcKind::G1),
            "UseZGC" => Some(GcKind::Z),
            "UseShenandoahGC" => Some(GcKind::Shenandoah),
            "UseEpsilonGC" => Some(GcKind::Epsilon),
            _ => None,
        }
    }
}

impl fmt::Display for GcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hs_err_name())
    }
}

/// Finds the out-of-process compiler's shared library
pub trait NativeLibraryLocator: Send + Sync {
    /// Full path of `name` inside `dir` if it exists
    fn locate(&self, dir: &Path, name: &str) -> Option<PathBuf>;
}

/// Locator that probes the filesystem using the platform's library naming
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLibraryLocator;

impl NativeLibraryLocator for FsLibraryLocator {
    fn locate(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let file = format!(
            "{}{}{}",
            std::env::consts::DLL_PREFIX,
            name,
            std::env::consts::DLL_SUFFIX
        );
        let path = dir.join(file);
        path.is_file().then_some(path)
    }
}

/// Non-flag inputs to startup
#[derive(Clone)]
pub struct VmEnvironment {
    /// Highest tier tiered compilation may reach
    pub tier_stop_at_level: CompLevel,
    /// Collector selected by the GC subsystem
    pub gc: GcKind,
    /// Directory searched for the native compiler library
    pub dll_dir: Option<PathBuf>,
    /// Process id substituted for `%p`
    pub pid: u32,
    /// How the native compiler library is located
    pub library_locator: Arc<dyn NativeLibraryLocator>,
}

impl Default for VmEnvironment {
    fn default() -> Self {
        Self {
            tier_stop_at_level: CompLevel::FullOptimization,
            gc: GcKind::G1,
            dll_dir: None,
            pid: std::process::id(),
            library_locator: Arc::new(FsLibraryLocator),
        }
    }
}

impl fmt::Debug for VmEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmEnvironment")
            .field("tier_stop_at_level", &self.tier_stop_at_level)
            .field("gc", &self.gc)
            .field("dll_dir", &self.dll_dir)
            .field("pid", &self.pid)
            .finish()
    }
}

impl VmEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier_stop_at_level(mut self, level: CompLevel) -> Self {
        self.tier_stop_at_level = level;
        self
    }

    pub fn with_gc(mut self, gc: GcKind) -> Self {
        self.gc = gc;
        self
    }

    pub fn with_dll_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dll_dir = Some(dir.into());
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_library_locator(mut self, locator: Arc<dyn NativeLibraryLocator>) -> Self {
        self.library_locator = locator;
        self
    }

    /// Look for the native compiler library in `extra_dir` and then the library directory
    pub fn locate_native_library(&self, extra_dir: Option<&Path>) -> Option<PathBuf> {
        extra_dir
            .into_iter()
            .chain(self.dll_dir.as_deref())
            .find_map(|dir| {
                self.library_locator
                    .locate(dir, crate::flags::table::JVMCI_SHARED_LIBRARY_NAME)
            })
    }

    /// Replace every `%p` in a file name template with the pid
    pub fn expand_pid(&self, template: &str) -> String {
        template.replace("%p", &self.pid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comp_level_ordering() {
        assert!(CompLevel::FullProfile < CompLevel::FullOptimization);
        assert_eq!(CompLevel::from_level(3).unwrap(), CompLevel::FullProfile);
        assert!(CompLevel::from_level(5).is_err());
    }

    #[test]
    fn test_gc_from_flag() {
        assert_eq!(GcKind::from_flag("UseZGC"), Some(GcKind::Z));
        assert_eq!(GcKind::from_flag("UseJVMCICompiler"), None);
    }

    #[test]
    fn test_expand_pid() {
        let env = VmEnvironment::new().with_pid(4242);
        assert_eq!(
            env.expand_pid(crate::flags::table::LIBJVMCI_ERR_FILE),
            "hs_err_pid4242_libjvmci.log"
        );
    }

    #[test]
    fn test_fs_locator() {
        let dir = tempfile::tempdir().unwrap();
        let env = VmEnvironment::new().with_dll_dir(dir.path());
        assert_eq!(env.locate_native_library(None), None);

        let lib = dir.path().join(format!(
            "{}jvmcicompiler{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        ));
        std::fs::write(&lib, b"").unwrap();
        assert_eq!(env.locate_native_library(None), Some(lib));
    }
}
