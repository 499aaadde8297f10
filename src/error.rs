//! Error types for jitctl

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a startup error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user asked for an inconsistent configuration
    Configuration,
    /// Registry/promoter skew or another programming error
    Internal,
    /// A resource (file) could not be acquired
    Resource,
    /// The running compiler failed and the process must not continue
    Compilation,
    /// The controller was used out of order
    Lifecycle,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "ConfigurationError"),
            ErrorKind::Internal => write!(f, "InternalError"),
            ErrorKind::Resource => write!(f, "ResourceError"),
            ErrorKind::Compilation => write!(f, "CompilationError"),
            ErrorKind::Lifecycle => write!(f, "LifecycleError"),
        }
    }
}

/// Main error type for jitctl
#[derive(Error, Debug)]
pub enum Error {
    /// A dependent flag was set while its guard flag is off
    #[error("Improperly specified VM option '{flag}': '{guard}' must be enabled")]
    ImproperOption { flag: String, guard: String },

    /// Two settings cannot be combined
    #[error("{0}")]
    IncompatibleOptions(String),

    /// Flag name not present in the registry
    #[error("Unrecognized VM option '{0}'")]
    UnknownFlag(String),

    /// Value does not match the declared flag type
    #[error("Improperly specified VM option '{flag}': expected {expected} value, got '{value}'")]
    FlagTypeMismatch {
        flag: String,
        expected: &'static str,
        value: String,
    },

    /// Value outside of the declared numeric range
    #[error("{flag}={value} is outside the allowed range [ {min} ... {max} ]")]
    FlagOutOfRange {
        flag: String,
        value: String,
        min: String,
        max: String,
    },

    /// Flag is experimental/diagnostic and has not been unlocked
    #[error("VM option '{flag}' is {kind}. Must be enabled via -XX:+{unlock}")]
    FlagLocked {
        flag: String,
        kind: &'static str,
        unlock: &'static str,
    },

    /// Develop flags are fixed in release builds
    #[error("VM option '{0}' is develop and is available only in debug version of VM.")]
    DevelopOnly(String),

    /// A write was rejected because a higher-precedence origin already set the flag
    #[error("Cannot set VM option '{flag}' from {attempted}: already set from {current}")]
    OriginPrecedence {
        flag: String,
        attempted: String,
        current: String,
    },

    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Diagnostic dump file could not be created
    #[error("Could not open file for dumping JVMCI shared library JNI config: {}", path.display())]
    DumpFileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// The alternate compiler is disabled
    #[error("JVMCI is not enabled")]
    NotEnabled,

    /// Nobody constructed the controller yet
    #[error("The JVMCI compiler instance has not been created")]
    InstanceNotCreated,

    /// A controller is already live in this context
    #[error("The JVMCI compiler instance has already been created")]
    InstanceAlreadyCreated,

    /// Operation not legal in the controller's current state
    #[error("InvalidState: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// A compilation failed inside the alternate compiler
    #[error("Fatal error during compilation of {method}: {message}")]
    CompilationFailed { method: String, message: String },
}

impl Error {
    /// Create an improper option error for a dependent/guard pair
    pub fn improper_option(flag: impl Into<String>, guard: impl Into<String>) -> Self {
        Error::ImproperOption {
            flag: flag.into(),
            guard: guard.into(),
        }
    }

    /// Create an incompatible options error
    pub fn incompatible(message: impl Into<String>) -> Self {
        Error::IncompatibleOptions(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::InternalError(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: &'static str, state: impl fmt::Display) -> Self {
        Error::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Create a compilation failure error
    pub fn compilation_failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CompilationFailed {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ImproperOption { .. }
            | Error::IncompatibleOptions(_)
            | Error::UnknownFlag(_)
            | Error::FlagTypeMismatch { .. }
            | Error::FlagOutOfRange { .. }
            | Error::FlagLocked { .. }
            | Error::DevelopOnly(_) => ErrorKind::Configuration,
            Error::OriginPrecedence { .. } | Error::InternalError(_) => ErrorKind::Internal,
            Error::DumpFileOpen { .. } | Error::IoError { .. } => ErrorKind::Resource,
            Error::CompilationFailed { .. } => ErrorKind::Compilation,
            Error::NotEnabled
            | Error::InstanceNotCreated
            | Error::InstanceAlreadyCreated
            | Error::InvalidState { .. } => ErrorKind::Lifecycle,
        }
    }

    /// Whether the error was caused by user-supplied configuration
    pub fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration | ErrorKind::Resource)
    }

    /// Whether the process must terminate when this error is observed
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Lifecycle)
    }
}

/// Result type alias for jitctl
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
pub mod messages {
    pub const CANNOT_BE_DISABLED: &str = "cannot be disabled";
    pub const NOT_COMPATIBLE: &str = "is not compatible with";

    /// Format "Improperly specified VM option X: Y cannot be disabled"
    pub fn cannot_be_disabled(option: &str, disabled: &str) -> String {
        format!(
            "Improperly specified VM option {}: {} {}",
            option, disabled, CANNOT_BE_DISABLED
        )
    }

    /// Format "-XX:+X is not compatible with -XX:+Y"
    pub fn not_compatible_with_flag(flag: &str, other: &str) -> String {
        format!("-XX:+{} {} -XX:+{}", flag, NOT_COMPATIBLE, other)
    }

    /// Format "-XX:+X is not compatible with -XX:Y=n"
    pub fn not_compatible_with_value(flag: &str, other: &str, value: impl std::fmt::Display) -> String {
        format!("-XX:+{} {} -XX:{}={}", flag, NOT_COMPATIBLE, other, value)
    }
}
