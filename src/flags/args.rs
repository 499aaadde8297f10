//! `-XX:` option syntax
//!
//! Accepted forms: `-XX:+Name`, `-XX:-Name`, `-XX:Name=value`. The `-XX:`
//! prefix is optional so that values read from a config file can omit it.

use crate::error::{Error, Result};

/// How an option assigns its flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Enable,
    Disable,
    Assign(String),
}

/// A single parsed option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmOption {
    pub name: String,
    pub setting: Setting,
}

impl VmOption {
    /// Parse one argument
    pub fn parse(arg: &str) -> Result<VmOption> {
        let body = arg.strip_prefix("-XX:").unwrap_or(arg);
        let malformed = || Error::UnknownFlag(arg.to_string());

        let (name, setting) = if let Some(name) = body.strip_prefix('+') {
            (name, Setting::Enable)
        } else if let Some(name) = body.strip_prefix('-') {
            (name, Setting::Disable)
        } else if let Some((name, value)) = body.split_once('=') {
            (name, Setting::Assign(value.to_string()))
        } else {
            return Err(malformed());
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed());
        }

        Ok(VmOption {
            name: name.to_string(),
            setting,
        })
    }

    /// Boolean value of `+`/`-` forms
    pub fn as_bool(&self) -> Option<bool> {
        match self.setting {
            Setting::Enable => Some(true),
            Setting::Disable => Some(false),
            Setting::Assign(_) => None,
        }
    }

    pub fn is_enable(&self, name: &str) -> bool {
        self.name == name && self.setting == Setting::Enable
    }
}

/// Parse a whole argument list, stopping at the first malformed entry
pub fn parse_all<S: AsRef<str>>(args: &[S]) -> Result<Vec<VmOption>> {
    args.iter().map(|a| VmOption::parse(a.as_ref())).collect()
}
