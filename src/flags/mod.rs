//! Flag registry for the alternate compiler
//!
//! Every option the alternate compiler reads is declared once in
//! [`table::FLAGS`] and materialized here as a [`FlagDescriptor`]. The registry
//! is populated before anything reads a flag, mutated only during startup
//! (argument parsing, promotion, validation, GC gating) and read-only after.
//!
//! ## Origins
//!
//! Each value remembers where it came from ([`FlagOrigin`]). A flag is "at its
//! default" while its origin is [`FlagOrigin::Default`], even when a startup
//! derivation replaced the value through [`FlagRegistry::set_default`].

pub mod args;
pub mod table;

use crate::error::{Error, Result};
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use std::fmt;

/// Support tier of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Supported in product builds
    Product,
    /// Requires `-XX:+UnlockExperimentalVMOptions`
    Experimental,
    /// Requires `-XX:+UnlockDiagnosticVMOptions`
    Diagnostic,
    /// Only settable in debug builds
    Develop,
}

impl FlagKind {
    pub fn name(&self) -> &'static str {
        match self {
            FlagKind::Product => "product",
            FlagKind::Experimental => "experimental",
            FlagKind::Diagnostic => "diagnostic",
            FlagKind::Develop => "develop",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value type of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    Bool,
    Int,
    Uint,
    Double,
    Str,
}

impl FlagType {
    pub fn name(&self) -> &'static str {
        match self {
            FlagType::Bool => "bool",
            FlagType::Int => "intx",
            FlagType::Uint => "uint",
            FlagType::Double => "double",
            FlagType::Str => "ccstr",
        }
    }
}

/// Provenance of a flag value, ordered by precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOrigin {
    Default,
    Ergonomic,
    CommandLine,
}

impl fmt::Display for FlagOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagOrigin::Default => write!(f, "default"),
            FlagOrigin::Ergonomic => write!(f, "ergonomic"),
            FlagOrigin::CommandLine => write!(f, "command line"),
        }
    }
}

/// Current value of a flag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    Str(Option<String>),
}

impl FlagValue {
    pub fn flag_type(&self) -> FlagType {
        match self {
            FlagValue::Bool(_) => FlagType::Bool,
            FlagValue::Int(_) => FlagType::Int,
            FlagValue::Uint(_) => FlagType::Uint,
            FlagValue::Double(_) => FlagType::Double,
            FlagValue::Str(_) => FlagType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a textual value into the given type
    pub fn parse(ty: FlagType, flag: &str, text: &str) -> Result<FlagValue> {
        let mismatch = || Error::FlagTypeMismatch {
            flag: flag.to_string(),
            expected: ty.name(),
            value: text.to_string(),
        };
        let bytes = text.trim().as_bytes();
        match ty {
            FlagType::Bool => match text.trim() {
                "true" | "1" => Ok(FlagValue::Bool(true)),
                "false" | "0" => Ok(FlagValue::Bool(false)),
                _ => Err(mismatch()),
            },
            FlagType::Int => lexical_core::parse::<i64>(bytes)
                .map(FlagValue::Int)
                .map_err(|_| mismatch()),
            FlagType::Uint => lexical_core::parse::<u64>(bytes)
                .map(FlagValue::Uint)
                .map_err(|_| mismatch()),
            FlagType::Double => lexical_core::parse::<f64>(bytes)
                .map(FlagValue::Double)
                .map_err(|_| mismatch()),
            FlagType::Str => Ok(FlagValue::Str(Some(text.to_string()))),
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Int(n) => write!(f, "{}", n),
            FlagValue::Uint(n) => write!(f, "{}", n),
            FlagValue::Double(d) => write!(f, "{}", d),
            FlagValue::Str(Some(s)) => write!(f, "{}", s),
            FlagValue::Str(None) => Ok(()),
        }
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagRange {
    Int(i64, i64),
    Uint(u64, u64),
    Double(f64, f64),
}

impl FlagRange {
    /// Check a value against the range; non-numeric values always pass
    pub fn contains(&self, value: &FlagValue) -> bool {
        match (self, value) {
            (FlagRange::Int(lo, hi), FlagValue::Int(v)) => lo <= v && v <= hi,
            (FlagRange::Uint(lo, hi), FlagValue::Uint(v)) => lo <= v && v <= hi,
            (FlagRange::Double(lo, hi), FlagValue::Double(v)) => lo <= v && v <= hi,
            _ => true,
        }
    }

    fn bounds(&self) -> (String, String) {
        match self {
            FlagRange::Int(lo, hi) => (lo.to_string(), hi.to_string()),
            FlagRange::Uint(lo, hi) => (lo.to_string(), hi.to_string()),
            FlagRange::Double(lo, hi) => (format!("{:.6}", lo), format!("{:.6}", hi)),
        }
    }
}

/// Default value of a declared flag (const-constructible)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlagDefault {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    Str(Option<&'static str>),
}

impl FlagDefault {
    fn to_value(self) -> FlagValue {
        match self {
            FlagDefault::Bool(b) => FlagValue::Bool(b),
            FlagDefault::Int(n) => FlagValue::Int(n),
            FlagDefault::Uint(n) => FlagValue::Uint(n),
            FlagDefault::Double(d) => FlagValue::Double(d),
            FlagDefault::Str(s) => FlagValue::Str(s.map(str::to_string)),
        }
    }
}

/// Static declaration of a flag
#[derive(Debug, Clone, Copy)]
pub struct FlagDecl {
    pub name: &'static str,
    pub kind: FlagKind,
    pub default: FlagDefault,
    pub range: Option<FlagRange>,
    pub doc: &'static str,
}

/// Materialized flag with its current value and origin
#[derive(Debug, Clone, Serialize)]
pub struct FlagDescriptor {
    pub name: &'static str,
    pub kind: FlagKind,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub value: FlagValue,
    pub default: FlagValue,
    pub range: Option<FlagRange>,
    pub origin: FlagOrigin,
    #[serde(skip)]
    pub doc: &'static str,
}

impl FlagDescriptor {
    fn from_decl(decl: &FlagDecl) -> Self {
        let default = decl.default.to_value();
        Self {
            name: decl.name,
            kind: decl.kind,
            flag_type: default.flag_type(),
            value: default.clone(),
            default,
            range: decl.range,
            origin: FlagOrigin::Default,
            doc: decl.doc,
        }
    }

    /// True while no caller or ergonomic derivation has claimed the flag
    pub fn is_default(&self) -> bool {
        self.origin == FlagOrigin::Default
    }

    pub fn is_experimental(&self) -> bool {
        self.kind == FlagKind::Experimental
    }

    pub fn is_product(&self) -> bool {
        self.kind == FlagKind::Product
    }

    /// Reclassify as a supported product flag
    pub fn set_product(&mut self) {
        self.kind = FlagKind::Product;
    }
}

impl fmt::Display for FlagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6} {:<40} = {:<20} {{{}}} {{{}}}",
            self.flag_type.name(),
            self.name,
            self.value.to_string(),
            self.kind,
            self.origin
        )
    }
}

/// Registry of all declared flags
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    flags: Vec<FlagDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl FlagRegistry {
    /// Create a registry holding every flag in [`table::FLAGS`]
    pub fn new() -> Self {
        Self::from_decls(table::FLAGS)
    }

    /// Create a registry from an explicit declaration list
    ///
    /// Panics if a name is declared twice.
    pub fn from_decls(decls: &[FlagDecl]) -> Self {
        let mut flags = Vec::with_capacity(decls.len());
        let mut index = HashMap::default();
        for decl in decls {
            let previous = index.insert(decl.name, flags.len());
            assert!(previous.is_none(), "flag {} declared twice", decl.name);
            flags.push(FlagDescriptor::from_decl(decl));
        }
        Self { flags, index }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDescriptor> {
        self.flags.iter()
    }

    /// Position of a flag, stable for the registry's lifetime
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn find(&self, name: &str) -> Option<&FlagDescriptor> {
        self.index_of(name).map(|i| &self.flags[i])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut FlagDescriptor> {
        self.index_of(name).map(move |i| &mut self.flags[i])
    }

    /// Look up a flag, failing with [`Error::UnknownFlag`]
    pub fn lookup(&self, name: &str) -> Result<&FlagDescriptor> {
        self.find(name)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut FlagDescriptor> {
        self.find_mut(name)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))
    }

    pub fn is_default(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name)?.is_default())
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match &self.lookup(name)?.value {
            FlagValue::Bool(b) => Ok(*b),
            other => Err(type_error(name, FlagType::Bool, other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        match &self.lookup(name)?.value {
            FlagValue::Int(n) => Ok(*n),
            other => Err(type_error(name, FlagType::Int, other)),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<u64> {
        match &self.lookup(name)?.value {
            FlagValue::Uint(n) => Ok(*n),
            other => Err(type_error(name, FlagType::Uint, other)),
        }
    }

    pub fn get_double(&self, name: &str) -> Result<f64> {
        match &self.lookup(name)?.value {
            FlagValue::Double(d) => Ok(*d),
            other => Err(type_error(name, FlagType::Double, other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>> {
        match &self.lookup(name)?.value {
            FlagValue::Str(s) => Ok(s.as_deref()),
            other => Err(type_error(name, FlagType::Str, other)),
        }
    }

    /// Set a flag on behalf of `origin`, honoring origin precedence.
    ///
    /// A write from a lower-precedence origin is a no-op when it agrees with
    /// the current value (the existing origin is kept) and an
    /// [`Error::OriginPrecedence`] when it does not.
    pub fn set(&mut self, name: &str, value: FlagValue, origin: FlagOrigin) -> Result<()> {
        let flag = self.lookup_mut(name)?;
        check_assignable(flag, &value)?;
        if origin < flag.origin {
            if flag.value == value {
                return Ok(());
            }
            return Err(Error::OriginPrecedence {
                flag: name.to_string(),
                attempted: origin.to_string(),
                current: flag.origin.to_string(),
            });
        }
        flag.value = value;
        flag.origin = origin;
        Ok(())
    }

    /// Replace the value without touching its origin
    ///
    /// A flag at default stays at default.
    pub fn set_default(&mut self, name: &str, value: FlagValue) -> Result<()> {
        let flag = self.lookup_mut(name)?;
        check_assignable(flag, &value)?;
        flag.value = value;
        Ok(())
    }

    /// Replace the value with an ergonomically derived one, regardless of origin
    pub fn set_ergo(&mut self, name: &str, value: FlagValue) -> Result<()> {
        let flag = self.lookup_mut(name)?;
        check_assignable(flag, &value)?;
        flag.value = value;
        flag.origin = FlagOrigin::Ergonomic;
        Ok(())
    }

    /// Render the table the way `-XX:+PrintFlagsFinal` does
    pub fn print_on(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(out, "[Global flags]")?;
        for flag in &self.flags {
            writeln!(out, "{}", flag)?;
        }
        Ok(())
    }

    /// Serialize the current table as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.flags)
            .map_err(|e| Error::internal(format!("failed to serialize flags: {}", e)))
    }
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn type_error(name: &str, expected: FlagType, actual: &FlagValue) -> Error {
    Error::FlagTypeMismatch {
        flag: name.to_string(),
        expected: expected.name(),
        value: actual.to_string(),
    }
}

fn check_assignable(flag: &FlagDescriptor, value: &FlagValue) -> Result<()> {
    if value.flag_type() != flag.flag_type {
        return Err(type_error(flag.name, flag.flag_type, value));
    }
    if let Some(range) = &flag.range {
        if !range.contains(value) {
            let (min, max) = range.bounds();
            return Err(Error::FlagOutOfRange {
                flag: flag.name.to_string(),
                value: value.to_string(),
                min,
                max,
            });
        }
    }
    Ok(())
}
