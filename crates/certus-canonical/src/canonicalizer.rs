//! Order-independent canonical serialization.
//!
//! The canonical form is JSON-shaped text used purely as a hashing substrate:
//!
//! - map keys are sorted by their raw UTF-8 bytes, recursively;
//! - list order is preserved;
//! - `null` is always written, so `{"a":null}` and `{}` are different inputs;
//! - integers are written in plain decimal, floats in the shortest
//!   round-trip decimal form (so `1` and `1.0` stay distinct);
//! - strings escape `"`, `\`, U+0000..U+001F and U+007F as `\uXXXX`
//!   (`\"` and `\\` for the first two) and pass every other char through.
//!
//! The rules are tagged by `CanonicalVersion`. Events record the version they
//! were hashed with, so a future rule change never invalidates old chains.

use std::fmt::{self, Write as _};

use serde_json::{Number, Value};

use certus_contracts::error::{CertusError, CertusResult};

/// Maximum container nesting accepted before a value is rejected.
pub const MAX_DEPTH: usize = 128;

/// A versioned canonicalization rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalVersion {
    V1,
}

impl CanonicalVersion {
    /// The version new events are hashed with.
    pub const CURRENT: CanonicalVersion = CanonicalVersion::V1;

    pub fn from_u32(version: u32) -> CertusResult<Self> {
        match version {
            1 => Ok(Self::V1),
            other => Err(CertusError::UnsupportedCanonicalVersion { version: other }),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::V1 => 1,
        }
    }
}

/// Location inside a value, for error reporting.
#[derive(Debug, Default)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn push_field(&mut self, field: &str) {
        self.segments.push(field.to_string());
    }

    fn push_index(&mut self, index: usize) {
        self.segments.push(format!("[{}]", index));
    }

    fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "root.{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic bytes for a JSON value.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    version: CanonicalVersion,
}

impl Canonicalizer {
    pub fn new(version: CanonicalVersion) -> Self {
        Self { version }
    }

    /// Canonicalizer for the rule set new events are written with.
    pub fn current() -> Self {
        Self::new(CanonicalVersion::CURRENT)
    }

    /// Canonicalizer for a version number read back from a stored event.
    pub fn for_version(version: u32) -> CertusResult<Self> {
        CanonicalVersion::from_u32(version).map(Self::new)
    }

    pub fn version(&self) -> CanonicalVersion {
        self.version
    }

    /// Produce the canonical bytes for `value`.
    ///
    /// Fails with `UnserializableValue` on non-finite numbers or nesting
    /// deeper than `MAX_DEPTH`.
    pub fn canonicalize(&self, value: &Value) -> CertusResult<Vec<u8>> {
        let mut out = String::new();
        let mut path = Path::default();
        match self.version {
            CanonicalVersion::V1 => write_value(value, &mut path, 0, &mut out)?,
        }
        Ok(out.into_bytes())
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::current()
    }
}

/// Canonicalize with the current rule set.
pub fn canonicalize(value: &Value) -> CertusResult<Vec<u8>> {
    Canonicalizer::current().canonicalize(value)
}

fn write_value(value: &Value, path: &mut Path, depth: usize, out: &mut String) -> CertusResult<()> {
    if depth > MAX_DEPTH {
        return Err(CertusError::UnserializableValue {
            path: path.to_string(),
            reason: format!("nesting exceeds {} levels", MAX_DEPTH),
        });
    }

    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(n, path, out)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                path.push_index(idx);
                write_value(item, path, depth + 1, out)?;
                path.pop();
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly: serde_json's map order depends on its features.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            out.push('{');
            for (idx, (key, child)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                path.push_field(key);
                write_value(child, path, depth + 1, out)?;
                path.pop();
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, path: &Path, out: &mut String) -> CertusResult<()> {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{}", i);
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{}", u);
    } else {
        let f = n.as_f64().ok_or_else(|| CertusError::UnserializableValue {
            path: path.to_string(),
            reason: "number is not representable".to_string(),
        })?;
        if !f.is_finite() {
            return Err(CertusError::UnserializableValue {
                path: path.to_string(),
                reason: "non-finite number".to_string(),
            });
        }
        // serde_json renders floats with ryu: shortest round-trip, no locale.
        let _ = write!(out, "{}", n);
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
