//! `.config` value files
//!
//! A [`DotConfigFile`] keeps entries in file order, each with the comment
//! and blank lines that preceded it, so that a parse/serialize round trip
//! reproduces the input. Entry names are stored without the `CONFIG_`
//! prefix.
//!
//! ```text
//! # Lines that are not entries are kept verbatim
//! CONFIG_LIBUKDEBUG=y
//! # CONFIG_LIBUKDEBUG_PRINTD is not set
//! CONFIG_LIBUKALLOC_IFSTATS_PERLIB=m
//! CONFIG_UK_NAME="helloworld"
//! ```

pub mod value;

pub use value::ConfigValue;

use crate::kconfig::expr::SymbolLookup;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PREFIX: &str = "CONFIG_";

const NOT_SET_SUFFIX: &str = " is not set";

static NOT_SET: ConfigValue = ConfigValue::NotSet;

#[derive(Debug, Error)]
pub enum DotConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One `CONFIG_` line and the lines preceding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    value: ConfigValue,
    comments: Vec<String>,
}

impl Entry {
    /// Name without the `CONFIG_` prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    /// Verbatim lines written before the entry
    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotConfigFile {
    entries: Vec<Entry>,
    index: FxHashMap<String, usize>,
    /// Lines not yet attached to an entry; trailing comments on output
    comments: Vec<String>,
}

impl DotConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `.config` text. Never fails: unrecognized lines are kept as
    /// comments of the entry that follows them.
    pub fn parse(data: &str) -> Self {
        let mut file = Self::new();
        for line in data.lines() {
            match parse_line(line) {
                Some((name, value)) => file.set(name, value),
                None => file.comments.push(line.to_string()),
            }
        }
        log::debug!(
            "parsed .config: {} entries, {} trailing lines",
            file.entries.len(),
            file.comments.len()
        );
        file
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DotConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| DotConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&data))
    }

    /// Value of `name`, [`ConfigValue::NotSet`] when absent.
    pub fn value(&self, name: &str) -> &ConfigValue {
        match self.index.get(name) {
            Some(&idx) => &self.entries[idx].value,
            None => &NOT_SET,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insert or update `name`. An existing entry keeps its place and
    /// comments; a new one goes to the end of the file and takes the
    /// pending comment lines.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ConfigValue>) {
        let name = name.into();
        let value = value.into().normalized();
        match self.index.get(&name) {
            Some(&idx) => self.entries[idx].value = value,
            None => {
                self.entries.push(Entry {
                    name: name.clone(),
                    value,
                    comments: std::mem::take(&mut self.comments),
                });
                self.index.insert(name, self.entries.len() - 1);
            }
        }
    }

    /// Mark an existing entry as not set. Absent names are left alone.
    pub fn unset(&mut self, name: &str) {
        if let Some(&idx) = self.index.get(name) {
            self.entries[idx].value = ConfigValue::NotSet;
        }
    }

    /// Turn every `m` into `y`.
    pub fn mod_to_yes(&mut self) {
        self.rewrite_modules(ConfigValue::Yes);
    }

    /// Turn every `m` into "not set".
    pub fn mod_to_no(&mut self) {
        self.rewrite_modules(ConfigValue::NotSet);
    }

    fn rewrite_modules(&mut self, to: ConfigValue) {
        let mut count = 0;
        for entry in &mut self.entries {
            if entry.value == ConfigValue::Module {
                entry.value = to.clone();
                count += 1;
            }
        }
        log::debug!("rewrote {} module entries to '{}'", count, to);
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for comment in &entry.comments {
                out.push_str(comment);
                out.push('\n');
            }
            match &entry.value {
                ConfigValue::NotSet => {
                    out.push_str("# ");
                    out.push_str(CONFIG_PREFIX);
                    out.push_str(&entry.name);
                    out.push_str(NOT_SET_SUFFIX);
                }
                value => {
                    out.push_str(CONFIG_PREFIX);
                    out.push_str(&entry.name);
                    out.push('=');
                    out.push_str(value.as_str());
                }
            }
            out.push('\n');
        }
        for comment in &self.comments {
            out.push_str(comment);
            out.push('\n');
        }
        out
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DotConfigError> {
        let path = path.as_ref();
        fs::write(path, self.serialize()).map_err(|source| DotConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines after the last entry
    pub fn trailing_comments(&self) -> &[String] {
        &self.comments
    }
}

/// Expressions see `y`/`m`, numbers, and strings without their quotes.
impl SymbolLookup for DotConfigFile {
    fn lookup(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            ConfigValue::NotSet => None,
            value => {
                let text = value.as_str();
                Some(
                    text.strip_prefix('"')
                        .and_then(|t| t.strip_suffix('"'))
                        .unwrap_or(text),
                )
            }
        }
    }
}

/// Recognize `CONFIG_NAME=VALUE` and `# CONFIG_NAME is not set`.
fn parse_line(line: &str) -> Option<(&str, ConfigValue)> {
    if let Some(rest) = line.strip_prefix("# ") {
        let name = rest
            .strip_prefix(CONFIG_PREFIX)?
            .strip_suffix(NOT_SET_SUFFIX)?;
        return is_name(name).then_some((name, ConfigValue::NotSet));
    }

    let (name, value) = line.strip_prefix(CONFIG_PREFIX)?.split_once('=')?;
    if !is_name(name) {
        return None;
    }
    Some((name, ConfigValue::parse(value)?))
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
