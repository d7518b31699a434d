//! `.config` values

use crate::kconfig::expr::Tristate;
use std::fmt;

/// Value of one `.config` entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigValue {
    /// `CONFIG_X=y`
    Yes,
    /// `CONFIG_X=m`
    Module,
    /// `# CONFIG_X is not set`, also returned for unknown keys
    #[default]
    NotSet,
    /// Decimal or hex integer, or a quoted string kept with its quotes
    Literal(String),
}

impl ConfigValue {
    /// Parse the right-hand side of `CONFIG_X=...`.
    ///
    /// Returns `None` for anything that is not `y`, `m`, a decimal or hex
    /// integer, or a double-quoted string.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "y" => Some(ConfigValue::Yes),
            "m" => Some(ConfigValue::Module),
            _ if is_integer(text) || is_quoted(text) => Some(ConfigValue::Literal(text.to_string())),
            _ => None,
        }
    }

    /// Build a quoted string literal, escaping `"` and `\`. Line breaks
    /// become spaces since an entry has to stay on one line.
    pub fn string(text: &str) -> Self {
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('"');
        for ch in text.chars() {
            match ch {
                '"' | '\\' => {
                    quoted.push('\\');
                    quoted.push(ch);
                }
                '\n' | '\r' => quoted.push(' '),
                _ => quoted.push(ch),
            }
        }
        quoted.push('"');
        ConfigValue::Literal(quoted)
    }

    /// Canonical form that survives a write and re-read: a literal that
    /// reads as `y`/`m` becomes the tristate variant, and a literal that is
    /// neither an integer nor a quoted string gets quoted.
    pub fn normalized(self) -> Self {
        match self {
            ConfigValue::Literal(text) => match ConfigValue::parse(&text) {
                Some(value) => value,
                None => ConfigValue::string(&text),
            },
            other => other,
        }
    }

    /// Text as written after `=`; empty for [`ConfigValue::NotSet`]
    pub fn as_str(&self) -> &str {
        match self {
            ConfigValue::Yes => "y",
            ConfigValue::Module => "m",
            ConfigValue::NotSet => "",
            ConfigValue::Literal(text) => text,
        }
    }

    pub fn is_set(&self) -> bool {
        *self != ConfigValue::NotSet
    }

    /// Tristate view: literals and unset values read as `n`.
    pub fn tristate(&self) -> Tristate {
        match self {
            ConfigValue::Yes => Tristate::Yes,
            ConfigValue::Module => Tristate::Module,
            _ => Tristate::No,
        }
    }

    /// Value with string quoting and escapes removed, as expressions see it.
    /// `None` when not set.
    pub fn text(&self) -> Option<String> {
        match self {
            ConfigValue::NotSet => None,
            ConfigValue::Literal(text) if is_quoted(text) => Some(unquote(text)),
            other => Some(other.as_str().to_string()),
        }
    }
}

impl From<Tristate> for ConfigValue {
    fn from(value: Tristate) -> Self {
        match value {
            Tristate::Yes => ConfigValue::Yes,
            Tristate::Module => ConfigValue::Module,
            Tristate::No => ConfigValue::NotSet,
        }
    }
}

/// `"y"`, `"m"` and `"n"` map to the tristate variants and integers are
/// kept as written; anything else becomes a quoted string.
impl From<&str> for ConfigValue {
    fn from(text: &str) -> Self {
        match Tristate::parse(text) {
            Some(t) => t.into(),
            None if is_integer(text) => ConfigValue::Literal(text.to_string()),
            None => ConfigValue::string(text),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::NotSet => f.write_str("is not set"),
            other => f.write_str(other.as_str()),
        }
    }
}

fn is_integer(text: &str) -> bool {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('"')
        && text.ends_with('"')
        && !text.contains(['\n', '\r'])
}

fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
