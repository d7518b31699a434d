//! Dependency expressions
//!
//! The AST for `depends on`, `visible if`, `default ... if` and friends.
//! Dependency resolution only needs the symbols an expression mentions
//! ([`Expr::collect_deps`]); [`Expr::eval`] additionally evaluates it with
//! tristate semantics against a snapshot of symbol values.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Not;

/// Three-valued option state, ordered `No < Module < Yes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Tristate {
    #[default]
    No,
    Module,
    Yes,
}

impl Tristate {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Tristate::Yes
        } else {
            Tristate::No
        }
    }

    /// `y`, `m` or `n`
    pub fn as_str(self) -> &'static str {
        match self {
            Tristate::No => "n",
            Tristate::Module => "m",
            Tristate::Yes => "y",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "y" => Some(Tristate::Yes),
            "m" => Some(Tristate::Module),
            "n" => Some(Tristate::No),
            _ => None,
        }
    }
}

impl Not for Tristate {
    type Output = Tristate;

    fn not(self) -> Tristate {
        match self {
            Tristate::No => Tristate::Yes,
            Tristate::Module => Tristate::Module,
            Tristate::Yes => Tristate::No,
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constant operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Tristate(Tristate),
    Int(i64),
    Hex(u64),
    String(String),
}

impl Literal {
    /// Classify a bare word; `None` means it is a symbol reference.
    pub fn from_word(word: &str) -> Option<Literal> {
        if let Some(t) = Tristate::parse(word) {
            return Some(Literal::Tristate(t));
        }
        if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16).ok().map(Literal::Hex);
        }
        let digits = word.strip_prefix('-').unwrap_or(word);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return word.parse().ok().map(Literal::Int);
        }
        None
    }

    fn text(&self) -> String {
        match self {
            Literal::Tristate(t) => t.as_str().to_string(),
            Literal::Int(n) => n.to_string(),
            Literal::Hex(n) => format!("0x{:x}", n),
            Literal::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            other => f.write_str(&other.text()),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Dependency expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Symbol(String),
    Literal(Literal),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Source of symbol values for [`Expr::eval`]
pub trait SymbolLookup {
    /// Textual value of `name` (`"y"`, `"m"`, `"42"`, unquoted strings),
    /// or `None` when the symbol has no value.
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl SymbolLookup for FxHashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Insert every symbol the expression references into `deps`.
    pub fn collect_deps(&self, deps: &mut BTreeSet<String>) {
        match self {
            Expr::Symbol(name) => {
                deps.insert(name.clone());
            }
            Expr::Literal(_) => {}
            Expr::Not(inner) => inner.collect_deps(deps),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) | Expr::Compare { lhs, rhs, .. } => {
                lhs.collect_deps(deps);
                rhs.collect_deps(deps);
            }
        }
    }

    /// Symbols referenced by the expression
    pub fn deps(&self) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        self.collect_deps(&mut deps);
        deps
    }

    /// Evaluate with Kconfig tristate semantics.
    ///
    /// Unknown symbols and non-tristate values count as `n`.
    pub fn eval(&self, values: &dyn SymbolLookup) -> Tristate {
        match self {
            Expr::Symbol(name) => values
                .lookup(name)
                .and_then(Tristate::parse)
                .unwrap_or(Tristate::No),
            Expr::Literal(Literal::Tristate(t)) => *t,
            Expr::Literal(_) => Tristate::No,
            Expr::Not(inner) => !inner.eval(values),
            Expr::And(lhs, rhs) => lhs.eval(values).min(rhs.eval(values)),
            Expr::Or(lhs, rhs) => lhs.eval(values).max(rhs.eval(values)),
            Expr::Compare { op, lhs, rhs } => {
                let lhs = lhs.operand_text(values);
                let rhs = rhs.operand_text(values);
                Tristate::from_bool(op.holds(compare_values(&lhs, &rhs)))
            }
        }
    }

    fn operand_text(&self, values: &dyn SymbolLookup) -> String {
        match self {
            Expr::Symbol(name) => values.lookup(name).unwrap_or("n").to_string(),
            Expr::Literal(lit) => lit.text(),
            other => other.eval(values).as_str().to_string(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(..) => 1,
            Expr::And(..) => 2,
            Expr::Compare { .. } => 3,
            _ => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Numbers compare numerically, everything else as text.
fn compare_values(lhs: &str, rhs: &str) -> Ordering {
    match (parse_number(lhs), parse_number(rhs)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => lhs.cmp(rhs),
    }
}

fn parse_number(text: &str) -> Option<i128> {
    match Literal::from_word(text)? {
        Literal::Int(n) => Some(n as i128),
        Literal::Hex(n) => Some(n as i128),
        _ => None,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(name) => f.write_str(name),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_operand(f, 4)
            }
            Expr::And(lhs, rhs) => {
                lhs.fmt_operand(f, 2)?;
                f.write_str(" && ")?;
                rhs.fmt_operand(f, 2)
            }
            Expr::Or(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                f.write_str(" || ")?;
                rhs.fmt_operand(f, 1)
            }
            Expr::Compare { op, lhs, rhs } => {
                lhs.fmt_operand(f, 4)?;
                write!(f, " {} ", op.as_str())?;
                rhs.fmt_operand(f, 4)
            }
        }
    }
}

/// AND two optional conditions, treating `None` as "always true".
pub fn expr_and(a: Option<Expr>, b: Option<Expr>) -> Option<Expr> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => Some(Expr::And(Box::new(a), Box::new(b))),
    }
}
