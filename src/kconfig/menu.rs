//! Menu tree
//!
//! Nodes live in an arena owned by [`KConfigFile`]; parent and child links
//! are [`MenuId`] indices into it. The tree is built once by the parser and
//! only the per-node dependency memo changes afterwards.

use super::errors::KconfigError;
use super::expr::{expr_and, Expr, SymbolLookup, Tristate};
use super::parser::{DuplicatePolicy, ParseOptions};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Index of a node in [`KConfigFile`]
pub type MenuId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    MainMenu,
    Menu,
    /// `if EXPR ... endif` block; carries its condition as `depends on`
    If,
    Choice,
    Config,
    MenuConfig,
    Comment,
}

impl MenuKind {
    /// `config` and `menuconfig` define symbols
    pub fn is_config(self) -> bool {
        matches!(self, MenuKind::Config | MenuKind::MenuConfig)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MenuKind::MainMenu => "mainmenu",
            MenuKind::Menu => "menu",
            MenuKind::If => "if",
            MenuKind::Choice => "choice",
            MenuKind::Config => "config",
            MenuKind::MenuConfig => "menuconfig",
            MenuKind::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigType {
    #[default]
    Unknown,
    Bool,
    Tristate,
    String,
    Int,
    Hex,
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigType::Unknown => "unknown",
            ConfigType::Bool => "bool",
            ConfigType::Tristate => "tristate",
            ConfigType::String => "string",
            ConfigType::Int => "int",
            ConfigType::Hex => "hex",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub condition: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub value: Expr,
    pub condition: Option<Expr>,
}

/// Target of a `select` or `imply`
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseDependency {
    pub symbol: String,
    pub condition: Option<Expr>,
}

/// `range LOW HIGH [if COND]`; recorded, not enforced
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub low: Expr,
    pub high: Expr,
    pub condition: Option<Expr>,
}

/// One node of the menu tree
#[derive(Debug)]
pub struct KConfigMenu {
    pub kind: MenuKind,
    pub ty: ConfigType,
    /// Symbol name; empty for anything but config/menuconfig (and named choices)
    pub name: String,
    pub prompt: Option<Prompt>,
    pub defaults: Vec<DefaultValue>,
    pub selects: Vec<ReverseDependency>,
    pub implies: Vec<ReverseDependency>,
    pub ranges: Vec<Range>,
    pub help: Option<String>,
    /// File the node was declared in
    pub source: PathBuf,
    pub line: usize,
    pub(crate) children: Vec<MenuId>,
    pub(crate) parent: Option<MenuId>,
    pub(crate) depends_on: Option<Expr>,
    pub(crate) visible_if: Option<Expr>,
    pub(crate) deps: OnceLock<BTreeSet<String>>,
}

impl KConfigMenu {
    pub(crate) fn new(kind: MenuKind, source: PathBuf, line: usize) -> Self {
        Self {
            kind,
            ty: ConfigType::Unknown,
            name: String::new(),
            prompt: None,
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
            help: None,
            source,
            line,
            children: Vec::new(),
            parent: None,
            depends_on: None,
            visible_if: None,
            deps: OnceLock::new(),
        }
    }

    pub fn children(&self) -> &[MenuId] {
        &self.children
    }

    /// `None` only for the root
    pub fn parent(&self) -> Option<MenuId> {
        self.parent
    }

    /// Effective `depends on`, ANDed with every enclosing condition
    pub fn depends_on_expr(&self) -> Option<&Expr> {
        self.depends_on.as_ref()
    }

    /// Effective `visible if`, ANDed with every enclosing condition
    pub fn visible_if_expr(&self) -> Option<&Expr> {
        self.visible_if.as_ref()
    }

    /// First `default` entry
    pub fn default(&self) -> Option<&DefaultValue> {
        self.defaults.first()
    }

    pub fn is_config(&self) -> bool {
        self.kind.is_config()
    }

    /// Prompt text, falling back to the symbol name
    pub fn title(&self) -> &str {
        match &self.prompt {
            Some(prompt) => &prompt.text,
            None => &self.name,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.source.display(), self.line)
    }
}

/// A parsed Kconfig tree
#[derive(Debug)]
pub struct KConfigFile {
    pub(crate) menus: Vec<KConfigMenu>,
    pub(crate) root: MenuId,
    pub(crate) configs: FxHashMap<String, MenuId>,
    /// Symbol name -> nodes that `select` or `imply` it
    pub(crate) reverse: FxHashMap<String, Vec<MenuId>>,
    pub(crate) reverse_dependencies: bool,
}

impl KConfigFile {
    /// Finish a freshly parsed arena: propagate conditions down from `root`
    /// and index every config node by name.
    pub(crate) fn build(
        menus: Vec<KConfigMenu>,
        root: MenuId,
        options: &ParseOptions,
    ) -> Result<Self, KconfigError> {
        let mut kconf = KConfigFile {
            menus,
            root,
            configs: FxHashMap::default(),
            reverse: FxHashMap::default(),
            reverse_dependencies: options.reverse_dependencies,
        };
        kconf.walk(root, None, None, options.duplicates)?;
        Ok(kconf)
    }

    fn walk(
        &mut self,
        id: MenuId,
        depends_on: Option<Expr>,
        visible_if: Option<Expr>,
        duplicates: DuplicatePolicy,
    ) -> Result<(), KconfigError> {
        let menu = &mut self.menus[id];
        menu.depends_on = expr_and(depends_on, menu.depends_on.take());
        menu.visible_if = expr_and(visible_if, menu.visible_if.take());

        let depends_on = menu.depends_on.clone();
        let visible_if = menu.visible_if.clone();
        let children = menu.children.clone();
        let targets: Vec<String> = menu
            .selects
            .iter()
            .chain(&menu.implies)
            .map(|rdep| rdep.symbol.clone())
            .collect();

        if menu.is_config() {
            self.register(id, duplicates)?;
        }
        for target in targets {
            self.reverse.entry(target).or_default().push(id);
        }

        for child in children {
            self.walk(child, depends_on.clone(), visible_if.clone(), duplicates)?;
        }
        Ok(())
    }

    fn register(&mut self, id: MenuId, duplicates: DuplicatePolicy) -> Result<(), KconfigError> {
        let name = self.menus[id].name.clone();
        if let Some(previous) = self.configs.insert(name.clone(), id) {
            let first = self.menus[previous].location();
            let second = self.menus[id].location();
            match duplicates {
                DuplicatePolicy::Error => {
                    return Err(KconfigError::DuplicateConfig {
                        name,
                        first,
                        second,
                    });
                }
                DuplicatePolicy::LastWins => {
                    log::warn!("config {} redeclared at {} (first at {})", name, second, first);
                }
            }
        }
        Ok(())
    }

    pub fn root(&self) -> MenuId {
        self.root
    }

    pub fn root_menu(&self) -> &KConfigMenu {
        &self.menus[self.root]
    }

    /// Node by id; panics on an id that did not come from this tree.
    pub fn menu(&self, id: MenuId) -> &KConfigMenu {
        &self.menus[id]
    }

    pub fn get(&self, id: MenuId) -> Option<&KConfigMenu> {
        self.menus.get(id)
    }

    pub fn children(&self, id: MenuId) -> &[MenuId] {
        &self.menus[id].children
    }

    pub fn parent(&self, id: MenuId) -> Option<MenuId> {
        self.menus[id].parent
    }

    /// Config and menuconfig nodes by symbol name
    pub fn configs(&self) -> &FxHashMap<String, MenuId> {
        &self.configs
    }

    pub fn config_id(&self, name: &str) -> Option<MenuId> {
        self.configs.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Option<&KConfigMenu> {
        self.config_id(name).map(|id| &self.menus[id])
    }

    /// Whether `select`/`imply` feed into [`KConfigFile::depends_on`]
    pub fn reverse_dependencies(&self) -> bool {
        self.reverse_dependencies
    }

    /// Nodes that `select` or `imply` `name`
    pub fn selected_by(&self, name: &str) -> &[MenuId] {
        self.reverse.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Preorder walk from the root
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            kconf: self,
            stack: vec![self.root],
        }
    }

    /// How far a node is available under `values`: the minimum of its
    /// effective `depends on` and `visible if`.
    pub fn availability(&self, id: MenuId, values: &dyn SymbolLookup) -> Tristate {
        let menu = &self.menus[id];
        let depends = menu.depends_on.as_ref().map_or(Tristate::Yes, |e| e.eval(values));
        let visible = menu.visible_if.as_ref().map_or(Tristate::Yes, |e| e.eval(values));
        depends.min(visible)
    }

    /// Whether the node's prompt would be shown under `values`
    pub fn is_visible(&self, id: MenuId, values: &dyn SymbolLookup) -> bool {
        let prompt_ok = match &self.menus[id].prompt {
            Some(Prompt {
                condition: Some(cond),
                ..
            }) => cond.eval(values) != Tristate::No,
            _ => true,
        };
        prompt_ok && self.availability(id, values) != Tristate::No
    }
}

/// Iterator returned by [`KConfigFile::iter`]
pub struct Preorder<'a> {
    kconf: &'a KConfigFile,
    stack: Vec<MenuId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (MenuId, &'a KConfigMenu);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let menu = &self.kconf.menus[id];
        self.stack.extend(menu.children.iter().rev());
        Some((id, menu))
    }
}
