//! Kconfig grammar parser
//!
//! Each file is read one logical line at a time; every line is expanded by
//! the [`Preprocessor`] right before it is parsed. The parser keeps a
//! stack of open scopes (`mainmenu`, `menu`, `if`, `choice`) and a single
//! current node that collects properties until the next directive:
//!
//! - scope directives finish the current node and push a new scope;
//! - `config`, `menuconfig` and `comment` finish the current node and start
//!   a new leaf;
//! - `endmenu`/`endif`/`endchoice` close the innermost scope and attach it
//!   to its parent.
//!
//! Missing closers are tolerated: a close with no open scope is ignored, and
//! scopes still open at the end of input are closed implicitly.
//!
//! `source` recurses into `parse_source` with a fresh [`Scanner`], so each
//! file's cursor lives on the call stack. Nested files share the
//! environment, which makes their `:=` bindings visible to the rest of the
//! including file.

use super::env::KeyValueMap;
use super::errors::KconfigError;
use super::expr::{expr_and, Expr};
use super::handlers::HandlerTable;
use super::menu::{
    ConfigType, DefaultValue, KConfigFile, KConfigMenu, MenuId, MenuKind, Prompt, Range,
    ReverseDependency,
};
use super::preprocess::{LogicalLines, Preprocessor};
use super::scanner::{indent_of, strip_indent, Scanner};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when the input has no enclosing `mainmenu`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMainMenu {
    /// Fail with [`KconfigError::MissingMainMenu`]
    #[default]
    Error,
    /// Return a tree holding only an empty, synthesized mainmenu
    Empty,
}

/// What to do when a config symbol is declared more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The last declaration owns the name; earlier ones stay in the tree
    #[default]
    LastWins,
    /// Fail with [`KconfigError::DuplicateConfig`]
    Error,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub missing_mainmenu: MissingMainMenu,
    pub duplicates: DuplicatePolicy,
    /// Feed `select`/`imply` into dependency resolution
    pub reverse_dependencies: bool,
    /// Seed the environment with the `UK_BASE` derived paths
    pub preamble: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            missing_mainmenu: MissingMainMenu::Error,
            duplicates: DuplicatePolicy::LastWins,
            reverse_dependencies: false,
            preamble: true,
        }
    }
}

/// Help block being collected
struct HelpBlock {
    target: MenuId,
    /// Indentation of the line holding the `help` keyword
    keyword_indent: usize,
    /// Indentation of the first text line, once seen
    indent: Option<usize>,
    lines: Vec<String>,
}

pub struct Parser {
    env: KeyValueMap,
    handlers: HandlerTable,
    options: ParseOptions,
    menus: Vec<KConfigMenu>,
    stack: Vec<MenuId>,
    current: Option<MenuId>,
    /// Set by a `help` property, picked up by the line loop
    pending_help: Option<MenuId>,
    /// Canonical paths of the files currently being parsed, outermost first
    includes: Vec<PathBuf>,
}

impl Parser {
    /// Parser with the built-in macro handlers and default options.
    pub fn new(env: KeyValueMap) -> Self {
        Self {
            env,
            handlers: HandlerTable::builtin(),
            options: ParseOptions::default(),
            menus: Vec::new(),
            stack: Vec::new(),
            current: None,
            pending_help: None,
            includes: Vec::new(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Environment after the last parse, including `:=` bindings
    pub fn env(&self) -> &KeyValueMap {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut KeyValueMap {
        &mut self.env
    }

    /// Parse the Kconfig file at `path` and everything it sources.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<KConfigFile, KconfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| KconfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&data, path)
    }

    /// Parse `data` as if read from `path`; relative `source` directives
    /// resolve against `path`'s directory.
    pub fn parse_str(
        &mut self,
        data: &str,
        path: impl AsRef<Path>,
    ) -> Result<KConfigFile, KconfigError> {
        let path = path.as_ref();
        self.menus.clear();
        self.stack.clear();
        self.current = None;
        self.pending_help = None;
        self.includes = vec![canonical(path)];

        if self.options.preamble {
            Preprocessor::new(&self.handlers).seed_preamble(&mut self.env)?;
        }

        log::debug!("parsing {}", path.display());
        self.parse_source(data, path)?;
        self.finish(path)
    }

    fn parse_source(&mut self, data: &str, path: &Path) -> Result<(), KconfigError> {
        let file = path.display().to_string();
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut scanner = Scanner::new(file.as_str());
        let mut help: Option<HelpBlock> = None;

        for logical in LogicalLines::new(data) {
            // Help text is taken verbatim, without macro expansion
            if let Some(block) = help.as_mut() {
                if collect_help_line(block, &logical.text) {
                    continue;
                }
                if let Some(done) = help.take() {
                    self.store_help(done);
                }
            }

            let expanded = Preprocessor::new(&self.handlers).expand_line(
                &logical.text,
                &file,
                logical.line,
                &mut self.env,
            )?;
            let Some(text) = expanded else {
                continue;
            };

            scanner.load_line(&text, logical.line);
            scanner.skip_spaces();
            if scanner.eol() {
                continue;
            }

            self.parse_line(&mut scanner, path, dir)?;

            if let Some(target) = self.pending_help.take() {
                help = Some(HelpBlock {
                    target,
                    keyword_indent: scanner.indent_level(),
                    indent: None,
                    lines: Vec::new(),
                });
            }
        }

        if let Some(done) = help.take() {
            self.store_help(done);
        }
        Ok(())
    }

    fn store_help(&mut self, block: HelpBlock) {
        let mut lines = block.lines;
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if !lines.is_empty() {
            self.menus[block.target].help = Some(lines.join("\n"));
        }
    }

    fn parse_line(
        &mut self,
        scanner: &mut Scanner,
        path: &Path,
        dir: &Path,
    ) -> Result<(), KconfigError> {
        let directive = scanner.ident()?;

        // Recursively expanded `NAME = value` definitions; `:=` ones were
        // already consumed by the preprocessor
        if scanner.try_consume(":=") || scanner.try_consume("=") {
            log::debug!("{}: ignoring macro definition of {}", scanner.file(), directive);
            scanner.consume_line();
            return Ok(());
        }

        log::trace!("{}:{}: {}", scanner.file(), scanner.location().line, directive);
        let line = scanner.location().line;

        match directive.as_str() {
            "source" | "rsource" => self.include(scanner, dir, false)?,
            "osource" | "orsource" => self.include(scanner, dir, true)?,
            "mainmenu" => {
                let prompt = parse_prompt(scanner)?;
                let id = self.new_menu(MenuKind::MainMenu, path, line);
                self.menus[id].prompt = Some(prompt);
                self.push_current(id);
            }
            "menu" => {
                let prompt = parse_prompt(scanner)?;
                let id = self.new_menu(MenuKind::Menu, path, line);
                self.menus[id].prompt = Some(prompt);
                self.push_current(id);
            }
            "comment" => {
                let prompt = parse_prompt(scanner)?;
                let id = self.new_menu(MenuKind::Comment, path, line);
                self.menus[id].prompt = Some(prompt);
                self.new_current(id);
            }
            "if" => {
                let condition = scanner.parse_expr()?;
                let id = self.new_menu(MenuKind::If, path, line);
                self.menus[id].depends_on = Some(condition);
                self.push_current(id);
            }
            "choice" => {
                let name = if scanner.eol() {
                    String::new()
                } else {
                    scanner.ident()?
                };
                let id = self.new_menu(MenuKind::Choice, path, line);
                self.menus[id].name = name;
                self.push_current(id);
            }
            "endmenu" | "endif" | "endchoice" => self.pop_current(&directive),
            "config" | "menuconfig" => {
                let kind = if directive == "config" {
                    MenuKind::Config
                } else {
                    MenuKind::MenuConfig
                };
                let name = scanner.ident()?;
                let id = self.new_menu(kind, path, line);
                self.menus[id].name = name;
                self.new_current(id);
            }
            _ => self.parse_config_type(scanner, &directive)?,
        }

        scanner.expect_eol()
    }

    fn parse_config_type(
        &mut self,
        scanner: &mut Scanner,
        keyword: &str,
    ) -> Result<(), KconfigError> {
        let (ty, with_default) = match keyword {
            "bool" | "boolean" => (ConfigType::Bool, false),
            "def_bool" => (ConfigType::Bool, true),
            "tristate" => (ConfigType::Tristate, false),
            "def_tristate" => (ConfigType::Tristate, true),
            "string" => (ConfigType::String, false),
            "def_string" => (ConfigType::String, true),
            "int" => (ConfigType::Int, false),
            "def_int" => (ConfigType::Int, true),
            "hex" => (ConfigType::Hex, false),
            "def_hex" => (ConfigType::Hex, true),
            _ => return self.parse_property(scanner, keyword),
        };

        let cur = self.current(scanner)?;
        self.menus[cur].ty = ty;
        if with_default {
            self.parse_default(scanner, cur)
        } else {
            self.parse_optional_prompt(scanner, cur)
        }
    }

    fn parse_property(&mut self, scanner: &mut Scanner, keyword: &str) -> Result<(), KconfigError> {
        match keyword {
            "prompt" => {
                let cur = self.current(scanner)?;
                self.parse_optional_prompt(scanner, cur)
            }
            "depends" => {
                let cur = self.current(scanner)?;
                scanner.must_keyword("on")?;
                let expr = scanner.parse_expr()?;
                let menu = &mut self.menus[cur];
                menu.depends_on = expr_and(menu.depends_on.take(), Some(expr));
                Ok(())
            }
            "visible" => {
                let cur = self.current(scanner)?;
                scanner.must_keyword("if")?;
                let expr = scanner.parse_expr()?;
                let menu = &mut self.menus[cur];
                menu.visible_if = expr_and(menu.visible_if.take(), Some(expr));
                Ok(())
            }
            "select" | "imply" => {
                let cur = self.current(scanner)?;
                let symbol = scanner.ident()?;
                let condition = parse_condition(scanner)?;
                let rdep = ReverseDependency { symbol, condition };
                if keyword == "select" {
                    self.menus[cur].selects.push(rdep);
                } else {
                    self.menus[cur].implies.push(rdep);
                }
                Ok(())
            }
            "option" => {
                // `option modules`, `option env="ARCH"`, ...: no effect here
                self.current(scanner)?;
                scanner.consume_line();
                Ok(())
            }
            "optional" | "modules" | "transitional" => {
                self.current(scanner)?;
                Ok(())
            }
            "default" => {
                let cur = self.current(scanner)?;
                self.parse_default(scanner, cur)
            }
            "range" => {
                let cur = self.current(scanner)?;
                let low = scanner.parse_expr()?;
                let high = scanner.parse_expr()?;
                let condition = parse_condition(scanner)?;
                self.menus[cur].ranges.push(Range {
                    low,
                    high,
                    condition,
                });
                Ok(())
            }
            "help" | "---help---" => {
                let cur = self.current(scanner)?;
                self.pending_help = Some(cur);
                Ok(())
            }
            _ => Err(scanner.fail("unknown line")),
        }
    }

    fn parse_optional_prompt(
        &mut self,
        scanner: &mut Scanner,
        cur: MenuId,
    ) -> Result<(), KconfigError> {
        if let Some(text) = scanner.try_quoted_string()? {
            let condition = parse_condition(scanner)?;
            self.menus[cur].prompt = Some(Prompt { text, condition });
        }
        Ok(())
    }

    fn parse_default(&mut self, scanner: &mut Scanner, cur: MenuId) -> Result<(), KconfigError> {
        let value = scanner.parse_expr()?;
        let condition = parse_condition(scanner)?;
        self.menus[cur]
            .defaults
            .push(DefaultValue { value, condition });
        Ok(())
    }

    fn include(
        &mut self,
        scanner: &mut Scanner,
        dir: &Path,
        optional: bool,
    ) -> Result<(), KconfigError> {
        let file = match scanner.try_quoted_string()? {
            Some(file) => file,
            None => scanner.consume_line().trim().to_string(),
        };
        if file.is_empty() {
            return Err(scanner.fail("expected a file name"));
        }

        let target = Path::new(&file);
        let path: PathBuf = if target.is_absolute() {
            target.to_path_buf()
        } else {
            dir.join(target)
        };

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if optional && err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{}: optional source {} not found", scanner.file(), path.display());
                return Ok(());
            }
            Err(source) => {
                return Err(KconfigError::Include {
                    ctx: scanner.context(),
                    source: Box::new(KconfigError::Io { path, source }),
                });
            }
        };

        let resolved = canonical(&path);
        if self.includes.contains(&resolved) {
            return Err(scanner.fail(format!(
                "recursive inclusion of {}",
                path.display()
            )));
        }

        log::debug!("{}: including {}", scanner.file(), path.display());
        self.includes.push(resolved);
        let result = self.parse_source(&data, &path);
        self.includes.pop();
        result.map_err(|source| KconfigError::Include {
            ctx: scanner.context(),
            source: Box::new(source),
        })
    }

    fn new_menu(&mut self, kind: MenuKind, path: &Path, line: usize) -> MenuId {
        self.menus.push(KConfigMenu::new(kind, path.to_path_buf(), line));
        self.menus.len() - 1
    }

    fn current(&self, scanner: &Scanner) -> Result<MenuId, KconfigError> {
        self.current
            .ok_or_else(|| scanner.fail("config property outside of config"))
    }

    fn new_current(&mut self, id: MenuId) {
        self.end_current();
        self.current = Some(id);
    }

    fn push_current(&mut self, id: MenuId) {
        self.end_current();
        self.current = Some(id);
        self.stack.push(id);
    }

    fn end_current(&mut self) {
        let Some(cur) = self.current.take() else {
            return;
        };
        match self.stack.last().copied() {
            None => {
                // No enclosing scope at all: the node becomes the base
                log::debug!("{} opens an implicit root", self.menus[cur].title());
                self.stack.push(cur);
            }
            Some(top) if top != cur => self.attach(cur, top),
            Some(_) => {}
        }
    }

    fn pop_current(&mut self, closer: &str) {
        self.end_current();
        if self.stack.len() < 2 {
            log::warn!("ignoring unbalanced {}", closer);
            return;
        }
        self.close_scope();
    }

    fn close_scope(&mut self) {
        if let Some(last) = self.stack.pop() {
            if let Some(top) = self.stack.last().copied() {
                self.attach(last, top);
            }
        }
    }

    fn attach(&mut self, child: MenuId, parent: MenuId) {
        self.menus[child].parent = Some(parent);
        self.menus[parent].children.push(child);
    }

    fn finish(&mut self, path: &Path) -> Result<KConfigFile, KconfigError> {
        self.end_current();
        while self.stack.len() > 1 {
            let open = self.stack.len() - 1;
            log::warn!(
                "{} left open at end of input, closing",
                self.menus[self.stack[open]].kind.as_str()
            );
            self.close_scope();
        }

        let root = self
            .stack
            .first()
            .copied()
            .filter(|&id| self.menus[id].kind == MenuKind::MainMenu);
        let menus = std::mem::take(&mut self.menus);
        self.stack.clear();

        match (root, self.options.missing_mainmenu) {
            (Some(root), _) => KConfigFile::build(menus, root, &self.options),
            (None, MissingMainMenu::Error) => Err(KconfigError::MissingMainMenu {
                file: path.to_path_buf(),
            }),
            (None, MissingMainMenu::Empty) => {
                log::debug!("{} has no mainmenu, returning an empty tree", path.display());
                let root = KConfigMenu::new(MenuKind::MainMenu, path.to_path_buf(), 0);
                KConfigFile::build(vec![root], 0, &self.options)
            }
        }
    }
}

/// `path` with symlinks and `..` resolved, or as given when it cannot be.
fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parse_condition(scanner: &mut Scanner) -> Result<Option<Expr>, KconfigError> {
    if scanner.try_keyword("if") {
        scanner.parse_expr().map(Some)
    } else {
        Ok(None)
    }
}

/// `"text" [if COND]`
fn parse_prompt(scanner: &mut Scanner) -> Result<Prompt, KconfigError> {
    let text = scanner.quoted_string()?;
    let condition = parse_condition(scanner)?;
    Ok(Prompt { text, condition })
}

/// Feed one line to an open help block. Returns `false` once the line is
/// no longer part of it.
fn collect_help_line(block: &mut HelpBlock, line: &str) -> bool {
    let line = line.trim_end();
    if line.is_empty() {
        if block.indent.is_some() {
            block.lines.push(String::new());
        }
        return true;
    }

    let level = indent_of(line);
    match block.indent {
        None if level > block.keyword_indent => {
            block.indent = Some(level);
            block.lines.push(strip_indent(line, level).to_string());
            true
        }
        Some(indent) if level >= indent => {
            block.lines.push(strip_indent(line, indent).to_string());
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<KConfigFile, KconfigError> {
        Parser::new(KeyValueMap::new()).parse_str(text, "Kconfig")
    }

    #[test]
    fn test_properties_land_on_current_config() {
        let kconf = parse(
            "mainmenu \"Test\"\n\
             config A\n\
             \tint \"Size\" if B\n\
             \tdefault 4 if B\n\
             \tdefault 2\n\
             \trange 1 8\n\
             \tselect C if B\n\
             \timply D\n\
             config B\n\
             \tdef_bool y\n",
        )
        .unwrap();

        let a = kconf.lookup("A").unwrap();
        assert_eq!(a.ty, ConfigType::Int);
        assert_eq!(a.title(), "Size");
        assert_eq!(a.defaults.len(), 2);
        assert_eq!(a.ranges.len(), 1);
        assert_eq!(a.selects[0].symbol, "C");
        assert!(a.selects[0].condition.is_some());
        assert_eq!(a.implies[0].symbol, "D");
        assert_eq!(a.line, 2);

        let b = kconf.lookup("B").unwrap();
        assert_eq!(b.ty, ConfigType::Bool);
        assert_eq!(b.default().unwrap().value.to_string(), "y");
    }

    #[test]
    fn test_help_block() {
        let kconf = parse(
            "mainmenu \"Test\"\n\
             config A\n\
             \tbool\n\
             \thelp\n\
             \t  First line.\n\
             \n\
             \t    Indented.\n\
             \n\
             config B\n\
             \tbool\n",
        )
        .unwrap();
        assert_eq!(
            kconf.lookup("A").unwrap().help.as_deref(),
            Some("First line.\n\n  Indented.")
        );
        assert!(kconf.lookup("B").is_some());
    }

    #[test]
    fn test_help_without_text() {
        let kconf = parse("mainmenu \"T\"\nconfig A\n\tbool\n\thelp\nconfig B\n").unwrap();
        assert_eq!(kconf.lookup("A").unwrap().help, None);
        assert!(kconf.lookup("B").is_some());
    }

    #[test]
    fn test_property_outside_config() {
        match parse("bool \"nothing to attach to\"\n") {
            Err(KconfigError::Syntax { message, ctx }) => {
                assert_eq!(message, "config property outside of config");
                assert_eq!(ctx.line, 1);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_line_and_trailing_data() {
        assert!(matches!(
            parse("mainmenu \"T\"\nconfig A\n\tfrobnicate\n"),
            Err(KconfigError::Syntax { .. })
        ));
        match parse("mainmenu \"T\" extra\n") {
            Err(KconfigError::Syntax { message, .. }) => {
                assert_eq!(message, "trailing data at the end of line")
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_closers_are_tolerated() {
        let kconf = parse("mainmenu \"T\"\nendmenu\nmenu \"M\"\nconfig A\n").unwrap();
        let root = kconf.root_menu();
        assert_eq!(root.children().len(), 1);
        let menu = kconf.menu(root.children()[0]);
        assert_eq!(menu.kind, MenuKind::Menu);
        assert_eq!(kconf.menu(menu.children()[0]).name, "A");
    }

    #[test]
    fn test_macro_definition_lines_are_skipped() {
        let kconf = parse("mainmenu \"T\"\nFOO = bar\nconfig A\n").unwrap();
        assert!(kconf.lookup("A").is_some());
    }
}
