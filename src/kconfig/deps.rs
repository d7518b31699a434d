//! Transitive dependency resolution
//!
//! `depends_on(id)` is the set of config symbols reachable from a node's
//! effective `depends on`/`visible if` through the conditions of the
//! symbols they name. Symbols with no config node in the tree are dropped.
//!
//! The closure is computed by a worklist over direct dependencies with a
//! visited set, so circular declarations terminate, and it is memoized per
//! node in a `OnceLock`: concurrent first callers block on one computation
//! and all observe the same set. Computing one closure never touches another
//! node's memo, so initialization cannot re-enter itself.

use super::menu::{KConfigFile, MenuId};
use std::collections::BTreeSet;

impl KConfigFile {
    /// Memoized transitive dependency set of `id`.
    pub fn depends_on(&self, id: MenuId) -> &BTreeSet<String> {
        self.menus[id].deps.get_or_init(|| self.resolve(id))
    }

    /// Transitive dependency set of the config named `name`
    pub fn depends_on_symbol(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.config_id(name).map(|id| self.depends_on(id))
    }

    /// Symbols named directly by the node's effective conditions, plus the
    /// selecting nodes when reverse dependencies are enabled.
    pub fn direct_deps(&self, id: MenuId) -> BTreeSet<String> {
        let menu = &self.menus[id];
        let mut deps = BTreeSet::new();
        if let Some(expr) = &menu.depends_on {
            expr.collect_deps(&mut deps);
        }
        if let Some(expr) = &menu.visible_if {
            expr.collect_deps(&mut deps);
        }

        if self.reverse_dependencies && menu.is_config() {
            for &selector in self.selected_by(&menu.name) {
                let selector = &self.menus[selector];
                if selector.is_config() {
                    deps.insert(selector.name.clone());
                }
                for rdep in selector.selects.iter().chain(&selector.implies) {
                    if rdep.symbol == menu.name {
                        if let Some(cond) = &rdep.condition {
                            cond.collect_deps(&mut deps);
                        }
                    }
                }
            }
        }

        deps
    }

    fn resolve(&self, id: MenuId) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<String> = self.direct_deps(id).into_iter().collect();

        while let Some(name) = pending.pop() {
            let Some(dep) = self.config_id(&name) else {
                continue;
            };
            if !closure.insert(name) {
                continue;
            }
            pending.extend(
                self.direct_deps(dep)
                    .into_iter()
                    .filter(|next| !closure.contains(next)),
            );
        }

        log::trace!(
            "{} depends on {} symbol(s)",
            self.menus[id].title(),
            closure.len()
        );
        closure
    }
}
