//! Option propagation along the inheritance order
//!
//! For each section in topological order the resolver builds its effective
//! view in five steps:
//!
//! 1. start from the locally declared names (assignments, relocations, includes)
//! 2. merge every parent's resolved view, explicit parents in header order
//!    first, then the dot-parent, then the default section; a name already
//!    present always wins. A parent's resolved view already carries what it
//!    inherited from the default section, so those values arrive at that
//!    parent's rank; the default section itself is only a final fallback
//! 3. apply `RENAME` directives
//! 4. apply `AVOID` directives
//! 5. apply the `ONLY` filter
//!
//! Only name → key indirections move; values stay where they were stored.
//! The declared model is never modified, so resolving twice gives the same
//! result.

use super::inheritance_graph::InheritanceGraph;
use crate::model::{Directives, OptionStore, OptionView, SectionRegistry};
use crate::{LekvarError, Result};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

/// Effective option views of every section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    order: Vec<String>,
    views: IndexMap<String, OptionView>,
}

impl Resolution {
    /// Resolved view of one section
    pub fn view(&self, section: &str) -> Option<&OptionView> {
        self.views.get(section)
    }

    /// Sections in the order they were resolved, default section first
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Single-shot resolver over an ingested registry and store
pub struct InheritanceResolver<'a> {
    registry: &'a SectionRegistry,
    store: &'a OptionStore,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(registry: &'a SectionRegistry, store: &'a OptionStore) -> Self {
        Self { registry, store }
    }

    pub fn resolve(&self) -> Result<Resolution> {
        let graph = InheritanceGraph::from_registry(self.registry)?;
        let order = graph.topological_order()?;
        self.check_includes()?;

        let default_section = self.registry.default_section();
        let mut views: IndexMap<String, OptionView> = IndexMap::with_capacity(order.len());

        for name in &order {
            let section = self.registry.section(name)?;
            let mut view = section.options().clone();
            let local = view.len();

            if !self.registry.is_default(name) {
                let layers = section
                    .parents()
                    .chain((section.dot_parent() != Some(default_section)).then_some(default_section));
                for parent in layers {
                    match views.get(parent) {
                        Some(parent_view) => merge_missing(&mut view, parent_view),
                        None => warn!("Section '{}' resolved before its parent '{}'", name, parent),
                    }
                }
            }

            apply_directives(name, &mut view, section.directives());
            debug!(
                "Resolved section '{}': {} local, {} effective options",
                name,
                local,
                view.len()
            );
            views.insert(name.clone(), view);
        }

        Ok(Resolution { order, views })
    }

    /// Every INCLUDE that is still in effect must point at a stored value
    fn check_includes(&self) -> Result<()> {
        for section in self.registry.iter() {
            for (alias, key) in &section.directives().includes {
                let in_effect = section.options().get(alias) == Some(key);
                if in_effect && !self.store.contains_key(key) {
                    return Err(LekvarError::UnresolvedInclude {
                        section: section.name().to_string(),
                        target: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Copy every name `parent` exposes that `view` does not have yet
fn merge_missing(view: &mut OptionView, parent: &OptionView) {
    for (name, key) in parent {
        if !view.contains_key(name) {
            view.insert(name.clone(), key.clone());
        }
    }
}

fn apply_directives(section: &str, view: &mut OptionView, directives: &Directives) {
    for (from, to) in &directives.renames {
        if from == to {
            continue;
        }
        match view.shift_remove(from) {
            Some(key) => {
                trace!("{}: renamed '{}' to '{}'", section, from, to);
                view.insert(to.clone(), key);
            }
            None => trace!("{}: nothing to rename for '{}'", section, from),
        }
    }

    for name in &directives.avoids {
        if view.shift_remove(name).is_some() {
            trace!("{}: avoided '{}'", section, name);
        }
    }

    if !directives.only.is_empty() {
        view.retain(|name, _| directives.only.contains(name));
        trace!("{}: kept {} options after ONLY", section, view.len());
    }
}
