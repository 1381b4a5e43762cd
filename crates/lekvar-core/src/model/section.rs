//! Section records: the per-section name table and directive records

use super::store::OptionKey;
use indexmap::{IndexMap, IndexSet};

/// Relative option name to absolute key.
///
/// Insertion order is preserved so `options()` reports local definitions
/// first, followed by inherited ones in precedence order.
pub type OptionView = IndexMap<String, OptionKey>;

/// Per-section directives collected during a read pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    /// `RENAME from TO to`, applied in declaration order
    pub renames: IndexMap<String, String>,
    /// `AVOID name`
    pub avoids: IndexSet<String>,
    /// `ONLY a, b, ...`; empty means no filter
    pub only: IndexSet<String>,
    /// `INCLUDE section.option [AS alias]`, alias to the included key
    pub includes: IndexMap<String, OptionKey>,
}

impl Directives {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
            && self.avoids.is_empty()
            && self.only.is_empty()
            && self.includes.is_empty()
    }
}

/// A dot-path addressable namespace of options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    /// `None` only for the default section
    dot_parent: Option<String>,
    explicit_parents: Vec<String>,
    children: Vec<String>,
    options: OptionView,
    directives: Directives,
    /// Implicitly created sections may still be claimed by a header
    declared: bool,
}

impl Section {
    pub(crate) fn new(name: impl Into<String>, dot_parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            dot_parent,
            explicit_parents: Vec::new(),
            children: Vec::new(),
            options: OptionView::new(),
            directives: Directives::default(),
            declared: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dot_parent(&self) -> Option<&str> {
        self.dot_parent.as_deref()
    }

    pub fn explicit_parents(&self) -> &[String] {
        &self.explicit_parents
    }

    /// Parents in merge precedence order: explicit parents as listed on the
    /// header, then the dot-parent.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.explicit_parents
            .iter()
            .map(String::as_str)
            .chain(self.dot_parent.as_deref())
    }

    /// Forward edges: sections that inherit from this one
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Locally declared options (before inheritance)
    pub fn options(&self) -> &OptionView {
        &self.options
    }

    pub(crate) fn options_mut(&mut self) -> &mut OptionView {
        &mut self.options
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub(crate) fn directives_mut(&mut self) -> &mut Directives {
        &mut self.directives
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub(crate) fn mark_declared(&mut self) {
        self.declared = true;
    }

    pub(crate) fn add_explicit_parent(&mut self, parent: &str) -> bool {
        if self.explicit_parents.iter().any(|p| p == parent) {
            return false;
        }
        self.explicit_parents.push(parent.to_string());
        true
    }

    pub(crate) fn add_child(&mut self, child: &str) {
        if !self.children.iter().any(|c| c == child) {
            self.children.push(child.to_string());
        }
    }
}
