//! Section registry
//!
//! Owns every [`Section`], keyed by dotted path, together with the implicit
//! dot-parent links and the explicit inheritance lists collected from section
//! headers. Parents are created on demand, so every dot-parent chain ends at
//! the default section.

use super::section::Section;
use crate::{LekvarError, Result};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Characters that can never appear inside a section name
const FORBIDDEN_CHARS: &[char] = &['[', ']', ':', ',', '>'];

#[derive(Debug, Clone)]
pub struct SectionRegistry {
    default_section: String,
    sections: IndexMap<String, Section>,
}

impl SectionRegistry {
    /// Create a registry holding only the default section
    pub fn new(default_section: impl Into<String>) -> Self {
        let default_section = default_section.into();
        let mut root = Section::new(default_section.clone(), None);
        root.mark_declared();

        let mut sections = IndexMap::new();
        sections.insert(default_section.clone(), root);

        Self {
            default_section,
            sections,
        }
    }

    pub fn default_section(&self) -> &str {
        &self.default_section
    }

    pub fn is_default(&self, name: &str) -> bool {
        name == self.default_section
    }

    /// Declare a section.
    ///
    /// Fails with `DuplicateSection` when the name is the default section or
    /// was already declared. A section that only exists because something
    /// referenced it is claimed instead.
    pub fn add_section(&mut self, name: &str) -> Result<()> {
        if self.is_default(name) {
            return Err(LekvarError::duplicate_section(name));
        }
        if self.get(name).is_some_and(Section::is_declared) {
            return Err(LekvarError::duplicate_section(name));
        }

        self.ensure_section(name)?;
        if let Some(section) = self.sections.get_mut(name) {
            section.mark_declared();
        }
        debug!("Declared section '{}'", name);
        Ok(())
    }

    /// Make sure `name` exists, creating it and any missing dot-parents
    /// implicitly.
    pub fn ensure_section(&mut self, name: &str) -> Result<()> {
        if self.sections.contains_key(name) {
            return Ok(());
        }
        validate_section_name(name)?;

        let dot_parent = match name.rsplit_once('.') {
            Some((parent, _)) => parent.to_string(),
            None => self.default_section.clone(),
        };
        self.ensure_section(&dot_parent)?;

        trace!("Creating section '{}' under '{}'", name, dot_parent);
        self.sections
            .insert(name.to_string(), Section::new(name, Some(dot_parent.clone())));
        if let Some(parent) = self.sections.get_mut(&dot_parent) {
            parent.add_child(name);
        }
        Ok(())
    }

    /// Record the `:`-list of a section header.
    ///
    /// Adds one backward edge child → parent and one forward edge
    /// parent → child per listed parent, creating missing parents. Re-reading
    /// the same header changes nothing.
    pub fn resolve_header_inheritance(&mut self, name: &str, parents: &[String]) -> Result<()> {
        if self.is_default(name) && !parents.is_empty() {
            return Err(LekvarError::SectionInheritance {
                section: name.to_string(),
            });
        }
        self.ensure_section(name)?;

        for parent in parents {
            self.ensure_section(parent)?;

            let added = self
                .sections
                .get_mut(name)
                .is_some_and(|section| section.add_explicit_parent(parent));
            if added {
                trace!("Section '{}' inherits from '{}'", name, parent);
            }
            if let Some(parent_section) = self.sections.get_mut(parent.as_str()) {
                parent_section.add_child(name);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Like [`get`](Self::get) but fails with `NoSection`
    pub fn section(&self, name: &str) -> Result<&Section> {
        self.get(name).ok_or_else(|| LekvarError::no_section(name))
    }

    pub fn section_mut(&mut self, name: &str) -> Result<&mut Section> {
        self.sections
            .get_mut(name)
            .ok_or_else(|| LekvarError::no_section(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// All sections in registration order, default section first
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Section names in registration order, excluding the default section
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections
            .keys()
            .map(String::as_str)
            .filter(|name| *name != self.default_section)
    }

    /// Number of sections including the default section
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.len() <= 1
    }
}

/// Check that every dotted segment is non-empty and free of grammar
/// characters.
pub fn validate_section_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.trim().is_empty() && segment.trim() == segment
        })
        && !name.contains(FORBIDDEN_CHARS);

    if valid {
        Ok(())
    } else {
        Err(LekvarError::InvalidSectionName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_section_creates_dot_parents() {
        let mut registry = SectionRegistry::new("DEFAULT");
        registry.add_section("a.b.c").unwrap();

        assert!(registry.contains("a"));
        assert!(registry.contains("a.b"));
        assert_eq!(registry.get("a.b.c").unwrap().dot_parent(), Some("a.b"));
        assert_eq!(registry.get("a").unwrap().dot_parent(), Some("DEFAULT"));
        assert_eq!(registry.get("a.b").unwrap().children(), ["a.b.c".to_string()]);
        assert!(!registry.get("a").unwrap().is_declared());
    }

    #[test]
    fn test_duplicate_section() {
        let mut registry = SectionRegistry::new("DEFAULT");
        registry.add_section("a").unwrap();
        let err = registry.add_section("a").unwrap_err();
        assert!(matches!(err, LekvarError::DuplicateSection { .. }));
    }

    #[test]
    fn test_default_section_cannot_be_added() {
        let mut registry = SectionRegistry::new("DEFAULT");
        let err = registry.add_section("DEFAULT").unwrap_err();
        assert!(matches!(err, LekvarError::DuplicateSection { .. }));
    }

    #[test]
    fn test_implicit_section_can_be_claimed() {
        let mut registry = SectionRegistry::new("DEFAULT");
        registry.add_section("a.b").unwrap();
        registry.add_section("a").unwrap();
        assert!(registry.get("a").unwrap().is_declared());
    }

    #[test]
    fn test_header_inheritance_is_idempotent() {
        let mut registry = SectionRegistry::new("DEFAULT");
        registry.add_section("child").unwrap();
        let parents = vec!["p1".to_string(), "p2".to_string()];

        registry.resolve_header_inheritance("child", &parents).unwrap();
        registry.resolve_header_inheritance("child", &parents).unwrap();

        let child = registry.get("child").unwrap();
        assert_eq!(child.explicit_parents(), parents.as_slice());
        assert_eq!(registry.get("p1").unwrap().children(), ["child".to_string()]);
    }

    #[test]
    fn test_default_section_cannot_inherit() {
        let mut registry = SectionRegistry::new("DEFAULT");
        let err = registry
            .resolve_header_inheritance("DEFAULT", &["a".to_string()])
            .unwrap_err();
        assert!(matches!(err, LekvarError::SectionInheritance { .. }));
    }

    #[test]
    fn test_invalid_section_names() {
        assert!(validate_section_name("a.b").is_ok());
        assert!(validate_section_name("a..b").is_err());
        assert!(validate_section_name(".a").is_err());
        assert!(validate_section_name("a:b").is_err());
        assert!(validate_section_name("a. b").is_err());
        assert!(validate_section_name("").is_err());
    }

    #[test]
    fn test_names_exclude_default() {
        let mut registry = SectionRegistry::new("DEFAULT");
        registry.add_section("x").unwrap();
        registry.add_section("y").unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(registry.len(), 3);
    }
}
