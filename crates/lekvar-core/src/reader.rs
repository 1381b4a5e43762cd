//! Line-by-line ingestion of lekvar source text
//!
//! A [`ReadPass`] walks the lines of one source, strips comments, tracks
//! indentation for continuation lines and applies the events produced by the
//! [`Classifier`] to the section registry and the option store.
//!
//! Malformed lines are collected and returned so that one report lists them
//! all. Semantic violations (duplicates, default-section inheritance, content
//! before the first header) stop the pass immediately.

use crate::error::MalformedLine;
use crate::grammar::{Classifier, Line, LineContext};
use crate::model::{OptionKey, OptionStore, SectionRegistry};
use crate::settings::ParserSettings;
use crate::{LekvarError, Result};
use std::collections::HashSet;
use tracing::{debug, trace};

/// State of one read over one source
pub(crate) struct ReadPass<'a> {
    registry: &'a mut SectionRegistry,
    store: &'a mut OptionStore,
    settings: &'a ParserSettings,
    classifier: &'a Classifier,
    source_name: String,
    current_section: Option<String>,
    current_option: Option<OptionKey>,
    indent_level: usize,
    /// `(section, option)` pairs assigned during this pass
    assigned: HashSet<(String, String)>,
    malformed: Vec<MalformedLine>,
}

impl<'a> ReadPass<'a> {
    pub(crate) fn new(
        registry: &'a mut SectionRegistry,
        store: &'a mut OptionStore,
        settings: &'a ParserSettings,
        classifier: &'a Classifier,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
            classifier,
            source_name: source_name.into(),
            current_section: None,
            current_option: None,
            indent_level: 0,
            assigned: HashSet::new(),
            malformed: Vec::new(),
        }
    }

    /// Consume every line and return the malformed ones.
    pub(crate) fn run<I, S>(mut self, lines: I) -> Result<Vec<MalformedLine>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        debug!("Reading '{}'", self.source_name);
        let mut count = 0;
        for (index, line) in lines.into_iter().enumerate() {
            self.read_line(index + 1, line.as_ref())?;
            count += 1;
        }
        debug!(
            "Read {} lines from '{}' ({} malformed)",
            count,
            self.source_name,
            self.malformed.len()
        );
        Ok(self.malformed)
    }

    fn read_line(&mut self, lineno: usize, raw: &str) -> Result<()> {
        let raw = raw.trim_end_matches(['\r', '\n']);
        let comment = comment_start(raw, self.settings);
        let content = raw[..comment.unwrap_or(raw.len())].trim();

        if content.is_empty() {
            if !self.settings.empty_lines_in_values {
                self.indent_level = usize::MAX;
            } else if comment.is_none() {
                if let Some(key) = &self.current_option {
                    self.store.append_continuation(key, "");
                }
            }
            return Ok(());
        }

        let indent = raw.len() - raw.trim_start().len();
        let context = LineContext {
            option_open: self.current_section.is_some() && self.current_option.is_some(),
            indent_level: self.indent_level,
        };
        let line = self.classifier.classify(content, indent, &context);

        if let Line::Continuation { text } = &line {
            if let Some(key) = &self.current_option {
                self.store.append_continuation(key, text);
            }
            return Ok(());
        }
        self.indent_level = indent;

        let Some(current) = self.current_section.clone() else {
            return match line {
                Line::SectionHeader { name, parents } => self.on_header(name, parents),
                _ => Err(LekvarError::MissingSectionHeader {
                    source_name: self.source_name.clone(),
                    line: lineno,
                    text: raw.to_string(),
                }),
            };
        };

        match line {
            Line::SectionHeader { name, parents } => self.on_header(name, parents),
            Line::OptionAssign {
                name,
                relocate_to,
                value,
            } => self.on_assign(lineno, &current, &name, relocate_to.as_deref(), value.as_deref()),
            Line::Include { source, alias } => {
                self.on_include(lineno, &current, source, alias.as_deref())
            }
            Line::Rename { from, to } => {
                let (from, to) = (self.option_name(&from), self.option_name(&to));
                self.registry
                    .section_mut(&current)?
                    .directives_mut()
                    .renames
                    .insert(from, to);
                self.current_option = None;
                Ok(())
            }
            Line::Avoid { name } => {
                let name = self.option_name(&name);
                self.registry
                    .section_mut(&current)?
                    .directives_mut()
                    .avoids
                    .insert(name);
                self.current_option = None;
                Ok(())
            }
            Line::Only { names } => {
                let names: Vec<String> = names.iter().map(|n| self.option_name(n)).collect();
                self.registry
                    .section_mut(&current)?
                    .directives_mut()
                    .only
                    .extend(names);
                self.current_option = None;
                Ok(())
            }
            Line::Malformed => {
                trace!("Malformed line {} in '{}'", lineno, self.source_name);
                self.malformed.push(MalformedLine {
                    line: lineno,
                    text: raw.to_string(),
                });
                Ok(())
            }
            Line::Continuation { .. } => Ok(()),
        }
    }

    fn on_header(&mut self, name: String, parents: Option<Vec<String>>) -> Result<()> {
        self.current_option = None;

        if self.registry.is_default(&name) {
            if parents.is_some() {
                return Err(LekvarError::SectionInheritance { section: name });
            }
            self.current_section = Some(name);
            return Ok(());
        }

        self.registry.add_section(&name)?;
        if let Some(parents) = parents {
            self.registry.resolve_header_inheritance(&name, &parents)?;
        }
        self.current_section = Some(name);
        Ok(())
    }

    fn on_assign(
        &mut self,
        lineno: usize,
        current: &str,
        name: &str,
        relocate_to: Option<&str>,
        value: Option<&str>,
    ) -> Result<()> {
        let name = self.option_name(name);
        let target = match relocate_to {
            Some(sub) if self.registry.is_default(current) => sub.to_string(),
            Some(sub) => format!("{current}.{sub}"),
            None => current.to_string(),
        };
        if target != current {
            self.registry.ensure_section(&target)?;
            trace!("Relocating '{}' from '{}' to '{}'", name, current, target);
        }

        self.check_duplicate(lineno, &target, &name)?;
        let section = self.registry.section_mut(&target)?;
        let key = self.store.set(section, &name, value, true);
        self.current_option = Some(key);
        Ok(())
    }

    fn on_include(
        &mut self,
        lineno: usize,
        current: &str,
        source: OptionKey,
        alias: Option<&str>,
    ) -> Result<()> {
        let key = OptionKey::new(source.section(), self.option_name(source.option()));
        let alias = self.option_name(alias.unwrap_or(source.option()));
        self.check_duplicate(lineno, current, &alias)?;

        trace!("Section '{}' includes {} as '{}'", current, key, alias);
        let section = self.registry.section_mut(current)?;
        section.options_mut().insert(alias.clone(), key.clone());
        section.directives_mut().includes.insert(alias, key);
        self.current_option = None;
        Ok(())
    }

    fn check_duplicate(&mut self, lineno: usize, section: &str, option: &str) -> Result<()> {
        let first = self
            .assigned
            .insert((section.to_string(), option.to_string()));
        if self.settings.strict && !first {
            return Err(LekvarError::DuplicateOption {
                section: section.to_string(),
                option: option.to_string(),
                source_name: Some(self.source_name.clone()),
                line: Some(lineno),
            });
        }
        Ok(())
    }

    fn option_name(&self, name: &str) -> String {
        self.settings.transform_option(name)
    }
}

/// Byte offset where a comment starts, if any.
///
/// Full-line prefixes count after leading whitespace; inline prefixes only at
/// the start of the line or right after a whitespace character.
fn comment_start(line: &str, settings: &ParserSettings) -> Option<usize> {
    let trimmed = line.trim_start();
    if settings
        .comment_prefixes
        .iter()
        .any(|prefix| trimmed.starts_with(prefix.as_str()))
    {
        return Some(0);
    }

    settings
        .inline_comment_prefixes
        .iter()
        .filter_map(|prefix| {
            line.match_indices(prefix.as_str())
                .map(|(index, _)| index)
                .find(|&index| {
                    index == 0
                        || line[..index]
                            .chars()
                            .next_back()
                            .is_some_and(char::is_whitespace)
                })
        })
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionValue;

    struct Fixture {
        registry: SectionRegistry,
        store: OptionStore,
        settings: ParserSettings,
    }

    impl Fixture {
        fn new(settings: ParserSettings) -> Self {
            Self {
                registry: SectionRegistry::new(settings.default_section.clone()),
                store: OptionStore::new(),
                settings,
            }
        }

        fn read(&mut self, text: &str) -> Result<Vec<MalformedLine>> {
            let classifier = Classifier::new(&self.settings).unwrap();
            let result = ReadPass::new(
                &mut self.registry,
                &mut self.store,
                &self.settings,
                &classifier,
                "<test>",
            )
            .run(text.lines());
            self.store.join_multiline_values();
            result
        }

        fn value(&self, section: &str, option: &str) -> Option<&OptionValue> {
            self.store.value(&OptionKey::new(section, option))
        }
    }

    fn text(value: &str) -> OptionValue {
        OptionValue::Text(value.to_string())
    }

    #[test]
    fn test_comment_start() {
        let settings = ParserSettings::default();
        assert_eq!(comment_start("# full", &settings), Some(0));
        assert_eq!(comment_start("   ; indented", &settings), Some(0));
        assert_eq!(comment_start("k = v # note", &settings), Some(6));
        assert_eq!(comment_start("k = a#b", &settings), None);
        assert_eq!(comment_start("k = v", &settings), None);
    }

    #[test]
    fn test_sections_and_options() {
        let mut fixture = Fixture::new(ParserSettings::default());
        let malformed = fixture
            .read("[a]\nX = 1 ; comment\n[a.b : p]\ny: two words\n")
            .unwrap();

        assert!(malformed.is_empty());
        assert_eq!(fixture.value("a", "x"), Some(&text("1")));
        assert_eq!(fixture.value("a.b", "y"), Some(&text("two words")));
        assert_eq!(
            fixture.registry.get("a.b").unwrap().explicit_parents(),
            &["p".to_string()]
        );
        assert!(!fixture.registry.get("p").unwrap().is_declared());
    }

    #[test]
    fn test_multiline_values() {
        let mut fixture = Fixture::new(ParserSettings::default());
        fixture
            .read("[s]\nkey =\n    line1\n\n    line2\nnext = 1\n")
            .unwrap();
        assert_eq!(fixture.value("s", "key"), Some(&text("line1\n\nline2")));
        assert_eq!(fixture.value("s", "next"), Some(&text("1")));
    }

    #[test]
    fn test_blank_line_ends_value_when_configured() {
        let mut fixture = Fixture::new(ParserSettings {
            empty_lines_in_values: false,
            ..Default::default()
        });
        let malformed = fixture.read("[s]\nkey = a\n\n    b\n").unwrap();
        assert_eq!(fixture.value("s", "key"), Some(&text("a")));
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].line, 4);
    }

    #[test]
    fn test_relocation() {
        let mut fixture = Fixture::new(ParserSettings::default());
        fixture.read("[s]\nx > sub = 5\n[DEFAULT]\ny > top = 1\n").unwrap();

        assert_eq!(fixture.value("s.sub", "x"), Some(&text("5")));
        assert!(!fixture.registry.get("s").unwrap().options().contains_key("x"));
        assert_eq!(fixture.value("top", "y"), Some(&text("1")));
    }

    #[test]
    fn test_directives_are_recorded() {
        let mut fixture = Fixture::new(ParserSettings::default());
        fixture
            .read("[s]\nINCLUDE other.Port AS p\nRENAME A TO b\nAVOID c\nONLY b, p\n")
            .unwrap();

        let section = fixture.registry.get("s").unwrap();
        assert_eq!(section.options()["p"], OptionKey::new("other", "port"));
        let directives = section.directives();
        assert_eq!(directives.renames["a"], "b");
        assert!(directives.avoids.contains("c"));
        assert_eq!(directives.only.len(), 2);
    }

    #[test]
    fn test_content_before_header() {
        let mut fixture = Fixture::new(ParserSettings::default());
        let err = fixture.read("# comment\nkey = 1\n[s]\n").unwrap_err();
        assert!(matches!(
            err,
            LekvarError::MissingSectionHeader { line: 2, .. }
        ));
    }

    #[test]
    fn test_default_section_cannot_inherit() {
        let mut fixture = Fixture::new(ParserSettings::default());
        let err = fixture.read("[DEFAULT : foo]\n").unwrap_err();
        assert!(matches!(err, LekvarError::SectionInheritance { .. }));
    }

    #[test]
    fn test_strict_duplicates() {
        let mut fixture = Fixture::new(ParserSettings::default());
        let err = fixture.read("[s]\nk = 1\nK = 2\n").unwrap_err();
        assert!(matches!(err, LekvarError::DuplicateOption { line: Some(3), .. }));

        let mut fixture = Fixture::new(ParserSettings::default());
        let err = fixture.read("[s]\n[s]\n").unwrap_err();
        assert!(matches!(err, LekvarError::DuplicateSection { .. }));
    }

    #[test]
    fn test_lenient_mode_overwrites_options_only() {
        let lenient = ParserSettings {
            strict: false,
            ..Default::default()
        };
        let mut fixture = Fixture::new(lenient.clone());
        fixture.read("[s]\nk = 1\nk = 2\n").unwrap();
        assert_eq!(fixture.value("s", "k"), Some(&text("2")));

        let mut fixture = Fixture::new(lenient);
        let err = fixture.read("[s]\nk = 1\n[s]\nk = 2\n").unwrap_err();
        assert!(matches!(err, LekvarError::DuplicateSection { .. }));
    }

    #[test]
    fn test_malformed_lines_are_collected() {
        let mut fixture = Fixture::new(ParserSettings::default());
        let malformed = fixture.read("[s]\ngarbage\nk = 1\n[bad..name]\n").unwrap();
        assert_eq!(
            malformed.iter().map(|m| m.line).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert_eq!(fixture.value("s", "k"), Some(&text("1")));
    }

    #[test]
    fn test_no_value_options() {
        let mut fixture = Fixture::new(ParserSettings {
            allow_no_value: true,
            ..Default::default()
        });
        fixture.read("[s]\nflag\n    ignored\n").unwrap();
        assert_eq!(fixture.value("s", "flag"), Some(&OptionValue::Absent));
    }
}
