//! The [`Lekvar`] document: ingestion, resolution and read-only queries
//!
//! A document moves through two phases. While reading (or while mutating it
//! through [`Lekvar::add_section`] and [`Lekvar::set`]) sections and values
//! are recorded as declared. [`Lekvar::resolve`] then computes every
//! section's effective option view in one pass over the inheritance graph.
//! Queries only answer from a current resolution and fail with
//! [`LekvarError::NotResolved`] after any mutation until the document is
//! resolved again.
//!
//! ```
//! use lekvar_core::Lekvar;
//!
//! let mut doc = Lekvar::new();
//! doc.read_str("[a]\nx = 1\n[a.b]\ny = 2\n[a.b.c : a]\n", "<example>")?;
//!
//! assert_eq!(doc.options("a.b.c")?, vec!["x", "y"]);
//! assert_eq!(doc.get("a.b.c", "x")?, Some("1"));
//! # Ok::<(), lekvar_core::LekvarError>(())
//! ```

use crate::grammar::Classifier;
use crate::model::{OptionStore, OptionValue, OptionView, SectionRegistry};
use crate::reader::ReadPass;
use crate::semantic::{InheritanceGraph, InheritanceResolver, Resolution};
use crate::settings::ParserSettings;
use crate::{LekvarError, Result, ResultExt};
use indexmap::IndexMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A hierarchical configuration document
#[derive(Debug, Clone)]
pub struct Lekvar {
    settings: ParserSettings,
    registry: SectionRegistry,
    store: OptionStore,
    resolution: Option<Resolution>,
}

impl Default for Lekvar {
    fn default() -> Self {
        Self::new()
    }
}

impl Lekvar {
    /// Empty document with default parser settings
    pub fn new() -> Self {
        Self::from_valid_settings(ParserSettings::default())
    }

    /// Empty document with custom parser settings
    pub fn with_settings(settings: ParserSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_valid_settings(settings))
    }

    fn from_valid_settings(settings: ParserSettings) -> Self {
        Self {
            registry: SectionRegistry::new(settings.default_section.clone()),
            store: OptionStore::new(),
            resolution: None,
            settings,
        }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn default_section(&self) -> &str {
        self.registry.default_section()
    }

    // ---- mutation ----

    /// Declare a section, creating missing dot-parents implicitly.
    pub fn add_section(&mut self, name: &str) -> Result<()> {
        self.registry.add_section(name)?;
        self.invalidate();
        Ok(())
    }

    /// Store a finalized value under `section.option`.
    pub fn set(&mut self, section: &str, option: &str, value: Option<&str>) -> Result<()> {
        let option = self.settings.transform_option(option);
        let target = self.registry.section_mut(section)?;
        self.store.set(target, &option, value, false);
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        if self.resolution.take().is_some() {
            debug!("Document modified, resolution invalidated");
        }
    }

    // ---- reading ----

    /// Read `text` as one source named `source_name`.
    pub fn read_str(&mut self, text: &str, source_name: &str) -> Result<()> {
        self.read_lines(text.lines(), source_name)
    }

    /// Read a file from disk.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| LekvarError::io_error(path, e))?;
        self.read_str(&text, &path.display().to_string())
    }

    /// Read several files in order, tolerating malformed lines.
    ///
    /// A file with malformed lines is logged and left out of the returned
    /// list, but its well-formed content stays in the document. Any other
    /// error aborts. The document is resolved on success.
    pub fn read_files<I, P>(&mut self, paths: I) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut clean = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if self.read_file(path).recoverable()?.is_some() {
                clean.push(path.to_path_buf());
            }
        }
        if !self.is_resolved() {
            self.resolve()?;
        }
        Ok(clean)
    }

    /// Read already split lines.
    ///
    /// Every malformed line is collected into one [`LekvarError::Parsing`]
    /// report. Semantic violations abort the read at the offending line.
    /// Values read so far are finalized either way, and the document is
    /// resolved when the read succeeds.
    pub fn read_lines<I, S>(&mut self, lines: I, source_name: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classifier = Classifier::new(&self.settings)?;
        self.invalidate();

        let scanned = ReadPass::new(
            &mut self.registry,
            &mut self.store,
            &self.settings,
            &classifier,
            source_name,
        )
        .run(lines);
        self.store.join_multiline_values();

        let malformed = scanned?;
        if !malformed.is_empty() {
            return Err(LekvarError::Parsing {
                source_name: source_name.to_string(),
                errors: malformed,
            });
        }
        self.resolve()
    }

    // ---- resolution ----

    /// Recompute every section's effective view.
    pub fn resolve(&mut self) -> Result<()> {
        self.store.join_multiline_values();
        let resolution = InheritanceResolver::new(&self.registry, &self.store).resolve()?;
        info!(
            "Resolved {} sections, {} stored values",
            resolution.len(),
            self.store.len()
        );
        self.resolution = Some(resolution);
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    fn resolution(&self) -> Result<&Resolution> {
        self.resolution.as_ref().ok_or(LekvarError::NotResolved)
    }

    fn view(&self, section: &str) -> Result<&OptionView> {
        self.resolution()?
            .view(section)
            .ok_or_else(|| LekvarError::no_section(section))
    }

    /// Sections in resolution order, default section first
    pub fn topological_order(&self) -> Result<&[String]> {
        Ok(self.resolution()?.order())
    }

    /// Graphviz rendering of the inheritance graph
    pub fn to_dot(&self) -> Result<String> {
        Ok(InheritanceGraph::from_registry(&self.registry)?.to_dot())
    }

    // ---- queries ----

    /// Every section except the default one, in registration order
    pub fn sections(&self) -> Vec<&str> {
        self.registry.names().collect()
    }

    pub fn has_section(&self, section: &str) -> bool {
        !self.registry.is_default(section) && self.registry.contains(section)
    }

    /// Effective option names of `section`
    pub fn options(&self, section: &str) -> Result<Vec<&str>> {
        Ok(self.view(section)?.keys().map(String::as_str).collect())
    }

    /// `false` for unknown sections as well as unknown options
    pub fn has_option(&self, section: &str, option: &str) -> Result<bool> {
        let option = self.settings.transform_option(option);
        match self.view(section) {
            Ok(view) => Ok(view.contains_key(&option)),
            Err(LekvarError::NoSection { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Effective value of `section.option`; `None` for a no-value option.
    pub fn get(&self, section: &str, option: &str) -> Result<Option<&str>> {
        let option = self.settings.transform_option(option);
        let view = self.view(section)?;
        Ok(self.store.get(view, section, &option)?.as_text())
    }

    /// Like [`Lekvar::get`], answering `fallback` when the section or the
    /// option does not exist.
    pub fn get_or<'a>(
        &'a self,
        section: &str,
        option: &str,
        fallback: &'a str,
    ) -> Result<Option<&'a str>> {
        match self.get(section, option) {
            Err(LekvarError::NoSection { .. } | LekvarError::NoOption { .. }) => Ok(Some(fallback)),
            other => other,
        }
    }

    /// Value interpreted as a boolean (`1/yes/true/on`, `0/no/false/off`).
    pub fn get_bool(&self, section: &str, option: &str) -> Result<bool> {
        let value = self.get(section, option)?.unwrap_or_default();
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(LekvarError::InvalidBoolean {
                section: section.to_string(),
                option: self.settings.transform_option(option),
                value: value.to_string(),
            }),
        }
    }

    /// Name/value pairs of `section`.
    ///
    /// Entries of `vars` take precedence over resolved values; names not
    /// present in the section are appended.
    pub fn items(
        &self,
        section: &str,
        vars: Option<&IndexMap<String, String>>,
    ) -> Result<IndexMap<String, Option<String>>> {
        let view = self.view(section)?;
        let mut items: IndexMap<String, Option<String>> = view
            .iter()
            .map(|(name, key)| {
                let value = self.store.value(key).and_then(OptionValue::as_text).map(str::to_string);
                (name.clone(), value)
            })
            .collect();

        for (name, value) in vars.into_iter().flatten() {
            items.insert(self.settings.transform_option(name), Some(value.clone()));
        }
        Ok(items)
    }

    // ---- refused operations ----

    /// Serialization back to text is not supported.
    pub fn write<W: Write>(&self, _writer: W) -> Result<()> {
        Err(LekvarError::unsupported("write"))
    }

    /// Sections are never removed.
    pub fn remove_section(&mut self, _section: &str) -> Result<()> {
        Err(LekvarError::unsupported("remove_section"))
    }

    /// Options are never removed.
    pub fn remove_option(&mut self, _section: &str, _option: &str) -> Result<()> {
        Err(LekvarError::unsupported("remove_option"))
    }
}
