//! Option storage: the global absolute-key → value table
//!
//! Sections never own values directly. Each section maps relative names to
//! an [`OptionKey`], and the [`OptionStore`] maps every key to its raw
//! [`OptionValue`]. Relocation, renaming and inclusion only repoint the
//! section side; the stored value is never copied.

use super::section::{OptionView, Section};
use crate::{LekvarError, Result};
use indexmap::IndexMap;
use std::fmt;
use tracing::trace;

/// Absolute key `(section, option)`, displayed as `section.option`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey {
    section: String,
    option: String,
}

impl OptionKey {
    pub fn new(section: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            option: option.into(),
        }
    }

    /// Split a dotted path at its last `.` into section and option.
    pub fn parse_dotted(path: &str) -> Option<Self> {
        let (section, option) = path.rsplit_once('.')?;
        let (section, option) = (section.trim(), option.trim());
        if section.is_empty() || option.is_empty() {
            return None;
        }
        Some(Self::new(section, option))
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn option(&self) -> &str {
        &self.option
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.option)
    }
}

/// Raw stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Declared without a value
    Absent,
    /// Still collecting continuation lines
    Pending(Vec<String>),
    /// Finalized string
    Text(String),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OptionValue::Pending(_))
    }
}

/// Global value table keyed by absolute option key
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    values: IndexMap<OptionKey, OptionValue>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `section.option` and point the section's local
    /// name at it.
    ///
    /// With `accumulating` set the value starts as a pending line list so
    /// that continuation lines can extend it.
    pub fn set(
        &mut self,
        section: &mut Section,
        option: &str,
        value: Option<&str>,
        accumulating: bool,
    ) -> OptionKey {
        let key = OptionKey::new(section.name(), option);
        section
            .options_mut()
            .insert(option.to_string(), key.clone());

        let stored = match value {
            None => OptionValue::Absent,
            Some(text) if accumulating => OptionValue::Pending(vec![text.to_string()]),
            Some(text) => OptionValue::Text(text.to_string()),
        };
        trace!("Storing {} = {:?}", key, stored);
        self.values.insert(key.clone(), stored);
        key
    }

    /// Append one continuation line to a pending value.
    ///
    /// Returns `false` (and does nothing) when the key holds no pending
    /// list, e.g. after an explicit no-value declaration.
    pub fn append_continuation(&mut self, key: &OptionKey, text: &str) -> bool {
        match self.values.get_mut(key) {
            Some(OptionValue::Pending(lines)) => {
                lines.push(text.to_string());
                true
            }
            _ => false,
        }
    }

    /// Look up `option` through a section view.
    pub fn get<'a>(
        &'a self,
        view: &OptionView,
        section: &str,
        option: &str,
    ) -> Result<&'a OptionValue> {
        view.get(option)
            .and_then(|key| self.values.get(key))
            .ok_or_else(|| LekvarError::no_option(section, option))
    }

    pub fn value(&self, key: &OptionKey) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &OptionKey) -> bool {
        self.values.contains_key(key)
    }

    /// Fold every pending line list into a single newline-joined string.
    ///
    /// Leading empty fragments (from `key =` followed by indented lines) are
    /// dropped and trailing whitespace is trimmed. Returns the number of
    /// values joined.
    pub fn join_multiline_values(&mut self) -> usize {
        let mut joined = 0;
        for value in self.values.values_mut() {
            if let OptionValue::Pending(lines) = value {
                let text = lines
                    .iter()
                    .skip_while(|line| line.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n");
                *value = OptionValue::Text(text.trim_end().to_string());
                joined += 1;
            }
        }
        trace!("Joined {} multiline values", joined);
        joined
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
