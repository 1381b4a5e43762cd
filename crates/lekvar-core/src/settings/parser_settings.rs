//! Parser settings
//!
//! Controls how the reader tokenizes a source: delimiters, comment prefixes,
//! blank-line handling, option-name case folding and the name of the
//! default section.

use crate::{LekvarError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the default section unless configured otherwise
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Reader and grammar settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserSettings {
    /// Strings separating an option name from its value
    pub delimiters: Vec<String>,

    /// Prefixes marking a full-line comment
    pub comment_prefixes: Vec<String>,

    /// Prefixes starting an inline comment when at line start or after whitespace
    pub inline_comment_prefixes: Vec<String>,

    /// Reject the same option assigned twice in one section during one read
    pub strict: bool,

    /// Keep blank lines inside indented multi-line values
    pub empty_lines_in_values: bool,

    /// Accept bare option names without a delimiter
    pub allow_no_value: bool,

    /// Name of the root section every other section inherits from
    pub default_section: String,

    /// Keep option names as written instead of lower-casing them
    pub case_sensitive: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            delimiters: vec!["=".to_string(), ":".to_string()],
            comment_prefixes: vec!["#".to_string(), ";".to_string()],
            inline_comment_prefixes: vec!["#".to_string(), ";".to_string()],
            strict: true,
            empty_lines_in_values: true,
            allow_no_value: false,
            default_section: DEFAULT_SECTION.to_string(),
            case_sensitive: false,
        }
    }
}

impl ParserSettings {
    /// Normalize an option name the way every lookup and assignment sees it
    pub fn transform_option(&self, name: &str) -> String {
        let name = name.trim();
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Reject settings the grammar cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.delimiters.is_empty() {
            return Err(LekvarError::settings_error("at least one delimiter is required"));
        }
        if self.delimiters.iter().any(|d| d.trim().is_empty()) {
            return Err(LekvarError::settings_error("delimiters must not be blank"));
        }
        if self
            .comment_prefixes
            .iter()
            .chain(&self.inline_comment_prefixes)
            .any(|p| p.is_empty())
        {
            return Err(LekvarError::settings_error("comment prefixes must not be empty"));
        }
        crate::model::validate_section_name(&self.default_section).map_err(|_| {
            LekvarError::settings_error(format!(
                "invalid default section name '{}'",
                self.default_section
            ))
        })?;
        if self.default_section.contains('.') {
            return Err(LekvarError::settings_error(
                "the default section name cannot be dotted",
            ));
        }
        Ok(())
    }
}
