//! Line classification
//!
//! The classifier turns one comment-stripped logical line into a structural
//! [`Line`] event. It is pure: the reader applies the effects.
//!
//! Matching precedence (first match wins):
//!
//! 1. continuation (when an option is open and the line is indented deeper)
//! 2. section header `[name]` / `[name : p1, p2]`
//! 3. option assignment `name = value` / `name > sub = value`
//! 4. `INCLUDE section.option [AS alias]`
//! 5. `RENAME from TO to`
//! 6. `AVOID name`
//! 7. `ONLY a, b, ...`
//! 8. bare `name` when no-value options are allowed
//!
//! Anything else is [`Line::Malformed`].

use crate::model::{OptionKey, validate_section_name};
use crate::settings::ParserSettings;
use crate::{LekvarError, Result};
use regex::Regex;

/// Structural event produced for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    SectionHeader {
        name: String,
        /// `Some` whenever the header carried a `:`, even with an empty list
        parents: Option<Vec<String>>,
    },
    OptionAssign {
        name: String,
        relocate_to: Option<String>,
        value: Option<String>,
    },
    Include {
        source: OptionKey,
        alias: Option<String>,
    },
    Rename {
        from: String,
        to: String,
    },
    Avoid {
        name: String,
    },
    Only {
        names: Vec<String>,
    },
    Continuation {
        text: String,
    },
    Malformed,
}

/// Reader state the classifier needs to recognize continuation lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineContext {
    /// An option value is currently accepting continuation lines
    pub option_open: bool,
    /// Indentation of the line that opened the current option
    pub indent_level: usize,
}

/// Compiled grammar for one set of parser settings
#[derive(Debug, Clone)]
pub struct Classifier {
    section: Regex,
    option: Regex,
    no_value: Option<Regex>,
    include: Regex,
    rename: Regex,
    avoid: Regex,
    only: Regex,
}

impl Classifier {
    pub fn new(settings: &ParserSettings) -> Result<Self> {
        settings.validate()?;

        let delimiters = settings
            .delimiters
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let delimiter_chars: String = settings
            .delimiters
            .iter()
            .flat_map(|d| d.chars())
            .map(|c| regex::escape(&c.to_string()))
            .collect();

        let option = format!(
            r"^(?P<option>.*?)(?:\s*>\s*(?P<to_head>[^{delimiter_chars}>]+?))?\s*(?P<vi>{delimiters})\s*(?P<value>.*)$"
        );
        let no_value = format!(r"^(?P<option>[^\s\[\]{delimiter_chars}]+)$");

        Ok(Self {
            section: compile(r"^\[(?P<header>[^:\[\]]+?)\s*(?::(?P<inherit>[^\[\]]*))?\]$")?,
            option: compile(&option)?,
            no_value: if settings.allow_no_value {
                Some(compile(&no_value)?)
            } else {
                None
            },
            include: compile(r"^INCLUDE\s+(?P<source>\S+)(?:\s+AS\s+(?P<alias>\S+))?$")?,
            rename: compile(r"^RENAME\s+(?P<from>\S+)\s+TO\s+(?P<to>\S+)$")?,
            avoid: compile(r"^AVOID\s+(?P<name>\S+)$")?,
            only: compile(r"^ONLY\s+(?P<names>.+)$")?,
        })
    }

    /// Classify `text` (already stripped of comments and surrounding
    /// whitespace) whose raw line started at column `indent`.
    pub fn classify(&self, text: &str, indent: usize, context: &LineContext) -> Line {
        if context.option_open && indent > context.indent_level {
            return Line::Continuation {
                text: text.to_string(),
            };
        }

        self.section_header(text)
            .or_else(|| self.option_assign(text))
            .or_else(|| self.include(text))
            .or_else(|| self.rename(text))
            .or_else(|| self.avoid(text))
            .or_else(|| self.only(text))
            .or_else(|| self.bare_option(text))
            .unwrap_or(Line::Malformed)
    }

    fn section_header(&self, text: &str) -> Option<Line> {
        let caps = self.section.captures(text)?;
        let name = caps.name("header")?.as_str().trim().to_string();
        if validate_section_name(&name).is_err() {
            return Some(Line::Malformed);
        }

        let parents = match caps.name("inherit") {
            Some(list) => {
                let parents: Vec<String> = split_list(list.as_str());
                if parents.iter().any(|p| validate_section_name(p).is_err()) {
                    return Some(Line::Malformed);
                }
                Some(parents)
            }
            None => None,
        };
        Some(Line::SectionHeader { name, parents })
    }

    fn option_assign(&self, text: &str) -> Option<Line> {
        let caps = self.option.captures(text)?;
        let name = caps.name("option")?.as_str().trim();
        if name.is_empty() || name.starts_with('[') {
            return Some(Line::Malformed);
        }

        let relocate_to = match caps.name("to_head") {
            Some(head) => {
                let head = head.as_str().trim();
                if validate_section_name(head).is_err() {
                    return Some(Line::Malformed);
                }
                Some(head.to_string())
            }
            None => None,
        };

        Some(Line::OptionAssign {
            name: name.to_string(),
            relocate_to,
            value: Some(caps.name("value").map_or("", |v| v.as_str()).to_string()),
        })
    }

    fn include(&self, text: &str) -> Option<Line> {
        let caps = self.include.captures(text)?;
        let source = caps.name("source")?.as_str();
        let Some(source) = OptionKey::parse_dotted(source) else {
            return Some(Line::Malformed);
        };
        if validate_section_name(source.section()).is_err() {
            return Some(Line::Malformed);
        }
        Some(Line::Include {
            source,
            alias: caps.name("alias").map(|a| a.as_str().to_string()),
        })
    }

    fn rename(&self, text: &str) -> Option<Line> {
        let caps = self.rename.captures(text)?;
        Some(Line::Rename {
            from: caps.name("from")?.as_str().to_string(),
            to: caps.name("to")?.as_str().to_string(),
        })
    }

    fn avoid(&self, text: &str) -> Option<Line> {
        let caps = self.avoid.captures(text)?;
        Some(Line::Avoid {
            name: caps.name("name")?.as_str().to_string(),
        })
    }

    fn only(&self, text: &str) -> Option<Line> {
        let caps = self.only.captures(text)?;
        let names = split_list(caps.name("names")?.as_str());
        if names.is_empty() {
            return Some(Line::Malformed);
        }
        Some(Line::Only { names })
    }

    fn bare_option(&self, text: &str) -> Option<Line> {
        let caps = self.no_value.as_ref()?.captures(text)?;
        Some(Line::OptionAssign {
            name: caps.name("option")?.as_str().to_string(),
            relocate_to: None,
            value: None,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| LekvarError::settings_error(format!("invalid grammar pattern: {e}")))
}

/// Split a comma separated list, dropping blank entries
fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
