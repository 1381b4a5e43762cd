//! Error types for reading, resolving and querying lekvar documents

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A line the grammar classifier could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the source
    pub line: usize,
    /// The offending line, without its trailing newline
    pub text: String,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {:2}]: {:?}", self.line, self.text)
    }
}

/// Main error type for lekvar operations
#[derive(Debug, Error)]
pub enum LekvarError {
    /// A section was explicitly declared twice
    #[error("Section '{section}' already exists")]
    DuplicateSection { section: String },

    /// The same option was assigned twice in one strict read pass
    #[error(
        "{}Option '{option}' in section '{section}' already exists",
        location_prefix(.source_name, .line)
    )]
    DuplicateOption {
        section: String,
        option: String,
        source_name: Option<String>,
        line: Option<usize>,
    },

    /// Lookup of an unregistered section
    #[error("No section: '{section}'")]
    NoSection { section: String },

    /// Lookup of an option absent after resolution
    #[error("No option '{option}' in section: '{section}'")]
    NoOption { section: String, option: String },

    /// Content found before the first section header
    #[error("File contains no section headers.\nfile: '{source_name}', line: {line}\n{text:?}")]
    MissingSectionHeader {
        source_name: String,
        line: usize,
        text: String,
    },

    /// The default section header carried an inheritance list
    #[error("Default section '{section}' cannot inherit")]
    SectionInheritance { section: String },

    /// Aggregated malformed lines from one read pass
    #[error("Source contains parsing errors: '{source_name}'{}", format_malformed(.errors))]
    Parsing {
        source_name: String,
        errors: Vec<MalformedLine>,
    },

    /// The inheritance graph contains a cycle
    #[error("Cyclic section inheritance: {}", .cycle.join(" → "))]
    CyclicInheritance { cycle: Vec<String> },

    /// An INCLUDE directive names an option that holds no stored value
    #[error("Section '{section}' includes '{target}', which is not defined")]
    UnresolvedInclude { section: String, target: String },

    /// A section name with empty dotted segments or forbidden characters
    #[error("Invalid section name: '{name}'")]
    InvalidSectionName { name: String },

    /// A value outside the boolean vocabulary
    #[error("Not a boolean: '{value}' (option '{option}' in section '{section}')")]
    InvalidBoolean {
        section: String,
        option: String,
        value: String,
    },

    /// The document was mutated after its last resolution
    #[error("Document is not resolved; call resolve() after mutating it")]
    NotResolved,

    /// Operations the engine deliberately refuses
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: &'static str },

    /// Parser settings could not be loaded or are invalid
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Declaration,
    Lookup,
    Resolution,
    Value,
    Unsupported,
    Settings,
    Io,
}

impl LekvarError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LekvarError::Parsing { .. } | LekvarError::MissingSectionHeader { .. } => {
                ErrorKind::Parse
            }
            LekvarError::DuplicateSection { .. }
            | LekvarError::DuplicateOption { .. }
            | LekvarError::SectionInheritance { .. }
            | LekvarError::InvalidSectionName { .. } => ErrorKind::Declaration,
            LekvarError::NoSection { .. } | LekvarError::NoOption { .. } => ErrorKind::Lookup,
            LekvarError::CyclicInheritance { .. }
            | LekvarError::UnresolvedInclude { .. }
            | LekvarError::NotResolved => ErrorKind::Resolution,
            LekvarError::InvalidBoolean { .. } => ErrorKind::Value,
            LekvarError::Unsupported { .. } => ErrorKind::Unsupported,
            LekvarError::Settings { .. } => ErrorKind::Settings,
            LekvarError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Malformed lines are collected and reported after the scan; everything
    /// else stops the current operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LekvarError::Parsing { .. })
    }

    pub fn no_section(section: impl Into<String>) -> Self {
        Self::NoSection {
            section: section.into(),
        }
    }

    pub fn no_option(section: impl Into<String>, option: impl Into<String>) -> Self {
        Self::NoOption {
            section: section.into(),
            option: option.into(),
        }
    }

    pub fn duplicate_section(section: impl Into<String>) -> Self {
        Self::DuplicateSection {
            section: section.into(),
        }
    }

    pub fn settings_error(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }
}

fn location_prefix(source_name: &Option<String>, line: &Option<usize>) -> String {
    match (source_name, line) {
        (Some(source), Some(line)) => format!("While reading from '{source}' [line {line:2}]: "),
        (Some(source), None) => format!("While reading from '{source}': "),
        _ => String::new(),
    }
}

fn format_malformed(errors: &[MalformedLine]) -> String {
    errors.iter().map(|e| format!("\n\t{e}")).collect()
}

/// Convert from std::io::Error
impl From<std::io::Error> for LekvarError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}
