//! Parser settings for lekvar
//!
//! Settings can be given programmatically or loaded from a settings file:
//! - `.lekvarrc.toml`
//! - `.lekvarrc.json`
//!
//! When no explicit path is provided, the loader searches upward from the
//! current directory until a settings file is found, and falls back to
//! defaults otherwise.
//!
//! ## Example
//!
//! ```toml
//! strict = true
//! delimiters = ["=", ":"]
//! inlineCommentPrefixes = ["#"]
//! defaultSection = "DEFAULT"
//! ```

mod loader;
mod parser_settings;

pub use loader::{SETTINGS_FILE_NAMES, SettingsLoader, settings_schema};
pub use parser_settings::{DEFAULT_SECTION, ParserSettings};
