//! Settings file discovery and loading

use super::parser_settings::ParserSettings;
use crate::{LekvarError, Result};
use std::path::{Path, PathBuf};

/// File names searched for, in priority order
pub const SETTINGS_FILE_NAMES: &[&str] = &[".lekvarrc.toml", ".lekvarrc.json"];

/// Loader for discovering and loading parser settings files
pub struct SettingsLoader;

impl SettingsLoader {
    /// Auto-discover a settings file by traversing upward from start_path
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| LekvarError::settings_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in SETTINGS_FILE_NAMES {
                let candidate = current.join(filename);
                if candidate.is_file() {
                    tracing::debug!("Found settings: {}", candidate.display());
                    return Ok(Some(candidate));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load settings from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> Result<ParserSettings> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LekvarError::io_error(path, e))?;

        let settings: ParserSettings = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                LekvarError::settings_error(format!("{}: {e}", path.display()))
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| {
                LekvarError::settings_error(format!("{}: {e}", path.display()))
            })?,
            _ => {
                return Err(LekvarError::settings_error(format!(
                    "Unsupported settings format: {}",
                    path.display()
                )));
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an explicit path, or auto-discover them starting
    /// at `start_dir`. Falls back to defaults when nothing is found.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<ParserSettings> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(LekvarError::settings_error(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(ParserSettings::default()),
        }
    }
}

/// JSON schema describing [`ParserSettings`]
pub fn settings_schema() -> Result<serde_json::Value> {
    let schema = schemars::schema_for!(ParserSettings);
    serde_json::to_value(&schema).map_err(|e| LekvarError::settings_error(e.to_string()))
}
