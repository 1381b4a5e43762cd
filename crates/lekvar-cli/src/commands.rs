//! Subcommand implementations

use anyhow::{Context, Result};
use lekvar_core::{Lekvar, LekvarError, SettingsLoader, settings_schema};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Load settings for `file` and read it into a resolved document
fn load_document(file: &Path, settings_path: Option<&Path>) -> Result<Lekvar> {
    let start_dir = file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty() && dir.is_dir());
    let settings = SettingsLoader::load(settings_path, start_dir)
        .context("Failed to load parser settings")?;
    debug!("Using settings: {:?}", settings);

    let mut doc = Lekvar::with_settings(settings)?;
    doc.read_file(file)
        .with_context(|| format!("Failed to load '{}'", file.display()))?;
    Ok(doc)
}

pub fn check_command(file: &Path, settings_path: Option<&Path>) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    let sections = doc.sections().len();
    info!("{} resolved", file.display());
    println!(
        "✓ {}: {} section{} resolved",
        file.display(),
        sections,
        if sections == 1 { "" } else { "s" }
    );
    Ok(())
}

pub fn get_command(
    file: &Path,
    settings_path: Option<&Path>,
    section: &str,
    option: &str,
    fallback: Option<&str>,
) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    let value = match fallback {
        Some(fallback) => doc.get_or(section, option, fallback)?,
        None => doc.get(section, option)?,
    };
    println!("{}", value.unwrap_or_default());
    Ok(())
}

pub fn sections_command(file: &Path, settings_path: Option<&Path>) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    for section in doc.sections() {
        println!("{section}");
    }
    Ok(())
}

pub fn options_command(file: &Path, settings_path: Option<&Path>, section: &str) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    for option in doc.options(section)? {
        println!("{option}");
    }
    Ok(())
}

pub fn dump_command(file: &Path, settings_path: Option<&Path>) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    let dump = document_to_json(&doc)?;
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

/// Resolved document as `{ section: { option: value | null } }`, default
/// section first
fn document_to_json(doc: &Lekvar) -> Result<Value, LekvarError> {
    let mut root = Map::new();
    let names = std::iter::once(doc.default_section()).chain(doc.sections());
    for section in names {
        let items = doc
            .items(section, None)?
            .into_iter()
            .map(|(name, value)| (name, value.map_or(Value::Null, Value::String)))
            .collect::<Map<_, _>>();
        root.insert(section.to_string(), Value::Object(items));
    }
    Ok(Value::Object(root))
}

pub fn graph_command(file: &Path, settings_path: Option<&Path>) -> Result<()> {
    let doc = load_document(file, settings_path)?;
    print!("{}", doc.to_dot()?);
    Ok(())
}

pub fn schema_command() -> Result<()> {
    let schema = settings_schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
