use crate::cache::DEFAULT_RELEASE_HOST;
use crate::project::AliasTable;
use crate::template::TemplateTable;
use crate::types::*;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_DIR_NAME: &str = ".binrc";
pub const TEMPLATES_FILE_NAME: &str = "templates.yaml";

pub const CACHE_PATH_ENV: &str = "BINRC_CACHE_PATH";
pub const TEMPLATES_ENV: &str = "BINRC_TEMPLATES";
pub const RELEASE_HOST_ENV: &str = "BINRC_RELEASE_HOST";

/// Values given on the command line; each wins over its environment variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cache_path: Option<String>,
    pub templates: Option<PathBuf>,
    pub release_host: Option<String>,
}

pub fn load_settings(overrides: &Overrides) -> Result<Settings> {
    resolve_settings(overrides, |key| std::env::var(key).ok(), dirs::home_dir())
}

pub fn resolve_settings(
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Result<Settings> {
    let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);

    let store_path = overrides
        .cache_path
        .clone()
        .or_else(|| env(CACHE_PATH_ENV).and_then(non_empty))
        .unwrap_or_else(|| DEFAULT_STORE_DIR_NAME.to_string());

    let store_root = if Path::new(&store_path).is_absolute() {
        PathBuf::from(&store_path)
    } else {
        home.ok_or_else(|| anyhow!("Could not determine home directory"))?
            .join(&store_path)
    };
    tracing::debug!("Store root: {}", store_root.display());

    let templates_file = overrides
        .templates
        .clone()
        .or_else(|| env(TEMPLATES_ENV).and_then(non_empty).map(PathBuf::from))
        .or_else(|| {
            let default = store_root.join(TEMPLATES_FILE_NAME);
            default.is_file().then_some(default)
        });

    let release_host = overrides
        .release_host
        .clone()
        .or_else(|| env(RELEASE_HOST_ENV).and_then(non_empty))
        .unwrap_or_else(|| DEFAULT_RELEASE_HOST.to_string());

    Ok(Settings {
        store_root,
        templates_file,
        release_host,
    })
}

/// Reads a templates document; `.json` files are parsed as JSON, anything
/// else as YAML.
pub fn load_template_config(path: &Path) -> Result<TemplateConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read templates file at {}", path.display()))?;

    let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {} as JSON", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Could not parse {} as YAML", path.display()))?
    };

    Ok(config)
}

/// Template and alias tables for `settings`, built-in defaults when no
/// templates file is configured.
pub fn load_tables(settings: &Settings) -> Result<(TemplateTable, AliasTable)> {
    let Some(path) = &settings.templates_file else {
        return Ok((TemplateTable::new(), AliasTable::builtin()));
    };

    let config = load_template_config(path)?;
    let templates = TemplateTable::from_config(&config.templates)
        .with_context(|| format!("Invalid template in {}", path.display()))?;
    tracing::debug!(
        "Loaded templates for {} project(s) from {}",
        templates.len(),
        path.display()
    );
    Ok((templates, AliasTable::with_overrides(&config.aliases)))
}
