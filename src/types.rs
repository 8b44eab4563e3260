use crate::template::{PatternVars, TemplateRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// One naming rule as written in the templates document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    #[serde(default)]
    pub range: String,
    pub tarball: String,
    pub binary: String,
}

/// The templates document: extra aliases plus per-project naming rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TemplateConfig {
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub templates: HashMap<String, Vec<RuleConfig>>,
}

/// Process-level settings resolved from flags, environment and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_root: PathBuf,
    pub templates_file: Option<PathBuf>,
    pub release_host: String,
}

/// A project pinned to one version, with its naming template resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// `owner/name`
    pub full_name: String,
    /// Version with a leading `v`.
    pub raw_version: String,
    /// Version without any leading `v`.
    pub clean_version: String,
    pub owner: String,
    pub name: String,
    pub template: TemplateRule,
}

impl Project {
    pub fn pattern_vars(&self) -> PatternVars<'_> {
        PatternVars {
            owner: &self.owner,
            name: &self.name,
            version: &self.clean_version,
            tag: &self.raw_version,
        }
    }

    /// Release asset file name.
    pub fn tarball_name(&self) -> String {
        self.template.tarball.render(&self.pattern_vars())
    }

    /// Path of the executable inside the extracted tarball.
    pub fn binary_name(&self) -> String {
        self.template.binary.render(&self.pattern_vars())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.full_name, self.raw_version)
    }
}

/// A project whose binary is present on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBinary {
    pub project: Project,
    pub path: PathBuf,
}

/// An entry found while walking the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    pub full_name: String,
    pub version: String,
    pub path: PathBuf,
}
