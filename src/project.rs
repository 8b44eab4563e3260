//! Project resolution
//!
//! Turns what a user types (`hugo`, `spf13/hugo`, `0.68.3`, `v0.68.3`) into a
//! canonical [`Project`] with its naming template selected.

use crate::error::{Error, Result};
use crate::template::TemplateTable;
use crate::types::Project;
use semver::Version;
use std::collections::HashMap;

/// Short names that expand to `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("hugo", "spf13/hugo");
        table
    }

    /// Built-in aliases with `extra` layered on top.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut table = Self::builtin();
        for (alias, target) in extra {
            table.insert(alias, target);
        }
        table
    }

    pub fn insert(&mut self, alias: &str, target: &str) {
        self.aliases.insert(
            alias.trim_matches('/').to_string(),
            target.trim_matches('/').to_string(),
        );
    }

    pub fn expand(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Source of a version when none was given explicitly.
pub trait VersionFallback {
    /// Looks up `key`, e.g. `HUGO_VERSION`.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads `{NAME}_VERSION` from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFallback;

impl VersionFallback for EnvFallback {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VersionFallback for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Owner and name segments become store directories, so they must stay
/// inside it.
fn is_path_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..") && !segment.contains('\\')
}

pub fn version_env_key(name: &str) -> String {
    format!("{}_VERSION", name.to_uppercase())
}

/// Parses a version without its `v` prefix. `1` and `1.2` are read as
/// `1.0.0` and `1.2.0`.
pub fn parse_version(project: &str, clean_version: &str) -> Result<Version> {
    match Version::parse(clean_version) {
        Ok(version) => Ok(version),
        Err(source) => {
            let parts: Vec<&str> = clean_version.split('.').collect();
            let numeric = parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
            if numeric && parts.len() < 3 {
                let padded = format!("{}{}", clean_version, ".0".repeat(3 - parts.len()));
                if let Ok(version) = Version::parse(&padded) {
                    return Ok(version);
                }
            }
            Err(Error::InvalidVersion {
                project: project.to_string(),
                version: clean_version.to_string(),
                source,
            })
        }
    }
}

pub struct Resolver {
    templates: TemplateTable,
    aliases: AliasTable,
    fallback: Box<dyn VersionFallback + Send + Sync>,
}

impl Resolver {
    /// A resolver that falls back to the process environment for versions.
    pub fn new(templates: TemplateTable, aliases: AliasTable) -> Self {
        Self {
            templates,
            aliases,
            fallback: Box::new(EnvFallback),
        }
    }

    pub fn with_fallback(mut self, fallback: impl VersionFallback + Send + Sync + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn templates(&self) -> &TemplateTable {
        &self.templates
    }

    pub fn resolve(&self, identifier: &str, version_input: &str) -> Result<Project> {
        let unknown = || Error::UnknownProject {
            identifier: identifier.to_string(),
        };

        let mut full_name = identifier.trim_matches('/');
        if !full_name.contains('/') {
            full_name = self.aliases.expand(full_name).ok_or_else(unknown)?;
            tracing::debug!("Expanded alias {} to {}", identifier, full_name);
        }

        let (owner, name) = full_name.split_once('/').ok_or_else(unknown)?;
        if !is_path_segment(owner) || !name.split('/').all(is_path_segment) {
            return Err(unknown());
        }

        let mut version = version_input.trim().to_string();
        if version.is_empty() {
            let env_key = version_env_key(name);
            version = self
                .fallback
                .lookup(&env_key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            if version.is_empty() {
                return Err(Error::UnknownVersion {
                    project: full_name.to_string(),
                    env_key,
                });
            }
            tracing::debug!("Using {} from {}", version, env_key);
        }

        let raw_version = if version.starts_with('v') {
            version
        } else {
            format!("v{}", version)
        };
        let clean_version = raw_version.trim_start_matches('v').to_string();
        let parsed = parse_version(full_name, &clean_version)?;

        let template = self
            .templates
            .select(full_name, name, &parsed)
            .ok_or_else(|| Error::NoMatchingTemplate {
                project: full_name.to_string(),
                version: raw_version.clone(),
            })?;

        tracing::debug!(
            "Resolved {} {} with tarball pattern {}",
            full_name,
            raw_version,
            template.tarball
        );

        Ok(Project {
            full_name: full_name.to_string(),
            raw_version,
            clean_version,
            owner: owner.to_string(),
            name: name.to_string(),
            template,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateRule;
    use pretty_assertions::assert_eq;

    fn resolver(templates: TemplateTable) -> Resolver {
        Resolver::new(templates, AliasTable::builtin()).with_fallback(HashMap::<String, String>::new())
    }

    #[test]
    fn test_resolve_hugo_alias() {
        let project = resolver(TemplateTable::new()).resolve("hugo", "0.68.3").unwrap();
        assert_eq!(project.full_name, "spf13/hugo");
        assert_eq!(project.owner, "spf13");
        assert_eq!(project.name, "hugo");
        assert_eq!(project.raw_version, "v0.68.3");
        assert_eq!(project.clean_version, "0.68.3");
        assert_eq!(project.tarball_name(), "hugo_v0.68.3_Linux-64bit.tar.gz");
        assert_eq!(
            project.binary_name(),
            "hugo_0.68.3_linux_amd64/hugo_0.68.3_linux_amd64"
        );
    }

    #[test]
    fn test_alias_is_idempotent() {
        let r = resolver(TemplateTable::new());
        assert_eq!(
            r.resolve("hugo", "0.68.3").unwrap(),
            r.resolve("spf13/hugo", "v0.68.3").unwrap()
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver(TemplateTable::new());
        assert_eq!(
            r.resolve("netlify/binrc", "1.2.3").unwrap(),
            r.resolve("netlify/binrc", "1.2.3").unwrap()
        );
    }

    #[test]
    fn test_trims_slashes_and_keeps_nested_name() {
        let r = resolver(TemplateTable::new());
        let project = r.resolve("/spf13/hugo/", "1.0.0").unwrap();
        assert_eq!(project.full_name, "spf13/hugo");

        let project = r.resolve("owner/group/tool", "1.0.0").unwrap();
        assert_eq!(project.owner, "owner");
        assert_eq!(project.name, "group/tool");
    }

    #[test]
    fn test_unknown_project() {
        let r = resolver(TemplateTable::new());
        assert!(matches!(
            r.resolve("nope", "1.0.0"),
            Err(Error::UnknownProject { .. })
        ));
        assert!(matches!(
            r.resolve("/tool", "1.0.0"),
            Err(Error::UnknownProject { .. })
        ));
    }

    #[test]
    fn test_rejects_segments_outside_store() {
        let r = resolver(TemplateTable::new());
        for bad in [
            "owner//tool",
            "owner//bin/sh",
            "owner/../x",
            "owner/a//b",
            "owner/./tool",
            "../tool",
            "owner/a/..",
            "owner/..\\x",
        ] {
            assert!(
                matches!(r.resolve(bad, "1.0.0"), Err(Error::UnknownProject { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_alias_target_is_validated() {
        let mut extra = HashMap::new();
        extra.insert("evil".to_string(), "owner/../../tmp".to_string());
        let r = Resolver::new(TemplateTable::new(), AliasTable::with_overrides(&extra))
            .with_fallback(HashMap::<String, String>::new());
        assert!(matches!(
            r.resolve("evil", "1.0.0"),
            Err(Error::UnknownProject { .. })
        ));
    }

    #[test]
    fn test_custom_alias() {
        let mut extra = HashMap::new();
        extra.insert("gh".to_string(), "cli/cli".to_string());
        let r = Resolver::new(TemplateTable::new(), AliasTable::with_overrides(&extra))
            .with_fallback(HashMap::<String, String>::new());
        assert_eq!(r.resolve("gh", "2.0.0").unwrap().full_name, "cli/cli");
        assert_eq!(r.resolve("hugo", "2.0.0").unwrap().full_name, "spf13/hugo");
    }

    #[test]
    fn test_unknown_version_without_fallback() {
        let r = resolver(TemplateTable::new());
        match r.resolve("owner/tool", "") {
            Err(Error::UnknownVersion { project, env_key }) => {
                assert_eq!(project, "owner/tool");
                assert_eq!(env_key, "TOOL_VERSION");
            }
            other => panic!("expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_version_from_fallback() {
        let mut env = HashMap::new();
        env.insert("HUGO_VERSION".to_string(), "0.70.0".to_string());
        let r = Resolver::new(TemplateTable::new(), AliasTable::builtin()).with_fallback(env);
        let project = r.resolve("hugo", "").unwrap();
        assert_eq!(project.raw_version, "v0.70.0");
    }

    #[test]
    fn test_blank_fallback_is_unknown() {
        let mut env = HashMap::new();
        env.insert("TOOL_VERSION".to_string(), "  ".to_string());
        let r = Resolver::new(TemplateTable::new(), AliasTable::builtin()).with_fallback(env);
        assert!(matches!(
            r.resolve("owner/tool", ""),
            Err(Error::UnknownVersion { .. })
        ));
    }

    #[test]
    fn test_invalid_version() {
        let r = resolver(TemplateTable::new());
        for bad in ["latest", "1.x", "v", "1..2"] {
            assert!(
                matches!(r.resolve("owner/tool", bad), Err(Error::InvalidVersion { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_short_versions_are_padded() {
        assert_eq!(parse_version("t", "1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(parse_version("t", "7").unwrap(), Version::new(7, 0, 0));
        assert!(!parse_version("t", "1.2.3-rc.1").unwrap().pre.is_empty());
    }

    #[test]
    fn test_strips_every_leading_v() {
        let project = resolver(TemplateTable::new()).resolve("owner/tool", "vv1.0.0").unwrap();
        assert_eq!(project.raw_version, "vv1.0.0");
        assert_eq!(project.clean_version, "1.0.0");
    }

    #[test]
    fn test_version_range_selects_template() {
        let mut table = TemplateTable::new();
        table.push(
            "hugo",
            TemplateRule::new("<0.50.0", "{name}_{version}_Linux-64bit.tar.gz", "{name}").unwrap(),
        );
        table.push(
            "hugo",
            TemplateRule::new(">=0.50.0", "{name}_{version}_linux-amd64.tar.gz", "{name}").unwrap(),
        );
        let r = resolver(table);

        let old = r.resolve("hugo", "0.40").unwrap();
        assert_eq!(old.tarball_name(), "hugo_0.40_Linux-64bit.tar.gz");
        let new = r.resolve("hugo", "0.68.3").unwrap();
        assert_eq!(new.tarball_name(), "hugo_0.68.3_linux-amd64.tar.gz");
        assert_eq!(new.binary_name(), "hugo");
    }

    #[test]
    fn test_prerelease_selects_template() {
        let mut table = TemplateTable::new();
        table.push("tool", TemplateRule::new(">=1.0.0", "{name}-{tag}.tar.gz", "{name}").unwrap());
        let project = resolver(table).resolve("acme/tool", "1.5.0-rc.1").unwrap();
        assert_eq!(project.tarball_name(), "tool-v1.5.0-rc.1.tar.gz");
    }

    #[test]
    fn test_no_matching_template() {
        let mut table = TemplateTable::new();
        table.push("tool", TemplateRule::new(">=2.0.0", "t.tar.gz", "t").unwrap());
        match resolver(table).resolve("owner/tool", "1.0.0") {
            Err(Error::NoMatchingTemplate { project, version }) => {
                assert_eq!(project, "owner/tool");
                assert_eq!(version, "v1.0.0");
            }
            other => panic!("expected NoMatchingTemplate, got {:?}", other),
        }
    }
}
