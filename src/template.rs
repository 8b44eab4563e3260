//! Naming templates
//!
//! A project publishes its release tarball and, inside it, its binary under
//! names that drift between versions. Each [`TemplateRule`] pins one naming
//! scheme to a semver range; a [`TemplateTable`] keeps the rules of every
//! project in declared order.

use crate::error::{Error, Result};
use crate::types::RuleConfig;
use regex::Regex;
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

pub const DEFAULT_TARBALL_PATTERN: &str = "{name}_v{version}_Linux-64bit.tar.gz";
pub const DEFAULT_BINARY_PATTERN: &str = "{name}_{version}_linux_amd64/{name}_{version}_linux_amd64";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{name}`
    Name,
    /// `{owner}`
    Owner,
    /// `{version}`, without the leading `v`
    Version,
    /// `{tag}`, with the leading `v`
    Tag,
}

impl Placeholder {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Placeholder::Name),
            "owner" => Some(Placeholder::Owner),
            "version" => Some(Placeholder::Version),
            "tag" => Some(Placeholder::Tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Values substituted into a [`NamePattern`].
#[derive(Debug, Clone, Copy)]
pub struct PatternVars<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub tag: &'a str,
}

/// A file name pattern with named slots, e.g. `{name}_{version}_linux_amd64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    segments: Vec<Segment>,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(pattern) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_literal(&mut segments, &pattern[last..whole.start()]).map_err(&invalid)?;
            let slot = Placeholder::from_key(key.as_str())
                .ok_or_else(|| invalid(format!("unknown placeholder {{{}}}", key.as_str())))?;
            segments.push(Segment::Slot(slot));
            last = whole.end();
        }
        push_literal(&mut segments, &pattern[last..]).map_err(&invalid)?;

        if segments.is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn render(&self, vars: &PatternVars<'_>) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Slot(Placeholder::Name) => vars.name,
                Segment::Slot(Placeholder::Owner) => vars.owner,
                Segment::Slot(Placeholder::Version) => vars.version,
                Segment::Slot(Placeholder::Tag) => vars.tag,
            })
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> std::result::Result<(), String> {
    if text.contains('{') || text.contains('}') {
        return Err(format!("unbalanced brace in '{}'", text));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A naming scheme gated by a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRule {
    pub range: VersionReq,
    pub tarball: NamePattern,
    pub binary: NamePattern,
}

impl TemplateRule {
    pub fn new(range: &str, tarball: &str, binary: &str) -> Result<Self> {
        Self::from_config(
            "<inline>",
            &RuleConfig {
                range: range.to_string(),
                tarball: tarball.to_string(),
                binary: binary.to_string(),
            },
        )
    }

    /// The rule used for projects that have no entry in the table.
    pub fn fallback() -> Self {
        let slot = |p| Segment::Slot(p);
        let lit = |s: &str| Segment::Literal(s.to_string());
        Self {
            range: VersionReq::STAR,
            tarball: NamePattern {
                source: DEFAULT_TARBALL_PATTERN.to_string(),
                segments: vec![
                    slot(Placeholder::Name),
                    lit("_v"),
                    slot(Placeholder::Version),
                    lit("_Linux-64bit.tar.gz"),
                ],
            },
            binary: NamePattern {
                source: DEFAULT_BINARY_PATTERN.to_string(),
                segments: vec![
                    slot(Placeholder::Name),
                    lit("_"),
                    slot(Placeholder::Version),
                    lit("_linux_amd64/"),
                    slot(Placeholder::Name),
                    lit("_"),
                    slot(Placeholder::Version),
                    lit("_linux_amd64"),
                ],
            },
        }
    }

    fn from_config(project: &str, rule: &RuleConfig) -> Result<Self> {
        let range_text = rule.range.trim();
        let range = if range_text.is_empty() {
            VersionReq::STAR
        } else {
            VersionReq::parse(range_text).map_err(|source| Error::InvalidRange {
                project: project.to_string(),
                range: rule.range.clone(),
                source,
            })?
        };

        Ok(Self {
            range,
            tarball: NamePattern::parse(&rule.tarball)?,
            binary: NamePattern::parse(&rule.binary)?,
        })
    }

    /// Whether `version` falls inside the range by semver precedence.
    /// Unlike [`VersionReq::matches`], prereleases are not excluded:
    /// `1.5.0-rc.1` is inside `>=1.0.0`.
    pub fn matches(&self, version: &Version) -> bool {
        let version = Version {
            build: BuildMetadata::EMPTY,
            ..version.clone()
        };
        self.range
            .comparators
            .iter()
            .all(|cmp| comparator_admits(cmp, &version))
    }
}

fn comparator_admits(cmp: &Comparator, version: &Version) -> bool {
    let base = Version {
        pre: cmp.pre.clone(),
        ..Version::new(cmp.major, cmp.minor.unwrap_or(0), cmp.patch.unwrap_or(0))
    };
    // first version past a partial comparator, e.g. `1.2` -> `1.3.0`
    let next = match (cmp.minor, cmp.patch) {
        (None, _) => Some(Version::new(cmp.major + 1, 0, 0)),
        (Some(minor), None) => Some(Version::new(cmp.major, minor + 1, 0)),
        (Some(_), Some(_)) => None,
    };

    match cmp.op {
        Op::Exact | Op::Wildcard => match next {
            Some(next) => *version >= base && *version < next,
            None => *version == base,
        },
        Op::Greater => match next {
            Some(next) => *version >= next,
            None => *version > base,
        },
        Op::GreaterEq => *version >= base,
        Op::Less => *version < base,
        Op::LessEq => match next {
            Some(next) => *version < next,
            None => *version <= base,
        },
        Op::Tilde => {
            let upper = match cmp.minor {
                None => Version::new(cmp.major + 1, 0, 0),
                Some(minor) => Version::new(cmp.major, minor + 1, 0),
            };
            *version >= base && *version < upper
        }
        Op::Caret => {
            let upper = match (cmp.major, cmp.minor, cmp.patch) {
                (major, None, _) => Version::new(major + 1, 0, 0),
                (0, Some(0), Some(patch)) => Version::new(0, 0, patch + 1),
                (0, Some(minor), _) => Version::new(0, minor + 1, 0),
                (major, Some(_), _) => Version::new(major + 1, 0, 0),
            };
            *version >= base && *version < upper
        }
        _ => cmp.matches(version),
    }
}

/// Naming rules keyed by project, each list kept in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateTable {
    rules: HashMap<String, Vec<TemplateRule>>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HashMap<String, Vec<RuleConfig>>) -> Result<Self> {
        let mut table = Self::new();
        for (project, rules) in config {
            let rules = rules
                .iter()
                .map(|rule| TemplateRule::from_config(project, rule))
                .collect::<Result<Vec<_>>>()?;
            table.rules.insert(project.trim_matches('/').to_string(), rules);
        }
        Ok(table)
    }

    /// Appends a rule to the end of the project's list.
    pub fn push(&mut self, project: &str, rule: TemplateRule) {
        self.rules
            .entry(project.trim_matches('/').to_string())
            .or_default()
            .push(rule);
    }

    /// Rules declared for the project, looked up by `owner/name` first and
    /// then by bare name.
    pub fn rules_for(&self, full_name: &str, name: &str) -> Option<&[TemplateRule]> {
        self.rules
            .get(full_name)
            .or_else(|| self.rules.get(name))
            .map(Vec::as_slice)
    }

    /// First rule whose range admits `version`; the fallback rule when the
    /// project has no rules at all, `None` when it has rules but none match.
    pub fn select(&self, full_name: &str, name: &str, version: &Version) -> Option<TemplateRule> {
        match self.rules_for(full_name, name) {
            None => Some(TemplateRule::fallback()),
            Some(rules) => rules.iter().find(|rule| rule.matches(version)).cloned(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
