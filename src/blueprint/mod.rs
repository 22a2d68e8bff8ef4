//! Blueprints: named rule sets that turn a concrete file tree into a template.
//!
//! A blueprint is an ordered list of [`Rule`]s. Each rule pairs a set of
//! file patterns with a transform; applying the blueprint runs every rule
//! over the files whose key matches one of its patterns. Language
//! blueprints are built by layering their own rules on top of the
//! [`generic`] ones.
//!
//! - `generic`: README, LICENSE, CONTRIBUTING and Sphinx configuration
//! - `python`: package metadata of Python projects
//! - `rust`: package metadata of Rust projects

pub mod generic;
pub mod python;
pub mod rust;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use regex::Regex;

use crate::constants::tokens;
use crate::error::{Error, Result};
use crate::placeholder::field_token;

/// Signature of a rule's content transform.
pub type Transform = fn(&BlueprintContext<'_>, &str) -> String;

/// Values shared by every rule while a blueprint is applied.
#[derive(Debug, Clone, Copy)]
pub struct BlueprintContext<'a> {
    pub project_name: &'a str,
    pub project_slug: &'a str,
    /// When set, attribute mappings are restricted to values this profile
    /// provides (see [`resolve_mapping`]).
    pub profile: Option<&'a IndexMap<String, Option<String>>>,
}

impl BlueprintContext<'_> {
    /// Replaces literal occurrences of the project name and slug with their
    /// tokens, in a single pass so inserted tokens are never rewritten.
    pub fn replace_names(&self, body: &str) -> String {
        let literals = [
            (self.project_name, tokens::PROJECT_NAME),
            (self.project_slug, tokens::PROJECT_SLUG),
        ];
        let mut out = String::with_capacity(body.len());
        let mut rest = body;
        'scan: while let Some(c) = rest.chars().next() {
            for (literal, token) in literals {
                if !literal.is_empty() && rest.starts_with(literal) {
                    out.push_str(token);
                    rest = &rest[literal.len()..];
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

/// A (file patterns, transform) pair.
#[derive(Debug, Clone)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    transform: Transform,
}

impl Rule {
    /// Creates a rule matching keys that start with any of `patterns`.
    ///
    /// Patterns are regular expressions anchored at the start of the key,
    /// so `"README"` matches `README`, `README.md` and `README.txt` in the
    /// template root but not `docs/README.md`.
    pub fn new(name: &'static str, patterns: &[&str], transform: Transform) -> Result<Self> {
        let pattern = Regex::new(&format!("^(?:{})", patterns.join("|")))?;
        Ok(Self { name, pattern, transform })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

/// Symbolizes every key of `files`, keeping their order.
///
/// Fails when two files end up under the same key.
pub fn symbolize_keys(files: IndexMap<String, Vec<u8>>, slug: &str) -> Result<IndexMap<String, Vec<u8>>> {
    let mut sources: IndexMap<String, String> = IndexMap::with_capacity(files.len());
    let mut out = IndexMap::with_capacity(files.len());
    for (key, value) in files {
        let symbolized = symbolize_path(&key, slug);
        if let Some(first) = sources.insert(symbolized.clone(), key.clone()) {
            return Err(Error::PathCollision { key: symbolized, first, second: key });
        }
        out.insert(symbolized, value);
    }
    Ok(out)
}

/// Replaces a path segment equal to the slug, or a file named after it, with
/// the path slug marker.
pub fn symbolize_path(key: &str, slug: &str) -> String {
    if slug.is_empty() {
        return key.to_string();
    }
    key.split('/')
        .map(|segment| {
            if segment == slug {
                tokens::PATH_SLUG.to_string()
            } else if let Some(rest) =
                segment.strip_prefix(slug).filter(|rest| rest.starts_with('.'))
            {
                format!("{}{rest}", tokens::PATH_SLUG)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A named, ordered rule set.
#[derive(Debug, Clone)]
pub struct Blueprint {
    key: String,
    rules: Vec<Rule>,
}

impl Blueprint {
    pub fn new<S: Into<String>>(key: S, rules: Vec<Rule>) -> Self {
        Self { key: key.into(), rules }
    }

    /// Creates a blueprint running `base`'s rules first, then `rules`.
    pub fn layered<S: Into<String>>(key: S, base: Blueprint, rules: Vec<Rule>) -> Self {
        let mut all = base.rules;
        all.extend(rules);
        Self::new(key, all)
    }

    /// Registry key, also stored as the archive's language tag.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Applies every rule to `files` and returns the rewritten tree.
    ///
    /// Keys first get the project slug replaced by the path marker. Files
    /// that are empty or not valid UTF-8 are passed through untouched.
    pub fn apply(
        &self,
        files: IndexMap<String, Vec<u8>>,
        ctx: &BlueprintContext<'_>,
    ) -> Result<IndexMap<String, Vec<u8>>> {
        let mut files = symbolize_keys(files, ctx.project_slug)?;

        debug!("Applying blueprint '{}' ({} rule(s))", self.key, self.rules.len());
        for rule in &self.rules {
            let keys: Vec<String> = files.keys().filter(|k| rule.matches(k)).cloned().collect();
            for key in keys {
                let Some(content) = files.get(&key) else { continue };
                if content.is_empty() {
                    trace!("Didn't process '{key}' as it is empty");
                    continue;
                }
                let Ok(text) = std::str::from_utf8(content) else {
                    warn!("Didn't process '{key}' with rule '{}': not valid UTF-8", rule.name);
                    continue;
                };
                debug!("Processing '{key}' with rule '{}'", rule.name);
                let output = (rule.transform)(ctx, text);
                files.insert(key, output.into_bytes());
            }
        }
        Ok(files)
    }
}

/// How a caller selects a blueprint.
#[derive(Debug, Clone)]
pub enum BlueprintSource {
    /// A key resolved against a [`BlueprintRegistry`].
    ByKey(String),
    /// A caller-supplied rule set.
    Custom(Blueprint),
}

impl BlueprintSource {
    pub fn resolve(self, registry: &BlueprintRegistry) -> Result<Blueprint> {
        match self {
            BlueprintSource::ByKey(key) => registry.get(&key).cloned().ok_or_else(|| {
                Error::UnknownBlueprint { key, available: registry.keys().join(", ") }
            }),
            BlueprintSource::Custom(blueprint) => Ok(blueprint),
        }
    }
}

impl From<&str> for BlueprintSource {
    fn from(key: &str) -> Self {
        BlueprintSource::ByKey(key.to_string())
    }
}

impl From<Blueprint> for BlueprintSource {
    fn from(blueprint: Blueprint) -> Self {
        BlueprintSource::Custom(blueprint)
    }
}

/// The set of blueprints selectable by key.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    blueprints: IndexMap<String, Blueprint>,
}

impl BlueprintRegistry {
    /// A registry holding the built-in `generic`, `python` and `rust` blueprints.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::default();
        registry.register(generic::blueprint()?);
        registry.register(python::blueprint()?);
        registry.register(rust::blueprint()?);
        Ok(registry)
    }

    /// Adds a blueprint, replacing any registered under the same key.
    pub fn register(&mut self, blueprint: Blueprint) {
        self.blueprints.insert(blueprint.key().to_string(), blueprint);
    }

    pub fn get(&self, key: &str) -> Option<&Blueprint> {
        self.blueprints.get(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.blueprints.keys().map(String::as_str).collect()
    }
}

/// Restricts an attribute mapping to the values a profile can provide.
///
/// Without a profile the full mapping is returned. With one, an entry is
/// kept if its value mentions the project name or slug token, or the token
/// of a field the profile sets.
pub fn resolve_mapping(
    mapping: &[(&str, &str)],
    profile: Option<&IndexMap<String, Option<String>>>,
) -> IndexMap<String, String> {
    let keep = |value: &str| -> bool {
        let Some(profile) = profile else { return true };
        value.contains(tokens::PROJECT_NAME)
            || value.contains(tokens::PROJECT_SLUG)
            || profile.iter().any(|(field, v)| {
                v.as_deref().is_some_and(|v| !v.is_empty()) && value.contains(&field_token(field))
            })
    };
    mapping
        .iter()
        .filter(|(_, value)| keep(value))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Rewrites a `key = value` line through `mapping`.
///
/// Lines that do not split into exactly one key and one value are returned
/// unchanged.
pub fn apply_line_mapping(line: &str, mapping: &IndexMap<String, String>) -> String {
    let parts: Vec<&str> = line.split(" = ").collect();
    let [key, value] = parts.as_slice() else {
        return line.to_string();
    };
    let new_line = format!("{key} = {}", mapping.get(*key).map(String::as_str).unwrap_or(value));
    if new_line != line {
        trace!("Modified line: {line:?} is now {new_line:?}");
    }
    new_line
}

/// Applies `mapping` to the lines of the first table named in `tables`,
/// up to the next line starting with `[`.
pub fn rewrite_table(body: &str, tables: &[&str], mapping: &IndexMap<String, String>) -> String {
    let mut in_table = false;
    body.split('\n')
        .map(|line| {
            if in_table {
                if line.starts_with('[') {
                    in_table = tables.contains(&line.trim());
                    return line.to_string();
                }
                apply_line_mapping(line, mapping)
            } else {
                in_table = tables.contains(&line.trim());
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
