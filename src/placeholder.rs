//! Deploy-time resolution of symbolic tokens.
//!
//! Templates carry `$:field:` tokens in their contents. At deploy time every
//! token is mapped to a concrete value, and anything that cannot be resolved
//! becomes the `$:NULL:` sentinel so the caller can warn about it.

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use log::trace;

use crate::constants::{fields, tokens};
use crate::license::License;

/// Derives a slug from a project name: lower-cased, spaces and hyphens
/// turned into underscores, everything outside `[a-z0-9_]` dropped.
///
/// ```
/// assert_eq!(stencil::placeholder::to_slug("My Cool App!"), "my_cool_app");
/// ```
pub fn to_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Title-cases `text`: a letter is upper-cased when it follows a non-letter
/// and lower-cased otherwise.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

/// Name of the generated base exception class for a project slug.
///
/// ```
/// assert_eq!(stencil::placeholder::error_class_name("my_cool_app"), "MycoolappError");
/// ```
pub fn error_class_name(slug: &str) -> String {
    format!("{}Error", title_case(&slug.replace('_', "")))
}

/// The `$:field:` token of a profile field.
pub fn field_token(field: &str) -> String {
    format!("$:{field}:")
}

/// Merges template-stored profile defaults with an explicit profile.
///
/// A field set in `explicit` wins; otherwise the stored value is kept. Fields
/// that are absent from both stay `None`.
pub fn merge_profile_data(
    stored: &IndexMap<String, Option<String>>,
    explicit: Option<&IndexMap<String, Option<String>>>,
) -> IndexMap<String, Option<String>> {
    let mut merged = stored.clone();
    if let Some(explicit) = explicit {
        for (field, value) in explicit {
            match value {
                Some(v) => {
                    merged.insert(field.clone(), Some(v.clone()));
                }
                None => {
                    merged.entry(field.clone()).or_insert(None);
                }
            }
        }
    }
    merged
}

/// Inputs to the token map.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    pub project_name: &'a str,
    pub project_slug: &'a str,
    pub today: NaiveDate,
    /// Merged profile data, see [`merge_profile_data`].
    pub profile: &'a IndexMap<String, Option<String>>,
    /// The license `preferred_license` resolved to, if any.
    pub license: Option<&'a License>,
}

impl ResolveContext<'_> {
    fn field(&self, field: &str) -> Option<&str> {
        self.profile.get(field).and_then(|v| v.as_deref()).filter(|v| !v.is_empty())
    }

    fn starting_version(&self) -> String {
        match self.field(fields::STARTING_VERSION) {
            Some(tokens::CALVER) => self.today.format("%Y.%m.%d").to_string(),
            Some(v) => v.to_string(),
            None => tokens::NULL.to_string(),
        }
    }

    fn url(&self, field: &str) -> String {
        let Some(url) = self.field(field) else {
            return tokens::NULL.to_string();
        };
        if url.contains(tokens::URL_PROJECT_NAME) {
            url.replace(tokens::URL_PROJECT_NAME, self.project_name)
        } else {
            format!("{}/{}", url.trim_end_matches('/'), self.project_name)
        }
    }

    fn license_body(&self) -> String {
        match self.license {
            Some(license) => license
                .body
                .replace("[year]", &self.today.year().to_string())
                .replace("[fullname]", self.field(fields::AUTHOR_NAME).unwrap_or(tokens::NULL)),
            None => tokens::NULL.to_string(),
        }
    }

    fn license_name(&self) -> String {
        match (self.license, self.field(fields::PREFERRED_LICENSE)) {
            (Some(license), _) => license.name.clone(),
            (None, Some(key)) => key.to_string(),
            (None, None) => tokens::NULL.to_string(),
        }
    }

    fn value_of(&self, field: &str) -> String {
        match field {
            fields::STARTING_VERSION => self.starting_version(),
            fields::PREFERRED_LICENSE => self.license_name(),
            f if fields::URLS.contains(&f) => self.url(f),
            f => self.field(f).unwrap_or(tokens::NULL).to_string(),
        }
    }
}

/// Outcome of substituting one file's content.
#[derive(Debug, PartialEq, Eq)]
pub struct Substitution {
    pub content: Vec<u8>,
    /// Tokens that resolved to the null sentinel and appeared in the content.
    pub unresolved: Vec<String>,
}

/// Replaces every non-overlapping occurrence of `needle` in `haystack`.
///
/// Returns `None` when `needle` does not occur.
fn replace_bytes(haystack: &[u8], needle: &[u8], with: &[u8]) -> Option<Vec<u8>> {
    if needle.is_empty() {
        return None;
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    let mut found = false;
    while let Some(at) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..at]);
        out.extend_from_slice(with);
        rest = &rest[at + needle.len()..];
        found = true;
    }
    if !found {
        return None;
    }
    out.extend_from_slice(rest);
    Some(out)
}

/// Ordered token → value map.
#[derive(Debug)]
pub struct Placeholders {
    entries: Vec<(String, String)>,
}

impl Placeholders {
    /// Builds the map from explicit (token, value) pairs, applied in order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self { entries: pairs.into_iter().collect() }
    }

    /// Builds the deploy-time map.
    ///
    /// The license body comes first so tokens inside it are resolved by the
    /// entries that follow.
    pub fn resolve(ctx: &ResolveContext<'_>) -> Self {
        let mut pairs: IndexMap<String, String> = IndexMap::new();
        pairs.insert(tokens::PROJECT_LICENSE.to_string(), ctx.license_body());
        pairs.insert(tokens::PROJECT_NAME.to_string(), ctx.project_name.to_string());
        pairs.insert(tokens::PROJECT_SLUG.to_string(), ctx.project_slug.to_string());
        pairs.insert(tokens::PROJECT_YEAR.to_string(), ctx.today.year().to_string());
        pairs.insert(tokens::PROJECT_ERROR.to_string(), error_class_name(ctx.project_slug));

        let extra = ctx.profile.keys().map(String::as_str).filter(|f| !fields::ALL.contains(f));
        for field in fields::ALL.into_iter().chain(extra) {
            pairs.insert(field_token(field), ctx.value_of(field));
        }

        trace!("Variable mapping: {pairs:?}");
        Self::from_pairs(pairs)
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, v)| v.as_str())
    }

    /// Replaces every token in `data`, in map order.
    pub fn apply(&self, data: &[u8]) -> Substitution {
        let mut content = data.to_vec();
        let mut unresolved = Vec::new();

        for (token, value) in &self.entries {
            let Some(replaced) = replace_bytes(&content, token.as_bytes(), value.as_bytes()) else {
                continue;
            };
            if value == tokens::NULL {
                unresolved.push(token.clone());
            }
            content = replaced;
        }

        let null = tokens::NULL.as_bytes();
        if unresolved.is_empty() && content.windows(null.len()).any(|w| w == null) {
            unresolved.push(tokens::NULL.to_string());
        }

        Substitution { content, unresolved }
    }
}
