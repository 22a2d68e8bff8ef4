//! Rules for Rust projects, layered on the generic ones.

use super::{generic, resolve_mapping, rewrite_table, Blueprint, BlueprintContext, Rule};
use crate::error::Result;

pub const KEY: &str = "rust";

const CARGO_ATTR_MAPPING: &[(&str, &str)] = &[
    ("name", "\"$:project_slug:\""),
    ("version", "\"$:starting_version:\""),
    ("description", "\"My project, created using stencil.\""),
    ("authors", "[\"$:author_name: <$:author_email:>\"]"),
    ("license", "\"$:preferred_license:\""),
    ("homepage", "\"$:version_control_url:\""),
    ("repository", "\"$:version_control_url:\""),
    ("documentation", "\"$:docs_url:\""),
];

pub fn rules() -> Result<Vec<Rule>> {
    Ok(vec![Rule::new("cargo_manifest", &[r"Cargo\.toml$"], cargo_manifest)?])
}

pub fn blueprint() -> Result<Blueprint> {
    Ok(Blueprint::layered(KEY, generic::blueprint()?, rules()?))
}

fn cargo_manifest(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let mapping = resolve_mapping(CARGO_ATTR_MAPPING, ctx.profile);
    rewrite_table(body, &["[package]"], &mapping)
}
