//! Rules for Python projects, layered on the generic ones.

use log::warn;
use regex::{NoExpand, Regex};

use super::{apply_line_mapping, generic, resolve_mapping, rewrite_table, Blueprint, BlueprintContext, Rule};
use crate::constants::tokens;
use crate::error::Result;

pub const KEY: &str = "python";

const INIT_ATTR_MAPPING: &[(&str, &str)] = &[
    ("__productname__", "\"$:project_name:\""),
    ("__version__", "\"$:starting_version:\""),
    ("__description__", "\"My project, created using stencil.\""),
    ("__url__", "\"$:version_control_url:\""),
    ("__docs__", "\"$:docs_url:\""),
    ("__author__", "\"$:author_name:\""),
    ("__author_email__", "\"$:author_email:\""),
    ("__license__", "\"$:preferred_license:\""),
    ("__bugtracker__", "\"$:version_control_url:/issues\""),
    ("__ci__", "\"$:ci_url:\""),
];

const PYPROJECT_ATTR_MAPPING: &[(&str, &str)] = &[
    ("name", "\"$:project_name:\""),
    ("version", "\"$:starting_version:\""),
    ("description", "\"My project, created using stencil.\""),
    ("license", "\"$:preferred_license:\""),
    ("authors", "[\"$:author_name: <$:author_email:>\"]"),
    ("maintainers", "[\"$:author_name: <$:author_email:>\"]"),
    ("homepage", "\"$:version_control_url:\""),
    ("repository", "\"$:version_control_url:\""),
    ("documentation", "\"$:docs_url:\""),
];

const PYPROJECT_TABLES: &[&str] = &["[tool.poetry]", "[project]"];

pub fn rules() -> Result<Vec<Rule>> {
    Ok(vec![
        Rule::new("package_init", &[r"PROJECTSLUG/__init__\.py$"], package_init)?,
        Rule::new("pyproject", &[r"pyproject\.toml$"], pyproject)?,
        Rule::new("setup", &[r"MANIFEST\.in$", r"setup\.(cfg|py)$"], setup)?,
        Rule::new("requirements", &[r"requirements.*\.txt$"], requirements)?,
        Rule::new("errors", &[r"PROJECTSLUG/errors?\.py$"], errors)?,
    ])
}

pub fn blueprint() -> Result<Blueprint> {
    Ok(Blueprint::layered(KEY, generic::blueprint()?, rules()?))
}

fn package_init(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let mapping = resolve_mapping(INIT_ATTR_MAPPING, ctx.profile);
    let body = body
        .split('\n')
        .map(|line| {
            if line.starts_with("__") {
                apply_line_mapping(line, &mapping)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    ctx.replace_names(&body)
}

fn pyproject(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let mapping = resolve_mapping(PYPROJECT_ATTR_MAPPING, ctx.profile);
    ctx.replace_names(&rewrite_table(body, PYPROJECT_TABLES, &mapping))
}

fn setup(ctx: &BlueprintContext<'_>, body: &str) -> String {
    ctx.replace_names(body)
}

fn requirements(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let body = body
        .split('\n')
        .map(|line| {
            let mentions_project = (!ctx.project_name.is_empty() && line.contains(ctx.project_name))
                || (!ctx.project_slug.is_empty() && line.contains(ctx.project_slug));
            if line.starts_with("git+") && mentions_project {
                "git+$:version_control_url:".to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    ctx.replace_names(&body)
}

/// Name of the first class defined in `body`.
fn base_exception(body: &str) -> Option<&str> {
    let line = body.split('\n').find(|l| l.starts_with("class"))?;
    let name = line["class".len()..].trim_start();
    let end = name.find(['(', ':']).unwrap_or(name.len());
    Some(name[..end].trim()).filter(|n| !n.is_empty())
}

/// Replaces every use of the base exception's identifier.
fn errors(_: &BlueprintContext<'_>, body: &str) -> String {
    let Some(name) = base_exception(body) else {
        return body.to_string();
    };
    match Regex::new(&format!(r"\b{}\b", regex::escape(name))) {
        Ok(pattern) => pattern.replace_all(body, NoExpand(tokens::PROJECT_ERROR)).into_owned(),
        Err(e) => {
            warn!("Didn't tokenize error class '{name}': {e}");
            body.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx() -> BlueprintContext<'static> {
        BlueprintContext { project_name: "MyApp", project_slug: "myapp", profile: None }
    }

    #[test]
    fn init_dunders_are_mapped() {
        let body = "\
__productname__ = \"MyApp\"
__version__ = \"0.1.0\"
__custom__ = \"kept\"

from myapp.core import run
";
        assert_eq!(
            package_init(&ctx(), body),
            "\
__productname__ = \"$:project_name:\"
__version__ = \"$:starting_version:\"
__custom__ = \"kept\"

from $:project_slug:.core import run
"
        );
    }

    #[test]
    fn init_without_dunders_only_replaces_names() {
        let body = "import myapp\n";
        assert_eq!(package_init(&ctx(), body), "import $:project_slug:\n");
    }

    #[test]
    fn pyproject_rewrites_poetry_table() {
        let body = "\
[tool.poetry]
name = \"myapp\"
version = \"0.1.0\"
authors = [\"Someone <s@x.io>\"]

[tool.poetry.dependencies]
python = \"^3.8\"
version = \"1\"
";
        assert_eq!(
            pyproject(&ctx(), body),
            "\
[tool.poetry]
name = \"$:project_name:\"
version = \"$:starting_version:\"
authors = [\"$:author_name: <$:author_email:>\"]

[tool.poetry.dependencies]
python = \"^3.8\"
version = \"1\"
"
        );
    }

    #[test]
    fn pyproject_respects_profile_restriction() {
        let mut profile = IndexMap::new();
        profile.insert("author_name".to_string(), Some("Barney".to_string()));
        let ctx = BlueprintContext { profile: Some(&profile), ..ctx() };
        let body = "[project]\nname = \"myapp\"\nversion = \"0.1.0\"\nauthors = []\n";
        assert_eq!(
            pyproject(&ctx, body),
            "[project]\nname = \"$:project_name:\"\nversion = \"0.1.0\"\nauthors = [\"$:author_name: <$:author_email:>\"]\n"
        );
    }

    #[test]
    fn requirements_git_lines_point_at_vcs_url() {
        let body = "requests>=2\ngit+https://github.com/someone/myapp\ngit+https://github.com/x/other\n";
        assert_eq!(
            requirements(&ctx(), body),
            "requests>=2\ngit+$:version_control_url:\ngit+https://github.com/x/other\n"
        );
    }

    #[test]
    fn errors_base_class_is_tokenized() {
        let body = "class MyAppError(Exception):\n    pass\n\nclass Other(MyAppError):\n    pass\n";
        assert_eq!(
            errors(&ctx(), body),
            "class $:project_error:(Exception):\n    pass\n\nclass Other($:project_error:):\n    pass\n"
        );
    }

    #[test]
    fn errors_only_replace_whole_identifiers() {
        let body = "\
class Error(Exception):
    pass


class NotFoundError(Error):
    pass


raise Error(\"ErrorCode\")
";
        assert_eq!(
            errors(&ctx(), body),
            "\
class $:project_error:(Exception):
    pass


class NotFoundError($:project_error:):
    pass


raise $:project_error:(\"ErrorCode\")
"
        );
    }

    #[test]
    fn errors_without_class_is_unchanged() {
        let body = "# nothing here\n";
        assert_eq!(errors(&ctx(), body), body);
        assert_eq!(base_exception("class Bare:\n"), Some("Bare"));
    }

    #[test]
    fn python_layers_generic_rules() {
        let blueprint = blueprint().unwrap();
        let names: Vec<_> = blueprint.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names.first(), Some(&"readme"));
        assert!(names.contains(&"errors"));
        assert_eq!(blueprint.key(), "python");
    }
}
