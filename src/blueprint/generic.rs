//! Rules shared by every language blueprint.

use super::{apply_line_mapping, resolve_mapping, Blueprint, BlueprintContext, Rule};
use crate::constants::tokens;
use crate::error::Result;

pub const KEY: &str = "generic";

/// Sentence added to the acknowledgements section of a templated README.
pub const ACKNOWLEDGEMENT: &str =
    "This project was created in part by the stencil project templating utility.";

const DOCS_ATTR_MAPPING: &[(&str, &str)] = &[
    ("project", "\"$:project_name:\""),
    ("copyright", "\"$:project_year:, $:author_name:\""),
    ("author", "\"$:author_name:\""),
    ("release", "$:project_slug:.__version__"),
];

pub fn rules() -> Result<Vec<Rule>> {
    Ok(vec![
        Rule::new("readme", &["README"], readme)?,
        Rule::new("license", &["LICEN[SC]E", "COPYING"], license)?,
        Rule::new("contributing", &["CONTRIBUTING"], contributing)?,
        Rule::new("docs_config", &[r"docs/(source/)?conf\.py$"], docs_config)?,
    ])
}

pub fn blueprint() -> Result<Blueprint> {
    Ok(Blueprint::new(KEY, rules()?))
}

fn is_acknowledgements_heading(line: &str) -> bool {
    line.starts_with('#') && line.to_lowercase().contains("acknowledgements")
}

fn readme(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let mut lines: Vec<String> = body.split('\n').map(str::to_string).collect();

    if !body.contains(ACKNOWLEDGEMENT) {
        match lines.iter().position(|l| is_acknowledgements_heading(l)) {
            Some(heading) => {
                let next = lines
                    .iter()
                    .skip(heading + 1)
                    .position(|l| l.starts_with('#'))
                    .map(|offset| heading + 1 + offset);
                match next {
                    Some(at) => {
                        lines.insert(at, ACKNOWLEDGEMENT.to_string());
                        lines.insert(at + 1, String::new());
                    }
                    None => lines.extend([ACKNOWLEDGEMENT.to_string(), String::new()]),
                }
            }
            None => lines.extend(
                ["## Acknowledgements", "", ACKNOWLEDGEMENT, ""].map(str::to_string),
            ),
        }
    }

    ctx.replace_names(&lines.join("\n"))
}

fn license(_: &BlueprintContext<'_>, _: &str) -> String {
    tokens::PROJECT_LICENSE.to_string()
}

fn contributing(ctx: &BlueprintContext<'_>, body: &str) -> String {
    ctx.replace_names(body)
}

fn docs_config(ctx: &BlueprintContext<'_>, body: &str) -> String {
    let mapping = resolve_mapping(DOCS_ATTR_MAPPING, ctx.profile);
    let import = format!("import {}", ctx.project_slug);
    let mut in_project_info = false;

    body.split('\n')
        .map(|line| {
            if in_project_info {
                if line.starts_with("# --") {
                    in_project_info = false;
                    return line.to_string();
                }
                apply_line_mapping(line, &mapping)
            } else if line.starts_with("# -- Project information") {
                in_project_info = true;
                line.to_string()
            } else if line.trim() == import {
                format!("import {}", tokens::PROJECT_SLUG)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx() -> BlueprintContext<'static> {
        BlueprintContext { project_name: "MyApp", project_slug: "myapp", profile: None }
    }

    fn ack_count(body: &str) -> usize {
        body.matches(ACKNOWLEDGEMENT).count()
    }

    #[test]
    fn readme_without_section_gets_one_appended() {
        let out = readme(&ctx(), "# MyApp\n\nUse myapp today.\n");
        assert_eq!(
            out,
            format!(
                "# $:project_name:\n\nUse $:project_slug: today.\n\n## Acknowledgements\n\n{ACKNOWLEDGEMENT}\n"
            )
        );
    }

    #[test]
    fn readme_section_gets_sentence_before_next_heading() {
        let body = "# MyApp\n\n## Acknowledgements\n\nThanks to all.\n\n## License\n\nMIT\n";
        let out = readme(&ctx(), body);
        assert_eq!(ack_count(&out), 1);
        let ack_at = out.find(ACKNOWLEDGEMENT).unwrap();
        assert!(ack_at > out.find("Thanks to all.").unwrap());
        assert!(ack_at < out.find("## License").unwrap());
    }

    #[test]
    fn readme_section_at_end_of_file() {
        let out = readme(&ctx(), "# MyApp\n\n## Acknowledgements\n\nThanks.\n");
        assert!(out.ends_with(&format!("Thanks.\n\n{ACKNOWLEDGEMENT}\n")));
        assert!(!out.contains("## Acknowledgements\n\n## Acknowledgements"));
    }

    #[test]
    fn readme_rule_is_idempotent() {
        let once = readme(&ctx(), "# MyApp\n");
        let reverted = once.replace("$:project_name:", "MyApp").replace("$:project_slug:", "myapp");
        let twice = readme(&ctx(), &reverted);
        assert_eq!(ack_count(&twice), 1);
        assert_eq!(twice, once);
    }

    #[test]
    fn license_becomes_token() {
        assert_eq!(license(&ctx(), "MIT License\n\nCopyright..."), "$:project_license:");
        let rules = rules().unwrap();
        let rule = rules.iter().find(|r| r.name() == "license").unwrap();
        assert!(rule.matches("LICENSE"));
        assert!(rule.matches("LICENCE.txt"));
        assert!(rule.matches("COPYING"));
        assert!(!rule.matches("docs/LICENSE"));
    }

    #[test]
    fn docs_config_rewrites_project_information_only() {
        let body = "\
import os
import myapp

# -- Project information -----
project = 'MyApp'
copyright = '2021, Someone'
author = 'Someone'
release = myapp.__version__

# -- General configuration -----
project = 'untouched'
";
        let out = docs_config(&ctx(), body);
        assert_eq!(
            out,
            "\
import os
import $:project_slug:

# -- Project information -----
project = \"$:project_name:\"
copyright = \"$:project_year:, $:author_name:\"
author = \"$:author_name:\"
release = $:project_slug:.__version__

# -- General configuration -----
project = 'untouched'
"
        );
    }

    #[test]
    fn docs_config_respects_profile_restriction() {
        let profile: IndexMap<String, Option<String>> = IndexMap::new();
        let ctx = BlueprintContext { profile: Some(&profile), ..ctx() };
        let body = "# -- Project information\nproject = 'MyApp'\nauthor = 'Someone'\n";
        let out = docs_config(&ctx, body);
        assert_eq!(
            out,
            "# -- Project information\nproject = \"$:project_name:\"\nauthor = 'Someone'\n"
        );
    }
}
