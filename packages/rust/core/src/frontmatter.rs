//! Reading generated examples back: metadata extraction and shape checks.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::template::{REQUIRED_FRONTMATTER_KEYS, SECTION_HEADINGS};

const DELIMITER: &str = "---";

/// Metadata recovered from a generated example's frontmatter.
///
/// Every field is optional: extraction is best-effort and never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedMetadata {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub date: Option<String>,
    pub link: Option<String>,
    pub id: Option<u32>,
}

/// Split `markdown` into (frontmatter, body) when it opens with a `---` block.
pub fn split_frontmatter(markdown: &str) -> Option<(&str, &str)> {
    let rest = markdown.trim_start().strip_prefix(DELIMITER)?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let rest = rest.strip_prefix('\n')?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Frontmatter as the model wrote it. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    authors: Option<AuthorsField>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    link: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

/// `authors` as a YAML list, or a single scalar naming one author.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorsField {
    List(Vec<Value>),
    One(Value),
}

/// Pull title, authors, date, link and id out of the frontmatter.
///
/// Frontmatter that is missing or not valid YAML yields empty metadata.
pub fn extract_metadata(markdown: &str) -> GeneratedMetadata {
    let Some((frontmatter, _)) = split_frontmatter(markdown) else {
        return GeneratedMetadata::default();
    };

    let raw: RawFrontmatter = match serde_yaml::from_str(frontmatter) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "generated frontmatter is not valid YAML");
            return GeneratedMetadata::default();
        }
    };

    let authors = raw.authors.map(|field| match field {
        AuthorsField::List(items) => items.iter().filter_map(scalar).collect(),
        AuthorsField::One(value) => scalar(&value).into_iter().collect(),
    });

    GeneratedMetadata {
        title: raw.title.as_ref().and_then(scalar),
        authors: authors.filter(|list: &Vec<String>| !list.is_empty()),
        date: raw.date.as_ref().and_then(scalar),
        link: raw.link.as_ref().and_then(scalar),
        id: raw.id.as_ref().and_then(numeric_id),
    }
}

/// A non-empty scalar rendered as text.
fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn numeric_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Template conformance
// ---------------------------------------------------------------------------

/// A way a generated example deviates from the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateIssue {
    MissingFrontmatter,
    InvalidFrontmatter(String),
    MissingKey(&'static str),
    InvalidDate(String),
    MissingSection(&'static str),
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFrontmatter => write!(f, "no frontmatter block"),
            Self::InvalidFrontmatter(reason) => write!(f, "frontmatter is not a YAML mapping: {reason}"),
            Self::MissingKey(key) => write!(f, "frontmatter lacks `{key}`"),
            Self::InvalidDate(date) => write!(f, "date `{date}` is not YYYY-MM-DD"),
            Self::MissingSection(heading) => write!(f, "missing section `## {heading}`"),
        }
    }
}

/// Compare a generated example against the template's required shape.
///
/// An empty result means the example conforms.
pub fn validate_example(markdown: &str) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();

    let Some((frontmatter, body)) = split_frontmatter(markdown) else {
        issues.push(TemplateIssue::MissingFrontmatter);
        issues.extend(missing_sections(markdown));
        return issues;
    };

    match serde_yaml::from_str::<Value>(frontmatter) {
        Ok(mapping @ Value::Mapping(_)) => {
            for key in REQUIRED_FRONTMATTER_KEYS {
                if mapping.get(*key).is_none() {
                    issues.push(TemplateIssue::MissingKey(*key));
                }
            }
        }
        Ok(_) => issues.push(TemplateIssue::InvalidFrontmatter("not a mapping".into())),
        Err(e) => issues.push(TemplateIssue::InvalidFrontmatter(e.to_string())),
    }

    if let Some(date) = extract_metadata(markdown).date {
        if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
            issues.push(TemplateIssue::InvalidDate(date));
        }
    }

    issues.extend(missing_sections(body));
    issues
}

fn missing_sections(body: &str) -> impl Iterator<Item = TemplateIssue> + '_ {
    SECTION_HEADINGS
        .iter()
        .filter(move |heading| {
            let wanted = format!("## {heading}");
            !body.lines().any(|line| line.trim_end() == wanted)
        })
        .map(|heading| TemplateIssue::MissingSection(*heading))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "---
title: Optimisation for a Fleet of Healthcare Vehicles
authors:
    - Sarah Thomson
    - \"Markus Wagner\"
date: 2024-07-14
link: https://dl.acm.org/doi/abs/10.1145/3638530.3664137
id: 1
---

# [Optimisation for a Fleet of Healthcare Vehicles](https://dl.acm.org/doi/abs/10.1145/3638530.3664137)

## Problem Description

Trips.

## Why was tailoring needed?

Constraints.

## Baseline algorithm

Local search.

## Tailoring process

Operators.

## What was tailored

Mutation.

## Main problem characteristics

Constrained.

## References

_No response_

## Author

Sarah Thomson, Markus Wagner
";

    #[test]
    fn extracts_frontmatter_fields() {
        let meta = extract_metadata(EXAMPLE);
        assert_eq!(
            meta.title.as_deref(),
            Some("Optimisation for a Fleet of Healthcare Vehicles")
        );
        assert_eq!(
            meta.authors,
            Some(vec!["Sarah Thomson".to_string(), "Markus Wagner".to_string()])
        );
        assert_eq!(meta.date.as_deref(), Some("2024-07-14"));
        assert_eq!(
            meta.link.as_deref(),
            Some("https://dl.acm.org/doi/abs/10.1145/3638530.3664137")
        );
        assert_eq!(meta.id, Some(1));
    }

    #[test]
    fn inline_author_list() {
        let meta = extract_metadata("---\nauthors: [A, 'B']\n---\nbody");
        assert_eq!(meta.authors, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn quoted_authors_keep_their_commas() {
        let meta = extract_metadata(
            "---\nauthors: [\"Thomson, Sarah\", \"Wagner, Markus\"]\nid: \"4\"\n---\nbody",
        );
        assert_eq!(
            meta.authors,
            Some(vec!["Thomson, Sarah".to_string(), "Wagner, Markus".to_string()])
        );
        assert_eq!(meta.id, Some(4));
    }

    #[test]
    fn folded_title_is_joined() {
        let meta = extract_metadata(
            "---\ntitle: >-\n  Optimisation for a Fleet\n  of Healthcare Vehicles\nauthors: Sarah Thomson\n---\n",
        );
        assert_eq!(
            meta.title.as_deref(),
            Some("Optimisation for a Fleet of Healthcare Vehicles")
        );
        assert_eq!(meta.authors, Some(vec!["Sarah Thomson".to_string()]));
    }

    #[test]
    fn invalid_yaml_yields_empty_metadata() {
        let meta = extract_metadata("---\ntitle: [unclosed\nid: 2\n---\nbody");
        assert_eq!(meta, GeneratedMetadata::default());
        assert!(matches!(
            validate_example("---\ntitle: [unclosed\n---\n")[0],
            TemplateIssue::InvalidFrontmatter(_)
        ));
    }

    #[test]
    fn no_frontmatter_yields_empty_metadata() {
        assert_eq!(extract_metadata("# Just a heading"), GeneratedMetadata::default());
        assert_eq!(extract_metadata("---\ntitle: never closed"), GeneratedMetadata::default());
    }

    #[test]
    fn conforming_example_has_no_issues() {
        assert!(validate_example(EXAMPLE).is_empty());
    }

    #[test]
    fn reports_missing_keys_sections_and_bad_dates() {
        let broken = EXAMPLE
            .replace("id: 1\n", "")
            .replace("date: 2024-07-14", "date: July 2024")
            .replace("## Baseline algorithm\n", "");

        let issues = validate_example(&broken);

        assert!(issues.contains(&TemplateIssue::MissingKey("id")));
        assert!(issues.contains(&TemplateIssue::InvalidDate("July 2024".into())));
        assert!(issues.contains(&TemplateIssue::MissingSection("Baseline algorithm")));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn missing_frontmatter_is_reported() {
        let issues = validate_example("Sorry, I cannot do that.");
        assert_eq!(issues[0], TemplateIssue::MissingFrontmatter);
        assert_eq!(issues.len(), 1 + SECTION_HEADINGS.len());
    }
}
