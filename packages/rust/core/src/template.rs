//! The worked-example prompt that fixes the shape of a generated example.

use std::path::Path;

use tracing::warn;

use tailor_shared::{Result, TailorError};

const BUILTIN_TEMPLATE: &str = include_str!("../templates/example_prompt.md");

/// Placeholder replaced with the example's numeric id.
pub const PAPER_ID_PLACEHOLDER: &str = "{paper_id}";
/// Placeholder replaced with the known-metadata hint block.
pub const METADATA_PLACEHOLDER: &str = "{metadata_block}";

/// Frontmatter keys every generated example must carry.
pub const REQUIRED_FRONTMATTER_KEYS: &[&str] = &["title", "authors", "date", "link", "id"];

/// Level-two headings every generated example must carry, in order.
pub const SECTION_HEADINGS: &[&str] = &[
    "Problem Description",
    "Why was tailoring needed?",
    "Baseline algorithm",
    "Tailoring process",
    "What was tailored",
    "Main problem characteristics",
    "References",
    "Author",
];

/// Immutable prompt template, loaded once and shared by every generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleTemplate {
    text: String,
}

impl Default for ExampleTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExampleTemplate {
    /// The template compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            text: BUILTIN_TEMPLATE.to_string(),
        }
    }

    /// Load a replacement template from disk.
    ///
    /// The file must contain the `{paper_id}` placeholder; a missing
    /// `{metadata_block}` only means the hint block is not sent.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TailorError::io(path, e))?;
        if !text.contains(PAPER_ID_PLACEHOLDER) {
            return Err(TailorError::validation(format!(
                "template {} lacks the {PAPER_ID_PLACEHOLDER} placeholder",
                path.display()
            )));
        }
        if !text.contains(METADATA_PLACEHOLDER) {
            warn!(path = %path.display(), "template has no {{metadata_block}} placeholder");
        }
        Ok(Self { text })
    }

    /// Built-in template, or the file at `path` when one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill in the placeholders.
    pub fn render(&self, paper_id: u32, metadata_block: &str) -> String {
        self.text
            .replace(PAPER_ID_PLACEHOLDER, &paper_id.to_string())
            .replace(METADATA_PLACEHOLDER, metadata_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_dir;

    #[test]
    fn builtin_has_placeholders_and_sections() {
        let template = ExampleTemplate::builtin();
        assert!(template.text().contains(PAPER_ID_PLACEHOLDER));
        assert!(template.text().ends_with(METADATA_PLACEHOLDER));
        for heading in SECTION_HEADINGS {
            assert!(
                template.text().contains(&format!("## {heading}")),
                "missing {heading}"
            );
        }
    }

    #[test]
    fn render_substitutes_placeholders() {
        let rendered = ExampleTemplate::builtin().render(7, "\n- Title: X");
        assert!(rendered.contains("- Use id: 7"));
        assert!(rendered.ends_with("\n- Title: X"));
        assert!(!rendered.contains(PAPER_ID_PLACEHOLDER));
        assert!(!rendered.contains(METADATA_PLACEHOLDER));
    }

    #[test]
    fn from_file_requires_id_placeholder() {
        let dir = temp_dir("template");
        let good = dir.join("good.md");
        let bad = dir.join("bad.md");
        std::fs::write(&good, "id: {paper_id}{metadata_block}").unwrap();
        std::fs::write(&bad, "no placeholders").unwrap();

        assert_eq!(
            ExampleTemplate::from_file(&good).unwrap().render(2, "!"),
            "id: 2!"
        );
        assert!(ExampleTemplate::from_file(&bad).is_err());
        assert_eq!(ExampleTemplate::load(None).unwrap(), ExampleTemplate::builtin());
        std::fs::remove_dir_all(&dir).ok();
    }
}
