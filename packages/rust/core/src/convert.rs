//! Convert stage: cached source documents → cached text.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use tailor_document::{DocumentSource, SOURCE_EXTENSION};
use tailor_shared::{Result, TailorError, file_stem, write_atomic};

use crate::progress::ProgressReporter;
use crate::{file_name, files_with_extension};

/// Extension of cached text files.
pub const TEXT_EXTENSION: &str = "md";

/// Extract text for every source document that has no cached text yet.
///
/// Returns every text path available afterwards, existing and new, in
/// source order. A document that fails to extract is logged and skipped.
#[instrument(skip_all, fields(source_dir = %source_dir.display(), text_dir = %text_dir.display()))]
pub fn convert_all(
    source: &dyn DocumentSource,
    source_dir: &Path,
    text_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>> {
    let documents = files_with_extension(source_dir, SOURCE_EXTENSION)?;
    std::fs::create_dir_all(text_dir).map_err(|e| TailorError::io(text_dir, e))?;

    progress.phase("Converting documents");
    let total = documents.len();
    let mut available = Vec::with_capacity(total);
    let mut converted = 0usize;

    for (i, document) in documents.iter().enumerate() {
        let name = file_name(document);
        let target = text_dir.join(format!("{}.{TEXT_EXTENSION}", file_stem(&name)));
        progress.item(i + 1, total, &name);

        if target.exists() {
            available.push(target);
            continue;
        }

        match convert_one(source, document, &target) {
            Ok(()) => {
                converted += 1;
                available.push(target);
            }
            Err(e) => {
                warn!(document = %name, error = %e, "conversion failed, skipping");
                progress.item_failed(&name, &e);
            }
        }
    }

    info!(
        documents = total,
        converted,
        available = available.len(),
        "conversion completed"
    );
    progress.done(&format!("{} of {total} documents have text", available.len()));

    Ok(available)
}

fn convert_one(source: &dyn DocumentSource, document: &Path, target: &Path) -> Result<()> {
    let bytes = std::fs::read(document).map_err(|e| TailorError::io(document, e))?;
    let text = source.extract_text(&bytes)?;
    write_atomic(target, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SilentProgress;
    use crate::testing::{MapSource, temp_dir};
    use tailor_shared::partial_path;

    #[test]
    fn converts_missing_and_keeps_existing() {
        let root = temp_dir("convert");
        let pdfs = root.join("pdfs");
        let md = root.join("md");
        std::fs::create_dir_all(&pdfs).unwrap();
        std::fs::create_dir_all(&md).unwrap();
        std::fs::write(pdfs.join("b.pdf"), "fresh text").unwrap();
        std::fs::write(pdfs.join("a.pdf"), "ignored").unwrap();
        std::fs::write(pdfs.join("notes.txt"), "not a document").unwrap();
        std::fs::write(md.join("a.md"), "already converted").unwrap();

        let paths = convert_all(&MapSource::default(), &pdfs, &md, &SilentProgress).unwrap();

        assert_eq!(paths, vec![md.join("a.md"), md.join("b.md")]);
        assert_eq!(std::fs::read_to_string(md.join("a.md")).unwrap(), "already converted");
        assert_eq!(std::fs::read_to_string(md.join("b.md")).unwrap(), "fresh text");
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn failed_extraction_does_not_stop_batch() {
        let root = temp_dir("convert-fail");
        let pdfs = root.join("pdfs");
        let md = root.join("md");
        std::fs::create_dir_all(&pdfs).unwrap();
        std::fs::write(pdfs.join("bad.pdf"), [0xff, 0xfe, 0xfd]).unwrap();
        std::fs::write(pdfs.join("good.pdf"), "text").unwrap();

        let paths = convert_all(&MapSource::default(), &pdfs, &md, &SilentProgress).unwrap();

        assert_eq!(paths, vec![md.join("good.md")]);
        assert!(!md.join("bad.md").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_source_dir_converts_nothing() {
        let root = temp_dir("convert-empty");
        let paths = convert_all(
            &MapSource::default(),
            &root.join("nope"),
            &root.join("md"),
            &SilentProgress,
        )
        .unwrap();
        assert!(paths.is_empty());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn interrupted_write_is_redone() {
        let root = temp_dir("convert-partial");
        let pdfs = root.join("pdfs");
        let md = root.join("md");
        std::fs::create_dir_all(&pdfs).unwrap();
        std::fs::create_dir_all(&md).unwrap();
        std::fs::write(pdfs.join("fleet.pdf"), "complete paper text").unwrap();
        std::fs::write(partial_path(&md.join("fleet.md")), "compl").unwrap();

        let paths = convert_all(&MapSource::default(), &pdfs, &md, &SilentProgress).unwrap();

        assert_eq!(paths, vec![md.join("fleet.md")]);
        assert_eq!(
            std::fs::read_to_string(md.join("fleet.md")).unwrap(),
            "complete paper text"
        );
        assert!(!partial_path(&md.join("fleet.md")).exists());
        std::fs::remove_dir_all(&root).ok();
    }
}
