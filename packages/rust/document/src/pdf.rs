//! PDF byte-to-text extraction.

use tailor_shared::{Result, TailorError};
use tracing::debug;

/// Extract the text layer of a PDF.
///
/// `pdf-extract` can panic on malformed input; that is reported as an
/// extraction error for the one document rather than taking down a batch.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    if !bytes.starts_with(b"%PDF") {
        return Err(TailorError::Extraction(
            "not a PDF (missing %PDF header)".into(),
        ));
    }

    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match outcome {
        Ok(Ok(text)) => {
            debug!(bytes = bytes.len(), chars = text.len(), "pdf text extracted");
            Ok(text)
        }
        Ok(Err(e)) => Err(TailorError::Extraction(format!("pdf extraction failed: {e}"))),
        Err(_) => Err(TailorError::Extraction(
            "pdf extraction panicked on malformed document".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = extract_pdf_text(b"<html>not a pdf</html>").unwrap_err();
        assert!(matches!(err, TailorError::Extraction(_)));
        assert!(err.to_string().contains("%PDF"));
    }

    #[test]
    fn truncated_pdf_is_an_error_not_a_panic() {
        let result = extract_pdf_text(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(result.is_err());
    }
}
