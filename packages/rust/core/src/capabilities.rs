//! Platform capabilities the pipeline consumes but does not implement.
//!
//! Adapters live with the surface that owns the platform (see the CLI).

use std::path::Path;

use clarifymd_shared::Result;

/// Best-effort text extraction from images and documents.
///
/// Extraction never fails into the pipeline: unreadable input yields empty
/// or absent text and the caller decides what to submit.
pub trait TextExtractor: Send + Sync {
    /// Recognized text in `image`, or an empty string.
    fn extract_text_from_image(&self, image: &[u8]) -> String;

    /// Full text of the document at `path`, or `None` when it cannot be read.
    fn extract_text_from_document(&self, path: &Path) -> Option<String>;
}

/// Reads text aloud.
pub trait Narrator: Send + Sync {
    fn narrate(&self, text: &str) -> Result<()>;
}

/// Build a request from typed text plus any number of extracted documents.
///
/// Documents that yield nothing are skipped.
pub fn gather_text<'a, E, I>(extractor: &E, typed: Option<&str>, documents: I) -> Vec<String>
where
    E: TextExtractor + ?Sized,
    I: IntoIterator<Item = &'a Path>,
{
    let mut parts: Vec<String> = typed.map(str::to_string).into_iter().collect();
    parts.extend(
        documents
            .into_iter()
            .filter_map(|path| extractor.extract_text_from_document(path)),
    );
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarifymd_shared::AnalysisRequest;

    struct FixedExtractor;

    impl TextExtractor for FixedExtractor {
        fn extract_text_from_image(&self, _image: &[u8]) -> String {
            String::new()
        }

        fn extract_text_from_document(&self, path: &Path) -> Option<String> {
            match path.to_str() {
                Some("laudo.pdf") => Some("Hipertensão arterial sistêmica".into()),
                _ => None,
            }
        }
    }

    #[test]
    fn gather_skips_unreadable_documents() {
        let docs = [Path::new("laudo.pdf"), Path::new("missing.pdf")];
        let parts = gather_text(&FixedExtractor, Some("Paciente refere dor"), docs);
        assert_eq!(
            parts,
            vec!["Paciente refere dor", "Hipertensão arterial sistêmica"]
        );

        let request = AnalysisRequest::compose(parts);
        assert_eq!(
            request.text,
            "Paciente refere dor\nHipertensão arterial sistêmica"
        );
    }

    #[test]
    fn gather_without_typed_text() {
        let parts = gather_text(&FixedExtractor, None, [Path::new("laudo.pdf")]);
        assert_eq!(parts.len(), 1);
    }
}
