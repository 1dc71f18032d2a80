//! Platform adapters for the core capability traits.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use clarifymd_core::{Narrator, TextExtractor};
use clarifymd_shared::{ClarifyError, Result};
use tracing::{debug, error, warn};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "heic", "gif", "bmp", "tif", "tiff", "webp"];

// ---------------------------------------------------------------------------
// FileTextExtractor
// ---------------------------------------------------------------------------

/// Reads text out of local files: plain text directly, PDFs via `pdf-extract`.
///
/// There is no OCR engine behind this extractor, so images yield no text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    fn extract_pdf(path: &Path, bytes: &[u8]) -> Option<String> {
        // pdf-extract can panic on malformed fonts.
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        })) {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "PDF extraction failed");
                None
            }
            Err(_) => {
                error!(path = %path.display(), "PDF extraction panicked");
                None
            }
        }
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract_text_from_image(&self, image: &[u8]) -> String {
        warn!(bytes = image.len(), "no OCR engine available; image skipped");
        String::new()
    }

    fn extract_text_from_document(&self, path: &Path) -> Option<String> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read input file");
                return None;
            }
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = if extension == "pdf" {
            Self::extract_pdf(path, &bytes)?
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            self.extract_text_from_image(&bytes)
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(path = %path.display(), "input file is not UTF-8 text");
                    return None;
                }
            }
        };

        let text = text.trim();
        debug!(path = %path.display(), chars = text.len(), "extracted text");
        (!text.is_empty()).then(|| text.to_string())
    }
}

// ---------------------------------------------------------------------------
// CommandNarrator
// ---------------------------------------------------------------------------

/// Pipes text into a system speech command.
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `say` on macOS, `espeak` (Portuguese voice) elsewhere.
    pub fn system() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say", &[])
        } else {
            Self::new("espeak", &["-v", "pt-br", "--stdin"])
        }
    }
}

impl Narrator for CommandNarrator {
    fn narrate(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| ClarifyError::io(&self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command that exits early closes the pipe; its status says why.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ClarifyError::io(&self.program, e));
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ClarifyError::io(&self.program, e))?;
        if !status.success() {
            return Err(ClarifyError::Pipeline(format!(
                "speech command '{}' exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}
