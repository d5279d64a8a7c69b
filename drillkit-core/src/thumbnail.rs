//! ImageMagick-backed [`ThumbnailRenderer`].
//!
//! Rasterises page `[0]` of a PDF into a flattened JPEG next to the source
//! file (`drills/a.pdf` -> `drills/a.jpg`). The converter is `magick` when it
//! is on `PATH` (ImageMagick 7), otherwise the legacy `convert`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, error, info, warn};

use crate::contract::ThumbnailRenderer;
use crate::error::{DrillError, Result};

pub const DENSITY: u32 = 150;
pub const QUALITY: u32 = 90;
pub const MAX_WIDTH: u32 = 800;

#[derive(Debug, Clone)]
pub struct ImageMagickRenderer {
    command: String,
}

impl ImageMagickRenderer {
    /// Use an explicit converter binary.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Pick `magick` if it can be launched, else fall back to `convert`.
    pub fn detect() -> Self {
        let command = match Command::new("magick").arg("-version").output() {
            Ok(out) if out.status.success() => "magick",
            _ => "convert",
        };
        debug!(command, "Selected thumbnail converter");
        Self::new(command)
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Sibling output path: same directory and stem, `.jpg` extension.
pub fn thumbnail_path_for(source_pdf: &Path) -> PathBuf {
    source_pdf.with_extension("jpg")
}

/// The sibling path when a file already sits there and rendering would replace it.
pub fn existing_output(source_pdf: &Path) -> Option<PathBuf> {
    Some(thumbnail_path_for(source_pdf)).filter(|p| p.exists())
}

pub fn converter_args(source_pdf: &Path, output: &Path) -> Vec<String> {
    vec![
        "-density".to_string(),
        DENSITY.to_string(),
        format!("{}[0]", source_pdf.display()),
        "-quality".to_string(),
        QUALITY.to_string(),
        "-colorspace".to_string(),
        "RGB".to_string(),
        "-background".to_string(),
        "white".to_string(),
        "-alpha".to_string(),
        "remove".to_string(),
        "-resize".to_string(),
        format!("{MAX_WIDTH}x"),
        output.display().to_string(),
    ]
}

impl ThumbnailRenderer for ImageMagickRenderer {
    /// Writes `<stem>.jpg` next to the PDF. A file already at that path is
    /// overwritten, and the caller removes the image after upload.
    fn render(&self, source_pdf: &Path) -> Result<PathBuf> {
        if let Some(existing) = existing_output(source_pdf) {
            warn!(
                path = %existing.display(),
                "Thumbnail output already exists and will be overwritten then removed"
            );
        }
        let output_path = thumbnail_path_for(source_pdf);
        let args = converter_args(source_pdf, &output_path);
        info!(
            command = %self.command,
            source = %source_pdf.display(),
            output = %output_path.display(),
            "Rendering thumbnail"
        );

        match Command::new(&self.command).args(&args).output() {
            Ok(out) if out.status.success() => Ok(output_path),
            Ok(out) => {
                let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&out.stderr));
                error!(
                    command = %self.command,
                    status = %out.status,
                    output = %combined.trim(),
                    "Thumbnail converter exited with non-zero code"
                );
                // The converter may leave a partial image behind.
                let _ = std::fs::remove_file(&output_path);
                Err(DrillError::Render {
                    path: source_pdf.to_path_buf(),
                    output: format!("{} ({})", combined.trim(), out.status),
                })
            }
            Err(e) => {
                error!(error = ?e, command = %self.command, "Failed to launch thumbnail converter");
                Err(DrillError::Render {
                    path: source_pdf.to_path_buf(),
                    output: format!("failed to launch {}: {e}", self.command),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_sibling_image_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("algebra_drill.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        assert_eq!(existing_output(&pdf), None);

        std::fs::write(dir.path().join("algebra_drill.jpg"), b"operator image").unwrap();
        assert_eq!(existing_output(&pdf), Some(dir.path().join("algebra_drill.jpg")));
    }

    #[test]
    fn output_is_sibling_jpg() {
        assert_eq!(
            thumbnail_path_for(Path::new("drills/algebra_drill.pdf")),
            PathBuf::from("drills/algebra_drill.jpg")
        );
    }

    #[test]
    fn args_select_first_page_and_flatten() {
        let args = converter_args(Path::new("in.pdf"), Path::new("in.jpg"));
        assert_eq!(args[2], "in.pdf[0]");
        let has_pair = |flag: &str, value: &str| {
            args.windows(2).any(|w| w[0] == flag && w[1] == value)
        };
        assert!(has_pair("-background", "white"));
        assert!(has_pair("-alpha", "remove"));
        assert!(has_pair("-resize", "800x"));
        assert_eq!(args.last().map(String::as_str), Some("in.jpg"));
    }

    #[test]
    fn missing_converter_is_a_render_error() {
        let renderer = ImageMagickRenderer::new("drillkit-no-such-converter");
        let err = renderer.render(Path::new("whatever.pdf")).unwrap_err();
        match err {
            DrillError::Render { path, output } => {
                assert_eq!(path, PathBuf::from("whatever.pdf"));
                assert!(output.contains("drillkit-no-such-converter"));
            }
            other => panic!("expected render error, got {other:?}"),
        }
    }
}
