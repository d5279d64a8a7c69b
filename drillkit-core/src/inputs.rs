//! Expands `register` arguments into the list of PDF files to process.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Directories contribute their direct `.pdf` children, sorted by path.
/// Every other argument is a glob pattern (a plain path is a pattern that
/// matches itself); its existing `.pdf` file matches are kept in glob order.
/// Patterns that match nothing, invalid patterns and non-PDF matches are
/// skipped, so the result may be empty.
pub fn collect_pdf_inputs(args: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for arg in args {
        if arg.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(arg)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_pdf(p))
                .collect();
            found.sort();
            debug!(dir = %arg.display(), count = found.len(), "Scanned directory for PDFs");
            pdfs.extend(found);
        } else {
            pdfs.extend(expand_pattern(arg));
        }
    }
    Ok(pdfs)
}

fn expand_pattern(arg: &Path) -> Vec<PathBuf> {
    let Some(pattern) = arg.to_str() else {
        // Not valid UTF-8, so it cannot be a pattern; take it literally.
        return if arg.is_file() && is_pdf(arg) {
            vec![arg.to_path_buf()]
        } else {
            warn!(path = %arg.display(), "Skipping input");
            Vec::new()
        };
    };

    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid glob pattern");
            return Vec::new();
        }
    };

    let mut matched = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && is_pdf(&path) => matched.push(path),
            Ok(path) => warn!(path = %path.display(), "Skipping non-PDF input"),
            Err(e) => warn!(pattern, error = %e, "Unreadable glob match"),
        }
    }
    if matched.is_empty() {
        warn!(pattern, "No PDF files match input");
    }
    matched
}
