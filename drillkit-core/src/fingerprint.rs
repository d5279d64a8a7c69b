//! Content fingerprints and the storage keys derived from them.
//!
//! Keys are a pure function of the PDF bytes, so identical content always
//! lands on the same objects and the same public URL. The thumbnail reuses
//! the PDF's hash so both objects of a drill share one identity.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

pub const PDF_PREFIX: &str = "pdf";
pub const THUMBNAIL_PREFIX: &str = "thumbnail";

/// Lower-case hex SHA-256 of a file's raw bytes.
pub fn file_fingerprint(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Storage keys for one drill's PDF and thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub pdf: String,
    pub thumbnail: String,
}

impl StorageKeys {
    pub fn from_fingerprint(fingerprint: &str) -> Self {
        StorageKeys {
            pdf: format!("{PDF_PREFIX}/{fingerprint}.pdf"),
            thumbnail: format!("{THUMBNAIL_PREFIX}/{fingerprint}.jpg"),
        }
    }
}
