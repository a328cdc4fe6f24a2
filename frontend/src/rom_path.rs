//! ROM file loading: a raw image on disk, or the first file inside a ZIP
//! archive.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum RomLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The archive could not be parsed.
    InvalidArchive(String),

    /// The archive holds no files.
    EmptyArchive(PathBuf),
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidArchive(e) => write!(f, "invalid ZIP: {e}"),
            Self::EmptyArchive(path) => write!(f, "no ROM file inside {}", path.display()),
        }
    }
}

impl std::error::Error for RomLoadError {}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<zip::result::ZipError> for RomLoadError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::InvalidArchive(e.to_string())
    }
}

/// Read the ROM image at `path`.
///
/// Paths ending in `.zip` are opened as archives and the first non-directory
/// entry is used; anything else is read as-is.
pub fn load_rom(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    {
        return load_from_zip(path);
    }
    Ok(std::fs::read(path)?)
}

fn load_from_zip(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        log::info!("Using {} from {}", entry.name(), path.display());
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        return Ok(data);
    }

    Err(RomLoadError::EmptyArchive(path.to_path_buf()))
}
