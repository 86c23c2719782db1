//! Build products: the files a finished toolchain run leaves behind.

use log::debug;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::BoardError;

pub trait BuildProducts {
    /// Contents of a product file.
    fn get(&self, file_name: &str) -> Result<Vec<u8>, BoardError>;

    /// Copies a product file to a temporary location that is removed when the
    /// returned handle is dropped.
    fn extract(&self, file_name: &str) -> Result<ExtractedFile, BoardError> {
        let data = self.get(file_name)?;
        ExtractedFile::create(file_name, &data)
    }
}

/// A product file materialized on disk for an external tool.
#[derive(Debug)]
pub struct ExtractedFile {
    path: TempPath,
}

impl ExtractedFile {
    fn create(file_name: &str, data: &[u8]) -> Result<Self, BoardError> {
        // Products may live in subdirectories; only the base name goes into
        // the temporary file name.
        let base_name = Path::new(file_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("ecp5_mini_")
            .suffix(&format!("_{base_name}"))
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        let path = file.into_temp_path();
        debug!("extracted {file_name} to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file now, reporting failures that `Drop` would ignore.
    pub fn close(self) -> Result<(), BoardError> {
        self.path.close()?;
        Ok(())
    }
}

/// Products read from a build directory.
#[derive(Debug, Clone)]
pub struct LocalBuildProducts {
    root: PathBuf,
}

impl LocalBuildProducts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BuildProducts for LocalBuildProducts {
    fn get(&self, file_name: &str) -> Result<Vec<u8>, BoardError> {
        std::fs::read(self.root.join(file_name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BoardError::ArtifactMissing(file_name.to_string()),
            _ => BoardError::Io(e),
        })
    }
}

/// Products held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProducts {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryProducts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(file_name.to_string(), data.into());
    }
}

impl BuildProducts for MemoryProducts {
    fn get(&self, file_name: &str) -> Result<Vec<u8>, BoardError> {
        self.files
            .get(file_name)
            .cloned()
            .ok_or_else(|| BoardError::ArtifactMissing(file_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_file_is_removed_on_drop() {
        let mut products = MemoryProducts::new();
        products.insert("top.bit", vec![0xff, 0x00, 0xe2]);

        let extracted = products.extract("top.bit").unwrap();
        let path = extracted.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xff, 0x00, 0xe2]);
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("_top.bit"));

        drop(extracted);
        assert!(!path.exists());
    }

    #[test]
    fn nested_product_extracts_under_its_base_name() {
        let mut products = MemoryProducts::new();
        products.insert("sub/top.bit", b"nested".to_vec());

        let extracted = products.extract("sub/top.bit").unwrap();
        let path = extracted.path().to_path_buf();
        assert_eq!(path.parent(), Some(std::env::temp_dir().as_path()));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("_top.bit"));
        assert_eq!(std::fs::read(&path).unwrap(), b"nested");
        extracted.close().unwrap();
    }

    #[test]
    fn local_products_extract_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("top.bit"), b"bitstream").unwrap();

        let extracted = LocalBuildProducts::new(dir.path()).extract("sub/top.bit").unwrap();
        assert_eq!(std::fs::read(extracted.path()).unwrap(), b"bitstream");
    }

    #[test]
    fn close_removes_file() {
        let mut products = MemoryProducts::new();
        products.insert("top.bit", b"bits".to_vec());
        let extracted = products.extract("top.bit").unwrap();
        let path = extracted.path().to_path_buf();
        extracted.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_product_is_a_lookup_error() {
        let products = MemoryProducts::new();
        assert!(matches!(
            products.extract("top.bit"),
            Err(BoardError::ArtifactMissing(name)) if name == "top.bit"
        ));
    }

    #[test]
    fn local_products_read_build_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blinky.bit"), b"bitstream").unwrap();
        let products = LocalBuildProducts::new(dir.path());

        assert_eq!(products.get("blinky.bit").unwrap(), b"bitstream");
        assert!(matches!(products.get("other.bit"), Err(BoardError::ArtifactMissing(_))));
    }
}
