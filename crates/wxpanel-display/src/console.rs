//! Host-side collaborators: a surface that logs, and icons read from a directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wxpanel_core::{DisplayConfig, DisplayError};

use crate::surface::{AssetStore, DisplaySurface, Field, ImageHandle};

/// Surface that reports every update through tracing.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    next_handle: u64,
    /// Byte size of each live image
    images: HashMap<ImageHandle, usize>,
    shown: Option<ImageHandle>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_images(&self) -> usize {
        self.images.len()
    }
}

impl DisplaySurface for ConsoleSurface {
    fn set_text(&mut self, field: Field, text: &str) -> Result<(), DisplayError> {
        tracing::info!(field = field.as_str(), "{}", text);
        Ok(())
    }

    fn create_image(&mut self, data: &[u8]) -> Result<ImageHandle, DisplayError> {
        if data.is_empty() {
            return Err(DisplayError::ImageRejected("empty image data".to_string()));
        }
        self.next_handle += 1;
        let handle = ImageHandle(self.next_handle);
        self.images.insert(handle, data.len());
        Ok(handle)
    }

    fn show_image(&mut self, handle: ImageHandle) -> Result<(), DisplayError> {
        let Some(size) = self.images.get(&handle) else {
            return Err(DisplayError::UpdateFailed(format!(
                "unknown image handle {}",
                handle.0
            )));
        };
        tracing::info!(field = "icon", "image #{} ({} bytes)", handle.0, size);
        self.shown = Some(handle);
        Ok(())
    }

    fn release_image(&mut self, handle: ImageHandle) {
        if self.images.remove(&handle).is_none() {
            tracing::warn!("Release of unknown image handle {}", handle.0);
        }
        if self.shown == Some(handle) {
            self.shown = None;
        }
    }
}

/// Reads `<dir>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    dir: PathBuf,
    extension: String,
}

impl DirAssetStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(&config.asset_dir, &config.asset_extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }
}

impl AssetStore for DirAssetStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, DisplayError> {
        // Asset names come from the static condition table, but stay inside the dir anyway.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(DisplayError::AssetNotFound(name.to_string()));
        }

        let path = self.path_for(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DisplayError::AssetNotFound(path.display().to_string()),
            _ => DisplayError::AssetRead {
                name: name.to_string(),
                message: e.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_named_asset() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sunny.bin"), [1u8, 2, 3]).unwrap();

        let store = DirAssetStore::new(dir.path(), "bin");
        assert_eq!(store.read("sunny").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_asset() {
        let dir = TempDir::new().unwrap();
        let store = DirAssetStore::new(dir.path(), "bin");
        assert!(matches!(
            store.read("fog"),
            Err(DisplayError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let store = DirAssetStore::new(dir.path(), "bin");
        assert!(store.read("../secret").is_err());
        assert!(store.read("").is_err());
    }

    #[test]
    fn test_console_surface_tracks_images() {
        let mut surface = ConsoleSurface::new();
        let a = surface.create_image(b"icon-a").unwrap();
        let b = surface.create_image(b"icon-b").unwrap();
        assert_ne!(a, b);
        assert_eq!(surface.live_images(), 2);

        surface.show_image(a).unwrap();
        surface.release_image(a);
        assert_eq!(surface.live_images(), 1);
        assert!(surface.show_image(a).is_err());

        assert!(surface.create_image(&[]).is_err());
        surface.set_text(Field::Title, "Sunny").unwrap();
    }
}
