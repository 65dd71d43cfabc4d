//! Marker icon asset loading.
//!
//! Loading is a trait seam so the engine can be exercised without assets
//! on disk, and so a failing load degrades to the drawn fallback shape
//! instead of failing the capture.

use std::path::PathBuf;

use image::RgbaImage;

use clip_core::state::IconVariant;

use crate::errors::AssetError;

/// Source of marker icon images.
pub trait IconLoader: Send + Sync {
    /// Load the icon for a variant. Errors are recovered by the caller via
    /// the fallback marker; they never surface past the engine.
    fn load(&self, variant: IconVariant) -> Result<RgbaImage, AssetError>;
}

/// Loads `marker-{variant}.png` from an assets directory.
pub struct FileIconLoader {
    assets_dir: PathBuf,
}

impl FileIconLoader {
    /// Create a loader rooted at the given directory.
    #[must_use]
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    fn asset_path(&self, variant: IconVariant) -> PathBuf {
        self.assets_dir
            .join(format!("marker-{}.png", variant.asset_stem()))
    }
}

impl IconLoader for FileIconLoader {
    fn load(&self, variant: IconVariant) -> Result<RgbaImage, AssetError> {
        let path = self.asset_path(variant);
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path)?;
        let img = image::load_from_memory(&bytes)?;
        Ok(img.to_rgba8())
    }
}

/// A loader with no assets; every load fails, forcing the fallback shape.
///
/// The default for sessions that ship without icon files.
pub struct NoIcons;

impl IconLoader for NoIcons {
    fn load(&self, variant: IconVariant) -> Result<RgbaImage, AssetError> {
        Err(AssetError::NotFound(format!(
            "no assets bundled (variant {})",
            variant.asset_stem()
        )))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
