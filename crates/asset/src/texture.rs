//! Texture decoding to RGBA8 for GPU upload.

use std::path::Path;

use anyhow::{Context, Result};

/// Decoded image in CPU memory, always RGBA8, rows bottom-up (the first row
/// of `data` is the bottom of the picture, matching the mesh's
/// texture-coordinate origin).
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 dimensions"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Decode a PNG or JPEG file, flipping it vertically.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {}", path.display());

        let img = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} ({} bytes)", width, height, data.len());
        Ok(Self::new_rgba8(width, height, data))
    }

    /// 1x1 texture of a single color; placeholder until the real map lands.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new_rgba8(1, 1, rgba.to_vec())
    }

    /// Check that the byte length matches the dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_is_one_pixel() {
        let tex = TextureData::solid([255, 0, 255, 255]);
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.data, vec![255, 0, 255, 255]);
        assert!(tex.is_valid());
    }

    #[test]
    fn truncated_data_is_invalid() {
        let tex = TextureData {
            data: vec![0; 7],
            width: 2,
            height: 1,
        };
        assert!(!tex.is_valid());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(TextureData::load_from_path("definitely/not/here.png").is_err());
    }
}
