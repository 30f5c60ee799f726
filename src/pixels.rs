use std::path::Path;

use crate::error::TraceError;

/// dense row-major RGB8 raster. length of `data` is always width*height*3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub const CHANNELS: usize = 3;

    /// blank (all black) buffer
    pub fn new(width: u32, height: u32) -> Self {
        profiling::scope!("PixelBuffer::new");
        let len = width as usize * height as usize * Self::CHANNELS;
        Self { width, height, data: vec![0; len] }
    }

    /// decode an image file and keep only its RGB samples (alpha is dropped)
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        profiling::scope!("PixelBuffer::load");
        let img = image::open(path).map_err(|source| TraceError::TargetLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_decoded(path, &img)
    }

    /// convert a decoded image, rejecting one with no pixels
    fn from_decoded(path: &Path, img: &image::DynamicImage) -> Result<Self, TraceError> {
        let rgb = img.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(TraceError::EmptyTarget { path: path.to_path_buf() });
        }
        Ok(Self::from_rgb_image(rgb))
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height, data: img.into_raw() }
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        // length invariant holds, so this never fails
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }

    #[inline]
    pub fn is_compatible(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// test fixtures
#[cfg(test)]
impl PixelBuffer {
    /// wrap an existing RGB8 byte vector. returns None if the length doesn't match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * Self::CHANNELS {
            return None;
        }
        Some(Self { width, height, data })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.index(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// same dimensions, every pixel set to `rgb`
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut buf = Self::new(width, height);
        for px in buf.data.chunks_exact_mut(Self::CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        buf
    }
}
