use crate::models::{RegionTag, ScaledRegion};
use crate::utils::ScanError;
use image::{DynamicImage, ImageDecoder, ImageReader};
use log::{debug, warn};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts pixel buffers that are currently alive.
///
/// Every [`PixelBuffer`] holds a lease on the ledger it was created from and
/// gives it back when dropped, so `live() == 0` after a pass means nothing leaked.
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    live: Arc<AtomicUsize>,
}

impl BufferLedger {
    pub fn new() -> Self {
        BufferLedger::default()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn lease(&self) -> BufferLease {
        self.live.fetch_add(1, Ordering::SeqCst);
        BufferLease { live: Arc::clone(&self.live) }
    }
}

#[derive(Debug)]
struct BufferLease {
    live: Arc<AtomicUsize>,
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Decoded pixels owned by exactly one holder.
#[derive(Debug)]
pub struct PixelBuffer {
    image: DynamicImage,
    _lease: BufferLease,
}

impl PixelBuffer {
    pub fn new(image: DynamicImage, ledger: &BufferLedger) -> Self {
        PixelBuffer { image, _lease: ledger.lease() }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// A cropped document region, released (with a debug log) when dropped.
#[derive(Debug)]
pub struct RegionBuffer {
    tag: RegionTag,
    pixels: PixelBuffer,
}

impl RegionBuffer {
    pub fn new(tag: RegionTag, pixels: PixelBuffer) -> Self {
        RegionBuffer { tag, pixels }
    }

    pub fn tag(&self) -> RegionTag {
        self.tag
    }

    pub fn image(&self) -> &DynamicImage {
        self.pixels.image()
    }
}

impl Drop for RegionBuffer {
    fn drop(&mut self) {
        debug!("Released region buffer: {}", self.tag);
    }
}

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an image file, applying any embedded EXIF orientation.
    pub fn decode(image_path: &Path) -> Result<DynamicImage, ScanError> {
        let reader = ImageReader::open(image_path)
            .map_err(|e| ScanError::ImageProcessingError(format!("Failed to open image: {}", e)))?
            .with_guessed_format()
            .map_err(|e| ScanError::ImageProcessingError(format!("Failed to read image: {}", e)))?;

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| ScanError::ImageProcessingError(format!("Unsupported image: {}", e)))?;

        let orientation = match decoder.orientation() {
            Ok(orientation) => Some(orientation),
            Err(e) => {
                warn!("Ignoring unreadable orientation metadata: {}", e);
                None
            }
        };

        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|e| ScanError::ImageProcessingError(format!("Failed to decode image: {}", e)))?;

        if let Some(orientation) = orientation {
            img.apply_orientation(orientation);
        }

        debug!("Decoded capture {}x{}", img.width(), img.height());
        Ok(img)
    }

    /// Copy a region out of `source`. The region is clipped again against the
    /// source so a stale descriptor can never read out of bounds.
    pub fn crop(source: &DynamicImage, region: &ScaledRegion) -> DynamicImage {
        let width = source.width().max(1);
        let height = source.height().max(1);
        let x = region.x.min(width - 1);
        let y = region.y.min(height - 1);
        let w = region.width.min(width - x).max(1);
        let h = region.height.min(height - y).max(1);

        source.crop_imm(x, y, w, h)
    }
}
