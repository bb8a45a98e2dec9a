use crate::config::ScannerConfig;
use crate::processing::image::RegionBuffer;
use crate::utils::ScanError;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use log::{debug, info};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;
use tesseract::{PageSegMode, Tesseract};

/// Which kind of writing an engine is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineRole {
    Printed,
    Handwriting,
}

impl fmt::Display for EngineRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineRole::Printed => write!(f, "printed"),
            EngineRole::Handwriting => write!(f, "handwriting"),
        }
    }
}

/// A text recognition service.
///
/// Implementations must not block the calling task; CPU-bound work belongs on
/// the blocking pool.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn role(&self) -> EngineRole;

    async fn recognize(&self, region: &RegionBuffer) -> Result<String, ScanError>;

    /// Release engine resources. Later calls to `recognize` fail with `EngineClosed`.
    fn close(&self);
}

/// Tesseract-backed engine used for both roles.
pub struct TesseractEngine {
    role: EngineRole,
    tessdata_dir: Option<PathBuf>,
    language: String,
    closed: AtomicBool,
}

impl TesseractEngine {
    pub fn new(role: EngineRole, config: &ScannerConfig) -> Self {
        TesseractEngine {
            role,
            tessdata_dir: config.tessdata_dir.clone(),
            language: config.language.clone(),
            closed: AtomicBool::new(false),
        }
    }

    fn page_seg_mode(&self) -> PageSegMode {
        match self.role {
            EngineRole::Printed => PageSegMode::PsmSingleBlock,
            EngineRole::Handwriting => PageSegMode::PsmSingleLine,
        }
    }

    /// Grayscale, equalize and PNG-encode a region for Tesseract.
    fn prepare(image: &DynamicImage) -> Result<Vec<u8>, ScanError> {
        let gray = image.to_luma8();
        let equalized = imageproc::contrast::equalize_histogram(&gray);

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(equalized)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ScanError::RecognitionError(format!("Failed to encode region: {}", e)))?;
        Ok(bytes)
    }

    fn run_tesseract(
        png: &[u8],
        tessdata_dir: Option<&str>,
        language: &str,
        mode: PageSegMode,
    ) -> Result<String, ScanError> {
        // Dropping the temp file removes it, whichever way this function returns.
        let mut temp_file = NamedTempFile::new()
            .map_err(|e| ScanError::RecognitionError(format!("Failed to create temporary file: {}", e)))?;
        temp_file
            .write_all(png)
            .map_err(|e| ScanError::RecognitionError(format!("Failed to write temporary file: {}", e)))?;

        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| ScanError::RecognitionError("Could not convert path to string".to_string()))?;

        let mut tess = Tesseract::new(tessdata_dir, Some(language))
            .map_err(|e| ScanError::RecognitionError(format!("Failed to initialize Tesseract: {}", e)))?;
        tess.set_page_seg_mode(mode);

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| ScanError::RecognitionError(format!("Failed to set image: {}", e)))?;

        tess.get_text()
            .map_err(|e| ScanError::RecognitionError(format!("Failed to extract text: {}", e)))
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn role(&self) -> EngineRole {
        self.role
    }

    async fn recognize(&self, region: &RegionBuffer) -> Result<String, ScanError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScanError::EngineClosed);
        }

        // The blocking call gets its own copy of the pixels, so an abandoned pass
        // never leaves a region buffer behind on the blocking pool.
        let image = region.image().clone();
        let tessdata_dir = self
            .tessdata_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        let language = self.language.clone();
        let mode = self.page_seg_mode();

        let text = tokio::task::spawn_blocking(move || {
            let png = Self::prepare(&image)?;
            drop(image);
            Self::run_tesseract(&png, tessdata_dir.as_deref(), &language, mode)
        })
        .await
        .map_err(|e| ScanError::RecognitionError(format!("Recognition task failed: {}", e)))??;

        debug!("{} engine read {} chars from {}", self.role, text.len(), region.tag());
        Ok(text)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Closed {} recognition engine", self.role);
        }
    }
}
