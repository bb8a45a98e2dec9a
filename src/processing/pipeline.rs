use crate::config::ScannerConfig;
use crate::models::{DocumentLayout, GuestField, GuestRecord, HandwrittenField, ReferenceRect, RegionTag};
use crate::processing::image::{BufferLedger, ImageProcessor, PixelBuffer, RegionBuffer};
use crate::processing::ocr::{EngineRole, RecognitionEngine, TesseractEngine};
use crate::processing::orchestrator::{RecognitionBatch, RecognitionOrchestrator};
use crate::processing::printed::{collapse_whitespace, PrintedFieldParser};
use crate::session::CapturedImage;
use crate::utils::ScanError;
use crate::validation::FieldValidator;
use image::DynamicImage;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Capture-to-record extraction: decode, crop, recognize, parse, normalize.
pub struct ExtractionPipeline {
    orchestrator: RecognitionOrchestrator,
    ledger: BufferLedger,
}

impl ExtractionPipeline {
    pub fn new(orchestrator: RecognitionOrchestrator) -> Self {
        ExtractionPipeline { orchestrator, ledger: BufferLedger::new() }
    }

    /// Pipeline backed by Tesseract for both engine roles.
    pub fn with_tesseract(config: &ScannerConfig) -> Self {
        let printed: Arc<dyn RecognitionEngine> = Arc::new(TesseractEngine::new(EngineRole::Printed, config));
        let handwriting: Arc<dyn RecognitionEngine> =
            Arc::new(TesseractEngine::new(EngineRole::Handwriting, config));
        Self::new(RecognitionOrchestrator::new(printed, handwriting, config.recognition_timeout()))
    }

    /// Live pixel buffers created by this pipeline.
    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Run one full pass over a capture. The capture is consumed and disposed
    /// before this returns, on success and on every error path.
    ///
    /// Everything the pass holds lives in the returned future, so dropping the
    /// future deletes the capture and releases every region buffer at once.
    pub async fn run(&self, capture: CapturedImage, cancel: CancellationToken) -> Result<GuestRecord, ScanError> {
        let path = capture.path().to_path_buf();
        let (identity_block, handwritten) = self.extract_regions(path, &cancel).await?;

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let batch = self.orchestrator.recognize(identity_block, handwritten, &cancel).await;
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        drop(capture);

        let record = Self::assemble(&batch);
        let filled = record.fields().filter(|(_, value)| !value.is_empty()).count();
        info!("Extraction complete: {} of {} fields filled", filled, GuestField::ALL.len());
        Ok(record)
    }

    pub fn close(&self) {
        self.orchestrator.close();
    }

    async fn extract_regions(
        &self,
        path: PathBuf,
        cancel: &CancellationToken,
    ) -> Result<(RegionBuffer, BTreeMap<HandwrittenField, RegionBuffer>), ScanError> {
        // A blocking decode cannot be interrupted; a cancelled pass skips the crops.
        let decode_cancel = cancel.clone();
        let (identity, handwritten) = tokio::task::spawn_blocking(move || {
            let full = ImageProcessor::decode(&path)?;
            if decode_cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            Ok::<_, ScanError>(Self::crop_regions(&full))
        })
        .await
        .map_err(|e| ScanError::PipelineError(format!("Region extraction task failed: {}", e)))??;

        // Leases are taken here, on the pass's own future.
        let lease =
            |tag: RegionTag, image: DynamicImage| RegionBuffer::new(tag, PixelBuffer::new(image, &self.ledger));
        let identity = lease(RegionTag::IdentityBlock, identity);
        let handwritten = handwritten
            .into_iter()
            .map(|(field, image)| (field, lease(RegionTag::Handwritten(field), image)))
            .collect();
        Ok((identity, handwritten))
    }

    fn crop_regions(full: &DynamicImage) -> (DynamicImage, BTreeMap<HandwrittenField, DynamicImage>) {
        let (width, height) = (full.width(), full.height());
        let crop = |tag: RegionTag, rect: &ReferenceRect| {
            let region = DocumentLayout::scale(rect, width, height);
            debug!("Region {} -> {:?}", tag, region);
            ImageProcessor::crop(full, &region)
        };

        let identity = crop(DocumentLayout::IDENTITY_BLOCK.tag, &DocumentLayout::IDENTITY_BLOCK.rect);
        let mut handwritten = BTreeMap::new();
        for descriptor in DocumentLayout::HANDWRITTEN.iter() {
            if let RegionTag::Handwritten(field) = descriptor.tag {
                handwritten.insert(field, crop(descriptor.tag, &descriptor.rect));
            }
        }
        (identity, handwritten)
    }

    /// Build the record from a settled batch. Missing text yields empty fields.
    pub fn assemble(batch: &RecognitionBatch) -> GuestRecord {
        let printed = PrintedFieldParser::parse(batch.printed.text());
        let handwritten = |field: HandwrittenField, target: GuestField| {
            let text = collapse_whitespace(batch.handwritten_text(field));
            FieldValidator::normalize(target, &text)
        };

        GuestRecord {
            name: printed.name,
            date_of_birth: printed.date_of_birth,
            gender: printed.gender,
            address: printed.address,
            coming_from: handwritten(HandwrittenField::ComingFrom, GuestField::ComingFrom),
            going_to: handwritten(HandwrittenField::GoingTo, GuestField::GoingTo),
            mobile_number: handwritten(HandwrittenField::MobileNumber, GuestField::MobileNumber),
            vehicle_number: handwritten(HandwrittenField::VehicleNumber, GuestField::VehicleNumber),
            room_number: handwritten(HandwrittenField::RoomNumber, GuestField::RoomNumber),
        }
    }
}
