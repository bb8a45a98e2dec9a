pub mod image;
pub mod ocr;
pub mod orchestrator;
pub mod pipeline;
pub mod printed;

pub use image::{BufferLedger, ImageProcessor, PixelBuffer, RegionBuffer};
pub use ocr::{EngineRole, RecognitionEngine, TesseractEngine};
pub use orchestrator::{RecognitionBatch, RecognitionJob, RecognitionOrchestrator, RecognitionOutcome};
pub use pipeline::ExtractionPipeline;
pub use printed::{PrintedFieldParser, PrintedFields};
