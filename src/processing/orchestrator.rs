use crate::models::{HandwrittenField, RegionTag};
use crate::processing::image::RegionBuffer;
use crate::processing::ocr::{EngineRole, RecognitionEngine};
use crate::utils::ScanError;
use futures::future::{join_all, FutureExt};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of one region's recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Recognized(String),
    Failed(String),
    Cancelled,
}

impl RecognitionOutcome {
    /// Recognized text, or the empty string for failed and cancelled jobs.
    pub fn text(&self) -> &str {
        match self {
            RecognitionOutcome::Recognized(text) => text,
            _ => "",
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, RecognitionOutcome::Recognized(_))
    }
}

/// One unit of recognition work. Owns its region buffer until the engine call returns.
pub struct RecognitionJob {
    pub buffer: RegionBuffer,
    pub role: EngineRole,
}

impl RecognitionJob {
    pub fn tag(&self) -> RegionTag {
        self.buffer.tag()
    }
}

/// All outcomes of a single pass, keyed by region rather than completion order.
#[derive(Debug, Clone)]
pub struct RecognitionBatch {
    pub printed: RecognitionOutcome,
    pub handwritten: BTreeMap<HandwrittenField, RecognitionOutcome>,
}

impl RecognitionBatch {
    pub fn handwritten_text(&self, field: HandwrittenField) -> &str {
        self.handwritten.get(&field).map(RecognitionOutcome::text).unwrap_or("")
    }

    pub fn failures(&self) -> usize {
        std::iter::once(&self.printed)
            .chain(self.handwritten.values())
            .filter(|outcome| !outcome.is_recognized())
            .count()
    }
}

/// Fans region jobs out to the printed and handwriting engines and joins on all of them.
pub struct RecognitionOrchestrator {
    printed: Arc<dyn RecognitionEngine>,
    handwriting: Arc<dyn RecognitionEngine>,
    timeout: Duration,
}

impl RecognitionOrchestrator {
    pub fn new(
        printed: Arc<dyn RecognitionEngine>,
        handwriting: Arc<dyn RecognitionEngine>,
        timeout: Duration,
    ) -> Self {
        RecognitionOrchestrator { printed, handwriting, timeout }
    }

    fn engine_for(&self, role: EngineRole) -> Arc<dyn RecognitionEngine> {
        match role {
            EngineRole::Printed => Arc::clone(&self.printed),
            EngineRole::Handwriting => Arc::clone(&self.handwriting),
        }
    }

    /// Run every job concurrently and wait for all of them to settle.
    ///
    /// A job that fails, times out or panics yields a non-recognized outcome for its
    /// own tag only. Once `cancel` fires, unfinished jobs settle as `Cancelled`.
    /// Jobs run inside the returned future: dropping it releases every region buffer.
    pub async fn recognize(
        &self,
        identity_block: RegionBuffer,
        handwritten: BTreeMap<HandwrittenField, RegionBuffer>,
        cancel: &CancellationToken,
    ) -> RecognitionBatch {
        let mut jobs = Vec::with_capacity(handwritten.len() + 1);
        jobs.push(RecognitionJob { buffer: identity_block, role: EngineRole::Printed });
        jobs.extend(
            handwritten
                .into_values()
                .map(|buffer| RecognitionJob { buffer, role: EngineRole::Handwriting }),
        );

        let pending = jobs.into_iter().map(|job| {
            let (tag, role) = (job.tag(), job.role);
            let engine = self.engine_for(role);
            AssertUnwindSafe(run_job(job, engine, self.timeout, cancel))
                .catch_unwind()
                .map(move |settled| {
                    settled.unwrap_or_else(|_| {
                        warn!("{} recognition panicked for {}", role, tag);
                        (tag, RecognitionOutcome::Failed("recognition task panicked".to_string()))
                    })
                })
        });

        let mut batch = RecognitionBatch {
            printed: RecognitionOutcome::Failed("identity block missing".to_string()),
            handwritten: BTreeMap::new(),
        };
        for (tag, outcome) in join_all(pending).await {
            match tag {
                RegionTag::IdentityBlock => batch.printed = outcome,
                RegionTag::Handwritten(field) => {
                    batch.handwritten.insert(field, outcome);
                }
            }
        }

        debug!(
            "Recognition pass settled: {} jobs, {} without text",
            batch.handwritten.len() + 1,
            batch.failures()
        );
        batch
    }

    pub fn close(&self) {
        self.printed.close();
        self.handwriting.close();
    }
}

async fn run_job(
    job: RecognitionJob,
    engine: Arc<dyn RecognitionEngine>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> (RegionTag, RecognitionOutcome) {
    let tag = job.tag();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => RecognitionOutcome::Cancelled,
        result = tokio::time::timeout(timeout, engine.recognize(&job.buffer)) => match result {
            Ok(Ok(text)) => RecognitionOutcome::Recognized(text),
            Ok(Err(e)) => {
                warn!("{} recognition failed for {}: {}", job.role, tag, e);
                RecognitionOutcome::Failed(e.to_string())
            }
            Err(_) => {
                let e = ScanError::RecognitionTimeout(timeout);
                warn!("{} recognition failed for {}: {}", job.role, tag, e);
                RecognitionOutcome::Failed(e.to_string())
            }
        },
    };
    drop(job);
    (tag, outcome)
}
