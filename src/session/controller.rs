use crate::models::{GuestField, GuestRecord, ValidationState};
use crate::processing::ExtractionPipeline;
use crate::session::capture::CapturedImage;
use crate::session::state::{Screen, SessionSnapshot, MANUAL_ENTRY_MESSAGE};
use crate::validation::FieldValidator;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Drives the Home → Camera → Processing → Verification → Home cycle and owns
/// the capture and the current record.
///
/// Every transition publishes a new [`SessionSnapshot`]; observers receive them
/// through [`SessionController::subscribe`]. Dropping the controller closes both
/// recognition engines.
pub struct SessionController {
    pipeline: ExtractionPipeline,
    state: watch::Sender<SessionSnapshot>,
    capture: Option<CapturedImage>,
}

impl SessionController {
    pub fn new(pipeline: ExtractionPipeline) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::home());
        SessionController { pipeline, state, capture: None }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn screen(&self) -> Screen {
        self.state.borrow().screen
    }

    pub fn record(&self) -> GuestRecord {
        self.state.borrow().record.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error_message.clone()
    }

    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    pub fn validation_state(&self, field: GuestField) -> ValidationState {
        FieldValidator::classify(field, self.state.borrow().record.get(field))
    }

    pub fn start_new_scan(&mut self) {
        self.settle_abandoned_pass();
        self.reset(Screen::Camera);
    }

    /// Hold a new capture, disposing the previous one first.
    pub fn image_captured(&mut self, capture: CapturedImage) {
        self.settle_abandoned_pass();
        if self.screen() != Screen::Camera {
            warn!("Discarding capture received outside the camera step");
            return;
        }
        self.capture = None;
        let path = capture.path().to_path_buf();
        self.capture = Some(capture);
        self.publish(|s| s.capture = Some(path));
    }

    pub fn retake(&mut self) {
        self.settle_abandoned_pass();
        if self.screen() != Screen::Camera {
            debug!("Ignoring retake on {}", self.screen());
            return;
        }
        self.capture = None;
        self.publish(|s| s.capture = None);
    }

    /// Run the extraction pipeline on the held capture.
    ///
    /// Always ends on Verification: with the extracted record, or with an empty
    /// record and the manual-entry advisory when anything failed. The capture and
    /// every pixel buffer are gone by the time Verification is published.
    ///
    /// The pass runs inside this future and `&mut self` keeps it the only one.
    /// Dropping the future mid-pass deletes the capture and releases the region
    /// buffers before the drop returns; the session stays on Processing until the
    /// next call settles it.
    pub async fn process(&mut self) {
        self.settle_abandoned_pass();
        if self.screen() != Screen::Camera {
            warn!("Ignoring process request on {}", self.screen());
            return;
        }
        let Some(capture) = self.capture.take() else {
            warn!("Ignoring process request without a capture");
            return;
        };

        self.publish(|s| {
            s.screen = Screen::Processing;
            s.error_message = None;
            s.capture = None;
        });
        info!("Processing capture");

        // Stops work already handed to the blocking pool if this future is dropped.
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let result = self.pipeline.run(capture, cancel).await;
        guard.disarm();

        match result {
            Ok(record) => self.enter_verification(record, None),
            Err(e) => {
                error!("Processing failed: {}", e);
                self.enter_verification(GuestRecord::empty(), Some(MANUAL_ENTRY_MESSAGE.to_string()));
            }
        }
    }

    /// Normalize and store an edit. Returns the field's new validation state, or
    /// `None` when no record is being verified.
    pub fn update_field(&mut self, field: GuestField, input: &str) -> Option<ValidationState> {
        self.settle_abandoned_pass();
        if self.screen() != Screen::Verification {
            debug!("Ignoring edit of {} on {}", field, self.screen());
            return None;
        }
        let (value, state) = FieldValidator::evaluate(field, input);
        self.publish(|s| s.record = s.record.with_field(field, value));
        Some(state)
    }

    pub fn cancel_scan(&mut self) {
        self.settle_abandoned_pass();
        self.reset(Screen::Home);
    }

    pub fn done(&mut self) {
        self.settle_abandoned_pass();
        self.reset(Screen::Home);
    }

    fn enter_verification(&mut self, record: GuestRecord, error_message: Option<String>) {
        self.publish(|s| {
            s.screen = Screen::Verification;
            s.record = record;
            s.error_message = error_message;
            s.capture = None;
            s.completed_passes += 1;
        });
    }

    // A `process` future dropped mid-pass leaves the session on Processing. The
    // pass went with it, so fall back to manual entry.
    fn settle_abandoned_pass(&mut self) {
        if self.screen() == Screen::Processing {
            warn!("Processing pass was abandoned; falling back to manual entry");
            self.enter_verification(GuestRecord::empty(), Some(MANUAL_ENTRY_MESSAGE.to_string()));
        }
    }

    fn reset(&mut self, screen: Screen) {
        self.capture = None;
        self.publish(|s| {
            s.screen = screen;
            s.record = GuestRecord::empty();
            s.error_message = None;
            s.capture = None;
        });
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        self.state.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            update(snapshot);
            let changed = *snapshot != before;
            if changed && snapshot.screen != before.screen {
                debug!("Session {} -> {}", before.screen, snapshot.screen);
            }
            changed
        });
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.capture = None;
        self.pipeline.close();
    }
}
