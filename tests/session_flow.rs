use async_trait::async_trait;
use guestdoc::models::{GuestField, HandwrittenField, RegionTag, ValidationState};
use guestdoc::processing::{EngineRole, RecognitionEngine, RecognitionOrchestrator, RegionBuffer};
use guestdoc::session::{Screen, MANUAL_ENTRY_MESSAGE};
use guestdoc::{CapturedImage, ExtractionPipeline, ScanError, SessionController};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PRINTED_TEXT: &str = "Government of India\n\
    RAHUL SHARMA\n\
    DOB: 14/08/1991\n\
    MALE\n\
    1234 5678 9012\n\
    Address:\n\
    12 MG Road, Pune";

/// Answers from a fixed script keyed by region, optionally failing one region or stalling.
struct FakeEngine {
    role: EngineRole,
    failing: Option<HandwrittenField>,
    stall: bool,
    closed: Arc<AtomicBool>,
}

impl FakeEngine {
    fn new(role: EngineRole) -> Self {
        FakeEngine { role, failing: None, stall: false, closed: Arc::new(AtomicBool::new(false)) }
    }

    fn failing(mut self, field: HandwrittenField) -> Self {
        self.failing = Some(field);
        self
    }

    fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl RecognitionEngine for FakeEngine {
    fn role(&self) -> EngineRole {
        self.role
    }

    async fn recognize(&self, region: &RegionBuffer) -> Result<String, ScanError> {
        if self.stall {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        match region.tag() {
            RegionTag::IdentityBlock => Ok(PRINTED_TEXT.to_string()),
            RegionTag::Handwritten(field) if Some(field) == self.failing => {
                Err(ScanError::RecognitionError(format!("{} unreadable", field.label())))
            }
            RegionTag::Handwritten(HandwrittenField::ComingFrom) => Ok("Mumbai".to_string()),
            RegionTag::Handwritten(HandwrittenField::GoingTo) => Ok("Goa\n".to_string()),
            RegionTag::Handwritten(HandwrittenField::MobileNumber) => Ok("98765 43210".to_string()),
            RegionTag::Handwritten(HandwrittenField::VehicleNumber) => Ok("mh 12 ab 1234".to_string()),
            RegionTag::Handwritten(HandwrittenField::RoomNumber) => Ok("10 1".to_string()),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn controller_with(printed: FakeEngine, handwriting: FakeEngine, timeout: Duration) -> SessionController {
    let orchestrator = RecognitionOrchestrator::new(Arc::new(printed), Arc::new(handwriting), timeout);
    SessionController::new(ExtractionPipeline::new(orchestrator))
}

fn controller() -> SessionController {
    controller_with(
        FakeEngine::new(EngineRole::Printed),
        FakeEngine::new(EngineRole::Handwriting),
        Duration::from_secs(5),
    )
}

fn write_document(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([240, 240, 240]))
        .save(&path)
        .unwrap();
    path
}

#[tokio::test]
async fn test_full_pass_populates_record_and_disposes_capture() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 1080, 1440);

    let mut controller = controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    controller.process().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.screen, Screen::Verification);
    assert_eq!(snapshot.error_message, None);
    assert_eq!(snapshot.completed_passes, 1);

    let record = snapshot.record;
    assert_eq!(record.name, "RAHUL SHARMA");
    assert_eq!(record.date_of_birth, "14/08/1991");
    assert_eq!(record.gender, "MALE");
    assert!(record.address.contains("MG Road"));
    assert!(!record.address.contains("1234 5678 9012"));
    assert_eq!(record.coming_from, "Mumbai");
    assert_eq!(record.going_to, "Goa");
    assert_eq!(record.mobile_number, "9876543210");
    assert_eq!(record.vehicle_number, "MH12AB1234");
    assert_eq!(record.room_number, "101");

    assert!(!photo.exists());
    assert!(!controller.has_capture());
    assert_eq!(controller.pipeline().ledger().live(), 0);
    assert_eq!(controller.validation_state(GuestField::MobileNumber), ValidationState::Valid);
}

#[tokio::test]
async fn test_single_region_failure_only_blanks_that_field() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 720, 960);

    let mut controller = controller_with(
        FakeEngine::new(EngineRole::Printed),
        FakeEngine::new(EngineRole::Handwriting).failing(HandwrittenField::RoomNumber),
        Duration::from_secs(5),
    );
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    controller.process().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.screen, Screen::Verification);
    assert_eq!(snapshot.error_message, None);
    assert_eq!(snapshot.record.room_number, "");
    assert_eq!(snapshot.record.vehicle_number, "MH12AB1234");
    assert_eq!(snapshot.record.name, "RAHUL SHARMA");
    assert_eq!(controller.validation_state(GuestField::RoomNumber), ValidationState::Neutral);
    assert!(!photo.exists());
}

#[tokio::test]
async fn test_undecodable_capture_falls_back_to_manual_entry() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("broken.png");
    std::fs::write(&photo, b"definitely not an image").unwrap();

    let mut controller = controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    controller.process().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.screen, Screen::Verification);
    assert!(snapshot.record.is_empty());
    assert_eq!(snapshot.error_message.as_deref(), Some(MANUAL_ENTRY_MESSAGE));
    assert_eq!(snapshot.completed_passes, 1);
    assert!(!photo.exists());
    assert_eq!(controller.pipeline().ledger().live(), 0);
}

#[tokio::test]
async fn test_recognition_timeouts_leave_fields_empty() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 540, 720);

    let mut controller = controller_with(
        FakeEngine::new(EngineRole::Printed).stalling(),
        FakeEngine::new(EngineRole::Handwriting).stalling(),
        Duration::from_millis(50),
    );
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    controller.process().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.screen, Screen::Verification);
    assert!(snapshot.record.is_empty());
    assert!(!photo.exists());
    assert_eq!(controller.pipeline().ledger().live(), 0);
}

fn stalling_controller() -> SessionController {
    controller_with(
        FakeEngine::new(EngineRole::Printed).stalling(),
        FakeEngine::new(EngineRole::Handwriting).stalling(),
        Duration::from_secs(120),
    )
}

#[tokio::test]
async fn test_abandoned_pass_settles_to_manual_entry() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 1080, 1440);

    let mut controller = stalling_controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));

    let abandoned = tokio::time::timeout(Duration::from_millis(200), controller.process()).await;
    assert!(abandoned.is_err());
    assert_eq!(controller.screen(), Screen::Processing);
    assert!(!photo.exists());
    assert_eq!(controller.pipeline().ledger().live(), 0);

    assert_eq!(controller.update_field(GuestField::RoomNumber, " 2 0 4 "), Some(ValidationState::Valid));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.screen, Screen::Verification);
    assert_eq!(snapshot.error_message.as_deref(), Some(MANUAL_ENTRY_MESSAGE));
    assert_eq!(snapshot.record.room_number, "204");
    assert_eq!(snapshot.completed_passes, 1);
}

#[tokio::test]
async fn test_leaving_an_abandoned_pass_holds_no_resources() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_document(&dir, "first.png", 1080, 1440);
    let second = write_document(&dir, "second.png", 1080, 1440);

    let mut controller = stalling_controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&first));
    let abandoned = tokio::time::timeout(Duration::from_millis(300), controller.process()).await;
    assert!(abandoned.is_err());

    controller.done();
    assert_eq!(controller.screen(), Screen::Home);
    assert!(!first.exists());
    assert_eq!(controller.pipeline().ledger().live(), 0);

    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&second));
    assert!(!first.exists());
    assert_eq!(controller.pipeline().ledger().live(), 0);
    assert!(second.exists());
    assert_eq!(controller.snapshot().completed_passes, 1);
}

#[tokio::test]
async fn test_teardown_closes_engines_and_releases_pass() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 1080, 1440);

    let printed = FakeEngine::new(EngineRole::Printed).stalling();
    let handwriting = FakeEngine::new(EngineRole::Handwriting).stalling();
    let (printed_closed, handwriting_closed) = (printed.closed_flag(), handwriting.closed_flag());
    let mut controller = controller_with(printed, handwriting, Duration::from_secs(120));
    let ledger = controller.pipeline().ledger().clone();

    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    let abandoned = tokio::time::timeout(Duration::from_millis(200), controller.process()).await;
    assert!(abandoned.is_err());
    assert!(!printed_closed.load(Ordering::SeqCst));

    drop(controller);
    assert!(printed_closed.load(Ordering::SeqCst));
    assert!(handwriting_closed.load(Ordering::SeqCst));
    assert!(!photo.exists());
    assert_eq!(ledger.live(), 0);
}

#[tokio::test]
async fn test_verification_edits_and_exit() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 1080, 1440);

    let mut controller = controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    controller.process().await;

    assert_eq!(
        controller.update_field(GuestField::MobileNumber, "+91 98765-43210"),
        Some(ValidationState::Valid)
    );
    assert_eq!(controller.record().mobile_number, "9198765432");
    assert_eq!(controller.update_field(GuestField::MobileNumber, "98-765"), Some(ValidationState::Invalid));

    assert_eq!(controller.update_field(GuestField::VehicleNumber, "ka 01 mn 0042"), Some(ValidationState::Valid));
    assert_eq!(controller.record().vehicle_number, "KA01MN0042");

    assert_eq!(controller.update_field(GuestField::RoomNumber, ""), Some(ValidationState::Neutral));

    let mut rx = controller.subscribe();
    controller.done();
    assert!(rx.has_changed().unwrap());
    assert_eq!(controller.screen(), Screen::Home);
    assert!(controller.record().is_empty());

    rx.borrow_and_update();
    controller.done();
    controller.cancel_scan();
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_cancel_from_camera_disposes_capture() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_document(&dir, "card.png", 100, 100);

    let mut controller = controller();
    controller.start_new_scan();
    controller.image_captured(CapturedImage::new(&photo));
    assert!(controller.has_capture());

    controller.cancel_scan();
    assert_eq!(controller.screen(), Screen::Home);
    assert!(!photo.exists());
    assert!(!controller.has_capture());
}
