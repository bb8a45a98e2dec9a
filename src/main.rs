// Guest document scanner
// Runs one capture through the extraction pipeline and prints the record for verification.

use clap::{Parser, Subcommand};
use guestdoc::{
    session::{SessionSnapshot, MANUAL_ENTRY_MESSAGE},
    validation::FieldValidator,
    CapturedImage, ExtractionPipeline, GuestField, ScanError, ScannerConfig, SessionController,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "guestdoc", version, about = "Extract guest details from an identity document photo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a photo and print the extracted record
    Scan {
        /// Photo of the identity document with handwritten annotations
        image: PathBuf,

        /// JSON config file
        #[arg(long, env = "GUESTDOC_CONFIG")]
        config: Option<PathBuf>,

        /// Tesseract data directory
        #[arg(long, env = "TESSDATA_PREFIX")]
        tessdata: Option<PathBuf>,

        /// Tesseract language(s), e.g. "eng" or "eng+hin"
        #[arg(long)]
        language: Option<String>,

        /// Per-region recognition timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize and validate a single field value
    Check {
        /// Field name: name, dob, gender, address, from, to, mobile, vehicle, room
        field: String,
        value: String,
    },
}

// Print the verification report for a finished session
fn print_verification_report(snapshot: &SessionSnapshot) {
    println!("\n===============================================");
    println!("         GUEST DOCUMENT VERIFICATION");
    println!("===============================================\n");

    match &snapshot.error_message {
        Some(message) => println!("  !! {}\n", message),
        None => println!("  Check every field before copying it into the register.\n"),
    }

    for view in snapshot.field_views() {
        println!("  {:<15} {:<8} {}", view.label, view.state.to_string(), view.value);
    }

    println!("\nNo data is saved. The capture has been deleted.");
}

fn scan(
    image: PathBuf,
    config_path: Option<PathBuf>,
    tessdata: Option<PathBuf>,
    language: Option<String>,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<bool, ScanError> {
    let mut config = ScannerConfig::load(config_path.as_deref())?;
    if tessdata.is_some() {
        config.tessdata_dir = tessdata;
    }
    if let Some(language) = language {
        config.language = language;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.recognition_timeout_secs = timeout_secs;
    }
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ScanError::PipelineError(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(async {
        let mut controller = SessionController::new(ExtractionPipeline::with_tesseract(&config));
        controller.start_new_scan();

        let capture = CapturedImage::stage(&image, &config.capture_dir())?;
        controller.image_captured(capture);
        info!("Scanning {}", image.display());
        controller.process().await;

        let snapshot = controller.snapshot();
        if json {
            let rendered = serde_json::to_string_pretty(&snapshot.record)
                .map_err(|e| ScanError::PipelineError(format!("Failed to render record: {}", e)))?;
            println!("{}", rendered);
        } else {
            print_verification_report(&snapshot);
        }

        let succeeded = snapshot.error_message.as_deref() != Some(MANUAL_ENTRY_MESSAGE);
        controller.done();
        Ok::<bool, ScanError>(succeeded)
    })
}

fn check(field: &str, value: &str) -> Result<bool, ScanError> {
    let field = GuestField::parse(field)
        .ok_or_else(|| ScanError::ConfigError(format!("Unknown field: {}", field)))?;
    let (normalized, state) = FieldValidator::evaluate(field, value);
    println!("{}: {:?} ({})", field, normalized, state);
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Scan { image, config, tessdata, language, timeout_secs, json } => {
            scan(image, config, tessdata, language, timeout_secs, json)
        }
        Command::Check { field, value } => check(&field, &value),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
