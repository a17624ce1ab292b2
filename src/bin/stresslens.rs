//! Stresslens CLI - replay recorded landmark streams through the pipeline
//!
//! Commands:
//! - transform: Process a recorded frame file into inference output (batch mode)
//! - run: Process streaming frames from stdin (streaming mode)
//! - doctor: Diagnose pipeline configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stresslens::model::{LinearWeights, ModelKind};
use stresslens::session::{SessionConfig, StressSession};
use stresslens::types::LandmarkFrame;
use stresslens::{PRODUCER_NAME, VERSION};

/// Stresslens - On-device stress inference from facial landmark streams
#[derive(Parser)]
#[command(name = "stresslens")]
#[command(version = VERSION)]
#[command(about = "Estimate stress levels from recorded landmark frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a recorded frame file into inference output (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Scoring model
        #[arg(long, default_value = "heuristic")]
        model: ModelChoice,

        /// Linear-model weights file (JSON), required for --model linear
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Calibration window in frames
        #[arg(long, default_value = "90")]
        calibration_frames: usize,

        /// Append the session report as a final record
        #[arg(long)]
        report: bool,
    },

    /// Process streaming frames from stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Scoring model
        #[arg(long, default_value = "heuristic")]
        model: ModelChoice,

        /// Linear-model weights file (JSON)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Calibration window in frames
        #[arg(long, default_value = "90")]
        calibration_frames: usize,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Diagnose pipeline configuration
    Doctor {
        /// Check a linear-model weights file
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ModelChoice {
    /// Weighted-sum heuristic (default)
    Heuristic,
    /// Offline-trained linear classifier (requires --weights)
    Linear,
    /// No scoring model; engine holds the neutral value
    Noop,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one outcome per line)
    Ndjson,
    /// JSON array of outcomes
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StressCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            output_format,
            model,
            weights,
            calibration_frames,
            report,
        } => cmd_transform(
            &input,
            &output,
            output_format,
            model,
            weights.as_deref(),
            calibration_frames,
            report,
        ),

        Commands::Run {
            output_format,
            model,
            weights,
            calibration_frames,
            flush,
        } => cmd_run(
            output_format,
            model,
            weights.as_deref(),
            calibration_frames,
            flush,
        ),

        Commands::Doctor { weights, json } => cmd_doctor(weights.as_deref(), json),
    }
}

fn build_config(
    model: ModelChoice,
    weights: Option<&Path>,
    calibration_frames: usize,
) -> Result<SessionConfig, StressCliError> {
    let model = match model {
        ModelChoice::Heuristic => ModelKind::Heuristic,
        ModelChoice::Noop => ModelKind::Noop,
        ModelChoice::Linear => {
            let path = weights.ok_or(StressCliError::MissingWeights)?;
            let json = fs::read_to_string(path)?;
            ModelKind::Linear(LinearWeights::from_json(&json)?)
        }
    };

    if calibration_frames == 0 {
        return Err(StressCliError::InvalidCalibrationWindow);
    }

    Ok(SessionConfig {
        calibration_frames,
        model,
    })
}

fn parse_frame(line: &str, line_no: usize) -> Result<LandmarkFrame, StressCliError> {
    let frame: LandmarkFrame = serde_json::from_str(line)
        .map_err(|e| StressCliError::FrameParse { line: line_no, source: e })?;
    if frame.points.len() < stresslens::types::landmark::MIN_FRAME_LEN {
        return Err(StressCliError::FrameTooShort { line: line_no });
    }
    Ok(frame)
}

fn cmd_transform(
    input: &PathBuf,
    output: &PathBuf,
    output_format: OutputFormat,
    model: ModelChoice,
    weights: Option<&Path>,
    calibration_frames: usize,
    report: bool,
) -> Result<(), StressCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let mut session = StressSession::new(build_config(model, weights, calibration_frames)?);

    let mut outcomes: Vec<serde_json::Value> = Vec::new();
    let mut saw_frame = false;
    for (i, line) in input_data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        saw_frame = true;
        let frame = parse_frame(line, i + 1)?;
        let outcome = session.process_frame(&frame);
        outcomes.push(serde_json::to_value(&outcome)?);
    }

    if !saw_frame {
        return Err(StressCliError::NoFrames);
    }

    if report {
        outcomes.push(serde_json::to_value(session.report())?);
    }

    let output_data = format_output(&outcomes, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    model: ModelChoice,
    weights: Option<&Path>,
    calibration_frames: usize,
    flush: bool,
) -> Result<(), StressCliError> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("stresslens run: reading NDJSON frames from stdin (pipe input or Ctrl-D to end)");
    }

    let mut session = StressSession::new(build_config(model, weights, calibration_frames)?);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut buffered: Vec<serde_json::Value> = Vec::new();

    for (i, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame = parse_frame(line, i + 1)?;
        let outcome = session.process_frame(&frame);

        match output_format {
            OutputFormat::Ndjson => {
                writeln!(out, "{}", serde_json::to_string(&outcome)?)?;
                if flush {
                    out.flush()?;
                }
            }
            _ => buffered.push(serde_json::to_value(&outcome)?),
        }
    }

    match output_format {
        OutputFormat::Ndjson => {}
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&buffered)?)?,
        OutputFormat::JsonPretty => {
            writeln!(out, "{}", serde_json::to_string_pretty(&buffered)?)?
        }
    }

    Ok(())
}

fn cmd_doctor(weights: Option<&Path>, json: bool) -> Result<(), StressCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "default-config".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "heuristic model, {}-frame calibration window",
            SessionConfig::default().calibration_frames
        ),
    });

    if let Some(path) = weights {
        if path.exists() {
            match fs::read_to_string(path).map_err(StressCliError::from).and_then(|json| {
                LinearWeights::from_json(&json).map_err(StressCliError::from)
            }) {
                Ok(_) => checks.push(DoctorCheck {
                    name: "weights".to_string(),
                    status: CheckStatus::Ok,
                    message: "Weights file is valid".to_string(),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "weights".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot load weights file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "weights".to_string(),
                status: CheckStatus::Warning,
                message: "Weights file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Stresslens Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(StressCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn format_output(
    outcomes: &[serde_json::Value],
    format: &OutputFormat,
) -> Result<String, StressCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for outcome in outcomes {
                lines.push(serde_json::to_string(outcome)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(outcomes)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(outcomes)?),
    }
}

// Error types

#[derive(Debug, thiserror::Error)]
enum StressCliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot parse frame on line {line}: {source}")]
    FrameParse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Frame on line {line} has too few landmark points")]
    FrameTooShort { line: usize },

    #[error("--model linear requires --weights")]
    MissingWeights,

    #[error("Calibration window must be at least 1 frame")]
    InvalidCalibrationWindow,

    #[error("No frames found in input")]
    NoFrames,

    #[error("One or more health checks failed")]
    DoctorFailed,
}

/// Structured error emitted on stderr for host tooling.
#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StressCliError> for CliError {
    fn from(e: StressCliError) -> Self {
        let (code, hint) = match &e {
            StressCliError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
            StressCliError::Json(_) => ("JSON_ERROR", Some("Check JSON syntax")),
            StressCliError::FrameParse { .. } => (
                "FRAME_PARSE_ERROR",
                Some("Frames are NDJSON: {\"points\":[{\"x\":..,\"y\":..,\"z\":..},..],\"timestamp_ms\":..}"),
            ),
            StressCliError::FrameTooShort { .. } => (
                "FRAME_TOO_SHORT",
                Some("Frames must carry the full face-mesh point set"),
            ),
            StressCliError::MissingWeights => {
                ("MISSING_WEIGHTS", Some("Pass --weights path/to/weights.json"))
            }
            StressCliError::InvalidCalibrationWindow => {
                ("INVALID_CONFIG", Some("Use --calibration-frames 1 or more"))
            }
            StressCliError::NoFrames => ("NO_FRAMES", Some("Ensure input file is not empty")),
            StressCliError::DoctorFailed => {
                ("DOCTOR_FAILED", Some("Review the doctor report for details"))
            }
        };

        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(|h| h.to_string()),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
