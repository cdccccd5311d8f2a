//! mscreen CLI - Command-line interface for Motor Screen
//!
//! Commands:
//! - replay: Replay a recorded input log and print the screening report
//! - validate: Validate an input log against motor.input_event.v1
//! - doctor: Diagnose configuration and environment
//! - schema: Print schema information
//! - config: Print the default engine configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use motor_screen::config::EngineConfig;
use motor_screen::encoder::REPORT_VERSION;
use motor_screen::schema::{parse_events, replay_events, validate_events, SCHEMA_VERSION};
use motor_screen::{PRODUCER_NAME, VERSION};

/// mscreen - Motor-control screening engine
#[derive(Parser)]
#[command(name = "mscreen")]
#[command(version = VERSION)]
#[command(about = "Replay and score motor-control screening sessions", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded input log and print the screening report
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for target placement (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Include the engine notifications in the output
        #[arg(long)]
        events: bool,
    },

    /// Validate an input log
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Print the default engine configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (motor.input_event.v1)
    Input,
    /// Output schema (screening report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

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

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "motor_screen=debug,mscreen=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), MscreenCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            config,
            seed,
            output_format,
            events,
        } => cmd_replay(&input, &output, config.as_deref(), seed, output_format, events),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
        Commands::Config => {
            println!("{}", EngineConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
    output_format: OutputFormat,
    include_events: bool,
) -> Result<(), MscreenCliError> {
    let mut config = load_config(config_path)?;
    if seed.is_some() {
        config.seed = seed;
    }

    let input_data = read_input(input)?;
    let events = parse_events(&input_data)?;
    if events.is_empty() {
        return Err(MscreenCliError::NoEvents);
    }
    info!(records = events.len(), "replaying input log");

    let outcome = replay_events(&events, config)?;
    debug!(applied = outcome.applied, end_time = outcome.end_time, "replay complete");

    let value = if include_events {
        serde_json::to_value(&outcome)?
    } else {
        serde_json::to_value(&outcome.report)?
    };
    let rendered = match output_format {
        OutputFormat::Json => serde_json::to_string(&value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&value)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", rendered);
    } else {
        fs::write(output, rendered + "\n")?;
    }
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), MscreenCliError> {
    let input_data = read_input(input)?;
    let events = parse_events(&input_data)?;
    let failures = validate_events(&events);

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - failures.len(),
        invalid_events: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                action: events[f.index].action_name().to_string(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} event (index {}): {}", err.action, err.index, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(MscreenCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), MscreenCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}, report version {}", SCHEMA_VERSION, REPORT_VERSION),
    });

    if let Some(path) = config_path {
        let check = if !path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(config) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (speed {}, timeout {}s, {} trials)",
                            config.speed, config.timeout_seconds, config.trial_count
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (replay from stdin ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("mscreen Doctor Report");
        println!("=====================");
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

    if report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(MscreenCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), MscreenCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One JSON object per line, each with schema_version, t (seconds) and type:");
                println!();
                println!("  start   - task: line | square | target");
                println!("  pointer - phase: press | move | release, x, y");
                println!("  click   - x, y");
                println!("  tick    - advance the clock with no input");
                println!("  clear   - drop all results");
                println!();
                println!("Records must be in non-decreasing t order.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", output_json_schema());
            } else {
                println!("Output: screening report {}", REPORT_VERSION);
                println!();
                println!("- report_version, computed_at_utc");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- tasks: [{{ task, status, result }}] for line, square, target");
                println!("- assessment: {{ score, tier, line_score, square_score, target_score }}");
                println!("- missing: tasks without a scorable result");
                println!("- recommendations, disclaimer");
            }
        }
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MscreenCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, MscreenCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(EngineConfig::from_json(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Motor screening input event",
        "type": "object",
        "required": ["schema_version", "t", "type"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "t": { "type": "number", "minimum": 0 },
            "type": {
                "type": "string",
                "enum": ["start", "pointer", "click", "tick", "clear"]
            },
            "task": { "type": "string", "enum": ["line", "square", "target"] },
            "phase": { "type": "string", "enum": ["press", "move", "release"] },
            "x": { "type": "number" },
            "y": { "type": "number" },
            "session_id": { "type": "string" }
        }
    })
    .to_string()
}

fn output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "motor screening report",
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "tasks", "disclaimer"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "tasks": { "type": "array", "items": { "type": "object" } },
            "assessment": {
                "type": "object",
                "properties": {
                    "score": { "type": "number", "minimum": 0, "maximum": 10 },
                    "tier": { "type": "string", "enum": ["low", "moderate", "high"] },
                    "line_score": { "type": "number" },
                    "square_score": { "type": "number" },
                    "target_score": { "type": "number" }
                }
            },
            "missing": { "type": "array", "items": { "type": "string" } },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "disclaimer": { "type": "string" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum MscreenCliError {
    Io(io::Error),
    Assess(motor_screen::AssessError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for MscreenCliError {
    fn from(e: io::Error) -> Self {
        MscreenCliError::Io(e)
    }
}

impl From<motor_screen::AssessError> for MscreenCliError {
    fn from(e: motor_screen::AssessError) -> Self {
        MscreenCliError::Assess(e)
    }
}

impl From<serde_json::Error> for MscreenCliError {
    fn from(e: serde_json::Error) -> Self {
        MscreenCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MscreenCliError> for CliError {
    fn from(e: MscreenCliError) -> Self {
        use motor_screen::AssessError;

        match e {
            MscreenCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MscreenCliError::Assess(e) => {
                let (code, hint) = match &e {
                    AssessError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'mscreen config' for a valid template")
                    }
                    AssessError::ParseError(_) | AssessError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure input matches motor.input_event.v1; run 'mscreen validate'",
                    ),
                    AssessError::NonMonotonicTimestamp { .. } => {
                        ("ORDER_ERROR", "Sort records by t before replaying")
                    }
                    _ => ("ASSESS_ERROR", "Check that the log completes each task"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            MscreenCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MscreenCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            MscreenCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            MscreenCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    action: String,
    error: String,
}

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
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
