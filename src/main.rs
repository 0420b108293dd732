//! Debug CLI for Power BI refresh history collection.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use serde_json::Value;

use refresh_collector::observability::init_logging;
use refresh_collector::{
    CollectorConfig, Error, ErrorCategory, PowerBiClient, RefreshContext, RefreshEvent,
    normalize_refresh_history,
};

const EXIT_USAGE: u8 = 2;
const EXIT_VALIDATION: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "refresh-collector")]
#[command(version, about = "Debug CLI for Power BI refresh history collection", long_about = None)]
#[command(group(
    ArgGroup::new("action").args(["list_workspaces", "list_datasets", "refresh_history"])
))]
struct Cli {
    /// List workspaces the service principal can access
    #[arg(long)]
    list_workspaces: bool,

    /// List datasets in the given workspace
    #[arg(long)]
    list_datasets: bool,

    /// Fetch refresh history for a dataset (default)
    #[arg(long)]
    refresh_history: bool,

    #[arg(long)]
    workspace_id: Option<String>,

    #[arg(long)]
    dataset_id: Option<String>,

    #[arg(long)]
    workspace_name: Option<String>,

    #[arg(long)]
    dataset_name: Option<String>,

    /// Maximum number of refreshes to request
    #[arg(long)]
    top: Option<u32>,

    /// Print raw refresh records instead of normalized events
    #[arg(long)]
    raw: bool,

    #[arg(long)]
    pretty: bool,

    /// JSON Schema for normalized events (defaults to the built-in RefreshEvent schema)
    #[arg(long, value_name = "FILE")]
    schema_path: Option<PathBuf>,

    /// Skip JSON Schema validation of normalized events
    #[arg(long)]
    no_validate_schema: bool,

    /// Print the RefreshEvent JSON Schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_schema {
        return emit(&RefreshEvent::json_schema(), true);
    }

    let config = match CollectorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };
    init_logging(&config.log_level);

    match run(&cli, &config).await {
        Ok(payload) => emit(&payload, cli.pretty),
        Err(Failure::Usage(message)) => {
            eprintln!("{}", message);
            ExitCode::from(EXIT_USAGE)
        }
        Err(Failure::Schema(errors)) => {
            eprintln!("Schema validation errors:");
            for error in errors {
                eprintln!("- {}", error);
            }
            ExitCode::from(EXIT_VALIDATION)
        }
        Err(Failure::Collector(e)) => {
            tracing::error!(error = %e, category = ?e.category(), "Collection failed");
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

enum Failure {
    Usage(String),
    Schema(Vec<String>),
    Collector(Error),
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Failure::Collector(e)
    }
}

async fn run(cli: &Cli, config: &CollectorConfig) -> Result<Value, Failure> {
    let client = PowerBiClient::from_config(config)?;

    if cli.list_workspaces {
        return Ok(records_value(client.list_workspaces().await?));
    }

    if cli.list_datasets {
        let workspace_id = cli.workspace_id.as_deref().ok_or_else(|| {
            Failure::Usage("--workspace-id is required for --list-datasets".into())
        })?;
        return Ok(records_value(client.list_datasets(workspace_id).await?));
    }

    let (Some(workspace_id), Some(dataset_id)) = (&cli.workspace_id, &cli.dataset_id) else {
        return Err(Failure::Usage(
            "--workspace-id and --dataset-id are required for refresh history".into(),
        ));
    };

    let records = client
        .get_refresh_history(workspace_id, dataset_id, cli.top)
        .await?;
    if cli.raw {
        return Ok(records_value(records));
    }

    let mut context = RefreshContext::new(workspace_id.as_str(), dataset_id.as_str());
    if let Some(name) = &cli.workspace_name {
        context = context.with_workspace_name(name.as_str());
    }
    if let Some(name) = &cli.dataset_name {
        context = context.with_dataset_name(name.as_str());
    }

    let schema = if cli.no_validate_schema {
        None
    } else {
        Some(load_schema(cli.schema_path.as_deref()).map_err(Failure::Usage)?)
    };

    let events = normalize_refresh_history(&records, &context)?;
    let payload = serde_json::to_value(&events)
        .map_err(|e| Failure::Schema(vec![format!("serialization failed: {}", e)]))?;

    if let Some(schema) = schema {
        let errors = validate_events(&payload, &schema).map_err(Failure::Usage)?;
        if !errors.is_empty() {
            return Err(Failure::Schema(errors));
        }
    }
    Ok(payload)
}

fn load_schema(path: Option<&Path>) -> Result<Value, String> {
    let Some(path) = path else {
        return Ok(RefreshEvent::json_schema());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read schema {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Schema {} is not valid JSON: {}", path.display(), e))
}

fn records_value(records: Vec<refresh_collector::RawRecord>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

/// Validate each event against `schema` (Draft 2020-12, formats asserted).
///
/// Returns one `[index] message` line per violation; `Err` when the schema
/// itself cannot be compiled.
fn validate_events(events: &Value, schema: &Value) -> Result<Vec<String>, String> {
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .should_validate_formats(true)
        .build(schema)
        .map_err(|e| format!("Invalid schema: {}", e))?;

    let Some(items) = events.as_array() else {
        return Ok(vec!["expected an array of events".into()]);
    };

    Ok(items
        .iter()
        .enumerate()
        .flat_map(|(index, event)| {
            validator
                .iter_errors(event)
                .map(move |error| format!("[{}] {}", index, error))
                .collect::<Vec<_>>()
        })
        .collect())
}

fn exit_code(error: &Error) -> u8 {
    match error.category() {
        ErrorCategory::Configuration => EXIT_USAGE,
        ErrorCategory::Validation => EXIT_VALIDATION,
        ErrorCategory::Authorization => 4,
        ErrorCategory::NotFound => 5,
        ErrorCategory::Transient => 6,
        ErrorCategory::Request => 7,
        ErrorCategory::Network => 8,
    }
}

fn emit(payload: &Value, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_VALIDATION)
        }
    }
}
