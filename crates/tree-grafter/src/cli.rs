//! Core logic behind the `parse-openapi` binary.
//!
//! The binary reads a document from stdin, runs the OpenAPI passes and
//! writes the result to stdout in the format it was read in.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::depth::limit_depth;
use crate::openapi::{add_nulls, hide_pagination, openapi_pipeline};
use crate::transform::{Pipeline, TransformError, Transformation};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid JSON input: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid YAML input: {0}")]
    Yaml(#[source] serde_yaml::Error),
    #[error("YAML input has no JSON equivalent: {0}")]
    YamlToJson(#[source] serde_json::Error),
    #[error("cannot write JSON output: {0}")]
    JsonOutput(#[source] serde_json::Error),
    #[error("cannot write YAML output: {0}")]
    YamlOutput(#[source] serde_yaml::Error),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("unknown format {0:?}, expected \"json\" or \"yaml\"")]
    UnknownFormat(String),
}

// ── Options ───────────────────────────────────────────────────────────────

/// Input and output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

impl FromStr for Format {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub format: Format,
    /// Collapse paginated list schemas to their item schema.
    pub hide_pagination: bool,
    /// Make every typed property nullable.
    pub add_nulls: bool,
    /// Truncate the document below this path length.
    pub max_depth: Option<usize>,
}

// ── Documents ─────────────────────────────────────────────────────────────

/// Parse a document in the given format.
///
/// YAML goes through `serde_yaml::Value` first so that non-string mapping
/// keys, such as HTTP status codes, come out as strings.
pub fn read_document(text: &str, format: Format) -> Result<Value, CliError> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(CliError::Json),
        Format::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(CliError::Yaml)?;
            serde_json::to_value(yaml).map_err(CliError::YamlToJson)
        }
    }
}

/// Render a document in the given format, newline terminated.
pub fn write_document(doc: &Value, format: Format) -> Result<String, CliError> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_string_pretty(doc).map_err(CliError::JsonOutput)?;
            out.push('\n');
            Ok(out)
        }
        Format::Yaml => serde_yaml::to_string(doc).map_err(CliError::YamlOutput),
    }
}

// ── Passes ────────────────────────────────────────────────────────────────

/// The passes selected by `options`, in the order they run: references,
/// `allOf`, then each optional pass.
pub fn build_pipeline(options: &CliOptions) -> Pipeline {
    let mut pipeline = openapi_pipeline();
    if options.hide_pagination {
        pipeline = pipeline.then(Transformation::new().with(hide_pagination));
    }
    if options.add_nulls {
        pipeline = pipeline.then(Transformation::new().with(add_nulls));
    }
    if let Some(max) = options.max_depth {
        pipeline = pipeline.then(Transformation::new().with(limit_depth(max)));
    }
    pipeline
}

/// Read, transform and render a whole document.
pub fn run(input: &str, options: &CliOptions) -> Result<String, CliError> {
    let doc = read_document(input, options.format)?;
    let pipeline = build_pipeline(options);
    debug!(format = %options.format, passes = pipeline.len(), "transforming document");
    let out = pipeline.apply(&doc)?;
    write_document(&out, options.format)
}

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `warn`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Tests ─────────────────────────────────────────────────────────────────
