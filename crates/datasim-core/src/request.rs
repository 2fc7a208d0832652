use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Output format requested for the generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// One generation submission, derived from a schema snapshot.
///
/// Built at submit time and sent as-is to both the synchronous and the
/// asynchronous endpoint; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    pub schema: Schema,
    pub record_count: u32,
    pub output_format: OutputFormat,
}

impl GenerationRequest {
    pub fn new(schema: Schema, record_count: u32, output_format: OutputFormat) -> Self {
        Self {
            schema,
            record_count,
            output_format,
        }
    }
}
