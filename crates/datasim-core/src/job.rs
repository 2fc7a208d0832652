use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Opaque identifier issued by the backend for an asynchronous job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state reported by the backend for an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Progress,
    Success,
    Failure,
}

impl JobStatus {
    /// SUCCESS and FAILURE end the job; polling must stop once either is
    /// observed.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

/// Record counts reported while a job is in the PROGRESS state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

impl Progress {
    /// Completion ratio clamped to `[0, 1]`. A zero `total` never divides.
    pub fn ratio(self) -> f64 {
        let total = self.total.max(1);
        (self.current as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Full snapshot of an asynchronous job as reported by one status fetch.
///
/// Every poll response replaces the previous snapshot entirely; nothing is
/// merged across fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Meaningful only while `status` is PROGRESS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present iff `status` is SUCCESS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// Present iff `status` is FAILURE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Which generated artifact a download addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Csv,
    Json,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Json => "json",
        }
    }
}

/// Backend references to the generated files, keyed by format. A key is
/// absent when that format was not produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
}

impl GeneratedFiles {
    /// Stored backend path for `kind`, when that format was produced.
    pub fn reference(&self, kind: FileKind) -> Option<&str> {
        match kind {
            FileKind::Csv => self.csv.as_deref(),
            FileKind::Json => self.json.as_deref(),
        }
    }

    /// The kinds that were actually produced, csv first.
    pub fn kinds(&self) -> Vec<FileKind> {
        let mut kinds = Vec::new();
        if self.csv.is_some() {
            kinds.push(FileKind::Csv);
        }
        if self.json.is_some() {
            kinds.push(FileKind::Json);
        }
        kinds
    }
}

/// Textual previews bundled with a completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Previews {
    pub schema_json: String,
    pub sample_csv: String,
}

/// Output bundle of a completed generation, shared by the synchronous
/// endpoint and successful asynchronous jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub records_generated: u64,
    #[serde(default)]
    pub files: GeneratedFiles,
    /// One example record, as generated.
    #[serde(default)]
    pub sample_record: serde_json::Value,
    pub previews: Previews,
    /// Echo of the submitted schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Progress.is_terminal());
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failure.is_terminal());
    }

    #[test]
    fn ratio_never_divides_by_zero() {
        let progress = Progress {
            current: 5,
            total: 0,
        };
        assert_eq!(progress.ratio(), 1.0);
    }

    #[test]
    fn ratio_is_clamped() {
        let progress = Progress {
            current: 150,
            total: 100,
        };
        assert_eq!(progress.ratio(), 1.0);

        let progress = Progress {
            current: 10,
            total: 100,
        };
        assert!((progress.ratio() - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn result_parses_a_schema_echo_with_null_optionals() {
        // the backend serializes fields submitted without constraints as
        // "constraints": null rather than omitting the key
        let json = r#"{
            "records_generated": 50,
            "files": {"csv": "generated_data/customers_20260831.csv"},
            "sample_record": {"id": 1},
            "previews": {"schema_json": "{}", "sample_csv": "id\n1"},
            "schema": {
                "table_name": "customers",
                "fields": [
                    {"name": "id", "type": "INTEGER", "mode": "REQUIRED", "constraints": null},
                    {"name": "email", "type": "STRING", "mode": null, "constraints": null}
                ]
            }
        }"#;
        let result: GenerationResult = serde_json::from_str(json).expect("parse result");
        let schema = result.schema.expect("schema echo");
        assert!(schema.fields[0].constraints.is_empty());
        assert_eq!(schema.fields[1].mode, crate::schema::FieldMode::Nullable);
        assert!(schema.fields[1].constraints.is_empty());
    }

    #[test]
    fn file_kinds_follow_presence() {
        let files = GeneratedFiles {
            csv: Some("generated_data/users.csv".to_string()),
            json: None,
        };
        assert_eq!(files.kinds(), vec![FileKind::Csv]);
        assert_eq!(
            files.reference(FileKind::Csv),
            Some("generated_data/users.csv")
        );
        assert_eq!(files.reference(FileKind::Json), None);
    }
}
