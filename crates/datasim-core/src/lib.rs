//! Core contracts and helpers for Datasim.
//!
//! This crate defines the canonical schema types, the generation request and
//! job models, and the validation helpers shared by the backend client and
//! the CLI. It is pure data: no I/O happens here.

pub mod constraints;
pub mod error;
pub mod job;
pub mod request;
pub mod schema;
pub mod validation;

pub use constraints::Constraints;
pub use error::{Error, Result};
pub use job::{
    FileKind, GeneratedFiles, GenerationResult, Job, JobId, JobStatus, Previews, Progress,
};
pub use request::{GenerationRequest, OutputFormat};
pub use schema::{Field, FieldMode, FieldType, Schema, SchemaEditor};
pub use validation::validate_schema;
