use std::collections::BTreeSet;

use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Validate a schema before submission.
///
/// This checks:
/// - non-empty table and field names
/// - duplicate field names
/// - constraint sanity: `pattern` compiles, `min <= max`, options non-blank
pub fn validate_schema(schema: &Schema) -> Result<()> {
    if schema.table_name.trim().is_empty() {
        return Err(Error::InvalidSchema(
            "table name must not be empty".to_string(),
        ));
    }
    if schema.fields.is_empty() {
        return Err(Error::InvalidSchema("schema has no fields".to_string()));
    }

    let mut seen = BTreeSet::new();
    for field in &schema.fields {
        if field.name.trim().is_empty() {
            return Err(Error::InvalidSchema(
                "field name must not be empty".to_string(),
            ));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate field name: {}",
                field.name
            )));
        }

        let constraints = &field.constraints;
        if let Some(pattern) = &constraints.pattern {
            Regex::new(pattern).map_err(|err| {
                Error::InvalidSchema(format!("field {}: invalid pattern: {err}", field.name))
            })?;
        }
        if let (Some(min), Some(max)) = (constraints.min, constraints.max) {
            if min > max {
                return Err(Error::InvalidSchema(format!(
                    "field {}: min {min} exceeds max {max}",
                    field.name
                )));
            }
        }
        if let Some(options) = &constraints.options {
            if options.iter().any(|option| option.trim().is_empty()) {
                return Err(Error::InvalidSchema(format!(
                    "field {}: blank option value",
                    field.name
                )));
            }
        }
    }

    Ok(())
}
