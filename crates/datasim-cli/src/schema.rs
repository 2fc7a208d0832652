use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use datasim_core::{validate_schema, FieldMode, FieldType, Schema, SchemaEditor};

use crate::CliError;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    command: SchemaCommand,
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Write a starter schema file with a single default field.
    Init {
        file: PathBuf,
        #[arg(long, default_value = "my_table")]
        table_name: String,
    },
    /// Append a field to a schema file.
    AddField {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type", value_parser = parse_field_type)]
        field_type: Option<FieldType>,
        #[arg(long, value_parser = parse_field_mode)]
        mode: Option<FieldMode>,
    },
    /// Remove the field at INDEX (zero-based).
    RemoveField { file: PathBuf, index: usize },
    /// Check a schema file against the submission rules.
    Validate { file: PathBuf },
}

pub fn run(args: SchemaArgs) -> Result<(), CliError> {
    match args.command {
        SchemaCommand::Init { file, table_name } => {
            let schema = Schema::new(&table_name);
            save(&file, &schema)?;
            println!("Wrote {}", file.display());
            Ok(())
        }
        SchemaCommand::AddField {
            file,
            name,
            field_type,
            mode,
        } => {
            let mut editor = editor(&file)?;
            let index = editor.add_field();
            let mut field = editor.active_field().clone();
            if let Some(name) = name {
                field.name = name;
            }
            if let Some(field_type) = field_type {
                field.field_type = field_type;
            }
            if let Some(mode) = mode {
                field.mode = mode;
            }
            editor.update_field(index, field)?;
            save(&file, editor.schema())?;
            println!("Added field {index}");
            Ok(())
        }
        SchemaCommand::RemoveField { file, index } => {
            let mut editor = editor(&file)?;
            let removed = editor.remove_field(index)?;
            save(&file, editor.schema())?;
            println!("Removed field '{}'", removed.name);
            Ok(())
        }
        SchemaCommand::Validate { file } => {
            let schema = load(&file)?;
            validate_schema(&schema)?;
            println!("{} is valid", file.display());
            Ok(())
        }
    }
}

pub fn load(path: &Path) -> Result<Schema, CliError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|err| CliError::SchemaFile(err.to_string()))
}

fn editor(path: &Path) -> Result<SchemaEditor, CliError> {
    Ok(SchemaEditor::new(load(path)?)?)
}

fn save(path: &Path, schema: &Schema) -> Result<(), CliError> {
    let json =
        serde_json::to_string_pretty(schema).map_err(|err| CliError::SchemaFile(err.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

fn parse_field_type(value: &str) -> Result<FieldType, String> {
    match value.to_ascii_uppercase().as_str() {
        "STRING" => Ok(FieldType::String),
        "INTEGER" => Ok(FieldType::Integer),
        "DECIMAL" => Ok(FieldType::Decimal),
        "BOOLEAN" => Ok(FieldType::Boolean),
        "DATE" => Ok(FieldType::Date),
        "TIMESTAMP" => Ok(FieldType::Timestamp),
        "RECORD" => Ok(FieldType::Record),
        other => Err(format!("unknown field type '{other}'")),
    }
}

fn parse_field_mode(value: &str) -> Result<FieldMode, String> {
    match value.to_ascii_uppercase().as_str() {
        "NULLABLE" => Ok(FieldMode::Nullable),
        "REQUIRED" => Ok(FieldMode::Required),
        "REPEATED" => Ok(FieldMode::Repeated),
        other => Err(format!("unknown field mode '{other}'")),
    }
}
