use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constraints::Constraints;
use crate::error::{Error, Result};

/// The backend echoes submitted schemas with `null` for absent optional
/// keys; treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Data type of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Record,
}

/// Nullability mode of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// One column definition: name, data type, mode, and optional constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: FieldMode,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Constraints::is_empty"
    )]
    pub constraints: Constraints,
}

impl Field {
    /// New STRING/NULLABLE field with no constraints.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            mode: FieldMode::Nullable,
            constraints: Constraints::default(),
        }
    }
}

/// The user-defined table definition driving generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub table_name: String,
    /// Field order is meaningful: display order is generation order.
    pub fields: Vec<Field>,
}

impl Schema {
    /// New schema holding a single default field, the smallest valid shape.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            fields: vec![Field::named("field_1")],
        }
    }
}

/// Editing surface over a [`Schema`], tracking the field currently selected
/// for editing.
///
/// Edits preserve the invariant that a schema always retains at least one
/// field; a removal that would violate it is rejected with
/// [`Error::LastField`] rather than silently ignored.
#[derive(Debug, Clone)]
pub struct SchemaEditor {
    schema: Schema,
    active: usize,
}

impl SchemaEditor {
    /// Wrap an existing schema. Rejects a schema with no fields.
    pub fn new(schema: Schema) -> Result<Self> {
        if schema.fields.is_empty() {
            return Err(Error::InvalidSchema(
                "a schema needs at least one field".to_string(),
            ));
        }
        Ok(Self { schema, active: 0 })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }

    /// Index of the field currently selected for editing.
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_field(&self) -> &Field {
        &self.schema.fields[self.active]
    }

    /// Select the field at `index` for editing.
    pub fn set_active(&mut self, index: usize) -> Result<()> {
        if index >= self.schema.fields.len() {
            return Err(Error::FieldIndex(index));
        }
        self.active = index;
        Ok(())
    }

    /// Append a `field_<n+1>` default field, make it active, and return its
    /// index.
    pub fn add_field(&mut self) -> usize {
        let name = format!("field_{}", self.schema.fields.len() + 1);
        self.schema.fields.push(Field::named(name));
        self.active = self.schema.fields.len() - 1;
        self.active
    }

    /// Remove the field at `index`, re-clamping the active index.
    pub fn remove_field(&mut self, index: usize) -> Result<Field> {
        if index >= self.schema.fields.len() {
            return Err(Error::FieldIndex(index));
        }
        if self.schema.fields.len() == 1 {
            return Err(Error::LastField);
        }
        let removed = self.schema.fields.remove(index);
        self.active = self.active.min(self.schema.fields.len() - 1);
        Ok(removed)
    }

    /// Replace the field at `index` wholesale. No validation beyond the index
    /// check; callers validate before submission.
    pub fn update_field(&mut self, index: usize, field: Field) -> Result<()> {
        let slot = self
            .schema
            .fields
            .get_mut(index)
            .ok_or(Error::FieldIndex(index))?;
        *slot = field;
        Ok(())
    }

    pub fn set_table_name(&mut self, name: impl Into<String>) {
        self.schema.table_name = name.into();
    }
}
