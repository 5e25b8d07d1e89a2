//! BigQuery standard tables
//!
//! [`StandardTableDefinition`] is the client-side model; [`Table`] is the JSON
//! resource exchanged with the REST API. BigQuery encodes 64-bit integers as
//! decimal strings, which the wire types handle transparently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource type of a standard table
pub const TABLE_TYPE: &str = "TABLE";

// =========================================================================
// Schema
// =========================================================================

/// Column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    Bytes,
    Integer,
    Float,
    Numeric,
    Boolean,
    Timestamp,
    Date,
    Time,
    Datetime,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMode {
    Nullable,
    Required,
    Repeated,
}

/// A column, or a nested record of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FieldMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Self::new(name, FieldType::Record)
        }
    }

    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn of(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

// =========================================================================
// Partitioning and streaming buffer
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartitioningType {
    Day,
}

/// Time partitioning of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePartitioning {
    #[serde(rename = "type")]
    pub partitioning_type: PartitioningType,
    /// How long a partition is kept, in milliseconds
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub expiration_ms: Option<i64>,
}

impl TimePartitioning {
    pub fn of(partitioning_type: PartitioningType) -> Self {
        Self {
            partitioning_type,
            expiration_ms: None,
        }
    }

    pub fn with_expiration_ms(mut self, expiration_ms: i64) -> Self {
        self.expiration_ms = Some(expiration_ms);
        self
    }
}

/// Estimates for the rows still in a table's streaming buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingBuffer {
    /// Lower-bound estimate of buffered rows
    pub estimated_rows: i64,
    /// Lower-bound estimate of buffered bytes
    pub estimated_bytes: i64,
    /// Oldest buffered entry, milliseconds since the epoch
    pub oldest_entry_time: i64,
}

impl StreamingBuffer {
    pub fn oldest_entry_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.oldest_entry_time)
    }

    fn to_wire(self) -> WireStreamingBuffer {
        WireStreamingBuffer {
            estimated_rows: Some(self.estimated_rows),
            estimated_bytes: Some(self.estimated_bytes),
            oldest_entry_time: Some(self.oldest_entry_time),
        }
    }

    fn from_wire(wire: WireStreamingBuffer) -> Self {
        Self {
            estimated_rows: wire.estimated_rows.unwrap_or(0),
            estimated_bytes: wire.estimated_bytes.unwrap_or(0),
            oldest_entry_time: wire.oldest_entry_time.unwrap_or(0),
        }
    }
}

// =========================================================================
// Wire representation
// =========================================================================

/// Table resource as sent and received by the REST API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub num_bytes: Option<i64>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_buffer: Option<WireStreamingBuffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_partitioning: Option<TimePartitioning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStreamingBuffer {
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub estimated_rows: Option<i64>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub estimated_bytes: Option<i64>,
    #[serde(default, with = "int64", skip_serializing_if = "Option::is_none")]
    pub oldest_entry_time: Option<i64>,
}

// =========================================================================
// Standard table definition
// =========================================================================

/// Definition of a standard BigQuery table.
///
/// Size, location and streaming buffer are reported by the service and can
/// only come from [`StandardTableDefinition::from_wire`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardTableDefinition {
    schema: Option<Schema>,
    num_bytes: Option<i64>,
    num_rows: Option<i64>,
    location: Option<String>,
    streaming_buffer: Option<StreamingBuffer>,
    time_partitioning: Option<TimePartitioning>,
}

impl StandardTableDefinition {
    pub fn builder() -> StandardTableDefinitionBuilder {
        StandardTableDefinitionBuilder::default()
    }

    /// Definition with just a schema
    pub fn of(schema: Schema) -> Self {
        Self::builder().schema(schema).build()
    }

    pub fn table_type(&self) -> &'static str {
        TABLE_TYPE
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Size in bytes, excluding the streaming buffer
    pub fn num_bytes(&self) -> Option<i64> {
        self.num_bytes
    }

    /// Row count, excluding the streaming buffer
    pub fn num_rows(&self) -> Option<i64> {
        self.num_rows
    }

    /// Geographic location, inherited from the dataset
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn streaming_buffer(&self) -> Option<&StreamingBuffer> {
        self.streaming_buffer.as_ref()
    }

    /// `None` if the table is not time-partitioned
    pub fn time_partitioning(&self) -> Option<&TimePartitioning> {
        self.time_partitioning.as_ref()
    }

    pub fn to_builder(&self) -> StandardTableDefinitionBuilder {
        StandardTableDefinitionBuilder {
            definition: self.clone(),
        }
    }

    pub fn to_wire(&self) -> Table {
        Table {
            table_type: Some(TABLE_TYPE.to_string()),
            schema: self.schema.clone(),
            num_bytes: self.num_bytes,
            num_rows: self.num_rows,
            location: self.location.clone(),
            streaming_buffer: self.streaming_buffer.map(StreamingBuffer::to_wire),
            time_partitioning: self.time_partitioning,
        }
    }

    pub fn from_wire(table: Table) -> Self {
        Self {
            schema: table.schema,
            num_bytes: table.num_bytes,
            num_rows: table.num_rows,
            location: table.location,
            streaming_buffer: table.streaming_buffer.map(StreamingBuffer::from_wire),
            time_partitioning: table.time_partitioning,
        }
    }
}

/// Builder for [`StandardTableDefinition`]
#[derive(Debug, Clone, Default)]
pub struct StandardTableDefinitionBuilder {
    definition: StandardTableDefinition,
}

impl StandardTableDefinitionBuilder {
    pub fn schema(mut self, schema: Schema) -> Self {
        self.definition.schema = Some(schema);
        self
    }

    /// Leave unset for a table that is not time-partitioned
    pub fn time_partitioning(mut self, time_partitioning: TimePartitioning) -> Self {
        self.definition.time_partitioning = Some(time_partitioning);
        self
    }

    pub fn build(self) -> StandardTableDefinition {
        self.definition
    }
}

/// Serde adapter for optional int64 values encoded as JSON strings
mod int64 {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            None => Ok(None),
            Some(StringOrNumber::Number(n)) => Ok(Some(n)),
            Some(StringOrNumber::String(s)) => s
                .parse()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
