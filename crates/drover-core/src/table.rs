//! Table definitions and gathered results.
//!
//! [`TableSpec`] and [`Field`] are configuration: they describe *what* to
//! retrieve and are immutable once a gather starts. [`TableBatch`],
//! [`TableRow`], and [`Value`] are the artifacts one gather produces.

use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A decoded telemetry value.
///
/// The protocol layer decodes raw agent responses into this closed set; the
/// gathering core only carries values, it never reinterprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer (gauges, deltas).
    Integer(i64),
    /// Unsigned integer (counters).
    Unsigned(u64),
    /// Floating point.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Text.
    Text(String),
    /// Raw bytes the protocol layer could not decode further.
    Bytes(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// One field within a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Name the field is emitted under on gathered rows.
    pub name: String,
    /// Protocol object identifier the builder retrieves this field from.
    pub oid: String,
    /// When set, the decoded value lands in the row's tag map instead of its
    /// field map.
    #[serde(default)]
    pub is_tag: bool,
}

impl Field {
    /// Creates a data field.
    #[must_use]
    pub fn new(name: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oid: oid.into(),
            is_tag: false,
        }
    }

    /// Creates a field whose value becomes a row tag.
    #[must_use]
    pub fn tag(name: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oid: oid.into(),
            is_tag: true,
        }
    }
}

/// Definition of one telemetry table.
///
/// Shared read-only by every worker in a pool; cheap to clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name, used for emitted batches and error context.
    pub name: String,
    /// Fields the builder retrieves, in emission order.
    pub fields: Vec<Field>,
    /// Tag keys copied from the connection's top-level tag context onto every
    /// row of this table.
    #[serde(default)]
    pub inherit_tags: Vec<String>,
    /// Ask the builder to emit each row's table index as a tag.
    #[serde(default)]
    pub index_as_tag: bool,
}

impl TableSpec {
    /// Creates an empty definition with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Synthesizes the implicit top-level definition for a source: its scalar
    /// fields as a table with no inherited tags and no index.
    #[must_use]
    pub fn top_level(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            inherit_tags: Vec::new(),
            index_as_tag: false,
        }
    }
}

/// One gathered row: a tag map plus decoded data fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Tag key to tag value. Writes to an existing key overwrite.
    pub tags: HashMap<String, String>,
    /// Field name to decoded value.
    pub fields: HashMap<String, Value>,
}

/// The rows produced by one gather of one table against one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBatch {
    /// Name of the definition that produced this batch.
    pub name: String,
    /// When the builder finished collecting.
    pub collected_at: SystemTime,
    /// Rows in the builder's emitted order.
    pub rows: Vec<TableRow>,
}

impl TableBatch {
    /// Creates an empty batch stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collected_at: SystemTime::now(),
            rows: Vec::new(),
        }
    }

    /// Number of rows in the batch.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the builder emitted no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_spec_has_no_inheritance() {
        let spec = TableSpec::top_level("device", vec![Field::new("uptime", "1.3.6.1.2.1.1.3.0")]);
        assert_eq!(spec.name, "device");
        assert_eq!(spec.fields.len(), 1);
        assert!(spec.inherit_tags.is_empty());
        assert!(!spec.index_as_tag);
    }

    #[test]
    fn test_tag_field_constructor() {
        let field = Field::tag("ifDescr", "1.3.6.1.2.1.2.2.1.2");
        assert!(field.is_tag);
        assert!(!Field::new("ifInOctets", "1.3.6.1.2.1.2.2.1.10").is_tag);
    }

    #[test]
    fn test_spec_serde_round_trip() {
        let spec = TableSpec {
            name: "interfaces".to_string(),
            fields: vec![
                Field::tag("ifDescr", "1.3.6.1.2.1.2.2.1.2"),
                Field::new("ifInOctets", "1.3.6.1.2.1.2.2.1.10"),
            ],
            inherit_tags: vec!["region".to_string()],
            index_as_tag: true,
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: TableSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_spec_deserialize_defaults_optional_knobs() {
        let spec: TableSpec =
            serde_json::from_str(r#"{"name": "interfaces", "fields": []}"#).unwrap();
        assert!(spec.inherit_tags.is_empty());
        assert!(!spec.index_as_tag);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Unsigned(42).to_string(), "42");
        assert_eq!(Value::Text("eth0".into()).to_string(), "eth0");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "dead");
    }

    #[test]
    fn test_empty_batch() {
        let batch = TableBatch::new("interfaces");
        assert!(batch.is_empty());
        assert_eq!(batch.row_count(), 0);
    }
}
