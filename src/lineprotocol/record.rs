use indexmap::IndexMap;

use crate::lineprotocol::FieldValue;

/// One line-protocol point: a measurement name, indexed tag strings, typed
/// field values, and an optional nanosecond epoch timestamp. Tags and fields
/// are emitted in insertion order.
///
/// A well-formed record has a non-empty measurement and at least one field;
/// that is a caller contract, not something `encode` reports at runtime.
#[derive(Debug, Clone)]
pub struct Record {
    measurement: String,
    tags: IndexMap<String, String>,
    fields: IndexMap<String, FieldValue>,
    timestamp: Option<i64>,
}

impl Record {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: IndexMap::new(),
            fields: IndexMap::new(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    pub fn add_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Renders the record as one line of line-protocol text, without a
    /// trailing newline:
    ///
    /// ```text
    /// <measurement>[,<tag>=<value>,...] <field>=<value>,... [<timestamp>]
    /// ```
    pub fn encode(&self) -> String {
        debug_assert!(!self.measurement.is_empty());
        debug_assert!(!self.fields.is_empty());

        let mut line = escape_measurement(&self.measurement);

        for (name, value) in &self.tags {
            line.push(',');
            line.push_str(&escape(name));
            line.push('=');
            line.push_str(&escape(value));
        }

        line.push(' ');
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape(name));
            line.push('=');
            push_field_value(&mut line, value);
        }

        if let Some(nanos) = self.timestamp {
            line.push(' ');
            line.push_str(&nanos.to_string());
        }

        line
    }
}

fn push_field_value(line: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Integer(v) => {
            line.push_str(&v.to_string());
            line.push('i');
        }
        FieldValue::Float(v) => line.push_str(&v.to_string()),
        FieldValue::Boolean(true) => line.push('t'),
        FieldValue::Boolean(false) => line.push('f'),
        FieldValue::Text(v) => {
            line.push('"');
            line.push_str(&escape_quoted(v));
            line.push('"');
        }
    }
}

// Measurement names only escape commas and spaces; backslashes pass through
// unchanged. This asymmetry with the general rule is part of the format.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

// Backslashes first, since the remaining characters escape with backslashes.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
        .replace(',', "\\,")
}

fn escape_quoted(s: &str) -> String {
    escape(s).replace('"', "\\\"")
}
