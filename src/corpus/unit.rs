/*!
 * Work units and the schema mapping used to read them.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::language_utils;

/// Field names used to read a work unit from an input record and to tag
/// the output records written for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    /// Unique unit identifier field
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Display name field
    #[serde(default = "default_name_field")]
    pub name_field: String,

    /// Field holding the language code -> document map
    #[serde(default = "default_documents_field")]
    pub documents_field: String,

    /// Categorical attribute field, if the schema carries one
    #[serde(default = "default_attribute_field")]
    pub attribute_field: Option<String>,
}

impl SchemaMapping {
    /// Records nesting documents under `TRANSCRIPTS` with a `GENDER` attribute
    pub fn transcripts() -> Self {
        Self {
            id_field: default_id_field(),
            name_field: default_name_field(),
            documents_field: "TRANSCRIPTS".to_string(),
            attribute_field: Some("GENDER".to_string()),
        }
    }

    /// Records nesting documents under `TRANSCRIPT` without an attribute
    pub fn transcript() -> Self {
        Self {
            id_field: default_id_field(),
            name_field: default_name_field(),
            documents_field: "TRANSCRIPT".to_string(),
            attribute_field: None,
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "transcripts" => Some(Self::transcripts()),
            "transcript" => Some(Self::transcript()),
            _ => None,
        }
    }
}

impl Default for SchemaMapping {
    fn default() -> Self {
        Self::transcripts()
    }
}

fn default_id_field() -> String {
    "TALK-ID".to_string()
}

fn default_name_field() -> String {
    "TALK-NAME".to_string()
}

fn default_documents_field() -> String {
    "TRANSCRIPTS".to_string()
}

fn default_attribute_field() -> Option<String> {
    Some("GENDER".to_string())
}

/// Stable unit identifier
///
/// Keeps the JSON value exactly as read so it can be written back unchanged,
/// and a canonical string key used for ledger membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    raw: Value,
    key: String,
}

impl UnitId {
    /// Build an id from a JSON value; only strings and numbers are ids
    pub fn from_value(value: Value) -> Option<Self> {
        let key = Self::key_of(&value)?;
        Some(Self { raw: value, key })
    }

    /// Canonical ledger key of a JSON id value
    ///
    /// Ids compare by type and value: the string `"101"` and the number
    /// `101` are different units, while `1` and `1.0` are the same one.
    pub fn key_of(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(format!("s:{}", s)),
            Value::Number(n) => Some(format!("n:{}", canonical_number(n))),
            _ => None,
        }
    }

    /// The id as it appeared in the input record
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Canonical key
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Integral numbers print without a fraction, whatever their JSON spelling
fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// One language's document: raw text, or segments already split upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Text(String),
    Segments(Vec<String>),
}

impl Document {
    /// True when the document holds no text at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Segments(segments) => segments.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Number of characters across the document
    pub fn char_count(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Segments(segments) => segments.iter().map(|s| s.chars().count()).sum(),
        }
    }
}

/// One translatable document pair read from the input store
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// Unique, stable identifier
    pub id: UnitId,
    /// Display label, carried through unchanged
    pub name: Value,
    /// Language code -> document
    pub documents: BTreeMap<String, Document>,
    /// Categorical attribute, present only when attribute inclusion is on
    pub attribute: Option<Value>,
}

impl WorkUnit {
    /// Map a decoded input record onto a work unit
    ///
    /// Returns the reason as a plain string on failure; the caller knows the
    /// store location and builds the error.
    pub fn from_record(
        record: Value,
        schema: &SchemaMapping,
        include_attribute: bool,
    ) -> Result<Self, String> {
        let mut object = match record {
            Value::Object(object) => object,
            other => return Err(format!("expected a JSON object, found {}", type_name(&other))),
        };

        let id_value = take_field(&mut object, &schema.id_field)?;
        let id = UnitId::from_value(id_value).ok_or_else(|| {
            format!("field '{}' must be a string or a number", schema.id_field)
        })?;
        let name = take_field(&mut object, &schema.name_field)?;

        let documents = match take_field(&mut object, &schema.documents_field)? {
            Value::Object(map) => {
                let mut documents = BTreeMap::new();
                for (code, value) in map {
                    let document: Document = serde_json::from_value(value).map_err(|_| {
                        format!(
                            "document '{}' in '{}' must be a string or a list of strings",
                            code, schema.documents_field
                        )
                    })?;
                    documents.insert(code, document);
                }
                documents
            }
            other => {
                return Err(format!(
                    "field '{}' must be an object keyed by language code, found {}",
                    schema.documents_field,
                    type_name(&other)
                ));
            }
        };

        let attribute = if include_attribute {
            let field = schema
                .attribute_field
                .as_deref()
                .ok_or_else(|| "attribute inclusion is enabled but the schema has no attribute field".to_string())?;
            Some(take_field(&mut object, field)?)
        } else {
            None
        };

        Ok(Self {
            id,
            name,
            documents,
            attribute,
        })
    }

    /// Find the document for a language code
    ///
    /// Exact key first, then a case-insensitive key, then any key naming the
    /// same ISO 639 language (`en` matches `eng`).
    pub fn document(&self, language: &str) -> Option<&Document> {
        if let Some(document) = self.documents.get(language) {
            return Some(document);
        }

        if let Some((_, document)) = self
            .documents
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(language))
        {
            return Some(document);
        }

        self.documents
            .iter()
            .find(|(code, _)| language_utils::language_codes_match(code, language))
            .map(|(_, document)| document)
    }

    /// Name as a display string
    pub fn display_name(&self) -> String {
        match &self.name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn take_field(object: &mut Map<String, Value>, field: &str) -> Result<Value, String> {
    object
        .remove(field)
        .ok_or_else(|| format!("missing field '{}'", field))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
