use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A DynamoDB Streams invocation payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventName {
    Insert,
    Modify,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    pub event_name: EventName,
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
    pub dynamodb: StreamChange,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamChange {
    #[serde(default)]
    pub keys: Item,
    pub new_image: Option<Item>,
    pub old_image: Option<Item>,
    pub sequence_number: Option<String>,
}

pub type Item = HashMap<String, AttributeValue>;

/// A typed DynamoDB attribute as it appears in stream JSON.
///
/// Binary values are carried base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    SS(Vec<String>),
    NS(Vec<String>),
    BS(Vec<String>),
    M(HashMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::SS(_) => "SS",
            AttributeValue::NS(_) => "NS",
            AttributeValue::BS(_) => "BS",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
        }
    }
}

/// One logical change extracted from a stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub version: u64,
    pub data: Bytes,
}

impl ChangeRecord {
    pub fn new(version: u64, data: impl Into<Bytes>) -> Self {
        Self {
            version,
            data: data.into(),
        }
    }
}
