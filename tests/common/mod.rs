#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use change_relay::dynamodb::StreamEvent;
use change_relay::sink::{BatchSink, MessageSink};
use change_relay::{Error, Result};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const ORDERS_ARN: &str =
    "arn:aws:dynamodb:us-west-2:123456789012:table/orders/stream/2024-01-01T00:00:00.000";

/// Records every publish call, optionally failing the n-th one.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<(String, Bytes)>>,
    pub fail_on_call: Option<usize>,
}

impl RecordingSink {
    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::default(),
            fail_on_call: Some(call),
        }
    }

    pub fn calls(&self) -> Vec<(String, Bytes)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, destination: &str, blob: Bytes) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((destination.to_string(), blob));
        if self.fail_on_call == Some(calls.len()) {
            return Err(Error::Publish {
                destination: destination.to_string(),
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BatchSink for RecordingSink {
    async fn publish_batch(&self, destination: &str, blob: Bytes) -> Result<()> {
        self.record(destination, blob)
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
        self.record(subject, payload)
    }
}

/// A stream record inserting the given events, versions starting at 1.
pub fn insert_record(arn: &str, events: &[&[u8]]) -> Value {
    let mut image = serde_json::Map::new();
    image.insert("key".to_string(), json!({ "S": "order-1" }));
    for (i, data) in events.iter().enumerate() {
        image.insert(format!("_{}", i + 1), json!({ "B": STANDARD.encode(data) }));
    }

    json!({
        "eventID": "1",
        "eventName": "INSERT",
        "eventSourceARN": arn,
        "dynamodb": { "NewImage": Value::Object(image) },
    })
}

pub fn stream_event(records: Vec<Value>) -> StreamEvent {
    serde_json::from_value(json!({ "Records": records })).unwrap()
}
