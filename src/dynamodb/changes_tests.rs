#[cfg(test)]
mod tests {
    use super::super::changes::changes;
    use super::super::types::*;
    use crate::Error;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    const ARN: &str = "arn:aws:dynamodb:us-west-2:123456789012:table/orders/stream/2024-01-01T00:00:00.000";

    fn binary(data: &[u8]) -> serde_json::Value {
        json!({ "B": STANDARD.encode(data) })
    }

    fn create_record(event_name: &str, new_image: serde_json::Value, old_image: Option<serde_json::Value>) -> StreamRecord {
        let mut dynamodb = json!({
            "Keys": { "key": { "S": "order-1" } },
            "NewImage": new_image,
            "SequenceNumber": "111",
        });
        if let Some(old) = old_image {
            dynamodb["OldImage"] = old;
        }

        serde_json::from_value(json!({
            "eventID": "1",
            "eventName": event_name,
            "eventSourceARN": ARN,
            "dynamodb": dynamodb,
        }))
        .unwrap()
    }

    #[test]
    fn test_insert_yields_events_in_version_order() {
        let record = create_record(
            "INSERT",
            json!({
                "key": { "S": "order-1" },
                "_2": binary(b"second"),
                "_1": binary(b"first"),
                "_10": binary(b"tenth"),
            }),
            None,
        );

        let changes = changes(&record).unwrap();
        let versions: Vec<u64> = changes.iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![1, 2, 10]);
        assert_eq!(&changes[0].data[..], b"first");
        assert_eq!(&changes[2].data[..], b"tenth");
    }

    #[test]
    fn test_modify_only_yields_new_attributes() {
        let record = create_record(
            "MODIFY",
            json!({
                "key": { "S": "order-1" },
                "_1": binary(b"first"),
                "_2": binary(b"second"),
            }),
            Some(json!({
                "key": { "S": "order-1" },
                "_1": binary(b"first"),
            })),
        );

        let changes = changes(&record).unwrap();
        assert_eq!(changes, vec![ChangeRecord::new(2, &b"second"[..])]);
    }

    #[test]
    fn test_remove_yields_nothing() {
        let record = create_record("REMOVE", json!({ "_1": binary(b"gone") }), None);
        assert!(changes(&record).unwrap().is_empty());
    }

    #[test]
    fn test_missing_new_image_yields_nothing() {
        let record: StreamRecord = serde_json::from_value(json!({
            "eventName": "MODIFY",
            "eventSourceARN": ARN,
            "dynamodb": { "Keys": {} },
        }))
        .unwrap();
        assert!(changes(&record).unwrap().is_empty());
    }

    #[test]
    fn test_empty_binary_payload_is_kept() {
        let record = create_record("INSERT", json!({ "_1": binary(b"") }), None);
        let changes = changes(&record).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].data.is_empty());
    }

    #[test]
    fn test_non_binary_event_is_an_error() {
        let record = create_record("INSERT", json!({ "_1": { "S": "text" } }), None);
        let err = changes(&record).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(err.to_string().contains("expected B"));
    }

    #[test]
    fn test_non_numeric_version_is_an_error() {
        let record = create_record("INSERT", json!({ "_abc": binary(b"x") }), None);
        assert!(matches!(changes(&record), Err(Error::Extraction { .. })));
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        let record = create_record("INSERT", json!({ "_1": { "B": "not base64!" } }), None);
        assert!(matches!(changes(&record), Err(Error::Extraction { .. })));
    }

    #[test]
    fn test_event_deserialization() {
        let event: StreamEvent = serde_json::from_value(json!({
            "Records": [{
                "eventID": "7",
                "eventName": "INSERT",
                "eventSourceARN": ARN,
                "dynamodb": {
                    "NewImage": {
                        "count": { "N": "3" },
                        "flags": { "SS": ["a", "b"] },
                        "deleted": { "BOOL": false },
                        "nested": { "M": { "inner": { "NULL": true } } },
                    }
                }
            }]
        }))
        .unwrap();

        let record = &event.records[0];
        let image = record.dynamodb.new_image.as_ref().unwrap();
        assert_eq!(image["count"], AttributeValue::N("3".to_string()));
        assert_eq!(image["deleted"], AttributeValue::Bool(false));
        assert_eq!(image["flags"].kind(), "SS");
        assert!(record.dynamodb.old_image.is_none());
    }
}
