use regex::Regex;
use std::sync::LazyLock;

use crate::{Error, Result};

static STREAM_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws[\w-]*:dynamodb:[^:]+:[^:]+:table/([^/]+)/stream/.+$")
        .expect("stream arn pattern is valid")
});

/// Returns the table name a DynamoDB stream ARN belongs to.
///
/// `arn:aws:dynamodb:us-west-2:123456789012:table/orders/stream/2024-01-01T00:00:00.000`
/// yields `orders`.
pub fn table_name(event_source_arn: &str) -> Result<String> {
    STREAM_ARN
        .captures(event_source_arn)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidArn(event_source_arn.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_from_stream_arn() {
        let arn = "arn:aws:dynamodb:us-west-2:123456789012:table/orders/stream/2024-01-01T00:00:00.000";
        assert_eq!(table_name(arn).unwrap(), "orders");
    }

    #[test]
    fn test_table_name_other_partition() {
        let arn = "arn:aws-cn:dynamodb:cn-north-1:123456789012:table/Users.v2/stream/label";
        assert_eq!(table_name(arn).unwrap(), "Users.v2");
    }

    #[test]
    fn test_table_arn_without_stream_is_rejected() {
        let err = table_name("arn:aws:dynamodb:us-west-2:123456789012:table/orders").unwrap_err();
        assert!(matches!(err, Error::InvalidArn(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(table_name("").is_err());
        assert!(table_name("arn:aws:kinesis:us-west-2:1:stream/orders").is_err());
    }
}
