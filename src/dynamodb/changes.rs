use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, trace};

use super::types::{AttributeValue, ChangeRecord, EventName, StreamRecord};
use crate::{Error, Result};

/// Attribute names carrying events start with this prefix followed by the
/// event version, e.g. `_12`.
const EVENT_PREFIX: char = '_';

/// Extracts the change records a stream record introduces.
///
/// Events live in the item as binary attributes named `_<version>`. An event
/// is new when it appears in the new image and not in the old one. The
/// result is ordered by ascending version.
pub fn changes(record: &StreamRecord) -> Result<Vec<ChangeRecord>> {
    if matches!(record.event_name, EventName::Remove) {
        trace!(event_id = %record.event_id, "Skipping REMOVE record");
        return Ok(Vec::new());
    }

    let Some(new_image) = record.dynamodb.new_image.as_ref() else {
        debug!(event_id = %record.event_id, "Stream record has no new image");
        return Ok(Vec::new());
    };
    let old_image = record.dynamodb.old_image.as_ref();

    let mut changes = Vec::new();
    for (name, value) in new_image {
        let Some(version) = name.strip_prefix(EVENT_PREFIX) else {
            continue;
        };
        if old_image.is_some_and(|old| old.contains_key(name)) {
            continue;
        }

        let version: u64 = version.parse().map_err(|_| Error::Extraction {
            message: format!("attribute {} does not carry a numeric version", name),
        })?;

        let data = match value {
            AttributeValue::B(encoded) => STANDARD.decode(encoded).map_err(|e| Error::Extraction {
                message: format!("attribute {} is not valid base64: {}", name, e),
            })?,
            other => {
                return Err(Error::Extraction {
                    message: format!(
                        "attribute {} has type {}, expected B",
                        name,
                        other.kind()
                    ),
                })
            }
        };

        changes.push(ChangeRecord::new(version, data));
    }

    changes.sort_by_key(|c| c.version);
    trace!(
        event_id = %record.event_id,
        count = changes.len(),
        "Extracted changes from stream record"
    );
    Ok(changes)
}
