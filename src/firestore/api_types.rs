//! Serde types matching the Firestore REST API (v1).
//!
//! Firestore wraps every value in a type tag (`{"stringValue": "..."}`).
//! These types unwrap that into plain JSON so the rest of the program sees
//! ordinary documents.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::cache::RawDocument;

// ============================================================================
// Requests
// ============================================================================

/// Sort direction for collection queries. Config files may spell it in
/// lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
  #[serde(alias = "ascending", alias = "asc")]
  Ascending,
  #[serde(alias = "descending", alias = "desc")]
  Descending,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest<'a> {
  structured_query: StructuredQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery<'a> {
  from: [CollectionSelector<'a>; 1],
  order_by: [Order<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
  collection_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Order<'a> {
  field: FieldReference<'a>,
  direction: Direction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
  field_path: &'a str,
}

impl<'a> RunQueryRequest<'a> {
  /// Whole collection, ordered by one field.
  pub fn ordered(collection: &'a str, order_by: &'a str, direction: Direction) -> Self {
    Self {
      structured_query: StructuredQuery {
        from: [CollectionSelector {
          collection_id: collection,
        }],
        order_by: [Order {
          field: FieldReference {
            field_path: order_by,
          },
          direction,
        }],
      },
    }
  }
}

// ============================================================================
// Responses
// ============================================================================

/// A document as returned by `get` or inside a `runQuery` row.
#[derive(Debug, Deserialize)]
pub struct ApiDocument {
  /// Full resource name; the id is the last path segment
  pub name: String,
  #[serde(default)]
  pub fields: Map<String, Value>,
}

/// One element of the `runQuery` response array. Rows carrying only a
/// `readTime` have no document.
#[derive(Debug, Deserialize)]
pub struct ApiRunQueryRow {
  pub document: Option<ApiDocument>,
}

impl ApiDocument {
  pub fn id(&self) -> &str {
    self.name.rsplit('/').next().unwrap_or(&self.name)
  }

  pub fn into_raw(self) -> RawDocument {
    let id = self.id().to_string();
    RawDocument::new(id, decode_fields(&self.fields))
  }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
  fields
    .iter()
    .map(|(key, value)| (key.clone(), decode_value(value)))
    .collect()
}

/// Convert one typed Firestore value into plain JSON.
///
/// Integers arrive as decimal strings and timestamps as RFC 3339; both become
/// JSON numbers (timestamps in epoch milliseconds). Anything unparseable is
/// kept as the original string.
pub fn decode_value(value: &Value) -> Value {
  let Some((tag, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
    return Value::Null;
  };

  match tag.as_str() {
    "nullValue" => Value::Null,
    "booleanValue" | "stringValue" | "referenceValue" | "bytesValue" | "geoPointValue" => {
      inner.clone()
    }
    "integerValue" => match inner {
      Value::String(s) => s
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| inner.clone()),
      other => other.clone(),
    },
    "doubleValue" => match inner {
      Value::Number(_) => inner.clone(),
      // NaN and the infinities come through as strings and have no JSON form
      Value::String(s) => s
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null),
      _ => Value::Null,
    },
    "timestampValue" => inner
      .as_str()
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
      .map(|dt| Value::from(dt.timestamp_millis()))
      .unwrap_or_else(|| inner.clone()),
    "mapValue" => {
      let fields = inner
        .get("fields")
        .and_then(Value::as_object)
        .map(decode_fields)
        .unwrap_or_default();
      Value::Object(fields)
    }
    "arrayValue" => {
      let values = inner
        .get("values")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(decode_value).collect())
        .unwrap_or_default();
      Value::Array(values)
    }
    _ => Value::Null,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn test_run_query_request_shape() {
    let body = serde_json::to_value(RunQueryRequest::ordered(
      "posts",
      "uploadTime",
      Direction::Descending,
    ))
    .unwrap();

    assert_eq!(
      body,
      json!({
        "structuredQuery": {
          "from": [{ "collectionId": "posts" }],
          "orderBy": [{ "field": { "fieldPath": "uploadTime" }, "direction": "DESCENDING" }]
        }
      })
    );
  }

  #[test]
  fn test_ascending_request() {
    let body = serde_json::to_value(RunQueryRequest::ordered("posts", "title", Direction::Ascending))
      .unwrap();
    assert_eq!(
      body["structuredQuery"]["orderBy"][0]["direction"],
      json!("ASCENDING")
    );
  }

  #[test]
  fn test_decode_scalars() {
    assert_eq!(decode_value(&json!({ "stringValue": "Dune" })), json!("Dune"));
    assert_eq!(decode_value(&json!({ "integerValue": "1700000000000" })), json!(1700000000000_i64));
    assert_eq!(decode_value(&json!({ "doubleValue": 7.5 })), json!(7.5));
    assert_eq!(decode_value(&json!({ "doubleValue": "NaN" })), Value::Null);
    assert_eq!(decode_value(&json!({ "booleanValue": true })), json!(true));
    assert_eq!(decode_value(&json!({ "nullValue": null })), Value::Null);
  }

  #[test]
  fn test_decode_timestamp_to_millis() {
    assert_eq!(
      decode_value(&json!({ "timestampValue": "2023-11-14T22:13:20.000Z" })),
      json!(1700000000000_i64)
    );
    assert_eq!(
      decode_value(&json!({ "timestampValue": "not a date" })),
      json!("not a date")
    );
  }

  #[test]
  fn test_decode_nested_values() {
    let value = json!({
      "mapValue": {
        "fields": {
          "tags": { "arrayValue": { "values": [{ "stringValue": "noir" }, { "integerValue": "2" }] } },
          "empty": { "arrayValue": {} }
        }
      }
    });

    assert_eq!(
      decode_value(&value),
      json!({ "tags": ["noir", 2], "empty": [] })
    );
  }

  #[test]
  fn test_document_into_raw() {
    let doc: ApiDocument = serde_json::from_value(json!({
      "name": "projects/demo/databases/(default)/documents/posts/the-batman",
      "fields": {
        "title": { "stringValue": "The Batman" },
        "uploadTime": { "integerValue": "42" }
      },
      "createTime": "2024-01-01T00:00:00Z"
    }))
    .unwrap();

    let raw = doc.into_raw();
    assert_eq!(raw.id, "the-batman");
    assert_eq!(raw.get("title"), Some(&json!("The Batman")));
    assert_eq!(raw.get("uploadTime"), Some(&json!(42)));
  }

  #[test]
  fn test_run_query_rows_without_document() {
    let rows: Vec<ApiRunQueryRow> =
      serde_json::from_value(json!([{ "readTime": "2024-01-01T00:00:00Z" }])).unwrap();
    assert!(rows[0].document.is_none());
  }
}
