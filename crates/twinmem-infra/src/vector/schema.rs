//! Arrow schema definitions for LanceDB memory collections.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Name of the fixed-size vector column.
pub const VECTOR_COLUMN: &str = "vector";

/// Schema for a memory collection whose vectors are `dimension` wide.
///
/// The payload column holds the record's opaque metadata as JSON text.
pub fn memory_schema(dimension: usize) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("subject", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("payload", DataType::Utf8, true),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(VECTOR_COLUMN, vector_type(dimension), false),
    ])
}

/// `FixedSizeList<Float32>` of the given width.
pub fn vector_type(dimension: usize) -> DataType {
    DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimension as i32,
    )
}

/// Width of the vector column in `schema`, if it has one.
pub fn vector_dimension(schema: &Schema) -> Option<usize> {
    let field = schema.field_with_name(VECTOR_COLUMN).ok()?;
    match field.data_type() {
        DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_schema_has_correct_fields() {
        let schema = memory_schema(1536);
        assert_eq!(schema.fields().len(), 7);
        for name in ["id", "subject", "text", "payload", "embedding_model", "created_at"] {
            assert!(schema.field_with_name(name).is_ok(), "missing {name}");
        }

        let vector_field = schema.field_with_name(VECTOR_COLUMN).unwrap();
        match vector_field.data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, 1536),
            other => panic!("Expected FixedSizeList, got {:?}", other),
        }
    }

    #[test]
    fn test_vector_dimension_round_trip() {
        assert_eq!(vector_dimension(&memory_schema(1024)), Some(1024));
        assert_eq!(vector_dimension(&memory_schema(384)), Some(384));
    }

    #[test]
    fn test_vector_dimension_missing_column() {
        let schema = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);
        assert_eq!(vector_dimension(&schema), None);
    }
}
