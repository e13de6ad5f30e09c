//! Payload schema for Qdrant points

use super::StoreEntry;
use crate::chunk::{Chunk, ChunkMetadata};
use crate::error::{Error, Result};
use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Build a point from a store entry; the point id is derived from the chunk id
    pub fn from_entry(entry: StoreEntry, ingested_at: &str) -> Self {
        Self {
            id: point_id_for_chunk(&entry.chunk.id),
            payload: ChunkPayload::from_chunk(entry.chunk, ingested_at),
            vector: entry.embedding,
        }
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Deterministic Qdrant point id for a chunk id
pub fn point_id_for_chunk(chunk_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes())
}

/// Payload stored with each chunk in Qdrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Content-derived chunk id
    pub chunk_id: String,

    /// Originating source identifier
    pub source: String,

    /// Chunk index within the document
    pub chunk_index: i64,

    /// Verbatim chunk text
    pub text: String,

    /// When the chunk was ingested
    pub ingested_at: String,
}

impl ChunkPayload {
    pub fn from_chunk(chunk: Chunk, ingested_at: &str) -> Self {
        Self {
            chunk_id: chunk.id,
            source: chunk.metadata.source,
            chunk_index: chunk.metadata.chunk_index as i64,
            text: chunk.text,
            ingested_at: ingested_at.to_string(),
        }
    }

    pub fn into_chunk(self) -> Chunk {
        Chunk {
            id: self.chunk_id,
            text: self.text,
            metadata: ChunkMetadata {
                source: self.source,
                chunk_index: self.chunk_index.max(0) as usize,
            },
        }
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("chunk_id".to_string(), string_to_qdrant(&self.chunk_id));
        map.insert("source".to_string(), string_to_qdrant(&self.source));
        map.insert("chunk_index".to_string(), int_to_qdrant(self.chunk_index));
        map.insert("text".to_string(), string_to_qdrant(&self.text));
        map.insert("ingested_at".to_string(), string_to_qdrant(&self.ingested_at));

        map
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

impl TryFrom<Map<String, Value>> for ChunkPayload {
    type Error = Error;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::Qdrant(format!("Malformed chunk payload: {}", e)))
    }
}

/// Convert Qdrant value to serde_json Value
pub fn json_from_qdrant_value(v: QdrantValue) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}
