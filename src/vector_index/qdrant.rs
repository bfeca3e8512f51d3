//! Qdrant vector index adapter
use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, CountPointsBuilder, CreateCollectionBuilder, Distance as QdrantDistance,
    ListValue, PointId, PointStruct, SearchPointsBuilder, Struct, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use crate::config::VectorStoreConfig;
use crate::errors::{RagError, Result};
use crate::vector_index::{
    check_dimension, validate_batch, Distance, Document, PointKey, SearchHit, VectorIndex,
};

/// Vector index backed by a Qdrant collection
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Connect and make sure the configured collection exists.
    ///
    /// Unreachable backends fail here; callers treat that as fatal.
    pub async fn connect(config: &VectorStoreConfig) -> Result<Self> {
        tracing::info!(url = %config.url, "Connecting to Qdrant");

        let index = Self {
            client: build_client(config)?,
            collection: config.collection.clone(),
            dimension: config.dimension,
        };
        index
            .ensure_collection(&config.collection, config.dimension, config.distance)
            .await?;

        Ok(index)
    }

    /// Server liveness probe; reports whether the configured collection
    /// exists without creating it
    pub async fn probe(config: &VectorStoreConfig) -> Result<ProbeReport> {
        let client = build_client(config)?;
        let reply = client
            .health_check()
            .await
            .map_err(storage_err("Qdrant health check failed"))?;
        let collections = client
            .list_collections()
            .await
            .map_err(storage_err("Failed to list collections"))?;

        Ok(ProbeReport {
            version: reply.version,
            collection_exists: collections
                .collections
                .iter()
                .any(|c| c.name == config.collection),
        })
    }
}

/// Result of a read-only reachability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub version: String,
    pub collection_exists: bool,
}

fn build_client(config: &VectorStoreConfig) -> Result<Qdrant> {
    let mut builder = Qdrant::from_url(&config.url);
    if let Some(key) = &config.api_key {
        builder = builder.api_key(key.clone());
    }
    builder
        .build()
        .map_err(storage_err("Failed to create Qdrant client"))
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(storage_err("Failed to list collections"))?;

        if collections.collections.iter().any(|c| c.name == name) {
            tracing::info!(collection = name, "Collection already exists");
            return Ok(());
        }

        tracing::info!(collection = name, dimension, ?distance, "Creating collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    dimension as u64,
                    to_qdrant_distance(distance),
                )),
            )
            .await
            .map_err(storage_err("Failed to create collection"))?;

        Ok(())
    }

    async fn try_search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        check_dimension([vector.len()], self.dimension)?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(storage_err("Failed to search points"))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                score: point.score,
                payload: payload_to_json(point.payload),
            })
            .collect())
    }

    async fn upsert(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        validate_batch(&documents, &embeddings, self.dimension)?;
        if documents.is_empty() {
            return Ok(0);
        }

        let points: Vec<PointStruct> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(doc, embedding)| {
                let id = doc
                    .id
                    .unwrap_or_else(|| PointKey::Uuid(uuid::Uuid::new_v4().to_string()));
                PointStruct::new(to_point_id(id), embedding, json_to_payload(doc.payload))
            })
            .collect();
        let written = points.len();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(storage_err("Failed to upsert points"))?;

        tracing::info!(collection = %self.collection, written, "Added documents to collection");
        Ok(written)
    }

    async fn count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(storage_err("Failed to count points"))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

fn storage_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> RagError {
    move |e| RagError::Storage(format!("{}: {}", context, e))
}

fn to_qdrant_distance(distance: Distance) -> QdrantDistance {
    match distance {
        Distance::Cosine => QdrantDistance::Cosine,
        Distance::Dot => QdrantDistance::Dot,
        Distance::Euclid => QdrantDistance::Euclid,
    }
}

fn to_point_id(key: PointKey) -> PointId {
    match key {
        PointKey::Num(n) => PointId::from(n),
        PointKey::Uuid(u) => PointId::from(u),
    }
}

#[cfg(test)]
fn from_point_id(id: &PointId) -> Option<PointKey> {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => Some(PointKey::Num(*n)),
        Some(PointIdOptions::Uuid(u)) => Some(PointKey::Uuid(u.clone())),
        None => None,
    }
}

// Payload conversions between serde_json and Qdrant's protobuf values

fn json_to_payload(map: Map<String, JsonValue>) -> HashMap<String, QdrantValue> {
    map.into_iter()
        .map(|(key, value)| (key, json_to_qdrant_value(value)))
        .collect()
}

fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Kind::StringValue(s),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        JsonValue::Object(fields) => Kind::StructValue(Struct {
            fields: json_to_payload(fields),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Map<String, JsonValue> {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_to_json_value(value)))
        .collect()
}

fn qdrant_to_json_value(value: QdrantValue) -> JsonValue {
    match value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(b),
        Some(Kind::IntegerValue(i)) => JsonValue::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.into_iter().map(qdrant_to_json_value).collect())
        }
        Some(Kind::StructValue(s)) => JsonValue::Object(payload_to_json(s.fields)),
    }
}
