use crate::store::{StoredHit, VectorPoint};
use crate::traits::VectorIndex;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::info;
use url::Url;
use uuid::Uuid;

/// Payload field that keeps the caller's string key; Qdrant ids must be UUIDs or integers.
const KEY_FIELD: &str = "key";

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(
        endpoint: &str,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Result<Self, SearchError> {
        Url::parse(endpoint)?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    /// Creates the collection with cosine distance unless it already exists.
    pub async fn ensure_collection(&self) -> Result<(), SearchError> {
        let response = self.client.get(self.collection_url()).send().await?;
        match response.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            status => return Err(backend_error(status)),
        }

        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": { "size": self.vector_size, "distance": "Cosine" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        info!(collection = %self.collection, size = self.vector_size, "created qdrant collection");
        Ok(())
    }

    fn check_dimensions(&self, len: usize) -> Result<(), SearchError> {
        if len != self.vector_size {
            return Err(SearchError::Request(format!(
                "vector dim {} is not {}",
                len, self.vector_size
            )));
        }
        Ok(())
    }
}

pub fn point_id(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
}

fn backend_error(status: StatusCode) -> SearchError {
    SearchError::BackendResponse {
        backend: "qdrant".to_string(),
        details: status.to_string(),
    }
}

fn point_body(point: &VectorPoint) -> Value {
    let mut payload = match &point.payload {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    payload.insert(KEY_FIELD.to_string(), Value::String(point.id.clone()));

    json!({
        "id": point_id(&point.id).to_string(),
        "vector": point.vector,
        "payload": payload,
    })
}

fn parse_hits(parsed: &Value) -> Vec<StoredHit> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    hits.into_iter()
        .map(|hit| {
            let mut payload = hit.pointer("/payload").cloned().unwrap_or(Value::Null);
            let key = payload
                .as_object_mut()
                .and_then(|map| map.remove(KEY_FIELD))
                .and_then(|value| value.as_str().map(str::to_string));
            let id = key.unwrap_or_else(|| match hit.pointer("/id") {
                Some(Value::String(id)) => id.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            });
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

            StoredHit { id, score, payload }
        })
        .collect()
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), SearchError> {
        let points = points
            .iter()
            .map(|point| {
                self.check_dimensions(point.vector.len())?;
                Ok(point_body(point))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoredHit>, SearchError> {
        self.check_dimensions(vector.len())?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&json!({
                "vector": vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        let parsed: Value = response.json().await?;
        Ok(parse_hits(&parsed))
    }

    async fn count(&self) -> Result<usize, SearchError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status()));
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .map(|count| count as usize)
            .ok_or_else(|| SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: "count response without result.count".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_hits, point_body, point_id, QdrantStore};
    use crate::store::VectorPoint;
    use serde_json::json;

    #[test]
    fn point_ids_are_stable_per_key() {
        assert_eq!(point_id("paper.pdf_p1"), point_id("paper.pdf_p1"));
        assert_ne!(point_id("paper.pdf_p1"), point_id("paper.pdf_p2"));
    }

    #[test]
    fn point_body_keeps_original_key_in_payload() {
        let body = point_body(&VectorPoint {
            id: "cat.png".to_string(),
            vector: vec![0.1, 0.2],
            payload: json!({ "path": "data/cat.png" }),
        });

        assert_eq!(body["id"], point_id("cat.png").to_string());
        assert_eq!(body["payload"]["key"], "cat.png");
        assert_eq!(body["payload"]["path"], "data/cat.png");
    }

    #[test]
    fn search_response_maps_back_to_keys() {
        let response = json!({
            "result": [
                { "id": "3b1f", "score": 0.91, "payload": { "key": "a.pdf_p2", "page": 2 } },
                { "id": 7, "score": 0.5, "payload": {} }
            ],
            "status": "ok"
        });

        let hits = parse_hits(&response);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a.pdf_p2");
        assert_eq!(hits[0].payload, json!({ "page": 2 }));
        assert_eq!(hits[1].id, "7");
        assert!((hits[1].score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_search_response_has_no_hits() {
        assert!(parse_hits(&json!({ "result": [] })).is_empty());
        assert!(parse_hits(&json!({})).is_empty());
    }

    #[test]
    fn endpoint_must_be_a_url() {
        assert!(QdrantStore::new("not a url", "papers", 4).is_err());
        assert!(QdrantStore::new("http://localhost:6333/", "papers", 4).is_ok());
    }
}
