//! Persistence of the request collection over a sled key-value store
use super::error::StoreError;
use super::request::Request;
use std::sync::Arc;

/// Well-known key holding the CBOR-encoded full collection.
pub const COLLECTION_KEY: &str = "requests";

pub struct RequestStore {
    instance: Arc<sled::Db>,
}

impl RequestStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Load the full collection. An absent key yields an empty list; a
    /// structurally invalid value is discarded from the store and also
    /// yields an empty list, never a partial result.
    pub fn load(&self) -> Result<Vec<Request>, StoreError> {
        let Some(bytes) = self.instance.get(COLLECTION_KEY)? else {
            return Ok(Vec::new());
        };

        match minicbor::decode::<Vec<Request>>(bytes.as_ref()) {
            Ok(requests) => Ok(requests),
            Err(_) => {
                self.instance.remove(COLLECTION_KEY)?;
                Ok(Vec::new())
            }
        }
    }

    /// Persist the full collection as one value under the well-known key.
    pub fn save(&self, requests: &[Request]) -> Result<(), StoreError> {
        let encoded =
            minicbor::to_vec(requests).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.instance.insert(COLLECTION_KEY, encoded)?;
        Ok(())
    }

    /// Remove the whole collection.
    pub fn erase(&self) -> Result<(), StoreError> {
        self.instance.remove(COLLECTION_KEY)?;
        Ok(())
    }

    /// Serialize the collection into a portable text document
    /// (hex-encoded CBOR).
    pub fn export(requests: &[Request]) -> Result<String, StoreError> {
        let encoded =
            minicbor::to_vec(requests).map_err(|err| StoreError::Encode(err.to_string()))?;
        Ok(hex::encode(encoded))
    }

    /// Parse a document produced by [`RequestStore::export`] back into a
    /// request collection. The caller decides whether to replace the
    /// store contents (via `save`) or merge.
    pub fn import(document: &str) -> Result<Vec<Request>, StoreError> {
        let bytes = hex::decode(document.trim())
            .map_err(|err| StoreError::MalformedDocument(err.to_string()))?;
        minicbor::decode(&bytes).map_err(|err| StoreError::MalformedDocument(err.to_string()))
    }
}
