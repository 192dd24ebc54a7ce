//! Documents persisted through the registry
//!
//! Any `Serialize + DeserializeOwned` type can be saved; it is encoded as
//!  DAG-CBOR. [`TaskList`] is the document this crate was built around.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Encode a document as DAG-CBOR
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a DAG-CBOR document. Bytes that do not match `T`'s schema are an
///  error; nothing is defaulted.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub item_id: String,
    pub label: String,
    pub is_complete: bool,
}

impl ListItem {
    /// A new, incomplete item with a fresh random id
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            label: label.into(),
            is_complete: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub items: Vec<ListItem>,
}

impl TaskList {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
