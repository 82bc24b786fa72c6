//! Cart entity and its cache codec.
//!
//! A cart is stored in the key-value cache as JSON, verbatim, at key = cart id:
//!
//! ```json
//! {"id":"c1","items":["sku-1","sku-2"]}
//! ```
//!
//! Decoding is strict: a value that is not well-formed cart JSON is an error,
//! never an empty cart. Absence of the key is handled one layer up, by the
//! repository.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::CartId;

/// Errors produced by the cart codec.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// The cart could not be serialized.
    #[error("cannot encode cart {id}: {source}")]
    Encode {
        /// Cart being encoded.
        id: CartId,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The stored value is not a well-formed cart.
    #[error("cannot decode cart: {0}")]
    Decode(#[source] serde_json::Error),

    /// The stored cart belongs to a different key.
    #[error("stored cart id {found} does not match key {expected}")]
    IdMismatch {
        /// Key the value was read from.
        expected: CartId,
        /// ID embedded in the stored value.
        found: CartId,
    },
}

/// One user's active selection.
///
/// The ID is fixed at construction; `items` is the only mutable state.
/// Duplicate items are allowed and represent multiplicity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    #[serde(deserialize_with = "null_as_empty")]
    items: Vec<String>,
}

/// Reads `"items": null` as an empty list. Older writers store a cart that
/// was never given items that way. The field itself is still required.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Cart {
    /// Create a cart with no items.
    #[must_use]
    pub const fn empty(id: CartId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    /// Create a cart with the given items.
    #[must_use]
    pub const fn with_items(id: CartId, items: Vec<String>) -> Self {
        Self { id, items }
    }

    /// The cart's ID.
    #[must_use]
    pub const fn id(&self) -> &CartId {
        &self.id
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Returns `true` if the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the items wholesale.
    pub fn replace_items(&mut self, items: Vec<String>) {
        self.items = items;
    }

    /// Append one item to the end. No deduplication.
    pub fn push_item(&mut self, item: String) {
        self.items.push(item);
    }

    /// Serialize to the cache representation.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Encode` if serialization fails.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|source| CodecError::Encode {
            id: self.id.clone(),
            source,
        })
    }

    /// Parse a cart from its cache representation.
    ///
    /// Both `id` and `items` are required; a `null` items list reads as
    /// empty and unknown fields are ignored. Bytes that are not UTF-8 are a
    /// decode error like any other malformed value.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` if `raw` is not a well-formed cart.
    pub fn decode(raw: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        serde_json::from_slice(raw.as_ref()).map_err(CodecError::Decode)
    }

    /// Parse a cart read from `key`, checking that it belongs to that key.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` for malformed data and
    /// `CodecError::IdMismatch` if the embedded ID differs from `key`.
    pub fn decode_for(key: &CartId, raw: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let cart = Self::decode(raw)?;
        if &cart.id != key {
            return Err(CodecError::IdMismatch {
                expected: key.clone(),
                found: cart.id,
            });
        }
        Ok(cart)
    }
}
