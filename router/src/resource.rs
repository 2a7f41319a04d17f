//! Signed envelopes delivered by the ledger.
//!
//! ```text
//! ResourcePointer { from, path }        hash = sha256(len|from, len|path)
//! Resource { pointer, data }            hash = sha256(pointer hash, len|data)
//! TransactionRequest { payload, signature over the payload hash }
//! QueryRequest { pointer, signature over the pointer hash }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{PrivateKey, PublicKey, Signature};

/// Who is addressing which path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePointer {
    pub from: PublicKey,
    pub path: String,
}

impl ResourcePointer {
    pub fn new(from: PublicKey, path: impl Into<String>) -> Self {
        Self {
            from,
            path: path.into(),
        }
    }

    /// Canonical hash, hex encoded.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, self.from.as_bytes());
        update_field(&mut hasher, self.path.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A payload addressed to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub pointer: ResourcePointer,
    /// Handler-defined payload, normally JSON
    pub data: Vec<u8>,
}

impl Resource {
    pub fn new(pointer: ResourcePointer, data: Vec<u8>) -> Self {
        Self { pointer, data }
    }

    /// Canonical hash, hex encoded.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, self.pointer.hash().as_bytes());
        update_field(&mut hasher, &self.data);
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionPayload {
    Save { resource: Resource },
    Delete { pointer: ResourcePointer },
}

impl TransactionPayload {
    pub fn pointer(&self) -> &ResourcePointer {
        match self {
            TransactionPayload::Save { resource } => &resource.pointer,
            TransactionPayload::Delete { pointer } => pointer,
        }
    }

    /// Hash the signature covers.
    pub fn hash(&self) -> String {
        match self {
            TransactionPayload::Save { resource } => resource.hash(),
            TransactionPayload::Delete { pointer } => pointer.hash(),
        }
    }
}

/// A signed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub payload: TransactionPayload,
    pub signature: Signature,
}

impl TransactionRequest {
    pub fn save(path: impl Into<String>, data: Vec<u8>, key: &PrivateKey) -> Self {
        let resource = Resource::new(ResourcePointer::new(key.public_key(), path), data);
        let signature = key.sign(resource.hash().as_bytes());
        Self {
            payload: TransactionPayload::Save { resource },
            signature,
        }
    }

    pub fn delete(path: impl Into<String>, key: &PrivateKey) -> Self {
        let pointer = ResourcePointer::new(key.public_key(), path);
        let signature = key.sign(pointer.hash().as_bytes());
        Self {
            payload: TransactionPayload::Delete { pointer },
            signature,
        }
    }

    pub fn pointer(&self) -> &ResourcePointer {
        self.payload.pointer()
    }

    pub fn signer(&self) -> &PublicKey {
        &self.pointer().from
    }

    pub fn is_signature_valid(&self) -> bool {
        self.signer()
            .verify(self.payload.hash().as_bytes(), &self.signature)
    }
}

/// A signed read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub pointer: ResourcePointer,
    pub signature: Signature,
}

impl QueryRequest {
    pub fn new(path: impl Into<String>, key: &PrivateKey) -> Self {
        let pointer = ResourcePointer::new(key.public_key(), path);
        let signature = key.sign(pointer.hash().as_bytes());
        Self { pointer, signature }
    }

    pub fn is_signature_valid(&self) -> bool {
        self.pointer
            .from
            .verify(self.pointer.hash().as_bytes(), &self.signature)
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
