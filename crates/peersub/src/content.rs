//! Content addressing for discovery markers.
//!
//! A [`ContentId`] is the SHA-256 digest of a block. On the wire (as a
//! Kademlia key) it is encoded as a sha2-256 multihash so it lines up with
//! the keys other content-addressed systems announce.

use std::fmt;

use libp2p::kad::RecordKey;
use sha2::{Digest, Sha256};

/// Multihash code for sha2-256
const SHA2_256_CODE: u8 = 0x12;

/// Digest length of sha2-256 in bytes
const SHA2_256_LEN: u8 = 32;

/// Identifier of a content-addressed block
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Address `data` by its SHA-256 digest
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Raw digest bytes
    pub fn digest(&self) -> &[u8; 32] {
        &self.0
    }

    /// The digest wrapped as a sha2-256 multihash
    pub fn to_multihash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.0.len());
        bytes.push(SHA2_256_CODE);
        bytes.push(SHA2_256_LEN);
        bytes.extend_from_slice(&self.0);
        bytes
    }

    /// Key under which this block is provided on Kademlia
    pub fn record_key(&self) -> RecordKey {
        RecordKey::new(&self.to_multihash_bytes())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({self})")
    }
}
