//! Multihash encoded peer identity.

use std::{
    convert::TryFrom,
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
    sync::OnceLock,
};

use bytes::Bytes;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Multihash code of SHA2-256.
pub const SHA2_256_CODE: u64 = 0x12;
/// Digest length of SHA2-256 in bytes.
pub const SHA2_256_LEN: usize = 32;

/// Seed the sentinel [PeerId] is derived from, 32 zero bytes.
pub const DEFAULT_SENTINEL_SEED: [u8; 32] = [0; 32];

static SENTINEL: OnceLock<PeerId> = OnceLock::new();

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Bytes", into = "Bytes")
)]
/// Identity of a peer in the DHT, the bytes of a self-describing multihash.
pub struct PeerId(Bytes);

impl PeerId {
    /// Parse a peer identity from its multihash bytes.
    ///
    /// The bytes must be `<varint code><varint length><digest>`, with a digest of
    /// exactly `length` bytes.
    pub fn from_bytes<T: Into<Bytes>>(bytes: T) -> Result<PeerId> {
        let bytes = bytes.into();

        let (_code, rest) = read_varint(&bytes)?;
        let (length, digest) = read_varint(rest)?;

        if digest.len() as u64 != length {
            return Err(Error::InvalidMultihash("digest length mismatch"));
        }

        Ok(PeerId(bytes))
    }

    /// Hash `data` with SHA2-256 and wrap the digest as a multihash.
    pub fn from_sha256(data: &[u8]) -> PeerId {
        let digest = Sha256::digest(data);

        let mut bytes = Vec::with_capacity(2 + SHA2_256_LEN);
        bytes.push(SHA2_256_CODE as u8);
        bytes.push(SHA2_256_LEN as u8);
        bytes.extend_from_slice(&digest);

        PeerId(bytes.into())
    }

    /// Random peer identity, useful for tests and simulations.
    pub fn random() -> PeerId {
        let mut rng = rand::thread_rng();
        let seed: [u8; 32] = rng.gen();

        PeerId::from_sha256(&seed)
    }

    /// Derive the sentinel identity from a seed.
    ///
    /// The seed is used as a SHA2-256 digest as is, framed as
    /// `0x12 <varint seed length> <seed>`, so the default seed gives the well known
    /// all zero digest identity. Provider entries announced by the sentinel are kept
    /// for the extended TTL.
    ///
    /// # Panics
    ///
    /// Panics if the framed bytes are not a valid multihash, which can only happen
    /// if the varint encoding is broken.
    pub fn derive_sentinel(seed: &[u8]) -> PeerId {
        let mut bytes = Vec::with_capacity(2 + seed.len());
        write_varint(&mut bytes, SHA2_256_CODE);
        write_varint(&mut bytes, seed.len() as u64);
        bytes.extend_from_slice(seed);

        PeerId::from_bytes(bytes).expect("framed sentinel seed is always a valid multihash")
    }

    /// The process wide sentinel identity derived from [DEFAULT_SENTINEL_SEED].
    pub fn sentinel() -> &'static PeerId {
        SENTINEL.get_or_init(|| PeerId::derive_sentinel(&DEFAULT_SENTINEL_SEED))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Append `value` as an unsigned LEB128 varint.
fn write_varint(bytes: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        bytes.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }

    bytes.push(value as u8);
}

/// Decode an unsigned LEB128 varint, returning it and the remaining bytes.
fn read_varint(bytes: &[u8]) -> Result<(u64, &[u8])> {
    let mut value: u64 = 0;

    for (i, byte) in bytes.iter().enumerate().take(9) {
        value |= u64::from(byte & 0x7f) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((value, &bytes[i + 1..]));
        }
    }

    if bytes.len() < 9 {
        Err(Error::InvalidMultihash("truncated varint"))
    } else {
        Err(Error::InvalidMultihash("varint overflow"))
    }
}

impl TryFrom<Bytes> for PeerId {
    type Error = Error;

    fn try_from(bytes: Bytes) -> Result<PeerId> {
        PeerId::from_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for PeerId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<PeerId> {
        PeerId::from_bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<PeerId> for Bytes {
    fn from(peer: PeerId) -> Bytes {
        peer.0
    }
}

impl FromStr for PeerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<PeerId> {
        let bytes = hex::decode(s)?;

        PeerId::from_bytes(bytes)
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Debug for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self)
    }
}
