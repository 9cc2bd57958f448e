//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Provider records crate error enum.
pub enum Error {
    /// Bytes are not `<varint code><varint length><digest>`.
    #[error("Invalid multihash: {0}")]
    InvalidMultihash(&'static str),

    #[error("Invalid hex: {0}")]
    /// Transparent [hex::FromHexError]
    InvalidHex(#[from] hex::FromHexError),

    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
