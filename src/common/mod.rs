//! Value types shared across the crate.

mod key;
mod peer_id;

pub use key::*;
pub use peer_id::*;
