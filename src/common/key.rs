//! Content key that providers announce.

use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Opaque content key.
///
/// Keys are not interpreted at this layer, any byte string is a valid key.
pub struct Key(Bytes);

impl Key {
    pub fn new<T: Into<Bytes>>(bytes: T) -> Key {
        Key(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Key {
        Key(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Key {
        Key(s.into())
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Key {
        Key(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Key {
        Key(bytes.into())
    }
}

impl From<Bytes> for Key {
    fn from(bytes: Bytes) -> Key {
        Key(bytes)
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if !s.chars().any(char::is_control) => write!(f, "Key({:?})", s),
            _ => write!(f, "Key({})", hex::encode(&self.0)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Key::from("film:42")), "Key(\"film:42\")");
        assert_eq!(format!("{:?}", Key::from(vec![0_u8, 255])), "Key(00ff)");
    }

    #[test]
    fn conversions_agree() {
        let a = Key::from("film:42");
        let b = Key::from(String::from("film:42"));
        let c = Key::from(&b"film:42"[..]);
        let d = Key::new(Bytes::from_static(b"film:42"));

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a.len(), 7);
    }
}
