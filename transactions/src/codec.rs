//! Canonical byte encoding used for hashing.
//!
//! Integers are little-endian, variable-length fields carry a `u32` length
//! prefix. Hashes are computed over this encoding rather than over a serde
//! format so they stay stable across serde representation changes.

use tokenchain_types::TokenValue;

#[derive(Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.u32(bytes.len() as u32);
        self.fixed(bytes)
    }

    pub fn token(&mut self, v: &TokenValue) -> &mut Self {
        let mut be = [0u8; 32];
        v.to_big_endian(&mut be);
        self.fixed(&be)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
