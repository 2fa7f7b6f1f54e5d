//! Blocks, headers and the transaction merkle root.

use serde::{Deserialize, Serialize};
use tokenchain_types::{double_sha256, BlockHash, TxHash};

use crate::codec::Encoder;
use crate::Transaction;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub previous: BlockHash,
    pub merkle_root: TxHash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub height: u32,
    /// Merged-mining proof; not covered by the block hash.
    pub aux_pow: Vec<u8>,
}

impl Header {
    pub fn hash(&self) -> BlockHash {
        let mut enc = Encoder::new();
        enc.u32(self.version)
            .fixed(self.previous.as_bytes())
            .fixed(self.merkle_root.as_bytes())
            .u32(self.timestamp)
            .u32(self.bits)
            .u32(self.nonce)
            .u32(self.height);
        BlockHash::new(double_sha256(&enc.finish()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build a block on top of `previous` with a correct merkle root.
    pub fn new(previous: BlockHash, height: u32, transactions: Vec<Transaction>) -> Self {
        let merkle_root = merkle_root(transactions.iter().map(|tx| tx.hash()));
        Self {
            header: Header {
                version: 0,
                previous,
                merkle_root,
                timestamp: 0,
                bits: 0,
                nonce: 0,
                height,
                aux_pow: Vec::new(),
            },
            transactions,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn computed_merkle_root(&self) -> TxHash {
        merkle_root(self.transactions.iter().map(|tx| tx.hash()))
    }
}

/// Pairwise double SHA-256 tree; an odd node is paired with itself.
pub fn merkle_root(hashes: impl IntoIterator<Item = TxHash>) -> TxHash {
    let mut level: Vec<[u8; 32]> = hashes.into_iter().map(|h| *h.as_bytes()).collect();
    if level.is_empty() {
        return TxHash::ZERO;
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                let mut joined = [0u8; 64];
                joined[..32].copy_from_slice(&pair[0]);
                joined[32..].copy_from_slice(right);
                double_sha256(&joined)
            })
            .collect();
    }
    TxHash::new(level[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_is_its_own_root() {
        let h = TxHash::digest(b"a");
        assert_eq!(merkle_root([h]), h);
    }

    #[test]
    fn odd_leaf_is_duplicated() {
        let a = TxHash::digest(b"a");
        let b = TxHash::digest(b"b");
        let c = TxHash::digest(b"c");
        assert_eq!(merkle_root([a, b, c]), merkle_root([a, b, c, c]));
        assert_ne!(merkle_root([a, b]), merkle_root([b, a]));
    }

    #[test]
    fn empty_root_is_zero() {
        assert_eq!(merkle_root(Vec::new()), TxHash::ZERO);
    }

    #[test]
    fn aux_pow_not_hashed() {
        let mut block = Block::new(BlockHash::ZERO, 1, Vec::new());
        let before = block.hash();
        block.header.aux_pow = vec![9; 8];
        assert_eq!(block.hash(), before);
    }
}
