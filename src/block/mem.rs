//! An in-memory `BlockStore`, addressed the same way as the file-backed store: Block IDs are byte
//! offsets aligned to [`BYTES`](super::BYTES), with offset zero reserved as the free-list
//! terminator and therefore never handed out as a real block ID.

use block::{Block, BlockStore, Word, BYTES};
use error::{ErrorKind, Result};

/// A `BlockStore` backed by a plain `Vec<Block>`. Useful for scratch trees and as the baseline
/// implementation exercised by the property tests in `tree`.
#[derive(Debug)]
pub struct MemStore {
	/// `blocks[0]` is a permanently unused placeholder so that byte offset 0 is never a valid
	/// block ID, matching the terminator convention `FileStore` enforces by reserving its header
	/// block.
	blocks: Vec<Block>,
	free: Word,
}

impl MemStore {
	/// Create an empty store with no allocated blocks and an empty free list.
	pub fn new() -> MemStore {
		MemStore {
			blocks: vec![Block::zeroed()],
			free: 0,
		}
	}

	/// Number of blocks currently allocated (including the reserved placeholder and any on the
	/// free list).
	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	fn index_of(&self, id: Word) -> Result<usize> {
		if id == 0 || id % BYTES as Word != 0 {
			return Err(ErrorKind::StorageEOF(id).into());
		}
		let idx = (id / BYTES as Word) as usize;
		if idx >= self.blocks.len() {
			return Err(ErrorKind::StorageEOF(id).into());
		}
		Ok(idx)
	}
}

impl Default for MemStore {
	fn default() -> MemStore {
		MemStore::new()
	}
}

impl BlockStore for MemStore {
	fn read_block(&self, id: Word, out: &mut Block) -> Result<()> {
		let idx = self.index_of(id)?;
		*out = self.blocks[idx];
		Ok(())
	}

	fn add_block(&mut self, block: &Block) -> Result<Word> {
		if self.free != 0 {
			let id = self.free;
			let idx = self.index_of(id)?;
			self.free = self.blocks[idx][0];
			self.blocks[idx] = *block;
			return Ok(id);
		}

		let idx = self.blocks.len();
		self.blocks.push(*block);
		Ok((idx * BYTES) as Word)
	}

	fn write_block(&mut self, id: Word, block: &Block) -> Result<Word> {
		let idx = self.index_of(id)?;
		self.blocks[idx] = *block;
		Ok(id)
	}

	fn free_block(&mut self, id: Word) -> Result<()> {
		let idx = self.index_of(id)?;
		let mut link = Block::zeroed();
		link[0] = self.free;
		self.blocks[idx] = link;
		self.free = id;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use block::Block;

	#[test]
	fn add_then_read_roundtrips() {
		let mut store = MemStore::new();
		let mut b = Block::zeroed();
		b[0] = 7;

		let id = store.add_block(&b).unwrap();
		assert_ne!(id, 0);

		let mut out = Block::zeroed();
		store.read_block(id, &mut out).unwrap();
		assert_eq!(out, b);
	}

	#[test]
	fn zero_is_never_a_valid_block_id() {
		let store = MemStore::new();
		let mut out = Block::zeroed();
		assert!(store.read_block(0, &mut out).is_err());
	}

	#[test]
	fn read_out_of_range_is_eof() {
		let store = MemStore::new();
		let mut out = Block::zeroed();
		assert!(store.read_block(BYTES as Word, &mut out).is_err());
	}

	#[test]
	fn free_then_add_reuses_the_id() {
		let mut store = MemStore::new();
		let a = store.add_block(&Block::zeroed()).unwrap();
		let b = store.add_block(&Block::zeroed()).unwrap();

		store.free_block(a).unwrap();

		let mut payload = Block::zeroed();
		payload[0] = 99;
		let reused = store.add_block(&payload).unwrap();

		assert_eq!(reused, a);
		assert_ne!(reused, b);

		let mut out = Block::zeroed();
		store.read_block(reused, &mut out).unwrap();
		assert_eq!(out, payload);
	}

	#[test]
	fn free_list_is_lifo_when_otherwise_empty() {
		let mut store = MemStore::new();
		let a = store.add_block(&Block::zeroed()).unwrap();

		store.free_block(a).unwrap();
		let reused = store.add_block(&Block::zeroed()).unwrap();

		assert_eq!(reused, a);
	}
}
