//! Fixed-size blocks and the `BlockStore` abstraction they are read and written through.
//!
//! A [`Block`] is the unit of persistence for every higher layer (tree nodes, free-list links,
//! user-defined payloads): exactly [`WORDS`] unsigned 64-bit [`Word`]s, packed little-endian into
//! [`BYTES`] bytes on disk.

pub mod file;
pub mod mem;

use byteorder::{ByteOrder, LittleEndian};

use error::Result;

/// The universal on-disk cell: an unsigned 64-bit integer.
pub type Word = u64;

/// Number of [`Word`]s packed into a single [`Block`].
pub const WORDS: usize = 64;

/// Number of bytes a [`Block`] occupies on disk (`WORDS * 8`).
pub const BYTES: usize = WORDS * 8;

/// A single fixed-size unit of persistent storage: 64 Words (512 bytes).
///
/// `Block` owns its storage; typed views over it (tree nodes, free-list links) are accessor
/// methods layered on top, not aliased pointers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Block([Word; WORDS]);

impl Block {
	/// A block whose every Word is zero.
	pub fn zeroed() -> Block {
		Block([0; WORDS])
	}

	/// Borrow the block's Words.
	pub fn words(&self) -> &[Word; WORDS] {
		&self.0
	}

	/// Mutably borrow the block's Words.
	pub fn words_mut(&mut self) -> &mut [Word; WORDS] {
		&mut self.0
	}

	/// Serialize to the block's bit-exact byte form (little-endian Word packing).
	pub fn to_bytes(&self) -> [u8; BYTES] {
		let mut buf = [0u8; BYTES];
		for (i, w) in self.0.iter().enumerate() {
			LittleEndian::write_u64(&mut buf[i * 8..i * 8 + 8], *w);
		}
		buf
	}

	/// Deserialize from a block's bit-exact byte form.
	pub fn from_bytes(buf: &[u8]) -> Block {
		debug_assert_eq!(buf.len(), BYTES);
		let mut words = [0 as Word; WORDS];
		for (i, w) in words.iter_mut().enumerate() {
			*w = LittleEndian::read_u64(&buf[i * 8..i * 8 + 8]);
		}
		Block(words)
	}
}

impl Default for Block {
	fn default() -> Block {
		Block::zeroed()
	}
}

impl ::std::fmt::Debug for Block {
	fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
		f.debug_struct("Block").field("words", &&self.0[..]).finish()
	}
}

impl ::std::ops::Index<usize> for Block {
	type Output = Word;
	fn index(&self, idx: usize) -> &Word {
		&self.0[idx]
	}
}

impl ::std::ops::IndexMut<usize> for Block {
	fn index_mut(&mut self, idx: usize) -> &mut Word {
		&mut self.0[idx]
	}
}

/// A mapping from Block ID to Block contents, with free-list reuse of released IDs.
///
/// Implementations: [`mem::MemStore`] (in-process, for tests and scratch trees) and
/// [`file::FileStore`] (backed by a crash-safe [`::file::File`]).
pub trait BlockStore {
	/// Read the block at `id` into `out`. Fails with `StorageEOF` if `id` is out of range.
	fn read_block(&self, id: Word, out: &mut Block) -> Result<()>;

	/// Allocate a new block (reusing the free list's head if nonempty) and write `block` to it.
	fn add_block(&mut self, block: &Block) -> Result<Word>;

	/// Overwrite the block at `id`. May return a different ID if the underlying storage is
	/// append-only; callers must treat the returned ID as authoritative.
	fn write_block(&mut self, id: Word, block: &Block) -> Result<Word>;

	/// Release `id` back to the free list.
	fn free_block(&mut self, id: Word) -> Result<()>;
}
