//! A `BlockStore` backed by a crash-safe [`::file::File`].
//!
//! Block IDs are byte offsets into the file, aligned to [`BYTES`](super::BYTES). Byte offset
//! zero is reserved: it holds the store's header (the free-list head, in word 0), so it is never
//! handed out as a block ID. Real blocks start at offset `BYTES`.

use parking_lot::Mutex;

use block::{Block, BlockStore, Word, BYTES};
use error::{ErrorKind, Result};
use file::File;

/// The header block occupies the file's first `BYTES` bytes; word 0 holds the free-list head.
struct Header {
	free: Word,
}

/// A `BlockStore` whose blocks live in a crash-safe data file.
pub struct FileStore {
	file: File,
	header: Mutex<Header>,
}

impl FileStore {
	/// Open (or initialize) a file-backed block store. A brand-new (empty) file is given a
	/// zeroed header block; an existing file's header is read back to recover the free-list head.
	pub fn open(file: File) -> Result<FileStore> {
		let size = file.stat()?;

		if size == 0 {
			let header = Block::zeroed();
			file.write_at(&header.to_bytes(), 0)?;
		}

		let mut buf = [0u8; BYTES];
		file.read_at(&mut buf, 0)?;
		let header = Block::from_bytes(&buf);

		Ok(FileStore {
			file,
			header: Mutex::new(Header { free: header[0] }),
		})
	}

	fn write_header(&self, free: Word) -> Result<()> {
		let mut header = Block::zeroed();
		header[0] = free;
		self.file.write_at(&header.to_bytes(), 0)?;
		Ok(())
	}

	fn check_id(&self, id: Word) -> Result<()> {
		if id == 0 || id % BYTES as Word != 0 {
			return Err(ErrorKind::StorageEOF(id).into());
		}
		Ok(())
	}
}

impl BlockStore for FileStore {
	fn read_block(&self, id: Word, out: &mut Block) -> Result<()> {
		self.check_id(id)?;

		let size = self.file.stat()?;
		if id + BYTES as Word > size {
			return Err(ErrorKind::StorageEOF(id).into());
		}

		let mut buf = [0u8; BYTES];
		self.file.read_at(&mut buf, id)?;
		*out = Block::from_bytes(&buf);
		Ok(())
	}

	fn add_block(&mut self, block: &Block) -> Result<Word> {
		let mut header = self.header.lock();

		if header.free != 0 {
			let id = header.free;
			let mut link = Block::zeroed();
			self.read_block(id, &mut link)?;
			header.free = link[0];
			self.file.write_at(&block.to_bytes(), id)?;
			self.write_header(header.free)?;
			return Ok(id);
		}

		// `open` always leaves at least a header block in place, so `stat` never returns 0 here.
		let id = self.file.stat()?;
		self.file.write_at(&block.to_bytes(), id)?;
		Ok(id)
	}

	fn write_block(&mut self, id: Word, block: &Block) -> Result<Word> {
		self.check_id(id)?;
		self.file.write_at(&block.to_bytes(), id)?;
		Ok(id)
	}

	fn free_block(&mut self, id: Word) -> Result<()> {
		self.check_id(id)?;

		let mut header = self.header.lock();
		let mut link = Block::zeroed();
		link[0] = header.free;
		self.file.write_at(&link.to_bytes(), id)?;
		header.free = id;
		self.write_header(header.free)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	extern crate tempdir;

	use super::FileStore;
	use block::{Block, BlockStore};
	use file::File;

	fn open_store(dir: &tempdir::TempDir) -> FileStore {
		let path = dir.path().join("data");
		::std::fs::OpenOptions::new().write(true).create(true).open(&path).unwrap();
		FileStore::open(File::open(&path).unwrap()).unwrap()
	}

	#[test]
	fn add_then_read_roundtrips() {
		let dir = tempdir::TempDir::new("file_store_roundtrip").unwrap();
		let mut store = open_store(&dir);

		let mut b = Block::zeroed();
		b[0] = 123;
		let id = store.add_block(&b).unwrap();
		assert_ne!(id, 0);

		let mut out = Block::zeroed();
		store.read_block(id, &mut out).unwrap();
		assert_eq!(out, b);
	}

	#[test]
	fn free_then_add_reuses_the_id() {
		let dir = tempdir::TempDir::new("file_store_free_reuse").unwrap();
		let mut store = open_store(&dir);

		let a = store.add_block(&Block::zeroed()).unwrap();
		let b = store.add_block(&Block::zeroed()).unwrap();
		store.free_block(a).unwrap();

		let mut payload = Block::zeroed();
		payload[0] = 7;
		let reused = store.add_block(&payload).unwrap();

		assert_eq!(reused, a);
		assert_ne!(reused, b);
	}

	#[test]
	fn header_survives_reopen() {
		let dir = tempdir::TempDir::new("file_store_reopen").unwrap();
		let path = dir.path().join("data");
		::std::fs::OpenOptions::new().write(true).create(true).open(&path).unwrap();

		let a;
		{
			let mut store = FileStore::open(File::open(&path).unwrap()).unwrap();
			let x = store.add_block(&Block::zeroed()).unwrap();
			store.free_block(x).unwrap();
			a = x;
		}

		let mut store = FileStore::open(File::open(&path).unwrap()).unwrap();
		let mut payload = Block::zeroed();
		payload[0] = 55;
		let reused = store.add_block(&payload).unwrap();
		assert_eq!(reused, a);
	}
}
