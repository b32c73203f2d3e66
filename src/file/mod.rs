//! A crash-safe file: byte-level random I/O with ACID append/update/truncate via a journal.
//!
//! `File` allows multiple concurrent readers
//! but only one in-flight transaction; `Tx::commit` briefly excludes readers while it applies the
//! journal to the data file.

mod journal;

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use error::{Error, ErrorKind, Result};
use self::journal::{Journal, Operation};

/// A persistent byte store with crash-safe, journaled writes.
pub struct File {
	data: Mutex<fs::File>,
	/// Held exclusively for the duration of `Tx::commit`; held shared by `read_at`. Guards
	/// against readers observing a half-applied commit.
	commit: RwLock<()>,
	/// Held for the lifetime of an open `Tx`; only one transaction may be open at a time.
	tx_lock: Mutex<()>,
	path: PathBuf,
}

/// An open transaction against a `File`. At most one may exist per `File` at a time.
pub struct Tx<'f> {
	file: &'f File,
	_guard: ::parking_lot::MutexGuard<'f, ()>,
	old_size: u64,
	new_size: u64,
	journal: Journal,
}

impl File {
	fn journal_path(path: &Path) -> PathBuf {
		let mut p = path.as_os_str().to_owned();
		p.push(".journal");
		PathBuf::from(p)
	}

	/// Open `path` for reading and writing. If a journal file is present, recovery runs first:
	/// a valid journal is rolled back and then deleted; a corrupt
	/// journal (hash mismatch) is simply deleted, since the transaction never reached the commit
	/// step that would have started mutating the data file.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<File> {
		let path = path.as_ref().to_owned();
		let journal_path = Self::journal_path(&path);

		let mut data = fs::OpenOptions::new().read(true).write(true).open(&path)?;

		if journal_path.exists() {
			Self::recover(&mut data, &journal_path)?;
			fs::remove_file(&journal_path)?;
		}

		Ok(File {
			data: Mutex::new(data),
			commit: RwLock::new(()),
			tx_lock: Mutex::new(()),
			path,
		})
	}

	/// Recovers from `journal_path` against `data`. A corrupt journal (the transaction never
	/// reached the commit step that finalizes its header hash) is recovered silently: nothing to
	/// restore, the journal is simply discarded by the caller.
	fn recover(data: &mut fs::File, journal_path: &Path) -> Result<()> {
		let bytes = fs::read(journal_path)?;

		let journal = match Journal::parse(journal_path, &bytes) {
			Ok(j) => j,
			Err(Error(ErrorKind::JournalCorrupt(..), _)) => return Ok(()),
			Err(e) => return Err(e),
		};

		restore_size(data, journal.pre_tx_size)?;

		for op in &journal.ops {
			if !op.from.is_empty() {
				data.seek(SeekFrom::Start(op.at))?;
				data.write_all(&op.from)?;
			}
		}
		data.flush()?;

		Ok(())
	}

	/// Read `buf.len()` bytes starting at `pos`. Concurrent with other reads; blocks only while a
	/// commit is finalizing.
	pub fn read_at(&self, buf: &mut [u8], pos: u64) -> Result<()> {
		let _guard = self.commit.read();
		let mut data = self.data.lock();
		data.seek(SeekFrom::Start(pos))?;
		data.read_exact(buf)?;
		Ok(())
	}

	/// Current size of the file in bytes.
	pub fn stat(&self) -> Result<u64> {
		let data = self.data.lock();
		Ok(data.metadata()?.len())
	}

	/// Begin a transaction. Blocks until any previously open transaction on this `File` has
	/// closed.
	pub fn begin(&self) -> Result<Tx> {
		let guard = self.tx_lock.lock();
		let size = self.stat()?;

		Ok(Tx {
			file: self,
			_guard: guard,
			old_size: size,
			new_size: size,
			journal: Journal::new(size),
		})
	}

	/// Convenience: open a transaction, write `buf` at `pos`, and commit immediately.
	pub fn write_at(&self, buf: &[u8], pos: u64) -> Result<()> {
		let mut tx = self.begin()?;
		tx.write_at(buf, pos)?;
		tx.commit()
	}
}

impl<'f> Tx<'f> {
	/// Stage a write at `pos`. Bytes within the transaction's original bounds are staged as an
	/// update (capturing prior bytes for rollback); bytes past the original size are staged as an
	/// append. Writing past the transaction's current staged size is an error.
	pub fn write_at(&mut self, buf: &[u8], pos: u64) -> Result<()> {
		if pos > self.new_size {
			return Err(ErrorKind::WriteAfterEnd(pos, self.new_size).into());
		}

		let n = buf.len() as u64;
		let (update_buf, append_buf, split) = if pos >= self.old_size {
			(&buf[..0], buf, 0)
		} else if pos + n > self.old_size {
			let split = (self.old_size - pos) as usize;
			(&buf[..split], &buf[split..], split as u64)
		} else {
			(buf, &buf[..0], n)
		};

		self.stage_update(update_buf, pos)?;
		self.stage_append(append_buf, pos + split)?;

		if pos + n > self.new_size {
			self.new_size = pos + n;
		}

		Ok(())
	}

	/// Stage a truncate to `size`. Bytes below the old size are captured for rollback.
	pub fn truncate(&mut self, size: u64) -> Result<()> {
		if size > self.new_size {
			return Err(ErrorKind::WriteAfterEnd(size, self.new_size).into());
		}

		self.new_size = size;

		if size >= self.old_size {
			return Ok(());
		}

		let mut buf = vec![0u8; (self.old_size - size) as usize];
		{
			let mut data = self.file.data.lock();
			data.seek(SeekFrom::Start(size))?;
			data.read_exact(&mut buf)?;
		}

		self.journal.stage(Operation { at: size, from: buf, to: Vec::new() });
		Ok(())
	}

	fn stage_update(&mut self, buf: &[u8], pos: u64) -> Result<()> {
		if buf.is_empty() {
			return Ok(());
		}

		let mut from = vec![0u8; buf.len()];
		{
			let mut data = self.file.data.lock();
			data.seek(SeekFrom::Start(pos))?;
			data.read_exact(&mut from)?;
		}

		self.journal.stage(Operation { at: pos, from, to: buf.to_vec() });
		Ok(())
	}

	fn stage_append(&mut self, buf: &[u8], pos: u64) -> Result<()> {
		if buf.is_empty() {
			return Ok(());
		}

		self.journal.stage(Operation { at: pos, from: Vec::new(), to: buf.to_vec() });
		Ok(())
	}

	/// Commit the transaction: finalize and fsync the journal, apply its operations to the data
	/// file, then delete the journal. Durable before returning.
	pub fn commit(self) -> Result<()> {
		let journal_path = File::journal_path(&self.file.path);
		let bytes = self.journal.to_bytes();

		{
			let mut jfile = fs::OpenOptions::new()
				.write(true)
				.create_new(true)
				.open(&journal_path)?;
			jfile.write_all(&bytes)?;
			jfile.flush()?;
			jfile.sync_all()?;
		}

		if let Some(parent) = journal_path.parent() {
			if let Ok(dir) = fs::File::open(parent) {
				let _ = dir.sync_all();
			}
		}

		{
			let _guard = self.file.commit.write();
			let mut data = self.file.data.lock();

			for op in &self.journal.ops {
				if op.is_truncate() {
					data.set_len(op.at)?;
				} else {
					data.seek(SeekFrom::Start(op.at))?;
					data.write_all(&op.to)?;
				}
			}
			data.flush()?;
		}

		fs::remove_file(&journal_path)?;

		if let Some(parent) = journal_path.parent() {
			if let Ok(dir) = fs::File::open(parent) {
				let _ = dir.sync_all();
			}
		}

		Ok(())
	}
}

impl<'f> Drop for Tx<'f> {
	fn drop(&mut self) {
		// Dropping without committing discards all staged changes: nothing has touched the data
		// file, and no journal was ever written to disk.
	}
}

fn restore_size(data: &mut fs::File, size: u64) -> Result<()> {
	let current = data.metadata()?.len();
	if size < current {
		data.set_len(size)?;
	} else if size > current {
		data.seek(SeekFrom::Start(current))?;
		let pad = vec![0u8; (size - current) as usize];
		data.write_all(&pad)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	extern crate tempdir;

	use super::File;

	fn temp_file(name: &str) -> (tempdir::TempDir, ::std::path::PathBuf) {
		let dir = tempdir::TempDir::new(name).unwrap();
		let path = dir.path().join("data");
		::std::fs::OpenOptions::new().write(true).create(true).open(&path).unwrap();
		(dir, path)
	}

	#[test]
	fn write_then_reopen_reads_back() {
		let (_dir, path) = temp_file("write_then_reopen");

		{
			let f = File::open(&path).unwrap();
			f.write_at(&[1, 2, 3], 0).unwrap();
		}

		let f = File::open(&path).unwrap();
		let mut buf = [0u8; 3];
		f.read_at(&mut buf, 0).unwrap();
		assert_eq!(buf, [1, 2, 3]);
	}

	#[test]
	fn write_past_end_is_append() {
		let (_dir, path) = temp_file("write_past_end");
		let f = File::open(&path).unwrap();

		f.write_at(&[1, 2, 3], 0).unwrap();
		assert_eq!(f.stat().unwrap(), 3);
	}

	#[test]
	fn transaction_can_be_abandoned_without_committing() {
		let (_dir, path) = temp_file("abandon_tx");
		let f = File::open(&path).unwrap();

		{
			let mut tx = f.begin().unwrap();
			tx.write_at(&[9, 9, 9], 0).unwrap();
			// tx dropped without commit
		}

		assert_eq!(f.stat().unwrap(), 0);
	}

	#[test]
	fn truncate_then_reopen_shrinks_file() {
		let (_dir, path) = temp_file("truncate");
		let f = File::open(&path).unwrap();

		f.write_at(&[1, 2, 3, 4, 5], 0).unwrap();

		{
			let mut tx = f.begin().unwrap();
			tx.truncate(2).unwrap();
			tx.commit().unwrap();
		}

		assert_eq!(f.stat().unwrap(), 2);
		let mut buf = [0u8; 2];
		f.read_at(&mut buf, 0).unwrap();
		assert_eq!(buf, [1, 2]);
	}

	#[test]
	fn write_past_staged_size_is_an_error() {
		let (_dir, path) = temp_file("write_past_staged");
		let f = File::open(&path).unwrap();

		let mut tx = f.begin().unwrap();
		assert!(tx.write_at(&[1, 2, 3], 10).is_err());
	}

	#[test]
	fn recovers_from_a_journal_with_a_flipped_hash_byte() {
		let (_dir, path) = temp_file("flipped_hash");

		// A journal whose header hash doesn't match its body signals that commit never reached
		// the data-mutation step: the data file (empty) must be left untouched.
		let journal_path = {
			let mut p = path.as_os_str().to_owned();
			p.push(".journal");
			::std::path::PathBuf::from(p)
		};

		let mut bytes = super::journal::Journal::new(0).to_bytes();
		let last = bytes.len() - 1;
		bytes[last] ^= 0xff;
		::std::fs::write(&journal_path, &bytes).unwrap();

		let f = File::open(&path).unwrap();
		assert_eq!(f.stat().unwrap(), 0);
		assert!(!journal_path.exists());
	}
}
