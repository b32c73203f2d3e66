//! The on-disk journal format used to make a `File` transaction crash-safe.
//!
//! Byte layout:
//!
//! ```text
//! [ 0..32 )   sha3-256(digest of bytes[32..])   (written last)
//! [ 32..  )   varint  pre_tx_size
//!             repeat {
//!               varint   at
//!               varint   n_from ; bytes[n_from]
//!               varint   n_to   ; bytes[n_to]
//!             }
//! ```
//!
//! `len(to) == 0` denotes a truncate-to-`at`; `len(from) == 0` denotes an append.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use hex_slice::AsHex;
use tiny_keccak::sha3_256;
use varint_rs::{VarintReader, VarintWriter};

use error::{ErrorKind, Result};

pub const HASH_SIZE: usize = 32;

/// A single staged change: `from` is the prior bytes (captured for recovery), `to` is the new
/// bytes (empty for a truncate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
	pub at: u64,
	pub from: Vec<u8>,
	pub to: Vec<u8>,
}

impl Operation {
	fn write_to(&self, mut w: &mut Write) -> Result<()> {
		w.write_u64_varint(self.at)?;
		w.write_u64_varint(self.from.len() as u64)?;
		w.write_all(&self.from)?;
		w.write_u64_varint(self.to.len() as u64)?;
		w.write_all(&self.to)?;
		Ok(())
	}

	fn read_from(r: &mut Cursor<&[u8]>) -> Result<Operation> {
		let at = r.read_u64_varint()?;

		let from_len = r.read_u64_varint()? as usize;
		let mut from = vec![0u8; from_len];
		r.read_exact(&mut from)?;

		let to_len = r.read_u64_varint()? as usize;
		let mut to = vec![0u8; to_len];
		r.read_exact(&mut to)?;

		Ok(Operation { at, from, to })
	}

	/// `true` if this operation is a truncate (no new bytes written at `at`).
	pub fn is_truncate(&self) -> bool {
		self.to.is_empty()
	}
}

fn at_end(r: &Cursor<&[u8]>) -> bool {
	r.position() >= r.get_ref().len() as u64
}

/// The body of a journal: the file's pre-transaction size plus the ordered list of staged
/// operations, still missing its header hash.
#[derive(Debug, Default)]
pub struct Journal {
	pub pre_tx_size: u64,
	pub ops: Vec<Operation>,
}

impl Journal {
	pub fn new(pre_tx_size: u64) -> Journal {
		Journal {
			pre_tx_size,
			ops: Vec::new(),
		}
	}

	pub fn stage(&mut self, op: Operation) {
		self.ops.push(op);
	}

	/// Serialize the journal body (everything after the 32-byte hash placeholder).
	fn body(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.write_u64_varint(self.pre_tx_size).expect("writing to a Vec never fails");
		for op in &self.ops {
			op.write_to(&mut buf).expect("writing to a Vec never fails");
		}
		buf
	}

	/// Render the full on-disk bytes: the hash header followed by the body.
	pub fn to_bytes(&self) -> Vec<u8> {
		let body = self.body();
		let hash = sha3_256(&body);

		let mut out = Vec::with_capacity(HASH_SIZE + body.len());
		out.extend_from_slice(&hash);
		out.extend_from_slice(&body);
		out
	}

	/// Parse a journal previously serialized with `to_bytes`, verifying the header hash.
	///
	/// Fails with `JournalCorrupt` if the header hash does not match (or the file is too short
	/// to hold one) — the transaction never reached the commit step that finalizes the header, so
	/// this is recovered silently by the caller rather than surfaced further.
	pub fn parse(path: &Path, bytes: &[u8]) -> Result<Journal> {
		if bytes.len() < HASH_SIZE {
			return Err(ErrorKind::JournalCorrupt(path.to_owned(), "truncated journal header".into()).into());
		}

		let (header, body) = bytes.split_at(HASH_SIZE);
		let digest = sha3_256(body);
		if digest != header {
			let msg = format!("header hash {:02x} does not match computed {:02x}", header.as_hex(), digest.as_hex());
			return Err(ErrorKind::JournalCorrupt(path.to_owned(), msg).into());
		}

		let mut r = Cursor::new(body);
		let pre_tx_size = r.read_u64_varint()?;

		let mut ops = Vec::new();
		while !at_end(&r) {
			ops.push(Operation::read_from(&mut r)?);
		}

		Ok(Journal { pre_tx_size, ops })
	}
}
