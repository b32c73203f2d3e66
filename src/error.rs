#![allow(unknown_lints)]
#![allow(missing_docs)]

use std::{io, num};
use std::path::PathBuf;

use block::Word;

error_chain! {
	foreign_links {
		Io(io::Error);
		Num(num::ParseIntError);
	}

	errors {
		/// A block ID referred to a block beyond the end of the store.
		StorageEOF(id: Word) {
			description("block ID is out of range")
			display("block ID {} is out of range", id),
		}
		/// The underlying file reported an I/O failure.
		StorageIO(op: &'static str) {
			description("underlying storage failed")
			display("storage operation `{}` failed", op),
		}
		/// The journal's header hash did not match its recorded contents.
		JournalCorrupt(path: PathBuf, msg: String) {
			description("journal hash check failed")
			display("journal corruption detected at {}: {}", path.display(), msg),
		}
		/// A transaction attempted to write or truncate past its staged end.
		WriteAfterEnd(pos: u64, size: u64) {
			description("write past end of staged transaction")
			display("write at {} is past staged size {}", pos, size),
		}
		/// A key did not have the tree's configured key width.
		KeyWidth(expected: usize, got: usize) {
			description("key has the wrong width")
			display("key width mismatch: expected {}, got {}", expected, got),
		}
		/// A row did not have the tree's configured column count.
		BadRow(expected: usize, got: usize) {
			description("row has the wrong number of columns")
			display("row width mismatch: expected {} columns, got {}", expected, got),
		}
		/// No row exists for the given key.
		NotFound(key: Vec<Word>) {
			description("key not found")
			display("key not found: {:?}", key),
		}
		/// A path expression could not be tokenized or parsed.
		ParseFailure(msg: String) {
			description("failed to parse path expression")
			display("failed to parse path expression: {}", msg),
		}
		/// A `Rel` term did not match any entity type or attribute name.
		UnknownTerm(name: String) {
			description("unknown path term")
			display("unknown path term: `{}`", name),
		}
		/// An `Op` node named an operator with no registered compiler.
		UnknownOp(name: String) {
			description("unknown path operator")
			display("unknown path operator: `{}`", name),
		}
		/// An expression used a syntax form the compiler does not support.
		UnsupportedSyntax(msg: String) {
			description("unsupported path syntax")
			display("unsupported path syntax: {}", msg),
		}
		/// A model referenced a type ID with no corresponding type.
		UnknownType(id: usize) {
			description("unknown model type")
			display("unknown model type id: {}", id),
		}
		/// A schema or model element referred to something the model does not define.
		UnknownElement(name: String) {
			description("unknown model element")
			display("unknown model element: `{}`", name),
		}
	}
}

impl PartialEq for ErrorKind {
	fn eq(&self, other: &Self) -> bool {
		use self::ErrorKind::*;

		match (self, other) {
			(&StorageEOF(id), &StorageEOF(id2)) => id == id2,
			(&StorageIO(op), &StorageIO(op2)) => op == op2,
			(&JournalCorrupt(ref path, ref msg), &JournalCorrupt(ref path2, ref msg2)) =>
				path == path2 && msg == msg2,
			(&WriteAfterEnd(pos, size), &WriteAfterEnd(pos2, size2)) =>
				pos == pos2 && size == size2,
			(&KeyWidth(e, g), &KeyWidth(e2, g2)) => e == e2 && g == g2,
			(&BadRow(e, g), &BadRow(e2, g2)) => e == e2 && g == g2,
			(&NotFound(ref k), &NotFound(ref k2)) => k == k2,
			(&ParseFailure(ref m), &ParseFailure(ref m2)) => m == m2,
			(&UnknownTerm(ref n), &UnknownTerm(ref n2)) => n == n2,
			(&UnknownOp(ref n), &UnknownOp(ref n2)) => n == n2,
			(&UnsupportedSyntax(ref m), &UnsupportedSyntax(ref m2)) => m == m2,
			(&UnknownType(id), &UnknownType(id2)) => id == id2,
			(&UnknownElement(ref n), &UnknownElement(ref n2)) => n == n2,
			_ => false,
		}
	}
}
