use block::{BlockStore, Word};
use error::{Error, Result};
use super::Tree;
use super::node::Node;

/// A forward-only cursor over a tree, starting at the largest row with key ≤ the probed key and
/// walking ascending to the end of the tree.
///
/// Usage mirrors a classic `Next`/`This`/`Err` loop: call [`next`](Range::next) before the first
/// [`this`](Range::this), and check [`err`](Range::err) once `next` returns `false` to distinguish
/// exhaustion from a storage failure encountered mid-walk.
pub struct Range<'t, S: 't> {
	tree: &'t Tree<S>,
	path: Vec<Node>,
	pos: isize,
	err: Option<Error>,
}

impl<'t, S: BlockStore> Range<'t, S> {
	pub(crate) fn new(tree: &'t Tree<S>, key: &[Word]) -> Result<Range<'t, S>> {
		let path = tree.find_path(key)?;
		let idx = path.last().expect("find_path always visits at least the root").probe(key);

		Ok(Range {
			tree,
			path,
			pos: idx as isize - 1,
			err: None,
		})
	}

	/// Advance to the next row. Returns `false` once the tree is exhausted or a storage error
	/// occurred; in the latter case [`err`](Range::err) is `Some`.
	pub fn next(&mut self) -> bool {
		if self.err.is_some() {
			return false;
		}

		self.pos += 1;
		let width = self.path.last().expect("path is never empty").width as isize;
		if self.pos < width {
			return true;
		}

		match self.advance() {
			Ok(true) => {
				self.pos = 0;
				true
			}
			Ok(false) => false,
			Err(e) => {
				self.err = Some(e);
				false
			}
		}
	}

	/// The row at the cursor's current position. Only valid after `next` has returned `true`.
	pub fn this(&self) -> &[Word] {
		self.path.last().expect("path is never empty").row(self.pos as usize)
	}

	/// The error that ended the walk early, if any.
	pub fn err(&self) -> Option<&Error> {
		self.err.as_ref()
	}

	/// Walk up the path to the nearest ancestor with an unvisited right sibling, then redescend
	/// leftmost from there to a new leaf. Returns `false` if no such ancestor exists (the tree is
	/// exhausted).
	fn advance(&mut self) -> Result<bool> {
		let leaf_level = self.tree.depth;
		let mut level = self.path.len() - 1;

		loop {
			if level == 0 {
				return Ok(false);
			}
			if self.path[level].pos + 1 < self.path[level - 1].width {
				break;
			}
			level -= 1;
		}

		let mut cur_pos = self.path[level].pos + 1;
		self.path.truncate(level);

		for lvl in level..=leaf_level {
			let is_leaf = lvl == leaf_level;
			let (id, slot0) = {
				let parent = &self.path[lvl - 1];
				(parent.child(cur_pos), parent.key(cur_pos).to_vec())
			};
			let node = self.tree.load_node(id, is_leaf, cur_pos, slot0)?;
			self.path.push(node);
			cur_pos = 0;
		}

		Ok(true)
	}
}
