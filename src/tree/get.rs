use std::cmp::Ordering;

use block::{BlockStore, Word};
use error::{ErrorKind, Result};
use super::Tree;
use super::node::compare_keys;

pub fn get<S: BlockStore>(tree: &Tree<S>, key: &[Word]) -> Result<Vec<Word>> {
	let path = tree.find_path(key)?;
	let leaf = path.last().expect("find_path always visits at least the root");
	let idx = leaf.probe(key);

	if leaf.width == 0 || compare_keys(leaf.key(idx), key) != Ordering::Equal {
		return Err(ErrorKind::NotFound(key.to_vec()).into());
	}

	Ok(leaf.row(idx).to_vec())
}
