use std::cmp::Ordering;

use block::{BlockStore, Word};
use error::{ErrorKind, Result};
use super::{propagate, Tree};
use super::node::{compare_keys, Node};

pub fn put<S: BlockStore>(tree: &mut Tree<S>, row: &[Word]) -> Result<()> {
	if row.len() != tree.columns {
		return Err(ErrorKind::BadRow(tree.columns, row.len()).into());
	}

	let key = row[..tree.key_width].to_vec();
	let mut path = tree.find_path(&key)?;
	let leaf_level = path.len() - 1;
	let idx = path[leaf_level].probe(&key);

	if path[leaf_level].width > 0 && path[leaf_level].row(idx) == row {
		return Ok(());
	}
	if path[leaf_level].width > 0 && compare_keys(path[leaf_level].key(idx), &key) == Ordering::Equal {
		path[leaf_level].set_row(idx, row);
		return propagate(tree, &mut path, leaf_level);
	}

	let mut level = leaf_level;
	let mut insert_key = key;
	let mut insert_row = row.to_vec();

	loop {
		let split = insert_one(&mut tree.store, &mut path[level], &insert_key, insert_row.clone())?;

		let split = match split {
			None => return propagate(tree, &mut path, level),
			Some(s) => s,
		};
		let (separator, right_id) = split;

		let new_id = tree.store.write_block(path[level].id, path[level].block())?;
		path[level].id = new_id;

		if level == 0 {
			let mut root = Node::empty(false, tree.key_width, tree.key_width + 1);
			root.set_child(0, new_id);
			let mut row = separator;
			row.push(right_id);
			root.insert(1, &[row]);

			let root_id = tree.store.add_block(root.block())?;
			tree.root = root_id;
			tree.depth += 1;
			return Ok(());
		}

		let pos = path[level].pos;
		path[level - 1].set_child(pos, new_id);

		level -= 1;
		insert_key = separator.clone();
		insert_row = separator;
		insert_row.push(right_id);
	}
}

/// Insert `row` (keyed by `key`) into `node`, splitting it first if it is already full. Returns
/// `Some((separator, right_id))` when a split occurred and a new entry needs to go to the node's
/// parent.
fn insert_one<S: BlockStore>(store: &mut S, node: &mut Node, key: &[Word], row: Vec<Word>) -> Result<Option<(Vec<Word>, Word)>> {
	if node.width < node.max_width() {
		let idx = node.probe(key);
		node.insert(idx + 1, &[row]);
		return Ok(None);
	}

	let min_width = node.min_width();
	let max_width = node.max_width();
	let separator = node.key(min_width).to_vec();

	let mut right = Node::empty(node.is_leaf, node.key_width, node.row_width);
	right.insert(0, &node.rows(min_width, max_width));
	node.remove(min_width, max_width - min_width);

	if compare_keys(key, &separator) != Ordering::Less {
		let idx = right.probe(key);
		right.insert(idx + 1, &[row]);
	} else {
		let idx = node.probe(key);
		node.insert(idx + 1, &[row]);
	}

	let right_id = store.add_block(right.block())?;
	Ok(Some((separator, right_id)))
}
