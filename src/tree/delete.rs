use std::cmp::Ordering;

use block::{BlockStore, Word};
use error::{ErrorKind, Result};
use super::{propagate, Tree};
use super::node::{compare_keys, Node};

pub fn delete<S: BlockStore>(tree: &mut Tree<S>, key: &[Word]) -> Result<()> {
	let mut path = tree.find_path(key)?;
	let leaf_level = path.len() - 1;
	let idx = path[leaf_level].probe(key);

	if compare_keys(path[leaf_level].key(idx), key) != Ordering::Equal {
		return Err(ErrorKind::NotFound(key.to_vec()).into());
	}

	delete_from(tree, &mut path, leaf_level, idx)
}

/// Remove the row at `idx` in `path[level]` and rebalance as needed: delete, then fix up the
/// parent, recursing upward only as far as a merge or borrow propagates.
fn delete_from<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize, idx: usize) -> Result<()> {
	path[level].remove(idx, 1);

	if level == 0 {
		if !path[0].is_leaf && path[0].width == 1 {
			let only_child = path[0].child(0);
			let old_root = path[0].id;
			tree.store.free_block(old_root)?;
			tree.root = only_child;
			tree.depth -= 1;
			return Ok(());
		}
		return propagate(tree, path, 0);
	}

	if path[level].width > path[level].min_width() {
		return propagate(tree, path, level);
	}

	balance(tree, path, level)
}

fn left_sibling<S: BlockStore>(tree: &Tree<S>, path: &[Node], level: usize) -> Result<Option<Node>> {
	if level == 0 || path[level].pos == 0 {
		return Ok(None);
	}
	let parent = &path[level - 1];
	let sib_pos = path[level].pos - 1;
	let id = parent.child(sib_pos);
	let is_leaf = level == path.len() - 1;
	let slot0 = parent.key(sib_pos).to_vec();
	Ok(Some(tree.load_node(id, is_leaf, sib_pos, slot0)?))
}

fn right_sibling<S: BlockStore>(tree: &Tree<S>, path: &[Node], level: usize) -> Result<Option<Node>> {
	if level == 0 {
		return Ok(None);
	}
	let parent = &path[level - 1];
	let sib_pos = path[level].pos + 1;
	if sib_pos >= parent.width {
		return Ok(None);
	}
	let id = parent.child(sib_pos);
	let is_leaf = level == path.len() - 1;
	let slot0 = parent.key(sib_pos).to_vec();
	Ok(Some(tree.load_node(id, is_leaf, sib_pos, slot0)?))
}

/// Try, in order: borrow from the left sibling, borrow from the right, merge into the left,
/// merge into the right. One of the last two always succeeds for a non-root node.
fn balance<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize) -> Result<()> {
	let min_width = path[level].min_width();

	if let Some(mut left) = left_sibling(tree, path, level)? {
		if left.width > min_width {
			return borrow_from_left(tree, path, level, &mut left);
		}
	}
	if let Some(mut right) = right_sibling(tree, path, level)? {
		if right.width > min_width {
			return borrow_from_right(tree, path, level, &mut right);
		}
	}
	if let Some(left) = left_sibling(tree, path, level)? {
		return merge_with_left(tree, path, level, left);
	}
	if let Some(right) = right_sibling(tree, path, level)? {
		return merge_with_right(tree, path, level, right);
	}

	propagate(tree, path, level)
}

fn borrow_from_left<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize, left: &mut Node) -> Result<()> {
	let min_width = left.min_width();
	let taken = left.rows(min_width, left.width);
	let new_separator = taken[0][..left.key_width].to_vec();

	path[level].insert(0, &taken);
	left.remove(min_width, left.width - min_width);

	let left_new_id = tree.store.write_block(left.id, left.block())?;
	let cur_new_id = tree.store.write_block(path[level].id, path[level].block())?;
	path[level].id = cur_new_id;

	let pos = path[level].pos;
	let parent = &mut path[level - 1];
	parent.set_child(pos - 1, left_new_id);
	let mut sep_row = new_separator;
	sep_row.push(cur_new_id);
	parent.set_row(pos, &sep_row);

	propagate(tree, path, level - 1)
}

fn borrow_from_right<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize, right: &mut Node) -> Result<()> {
	let min_width = right.min_width();
	let amount = right.width - min_width;
	let taken = right.rows(0, amount);
	let cur_width = path[level].width;

	path[level].insert(cur_width, &taken);
	right.remove(0, amount);

	let new_separator = right.row(0)[..right.key_width].to_vec();

	let right_new_id = tree.store.write_block(right.id, right.block())?;
	let cur_new_id = tree.store.write_block(path[level].id, path[level].block())?;
	path[level].id = cur_new_id;

	let pos = path[level].pos;
	let right_pos = right.pos;
	let parent = &mut path[level - 1];
	parent.set_child(pos, cur_new_id);
	let mut sep_row = new_separator;
	sep_row.push(right_new_id);
	parent.set_row(right_pos, &sep_row);

	propagate(tree, path, level - 1)
}

/// Append this node's rows onto `left` (keeping `left`'s ID), free this node, then delete the
/// now-redundant separator row from the parent.
fn merge_with_left<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize, mut left: Node) -> Result<()> {
	let rows = path[level].rows(0, path[level].width);
	left.insert(left.width, &rows);

	let cur_pos = path[level].pos;
	let cur_id = path[level].id;
	let left_pos = left.pos;

	let new_left_id = tree.store.write_block(left.id, left.block())?;
	tree.store.free_block(cur_id)?;

	path.truncate(level);
	if new_left_id != left.id {
		path[level - 1].set_child(left_pos, new_left_id);
	}

	delete_from(tree, path, level - 1, cur_pos)
}

/// Prepend this node's rows onto `right` (keeping `right`'s ID), free this node, then delete the
/// now-redundant separator row from the parent.
fn merge_with_right<S: BlockStore>(tree: &mut Tree<S>, path: &mut Vec<Node>, level: usize, mut right: Node) -> Result<()> {
	let mut merged = path[level].rows(0, path[level].width);
	merged.extend(right.rows(0, right.width));

	let mut combined = Node::empty(right.is_leaf, right.key_width, right.row_width);
	combined.insert(0, &merged);

	let cur_pos = path[level].pos;
	let cur_id = path[level].id;
	let right_pos = right.pos;

	let new_right_id = tree.store.write_block(right.id, combined.block())?;
	tree.store.free_block(cur_id)?;

	path.truncate(level);
	if new_right_id != right.id {
		path[level - 1].set_child(right_pos, new_right_id);
	}

	delete_from(tree, path, level - 1, cur_pos)
}
