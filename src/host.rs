//! Ties the model, storage, and path engine together into one evaluation entry point.

use std::collections::HashMap;

use block::{BlockStore, Word};
use error::{Error, ErrorKind, Result};
use model::{EntityModel, ABSOLUTE_ID};
use path::arrow;
use path::boxes::{self, Box as PathBox};
use path::cursor::Object;
use path::parser;
use path::types;
use tree::{compare_keys, Tree};

/// One [`Tree`] per entity type, indexed by type ID. Value types (integers, strings) have no
/// backing tree: their "rows" are the literal itself, handled entirely inside the path engine.
pub struct TreeStore<S> {
	trees: HashMap<Word, Tree<S>>,
}

impl<S: BlockStore> TreeStore<S> {
	pub fn new() -> TreeStore<S> {
		TreeStore { trees: HashMap::new() }
	}

	pub fn register(&mut self, entity_id: Word, tree: Tree<S>) {
		self.trees.insert(entity_id, tree);
	}

	fn tree(&self, entity_id: Word) -> Result<&Tree<S>> {
		self.trees.get(&entity_id).ok_or_else(|| ErrorKind::UnknownType(entity_id as usize).into())
	}
}

impl<S: BlockStore> boxes::Store for TreeStore<S> {
	/// `key` may be the entity's full key (an exact lookup), a shorter leading prefix (a
	/// bounded scan), or empty (a full scan).
	///
	/// A full/prefix scan probes from an all-zero key. A tree's very first insert always lands
	/// one slot past the dead slot-0 placeholder, so that placeholder is never a real row; we
	/// skip any row that comes back all-zero rather than report it as a match. Real data is never
	/// keyed entirely by zero, so this never drops a genuine row.
	fn find_entities(&self, entity_id: Word, key: &[Word]) -> Result<Vec<Object>> {
		let tree = self.tree(entity_id)?;
		let mut rows = Vec::new();

		if key.len() == tree.key_width() {
			match tree.get(key) {
				Ok(fields) => rows.push(Object { entity_id, fields }),
				Err(Error(ErrorKind::NotFound(_), _)) => {}
				Err(e) => return Err(e),
			}
			return Ok(rows);
		}

		let probe = vec![0; tree.key_width()];
		let mut range = tree.get_range(&probe)?;
		while range.next() {
			let row = range.this();
			if row.iter().all(|&w| w == 0) {
				continue;
			}
			if compare_keys(&row[..key.len()], key) == ::std::cmp::Ordering::Greater {
				break;
			}
			if &row[..key.len()] == key {
				rows.push(Object { entity_id, fields: row.to_vec() });
			}
		}
		if range.err().is_some() {
			return Err(ErrorKind::StorageIO("range scan during find_entities").into());
		}
		Ok(rows)
	}
}

/// The model plus a data source, exposing path evaluation as one call.
pub struct Host<S> {
	model: EntityModel,
	store: TreeStore<S>,
}

impl<S: BlockStore> Host<S> {
	pub fn new(model: EntityModel, store: TreeStore<S>) -> Host<S> {
		Host { model, store }
	}

	pub fn model(&self) -> &EntityModel {
		&self.model
	}

	/// The underlying store, for materializing a box returned by `eval`.
	pub fn store(&self) -> &TreeStore<S> {
		&self.store
	}

	/// The universe box: the single starting point every path is evaluated from.
	pub fn absolute(&self) -> PathBox {
		PathBox::single(ABSOLUTE_ID, 0)
	}

	/// Parse, type-check, compile, and run `path_text` starting from `start`.
	pub fn eval(&self, start: PathBox, path_text: &str) -> Result<PathBox> {
		let expr = parser::parse(path_text)?;
		types::analyze(&ModelAdapter(&self.model), &expr)?;
		let arrow = arrow::compile(&self.model, &expr)?;
		arrow.follow(&self.store, &self.model, start)
	}
}

/// Adapts [`EntityModel`] name lookup to the shape [`types::analyze`] wants.
struct ModelAdapter<'a>(&'a EntityModel);

impl<'a> types::ModelLookup for ModelAdapter<'a> {
	fn lookup(&self, name: &str) -> Result<types::Path> {
		use model::TypeKind;
		use path::ast::Expr;

		let mut alternatives = Vec::new();
		for t in &self.0.types {
			if t.kind != TypeKind::Entity {
				continue;
			}
			if t.name == name {
				alternatives.push(types::Alternative { source: types::Type::absolute(), target: types::Type::entity(&t.name) });
			}
			for attr in &t.attributes {
				if attr.name == name {
					alternatives.push(types::Alternative { source: types::Type::entity(&t.name), target: types::Type::attribute() });
				}
			}
		}
		if alternatives.is_empty() {
			return Err(ErrorKind::UnknownTerm(name.to_string()).into());
		}
		Ok(types::Path { expr: Expr::Rel(name.to_string()), alternatives })
	}
}
