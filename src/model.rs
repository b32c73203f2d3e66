//! The entity/attribute model consulted by the path engine and used to lay out per-type trees.
//!
//! A model is an immutable configuration value: something else (a schema-stream reader, a test
//! fixture) builds it once and hands it to a [`::host::Host`]. Nothing here parses or mutates it.

use block::Word;
use error::{ErrorKind, Result};

/// Type ID 0: the singleton universe object every path starts from.
pub const ABSOLUTE_ID: Word = 0;
/// Type ID 1: the built-in integer value type.
pub const INTEGER_ID: Word = 1;
/// Type ID 2: the built-in string value type.
pub const STRING_ID: Word = 2;

/// What kind of thing a [`EntityType`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
	/// The sentinel universe type (only type 0 has this kind).
	Absolute,
	/// A scalar value type (e.g. integer, string) with no identity beyond its value.
	Value,
	/// An entity type with identifying columns forming a primary key.
	Entity,
}

/// One column of an entity type.
#[derive(Debug, Clone)]
pub struct Attribute {
	pub name: String,
	/// Identifying attributes are a prefix of the list and form the primary key.
	pub identifying: bool,
	/// The type ID of the values this attribute holds.
	pub type_id: Word,
}

/// One type in the model: its kind and, for entities, its column list.
#[derive(Debug, Clone)]
pub struct EntityType {
	pub id: Word,
	pub name: String,
	pub kind: TypeKind,
	pub attributes: Vec<Attribute>,
}

impl EntityType {
	/// Number of leading attributes that are identifying (the primary key width).
	pub fn key_width(&self) -> usize {
		self.attributes.iter().take_while(|a| a.identifying).count()
	}
}

/// An immutable list of types, indexed by ID.
#[derive(Debug, Clone, Default)]
pub struct EntityModel {
	pub types: Vec<EntityType>,
}

impl EntityModel {
	pub fn new(types: Vec<EntityType>) -> EntityModel {
		EntityModel { types }
	}

	pub fn type_by_id(&self, id: Word) -> Result<&EntityType> {
		self.types
			.iter()
			.find(|t| t.id == id)
			.ok_or_else(|| ErrorKind::UnknownType(id as usize).into())
	}

	/// Every type (entity or value) whose name matches, in declaration order.
	pub fn types_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EntityType> {
		self.types.iter().filter(move |t| t.name == name)
	}
}
