//! Compiling a parsed expression into an arrow tree, and reversing an arrow.
//!
//! An arrow is a compiled, directed relation between two type positions. Running a path forward
//! follows each arrow left to right over a [`super::boxes::Box`]; `~expr` runs the same arrows
//! right to left via [`Arrow::reverse`].

use byteorder::{BigEndian, ByteOrder};
use tiny_keccak::sha3_256;
use block::Word;
use error::{ErrorKind, Result};
use model::{EntityModel, TypeKind, ABSOLUTE_ID, INTEGER_ID, STRING_ID};
use super::ast::Expr;
use super::boxes;

/// The literal value carried by a `ValuePath`/`ValueFilter` pair: an integer or a string, folded
/// into one type rather than kept as two separate arrow variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Integer(i64),
	String(String),
}

/// A compiled arrow. Each variant pairs with its reverse: `EntityPath`/`EntityFilter`,
/// `AttrPath`/`AttrFilter`, `ValuePath`/`ValueFilter`.
#[derive(Debug, Clone)]
pub enum Arrow {
	/// Absolute → entity: every row of the given entity type.
	EntityPath { type_id: Word },
	/// Entity → absolute: drops back to the universe, keeping membership in the given type.
	EntityFilter { type_id: Word },
	/// Entity → value: the value held by one column of the given entity type.
	AttrPath { entity_id: Word, column: usize, value_id: Word },
	/// Value → entity: entities whose column holds the given value.
	AttrFilter { entity_id: Word, column: usize, value_id: Word },
	/// Absolute → value: a literal, taken as a constant path from the universe.
	ValuePath { value_id: Word, literal: Literal },
	/// Value → absolute: filters to rows equal to the literal.
	ValueFilter { value_id: Word, literal: Literal },
	Union(Box<Arrow>, Box<Arrow>),
	Intersection(Box<Arrow>, Box<Arrow>),
	Join(Box<Arrow>, Box<Arrow>),
}

impl Arrow {
	/// The arrow that undoes this one: running `self` then `self.reverse()` is the identity on
	/// the positions it actually reached.
	pub fn reverse(&self) -> Arrow {
		match *self {
			Arrow::EntityPath { type_id } => Arrow::EntityFilter { type_id },
			Arrow::EntityFilter { type_id } => Arrow::EntityPath { type_id },
			Arrow::AttrPath { entity_id, column, value_id } => Arrow::AttrFilter { entity_id, column, value_id },
			Arrow::AttrFilter { entity_id, column, value_id } => Arrow::AttrPath { entity_id, column, value_id },
			Arrow::ValuePath { value_id, ref literal } => Arrow::ValueFilter { value_id, literal: literal.clone() },
			Arrow::ValueFilter { value_id, ref literal } => Arrow::ValuePath { value_id, literal: literal.clone() },
			Arrow::Union(ref a, ref b) => Arrow::Union(Box::new(a.reverse()), Box::new(b.reverse())),
			Arrow::Intersection(ref a, ref b) => Arrow::Intersection(Box::new(a.reverse()), Box::new(b.reverse())),
			Arrow::Join(ref a, ref b) => Arrow::Join(Box::new(b.reverse()), Box::new(a.reverse())),
		}
	}

	/// Run this arrow forward over `input`, producing the box of positions it reaches.
	pub fn follow<S: boxes::Store>(&self, store: &S, model: &EntityModel, input: boxes::Box) -> Result<boxes::Box> {
		match *self {
			Arrow::EntityPath { type_id } => {
				if !input.arms.iter().any(|a| a.entity_id == ABSOLUTE_ID) {
					return Ok(boxes::Box::empty());
				}
				// Full row width, not just the identifying prefix: arms for this entity must line up
				// with AttrFilter-produced arms, which can constrain a non-identifying column too.
				let width = model.type_by_id(type_id)?.attributes.len();
				Ok(boxes::Box::single(type_id, width))
			}
			Arrow::EntityFilter { type_id } => {
				if input.arms.iter().any(|a| a.entity_id == type_id) {
					Ok(boxes::Box::single(ABSOLUTE_ID, 0))
				} else {
					Ok(boxes::Box::empty())
				}
			}
			Arrow::AttrPath { entity_id, column, value_id } => {
				let mut arms = Vec::new();
				for arm in input.arms.iter().filter(|a| a.entity_id == entity_id) {
					for row in boxes::rows_for_arm(store, arm)? {
						let v = *row
							.fields
							.get(column)
							.ok_or_else(|| ErrorKind::BadRow(column + 1, row.fields.len()))?;
						arms.push(boxes::Arm { entity_id: value_id, where_: vec![boxes::Clause::Equal(v)] });
					}
				}
				Ok(boxes::Box::from_arms(arms))
			}
			Arrow::AttrFilter { entity_id, column, value_id } => {
				// For each value arm on `value_id`, emit one symbolic arm on `entity_id` with only
				// `column` constrained. The store query itself happens uniformly later, wherever this
				// arm is enumerated (`Box::find_all` -> `rows_for_arm`), the same as for any other arm --
				// this arrow never touches the store directly.
				let width = model.type_by_id(entity_id)?.attributes.len();
				let mut arms = Vec::new();
				for arm in input.arms.iter().filter(|a| a.entity_id == value_id) {
					let mut where_ = vec![boxes::Clause::Unconstrained; width];
					if let Some(&boxes::Clause::Equal(v)) = arm.where_.get(0) {
						where_[column] = boxes::Clause::Equal(v);
					}
					arms.push(boxes::Arm { entity_id, where_ });
				}
				Ok(boxes::Box::from_arms(arms))
			}
			Arrow::ValuePath { value_id, ref literal } => {
				if !input.arms.iter().any(|a| a.entity_id == ABSOLUTE_ID) {
					return Ok(boxes::Box::empty());
				}
				let where_ = vec![boxes::Clause::Equal(literal_word(literal))];
				Ok(boxes::Box::from_arms(vec![boxes::Arm { entity_id: value_id, where_ }]))
			}
			Arrow::ValueFilter { value_id, ref literal } => {
				let want = literal_word(literal);
				let matches = input.arms.iter().any(|a| {
					a.entity_id == value_id
						&& match a.where_.get(0) {
							Some(&boxes::Clause::Equal(v)) => v == want,
							Some(&boxes::Clause::Unconstrained) => true,
							None => false,
						}
				});
				if matches {
					Ok(boxes::Box::single(ABSOLUTE_ID, 0))
				} else {
					Ok(boxes::Box::empty())
				}
			}
			Arrow::Union(ref a, ref b) => {
				let left = a.follow(store, model, input.clone())?;
				let right = b.follow(store, model, input)?;
				Ok(left.union(right))
			}
			Arrow::Intersection(ref a, ref b) => {
				let left = a.follow(store, model, input.clone())?;
				let right = b.follow(store, model, input)?;
				Ok(left.intersection(right))
			}
			Arrow::Join(ref a, ref b) => {
				let mid = a.follow(store, model, input)?;
				b.follow(store, model, mid)
			}
		}
	}
}

fn literal_word(literal: &Literal) -> Word {
	match *literal {
		Literal::Integer(n) => n as Word,
		Literal::String(ref s) => BigEndian::read_u64(&sha3_256(s.as_bytes())[..8]),
	}
}

/// Compile a parsed expression against a model into an arrow tree.
pub fn compile(model: &EntityModel, expr: &Expr) -> Result<Arrow> {
	match *expr {
		Expr::Integer(n) => Ok(Arrow::ValuePath { value_id: INTEGER_ID, literal: Literal::Integer(n) }),
		Expr::String(ref s) => Ok(Arrow::ValuePath { value_id: STRING_ID, literal: Literal::String(s.clone()) }),
		Expr::Rel(ref name) => compile_term(model, name),
		Expr::Op(ref name, ref children) => compile_op(model, name, children),
	}
}

fn compile_op(model: &EntityModel, name: &str, children: &[Expr]) -> Result<Arrow> {
	match name {
		"inverse" => Ok(compile(model, &children[0])?.reverse()),
		"join" => Ok(Arrow::Join(Box::new(compile(model, &children[0])?), Box::new(compile(model, &children[1])?))),
		"intersection" => {
			Ok(Arrow::Intersection(Box::new(compile(model, &children[0])?), Box::new(compile(model, &children[1])?)))
		}
		"union" => Ok(Arrow::Union(Box::new(compile(model, &children[0])?), Box::new(compile(model, &children[1])?))),
		_ => Err(ErrorKind::UnknownOp(name.to_string()).into()),
	}
}

/// A bare relation name can denote an entity type, an attribute of some entity type, or both at
/// once (if names collide); every match is folded together with `union`.
fn compile_term(model: &EntityModel, name: &str) -> Result<Arrow> {
	let mut options = Vec::new();

	for t in &model.types {
		if t.kind != TypeKind::Entity {
			continue;
		}
		if t.name == name {
			options.push(Arrow::EntityPath { type_id: t.id });
		}
		for (column, attr) in t.attributes.iter().enumerate() {
			if attr.name == name {
				options.push(Arrow::AttrPath { entity_id: t.id, column, value_id: attr.type_id });
			}
		}
	}

	let mut iter = options.into_iter();
	let first = iter.next().ok_or_else(|| ErrorKind::UnknownTerm(name.to_string()))?;
	Ok(iter.fold(first, |acc, next| Arrow::Union(Box::new(acc), Box::new(next))))
}

/// The arrow for the identity path `^`: absolute to absolute.
pub fn absolute() -> Arrow {
	Arrow::EntityFilter { type_id: ABSOLUTE_ID }
}

#[cfg(test)]
mod tests {
	use super::*;
	use model::{Attribute, EntityType};
	use path::cursor::Object;

	fn sample_model() -> EntityModel {
		EntityModel::new(vec![
			EntityType { id: ABSOLUTE_ID, name: "^".into(), kind: TypeKind::Absolute, attributes: vec![] },
			EntityType { id: INTEGER_ID, name: "integer".into(), kind: TypeKind::Value, attributes: vec![] },
			EntityType {
				id: 2,
				name: "person".into(),
				kind: TypeKind::Entity,
				attributes: vec![Attribute { name: "age".into(), identifying: true, type_id: INTEGER_ID }],
			},
		])
	}

	#[test]
	fn compiles_an_entity_relation() {
		let arrow = compile(&sample_model(), &Expr::Rel("person".into())).unwrap();
		assert!(matches!(arrow, Arrow::EntityPath { type_id: 2 }));
	}

	#[test]
	fn compiles_an_attribute_relation() {
		let arrow = compile(&sample_model(), &Expr::Rel("age".into())).unwrap();
		assert!(matches!(arrow, Arrow::AttrPath { entity_id: 2, column: 0, value_id: INTEGER_ID }));
	}

	#[test]
	fn unknown_relation_is_an_error() {
		assert!(compile(&sample_model(), &Expr::Rel("nope".into())).is_err());
	}

	#[test]
	fn inverse_of_entity_path_is_entity_filter() {
		let expr = Expr::Op("inverse".into(), vec![Expr::Rel("person".into())]);
		let arrow = compile(&sample_model(), &expr).unwrap();
		assert!(matches!(arrow, Arrow::EntityFilter { type_id: 2 }));
	}

	#[test]
	fn join_reverse_swaps_and_reverses_both_sides() {
		let arrow = Arrow::Join(
			Box::new(Arrow::EntityPath { type_id: 2 }),
			Box::new(Arrow::AttrPath { entity_id: 2, column: 0, value_id: INTEGER_ID }),
		);
		let reversed = arrow.reverse();
		match reversed {
			Arrow::Join(a, b) => {
				assert!(matches!(*a, Arrow::AttrFilter { entity_id: 2, column: 0, value_id: INTEGER_ID }));
				assert!(matches!(*b, Arrow::EntityFilter { type_id: 2 }));
			}
			_ => panic!("expected Join"),
		}
	}

	struct FixedStore {
		rows: Vec<Object>,
	}

	impl boxes::Store for FixedStore {
		fn find_entities(&self, entity_id: Word, _key: &[Word]) -> Result<Vec<Object>> {
			Ok(self.rows.iter().filter(|r| r.entity_id == entity_id).cloned().collect())
		}
	}

	#[test]
	fn entity_path_follows_absolute_to_every_row_of_its_type() {
		let arrow = Arrow::EntityPath { type_id: 2 };
		let out = arrow.follow(&FixedStore { rows: vec![] }, &sample_model(), boxes::Box::single(ABSOLUTE_ID, 0)).unwrap();
		assert_eq!(out.arms, vec![boxes::Arm::unconstrained(2, 1)]);
	}

	#[test]
	fn entity_path_on_a_non_absolute_input_is_empty() {
		let arrow = Arrow::EntityPath { type_id: 2 };
		let input = boxes::Box::from_arms(vec![boxes::Arm { entity_id: INTEGER_ID, where_: vec![boxes::Clause::Equal(9)] }]);
		let out = arrow.follow(&FixedStore { rows: vec![] }, &sample_model(), input).unwrap();
		assert!(out.arms.is_empty());
	}

	#[test]
	fn attr_path_follows_entity_rows_to_their_column_value() {
		let store = FixedStore { rows: vec![Object { entity_id: 2, fields: vec![5] }] };
		let arrow = Arrow::AttrPath { entity_id: 2, column: 0, value_id: INTEGER_ID };
		let out = arrow.follow(&store, &sample_model(), boxes::Box::single(2, 1)).unwrap();
		assert_eq!(out.arms, vec![boxes::Arm { entity_id: INTEGER_ID, where_: vec![boxes::Clause::Equal(5)] }]);
	}

	#[test]
	fn attr_filter_builds_a_symbolic_arm_without_touching_the_store() {
		struct PanicsOnQuery;
		impl boxes::Store for PanicsOnQuery {
			fn find_entities(&self, _entity_id: Word, _key: &[Word]) -> Result<Vec<Object>> {
				panic!("AttrFilter::follow must not query the store directly");
			}
		}

		let arrow = Arrow::AttrFilter { entity_id: 2, column: 0, value_id: INTEGER_ID };
		let input = boxes::Box::from_arms(vec![boxes::Arm { entity_id: INTEGER_ID, where_: vec![boxes::Clause::Equal(5)] }]);
		let out = arrow.follow(&PanicsOnQuery, &sample_model(), input).unwrap();
		assert_eq!(out.arms, vec![boxes::Arm { entity_id: 2, where_: vec![boxes::Clause::Equal(5)] }]);
	}

	#[test]
	fn attr_filter_arm_resolves_to_matching_rows_once_enumerated() {
		let store = FixedStore {
			rows: vec![
				Object { entity_id: 2, fields: vec![5] },
				Object { entity_id: 2, fields: vec![6] },
			],
		};
		let arrow = Arrow::AttrFilter { entity_id: 2, column: 0, value_id: INTEGER_ID };
		let input = boxes::Box::from_arms(vec![boxes::Arm { entity_id: INTEGER_ID, where_: vec![boxes::Clause::Equal(5)] }]);
		let out = arrow.follow(&store, &sample_model(), input).unwrap();
		let rows = out.find_all(&store).unwrap();
		assert_eq!(rows, vec![Object { entity_id: 2, fields: vec![5] }]);
	}

	#[test]
	fn value_path_of_a_string_literal_hashes_to_a_stable_word() {
		let arrow = Arrow::ValuePath { value_id: STRING_ID, literal: Literal::String("hello".into()) };
		let out1 = arrow.follow(&FixedStore { rows: vec![] }, &sample_model(), boxes::Box::single(ABSOLUTE_ID, 0)).unwrap();
		let out2 = arrow.follow(&FixedStore { rows: vec![] }, &sample_model(), boxes::Box::single(ABSOLUTE_ID, 0)).unwrap();
		assert_eq!(out1.arms, out2.arms);
	}
}
