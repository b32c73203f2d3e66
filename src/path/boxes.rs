//! The box algebra: a symbolic set of entity positions, constrained column-by-column, that
//! [`super::arrow::Arrow::follow`] rewrites one arrow at a time.
//!
//! A `Box` is a union of [`Arm`]s; each arm names an entity type and, for every one of its
//! identifying columns, either leaves it unconstrained or pins it to a value. Value types (e.g.
//! `integer`) are modeled the same way, as a pseudo-entity whose one column *is* the value.

use block::Word;
use error::Result;
use super::cursor::Object;

/// One column's constraint within an [`Arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
	Unconstrained,
	Equal(Word),
}

/// One disjunct of a [`Box`]: an entity type plus a constraint per identifying column.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
	pub entity_id: Word,
	pub where_: Vec<Clause>,
}

impl Arm {
	pub fn unconstrained(entity_id: Word, key_width: usize) -> Arm {
		Arm { entity_id, where_: vec![Clause::Unconstrained; key_width] }
	}

	/// `self` accepts everything `other` does: same entity, and every column where `self`
	/// constrains, `other` carries the identical constraint.
	fn superset_of(&self, other: &Arm) -> bool {
		self.entity_id == other.entity_id
			&& self.where_.iter().zip(&other.where_).all(|(a, b)| match *a {
				Clause::Unconstrained => true,
				Clause::Equal(_) => a == b,
			})
	}

	/// Combine two arms of the same entity into one that accepts only what both accept. `None`
	/// if they pin some column to two different values (an empty result).
	fn merge(&self, other: &Arm) -> Option<Arm> {
		if self.entity_id != other.entity_id {
			return None;
		}
		let mut where_ = Vec::with_capacity(self.where_.len());
		for (a, b) in self.where_.iter().zip(&other.where_) {
			where_.push(match (*a, *b) {
				(Clause::Equal(x), Clause::Equal(y)) if x != y => return None,
				(Clause::Equal(x), _) | (_, Clause::Equal(x)) => Clause::Equal(x),
				(Clause::Unconstrained, Clause::Unconstrained) => Clause::Unconstrained,
			});
		}
		Some(Arm { entity_id: self.entity_id, where_ })
	}
}

/// A `find_entities(entity_id, key)` data source. `key` is the longest leading run of pinned
/// columns in an arm's `where_`; the store is expected to do an exact or prefix scan on it.
pub trait Store {
	fn find_entities(&self, entity_id: Word, key: &[Word]) -> Result<Vec<Object>>;
}

/// A symbolic set of positions in the data, as a union of arms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Box {
	pub arms: Vec<Arm>,
}

impl Box {
	pub fn empty() -> Box {
		Box { arms: Vec::new() }
	}

	pub fn single(entity_id: Word, key_width: usize) -> Box {
		Box { arms: vec![Arm::unconstrained(entity_id, key_width)] }
	}

	pub fn from_arms(arms: Vec<Arm>) -> Box {
		Box { arms: simplify(arms) }
	}

	pub fn union(self, other: Box) -> Box {
		let mut arms = self.arms;
		arms.extend(other.arms);
		Box { arms: simplify(arms) }
	}

	pub fn intersection(self, other: Box) -> Box {
		let mut arms = Vec::new();
		for a in &self.arms {
			for b in &other.arms {
				if let Some(m) = a.merge(b) {
					arms.push(m);
				}
			}
		}
		Box { arms: simplify(arms) }
	}

	/// Materialize every row this box's arms denote.
	pub fn find_all<S: Store>(&self, store: &S) -> Result<Vec<Object>> {
		let mut rows = Vec::new();
		for arm in &self.arms {
			rows.extend(rows_for_arm(store, arm)?);
		}
		Ok(rows)
	}
}

/// The leading run of pinned columns in an arm, used as the store's scan key.
fn build_key(arm: &Arm) -> Vec<Word> {
	arm.where_
		.iter()
		.take_while(|c| match **c {
			Clause::Equal(_) => true,
			Clause::Unconstrained => false,
		})
		.map(|c| match *c {
			Clause::Equal(v) => v,
			Clause::Unconstrained => unreachable!(),
		})
		.collect()
}

pub(crate) fn rows_for_arm<S: Store>(store: &S, arm: &Arm) -> Result<Vec<Object>> {
	let key = build_key(arm);
	let rows = store.find_entities(arm.entity_id, &key)?;
	Ok(rows
		.into_iter()
		.filter(|row| {
			arm.where_.iter().enumerate().all(|(i, c)| match *c {
				Clause::Unconstrained => true,
				Clause::Equal(v) => row.fields.get(i) == Some(&v),
			})
		})
		.collect())
}

/// Drop arms made redundant by a more general arm of the same entity type.
fn simplify(arms: Vec<Arm>) -> Vec<Arm> {
	let mut result: Vec<Arm> = Vec::new();
	'next: for a in arms {
		let mut i = 0;
		while i < result.len() {
			if result[i] == a || result[i].superset_of(&a) {
				continue 'next;
			}
			if a.superset_of(&result[i]) {
				result.remove(i);
				continue;
			}
			i += 1;
		}
		result.push(a);
	}
	result
}
