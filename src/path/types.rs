//! Static type analysis over path expressions.
//!
//! Every expression analyzes to a set of `(source, target)` alternatives: the possible endpoint
//! type pairs a path could connect, given the model. Operators combine their children's
//! alternatives; `Model::lookup` is the only place model-specific knowledge enters.

use error::Result;
use super::ast::Expr;

/// The three kinds an analysis endpoint can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
	Absolute,
	Attribute,
	Entity,
}

/// One endpoint of a path alternative: its kind plus the model element's name (empty for the
/// sentinel `Absolute`/`Attribute` kinds).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Type {
	pub kind: Kind,
	pub name: String,
}

impl Type {
	pub fn absolute() -> Type {
		Type { kind: Kind::Absolute, name: String::new() }
	}

	pub fn attribute() -> Type {
		Type { kind: Kind::Attribute, name: String::new() }
	}

	pub fn entity(name: &str) -> Type {
		Type { kind: Kind::Entity, name: name.to_string() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Alternative {
	pub source: Type,
	pub target: Type,
}

/// An expression together with every `(source, target)` pair it could connect, sorted and
/// deduplicated.
#[derive(Debug, Clone)]
pub struct Path {
	pub expr: Expr,
	pub alternatives: Vec<Alternative>,
}

impl Path {
	fn normalize(&mut self) {
		self.alternatives.sort();
		self.alternatives.dedup();
	}

	/// Alternatives whose source matches `source`. A plain linear scan is enough here: alternative
	/// lists are bounded by the size of the model, not by the size of the data.
	fn by_source<'a>(&'a self, source: &Type) -> Vec<&'a Alternative> {
		self.alternatives.iter().filter(|a| &a.source == source).collect()
	}
}

/// Model-specific knowledge the analyzer needs: what a bare name (`Rel`) could mean.
pub trait ModelLookup {
	fn lookup(&self, name: &str) -> Result<Path>;
}

pub fn analyze<M: ModelLookup>(model: &M, expr: &Expr) -> Result<Path> {
	match *expr {
		Expr::Integer(_) | Expr::String(_) => Ok(Path {
			expr: expr.clone(),
			alternatives: vec![Alternative { source: Type::absolute(), target: Type::attribute() }],
		}),
		Expr::Rel(ref name) => model.lookup(name),
		Expr::Op(ref name, ref children) => analyze_op(model, expr, name, children),
	}
}

fn analyze_op<M: ModelLookup>(model: &M, expr: &Expr, name: &str, children: &[Expr]) -> Result<Path> {
	match name {
		"inverse" => {
			let mut inner = analyze(model, &children[0])?;
			let alts = inner
				.alternatives
				.iter()
				.map(|a| Alternative { source: a.target.clone(), target: a.source.clone() })
				.collect();
			inner.expr = expr.clone();
			inner.alternatives = alts;
			inner.normalize();
			Ok(inner)
		}
		"join" => analyze_composition(model, expr, children, |left, right| {
			let mut alts = Vec::new();
			for a in &left.alternatives {
				for b in right.by_source(&a.target) {
					alts.push(Alternative { source: a.source.clone(), target: b.target.clone() });
				}
			}
			alts
		}),
		"intersection" => analyze_composition(model, expr, children, |left, right| {
			let mut alts = Vec::new();
			for a in &left.alternatives {
				for b in right.by_source(&a.source) {
					if a.target == b.target {
						alts.push(a.clone());
					}
				}
			}
			alts
		}),
		"union" => analyze_composition(model, expr, children, |left, right| {
			let mut alts = left.alternatives.clone();
			alts.extend(right.alternatives.clone());
			alts
		}),
		// Extension operators (anything beyond the four built-in combinators) are not known to
		// type analysis; a well-formed expression never reaches here with one.
		_ => panic!("unanalyzable path expression: operator `{}`", name),
	}
}

fn analyze_composition<M, F>(model: &M, expr: &Expr, children: &[Expr], combine: F) -> Result<Path>
where
	M: ModelLookup,
	F: FnOnce(&Path, &Path) -> Vec<Alternative>,
{
	let left = analyze(model, &children[0])?;
	let right = analyze(model, &children[1])?;
	let mut path = Path { expr: expr.clone(), alternatives: combine(&left, &right) };
	path.normalize();
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use error::ErrorKind;

	struct FixedModel;

	impl ModelLookup for FixedModel {
		fn lookup(&self, name: &str) -> Result<Path> {
			match name {
				"age" => Ok(Path {
					expr: Expr::Rel("age".into()),
					alternatives: vec![Alternative { source: Type::entity("person"), target: Type::attribute() }],
				}),
				"person" => Ok(Path {
					expr: Expr::Rel("person".into()),
					alternatives: vec![Alternative { source: Type::absolute(), target: Type::entity("person") }],
				}),
				_ => Err(ErrorKind::UnknownTerm(name.to_string()).into()),
			}
		}
	}

	#[test]
	fn inverse_swaps_source_and_target() {
		let expr = Expr::Op("inverse".into(), vec![Expr::Rel("age".into())]);
		let path = analyze(&FixedModel, &expr).unwrap();
		assert_eq!(path.alternatives, vec![Alternative { source: Type::attribute(), target: Type::entity("person") }]);
	}

	#[test]
	fn join_chains_matching_alternatives() {
		let expr = Expr::Op("join".into(), vec![Expr::Rel("person".into()), Expr::Rel("age".into())]);
		let path = analyze(&FixedModel, &expr).unwrap();
		assert_eq!(path.alternatives, vec![Alternative { source: Type::absolute(), target: Type::attribute() }]);
	}

	#[test]
	fn unknown_term_is_an_error() {
		let expr = Expr::Rel("nope".into());
		assert!(analyze(&FixedModel, &expr).is_err());
	}
}
