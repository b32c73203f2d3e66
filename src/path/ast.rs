//! The parsed form of a path expression.

/// A parsed path expression tree.
///
/// `Op` covers every operator, built-in (`inverse`, `join`, `intersection`, `union`) and
/// user-registered alike; the compiler decides what a given name means.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	String(String),
	Integer(i64),
	Rel(String),
	Op(String, Vec<Expr>),
}
