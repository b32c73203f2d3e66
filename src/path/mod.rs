//! Path expressions: parse text into an [`ast::Expr`], analyze its possible types, compile it to
//! an [`arrow::Arrow`] tree, and run that tree over a [`boxes::Box`] to get a [`cursor::Cursor`].

pub mod arrow;
pub mod ast;
pub mod boxes;
pub mod cursor;
pub mod parser;
pub mod types;

pub use self::ast::Expr;
pub use self::boxes::Box;
pub use self::cursor::{Cursor, Object};
