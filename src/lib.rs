//! An embeddable persistent data engine.
//!
//! A crash-safe [`file::File`] provides journaled byte-level I/O; a [`block::BlockStore`] lays
//! fixed-size [`block::Block`]s over it (or over plain memory, for scratch trees); a [`tree::Tree`]
//! is a multi-column B-tree over a block store. On top of that, [`model`] describes an
//! entity/attribute schema and [`path`] compiles path-expression text into composable `Box`
//! queries that [`host::Host`] runs against one tree per entity type.

#![warn(missing_docs)]

extern crate byteorder;
#[macro_use]
extern crate error_chain;
extern crate hex_slice;
extern crate parking_lot;
extern crate tiny_keccak;
extern crate varint_rs;
#[cfg(test)]
#[macro_use]
extern crate matches;
#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod block;
pub mod error;
pub mod file;
pub mod host;
pub mod model;
pub mod path;
pub mod tree;

pub use block::{Block, BlockStore};
pub use error::{Error, ErrorKind, Result};
pub use file::File;
pub use host::{Host, TreeStore};
pub use model::{Attribute, EntityModel, EntityType, TypeKind};
pub use tree::Tree;
