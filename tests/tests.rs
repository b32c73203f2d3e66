extern crate blocktree;
extern crate tempdir;

use tempdir::TempDir;

use blocktree::block::file::FileStore;
use blocktree::block::mem::MemStore;
use blocktree::model::{Attribute, EntityModel, EntityType, TypeKind, ABSOLUTE_ID, INTEGER_ID};
use blocktree::{File, Host, Tree, TreeStore};

fn temp_path(name: &str) -> (TempDir, ::std::path::PathBuf) {
	let dir = TempDir::new(name).unwrap();
	let path = dir.path().join("data");
	::std::fs::OpenOptions::new().write(true).create(true).open(&path).unwrap();
	(dir, path)
}

#[test]
fn a_tree_over_a_file_backed_store_fills_the_file_with_blocks() {
	let (_dir, path) = temp_path("tree_over_file");
	let before = File::open(&path).unwrap().stat().unwrap();

	{
		let file = File::open(&path).unwrap();
		let store = FileStore::open(file).unwrap();
		let mut t = Tree::new(store, 2, 1).unwrap();
		for i in 0..500u64 {
			t.put(&[i, i * i]).unwrap();
		}
		assert_eq!(t.get(&[123]).unwrap(), vec![123, 123 * 123]);
	}

	let after = File::open(&path).unwrap().stat().unwrap();
	assert!(after > before, "inserting 500 rows must have grown the file");
}

#[test]
fn deletes_across_file_backed_splits_keep_surviving_keys_readable() {
	let (_dir, path) = temp_path("delete_over_file");
	let file = File::open(&path).unwrap();
	let store = FileStore::open(file).unwrap();
	let mut t = Tree::new(store, 2, 1).unwrap();

	for i in 0..800u64 {
		t.put(&[i, i]).unwrap();
	}
	for i in (0..800u64).filter(|i| i % 5 == 0) {
		t.delete(&[i]).unwrap();
	}
	for i in 0..800u64 {
		let got = t.get(&[i]);
		if i % 5 == 0 {
			assert!(got.is_err());
		} else {
			assert_eq!(got.unwrap(), vec![i, i]);
		}
	}
}

fn sample_model() -> EntityModel {
	EntityModel::new(vec![
		EntityType { id: ABSOLUTE_ID, name: "^".into(), kind: TypeKind::Absolute, attributes: vec![] },
		EntityType { id: INTEGER_ID, name: "integer".into(), kind: TypeKind::Value, attributes: vec![] },
		EntityType {
			id: 2,
			name: "person".into(),
			kind: TypeKind::Entity,
			attributes: vec![
				Attribute { name: "age".into(), identifying: true, type_id: INTEGER_ID },
				Attribute { name: "rank".into(), identifying: false, type_id: INTEGER_ID },
			],
		},
	])
}

#[test]
fn evaluating_a_join_path_walks_entity_to_attribute_and_back() {
	let mut tree = Tree::new(MemStore::new(), 2, 1).unwrap();
	tree.put(&[5, 100]).unwrap();
	tree.put(&[6, 200]).unwrap();

	let mut store = TreeStore::new();
	store.register(2, tree);
	let host = Host::new(sample_model(), store);

	let entities = host.eval(host.absolute(), "person").unwrap();
	assert_eq!(entities.find_all(host.store()).unwrap().len(), 2);

	let ages = host.eval(host.absolute(), "person/age").unwrap();
	let mut values: Vec<u64> = ages.find_all(host.store()).unwrap().into_iter().map(|o| o.fields[0]).collect();
	values.sort();
	assert_eq!(values, vec![5, 6]);
}

#[test]
fn an_inverse_path_recovers_the_entity_from_an_attribute_value() {
	let mut tree = Tree::new(MemStore::new(), 2, 1).unwrap();
	tree.put(&[5, 100]).unwrap();

	let mut store = TreeStore::new();
	store.register(2, tree);
	let host = Host::new(sample_model(), store);

	let back = host.eval(host.absolute(), "person/age/~age").unwrap();
	let rows = back.find_all(host.store()).unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].entity_id, 2);
}
