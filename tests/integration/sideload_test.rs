//! Integration tests for side-loading and deduplication

use crate::fixtures::{
	PersonDirectory, alice, cyclic_person_serializer, order, person, person_serializer,
	plain_order_serializer,
};
use reinhardt_sideload::{
	OutputHash, SerializeError, SerializeOptions, Serializer, SideloadSettings,
	serialize_collection,
};
use rstest::rstest;
use serde_json::json;

/// Serializing the same model twice leaves one entry
#[rstest]
#[tokio::test]
async fn test_sideload_is_idempotent() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), false);
	let options = SerializeOptions::new().with_sideload(true);
	let hash = Serializer::new(serializer.clone(), alice())
		.with_options(options.clone())
		.serialize(OutputHash::new())
		.await
		.unwrap();
	let before = hash.to_value();

	// Act
	let hash = Serializer::new(serializer, alice())
		.with_options(options)
		.serialize(hash)
		.await
		.unwrap();

	// Assert
	assert_eq!(hash.sideloaded_len("people"), 1);
	assert_eq!(hash.sideloaded_len("orders"), 2);
	assert_eq!(hash.to_value(), before);
}

/// A different model with an already side-loaded primary key is skipped
#[rstest]
#[tokio::test]
async fn test_dedup_uses_candidate_primary_key() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), true);
	let options = SerializeOptions::new().with_sideload(true);
	let hash = Serializer::new(serializer.clone(), alice())
		.with_options(options.clone())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Act
	let hash = Serializer::new(serializer.clone(), person(1, "Impostor", Vec::new()))
		.with_options(options.clone())
		.serialize(hash)
		.await
		.unwrap();
	let hash = Serializer::new(serializer, person(2, "Bob", Vec::new()))
		.with_options(options)
		.serialize(hash)
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.get("people"),
		Some(json!([
			{"name": "Alice", "email": null, "orders": [10, 11]},
			{"name": "Bob", "email": null, "orders": []},
		]))
	);
}

/// Has-many side-loading appends to what other models already loaded
#[rstest]
#[tokio::test]
async fn test_sideload_appends_across_parents() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), false);
	let bob = person(2, "Bob", vec![order(11, 7, 2), order(12, 9, 2)]);

	// Act
	let people = vec![alice(), bob];
	let hash = serialize_collection(serializer, people, SerializeOptions::new(), OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({
			"people": [
				{"name": "Alice", "email": null, "orders": [10, 11]},
				{"name": "Bob", "email": null, "orders": [11, 12]},
			],
			"orders": [{"total": 5}, {"total": 7}, {"total": 9}],
		})
	);
}

/// An empty collection still yields its root array
#[rstest]
#[tokio::test]
async fn test_empty_collection() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), false);

	// Act
	let hash = serialize_collection(
		serializer,
		Vec::new(),
		SerializeOptions::new(),
		OutputHash::new(),
	)
	.await
	.unwrap();

	// Assert
	assert_eq!(hash.to_value(), json!({"people": []}));
}

/// A person reached again through an order's owner is not re-serialized
#[rstest]
#[tokio::test]
async fn test_cyclic_graph_terminates_when_sideloaded() {
	// Arrange
	let alice = alice();
	let serializer = cyclic_person_serializer(PersonDirectory::new([alice.clone()]));

	// Act
	let hash = Serializer::new(serializer, alice)
		.with_options(SerializeOptions::new().with_sideload(true))
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({
			"people": [{"name": "Alice", "orders": [10, 11]}],
			"orders": [{"total": 5, "owner": 1}, {"total": 7, "owner": 1}],
		})
	);
}

/// An embedded top-level model is side-loaded once more when reached again
#[rstest]
#[tokio::test]
async fn test_cyclic_graph_terminates_when_embedded() {
	// Arrange
	let alice = alice();
	let serializer = cyclic_person_serializer(PersonDirectory::new([alice.clone()]));

	// Act
	let hash = Serializer::new(serializer, alice)
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.get("person"),
		Some(json!({"name": "Alice", "orders": [10, 11]}))
	);
	assert_eq!(hash.sideloaded_len("people"), 1);
	assert_eq!(hash.sideloaded_len("orders"), 2);
}

/// A depth limit stops traversal of a cyclic graph
#[rstest]
#[tokio::test]
async fn test_depth_limit_on_cyclic_graph() {
	// Arrange
	let alice = alice();
	let serializer = cyclic_person_serializer(PersonDirectory::new([alice.clone()]));
	let settings = SideloadSettings::from_toml_str("[serializers]\nmax_depth = 1").unwrap();

	// Act
	let result = Serializer::new(serializer, alice)
		.with_options(SerializeOptions::from_settings(&settings))
		.serialize(OutputHash::new())
		.await;

	// Assert
	assert!(matches!(
		result,
		Err(SerializeError::MaxDepthExceeded {
			depth: 2,
			max_depth: 1
		})
	));
}
