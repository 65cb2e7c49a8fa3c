//! Integration tests for embedded (top-level) serialization

use crate::fixtures::{alice, person, person_serializer, plain_order_serializer};
use reinhardt_sideload::{OutputHash, SerializeOptions, Serializer, SerializerDescriptor};
use rstest::rstest;
use serde_json::json;

/// A serializer without associations writes exactly its attributes
#[rstest]
#[tokio::test]
async fn test_attributes_only_under_singular_key() {
	// Arrange
	let serializer = SerializerDescriptor::builder("person")
		.attributes(["name", "email"])
		.build()
		.unwrap();

	// Act
	let hash = Serializer::new(serializer, alice())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({"person": {"name": "Alice", "email": null}})
	);
}

/// Alice with two orders: embedded person, side-loaded orders referenced by id
#[rstest]
#[tokio::test]
async fn test_person_with_sideloaded_orders() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), false);

	// Act
	let hash = Serializer::new(serializer, alice())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({
			"person": {"name": "Alice", "email": null, "orders": [10, 11]},
			"orders": [{"total": 5}, {"total": 7}],
		})
	);
}

/// Only ids: references are written, no root key for the related type
#[rstest]
#[tokio::test]
async fn test_only_ids_creates_no_root_key() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), true);

	// Act
	let hash = Serializer::new(serializer, alice())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(hash.get("person").unwrap()["orders"], json!([10, 11]));
	assert!(!hash.contains_key("orders"));
	assert_eq!(hash.keys(), vec!["person".to_string()]);
}

/// Embedding a second model under the same key replaces the first
#[rstest]
#[tokio::test]
async fn test_embedded_overwrites_prior_value() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), true);
	let hash = Serializer::new(serializer.clone(), alice())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Act
	let hash = Serializer::new(serializer, person(2, "Bob", Vec::new()))
		.serialize(hash)
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({"person": {"name": "Bob", "email": null, "orders": []}})
	);
}

/// Root key override and omitted absent values
#[rstest]
#[tokio::test]
async fn test_options_shape_the_output() {
	// Arrange
	let serializer = person_serializer(plain_order_serializer(), true);
	let options = SerializeOptions::new()
		.with_root_key("account_holder")
		.with_omit_absent(true);

	// Act
	let hash = Serializer::new(serializer, alice())
		.with_options(options)
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({"accountHolder": {"name": "Alice", "orders": [10, 11]}})
	);
}

/// Computed attributes are resolved from the typed model
#[rstest]
#[tokio::test]
async fn test_computed_attribute() {
	// Arrange
	let serializer = SerializerDescriptor::builder("person")
		.attribute("name")
		.computed("order_count", |p: &crate::fixtures::Person| {
			json!(p.orders.len())
		})
		.build()
		.unwrap();

	// Act
	let hash = Serializer::new(serializer, alice())
		.serialize(OutputHash::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(
		hash.to_value(),
		json!({"person": {"name": "Alice", "order_count": 2}})
	);
}

/// Caller-supplied root values survive serialization
#[rstest]
#[tokio::test]
async fn test_raw_values_are_preserved() {
	// Arrange
	let hash = OutputHash::new();
	hash.insert("meta", json!({"page": 1}));
	let serializer = person_serializer(plain_order_serializer(), false);

	// Act
	let hash = Serializer::new(serializer, alice())
		.serialize(hash)
		.await
		.unwrap();

	// Assert
	assert_eq!(hash.get("meta"), Some(json!({"page": 1})));
	assert_eq!(hash.sideloaded_len("orders"), 2);
}
