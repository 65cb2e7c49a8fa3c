//! # Reinhardt Sideload
//!
//! Asynchronous model-graph serializers with side-loading.
//!
//! A [`SerializerDescriptor`] declares, once per model type, which scalar
//! attributes to emit and which belongs-to / has-many associations to follow.
//! Serializing a model walks those associations concurrently and collects
//! every reached model into one shared [`OutputHash`], either embedded under a
//! singular root key or side-loaded into a pluralized, deduplicated array that
//! the parent references by primary key.
//!
//! ## Example
//!
//! ```
//! use reinhardt_sideload::prelude::*;
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let order = SerializerDescriptor::<Value>::builder("order")
//!     .attribute("total")
//!     .build()?;
//!
//! let person = SerializerDescriptor::<Value>::builder("person")
//!     .attribute("name")
//!     .has_many(HasMany::new("order", order, |person: Arc<Value>| async move {
//!         let orders = person["orders"].as_array().cloned().unwrap_or_default();
//!         Ok::<_, BoxError>(orders.into_iter().map(Arc::new).collect())
//!     }))
//!     .build()?;
//!
//! let alice = Arc::new(json!({
//!     "guid": 1,
//!     "name": "Alice",
//!     "orders": [{"guid": 10, "total": 5}, {"guid": 11, "total": 7}],
//! }));
//!
//! let hash = Serializer::new(person, alice)
//!     .serialize(OutputHash::new())
//!     .await?;
//!
//! assert_eq!(
//!     hash.to_value(),
//!     json!({
//!         "person": {"name": "Alice", "orders": [10, 11]},
//!         "orders": [{"total": 5}, {"total": 7}],
//!     })
//! );
//! # Ok::<(), SerializeError>(())
//! # }).unwrap();
//! ```
//!
//! ## Modes
//!
//! - **Embedded** (default for top-level calls): the model's record is the
//!   single value at its singular root key, overwriting any prior value.
//! - **Sideloaded**: the record is appended to the array at the pluralized
//!   root key unless a record with the same primary key is already there.
//!   Related models reached through associations are always side-loaded.
//! - **Only IDs**: an association marked `only_ids(true)` writes the primary
//!   key reference(s) and never serializes the related model.
//!
//! Side-load deduplication is what stops traversal of cyclic graphs. Embedded
//! top-level models have no such guard; set
//! [`SerializeOptions::max_depth`] when the graph may be cyclic.

pub mod association;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod inflection;
pub mod model;
pub mod output;
pub mod serializer;
pub mod settings;

pub use association::{Association, AssociationMeta, AssociationScope, BelongsTo, HasMany};
pub use context::SerializationContext;
pub use descriptor::{
	Attribute, AttributeSource, DEFAULT_PRIMARY_KEY, SerializerDescriptor,
	SerializerDescriptorBuilder, SerializerRef,
};
pub use error::{BoxError, Result, SerializeError, SettingsError};
pub use model::Model;
pub use output::{OutputHash, Record, RecordHandle};
pub use serializer::{SerializeOptions, Serializer, serialize_collection};
pub use settings::SideloadSettings;

/// Re-export commonly used types
pub mod prelude {
	pub use crate::{
		BelongsTo, BoxError, HasMany, Model, OutputHash, SerializeError, SerializeOptions,
		Serializer, SerializerDescriptor, SerializerRef, SideloadSettings, serialize_collection,
	};
}
