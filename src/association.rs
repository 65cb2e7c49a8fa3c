//! Belongs-to and has-many association traversal
//!
//! Each association carries the operation that fetches the related model(s)
//! from the parent, bound when the serializer is declared. Resolving an
//! association fetches the related model(s), serializes them into the shared
//! [`OutputHash`] with the related type's own serializer (unless only IDs are
//! wanted), and finally writes the primary-key reference(s) onto the parent's
//! record.

use crate::context::SerializationContext;
use crate::descriptor::{DEFAULT_PRIMARY_KEY, SerializerDescriptor, SerializerRef};
use crate::error::{BoxError, Result, SerializeError};
use crate::inflection;
use crate::model::Model;
use crate::output::{OutputHash, RecordHandle};
use crate::serializer::{SerializeOptions, Serializer};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type FetchOne<M, R> = Arc<
	dyn Fn(Arc<M>) -> BoxFuture<'static, std::result::Result<Option<Arc<R>>, BoxError>>
		+ Send
		+ Sync,
>;

type FetchMany<M, R> = Arc<
	dyn Fn(Arc<M>) -> BoxFuture<'static, std::result::Result<Vec<Arc<R>>, BoxError>>
		+ Send
		+ Sync,
>;

/// Declared properties of an association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMeta {
	/// Association name (singular)
	pub name: String,
	/// Type name used as the root key when the related model is side-loaded
	pub type_name: String,
	/// Emit only primary-key references, never the related model itself
	pub only_ids: bool,
	/// Field of the related model holding its primary key
	pub primary_key: String,
}

impl AssociationMeta {
	/// Metadata with `type_name` equal to `name` and the default primary key
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			type_name: name.clone(),
			name,
			only_ids: false,
			primary_key: DEFAULT_PRIMARY_KEY.to_string(),
		}
	}
}

/// Where an association writes, and the traversal state it inherits
#[derive(Debug, Clone)]
pub struct AssociationScope {
	hash: OutputHash,
	target: RecordHandle,
	context: SerializationContext,
	omit_absent: bool,
}

impl AssociationScope {
	/// Scope for the associations of the record at `target`
	pub fn new(
		hash: OutputHash,
		target: RecordHandle,
		context: SerializationContext,
		omit_absent: bool,
	) -> Self {
		Self {
			hash,
			target,
			context,
			omit_absent,
		}
	}

	/// Shared output hash
	pub fn hash(&self) -> &OutputHash {
		&self.hash
	}

	/// Record of the parent model
	pub fn target(&self) -> RecordHandle {
		self.target
	}

	/// Depth context of the parent model
	pub fn context(&self) -> SerializationContext {
		self.context
	}

	/// Write a reference onto the parent's record
	///
	/// An absent reference is written as `null`, or skipped when absent values
	/// are omitted.
	pub fn write_reference(&self, key: impl Into<String>, value: Option<Value>) {
		match value {
			Some(value) => self.hash.set_field(self.target, key, value),
			None if !self.omit_absent => self.hash.set_field(self.target, key, Value::Null),
			None => {}
		}
	}

	/// Serializer for a related model, one level below the parent
	pub fn nested<R: Model>(
		&self,
		meta: &AssociationMeta,
		descriptor: Arc<SerializerDescriptor<R>>,
		model: Option<Arc<R>>,
		sideload: bool,
	) -> Serializer<R> {
		let options = SerializeOptions::new()
			.with_root_key(meta.type_name.clone())
			.with_sideload(sideload)
			.with_primary_key(meta.primary_key.clone())
			.with_omit_absent(self.omit_absent);
		Serializer::nested(descriptor, model, options, self.context.child())
	}
}

/// An association that can be traversed from a model of type `M`
#[async_trait]
pub trait Association<M>: Send + Sync {
	/// Declared properties
	fn meta(&self) -> &AssociationMeta;

	/// Whether the association is multi-valued
	fn is_many(&self) -> bool;

	/// Key the reference(s) are written under on the parent's record
	fn key(&self) -> String {
		inflection::association_key(&self.meta().name, self.is_many())
	}

	/// Fetch, serialize, and reference the related model(s)
	///
	/// Fetch and nested serialization failures are returned as-is.
	async fn resolve(&self, model: Arc<M>, scope: AssociationScope) -> Result<()>;
}

/// Single-valued association
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::{BelongsTo, BoxError, SerializerDescriptor};
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// let customer = SerializerDescriptor::<Value>::builder("customer")
///     .attribute("name")
///     .build()
///     .unwrap();
///
/// let association = BelongsTo::new("customer", customer, |order: Arc<Value>| async move {
///     Ok::<_, BoxError>(Some(Arc::new(json!({"guid": order["customer_id"]}))))
/// })
/// .type_name("client")
/// .only_ids(true);
///
/// assert_eq!(association.meta().type_name, "client");
/// assert!(association.meta().only_ids);
/// ```
pub struct BelongsTo<M, R> {
	meta: AssociationMeta,
	serializer: SerializerRef<R>,
	fetch: FetchOne<M, R>,
}

impl<M: Model, R: Model> BelongsTo<M, R> {
	/// Declare a belongs-to association served by `fetch`
	pub fn new<F, Fut, E>(
		name: impl Into<String>,
		serializer: Arc<SerializerDescriptor<R>>,
		fetch: F,
	) -> Self
	where
		F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = std::result::Result<Option<Arc<R>>, E>> + Send + 'static,
		E: Into<BoxError> + 'static,
	{
		Self::with_ref(name, serializer.into(), fetch)
	}

	/// Declare a belongs-to association whose serializer may be defined later
	pub fn with_ref<F, Fut, E>(name: impl Into<String>, serializer: SerializerRef<R>, fetch: F) -> Self
	where
		F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = std::result::Result<Option<Arc<R>>, E>> + Send + 'static,
		E: Into<BoxError> + 'static,
	{
		let fetch: FetchOne<M, R> = Arc::new(move |model: Arc<M>| {
			fetch(model)
				.map(|res| res.map_err(Into::<BoxError>::into))
				.boxed()
		});
		Self {
			meta: AssociationMeta::new(name),
			serializer,
			fetch,
		}
	}

	/// Root key used when the related model is side-loaded (defaults to the name)
	pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
		self.meta.type_name = type_name.into();
		self
	}

	/// Emit only the related model's primary key
	pub fn only_ids(mut self, only_ids: bool) -> Self {
		self.meta.only_ids = only_ids;
		self
	}

	/// Primary key field of the related model (defaults to `guid`)
	pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.meta.primary_key = primary_key.into();
		self
	}

	/// Declared properties
	pub fn meta(&self) -> &AssociationMeta {
		&self.meta
	}
}

impl<M, R> fmt::Debug for BelongsTo<M, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BelongsTo")
			.field("meta", &self.meta)
			.field("serializer", &self.serializer)
			.finish()
	}
}

#[async_trait]
impl<M: Model, R: Model> Association<M> for BelongsTo<M, R> {
	fn meta(&self) -> &AssociationMeta {
		&self.meta
	}

	fn is_many(&self) -> bool {
		false
	}

	async fn resolve(&self, model: Arc<M>, scope: AssociationScope) -> Result<()> {
		let key = self.key();
		tracing::trace!(association = %self.meta.name, key = %key, "resolving belongs-to");

		let related = (self.fetch)(model)
			.await
			.map_err(SerializeError::accessor)?;

		if !self.meta.only_ids {
			let descriptor = self.serializer.get()?;
			scope
				.nested(&self.meta, descriptor, related.clone(), true)
				.serialize(scope.hash().clone())
				.await?;
		}

		let reference = related
			.as_deref()
			.and_then(|related| related.field(&self.meta.primary_key));
		scope.write_reference(key, reference);
		Ok(())
	}
}

/// Multi-valued association
///
/// Related models are always side-loaded, never embedded.
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::{BoxError, HasMany, SerializerDescriptor};
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// let order = SerializerDescriptor::<Value>::builder("order")
///     .attribute("total")
///     .build()
///     .unwrap();
///
/// let association = HasMany::new("order", order, |person: Arc<Value>| async move {
///     let orders = person["orders"].as_array().cloned().unwrap_or_default();
///     Ok::<_, BoxError>(orders.into_iter().map(Arc::new).collect())
/// });
///
/// assert_eq!(association.meta().name, "order");
/// ```
pub struct HasMany<M, R> {
	meta: AssociationMeta,
	serializer: SerializerRef<R>,
	fetch: FetchMany<M, R>,
}

impl<M: Model, R: Model> HasMany<M, R> {
	/// Declare a has-many association served by `fetch`
	pub fn new<F, Fut, E>(
		name: impl Into<String>,
		serializer: Arc<SerializerDescriptor<R>>,
		fetch: F,
	) -> Self
	where
		F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = std::result::Result<Vec<Arc<R>>, E>> + Send + 'static,
		E: Into<BoxError> + 'static,
	{
		Self::with_ref(name, serializer.into(), fetch)
	}

	/// Declare a has-many association whose serializer may be defined later
	pub fn with_ref<F, Fut, E>(name: impl Into<String>, serializer: SerializerRef<R>, fetch: F) -> Self
	where
		F: Fn(Arc<M>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = std::result::Result<Vec<Arc<R>>, E>> + Send + 'static,
		E: Into<BoxError> + 'static,
	{
		let fetch: FetchMany<M, R> = Arc::new(move |model: Arc<M>| {
			fetch(model)
				.map(|res| res.map_err(Into::<BoxError>::into))
				.boxed()
		});
		Self {
			meta: AssociationMeta::new(name),
			serializer,
			fetch,
		}
	}

	/// Root key used for the side-loaded related models (defaults to the name)
	pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
		self.meta.type_name = type_name.into();
		self
	}

	/// Emit only the related models' primary keys
	pub fn only_ids(mut self, only_ids: bool) -> Self {
		self.meta.only_ids = only_ids;
		self
	}

	/// Primary key field of the related models (defaults to `guid`)
	pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.meta.primary_key = primary_key.into();
		self
	}

	/// Declared properties
	pub fn meta(&self) -> &AssociationMeta {
		&self.meta
	}
}

impl<M, R> fmt::Debug for HasMany<M, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HasMany")
			.field("meta", &self.meta)
			.field("serializer", &self.serializer)
			.finish()
	}
}

#[async_trait]
impl<M: Model, R: Model> Association<M> for HasMany<M, R> {
	fn meta(&self) -> &AssociationMeta {
		&self.meta
	}

	fn is_many(&self) -> bool {
		true
	}

	async fn resolve(&self, model: Arc<M>, scope: AssociationScope) -> Result<()> {
		let key = self.key();
		tracing::trace!(association = %self.meta.name, key = %key, "resolving has-many");

		let related = (self.fetch)(model)
			.await
			.map_err(SerializeError::accessor)?;

		if !self.meta.only_ids && !related.is_empty() {
			let descriptor = self.serializer.get()?;
			let pending = related.iter().map(|item| {
				scope
					.nested(&self.meta, Arc::clone(&descriptor), Some(Arc::clone(item)), true)
					.serialize(scope.hash().clone())
			});
			try_join_all(pending).await?;
		}

		let references = related
			.iter()
			.map(|item| item.field(&self.meta.primary_key).unwrap_or(Value::Null))
			.collect();
		scope.write_reference(key, Some(Value::Array(references)));
		Ok(())
	}
}
