//! Serializer definitions
//!
//! A [`SerializerDescriptor`] is declared once per model type and shared by
//! every serialization of that type. It lists the scalar attributes to emit
//! (each resolved either by direct field lookup or by a computed function) and
//! the belongs-to / has-many associations to traverse.

use crate::association::{Association, BelongsTo, HasMany};
use crate::error::{Result, SerializeError};
use crate::model::Model;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Primary key field used when none is configured
pub const DEFAULT_PRIMARY_KEY: &str = "guid";

type ComputeFn<M> = Arc<dyn Fn(&M) -> Value + Send + Sync>;

/// How an attribute gets its value
pub enum AttributeSource<M> {
	/// Read the field of the same name from the model
	Field,
	/// Call a function on the model
	Computed(ComputeFn<M>),
}

impl<M> Clone for AttributeSource<M> {
	fn clone(&self) -> Self {
		match self {
			AttributeSource::Field => AttributeSource::Field,
			AttributeSource::Computed(f) => AttributeSource::Computed(Arc::clone(f)),
		}
	}
}

impl<M> fmt::Debug for AttributeSource<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttributeSource::Field => f.write_str("Field"),
			AttributeSource::Computed(_) => f.write_str("Computed"),
		}
	}
}

/// One scalar attribute of a serializer, with its resolver
#[derive(Clone, Debug)]
pub struct Attribute<M> {
	name: String,
	source: AttributeSource<M>,
}

impl<M: Model> Attribute<M> {
	/// Attribute read directly from the model field of the same name
	pub fn field(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			source: AttributeSource::Field,
		}
	}

	/// Attribute computed from the model
	pub fn computed<F>(name: impl Into<String>, compute: F) -> Self
	where
		F: Fn(&M) -> Value + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			source: AttributeSource::Computed(Arc::new(compute)),
		}
	}

	/// Output key of this attribute
	pub fn name(&self) -> &str {
		&self.name
	}

	/// How this attribute is resolved
	pub fn source(&self) -> &AttributeSource<M> {
		&self.source
	}

	/// Check if this attribute uses a computed function
	pub fn is_computed(&self) -> bool {
		matches!(self.source, AttributeSource::Computed(_))
	}

	/// Resolve the attribute against a model
	///
	/// A field the model does not have resolves to `None`.
	pub fn resolve(&self, model: &M) -> Option<Value> {
		match &self.source {
			AttributeSource::Field => model.field(&self.name),
			AttributeSource::Computed(compute) => Some(compute(model)),
		}
	}
}

/// Declarative serializer for one model type
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::SerializerDescriptor;
/// use serde_json::{Value, json};
///
/// let person = SerializerDescriptor::<Value>::builder("person")
///     .attribute("name")
///     .computed("initial", |p: &Value| json!(p["name"].as_str().and_then(|n| n.get(..1))))
///     .build()
///     .unwrap();
///
/// assert_eq!(person.root_key(), "person");
/// assert_eq!(person.primary_key(), "guid");
/// assert_eq!(person.attributes().len(), 2);
/// ```
pub struct SerializerDescriptor<M> {
	root_key: String,
	primary_key: String,
	attributes: Vec<Attribute<M>>,
	belongs_to: Vec<Arc<dyn Association<M>>>,
	has_many: Vec<Arc<dyn Association<M>>>,
}

impl<M: Model> SerializerDescriptor<M> {
	/// Start declaring a serializer with the given singular root key
	pub fn builder(root_key: impl Into<String>) -> SerializerDescriptorBuilder<M> {
		SerializerDescriptorBuilder::new(root_key)
	}

	/// Singular root key
	pub fn root_key(&self) -> &str {
		&self.root_key
	}

	/// Primary key field used to deduplicate top-level side-loads
	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	/// Attributes in declaration order
	pub fn attributes(&self) -> &[Attribute<M>] {
		&self.attributes
	}

	/// Look up an attribute by name
	pub fn attribute(&self, name: &str) -> Option<&Attribute<M>> {
		self.attributes.iter().find(|attr| attr.name == name)
	}

	/// Belongs-to associations in declaration order
	pub fn belongs_to(&self) -> &[Arc<dyn Association<M>>] {
		&self.belongs_to
	}

	/// Has-many associations in declaration order
	pub fn has_many(&self) -> &[Arc<dyn Association<M>>] {
		&self.has_many
	}

	/// All associations, belongs-to first
	pub fn associations(&self) -> impl Iterator<Item = &Arc<dyn Association<M>>> {
		self.belongs_to.iter().chain(self.has_many.iter())
	}
}

impl<M> fmt::Debug for SerializerDescriptor<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names = |assocs: &[Arc<dyn Association<M>>]| {
			assocs
				.iter()
				.map(|assoc| assoc.meta().name.clone())
				.collect::<Vec<_>>()
		};
		f.debug_struct("SerializerDescriptor")
			.field("root_key", &self.root_key)
			.field("primary_key", &self.primary_key)
			.field(
				"attributes",
				&self.attributes.iter().map(|a| &a.name).collect::<Vec<_>>(),
			)
			.field("belongs_to", &names(&self.belongs_to))
			.field("has_many", &names(&self.has_many))
			.finish()
	}
}

/// Builder for [`SerializerDescriptor`]
pub struct SerializerDescriptorBuilder<M> {
	root_key: String,
	primary_key: String,
	attributes: Vec<Attribute<M>>,
	belongs_to: Vec<Arc<dyn Association<M>>>,
	has_many: Vec<Arc<dyn Association<M>>>,
}

impl<M: Model> SerializerDescriptorBuilder<M> {
	fn new(root_key: impl Into<String>) -> Self {
		Self {
			root_key: root_key.into(),
			primary_key: DEFAULT_PRIMARY_KEY.to_string(),
			attributes: Vec::new(),
			belongs_to: Vec::new(),
			has_many: Vec::new(),
		}
	}

	/// Add an attribute read directly from the model
	pub fn attribute(mut self, name: impl Into<String>) -> Self {
		self.attributes.push(Attribute::field(name));
		self
	}

	/// Add several directly-read attributes
	pub fn attributes<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes
			.extend(names.into_iter().map(Attribute::field));
		self
	}

	/// Add an attribute computed from the model
	pub fn computed<F>(mut self, name: impl Into<String>, compute: F) -> Self
	where
		F: Fn(&M) -> Value + Send + Sync + 'static,
	{
		self.attributes.push(Attribute::computed(name, compute));
		self
	}

	/// Set the primary key field (defaults to `guid`)
	pub fn primary_key(mut self, name: impl Into<String>) -> Self {
		self.primary_key = name.into();
		self
	}

	/// Add a belongs-to association
	pub fn belongs_to<R: Model>(mut self, association: BelongsTo<M, R>) -> Self {
		self.belongs_to.push(Arc::new(association));
		self
	}

	/// Add a has-many association
	pub fn has_many<R: Model>(mut self, association: HasMany<M, R>) -> Self {
		self.has_many.push(Arc::new(association));
		self
	}

	/// Add a custom association implementation
	pub fn association(mut self, association: Arc<dyn Association<M>>) -> Self {
		if association.is_many() {
			self.has_many.push(association);
		} else {
			self.belongs_to.push(association);
		}
		self
	}

	/// Finish the declaration
	///
	/// # Errors
	///
	/// Returns [`SerializeError::Configuration`] if the root key or primary
	/// key is empty, or if two attributes/associations would write the same
	/// key of the per-model hash.
	pub fn build(self) -> Result<Arc<SerializerDescriptor<M>>> {
		if self.root_key.trim().is_empty() {
			return Err(SerializeError::Configuration(
				"root key must not be empty".to_string(),
			));
		}
		if self.primary_key.trim().is_empty() {
			return Err(SerializeError::Configuration(format!(
				"primary key of serializer '{}' must not be empty",
				self.root_key
			)));
		}

		let mut seen = HashSet::new();
		let keys = self
			.attributes
			.iter()
			.map(|attr| attr.name.clone())
			.chain(self.belongs_to.iter().map(|assoc| assoc.key()))
			.chain(self.has_many.iter().map(|assoc| assoc.key()));
		for key in keys {
			if !seen.insert(key.clone()) {
				return Err(SerializeError::Configuration(format!(
					"serializer '{}' writes key '{}' more than once",
					self.root_key, key
				)));
			}
		}

		Ok(Arc::new(SerializerDescriptor {
			root_key: self.root_key,
			primary_key: self.primary_key,
			attributes: self.attributes,
			belongs_to: self.belongs_to,
			has_many: self.has_many,
		}))
	}
}

/// Reference from an association to the serializer of the related type
///
/// Usually built from an already-declared descriptor. For cyclic graphs
/// (a person has many orders, an order belongs to a person) one side is
/// declared first against a [`SerializerRef::deferred`] reference that is
/// defined once the other side exists.
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::{SerializerDescriptor, SerializerRef};
/// use serde_json::Value;
///
/// let person_ref = SerializerRef::<Value>::deferred();
/// assert!(person_ref.get().is_err());
///
/// let person = SerializerDescriptor::<Value>::builder("person").build().unwrap();
/// person_ref.define(person).unwrap();
/// assert_eq!(person_ref.get().unwrap().root_key(), "person");
/// ```
pub struct SerializerRef<R> {
	slot: Arc<OnceLock<Arc<SerializerDescriptor<R>>>>,
}

impl<R: Model> SerializerRef<R> {
	/// Reference whose descriptor is supplied later with [`define`](Self::define)
	pub fn deferred() -> Self {
		Self {
			slot: Arc::new(OnceLock::new()),
		}
	}

	/// Supply the descriptor of a deferred reference
	///
	/// # Errors
	///
	/// Returns [`SerializeError::Configuration`] if the reference was already defined.
	pub fn define(&self, descriptor: Arc<SerializerDescriptor<R>>) -> Result<()> {
		self.slot.set(descriptor).map_err(|rejected| {
			SerializeError::Configuration(format!(
				"cannot define serializer reference as '{}': already defined",
				rejected.root_key()
			))
		})
	}

	/// Check whether the descriptor is available
	pub fn is_defined(&self) -> bool {
		self.slot.get().is_some()
	}

	/// Get the referenced descriptor
	///
	/// # Errors
	///
	/// Returns [`SerializeError::Configuration`] for a deferred reference that
	/// was never defined.
	pub fn get(&self) -> Result<Arc<SerializerDescriptor<R>>> {
		self.slot.get().cloned().ok_or_else(|| {
			SerializeError::Configuration("deferred serializer reference was never defined".to_string())
		})
	}
}

impl<R> Clone for SerializerRef<R> {
	fn clone(&self) -> Self {
		Self {
			slot: Arc::clone(&self.slot),
		}
	}
}

impl<R> fmt::Debug for SerializerRef<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SerializerRef")
			.field("root_key", &self.slot.get().map(|d| d.root_key.as_str()))
			.finish()
	}
}

impl<R> From<Arc<SerializerDescriptor<R>>> for SerializerRef<R> {
	fn from(descriptor: Arc<SerializerDescriptor<R>>) -> Self {
		let slot = OnceLock::new();
		let _ = slot.set(descriptor);
		Self {
			slot: Arc::new(slot),
		}
	}
}
