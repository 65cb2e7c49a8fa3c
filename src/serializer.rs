//! Top-level serialization
//!
//! A [`Serializer`] is created per call, bound to one model and one set of
//! [`SerializeOptions`]. It resolves the model's attributes into a fresh
//! record, places that record in the shared [`OutputHash`] (embedded at the
//! singular root key, or appended to the pluralized side-load array), then
//! resolves every association concurrently against it.

use crate::association::AssociationScope;
use crate::context::SerializationContext;
use crate::descriptor::SerializerDescriptor;
use crate::error::Result;
use crate::inflection;
use crate::model::Model;
use crate::output::{OutputHash, Record};
use crate::settings::SideloadSettings;
use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde_json::Value;
use std::sync::Arc;

/// Per-call serializer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
	/// Override of the descriptor's root key
	pub root_key: Option<String>,
	/// Append to a deduplicated side-load array instead of embedding
	pub sideload: bool,
	/// Override of the descriptor's primary key field
	pub primary_key: Option<String>,
	/// Maximum association depth (unlimited when `None`)
	pub max_depth: Option<usize>,
	/// Leave absent values out instead of writing `null`
	pub omit_absent: bool,
}

impl SerializeOptions {
	/// Embedded mode, descriptor root key, no depth limit
	pub fn new() -> Self {
		Self::default()
	}

	/// Options seeded from loaded settings
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_sideload::{SerializeOptions, SideloadSettings};
	///
	/// let settings = SideloadSettings::from_toml_str("sideload = true\nmax_depth = 4").unwrap();
	/// let options = SerializeOptions::from_settings(&settings);
	/// assert!(options.sideload);
	/// assert_eq!(options.max_depth, Some(4));
	/// ```
	pub fn from_settings(settings: &SideloadSettings) -> Self {
		Self {
			root_key: None,
			sideload: settings.sideload,
			primary_key: None,
			max_depth: settings.max_depth,
			omit_absent: settings.omit_absent,
		}
	}

	pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
		self.root_key = Some(root_key.into());
		self
	}

	pub fn with_sideload(mut self, sideload: bool) -> Self {
		self.sideload = sideload;
		self
	}

	pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.primary_key = Some(primary_key.into());
		self
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = Some(max_depth);
		self
	}

	pub fn with_omit_absent(mut self, omit_absent: bool) -> Self {
		self.omit_absent = omit_absent;
		self
	}
}

/// Serializer for one model
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::{OutputHash, SerializeOptions, Serializer, SerializerDescriptor};
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// # futures::executor::block_on(async {
/// let person = SerializerDescriptor::<Value>::builder("person")
///     .attribute("name")
///     .build()
///     .unwrap();
/// let alice = Arc::new(json!({"guid": 1, "name": "Alice"}));
///
/// let hash = Serializer::new(person.clone(), alice.clone())
///     .serialize(OutputHash::new())
///     .await
///     .unwrap();
/// assert_eq!(hash.to_value(), json!({"person": {"name": "Alice"}}));
///
/// let hash = Serializer::new(person, alice)
///     .with_options(SerializeOptions::new().with_sideload(true))
///     .serialize(OutputHash::new())
///     .await
///     .unwrap();
/// assert_eq!(hash.to_value(), json!({"people": [{"name": "Alice"}]}));
/// # });
/// ```
pub struct Serializer<M> {
	descriptor: Arc<SerializerDescriptor<M>>,
	model: Option<Arc<M>>,
	options: SerializeOptions,
	context: SerializationContext,
}

impl<M: Model> Serializer<M> {
	/// Create a serializer for `model`
	///
	/// Passing `None` creates a pass-through serializer that leaves the hash
	/// unchanged.
	pub fn new(descriptor: Arc<SerializerDescriptor<M>>, model: impl Into<Option<Arc<M>>>) -> Self {
		Self {
			descriptor,
			model: model.into(),
			options: SerializeOptions::default(),
			context: SerializationContext::default(),
		}
	}

	pub(crate) fn nested(
		descriptor: Arc<SerializerDescriptor<M>>,
		model: Option<Arc<M>>,
		options: SerializeOptions,
		context: SerializationContext,
	) -> Self {
		Self {
			descriptor,
			model,
			options,
			context,
		}
	}

	/// Replace the options, restarting depth tracking at the top level
	pub fn with_options(mut self, options: SerializeOptions) -> Self {
		self.context = SerializationContext::new(options.max_depth);
		self.options = options;
		self
	}

	pub fn model(&self) -> Option<&Arc<M>> {
		self.model.as_ref()
	}

	pub fn options(&self) -> &SerializeOptions {
		&self.options
	}

	pub fn descriptor(&self) -> &Arc<SerializerDescriptor<M>> {
		&self.descriptor
	}

	/// Check whether this serializer has no model to write
	pub fn is_pass_through(&self) -> bool {
		self.model.is_none()
	}

	/// Effective root key: pluralized when side-loading, then camel-cased
	pub fn root_key(&self) -> String {
		let base = self
			.options
			.root_key
			.as_deref()
			.unwrap_or(self.descriptor.root_key());
		inflection::root_key(base, self.options.sideload)
	}

	/// Field the model's primary key is read from
	pub fn primary_key_field(&self) -> &str {
		self.options
			.primary_key
			.as_deref()
			.unwrap_or(self.descriptor.primary_key())
	}

	/// Resolve one attribute of the bound model
	///
	/// Returns `None` for an undeclared attribute, a field the model lacks, or
	/// a pass-through serializer.
	pub fn resolve_attribute(&self, name: &str) -> Option<Value> {
		let model = self.model.as_deref()?;
		self.descriptor.attribute(name)?.resolve(model)
	}

	fn build_record(&self, model: &M) -> Record {
		let mut record = Record::new();
		for attribute in self.descriptor.attributes() {
			match attribute.resolve(model) {
				Some(value) => {
					record.insert(attribute.name().to_string(), value);
				}
				None if !self.options.omit_absent => {
					record.insert(attribute.name().to_string(), Value::Null);
				}
				None => {}
			}
		}
		record
	}

	/// Serialize the model and every reachable association into `hash`
	///
	/// Resolves with the same hash handle. On failure the hash may already
	/// hold part of the output.
	///
	/// # Errors
	///
	/// Returns the first association fetch error,
	/// [`SerializeError::MaxDepthExceeded`](crate::SerializeError::MaxDepthExceeded)
	/// if a depth limit is configured and exceeded, or
	/// [`SerializeError::RootKeyConflict`](crate::SerializeError::RootKeyConflict)
	/// if a side-load array would replace an embedded record.
	pub fn serialize(self, hash: OutputHash) -> BoxFuture<'static, Result<OutputHash>> {
		async move {
			let Some(model) = self.model.clone() else {
				return Ok(hash);
			};
			let root_key = self.root_key();
			let primary_key = model.field(self.primary_key_field());
			let depth = self.context.current_depth();
			tracing::debug!(root_key = %root_key, depth, sideload = self.options.sideload, "serializing model");

			// Checked in both modes: singular and plural keys can coincide
			if let Some(pk) = primary_key.as_ref() {
				if hash.contains(&root_key, pk) {
					tracing::trace!(root_key = %root_key, primary_key = %pk, "already side-loaded");
					return Ok(hash);
				}
			}

			self.context.ensure_within_limit()?;

			let record = self.build_record(&model);
			let target = if self.options.sideload {
				// append re-checks under the lock
				match hash.append(root_key.as_str(), primary_key, record)? {
					Some(target) => target,
					None => return Ok(hash),
				}
			} else {
				hash.embed(root_key.as_str(), record)
			};

			let scope = AssociationScope::new(
				hash.clone(),
				target,
				self.context,
				self.options.omit_absent,
			);
			let pending = self
				.descriptor
				.associations()
				.map(|association| association.resolve(Arc::clone(&model), scope.clone()));
			try_join_all(pending).await?;

			tracing::debug!(root_key = %root_key, depth, "serialized model");
			Ok(hash)
		}
		.boxed()
	}
}

/// Side-load a sequence of models into one shared hash
///
/// The pluralized root array is created even for an empty sequence. Models
/// are serialized in order, so dedup state carries from one to the next.
///
/// # Errors
///
/// Returns the first error of any model's serialization, or
/// [`SerializeError::RootKeyConflict`](crate::SerializeError::RootKeyConflict)
/// if the root key holds an embedded record.
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::{OutputHash, SerializeOptions, SerializerDescriptor, serialize_collection};
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// # futures::executor::block_on(async {
/// let person = SerializerDescriptor::<Value>::builder("person")
///     .attribute("name")
///     .build()
///     .unwrap();
///
/// let hash = serialize_collection(person, Vec::new(), SerializeOptions::new(), OutputHash::new())
///     .await
///     .unwrap();
/// assert_eq!(hash.to_value(), json!({"people": []}));
/// # });
/// ```
pub async fn serialize_collection<M, I>(
	descriptor: Arc<SerializerDescriptor<M>>,
	models: I,
	options: SerializeOptions,
	hash: OutputHash,
) -> Result<OutputHash>
where
	M: Model,
	I: IntoIterator<Item = Arc<M>>,
{
	let options = options.with_sideload(true);
	let probe = Serializer::new(Arc::clone(&descriptor), None).with_options(options.clone());
	hash.ensure_collection(probe.root_key())?;

	let mut hash = hash;
	for model in models {
		hash = Serializer::new(Arc::clone(&descriptor), model)
			.with_options(options.clone())
			.serialize(hash)
			.await?;
	}
	Ok(hash)
}
