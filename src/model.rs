//! Model capability contract
//!
//! The serializer never loads or validates models itself. All it needs from a
//! model is plain field access by name; association accessors are attached to
//! the serializer descriptor instead (see [`crate::association`]).

use serde_json::{Map, Value};

/// A domain object that can be serialized
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::Model;
/// use serde_json::{Value, json};
///
/// struct Person {
///     guid: i64,
///     name: String,
/// }
///
/// impl Model for Person {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "guid" => Some(json!(self.guid)),
///             "name" => Some(json!(self.name)),
///             _ => None,
///         }
///     }
/// }
///
/// let alice = Person { guid: 1, name: "Alice".to_string() };
/// assert_eq!(alice.field("name"), Some(json!("Alice")));
/// assert_eq!(alice.field("email"), None);
/// ```
pub trait Model: Send + Sync + 'static {
	/// Look up a field by name
	///
	/// Returns `None` for a field the model does not have. A missing field is
	/// not an error; it serializes as an absent value.
	fn field(&self, name: &str) -> Option<Value>;
}

impl Model for Map<String, Value> {
	fn field(&self, name: &str) -> Option<Value> {
		self.get(name).cloned()
	}
}

impl Model for Value {
	fn field(&self, name: &str) -> Option<Value> {
		self.get(name).cloned()
	}
}
