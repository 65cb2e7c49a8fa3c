//! Error types for side-loading serialization

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error returned by association accessors
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while serializing a model graph
///
/// Accessor failures are carried through untouched: the boxed error produced
/// by the model's accessor is the one handed back to the caller of the
/// top-level `serialize`, no matter how deep in the traversal it was raised.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SerializeError {
	/// An association accessor (or something it awaited) failed
	#[error("{source}")]
	Accessor {
		#[source]
		source: BoxError,
	},

	/// Nested traversal went deeper than the configured limit
	#[error("Maximum serialization depth {max_depth} exceeded (reached depth {depth})")]
	MaxDepthExceeded { depth: usize, max_depth: usize },

	/// A serializer descriptor was declared inconsistently
	#[error("Invalid serializer configuration: {0}")]
	Configuration(String),

	/// A side-load array was requested at a key holding an embedded record
	#[error("Root key '{key}' holds an embedded record and cannot take side-loaded records")]
	RootKeyConflict { key: String },
}

impl SerializeError {
	/// Wrap an accessor error without translating it
	pub fn accessor(source: impl Into<BoxError>) -> Self {
		SerializeError::Accessor {
			source: source.into(),
		}
	}

	/// Returns the originating accessor error, if this is an accessor failure
	pub fn accessor_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
		match self {
			SerializeError::Accessor { source } => Some(source.as_ref()),
			_ => None,
		}
	}

	/// Consume the error and return the originating accessor error
	pub fn into_accessor_error(self) -> Option<BoxError> {
		match self {
			SerializeError::Accessor { source } => Some(source),
			_ => None,
		}
	}

	/// Downcast the originating accessor error to a concrete type
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_sideload::SerializeError;
	///
	/// #[derive(Debug, thiserror::Error)]
	/// #[error("connection reset")]
	/// struct ConnectionReset;
	///
	/// let err = SerializeError::accessor(ConnectionReset);
	/// assert!(err.downcast_ref::<ConnectionReset>().is_some());
	/// assert_eq!(err.to_string(), "connection reset");
	/// ```
	pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
		self.accessor_error()
			.and_then(|source| source.downcast_ref::<E>())
	}

	/// Check if this error originated in an association accessor
	pub fn is_accessor_error(&self) -> bool {
		matches!(self, SerializeError::Accessor { .. })
	}
}

/// Errors raised while loading [`SideloadSettings`](crate::settings::SideloadSettings)
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid setting: {0}")]
	Invalid(String),
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializeError>;
