//! Depth tracking for recursive association traversal

use crate::error::{Result, SerializeError};

/// Tracks how deep a nested serializer sits below the top-level call
///
/// The depth limit is optional. Without one, traversal depth is bounded only
/// by side-load deduplication, which stops cycles in side-loaded graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializationContext {
	current_depth: usize,
	max_depth: Option<usize>,
}

impl SerializationContext {
	/// Create a root context
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_sideload::SerializationContext;
	///
	/// let context = SerializationContext::new(Some(2));
	/// assert_eq!(context.current_depth(), 0);
	/// assert_eq!(context.max_depth(), Some(2));
	/// ```
	pub fn new(max_depth: Option<usize>) -> Self {
		Self {
			current_depth: 0,
			max_depth,
		}
	}

	/// Get the current depth (0 = top-level model)
	pub fn current_depth(&self) -> usize {
		self.current_depth
	}

	/// Get the depth limit, if any
	pub fn max_depth(&self) -> Option<usize> {
		self.max_depth
	}

	/// Check if a related model one level down may still be serialized
	pub fn can_go_deeper(&self) -> bool {
		self.max_depth
			.is_none_or(|max_depth| self.current_depth < max_depth)
	}

	/// Create the context for a related model one level down
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_sideload::SerializationContext;
	///
	/// let root = SerializationContext::new(Some(1));
	/// let child = root.child();
	/// assert_eq!(child.current_depth(), 1);
	/// assert!(child.ensure_within_limit().is_ok());
	/// assert!(child.child().ensure_within_limit().is_err());
	/// ```
	pub fn child(&self) -> Self {
		Self {
			current_depth: self.current_depth + 1,
			max_depth: self.max_depth,
		}
	}

	/// Fail if this context sits below the depth limit
	///
	/// # Errors
	///
	/// Returns [`SerializeError::MaxDepthExceeded`] when `current_depth`
	/// is greater than the configured limit.
	pub fn ensure_within_limit(&self) -> Result<()> {
		match self.max_depth {
			Some(max_depth) if self.current_depth > max_depth => {
				Err(SerializeError::MaxDepthExceeded {
					depth: self.current_depth,
					max_depth,
				})
			}
			_ => Ok(()),
		}
	}
}
