//! TOML-loadable serializer settings
//!
//! Settings are read either from a `[serializers]` table or, when that table
//! is absent, from the document root:
//!
//! ```toml
//! [serializers]
//! sideload = true
//! max_depth = 8
//! omit_absent = false
//! ```

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SECTION: &str = "serializers";

/// Defaults applied to top-level serialize calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SideloadSettings {
	/// Side-load top-level models instead of embedding them
	pub sideload: bool,
	/// Maximum association depth
	pub max_depth: Option<usize>,
	/// Leave absent values out instead of writing `null`
	pub omit_absent: bool,
}

impl SideloadSettings {
	/// Parse settings from TOML text
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Toml`] for malformed TOML or unknown keys, and
	/// [`SettingsError::Invalid`] if the `serializers` entry is not a table.
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		let mut document: toml::Table = toml::from_str(content)?;
		let table = match document.remove(SECTION) {
			Some(toml::Value::Table(table)) => table,
			Some(other) => {
				return Err(SettingsError::Invalid(format!(
					"'{}' must be a table, found {}",
					SECTION,
					other.type_str()
				)));
			}
			None => document,
		};
		let settings: Self = toml::Value::Table(table).try_into()?;
		tracing::debug!(?settings, "loaded serializer settings");
		Ok(settings)
	}

	/// Read and parse a TOML settings file
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Io`] if the file cannot be read, otherwise the
	/// errors of [`from_toml_str`](Self::from_toml_str).
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let content = std::fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&content)
	}
}
