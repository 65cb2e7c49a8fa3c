//! Output hash shared across one serialization traversal
//!
//! Every model reached during a traversal writes into the same [`OutputHash`].
//! Per-model records live in an arena and are referenced from the root-key
//! table by [`RecordHandle`], so a record can be placed in the hash first and
//! have its association fields filled in afterwards, while sibling traversals
//! keep appending to the same structure.
//!
//! All mutations go through a small interface: `insert`/`embed` set a root
//! key, `append` pushes onto a side-load array, and `set_field` writes one key
//! of an already-placed record. The lock is released before any `.await`.

use crate::error::{Result, SerializeError};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single model's serialized fields
pub type Record = Map<String, Value>;

/// Reference to a record stored in an [`OutputHash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(usize);

/// A side-loaded record together with the primary key it was deduplicated by
#[derive(Debug, Clone)]
struct SideloadEntry {
	primary_key: Option<Value>,
	record: RecordHandle,
}

/// What a root key currently holds
#[derive(Debug, Clone)]
enum RootEntry {
	/// A single nested record (embedded mode)
	Embedded(RecordHandle),
	/// A flat array of records (sideload mode)
	Sideloaded(Vec<SideloadEntry>),
	/// A raw value supplied by the caller
	Raw(Value),
}

#[derive(Debug, Default)]
struct HashState {
	records: Vec<Record>,
	roots: BTreeMap<String, RootEntry>,
}

impl HashState {
	fn alloc(&mut self, record: Record) -> RecordHandle {
		self.records.push(record);
		RecordHandle(self.records.len() - 1)
	}

	/// Make `key` hold a side-load array, keeping one that is already there
	///
	/// A raw value is replaced. An embedded record is never dropped.
	fn sideload_entries(&mut self, key: String) -> Result<&mut Vec<SideloadEntry>> {
		let slot = self
			.roots
			.entry(key.clone())
			.or_insert_with(|| RootEntry::Sideloaded(Vec::new()));
		if matches!(slot, RootEntry::Raw(_)) {
			tracing::warn!(key = %key, "replacing raw value with side-load array");
			*slot = RootEntry::Sideloaded(Vec::new());
		}
		match slot {
			RootEntry::Sideloaded(entries) => Ok(entries),
			_ => Err(SerializeError::RootKeyConflict { key }),
		}
	}

	fn contains(&self, key: &str, primary_key: &Value) -> bool {
		match self.roots.get(key) {
			Some(RootEntry::Sideloaded(entries)) => entries
				.iter()
				.any(|entry| entry.primary_key.as_ref() == Some(primary_key)),
			_ => false,
		}
	}

	fn materialize(&self, entry: &RootEntry) -> Value {
		match entry {
			RootEntry::Embedded(handle) => Value::Object(self.records[handle.0].clone()),
			RootEntry::Sideloaded(entries) => Value::Array(
				entries
					.iter()
					.map(|entry| Value::Object(self.records[entry.record.0].clone()))
					.collect(),
			),
			RootEntry::Raw(value) => value.clone(),
		}
	}
}

/// Accumulator for the serialized output of one traversal
///
/// Cloning an `OutputHash` clones the handle, not the contents: all clones
/// write into the same hash. Keys are kept sorted so output is deterministic.
///
/// # Examples
///
/// ```
/// use reinhardt_sideload::OutputHash;
/// use serde_json::{Map, json};
///
/// let hash = OutputHash::new();
/// let mut order = Map::new();
/// order.insert("total".to_string(), json!(5));
///
/// let handle = hash.append("orders", Some(json!(10)), order.clone())?.unwrap();
/// hash.set_field(handle, "customer", json!(1));
///
/// // Same primary key under the same root key is ignored
/// assert!(hash.append("orders", Some(json!(10)), order)?.is_none());
/// assert_eq!(hash.to_value(), json!({"orders": [{"total": 5, "customer": 1}]}));
/// # Ok::<(), reinhardt_sideload::SerializeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutputHash {
	state: Arc<Mutex<HashState>>,
}

impl OutputHash {
	/// Create an empty output hash
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a raw value at a root key, replacing whatever was there
	pub fn insert(&self, key: impl Into<String>, value: Value) {
		self.state
			.lock()
			.roots
			.insert(key.into(), RootEntry::Raw(value));
	}

	/// Store a record as the single value of a root key
	///
	/// Any prior value at `key` is overwritten. An embedded record already at
	/// `key` is replaced in place and keeps its handle.
	pub fn embed(&self, key: impl Into<String>, record: Record) -> RecordHandle {
		let key = key.into();
		let mut state = self.state.lock();
		let existing = match state.roots.get(&key) {
			Some(RootEntry::Embedded(handle)) => Some(*handle),
			_ => None,
		};
		if let Some(handle) = existing {
			if let Some(slot) = state.records.get_mut(handle.0) {
				*slot = record;
				return handle;
			}
		}
		let handle = state.alloc(record);
		state.roots.insert(key, RootEntry::Embedded(handle));
		handle
	}

	/// Push a record onto the side-load array at a root key
	///
	/// The array is created when absent. If an entry with the same primary key
	/// is already present, nothing is written and `Ok(None)` is returned. A
	/// record without a primary key is always appended.
	///
	/// # Errors
	///
	/// Returns [`SerializeError::RootKeyConflict`] if `key` holds an embedded
	/// record, as happens when a type name reads the same in singular and
	/// plural form.
	pub fn append(
		&self,
		key: impl Into<String>,
		primary_key: Option<Value>,
		record: Record,
	) -> Result<Option<RecordHandle>> {
		let key = key.into();
		let mut state = self.state.lock();

		if let Some(pk) = primary_key.as_ref() {
			if state.contains(&key, pk) {
				return Ok(None);
			}
		}

		let handle = RecordHandle(state.records.len());
		state.sideload_entries(key)?.push(SideloadEntry {
			primary_key,
			record: handle,
		});
		state.records.push(record);
		Ok(Some(handle))
	}

	/// Make sure a side-load array exists at `key`, even if it stays empty
	///
	/// # Errors
	///
	/// Returns [`SerializeError::RootKeyConflict`] if `key` holds an embedded record.
	pub fn ensure_collection(&self, key: impl Into<String>) -> Result<()> {
		self.state.lock().sideload_entries(key.into())?;
		Ok(())
	}

	/// Check whether the side-load array at `key` holds a record with this primary key
	pub fn contains(&self, key: &str, primary_key: &Value) -> bool {
		self.state.lock().contains(key, primary_key)
	}

	/// Write one field of a record that is already in the hash
	pub fn set_field(&self, handle: RecordHandle, key: impl Into<String>, value: Value) {
		let mut state = self.state.lock();
		if let Some(record) = state.records.get_mut(handle.0) {
			record.insert(key.into(), value);
		}
	}

	/// Get a snapshot of the value at a root key
	pub fn get(&self, key: &str) -> Option<Value> {
		let state = self.state.lock();
		state.roots.get(key).map(|entry| state.materialize(entry))
	}

	/// Get a snapshot of a single record
	pub fn record(&self, handle: RecordHandle) -> Option<Record> {
		self.state.lock().records.get(handle.0).cloned()
	}

	/// Number of records side-loaded under `key` (0 if the key is not an array)
	pub fn sideloaded_len(&self, key: &str) -> usize {
		match self.state.lock().roots.get(key) {
			Some(RootEntry::Sideloaded(entries)) => entries.len(),
			_ => 0,
		}
	}

	/// Root keys currently present, in sorted order
	pub fn keys(&self) -> Vec<String> {
		self.state.lock().roots.keys().cloned().collect()
	}

	/// Check whether a root key is present
	pub fn contains_key(&self, key: &str) -> bool {
		self.state.lock().roots.contains_key(key)
	}

	/// Number of root keys
	pub fn len(&self) -> usize {
		self.state.lock().roots.len()
	}

	/// Check whether no root key has been written
	pub fn is_empty(&self) -> bool {
		self.state.lock().roots.is_empty()
	}

	/// Materialize the whole hash as a JSON object
	pub fn to_value(&self) -> Value {
		let state = self.state.lock();
		let object: Map<String, Value> = state
			.roots
			.iter()
			.map(|(key, entry)| (key.clone(), state.materialize(entry)))
			.collect();
		Value::Object(object)
	}
}

impl Serialize for OutputHash {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		self.to_value().serialize(serializer)
	}
}
