//! Model fixtures
//!
//! People own orders, orders belong to customers. Accessors are async and can
//! be delayed or made to fail so completion order and error propagation can
//! be exercised.

use reinhardt_sideload::Model;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error raised by fixture accessors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixtureError {
	#[error("customer of order {order} is unavailable")]
	CustomerUnavailable { order: i64 },
	#[error("person {0} not found")]
	PersonNotFound(i64),
}

#[derive(Debug)]
pub struct Customer {
	pub guid: i64,
	pub name: String,
}

impl Model for Customer {
	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"guid" => Some(json!(self.guid)),
			"name" => Some(json!(self.name)),
			_ => None,
		}
	}
}

#[derive(Debug)]
pub struct Order {
	pub guid: i64,
	pub total: i64,
	pub owner: i64,
	pub customer: Option<Arc<Customer>>,
	/// Delay applied before the customer accessor resolves
	pub delay: Duration,
	pub unavailable: bool,
}

impl Order {
	pub async fn get_customer(&self) -> Result<Option<Arc<Customer>>, FixtureError> {
		tokio::time::sleep(self.delay).await;
		if self.unavailable {
			return Err(FixtureError::CustomerUnavailable { order: self.guid });
		}
		Ok(self.customer.clone())
	}
}

impl Model for Order {
	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"guid" => Some(json!(self.guid)),
			"total" => Some(json!(self.total)),
			_ => None,
		}
	}
}

#[derive(Debug)]
pub struct Person {
	pub guid: i64,
	pub name: String,
	pub email: Option<String>,
	pub orders: Vec<Arc<Order>>,
}

impl Person {
	pub async fn get_orders(&self) -> Result<Vec<Arc<Order>>, FixtureError> {
		tokio::task::yield_now().await;
		Ok(self.orders.clone())
	}
}

impl Model for Person {
	fn field(&self, name: &str) -> Option<Value> {
		match name {
			"guid" => Some(json!(self.guid)),
			"name" => Some(json!(self.name)),
			"email" => self.email.as_ref().map(|email| json!(email)),
			_ => None,
		}
	}
}

/// Lookup of people by primary key, for accessors that walk back to an owner
#[derive(Debug, Default)]
pub struct PersonDirectory {
	people: HashMap<i64, Arc<Person>>,
}

impl PersonDirectory {
	pub fn new(people: impl IntoIterator<Item = Arc<Person>>) -> Arc<Self> {
		Arc::new(Self {
			people: people
				.into_iter()
				.map(|person| (person.guid, person))
				.collect(),
		})
	}

	pub async fn find(&self, guid: i64) -> Result<Arc<Person>, FixtureError> {
		tokio::task::yield_now().await;
		self.people
			.get(&guid)
			.cloned()
			.ok_or(FixtureError::PersonNotFound(guid))
	}
}

pub fn acme() -> Arc<Customer> {
	Arc::new(Customer {
		guid: 7,
		name: "Acme".to_string(),
	})
}

pub fn order(guid: i64, total: i64, owner: i64) -> Order {
	Order {
		guid,
		total,
		owner,
		customer: None,
		delay: Duration::ZERO,
		unavailable: false,
	}
}

pub fn person(guid: i64, name: &str, orders: Vec<Order>) -> Arc<Person> {
	Arc::new(Person {
		guid,
		name: name.to_string(),
		email: None,
		orders: orders.into_iter().map(Arc::new).collect(),
	})
}

/// Alice (guid 1) with orders 10 (total 5) and 11 (total 7)
pub fn alice() -> Arc<Person> {
	person(1, "Alice", vec![order(10, 5, 1), order(11, 7, 1)])
}

/// Alice whose orders both belong to Acme
pub fn alice_with_customer() -> Arc<Person> {
	let orders = [order(10, 5, 1), order(11, 7, 1)]
		.into_iter()
		.map(|order| Order {
			customer: Some(acme()),
			..order
		})
		.collect();
	person(1, "Alice", orders)
}
