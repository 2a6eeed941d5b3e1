use std::collections::{BTreeMap, HashMap};
use serde::{Serialize, Deserialize};

/// Read/write access to installer variables.
///
/// The rules engine only ever calls [`get`](VariableProvider::get).
pub trait VariableProvider {
	fn get(&self, name: &str) -> Option<&str>;
	fn set(&mut self, name: &str, value: &str);
}

/// An ordered snapshot of installer variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Parses a `NAME=VALUE` assignment. The value may be empty, the name may not.
	pub fn parse_assignment(s: &str) -> crate::Result<(String, String)> {
		match s.split_once('=') {
			Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
			_ => Err(crate::Error::Parse(format!("expected NAME=VALUE, got \"{}\"", s))),
		}
	}
}

impl VariableProvider for Variables {
	fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	fn set(&mut self, name: &str, value: &str) {
		self.0.insert(name.to_string(), value.to_string());
	}
}

impl VariableProvider for HashMap<String, String> {
	fn get(&self, name: &str) -> Option<&str> {
		HashMap::get(self, name).map(String::as_str)
	}

	fn set(&mut self, name: &str, value: &str) {
		self.insert(name.to_string(), value.to_string());
	}
}

impl<K, V> FromIterator<(K, V)> for Variables
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
