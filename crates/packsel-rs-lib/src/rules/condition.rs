use serde::{Serialize, Deserialize};

/// A node in a boolean condition tree.
///
/// Conditions are stored by id in a [`RulesEngine`](super::RulesEngine) and can refer to each other using [`Condition::Ref`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
	/// True when the variable `name` is set to exactly `value`.
	Variable { name: String, value: String },
	Not { condition: Box<Condition> },
	/// Evaluates to the registered condition `refid`.
	Ref { refid: String },
	And { left: Box<Condition>, right: Box<Condition> },
	Or { left: Box<Condition>, right: Box<Condition> },
	Xor { left: Box<Condition>, right: Box<Condition> },
}

impl Condition {
	pub fn variable(name: impl Into<String>, value: impl Into<String>) -> Self {
		Condition::Variable { name: name.into(), value: value.into() }
	}

	pub fn reference(refid: impl Into<String>) -> Self {
		Condition::Ref { refid: refid.into() }
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(condition: Condition) -> Self {
		Condition::Not { condition: Box::new(condition) }
	}

	pub fn and(left: Condition, right: Condition) -> Self {
		Condition::And { left: Box::new(left), right: Box::new(right) }
	}

	pub fn or(left: Condition, right: Condition) -> Self {
		Condition::Or { left: Box::new(left), right: Box::new(right) }
	}

	pub fn xor(left: Condition, right: Condition) -> Self {
		Condition::Xor { left: Box::new(left), right: Box::new(right) }
	}

	/// Every condition id this tree refers to, in the order they appear.
	pub fn references(&self) -> Vec<&str> {
		fn walk<'a>(c: &'a Condition, out: &mut Vec<&'a str>) {
			match c {
				Condition::Variable { .. } => {},
				Condition::Ref { refid } => out.push(refid),
				Condition::Not { condition } => walk(condition, out),
				Condition::And { left, right }
				| Condition::Or { left, right }
				| Condition::Xor { left, right } => {
					walk(left, out);
					walk(right, out);
				},
			}
		}

		let mut out = Vec::new();
		walk(self, &mut out);
		out
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn references_are_collected_in_order() {
		let c = Condition::and(Condition::reference("a"), Condition::or(Condition::variable("X", "1"), Condition::not(Condition::reference("b"))));
		assert_eq!(c.references(), vec!["a", "b"]);
	}

	#[test]
	fn deserializes_tagged_tree() {
		let c: Condition = serde_json::from_str(r#"{"type":"not","condition":{"type":"variable","name":"X","value":"1"}}"#).unwrap();
		assert_eq!(c, Condition::not(Condition::variable("X", "1")));
	}
}
