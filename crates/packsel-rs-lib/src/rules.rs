//! Named boolean conditions over installer variables.
//!
//! # Usage
//! 1. Create a [`RulesEngine`] and [`register()`](RulesEngine::register) each [`Condition`] under an id.
//! 1. Attach expressions to packs with [`RulesEngine::register_pack_condition()`].
//! 1. Query with [`RulesEngine::evaluate()`], [`RulesEngine::evaluate_expression()`] or [`RulesEngine::can_install()`]
//! passing the current [`Variables`].
//!
//! Conditions never change after registration so the engine can be queried any number of times
//! with different variable snapshots as the installer progresses.

use std::collections::{BTreeMap, HashMap};
use serde::{Serialize, Deserialize};

use crate::config::UnknownConditionPolicy;
use crate::relationship_resolver::Colour;
use crate::Error;

mod condition;
pub use condition::Condition;
mod expression;
pub use expression::Expression;
mod variables;
pub use variables::VariableProvider;
pub use variables::Variables;

/// A condition that must hold before installation may start at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerRequirement {
	/// A condition expression, see [`Expression`].
	pub condition: String,
	/// Shown to the user when the requirement isn't met.
	pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RulesEngine {
	conditions: BTreeMap<String, Condition>,
	pack_conditions: HashMap<String, Expression>,
	requirements: Vec<InstallerRequirement>,
	policy: UnknownConditionPolicy,
}

impl RulesEngine {
	pub fn new(policy: UnknownConditionPolicy) -> Self {
		Self { policy, ..Default::default() }
	}

	pub fn policy(&self) -> UnknownConditionPolicy {
		self.policy
	}

	pub fn set_policy(&mut self, policy: UnknownConditionPolicy) {
		self.policy = policy;
	}

	/// Adds a condition under `id`.
	///
	/// # Errors
	/// - [`Parse`](Error::Parse) when `id` could not be written in an expression.
	/// - [`DuplicateCondition`](Error::DuplicateCondition) when `id` is already registered.
	pub fn register(&mut self, id: impl Into<String>, condition: Condition) -> crate::Result<()> {
		let id = id.into();
		if id.trim().is_empty() || id.starts_with('!') || id.contains(&expression::OPERATORS[..]) || id != id.trim() {
			return Err(Error::Parse(format!("\"{}\" is not a valid condition id", id)));
		}
		if self.conditions.contains_key(&id) {
			return Err(Error::DuplicateCondition(id));
		}
		log::trace!("Registering condition {}", id);
		self.conditions.insert(id, condition);
		Ok(())
	}

	/// Gates the pack with key `pack` (its id, or name when it has none) on `expression`.
	pub fn register_pack_condition(&mut self, pack: impl Into<String>, expression: Expression) {
		self.pack_conditions.insert(pack.into(), expression);
	}

	pub fn add_requirement(&mut self, requirement: InstallerRequirement) -> crate::Result<()> {
		Expression::parse(&requirement.condition)?;
		self.requirements.push(requirement);
		Ok(())
	}

	pub fn get(&self, id: &str) -> Option<&Condition> {
		self.conditions.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.conditions.contains_key(id)
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.conditions.keys().map(String::as_str)
	}

	pub fn pack_condition(&self, pack: &str) -> Option<&Expression> {
		self.pack_conditions.get(pack)
	}

	pub fn requirements(&self) -> &[InstallerRequirement] {
		&self.requirements
	}

	/// Evaluates the registered condition `id`, a leading `!` negates the result.
	pub fn evaluate(&self, id: &str, variables: &dyn VariableProvider) -> crate::Result<bool> {
		let (negated, id) = match id.strip_prefix('!') {
			Some(rest) => (true, rest),
			None => (false, id),
		};
		let term = Expression::Term { id: id.to_string(), negated };
		Evaluator::new(self, variables).expression(&term)
	}

	/// Parses and evaluates a condition expression such as `a+!b`.
	pub fn evaluate_expression(&self, expression: &str, variables: &dyn VariableProvider) -> crate::Result<bool> {
		let expression = Expression::parse(expression)?;
		Evaluator::new(self, variables).expression(&expression)
	}

	/// `true` when the pack has no condition or its condition holds.
	pub fn can_install(&self, pack: &str, variables: &dyn VariableProvider) -> crate::Result<bool> {
		match self.pack_conditions.get(pack) {
			None => Ok(true),
			Some(expression) => Evaluator::new(self, variables).expression(expression),
		}
	}

	/// Returns the installer requirements which aren't met.
	pub fn check_installer_requirements(&self, variables: &dyn VariableProvider) -> crate::Result<Vec<&InstallerRequirement>> {
		let mut unmet = Vec::new();
		for requirement in &self.requirements {
			if !self.evaluate_expression(&requirement.condition, variables)? {
				log::info!("Installer requirement not met: {}", requirement.message);
				unmet.push(requirement);
			}
		}
		Ok(unmet)
	}

	/// Checks every reference without evaluating anything.
	///
	/// # Errors
	/// - [`CyclicCondition`](Error::CyclicCondition) when conditions refer to each other in a loop.
	/// - [`UnknownConditionReference`](Error::UnknownConditionReference) for a reference to an unregistered id
	/// unless the policy is [`UnknownConditionPolicy::AssumeFalse`].
	pub fn validate(&self) -> crate::Result<()> {
		fn visit<'a>(engine: &'a RulesEngine, id: &'a str, colours: &mut HashMap<&'a str, Colour>, path: &mut Vec<&'a str>) -> crate::Result<()> {
			match colours.get(id).copied().unwrap_or_default() {
				Colour::Black => return Ok(()),
				Colour::Grey => {
					let start = path.iter().position(|p| *p == id).unwrap_or(0);
					let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
					cycle.push(id.to_string());
					return Err(Error::CyclicCondition(cycle));
				},
				Colour::White => {},
			}

			let Some(condition) = engine.conditions.get(id) else {
				return engine.unknown(id);
			};

			colours.insert(id, Colour::Grey);
			path.push(id);
			for r in condition.references() {
				visit(engine, r, colours, path)?;
			}
			path.pop();
			colours.insert(id, Colour::Black);
			Ok(())
		}

		let mut colours = HashMap::<&str, Colour>::new();
		let mut path = Vec::<&str>::new();
		for id in self.conditions.keys() {
			visit(self, id, &mut colours, &mut path)?;
		}

		let requirement_expressions = self.requirements.iter()
			.map(|r| Expression::parse(&r.condition))
			.collect::<crate::Result<Vec<_>>>()?;
		for expression in self.pack_conditions.values().chain(requirement_expressions.iter()) {
			for id in expression.references() {
				if !self.conditions.contains_key(id) {
					self.unknown(id)?;
				}
			}
		}

		Ok(())
	}

	/// Applies the unknown id policy.
	fn unknown(&self, id: &str) -> crate::Result<()> {
		match self.policy {
			UnknownConditionPolicy::Fail => Err(Error::UnknownConditionReference(id.to_string())),
			UnknownConditionPolicy::AssumeFalse => {
				log::warn!("Condition `{}` is not defined, assuming false.", id);
				Ok(())
			},
		}
	}
}

/// State for a single evaluation.
///
/// `chain` holds the ids currently being evaluated so a reference back into it is a cycle.
struct Evaluator<'a> {
	engine: &'a RulesEngine,
	variables: &'a dyn VariableProvider,
	chain: Vec<&'a str>,
}

impl<'a> Evaluator<'a> {
	fn new(engine: &'a RulesEngine, variables: &'a dyn VariableProvider) -> Self {
		Self { engine, variables, chain: Vec::new() }
	}

	/// `None` when `id` isn't registered and the policy allows it.
	fn reference(&mut self, id: &'a str) -> crate::Result<Option<bool>> {
		if self.chain.contains(&id) {
			let mut cycle: Vec<String> = self.chain.iter().map(|s| s.to_string()).collect();
			cycle.push(id.to_string());
			return Err(Error::CyclicCondition(cycle));
		}

		let Some(condition) = self.engine.conditions.get(id) else {
			self.engine.unknown(id)?;
			return Ok(None);
		};

		self.chain.push(id);
		let result = self.condition(condition);
		self.chain.pop();
		result.map(Some)
	}

	fn condition(&mut self, condition: &'a Condition) -> crate::Result<bool> {
		/* Both sides are always evaluated so unknown ids and cycles on the right aren't hidden */
		Ok(match condition {
			Condition::Variable { name, value } => self.variables.get(name) == Some(value.as_str()),
			Condition::Not { condition } => !self.condition(condition)?,
			Condition::Ref { refid } => self.reference(refid)?.unwrap_or(false),
			Condition::And { left, right } => {
				let l = self.condition(left)?;
				let r = self.condition(right)?;
				l && r
			},
			Condition::Or { left, right } => {
				let l = self.condition(left)?;
				let r = self.condition(right)?;
				l || r
			},
			Condition::Xor { left, right } => {
				let l = self.condition(left)?;
				let r = self.condition(right)?;
				l ^ r
			},
		})
	}

	fn expression(&mut self, expression: &'a Expression) -> crate::Result<bool> {
		Ok(match expression {
			/* An unknown id is false even when negated */
			Expression::Term { id, negated } => match self.reference(id)? {
				Some(b) => b != *negated,
				None => false,
			},
			Expression::And(l, r) => {
				let l = self.expression(l)?;
				let r = self.expression(r)?;
				l && r
			},
			Expression::Or(l, r) => {
				let l = self.expression(l)?;
				let r = self.expression(r)?;
				l || r
			},
			Expression::Xor(l, r) => {
				let l = self.expression(l)?;
				let r = self.expression(r)?;
				l ^ r
			},
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	/// Mirrors the condition set the original installer tests used.
	fn engine() -> RulesEngine {
		let mut rules = RulesEngine::default();
		rules.register("test.true", Condition::variable("TEST", "true")).unwrap();
		rules.register("test.true2", Condition::reference("test.true")).unwrap();
		rules.register("test.not.true", Condition::not(Condition::reference("test.true"))).unwrap();
		rules
	}

	fn vars(pairs: &[(&str, &str)]) -> Variables {
		pairs.iter().copied().collect()
	}

	#[test]
	fn variable_condition() {
		let mut rules = RulesEngine::default();
		rules.register("v1", Condition::variable("X", "1")).unwrap();
		assert!(rules.evaluate("v1", &vars(&[("X", "1")])).unwrap());
		assert!(!rules.evaluate("v1", &vars(&[("X", "2")])).unwrap());
		assert!(!rules.evaluate("v1", &vars(&[])).unwrap());
	}

	#[test]
	fn not_condition() {
		let rules = engine();
		let v = vars(&[]);
		assert!(rules.evaluate("test.not.true", &v).unwrap());
		assert!(!rules.evaluate("!test.not.true", &v).unwrap());
	}

	#[test]
	fn composed_expressions() {
		let rules = engine();
		let v = vars(&[]);
		assert!(!rules.evaluate("test.true", &v).unwrap());
		assert!(!rules.evaluate("test.true2", &v).unwrap());

		let v = vars(&[("TEST", "true")]);
		assert!(rules.evaluate("test.true", &v).unwrap());
		assert!(rules.evaluate("test.true2", &v).unwrap());
		assert!(!rules.evaluate("!test.true", &v).unwrap());
		assert!(!rules.evaluate("!test.true2", &v).unwrap());
		assert!(rules.evaluate_expression("test.true+test.true2", &v).unwrap());
		assert!(rules.evaluate_expression("test.true2+test.true", &v).unwrap());
		assert!(!rules.evaluate_expression("!test.true2+test.true", &v).unwrap());
		assert!(rules.evaluate_expression("test.true2|test.true", &v).unwrap());
		assert!(!rules.evaluate_expression("test.true2\\test.true", &v).unwrap());
	}

	#[test]
	fn evaluation_is_left_to_right() {
		let mut rules = RulesEngine::default();
		rules.register("t", Condition::variable("A", "1")).unwrap();
		rules.register("f", Condition::variable("A", "2")).unwrap();
		let v = vars(&[("A", "1")]);
		/* (t|t)+f is false, t|(t+f) would be true */
		assert!(!rules.evaluate_expression("t|t+f", &v).unwrap());
	}

	#[test]
	fn unknown_condition_fails_by_default() {
		let rules = engine();
		assert!(matches!(rules.evaluate("missing", &vars(&[])), Err(Error::UnknownConditionReference(id)) if id == "missing"));
		assert!(matches!(rules.evaluate_expression("test.true|missing", &vars(&[])), Err(Error::UnknownConditionReference(_))));
	}

	#[test]
	fn unknown_condition_can_assume_false() {
		let mut rules = engine();
		rules.set_policy(UnknownConditionPolicy::AssumeFalse);
		assert!(!rules.evaluate("missing", &vars(&[])).unwrap());
		assert!(!rules.evaluate("!missing", &vars(&[])).unwrap());
		assert!(rules.evaluate_expression("missing|test.not.true", &vars(&[])).unwrap());
	}

	#[test]
	fn self_reference_is_a_cycle() {
		let mut rules = RulesEngine::default();
		rules.register("a", Condition::reference("a")).unwrap();
		assert!(matches!(rules.evaluate("a", &vars(&[])), Err(Error::CyclicCondition(c)) if c == vec!["a", "a"]));
	}

	#[test]
	fn mutual_reference_is_a_cycle() {
		let mut rules = RulesEngine::default();
		rules.register("a", Condition::and(Condition::variable("X", "1"), Condition::reference("b"))).unwrap();
		rules.register("b", Condition::not(Condition::reference("a"))).unwrap();
		assert!(matches!(rules.evaluate("a", &vars(&[])), Err(Error::CyclicCondition(c)) if c == vec!["a", "b", "a"]));
		assert!(matches!(rules.validate(), Err(Error::CyclicCondition(_))));
	}

	#[test]
	fn shared_reference_is_not_a_cycle() {
		let mut rules = engine();
		rules.register("both", Condition::and(Condition::reference("test.true"), Condition::reference("test.true2"))).unwrap();
		assert!(rules.evaluate("both", &vars(&[("TEST", "true")])).unwrap());
		rules.validate().unwrap();
	}

	#[test]
	fn validate_reports_unknown_pack_condition_references() {
		let mut rules = engine();
		rules.register_pack_condition("docs", "test.true+nope".parse().unwrap());
		assert!(matches!(rules.validate(), Err(Error::UnknownConditionReference(id)) if id == "nope"));
		rules.set_policy(UnknownConditionPolicy::AssumeFalse);
		rules.validate().unwrap();
	}

	#[test]
	fn can_install_without_condition() {
		assert!(engine().can_install("anything", &vars(&[])).unwrap());
	}

	#[test]
	fn can_install_follows_condition() {
		let mut rules = engine();
		rules.register_pack_condition("docs", "test.true".parse().unwrap());
		assert!(!rules.can_install("docs", &vars(&[])).unwrap());
		assert!(rules.can_install("docs", &vars(&[("TEST", "true")])).unwrap());
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let mut rules = engine();
		assert!(matches!(rules.register("test.true", Condition::variable("A", "B")), Err(Error::DuplicateCondition(_))));
	}

	#[test]
	fn ids_with_operators_are_rejected() {
		let mut rules = RulesEngine::default();
		assert!(rules.register("a+b", Condition::variable("A", "B")).is_err());
		assert!(rules.register("!a", Condition::variable("A", "B")).is_err());
		assert!(rules.register("", Condition::variable("A", "B")).is_err());
	}

	#[test]
	fn installer_requirements() {
		let mut rules = engine();
		rules.add_requirement(InstallerRequirement { condition: "test.true".into(), message: "TEST must be true".into() }).unwrap();
		rules.add_requirement(InstallerRequirement { condition: "test.not.true|test.true".into(), message: "always".into() }).unwrap();

		let unmet = rules.check_installer_requirements(&vars(&[])).unwrap();
		assert_eq!(unmet.len(), 1);
		assert_eq!(unmet[0].message, "TEST must be true");
		assert!(rules.check_installer_requirements(&vars(&[("TEST", "true")])).unwrap().is_empty());
	}
}
