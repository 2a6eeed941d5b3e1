use serde::{Serialize, Deserialize};

use crate::rules::VariableProvider;

/// Variable which, when set to `no`, makes choosing an install group select only the preselected packs.
pub const SELECT_PACKS_VARIABLE: &str = "InstallationGroupPanel.selectPacks";

/// What to do when a condition expression names an id that was never registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownConditionPolicy {
	/// Return [`Error::UnknownConditionReference`](crate::Error::UnknownConditionReference).
	#[default] Fail,
	/// Treat the term as false, negated or not, and log a warning.
	AssumeFalse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
	unknown_condition_policy: UnknownConditionPolicy,
	select_all_in_group: bool,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			unknown_condition_policy: UnknownConditionPolicy::Fail,
			select_all_in_group: true,
		}
	}
}

impl SessionOptions {
	pub fn unknown_condition_policy(&self) -> UnknownConditionPolicy {
		self.unknown_condition_policy
	}
	pub fn set_unknown_condition_policy(&mut self, policy: UnknownConditionPolicy) {
		self.unknown_condition_policy = policy;
	}

	/// When `true` choosing an install group selects every pack in it, otherwise only preselected and required packs.
	pub fn select_all_in_group(&self) -> bool {
		self.select_all_in_group
	}
	pub fn set_select_all_in_group(&mut self, select_all: bool) {
		self.select_all_in_group = select_all;
	}

	/// Reads overrides the installer definition may place in the variables.
	pub fn apply_variables(&mut self, variables: &dyn VariableProvider) {
		if let Some(v) = variables.get(SELECT_PACKS_VARIABLE) {
			log::debug!("{} = {}", SELECT_PACKS_VARIABLE, v);
			self.select_all_in_group = v != "no";
		}
	}
}
