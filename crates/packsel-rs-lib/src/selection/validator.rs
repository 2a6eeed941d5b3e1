use crate::catalog::Pack;
use crate::rules::VariableProvider;

/// Extra check run on a pack before the selection is accepted.
pub trait PackValidator {
	/// `selected` is the whole resolved selection, `pack` included.
	fn validate(&self, variables: &dyn VariableProvider, pack: &Pack, selected: &[&Pack]) -> bool;
}

impl<F> PackValidator for F
where
	F: Fn(&dyn VariableProvider, &Pack, &[&Pack]) -> bool,
{
	fn validate(&self, variables: &dyn VariableProvider, pack: &Pack, selected: &[&Pack]) -> bool {
		self(variables, pack, selected)
	}
}
