//! Interactive pack selection.
//!
//! # Usage
//! 1. [`InstallerContext::open_session()`](crate::InstallerContext::open_session) to get a [`SelectionSession<Open>`].
//! 1. Optionally [`select_install_group()`](SelectionSession::select_install_group) then
//! [`toggle()`](SelectionSession::toggle) or [`select()`](SelectionSession::select) packs.
//! 1. [`proceed()`](SelectionSession::proceed) to get a [`SelectionSession<Closed>`] holding the final install order.
//! A failed proceed hands the open session back unchanged inside [`Rejected`].
//! 1. [`deliver()`](SelectionSession::deliver) the packs to a [`SelectionSink`],
//! or [`reopen()`](SelectionSession::reopen) to go back and change the selection.

use crate::catalog::Pack;

mod session;
pub use session::SelectionSession;
pub use session::Rejected;
mod validator;
pub use validator::PackValidator;
mod automation;
pub use automation::AutomatedSelection;
pub use automation::AutomatedPackEntry;
pub use automation::ReplayReport;

/// The selection can still be changed.
#[derive(Debug, Clone)]
pub struct Open;
/// The selection is resolved and frozen.
#[derive(Debug, Clone)]
pub struct Closed;

/// Receives the final packs, in install order.
pub trait SelectionSink {
	fn receive(&mut self, packs: &[&Pack]) -> crate::Result<()>;
}

/// Collects the pack names.
impl SelectionSink for Vec<String> {
	fn receive(&mut self, packs: &[&Pack]) -> crate::Result<()> {
		self.extend(packs.iter().map(|p| p.name.clone()));
		Ok(())
	}
}
