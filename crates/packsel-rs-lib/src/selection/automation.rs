//! Recording a selection so an unattended install can repeat it.

use serde::{Serialize, Deserialize};

use super::{Closed, Open, SelectionSession};

/// One candidate pack and whether it was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedPackEntry {
	/// Position in the catalog. Takes precedence over `name` when replaying.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub index: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedSelection {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub install_group: Option<String>,
	pub packs: Vec<AutomatedPackEntry>,
}

/// What happened when replaying an [`AutomatedSelection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
	/// The resolved selection, in install order.
	pub selected: Vec<String>,
	/// Packs that were recorded as selected but whose condition doesn't hold now.
	pub skipped: Vec<String>,
	/// Entries that couldn't be matched to a pack.
	pub problems: Vec<String>,
}

impl ReplayReport {
	/// `true` when every entry matched a pack.
	pub fn is_clean(&self) -> bool {
		self.problems.is_empty()
	}
}

impl AutomatedSelection {
	/// Records every candidate of a finished selection.
	pub fn record(session: &SelectionSession<'_, Closed>) -> Self {
		let catalog = session.context().catalog();
		Self {
			install_group: session.install_group().map(str::to_string),
			packs: session.candidates().iter()
				.map(|pack| AutomatedPackEntry {
					index: catalog.index_of(&pack.name),
					name: Some(pack.name.clone()),
					selected: session.packs().iter().any(|p| p.name == pack.name),
				})
				.collect(),
		}
	}

	/// Applies the recorded picks to `session`, then resolves them with [`SelectionSession::select()`].
	///
	/// # Errors
	/// Only resolution failures are errors, unmatched entries are listed in [`ReplayReport::problems`].
	/// On error the session is left as it was, install group included.
	pub fn replay(&self, session: &mut SelectionSession<'_, Open>) -> crate::Result<ReplayReport> {
		let checkpoint = session.checkpoint();
		let result = self.apply(session);
		if let Err(e) = &result {
			log::warn!("Automated selection could not be applied: {}", e);
			session.rollback(checkpoint);
		}
		result
	}

	fn apply(&self, session: &mut SelectionSession<'_, Open>) -> crate::Result<ReplayReport> {
		if let Some(group) = &self.install_group {
			session.select_install_group(group)?;
		}

		let catalog = session.context().catalog();
		let mut report = ReplayReport::default();
		let mut names = Vec::<String>::new();
		for entry in self.packs.iter().filter(|e| e.selected) {
			let pack = match (entry.index, &entry.name) {
				(Some(index), _) => match catalog.packs().get(index) {
					Some(pack) => pack,
					None => {
						log::error!("Invalid pack index {} in automated selection", index);
						report.problems.push(format!("invalid pack index {}", index));
						continue;
					},
				},
				(None, Some(name)) => match catalog.get(name) {
					Some(pack) => pack,
					None => {
						log::error!("Could not find selected pack named {}", name);
						report.problems.push(format!("no pack named \"{}\"", name));
						continue;
					},
				},
				(None, None) => {
					report.problems.push("entry has neither index nor name".to_string());
					continue;
				},
			};

			if !pack.required && !session.context().rules().can_install(pack.key(), session.variables())? {
				log::info!("Condition for pack {} not fulfilled, skipping pack", pack.name);
				report.skipped.push(pack.name.clone());
				continue;
			}
			if !session.is_candidate(&pack.name) {
				log::error!("Pack {} can't be selected in this installation", pack.name);
				report.problems.push(format!("pack \"{}\" is not available", pack.name));
				continue;
			}
			names.push(pack.name.clone());
		}

		let resolved = session.select(&names)?;
		report.selected = resolved.names().into_iter().map(str::to_string).collect();
		Ok(report)
	}

	pub fn from_json(json: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::catalog::{InstallerDefinition, Pack};
	use crate::config::SessionOptions;
	use crate::context::InstallerContext;
	use crate::rules::{Condition, Expression, Variables};

	fn context() -> InstallerContext {
		InstallerContext::new(InstallerDefinition {
			packs: vec![
				Pack::new("Core").required(),
				Pack::new("Lib"),
				Pack::new("App").depends_on(["Lib"]).preselected(false),
				Pack::new("Docs").with_condition(Expression::parse("docs").unwrap()),
			],
			conditions: [("docs".to_string(), Condition::variable("DOCS", "yes"))].into_iter().collect(),
			..Default::default()
		}, SessionOptions::default()).unwrap()
	}

	fn docs() -> Variables {
		[("DOCS", "yes")].into_iter().collect()
	}

	#[test]
	fn record_lists_every_candidate() {
		let context = context();
		let mut session = context.open_session_with(docs()).unwrap();
		session.toggle("Docs", false).unwrap();
		let record = AutomatedSelection::record(&session.proceed().unwrap());
		assert_eq!(record.packs.len(), 4);
		assert_eq!(record.packs.iter().filter(|e| e.selected).map(|e| e.name.as_deref().unwrap()).collect::<Vec<_>>(), vec!["Core", "Lib"]);
		assert_eq!(record.packs[3].index, Some(3));
	}

	#[test]
	fn replay_by_index_and_name() {
		let context = context();
		let record = AutomatedSelection {
			install_group: None,
			packs: vec![
				AutomatedPackEntry { index: Some(2), name: None, selected: true },
				AutomatedPackEntry { index: None, name: Some("Docs".into()), selected: true },
				AutomatedPackEntry { index: Some(1), name: None, selected: false },
			],
		};
		let mut session = context.open_session_with(docs()).unwrap();
		let report = record.replay(&mut session).unwrap();
		assert!(report.is_clean());
		assert_eq!(report.selected, vec!["Core", "Lib", "App", "Docs"]);
		assert_eq!(session.proceed().unwrap().pack_names(), vec!["Core", "Lib", "App", "Docs"]);
	}

	#[test]
	fn replay_reports_unmatched_entries() {
		let context = context();
		let record = AutomatedSelection {
			install_group: None,
			packs: vec![
				AutomatedPackEntry { index: Some(99), name: None, selected: true },
				AutomatedPackEntry { index: None, name: Some("Ghost".into()), selected: true },
			],
		};
		let report = record.replay(&mut context.open_session().unwrap()).unwrap();
		assert_eq!(report.problems.len(), 2);
		assert_eq!(report.selected, vec!["Core"]);
	}

	#[test]
	fn replay_skips_packs_whose_condition_fails() {
		let context = context();
		let record = AutomatedSelection {
			install_group: None,
			packs: vec![
				AutomatedPackEntry { index: Some(3), name: Some("Docs".into()), selected: true },
				AutomatedPackEntry { index: Some(1), name: Some("Lib".into()), selected: true },
			],
		};
		let report = record.replay(&mut context.open_session().unwrap()).unwrap();
		assert!(report.is_clean());
		assert_eq!(report.skipped, vec!["Docs"]);
		assert_eq!(report.selected, vec!["Core", "Lib"]);
	}

	#[test]
	fn replay_reports_packs_outside_install_group() {
		let context = InstallerContext::new(InstallerDefinition {
			packs: vec![Pack::new("Core"), Pack::new("Dev").with_install_group("developer"), Pack::new("Manual").with_install_group("user")],
			..Default::default()
		}, SessionOptions::default()).unwrap();
		let record = AutomatedSelection {
			install_group: Some("user".into()),
			packs: vec![AutomatedPackEntry { index: None, name: Some("Dev".into()), selected: true }],
		};
		let mut session = context.open_session().unwrap();
		let report = record.replay(&mut session).unwrap();
		assert_eq!(report.problems.len(), 1);
		assert_eq!(session.install_group(), Some("user"));
		assert!(report.selected.is_empty());
	}

	#[test]
	fn failed_replay_leaves_session_alone() {
		let context = InstallerContext::new(InstallerDefinition {
			packs: vec![
				Pack::new("Core").required(),
				Pack::new("Red").with_exclude_group("colour").with_install_group("user"),
				Pack::new("Blue").with_exclude_group("colour").with_install_group("user"),
				Pack::new("Dev").with_install_group("developer"),
			],
			..Default::default()
		}, SessionOptions::default()).unwrap();
		let record = AutomatedSelection {
			install_group: Some("user".into()),
			packs: vec![
				AutomatedPackEntry { index: None, name: Some("Red".into()), selected: true },
				AutomatedPackEntry { index: None, name: Some("Blue".into()), selected: true },
			],
		};
		let mut session = context.open_session().unwrap();
		let before = session.selected().map(str::to_string).collect::<Vec<_>>();

		assert!(matches!(record.replay(&mut session), Err(crate::Error::MutualExclusionViolation { .. })));
		assert_eq!(session.install_group(), None);
		assert_eq!(session.candidates().len(), 4);
		assert_eq!(session.selected().map(str::to_string).collect::<Vec<_>>(), before);
	}

	#[test]
	fn json_round_trip() {
		let record = AutomatedSelection {
			install_group: Some("user".into()),
			packs: vec![AutomatedPackEntry { index: Some(0), name: Some("Core".into()), selected: true }],
		};
		assert_eq!(AutomatedSelection::from_json(&record.to_json().unwrap()).unwrap(), record);
	}
}
