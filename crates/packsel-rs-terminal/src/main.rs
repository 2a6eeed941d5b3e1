use packsel_rs::catalog::{JsonSource, VisibleExt};
use packsel_rs::rules::VariableProvider;
use packsel_rs::selection::{AutomatedSelection, SelectionSink};
use packsel_rs::{InstallerContext, Pack, SessionOptions, UnknownConditionPolicy, Variables};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased verbosity");
		opts.optopt(  "g", "group",      "Install group to use instead of the default", "GROUP");
		opts.optmulti("D", "define",     "Set an installer variable", "NAME=VALUE");
		opts.optflag( "",  "strict",     "Fail on conditions that are never defined (default)");
		opts.optflag( "",  "lenient",    "Treat unknown conditions as false instead of failing");
		opts.optflag( "",  "validate",   "Check the installer definition against its schema");
		opts.optopt(  "",  "record",     "Write the final selection for unattended installs", "FILE");
		opts.optopt(  "",  "replay",     "Select the packs recorded in FILE", "FILE");
		opts.optflag( "l", "list",       "List the packs that can be selected and exit");
		opts.optflag( "j", "json",       "Print the selection as JSON");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") || parsed_options.free.is_empty() {
			eprintln!("{}", opts.usage("Usage: packsel-rs-terminal [options] DEFINITION [PACK...]"));
			return;
		}

		parsed_options
	};

	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or(if parsed_options.opt_present("v") { "debug" } else { "warn" })
	).init();

	if let Err(e) = run(&parsed_options) {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

fn run(parsed_options: &getopts::Matches) -> Result<(), Error> {
	let definition_path = parsed_options.free.first().ok_or(Error::MissingArgument)?;
	let requested = &parsed_options.free[1..];

	let mut options = SessionOptions::default();
	options.set_unknown_condition_policy(condition_policy(parsed_options)?);

	let source = JsonSource::from_path(definition_path)?.with_validation(parsed_options.opt_present("validate"));
	let context = InstallerContext::from_source(&source, options)?;

	let mut variables: Variables = context.default_variables().clone();
	for assignment in parsed_options.opt_strs("D") {
		let (name, value) = Variables::parse_assignment(&assignment)?;
		variables.set(&name, &value);
	}

	let unmet = context.rules().check_installer_requirements(&variables)?;
	if !unmet.is_empty() {
		return Err(Error::RequirementsNotMet(unmet.iter().map(|r| r.message.clone()).collect()));
	}

	let mut session = context.open_session_with(variables)?;

	let groups = session.install_groups()?;
	if !groups.is_empty() {
		let group = match parsed_options.opt_str("g") {
			Some(g) => g,
			None => groups.default_group(session.variables()).map(|g| g.name.clone()).ok_or(Error::MissingArgument)?,
		};
		for data in groups.sorted() {
			let marker = if data.name == group { "*" } else { " " };
			eprintln!("{} {} - {} ({})", marker, data.name, data.description, data.size_string());
		}
		session.select_install_group(&group)?;
	}

	if parsed_options.opt_present("list") {
		let candidates = session.candidates();
		let top_level = candidates.iter().copied().visible().filter(|p| p.parent.is_none());
		for pack in top_level {
			print_candidate(&session, pack, 0);
			for child in context.catalog().children(&pack.name).visible() {
				if candidates.contains(&child) {
					print_candidate(&session, child, 1);
				}
			}
		}
		return Ok(());
	}

	if let Some(path) = parsed_options.opt_str("replay") {
		let record = AutomatedSelection::from_json(&std::fs::read_to_string(path)?)?;
		let report = record.replay(&mut session)?;
		for name in &report.skipped {
			eprintln!("Skipped {}, its condition isn't met", name);
		}
		for problem in &report.problems {
			log::warn!("Automated selection: {}", problem);
		}
	} else if !requested.is_empty() {
		session.select(requested)?;
	}

	let closed = session.proceed().map_err(|rejected| Error::Rejected(rejected.error))?;

	if parsed_options.opt_present("json") {
		let mut names = Vec::<String>::new();
		closed.deliver(&mut names)?;
		println!("{}", serde_json::to_string_pretty(&names)?);
	} else {
		closed.deliver(&mut PrintSink)?;
	}

	if let Some(path) = parsed_options.opt_str("record") {
		log::info!("Recording selection to {}", path);
		std::fs::write(path, AutomatedSelection::record(&closed).to_json()?)?;
	}

	Ok(())
}

fn print_candidate<State>(session: &packsel_rs::selection::SelectionSession<'_, State>, pack: &Pack, depth: usize) {
	let check = if session.is_selected(&pack.name) { "x" } else { " " };
	let required = if pack.required { " (required)" } else { "" };
	println!("{}[{}] {}{} - {}", "\t".repeat(depth), check, pack.name, required, pack.description);
}

/// Lists the packs on stdout.
struct PrintSink;

impl SelectionSink for PrintSink {
	fn receive(&mut self, packs: &[&Pack]) -> packsel_rs::Result<()> {
		println!("Packs to install:");
		for pack in packs {
			let loose = if pack.loose { " (loose)" } else { "" };
			println!("\t{}{} {} bytes", pack.name, loose, pack.size);
		}
		println!("Total: {} bytes", packs.iter().map(|p| p.size).sum::<u64>());
		Ok(())
	}
}

fn condition_policy(parsed_options: &getopts::Matches) -> Result<UnknownConditionPolicy, Error> {
	match (parsed_options.opt_present("strict"), parsed_options.opt_present("lenient")) {
		(true, true) => Err(Error::ConflictingOptions("--strict", "--lenient")),
		(_, true) => Ok(UnknownConditionPolicy::AssumeFalse),
		(_, false) => Ok(UnknownConditionPolicy::Fail),
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("packsel-rs error: {0}")]
	Packsel(#[from] packsel_rs::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("Missing argument")]
	MissingArgument,
	#[error("{0} and {1} can't be used together")]
	ConflictingOptions(&'static str, &'static str),
	#[error("installer requirements not met: {}", .0.join("; "))]
	RequirementsNotMet(Vec<String>),
	#[error("selection rejected: {0}")]
	Rejected(packsel_rs::Error),
}

#[cfg(test)]
mod test {
	use super::*;

	fn parse(args: &[&str]) -> getopts::Matches {
		let mut opts = getopts::Options::new();
		opts.optflag("", "strict", "");
		opts.optflag("", "lenient", "");
		opts.parse(args).unwrap()
	}

	#[test] fn strict_is_the_default() { assert_eq!(condition_policy(&parse(&[])).unwrap(), UnknownConditionPolicy::Fail) }
	#[test] fn strict_flag() { assert_eq!(condition_policy(&parse(&["--strict"])).unwrap(), UnknownConditionPolicy::Fail) }
	#[test] fn lenient_flag() { assert_eq!(condition_policy(&parse(&["--lenient"])).unwrap(), UnknownConditionPolicy::AssumeFalse) }
	#[test] fn strict_and_lenient_conflict() { assert!(matches!(condition_policy(&parse(&["--strict", "--lenient"])), Err(Error::ConflictingOptions(..)))) }
}
