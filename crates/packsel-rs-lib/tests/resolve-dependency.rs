use packsel_rs::relationship_resolver::DependencyResolver;
use packsel_rs::{Error, Pack, SessionOptions, Variables};
use packsel_rs_test_utils::*;

#[test]
fn resolve_dependency() {
	let _ = env_logger::builder().is_test(true).try_init();

	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	let resolved = DependencyResolver::new(context.catalog()).resolve(&["SDK"], &candidates).unwrap();

	assert_eq!(resolved.names(), vec!["Core", "Runtime", "Editor", "Headers", "SDK"]);
	assert_eq!(resolved.size(), 10485760 + 2097152 + 5242880 + 524288 + 3145728);
}

#[test]
fn dependencies_precede_dependents() {
	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	let resolved = DependencyResolver::new(context.catalog()).resolve(&["Plugins", "SDK", "Light Theme"], &candidates).unwrap();

	let position = |name: &str| resolved.names().iter().position(|n| *n == name).unwrap();
	for pack in resolved.packs() {
		for dependency in &pack.dependencies {
			assert!(position(dependency) < position(&pack.name), "{} installed before {}", pack.name, dependency);
		}
	}
}

#[test]
fn required_packs_always_present() {
	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	let resolver = DependencyResolver::new(context.catalog());
	for request in [vec![], vec!["Light Theme"], vec!["Editor", "Unix Launcher"]] {
		assert!(resolver.resolve(&request, &candidates).unwrap().contains("Core"));
	}
}

#[test]
fn exclusive_packs_conflict() {
	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	let result = DependencyResolver::new(context.catalog()).resolve(&["Light Theme", "Dark Theme"], &candidates);
	assert!(matches!(result, Err(Error::MutualExclusionViolation { group, .. }) if group == "theme"));
}

#[test]
fn unavailable_pack_is_refused() {
	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	assert!(matches!(
		DependencyResolver::new(context.catalog()).resolve(&["Windows Launcher"], &candidates),
		Err(Error::PackUnavailable(_))
	));
}

#[test]
fn resolutions_are_independent() {
	let context = get_context().unwrap();
	let candidates = context.available_packs(&Variables::new()).unwrap();
	let resolver = DependencyResolver::new(context.catalog());

	let first = resolver.resolve(&["Plugins"], &candidates).unwrap();
	let _ = resolver.resolve(&["Light Theme", "Dark Theme"], &candidates);
	let _ = resolver.resolve(&["SDK"], &candidates).unwrap();
	assert_eq!(resolver.resolve(&["Plugins"], &candidates).unwrap(), first);
}

#[test]
fn cycle_is_reported() {
	let context = get_context_with(CYCLIC, SessionOptions::default()).unwrap();
	let candidates: Vec<&Pack> = context.catalog().iter().collect();
	let resolver = DependencyResolver::new(context.catalog());

	match resolver.resolve(&["Protocol"], &candidates) {
		Err(Error::CyclicDependency(cycle)) => assert_eq!(cycle, vec!["Protocol", "Server", "Client", "Protocol"]),
		other => panic!("expected a cycle, got {:?}", other),
	}
	assert_eq!(resolver.resolve(&["Standalone"], &candidates).unwrap().names(), vec!["Standalone"]);
}

#[test]
fn reverse_dependencies() {
	let context = get_context().unwrap();
	let dependents = DependencyResolver::new(context.catalog()).dependents("Runtime").unwrap();
	assert_eq!(dependents.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["Editor", "Plugins", "SDK"]);
}
