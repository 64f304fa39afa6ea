use crate::integration::support::write_file;
use agentry::error::RegistryError;
use agentry::paths::layout::{
    agent_name_from_legacy, legacy_agent_dir_name, legacy_team_dir_name, legacy_tool_dir_name,
    team_name_from_legacy, tool_name_from_legacy,
};
use agentry::types::ComponentKind;
use agentry::{ImportRoots, LayoutHit, PathResolver};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn current_layout_pairs_resolve() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("teams/sales/agents/pitch")).unwrap();
    fs::create_dir_all(temp.path().join("teams/sales/tools/crm")).unwrap();

    let resolver = PathResolver::new(temp.path());
    let agent = resolver.resolve_agent_location("sales", "pitch").unwrap();
    assert_eq!(agent.hit, LayoutHit::Current);
    assert!(agent.path.ends_with("teams/sales/agents/pitch"));

    let tool = resolver.resolve_tool_location("sales", "crm").unwrap();
    assert_eq!(tool.hit, LayoutHit::Current);
}

#[test]
fn legacy_only_pair_resolves_through_the_shim() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("Company Context Team/Brand_Voice_Agent")).unwrap();

    let resolver = PathResolver::new(temp.path());
    let team = resolver.resolve_team_location("company_context").unwrap();
    assert_eq!(team.hit, LayoutHit::Legacy);

    let agent = resolver
        .resolve_agent_location("company_context", "brand_voice")
        .unwrap();
    assert_eq!(agent.hit, LayoutHit::Legacy);
    assert!(agent.path.ends_with("Company Context Team/Brand_Voice_Agent"));
    assert_eq!(agent.hit.to_string(), "LEGACY_LAYOUT_HIT");

    // The shim never migrates anything
    assert!(!temp.path().join("teams").exists());
}

#[test]
fn current_layout_is_preferred_when_both_exist() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("teams/company_context/agents/brand_voice")).unwrap();
    fs::create_dir_all(temp.path().join("Company Context Team/Brand_Voice_Agent")).unwrap();

    let resolver = PathResolver::new(temp.path());
    let agent = resolver
        .resolve_agent_location("company_context", "brand_voice")
        .unwrap();
    assert_eq!(agent.hit, LayoutHit::Current);
}

#[test]
fn double_miss_names_both_locations() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("teams/sales")).unwrap();

    let resolver = PathResolver::new(temp.path());
    match resolver.resolve_agent_location("sales", "pitch") {
        Err(err @ RegistryError::NotFound { .. }) => {
            let message = err.to_string();
            if let RegistryError::NotFound {
                kind,
                current,
                legacy,
                ..
            } = err
            {
                assert_eq!(kind, ComponentKind::Agent);
                assert!(current.ends_with("teams/sales/agents/pitch"));
                assert!(legacy.ends_with("Pitch_Agent"));
                assert!(message.contains(&current.display().to_string()));
                assert!(message.contains(&legacy.display().to_string()));
            }
        }
        other => panic!("expected NotFound, got {:?}", other),
    }

    assert!(matches!(
        resolver.resolve_team_location("marketing"),
        Err(RegistryError::NotFound { kind: ComponentKind::Team, .. })
    ));
}

#[test]
fn empty_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("teams/sales")).unwrap();
    let resolver = PathResolver::new(temp.path());

    assert!(matches!(
        resolver.resolve_agent_location("sales", ""),
        Err(RegistryError::InvalidName(_))
    ));
    assert!(matches!(
        resolver.resolve_team_location("../etc"),
        Err(RegistryError::InvalidName(_))
    ));
}

#[test]
fn utils_and_shared_locations() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("teams/sales/utils")).unwrap();
    fs::create_dir_all(temp.path().join("shared/llms")).unwrap();
    fs::create_dir_all(temp.path().join("utils/fixtures")).unwrap();

    let resolver = PathResolver::new(temp.path());
    let utils = resolver.resolve_team_utils_location("sales").unwrap();
    assert_eq!(utils.hit, LayoutHit::Current);
    assert!(utils.path.ends_with("teams/sales/utils"));

    let shared = resolver.resolve_shared_location("llms").unwrap();
    assert_eq!(shared.hit, LayoutHit::Current);
    assert!(shared.path.ends_with("shared/llms"));

    let fixtures = resolver.resolve_shared_location("fixtures").unwrap();
    assert_eq!(fixtures.hit, LayoutHit::Legacy);
    assert!(fixtures.path.ends_with("utils/fixtures"));
}

#[test]
fn import_root_registration_is_idempotent() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("teams/sales/agents/pitch/agent.toml"), "");
    fs::create_dir_all(temp.path().join("teams/sales/utils")).unwrap();

    let resolver = PathResolver::new(temp.path());
    let roots = ImportRoots::new();

    let added = resolver
        .register_import_roots(&roots, "sales", Some("pitch"))
        .unwrap();
    assert!(added >= 3);
    let snapshot = roots.roots();

    let again = resolver
        .register_import_roots(&roots, "sales", Some("pitch"))
        .unwrap();
    assert_eq!(again, 0);
    assert_eq!(roots.roots(), snapshot);
    // Agent directory has the highest priority
    assert!(snapshot[0].ends_with("teams/sales/agents/pitch"));
}

fn snake_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(_[a-z]{1,6}){0,2}"
}

proptest! {
    #[test]
    fn legacy_names_round_trip(name in snake_name()) {
        prop_assert_eq!(team_name_from_legacy(&legacy_team_dir_name(&name)), Some(name.clone()));
        prop_assert_eq!(agent_name_from_legacy(&legacy_agent_dir_name(&name)), Some(name.clone()));
        prop_assert_eq!(tool_name_from_legacy(&legacy_tool_dir_name(&name)), Some(name));
    }

    #[test]
    fn legacy_team_dirs_resolve_to_their_name(name in snake_name()) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(legacy_team_dir_name(&name))).unwrap();

        let resolver = PathResolver::new(temp.path());
        let location = resolver.resolve_team_location(&name).unwrap();
        prop_assert_eq!(location.hit, LayoutHit::Legacy);
    }
}
