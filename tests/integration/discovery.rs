use crate::integration::support::{
    current_agent, current_tool, legacy_agent, registry, write_file, PROMPTED_AGENT,
};
use agentry::error::{DiscoveryState, RegistryError};
use agentry::types::ComponentKind;
use agentry::LayoutHit;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn brand_voice_is_discovered_and_nonexistent_is_not() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "company_context", "brand_voice", PROMPTED_AGENT);

    let registry = registry(temp.path());
    registry.discover_all().unwrap();

    let agent = registry.get_agent("company_context", "brand_voice").unwrap();
    assert_eq!(agent.name().key(), "company_context.brand_voice");
    assert_eq!(agent.location().hit, LayoutHit::Current);

    match registry.get_agent("company_context", "nonexistent") {
        Err(RegistryError::NotRegistered { kind, key, state }) => {
            assert_eq!(kind, ComponentKind::Agent);
            assert_eq!(key, "company_context.nonexistent");
            assert_eq!(state, DiscoveryState::Discovered);
        }
        other => panic!("expected NotRegistered, got {:?}", other.map(|a| a.name().key())),
    }
}

#[test]
fn removed_agent_is_not_registered_after_rediscovery() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "sales", "pitch", PROMPTED_AGENT);
    current_agent(temp.path(), "sales", "follow_up", PROMPTED_AGENT);

    let registry = registry(temp.path());
    registry.discover_all().unwrap();
    assert!(registry.get_agent("sales", "pitch").is_ok());

    fs::remove_dir_all(temp.path().join("teams/sales/agents/pitch")).unwrap();
    let report = registry.discover_all().unwrap();

    assert_eq!(report.agents, 1);
    assert!(matches!(
        registry.get_agent("sales", "pitch"),
        Err(RegistryError::NotRegistered { .. })
    ));
    assert!(registry.get_agent("sales", "follow_up").is_ok());
}

#[test]
fn legacy_components_fill_gaps_and_current_layout_wins() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "company_context", "brand_voice", PROMPTED_AGENT);
    legacy_agent(temp.path(), "Company Context Team", "Brand_Voice_Agent", PROMPTED_AGENT);
    legacy_agent(temp.path(), "Company Context Team", "Market_Research_Agent", PROMPTED_AGENT);

    let registry = registry(temp.path());
    let report = registry.discover_all().unwrap();

    let brand_voice = registry.get_agent("company_context", "brand_voice").unwrap();
    assert_eq!(brand_voice.location().hit, LayoutHit::Current);
    let research = registry.get_agent("company_context", "market_research").unwrap();
    assert_eq!(research.location().hit, LayoutHit::Legacy);

    assert_eq!(report.agents, 2);
    assert_eq!(report.teams, 1);
    assert_eq!(report.legacy, 1);
    // Legacy brand_voice agent and the legacy team directory
    assert_eq!(report.shadowed, 2);
}

#[test]
fn teams_tools_and_private_directories() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "content", "writer", PROMPTED_AGENT);
    current_tool(temp.path(), "content", "echo", "description = \"Echo input\"\n");
    current_tool(temp.path(), "content", "scraper", "factory = \"missing\"\n");
    current_agent(temp.path(), "_drafts", "writer", PROMPTED_AGENT);
    fs::create_dir_all(temp.path().join("teams/.cache")).unwrap();
    write_file(&temp.path().join("teams/content/agents/notes/README.md"), "notes");

    let registry = registry(temp.path());
    let report = registry.discover_all().unwrap();

    let teams: Vec<String> = registry.list_teams().iter().map(|t| t.name().key()).collect();
    assert_eq!(teams, vec!["content"]);
    assert_eq!(registry.list_agents().len(), 1);
    assert!(registry.get_tool("content", "echo").is_ok());

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].kind, ComponentKind::Tool);
    assert!(report.skipped[0].reason.contains("unknown tool factory 'missing'"));

    let members = registry.get_team("content").unwrap();
    assert_eq!(members.members().len(), 1);
}

#[test]
fn dotted_directory_names_never_collide_in_keys() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "a", "b.c", PROMPTED_AGENT);
    current_agent(temp.path(), "a.b", "c", PROMPTED_AGENT);
    current_agent(temp.path(), "a", "d", PROMPTED_AGENT);

    let registry = registry(temp.path());
    let report = registry.discover_all().unwrap();

    assert_eq!(report.agents, 1);
    assert_eq!(report.shadowed, 0);
    assert!(registry.get_agent("a", "d").is_ok());
    assert!(matches!(
        registry.get_agent("a", "b.c"),
        Err(RegistryError::NotRegistered { .. })
    ));
    assert!(matches!(
        registry.get_team("a.b"),
        Err(RegistryError::NotRegistered { .. })
    ));
    assert!(matches!(
        registry.resolver().resolve_agent_location("a", "b.c"),
        Err(RegistryError::InvalidName(_))
    ));
}

#[tokio::test]
async fn discovered_tool_instantiates_and_invokes() {
    let temp = TempDir::new().unwrap();
    current_tool(temp.path(), "content", "echo", "[config]\nretries = 2\n");

    let registry = registry(temp.path());
    registry.discover_all().unwrap();
    let tool = registry.instantiate_tool("content", "echo").unwrap();

    assert_eq!(tool.name().key(), "content.echo");
    let output = tool.invoke(serde_json::json!({"url": "https://example.com"})).await.unwrap();
    assert_eq!(output["url"], "https://example.com");
}

#[test]
fn lookups_stay_consistent_during_rediscovery() {
    let temp = TempDir::new().unwrap();
    for name in ["alpha", "beta", "gamma"] {
        current_agent(temp.path(), "ops", name, PROMPTED_AGENT);
    }
    let registry = Arc::new(registry(temp.path()));
    registry.discover_all().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(registry.list_agents().len(), 3);
                    assert!(registry.get_agent("ops", "beta").is_ok());
                }
            })
        })
        .collect();

    for _ in 0..20 {
        registry.discover_all().unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }
}

fn agent_names() -> impl Strategy<Value = BTreeSet<(String, String)>> {
    prop::collection::btree_set(("(sales|ops)", "[a-z][a-z_]{0,7}"), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn discovery_is_idempotent(agents in agent_names()) {
        let temp = TempDir::new().unwrap();
        for (team, agent) in &agents {
            current_agent(temp.path(), team, agent, PROMPTED_AGENT);
        }

        let registry = registry(temp.path());
        let first = registry.discover_all().unwrap();
        let first_keys: Vec<String> =
            registry.list_agents().iter().map(|a| a.name().key()).collect();
        let second = registry.discover_all().unwrap();
        let second_keys: Vec<String> =
            registry.list_agents().iter().map(|a| a.name().key()).collect();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first_keys, &second_keys);
        let expected: BTreeSet<String> =
            agents.iter().map(|(t, a)| format!("{}.{}", t, a)).collect();
        prop_assert_eq!(first_keys.into_iter().collect::<BTreeSet<_>>(), expected);
    }
}
