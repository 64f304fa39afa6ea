use crate::integration::support::{
    current_agent, legacy_agent, registry, registry_with_llm, write_file, ScriptedLlmClient,
    PROMPTED_AGENT,
};
use agentry::config::AgentryConfig;
use agentry::error::RegistryError;
use agentry::tooling::cli::{
    AgentCommands, Cli, CliContext, Commands, ResolveTarget, RunArgs, TeamCommands,
};
use agentry::usage::TokenUsage;
use clap::Parser;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn parse(output: &str) -> Value {
    serde_json::from_str(output).unwrap()
}

fn mixed_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "company_context", "brand_voice", PROMPTED_AGENT);
    legacy_agent(temp.path(), "Sales Team", "Pitch_Agent", PROMPTED_AGENT);
    current_agent(temp.path(), "sales", "broken", "factory = [");
    temp
}

#[test]
fn discover_json_contract_has_required_fields() {
    let temp = mixed_workspace();
    let cli = CliContext::from_registry(AgentryConfig::default(), registry(temp.path()));

    let output = cli
        .execute(&Commands::Discover {
            format: "json".to_string(),
        })
        .unwrap();
    let parsed = parse(&output);

    assert_eq!(parsed["teams"].as_u64(), Some(2));
    assert_eq!(parsed["agents"].as_u64(), Some(2));
    assert_eq!(parsed["legacy"].as_u64(), Some(1));
    let skipped = parsed["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["key"], "sales.broken");
    assert!(skipped[0]["reason"].as_str().is_some());
}

#[test]
fn agent_list_discovers_on_demand() {
    let temp = mixed_workspace();
    let cli = CliContext::from_registry(AgentryConfig::default(), registry(temp.path()));
    assert!(!cli.registry().is_discovered());

    let output = cli
        .execute(&Commands::Agent {
            command: AgentCommands::List {
                team: Some("sales".to_string()),
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed = parse(&output);

    assert!(cli.registry().is_discovered());
    assert_eq!(parsed["total"].as_u64(), Some(1));
    let agent = &parsed["agents"][0];
    assert_eq!(agent["name"], "sales.pitch");
    assert_eq!(agent["factory"], "prompted");
    assert_eq!(agent["location"]["hit"], "LEGACY_LAYOUT_HIT");

    let text = cli
        .execute(&Commands::Agent {
            command: AgentCommands::List {
                team: None,
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert!(text.contains("company_context.brand_voice"));
    assert!(text.contains("Total: 2 agent(s)"));
}

#[test]
fn unknown_agent_is_an_error() {
    let temp = mixed_workspace();
    let cli = CliContext::from_registry(AgentryConfig::default(), registry(temp.path()));

    let result = cli.execute(&Commands::Agent {
        command: AgentCommands::Show {
            team: "sales".to_string(),
            name: "nonexistent".to_string(),
            format: "text".to_string(),
        },
    });
    assert!(matches!(result, Err(RegistryError::NotRegistered { .. })));
}

#[test]
fn resolve_reports_layout_hit() {
    let temp = mixed_workspace();
    let cli = CliContext::from_registry(AgentryConfig::default(), registry(temp.path()));

    let output = cli
        .execute(&Commands::Resolve {
            target: ResolveTarget::Agent {
                team: "sales".to_string(),
                agent: "pitch".to_string(),
            },
            format: "json".to_string(),
        })
        .unwrap();
    let parsed = parse(&output);
    assert_eq!(parsed["hit"], "LEGACY_LAYOUT_HIT");
    assert!(parsed["path"].as_str().unwrap().ends_with("Pitch_Agent"));

    let missing = cli.execute(&Commands::Resolve {
        target: ResolveTarget::Agent {
            team: "sales".to_string(),
            agent: "closer".to_string(),
        },
        format: "text".to_string(),
    });
    assert!(matches!(missing, Err(RegistryError::NotFound { .. })));
}

#[test]
fn roots_lists_highest_priority_first() {
    let temp = mixed_workspace();
    let cli = CliContext::from_registry(AgentryConfig::default(), registry(temp.path()));

    let output = cli
        .execute(&Commands::Roots {
            team: "company_context".to_string(),
            agent: Some("brand_voice".to_string()),
            format: "json".to_string(),
        })
        .unwrap();
    let roots = parse(&output)["roots"].as_array().unwrap().clone();
    assert_eq!(roots.len(), 2);
    assert!(roots[0].as_str().unwrap().ends_with("brand_voice"));
}

#[test]
fn team_run_json_contract() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "content", "writer", PROMPTED_AGENT);
    let client = Arc::new(ScriptedLlmClient::new().reply("Draft", TokenUsage::single(3, 2, 5)));
    let cli = CliContext::from_registry(
        AgentryConfig::default(),
        registry_with_llm(temp.path(), client.clone()),
    );

    let output = cli
        .execute(&Commands::Team {
            command: TeamCommands::Run {
                name: "content".to_string(),
                run: RunArgs {
                    input: Some("{\"topic\": \"tides\"}".to_string()),
                    identifiers: vec![("company_id".to_string(), "acme".to_string())],
                    format: "json".to_string(),
                    ..RunArgs::default()
                },
            },
        })
        .unwrap();
    let parsed = parse(&output);

    assert_eq!(parsed["name"], "content");
    assert_eq!(parsed["output"]["writer"], "Draft");
    assert_eq!(parsed["usage"]["total_tokens"].as_u64(), Some(5));
    assert!(client.prompts()[0].0.contains("tides"));
}

#[test]
fn workspace_config_changes_layout() {
    let temp = TempDir::new().unwrap();
    write_file(
        &temp.path().join("agentry.toml"),
        "[workspace]\nteams_dir = \"crews\"\n",
    );
    write_file(
        &temp.path().join("crews/ops/agents/triage/agent.toml"),
        PROMPTED_AGENT,
    );

    let cli = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    assert_eq!(cli.config().workspace.teams_dir, "crews");
    cli.execute(&Commands::Discover {
        format: "text".to_string(),
    })
    .unwrap();
    assert!(cli.registry().get_agent("ops", "triage").is_ok());

    let rendered = cli.execute(&Commands::Config).unwrap();
    assert!(rendered.contains("teams_dir = \"crews\""));
}

#[test]
fn cli_parses_global_flags() {
    let cli = Cli::try_parse_from([
        "agentry",
        "--workspace",
        "/srv/agents",
        "--verbose",
        "team",
        "show",
        "content",
        "--format",
        "json",
    ])
    .unwrap();

    assert_eq!(cli.workspace, std::path::PathBuf::from("/srv/agents"));
    assert!(cli.verbose);
    assert!(matches!(
        cli.command,
        Commands::Team {
            command: TeamCommands::Show { .. }
        }
    ));
}
