//! CLI Tooling
//!
//! Command-line interface over one workspace: discovery, listing, resolution and
//! running agents or teams.

use crate::agent::AgentOptions;
use crate::config::{AgentryConfig, ConfigLoader};
use crate::error::RegistryError;
use crate::paths::{ComponentLocation, ImportRoots};
use crate::registry::{
    AgentDescriptor, ComponentCatalog, ComponentRegistry, DiscoveryReport, TeamDescriptor,
    ToolDescriptor,
};
use crate::usage::TokenUsage;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Agentry CLI - discover and run agent teams
#[derive(Parser)]
#[command(name = "agentry")]
#[command(about = "Discover, resolve and run agents, tools and teams in a workspace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the workspace and report what was registered
    Discover {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect and run agents
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Inspect tools
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },
    /// Inspect and run teams
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    /// Resolve a symbolic name to a directory
    Resolve {
        #[command(subcommand)]
        target: ResolveTarget,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the import roots registered for a team or agent
    Roots {
        team: String,
        /// Include the agent directory
        #[arg(long)]
        agent: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List discovered agents
    List {
        /// Only agents of this team
        #[arg(long)]
        team: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one agent
    Show {
        team: String,
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run an agent once
    Run {
        team: String,
        name: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// List discovered tools
    List {
        #[arg(long)]
        team: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one tool
    Show {
        team: String,
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum TeamCommands {
    /// List discovered teams
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one team and its members
    Show {
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run every member agent of a team
    Run {
        name: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Subcommand)]
pub enum ResolveTarget {
    Team { team: String },
    Agent { team: String, agent: String },
    Tool { team: String, tool: String },
    /// Team utilities directory
    Utils { team: String },
    /// Cross-team shared resource category
    Shared { category: String },
}

#[derive(clap::Args, Clone, Default)]
pub struct RunArgs {
    /// JSON input object
    #[arg(long, conflicts_with = "input_file")]
    pub input: Option<String>,
    /// File containing the JSON input object
    #[arg(long)]
    pub input_file: Option<PathBuf>,
    /// Caller identifier as key=value (repeatable), e.g. company_id=acme
    #[arg(long = "id", value_parser = parse_key_val)]
    pub identifiers: Vec<(String, String)>,
    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// CLI context: configuration plus the workspace registry
pub struct CliContext {
    workspace_root: PathBuf,
    config: AgentryConfig,
    registry: ComponentRegistry,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Result<Self, RegistryError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(&workspace_root),
        }
        .map_err(|e| RegistryError::ConfigError(e.to_string()))?;

        Ok(Self::with_catalog(
            workspace_root,
            config,
            ComponentCatalog::with_builtins(),
        ))
    }

    /// Context with an explicit configuration and catalog
    pub fn with_catalog(
        workspace_root: PathBuf,
        config: AgentryConfig,
        catalog: ComponentCatalog,
    ) -> Self {
        let registry = ComponentRegistry::from_config(&workspace_root, &config, catalog);
        Self {
            workspace_root,
            config,
            registry,
        }
    }

    /// Context around an already built registry
    pub fn from_registry(config: AgentryConfig, registry: ComponentRegistry) -> Self {
        Self {
            workspace_root: registry.resolver().root().to_path_buf(),
            config,
            registry,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &AgentryConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, RegistryError> {
        match command {
            Commands::Discover { format } => {
                let report = self.registry.discover_all()?;
                format_discovery_report(&report, format)
            }
            Commands::Agent { command } => self.handle_agent_command(command),
            Commands::Tool { command } => self.handle_tool_command(command),
            Commands::Team { command } => self.handle_team_command(command),
            Commands::Resolve { target, format } => self.handle_resolve(target, format),
            Commands::Roots {
                team,
                agent,
                format,
            } => self.handle_roots(team, agent.as_deref(), format),
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| RegistryError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn ensure_discovered(&self) -> Result<(), RegistryError> {
        if !self.registry.is_discovered() {
            self.registry.discover_all()?;
        }
        Ok(())
    }

    fn handle_agent_command(&self, command: &AgentCommands) -> Result<String, RegistryError> {
        self.ensure_discovered()?;
        match command {
            AgentCommands::List { team, format } => {
                let agents: Vec<AgentDescriptor> = self
                    .registry
                    .list_agents()
                    .into_iter()
                    .filter(|a| team.as_deref().map_or(true, |t| a.name().team_name() == t))
                    .collect();
                format_agent_list(&agents, format)
            }
            AgentCommands::Show { team, name, format } => {
                let agent = self.registry.get_agent(team, name)?;
                format_agent_show(&agent, format)
            }
            AgentCommands::Run { team, name, run } => {
                let input = read_input(run)?;
                let mut agent = self
                    .registry
                    .instantiate_agent(team, name, run_options(run))?;
                let output = block_on(agent.execute(input))??;
                format_run_output(&agent.name().key(), &output, agent.usage(), &run.format)
            }
        }
    }

    fn handle_tool_command(&self, command: &ToolCommands) -> Result<String, RegistryError> {
        self.ensure_discovered()?;
        match command {
            ToolCommands::List { team, format } => {
                let tools: Vec<ToolDescriptor> = self
                    .registry
                    .list_tools()
                    .into_iter()
                    .filter(|t| team.as_deref().map_or(true, |name| t.name().team_name() == name))
                    .collect();
                format_tool_list(&tools, format)
            }
            ToolCommands::Show { team, name, format } => {
                let tool = self.registry.get_tool(team, name)?;
                format_tool_show(&tool, format)
            }
        }
    }

    fn handle_team_command(&self, command: &TeamCommands) -> Result<String, RegistryError> {
        self.ensure_discovered()?;
        match command {
            TeamCommands::List { format } => format_team_list(&self.registry.list_teams(), format),
            TeamCommands::Show { name, format } => {
                let team = self.registry.get_team(name)?;
                format_team_show(&team, format)
            }
            TeamCommands::Run { name, run } => {
                let input = read_input(run)?;
                let mut team = self.registry.instantiate_team(name, run_options(run))?;
                let output = block_on(team.execute(input))??;
                format_run_output(&team.name().key(), &output, team.usage(), &run.format)
            }
        }
    }

    fn handle_resolve(
        &self,
        target: &ResolveTarget,
        format: &str,
    ) -> Result<String, RegistryError> {
        let resolver = self.registry.resolver();
        let location = match target {
            ResolveTarget::Team { team } => resolver.resolve_team_location(team)?,
            ResolveTarget::Agent { team, agent } => resolver.resolve_agent_location(team, agent)?,
            ResolveTarget::Tool { team, tool } => resolver.resolve_tool_location(team, tool)?,
            ResolveTarget::Utils { team } => resolver.resolve_team_utils_location(team)?,
            ResolveTarget::Shared { category } => resolver.resolve_shared_location(category)?,
        };
        format_location(&location, format)
    }

    fn handle_roots(
        &self,
        team: &str,
        agent: Option<&str>,
        format: &str,
    ) -> Result<String, RegistryError> {
        let roots = ImportRoots::new();
        self.registry
            .resolver()
            .register_import_roots(&roots, team, agent)?;
        let roots = roots.roots();

        if format == "json" {
            return to_pretty_json(&json!({ "roots": roots }));
        }
        let mut output = String::from("Import roots (highest priority first):\n");
        for root in &roots {
            output.push_str(&format!("  {}\n", root.display()));
        }
        Ok(output)
    }
}

fn run_options(run: &RunArgs) -> AgentOptions {
    run.identifiers
        .iter()
        .fold(AgentOptions::new(), |options, (key, value)| {
            options.with_identifier(key.clone(), value.clone())
        })
}

fn read_input(run: &RunArgs) -> Result<Value, RegistryError> {
    let raw = match (&run.input, &run.input_file) {
        (Some(input), _) => input.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?
        }
        (None, None) => return Ok(json!({})),
    };
    serde_json::from_str(&raw)
        .map_err(|e| RegistryError::ConfigError(format!("Invalid JSON input: {}", e)))
}

/// Drive a future to completion on a fresh runtime.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, RegistryError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(RegistryError::ConfigError(
            "Cannot run agents from within an async runtime context".to_string(),
        ));
    }
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| RegistryError::ConfigError(format!("Failed to create runtime: {}", e)))?;
    Ok(rt.block_on(future))
}

fn to_pretty_json(value: &Value) -> Result<String, RegistryError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RegistryError::ConfigError(format!("Failed to render JSON: {}", e)))
}

fn location_json(location: &ComponentLocation) -> Value {
    json!({ "path": location.path, "hit": location.hit })
}

fn format_discovery_report(
    report: &DiscoveryReport,
    format: &str,
) -> Result<String, RegistryError> {
    if format == "json" {
        let value = serde_json::to_value(report)
            .map_err(|e| RegistryError::ConfigError(format!("Failed to render JSON: {}", e)))?;
        return to_pretty_json(&value);
    }
    let mut output = format!(
        "Discovered {} team(s), {} agent(s), {} tool(s)",
        report.teams, report.agents, report.tools
    );
    if report.legacy > 0 {
        output.push_str(&format!(" ({} from the legacy layout)", report.legacy));
    }
    output.push('\n');
    if !report.skipped.is_empty() {
        output.push_str(&format!("\nSkipped {} component(s):\n", report.skipped.len()));
        for skipped in &report.skipped {
            output.push_str(&format!(
                "  {} {}: {}\n",
                skipped.kind, skipped.key, skipped.reason
            ));
        }
    }
    Ok(output)
}

fn format_agent_list(agents: &[AgentDescriptor], format: &str) -> Result<String, RegistryError> {
    if format == "json" {
        let list: Vec<Value> = agents
            .iter()
            .map(|a| {
                json!({
                    "name": a.name().key(),
                    "factory": a.factory_key(),
                    "description": a.definition().description,
                    "location": location_json(a.location()),
                })
            })
            .collect();
        return to_pretty_json(&json!({ "agents": list, "total": agents.len() }));
    }
    if agents.is_empty() {
        return Ok("No agents found.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Agent", "Factory", "Layout", "Description"]);
    for a in agents {
        table.add_row(vec![
            a.name().key(),
            a.factory_key().to_string(),
            a.location().hit.to_string(),
            a.definition().description.clone().unwrap_or_default(),
        ]);
    }
    Ok(format!("{}\nTotal: {} agent(s)", table, agents.len()))
}

fn format_agent_show(agent: &AgentDescriptor, format: &str) -> Result<String, RegistryError> {
    let definition = agent.definition();
    if format == "json" {
        return to_pretty_json(&json!({
            "name": agent.name().key(),
            "factory": agent.factory_key(),
            "location": location_json(agent.location()),
            "definition": definition,
        }));
    }
    let mut output = format!("Agent: {}\n", agent.name());
    output.push_str(&format!("Factory: {}\n", agent.factory_key()));
    output.push_str(&format!(
        "Location: {} ({})\n",
        agent.location().path.display(),
        agent.location().hit
    ));
    if let Some(description) = &definition.description {
        output.push_str(&format!("Description: {}\n", description));
    }
    if let Some(prompt) = &definition.prompt {
        output.push_str(&format!("Prompt: {}\n", prompt));
    }
    if !definition.required_inputs.is_empty() {
        output.push_str(&format!(
            "Required inputs: {}\n",
            definition.required_inputs.join(", ")
        ));
    }
    if let Some(model) = &definition.llm.model {
        output.push_str(&format!("Model: {}\n", model));
    }
    Ok(output)
}

fn format_tool_list(tools: &[ToolDescriptor], format: &str) -> Result<String, RegistryError> {
    if format == "json" {
        let list: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name().key(),
                    "factory": t.factory_key(),
                    "description": t.definition().description,
                    "location": location_json(t.location()),
                })
            })
            .collect();
        return to_pretty_json(&json!({ "tools": list, "total": tools.len() }));
    }
    if tools.is_empty() {
        return Ok("No tools found.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Tool", "Factory", "Layout", "Description"]);
    for t in tools {
        table.add_row(vec![
            t.name().key(),
            t.factory_key().to_string(),
            t.location().hit.to_string(),
            t.definition().description.clone().unwrap_or_default(),
        ]);
    }
    Ok(format!("{}\nTotal: {} tool(s)", table, tools.len()))
}

fn format_tool_show(tool: &ToolDescriptor, format: &str) -> Result<String, RegistryError> {
    if format == "json" {
        return to_pretty_json(&json!({
            "name": tool.name().key(),
            "factory": tool.factory_key(),
            "location": location_json(tool.location()),
            "definition": tool.definition(),
        }));
    }
    let mut output = format!("Tool: {}\n", tool.name());
    output.push_str(&format!("Factory: {}\n", tool.factory_key()));
    output.push_str(&format!(
        "Location: {} ({})\n",
        tool.location().path.display(),
        tool.location().hit
    ));
    if let Some(description) = &tool.definition().description {
        output.push_str(&format!("Description: {}\n", description));
    }
    let config = tool.definition().config.keys().cloned().collect::<Vec<_>>();
    if !config.is_empty() {
        output.push_str(&format!("Config keys: {}\n", config.join(", ")));
    }
    Ok(output)
}

fn format_team_list(teams: &[TeamDescriptor], format: &str) -> Result<String, RegistryError> {
    if format == "json" {
        let list: Vec<Value> = teams
            .iter()
            .map(|t| {
                let members: Vec<String> = t
                    .members()
                    .iter()
                    .map(|m| m.name().name().to_string())
                    .collect();
                json!({
                    "name": t.name().key(),
                    "factory": t.factory_key(),
                    "agents": members,
                    "location": location_json(t.location()),
                })
            })
            .collect();
        return to_pretty_json(&json!({ "teams": list, "total": teams.len() }));
    }
    if teams.is_empty() {
        return Ok("No teams found.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Team", "Factory", "Layout", "Agents"]);
    for t in teams {
        table.add_row(vec![
            t.name().key(),
            t.factory_key().to_string(),
            t.location().hit.to_string(),
            t.members().len().to_string(),
        ]);
    }
    Ok(format!("{}\nTotal: {} team(s)", table, teams.len()))
}

fn format_team_show(team: &TeamDescriptor, format: &str) -> Result<String, RegistryError> {
    let members: Vec<String> = team
        .members()
        .iter()
        .map(|m| m.name().name().to_string())
        .collect();
    if format == "json" {
        return to_pretty_json(&json!({
            "name": team.name().key(),
            "factory": team.factory_key(),
            "location": location_json(team.location()),
            "description": team.definition().description,
            "agents": members,
        }));
    }
    let mut output = format!("Team: {}\n", team.name());
    output.push_str(&format!("Factory: {}\n", team.factory_key()));
    output.push_str(&format!(
        "Location: {} ({})\n",
        team.location().path.display(),
        team.location().hit
    ));
    if let Some(description) = &team.definition().description {
        output.push_str(&format!("Description: {}\n", description));
    }
    output.push_str("Agents:\n");
    for member in &members {
        output.push_str(&format!("  {}\n", member));
    }
    Ok(output)
}

fn format_location(location: &ComponentLocation, format: &str) -> Result<String, RegistryError> {
    if format == "json" {
        return to_pretty_json(&location_json(location));
    }
    Ok(format!("{} {}", location.hit, location.path.display()))
}

fn format_run_output(
    name: &str,
    output: &Value,
    usage: TokenUsage,
    format: &str,
) -> Result<String, RegistryError> {
    if format == "json" {
        return to_pretty_json(&json!({ "name": name, "output": output, "usage": usage }));
    }
    let body = match output {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    Ok(format!(
        "{}\n\nUsage: {} token(s) ({} prompt, {} completion) over {} LLM call(s)",
        body, usage.total_tokens, usage.prompt_tokens, usage.completion_tokens, usage.llm_calls
    ))
}
