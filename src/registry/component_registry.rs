//! ComponentRegistry: discovery and lookup of agents, tools and teams.
//!
//! Each discovery pass builds a complete snapshot off to the side and publishes
//! it by swapping one `Arc`. Readers clone the `Arc` and never observe a
//! half-built directory.

use crate::agent::{Agent, AgentContext, AgentDefaults, AgentOptions};
use crate::config::AgentryConfig;
use crate::error::{DiscoveryState, RegistryError};
use crate::paths::{ComponentLocation, ImportRoots, PathResolver};
use crate::registry::catalog::{AgentFactory, ComponentCatalog, TeamFactory, ToolFactory};
use crate::registry::definition::{
    load_agent_definition, load_team_definition, load_tool_definition, AgentDefinition,
    TeamDefinition, ToolDefinition,
};
use crate::registry::discovery::{self, Candidate};
use crate::team::{Team, TeamContext, TeamRoster};
use crate::tool::{Tool, ToolContext};
use crate::types::{ComponentKind, ComponentName};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared by the registry and every descriptor it hands out
struct Runtime {
    resolver: PathResolver,
    defaults: AgentDefaults,
}

/// Registered agent: definition, location and bound factory
#[derive(Clone)]
pub struct AgentDescriptor {
    name: ComponentName,
    location: ComponentLocation,
    definition: Arc<AgentDefinition>,
    factory_key: String,
    factory: AgentFactory,
    runtime: Arc<Runtime>,
}

impl AgentDescriptor {
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    pub fn location(&self) -> &ComponentLocation {
        &self.location
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn factory_key(&self) -> &str {
        &self.factory_key
    }

    /// Build a fresh agent handle.
    ///
    /// Every handle gets its own import roots (shared, team, utils, then the
    /// agent directory), so one agent never reads another agent's prompts.
    pub fn instantiate(&self, options: AgentOptions) -> Result<Box<dyn Agent>, RegistryError> {
        let runtime = &self.runtime;
        let import_roots = Arc::new(ImportRoots::new());
        runtime.resolver.register_import_roots(
            &import_roots,
            self.name.team_name(),
            Some(self.name.name()),
        )?;

        let ctx = AgentContext::new(
            self.name.clone(),
            self.location.clone(),
            Arc::clone(&self.definition),
            options,
            &runtime.defaults,
            import_roots,
        );
        let agent = (self.factory)(ctx)?;
        debug!(agent = %self.name, factory = %self.factory_key, "Instantiated agent");
        Ok(agent)
    }
}

impl fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("factory", &self.factory_key)
            .finish()
    }
}

#[derive(Clone)]
pub struct ToolDescriptor {
    name: ComponentName,
    location: ComponentLocation,
    definition: Arc<ToolDefinition>,
    factory_key: String,
    factory: ToolFactory,
}

impl ToolDescriptor {
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    pub fn location(&self) -> &ComponentLocation {
        &self.location
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn factory_key(&self) -> &str {
        &self.factory_key
    }

    pub fn instantiate(&self) -> Result<Box<dyn Tool>, RegistryError> {
        let ctx = ToolContext::new(
            self.name.clone(),
            self.location.clone(),
            Arc::clone(&self.definition),
        );
        (self.factory)(ctx)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("factory", &self.factory_key)
            .finish()
    }
}

#[derive(Clone)]
pub struct TeamDescriptor {
    name: ComponentName,
    location: ComponentLocation,
    definition: Arc<TeamDefinition>,
    factory_key: String,
    factory: TeamFactory,
    members: Vec<AgentDescriptor>,
    runtime: Arc<Runtime>,
}

impl TeamDescriptor {
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    pub fn location(&self) -> &ComponentLocation {
        &self.location
    }

    pub fn definition(&self) -> &TeamDefinition {
        &self.definition
    }

    pub fn factory_key(&self) -> &str {
        &self.factory_key
    }

    /// Member agents in execution order
    pub fn members(&self) -> &[AgentDescriptor] {
        &self.members
    }

    /// Instantiate every member with `options` and build the team around them.
    pub fn instantiate(&self, options: AgentOptions) -> Result<Box<dyn Team>, RegistryError> {
        let mut roster = TeamRoster::new();
        for member in &self.members {
            roster.register_agent(member.instantiate(options.clone())?);
        }
        let sink = options
            .log_sink
            .unwrap_or_else(|| Arc::clone(&self.runtime.defaults.sink));

        let team = (self.factory)(TeamContext {
            name: self.name.clone(),
            location: self.location.clone(),
            definition: Arc::clone(&self.definition),
            roster,
            sink,
        })?;
        debug!(team = %self.name, members = self.members.len(), "Instantiated team");
        Ok(team)
    }
}

impl fmt::Debug for TeamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members.iter().map(|m| m.name.key()).collect();
        f.debug_struct("TeamDescriptor")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("factory", &self.factory_key)
            .field("members", &members)
            .finish()
    }
}

/// A component directory that discovery could not register
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedComponent {
    pub kind: ComponentKind,
    pub key: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub teams: usize,
    pub agents: usize,
    pub tools: usize,
    /// Components registered from the legacy layout
    pub legacy: usize,
    /// Legacy components hidden by an earlier component of the same name
    pub shadowed: usize,
    pub skipped: Vec<SkippedComponent>,
}

/// Insertion-ordered table with keyed lookup
struct EntryTable<D> {
    entries: Vec<D>,
    index: HashMap<String, usize>,
}

impl<D> Default for EntryTable<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<D> EntryTable<D> {
    fn insert(&mut self, key: String, entry: D) {
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
    }

    fn get(&self, key: &str) -> Option<&D> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct RegistrySnapshot {
    agents: EntryTable<AgentDescriptor>,
    tools: EntryTable<ToolDescriptor>,
    teams: EntryTable<TeamDescriptor>,
    report: DiscoveryReport,
}

/// Builds one snapshot from scan results
struct SnapshotBuilder<'a> {
    catalog: &'a ComponentCatalog,
    runtime: &'a Arc<Runtime>,
    seen: HashSet<(ComponentKind, String)>,
    agents: EntryTable<AgentDescriptor>,
    tools: EntryTable<ToolDescriptor>,
    teams: EntryTable<TeamDescriptor>,
    report: DiscoveryReport,
}

impl<'a> SnapshotBuilder<'a> {
    fn new(catalog: &'a ComponentCatalog, runtime: &'a Arc<Runtime>) -> Self {
        Self {
            catalog,
            runtime,
            seen: HashSet::new(),
            agents: EntryTable::default(),
            tools: EntryTable::default(),
            teams: EntryTable::default(),
            report: DiscoveryReport::default(),
        }
    }

    /// First sighting of a name wins; the current layout is scanned first.
    ///
    /// A losing legacy entry counts as shadowed; a losing current-layout entry
    /// is reported as skipped.
    fn claim(&mut self, candidate: &Candidate) -> bool {
        let key = (candidate.name.kind(), candidate.name.key());
        if self.seen.insert(key) {
            return true;
        }
        if candidate.location.is_legacy() {
            debug!(
                kind = %candidate.name.kind(),
                name = %candidate.name,
                path = %candidate.location.path().display(),
                "Legacy component shadowed"
            );
            self.report.shadowed += 1;
        } else {
            self.skip(candidate, "duplicate component name".to_string());
        }
        false
    }

    fn skip(&mut self, candidate: &Candidate, reason: String) {
        warn!(
            kind = %candidate.name.kind(),
            name = %candidate.name,
            path = %candidate.definition.display(),
            reason = %reason,
            "Skipping component"
        );
        self.report.skipped.push(SkippedComponent {
            kind: candidate.name.kind(),
            key: candidate.name.key(),
            path: candidate.definition.clone(),
            reason,
        });
    }

    fn note_layout(&mut self, location: &ComponentLocation) {
        if location.is_legacy() {
            self.report.legacy += 1;
        }
    }

    fn add_agent(&mut self, candidate: Candidate) {
        if !self.claim(&candidate) {
            return;
        }
        let definition = match load_agent_definition(&candidate.definition) {
            Ok(definition) => definition,
            Err(e) => return self.skip(&candidate, e.to_string()),
        };
        let factory_key = definition.factory_key(candidate.name.name()).to_string();
        let Some(factory) = self.catalog.agent_factory(&factory_key) else {
            return self.skip(&candidate, format!("unknown agent factory '{}'", factory_key));
        };

        self.note_layout(&candidate.location);
        self.agents.insert(
            candidate.name.key(),
            AgentDescriptor {
                name: candidate.name,
                location: candidate.location,
                definition: Arc::new(definition),
                factory_key,
                factory,
                runtime: Arc::clone(self.runtime),
            },
        );
    }

    fn add_tool(&mut self, candidate: Candidate) {
        if !self.claim(&candidate) {
            return;
        }
        let definition = match load_tool_definition(&candidate.definition) {
            Ok(definition) => definition,
            Err(e) => return self.skip(&candidate, e.to_string()),
        };
        let factory_key = definition.factory_key(candidate.name.name()).to_string();
        let Some(factory) = self.catalog.tool_factory(&factory_key) else {
            return self.skip(&candidate, format!("unknown tool factory '{}'", factory_key));
        };

        self.note_layout(&candidate.location);
        self.tools.insert(
            candidate.name.key(),
            ToolDescriptor {
                name: candidate.name,
                location: candidate.location,
                definition: Arc::new(definition),
                factory_key,
                factory,
            },
        );
    }

    /// Teams are added after all agents so members can be resolved.
    fn add_team(&mut self, candidate: Candidate) {
        if !self.claim(&candidate) {
            return;
        }
        let definition = match load_team_definition(&candidate.definition) {
            Ok(definition) => definition,
            Err(e) => return self.skip(&candidate, e.to_string()),
        };
        let factory_key = definition.factory_key().to_string();
        let Some(factory) = self.catalog.team_factory(&factory_key) else {
            return self.skip(&candidate, format!("unknown team factory '{}'", factory_key));
        };

        let team = candidate.name.team_name();
        let members: Vec<AgentDescriptor> = if definition.agents.is_empty() {
            self.agents
                .entries
                .iter()
                .filter(|agent| agent.name.team_name() == team)
                .cloned()
                .collect()
        } else {
            let mut members = Vec::with_capacity(definition.agents.len());
            for agent in &definition.agents {
                match self.agents.get(&ComponentName::agent(team, agent).key()) {
                    Some(descriptor) => members.push(descriptor.clone()),
                    None => {
                        return self.skip(
                            &candidate,
                            format!("member agent '{}' is not registered", agent),
                        )
                    }
                }
            }
            members
        };

        self.note_layout(&candidate.location);
        self.teams.insert(
            candidate.name.key(),
            TeamDescriptor {
                name: candidate.name,
                location: candidate.location,
                definition: Arc::new(definition),
                factory_key,
                factory,
                members,
                runtime: Arc::clone(self.runtime),
            },
        );
    }

    fn finish(mut self) -> RegistrySnapshot {
        self.report.teams = self.teams.len();
        self.report.agents = self.agents.len();
        self.report.tools = self.tools.len();
        RegistrySnapshot {
            agents: self.agents,
            tools: self.tools,
            teams: self.teams,
            report: self.report,
        }
    }
}

/// Directory of the agents, tools and teams of one workspace.
///
/// Lookups fail with `NotRegistered` until [`discover_all`](Self::discover_all)
/// has run. Instances are independent; there is no process-wide registry.
pub struct ComponentRegistry {
    runtime: Arc<Runtime>,
    catalog: Arc<ComponentCatalog>,
    snapshot: RwLock<Option<Arc<RegistrySnapshot>>>,
}

impl ComponentRegistry {
    pub fn new(resolver: PathResolver, catalog: ComponentCatalog) -> Self {
        Self::with_defaults(resolver, catalog, AgentDefaults::default())
    }

    pub fn with_defaults(
        resolver: PathResolver,
        catalog: ComponentCatalog,
        defaults: AgentDefaults,
    ) -> Self {
        Self {
            runtime: Arc::new(Runtime {
                resolver,
                defaults,
            }),
            catalog: Arc::new(catalog),
            snapshot: RwLock::new(None),
        }
    }

    /// Registry over `root` using the configured layout and default LLM client.
    pub fn from_config(
        root: impl Into<PathBuf>,
        config: &AgentryConfig,
        catalog: ComponentCatalog,
    ) -> Self {
        Self::with_defaults(
            PathResolver::with_layout(root, config.workspace.clone()),
            catalog,
            AgentDefaults::from_llm_config(&config.llm),
        )
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.runtime.resolver
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Scan both layouts and replace the directory with the result.
    pub fn discover_all(&self) -> Result<DiscoveryReport, RegistryError> {
        let resolver = &self.runtime.resolver;
        let root = resolver.root();
        if !root.is_dir() {
            return Err(RegistryError::io(
                root,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "workspace root is not a directory",
                ),
            ));
        }

        let started = Instant::now();
        let current = discovery::scan_current(resolver);
        let legacy = discovery::scan_legacy(resolver);

        let mut builder = SnapshotBuilder::new(&self.catalog, &self.runtime);
        for candidate in current.agents.into_iter().chain(legacy.agents) {
            builder.add_agent(candidate);
        }
        for candidate in current.tools.into_iter().chain(legacy.tools) {
            builder.add_tool(candidate);
        }
        for candidate in current.teams.into_iter().chain(legacy.teams) {
            builder.add_team(candidate);
        }
        let snapshot = builder.finish();
        let report = snapshot.report.clone();

        *self.snapshot.write() = Some(Arc::new(snapshot));

        info!(
            root = %root.display(),
            teams = report.teams,
            agents = report.agents,
            tools = report.tools,
            legacy = report.legacy,
            skipped = report.skipped.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Discovery complete"
        );
        Ok(report)
    }

    fn current(&self) -> Option<Arc<RegistrySnapshot>> {
        self.snapshot.read().clone()
    }

    fn lookup<D: Clone>(
        &self,
        kind: ComponentKind,
        key: String,
        table: impl Fn(&RegistrySnapshot) -> &EntryTable<D>,
    ) -> Result<D, RegistryError> {
        let Some(snapshot) = self.current() else {
            return Err(RegistryError::NotRegistered {
                kind,
                key,
                state: DiscoveryState::NotRun,
            });
        };
        match table(&snapshot).get(&key) {
            Some(descriptor) => Ok(descriptor.clone()),
            None => Err(RegistryError::NotRegistered {
                kind,
                key,
                state: DiscoveryState::Discovered,
            }),
        }
    }

    pub fn get_agent(&self, team: &str, name: &str) -> Result<AgentDescriptor, RegistryError> {
        let key = ComponentName::agent(team, name).key();
        self.lookup(ComponentKind::Agent, key, |s| &s.agents)
    }

    pub fn get_tool(&self, team: &str, name: &str) -> Result<ToolDescriptor, RegistryError> {
        let key = ComponentName::tool(team, name).key();
        self.lookup(ComponentKind::Tool, key, |s| &s.tools)
    }

    pub fn get_team(&self, name: &str) -> Result<TeamDescriptor, RegistryError> {
        let key = ComponentName::team(name).key();
        self.lookup(ComponentKind::Team, key, |s| &s.teams)
    }

    /// Agents in discovery order; empty before discovery.
    pub fn list_agents(&self) -> Vec<AgentDescriptor> {
        self.current()
            .map(|s| s.agents.entries.clone())
            .unwrap_or_default()
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.current()
            .map(|s| s.tools.entries.clone())
            .unwrap_or_default()
    }

    pub fn list_teams(&self) -> Vec<TeamDescriptor> {
        self.current()
            .map(|s| s.teams.entries.clone())
            .unwrap_or_default()
    }

    pub fn instantiate_agent(
        &self,
        team: &str,
        name: &str,
        options: AgentOptions,
    ) -> Result<Box<dyn Agent>, RegistryError> {
        self.get_agent(team, name)?.instantiate(options)
    }

    pub fn instantiate_tool(&self, team: &str, name: &str) -> Result<Box<dyn Tool>, RegistryError> {
        self.get_tool(team, name)?.instantiate()
    }

    pub fn instantiate_team(
        &self,
        name: &str,
        options: AgentOptions,
    ) -> Result<Box<dyn Team>, RegistryError> {
        self.get_team(name)?.instantiate(options)
    }

    /// Components the last discovery pass could not register
    pub fn skipped(&self) -> Vec<SkippedComponent> {
        self.current()
            .map(|s| s.report.skipped.clone())
            .unwrap_or_default()
    }

    /// Report of the last discovery pass
    pub fn last_report(&self) -> Option<DiscoveryReport> {
        self.current().map(|s| s.report.clone())
    }

    pub fn is_discovered(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Drop the directory; lookups fail until the next discovery.
    pub fn reset(&self) {
        *self.snapshot.write() = None;
        debug!(root = %self.runtime.resolver.root().display(), "Registry reset");
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("root", &self.runtime.resolver.root())
            .field("discovered", &self.is_discovered())
            .finish()
    }
}
