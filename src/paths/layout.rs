//! Layout conventions and resolved locations.
//!
//! Current layout: `teams/{team}/agents|tools/{name}`.
//! Legacy layout: `{Team Name} Team/{Agent_Name}_Agent`, with tools nested under an
//! agent as `tools/{tool name}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which layout satisfied a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutHit {
    #[serde(rename = "CURRENT_LAYOUT_HIT")]
    Current,
    #[serde(rename = "LEGACY_LAYOUT_HIT")]
    Legacy,
}

impl LayoutHit {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutHit::Current => "CURRENT_LAYOUT_HIT",
            LayoutHit::Legacy => "LEGACY_LAYOUT_HIT",
        }
    }
}

impl fmt::Display for LayoutHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved location. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentLocation {
    pub path: PathBuf,
    pub hit: LayoutHit,
}

impl ComponentLocation {
    pub fn current(path: PathBuf) -> Self {
        Self {
            path,
            hit: LayoutHit::Current,
        }
    }

    pub fn legacy(path: PathBuf) -> Self {
        Self {
            path,
            hit: LayoutHit::Legacy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_legacy(&self) -> bool {
        self.hit == LayoutHit::Legacy
    }
}

const LEGACY_TEAM_SUFFIX: &str = " Team";
const LEGACY_AGENT_SUFFIX: &str = "_Agent";

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_words<'a>(name: &'a str) -> impl Iterator<Item = String> + 'a {
    name.split('_').filter(|w| !w.is_empty()).map(capitalize)
}

fn normalize(words: &str) -> String {
    words
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `company_context` -> `Company Context Team`
pub fn legacy_team_dir_name(team: &str) -> String {
    format!("{}{}", title_words(team).collect::<Vec<_>>().join(" "), LEGACY_TEAM_SUFFIX)
}

/// `brand_voice` -> `Brand_Voice_Agent`
pub fn legacy_agent_dir_name(agent: &str) -> String {
    format!("{}{}", title_words(agent).collect::<Vec<_>>().join("_"), LEGACY_AGENT_SUFFIX)
}

/// `web_scraper` -> `web scraper`
pub fn legacy_tool_dir_name(tool: &str) -> String {
    tool.split('_').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

/// `Company Context Team` -> `company_context`. None if the name lacks the team suffix.
pub fn team_name_from_legacy(dir_name: &str) -> Option<String> {
    let stem = strip_suffix_ignore_case(dir_name.trim_end(), LEGACY_TEAM_SUFFIX)?;
    let name = normalize(stem);
    is_valid_component_name(&name).then_some(name)
}

/// `Brand_Voice_Agent` -> `brand_voice`. None if the name lacks the agent suffix.
pub fn agent_name_from_legacy(dir_name: &str) -> Option<String> {
    let stem = strip_suffix_ignore_case(dir_name.trim_end(), LEGACY_AGENT_SUFFIX)?;
    let name = normalize(stem);
    is_valid_component_name(&name).then_some(name)
}

/// `web scraper` -> `web_scraper`
pub fn tool_name_from_legacy(dir_name: &str) -> Option<String> {
    let name = normalize(dir_name);
    is_valid_component_name(&name).then_some(name)
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    if value.len() <= suffix.len() || !value.is_char_boundary(value.len() - suffix.len()) {
        return None;
    }
    let (stem, tail) = value.split_at(value.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Component names are single identifiers: no path separators and no dots, since
/// `.` joins team and component in registry keys.
pub fn is_valid_component_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(&['.', '/', '\\'][..])
}
