//! Prompt template loading and rendering.

use crate::paths::ImportRoots;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

const PROMPT_DIR: &str = "prompts";
const PROMPT_EXTENSIONS: [&str; 2] = ["md", "txt"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt '{reference}' not found (searched {})", display_paths(.searched))]
    NotFound {
        reference: String,
        searched: Vec<PathBuf>,
    },

    #[error("Failed to read prompt file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt file {} is empty", .0.display())]
    Empty(PathBuf),

    #[error("Cannot resolve prompt path '{0}'")]
    Resolve(String),

    #[error("Missing prompt variable '{variable}' (provided: {})", .provided.join(", "))]
    MissingVariable {
        variable: String,
        provided: Vec<String>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a prompt reference with support for absolute, tilde, and relative paths
///
/// Path resolution priority:
/// 1. Absolute path (if starts with `/`)
/// 2. Tilde expansion (if starts with `~/`)
/// 3. Relative to current directory (if starts with `./`)
/// 4. Relative to base_dir (the agent directory)
pub fn resolve_prompt_path(path: &str, base_dir: &Path) -> Result<PathBuf, PromptError> {
    if path.starts_with('/') {
        return Ok(PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME")
            .map_err(|_| PromptError::Resolve(format!("{} (HOME not set)", path)))?;
        return Ok(PathBuf::from(home).join(rest));
    }
    if let Some(rest) = path.strip_prefix("./") {
        let current_dir = std::env::current_dir()
            .map_err(|e| PromptError::Resolve(format!("{} ({})", path, e)))?;
        return Ok(current_dir.join(rest));
    }
    Ok(base_dir.join(path))
}

/// Prompt file cache with modification time tracking
#[derive(Debug, Default)]
pub struct PromptCache {
    cache: HashMap<PathBuf, (String, SystemTime)>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load prompt file content, rereading only when the file changed.
    pub fn load_prompt(&mut self, path: &Path) -> Result<String, PromptError> {
        let read_error = |source| PromptError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(read_error)?;
        if let Some((cached_content, cached_mtime)) = self.cache.get(path) {
            if *cached_mtime == mtime {
                return Ok(cached_content.clone());
            }
        }
        let content = std::fs::read_to_string(path).map_err(read_error)?;
        if content.trim().is_empty() {
            return Err(PromptError::Empty(path.to_path_buf()));
        }
        self.cache
            .insert(path.to_path_buf(), (content.clone(), mtime));
        Ok(content)
    }
}

/// Finds prompt files for one agent.
///
/// A reference is tried relative to the agent directory, then as
/// `prompts/{reference}.md|txt` in the agent directory, then as a path under
/// each import root and finally as `prompts/{reference}.md|txt` under each root.
pub struct PromptLoader {
    base_dir: PathBuf,
    roots: Arc<ImportRoots>,
    cache: PromptCache,
}

impl PromptLoader {
    pub fn new(base_dir: PathBuf, roots: Arc<ImportRoots>) -> Self {
        Self {
            base_dir,
            roots,
            cache: PromptCache::new(),
        }
    }

    pub fn locate(&self, reference: &str) -> Result<PathBuf, PromptError> {
        let direct = resolve_prompt_path(reference, &self.base_dir)?;
        if direct.is_file() {
            return Ok(direct);
        }
        let mut searched = vec![direct];

        let templates: Vec<PathBuf> = PROMPT_EXTENSIONS
            .iter()
            .map(|ext| Path::new(PROMPT_DIR).join(format!("{}.{}", reference, ext)))
            .collect();
        for relative in &templates {
            let local = self.base_dir.join(relative);
            if local.is_file() {
                return Ok(local);
            }
            searched.push(local);
        }

        if let Some(found) = self.roots.find(Path::new(reference)).filter(|p| p.is_file()) {
            return Ok(found);
        }
        for relative in templates {
            if let Some(found) = self.roots.find(&relative).filter(|p| p.is_file()) {
                return Ok(found);
            }
            searched.push(relative);
        }

        Err(PromptError::NotFound {
            reference: reference.to_string(),
            searched,
        })
    }

    pub fn load(&mut self, reference: &str) -> Result<String, PromptError> {
        let path = self.locate(reference)?;
        self.cache.load_prompt(&path)
    }
}

/// Substitute `{name}` placeholders from `variables`.
///
/// `{{` and `}}` produce literal braces. Braces that do not enclose an identifier
/// (JSON examples, for instance) are copied through unchanged. String values are
/// inserted verbatim, other values as compact JSON.
pub fn render_template(
    template: &str,
    variables: &Map<String, Value>,
) -> Result<String, PromptError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(&['{', '}'][..]) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            output.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            output.push('}');
            rest = &tail[1..];
            continue;
        }

        match placeholder(tail) {
            Some(name) => {
                let value = variables.get(name).ok_or_else(|| {
                    let mut provided: Vec<String> = variables.keys().cloned().collect();
                    provided.sort();
                    PromptError::MissingVariable {
                        variable: name.to_string(),
                        provided,
                    }
                })?;
                match value {
                    Value::String(s) => output.push_str(s),
                    other => output.push_str(&other.to_string()),
                }
                rest = &tail[name.len() + 2..];
            }
            None => {
                output.push('{');
                rest = &tail[1..];
            }
        }
    }
    output.push_str(rest);
    Ok(output)
}

/// Identifier inside a leading `{...}`, if the braces enclose one.
fn placeholder(tail: &str) -> Option<&str> {
    let end = tail.find('}')?;
    let name = &tail[1..end];
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}
