//! Pluggable search backends

use crate::dict::{Definition, DictClient, Match};
use crate::error::DictError;
use crate::format::{human_readable, thousands_separator};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::sync::Mutex;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Path results beyond this are dropped and the result is marked
/// truncated.
pub const MAX_RESULTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackendKind {
    /// External `locate` database
    #[default]
    Locate,
    /// Substring match over the loaded tree
    String,
    /// DICT protocol server
    Dict,
}

/// Matches found under one dict strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGroup {
    pub strategy: String,
    pub description: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub paths: Vec<String>,
    pub definitions: Vec<Definition>,
    pub suggestions: Vec<MatchGroup>,
    pub error: Option<String>,
    pub truncated: bool,
}

impl SearchResults {
    pub fn from_paths(mut paths: Vec<String>) -> Self {
        let truncated = paths.len() > MAX_RESULTS;
        paths.truncate(MAX_RESULTS);
        Self {
            paths,
            truncated,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.definitions.is_empty() && self.suggestions.is_empty()
    }
}

pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> SearchBackendKind;

    /// Runs a query. `alternate` asks for looser matching, whose meaning
    /// depends on the backend.
    fn search(&self, query: &str, alternate: bool, tree: &Tree) -> SearchResults;

    /// Human-readable lines describing the backend's index.
    fn statistics(&self, _tree: &Tree) -> Vec<String> {
        Vec::new()
    }
}

pub fn backend_for(kind: SearchBackendKind, dict_host: &str) -> Box<dyn SearchBackend> {
    match kind {
        SearchBackendKind::Locate => Box::new(LocateSearch::default()),
        SearchBackendKind::String => Box::new(StringSearch),
        SearchBackendKind::Dict => Box::new(DictSearch::new(dict_host)),
    }
}

/// Strips accents and lowercases.
pub fn normalize_string(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringSearch;

impl SearchBackend for StringSearch {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::String
    }

    fn search(&self, query: &str, alternate: bool, tree: &Tree) -> SearchResults {
        let mut paths: Vec<String> = if alternate {
            let query = normalize_string(query);
            tree.iter_branch_names("/")
                .filter(|name| normalize_string(name).contains(&query))
                .collect()
        } else {
            tree.iter_branch_names("/").filter(|name| name.contains(query)).collect()
        };
        paths.sort();
        SearchResults::from_paths(paths)
    }

    fn statistics(&self, tree: &Tree) -> Vec<String> {
        vec![format!("{} lines", thousands_separator(tree.len() as u64))]
    }
}

#[derive(Debug, Clone)]
pub struct LocateSearch {
    program: String,
}

impl Default for LocateSearch {
    fn default() -> Self {
        Self::new("locate")
    }
}

impl LocateSearch {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SearchBackend for LocateSearch {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::Locate
    }

    /// With `alternate` the query is a regular expression.
    fn search(&self, query: &str, alternate: bool, _tree: &Tree) -> SearchResults {
        let mut cmd = Command::new(&self.program);
        if alternate {
            cmd.arg("--regex");
        }
        cmd.arg("--").arg(query);
        debug!(program = %self.program, query, alternate, "running locate");

        match cmd.output() {
            // locate exits with 1 when nothing matched
            Ok(out) if out.status.success() || out.status.code() == Some(1) => {
                let paths = String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                SearchResults::from_paths(paths)
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                warn!(status = %out.status, %stderr, "locate failed");
                SearchResults::failed(format!("{} failed: {}", self.program, stderr))
            }
            Err(e) => {
                warn!(error = %e, "cannot run locate");
                SearchResults::failed(format!("cannot run {}: {}", self.program, e))
            }
        }
    }

    fn statistics(&self, _tree: &Tree) -> Vec<String> {
        match Command::new(&self.program).arg("--statistics").output() {
            Ok(out) => parse_locate_statistics(&String::from_utf8_lossy(&out.stdout)),
            Err(e) => {
                warn!(error = %e, "cannot run locate --statistics");
                Vec::new()
            }
        }
    }
}

/// Keeps the database header and the numeric lines of
/// `locate --statistics`, with byte counts made human readable.
pub fn parse_locate_statistics(output: &str) -> Vec<String> {
    let mut lines = output.lines();
    let mut out: Vec<String> = lines.next().map(|h| h.trim().to_string()).into_iter().collect();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(n) = fields.first().and_then(|f| f.replace(',', "").parse::<u64>().ok()) else {
            continue;
        };
        if fields.get(1) == Some(&"bytes") {
            out.push(format!("{} {}", human_readable(n, false), fields[2..].join(" ")));
        } else {
            out.push(format!("{} {}", thousands_separator(n), fields[1..].join(" ")));
        }
    }
    out
}

/// Searches a DICT server. Definitions come from every database; when
/// none are found a `lev` match offers spelling suggestions, and
/// `alternate` adds the matches of every server strategy.
#[derive(Debug)]
pub struct DictSearch {
    client: Mutex<DictClient>,
}

impl DictSearch {
    pub fn new(host: &str) -> Self {
        Self {
            client: Mutex::new(DictClient::new(host)),
        }
    }

    fn with_client<T>(&self, f: impl Fn(&mut DictClient) -> Result<T, DictError>) -> Result<T, DictError> {
        let mut client = self.client.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !client.is_connected() {
            client.reconnect()?;
        }
        match f(&mut *client) {
            Err(DictError::NotConnected | DictError::Io(_)) => {
                debug!("dict connection dropped, reconnecting");
                client.reconnect()?;
                f(&mut *client)
            }
            other => other,
        }
    }
}

impl SearchBackend for DictSearch {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::Dict
    }

    fn search(&self, query: &str, alternate: bool, _tree: &Tree) -> SearchResults {
        let outcome = self.with_client(|client| {
            let mut results = SearchResults {
                definitions: client.define("*", query)?,
                ..SearchResults::default()
            };
            if results.definitions.is_empty() && !alternate {
                let matches = client.match_words("*", "lev", query)?;
                if !matches.is_empty() {
                    results.suggestions.push(MatchGroup {
                        strategy: "lev".to_string(),
                        description: "Maybe you mean...".to_string(),
                        matches,
                    });
                }
            }
            if alternate {
                for strategy in client.strategies()? {
                    let matches = client.match_words("*", &strategy.name, query)?;
                    if !matches.is_empty() {
                        results.suggestions.push(MatchGroup {
                            strategy: strategy.name,
                            description: strategy.description,
                            matches,
                        });
                    }
                }
            }
            Ok(results)
        });

        outcome.unwrap_or_else(|e| {
            warn!(error = %e, "dict search failed");
            SearchResults::failed(e.to_string())
        })
    }

    /// The server banner lines and the per-database entry counts.
    fn statistics(&self, _tree: &Tree) -> Vec<String> {
        match self.with_client(|client| client.server_info()) {
            Ok(lines) => {
                let mut lines = lines.into_iter();
                let mut out: Vec<String> = lines.by_ref().take(2).collect();
                for line in lines {
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if let [name, count, ..] = fields.as_slice() {
                        if let Ok(n) = count.parse::<u64>() {
                            out.push(format!("{} {}", thousands_separator(n), name));
                        }
                    }
                }
                out
            }
            Err(e) => {
                warn!(error = %e, "cannot query dict server");
                Vec::new()
            }
        }
    }
}
