//! Resolving leaves of non-disk trees through an external catalogue
//!
//! A fallback is configured as a URL template with one `%s` placeholder
//! for the leaf key:
//!
//! - `http://host/%s`, `https://host/item?id=%s`: redirect the browser
//! - `file://path/%s`: show the contents of a local file
//! - `dict://host/d:%s` or `dict://host/d:%s:database`: show definitions
//! - `sqlite://path/db.sqlite/d:%s:table:column:key`: show `column` of
//!   every row of `table` whose `key` equals the item

use crate::dict::DictClient;
use crate::error::FallbackError;
use crate::format::path_quote;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use tracing::{debug, warn};

const PLACEHOLDER: &str = "%s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutput {
    /// Send the client elsewhere
    Redirect(String),
    /// Show these blocks of text
    Contents(Vec<String>),
}

#[derive(Debug, Clone)]
enum Target {
    Redirect,
    File,
    Dict { host: String, database: String },
    Sqlite { pool: SqlitePool, sql: String },
}

#[derive(Debug, Clone)]
pub struct OpenFileFallback {
    template: String,
    target: Target,
}

impl OpenFileFallback {
    /// Parses a template. A sqlite pool is created lazily, which needs a
    /// running Tokio runtime.
    pub fn parse(template: &str) -> Result<Self, FallbackError> {
        let invalid = || FallbackError::Template(template.to_string());
        let (scheme, rest) = template.split_once("://").ok_or_else(invalid)?;

        let target = match scheme {
            "http" | "https" | "file" => {
                if template.matches(PLACEHOLDER).count() != 1 {
                    return Err(invalid());
                }
                if scheme == "file" {
                    Target::File
                } else {
                    Target::Redirect
                }
            }
            "dict" => {
                let (host, tail) = rest.split_once("/d:%s").ok_or_else(invalid)?;
                let database = match tail.strip_prefix(':') {
                    Some(db) if !db.is_empty() && db.chars().all(|c| is_word(c) || c == '*' || c == ':') => {
                        db.to_string()
                    }
                    None if tail.is_empty() => "*".to_string(),
                    _ => return Err(invalid()),
                };
                if host.is_empty() {
                    return Err(invalid());
                }
                Target::Dict {
                    host: host.to_string(),
                    database,
                }
            }
            "sqlite" => {
                let (path, tail) = rest.split_once("/d:%s:").ok_or_else(invalid)?;
                let [table, column, key] = match tail.split(':').collect::<Vec<_>>().as_slice() {
                    [table, column, key] => [*table, *column, *key],
                    _ => return Err(invalid()),
                };
                let identifiers_ok = [table, column, key]
                    .iter()
                    .all(|id| !id.is_empty() && id.chars().all(is_word));
                if path.is_empty() || !identifiers_ok {
                    return Err(invalid());
                }
                let options = SqliteConnectOptions::new()
                    .filename(PathBuf::from(path))
                    .read_only(true);
                let pool = SqlitePoolOptions::new()
                    .max_connections(2)
                    .connect_lazy_with(options);
                Target::Sqlite {
                    pool,
                    sql: format!(
                        "SELECT CAST({} AS TEXT) FROM {} WHERE {} = ?",
                        column, table, key
                    ),
                }
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            template: template.to_string(),
            target,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Looks `item` up in the catalogue.
    pub async fn resolve(&self, item: &str) -> Result<FallbackOutput, FallbackError> {
        debug!(template = %self.template, item, "resolving through fallback");
        let contents = match &self.target {
            Target::Redirect => {
                return Ok(FallbackOutput::Redirect(
                    self.template.replacen(PLACEHOLDER, &path_quote(item), 1),
                ))
            }
            Target::File => {
                let path = self
                    .template
                    .trim_start_matches("file://")
                    .replacen(PLACEHOLDER, item, 1);
                let safe = !item.is_empty() && !item.contains('/') && item != "." && item != "..";
                let bytes = if safe { tokio::fs::read(&path).await.ok() } else { None };
                match bytes {
                    Some(bytes) => vec![String::from_utf8_lossy(&bytes).into_owned()],
                    None => vec![format!("Cannot open {}", path)],
                }
            }
            Target::Dict { host, database } => {
                let (host, database, word) = (host.clone(), database.clone(), item.to_string());
                let lookup = tokio::task::spawn_blocking(move || {
                    let mut client = match DictClient::connect(&host) {
                        Ok(client) => client,
                        Err(e) => {
                            warn!(%host, error = %e, "cannot open dict connection");
                            return Ok(None);
                        }
                    };
                    client.define(&database, &word).map(Some)
                })
                .await??;
                match lookup {
                    None => vec![format!("Sorry, cannot open dict connection for {}", self.template)],
                    Some(definitions) => definitions.into_iter().map(|d| d.text).collect(),
                }
            }
            Target::Sqlite { pool, sql } => {
                let rows: Vec<Option<String>> = sqlx::query_scalar(sql).bind(item).fetch_all(pool).await?;
                rows.into_iter().flatten().collect()
            }
        };

        if contents.is_empty() {
            return Ok(FallbackOutput::Contents(vec![format!(
                "No results found for {} at {}",
                item, self.template
            )]));
        }
        Ok(FallbackOutput::Contents(contents))
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
