use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use crate::cloud::{Page, Statistics, READ_FROM_DISK};
use crate::disk::{format_time, DiskTarget};
use crate::fallback::{FallbackOutput, OpenFileFallback};
use crate::format::path_quote;
use crate::loader::Snapshot;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::tree::{Child, Tree};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub dircloud: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "match")]
    pub alternate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchQuery {
    pub filename: PathBuf,
}

pub async fn root(state: State<AppState>, query: Query<PageQuery>) -> Result<Response, AppError> {
    show(state, String::new(), query).await
}

pub async fn branch(
    state: State<AppState>,
    Path(path): Path<String>,
    query: Query<PageQuery>,
) -> Result<Response, AppError> {
    show(state, path, query).await
}

async fn current(state: &AppState) -> Result<Arc<Snapshot>, AppError> {
    let store = Arc::clone(&state.store);
    Ok(tokio::task::spawn_blocking(move || store.current()).await??)
}

/// A 303 to `location`, which must already be percent-encoded.
fn redirect(location: &str) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(location)
        .map_err(|e| AppError::Internal(format!("bad redirect target {location:?}: {e}")))?;
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response())
}

/// Everything under `/`: special pages, branch clouds, disk reads and
/// leaves.
async fn show(
    State(state): State<AppState>,
    dirpath: String,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let snapshot = current(&state).await?;

    match query.dircloud.as_deref() {
        Some("credits") => {
            return Ok(Html(state.renderer.credits_page(state.search.kind())).into_response())
        }
        Some("statistics") => return statistics(&state, &snapshot).await,
        Some(which @ ("size" | "used" | "available")) => {
            let space = space_tree(&state, &snapshot).await?;
            return Ok(Html(state.renderer.space_page(space.children(which))).into_response());
        }
        _ => {}
    }

    let non_disk = state.settings.tree.non_disk;
    let from_disk = dirpath.ends_with(READ_FROM_DISK);
    let clean = dirpath.trim_end_matches(READ_FROM_DISK).to_string();
    let tree = &snapshot.tree;

    let directory: Vec<Child> = if from_disk {
        let directory = if non_disk {
            tree.children(&clean).to_vec()
        } else {
            read_from_disk(&state, &snapshot, &clean).await?
        };
        if let (1, Some(fallback)) = (directory.len(), &state.fallback) {
            // A single entry: jump to the deepest leaf without visiting
            // each branch on the way.
            let leaf = tree
                .last_descendant_branch(&clean)
                .unwrap_or_else(|| clean.clone());
            return open_leaf(&state, fallback, &tree.branch_key(&leaf)).await;
        }
        directory
    } else {
        let directory = tree.children(&clean).to_vec();
        if !directory.is_empty() && !dirpath.is_empty() && !dirpath.ends_with('/') {
            return redirect(&format!("/{}/", path_quote(&dirpath)));
        }
        directory
    };

    if directory.is_empty() {
        return show_missing(&state, &snapshot, &dirpath, &clean).await;
    }

    let size = tree.branch_size(&clean);
    let header = state.renderer.stale_info(directory.len(), size);
    let body = state.renderer.cloud(&directory, "", false);
    Ok(Html(state.renderer.page(&Page {
        dirpath: &dirpath,
        size,
        header: &header,
        search: "",
        body: &body,
        footer: "",
    }))
    .into_response())
}

/// A path the tree has no children for: a directory or file on disk, a
/// leaf resolved through the fallback, or unknown.
async fn show_missing(
    state: &AppState,
    snapshot: &Arc<Snapshot>,
    dirpath: &str,
    clean: &str,
) -> Result<Response, AppError> {
    let tree = &snapshot.tree;
    let target = if state.settings.tree.non_disk {
        DiskTarget::Missing(PathBuf::from(clean))
    } else {
        let disk = Arc::clone(&state.disk);
        let path = clean.to_string();
        tokio::task::spawn_blocking(move || disk.classify(&path)).await?
    };

    match target {
        DiskTarget::Directory(dir) => {
            if !clean.is_empty() && !dirpath.ends_with('/') && !dirpath.ends_with(READ_FROM_DISK) {
                return redirect(&format!("/{}/", path_quote(clean)));
            }
            let directory = read_from_disk(state, snapshot, clean).await?;
            let disk = Arc::clone(&state.disk);
            let names = (
                state.settings.disk.header_name.clone(),
                state.settings.disk.readme_name.clone(),
            );
            let (header, footer) = tokio::task::spawn_blocking(move || {
                (
                    disk.read_file_if_exists(&dir, names.0.as_deref()).unwrap_or_default(),
                    disk.read_file_if_exists(&dir, names.1.as_deref()).unwrap_or_default(),
                )
            })
            .await?;
            let body = state.renderer.cloud(&directory, "", false);
            Ok(Html(state.renderer.page(&Page {
                dirpath,
                size: tree.branch_size(clean),
                header: &header,
                search: "",
                body: &body,
                footer: &footer,
            }))
            .into_response())
        }
        DiskTarget::File(file) => serve_file(state, file).await,
        DiskTarget::Missing(missing) => match &state.fallback {
            Some(fallback) => open_leaf(state, fallback, &tree.branch_key(clean)).await,
            None => Err(AppError::NotFound(format!("Unknown {}", missing.display()))),
        },
    }
}

/// Lists `path` from disk, caching new entries in the tree when enabled.
/// A path that is not a readable directory lists as empty.
async fn read_from_disk(
    state: &AppState,
    snapshot: &Arc<Snapshot>,
    path: &str,
) -> Result<Vec<Child>, AppError> {
    let disk = Arc::clone(&state.disk);
    let store = Arc::clone(&state.store);
    let snapshot = Arc::clone(snapshot);
    let update_cache = state.settings.disk.update_cache_from_disk;
    let path = path.to_string();

    let entries = tokio::task::spawn_blocking(move || {
        let entries = match disk.read_directory(&snapshot.tree, &path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %path, error = %e, "not listing from disk");
                return Vec::new();
            }
        };
        // modify() clones a generation that readers still hold, so only
        // call it when there is something to add.
        if update_cache && disk.needs_warming(&snapshot.tree, &path, &entries) {
            store.modify(|tree| disk.warm(tree, &path, &entries));
        }
        entries
    })
    .await?;

    Ok(entries.iter().map(|entry| entry.to_child()).collect())
}

async fn serve_file(state: &AppState, file: PathBuf) -> Result<Response, AppError> {
    let mime = state
        .settings
        .disk
        .mimetype_for(&file)
        .map(str::to_string)
        .unwrap_or_else(|| mime_guess::from_path(&file).first_or_octet_stream().to_string());
    let contents = tokio::fs::read(&file)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read {}: {e}", file.display())))?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, mime)], contents).into_response())
}

async fn open_leaf(
    state: &AppState,
    fallback: &OpenFileFallback,
    key: &str,
) -> Result<Response, AppError> {
    match fallback.resolve(key).await? {
        FallbackOutput::Redirect(location) => redirect(&location),
        FallbackOutput::Contents(contents) => {
            Ok(Html(state.renderer.contents_page(key, &contents)).into_response())
        }
    }
}

async fn space_tree(state: &AppState, snapshot: &Snapshot) -> Result<Arc<Tree>, AppError> {
    let space = Arc::clone(&state.space);
    let generation = snapshot.loaded_at;
    Ok(tokio::task::spawn_blocking(move || space.current(generation)).await?)
}

async fn statistics(state: &AppState, snapshot: &Arc<Snapshot>) -> Result<Response, AppError> {
    let space = space_tree(state, snapshot).await?;
    let backend = if state.settings.tree.non_disk {
        Vec::new()
    } else {
        let search = Arc::clone(&state.search);
        let snapshot = Arc::clone(snapshot);
        tokio::task::spawn_blocking(move || search.statistics(&snapshot.tree)).await?
    };
    let files: Vec<String> = state
        .store
        .files()
        .iter()
        .map(|file| file.display().to_string())
        .collect();

    let page = state.renderer.statistics_page(&Statistics {
        host: &state.settings.server.host,
        backend,
        files: &files,
        last_modified: &format_time(snapshot.modified),
        branches: snapshot.tree.len(),
        space: space.children("/"),
    });
    Ok(Html(page).into_response())
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let snapshot = current(&state).await?;
    let q = query.q.unwrap_or_default();
    let alternate = query.alternate.as_deref() == Some("on");

    let results = {
        let search = Arc::clone(&state.search);
        let snapshot = Arc::clone(&snapshot);
        let q = q.clone();
        tokio::task::spawn_blocking(move || search.search(&q, alternate, &snapshot.tree)).await?
    };
    debug!(query = %q, alternate, paths = results.paths.len(), "search");

    let size = snapshot.tree.branch_size("/");
    Ok(Html(state.renderer.search_page(&q, size, &results)).into_response())
}

pub async fn switch_file(
    State(state): State<AppState>,
    Query(query): Query<SwitchQuery>,
) -> Result<Response, AppError> {
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || store.switch_to(&query.filename)).await??;
    redirect("/")
}

pub async fn robots(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        state.settings.server.robots_txt.clone(),
    )
        .into_response()
}

pub async fn favicon() -> Response {
    ([(header::CONTENT_TYPE, "image/x-icon")], Vec::<u8>::new()).into_response()
}
