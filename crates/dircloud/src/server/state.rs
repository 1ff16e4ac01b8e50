use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cloud::Renderer;
use crate::disk::DiskReader;
use crate::fallback::OpenFileFallback;
use crate::search::{backend_for, SearchBackend};
use crate::settings::Settings;
use crate::space::SpaceStore;
use crate::store::TreeStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<TreeStore>,
    /// Free/used space per filesystem, rebuilt with each report generation
    pub space: Arc<SpaceStore>,
    pub disk: Arc<DiskReader>,
    pub search: Arc<dyn SearchBackend>,
    pub fallback: Option<Arc<OpenFileFallback>>,
    pub renderer: Arc<Renderer>,
}

impl AppState {
    /// Wires every component from `settings`. The first of `files` is the
    /// active report.
    pub fn new(settings: Settings, files: Vec<PathBuf>) -> Result<Self> {
        let store = TreeStore::new(files, settings.load_options());
        let space = SpaceStore::new(
            settings.space.ignore_filesystems.clone(),
            !settings.tree.non_disk,
        );
        let disk = DiskReader::new(&settings.disk.document_root, &settings.disk.index_ignore)
            .context("Invalid index_ignore pattern")?;
        let search: Arc<dyn SearchBackend> =
            Arc::from(backend_for(settings.search.backend, &settings.search.dict_host));
        let fallback = match settings.openfile_fallback.as_deref() {
            Some(template) if !template.is_empty() => Some(Arc::new(
                OpenFileFallback::parse(template).context("Invalid openfile_fallback")?,
            )),
            _ => None,
        };
        let renderer = Renderer::new(settings.render_options());

        Ok(Self {
            settings: Arc::new(settings),
            store: Arc::new(store),
            space: Arc::new(space),
            disk: Arc::new(disk),
            search,
            fallback,
            renderer: Arc::new(renderer),
        })
    }
}
