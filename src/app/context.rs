use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::cache::{MetadataStore, SidecarStore};
use crate::config::{FetchSettings, Manifest};
use crate::fetcher::conditional::ConditionalFetcher;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::BatchRunner;
use crate::fetcher::Fetcher;

pub struct AppContext {
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub store: Arc<dyn MetadataStore + Send + Sync>,
    pub conditional: Arc<ConditionalFetcher>,
    pub runner: BatchRunner,
}

impl AppContext {
    pub fn new(manifest: &Manifest) -> Result<Self> {
        Self::with_settings(manifest.output_dir.clone(), &manifest.fetch)
    }

    pub fn with_settings(output_dir: PathBuf, settings: &FetchSettings) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_settings(
            &settings.user_agent,
            settings.timeout(),
        )?);
        let store: Arc<dyn MetadataStore + Send + Sync> = Arc::new(SidecarStore::new());
        let conditional = Arc::new(ConditionalFetcher::new(
            fetcher.clone(),
            store.clone(),
            output_dir,
        ));
        let runner =
            BatchRunner::with_workers(conditional.clone(), settings.parallel, settings.deadline());

        Ok(Self {
            fetcher,
            store,
            conditional,
            runner,
        })
    }
}
