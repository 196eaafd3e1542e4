use crate::tools::presentation::{NullPresentation, PresentationSink};
use crate::transport::backend::ApiKey;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by the tool handlers of one assistant.
///
/// Handlers receive this explicitly instead of reading page-level globals.
pub struct SessionContext {
    api_key: RwLock<Option<ApiKey>>,
    presentation: Arc<dyn PresentationSink>,
}

impl SessionContext {
    #[must_use]
    pub fn new(presentation: Arc<dyn PresentationSink>) -> Self {
        Self { api_key: RwLock::new(None), presentation }
    }

    pub async fn set_api_key(&self, key: ApiKey) {
        *self.api_key.write().await = Some(key);
    }

    pub async fn api_key(&self) -> Option<ApiKey> {
        self.api_key.read().await.clone()
    }

    #[must_use]
    pub fn presentation(&self) -> &dyn PresentationSink {
        self.presentation.as_ref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Arc::new(NullPresentation))
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}
