use std::sync::Arc;
use seithi_core::ArticleStorage;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self { storage }
    }
}
