use std::sync::Arc;

use meshcheck::{LivenessRegistry, ResultStore};

/// Shared observer state handed to every request handler.
pub struct AppState {
    pub registry: Arc<LivenessRegistry>,
    pub store: Arc<ResultStore>,
}
