use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the axum handlers. It holds the use-case service only;
/// adapters stay behind the service's ports.
#[derive(Clone)]
pub struct HttpState {
    pub detection: Arc<DetectionService>,
    pub class_names: Vec<String>,
}
