use std::sync::Arc;

use toolkit_core::ToolkitConfig;

/// Router state carrying the toolkit configuration.
///
/// Applications with their own state expose it through
/// `impl FromRef<AppState> for ToolkitState`.
#[derive(Debug)]
pub struct ToolkitState {
    pub config: Arc<ToolkitConfig>,
}

impl Clone for ToolkitState {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl ToolkitState {
    pub fn new(config: ToolkitConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
