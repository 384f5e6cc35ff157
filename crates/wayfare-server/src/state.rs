//! Shared application state.

use wayfare_core::WayfareConfig;
use wayfare_runtime::Assistant;

/// State accessible from all route handlers.
pub struct AppState {
    pub config: WayfareConfig,
    pub assistant: Assistant,
}
