use std::sync::Arc;

use crate::config::Config;
use crate::relay::Relay;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    /// `None` until the selected strategy has its credentials.
    pub relay: Option<Arc<dyn Relay>>,
}
