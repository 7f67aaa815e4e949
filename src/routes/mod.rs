pub mod submit;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

pub fn relay_routes() -> Router<SharedState> {
    Router::new().route("/api/submit", get(submit::health).post(submit::submit))
}
