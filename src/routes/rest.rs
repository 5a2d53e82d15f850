//! `/rest/*` and `/query`. Login is mounted beside the gated routes; its static
//! path wins over `/rest/:table/:id`.

use crate::auth::require_token;
use crate::handlers::{collection, login, member, raw_query};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{any, post},
    Router,
};

pub fn rest_routes(state: AppState) -> Router {
    // `layer`, not `route_layer`: a 405 from an unsupported verb must still
    // come after the gate.
    let gated = Router::new()
        .route("/rest/:table", any(collection))
        .route("/rest/:table/:id", any(member))
        .route("/query", post(raw_query))
        .layer(from_fn_with_state(state.gate.clone(), require_token));

    Router::new()
        .route("/rest/auth/login", post(login))
        .merge(gated)
        .with_state(state)
}
