//! Route table.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Builds the complete router with every route and the request trace
/// layer, with `state` applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(account_routes())
        .merge(game_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/accounts/signup", post(handler::signup))
        .route("/api/accounts/signin", post(handler::signin))
        .route("/api/accounts/signout", get(handler::signout).post(handler::signout))
}

fn game_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/games",
            get(handler::list_games).post(handler::create_game),
        )
        .route(
            "/api/games/",
            get(handler::list_games).post(handler::create_game),
        )
        .route(
            "/api/games/{id}",
            get(handler::get_game)
                .post(handler::update_game)
                .delete(handler::delete_game),
        )
        .route("/api/games/{id}/long", get(handler::wait_game))
        .route("/api/games/{id}/wait", get(handler::wait_game))
}
