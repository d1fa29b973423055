pub mod error;
pub mod middleware;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use threadline_core::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Every HTTP route the engagement service exposes. State is supplied by the
/// caller with `.with_state`.
pub fn build_router() -> Router<AppState> {
    let api = Router::new()
        .route("/posts", post(routes::posts::create_post))
        .route("/posts/{post_id}", get(routes::posts::get_post))
        .route("/posts/{post_id}/vote", post(routes::posts::vote_post))
        .route("/posts/{post_id}/save", post(routes::posts::toggle_save))
        .route(
            "/posts/{post_id}/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/comments/{comment_id}/vote",
            post(routes::comments::vote_comment),
        )
        .route("/users/@me/votes", get(routes::users::get_my_votes))
        .route("/users/@me/saved", get(routes::posts::list_saved))
        .route("/polls", post(routes::polls::create_poll))
        .route("/polls/{poll_id}", get(routes::polls::get_poll))
        .route("/polls/{poll_id}/votes", post(routes::polls::cast_ballot))
        .route("/metrics", get(routes::health::metrics));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
