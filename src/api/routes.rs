use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/perfumes", get(handlers::search_perfumes))
        .route("/perfumes/trending", get(handlers::get_trending))
        .route("/families", get(handlers::get_families))
        .route("/notes", get(handlers::get_notes))
        // Detail view
        .route("/perfumes/:brand/:name", get(handlers::get_perfume))
        .route("/perfumes/:brand/:name/rating", post(handlers::rate_perfume))
        .route("/perfumes/:brand/:name/reviews", post(handlers::add_review))
        .route("/perfumes/:brand/:name/image", get(handlers::get_perfume_image))
        .route("/perfumes/:brand/:name/similar", get(handlers::get_similar))
        .route(
            "/perfumes/:brand/:name/purchase-link",
            get(handlers::get_purchase_link),
        )
        .route("/recently-viewed", get(handlers::get_recently_viewed))
        // Wardrobe
        .route("/wardrobe", get(handlers::get_wardrobe))
        .route("/wardrobe/:shelf", put(handlers::shelve_perfume))
        // Matchmaker
        .route("/recommendations/mood", post(handlers::recommend_by_mood))
        .route("/recommendations/notes", post(handlers::recommend_by_notes))
        .route("/recommendations/vibe", post(handlers::recommend_by_vibe))
        .route("/session", get(handlers::get_session))
        // Community
        .route(
            "/community/posts",
            get(handlers::get_posts).post(handlers::create_post),
        )
        .route("/community/posts/:id/share", post(handlers::share_post))
        .route("/community/enhance", post(handlers::enhance_post))
        .route("/credential", put(handlers::put_credential))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::providers::MockGenerativeModel;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn router() -> Router {
        let state = AppState::in_memory(&Config::default(), Arc::new(MockGenerativeModel::new()))
            .await
            .unwrap();
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = router()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router()
            .await
            .oneshot(Request::get("/api/v1/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
