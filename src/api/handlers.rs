use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ImageInput, Perfume, PerfumeKey, Post, Review, ScentFamily, SharePayload, Shelf, UserAction,
};
use crate::services::{
    share_with_fallback, OperationState, RatingOutcome, ResolvedImage, ShareOutcome,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct PerfumeDetailResponse {
    pub perfume: Perfume,
    pub user_action: Option<UserAction>,
    pub shelf: Option<Shelf>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub action: UserAction,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseLinkResponse {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WardrobeResponse {
    pub own: Vec<Perfume>,
    pub want: Vec<Perfume>,
    pub tried: Vec<Perfume>,
}

#[derive(Debug, Deserialize)]
pub struct ShelveRequest {
    pub brand: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: Vec<String>,
}

/// Either a data URL or raw base64 with its MIME type
#[derive(Debug, Deserialize)]
pub struct VibeRequest {
    pub data_url: Option<String>,
    pub image_base64: Option<String>,
    pub mime_type: Option<String>,
}

impl VibeRequest {
    fn into_image(self) -> AppResult<ImageInput> {
        let image = match (self.data_url, self.image_base64, self.mime_type) {
            (Some(url), _, _) => ImageInput::from_data_url(&url),
            (None, Some(data), Some(mime)) => ImageInput::from_base64(&data, &mime),
            _ => {
                return Err(AppError::Validation(
                    "Please upload a photo to match its vibe.".to_string(),
                ))
            }
        };
        image.map_err(AppError::Validation)
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub matchmaker: OperationState<Vec<Perfume>>,
    pub similar: OperationState<Vec<Perfume>>,
    pub credential_configured: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub outcome: ShareOutcome,
    pub payload: SharePayload,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Search the catalog by name, brand or note
pub async fn search_perfumes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Perfume>> {
    let inner = state.inner.read().await;
    Json(inner.catalog.search(&query.q))
}

pub async fn get_trending(State(state): State<AppState>) -> Json<Vec<Perfume>> {
    let inner = state.inner.read().await;
    Json(inner.catalog.trending())
}

pub async fn get_families(State(state): State<AppState>) -> Json<Vec<ScentFamily>> {
    let inner = state.inner.read().await;
    Json(inner.catalog.families())
}

pub async fn get_notes(State(state): State<AppState>) -> Json<Vec<String>> {
    let inner = state.inner.read().await;
    Json(inner.catalog.common_notes().to_vec())
}

/// Open the detail view of one item
///
/// Records the view and supersedes any similar-items search started from the
/// previously opened item.
pub async fn get_perfume(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
) -> AppResult<Json<PerfumeDetailResponse>> {
    let key = PerfumeKey::new(brand, name);
    let response = {
        let inner = state.inner.read().await;
        PerfumeDetailResponse {
            perfume: inner.catalog.find(&key)?.clone(),
            user_action: inner.catalog.user_action(&key),
            shelf: inner.wardrobe.shelf_of(&key),
        }
    };

    state.similar.cancel().await;
    state.recently_viewed.record(key).await;

    Ok(Json(response))
}

/// Like or dislike an item; repeating the recorded action clears it
pub async fn rate_perfume(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<RatingOutcome>> {
    let key = PerfumeKey::new(brand, name);
    let mut inner = state.inner.write().await;
    let outcome = inner.catalog.rate(&key, request.action)?;
    Ok(Json(outcome))
}

pub async fn add_review(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let key = PerfumeKey::new(brand, name);
    let today = Utc::now().date_naive();
    let mut inner = state.inner.write().await;
    let review = inner
        .catalog
        .add_review(&key, request.rating, &request.comment, today)?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Resolve the artwork for an item
pub async fn get_perfume_image(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
) -> AppResult<Json<ResolvedImage>> {
    let key = PerfumeKey::new(brand, name);
    let perfume = {
        let inner = state.inner.read().await;
        inner.catalog.find(&key)?.clone()
    };

    let resolved = state.images.resolve(&perfume).await.map_err(AppError::from);
    Ok(Json(state.check_credential(resolved)?))
}

pub async fn get_similar(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
) -> AppResult<Json<Vec<Perfume>>> {
    let key = PerfumeKey::new(brand, name);
    let perfume = {
        let inner = state.inner.read().await;
        inner.catalog.find(&key)?.clone()
    };

    let token = state.similar.begin().await;
    let result = state.recommendations.recommend_similar(&perfume).await;
    let similar = state.finish(&state.similar, token, result).await?;
    Ok(Json(similar))
}

pub async fn get_purchase_link(
    State(state): State<AppState>,
    Path((brand, name)): Path<(String, String)>,
) -> AppResult<Json<PurchaseLinkResponse>> {
    let key = PerfumeKey::new(brand, name);
    let inner = state.inner.read().await;
    let url = inner
        .catalog
        .purchase_link(&key, &state.default_affiliate_tag)?;
    Ok(Json(PurchaseLinkResponse { url }))
}

/// Recently viewed items, most recent first
pub async fn get_recently_viewed(State(state): State<AppState>) -> Json<Vec<Perfume>> {
    let keys = state.recently_viewed.keys().await;
    let inner = state.inner.read().await;
    let perfumes = keys
        .iter()
        .filter_map(|key| inner.catalog.find(key).ok())
        .cloned()
        .collect();
    Json(perfumes)
}

pub async fn get_wardrobe(State(state): State<AppState>) -> Json<WardrobeResponse> {
    let inner = state.inner.read().await;
    let resolve = |shelf: Shelf| -> Vec<Perfume> {
        inner
            .wardrobe
            .shelf(shelf)
            .iter()
            .filter_map(|key| inner.catalog.find(key).ok())
            .cloned()
            .collect()
    };
    Json(WardrobeResponse {
        own: resolve(Shelf::Own),
        want: resolve(Shelf::Want),
        tried: resolve(Shelf::Tried),
    })
}

/// Move an item onto a shelf, off any other shelf
pub async fn shelve_perfume(
    State(state): State<AppState>,
    Path(shelf): Path<String>,
    Json(request): Json<ShelveRequest>,
) -> AppResult<StatusCode> {
    let shelf: Shelf = shelf.parse().map_err(AppError::Validation)?;
    let key = PerfumeKey::new(request.brand, request.name);

    let mut inner = state.inner.write().await;
    inner.catalog.find(&key)?;
    inner.wardrobe.move_to(key, shelf);
    Ok(StatusCode::OK)
}

pub async fn recommend_by_mood(
    State(state): State<AppState>,
    Json(request): Json<MoodRequest>,
) -> AppResult<Json<Vec<Perfume>>> {
    let token = state.matchmaker.begin().await;
    let result = state.recommendations.recommend_by_mood(&request.text).await;
    Ok(Json(state.finish(&state.matchmaker, token, result).await?))
}

pub async fn recommend_by_notes(
    State(state): State<AppState>,
    Json(request): Json<NotesRequest>,
) -> AppResult<Json<Vec<Perfume>>> {
    let token = state.matchmaker.begin().await;
    let result = state.recommendations.recommend_by_notes(&request.notes).await;
    Ok(Json(state.finish(&state.matchmaker, token, result).await?))
}

pub async fn recommend_by_vibe(
    State(state): State<AppState>,
    Json(request): Json<VibeRequest>,
) -> AppResult<Json<Vec<Perfume>>> {
    let token = state.matchmaker.begin().await;
    let result = match request.into_image() {
        Ok(image) => state.recommendations.recommend_by_vibe(&image).await,
        Err(e) => Err(e),
    };
    Ok(Json(state.finish(&state.matchmaker, token, result).await?))
}

/// Current state of the tracked operations
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        matchmaker: state.matchmaker.state().await,
        similar: state.similar.state().await,
        credential_configured: state.credentials.is_set(),
    })
}

pub async fn get_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    let inner = state.inner.read().await;
    Json(inner.feed.posts().to_vec())
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let mut inner = state.inner.write().await;
    let post = inner.feed.create_post(&request.content)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Share a post, falling back to the session clipboard
pub async fn share_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShareResponse>> {
    let url = format!("{}/api/v1/community/posts", state.public_url);
    let payload = {
        let inner = state.inner.read().await;
        inner.feed.share_payload(id, &url)?
    };

    let outcome = share_with_fallback(
        &payload,
        state.native_share.as_deref(),
        state.clipboard.as_ref(),
    )
    .await?;

    Ok(Json(ShareResponse { outcome, payload }))
}

pub async fn enhance_post(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> AppResult<Json<EnhanceResponse>> {
    let result = state.recommendations.enhance_text(&request.text).await;
    let text = state.check_credential(result)?;
    Ok(Json(EnhanceResponse { text }))
}

/// Supply a new credential after the previous one was rejected
pub async fn put_credential(
    State(state): State<AppState>,
    Json(request): Json<CredentialRequest>,
) -> AppResult<StatusCode> {
    if request.api_key.trim().is_empty() {
        return Err(AppError::Validation("API key must not be empty.".to_string()));
    }
    state.credentials.set(request.api_key);
    Ok(StatusCode::NO_CONTENT)
}
