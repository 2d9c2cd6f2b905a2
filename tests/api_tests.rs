use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use fragranceverse_api::api::{create_router, AppState};
use fragranceverse_api::config::Config;
use fragranceverse_api::services::providers::{
    GenerateRequest, GenerateResponse, GenerativeModel, InlineImage, OutputModality,
    ProviderError,
};

const RECOMMENDATIONS: &str = r#"{"recommendations":[
    {"name":"Baccarat Rouge 540","brand":"Maison Francis Kurkdjian","description":"Amber glow.","topNotes":["Saffron"],"middleNotes":["Amberwood"],"baseNotes":["Cedar"],"longevity":5,"sillage":5},
    {"name":"Mojave Ghost","brand":"Byredo","description":"Desert bloom.","topNotes":["Ambrette"],"middleNotes":["Magnolia"],"baseNotes":["Sandalwood"],"longevity":3,"sillage":2},
    {"name":"Gypsy Water","brand":"Byredo","description":"Pine and campfire.","topNotes":["Bergamot"],"middleNotes":["Incense"],"baseNotes":["Vanilla"],"longevity":3,"sillage":3}
]}"#;

/// Stands in for the generative service and counts how often it is reached
struct CountingModel {
    calls: AtomicUsize,
    reject_key: bool,
}

impl CountingModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reject_key: false,
        })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reject_key: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerativeModel for CountingModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_key {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "API key not valid. Please pass a valid API key.".to_string(),
            });
        }

        Ok(match request.modality {
            OutputModality::Json => GenerateResponse {
                text: Some(RECOMMENDATIONS.to_string()),
                images: Vec::new(),
            },
            OutputModality::Text => GenerateResponse {
                text: Some("A velvet whisper of smoke and rose.".to_string()),
                images: Vec::new(),
            },
            OutputModality::Image => GenerateResponse {
                text: None,
                images: vec![InlineImage {
                    mime_type: "image/png".to_string(),
                    data: b"hello".to_vec(),
                }],
            },
        })
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

async fn create_test_server_with(
    config: Config,
    model: Arc<CountingModel>,
) -> (TestServer, AppState) {
    let state = tokio_test::assert_ok!(AppState::in_memory(&config, model).await);
    let app = create_router(state.clone());
    (TestServer::new(app).unwrap(), state)
}

async fn create_test_server(model: Arc<CountingModel>) -> TestServer {
    create_test_server_with(Config::default(), model).await.0
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(CountingModel::new()).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(CountingModel::new()).await;
    let id = "6f1c2a9e-3b7d-4d55-9a43-0c1b2e3f4a5b";
    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static(id),
        )
        .await;
    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_search_catalog() {
    let server = create_test_server(CountingModel::new()).await;

    let all: Vec<Value> = server.get("/api/v1/perfumes").await.json();
    assert_eq!(all.len(), 13);

    let response = server
        .get("/api/v1/perfumes")
        .add_query_param("q", "VANILLA")
        .await;
    response.assert_status_ok();
    let hits: Vec<Value> = response.json();
    assert!(hits.iter().any(|p| p["name"] == "Tobacco Vanille"));
    assert!(hits.len() < all.len());
}

#[tokio::test]
async fn test_trending_families_and_notes() {
    let server = create_test_server(CountingModel::new()).await;

    let trending: Vec<Value> = server.get("/api/v1/perfumes/trending").await.json();
    assert_eq!(trending.len(), 4);

    let families: Vec<Value> = server.get("/api/v1/families").await.json();
    assert_eq!(families.len(), 6);
    assert!(!families[0]["perfumes"].as_array().unwrap().is_empty());

    let notes: Vec<String> = server.get("/api/v1/notes").await.json();
    assert_eq!(notes.len(), 18);
}

#[tokio::test]
async fn test_like_then_dislike_no5() {
    let server = create_test_server(CountingModel::new()).await;

    let response = server
        .post("/api/v1/perfumes/Chanel/No.%205/rating")
        .json(&json!({ "action": "like" }))
        .await;
    response.assert_status_ok();
    let liked: Value = response.json();
    assert_eq!(liked, json!({ "action": "like", "likes": 490, "dislikes": 52 }));

    let disliked: Value = server
        .post("/api/v1/perfumes/Chanel/No.%205/rating")
        .json(&json!({ "action": "dislike" }))
        .await
        .json();
    assert_eq!(disliked, json!({ "action": "dislike", "likes": 489, "dislikes": 53 }));

    let detail: Value = server.get("/api/v1/perfumes/Chanel/No.%205").await.json();
    assert_eq!(detail["user_action"], "dislike");
    assert_eq!(detail["perfume"]["dislikes"], 53);
}

#[tokio::test]
async fn test_unknown_perfume_is_not_found() {
    let server = create_test_server(CountingModel::new()).await;
    let response = server.get("/api/v1/perfumes/Nocturne/Midnight%20Oud").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recently_viewed_order() {
    let server = create_test_server(CountingModel::new()).await;

    server.get("/api/v1/perfumes/Chanel/No.%205").await.assert_status_ok();
    server.get("/api/v1/perfumes/Le%20Labo/Santal%2033").await.assert_status_ok();
    server.get("/api/v1/perfumes/Chanel/No.%205").await.assert_status_ok();

    let recent: Vec<Value> = server.get("/api/v1/recently-viewed").await.json();
    let names: Vec<&str> = recent.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["No. 5", "Santal 33"]);
}

#[tokio::test]
async fn test_wardrobe_shelves_are_exclusive() {
    let server = create_test_server(CountingModel::new()).await;
    let item = json!({ "brand": "Le Labo", "name": "Santal 33" });

    server
        .put("/api/v1/wardrobe/want")
        .json(&item)
        .await
        .assert_status_ok();
    server
        .put("/api/v1/wardrobe/own")
        .json(&item)
        .await
        .assert_status_ok();

    let wardrobe: Value = server.get("/api/v1/wardrobe").await.json();
    assert_eq!(wardrobe["own"].as_array().unwrap().len(), 1);
    assert!(wardrobe["want"].as_array().unwrap().is_empty());
    assert!(wardrobe["tried"].as_array().unwrap().is_empty());

    let detail: Value = server.get("/api/v1/perfumes/Le%20Labo/Santal%2033").await.json();
    assert_eq!(detail["shelf"], "own");

    server
        .put("/api/v1/wardrobe/borrowed")
        .json(&item)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reviews() {
    let server = create_test_server(CountingModel::new()).await;

    let response = server
        .post("/api/v1/perfumes/Chanel/No.%205/reviews")
        .json(&json!({ "rating": 5, "comment": "Timeless." }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let review: Value = response.json();
    assert_eq!(review["author"], "You");

    let detail: Value = server.get("/api/v1/perfumes/Chanel/No.%205").await.json();
    assert_eq!(detail["perfume"]["reviews"][0]["comment"], "Timeless.");

    server
        .post("/api/v1/perfumes/Chanel/No.%205/reviews")
        .json(&json!({ "rating": 9, "comment": "Too much" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_purchase_link() {
    let server = create_test_server(CountingModel::new()).await;
    let link: Value = server
        .get("/api/v1/perfumes/Chanel/No.%205/purchase-link")
        .await
        .json();
    assert_eq!(
        link["url"],
        "https://www.amazon.com/s?k=Chanel+No+5+Eau+de+Parfum&tag=chanelbeauty-21"
    );
}

#[tokio::test]
async fn test_mood_recommendation_is_cached() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    for _ in 0..2 {
        let response = server
            .post("/api/v1/recommendations/mood")
            .json(&json!({ "text": "A rainy afternoon in a library" }))
            .await;
        response.assert_status_ok();
        let perfumes: Vec<Value> = response.json();
        assert_eq!(perfumes.len(), 3);
        assert!(perfumes[0]["reviews"].as_array().unwrap().is_empty());
    }
    assert_eq!(model.calls(), 1);

    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["matchmaker"]["status"], "succeeded");
}

#[tokio::test]
async fn test_blank_inputs_never_reach_the_model() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    server
        .post("/api/v1/recommendations/mood")
        .json(&json!({ "text": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/v1/recommendations/notes")
        .json(&json!({ "notes": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/v1/recommendations/vibe")
        .json(&json!({ "data_url": "data:image/png;base64" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let enhanced: Value = server
        .post("/api/v1/community/enhance")
        .json(&json!({ "text": "" }))
        .await
        .json();
    assert_eq!(enhanced["text"], "");

    assert_eq!(model.calls(), 0);

    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["matchmaker"]["status"], "failed");
}

#[tokio::test]
async fn test_vibe_from_data_url_is_cached() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    for _ in 0..2 {
        server
            .post("/api/v1/recommendations/vibe")
            .json(&json!({ "data_url": "data:image/jpeg;base64,aGVsbG8=" }))
            .await
            .assert_status_ok();
    }
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_similar_items() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    server
        .get("/api/v1/perfumes/Byredo/Mojave%20Ghost/similar")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/api/v1/perfumes/Le%20Labo/Santal%2033/similar").await;
    response.assert_status_ok();
    let similar: Vec<Value> = response.json();
    assert_eq!(similar.len(), 3);

    server
        .get("/api/v1/perfumes/Le%20Labo/Santal%2033/similar")
        .await
        .assert_status_ok();
    assert_eq!(model.calls(), 1);

    // opening another detail view supersedes the panel
    server.get("/api/v1/perfumes/Chanel/No.%205").await.assert_status_ok();
    let session: Value = server.get("/api/v1/session").await.json();
    assert_eq!(session["similar"]["status"], "idle");
}

#[tokio::test]
async fn test_generated_image_is_stored() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    for _ in 0..2 {
        let image: Value = server
            .get("/api/v1/perfumes/Dior/J'adore/image")
            .await
            .json();
        assert_eq!(image["url"], "data:image/png;base64,aGVsbG8=");
    }
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_invalid_credential_is_reset_and_resupplied() {
    let config = Config {
        api_key: Some("stale-key".to_string()),
        ..Config::default()
    };
    let model = CountingModel::rejecting();
    let (server, state) = create_test_server_with(config, model.clone()).await;
    assert!(state.credentials.is_set());

    let response = server
        .post("/api/v1/recommendations/mood")
        .json(&json!({ "text": "Fresh linen" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["credential_reset"], true);
    assert!(!state.credentials.is_set());
    assert_eq!(model.calls(), 1);

    server
        .put("/api/v1/credential")
        .json(&json!({ "api_key": "fresh-key" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(state.credentials.get().as_deref(), Some("fresh-key"));
}

#[tokio::test]
async fn test_community_post_and_share() {
    let model = CountingModel::new();
    let (server, state) = create_test_server_with(Config::default(), model).await;

    let seeded: Vec<Value> = server.get("/api/v1/community/posts").await.json();
    assert_eq!(seeded.len(), 3);

    server
        .post("/api/v1/community/posts")
        .json(&json!({ "content": "  " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/community/posts")
        .json(&json!({ "content": "Santal 33 all week." }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let post: Value = response.json();

    let feed: Vec<Value> = server.get("/api/v1/community/posts").await.json();
    assert_eq!(feed[0]["id"], post["id"]);

    let share: Value = server
        .post(&format!(
            "/api/v1/community/posts/{}/share",
            post["id"].as_str().unwrap()
        ))
        .await
        .json();
    assert_eq!(share["outcome"], "copied");
    assert_eq!(share["payload"]["title"], "A post by You on FragranceVerse");
    assert_eq!(
        state.clipboard.contents().await.as_deref(),
        Some("A post by You on FragranceVerse\n\n\"Santal 33 all week.\"")
    );
}

#[tokio::test]
async fn test_enhance_post() {
    let model = CountingModel::new();
    let server = create_test_server(model.clone()).await;

    let response = server
        .post("/api/v1/community/enhance")
        .json(&json!({ "text": "smoky and nice" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["text"], "A velvet whisper of smoke and rose.");
    assert_eq!(model.calls(), 1);
}
