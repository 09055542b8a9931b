use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use adsight::cli::client::{AdsightClient, ClientConfig};
use adsight::server::routing::{create_router, AppState};
use adsight::server::services::agent::AgentService;
use adsight::server::services::embeddings::{Embedder, OllamaEmbedder};
use adsight::server::services::llm::{LanguageModel, OllamaClient};
use adsight::server::services::memory_store::InMemoryVectorDatabase;
use adsight::server::services::similarity::SimilarityStore;

const ADS_CSV: &str = "platform,creative_type,impressions,clicks\nGoogle,Search,100,4\nGoogle,Search,300,8\n";

async fn serve(app: Router) -> SocketAddr {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  addr
}

/// Stands in for the Ollama runtime
fn fake_ollama() -> Router {
  Router::new()
    .route(
      "/api/generate",
      post(|Json(body): Json<Value>| async move {
        assert_eq!(body["stream"], false);
        let model = body["model"].as_str().unwrap_or_default().to_string();
        Json(json!({ "model": model, "response": "- Raise bids on converting keywords", "done": true }))
      }),
    )
    .route(
      "/api/embeddings",
      post(|Json(body): Json<Value>| async move {
        let prompt = body["prompt"].as_str().unwrap_or_default();
        let length = prompt.len() as f32;
        Json(json!({ "embedding": [1.0, length / 1000.0, 0.5] }))
      }),
    )
}

fn client_for(addr: SocketAddr) -> AdsightClient {
  AdsightClient::with_config(ClientConfig { base_url: format!("http://{addr}"), timeout_secs: 10 }).unwrap()
}

#[tokio::test]
async fn test_ollama_clients_speak_the_runtime_api() {
  let ollama = serve(fake_ollama()).await;
  let base_url = format!("http://{ollama}");

  let model = OllamaClient::new(&base_url, "vicuna");
  let answer = model.generate("hello").await.unwrap();
  assert_eq!(answer, "- Raise bids on converting keywords");
  assert_eq!(model.model_name(), "vicuna");

  let embedder = OllamaEmbedder::new(&base_url, "nomic-embed-text", Duration::from_secs(5)).unwrap();
  let embedding = embedder.embed("abcd").await.unwrap();
  assert_eq!(embedding.len(), 3);
  assert_eq!(embedder.version(), "ollama:nomic-embed-text");
}

#[tokio::test]
async fn test_unreachable_model_is_unavailable() {
  let model = OllamaClient::new("http://127.0.0.1:9", "vicuna");
  let err = model.generate("hello").await.unwrap_err();
  assert_eq!(err.key(), "model_unavailable");
}

#[tokio::test]
async fn test_client_runs_agent_end_to_end() {
  let ollama = serve(fake_ollama()).await;
  let base_url = format!("http://{ollama}");

  let embedder = Arc::new(OllamaEmbedder::new(&base_url, "nomic-embed-text", Duration::from_secs(5)).unwrap());
  let store = Arc::new(SimilarityStore::new(embedder, Arc::new(InMemoryVectorDatabase::new()), 0.2));
  let model = Arc::new(OllamaClient::new(&base_url, "vicuna"));
  let state = Arc::new(AppState::new(AgentService::new(store, model, Duration::from_secs(5))));
  let server = serve(create_router(state, 1024 * 1024)).await;

  let client = client_for(server);
  client.health_check().await.unwrap();

  let report = client.run_agent("ads.csv", ADS_CSV.as_bytes().to_vec()).await.unwrap();
  assert_eq!(report.num_rows, 2);
  assert_eq!(report.columns, vec!["platform", "creative_type", "impressions", "clicks"]);
  assert_eq!(report.summary.get("clicks").unwrap().max, 8.0);
  assert_eq!(report.insights, "- Raise bids on converting keywords");
  assert!(!report.rag);
  assert!(report.kg_tip.starts_with("Best practice for Google Search ads:"));

  let again = client.run_agent("ads.csv", ADS_CSV.as_bytes().to_vec()).await.unwrap();
  assert!(again.rag);

  let status = client.status().await.unwrap();
  assert_eq!(status.stored_insights, 1);
  assert_eq!(status.model, "vicuna");
}

#[tokio::test]
async fn test_client_surfaces_backend_error_text() {
  let ollama = serve(fake_ollama()).await;
  let model = Arc::new(OllamaClient::new(&format!("http://{ollama}"), "vicuna"));
  let state = Arc::new(AppState::new(AgentService::new(
    Arc::new(SimilarityStore::in_memory(0.2, 64)),
    model,
    Duration::from_secs(5),
  )));
  let server = serve(create_router(state, 1024 * 1024)).await;

  let err = client_for(server).run_agent("bad.csv", b"a,b\n1,2,3\n".to_vec()).await.unwrap_err();
  let message = err.to_string();
  assert!(message.starts_with("Error from backend:"), "{message}");
  assert!(message.contains("not a parseable table"), "{message}");
}
