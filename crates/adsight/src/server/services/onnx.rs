//! Sentence embeddings from a local ONNX model
//!
//! The model and tokenizer are fetched from the Hugging Face hub on first use
//! and cached by `hf-hub`. Output is mean pooled over real tokens and scaled
//! to unit length, so squared L2 distances stay within [0, 4].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use ort::{session::Session, value::Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};

use super::embeddings::{masked_mean_pool, normalize, Embedder};

const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";

/// Longer inputs are truncated to this many tokens
const MAX_SEQUENCE_LENGTH: usize = 256;

struct LoadedModel {
  session: Session,
  tokenizer: Tokenizer,
}

pub struct OnnxEmbedder {
  model: Arc<Mutex<LoadedModel>>,
  model_name: String,
}

impl OnnxEmbedder {
  pub async fn load(model_name: &str) -> Result<Self> {
    tracing::info!(model = model_name, "Loading ONNX embedding model");

    let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
    let repo = api.model(model_name.to_string());

    let tokenizer_file =
      repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;
    let model_path =
      repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;

    let mut tokenizer =
      Tokenizer::from_file(tokenizer_file).map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
    tokenizer
      .with_truncation(Some(TruncationParams { max_length: MAX_SEQUENCE_LENGTH, ..Default::default() }))
      .map_err(|e| anyhow!("Failed to configure tokenizer: {}", e))?;

    let session = Session::builder()?.commit_from_file(model_path)?;

    tracing::info!(model = model_name, "ONNX embedding model ready");
    Ok(Self {
      model: Arc::new(Mutex::new(LoadedModel { session, tokenizer })),
      model_name: model_name.to_string(),
    })
  }
}

fn embed_blocking(model: &Mutex<LoadedModel>, text: &str) -> Result<Vec<f32>> {
  let mut guard = model.lock().map_err(|_| anyhow!("Failed to lock embedding model"))?;
  let LoadedModel { session, tokenizer } = &mut *guard;

  let encoding =
    tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
  let input_names: Vec<String> = session.inputs.iter().map(|input| input.name.to_string()).collect();

  let mut inputs: HashMap<String, Value> = HashMap::new();
  inputs.insert("input_ids".to_string(), to_tensor(encoding.get_ids())?);
  inputs.insert("attention_mask".to_string(), to_tensor(encoding.get_attention_mask())?);
  if input_names.iter().any(|name| name == "token_type_ids") {
    inputs.insert("token_type_ids".to_string(), to_tensor(encoding.get_type_ids())?);
  }

  let outputs = session.run(inputs)?;
  let hidden = outputs
    .get("last_hidden_state")
    .or_else(|| outputs.get("0"))
    .ok_or_else(|| anyhow!("No output found from model - expected 'last_hidden_state' or '0'"))?;
  let (shape, data) = hidden.try_extract_tensor::<f32>()?;

  let mut embedding = masked_mean_pool(shape.as_ref(), data, encoding.get_attention_mask())?;
  normalize(&mut embedding);
  Ok(embedding)
}

fn to_tensor(values: &[u32]) -> Result<Value> {
  let ids: Vec<i64> = values.iter().map(|&v| i64::from(v)).collect();
  let array: Array2<i64> = Array2::from_shape_vec((1, ids.len()), ids)?;
  Ok(Value::from_array(array)?.into())
}

#[async_trait]
impl Embedder for OnnxEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let model = self.model.clone();
    let text = text.to_string();
    tokio::task::spawn_blocking(move || embed_blocking(&model, &text))
      .await
      .map_err(|e| anyhow!("Embedding task failed: {}", e))?
  }

  fn version(&self) -> String {
    format!("onnx:{}", self.model_name)
  }
}
