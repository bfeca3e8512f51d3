//! Local sentence encoder via Candle
//!
//! Loads a BERT-family sentence-transformers checkpoint from the
//! HuggingFace Hub and produces mean-pooled (optionally L2-normalized)
//! embeddings on the CPU.

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};

use crate::config::EmbeddingConfig;
use crate::embedding::EmbeddingProvider;
use crate::errors::{RagError, Result};

/// Loaded model, tokenizer and device; shared by blocking inference tasks
struct Encoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    normalize: bool,
}

/// Embedding engine backed by a local BERT model
#[derive(Clone)]
pub struct EmbeddingEngine {
    encoder: Arc<Encoder>,
    dimension: usize,
}

impl EmbeddingEngine {
    /// Download (first run only) and load the configured model.
    ///
    /// Blocking: call from a blocking context. Fails with a model error when
    /// the checkpoint cannot be fetched or its hidden size differs from
    /// `dimension`.
    pub fn load(config: &EmbeddingConfig, dimension: usize) -> Result<Self> {
        tracing::info!(model = %config.model_id, "Loading embeddings model");

        let encoder = Self::load_encoder(config)
            .map_err(|e| RagError::Model(format!("{}: {:#}", config.model_id, e)))?;

        let hidden = encoder.model_hidden_size;
        if hidden != dimension {
            return Err(RagError::Model(format!(
                "{} produces {}-dimensional vectors but the collection expects {}",
                config.model_id, hidden, dimension
            )));
        }

        tracing::info!(model = %config.model_id, dimension, "Embeddings model loaded");

        Ok(Self {
            encoder: Arc::new(encoder.encoder),
            dimension,
        })
    }

    fn load_encoder(config: &EmbeddingConfig) -> AnyResult<LoadedEncoder> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        let config_path = repo.get("config.json").context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json").context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        let bert_config: BertConfig =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // SAFETY: the safetensors file is owned by the hub cache and not
        // modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = BertModel::load(vb, &bert_config).context("Failed to create BERT model")?;

        Ok(LoadedEncoder {
            model_hidden_size: bert_config.hidden_size,
            encoder: Encoder {
                model,
                tokenizer,
                device,
                normalize: config.normalize,
            },
        })
    }
}

struct LoadedEncoder {
    model_hidden_size: usize,
    encoder: Encoder,
}

impl Encoder {
    /// Batched forward pass: tokenize, pad, run BERT, pool
    fn embed_batch(&self, texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();

        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let start = row * max_len;
            flat_ids[start..start + ids.len()].copy_from_slice(ids);
            flat_mask[start..start + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let mut pooled = mean_pool(&hidden, &attention_mask)?;
        if self.normalize {
            pooled = l2_normalize(&pooled)?;
        }

        Ok(pooled.to_vec2::<f32>()?)
    }
}

/// Mean pooling over the sequence axis, ignoring padded positions
fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask
        .unsqueeze(2)?
        .expand(embeddings.shape())?
        .to_dtype(embeddings.dtype())?;

    let summed = (embeddings * &mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    summed.broadcast_div(&counts)
}

/// Row-wise L2 normalization
fn l2_normalize(vectors: &Tensor) -> candle_core::Result<Tensor> {
    let norms = vectors
        .sqr()?
        .sum_keepdim(1)?
        .sqrt()?
        .clamp(1e-12, f64::MAX)?;
    vectors.broadcast_div(&norms)
}

#[async_trait]
impl EmbeddingProvider for EmbeddingEngine {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = Arc::clone(&self.encoder);
        let batch = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || encoder.embed_batch(&batch))
            .await
            .map_err(|e| RagError::Model(format!("Embedding task failed: {}", e)))?
            .map_err(|e| RagError::Model(format!("{:#}", e)))?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::Model(format!(
                "Encoder produced a {}-dimensional vector, expected {}",
                bad.len(),
                self.dimension
            )));
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
