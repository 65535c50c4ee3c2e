use std::{path::PathBuf, sync::Arc};

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::ApiBuilder};
use parking_lot::RwLock;
use tokenizers::{Tokenizer, TruncationParams};

use crate::{
   config::{Config, debug_embed, debug_models, model_dir},
   embed::{Embedder, normalize_l2},
   error::{Error, Result},
};

const MODEL_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];

/// BERT sentence encoder with attention-masked mean pooling.
///
/// Model files are fetched from the Hugging Face hub and loaded on first use.
/// Clones share the loaded model.
#[derive(Clone)]
pub struct CandleEmbedder {
   model:       Arc<RwLock<Option<ModelState>>>,
   device:      Device,
   model_id:    String,
   max_seq_len: usize,
   batch_size:  usize,
}

struct ModelState {
   bert:      BertModel,
   tokenizer: Tokenizer,
}

impl CandleEmbedder {
   pub fn new(config: &Config) -> Result<Self> {
      Ok(Self {
         model:       Arc::new(RwLock::new(None)),
         device:      Self::select_device(),
         model_id:    config.model.clone(),
         max_seq_len: config.max_seq_len,
         batch_size:  config.batch_size.max(1),
      })
   }

   fn select_device() -> Device {
      let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
      if device.is_cpu() && candle_core::utils::metal_is_available() {
         return Device::new_metal(0).unwrap_or(Device::Cpu);
      }
      device
   }

   fn ensure_model_loaded(&self) -> Result<()> {
      if self.model.read().is_some() {
         return Ok(());
      }

      let mut guard = self.model.write();
      if guard.is_some() {
         return Ok(());
      }

      let (bert, tokenizer) = self.load_model()?;
      *guard = Some(ModelState { bert, tokenizer });
      Ok(())
   }

   fn load_model(&self) -> Result<(BertModel, Tokenizer)> {
      let model_path = Self::download_model(&self.model_id)?;

      if debug_models() {
         tracing::info!("loading model from {:?}, device: {:?}", model_path, self.device);
      }

      let mut tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
         .map_err(|e| Error::Encoding(format!("failed to load tokenizer: {e}")))?;
      tokenizer.with_padding(None);
      tokenizer
         .with_truncation(Some(TruncationParams {
            max_length: self.max_seq_len,
            ..Default::default()
         }))
         .map_err(|e| Error::Encoding(format!("failed to configure truncation: {e}")))?;

      let config_path = model_path.join("config.json");
      let config: BertConfig = serde_json::from_str(
         &std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Encoding(format!("failed to read config: {e}")))?,
      )
      .map_err(|e| Error::Encoding(format!("failed to parse config: {e}")))?;

      let weights_path = model_path.join("model.safetensors");
      // SAFETY: the safetensors file lives in the hub cache and is not modified
      // while mapped.
      let vb = unsafe {
         VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &self.device)
            .map_err(|e| Error::Encoding(format!("failed to load weights: {e}")))?
      };

      let bert = BertModel::load(vb, &config)
         .map_err(|e| Error::Encoding(format!("failed to load model: {e}")))?;

      if debug_models() {
         tracing::info!("model loaded successfully");
      }

      Ok((bert, tokenizer))
   }

   /// Fetches the model files into the local cache, returning their directory.
   pub fn download_model(model_id: &str) -> Result<PathBuf> {
      let cache_dir = model_dir();
      std::fs::create_dir_all(&cache_dir)
         .map_err(|e| Error::Encoding(format!("failed to create model cache: {e}")))?;

      let api = ApiBuilder::new()
         .with_cache_dir(cache_dir)
         .build()
         .map_err(|e| Error::Encoding(format!("failed to initialize hf_hub API: {e}")))?;

      let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

      let mut paths = Vec::with_capacity(MODEL_FILES.len());
      for filename in MODEL_FILES {
         let path = repo.get(filename).map_err(|e| {
            Error::Encoding(format!(
               "failed to download {filename}: {e}. Run 'course-search setup' to download models."
            ))
         })?;
         paths.push(path);
      }

      paths[0]
         .parent()
         .ok_or_else(|| Error::Encoding("invalid model path".to_string()))
         .map(|p| p.to_path_buf())
   }

   fn tokenize_batch(&self, texts: &[String]) -> Result<Vec<(Vec<u32>, Vec<u32>)>> {
      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Encoding("model not loaded".to_string()))?;

      texts
         .iter()
         .map(|text| {
            let encoding = state
               .tokenizer
               .encode(text.as_str(), true)
               .map_err(|e| Error::Encoding(format!("tokenization failed: {e}")))?;

            Ok(truncate_tokens(
               encoding.get_ids().to_vec(),
               encoding.get_attention_mask().to_vec(),
               self.max_seq_len,
            ))
         })
         .collect()
   }

   fn compute_embeddings_batch(&self, tokenized: &[(Vec<u32>, Vec<u32>)]) -> Result<Vec<Vec<f32>>> {
      if tokenized.is_empty() {
         return Ok(Vec::new());
      }

      let batch_size = tokenized.len();
      let (all_token_ids, all_attention_masks, max_len) = pad_batch(tokenized);

      let token_ids_tensor = Tensor::new(&all_token_ids[..], &self.device)
         .map_err(|e| Error::Encoding(format!("failed to create tensor: {e}")))?
         .reshape(&[batch_size, max_len])
         .map_err(|e| Error::Encoding(format!("failed to reshape: {e}")))?;

      let attention_mask_tensor = Tensor::new(&all_attention_masks[..], &self.device)
         .map_err(|e| Error::Encoding(format!("failed to create mask: {e}")))?
         .reshape(&[batch_size, max_len])
         .map_err(|e| Error::Encoding(format!("failed to reshape: {e}")))?;

      let token_type_ids = token_ids_tensor
         .zeros_like()
         .map_err(|e| Error::Encoding(format!("failed to create token types: {e}")))?;

      let model_state = self.model.read();
      let state = model_state
         .as_ref()
         .ok_or_else(|| Error::Encoding("model not loaded".to_string()))?;

      let hidden = state
         .bert
         .forward(&token_ids_tensor, &token_type_ids, Some(&attention_mask_tensor))
         .map_err(|e| Error::Encoding(format!("forward pass failed: {e}")))?;

      let pooled = mean_pool(&hidden, &attention_mask_tensor)
         .map_err(|e| Error::Encoding(format!("mean pooling failed: {e}")))?;

      let mut results: Vec<Vec<f32>> = pooled
         .to_vec2()
         .map_err(|e| Error::Encoding(format!("failed to convert to vec: {e}")))?;

      for embedding in &mut results {
         normalize_l2(embedding);
      }

      Ok(results)
   }

   fn encode_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      if texts.is_empty() {
         return Ok(Vec::new());
      }

      self.ensure_model_loaded()?;

      if debug_embed() {
         tracing::info!("encoding {} texts in batches of {}", texts.len(), self.batch_size);
      }

      let mut results = Vec::with_capacity(texts.len());
      for batch in texts.chunks(self.batch_size) {
         let tokenized = self.tokenize_batch(batch)?;
         results.extend(self.compute_embeddings_batch(&tokenized)?);
      }

      Ok(results)
   }
}

/// Cuts ids and mask to at most `max_len` tokens.
fn truncate_tokens(
   mut token_ids: Vec<u32>,
   mut attention_mask: Vec<u32>,
   max_len: usize,
) -> (Vec<u32>, Vec<u32>) {
   token_ids.truncate(max_len);
   attention_mask.truncate(max_len);
   (token_ids, attention_mask)
}

/// Right-pads every row to the longest one in the batch.
///
/// Returns flattened `[batch, width]` ids and mask plus `width`. Padding uses
/// id 0 with mask 0.
pub(crate) fn pad_batch(tokenized: &[(Vec<u32>, Vec<u32>)]) -> (Vec<u32>, Vec<u32>, usize) {
   let width = tokenized
      .iter()
      .map(|(ids, _)| ids.len())
      .max()
      .unwrap_or(0);

   let mut all_token_ids = Vec::with_capacity(tokenized.len() * width);
   let mut all_attention_masks = Vec::with_capacity(tokenized.len() * width);

   for (token_ids, attention_mask) in tokenized {
      all_token_ids.extend(token_ids);
      all_token_ids.resize(all_token_ids.len() + width - token_ids.len(), 0);

      all_attention_masks.extend(attention_mask);
      all_attention_masks.resize(all_attention_masks.len() + width - attention_mask.len(), 0);
   }

   (all_token_ids, all_attention_masks, width)
}

/// Averages token states over the positions where `mask` is set.
///
/// `hidden` is `[batch, seq, dim]`, `mask` is `[batch, seq]`; the result is
/// `[batch, dim]`. Padding positions contribute neither to the sum nor to the
/// token count.
pub(crate) fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
   let mask = mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
   let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
   let counts = mask.sum(1)?.maximum(1e-9)?;
   summed.broadcast_div(&counts)
}

#[async_trait::async_trait]
impl Embedder for CandleEmbedder {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      // Model download and inference block, so they run off the async workers.
      let embedder = self.clone();
      let texts = texts.to_vec();
      tokio::task::spawn_blocking(move || embedder.encode_blocking(&texts))
         .await
         .map_err(|e| Error::Encoding(format!("embedding task failed: {e}")))?
   }

   fn is_ready(&self) -> bool {
      self.model.read().is_some()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_mean_pool_ignores_padding() {
      let hidden = Tensor::new(
         &[[[1f32, 2.0], [3.0, 4.0], [100.0, 100.0]], [[5.0, 5.0], [7.0, 9.0], [9.0, 1.0]]],
         &Device::Cpu,
      )
      .unwrap();
      let mask = Tensor::new(&[[1u32, 1, 0], [1, 1, 1]], &Device::Cpu).unwrap();

      let pooled: Vec<Vec<f32>> = mean_pool(&hidden, &mask).unwrap().to_vec2().unwrap();

      assert_eq!(pooled.len(), 2);
      assert!((pooled[0][0] - 2.0).abs() < 1e-6);
      assert!((pooled[0][1] - 3.0).abs() < 1e-6);
      assert!((pooled[1][0] - 7.0).abs() < 1e-6);
      assert!((pooled[1][1] - 5.0).abs() < 1e-6);
   }

   #[test]
   fn test_mean_pool_all_masked_is_zero() {
      let hidden = Tensor::new(&[[[4f32, -4.0], [2.0, 2.0]]], &Device::Cpu).unwrap();
      let mask = Tensor::new(&[[0u32, 0]], &Device::Cpu).unwrap();

      let pooled: Vec<Vec<f32>> = mean_pool(&hidden, &mask).unwrap().to_vec2().unwrap();
      assert_eq!(pooled, vec![vec![0.0, 0.0]]);
   }

   #[test]
   fn test_new_is_lazy() {
      let embedder = CandleEmbedder::new(&Config::default()).unwrap();
      assert!(!embedder.is_ready());
   }

   #[tokio::test]
   async fn test_encode_empty_batch_runs_off_runtime_without_loading() {
      let embedder = CandleEmbedder::new(&Config::default()).unwrap();

      let vectors = embedder.encode(&[]).await.unwrap();

      assert!(vectors.is_empty());
      assert!(!embedder.is_ready());
   }

   #[test]
   fn test_pad_batch_right_pads_ragged_rows() {
      let tokenized = vec![
         (vec![101, 7, 102], vec![1, 1, 1]),
         (vec![101, 102], vec![1, 1]),
         (vec![101, 5, 6, 8, 102], vec![1, 1, 1, 1, 1]),
      ];

      let (ids, mask, width) = pad_batch(&tokenized);

      assert_eq!(width, 5);
      assert_eq!(ids.len(), 15);
      assert_eq!(mask.len(), 15);
      assert_eq!(&ids[0..5], &[101, 7, 102, 0, 0]);
      assert_eq!(&mask[0..5], &[1, 1, 1, 0, 0]);
      assert_eq!(&ids[5..10], &[101, 102, 0, 0, 0]);
      assert_eq!(&mask[5..10], &[1, 1, 0, 0, 0]);
      assert_eq!(&ids[10..15], &[101, 5, 6, 8, 102]);
      assert_eq!(&mask[10..15], &[1, 1, 1, 1, 1]);
   }

   #[test]
   fn test_pad_batch_empty() {
      let (ids, mask, width) = pad_batch(&[]);
      assert!(ids.is_empty());
      assert!(mask.is_empty());
      assert_eq!(width, 0);
   }

   #[test]
   fn test_truncate_tokens_cuts_long_rows() {
      let ids: Vec<u32> = (0..600).collect();
      let mask = vec![1u32; 600];

      let (ids, mask) = truncate_tokens(ids, mask, 512);
      assert_eq!(ids.len(), 512);
      assert_eq!(mask.len(), 512);
      assert_eq!(ids[511], 511);

      let (short, short_mask) = truncate_tokens(vec![101, 102], vec![1, 1], 512);
      assert_eq!(short, vec![101, 102]);
      assert_eq!(short_mask, vec![1, 1]);
   }

   #[test]
   fn test_truncated_rows_pad_to_limit() {
      let long = truncate_tokens(vec![9; 20], vec![1; 20], 8);
      let short = truncate_tokens(vec![101, 102], vec![1, 1], 8);

      let (ids, mask, width) = pad_batch(&[long, short]);

      assert_eq!(width, 8);
      assert_eq!(&ids[8..], &[101, 102, 0, 0, 0, 0, 0, 0]);
      assert_eq!(mask.iter().filter(|&&m| m == 1).count(), 10);
   }
}
