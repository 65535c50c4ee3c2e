//! Sentence embedding for catalog entries and queries.
//!
//! Catalog and query vectors are only comparable when they come from the same
//! encoder, so a single [`Embedder`] instance is built per process and shared
//! by the catalog build and every search.

pub mod candle;
pub mod hashing;

use std::sync::Arc;

pub use candle::CandleEmbedder;
pub use hashing::HashingEmbedder;

use crate::{
   config::{Config, EncoderKind},
   error::{Error, Result},
};

/// Maps normalized text to L2-normalized dense vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
   /// Encodes `texts` in order, one unit vector per input.
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

   /// Encodes a single query through the same path as [`Embedder::encode`].
   async fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
      self
         .encode(&[text.to_string()])
         .await?
         .pop()
         .ok_or_else(|| Error::Encoding("encoder returned no vector for query".to_string()))
   }

   /// Returns whether the encoder is loaded and ready
   fn is_ready(&self) -> bool;
}

#[async_trait::async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      (**self).encode(texts).await
   }

   async fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
      (**self).encode_query(text).await
   }

   fn is_ready(&self) -> bool {
      (**self).is_ready()
   }
}

pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
   Ok(match config.encoder {
      EncoderKind::Candle => Arc::new(CandleEmbedder::new(config)?),
      EncoderKind::Hashing => Arc::new(HashingEmbedder::new(config.hashing_dim)),
   })
}

pub(crate) fn normalize_l2(embedding: &mut [f32]) {
   let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
   if norm > 0.0 {
      for x in embedding.iter_mut() {
         *x /= norm;
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_normalize_l2() {
      let mut v = vec![3.0, 4.0];
      normalize_l2(&mut v);
      assert!((v[0] - 0.6).abs() < 1e-6);
      assert!((v[1] - 0.8).abs() < 1e-6);

      let mut zero = vec![0.0; 4];
      normalize_l2(&mut zero);
      assert_eq!(zero, vec![0.0; 4]);
   }

   #[test]
   fn test_build_hashing_embedder() {
      let config = Config { encoder: EncoderKind::Hashing, hashing_dim: 16, ..Config::default() };
      let embedder = build_embedder(&config).unwrap();
      assert!(embedder.is_ready());

      let query = tokio_test::block_on(embedder.encode_query("free python")).unwrap();
      assert_eq!(query.len(), 16);
   }
}
