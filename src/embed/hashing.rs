//! Model-free encoder: hashed bag-of-words counts, L2-normalized.
//!
//! Deterministic across runs and platforms, so it doubles as the offline
//! encoder and as the encoder behind ranking and formatting tests.

use sha2::{Digest, Sha256};

use crate::{
   embed::{Embedder, normalize_l2},
   error::Result,
};

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
   dim: usize,
}

impl HashingEmbedder {
   pub fn new(dim: usize) -> Self {
      Self { dim: dim.max(1) }
   }

   fn bucket(&self, token: &str) -> usize {
      let digest = Sha256::digest(token.as_bytes());
      let mut prefix = [0u8; 8];
      prefix.copy_from_slice(&digest[..8]);
      (u64::from_le_bytes(prefix) % self.dim as u64) as usize
   }

   /// Embeds one text. Text without tokens hashes the empty token, keeping the
   /// output unit length.
   pub fn embed(&self, text: &str) -> Vec<f32> {
      let mut vector = vec![0.0f32; self.dim];
      let mut tokens = text.split_whitespace().peekable();

      if tokens.peek().is_none() {
         vector[self.bucket("")] = 1.0;
         return vector;
      }

      for token in tokens {
         vector[self.bucket(token)] += 1.0;
      }

      normalize_l2(&mut vector);
      vector
   }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      Ok(texts.iter().map(|text| self.embed(text)).collect())
   }

   fn is_ready(&self) -> bool {
      true
   }
}
