//! Cosine ranking of catalog entries against a query vector.

use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::{
   catalog::CatalogIndex,
   error::{Error, Result},
   types::RankedResult,
};

/// Scores every catalog entry against `query` and returns the best `top_k`.
///
/// Both sides are unit vectors, so the dot product is the cosine similarity.
/// Equal scores keep catalog order. `top_k` larger than the catalog returns
/// the whole catalog.
pub fn rank(index: &CatalogIndex, query: &[f32], top_k: usize) -> Result<Vec<RankedResult>> {
   if top_k < 1 {
      return Err(Error::InvalidArgument(format!("top_k must be at least 1, got {top_k}")));
   }

   if query.len() != index.dim() {
      return Err(Error::Encoding(format!(
         "query vector has dimension {}, catalog has {}",
         query.len(),
         index.dim()
      )));
   }

   let scores = index.vectors().dot(&ArrayView1::from(query));

   let mut order: Vec<usize> = (0..index.len()).collect();
   // Stable sort: ties stay in catalog order.
   order.sort_by(|&a, &b| descending(scores[a], scores[b]));
   order.truncate(top_k);

   Ok(order
      .into_iter()
      .map(|i| RankedResult { record: index.records()[i].clone(), score: scores[i] })
      .collect())
}

fn descending(a: f32, b: f32) -> Ordering {
   b.partial_cmp(&a)
      .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}
