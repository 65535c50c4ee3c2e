pub mod ranking;

use std::sync::Arc;

use crate::{
   catalog::CatalogIndex,
   config::debug_embed,
   embed::Embedder,
   error::{Error, Result},
   format, text,
   types::RankedResult,
};

/// Answers queries against a catalog built once with the same embedder.
///
/// Searches only read shared state, so one engine can serve concurrent
/// callers.
pub struct SearchEngine {
   index:    Arc<CatalogIndex>,
   embedder: Arc<dyn Embedder>,
}

impl SearchEngine {
   pub fn new(index: Arc<CatalogIndex>, embedder: Arc<dyn Embedder>) -> Self {
      Self { index, embedder }
   }

   pub fn index(&self) -> &CatalogIndex {
      &self.index
   }

   /// Ranks the catalog against `query` and returns the best `top_k` courses.
   pub async fn search_ranked(&self, query: &str, top_k: usize) -> Result<Vec<RankedResult>> {
      if top_k < 1 {
         return Err(Error::InvalidArgument(format!("top_k must be at least 1, got {top_k}")));
      }

      let normalized = text::normalize(Some(query));
      if debug_embed() {
         tracing::info!("encoding query: {:?} (normalized: {:?})", query, normalized);
      }

      let query_vector = self.embedder.encode_query(&normalized).await?;
      ranking::rank(&self.index, &query_vector, top_k)
   }

   /// Runs a search and renders the report shown to the user.
   pub async fn search(&self, query: &str, top_k: usize) -> Result<String> {
      let results = self.search_ranked(query, top_k).await?;
      Ok(format::format_report(query, &results))
   }
}
