pub mod repl;
pub mod search;
pub mod setup;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use course_search::{
   catalog::CatalogIndex,
   config::{Config, EncoderKind, MAX_TOP_K},
   embed::build_embedder,
   ingest,
   search::SearchEngine,
};
use indicatif::{ProgressBar, ProgressStyle};

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a search query to find relevant courses!";

/// Catalog and ranking options shared by `search` and `repl`.
#[derive(Debug, Clone, clap::Args)]
pub struct CatalogArgs {
   /// Number of results to show (1-10)
   #[arg(short = 'k', long)]
   pub top_k: Option<usize>,

   /// Course catalog CSV
   #[arg(long)]
   pub catalog: Option<PathBuf>,

   /// Encoder used for catalog and queries
   #[arg(long, value_enum)]
   pub encoder: Option<EncoderKind>,
}

impl CatalogArgs {
   pub fn apply(&self, config: &mut Config) {
      if let Some(top_k) = self.top_k {
         config.default_top_k = clamp_top_k(top_k);
      }
      if let Some(catalog) = &self.catalog {
         config.catalog.clone_from(catalog);
      }
      if let Some(encoder) = self.encoder {
         config.encoder = encoder;
      }
   }
}

/// Keeps the result count inside the range the UI offers.
pub fn clamp_top_k(top_k: usize) -> usize {
   top_k.clamp(1, MAX_TOP_K)
}

fn spinner(message: &str) -> Result<ProgressBar> {
   let spinner = ProgressBar::new_spinner();
   spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
   spinner.enable_steady_tick(Duration::from_millis(100));
   spinner.set_message(message.to_string());
   Ok(spinner)
}

/// Reads the catalog and embeds every free course. Must finish before any
/// query is answered.
pub async fn load_engine(config: &Config) -> Result<SearchEngine> {
   let spinner = spinner("Loading course catalog...")?;

   let rows = ingest::read_csv(&config.catalog)?;
   let embedder = build_embedder(config)?;

   spinner.set_message(format!("Embedding {} catalog rows...", rows.len()));
   let index = CatalogIndex::build(rows, &embedder)
      .await
      .context("failed to build course catalog")?;

   spinner.finish_and_clear();
   tracing::info!("catalog ready: {} free courses", index.len());

   Ok(SearchEngine::new(Arc::new(index), embedder))
}
