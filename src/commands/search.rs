use anyhow::Result;
use course_search::{config::Config, types::RankedResult};
use serde::Serialize;

use super::{EMPTY_QUERY_MESSAGE, load_engine};

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
   query:   &'a str,
   results: Vec<RankedResult>,
}

pub async fn execute(config: &Config, query: &str, json: bool) -> Result<()> {
   if query.trim().is_empty() {
      println!("{EMPTY_QUERY_MESSAGE}");
      return Ok(());
   }

   let engine = load_engine(config).await?;
   let top_k = config.default_top_k;

   if json {
      let results = engine.search_ranked(query, top_k).await?;
      println!("{}", serde_json::to_string(&JsonOutput { query, results })?);
   } else {
      println!("{}", engine.search(query, top_k).await?);
   }

   Ok(())
}
