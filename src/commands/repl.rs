use anyhow::Result;
use console::style;
use course_search::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{EMPTY_QUERY_MESSAGE, load_engine};

pub async fn execute(config: &Config) -> Result<()> {
   let engine = load_engine(config).await?;
   let top_k = config.default_top_k;

   eprintln!(
      "{} {}",
      style(format!("{} free courses loaded.", engine.index().len())).bold(),
      style("Type what you would like to learn, Ctrl-D to quit.").dim()
   );

   let mut lines = BufReader::new(tokio::io::stdin()).lines();
   while let Some(line) = lines.next_line().await? {
      let Some(query) = query_from_line(&line) else {
         println!("{EMPTY_QUERY_MESSAGE}");
         continue;
      };

      match engine.search(query, top_k).await {
         Ok(report) => println!("{report}\n"),
         Err(e) => eprintln!("{} {e}", style("search failed:").red().bold()),
      }
   }

   Ok(())
}

/// Every non-blank line is a query; only end of input stops the loop.
fn query_from_line(line: &str) -> Option<&str> {
   let query = line.trim();
   (!query.is_empty()).then_some(query)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_query_from_line() {
      assert_eq!(query_from_line("  python basics \n"), Some("python basics"));
      assert_eq!(query_from_line("   "), None);
      assert_eq!(query_from_line(""), None);
   }

   #[test]
   fn test_exit_words_are_searchable() {
      assert_eq!(query_from_line("exit"), Some("exit"));
      assert_eq!(query_from_line(" quit "), Some("quit"));
   }
}
