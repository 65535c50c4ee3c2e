mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use course_search::config::Config;
use tracing_subscriber::EnvFilter;

use crate::commands::CatalogArgs;

#[derive(Parser)]
#[command(name = "course-search", version, about = "Find free courses with natural language")]
struct Cli {
   /// Config file (defaults to ~/.course-search/config.toml)
   #[arg(long, global = true, env = "COURSE_SEARCH_CONFIG")]
   config: Option<PathBuf>,

   #[command(subcommand)]
   command: Command,
}

#[derive(Subcommand)]
enum Command {
   /// Search the catalog once and print the report
   Search {
      /// What you would like to learn
      query: String,

      #[command(flatten)]
      catalog: CatalogArgs,

      /// Print ranked results as JSON instead of the report
      #[arg(long)]
      json: bool,
   },
   /// Load the catalog once and answer one query per input line
   Repl {
      #[command(flatten)]
      catalog: CatalogArgs,
   },
   /// Download the embedding model into the local cache
   Setup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
      .with_writer(std::io::stderr)
      .init();

   let cli = Cli::parse();
   let mut config = Config::load(cli.config.as_deref())?;

   match cli.command {
      Command::Search { query, catalog, json } => {
         catalog.apply(&mut config);
         commands::search::execute(&config, &query, json).await
      },
      Command::Repl { catalog } => {
         catalog.apply(&mut config);
         commands::repl::execute(&config).await
      },
      Command::Setup => commands::setup::execute(&config).await,
   }
}

#[cfg(test)]
mod tests {
   use clap::CommandFactory;

   use super::*;

   #[test]
   fn test_cli_definition() {
      Cli::command().debug_assert();
   }

   #[test]
   fn test_config_flag_reads_env() {
      let cli = Cli::command();
      let config = cli
         .get_arguments()
         .find(|arg| arg.get_id() == "config")
         .unwrap();
      assert_eq!(
         config.get_env().and_then(|v| v.to_str()),
         Some("COURSE_SEARCH_CONFIG")
      );
   }

   #[test]
   fn test_config_flag_after_subcommand() {
      let cli = Cli::try_parse_from(["course-search", "repl", "--config", "alt.toml", "-k", "4"]).unwrap();
      assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
      assert!(matches!(cli.command, Command::Repl { catalog } if catalog.top_k == Some(4)));
   }
}
