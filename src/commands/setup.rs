use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use course_search::{
   config::{Config, EncoderKind, config_file, data_dir, model_dir},
   embed::CandleEmbedder,
};

use super::spinner;

pub async fn execute(config: &Config) -> Result<()> {
   println!("{}\n", style("course-search Setup").bold());

   let root = data_dir();
   let models = model_dir();

   std::fs::create_dir_all(&root).context("failed to create .course-search directory")?;
   std::fs::create_dir_all(&models).context("failed to create models directory")?;

   println!("{}", style("Checking directories...").dim());
   check_path("Root", &root);
   check_path("Models", &models);
   check_path("Config", &config_file());
   check_path("Catalog", &config.catalog);
   println!();

   if config.encoder == EncoderKind::Hashing {
      println!("{}", style("Hashing encoder selected, no model needed.").dim());
      return Ok(());
   }

   println!("{}", style("Downloading model...").bold());
   let spinner = spinner(&format!("Downloading {}...", config.model))?;

   let model_id = config.model.clone();
   match tokio::task::spawn_blocking(move || CandleEmbedder::download_model(&model_id)).await? {
      Ok(path) => {
         spinner.finish_with_message(format!(
            "{} Model: {} {}",
            style("✓").green(),
            config.model,
            style(path.display()).dim()
         ));
      },
      Err(e) => {
         spinner.finish_with_message(format!("{} Failed: {} - {}", style("✗").red(), config.model, e));
         return Err(e.into());
      },
   }

   println!("\n{}", style("Setup Complete!").green().bold());
   println!("\n{}", style("You can now run:").dim());
   println!(
      "   {} {}",
      style("course-search search \"machine learning for beginners\"").green(),
      style("# Search the catalog").dim()
   );
   println!("   {} {}", style("course-search repl").green(), style("# Ask several questions").dim());

   Ok(())
}

fn check_path(name: &str, path: &Path) {
   let symbol = if path.exists() {
      style("✓").green()
   } else {
      style("✗").red()
   };
   println!("{} {}: {}", symbol, name, style(path.display()).dim());
}
