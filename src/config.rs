use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DENSE_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DENSE_DIM: usize = 384;

pub const MAX_SEQ_LEN: usize = 512;

pub const DEFAULT_BATCH_SIZE: usize = 48;
pub const MAX_BATCH_SIZE: usize = 96;

pub const DEFAULT_TOP_K: usize = 3;
pub const MAX_TOP_K: usize = 10;

pub const DEFAULT_CATALOG: &str = "course_data.csv";

pub const ENV_PREFIX: &str = "COURSE_SEARCH_";

/// Which encoder backs both catalog and query embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
   /// Pretrained BERT sentence model run through candle
   #[default]
   Candle,
   /// Deterministic bag-of-words hashing, no model download
   Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   pub encoder:       EncoderKind,
   pub model:         String,
   pub max_seq_len:   usize,
   pub batch_size:    usize,
   pub hashing_dim:   usize,
   pub catalog:       PathBuf,
   pub default_top_k: usize,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         encoder:       EncoderKind::default(),
         model:         DENSE_MODEL.to_string(),
         max_seq_len:   MAX_SEQ_LEN,
         batch_size:    DEFAULT_BATCH_SIZE,
         hashing_dim:   DENSE_DIM,
         catalog:       PathBuf::from(DEFAULT_CATALOG),
         default_top_k: DEFAULT_TOP_K,
      }
   }
}

impl Config {
   /// Merges built-in defaults, the TOML config file and `COURSE_SEARCH_*`
   /// environment variables, later sources winning.
   pub fn load(path: Option<&Path>) -> Result<Self> {
      let file = path.map_or_else(config_file, Path::to_path_buf);
      Self::figment(&file)
         .extract::<Self>()
         .map(Self::sanitized)
         .map_err(|e| Box::new(e).into())
   }

   fn figment(file: &Path) -> Figment {
      Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(file))
         .merge(Env::prefixed(ENV_PREFIX).ignore(&["debug_models", "debug_embed", "config"]))
   }

   fn sanitized(mut self) -> Self {
      self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
      self.max_seq_len = self.max_seq_len.max(1);
      self.hashing_dim = self.hashing_dim.max(1);
      self.default_top_k = self.default_top_k.clamp(1, MAX_TOP_K);
      self
   }
}

pub fn data_dir() -> PathBuf {
   BaseDirs::new().map_or_else(
      || PathBuf::from(".course-search"),
      |dirs| dirs.home_dir().join(".course-search"),
   )
}

pub fn model_dir() -> PathBuf {
   data_dir().join("models")
}

pub fn config_file() -> PathBuf {
   data_dir().join("config.toml")
}

fn env_flag(name: &str) -> bool {
   std::env::var(format!("{ENV_PREFIX}{name}"))
      .ok()
      .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
      .unwrap_or(false)
}

pub fn debug_models() -> bool {
   env_flag("DEBUG_MODELS")
}

pub fn debug_embed() -> bool {
   env_flag("DEBUG_EMBED")
}
