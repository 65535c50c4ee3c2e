use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
   /// The encoder could not produce vectors for the given input.
   #[error("encoding failed: {0}")]
   Encoding(String),

   /// No catalog row survived the free-course filter.
   #[error("catalog is empty: none of the {rows} ingested rows is a free course")]
   EmptyCorpus { rows: usize },

   #[error("invalid argument: {0}")]
   InvalidArgument(String),

   #[error("failed to read catalog {}: {source}", path.display())]
   Catalog {
      path:   PathBuf,
      #[source]
      source: csv::Error,
   },

   #[error("invalid configuration: {0}")]
   Config(#[from] Box<figment::Error>),

   #[error(transparent)]
   Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
