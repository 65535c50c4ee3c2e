//! In-memory catalog of free courses and their embeddings.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::{
   embed::Embedder,
   error::{Error, Result},
   ingest::RawCourseRow,
   types::CourseRecord,
};

/// Course records with one unit vector per record.
///
/// Row `i` of [`CatalogIndex::vectors`] always belongs to record `i`. The index
/// is immutable once built.
#[derive(Debug)]
pub struct CatalogIndex {
   records: Vec<CourseRecord>,
   vectors: Array2<f32>,
}

impl CatalogIndex {
   /// Keeps the free courses among `rows`, defaults their optional fields and
   /// embeds all of them in one encoder call.
   pub async fn build<E>(rows: Vec<RawCourseRow>, embedder: &E) -> Result<Self>
   where
      E: Embedder + ?Sized,
   {
      let total = rows.len();

      let records: Vec<CourseRecord> = rows
         .into_par_iter()
         .filter(RawCourseRow::is_free)
         .filter_map(|row| {
            let name = row.course_name.clone();
            let record = row.into_record();
            if record.is_none() {
               tracing::warn!("dropping free course {:?}: no website", name.unwrap_or_default());
            }
            record
         })
         .collect();

      tracing::debug!("catalog keeps {} of {} rows", records.len(), total);

      if records.is_empty() {
         return Err(Error::EmptyCorpus { rows: total });
      }

      let texts: Vec<String> = records
         .iter()
         .map(|r| r.search_text().to_string())
         .collect();
      let vectors = embedder.encode(&texts).await?;

      Self::from_parts(records, vectors)
   }

   /// Pairs records with precomputed vectors, checking they line up.
   pub fn from_parts(records: Vec<CourseRecord>, vectors: Vec<Vec<f32>>) -> Result<Self> {
      if records.is_empty() {
         return Err(Error::EmptyCorpus { rows: 0 });
      }

      if vectors.len() != records.len() {
         return Err(Error::Encoding(format!(
            "encoder returned {} vectors for {} courses",
            vectors.len(),
            records.len()
         )));
      }

      let dim = vectors[0].len();
      if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
         return Err(Error::Encoding("catalog vectors have inconsistent dimensions".to_string()));
      }

      let flat: Vec<f32> = vectors.into_iter().flatten().collect();
      let vectors = Array2::from_shape_vec((records.len(), dim), flat)
         .map_err(|e| Error::Encoding(format!("failed to shape catalog vectors: {e}")))?;

      Ok(Self { records, vectors })
   }

   pub fn len(&self) -> usize {
      self.records.len()
   }

   pub fn is_empty(&self) -> bool {
      self.records.is_empty()
   }

   pub fn dim(&self) -> usize {
      self.vectors.ncols()
   }

   pub fn records(&self) -> &[CourseRecord] {
      &self.records
   }

   pub fn vectors(&self) -> ArrayView2<'_, f32> {
      self.vectors.view()
   }

   pub fn vector(&self, i: usize) -> ArrayView1<'_, f32> {
      self.vectors.row(i)
   }
}
