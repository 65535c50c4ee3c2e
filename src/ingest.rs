//! Catalog ingest boundary.
//!
//! Rows arrive as scraped CSV of uneven quality. Every optional column is read
//! as text and interpreted leniently here, so downstream code only ever sees a
//! fully defaulted [`CourseRecord`].

use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::{
   error::{Error, Result},
   types::CourseRecord,
};

/// A catalog row exactly as the corpus collaborator wrote it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCourseRow {
   #[serde(rename = "Course Name", default)]
   pub course_name:   Option<String>,
   #[serde(rename = "Key Takeaways", default)]
   pub key_takeaways: Option<String>,
   #[serde(rename = "Course Time", default)]
   pub course_time:   Option<String>,
   #[serde(rename = "Ratings", default)]
   pub ratings:       Option<String>,
   #[serde(rename = "Difficulty", default)]
   pub difficulty:    Option<String>,
   #[serde(rename = "Website", default)]
   pub website:       Option<String>,
}

impl RawCourseRow {
   /// Whether the course name mentions "free" in any letter case.
   pub fn is_free(&self) -> bool {
      self
         .course_name
         .as_deref()
         .is_some_and(|name| name.to_lowercase().contains("free"))
   }

   /// Applies field defaults. Returns `None` when a required field is missing.
   pub fn into_record(self) -> Option<CourseRecord> {
      let name = present(self.course_name)?;
      let url = present(self.website)?;

      Some(CourseRecord::new(
         name,
         present(self.key_takeaways),
         self.course_time.as_deref().and_then(parse_leading_number),
         self.ratings.as_deref().and_then(parse_leading_number),
         present(self.difficulty),
         url,
      ))
   }
}

fn present(field: Option<String>) -> Option<String> {
   field.filter(|s| !s.trim().is_empty())
}

/// Parses the numeric prefix of a scraped cell, e.g. `"6 Hours"` or `"4.6/5"`.
pub fn parse_leading_number(cell: &str) -> Option<f64> {
   let cell = cell.trim();
   let sign_len = usize::from(cell.starts_with(['-', '+']));
   let digits_len = cell[sign_len..]
      .find(|c: char| !(c.is_ascii_digit() || c == '.'))
      .unwrap_or(cell.len() - sign_len);

   cell[..sign_len + digits_len]
      .parse::<f64>()
      .ok()
      .filter(|v| v.is_finite())
}

/// Reads every row of the catalog CSV at `path`.
pub fn read_csv(path: &Path) -> Result<Vec<RawCourseRow>> {
   let catalog_err = |source: csv::Error| Error::Catalog { path: path.to_path_buf(), source };

   let file = File::open(path).map_err(|e| catalog_err(e.into()))?;
   read_rows(file).map_err(catalog_err)
}

/// Reads catalog rows from any CSV source with a header line.
///
/// Records that cannot be decoded are skipped with a warning; I/O failures
/// abort the read.
pub fn read_rows<R: Read>(reader: R) -> csv::Result<Vec<RawCourseRow>> {
   let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
   reader.headers()?;

   let mut rows = Vec::new();
   for (i, record) in reader.deserialize::<RawCourseRow>().enumerate() {
      match record {
         Ok(row) => rows.push(row),
         Err(e) if e.is_io_error() => return Err(e),
         Err(e) => tracing::warn!("skipping catalog row {}: {}", i + 1, e),
      }
   }

   Ok(rows)
}
