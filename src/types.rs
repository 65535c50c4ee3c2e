use serde::Serialize;

use crate::text;

pub const DEFAULT_KEY_TAKEAWAYS: &str = "Course details not available.";
pub const DEFAULT_DURATION_HOURS: f64 = 0.0;
pub const DEFAULT_RATING: f64 = 4.6;
pub const DEFAULT_DIFFICULTY: &str = "Beginner";

/// One catalog entry with every optional field already defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
   pub name:           String,
   pub key_takeaways:  String,
   pub duration_hours: f64,
   pub rating:         f64,
   pub difficulty:     String,
   pub url:            String,
   #[serde(skip)]
   search_text:        String,
}

impl CourseRecord {
   pub fn new(
      name: String,
      key_takeaways: Option<String>,
      duration_hours: Option<f64>,
      rating: Option<f64>,
      difficulty: Option<String>,
      url: String,
   ) -> Self {
      let key_takeaways = key_takeaways.unwrap_or_else(|| DEFAULT_KEY_TAKEAWAYS.to_string());
      let difficulty = difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string());
      let search_text =
         text::normalize(Some(&format!("{name} {key_takeaways} {difficulty}")));

      Self {
         name,
         key_takeaways,
         duration_hours: duration_hours.unwrap_or(DEFAULT_DURATION_HOURS),
         rating: rating.unwrap_or(DEFAULT_RATING),
         difficulty,
         url,
         search_text,
      }
   }

   /// Normalized `name`, key takeaways and difficulty; the text that gets
   /// embedded for this course.
   pub fn search_text(&self) -> &str {
      &self.search_text
   }

   pub fn has_key_takeaways(&self) -> bool {
      !self.key_takeaways.is_empty() && self.key_takeaways != DEFAULT_KEY_TAKEAWAYS
   }
}

/// A catalog record paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
   pub record: CourseRecord,
   pub score:  f32,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_defaults_applied() {
      let record = CourseRecord::new(
         "Free Intro to Python".to_string(),
         None,
         None,
         None,
         None,
         "https://example.com/python".to_string(),
      );

      assert_eq!(record.key_takeaways, DEFAULT_KEY_TAKEAWAYS);
      assert_eq!(record.duration_hours, 0.0);
      assert_eq!(record.rating, 4.6);
      assert_eq!(record.difficulty, "Beginner");
      assert!(!record.has_key_takeaways());
      assert_eq!(
         record.search_text(),
         "free intro to python course details not available beginner"
      );
   }

   #[test]
   fn test_search_text_uses_given_fields() {
      let record = CourseRecord::new(
         "Free: Decision Trees".to_string(),
         Some("Split criteria.,Pruning".to_string()),
         Some(2.0),
         Some(4.8),
         Some("Intermediate".to_string()),
         "https://example.com/trees".to_string(),
      );

      assert!(record.has_key_takeaways());
      assert_eq!(record.search_text(), "free decision trees split criteria pruning intermediate");
   }
}
