//! Renders ranked courses as a markdown report.
//!
//! Results are first gathered into a [`Report`], which then renders itself
//! through [`fmt::Display`].

use std::fmt;

use crate::types::{CourseRecord, RankedResult};

const TAKEAWAY_DELIMITER: &str = ".,";
const MAX_BULLETS: usize = 3;
const MAX_BULLET_CHARS: usize = 100;
const TRUNCATED_BULLET_CHARS: usize = 97;

const FOOTER: [&str; 5] = [
   "\n---\n",
   "**Notes:**",
   "• Courses are sorted by relevance to your search",
   "• All courses are free and include hands-on projects",
   "• Certificates are provided upon completion",
];

/// A complete search report.
#[derive(Debug, Clone)]
pub struct Report<'a> {
   pub query:   &'a str,
   pub entries: Vec<ReportEntry<'a>>,
}

/// One ranked course, ready to render.
#[derive(Debug, Clone)]
pub struct ReportEntry<'a> {
   pub rank:          usize,
   pub name:          &'a str,
   pub rating:        f64,
   pub difficulty:    &'a str,
   pub duration:      Option<f64>,
   pub takeaways:     Option<Takeaways>,
   pub match_percent: i64,
   pub url:           &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Takeaways {
   pub bullets: Vec<String>,
   pub more:    bool,
}

impl<'a> Report<'a> {
   pub fn new(query: &'a str, results: &'a [RankedResult]) -> Self {
      let entries = results
         .iter()
         .enumerate()
         .map(|(i, result)| ReportEntry::new(i + 1, &result.record, result.score))
         .collect();
      Self { query, entries }
   }

   fn header(&self) -> String {
      if self.entries.len() == 1 {
         format!("I found an excellent free course matching your search for '{}':", self.query)
      } else {
         format!(
            "I found {} relevant free courses matching your search for '{}':",
            self.entries.len(),
            self.query
         )
      }
   }
}

impl<'a> ReportEntry<'a> {
   fn new(rank: usize, record: &'a CourseRecord, score: f32) -> Self {
      Self {
         rank,
         name: &record.name,
         rating: record.rating,
         difficulty: &record.difficulty,
         duration: (record.duration_hours != 0.0 && !record.duration_hours.is_nan())
            .then_some(record.duration_hours),
         takeaways: record
            .has_key_takeaways()
            .then(|| Takeaways::parse(&record.key_takeaways)),
         match_percent: match_percent(score),
         url: &record.url,
      }
   }
}

impl Takeaways {
   /// Splits scraped takeaways on `".,"` into at most three bullets.
   pub fn parse(raw: &str) -> Self {
      let candidates: Vec<&str> = raw.split(TAKEAWAY_DELIMITER).collect();

      let bullets = candidates
         .iter()
         .map(|c| c.trim_matches(['.', ',', ' ']))
         .filter(|c| !c.is_empty())
         .map(truncate_bullet)
         .take(MAX_BULLETS)
         .collect();

      Self { bullets, more: candidates.len() > MAX_BULLETS }
   }
}

fn truncate_bullet(text: &str) -> String {
   if text.chars().count() > MAX_BULLET_CHARS {
      let mut cut: String = text.chars().take(TRUNCATED_BULLET_CHARS).collect();
      cut.push_str("...");
      cut
   } else {
      text.to_string()
   }
}

/// Similarity as a whole percentage, truncated toward zero.
///
/// The product stays in `f32` so a score that prints as `0.29` reports 29%.
pub fn match_percent(score: f32) -> i64 {
   (score * 100.0).trunc() as i64
}

/// Formats a float the way the scraped catalog shows it: integral values keep
/// one decimal (`5.0`), everything else uses the shortest form (`4.6`).
fn display_number(value: f64) -> String {
   if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
      format!("{value:.1}")
   } else {
      value.to_string()
   }
}

impl fmt::Display for ReportEntry<'_> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      writeln!(f, "\n**{}. {}**", self.rank, self.name)?;
      writeln!(f, "**Rating:** {}/5.0", display_number(self.rating))?;
      writeln!(f, "**Level:** {}", self.difficulty)?;

      if let Some(hours) = self.duration {
         writeln!(f, "**Duration:** {} hours", display_number(hours))?;
      }

      if let Some(takeaways) = &self.takeaways {
         f.write_str("\n**What you'll learn:**\n")?;
         let bullets: Vec<String> = takeaways.bullets.iter().map(|b| format!("• {b}")).collect();
         f.write_str(&bullets.join("\n"))?;
         if takeaways.more {
            f.write_str("\n• And more...")?;
         }
      }

      write!(f, "\n**Match Score:** {}%", self.match_percent)?;
      writeln!(f, "\n\n[Start Course]({})", self.url)
   }
}

impl fmt::Display for Report<'_> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.header())?;
      for entry in &self.entries {
         write!(f, "\n{entry}")?;
      }
      for line in FOOTER {
         write!(f, "\n{line}")?;
      }
      Ok(())
   }
}

/// Renders the report for `results`, quoting `query` as the caller typed it.
pub fn format_report(query: &str, results: &[RankedResult]) -> String {
   Report::new(query, results).to_string()
}
