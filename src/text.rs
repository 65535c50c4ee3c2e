//! Canonical text form shared by catalog entries and queries.

/// Lowercases `text`, replaces anything that is not a letter, digit or
/// whitespace with a space, and collapses whitespace runs to single spaces.
///
/// Missing input normalizes to the empty string.
pub fn normalize(text: Option<&str>) -> String {
   let Some(text) = text else {
      return String::new();
   };

   // Lowercasing can expand a letter into a base plus combining mark, so it
   // runs before the character filter to keep the result stable on re-entry.
   let cleaned: String = text
      .to_lowercase()
      .chars()
      .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
      .collect();

   let mut out = String::with_capacity(cleaned.len());
   for word in cleaned.split_whitespace() {
      if !out.is_empty() {
         out.push(' ');
      }
      out.push_str(word);
   }
   out
}
