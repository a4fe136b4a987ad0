//! Structured hints embedded in a free-text transaction query
//!
//! Callers may embed `Company: <name>` and/or `Person: <name>` segments,
//! comma-separated, anywhere in the description. Markers are matched
//! case-insensitively because the pipeline case-folds its input before
//! retrieval.

const COMPANY_MARKER: &str = "company:";
const PERSON_MARKER: &str = "person:";

/// Company and person names parsed out of a query
///
/// A missing hint is an empty string, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryHints {
    /// Company name, or empty
    pub company: String,
    /// Person name, or empty
    pub person: String,
}

impl QueryHints {
    /// Parse hints from a query
    ///
    /// The query is split on commas; a segment containing a marker yields the
    /// text after the last occurrence of that marker, trimmed. Later segments
    /// override earlier ones. A segment containing both markers counts as a
    /// company segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use txrisk_domain::QueryHints;
    ///
    /// let hints = QueryHints::parse("Person: Ivan Petrov, wire of 5000 EUR, Company: SovCo");
    /// assert_eq!(hints.company, "SovCo");
    /// assert_eq!(hints.person, "Ivan Petrov");
    ///
    /// let none = QueryHints::parse("payment for services");
    /// assert!(none.is_empty());
    /// ```
    pub fn parse(query: &str) -> Self {
        let mut hints = Self::default();

        for part in query.split(',') {
            if let Some(name) = text_after_last(part, COMPANY_MARKER) {
                hints.company = name.to_string();
            } else if let Some(name) = text_after_last(part, PERSON_MARKER) {
                hints.person = name.to_string();
            }
        }

        hints
    }

    /// True when neither hint is present
    pub fn is_empty(&self) -> bool {
        self.company.is_empty() && self.person.is_empty()
    }
}

/// Trimmed text following the last case-insensitive occurrence of `marker`
fn text_after_last<'a>(part: &'a str, marker: &str) -> Option<&'a str> {
    let haystack = part.as_bytes();
    let needle = marker.as_bytes();
    if haystack.len() < needle.len() {
        return None;
    }

    // The marker is ASCII, so a byte match always starts on a char boundary
    let start = (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))?;

    Some(part[start + needle.len()..].trim())
}
