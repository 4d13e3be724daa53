//! Text search over page text with circular match navigation

use std::ops::Range;

use log::debug;

/// One occurrence of the query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    /// Page index (0-based)
    pub page: usize,
    /// Byte range within the page text
    pub range: Range<usize>,
}

impl SearchMatch {
    #[must_use]
    pub fn new(page: usize, range: Range<usize>) -> Self {
        Self { page, range }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("text search unavailable: {0}")]
    Unavailable(String),
}

/// Full-text searcher over a document
pub trait TextSearcher: Send + Sync {
    /// Matches ordered by page, then by position within the page
    fn search(&self, query: &str) -> Result<Vec<SearchMatch>, SearchError>;
}

/// Case-insensitive substring search over per-page text
#[derive(Clone, Debug, Default)]
pub struct PageTextSearcher {
    pages: Vec<String>,
}

impl PageTextSearcher {
    #[must_use]
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

impl TextSearcher for PageTextSearcher {
    fn search(&self, query: &str) -> Result<Vec<SearchMatch>, SearchError> {
        Ok(find_matches_in_pages(query, &self.pages))
    }
}

/// Find every occurrence of `query` in each page, ignoring case.
/// Occurrences may overlap. Ranges are byte ranges of the original page text.
#[must_use]
pub fn find_matches_in_pages(query: &str, pages: &[String]) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();
    let mut matches = Vec::new();

    for (page, text) in pages.iter().enumerate() {
        let folded = FoldedText::new(text);
        let mut search_start = 0;

        while let Some(pos) = folded.lower[search_start..].find(&query_lower) {
            let start = search_start + pos;
            let end = start + query_lower.len();
            matches.push(SearchMatch::new(page, folded.original_range(start..end)));
            search_start = start
                + folded.lower[start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
    }

    debug!("Search for {query:?} found {} matches", matches.len());
    matches
}

/// Lowercased text with, for every byte of it, the span of the original
/// character it was folded from
struct FoldedText {
    lower: String,
    spans: Vec<Range<usize>>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut lower = String::with_capacity(text.len());
        let mut spans = Vec::with_capacity(text.len());
        for (offset, ch) in text.char_indices() {
            let span = offset..offset + ch.len_utf8();
            for folded in ch.to_lowercase() {
                lower.push(folded);
                spans.extend(std::iter::repeat_n(span.clone(), folded.len_utf8()));
            }
        }
        Self { lower, spans }
    }

    /// Map a non-empty byte range of `lower` onto the original text,
    /// widened to whole original characters
    fn original_range(&self, range: Range<usize>) -> Range<usize> {
        self.spans[range.start].start..self.spans[range.end - 1].end
    }
}

/// Query, its matches and the current match cursor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub matches: Vec<SearchMatch>,
    pub current_match_index: Option<usize>,
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current_match_index = None;
    }

    /// Replace the matches; the cursor moves to the first one
    pub fn set_matches(&mut self, matches: Vec<SearchMatch>) {
        self.matches = matches;
        self.current_match_index = if self.matches.is_empty() {
            None
        } else {
            Some(0)
        };
    }

    pub fn next_match(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }

        self.current_match_index = Some(match self.current_match_index {
            Some(idx) => (idx + 1) % self.matches.len(),
            None => 0,
        });

        self.current_match()
    }

    pub fn previous_match(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }

        self.current_match_index = Some(match self.current_match_index {
            Some(0) | None => self.matches.len() - 1,
            Some(idx) => idx - 1,
        });

        self.current_match()
    }

    #[must_use]
    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.current_match_index
            .and_then(|idx| self.matches.get(idx))
    }

    /// Matches on one page, for highlighting
    pub fn matches_on_page(&self, page: usize) -> impl Iterator<Item = &SearchMatch> {
        self.matches.iter().filter(move |m| m.page == page)
    }

    #[must_use]
    pub fn match_info(&self) -> String {
        if self.matches.is_empty() {
            "No matches".to_string()
        } else if let Some(current) = self.current_match_index {
            format!("[{}/{}]", current + 1, self.matches.len())
        } else {
            format!("[{} matches]", self.matches.len())
        }
    }
}
