//! Pagination controllers
//!
//! The conversation list and the open conversation's messages page
//! independently. The conversation list also carries the search query that
//! switches its data source.

/// Page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    total_pages: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }
}

impl Pager {
    /// Cursor at page 1 of 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Current page, 1-based
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Known page count, at least 1
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Clamp `page` into `[1, total_pages]`, make it current and return it
    pub fn go_to(&mut self, page: u32) -> u32 {
        self.page = page.clamp(1, self.total_pages.max(1));
        self.page
    }

    /// Next page, clamped
    pub fn next(&mut self) -> u32 {
        self.go_to(self.page.saturating_add(1))
    }

    /// Previous page, clamped
    pub fn previous(&mut self) -> u32 {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Back to page 1; the page count is kept
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Adopt the page numbers reported by a response
    pub fn apply_response(&mut self, page: u32, total_pages: u32) {
        self.total_pages = total_pages.max(1);
        self.page = page.clamp(1, self.total_pages);
    }

    /// Whether a later page exists
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Data source behind the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    /// Plain conversation listing
    Conversations,
    /// Message search, hits re-mapped into conversation rows
    Search(String),
}

/// Cursor and query of the conversation list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPager {
    pager: Pager,
    query: String,
}

impl ConversationPager {
    /// List cursor with no query
    pub fn new() -> Self {
        Self::default()
    }

    /// The page cursor
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Mutable page cursor
    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Current query as typed
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the query and return to page 1
    ///
    /// # Returns
    /// `true` if the effective source changed and the list must be refetched
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let before = self.source();
        self.query = query.into();
        self.pager.reset();
        self.source() != before
    }

    /// Source selected by the current query
    pub fn source(&self) -> ListSource {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            ListSource::Conversations
        } else {
            ListSource::Search(trimmed.to_string())
        }
    }
}
