// Page acquisition: search result scraping, page fetching, and HTML-to-text.

pub mod exclusion;
pub mod fetcher;
pub mod search;
pub mod text;
