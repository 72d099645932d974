pub mod adapter;
pub mod anonymous;
pub mod content;
pub mod error;
pub mod feed;
pub mod location;
pub mod normalize;
pub mod session;

mod url_filter;

pub use adapter::{search_with_fallback, Progress, SearchOutcome, SearchRequest, SourceAdapter};
pub use anonymous::AnonymousSearch;
pub use content::{extract_page_metadata, ContentFetcher, PageMetadata};
pub use error::{AdapterError, ScraperError};
pub use feed::parse_feed_blocks;
pub use normalize::{normalize, AnonymousResult, RawResult, RenderedPost};
pub use session::{activity_url, SessionAdapter, SessionLimits};
pub use url_filter::is_content_url;
