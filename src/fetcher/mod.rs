pub mod client;
pub mod errors;
pub mod html;
pub mod page;
pub mod pipeline;
pub mod render;
pub mod types;

pub use client::{StaticFetcher, build_http_client, parse_http_url};
pub use errors::FetchError;
pub use html::paragraph_text;
pub use page::PageFetcher;
pub use render::{ChromiumRenderer, PageRenderer};
pub use types::{Charset, FetchMethod, FetchResult, FetchedPage, StaticPage};
