pub mod fixture;
pub mod http;

pub use fixture::StaticFeedFetcher;
pub use http::HttpFeedFetcher;
