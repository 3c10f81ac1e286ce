pub mod http;

pub use http::HttpResourceSource;
