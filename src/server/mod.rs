pub mod http;
pub mod tools;

pub use http::HttpState;
pub use tools::TranslatorServer;
