pub mod client;
pub mod debug;

pub use client::{HttpClient, HttpResponseData, Upstream};
pub use debug::HttpDebugConfig;
