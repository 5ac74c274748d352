mod client;
mod descriptor;

pub use client::HttpClient;
pub use descriptor::{Method, RequestDescriptor, RetryOptions};
