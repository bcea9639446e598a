mod client;
mod mapper;
pub mod reference;

pub use client::GitHubPlatform;
pub use reference::{extract_pr_reference, parse_pr_reference, PrReference};
