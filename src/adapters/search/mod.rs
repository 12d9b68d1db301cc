//! Web search adapters.

pub mod tavily;

pub use tavily::TavilyClient;
