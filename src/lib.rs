//! Search SECOP II procurement processes for water and wastewater work.
//!
//! The library pages through a filtered query against the Colombian open-data
//! API, keeps the processes whose description mentions a term from a fixed
//! vocabulary, and returns them newest first with the matched terms attached.

pub mod client;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pagination;
pub mod query;
pub mod render;
pub mod retriever;
pub mod types;
pub mod vocabulary;

pub use client::{PageBody, RecordsApi, SocrataClient};
pub use config::{Config, ConfigBuilder, ConfigFile, SortOrder};
pub use error::{Error, Result};
pub use matcher::{match_and_annotate, match_keywords, MatchOutcome};
pub use pagination::{is_last_page, PageState};
pub use query::{PageRequest, SearchFilters, SearchFiltersBuilder};
pub use render::OutputFormat;
pub use retriever::Retriever;
pub use types::{AnnotatedRecord, Record};
pub use vocabulary::Vocabulary;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::client::{PageBody, RecordsApi, SocrataClient};
    pub use crate::config::{Config, ConfigBuilder, SortOrder};
    pub use crate::error::{Error, Result};
    pub use crate::query::{PageRequest, SearchFilters};
    pub use crate::render::OutputFormat;
    pub use crate::retriever::Retriever;
    pub use crate::types::{AnnotatedRecord, Record};
    pub use crate::vocabulary::Vocabulary;
}
