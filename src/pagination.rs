//! Page-by-page traversal of a paginated query.
//!
//! Pages are produced lazily and strictly in order: page `n + 1` is only
//! requested once page `n` has been consumed, because whether there is a next
//! page depends on how many records page `n` held.

use crate::client::{PageBody, RecordsApi};
use crate::error::{Error, Result};
use crate::query::SearchFilters;
use async_stream::stream;
use futures::Stream;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A page shorter than the page size is the last one. An empty page is too.
pub fn is_last_page(page_record_count: usize, page_size: usize) -> bool {
    page_record_count < page_size
}

/// Where a traversal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Waiting on the response for `page_number`
    Fetching { page_number: u32 },
    /// `page_number` arrived with `record_count` records and is being consumed
    Accumulating { page_number: u32, record_count: usize },
    /// No more pages; `pages` responses were received
    Exhausted { pages: u32 },
    /// Traversal aborted while fetching `page_number`
    Failed { page_number: u32 },
}

impl PageState {
    pub fn start() -> Self {
        PageState::Fetching { page_number: 1 }
    }

    /// A page with `record_count` records arrived
    pub fn received(self, record_count: usize) -> Self {
        match self {
            PageState::Fetching { page_number } => PageState::Accumulating {
                page_number,
                record_count,
            },
            other => other,
        }
    }

    /// The current page was consumed; decide whether another one follows
    pub fn advance(self, page_size: usize) -> Self {
        match self {
            PageState::Accumulating {
                page_number,
                record_count,
            } => {
                if is_last_page(record_count, page_size) {
                    PageState::Exhausted { pages: page_number }
                } else {
                    PageState::Fetching {
                        page_number: page_number + 1,
                    }
                }
            }
            other => other,
        }
    }

    /// The response was not a record array; nothing more will be read
    pub fn exhausted(self) -> Self {
        match self {
            PageState::Fetching { page_number } => PageState::Exhausted { pages: page_number },
            other => other,
        }
    }

    pub fn failed(self) -> Self {
        match self {
            PageState::Fetching { page_number } => PageState::Failed { page_number },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PageState::Exhausted { .. } | PageState::Failed { .. })
    }
}

/// One received page of raw records
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub records: Vec<Value>,
}

/// How a traversal requests pages
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub page_size: usize,
    /// Treat a non-array body as an error rather than the end of the data
    pub strict_responses: bool,
    pub cancel: CancellationToken,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            strict_responses: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Lazily fetch pages until the data is exhausted or a request fails.
///
/// The stream ends after yielding the first error.
pub fn pages<'a, A>(
    api: &'a A,
    filters: &'a SearchFilters,
    options: PageOptions,
) -> impl Stream<Item = Result<Page>> + 'a
where
    A: RecordsApi + ?Sized,
{
    stream! {
        let mut state = PageState::start();

        while let PageState::Fetching { page_number } = state {
            let request = filters.page_request(page_number, options.page_size);

            let fetched = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => Err(Error::Cancelled),
                result = api.fetch_page(&request) => result,
            };

            match fetched {
                Ok(PageBody::Records(records)) => {
                    debug!(page = page_number, records = records.len(), "page received");
                    state = state.received(records.len());
                    yield Ok(Page { number: page_number, records });
                    state = state.advance(options.page_size);
                }
                Ok(PageBody::Malformed(kind)) if options.strict_responses => {
                    state = state.failed();
                    yield Err(Error::MalformedResponse { page: page_number, kind });
                }
                Ok(PageBody::Malformed(kind)) => {
                    warn!(page = page_number, kind, "response is not a record array, treating it as the last page");
                    state = state.exhausted();
                }
                Err(e) => {
                    state = state.failed();
                    yield Err(e);
                }
            }
        }

        debug!(?state, "pagination finished");
    }
}
