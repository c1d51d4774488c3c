use crate::client::RecordsApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::matcher::annotate;
use crate::pagination::{pages, Page, PageOptions};
use crate::query::SearchFilters;
use crate::types::{AnnotatedRecord, Record};
use crate::vocabulary::Vocabulary;
use futures::TryStreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fetches every page of a filtered query and keeps the records whose
/// description mentions a vocabulary term.
pub struct Retriever<A> {
    api: A,
    vocabulary: Vocabulary,
    page_size: usize,
    strict_responses: bool,
    deadline: Option<Duration>,
    cancel: CancellationToken,
}

impl<A: RecordsApi> Retriever<A> {
    /// Create a retriever with the built-in vocabulary
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            api,
            vocabulary: Vocabulary::default(),
            page_size: config.page_size,
            strict_responses: config.strict_responses,
            deadline: config.deadline,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Abort in-flight retrievals when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Matching records, newest publication first.
    ///
    /// Any failed page fails the whole call; records from earlier pages are
    /// dropped.
    pub async fn fetch_matching_records(&self, filters: &SearchFilters) -> Result<Vec<AnnotatedRecord>> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.collect(filters))
                .await
                .map_err(|_| {
                    Error::Timeout(format!("retrieval did not finish within {:?}", deadline))
                })?,
            None => self.collect(filters).await,
        }
    }

    async fn collect(&self, filters: &SearchFilters) -> Result<Vec<AnnotatedRecord>> {
        let options = PageOptions {
            page_size: self.page_size,
            strict_responses: self.strict_responses,
            cancel: self.cancel.clone(),
        };
        let vocabulary = &self.vocabulary;

        let mut matched = pages(&self.api, filters, options)
            .try_fold(Vec::new(), |mut matched, page| async move {
                matched.extend(annotate_page(page, vocabulary));
                Ok(matched)
            })
            .await?;

        sort_by_publication_date(&mut matched);
        info!(matched = matched.len(), "retrieval finished");
        Ok(matched)
    }
}

/// Decode and match one page, discarding everything that did not match
fn annotate_page(page: Page, vocabulary: &Vocabulary) -> Vec<AnnotatedRecord> {
    let number = page.number;
    page.records
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Record>(value) {
            Ok(record) => annotate(record, vocabulary),
            Err(e) => {
                warn!(page = number, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect()
}

/// Newest publication date first. Dates are ISO-8601, so string order is
/// chronological; records without a date go last.
pub fn sort_by_publication_date(records: &mut [AnnotatedRecord]) {
    records.sort_by(|a, b| {
        b.record
            .publication_date_text()
            .cmp(a.record.publication_date_text())
    });
}
