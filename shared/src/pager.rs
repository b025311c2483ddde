//! Draining of cursor-paginated listings.
//!
//! A [`Pager`] hands out one page per call to [`Pager::next_page`] for as
//! long as [`Pager::has_next`] reports more data. [`drain`] concatenates all
//! pages in order and is guaranteed to terminate even when a source keeps
//! claiming more pages but stops delivering items.

use crate::metrics_defs::PAGES_FETCHED;
use async_trait::async_trait;

#[async_trait]
pub trait Pager: Send {
    type Item: Send;
    type Error: Send;

    fn has_next(&self) -> bool;

    /// Fetches the next page. `None` means the source signalled the end of
    /// the stream; `Some(vec![])` is an empty page.
    async fn next_page(&mut self) -> Result<Option<Vec<Self::Item>>, Self::Error>;
}

/// What to do when a source reports more pages but returns an empty one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPagePolicy {
    /// Stop draining, log a warning and keep what was collected so far.
    #[default]
    StopWithWarning,
    /// Treat the empty page as an error.
    Fail,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DrainError<E> {
    #[error("{0}")]
    Source(E),
    #[error("page source reported more pages but page {page} was empty")]
    EmptyPage { page: usize },
}

/// Drains `pager` with [`EmptyPagePolicy::StopWithWarning`].
pub async fn drain<P: Pager>(pager: P) -> Result<Vec<P::Item>, P::Error> {
    drain_pages(pager, |e| e, |_| Ok(())).await
}

pub async fn drain_with_policy<P: Pager>(
    pager: P,
    policy: EmptyPagePolicy,
) -> Result<Vec<P::Item>, DrainError<P::Error>> {
    drain_pages(pager, DrainError::Source, |page| match policy {
        EmptyPagePolicy::StopWithWarning => Ok(()),
        EmptyPagePolicy::Fail => Err(DrainError::EmptyPage { page }),
    })
    .await
}

/// Shared loop. `on_empty` is called with the 1-based page number of an
/// empty page; returning `Ok` stops draining with a warning.
async fn drain_pages<P, E, S, O>(
    mut pager: P,
    source_error: S,
    on_empty: O,
) -> Result<Vec<P::Item>, E>
where
    P: Pager,
    S: Fn(P::Error) -> E,
    O: Fn(usize) -> Result<(), E>,
{
    let mut results = Vec::new();
    let mut pages = 0;

    while pager.has_next() {
        let page = pager.next_page().await.map_err(&source_error)?;
        pages += 1;
        crate::counter!(PAGES_FETCHED).increment(1);

        match page {
            None => {
                tracing::warn!(
                    page = pages,
                    collected = results.len(),
                    "Page source ended the stream while reporting more pages"
                );
                break;
            }
            Some(items) if items.is_empty() => {
                on_empty(pages)?;
                tracing::warn!(
                    page = pages,
                    collected = results.len(),
                    "Received empty page from pager"
                );
                break;
            }
            Some(items) => results.extend(items),
        }
    }

    tracing::debug!(pages, items = results.len(), "Drained paginated listing");
    Ok(results)
}
