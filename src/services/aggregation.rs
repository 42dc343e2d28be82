use futures::future::join_all;

use crate::catalog::MovieSource;
use crate::models::{MoviePage, MovieSummary};

/// Fetch one summary per id, concurrently, keeping the input order.
///
/// All fetches are launched together and the call returns only once every
/// one of them has settled. A failed fetch is dropped from the output
/// rather than failing the batch, so the result may be shorter than the
/// input. An empty input performs no fetches at all.
pub async fn fetch_summaries<S: MovieSource + ?Sized>(
    source: &S,
    ids: &[i64],
) -> Vec<MovieSummary> {
    if ids.is_empty() {
        return Vec::new();
    }

    let results = join_all(ids.iter().map(|&id| source.movie_summary(id))).await;

    ids.iter()
        .zip(results)
        .filter_map(|(&id, result)| match result {
            Ok(movie) => Some(movie),
            Err(err) => {
                tracing::warn!(movie_id = id, error = %err, "dropping favorite with failed catalog fetch");
                None
            }
        })
        .collect()
}

/// Assemble the page envelope. Totals come from the stored entry count,
/// not from the number of successfully fetched summaries; the two may
/// legitimately diverge when fetches fail.
pub fn page_envelope(
    results: Vec<MovieSummary>,
    total_results: i64,
    page: u32,
    limit: u32,
) -> MoviePage {
    let total_pages = if total_results == 0 {
        0
    } else {
        (total_results + limit as i64 - 1) / limit as i64
    };

    MoviePage {
        results,
        total_pages,
        total_results,
        page,
    }
}
