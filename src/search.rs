use reqwest::Client;

use crate::config::AppConfig;
use crate::fetcher::search_urlscan;
use crate::models::{Criterion, CriterionReport, CriterionStatus, SearchOutcome, SearchRun};
use crate::query::criterion_query;

/// Query every criterion in order, one request at a time, and concatenate
/// the results. A criterion that fails contributes nothing but is still
/// recorded in the run's reports.
pub async fn run_searches(
    client: &Client,
    endpoint: &str,
    config: &AppConfig,
    criteria: &[Criterion],
) -> SearchRun {
    let mut run = SearchRun::default();

    for criterion in criteria {
        let query = criterion_query(criterion);
        if config.test_mode {
            println!("Realizando búsqueda para: {query}");
        }

        let status =
            match search_urlscan(client, endpoint, &config.api_key, &query, config.max_results)
                .await
            {
                Ok(SearchOutcome::Found(mut results)) => {
                    let count = results.len();
                    run.results.append(&mut results);
                    CriterionStatus::Found(count)
                }
                Ok(SearchOutcome::Rejected { status, body }) => {
                    CriterionStatus::Rejected { status, body }
                }
                Err(e) => {
                    let reason = format!("{:#}", anyhow::Error::new(e));
                    eprintln!("{reason}");
                    tracing::debug!(%query, error = %reason, "search failed");
                    CriterionStatus::Failed { reason }
                }
            };

        run.reports.push(CriterionReport {
            criterion: criterion.clone(),
            query,
            status,
        });
    }

    tracing::info!(
        criteria = criteria.len(),
        results = run.results.len(),
        failed = run.failed_count(),
        "search run finished"
    );
    run
}
