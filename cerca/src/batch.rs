use tokio::sync::Semaphore;
use tokio::time::Instant;

use cerca_core::{
    BatchQuoteReport, BatchSearchReport, CercaError, QuoteErrorItem, SearchErrorItem,
};

use crate::core::Cerca;

impl Cerca {
    /// Resolve many ISINs concurrently.
    ///
    /// Fan-out is bounded by the configured concurrency cap so a large batch
    /// cannot stampede the shared breaker, the cache, or the upstream. Each
    /// item's outcome is collected independently: one failure never aborts
    /// or taints the others, and every input appears exactly once across the
    /// report's `results`/`errors` lists. An optional whole-batch deadline
    /// converts still-pending items into per-item transient errors.
    pub async fn search_batch(&self, isins: &[String]) -> BatchSearchReport {
        let outcomes = self
            .run_batch(isins, |input| async move { self.search(&input).await })
            .await;

        let mut report = BatchSearchReport {
            results: Vec::new(),
            errors: Vec::new(),
        };
        for (isin, outcome) in outcomes {
            match outcome {
                Ok(record) => report.results.push(record),
                Err(error) => report.errors.push(SearchErrorItem { isin, error }),
            }
        }
        report
    }

    /// Fetch quotes for many symbols concurrently. Same fan-out, bounding,
    /// and per-item error semantics as [`Cerca::search_batch`].
    pub async fn quote_batch(&self, symbols: &[String]) -> BatchQuoteReport {
        let outcomes = self
            .run_batch(symbols, |input| async move { self.quote(&input).await })
            .await;

        let mut report = BatchQuoteReport {
            results: Vec::new(),
            errors: Vec::new(),
        };
        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(quote) => report.results.push(quote),
                Err(error) => report.errors.push(QuoteErrorItem { symbol, error }),
            }
        }
        report
    }

    async fn run_batch<T, F, Fut>(
        &self,
        inputs: &[String],
        run_one: F,
    ) -> Vec<(String, Result<T, CercaError>)>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, CercaError>>,
    {
        let semaphore = Semaphore::new(self.cfg.batch_concurrency.max(1));
        let deadline = self.cfg.request_timeout.map(|t| Instant::now() + t);

        let tasks = inputs.iter().map(|raw| {
            let input = raw.clone();
            let semaphore = &semaphore;
            let run_one = &run_one;
            async move {
                let work = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| CercaError::internal("batch semaphore closed"))?;
                    run_one(input.clone()).await
                };
                let outcome = match deadline {
                    Some(at) => match tokio::time::timeout_at(at, work).await {
                        Ok(res) => res,
                        Err(_) => Err(CercaError::transient("batch", "request deadline exceeded")),
                    },
                    None => work.await,
                };
                (input, outcome)
            }
        });

        futures::future::join_all(tasks).await
    }
}
