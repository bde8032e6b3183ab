//! Ordered fallback over alternative data sources.
//!
//! Each strategy is attempted in order until one is accepted. Attempts that
//! produce data below the caller's quality bar are kept, so the caller can
//! still fall back to the best partial result once the list is exhausted.

use common::Error;
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// Verdict of one strategy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    /// Good enough; stop here.
    Accept(T),
    /// Usable but below the bar; keep trying the rest.
    Insufficient(T),
}

/// Tagged result of a fallback chain.
#[derive(Debug)]
pub enum FallbackOutcome<S, T> {
    Found {
        strategy: S,
        data: T,
    },
    Exhausted {
        /// Below-the-bar results, in strategy order.
        insufficient: Vec<(S, T)>,
        /// Strategies that errored, in strategy order.
        failures: Vec<(S, Error)>,
    },
}

/// Try `strategies` in order, returning the first accepted result.
pub async fn first_success<S, T, I, F, Fut>(strategies: I, mut attempt: F) -> FallbackOutcome<S, T>
where
    S: Clone + Debug,
    I: IntoIterator<Item = S>,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, Error>>,
{
    let mut insufficient = Vec::new();
    let mut failures = Vec::new();

    for strategy in strategies {
        match attempt(strategy.clone()).await {
            Ok(Attempt::Accept(data)) => {
                debug!("Strategy {:?} accepted", strategy);
                return FallbackOutcome::Found { strategy, data };
            }
            Ok(Attempt::Insufficient(data)) => {
                debug!("Strategy {:?} returned too little data, trying next", strategy);
                insufficient.push((strategy, data));
            }
            Err(e) => {
                debug!("Strategy {:?} failed: {}", strategy, e);
                failures.push((strategy, e));
            }
        }
    }

    FallbackOutcome::Exhausted {
        insufficient,
        failures,
    }
}
