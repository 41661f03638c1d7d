//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap outbound backend and sink calls with a deadline
//! - Keep timeout errors distinct from the wrapped call's own errors

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The wrapped call did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Run `fut` with a deadline.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineElapsed(deadline))
}
