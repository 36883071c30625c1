use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;

/// Shared limiter for the endpoints that spend completion tokens
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimitLayer {
    pub fn per_minute(requests: u32) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);

        RateLimitLayer {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(burst))),
        }
    }

    pub fn check(&self) -> Result<(), AppError> {
        self.limiter.check().map_err(|_| AppError::RateLimited)
    }
}

// Attach with `axum::middleware::from_fn_with_state`
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimitLayer>,
    req: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(req).await,
        Err(e) => {
            warn!("Rate limit hit on {}", req.uri().path());
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let layer = RateLimitLayer::per_minute(2);

        assert!(layer.check().is_ok());
        assert!(layer.check().is_ok());
        assert!(matches!(layer.check(), Err(AppError::RateLimited)));
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let layer = RateLimitLayer::per_minute(0);
        assert!(layer.check().is_ok());
    }
}
