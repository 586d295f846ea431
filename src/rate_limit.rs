use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::{error::AppError, state::AppState};

/// Name of the limit guarding `GET /api/users/me`.
pub const USERS_ME: &str = "users_me";

/// `/me` requests allowed per client address and minute.
pub const USERS_ME_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(7) {
    Some(n) => n,
    None => unreachable!(),
};

/// Past this many tracked clients, idle entries are dropped.
const MAX_TRACKED_CLIENTS: usize = 10_000;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Named GCRA limiters keyed by client address.
///
/// Lives in [`AppState`] so every worker shares the same limiter state.
#[derive(Clone, Default)]
pub struct RateLimitStore {
    limiters: Arc<HashMap<&'static str, Arc<KeyedLimiter>>>,
}

impl RateLimitStore {
    /// The limits the API routes refer to.
    pub fn standard() -> Self {
        Self::default().with_limit(USERS_ME, Quota::per_minute(USERS_ME_PER_MINUTE))
    }

    pub fn with_limit(mut self, name: &'static str, quota: Quota) -> Self {
        Arc::make_mut(&mut self.limiters).insert(name, Arc::new(RateLimiter::keyed(quota)));
        self
    }

    /// Spends one cell of `client`'s budget under the limit `name`.
    ///
    /// Unknown limit names are not enforced.
    pub fn check(&self, name: &str, client: &str) -> Result<(), AppError> {
        let Some(limiter) = self.limiters.get(name) else {
            log::warn!("No rate limit registered as '{}'", name);
            return Ok(());
        };

        if limiter.len() > MAX_TRACKED_CLIENTS {
            limiter.retain_recent();
        }

        limiter.check_key(&client.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            AppError::TooManyRequests(format!(
                "Too many requests, retry in {} seconds",
                wait.as_secs().max(1)
            ))
        })
    }
}

/// Applies the named limit from [`RateLimitStore`] to each client address.
/// Excess requests receive 429.
#[derive(Clone, Copy)]
pub struct RateLimit {
    name: &'static str,
}

impl RateLimit {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service,
            name: self.name,
        }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    name: &'static str,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let verdict = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.rate_limits.check(self.name, &client),
            None => Ok(()),
        };

        match verdict {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                log::warn!("Rate limit '{}' exceeded by {}", self.name, client);
                let response = req.into_response(err.error_response()).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
