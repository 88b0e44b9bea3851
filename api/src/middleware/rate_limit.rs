//! Per-client rate limiting for the OTP endpoints.
//!
//! Every client IP gets a fixed window of `max_requests` requests per
//! `window_seconds`. Requests over the limit are answered with `429` and the
//! localized error shape before they reach the handler. Counters live in this
//! process; each server instance limits independently.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
    web, Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::HashMap,
    future::{ready, Ready},
    rc::Rc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::warn;

use sf_shared::config::RateLimitConfig;
use sf_shared::errors::{error_codes, ErrorResponse};

use crate::i18n::{get_message, language_of};

/// Windows are pruned once this many clients are tracked
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_seconds: u64 },
    Limited { retry_after_seconds: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Request counters shared by every worker
///
/// Registered as `web::Data<RequestLimiter>`; the `RateLimit` middleware
/// looks it up on each request.
pub struct RequestLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RequestLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `client` and decide whether it may proceed
    pub async fn check(&self, client: &str) -> RateDecision {
        if !self.config.enabled {
            return RateDecision::Allowed {
                remaining: self.config.max_requests,
                reset_seconds: self.config.window_seconds,
            };
        }

        let window_length = Duration::from_secs(self.config.window_seconds.max(1));
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, window| now.duration_since(window.started) < window_length);
        }

        let window = windows
            .entry(client.to_string())
            .and_modify(|window| {
                if now.duration_since(window.started) >= window_length {
                    *window = Window { started: now, count: 0 };
                }
            })
            .or_insert(Window { started: now, count: 0 });

        let elapsed = now.duration_since(window.started);
        let reset_seconds = window_length.saturating_sub(elapsed).as_secs().max(1);

        if window.count >= self.config.max_requests {
            return RateDecision::Limited {
                retry_after_seconds: reset_seconds,
            };
        }

        window.count += 1;
        RateDecision::Allowed {
            remaining: self.config.max_requests - window.count,
            reset_seconds,
        }
    }
}

/// Key a request by client IP
fn client_ip(req: &ServiceRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        if let Some(ip) = req
            .headers()
            .get("X-Real-IP")
            .and_then(|value| value.to_str().ok())
        {
            return ip.trim().to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware; a no-op when no `RequestLimiter` is registered
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimit;

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let Some(limiter) = req.app_data::<web::Data<RequestLimiter>>().cloned() else {
                return Ok(service.call(req).await?.map_into_left_body());
            };

            let client = client_ip(&req, limiter.config().trust_proxy);

            match limiter.check(&client).await {
                RateDecision::Allowed {
                    remaining,
                    reset_seconds,
                } => {
                    let mut response = service.call(req).await?;
                    let headers = response.headers_mut();
                    headers.insert(
                        HeaderName::from_static("ratelimit-limit"),
                        HeaderValue::from(limiter.config().max_requests),
                    );
                    headers.insert(
                        HeaderName::from_static("ratelimit-remaining"),
                        HeaderValue::from(remaining),
                    );
                    headers.insert(
                        HeaderName::from_static("ratelimit-reset"),
                        HeaderValue::from(reset_seconds),
                    );
                    Ok(response.map_into_left_body())
                }
                RateDecision::Limited {
                    retry_after_seconds,
                } => {
                    warn!(
                        client = %client,
                        path = %req.path(),
                        retry_after_seconds,
                        event = "rate_limited",
                        "Rate limit exceeded"
                    );

                    let body = ErrorResponse::new(
                        error_codes::RATE_LIMIT_EXCEEDED,
                        get_message("error.rate_limited", language_of(req.request())),
                    )
                    .add_detail("retry_after_seconds", retry_after_seconds);
                    let response = HttpResponse::TooManyRequests()
                        .insert_header((RETRY_AFTER, retry_after_seconds.to_string()))
                        .json(body);

                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_limit_is_per_client() {
        let limiter = RequestLimiter::new(RateLimitConfig::new(2, 900));

        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Allowed { remaining: 1, .. }
        ));
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Allowed { remaining: 0, .. }
        ));
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Limited { retry_after_seconds } if retry_after_seconds <= 900
        ));
        assert!(matches!(
            limiter.check("10.0.0.2").await,
            RateDecision::Allowed { remaining: 1, .. }
        ));
    }

    #[actix_web::test]
    async fn test_window_resets() {
        let limiter = RequestLimiter::new(RateLimitConfig::new(1, 1));

        limiter.check("10.0.0.1").await;
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Limited { .. }
        ));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateDecision::Allowed { .. }
        ));
    }

    #[actix_web::test]
    async fn test_disabled_limiter_allows_everything() {
        let limiter = RequestLimiter::new(RateLimitConfig {
            max_requests: 0,
            ..RateLimitConfig::disabled()
        });

        for _ in 0..10 {
            assert!(matches!(
                limiter.check("10.0.0.1").await,
                RateDecision::Allowed { .. }
            ));
        }
    }

    #[test]
    fn test_client_ip_ignores_forwarded_headers_unless_trusted() {
        let req = actix_web::test::TestRequest::default()
            .peer_addr("192.168.1.5:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .to_srv_request();

        assert_eq!(client_ip(&req, false), "192.168.1.5");
        assert_eq!(client_ip(&req, true), "203.0.113.7");
    }
}
