//! Public address resolution loop
//!
//! Each round tries the configured endpoints in order and publishes the
//! first address obtained. When every endpoint fails the round publishes
//! `None` ("offline") and the next round starts after the short retry delay
//! instead of the full refresh interval. Failures never leave this module.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::public_ip::{REFRESH_INTERVAL, REQUEST_TIMEOUT, RETRY_DELAY};
use crate::data::PublicNetSnapshot;
use crate::error::{DevprintError, Result};
use crate::settings::{EndpointConfig, EndpointFormat, PublicIpSettings};
use crate::stream::{Emitter, Registration, StateStream};

/// One source of "what is my public address"
#[async_trait]
pub trait IpEndpoint: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<IpAddr>;
}

#[derive(Deserialize)]
struct IpResponse {
    ip: String,
}

/// Parse an endpoint response body
pub fn parse_ip_response(format: EndpointFormat, body: &str) -> Result<IpAddr> {
    let text = match format {
        EndpointFormat::Json => serde_json::from_str::<IpResponse>(body)?.ip,
        EndpointFormat::Text => body.to_string(),
    };
    let text = text.trim();
    text.parse::<IpAddr>()
        .map_err(|_| DevprintError::InvalidAddress(text.to_string()))
}

/// HTTP(S) endpoint queried with reqwest
pub struct HttpIpEndpoint {
    client: reqwest::Client,
    url: String,
    format: EndpointFormat,
}

impl HttpIpEndpoint {
    pub fn new(client: reqwest::Client, config: &EndpointConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            format: config.format,
        }
    }
}

#[async_trait]
impl IpEndpoint for HttpIpEndpoint {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DevprintError::network(format!("{}: {}", self.url, e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| DevprintError::network(format!("{}: {}", self.url, e)))?;

        parse_ip_response(self.format, &body)
    }
}

/// Delays between resolution rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSchedule {
    pub refresh_interval: Duration,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ResolverSchedule {
    fn default() -> Self {
        Self {
            refresh_interval: REFRESH_INTERVAL,
            retry_delay: RETRY_DELAY,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ResolverSchedule {
    /// Wait before the next round
    pub fn next_delay(&self, resolved: bool) -> Duration {
        if resolved {
            self.refresh_interval
        } else {
            self.retry_delay
        }
    }
}

pub struct PublicIpResolver {
    endpoints: Vec<Arc<dyn IpEndpoint>>,
    schedule: ResolverSchedule,
}

impl PublicIpResolver {
    pub fn new(endpoints: Vec<Arc<dyn IpEndpoint>>, schedule: ResolverSchedule) -> Self {
        Self {
            endpoints,
            schedule,
        }
    }

    /// HTTP endpoints and timings from settings
    pub fn from_settings(settings: &PublicIpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| DevprintError::network(format!("Failed to build HTTP client: {}", e)))?;

        let endpoints = settings
            .endpoints
            .iter()
            .map(|config| Arc::new(HttpIpEndpoint::new(client.clone(), config)) as Arc<dyn IpEndpoint>)
            .collect();

        let schedule = ResolverSchedule {
            refresh_interval: settings.refresh_interval(),
            retry_delay: settings.retry_delay(),
            request_timeout: settings.request_timeout(),
        };

        Ok(Self::new(endpoints, schedule))
    }

    pub fn schedule(&self) -> ResolverSchedule {
        self.schedule
    }

    /// Query one endpoint, bounded by the request timeout
    pub async fn fetch_bounded(&self, endpoint: &dyn IpEndpoint) -> Result<IpAddr> {
        let limit = self.schedule.request_timeout;
        tokio::time::timeout(limit, endpoint.fetch())
            .await
            .map_err(|_| DevprintError::Timeout(format!("{} after {:?}", endpoint.name(), limit)))?
    }

    /// One round: first endpoint to answer wins, `None` if all fail
    pub async fn resolve_once(&self) -> Option<PublicNetSnapshot> {
        for endpoint in &self.endpoints {
            match self.fetch_bounded(endpoint.as_ref()).await {
                Ok(ip) => {
                    debug!("Public address {} from {}", ip, endpoint.name());
                    return Some(PublicNetSnapshot::new(ip));
                }
                Err(e) => warn!("Public address endpoint failed: {}", e),
            }
        }

        warn!("All {} public address endpoints failed; reporting offline", self.endpoints.len());
        None
    }

    /// Start the resolution loop on the current tokio runtime.
    ///
    /// The loop stops once the returned stream (and every clone of it) is
    /// dropped.
    pub fn spawn(self) -> StateStream<Option<PublicNetSnapshot>> {
        StateStream::from_registration(None, move |emitter| {
            let handle = tokio::spawn(self.run(emitter));
            Registration::new(move || handle.abort())
        })
    }

    async fn run(self, emitter: Emitter<Option<PublicNetSnapshot>>) {
        info!("Public address resolver started with {} endpoints", self.endpoints.len());
        loop {
            let resolved = self.resolve_once().await;
            let delay = self.schedule.next_delay(resolved.is_some());

            if !emitter.emit(resolved) {
                break;
            }
            tokio::time::sleep(delay).await;
        }
        info!("Public address resolver stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEndpoint {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl IpEndpoint for FailingEndpoint {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self) -> Result<IpAddr> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DevprintError::network("connection refused"))
        }
    }

    /// Fails the first `failures` calls, then answers
    struct FlakyEndpoint {
        calls: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl IpEndpoint for FlakyEndpoint {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch(&self) -> Result<IpAddr> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(DevprintError::network("unreachable"))
            } else {
                Ok(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
            }
        }
    }

    struct SlowEndpoint;

    #[async_trait]
    impl IpEndpoint for SlowEndpoint {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self) -> Result<IpAddr> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        }
    }

    #[test]
    fn test_parse_responses() {
        assert_eq!(
            parse_ip_response(EndpointFormat::Json, r#"{"ip":"198.51.100.4"}"#).unwrap(),
            "198.51.100.4".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            parse_ip_response(EndpointFormat::Text, "2001:db8::1\n").unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
        assert!(matches!(
            parse_ip_response(EndpointFormat::Text, "<html>"),
            Err(DevprintError::InvalidAddress(_))
        ));
        assert!(parse_ip_response(EndpointFormat::Json, "198.51.100.4").is_err());
    }

    #[test]
    fn test_schedule_delays() {
        let schedule = ResolverSchedule::default();
        assert_eq!(schedule.next_delay(true), Duration::from_secs(900));
        assert_eq!(schedule.next_delay(false), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_all_endpoints_failing_yields_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let endpoints: Vec<Arc<dyn IpEndpoint>> = (0..4)
            .map(|_| Arc::new(FailingEndpoint { calls: Arc::clone(&calls) }) as Arc<dyn IpEndpoint>)
            .collect();
        let resolver = PublicIpResolver::new(endpoints, ResolverSchedule::default());

        assert_eq!(resolver.resolve_once().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let endpoints: Vec<Arc<dyn IpEndpoint>> = vec![
            Arc::new(FailingEndpoint { calls: Arc::clone(&calls) }),
            Arc::new(FlakyEndpoint { calls: AtomicUsize::new(0), failures: 0 }),
            Arc::new(FailingEndpoint { calls: Arc::clone(&calls) }),
        ];
        let resolver = PublicIpResolver::new(endpoints, ResolverSchedule::default());

        let snapshot = resolver.resolve_once().await.unwrap();
        assert_eq!(snapshot.ip, IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_endpoint() {
        let endpoints: Vec<Arc<dyn IpEndpoint>> = vec![
            Arc::new(SlowEndpoint),
            Arc::new(FlakyEndpoint { calls: AtomicUsize::new(0), failures: 0 }),
        ];
        let resolver = PublicIpResolver::new(endpoints, ResolverSchedule::default());
        let started = tokio::time::Instant::now();

        assert!(resolver.resolve_once().await.is_some());
        let elapsed = started.elapsed();
        assert!(elapsed >= REQUEST_TIMEOUT && elapsed < REQUEST_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_endpoint_reports_timeout() {
        let resolver = PublicIpResolver::new(Vec::new(), ResolverSchedule::default());
        let err = resolver.fetch_bounded(&SlowEndpoint).await.unwrap_err();
        assert!(matches!(err, DevprintError::Timeout(ref msg) if msg.starts_with("slow")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_retries_after_failure() {
        let endpoint = Arc::new(FlakyEndpoint { calls: AtomicUsize::new(0), failures: 1 });
        let resolver = PublicIpResolver::new(vec![endpoint.clone() as Arc<dyn IpEndpoint>], ResolverSchedule::default());
        let started = tokio::time::Instant::now();

        let stream = resolver.spawn();
        let mut sub = stream.subscribe();
        let slot = sub.changed().await.unwrap();

        assert!(slot.live().unwrap().is_some());
        let elapsed = started.elapsed();
        assert!(elapsed >= RETRY_DELAY && elapsed < RETRY_DELAY + Duration::from_secs(1));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_when_stream_dropped() {
        let endpoint = Arc::new(FlakyEndpoint { calls: AtomicUsize::new(0), failures: usize::MAX });
        let resolver = PublicIpResolver::new(vec![endpoint.clone() as Arc<dyn IpEndpoint>], ResolverSchedule::default());

        let stream = resolver.spawn();
        tokio::time::sleep(Duration::from_secs(95)).await;
        let seen = endpoint.calls.load(Ordering::SeqCst);
        assert!(seen >= 3);

        drop(stream);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), seen);
    }
}
