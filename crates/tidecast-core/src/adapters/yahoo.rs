use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::circuit_breaker::{BreakerState, CircuitBreaker};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider::{
    HealthState, HealthStatus, HistoryRequest, PriceProvider, ProviderError,
};
use crate::retry::RetryConfig;
use crate::{PriceRow, PriceTable, Symbol};

/// Yahoo Finance daily-history adapter.
///
/// Supports two modes keyed on the injected transport: a real client hits
/// the public v8 chart endpoint; the default no-op transport switches the
/// adapter to deterministic symbol-seeded mock history, which is what the
/// test suite and offline runs use.
#[derive(Clone)]
pub struct YahooDailyAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    use_real_api: bool,
}

impl Default for YahooDailyAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            retry: RetryConfig::default(),
            use_real_api: false,
        }
    }
}

impl YahooDailyAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            use_real_api,
            ..Self::default()
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn chart_endpoint(req: &HistoryRequest) -> String {
        format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?range={}&interval=1d&includeAdjustedClose=true",
            urlencoding::encode(req.symbol.as_str()),
            req.range.as_str(),
        )
    }

    /// Execute one guarded transport call, recording breaker outcomes.
    async fn execute_guarded(&self, endpoint: &str) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            if !self.circuit_breaker.allow_request() {
                return Err(ProviderError::unavailable(
                    "yahoo circuit breaker is open; skipping upstream call",
                ));
            }

            let request = HttpRequest::get(endpoint)
                .with_header("referer", "https://finance.yahoo.com/")
                .with_timeout_ms(10_000);

            let outcome = match self.http_client.execute(request).await {
                Ok(response) if response.status == 404 => {
                    // Unknown ticker is a definitive answer, not an outage.
                    self.circuit_breaker.record_success();
                    return Err(ProviderError::not_found(format!(
                        "yahoo has no data at {endpoint}"
                    )));
                }
                Ok(response) if response.status == 429 => {
                    self.circuit_breaker.record_failure();
                    Err(ProviderError::rate_limited("yahoo throttled the request"))
                }
                Ok(response) if !response.is_success() => {
                    self.circuit_breaker.record_failure();
                    Err(ProviderError::unavailable(format!(
                        "yahoo upstream returned status {}",
                        response.status
                    )))
                }
                Ok(response) => {
                    self.circuit_breaker.record_success();
                    Ok(response.body)
                }
                Err(error) => {
                    self.circuit_breaker.record_failure();
                    if error.is_timeout() {
                        Err(ProviderError::timeout(format!(
                            "yahoo transport timed out: {}",
                            error.message()
                        )))
                    } else if error.retryable() {
                        Err(ProviderError::unavailable(format!(
                            "yahoo transport error: {}",
                            error.message()
                        )))
                    } else {
                        Err(ProviderError::internal(format!(
                            "yahoo transport error: {}",
                            error.message()
                        )))
                    }
                }
            };

            match outcome {
                Ok(body) => return Ok(body),
                Err(error) if error.retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff.delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying yahoo request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_real_history(&self, req: &HistoryRequest) -> Result<PriceTable, ProviderError> {
        let endpoint = Self::chart_endpoint(req);
        let body = self.execute_guarded(&endpoint).await?;
        parse_chart_body(&req.symbol, &body)
    }

    async fn fetch_mock_history(&self, req: &HistoryRequest) -> Result<PriceTable, ProviderError> {
        // Still run the transport so injected failing clients can exercise
        // the breaker and error paths deterministically.
        let endpoint = Self::chart_endpoint(req);
        self.execute_guarded(&endpoint).await?;

        let days = req.range.approx_days();
        let today = OffsetDateTime::now_utc().date();
        let seed = symbol_seed(&req.symbol);
        let mut rows = Vec::with_capacity(days);

        for index in 0..days {
            let date = today - Duration::days((days - index) as i64);
            let close = mock_close(seed, index);
            let volume = 1_500_000.0 + ((seed + index as u64 * 31) % 900_000) as f64;

            let row = PriceRow::new(
                date,
                Some(close - 0.20),
                Some(close + 0.60),
                Some(close - 0.70),
                Some(close),
                Some(close - 0.10),
                Some(volume),
            )
            .map_err(|error| ProviderError::internal(format!("mock row invalid: {error}")))?;
            rows.push(row);
        }

        debug!(symbol = %req.symbol, rows = rows.len(), "generated mock yahoo history");
        Ok(PriceTable::from_rows(req.symbol.clone(), rows))
    }
}

impl PriceProvider for YahooDailyAdapter {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceTable, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_history(&req).await
            } else {
                self.fetch_mock_history(&req).await
            }
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move {
            let state = match self.circuit_breaker.state() {
                BreakerState::Closed => HealthState::Healthy,
                BreakerState::HalfOpen => HealthState::Degraded,
                BreakerState::Open => HealthState::Unhealthy,
            };
            HealthStatus::new(state, self.circuit_breaker.consecutive_failures())
        })
    }
}

/// Deterministic pseudo-price for mock mode: drift plus a weekly wobble.
fn mock_close(seed: u64, index: usize) -> f64 {
    const WEEKLY: [f64; 7] = [0.0, 0.4, 0.9, 0.6, 0.2, -0.3, -0.5];
    let base = 20.0 + (seed % 200) as f64;
    let drift = index as f64 * 0.02;
    let noise = ((seed.wrapping_add(index as u64 * 7)) % 13) as f64 * 0.05;
    base + drift + WEEKLY[index % 7] + noise
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol
        .as_str()
        .bytes()
        .fold(0u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u64))
}

fn parse_chart_body(symbol: &Symbol, body: &str) -> Result<PriceTable, ProviderError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = &chart_response.chart.error {
        let description = error
            .description
            .clone()
            .unwrap_or_else(|| String::from("unspecified chart error"));
        return if error.code.as_deref() == Some("Not Found") {
            Err(ProviderError::not_found(format!(
                "yahoo chart error for {symbol}: {description}"
            )))
        } else {
            Err(ProviderError::unavailable(format!(
                "yahoo chart error for {symbol}: {description}"
            )))
        };
    }

    let result = chart_response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::not_found(format!("yahoo returned no chart for {symbol}")))?;

    let timestamps = result
        .timestamp
        .unwrap_or_default();
    if timestamps.is_empty() {
        return Err(ProviderError::not_found(format!(
            "yahoo returned zero rows for {symbol}"
        )));
    }

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::internal("no quote block in chart response"))?;
    let adjclose = result
        .indicators
        .adjclose
        .and_then(|blocks| blocks.into_iter().next())
        .map(|block| block.adjclose)
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = unix_date(ts)?;
        let row = PriceRow::new(
            date,
            cell(&quote.open, i),
            cell(&quote.high, i),
            cell(&quote.low, i),
            cell(&quote.close, i),
            cell(&adjclose, i),
            quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .map(|volume| volume as f64),
        );

        // Drop rows the provider filled with garbage rather than failing
        // the whole table.
        match row {
            Ok(row) => rows.push(row),
            Err(error) => debug!(%symbol, %error, "skipping invalid yahoo row"),
        }
    }

    if rows.is_empty() {
        return Err(ProviderError::not_found(format!(
            "yahoo returned no usable rows for {symbol}"
        )));
    }

    Ok(PriceTable::from_rows(symbol.clone(), rows))
}

fn cell(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

fn unix_date(ts: i64) -> Result<Date, ProviderError> {
    OffsetDateTime::from_unix_timestamp(ts)
        .map(|dt| dt.date())
        .map_err(|e| ProviderError::internal(format!("invalid timestamp {ts}: {e}")))
}

// Yahoo Finance chart API response structures

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooAdjClose {
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{HistoryRange, ProviderErrorKind};

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("symbol must parse")
    }

    #[tokio::test]
    async fn mock_history_is_sorted_and_deterministic() {
        let adapter = YahooDailyAdapter::default();
        let request = HistoryRequest::daily(symbol("AAPL"));

        let first = adapter.history(request.clone()).await.expect("history");
        let second = adapter.history(request).await.expect("history");

        assert_eq!(first, second);
        assert!(first.len() >= 500);

        let dates: Vec<_> = first.dates().collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn mock_history_differs_per_symbol() {
        let adapter = YahooDailyAdapter::default();

        let glw = adapter
            .history(HistoryRequest::new(symbol("GLW"), HistoryRange::OneYear))
            .await
            .expect("history");
        let tsla = adapter
            .history(HistoryRequest::new(symbol("TSLA"), HistoryRange::OneYear))
            .await
            .expect("history");

        assert_ne!(glw.rows()[0].close, tsla.rows()[0].close);
    }

    #[test]
    fn parses_chart_body_with_adjclose() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [30.0, 30.4],
                            "high": [30.8, 31.0],
                            "low": [29.5, 30.1],
                            "close": [30.5, 30.9],
                            "volume": [1000000, null]
                        }],
                        "adjclose": [{"adjclose": [30.2, 30.6]}]
                    }
                }],
                "error": null
            }
        }"#;

        let table = parse_chart_body(&symbol("GLW"), body).expect("must parse");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].adjusted_close, Some(30.2));
        assert_eq!(table.rows()[1].volume, None);
    }

    #[test]
    fn chart_error_maps_to_not_found() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        }"#;

        let error = parse_chart_body(&symbol("ZZZZ"), body).expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::NotFound);
    }

    #[test]
    fn empty_timestamps_map_to_not_found() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [],
                    "indicators": {"quote": [{"open": [], "high": [], "low": [], "close": [], "volume": []}]}
                }],
                "error": null
            }
        }"#;

        let error = parse_chart_body(&symbol("GLW"), body).expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::NotFound);
    }
}
