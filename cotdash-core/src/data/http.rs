//! HTTP time-series endpoint fetcher.
//!
//! POSTs a historic-snap query for one ticker and parses the CSV answer
//! (`Date,Last,Message`). Rows whose message says there was no response for
//! that date are dropped. Transient failures are retried with exponential
//! backoff.

use super::provider::{DataError, SeriesFetcher};
use crate::domain::{Identifier, SeriesPoint};
use chrono::NaiveDate;
use std::time::{Duration, Instant};

const NO_RESPONSE: &str = "No response for date";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Connection and query settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFetcherOptions {
    pub base_url: String,
    /// Appended to the identifier to form the upstream ticker.
    pub ticker_suffix: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/workflows/run/HistoricSnapperTimeSeries.csv".into(),
            ticker_suffix: String::new(),
            field: "Price".into(),
            start_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2199, 1, 1).unwrap_or_default(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Fetches one series per request from the time-series endpoint.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    options: HttpFetcherOptions,
}

impl HttpFetcher {
    pub fn new(options: HttpFetcherOptions) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &HttpFetcherOptions {
        &self.options
    }

    fn query(&self, identifier: &Identifier) -> Vec<(&'static str, String)> {
        vec![
            ("StartDate", self.options.start_date.format("%Y-%m-%d").to_string()),
            ("EndDate", self.options.end_date.format("%Y-%m-%d").to_string()),
            ("SnapFields", "Last".to_string()),
            ("Field", self.options.field.clone()),
            ("Tickers", format!("{identifier}{}", self.options.ticker_suffix)),
        ]
    }

    fn fetch_with_retry(&self, identifier: &Identifier) -> Result<String, DataError> {
        let query = self.query(identifier);
        let mut last_error = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.options.retry_delay, attempt);
                tracing::debug!(%identifier, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            match self.client.post(&self.options.base_url).query(&query).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::unavailable(identifier, "endpoint returned 404"));
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {identifier}")));
                        continue;
                    }

                    return resp
                        .text()
                        .map_err(|e| DataError::ResponseFormatChanged(format!("unreadable body for {identifier}: {e}")));
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// `base * 2^(attempt - 1)`, capped at one minute.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

impl SeriesFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, identifier: &Identifier) -> Result<Vec<SeriesPoint>, DataError> {
        tracing::info!(%identifier, "downloading series");
        let started = Instant::now();

        let body = self.fetch_with_retry(identifier)?;
        let points = parse_response(identifier, &body)?;

        tracing::info!(
            %identifier,
            points = points.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downloaded series"
        );
        Ok(points)
    }
}

/// Parse the endpoint's CSV body. Column names are matched case-insensitively.
pub fn parse_response(identifier: &Identifier, body: &str) -> Result<Vec<SeriesPoint>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| DataError::ResponseFormatChanged(format!("bad header for {identifier}: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (Some(date_idx), Some(last_idx)) = (column("date"), column("last")) else {
        return Err(DataError::ResponseFormatChanged(format!(
            "expected Date and Last columns for {identifier}, got {headers:?}"
        )));
    };
    let message_idx = column("message");

    let mut points = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DataError::ResponseFormatChanged(format!("row {line}: {e}")))?;

        if message_idx.and_then(|i| record.get(i)) == Some(NO_RESPONSE) {
            continue;
        }
        let (Some(date), Some(value)) = (record.get(date_idx), record.get(last_idx)) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        // dates may carry a time component
        let date = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d")
            .map_err(|e| DataError::ResponseFormatChanged(format!("row {line}: bad date '{date}': {e}")))?;
        let value: f64 = value
            .parse()
            .map_err(|e| DataError::ResponseFormatChanged(format!("row {line}: bad value '{value}': {e}")))?;
        points.push(SeriesPoint::new(date, value));
    }

    if points.is_empty() {
        return Err(DataError::unavailable(identifier, "endpoint returned no observations"));
    }
    Ok(points)
}
