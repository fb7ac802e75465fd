use std::fmt;

use bytes::Bytes;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    metrics::{self, RequestTimer},
    models::{
        DeleteByTimeParams, Envelope, Point, QueryOptions, QueryParams, SeriesParams,
        WriteOptions, WriteParams,
    },
    Result, TsdbError,
};

/// Remote endpoints, named by their path segment under the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Write,
    AsyncWrite,
    Delete,
    DeleteByTime,
    Count,
    Stats,
    Backup,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Write => "write",
            Operation::AsyncWrite => "asyncwrite",
            Operation::Delete => "delete",
            Operation::DeleteByTime => "deletebytime",
            Operation::Count => "count",
            Operation::Stats => "stats",
            Operation::Backup => "backup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// HTTP client for a single TSDB server.
///
/// Every call is one GET round trip with no retries and no redirects
/// followed; a 3xx is reported like any other non-2xx. Connections are not
/// kept idle between calls, so each request opens and closes its own.
/// Cloning is cheap and clones share nothing mutable.
#[derive(Debug, Clone)]
pub struct TsdbClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl TsdbClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TsdbError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches points of `series`, returning the server's `result` untouched.
    ///
    /// A missing `result` comes back as `Value::Null`.
    pub async fn query(&self, series: &str, opts: &QueryOptions) -> Result<Value> {
        let params = QueryParams {
            series,
            limit: opts.limit,
            offset: opts.offset,
            order: opts.order,
        };
        let result = self.call(Operation::Query, &params).await?;
        Ok(result.unwrap_or(Value::Null))
    }

    /// Like [`query`](Self::query) but decodes the result into [`Point`]s.
    pub async fn query_points(&self, series: &str, opts: &QueryOptions) -> Result<Vec<Point>> {
        match self.query(series, opts).await? {
            Value::Null => Ok(Vec::new()),
            result => Ok(serde_json::from_value(result)?),
        }
    }

    pub async fn write<V: fmt::Display>(
        &self,
        series: &str,
        value: V,
        opts: &WriteOptions,
    ) -> Result<bool> {
        self.write_to(Operation::Write, series, value, opts).await
    }

    /// Same request as [`write`](Self::write); the server acknowledges before
    /// the point is durable. The client still waits for the HTTP response.
    pub async fn asyncwrite<V: fmt::Display>(
        &self,
        series: &str,
        value: V,
        opts: &WriteOptions,
    ) -> Result<bool> {
        self.write_to(Operation::AsyncWrite, series, value, opts).await
    }

    pub async fn delete(&self, series: &str) -> Result<bool> {
        self.call(Operation::Delete, &SeriesParams { series }).await?;
        Ok(true)
    }

    pub async fn deletebytime(&self, series: &str, time: &str) -> Result<bool> {
        self.call(Operation::DeleteByTime, &DeleteByTimeParams { series, time })
            .await?;
        Ok(true)
    }

    pub async fn count(&self, series: &str) -> Result<u64> {
        let result = self
            .call(Operation::Count, &SeriesParams { series })
            .await?
            .ok_or_else(|| TsdbError::Decode("count response has no result".to_string()))?;
        Ok(serde_json::from_value(result)?)
    }

    /// Storage statistics. The body is plain JSON, not an envelope.
    pub async fn stats(&self) -> Result<Value> {
        let _timer = RequestTimer::new(Operation::Stats.path());
        let result = self
            .send(Operation::Stats, self.request(Operation::Stats))
            .await
            .and_then(|body| Ok(serde_json::from_slice::<Value>(&body)?));
        observe(Operation::Stats, result)
    }

    /// Raw database snapshot as served by the backup endpoint.
    pub async fn backup(&self) -> Result<Bytes> {
        let _timer = RequestTimer::new(Operation::Backup.path());
        let result = self
            .send(Operation::Backup, self.request(Operation::Backup))
            .await;
        observe(Operation::Backup, result)
    }

    async fn write_to<V: fmt::Display>(
        &self,
        operation: Operation,
        series: &str,
        value: V,
        opts: &WriteOptions,
    ) -> Result<bool> {
        let params = WriteParams {
            series,
            value: value.to_string(),
            time: &opts.time,
            ttl: &opts.ttl,
        };
        self.call(operation, &params).await?;
        Ok(true)
    }

    fn request(&self, operation: Operation) -> RequestBuilder {
        self.http.get(self.config.endpoint_url(operation.path()))
    }

    /// One envelope round trip: send, then unwrap `result` or the server error.
    async fn call<P>(&self, operation: Operation, params: &P) -> Result<Option<Value>>
    where
        P: Serialize + ?Sized,
    {
        let _timer = RequestTimer::new(operation.path());
        let result = self
            .send(operation, self.request(operation).query(params))
            .await
            .and_then(|body| unwrap_envelope(&body));
        observe(operation, result)
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Bytes> {
        let request = request.build()?;
        debug!(operation = %operation, url = %request.url(), "sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Only the status line decides; a non-2xx body is never parsed.
        if !status.is_success() {
            return Err(TsdbError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        debug!(operation = %operation, status = status.as_u16(), bytes = body.len(), "received response");
        Ok(body)
    }
}

fn unwrap_envelope(body: &[u8]) -> Result<Option<Value>> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    if envelope.is_error() {
        return Err(TsdbError::Remote(envelope.message.unwrap_or_default()));
    }
    Ok(envelope.result)
}

fn observe<T>(operation: Operation, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        metrics::record_error(operation.path(), err.kind());
        warn!(operation = %operation, kind = err.kind().as_str(), "request failed: {}", err);
    }
    result
}
