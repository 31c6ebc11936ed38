use std::io;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;

use crate::{EngineSettings, TransportError};

/// Body of an open response, read line by line by the caller.
pub type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

#[async_trait::async_trait]
pub trait StreamConnector: Send + Sync {
    /// Opens `url` and returns its body once the response headers arrived.
    ///
    /// `read_timeout` bounds the whole request; `None` means the body may stay
    /// idle forever.
    async fn open(&self, url: &str, read_timeout: Option<Duration>)
        -> Result<LineReader, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestConnector {
    client: reqwest::Client,
}

impl ReqwestConnector {
    pub fn new(settings: &EngineSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl StreamConnector for ReqwestConnector {
    async fn open(
        &self,
        url: &str,
        read_timeout: Option<Duration>,
    ) -> Result<LineReader, TransportError> {
        let parsed =
            url::Url::parse(url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;

        let mut request = self.client.get(parsed);
        if let Some(timeout) = read_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|err| map_reqwest_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_connect() {
        return TransportError::Connect(err.to_string());
    }
    TransportError::Network(err.to_string())
}

/// Maps an error raised while reading a body back to a transport error.
pub(crate) fn classify_read_error(err: io::Error) -> TransportError {
    if err.kind() == io::ErrorKind::TimedOut {
        return TransportError::Timeout;
    }
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
    {
        Some(inner) => map_reqwest_error(inner),
        None => TransportError::Network(err.to_string()),
    }
}
