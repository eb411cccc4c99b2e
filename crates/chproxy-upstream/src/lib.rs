use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tracing::debug;
use wreq::Client;

use chproxy_common::ProxyError;
use chproxy_protocol::chutes::request::ChutesChatRequest;

pub const CHUTES_CHAT_URL: &str = "https://chutes.ai/app/api/chat";

/// The header profile the upstream expects: a browser session on
/// chutes.ai, down to the client-hint headers.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Content-Type", "text/plain;charset=UTF-8"),
    ("Origin", "https://chutes.ai"),
    ("Pragma", "no-cache"),
    ("Referer", "https://chutes.ai/"),
    (
        "Sec-Ch-Ua",
        "\"Not A(Brand\";v=\"99\", \"Google Chrome\";v=\"121\", \"Chromium\";v=\"121\"",
    ),
    ("Sec-Ch-Ua-Mobile", "?0"),
    ("Sec-Ch-Ua-Platform", "\"Linux\""),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-origin"),
    (
        "User-Agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    ),
];

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Bound on the gap between consecutive stream reads.
    pub stream_idle_timeout: Duration,
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(86400),
            stream_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Body of an upstream response, either fully buffered (non-success and
/// aggregation paths) or pumped chunk-by-chunk. Stream items carry read
/// failures forward so the consumer can close with an error signal instead
/// of truncating silently.
#[derive(Debug)]
pub enum UpstreamBody {
    Buffered(Bytes),
    Stream(tokio::sync::mpsc::Receiver<Result<Bytes, io::Error>>),
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone)]
pub struct ChutesClient {
    client: Client,
    stream_idle_timeout: Duration,
}

impl ChutesClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .read_timeout(config.stream_idle_timeout)
            .build()?;
        Ok(Self {
            client,
            stream_idle_timeout: config.stream_idle_timeout,
        })
    }

    /// POSTs the translated request to the chat endpoint. With
    /// `want_stream`, a success body is handed back as a live byte stream;
    /// otherwise (and for any non-success status) it is buffered whole.
    pub async fn send(
        &self,
        request: &ChutesChatRequest,
        want_stream: bool,
    ) -> Result<UpstreamResponse, ProxyError> {
        let body = serde_json::to_vec(request)?;

        let mut builder = self.client.post(CHUTES_CHAT_URL);
        for (name, value) in BROWSER_HEADERS {
            builder = builder.header(*name, *value);
        }

        let resp = builder
            .body(body)
            .send()
            .await
            .map_err(|err| ProxyError::Transport(err.to_string()))?;

        let status = resp.status().as_u16();
        debug!(status, chute = %request.chute_name, "upstream responded");

        let is_success = (200..300).contains(&status);
        if !is_success || !want_stream {
            let body = resp
                .bytes()
                .await
                .map_err(|err| ProxyError::Transport(err.to_string()))?;
            return Ok(UpstreamResponse {
                status,
                body: UpstreamBody::Buffered(body),
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, io::Error>>(16);
        let idle_timeout = self.stream_idle_timeout;
        tokio::spawn(async move {
            let mut stream = resp.bytes_stream();
            loop {
                let next = tokio::time::timeout(idle_timeout, stream.next()).await;
                let item = match next {
                    Ok(item) => item,
                    Err(_) => {
                        let _ = tx
                            .send(Err(io::Error::new(
                                io::ErrorKind::TimedOut,
                                "upstream stream idle timeout",
                            )))
                            .await;
                        break;
                    }
                };
                let Some(item) = item else {
                    break;
                };
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx.send(Err(io::Error::other(err.to_string()))).await;
                        break;
                    }
                };
                // A closed receiver means the downstream client went away;
                // dropping the stream releases the upstream connection.
                if tx.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
        });

        Ok(UpstreamResponse {
            status,
            body: UpstreamBody::Stream(rx),
        })
    }
}
