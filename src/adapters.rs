use std::fmt::Display;
use std::path::Path;
use std::pin::Pin;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::config::Environment;
use crate::error::{DispatchError, SenderError};
use crate::ports;
use crate::types::push::{DispatchResponse, Notification};

const PRODUCTION_URL: &str = "https://api.push.apple.com";
const SANDBOX_URL: &str = "https://api.sandbox.push.apple.com";

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl ports::TimeProvider for SystemTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Sends notifications to APNs over HTTP/2, authenticated with the
/// certificate the topic was taken from.
#[derive(Clone)]
pub struct ApnsSender {
    base_url: String,
    client: reqwest::Client,
}

impl ApnsSender {
    pub fn from_files(
        certificate: &Path,
        private_key: &Path,
        environment: Environment,
    ) -> Result<Self, SenderError> {
        let certificate = read_pem(certificate)?;
        let private_key = read_pem(private_key)?;
        Self::new(&certificate, &private_key, environment)
    }

    pub fn new(
        certificate: &[u8],
        private_key: &[u8],
        environment: Environment,
    ) -> Result<Self, SenderError> {
        let mut pem = private_key.to_vec();
        pem.push(b'\n');
        pem.extend_from_slice(certificate);
        let identity = reqwest::Identity::from_pem(&pem).map_err(SenderError::Identity)?;
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .http2_prior_knowledge()
            .build()
            .map_err(SenderError::Client)?;
        let base_url = match environment {
            Environment::Production => PRODUCTION_URL,
            Environment::Sandbox => SANDBOX_URL,
        };
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, SenderError> {
    std::fs::read(path).map_err(|source| SenderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl ports::PushSender for ApnsSender {
    type Error = DispatchError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<DispatchResponse, Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, notification: &'a Notification) -> Self::Fut<'a> {
        Box::pin(async move {
            let url = format!("{}/3/device/{}", self.base_url, notification.device_token);
            let response = self
                .client
                .post(url)
                .header("apns-topic", notification.topic.as_str())
                .header(
                    "apns-expiration",
                    notification.expiration.unix_timestamp().to_string(),
                )
                .header("apns-push-type", "alert")
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(notification.payload.clone())
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.bytes().await;
            Ok::<_, DispatchError>(decode_reply(status, body))
        })
    }
}

/// The status line has already arrived, so a body that fails to read
/// still yields a response carrying that status.
fn decode_reply<B, E>(status: u16, body: Result<B, E>) -> DispatchResponse
where
    B: AsRef<[u8]>,
    E: Display,
{
    match body {
        Ok(body) => parse_response(status, body.as_ref()),
        Err(err) => {
            warn!(status, "failed to read response body: {err}");
            parse_response(status, b"")
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Builds a [`DispatchResponse`] from an APNs reply.
///
/// Successful replies have no body. Rejections carry `reason` and, for
/// unregistered tokens, `timestamp` in milliseconds since the epoch.
fn parse_response(status: u16, body: &[u8]) -> DispatchResponse {
    let parsed = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<ErrorBody>(body).ok()
    };
    let (reason, timestamp) = match parsed {
        Some(body) => (body.reason.unwrap_or_default(), body.timestamp),
        None => (String::new(), None),
    };
    DispatchResponse {
        status,
        reason,
        timestamp: timestamp.and_then(|millis| {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
        }),
    }
}
