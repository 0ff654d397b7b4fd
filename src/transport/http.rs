//! Single-shot JSON POST to a remote engine.

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use hyper::ext::ReasonPhrase;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::engine::EngineResponse;
use crate::error::EngineError;

/// A configured endpoint plus the client used to reach it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    default_charset: String,
}

impl HttpTransport {
    /// `scheme` must be `http` or `https`. `timeout` bounds connecting and
    /// the whole exchange.
    pub fn new(
        scheme: &str,
        host: &str,
        port: u16,
        path: &str,
        timeout: Duration,
        default_charset: impl Into<String>,
    ) -> Result<Self> {
        if !matches!(scheme, "http" | "https") {
            bail!("unsupported scheme: {scheme}");
        }
        let raw = format!("{scheme}://{host}:{port}{path}");
        let url = Url::parse(&raw).with_context(|| format!("invalid endpoint: {raw}"))?;
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url,
            default_charset: default_charset.into(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST `body` as JSON. Only a 200 counts as success; its body is
    /// decoded with the charset the server declared, or the default, and
    /// must decode cleanly.
    pub async fn post_json(&self, body: Vec<u8>) -> Result<EngineResponse, EngineError> {
        debug!(url = %self.url, bytes = body.len(), "posting request");

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(describe(&e)))?;

        // The response owns the connection; every return below drops it.
        let status = response.status();
        if status != StatusCode::OK {
            return Err(EngineError::RemoteStatus {
                code: status.as_u16(),
                reason: reason_phrase(&response),
            });
        }

        let charset =
            declared_charset(response.headers()).unwrap_or_else(|| self.default_charset.clone());
        let body = response
            .bytes()
            .await
            .map_err(|e| EngineError::Transport(describe(&e)))?;
        let text = decode_strict(&body, &charset)?;

        // Content is always UTF-8 from here on; the server's charset is kept
        // for reference.
        Ok(EngineResponse::new(text.into_bytes())
            .with_metadata("charset", "utf-8")
            .with_metadata("response.charset", charset)
            .with_metadata("http.status", status.as_u16().to_string()))
    }
}

/// The phrase the server sent, else the standard one for the code.
fn reason_phrase(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .or_else(|| response.status().canonical_reason().map(str::to_string))
        .unwrap_or_default()
}

/// Decode `body` under the `charset` label. Unknown labels and malformed
/// bytes are errors, never replacement characters.
pub fn decode_strict(body: &[u8], charset: &str) -> Result<String, EngineError> {
    let encoding = Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| EngineError::Serialization(format!("unknown charset: {charset}")))?;
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            EngineError::Serialization(format!("response body is not valid {}", encoding.name()))
        })
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else if err.is_body() || err.is_decode() {
        format!("malformed response: {err}")
    } else {
        err.to_string()
    }
}

pub fn declared_charset(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)?
        .to_str()
        .ok()
        .and_then(charset_from_content_type)
}

/// `text/plain; charset="utf-8"` -> `utf-8`.
pub fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches('"');
        (!val.is_empty()).then(|| val.to_string())
    })
}
