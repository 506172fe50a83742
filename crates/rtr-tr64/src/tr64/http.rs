//! HTTP seam for the digest client.
//!
//! `DigestClient` talks to routers only through `SoapTransport`, so tests can
//! script router answers without a TLS endpoint.

use crate::tr64::envelope::CONTENT_TYPE_XML;
use crate::tr64::error::{Tr64Error, Tr64Result};
use crate::tr64::types::{FileResponse, SoapResponse, Tr64Config};
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

#[async_trait]
pub trait SoapTransport: Send + Sync {
    /// POST an envelope. Non-2xx statuses are returned, not raised.
    async fn post(&self, url: &str, soap_action: &str, envelope: String)
        -> Tr64Result<SoapResponse>;

    /// GET a file. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str) -> Tr64Result<FileResponse>;
}

/// Build the shared HTTP client for one router.
pub fn build_http_client(config: &Tr64Config) -> Tr64Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_sec))
        .connect_timeout(Duration::from_secs(config.timeout_sec.min(15)));

    if config.accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| Tr64Error::invalid_config(format!("Failed to build HTTP client: {}", e)))
}

/// `SoapTransport` over a caller-supplied `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpSoapTransport {
    client: reqwest::Client,
}

impl HttpSoapTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Tr64Config) -> Tr64Result<Self> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn post(
        &self,
        url: &str,
        soap_action: &str,
        envelope: String,
    ) -> Tr64Result<SoapResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_XML));
        headers.insert(
            HeaderName::from_static("soapaction"),
            HeaderValue::from_str(soap_action)
                .map_err(|e| Tr64Error::invalid_config(format!("Invalid SoapAction: {}", e)))?,
        );

        debug!("TR-064 POST {} ({}, {} bytes)", url, soap_action, envelope.len());
        trace!("TR-064 request body:\n{}", envelope);

        let resp = self
            .client
            .post(url)
            .headers(headers)
            .body(envelope)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!("TR-064 response: status={}, body length={}", status, body.len());

        Ok(SoapResponse { status, body })
    }

    async fn get(&self, url: &str) -> Tr64Result<FileResponse> {
        debug!("TR-064 GET {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let data = resp.bytes().await?.to_vec();
        trace!("TR-064 GET: status={}, {} bytes", status, data.len());
        Ok(FileResponse { status, data })
    }
}
