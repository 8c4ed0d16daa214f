//! HTTP transport to the authority's SOAP endpoint (feature `transport`).
//!
//! This module requires network access at runtime.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::envelope::SOAP_ACTION;
use crate::gateway::{GatewayConfig, Transport, TransportError};

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

fn unreachable(e: reqwest::Error) -> TransportError {
    TransportError::Unreachable(e.to_string())
}

/// SOAP 1.1 client for the endpoint selected by [`GatewayConfig`].
#[derive(Debug, Clone)]
pub struct SoapTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl SoapTransport {
    pub fn new(config: &GatewayConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(unreachable)?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for SoapTransport {
    async fn send(&self, envelope: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static(SOAP_CONTENT_TYPE))
            .header("SOAPAction", HeaderValue::from_static(SOAP_ACTION))
            .body(envelope)
            .send()
            .await
            .map_err(unreachable)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(unreachable)?;

        // SOAP faults arrive as HTTP 500 with an envelope body
        if status.is_success() || (status == StatusCode::INTERNAL_SERVER_ERROR && !body.is_empty()) {
            return Ok(body.to_vec());
        }
        Err(TransportError::Status {
            status: status.as_u16(),
        })
    }

    async fn ping(&self) -> Result<(), TransportError> {
        self.client
            .get(&self.endpoint)
            .send()
            .await
            .map(drop)
            .map_err(unreachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_mode() {
        let playground = SoapTransport::new(&GatewayConfig::default()).unwrap();
        assert_eq!(playground.endpoint(), crate::gateway::PLAYGROUND_URL);

        let production = SoapTransport::new(&GatewayConfig {
            production_mode: true,
            ..GatewayConfig::default()
        })
        .unwrap();
        assert_eq!(production.endpoint(), crate::gateway::PRODUCTION_URL);
    }
}
