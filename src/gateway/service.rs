use std::future::Future;

use rsa::RsaPrivateKey;
use thiserror::Error;

use crate::codes::{self, Certificate};
use crate::core::*;
use crate::envelope;

use super::adapter::{decode_sale_request, encode_ping_response, encode_sale_response};
use super::config::GatewayConfig;
use super::dto::{PingResponse, SaleRequest, SaleResponse};

/// Key material resolved by the certificate store for one request.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub certificate: Certificate,
    pub private_key: RsaPrivateKey,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateStoreError {
    #[error("certificate '{0}' not found")]
    NotFound(String),

    #[error("wrong password for certificate '{0}'")]
    InvalidPassword(String),

    #[error("certificate store: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("authority unreachable: {0}")]
    Unreachable(String),

    #[error("authority answered with HTTP {status}")]
    Status { status: u16 },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Any failure on the gateway's side of a submission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("invalid request: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Certificate(#[from] CertificateStoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot compute security codes: {0}")]
    Signing(#[from] SigningError),

    #[error("cannot build request: {0}")]
    Encode(#[from] EncodeError),

    #[error("cannot read authority response: {0}")]
    Decode(#[from] DecodeError),
}

/// Looks up the taxpayer's signing certificate and key.
pub trait CertificateStore: Send + Sync {
    fn credentials(
        &self,
        cert_id: &str,
        password: Option<&str>,
    ) -> impl Future<Output = Result<SigningCredentials, CertificateStoreError>> + Send;
}

/// Carries envelopes to the authority.
pub trait Transport: Send + Sync {
    /// POST a request envelope and return the response envelope.
    fn send(&self, envelope: Vec<u8>) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Check that the authority endpoint answers.
    fn ping(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// The sale-registration pipeline: validate, sign, send, interpret.
pub struct Gateway<S, T> {
    config: GatewayConfig,
    store: S,
    transport: T,
    clock: Box<dyn Clock>,
    uuids: Box<dyn UuidSource>,
}

impl<S: CertificateStore, T: Transport> Gateway<S, T> {
    pub fn new(config: GatewayConfig, store: S, transport: T) -> Self {
        Self {
            config,
            store,
            transport,
            clock: Box::new(SystemClock),
            uuids: Box::new(RandomUuid),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_uuid_source(mut self, uuids: impl UuidSource + 'static) -> Self {
        self.uuids = Box::new(uuids);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Submit a sale and return the authority's verdict.
    pub async fn submit(&self, request: &SaleRequest) -> Result<AuthorityResponse, GatewayError> {
        let fields = decode_sale_request(request, self.config.uuid_policy, self.uuids.as_ref())
            .map_err(GatewayError::Validation)?;
        let mut transaction = build_transaction(fields, self.clock.as_ref());
        let message_uuid = transaction.header.message_uuid;
        tracing::debug!(%message_uuid, "sale request validated");

        let cert_id = request.cert_id.as_deref().unwrap_or_default();
        let credentials = self
            .store
            .credentials(cert_id, request.cert_password.as_deref())
            .await?;

        codes::compute_security_codes(&mut transaction, &credentials.private_key)?;
        let envelope = envelope::build_request_envelope(
            &transaction,
            &credentials.certificate,
            &credentials.private_key,
        )?;

        let reply = self.transport.send(envelope).await.inspect_err(|e| {
            tracing::warn!(%message_uuid, error = %e, "transport failed");
        })?;
        tracing::debug!(%message_uuid, bytes = reply.len(), "authority replied");

        Ok(envelope::parse_response_envelope(&transaction, &reply)?)
    }

    /// Submit a sale and map the outcome to the JSON response.
    pub async fn send_sale(&self, request: &SaleRequest) -> SaleResponse {
        encode_sale_response(self.submit(request).await)
    }

    /// Report gateway and authority availability.
    pub async fn ping(&self) -> PingResponse {
        let reachable = match self.transport.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "authority ping failed");
                false
            }
        };
        encode_ping_response(reachable)
    }
}
