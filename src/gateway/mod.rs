//! Gateway surface: JSON request/response shapes, the validator registry,
//! configuration and the submission service.
//!
//! Certificate storage and HTTP transport are collaborators behind the
//! [`CertificateStore`] and [`Transport`] traits.

mod adapter;
mod config;
mod dto;
mod service;
mod validation;

pub use adapter::{
    CertificateUpload, decode_create_cert_request, decode_sale_request,
    encode_create_cert_response, encode_ping_response, encode_sale_response,
};
pub use config::{ConfigError, GatewayConfig, PLAYGROUND_URL, PRODUCTION_URL, UuidPolicy};
pub use dto::*;
pub use service::{
    CertificateStore, CertificateStoreError, Gateway, GatewayError, SigningCredentials, Transport,
    TransportError,
};
pub use validation::{FieldRule, SALE_RULES, validate_sale_request};
