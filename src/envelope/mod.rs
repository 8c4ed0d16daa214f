//! SOAP envelope codec for the sale-registration service.
//!
//! Builds the signed request envelope (`Trzba` inside a WS-Security signed
//! SOAP body) and reads the authority's response (`Odpoved`).
//!
//! # Example
//!
//! ```no_run
//! use fiskal::codes::{self, Certificate};
//! use fiskal::core::Transaction;
//! use fiskal::envelope;
//!
//! # fn run(mut trzba: Transaction, key_pem: &str, cert_pem: &str, reply: &[u8])
//! # -> Result<(), Box<dyn std::error::Error>> {
//! let key = codes::load_private_key_pem(key_pem)?;
//! let cert = Certificate::from_pem(cert_pem)?;
//! codes::compute_security_codes(&mut trzba, &key)?;
//! let request = envelope::build_request_envelope(&trzba, &cert, &key)?;
//! // ... POST `request`, receive `reply` ...
//! let response = envelope::parse_response_envelope(&trzba, reply)?;
//! # Ok(())
//! # }
//! ```

mod parse;
mod request;
mod signature;
pub(crate) mod xml_utils;

pub use parse::{parse_request_envelope, parse_response_envelope, parse_trzba, select_timestamp};
pub use request::{build_request_envelope, render_trzba};

/// SOAP action of the sale-registration operation.
pub const SOAP_ACTION: &str = "http://fs.mfcr.cz/eet/OdeslaniTrzby";

/// Namespace URIs.
pub mod ns {
    pub const EET: &str = "http://fs.mfcr.cz/eet/schema/v3";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const SOAP: &str = "http://schemas.xmlsoap.org/soap/envelope/";
    pub const WSSE: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
    pub const WSU: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
}

/// Algorithm and token-type identifiers used in the security header.
pub mod algorithm {
    pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
    pub const BASE64_BINARY: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";
    pub const X509_V3: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3";
}
