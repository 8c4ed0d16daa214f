//! Security-code engine.
//!
//! Computes the two codes that authenticate every sale:
//!
//! - **signature code** (PKP): RSA PKCS#1 v1.5 signature over the SHA-256 digest
//!   of the pipe-delimited plaintext, base64-encoded;
//! - **fingerprint code** (BKP): SHA-1 of the raw signature bytes, uppercase hex
//!   in five dash-separated groups of eight.
//!
//! # Example
//!
//! ```no_run
//! use fiskal::codes;
//! use fiskal::core::Transaction;
//!
//! # fn run(mut trzba: Transaction, pem: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let key = codes::load_private_key_pem(pem)?;
//! codes::compute_security_codes(&mut trzba, &key)?;
//! assert!(trzba.codes.is_complete());
//! # Ok(())
//! # }
//! ```

mod keys;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::core::*;

pub use keys::{Certificate, load_private_key_der, load_private_key_pem};

/// Minimum modulus size in bytes (RSA-2048).
const MIN_KEY_BYTES: usize = 256;

/// Hex characters per fingerprint group.
const FINGERPRINT_GROUP: usize = 8;

/// Build the signed plaintext:
/// `payer|establishment|register|receipt|sale time|total`.
pub fn signature_plaintext(data: &TransactionData) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        data.payer_tax_id,
        data.establishment_id,
        data.cash_register_id,
        data.receipt_number,
        data.sale_at,
        data.total_amount,
    )
}

/// Sign `plaintext` with the taxpayer key.
pub fn signature_code(plaintext: &str, key: &RsaPrivateKey) -> Result<SignatureCode, SigningError> {
    let value = rsa_sha256(plaintext.as_bytes(), key)?;
    Ok(SignatureCode {
        digest: SIGNATURE_DIGEST.to_string(),
        cipher: SIGNATURE_CIPHER.to_string(),
        encoding: SIGNATURE_ENCODING.to_string(),
        value,
    })
}

/// Derive the fingerprint code from a signature code.
pub fn fingerprint_code(signature: &SignatureCode) -> FingerprintCode {
    let digest = Sha1::digest(&signature.value);
    FingerprintCode {
        digest: FINGERPRINT_DIGEST.to_string(),
        encoding: FINGERPRINT_ENCODING.to_string(),
        value: group_fingerprint(&hex::encode_upper(digest)),
    }
}

/// Insert a dash after every eighth character: `AAAAAAAA-BBBBBBBB-…`.
pub fn group_fingerprint(hex: &str) -> String {
    let mut out = String::with_capacity(hex.len() + hex.len() / FINGERPRINT_GROUP);
    for (i, c) in hex.chars().enumerate() {
        if i > 0 && i % FINGERPRINT_GROUP == 0 {
            out.push('-');
        }
        out.push(c);
    }
    out
}

/// Compute both codes without touching the transaction.
pub fn security_codes(data: &TransactionData, key: &RsaPrivateKey) -> Result<SecurityCodes, SigningError> {
    let signature = signature_code(&signature_plaintext(data), key)?;
    let fingerprint = fingerprint_code(&signature);
    Ok(SecurityCodes {
        signature: Some(signature),
        fingerprint: Some(fingerprint),
    })
}

/// Compute both codes and store them on the transaction.
///
/// On failure the transaction keeps whatever codes it had before.
pub fn compute_security_codes<'t>(
    transaction: &'t mut Transaction,
    key: &RsaPrivateKey,
) -> Result<&'t SecurityCodes, SigningError> {
    let codes = security_codes(&transaction.data, key)?;
    tracing::debug!(
        message_uuid = %transaction.header.message_uuid,
        fingerprint = codes.fingerprint.as_ref().map(|f| f.value.as_str()).unwrap_or_default(),
        "security codes computed"
    );
    transaction.codes = codes;
    Ok(&transaction.codes)
}

impl SignatureCode {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.value)
    }

    pub fn from_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(encoded.trim())
    }
}

/// RSA PKCS#1 v1.5 signature over the SHA-256 digest of `message`.
pub(crate) fn rsa_sha256(message: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>, SigningError> {
    let size = key.size();
    if size < MIN_KEY_BYTES {
        return Err(SigningError::KeyTooSmall { bits: size * 8 });
    }
    let hashed = Sha256::digest(message);
    Ok(key.sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)?)
}
