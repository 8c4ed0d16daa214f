//! WS-Security header: binary security token plus an XML digital signature
//! over the SOAP body.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::codes::{Certificate, rsa_sha256};
use crate::core::{EncodeError, Transaction};

use super::xml_utils::XmlWriter;
use super::{algorithm, ns};

pub(crate) fn body_id(transaction: &Transaction) -> String {
    format!("Body-{}", transaction.header.message_uuid)
}

fn token_id(transaction: &Transaction) -> String {
    format!("X509-{}", transaction.header.message_uuid)
}

/// Canonical `ds:SignedInfo` referencing the body by id and digest.
pub(crate) fn signed_info(body_id: &str, body_digest: &str) -> Result<Vec<u8>, EncodeError> {
    let reference = format!("#{body_id}");
    let mut w = XmlWriter::new();
    w.start_element_with_attrs("ds:SignedInfo", &[("xmlns:ds", ns::DS)])?;
    w.empty_element(
        "ds:CanonicalizationMethod",
        &[("Algorithm", algorithm::EXC_C14N)],
    )?;
    w.empty_element("ds:SignatureMethod", &[("Algorithm", algorithm::RSA_SHA256)])?;
    w.start_element_with_attrs("ds:Reference", &[("URI", reference.as_str())])?;
    w.start_element("ds:Transforms")?;
    w.empty_element("ds:Transform", &[("Algorithm", algorithm::EXC_C14N)])?;
    w.end_element("ds:Transforms")?;
    w.empty_element("ds:DigestMethod", &[("Algorithm", algorithm::SHA256)])?;
    w.text_element("ds:DigestValue", body_digest)?;
    w.end_element("ds:Reference")?;
    w.end_element("ds:SignedInfo")?;
    Ok(w.into_bytes())
}

pub(crate) fn write_security_header(
    w: &mut XmlWriter,
    transaction: &Transaction,
    certificate: &Certificate,
    key: &RsaPrivateKey,
    canonical_body: &[u8],
) -> Result<(), EncodeError> {
    let uuid = transaction.header.message_uuid.to_string();
    let token_id = token_id(transaction);
    let token_ref = format!("#{token_id}");
    let signature_id = format!("SIG-{uuid}");
    let key_info_id = format!("KI-{uuid}");
    let token_reference_id = format!("STR-{uuid}");

    let digest = STANDARD.encode(Sha256::digest(canonical_body));
    let info = signed_info(&body_id(transaction), &digest)?;
    let signature = STANDARD.encode(rsa_sha256(&info, key)?);

    w.start_element_with_attrs(
        "wsse:Security",
        &[
            ("xmlns:wsse", ns::WSSE),
            ("xmlns:wsu", ns::WSU),
            ("soap:mustUnderstand", "1"),
        ],
    )?;
    w.text_element_with_attrs(
        "wsse:BinarySecurityToken",
        &certificate.to_base64(),
        &[
            ("EncodingType", algorithm::BASE64_BINARY),
            ("ValueType", algorithm::X509_V3),
            ("wsu:Id", token_id.as_str()),
        ],
    )?;

    w.start_element_with_attrs(
        "ds:Signature",
        &[("xmlns:ds", ns::DS), ("Id", signature_id.as_str())],
    )?;
    w.raw(&info)?;
    w.text_element("ds:SignatureValue", &signature)?;
    w.start_element_with_attrs("ds:KeyInfo", &[("Id", key_info_id.as_str())])?;
    w.start_element_with_attrs(
        "wsse:SecurityTokenReference",
        &[("wsu:Id", token_reference_id.as_str())],
    )?;
    w.empty_element(
        "wsse:Reference",
        &[("URI", token_ref.as_str()), ("ValueType", algorithm::X509_V3)],
    )?;
    w.end_element("wsse:SecurityTokenReference")?;
    w.end_element("ds:KeyInfo")?;
    w.end_element("ds:Signature")?;

    w.end_element("wsse:Security")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_info_is_canonical() {
        let info = String::from_utf8(signed_info("Body-1", "ZGlnZXN0").unwrap()).unwrap();
        assert_eq!(
            info,
            concat!(
                r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
                r#"<ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"></ds:CanonicalizationMethod>"#,
                r#"<ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"></ds:SignatureMethod>"#,
                r##"<ds:Reference URI="#Body-1"><ds:Transforms>"##,
                r#"<ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"></ds:Transform></ds:Transforms>"#,
                r#"<ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"></ds:DigestMethod>"#,
                r#"<ds:DigestValue>ZGlnZXN0</ds:DigestValue></ds:Reference></ds:SignedInfo>"#,
            )
        );
    }
}
