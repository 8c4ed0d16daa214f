use crate::codes::Certificate;
use crate::core::*;
use rsa::RsaPrivateKey;

use super::signature::{body_id, write_security_header};
use super::xml_utils::XmlWriter;
use super::ns;

/// How the `Trzba` element is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// As transmitted: all three namespace declarations on the root.
    Document,
    /// Exclusive C14N: only the visibly utilized default namespace.
    Canonical,
}

/// Render a signed transaction as a standalone `Trzba` element.
pub fn render_trzba(transaction: &Transaction) -> Result<String, EncodeError> {
    let mut w = XmlWriter::new();
    write_trzba(&mut w, transaction, Form::Document)?;
    w.into_string()
}

pub(crate) fn write_trzba(
    w: &mut XmlWriter,
    transaction: &Transaction,
    form: Form,
) -> Result<(), EncodeError> {
    let (Some(signature), Some(fingerprint)) = (
        transaction.codes.signature.as_ref(),
        transaction.codes.fingerprint.as_ref(),
    ) else {
        return Err(EncodeError::MissingSecurityCodes);
    };

    let root_attrs: &[(&str, &str)] = match form {
        Form::Document => &[
            ("xmlns", ns::EET),
            ("xmlns:xsd", ns::XSD),
            ("xmlns:xsi", ns::XSI),
        ],
        Form::Canonical => &[("xmlns", ns::EET)],
    };
    w.start_element_with_attrs("Trzba", root_attrs)?;

    write_header(w, &transaction.header)?;
    write_data(w, &transaction.data)?;

    w.start_element("KontrolniKody")?;
    w.text_element_with_attrs(
        "pkp",
        &signature.to_base64(),
        &[
            ("cipher", signature.cipher.as_str()),
            ("digest", signature.digest.as_str()),
            ("encoding", signature.encoding.as_str()),
        ],
    )?;
    w.text_element_with_attrs(
        "bkp",
        &fingerprint.value,
        &[
            ("digest", fingerprint.digest.as_str()),
            ("encoding", fingerprint.encoding.as_str()),
        ],
    )?;
    w.end_element("KontrolniKody")?;

    w.end_element("Trzba")?;
    Ok(())
}

fn write_header(w: &mut XmlWriter, header: &TransactionHeader) -> Result<(), EncodeError> {
    let sent_at = header.sent_at.to_string();
    let uuid = header.message_uuid.to_string();
    let mut attrs = vec![("dat_odesl", sent_at.as_str())];
    if header.verification_only {
        attrs.push(("overeni", "true"));
    }
    attrs.push(("prvni_zaslani", bool_text(header.first_send)));
    attrs.push(("uuid_zpravy", uuid.as_str()));
    w.empty_element("Hlavicka", &attrs)?;
    Ok(())
}

fn write_data(w: &mut XmlWriter, data: &TransactionData) -> Result<(), EncodeError> {
    let mut attrs: Vec<(&str, String)> = vec![
        ("dic_popl", data.payer_tax_id.to_string()),
        ("id_provoz", data.establishment_id.to_string()),
        ("id_pokl", data.cash_register_id.to_string()),
        ("porad_cis", data.receipt_number.to_string()),
        ("dat_trzby", data.sale_at.to_string()),
        ("celk_trzba", data.total_amount.to_string()),
        ("rezim", data.regime.code().to_string()),
    ];
    if let Some(authorized) = &data.authorized_tax_id {
        attrs.push(("dic_poverujiciho", authorized.to_string()));
    }
    for (kind, amount) in data.sub_totals.present() {
        attrs.push((kind.wire_name(), amount.to_string()));
    }
    // canonical order: unqualified attributes sorted by name
    attrs.sort_unstable_by_key(|(name, _)| *name);

    let borrowed: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    w.empty_element("Data", &borrowed)?;
    Ok(())
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Canonical bytes of the SOAP body, as digested by the envelope signature.
pub(crate) fn canonical_body(transaction: &Transaction) -> Result<Vec<u8>, EncodeError> {
    let mut w = XmlWriter::new();
    write_body(&mut w, transaction, Form::Canonical)?;
    Ok(w.into_bytes())
}

fn write_body(w: &mut XmlWriter, transaction: &Transaction, form: Form) -> Result<(), EncodeError> {
    let id = body_id(transaction);
    w.start_element_with_attrs(
        "soap:Body",
        &[("xmlns:soap", ns::SOAP), ("xmlns:wsu", ns::WSU), ("wsu:Id", id.as_str())],
    )?;
    write_trzba(w, transaction, form)?;
    w.end_element("soap:Body")?;
    Ok(())
}

/// Build the signed SOAP request envelope for a transaction.
///
/// The transaction must already carry its security codes. The SOAP body is
/// signed with `key` (WS-Security, exclusive C14N, RSA-SHA256) and
/// `certificate` is attached as the binary security token.
pub fn build_request_envelope(
    transaction: &Transaction,
    certificate: &Certificate,
    key: &RsaPrivateKey,
) -> Result<Vec<u8>, EncodeError> {
    let body = canonical_body(transaction)?;

    let mut w = XmlWriter::with_declaration()?;
    w.start_element_with_attrs("soap:Envelope", &[("xmlns:soap", ns::SOAP)])?;
    w.start_element("soap:Header")?;
    write_security_header(&mut w, transaction, certificate, key, &body)?;
    w.end_element("soap:Header")?;
    write_body(&mut w, transaction, Form::Document)?;
    w.end_element("soap:Envelope")?;

    let envelope = w.into_bytes();
    tracing::debug!(
        message_uuid = %transaction.header.message_uuid,
        bytes = envelope.len(),
        "request envelope built"
    );
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn signed() -> Transaction {
        Transaction {
            header: TransactionHeader {
                message_uuid: MessageUuid::parse("b3a09b52-7c87-4014-a496-4c7a53cf9120").unwrap(),
                sent_at: FiscalDateTime::parse("2023-06-18T12:40:31+02:00").unwrap(),
                first_send: true,
                verification_only: false,
            },
            data: TransactionData {
                payer_tax_id: TaxId::new("CZ00000019"),
                authorized_tax_id: Some(TaxId::new("CZ683555118")),
                establishment_id: EstablishmentId::new(181),
                cash_register_id: CashRegisterId::new("1/788/23"),
                receipt_number: ReceiptNumber::new("0/6460/ZQ42"),
                sale_at: FiscalDateTime::parse("2023-06-18T12:40:30+02:00").unwrap(),
                total_amount: CurrencyAmount::new(dec!(100)),
                sub_totals: SubTotals {
                    standard_rate_base: Some(CurrencyAmount::new(dec!(82.64))),
                    standard_rate_vat: Some(CurrencyAmount::new(dec!(17.36))),
                    ..SubTotals::default()
                },
                regime: Regime::Standard,
            },
            codes: SecurityCodes {
                signature: Some(SignatureCode {
                    digest: SIGNATURE_DIGEST.into(),
                    cipher: SIGNATURE_CIPHER.into(),
                    encoding: SIGNATURE_ENCODING.into(),
                    value: vec![0xAB; 4],
                }),
                fingerprint: Some(FingerprintCode {
                    digest: FINGERPRINT_DIGEST.into(),
                    encoding: FINGERPRINT_ENCODING.into(),
                    value: "01234567-89ABCDEF-01234567-89ABCDEF-01234567".into(),
                }),
            },
        }
    }

    #[test]
    fn trzba_root_carries_three_namespaces() {
        let xml = render_trzba(&signed()).unwrap();
        assert!(xml.starts_with(
            r#"<Trzba xmlns="http://fs.mfcr.cz/eet/schema/v3" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ));
    }

    #[test]
    fn header_and_data_attributes() {
        let xml = render_trzba(&signed()).unwrap();
        assert!(xml.contains(
            r#"<Hlavicka dat_odesl="2023-06-18T12:40:31+02:00" prvni_zaslani="true" uuid_zpravy="b3a09b52-7c87-4014-a496-4c7a53cf9120"></Hlavicka>"#
        ));
        assert!(xml.contains(
            r#"<Data celk_trzba="100.00" dan1="17.36" dat_trzby="2023-06-18T12:40:30+02:00" dic_popl="CZ00000019" dic_poverujiciho="CZ683555118" id_pokl="1/788/23" id_provoz="181" porad_cis="0/6460/ZQ42" rezim="0" zakl_dan1="82.64"></Data>"#
        ));
    }

    #[test]
    fn control_codes() {
        let xml = render_trzba(&signed()).unwrap();
        assert!(xml.contains(
            r#"<KontrolniKody><pkp cipher="RSA2048" digest="SHA256" encoding="base64">q6urqw==</pkp><bkp digest="SHA1" encoding="base16">01234567-89ABCDEF-01234567-89ABCDEF-01234567</bkp></KontrolniKody></Trzba>"#
        ));
    }

    #[test]
    fn verification_flag_only_when_set() {
        let mut t = signed();
        t.header.verification_only = true;
        let xml = render_trzba(&t).unwrap();
        assert!(xml.contains(r#"overeni="true" prvni_zaslani="true""#));
    }

    #[test]
    fn canonical_body_drops_unused_namespaces() {
        let body = String::from_utf8(canonical_body(&signed()).unwrap()).unwrap();
        assert!(body.starts_with(
            r#"<soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd" wsu:Id="Body-b3a09b52-7c87-4014-a496-4c7a53cf9120"><Trzba xmlns="http://fs.mfcr.cz/eet/schema/v3"><Hlavicka"#
        ));
        assert!(!body.contains("xmlns:xsi"));
    }

    #[test]
    fn attribute_values_keep_quotes_and_brackets_literal() {
        let mut t = signed();
        t.data.cash_register_id = CashRegisterId::new("a'b>c");
        let body = String::from_utf8(canonical_body(&t).unwrap()).unwrap();
        assert!(body.contains(r#"id_pokl="a'b>c""#));
        assert_eq!(crate::envelope::parse_trzba(&render_trzba(&t).unwrap()).unwrap(), t);
    }

    #[test]
    fn unsigned_transaction_is_rejected() {
        let mut t = signed();
        t.codes = SecurityCodes::default();
        assert!(matches!(
            render_trzba(&t),
            Err(EncodeError::MissingSecurityCodes)
        ));
    }
}
