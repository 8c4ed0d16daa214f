use std::collections::HashMap;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;

use crate::core::*;

type Attributes = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(bytes).map_err(|e| DecodeError::Malformed(format!("not UTF-8: {e}")))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Attributes keyed by local name; namespace declarations are skipped.
fn attributes(e: &BytesStart<'_>) -> Result<Attributes, DecodeError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let key = attr.key;
        if key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.insert(name, value);
    }
    Ok(out)
}

fn invalid(name: &str, value: &str, reason: impl ToString) -> DecodeError {
    DecodeError::InvalidAttribute {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn required<'a>(
    attrs: &'a Attributes,
    element: &'static str,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    attrs
        .get(name)
        .map(String::as_str)
        .ok_or(DecodeError::MissingAttribute { element, name })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, DecodeError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(invalid(name, other, "not an xs:boolean")),
    }
}

fn optional_bool(attrs: &Attributes, name: &str) -> Result<bool, DecodeError> {
    attrs
        .get(name)
        .map(|v| parse_bool(name, v))
        .transpose()
        .map(Option::unwrap_or_default)
}

fn parse_date_time(name: &str, raw: &str) -> Result<FiscalDateTime, DecodeError> {
    FiscalDateTime::parse(raw).map_err(|e| invalid(name, raw, e))
}

fn parse_amount(name: &str, raw: &str) -> Result<CurrencyAmount, DecodeError> {
    Decimal::from_str(raw)
        .map(CurrencyAmount::new)
        .map_err(|e| invalid(name, raw, e))
}

fn parse_int<T: FromStr>(name: &str, raw: &str) -> Result<T, DecodeError>
where
    T::Err: ToString,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(name, raw, e))
}

/// Element events of a SOAP document, with the element path tracked by local name.
struct BodyScanner<'a> {
    reader: Reader<&'a [u8]>,
    path: Vec<String>,
    saw_envelope: bool,
    saw_body: bool,
}

enum Scanned {
    Element {
        name: String,
        attrs: Attributes,
        closed: bool,
    },
    Text(String),
    End(String),
    Eof,
}

impl<'a> BodyScanner<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            path: Vec::new(),
            saw_envelope: false,
            saw_body: false,
        }
    }

    fn next(&mut self) -> Result<Scanned, DecodeError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(ref e) => {
                    let name = local_name(e);
                    self.note(&name);
                    let attrs = attributes(e)?;
                    self.path.push(name.clone());
                    return Ok(Scanned::Element {
                        name,
                        attrs,
                        closed: false,
                    });
                }
                Event::Empty(ref e) => {
                    let name = local_name(e);
                    self.note(&name);
                    let attrs = attributes(e)?;
                    return Ok(Scanned::Element {
                        name,
                        attrs,
                        closed: true,
                    });
                }
                Event::Text(ref e) => {
                    let text = e.unescape()?.into_owned();
                    if !text.is_empty() {
                        return Ok(Scanned::Text(text));
                    }
                }
                Event::End(_) => {
                    let ended = self.path.pop().unwrap_or_default();
                    return Ok(Scanned::End(ended));
                }
                Event::Eof => {
                    if !self.path.is_empty() {
                        return Err(DecodeError::Malformed(format!(
                            "unexpected end of document inside <{}>",
                            self.path.join("/")
                        )));
                    }
                    return Ok(Scanned::Eof);
                }
                _ => {}
            }
        }
    }

    fn note(&mut self, name: &str) {
        match name {
            "Envelope" if self.path.is_empty() => self.saw_envelope = true,
            "Body" if self.path.len() == 1 && self.saw_envelope => self.saw_body = true,
            _ => {}
        }
    }

    fn require_envelope(&self) -> Result<(), DecodeError> {
        if !self.saw_envelope {
            return Err(DecodeError::MissingElement("Envelope"));
        }
        if !self.saw_body {
            return Err(DecodeError::MissingElement("Body"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request (Trzba)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RawTrzba {
    seen: bool,
    header: Option<Attributes>,
    data: Option<Attributes>,
    pkp: Option<(Attributes, String)>,
    bkp: Option<(Attributes, String)>,
}

fn scan_trzba(scanner: &mut BodyScanner<'_>) -> Result<RawTrzba, DecodeError> {
    let mut raw = RawTrzba::default();
    let mut code: Option<(String, Attributes, String)> = None;

    loop {
        match scanner.next()? {
            Scanned::Element {
                name,
                attrs,
                closed,
            } => match name.as_str() {
                "Trzba" => raw.seen = true,
                "Hlavicka" if raw.seen => raw.header = Some(attrs),
                "Data" if raw.seen => raw.data = Some(attrs),
                "pkp" | "bkp" if raw.seen => {
                    if closed {
                        return Err(DecodeError::Malformed(format!("<{name}> has no value")));
                    }
                    code = Some((name, attrs, String::new()));
                }
                _ => {}
            },
            Scanned::Text(text) => {
                if let Some((_, _, value)) = code.as_mut() {
                    value.push_str(&text);
                }
            }
            Scanned::End(ended) => {
                if ended == "pkp" || ended == "bkp" {
                    if let Some((name, attrs, value)) = code.take() {
                        if name == "pkp" {
                            raw.pkp = Some((attrs, value));
                        } else {
                            raw.bkp = Some((attrs, value));
                        }
                    }
                }
            }
            Scanned::Eof => break,
        }
    }
    Ok(raw)
}

fn attr_or(attrs: &Attributes, name: &str, default: &str) -> String {
    attrs.get(name).cloned().unwrap_or_else(|| default.to_string())
}

impl RawTrzba {
    fn into_transaction(self) -> Result<Transaction, DecodeError> {
        if !self.seen {
            return Err(DecodeError::MissingElement("Trzba"));
        }
        let header = self.header.ok_or(DecodeError::MissingElement("Hlavicka"))?;
        let data = self.data.ok_or(DecodeError::MissingElement("Data"))?;
        let (pkp_attrs, pkp) = self.pkp.ok_or(DecodeError::MissingElement("pkp"))?;
        let (bkp_attrs, bkp) = self.bkp.ok_or(DecodeError::MissingElement("bkp"))?;

        let uuid_raw = required(&header, "Hlavicka", "uuid_zpravy")?;
        let header = TransactionHeader {
            message_uuid: MessageUuid::parse(uuid_raw)
                .map_err(|e| invalid("uuid_zpravy", uuid_raw, e))?,
            sent_at: parse_date_time("dat_odesl", required(&header, "Hlavicka", "dat_odesl")?)?,
            first_send: parse_bool(
                "prvni_zaslani",
                required(&header, "Hlavicka", "prvni_zaslani")?,
            )?,
            verification_only: optional_bool(&header, "overeni")?,
        };

        let mut sub_totals = SubTotals::default();
        for kind in SubTotal::ALL {
            if let Some(raw) = data.get(kind.wire_name()) {
                sub_totals.set(kind, Some(parse_amount(kind.wire_name(), raw)?));
            }
        }
        let regime = match data.get("rezim") {
            Some(raw) => Regime::from_code(parse_int("rezim", raw)?)
                .map_err(|e| invalid("rezim", raw, e))?,
            None => Regime::Standard,
        };

        let data = TransactionData {
            payer_tax_id: TaxId::new(required(&data, "Data", "dic_popl")?),
            authorized_tax_id: data.get("dic_poverujiciho").map(TaxId::new),
            establishment_id: EstablishmentId::new(parse_int(
                "id_provoz",
                required(&data, "Data", "id_provoz")?,
            )?),
            cash_register_id: CashRegisterId::new(required(&data, "Data", "id_pokl")?),
            receipt_number: ReceiptNumber::new(required(&data, "Data", "porad_cis")?),
            sale_at: parse_date_time("dat_trzby", required(&data, "Data", "dat_trzby")?)?,
            total_amount: parse_amount("celk_trzba", required(&data, "Data", "celk_trzba")?)?,
            sub_totals,
            regime,
        };

        let signature = SignatureCode {
            digest: attr_or(&pkp_attrs, "digest", SIGNATURE_DIGEST),
            cipher: attr_or(&pkp_attrs, "cipher", SIGNATURE_CIPHER),
            encoding: attr_or(&pkp_attrs, "encoding", SIGNATURE_ENCODING),
            value: SignatureCode::from_base64(&pkp).map_err(|e| invalid("pkp", &pkp, e))?,
        };
        let fingerprint = FingerprintCode {
            digest: attr_or(&bkp_attrs, "digest", FINGERPRINT_DIGEST),
            encoding: attr_or(&bkp_attrs, "encoding", FINGERPRINT_ENCODING),
            value: bkp.trim().to_string(),
        };

        Ok(Transaction {
            header,
            data,
            codes: SecurityCodes {
                signature: Some(signature),
                fingerprint: Some(fingerprint),
            },
        })
    }
}

/// Read a standalone `Trzba` element (as produced by
/// [`render_trzba`](super::render_trzba)) back into a transaction.
pub fn parse_trzba(xml: &str) -> Result<Transaction, DecodeError> {
    let mut scanner = BodyScanner::new(xml);
    scan_trzba(&mut scanner)?.into_transaction()
}

/// Read a signed request envelope back into the transaction it carries.
pub fn parse_request_envelope(envelope: &[u8]) -> Result<Transaction, DecodeError> {
    let mut scanner = BodyScanner::new(utf8(envelope)?);
    let raw = scan_trzba(&mut scanner)?;
    scanner.require_envelope()?;
    raw.into_transaction()
}

// ---------------------------------------------------------------------------
// Response (Odpoved)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RawResponse {
    seen: bool,
    header: Option<Attributes>,
    confirmation: Option<Attributes>,
    error: Option<(Attributes, String)>,
    warnings: Vec<(Attributes, String)>,
    fault: Option<String>,
}

enum Capture {
    Error,
    Warning,
    FaultString,
}

fn scan_response(scanner: &mut BodyScanner<'_>) -> Result<RawResponse, DecodeError> {
    let mut raw = RawResponse::default();
    let mut capture: Option<(Capture, Attributes, String)> = None;

    loop {
        match scanner.next()? {
            Scanned::Element {
                name,
                attrs,
                closed,
            } => match name.as_str() {
                "Odpoved" => raw.seen = true,
                "Hlavicka" if raw.seen => raw.header = Some(attrs),
                "Potvrzeni" if raw.seen => raw.confirmation = Some(attrs),
                "Chyba" if raw.seen => {
                    if closed {
                        raw.error = Some((attrs, String::new()));
                    } else {
                        capture = Some((Capture::Error, attrs, String::new()));
                    }
                }
                "Varovani" if raw.seen => {
                    if closed {
                        raw.warnings.push((attrs, String::new()));
                    } else {
                        capture = Some((Capture::Warning, attrs, String::new()));
                    }
                }
                "faultstring" => capture = Some((Capture::FaultString, attrs, String::new())),
                _ => {}
            },
            Scanned::Text(text) => {
                if let Some((_, _, value)) = capture.as_mut() {
                    value.push_str(&text);
                }
            }
            Scanned::End(ended) => {
                if matches!(ended.as_str(), "Chyba" | "Varovani" | "faultstring") {
                    match capture.take() {
                        Some((Capture::Error, attrs, text)) => raw.error = Some((attrs, text)),
                        Some((Capture::Warning, attrs, text)) => raw.warnings.push((attrs, text)),
                        Some((Capture::FaultString, _, text)) => raw.fault = Some(text),
                        None => {}
                    }
                }
            }
            Scanned::Eof => break,
        }
    }
    Ok(raw)
}

/// Pick the response timestamp: acceptance when present, otherwise rejection.
pub fn select_timestamp(
    accepted_at: Option<FiscalDateTime>,
    rejected_at: Option<FiscalDateTime>,
) -> Option<FiscalDateTime> {
    accepted_at.or(rejected_at)
}

fn optional_date_time(attrs: &Attributes, name: &str) -> Result<Option<FiscalDateTime>, DecodeError> {
    attrs
        .get(name)
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date_time(name, v))
        .transpose()
}

fn check_correlation(transaction: &Transaction, header: &Attributes) -> Result<(), DecodeError> {
    if let Some(received) = header.get("uuid_zpravy").filter(|v| !v.is_empty()) {
        let expected = transaction.header.message_uuid;
        let matches = MessageUuid::parse(received).is_ok_and(|u| u == expected);
        if !matches {
            return Err(DecodeError::Mismatch {
                field: "uuid_zpravy",
                expected: expected.to_string(),
                received: received.clone(),
            });
        }
    }
    if let (Some(received), Some(expected)) = (
        header.get("bkp").filter(|v| !v.is_empty()),
        transaction.codes.fingerprint.as_ref(),
    ) {
        if !received.eq_ignore_ascii_case(&expected.value) {
            return Err(DecodeError::Mismatch {
                field: "bkp",
                expected: expected.value.clone(),
                received: received.clone(),
            });
        }
    }
    Ok(())
}

/// Parse the authority's response envelope for `transaction`.
///
/// A well-formed rejection (`Chyba`) is returned as a normal response with
/// `error_code`/`error_message` set; only envelopes that cannot be read, lack
/// mandatory sections or belong to another submission yield a [`DecodeError`].
pub fn parse_response_envelope(
    transaction: &Transaction,
    envelope: &[u8],
) -> Result<AuthorityResponse, DecodeError> {
    let mut scanner = BodyScanner::new(utf8(envelope)?);
    let raw = scan_response(&mut scanner)?;
    scanner.require_envelope()?;

    if let Some(fault) = raw.fault {
        return Err(DecodeError::Malformed(format!("SOAP fault: {fault}")));
    }
    if !raw.seen {
        return Err(DecodeError::MissingElement("Odpoved"));
    }
    let header = raw.header.ok_or(DecodeError::MissingElement("Hlavicka"))?;
    if raw.confirmation.is_none() && raw.error.is_none() {
        return Err(DecodeError::MissingElement("Potvrzeni"));
    }
    check_correlation(transaction, &header)?;

    let accepted_at = optional_date_time(&header, "dat_prij")?;
    let rejected_at = optional_date_time(&header, "dat_odmit")?;

    let mut response = AuthorityResponse {
        timestamp: select_timestamp(accepted_at, rejected_at),
        ..AuthorityResponse::default()
    };

    if let Some(confirmation) = &raw.confirmation {
        response.confirmation_code = confirmation
            .get("fik")
            .filter(|v| !v.is_empty())
            .cloned();
        response.test_mode |= optional_bool(confirmation, "test")?;
    }
    if let Some((attrs, message)) = &raw.error {
        response.error_code = match attrs.get("kod") {
            Some(raw) => parse_int("kod", raw)?,
            None => 0,
        };
        response.error_message = message.clone();
        response.test_mode |= optional_bool(attrs, "test")?;
    }
    for (attrs, message) in &raw.warnings {
        response.warnings.push(Warning {
            code: match attrs.get("kod_varov") {
                Some(raw) => parse_int("kod_varov", raw)?,
                None => 0,
            },
            message: message.clone(),
        });
    }

    if response.is_accepted() {
        tracing::debug!(
            message_uuid = %transaction.header.message_uuid,
            warnings = response.warnings.len(),
            "sale accepted"
        );
    } else {
        tracing::warn!(
            message_uuid = %transaction.header.message_uuid,
            code = response.error_code,
            message = %response.error_message,
            "sale rejected by authority"
        );
    }
    Ok(response)
}
