//! Mapping between the JSON shapes and the transaction model.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::core::*;

use super::config::UuidPolicy;
use super::dto::*;
use super::service::GatewayError;
use super::validation::validate_sale_request;

const ONLINE: &str = "online";
const OFFLINE: &str = "offline";

fn field<T>(name: &str, result: Result<T, FieldError>) -> Result<T, Vec<ValidationError>> {
    result.map_err(|e| vec![ValidationError::from_field(name, &e)])
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The value exactly as sent, unless it is blank. Identifiers are signed
/// byte for byte, so surrounding spaces are kept.
fn as_sent(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn optional_date_time(
    name: &str,
    raw: &Option<String>,
) -> Result<Option<FiscalDateTime>, Vec<ValidationError>> {
    non_blank(raw)
        .map(|s| field(name, FiscalDateTime::parse(s)))
        .transpose()
}

/// Validate a sale request and turn it into transaction fields.
///
/// All violations are reported together. A missing message UUID is either
/// generated from `uuids` or reported, depending on `policy`.
pub fn decode_sale_request(
    request: &SaleRequest,
    policy: UuidPolicy,
    uuids: &dyn UuidSource,
) -> Result<SaleFields, Vec<ValidationError>> {
    let mut errors = validate_sale_request(request);
    if policy == UuidPolicy::Require && non_blank(&request.uuid_zpravy).is_none() {
        errors.insert(0, ValidationError::from_field("uuid_zpravy", &FieldError::Missing));
    }
    if !errors.is_empty() {
        tracing::debug!(violations = errors.len(), "sale request rejected");
        return Err(errors);
    }

    let message_uuid = match non_blank(&request.uuid_zpravy) {
        Some(raw) => field("uuid_zpravy", MessageUuid::parse(raw))?,
        None => uuids.generate(),
    };

    let mut sub_totals = SubTotals::default();
    for kind in SubTotal::ALL {
        if let Some(value) = request.sub_total(kind) {
            sub_totals.set(kind, Some(field(kind.wire_name(), CurrencyAmount::checked(value))?));
        }
    }

    let payer = non_blank(&request.dic_popl).unwrap_or_default();
    let establishment = request.id_provoz.ok_or(FieldError::Missing);
    let total = request.celk_trzba.ok_or(FieldError::Missing);

    Ok(SaleFields {
        message_uuid,
        sent_at: optional_date_time("dat_odesl", &request.dat_odesl)?,
        first_send: request.prvni_zaslani,
        verification_only: request.overeni,
        payer_tax_id: field("dic_popl", TaxId::parse(payer))?,
        authorized_tax_id: non_blank(&request.dic_poverujiciho).map(TaxId::new),
        establishment_id: field("id_provoz", establishment.and_then(EstablishmentId::parse))?,
        cash_register_id: CashRegisterId::new(as_sent(&request.id_pokl).unwrap_or_default()),
        receipt_number: ReceiptNumber::new(as_sent(&request.porad_cis).unwrap_or_default()),
        sale_at: optional_date_time("dat_trzby", &request.dat_trzby)?,
        total_amount: field("celk_trzba", total.and_then(CurrencyAmount::checked))?,
        sub_totals,
        regime: field("rezim", request.rezim.map_or(Ok(Regime::Standard), Regime::from_code))?,
    })
}

/// Map an authority reply or a gateway failure to the JSON response.
///
/// A gateway failure yields a response with only `gateway_error` set.
pub fn encode_sale_response(result: Result<AuthorityResponse, GatewayError>) -> SaleResponse {
    match result {
        Err(e) => SaleResponse {
            gateway_error: Some(e.to_string()),
            ..SaleResponse::default()
        },
        Ok(reply) => SaleResponse {
            gateway_error: None,
            dat: reply.timestamp.map(|t| t.to_string()),
            fik: reply.confirmation_code,
            zprava: reply.error_message,
            kod: reply.error_code,
            test: reply.test_mode,
            varovani: reply.warnings.iter().map(WarningBody::from).collect(),
        },
    }
}

/// The gateway answers, so it is always online; the authority is probed.
pub fn encode_ping_response(authority_reachable: bool) -> PingResponse {
    PingResponse {
        eet_gateway: ONLINE.to_string(),
        tax_admin: if authority_reachable { ONLINE } else { OFFLINE }.to_string(),
    }
}

/// A decoded certificate registration, ready for the certificate store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateUpload {
    /// Requested id; the store assigns one when absent.
    pub id: Option<String>,
    pub password: Option<String>,
    pub pkcs12: Vec<u8>,
    pub pkcs12_password: String,
}

pub fn decode_create_cert_request(
    request: &CreateCertRequest,
) -> Result<CertificateUpload, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let pkcs12 = if request.pkcs12_data.trim().is_empty() {
        errors.push(ValidationError::from_field("pkcs12_data", &FieldError::Missing));
        Vec::new()
    } else {
        STANDARD.decode(request.pkcs12_data.trim()).unwrap_or_else(|e| {
            errors.push(ValidationError::new("pkcs12_data", format!("not base64: {e}")));
            Vec::new()
        })
    };
    if request.pkcs12_password.is_empty() {
        errors.push(ValidationError::from_field(
            "pkcs12_password",
            &FieldError::Missing,
        ));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let some = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Ok(CertificateUpload {
        id: some(&request.id),
        password: some(&request.password),
        pkcs12,
        pkcs12_password: request.pkcs12_password.clone(),
    })
}

/// Map the outcome of storing a certificate to the JSON response.
pub fn encode_create_cert_response<E: fmt::Display>(result: Result<String, E>) -> CreateCertResponse {
    match result {
        Ok(id) => CreateCertResponse {
            gateway_error: None,
            id: Some(id),
        },
        Err(e) => CreateCertResponse {
            gateway_error: Some(e.to_string()),
            id: None,
        },
    }
}
