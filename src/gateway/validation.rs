use crate::core::*;

use super::dto::SaleRequest;

/// A check applied to one request field.
pub type FieldRule = fn(&SaleRequest) -> Result<(), FieldError>;

fn required<T>(value: Option<T>) -> Result<T, FieldError> {
    value.ok_or(FieldError::Missing)
}

fn required_str(value: &Option<String>) -> Result<&str, FieldError> {
    match value.as_deref() {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(FieldError::Missing),
    }
}

fn optional_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Field name → rule, in request order. Sub-totals are checked separately
/// against [`SubTotal::ALL`].
pub const SALE_RULES: &[(&str, FieldRule)] = &[
    ("cert_id", |r| required_str(&r.cert_id).map(drop)),
    ("uuid_zpravy", |r| {
        optional_str(&r.uuid_zpravy).map_or(Ok(()), |s| MessageUuid::parse(s).map(drop))
    }),
    ("dat_odesl", |r| {
        optional_str(&r.dat_odesl).map_or(Ok(()), |s| FiscalDateTime::parse(s).map(drop))
    }),
    ("dic_popl", |r| TaxId::parse(required_str(&r.dic_popl)?).map(drop)),
    ("dic_poverujiciho", |r| {
        let Some(authorized) = optional_str(&r.dic_poverujiciho) else {
            return Ok(());
        };
        TaxId::parse(authorized)?;
        if optional_str(&r.dic_popl).is_some_and(|payer| payer.trim() == authorized.trim()) {
            return Err(FieldError::Format("must differ from dic_popl".into()));
        }
        Ok(())
    }),
    ("id_provoz", |r| EstablishmentId::parse(required(r.id_provoz)?).map(drop)),
    ("id_pokl", |r| CashRegisterId::parse(required_str(&r.id_pokl)?).map(drop)),
    ("porad_cis", |r| ReceiptNumber::parse(required_str(&r.porad_cis)?).map(drop)),
    ("dat_trzby", |r| {
        optional_str(&r.dat_trzby).map_or(Ok(()), |s| FiscalDateTime::parse(s).map(drop))
    }),
    ("celk_trzba", |r| CurrencyAmount::checked(required(r.celk_trzba)?).map(drop)),
    ("rezim", |r| r.rezim.map_or(Ok(()), |c| Regime::from_code(c).map(drop))),
];

/// Run every rule and collect all violations.
pub fn validate_sale_request(request: &SaleRequest) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = SALE_RULES
        .iter()
        .filter_map(|(field, rule)| {
            rule(request)
                .err()
                .map(|e| ValidationError::from_field(*field, &e))
        })
        .collect();

    for kind in SubTotal::ALL {
        if let Some(value) = request.sub_total(kind) {
            if let Err(e) = CurrencyAmount::checked(value) {
                errors.push(ValidationError::from_field(kind.wire_name(), &e));
            }
        }
    }
    errors
}
