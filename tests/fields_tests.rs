use fiskal::core::*;
use rust_decimal_macros::dec;

// --- Tax identifiers ---

#[test]
fn tax_id_kinds() {
    for valid in ["CZ00000019", "CZ25596641", "CZ683555118", "CZ1212121218", "CZ530101123"] {
        assert!(TaxId::parse(valid).is_ok(), "{valid} should be valid");
    }
    for (invalid, expected) in [
        ("CZ00000018", FieldError::Checksum),
        ("CZ683555117", FieldError::Checksum),
        ("CZ1212121219", FieldError::Checksum),
        ("", FieldError::Missing),
    ] {
        assert_eq!(TaxId::parse(invalid), Err(expected), "{invalid}");
    }
    assert!(matches!(TaxId::parse("CZ12345"), Err(FieldError::Format(_))));
    assert!(matches!(TaxId::parse("cz00000019"), Err(FieldError::Format(_))));
}

#[test]
fn tax_id_unchecked_construction_validates_later() {
    let id = TaxId::new("CZ00000018");
    assert_eq!(id.as_str(), "CZ00000018");
    assert_eq!(id.validate(), Err(FieldError::Checksum));
}

// --- Field errors in context ---

#[test]
fn validation_error_display() {
    let err = ValidationError::from_field("id_pokl", &FieldError::TooLong { max: 20, actual: 21 });
    assert_eq!(err.to_string(), "id_pokl: must be at most 20 characters, got 21");
    let json = serde_json::to_string(&err).unwrap();
    assert_eq!(
        json,
        r#"{"field":"id_pokl","message":"must be at most 20 characters, got 21"}"#
    );
}

#[test]
fn amount_serde_as_string() {
    let amount = CurrencyAmount::new(dec!(1234.5));
    assert_eq!(serde_json::to_string(&amount).unwrap(), r#""1234.50""#);
    let back: CurrencyAmount = serde_json::from_str(r#""1234.50""#).unwrap();
    assert_eq!(back, amount);
}

#[test]
fn date_time_serde_as_string() {
    let at: FiscalDateTime = serde_json::from_str(r#""2023-06-18T12:40:30+02:00""#).unwrap();
    assert_eq!(serde_json::to_string(&at).unwrap(), r#""2023-06-18T12:40:30+02:00""#);
    assert!(serde_json::from_str::<FiscalDateTime>(r#""2023-06-18 12:40:30""#).is_err());
    assert!(serde_json::from_str::<FiscalDateTime>(r#""2023-06-18T12:40:30+0200""#).is_err());
}

// --- Transaction assembly ---

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> FiscalDateTime {
        FiscalDateTime::parse("2023-06-18T12:40:31+02:00").unwrap()
    }
}

fn fields() -> SaleFields {
    SaleFields {
        message_uuid: MessageUuid::parse("b3a09b52-7c87-4014-a496-4c7a53cf9120").unwrap(),
        sent_at: None,
        first_send: true,
        verification_only: false,
        payer_tax_id: TaxId::new("CZ00000019"),
        authorized_tax_id: None,
        establishment_id: EstablishmentId::new(181),
        cash_register_id: CashRegisterId::new("1/788/23"),
        receipt_number: ReceiptNumber::new("0/6460/ZQ42"),
        sale_at: Some(FiscalDateTime::parse("2023-06-18T12:40:30+02:00").unwrap()),
        total_amount: CurrencyAmount::new(dec!(100)),
        sub_totals: SubTotals::default(),
        regime: Regime::default(),
    }
}

#[test]
fn build_defaults_missing_timestamps() {
    let t = build_transaction(fields(), &FixedClock);
    assert_eq!(t.header.sent_at, FixedClock.now());
    assert_eq!(t.data.sale_at.to_string(), "2023-06-18T12:40:30+02:00");
    assert_eq!(t.data.regime, Regime::Standard);
    assert!(!t.codes.is_complete());
}

#[test]
fn build_keeps_supplied_timestamps() {
    let mut f = fields();
    f.sent_at = Some(FiscalDateTime::parse("2023-06-18T12:41:00+02:00").unwrap());
    f.sale_at = None;
    let t = build_transaction(f, &FixedClock);
    assert_eq!(t.header.sent_at.to_string(), "2023-06-18T12:41:00+02:00");
    assert_eq!(t.data.sale_at, FixedClock.now());
}

#[test]
fn sub_totals_in_schema_order() {
    let mut s = SubTotals::default();
    s.set(SubTotal::DepositDrawn, Some(CurrencyAmount::new(dec!(1))));
    s.set(SubTotal::Untaxed, Some(CurrencyAmount::new(dec!(2))));
    let names: Vec<_> = s.present().map(|(k, _)| k.wire_name()).collect();
    assert_eq!(names, ["zakl_nepodl_dph", "cerp_zuct"]);
    assert_eq!(SubTotal::from_wire_name("dan2"), Some(SubTotal::FirstReducedRateVat));
    assert_eq!(SubTotal::from_wire_name("dan4"), None);
}
