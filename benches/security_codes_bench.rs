use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use fiskal::codes::{self, Certificate};
use fiskal::core::*;
use fiskal::envelope;

const KEY_PEM: &str = include_str!("../tests/fixtures/taxpayer_key.pem");
const CERT_PEM: &str = include_str!("../tests/fixtures/taxpayer_cert.pem");

fn sale() -> Transaction {
    let at = FiscalDateTime::parse("2023-06-18T12:40:30+02:00").unwrap();
    Transaction {
        header: TransactionHeader {
            message_uuid: MessageUuid::parse("b3a09b52-7c87-4014-a496-4c7a53cf9120").unwrap(),
            sent_at: at,
            first_send: true,
            verification_only: false,
        },
        data: TransactionData {
            payer_tax_id: TaxId::new("CZ00000019"),
            authorized_tax_id: None,
            establishment_id: EstablishmentId::new(181),
            cash_register_id: CashRegisterId::new("1/788/23"),
            receipt_number: ReceiptNumber::new("0/6460/ZQ42"),
            sale_at: at,
            total_amount: CurrencyAmount::new(dec!(100)),
            sub_totals: SubTotals {
                standard_rate_base: Some(CurrencyAmount::new(dec!(82.64))),
                standard_rate_vat: Some(CurrencyAmount::new(dec!(17.36))),
                ..SubTotals::default()
            },
            regime: Regime::Standard,
        },
        codes: SecurityCodes::default(),
    }
}

fn bench_security_codes(c: &mut Criterion) {
    let key = codes::load_private_key_pem(KEY_PEM).unwrap();
    let transaction = sale();

    c.bench_function("security_codes", |b| {
        b.iter(|| codes::security_codes(black_box(&transaction.data), &key).unwrap())
    });
}

fn bench_request_envelope(c: &mut Criterion) {
    let key = codes::load_private_key_pem(KEY_PEM).unwrap();
    let cert = Certificate::from_pem(CERT_PEM).unwrap();
    let mut transaction = sale();
    codes::compute_security_codes(&mut transaction, &key).unwrap();

    c.bench_function("build_request_envelope", |b| {
        b.iter(|| envelope::build_request_envelope(black_box(&transaction), &cert, &key).unwrap())
    });
}

fn bench_parse_request(c: &mut Criterion) {
    let key = codes::load_private_key_pem(KEY_PEM).unwrap();
    let cert = Certificate::from_pem(CERT_PEM).unwrap();
    let mut transaction = sale();
    codes::compute_security_codes(&mut transaction, &key).unwrap();
    let request = envelope::build_request_envelope(&transaction, &cert, &key).unwrap();

    c.bench_function("parse_request_envelope", |b| {
        b.iter(|| envelope::parse_request_envelope(black_box(&request)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_security_codes,
    bench_request_envelope,
    bench_parse_request
);
criterion_main!(benches);
