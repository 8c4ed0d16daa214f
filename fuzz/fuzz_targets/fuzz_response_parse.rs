#![no_main]

use std::sync::OnceLock;

use fiskal::core::*;
use libfuzzer_sys::fuzz_target;

fn transaction() -> &'static Transaction {
    static TRANSACTION: OnceLock<Transaction> = OnceLock::new();
    TRANSACTION.get_or_init(|| {
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
                total_amount: CurrencyAmount::parse("100").unwrap(),
                sub_totals: SubTotals::default(),
                regime: Regime::Standard,
            },
            codes: SecurityCodes::default(),
        }
    })
}

fuzz_target!(|data: &[u8]| {
    // Must not panic; errors are fine.
    let _ = fiskal::envelope::parse_response_envelope(transaction(), data);
});
