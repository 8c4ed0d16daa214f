//! # fiskal
//!
//! Core of a gateway for the Czech electronic sales-registration protocol
//! (EET): validated field types, the transaction model, the PKP/BKP
//! security codes, the WS-Security signed SOAP envelope and the JSON
//! request/response adapter.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use fiskal::codes;
//! use fiskal::core::*;
//! use rust_decimal_macros::dec;
//!
//! let data = TransactionData {
//!     payer_tax_id: TaxId::new("CZ00000019"),
//!     authorized_tax_id: None,
//!     establishment_id: EstablishmentId::new(181),
//!     cash_register_id: CashRegisterId::new("1/788/23"),
//!     receipt_number: ReceiptNumber::new("0/6460/ZQ42"),
//!     sale_at: FiscalDateTime::parse("2023-06-18T12:40:30+02:00").unwrap(),
//!     total_amount: CurrencyAmount::new(dec!(100)),
//!     sub_totals: SubTotals::default(),
//!     regime: Regime::Standard,
//! };
//!
//! assert_eq!(
//!     codes::signature_plaintext(&data),
//!     "CZ00000019|181|1/788/23|0/6460/ZQ42|2023-06-18T12:40:30+02:00|100.00"
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | (default) | Field types, security codes, envelope codec, gateway adapter |
//! | `transport` | reqwest-based SOAP transport |
//! | `all` | Everything |

pub mod codes;
pub mod core;
pub mod envelope;
pub mod gateway;

#[cfg(feature = "transport")]
pub mod transport;
