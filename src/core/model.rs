use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::*;

/// Message header (`Hlavicka`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    /// Identifies one submission attempt; kept unchanged on retries.
    pub message_uuid: MessageUuid,
    pub sent_at: FiscalDateTime,
    pub first_send: bool,
    /// Verification-only submissions are checked but not registered.
    pub verification_only: bool,
}

/// Optional sub-totals of a sale, one per tax bracket or special regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubTotal {
    /// Amount not subject to VAT.
    Untaxed,
    StandardRateBase,
    StandardRateVat,
    FirstReducedRateBase,
    FirstReducedRateVat,
    SecondReducedRateBase,
    SecondReducedRateVat,
    /// Travel-service margin scheme.
    TravelServices,
    UsedGoodsStandardRate,
    UsedGoodsFirstReducedRate,
    UsedGoodsSecondReducedRate,
    /// Amount intended for later drawing or settlement.
    DepositIntended,
    /// Amount drawn from an earlier deposit.
    DepositDrawn,
}

impl SubTotal {
    pub const ALL: [SubTotal; 13] = [
        Self::Untaxed,
        Self::StandardRateBase,
        Self::StandardRateVat,
        Self::FirstReducedRateBase,
        Self::FirstReducedRateVat,
        Self::SecondReducedRateBase,
        Self::SecondReducedRateVat,
        Self::TravelServices,
        Self::UsedGoodsStandardRate,
        Self::UsedGoodsFirstReducedRate,
        Self::UsedGoodsSecondReducedRate,
        Self::DepositIntended,
        Self::DepositDrawn,
    ];

    /// Attribute name in the authority's schema.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Untaxed => "zakl_nepodl_dph",
            Self::StandardRateBase => "zakl_dan1",
            Self::StandardRateVat => "dan1",
            Self::FirstReducedRateBase => "zakl_dan2",
            Self::FirstReducedRateVat => "dan2",
            Self::SecondReducedRateBase => "zakl_dan3",
            Self::SecondReducedRateVat => "dan3",
            Self::TravelServices => "cest_sluz",
            Self::UsedGoodsStandardRate => "pouzit_zboz1",
            Self::UsedGoodsFirstReducedRate => "pouzit_zboz2",
            Self::UsedGoodsSecondReducedRate => "pouzit_zboz3",
            Self::DepositIntended => "urceno_cerp_zuct",
            Self::DepositDrawn => "cerp_zuct",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.wire_name() == name)
    }
}

/// The thirteen optional sub-totals of [`TransactionData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTotals {
    pub untaxed: Option<CurrencyAmount>,
    pub standard_rate_base: Option<CurrencyAmount>,
    pub standard_rate_vat: Option<CurrencyAmount>,
    pub first_reduced_rate_base: Option<CurrencyAmount>,
    pub first_reduced_rate_vat: Option<CurrencyAmount>,
    pub second_reduced_rate_base: Option<CurrencyAmount>,
    pub second_reduced_rate_vat: Option<CurrencyAmount>,
    pub travel_services: Option<CurrencyAmount>,
    pub used_goods_standard_rate: Option<CurrencyAmount>,
    pub used_goods_first_reduced_rate: Option<CurrencyAmount>,
    pub used_goods_second_reduced_rate: Option<CurrencyAmount>,
    pub deposit_intended: Option<CurrencyAmount>,
    pub deposit_drawn: Option<CurrencyAmount>,
}

impl SubTotals {
    pub fn get(&self, kind: SubTotal) -> Option<CurrencyAmount> {
        *self.slot(kind)
    }

    pub fn set(&mut self, kind: SubTotal, value: Option<CurrencyAmount>) {
        *self.slot_mut(kind) = value;
    }

    /// Present sub-totals in schema order.
    pub fn present(&self) -> impl Iterator<Item = (SubTotal, CurrencyAmount)> + '_ {
        SubTotal::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|v| (kind, v)))
    }

    fn slot(&self, kind: SubTotal) -> &Option<CurrencyAmount> {
        match kind {
            SubTotal::Untaxed => &self.untaxed,
            SubTotal::StandardRateBase => &self.standard_rate_base,
            SubTotal::StandardRateVat => &self.standard_rate_vat,
            SubTotal::FirstReducedRateBase => &self.first_reduced_rate_base,
            SubTotal::FirstReducedRateVat => &self.first_reduced_rate_vat,
            SubTotal::SecondReducedRateBase => &self.second_reduced_rate_base,
            SubTotal::SecondReducedRateVat => &self.second_reduced_rate_vat,
            SubTotal::TravelServices => &self.travel_services,
            SubTotal::UsedGoodsStandardRate => &self.used_goods_standard_rate,
            SubTotal::UsedGoodsFirstReducedRate => &self.used_goods_first_reduced_rate,
            SubTotal::UsedGoodsSecondReducedRate => &self.used_goods_second_reduced_rate,
            SubTotal::DepositIntended => &self.deposit_intended,
            SubTotal::DepositDrawn => &self.deposit_drawn,
        }
    }

    fn slot_mut(&mut self, kind: SubTotal) -> &mut Option<CurrencyAmount> {
        match kind {
            SubTotal::Untaxed => &mut self.untaxed,
            SubTotal::StandardRateBase => &mut self.standard_rate_base,
            SubTotal::StandardRateVat => &mut self.standard_rate_vat,
            SubTotal::FirstReducedRateBase => &mut self.first_reduced_rate_base,
            SubTotal::FirstReducedRateVat => &mut self.first_reduced_rate_vat,
            SubTotal::SecondReducedRateBase => &mut self.second_reduced_rate_base,
            SubTotal::SecondReducedRateVat => &mut self.second_reduced_rate_vat,
            SubTotal::TravelServices => &mut self.travel_services,
            SubTotal::UsedGoodsStandardRate => &mut self.used_goods_standard_rate,
            SubTotal::UsedGoodsFirstReducedRate => &mut self.used_goods_first_reduced_rate,
            SubTotal::UsedGoodsSecondReducedRate => &mut self.used_goods_second_reduced_rate,
            SubTotal::DepositIntended => &mut self.deposit_intended,
            SubTotal::DepositDrawn => &mut self.deposit_drawn,
        }
    }
}

/// Sale data (`Data`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionData {
    pub payer_tax_id: TaxId,
    /// Taxpayer who authorized the payer to register on their behalf.
    pub authorized_tax_id: Option<TaxId>,
    pub establishment_id: EstablishmentId,
    pub cash_register_id: CashRegisterId,
    pub receipt_number: ReceiptNumber,
    pub sale_at: FiscalDateTime,
    pub total_amount: CurrencyAmount,
    pub sub_totals: SubTotals,
    pub regime: Regime,
}

pub const SIGNATURE_DIGEST: &str = "SHA256";
pub const SIGNATURE_CIPHER: &str = "RSA2048";
pub const SIGNATURE_ENCODING: &str = "base64";
pub const FINGERPRINT_DIGEST: &str = "SHA1";
pub const FINGERPRINT_ENCODING: &str = "base16";

/// Signature code (PKP): RSA-SHA256 signature over the sale plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCode {
    pub digest: String,
    pub cipher: String,
    pub encoding: String,
    /// Raw signature bytes; rendered as base64 on the wire.
    pub value: Vec<u8>,
}

/// Fingerprint code (BKP): dash-grouped SHA-1 of the signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintCode {
    pub digest: String,
    pub encoding: String,
    /// `XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX`, uppercase hex.
    pub value: String,
}

/// Control codes (`KontrolniKody`). Both are empty until computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityCodes {
    pub signature: Option<SignatureCode>,
    pub fingerprint: Option<FingerprintCode>,
}

impl SecurityCodes {
    pub fn is_complete(&self) -> bool {
        self.signature.is_some() && self.fingerprint.is_some()
    }
}

/// One sale submission (`Trzba`).
///
/// Mutable until its security codes are computed; afterwards it is only
/// read by envelope serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub data: TransactionData,
    pub codes: SecurityCodes,
}

/// A warning attached to an authority response (`Varovani`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: i32,
    pub message: String,
}

/// The authority's reply (`Odpoved`), accepted or rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityResponse {
    /// Acceptance time, or rejection time when nothing was accepted.
    pub timestamp: Option<FiscalDateTime>,
    /// Fiscal identification code (FIK); empty on rejection.
    pub confirmation_code: Option<String>,
    pub error_message: String,
    pub error_code: i32,
    pub test_mode: bool,
    pub warnings: Vec<Warning>,
}

impl AuthorityResponse {
    pub fn is_accepted(&self) -> bool {
        self.confirmation_code.is_some()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Source of "now" for defaulted timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> FiscalDateTime;
}

/// Local wall-clock time with its current UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> FiscalDateTime {
        FiscalDateTime::new(Local::now().fixed_offset())
    }
}

/// Source of fresh message UUIDs.
pub trait UuidSource: Send + Sync {
    fn generate(&self) -> MessageUuid;
}

/// Random (version 4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuid;

impl UuidSource for RandomUuid {
    fn generate(&self) -> MessageUuid {
        MessageUuid::new(Uuid::new_v4())
    }
}

/// Validated request fields, ready to be assembled into a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleFields {
    pub message_uuid: MessageUuid,
    pub sent_at: Option<FiscalDateTime>,
    pub first_send: bool,
    pub verification_only: bool,
    pub payer_tax_id: TaxId,
    pub authorized_tax_id: Option<TaxId>,
    pub establishment_id: EstablishmentId,
    pub cash_register_id: CashRegisterId,
    pub receipt_number: ReceiptNumber,
    pub sale_at: Option<FiscalDateTime>,
    pub total_amount: CurrencyAmount,
    pub sub_totals: SubTotals,
    pub regime: Regime,
}

/// Assemble a transaction from validated fields.
///
/// Omitted timestamps default to `clock.now()`; security codes start empty.
pub fn build_transaction(fields: SaleFields, clock: &dyn Clock) -> Transaction {
    let now = clock.now();
    Transaction {
        header: TransactionHeader {
            message_uuid: fields.message_uuid,
            sent_at: fields.sent_at.unwrap_or(now),
            first_send: fields.first_send,
            verification_only: fields.verification_only,
        },
        data: TransactionData {
            payer_tax_id: fields.payer_tax_id,
            authorized_tax_id: fields.authorized_tax_id,
            establishment_id: fields.establishment_id,
            cash_register_id: fields.cash_register_id,
            receipt_number: fields.receipt_number,
            sale_at: fields.sale_at.unwrap_or(now),
            total_amount: fields.total_amount,
            sub_totals: fields.sub_totals,
            regime: fields.regime,
        },
        codes: SecurityCodes::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct FixedClock(FiscalDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> FiscalDateTime {
            self.0
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
            sale_at: None,
            total_amount: CurrencyAmount::new(dec!(100)),
            sub_totals: SubTotals::default(),
            regime: Regime::Standard,
        }
    }

    #[test]
    fn omitted_timestamps_default_to_now() {
        let now = FiscalDateTime::parse("2024-02-01T08:00:00+01:00").unwrap();
        let t = build_transaction(fields(), &FixedClock(now));
        assert_eq!(t.header.sent_at, now);
        assert_eq!(t.data.sale_at, now);
        assert!(!t.codes.is_complete());
    }

    #[test]
    fn supplied_timestamps_are_kept() {
        let now = FiscalDateTime::parse("2024-02-01T08:00:00+01:00").unwrap();
        let sale = FiscalDateTime::parse("2023-06-18T12:40:30+02:00").unwrap();
        let mut f = fields();
        f.sale_at = Some(sale);
        let t = build_transaction(f, &FixedClock(now));
        assert_eq!(t.data.sale_at, sale);
        assert_eq!(t.header.sent_at, now);
    }

    #[test]
    fn sub_totals_by_kind() {
        let mut s = SubTotals::default();
        s.set(SubTotal::TravelServices, Some(CurrencyAmount::new(dec!(12.5))));
        s.set(SubTotal::StandardRateVat, Some(CurrencyAmount::new(dec!(21))));
        assert_eq!(s.travel_services, Some(CurrencyAmount::new(dec!(12.5))));
        let kinds: Vec<_> = s.present().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![SubTotal::StandardRateVat, SubTotal::TravelServices]);
    }

    #[test]
    fn wire_names_round_trip() {
        for kind in SubTotal::ALL {
            assert_eq!(SubTotal::from_wire_name(kind.wire_name()), Some(kind));
        }
        assert_eq!(SubTotal::from_wire_name("celk_trzba"), None);
    }
}
