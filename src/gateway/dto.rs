//! Public JSON shapes of the gateway.
//!
//! Field names follow the authority's attribute names so that a request body
//! reads the same as the `Trzba` element it becomes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{SubTotal, Warning};

/// Sale submission as received from a client. Every field is optional at this
/// level; presence and shape are checked by the validator registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_password: Option<String>,

    pub uuid_zpravy: Option<String>,
    pub dat_odesl: Option<String>,
    pub prvni_zaslani: bool,
    pub overeni: bool,

    pub dic_popl: Option<String>,
    pub dic_poverujiciho: Option<String>,
    pub id_provoz: Option<i64>,
    pub id_pokl: Option<String>,
    pub porad_cis: Option<String>,
    pub dat_trzby: Option<String>,
    pub celk_trzba: Option<Decimal>,
    pub zakl_nepodl_dph: Option<Decimal>,
    pub zakl_dan1: Option<Decimal>,
    pub dan1: Option<Decimal>,
    pub zakl_dan2: Option<Decimal>,
    pub dan2: Option<Decimal>,
    pub zakl_dan3: Option<Decimal>,
    pub dan3: Option<Decimal>,
    pub cest_sluz: Option<Decimal>,
    pub pouzit_zboz1: Option<Decimal>,
    pub pouzit_zboz2: Option<Decimal>,
    pub pouzit_zboz3: Option<Decimal>,
    pub urceno_cerp_zuct: Option<Decimal>,
    pub cerp_zuct: Option<Decimal>,
    pub rezim: Option<i64>,
}

impl SaleRequest {
    /// Raw value of an optional sub-total.
    pub fn sub_total(&self, kind: SubTotal) -> Option<Decimal> {
        match kind {
            SubTotal::Untaxed => self.zakl_nepodl_dph,
            SubTotal::StandardRateBase => self.zakl_dan1,
            SubTotal::StandardRateVat => self.dan1,
            SubTotal::FirstReducedRateBase => self.zakl_dan2,
            SubTotal::FirstReducedRateVat => self.dan2,
            SubTotal::SecondReducedRateBase => self.zakl_dan3,
            SubTotal::SecondReducedRateVat => self.dan3,
            SubTotal::TravelServices => self.cest_sluz,
            SubTotal::UsedGoodsStandardRate => self.pouzit_zboz1,
            SubTotal::UsedGoodsFirstReducedRate => self.pouzit_zboz2,
            SubTotal::UsedGoodsSecondReducedRate => self.pouzit_zboz3,
            SubTotal::DepositIntended => self.urceno_cerp_zuct,
            SubTotal::DepositDrawn => self.cerp_zuct,
        }
    }
}

/// A warning as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningBody {
    pub kod_varov: i32,
    pub text: String,
}

impl From<&Warning> for WarningBody {
    fn from(w: &Warning) -> Self {
        Self {
            kod_varov: w.code,
            text: w.message.clone(),
        }
    }
}

/// Reply to a sale submission.
///
/// Either `gateway_error` alone is set (the gateway failed), or the
/// authority's verdict is carried in the remaining fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fik: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zprava: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub kod: i32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub test: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub varovani: Vec<WarningBody>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// Health-check reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub eet_gateway: String,
    pub tax_admin: String,
}

/// Certificate registration request. `pkcs12_data` is base64 in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCertRequest {
    pub id: String,
    pub password: String,
    pub pkcs12_data: String,
    pub pkcs12_password: String,
}

/// Certificate registration reply: the stored id, or a gateway error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCertResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
