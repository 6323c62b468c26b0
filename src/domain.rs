// ===============================
// src/domain.rs
// ===============================
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rendered in place of a timestamp when a ledger has not applied anything yet.
pub const NO_TIMESTAMP: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side { Buy, Sell }
impl Side {
    /// BUY/B or SELL/S, case-insensitive.
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok.to_ascii_uppercase().as_str() {
            "BUY" | "B" => Some(Side::Buy),
            "SELL" | "S" => Some(Side::Sell),
            _ => None,
        }
    }
    pub fn signed(&self, qty: Decimal) -> Decimal { match self { Side::Buy => qty, Side::Sell => -qty } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind { Price, Fill, Unknown }
impl EventKind {
    pub fn from_code(code: &str) -> Self {
        if code.eq_ignore_ascii_case("P") {
            EventKind::Price
        } else if code.eq_ignore_ascii_case("F") {
            EventKind::Fill
        } else {
            EventKind::Unknown
        }
    }
    // dipakai sebagai label metrics
    pub fn as_str(&self) -> &'static str {
        match self { EventKind::Price => "price", EventKind::Fill => "fill", EventKind::Unknown => "unknown" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEvent { pub timestamp: i64, pub ticker: String, pub raw_payload: String, pub price: Decimal }
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: i64,
    pub ticker: String,
    pub raw_payload: String,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Opaque until a ledger interprets it, see [`Side::from_token`].
    pub side: String,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownEvent { pub type_code: String, pub timestamp: i64, pub ticker: String, pub raw_payload: String }

/// One decoded input record. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event { Price(PriceEvent), Fill(FillEvent), Unknown(UnknownEvent) }

impl Event {
    pub fn kind(&self) -> EventKind {
        match self { Event::Price(_) => EventKind::Price, Event::Fill(_) => EventKind::Fill, Event::Unknown(_) => EventKind::Unknown }
    }
    pub fn timestamp(&self) -> i64 {
        match self { Event::Price(e) => e.timestamp, Event::Fill(e) => e.timestamp, Event::Unknown(e) => e.timestamp }
    }
    pub fn ticker(&self) -> &str {
        match self { Event::Price(e) => &e.ticker, Event::Fill(e) => &e.ticker, Event::Unknown(e) => &e.ticker }
    }
    pub fn raw_payload(&self) -> &str {
        match self { Event::Price(e) => &e.raw_payload, Event::Fill(e) => &e.raw_payload, Event::Unknown(e) => &e.raw_payload }
    }
    pub fn type_code(&self) -> &str {
        match self { Event::Price(_) => "P", Event::Fill(_) => "F", Event::Unknown(e) => &e.type_code }
    }
}

// Same layout as the input record: `<code> <ts> <ticker> <payload>`
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.type_code(), self.timestamp(), self.ticker(), self.raw_payload())
    }
}

/// Point-in-time mark-to-market view of one ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlReport {
    pub timestamp: Option<i64>,
    pub ticker: String,
    pub position: Decimal,
    pub total_value: Decimal,
}

impl fmt::Display for PnlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PNL {} {} {} {}",
            self.timestamp.unwrap_or(NO_TIMESTAMP),
            self.ticker,
            self.position,
            self.total_value
        )
    }
}
