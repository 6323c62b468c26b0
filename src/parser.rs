// ===============================
// src/parser.rs
// ===============================
//
// Decoder satu baris input -> Event:
//   <TypeCode> <EpochTimestamp> <Ticker> <Payload>
//   P 100 ABC 10.00
//   F 300 ABC 11.00 2 BUY
//
// Type code is case-insensitive; anything other than P/F yields an inert
// Event::Unknown. The fill side is carried as-is and validated by the ledger.
//
use rust_decimal::Decimal;

use crate::domain::{Event, EventKind, FillEvent, PriceEvent, UnknownEvent};
use crate::error::EngineError;

pub fn parse_line(line: &str) -> Result<Event, EngineError> {
    let mut fields = line.split_whitespace();
    let (code, ts, ticker) = match (fields.next(), fields.next(), fields.next()) {
        (Some(c), Some(t), Some(k)) => (c, t, k),
        _ => return Err(EngineError::malformed(line, "expected at least 4 fields")),
    };
    let payload: Vec<&str> = fields.collect();
    if payload.is_empty() {
        return Err(EngineError::malformed(line, "expected at least 4 fields"));
    }

    let timestamp: i64 = ts
        .parse()
        .map_err(|_| EngineError::malformed(line, format!("timestamp {ts:?} is not a base-10 integer")))?;
    let ticker = ticker.to_string();
    let raw_payload = payload.join(" ");

    match EventKind::from_code(code) {
        EventKind::Price => {
            let [px] = payload.as_slice() else {
                return Err(EngineError::malformed(line, "price payload must be `<price>`"));
            };
            let price = parse_decimal(line, "price", px)?;
            Ok(Event::Price(PriceEvent { timestamp, ticker, raw_payload, price }))
        }
        EventKind::Fill => {
            let [px, qty, side] = payload.as_slice() else {
                return Err(EngineError::malformed(line, "fill payload must be `<price> <quantity> <side>`"));
            };
            let price = parse_decimal(line, "price", px)?;
            let quantity = parse_decimal(line, "quantity", qty)?;
            if quantity < Decimal::ZERO {
                return Err(EngineError::malformed(line, format!("negative quantity {qty}")));
            }
            Ok(Event::Fill(FillEvent {
                timestamp,
                ticker,
                raw_payload,
                price,
                quantity,
                side: side.to_string(),
            }))
        }
        EventKind::Unknown => Ok(Event::Unknown(UnknownEvent {
            type_code: code.to_string(),
            timestamp,
            ticker,
            raw_payload,
        })),
    }
}

/// Price and quantity tokens go through rust_decimal's `FromStr`: an optional
/// sign, digits, an optional fraction, and an optional `e`/`E` exponent
/// (`1E2` is 100; the raw payload keeps the text as written). A value needing
/// more than 28 fractional digits or a 96-bit mantissa is `MalformedRecord`.
fn parse_decimal(line: &str, field: &str, tok: &str) -> Result<Decimal, EngineError> {
    tok.parse::<Decimal>()
        .map_err(|e| EngineError::malformed(line, format!("{field} {tok:?} is not a decimal: {e}")))
}
