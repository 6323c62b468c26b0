// ===============================
// src/ledger.rs (per-ticker position / cash / last price)
// ===============================
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Event, PnlReport, Side};
use crate::error::EngineError;

/// What to do with an event older than the ledger's last applied timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StalePolicy {
    /// Apply anyway.
    #[default]
    Accept,
    /// Count it and leave the ledger untouched.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub last_price: Decimal,
    pub position: Decimal,
    pub cash_balance: Decimal,
    pub last_event_ts: Option<i64>,
    pub applied_events: u64,
    pub unknown_events: u64,
    pub stale_events: u64,
}

impl LedgerState {
    /// `cash_balance + last_price * position`, `None` when it cannot be held exactly.
    pub fn total_value(&self) -> Option<Decimal> {
        self.exact_total_value().ok()
    }

    fn exact_total_value(&self) -> Result<Decimal, Inexact> {
        exact_add(exact_mul(self.last_price, self.position)?, self.cash_balance)
    }
}

/// Why a ledger operation could not produce an exact decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inexact {
    Overflow,
    /// rust_decimal rescaled the result to fit 28 fractional digits.
    Rounded,
}

// checked_mul hanya None kalau integer part overflow; kalau scale > 28 dia
// membulatkan diam-diam, jadi scale hasil dicek terhadap scale yang eksak.
fn exact_mul(a: Decimal, b: Decimal) -> Result<Decimal, Inexact> {
    let product = a.checked_mul(b).ok_or(Inexact::Overflow)?;
    if a.is_zero() || b.is_zero() || product.scale() == a.scale() + b.scale() {
        Ok(product)
    } else {
        Err(Inexact::Rounded)
    }
}

fn exact_add(a: Decimal, b: Decimal) -> Result<Decimal, Inexact> {
    let sum = a.checked_add(b).ok_or(Inexact::Overflow)?;
    if a.is_zero() || b.is_zero() || sum.is_zero() || sum.scale() == a.scale().max(b.scale()) {
        Ok(sum)
    } else {
        Err(Inexact::Rounded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Unknown event type: counted, no financial change.
    UnknownKind,
    /// Older than `last_event_ts` under [`StalePolicy::Reject`]: counted, ignored.
    Stale,
}

pub struct InstrumentLedger {
    ticker: String,
    stale_policy: StalePolicy,
    state: Mutex<LedgerState>,
}

impl InstrumentLedger {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self::with_policy(ticker, StalePolicy::default())
    }

    pub fn with_policy(ticker: impl Into<String>, stale_policy: StalePolicy) -> Self {
        Self { ticker: ticker.into(), stale_policy, state: Mutex::new(LedgerState::default()) }
    }

    pub fn ticker(&self) -> &str { &self.ticker }

    /// Apply one event under the ledger lock.
    ///
    /// The new state is computed on a copy and only written back once the fill
    /// side is valid and every decimal operation stayed exact (no overflow, no
    /// rounding), so a failed apply leaves the ledger exactly as it was.
    pub fn apply(&self, event: &Event) -> Result<ApplyOutcome, EngineError> {
        debug_assert_eq!(event.ticker(), self.ticker);
        let mut st = self.state.lock();
        let mut next = st.clone();

        match event {
            Event::Unknown(_) => {
                st.unknown_events += 1;
                return Ok(ApplyOutcome::UnknownKind);
            }
            _ if self.is_stale(&st, event.timestamp()) => {
                st.stale_events += 1;
                return Ok(ApplyOutcome::Stale);
            }
            Event::Price(p) => {
                next.last_price = p.price;
                next.last_event_ts = Some(p.timestamp);
            }
            Event::Fill(f) => {
                let side = Side::from_token(&f.side)
                    .ok_or_else(|| EngineError::InvalidSide { ticker: self.ticker.clone(), side: f.side.clone() })?;
                let signed_qty = side.signed(f.quantity);
                next.position = exact_add(st.position, signed_qty).map_err(|e| self.inexact(e))?;
                let notional = exact_mul(f.price, signed_qty).map_err(|e| self.inexact(e))?;
                next.cash_balance = exact_add(st.cash_balance, -notional).map_err(|e| self.inexact(e))?;
                next.last_event_ts = Some(f.timestamp);
            }
        }

        next.exact_total_value().map_err(|e| self.inexact(e))?;
        next.applied_events += 1;
        *st = next;
        Ok(ApplyOutcome::Applied)
    }

    pub fn snapshot(&self) -> PnlReport {
        let st = self.state.lock();
        PnlReport {
            timestamp: st.last_event_ts,
            ticker: self.ticker.clone(),
            position: st.position,
            // apply() never commits a state whose value is not exact
            total_value: st.total_value().unwrap_or_default(),
        }
    }

    pub fn state(&self) -> LedgerState { self.state.lock().clone() }

    fn is_stale(&self, st: &LedgerState, ts: i64) -> bool {
        self.stale_policy == StalePolicy::Reject && st.last_event_ts.map_or(false, |last| ts < last)
    }

    fn inexact(&self, why: Inexact) -> EngineError {
        let ticker = self.ticker.clone();
        match why {
            Inexact::Overflow => EngineError::Overflow { ticker },
            Inexact::Rounded => EngineError::PrecisionLoss { ticker },
        }
    }
}
