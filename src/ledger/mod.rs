// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The consistency core. Every mutation of a derived balance (account
//! balance, credit used, budget spent, savings running balance, loan
//! remaining) funnels through the components in this module, so the
//! materialized fields stay equal to what the raw history implies.

use rust_decimal::Decimal;
use thiserror::Error;

pub mod accounts;
pub mod balance;
pub mod bills;
pub mod budgets;
pub mod cascade;
pub mod loans;
pub mod savings;
pub mod transactions;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business-rule violation. Raised before anything is written.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist (or belongs to another owner).
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    /// A guarded balance write found the record changed underneath it.
    /// Surfaced as-is; there are no built-in retries.
    #[error("conflicting update on {kind} {id}")]
    Conflict { kind: &'static str, id: i64 },

    /// A stored value failed to parse back. Storage-level corruption,
    /// surfaced untouched.
    #[error("corrupt stored {what} '{value}'")]
    Corrupt { what: &'static str, value: String },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        LedgerError::NotFound {
            kind,
            key: id.to_string(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Capability for dropping cached aggregates derived from account balances.
/// Injected into every balance-affecting operation and called synchronously
/// after the mutation commits; nothing in the core reaches a cache any other
/// way.
pub trait Invalidator {
    fn invalidate(&self, owner: &str);
}

/// For callers that keep no derived aggregates (tests, one-shot tools).
pub struct NoopInvalidator;

impl Invalidator for NoopInvalidator {
    fn invalidate(&self, _owner: &str) {}
}

pub(crate) fn stored_amount(value: &str) -> LedgerResult<Decimal> {
    value.parse::<Decimal>().map_err(|_| LedgerError::Corrupt {
        what: "amount",
        value: value.to_string(),
    })
}

pub(crate) fn require_positive(amount: Decimal, what: &str) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "{} must be positive, got {}",
            what, amount
        )));
    }
    Ok(())
}
