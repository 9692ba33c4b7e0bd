// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The record an update or delete targets does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// A delete was refused because other rows still reference the target.
    #[error("{0}")]
    ReferentialConflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        LedgerError::ReferentialConflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::Invalid(msg.into())
    }

    /// Decimal arithmetic left the representable range.
    pub fn out_of_range() -> Self {
        LedgerError::Invalid("amount out of range".into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
