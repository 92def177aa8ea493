//! Unified error type for the commit engine, the RPC fabric, and the CLI.

use thiserror::Error;

/// Every fallible operation in this crate returns `TpcResult`.
pub type TpcResult<T> = Result<T, TpcError>;

#[derive(Debug, Error)]
pub enum TpcError {
    #[error("amount must be non-negative")]
    NegativeAmount,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient funds: balance {balance:.2}, requested {amount:.2}")]
    InsufficientFunds { balance: f64, amount: f64 },

    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("a transaction may not target the same participant twice")]
    SelfCollision,

    #[error("balance file is missing")]
    MissingBalanceFile,

    #[error("this node does not act as a coordinator")]
    NotCoordinator,

    #[error("this node does not act as a participant")]
    NotParticipant,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("call timed out")]
    Timeout,

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid prepare response from {0:?}")]
    InvalidPrepareResponse(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("{0} leg(s) failed: {1}")]
    Aggregate(usize, String),
}

/// Errors cross an RPC boundary as plain strings (an argument/result struct
/// cannot carry an arbitrary `std::error::Error`). The caller rehydrates them
/// as [`TpcError::Remote`].
pub type WireResult<T> = Result<T, String>;

pub fn to_wire<T>(result: TpcResult<T>) -> WireResult<T> {
    result.map_err(|e| e.to_string())
}

pub fn from_wire<T>(result: WireResult<T>) -> TpcResult<T> {
    result.map_err(TpcError::Remote)
}
