//! The module contains the errors the ledger can return.
//!
//! Every failure is a value: callers match on [`LedgerError::kind`] and show
//! the `Display` message to users.
use thiserror::Error;

use crate::storage::StoreError;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Group already initialized: {0}")]
    AlreadyInitialized(String),
    #[error("Group not initialized: {0}")]
    NotInitialized(String),
    #[error("No members: {0}")]
    NoMembers(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No split participants: {0}")]
    NoSplitParticipants(String),
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("{0}")]
    NotOwing(String),
    #[error("{0}")]
    NotOwed(String),
    #[error("Amount too high: {0}")]
    ExcessiveAmount(String),
    #[error("No expense found with description: {0}")]
    ExpenseNotFound(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Fieldless discriminant of [`LedgerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyInitialized,
    NotInitialized,
    NoMembers,
    InvalidAmount,
    NoSplitParticipants,
    UnknownUser,
    NotOwing,
    NotOwed,
    ExcessiveAmount,
    ExpenseNotFound,
    Persistence,
}

impl LedgerError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            Self::NotInitialized(_) => ErrorKind::NotInitialized,
            Self::NoMembers(_) => ErrorKind::NoMembers,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::NoSplitParticipants(_) => ErrorKind::NoSplitParticipants,
            Self::UnknownUser(_) => ErrorKind::UnknownUser,
            Self::NotOwing(_) => ErrorKind::NotOwing,
            Self::NotOwed(_) => ErrorKind::NotOwed,
            Self::ExcessiveAmount(_) => ErrorKind::ExcessiveAmount,
            Self::ExpenseNotFound(_) => ErrorKind::ExpenseNotFound,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AlreadyInitialized(a), Self::AlreadyInitialized(b)) => a == b,
            (Self::NotInitialized(a), Self::NotInitialized(b)) => a == b,
            (Self::NoMembers(a), Self::NoMembers(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NoSplitParticipants(a), Self::NoSplitParticipants(b)) => a == b,
            (Self::UnknownUser(a), Self::UnknownUser(b)) => a == b,
            (Self::NotOwing(a), Self::NotOwing(b)) => a == b,
            (Self::NotOwed(a), Self::NotOwed(b)) => a == b,
            (Self::ExcessiveAmount(a), Self::ExcessiveAmount(b)) => a == b,
            (Self::ExpenseNotFound(a), Self::ExpenseNotFound(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
