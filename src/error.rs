// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Error types and the per-thread pending error
//!
//! Internally all fallible operations return `Result<T, GlcError>`. At the
//! command boundary (see [`crate::commands`]) failures are recorded in a
//! thread-local slot which holds at most one pending [`ErrorCode`]: the first
//! error recorded wins until the slot is read with [`get_error`].

use std::cell::Cell;
use thiserror::Error;

/// Failure of a GLC operation
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlcError {
    /// Bad enumerant, out-of-range index or unknown name
    #[error("parameter error")]
    Parameter,
    /// Allocation, I/O or graphics-object failure
    #[error("resource error")]
    Resource,
    /// Operation not valid in the current state
    ///
    /// For example: no context is current to the calling thread, or a
    /// command was issued from within the unmapped-code callback.
    #[error("state error")]
    State,
}

impl From<std::io::Error> for GlcError {
    fn from(err: std::io::Error) -> Self {
        log::warn!("I/O failure: {err}");
        GlcError::Resource
    }
}

impl From<std::collections::TryReserveError> for GlcError {
    fn from(_: std::collections::TryReserveError) -> Self {
        GlcError::Resource
    }
}

/// Error code observable at the command boundary
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error is pending
    #[default]
    None,
    Parameter,
    Resource,
    State,
}

impl ErrorCode {
    /// The numeric value used by the GLC API
    pub fn to_glenum(self) -> u32 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::Parameter => 0x0040,
            ErrorCode::Resource => 0x0041,
            ErrorCode::State => 0x0042,
        }
    }
}

impl From<GlcError> for ErrorCode {
    fn from(err: GlcError) -> Self {
        match err {
            GlcError::Parameter => ErrorCode::Parameter,
            GlcError::Resource => ErrorCode::Resource,
            GlcError::State => ErrorCode::State,
        }
    }
}

thread_local! {
    static PENDING: Cell<ErrorCode> = const { Cell::new(ErrorCode::None) };
}

/// Record an error for the calling thread
///
/// An error is only recorded if none is pending. Recording
/// [`ErrorCode::None`] always clears the slot.
pub fn raise_error(code: ErrorCode) {
    PENDING.with(|slot| {
        if code == ErrorCode::None || slot.get() == ErrorCode::None {
            slot.set(code);
        }
    });
}

/// Take the pending error of the calling thread
///
/// The slot is reset to [`ErrorCode::None`].
pub fn get_error() -> ErrorCode {
    PENDING.with(|slot| slot.replace(ErrorCode::None))
}

/// Peek at the pending error without resetting it
pub fn pending_error() -> ErrorCode {
    PENDING.with(|slot| slot.get())
}

/// Convert a result to an option, recording any error
pub(crate) fn record<T>(result: Result<T, GlcError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            raise_error(err.into());
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_error_wins() {
        get_error();
        raise_error(ErrorCode::Parameter);
        raise_error(ErrorCode::State);
        assert_eq!(pending_error(), ErrorCode::Parameter);
        assert_eq!(get_error(), ErrorCode::Parameter);
        assert_eq!(get_error(), ErrorCode::None);
    }

    #[test]
    fn none_clears() {
        raise_error(ErrorCode::Resource);
        raise_error(ErrorCode::None);
        assert_eq!(get_error(), ErrorCode::None);
    }

    #[test]
    fn record_converts() {
        get_error();
        assert_eq!(record::<u32>(Err(GlcError::State)), None);
        assert_eq!(record(Ok(3)), Some(3));
        assert_eq!(get_error(), ErrorCode::State);
        assert_eq!(ErrorCode::State.to_glenum(), 0x42);
    }
}
