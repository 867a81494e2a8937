//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, TryGetError};
use serde::{Deserialize, Serialize};

use crate::packet::consts::{ErrorCode, UpdateMessageErrorSubcode};

// Type aliases.
pub type DecodeResult<T> = Result<T, UpdateMessageError>;

// UPDATE message errors.
//
// Every variant except `ReadOutOfBounds` carries the data that goes into the
// NOTIFICATION message. For attribute errors that is the offending attribute
// as seen on the wire (type, length and value), truncated when the buffer
// ended before the declared attribute length.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum UpdateMessageError {
    // The buffer ended inside an attribute header, so there is no complete
    // attribute to report. It is sent as a Malformed Attribute List error,
    // for which RFC 4271 defines no data.
    ReadOutOfBounds,
    MalformedAttributeList(Bytes),
    UnrecognizedWellKnownAttribute(Bytes),
    MissingWellKnownAttribute(Bytes),
    AttributeFlagsError(Bytes),
    AttributeLengthError(Bytes),
    InvalidOriginAttribute(Bytes),
}

// ===== impl UpdateMessageError =====

impl UpdateMessageError {
    // Returns the NOTIFICATION error code.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::UpdateMessageError
    }

    // Returns the NOTIFICATION error subcode.
    pub fn error_subcode(&self) -> UpdateMessageErrorSubcode {
        match self {
            // RFC 4271 doesn't define a dedicated subcode for a truncated
            // attribute list.
            UpdateMessageError::ReadOutOfBounds
            | UpdateMessageError::MalformedAttributeList(..) => {
                UpdateMessageErrorSubcode::MalformedAttributeList
            }
            UpdateMessageError::UnrecognizedWellKnownAttribute(..) => {
                UpdateMessageErrorSubcode::UnrecognizedWellKnownAttribute
            }
            UpdateMessageError::MissingWellKnownAttribute(..) => {
                UpdateMessageErrorSubcode::MissingWellKnownAttribute
            }
            UpdateMessageError::AttributeFlagsError(..) => {
                UpdateMessageErrorSubcode::AttributeFlagsError
            }
            UpdateMessageError::AttributeLengthError(..) => {
                UpdateMessageErrorSubcode::AttributeLengthError
            }
            UpdateMessageError::InvalidOriginAttribute(..) => {
                UpdateMessageErrorSubcode::InvalidOriginAttribute
            }
        }
    }

    // Returns the raw data associated with the error.
    pub fn data(&self) -> &[u8] {
        match self {
            UpdateMessageError::ReadOutOfBounds => &[],
            UpdateMessageError::MalformedAttributeList(data)
            | UpdateMessageError::UnrecognizedWellKnownAttribute(data)
            | UpdateMessageError::MissingWellKnownAttribute(data)
            | UpdateMessageError::AttributeFlagsError(data)
            | UpdateMessageError::AttributeLengthError(data)
            | UpdateMessageError::InvalidOriginAttribute(data) => &data[..],
        }
    }
}

impl std::fmt::Display for UpdateMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UPDATE message error: ")?;

        match self {
            UpdateMessageError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            UpdateMessageError::MalformedAttributeList(..) => {
                write!(f, "malformed attribute list")
            }
            UpdateMessageError::UnrecognizedWellKnownAttribute(..) => {
                write!(f, "unrecognized well-known attribute")
            }
            UpdateMessageError::MissingWellKnownAttribute(..) => {
                write!(f, "missing well-known attribute")
            }
            UpdateMessageError::AttributeFlagsError(..) => {
                write!(f, "attribute flags error")
            }
            UpdateMessageError::AttributeLengthError(..) => {
                write!(f, "attribute length error")
            }
            UpdateMessageError::InvalidOriginAttribute(..) => {
                write!(f, "invalid ORIGIN attribute")
            }
        }
    }
}

impl std::error::Error for UpdateMessageError {}

impl From<TryGetError> for UpdateMessageError {
    fn from(_error: TryGetError) -> UpdateMessageError {
        UpdateMessageError::ReadOutOfBounds
    }
}
