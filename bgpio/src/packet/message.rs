//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::Arbitrary;
use bgpio_utils::bytes::BytesExt;
use bytes::{Buf, Bytes};
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::debug::{Debug, DiagnosticSink};
use crate::packet::attribute::PathAttrs;
use crate::packet::consts::{ErrorCode, UpdateMessageErrorSubcode};
use crate::packet::error::{DecodeResult, UpdateMessageError};

// Type of the peer an UPDATE message was received from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
#[serde(rename_all = "kebab-case")]
pub enum PeerType {
    #[default]
    Internal,
    External,
}

// BGP message decoding context.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
#[serde(default, rename_all = "kebab-case")]
pub struct DecodeCxt {
    pub peer_type: PeerType,
}

//
// NOTIFICATION Message.
//
// Encoding format (message body):
//
// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Error code    | Error subcode |   Data (variable)             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct NotificationMsg {
    pub error_code: u8,
    pub error_subcode: u8,
    pub data: Vec<u8>,
}

// ===== global functions =====

//
// UPDATE message path attributes.
//
// Encoding format:
//
// +-----------------------------------------------------+
// |   Total Path Attribute Length (2 octets)            |
// +-----------------------------------------------------+
// |   Path Attributes (variable)                        |
// +-----------------------------------------------------+
//
// The buffer must be positioned right after the "Total Path Attribute Length"
// field, whose value is given in `attr_len`. On success the buffer is
// advanced past the path attributes.
//
pub fn decode_path_attrs(
    buf: &mut Bytes,
    attr_len: u16,
    cxt: &DecodeCxt,
    sink: &mut dyn DiagnosticSink,
) -> DecodeResult<PathAttrs> {
    // RFC 4271 - Section 6.3:
    // "If the Withdrawn Routes Length or Total Attribute Length is too large
    // (i.e., if Withdrawn Routes Length + Total Attribute Length + 23 exceeds
    // the message Length), then the Error Subcode MUST be set to Malformed
    // Attribute List".
    if attr_len as usize > buf.remaining() {
        let error = UpdateMessageError::MalformedAttributeList(Bytes::new());
        sink.record(Debug::AttrListError(attr_len, error.clone()));
        return Err(error);
    }

    let mut buf_attr = buf.try_get_bytes(attr_len as usize)?;
    PathAttrs::decode(&mut buf_attr, cxt, sink)
}

// ===== impl NotificationMsg =====

impl NotificationMsg {
    pub fn new(
        error_code: impl ToPrimitive,
        error_subcode: impl ToPrimitive,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        NotificationMsg {
            error_code: error_code.to_u8().unwrap_or_default(),
            error_subcode: error_subcode.to_u8().unwrap_or_default(),
            data: data.into(),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u8(self.error_code)
    }

    pub fn update_error_subcode(&self) -> Option<UpdateMessageErrorSubcode> {
        if self.error_code() != Some(ErrorCode::UpdateMessageError) {
            return None;
        }

        UpdateMessageErrorSubcode::from_u8(self.error_subcode)
    }
}

impl From<UpdateMessageError> for NotificationMsg {
    fn from(error: UpdateMessageError) -> NotificationMsg {
        NotificationMsg::new(
            error.error_code(),
            error.error_subcode(),
            error.data(),
        )
    }
}
