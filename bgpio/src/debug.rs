//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::packet::consts::{AttrFlags, AttrType};
use crate::packet::error::UpdateMessageError;

// Attribute decoding diagnostics.
//
// None of these abort decoding: they describe data that was skipped or
// dropped while the attribute set was otherwise accepted, or an attribute
// error right before it is returned to the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Debug {
    AttrUnknownSkipped(u8, AttrFlags),
    AttrUnknownRetained(u8, AttrFlags),
    AttrIgnored(AttrType),
    AsPathSegmentSkipped(u8, u8),
    AsPathSegmentEmpty(u8),
    AttrError(u8, UpdateMessageError),
    AttrListError(u16, UpdateMessageError),
}

// Destination for decoding diagnostics.
//
// Decoders report through the sink they are given instead of a global
// logger, so the same input always produces the same output and the same
// diagnostics.
pub trait DiagnosticSink {
    fn record(&mut self, debug: Debug);
}

// Sink that emits every diagnostic through the tracing API.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

// ===== impl Debug =====

impl Debug {
    // Log debug message using the tracing API.
    pub fn log(&self) {
        match self {
            Debug::AttrUnknownSkipped(attr_type, flags)
            | Debug::AttrUnknownRetained(attr_type, flags) => {
                debug_span!("attribute", %attr_type).in_scope(|| {
                    debug!(?flags, "{}", self);
                })
            }
            Debug::AttrIgnored(attr_type) => {
                debug_span!("attribute", %attr_type).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::AsPathSegmentSkipped(seg_type, seg_len) => {
                debug_span!("attribute", attr_type = %AttrType::AsPath)
                    .in_scope(|| {
                        debug!(%seg_type, %seg_len, "{}", self);
                    })
            }
            Debug::AsPathSegmentEmpty(seg_type) => {
                debug_span!("attribute", attr_type = %AttrType::AsPath)
                    .in_scope(|| {
                        debug!(%seg_type, "{}", self);
                    })
            }
            Debug::AttrError(attr_type, error) => {
                debug_span!("attribute", %attr_type).in_scope(|| {
                    let data = serde_json::to_string(error.data())
                        .unwrap_or_default();
                    debug!(%error, %data, "{}", self);
                })
            }
            Debug::AttrListError(attr_len, error) => {
                debug!(%attr_len, %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::AttrUnknownSkipped(..) => {
                write!(f, "unrecognized optional attribute skipped")
            }
            Debug::AttrUnknownRetained(..) => {
                write!(f, "unrecognized optional attribute marked as partial")
            }
            Debug::AttrIgnored(..) => {
                write!(f, "attribute ignored")
            }
            Debug::AsPathSegmentSkipped(..) => {
                write!(f, "unsupported AS_PATH segment type skipped")
            }
            Debug::AsPathSegmentEmpty(..) => {
                write!(f, "empty AS_PATH segment skipped")
            }
            Debug::AttrError(..) => {
                write!(f, "malformed attribute")
            }
            Debug::AttrListError(..) => {
                write!(f, "malformed attribute list")
            }
        }
    }
}

// ===== impl TracingSink =====

impl DiagnosticSink for TracingSink {
    fn record(&mut self, debug: Debug) {
        debug.log();
    }
}

// ===== impl Vec<Debug> =====

impl DiagnosticSink for Vec<Debug> {
    fn record(&mut self, debug: Debug) {
        self.push(debug);
    }
}
