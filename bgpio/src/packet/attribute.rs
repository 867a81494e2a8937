//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashSet;
use std::net::Ipv4Addr;

use bgpio_utils::bytes::BytesExt;
use bytes::{Buf, Bytes};
use derive_new::new;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::debug::{Debug, DiagnosticSink};
use crate::packet::consts::{
    ASN_LEN, AsPathSegmentType, AttrFlags, AttrType, Origin,
};
use crate::packet::error::{DecodeResult, UpdateMessageError};
use crate::packet::message::{DecodeCxt, PeerType};

pub const ATTR_MIN_LEN: u16 = 3;
pub const ATTR_MIN_LEN_EXT: u16 = 4;

//
// Path attribute header.
//
// Encoding format:
//
//  0                   1
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Attr. Flags  |Attr. Type Code|
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Attr. Length (1 or 2 octets) |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// The length field is two octets long when the Extended Length bit is set,
// and one octet long otherwise.
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AttrHdr {
    pub flags: AttrFlags,
    pub attr_type: u8,
    pub length: u16,
    // The whole attribute as seen on the wire, header included. Shorter than
    // `total_len()` when the buffer ends before the declared length.
    pub data: Bytes,
}

// Decoded path attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Attr {
    Origin(Origin),
    AsPath(AsPath),
    Nexthop(Ipv4Addr),
    Med(u32),
    LocalPref(u32),
    AtomicAggregate,
    Aggregator(Aggregator),
    Communities(Vec<u32>),
    Unknown(UnknownAttr),
}

// Path attributes of an UPDATE message, in the order they were received.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PathAttrs(Vec<Attr>);

// AS_PATH attribute value.
//
// AS numbers are collected per segment type, preserving the order in which
// they were received. The number of AS_SET segments is kept apart since the
// members of all of them share a single list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AsPath {
    set: Vec<u16>,
    sequence: Vec<u16>,
    set_count: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Aggregator {
    pub asn: u16,
    pub identifier: Ipv4Addr,
}

// Unrecognized optional transitive attribute, kept for propagation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct UnknownAttr {
    pub attr_type: u8,
    pub flags: AttrFlags,
    pub length: u16,
    pub value: Bytes,
}

// ===== impl AttrHdr =====

impl AttrHdr {
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        // Keep a view of the whole attribute for error reporting.
        let start = buf.clone();

        // Parse attribute flags.
        let flags = buf.try_get_u8()?;
        let flags = AttrFlags::from_bits_truncate(flags);

        // Parse attribute type.
        let attr_type = buf.try_get_u8()?;

        // Parse attribute length.
        let length = if flags.contains(AttrFlags::EXTENDED) {
            buf.try_get_u16()?
        } else {
            buf.try_get_u8()? as u16
        };

        let mut hdr = AttrHdr {
            flags,
            attr_type,
            length,
            data: Bytes::new(),
        };
        hdr.data = start.peek_bytes(hdr.total_len());
        Ok(hdr)
    }

    pub fn is_optional(&self) -> bool {
        self.flags.contains(AttrFlags::OPTIONAL)
    }

    pub fn is_transitive(&self) -> bool {
        self.flags.contains(AttrFlags::TRANSITIVE)
    }

    pub fn is_partial(&self) -> bool {
        self.flags.contains(AttrFlags::PARTIAL)
    }

    pub fn is_extended(&self) -> bool {
        self.flags.contains(AttrFlags::EXTENDED)
    }

    // Length of the flags, type and length fields.
    pub fn hdr_len(&self) -> usize {
        if self.is_extended() {
            ATTR_MIN_LEN_EXT as usize
        } else {
            ATTR_MIN_LEN as usize
        }
    }

    // Number of bytes the attribute takes on the wire.
    pub fn total_len(&self) -> usize {
        self.hdr_len() + self.length as usize
    }

    // RFC 4271 - Section 6.3:
    // "If any recognized attribute has Attribute Flags that conflict with the
    // Attribute Type Code, then the Error Subcode MUST be set to Attribute
    // Flags Error. The Data field MUST contain the erroneous attribute (type,
    // length, and value)".
    fn check_flags(&self, attr_type: AttrType) -> DecodeResult<()> {
        if self.flags & (AttrFlags::OPTIONAL | AttrFlags::TRANSITIVE)
            != attr_type.flags()
        {
            return Err(UpdateMessageError::AttributeFlagsError(
                self.data.clone(),
            ));
        }

        Ok(())
    }

    // Checks that the attribute has exactly `len` bytes of value and that
    // all of them are available.
    fn check_fixed_len(&self, buf: &Bytes, len: u16) -> DecodeResult<()> {
        if self.length != len || buf.remaining() < self.length as usize {
            return Err(self.length_error());
        }

        Ok(())
    }

    fn length_error(&self) -> UpdateMessageError {
        UpdateMessageError::AttributeLengthError(self.data.clone())
    }
}

// ===== impl Attr =====

impl Attr {
    // Decodes a single path attribute, header included.
    //
    // Returns `None` for attributes that were well-formed but are not kept:
    // unrecognized optional non-transitive attributes and attributes that
    // must be ignored in the given context.
    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        sink: &mut dyn DiagnosticSink,
    ) -> DecodeResult<Option<Self>> {
        let hdr = AttrHdr::decode(buf)?;
        Attr::decode_value(&hdr, buf, cxt, sink)
    }

    fn decode_value(
        hdr: &AttrHdr,
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        sink: &mut dyn DiagnosticSink,
    ) -> DecodeResult<Option<Self>> {
        let Some(attr_type) = AttrType::from_u8(hdr.attr_type) else {
            return Attr::decode_unknown(hdr, buf, sink);
        };

        let result = match attr_type {
            AttrType::Origin => origin::decode(hdr, buf).map(Attr::Origin),
            AttrType::AsPath => {
                AsPath::decode(hdr, buf, sink).map(Attr::AsPath)
            }
            AttrType::Nexthop => nexthop::decode(hdr, buf).map(Attr::Nexthop),
            AttrType::Med => med::decode(hdr, buf).map(Attr::Med),
            AttrType::LocalPref => {
                local_pref::decode(hdr, buf).map(Attr::LocalPref)
            }
            AttrType::AtomicAggregate => atomic_aggregate::decode(hdr, buf)
                .map(|_| Attr::AtomicAggregate),
            AttrType::Aggregator => {
                Aggregator::decode(hdr, buf).map(Attr::Aggregator)
            }
            AttrType::Communities => {
                communities::decode(hdr, buf).map(Attr::Communities)
            }
        };

        match result {
            Ok(attr) => {
                // RFC 4271 - Section 5.1.5:
                // "A BGP speaker MUST NOT include this attribute in UPDATE
                // messages it sends to external peers [...]. If it is
                // contained in an UPDATE message that is received from an
                // external peer, then this attribute MUST be ignored by the
                // receiving speaker".
                if attr_type == AttrType::LocalPref
                    && cxt.peer_type == PeerType::External
                {
                    sink.record(Debug::AttrIgnored(attr_type));
                    return Ok(None);
                }

                Ok(Some(attr))
            }
            Err(error) => {
                // Log malformed attribute.
                sink.record(Debug::AttrError(hdr.attr_type, error.clone()));
                Err(error)
            }
        }
    }

    fn decode_unknown(
        hdr: &AttrHdr,
        buf: &mut Bytes,
        sink: &mut dyn DiagnosticSink,
    ) -> DecodeResult<Option<Self>> {
        // RFC 4271 - Section 6.3:
        // "If any of the well-known mandatory attributes are not recognized,
        // then the Error Subcode MUST be set to Unrecognized Well-known
        // Attribute. The Data field MUST contain the unrecognized attribute
        // (type, length, and value)".
        if !hdr.is_optional() {
            let error = UpdateMessageError::UnrecognizedWellKnownAttribute(
                hdr.data.clone(),
            );
            sink.record(Debug::AttrError(hdr.attr_type, error.clone()));
            return Err(error);
        }

        if hdr.length as usize > buf.remaining() {
            let error = hdr.length_error();
            sink.record(Debug::AttrError(hdr.attr_type, error.clone()));
            return Err(error);
        }
        let value = buf.try_get_bytes(hdr.length as usize)?;

        // RFC 4271 - Section 9:
        // "If an optional non-transitive attribute is unrecognized, it is
        // quietly ignored".
        if !hdr.is_transitive() {
            sink.record(Debug::AttrUnknownSkipped(hdr.attr_type, hdr.flags));
            return Ok(None);
        }

        // RFC 4271 - Section 9:
        // "If an optional transitive attribute is unrecognized, the Partial
        // bit in the attribute flags octet is set to 1, and the attribute is
        // retained for propagation to other BGP speakers".
        let mut flags = hdr.flags;
        flags.insert(AttrFlags::PARTIAL);
        sink.record(Debug::AttrUnknownRetained(hdr.attr_type, flags));
        Ok(Some(Attr::Unknown(UnknownAttr::new(
            hdr.attr_type,
            flags,
            hdr.length,
            value,
        ))))
    }

    // Returns the attribute type code.
    pub fn attr_type(&self) -> u8 {
        match self {
            Attr::Origin(..) => AttrType::Origin as u8,
            Attr::AsPath(..) => AttrType::AsPath as u8,
            Attr::Nexthop(..) => AttrType::Nexthop as u8,
            Attr::Med(..) => AttrType::Med as u8,
            Attr::LocalPref(..) => AttrType::LocalPref as u8,
            Attr::AtomicAggregate => AttrType::AtomicAggregate as u8,
            Attr::Aggregator(..) => AttrType::Aggregator as u8,
            Attr::Communities(..) => AttrType::Communities as u8,
            Attr::Unknown(attr) => attr.attr_type,
        }
    }
}

// ===== impl PathAttrs =====

impl PathAttrs {
    // Decodes all path attributes contained in the buffer.
    //
    // Decoding stops at the first error, in which case none of the
    // attributes decoded so far are returned.
    pub fn decode(
        buf: &mut Bytes,
        cxt: &DecodeCxt,
        sink: &mut dyn DiagnosticSink,
    ) -> DecodeResult<Self> {
        let mut attrs = Vec::new();

        // List of parsed attributes.
        let mut attr_list = HashSet::new();

        while buf.remaining() > 0 {
            let hdr = AttrHdr::decode(buf)?;

            // RFC 4271 - Section 6.3:
            // "If any attribute appears more than once in the UPDATE message,
            // then the Error Subcode MUST be set to Malformed Attribute List".
            if !attr_list.insert(hdr.attr_type) {
                let error =
                    UpdateMessageError::MalformedAttributeList(Bytes::new());
                sink.record(Debug::AttrError(hdr.attr_type, error.clone()));
                return Err(error);
            }

            if let Some(attr) = Attr::decode_value(&hdr, buf, cxt, sink)? {
                attrs.push(attr);
            }
        }

        Ok(PathAttrs(attrs))
    }

    // RFC 4271 - Section 6.3:
    // "If any of the well-known mandatory attributes are not present, then
    // the Error Subcode MUST be set to Missing Well-known Attribute. The Data
    // field MUST contain the Attribute Type Code of the missing, well-known
    // attribute".
    //
    // NEXT_HOP is only mandatory when the UPDATE message carries NLRI.
    pub fn check_mandatory(&self, nlri_present: bool) -> DecodeResult<()> {
        if !nlri_present {
            return Ok(());
        }

        for attr_type in [AttrType::Origin, AttrType::AsPath, AttrType::Nexthop]
        {
            if !self.contains(attr_type) {
                return Err(UpdateMessageError::MissingWellKnownAttribute(
                    Bytes::from(vec![attr_type as u8]),
                ));
            }
        }

        Ok(())
    }

    pub fn contains(&self, attr_type: AttrType) -> bool {
        self.0.iter().any(|attr| attr.attr_type() == attr_type as u8)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn origin(&self) -> Option<Origin> {
        self.0.iter().find_map(|attr| match attr {
            Attr::Origin(origin) => Some(*origin),
            _ => None,
        })
    }

    pub fn as_path(&self) -> Option<&AsPath> {
        self.0.iter().find_map(|attr| match attr {
            Attr::AsPath(as_path) => Some(as_path),
            _ => None,
        })
    }

    pub fn nexthop(&self) -> Option<Ipv4Addr> {
        self.0.iter().find_map(|attr| match attr {
            Attr::Nexthop(nexthop) => Some(*nexthop),
            _ => None,
        })
    }

    pub fn med(&self) -> Option<u32> {
        self.0.iter().find_map(|attr| match attr {
            Attr::Med(metric) => Some(*metric),
            _ => None,
        })
    }

    pub fn local_pref(&self) -> Option<u32> {
        self.0.iter().find_map(|attr| match attr {
            Attr::LocalPref(local_pref) => Some(*local_pref),
            _ => None,
        })
    }

    pub fn atomic_aggregate(&self) -> bool {
        self.contains(AttrType::AtomicAggregate)
    }

    pub fn aggregator(&self) -> Option<&Aggregator> {
        self.0.iter().find_map(|attr| match attr {
            Attr::Aggregator(aggregator) => Some(aggregator),
            _ => None,
        })
    }

    pub fn communities(&self) -> Option<&[u32]> {
        self.0.iter().find_map(|attr| match attr {
            Attr::Communities(comms) => Some(comms.as_slice()),
            _ => None,
        })
    }

    pub fn unknown(&self) -> impl Iterator<Item = &UnknownAttr> {
        self.0.iter().filter_map(|attr| match attr {
            Attr::Unknown(attr) => Some(attr),
            _ => None,
        })
    }
}

impl IntoIterator for PathAttrs {
    type Item = Attr;
    type IntoIter = std::vec::IntoIter<Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ===== ORIGIN attribute =====

mod origin {
    use super::*;
    const LEN: u16 = 1;

    pub(super) fn decode(
        hdr: &AttrHdr,
        buf: &mut Bytes,
    ) -> DecodeResult<Origin> {
        hdr.check_fixed_len(buf, LEN)?;
        hdr.check_flags(AttrType::Origin)?;

        // RFC 4271 - Section 6.3:
        // "If the ORIGIN attribute has an undefined value, then the Error
        // Sub-code MUST be set to Invalid Origin Attribute".
        let value = buf.try_get_u8()?;
        Origin::from_u8(value).ok_or_else(|| {
            UpdateMessageError::InvalidOriginAttribute(hdr.data.clone())
        })
    }
}

// ===== impl AsPath =====

impl AsPath {
    const SEGMENT_HDR_LEN: usize = 2;

    //
    // Each AS path segment is represented by a triple <path segment type,
    // path segment length, path segment value>, where the length is the
    // number of ASes (not octets) in the segment.
    //
    fn decode(
        hdr: &AttrHdr,
        buf: &mut Bytes,
        sink: &mut dyn DiagnosticSink,
    ) -> DecodeResult<Self> {
        if hdr.length as usize > buf.remaining() {
            return Err(hdr.length_error());
        }
        hdr.check_flags(AttrType::AsPath)?;

        let mut set = Vec::new();
        let mut sequence = Vec::new();
        let mut set_count = 0;
        let mut buf = buf.try_get_bytes(hdr.length as usize)?;
        while buf.remaining() > 0 {
            if buf.remaining() < Self::SEGMENT_HDR_LEN {
                return Err(hdr.length_error());
            }

            // Decode segment type and length.
            let seg_type = buf.try_get_u8()?;
            let seg_len = buf.try_get_u8()?;
            let members_len = seg_len as usize * ASN_LEN;
            if buf.remaining() < members_len {
                return Err(hdr.length_error());
            }
            let mut members = buf.try_get_bytes(members_len)?;

            // RFC 7606 - Section 7.2:
            // "An AS_PATH is considered malformed if it [...] has a
            // segment with a zero length".
            if seg_len == 0 {
                sink.record(Debug::AsPathSegmentEmpty(seg_type));
                continue;
            }

            // Unsupported segment types are skipped, not rejected.
            let list = match AsPathSegmentType::from_u8(seg_type) {
                Some(AsPathSegmentType::Set) => {
                    set_count += 1;
                    &mut set
                }
                Some(AsPathSegmentType::Sequence) => &mut sequence,
                _ => {
                    sink.record(Debug::AsPathSegmentSkipped(seg_type, seg_len));
                    continue;
                }
            };

            // Decode segment members.
            while members.remaining() > 0 {
                list.push(members.try_get_u16()?);
            }
        }

        Ok(AsPath {
            set,
            sequence,
            set_count,
        })
    }

    // Builds an AS_PATH whose AS_SET members, if any, form a single segment.
    pub fn new(set: Vec<u16>, sequence: Vec<u16>) -> Self {
        let set_count = u32::from(!set.is_empty());
        AsPath {
            set,
            sequence,
            set_count,
        }
    }

    // Members of all AS_SET segments.
    pub fn set(&self) -> &[u16] {
        &self.set
    }

    // Members of all AS_SEQUENCE segments.
    pub fn sequence(&self) -> &[u16] {
        &self.sequence
    }

    // Number of AS_SET segments.
    pub fn set_count(&self) -> u32 {
        self.set_count
    }

    // RFC 4271 - Section 9.1.2.2:
    // "When comparing routes using AS_PATH length [...] an AS_SET counts as
    // 1, no matter how many ASes are in the set".
    pub fn path_length(&self) -> u32 {
        self.sequence.len() as u32 + self.set_count
    }

    // Returns the leftmost AS of the AS_SEQUENCE, which for routes learned
    // from external peers is the neighbor AS.
    pub fn first(&self) -> Option<u16> {
        self.sequence.first().copied()
    }

    pub fn contains(&self, asn: u16) -> bool {
        self.iter().any(|member| member == asn)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.sequence.iter().chain(self.set.iter()).copied()
    }
}

// ===== NEXT_HOP attribute =====

mod nexthop {
    use super::*;
    const LEN: u16 = 4;

    pub(super) fn decode(
        hdr: &AttrHdr,
        buf: &mut Bytes,
    ) -> DecodeResult<Ipv4Addr> {
        hdr.check_fixed_len(buf, LEN)?;
        hdr.check_flags(AttrType::Nexthop)?;

        let value = buf.try_get_ipv4()?;
        Ok(value)
    }
}

// ===== MULTI_EXIT_DISC attribute =====

mod med {
    use super::*;
    const LEN: u16 = 4;

    pub(super) fn decode(hdr: &AttrHdr, buf: &mut Bytes) -> DecodeResult<u32> {
        hdr.check_fixed_len(buf, LEN)?;
        hdr.check_flags(AttrType::Med)?;

        let value = buf.try_get_u32()?;
        Ok(value)
    }
}

// ===== LOCAL_PREF attribute =====

mod local_pref {
    use super::*;
    const LEN: u16 = 4;

    pub(super) fn decode(hdr: &AttrHdr, buf: &mut Bytes) -> DecodeResult<u32> {
        hdr.check_fixed_len(buf, LEN)?;
        hdr.check_flags(AttrType::LocalPref)?;

        let value = buf.try_get_u32()?;
        Ok(value)
    }
}

// ===== ATOMIC_AGGREGATE attribute =====

mod atomic_aggregate {
    use super::*;
    const LEN: u16 = 0;

    pub(super) fn decode(hdr: &AttrHdr, buf: &mut Bytes) -> DecodeResult<()> {
        hdr.check_fixed_len(buf, LEN)?;
        hdr.check_flags(AttrType::AtomicAggregate)?;

        Ok(())
    }
}

// ===== impl Aggregator =====

impl Aggregator {
    const LEN: u16 = ASN_LEN as u16 + 4;

    fn decode(hdr: &AttrHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        hdr.check_fixed_len(buf, Self::LEN)?;
        hdr.check_flags(AttrType::Aggregator)?;

        let asn = buf.try_get_u16()?;
        let identifier = buf.try_get_ipv4()?;
        Ok(Aggregator { asn, identifier })
    }
}

// ===== COMMUNITIES attribute =====

mod communities {
    use super::*;
    const COMM_LEN: usize = 4;

    pub(super) fn decode(
        hdr: &AttrHdr,
        buf: &mut Bytes,
    ) -> DecodeResult<Vec<u32>> {
        let len = hdr.length as usize;
        if len == 0 || len % COMM_LEN != 0 || len > buf.remaining() {
            return Err(hdr.length_error());
        }
        hdr.check_flags(AttrType::Communities)?;

        let mut buf = buf.try_get_bytes(len)?;
        let mut list = Vec::with_capacity(len / COMM_LEN);
        while buf.remaining() > 0 {
            list.push(buf.try_get_u32()?);
        }

        Ok(list)
    }
}
