//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::Arbitrary;
use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// Size of a 2-octet AS number as carried in AS_PATH and AGGREGATOR.
pub const ASN_LEN: usize = 2;

// BGP Error (Notification) Codes.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-3
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum ErrorCode {
    MessageHeaderError = 1,
    OpenMessageError = 2,
    UpdateMessageError = 3,
    HoldTimerExpired = 4,
    FiniteStateMachineError = 5,
    Cease = 6,
}

// UPDATE Message Error subcodes.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-7
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum UpdateMessageErrorSubcode {
    Unspecific = 0,
    MalformedAttributeList = 1,
    UnrecognizedWellKnownAttribute = 2,
    MissingWellKnownAttribute = 3,
    AttributeFlagsError = 4,
    AttributeLengthError = 5,
    InvalidOriginAttribute = 6,
    InvalidNexthopAttribute = 8,
    OptionalAttributeError = 9,
    InvalidNetworkField = 10,
    MalformedAsPath = 11,
}

// BGP Path Attribute Flags.
//
// Only the four high-order bits are defined. The remaining bits are reserved
// and dropped on decode.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct AttrFlags: u8 {
        const OPTIONAL = 0x80;
        const TRANSITIVE = 0x40;
        const PARTIAL = 0x20;
        const EXTENDED = 0x10;
    }
}

// BGP Path Attribute Types.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-2
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum AttrType {
    Origin = 1,
    AsPath = 2,
    Nexthop = 3,
    Med = 4,
    LocalPref = 5,
    AtomicAggregate = 6,
    Aggregator = 7,
    // RFC 1997
    Communities = 8,
}

// BGP Origin.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
#[derive(Arbitrary)]
pub enum Origin {
    Igp = 0,
    Egp = 1,
    Incomplete = 2,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum AsPathSegmentType {
    Set = 1,
    Sequence = 2,
    // RFC 5065
    ConfedSequence = 3,
    ConfedSet = 4,
}

// ===== impl AttrType =====

impl AttrType {
    // Returns the Optional and Transitive bits every occurrence of this
    // attribute must carry.
    pub const fn flags(&self) -> AttrFlags {
        match self {
            // Well-known.
            AttrType::Origin
            | AttrType::AsPath
            | AttrType::Nexthop
            | AttrType::LocalPref
            | AttrType::AtomicAggregate => AttrFlags::TRANSITIVE,

            // Optional non-transitive.
            AttrType::Med => AttrFlags::OPTIONAL,

            // Optional transitive.
            AttrType::Aggregator | AttrType::Communities => {
                AttrFlags::TRANSITIVE.union(AttrFlags::OPTIONAL)
            }
        }
    }
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrType::Origin => write!(f, "ORIGIN"),
            AttrType::AsPath => write!(f, "AS_PATH"),
            AttrType::Nexthop => write!(f, "NEXT_HOP"),
            AttrType::Med => write!(f, "MULTI_EXIT_DISC"),
            AttrType::LocalPref => write!(f, "LOCAL_PREF"),
            AttrType::AtomicAggregate => write!(f, "ATOMIC_AGGREGATE"),
            AttrType::Aggregator => write!(f, "AGGREGATOR"),
            AttrType::Communities => write!(f, "COMMUNITIES"),
        }
    }
}
