//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::LazyLock as Lazy;

use bgpio::debug::{Debug, TracingSink};
use bgpio::packet::attribute::{AsPath, Attr, AttrHdr, PathAttrs, UnknownAttr};
use bgpio::packet::consts::{AttrFlags, AttrType, Origin};
use bgpio::packet::error::{DecodeResult, UpdateMessageError};
use bgpio::packet::message::{DecodeCxt, decode_path_attrs};
use bgpio_utils::test::init_tracing;
use bytes::{Buf, Bytes};

use super::{test_decode_attr, test_decode_attr_error};

// ORIGIN, MULTI_EXIT_DISC and AS_PATH.
static ATTRS1: Lazy<(Vec<u8>, Vec<Attr>)> = Lazy::new(|| {
    (
        vec![
            0x40, 0x01, 0x01, 0x00, 0x80, 0x04, 0x04, 0x00, 0x00, 0x01, 0x2c,
            0x40, 0x02, 0x04, 0x02, 0x01, 0xfd, 0xe9,
        ],
        vec![
            Attr::Origin(Origin::Igp),
            Attr::Med(300),
            Attr::AsPath(AsPath::new(vec![], vec![65001])),
        ],
    )
});

// ORIGIN, AS_PATH and NEXT_HOP.
static ATTRS2: Lazy<Vec<u8>> = Lazy::new(|| {
    vec![
        0x40, 0x01, 0x01, 0x02, 0x40, 0x02, 0x04, 0x02, 0x01, 0xfd, 0xe9,
        0x40, 0x03, 0x04, 0x0a, 0x00, 0x00, 0x01,
    ]
});

fn decode_attrs(bytes: &[u8]) -> (DecodeResult<PathAttrs>, Vec<Debug>) {
    let mut buf = Bytes::copy_from_slice(bytes);
    let mut sink = Vec::new();
    let result = PathAttrs::decode(&mut buf, &DecodeCxt::default(), &mut sink);
    (result, sink)
}

#[test]
fn test_decode_attr_hdr() {
    let mut buf = Bytes::from_static(&[0x50, 0x02, 0x01, 0x00, 0xff]);
    let hdr = AttrHdr::decode(&mut buf).unwrap();
    assert_eq!(hdr.flags, AttrFlags::TRANSITIVE | AttrFlags::EXTENDED);
    assert_eq!(hdr.attr_type, AttrType::AsPath as u8);
    assert_eq!(hdr.length, 256);
    assert_eq!(hdr.hdr_len(), 4);
    assert_eq!(hdr.total_len(), 260);
    // The value is truncated, the header itself is not.
    assert_eq!(hdr.data.len(), 5);
    assert_eq!(buf.remaining(), 1);
}

#[test]
fn test_decode_attrs1() {
    let (ref bytes, ref attrs) = *ATTRS1;
    let (result, sink) = decode_attrs(bytes);
    let result = result.unwrap();
    assert_eq!(result.iter().cloned().collect::<Vec<_>>(), *attrs);
    assert_eq!(result.origin(), Some(Origin::Igp));
    assert_eq!(result.med(), Some(300));
    assert_eq!(
        result.as_path().and_then(|as_path| as_path.first()),
        Some(65001)
    );
    assert_eq!(result.nexthop(), None);
    assert!(sink.is_empty());
}

#[test]
fn test_decode_attrs_empty() {
    let (result, sink) = decode_attrs(&[]);
    let result = result.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.origin(), None);
    assert_eq!(result.as_path(), None);
    assert!(sink.is_empty());
}

#[test]
fn test_decode_attrs_error_second() {
    // The MULTI_EXIT_DISC attribute is one byte short.
    let bytes = [0x40, 0x01, 0x01, 0x00, 0x80, 0x04, 0x03, 0x00, 0x00, 0x01];
    let error = UpdateMessageError::AttributeLengthError(
        Bytes::copy_from_slice(&bytes[4..]),
    );
    let (result, sink) = decode_attrs(&bytes);
    assert_eq!(result, Err(error.clone()));
    assert_eq!(sink, vec![Debug::AttrError(AttrType::Med as u8, error)]);
}

#[test]
fn test_decode_attrs_duplicate() {
    let bytes = [0x40, 0x01, 0x01, 0x00, 0x40, 0x01, 0x01, 0x01];
    let error = UpdateMessageError::MalformedAttributeList(Bytes::new());
    let (result, sink) = decode_attrs(&bytes);
    assert_eq!(result, Err(error.clone()));
    assert_eq!(sink, vec![Debug::AttrError(AttrType::Origin as u8, error)]);
}

#[test]
fn test_decode_attrs_truncated_header() {
    let (result, _) = decode_attrs(&[0x40, 0x01, 0x01, 0x00, 0x40]);
    assert_eq!(result, Err(UpdateMessageError::ReadOutOfBounds));

    // Trailing header without its length field. No attribute can be
    // reported, so the error carries no data.
    let (result, _) = decode_attrs(&[0x40, 0x01, 0x01, 0x00, 0x40, 0x02]);
    let error = result.unwrap_err();
    assert_eq!(error, UpdateMessageError::ReadOutOfBounds);
    assert!(error.data().is_empty());
}

#[test]
fn test_decode_unknown_optional_transitive() {
    let bytes = [0xc0, 0x63, 0x02, 0xab, 0xcd];
    let flags = AttrFlags::from_bits_truncate(0xe0);
    let attr = Some(Attr::Unknown(UnknownAttr::new(
        0x63,
        flags,
        2,
        Bytes::from_static(&[0xab, 0xcd]),
    )));
    let sink = test_decode_attr(&bytes, &attr);
    assert_eq!(sink, vec![Debug::AttrUnknownRetained(0x63, flags)]);
}

#[test]
fn test_decode_unknown_optional_non_transitive() {
    let bytes = [0x80, 0x63, 0x01, 0xff];
    let sink = test_decode_attr(&bytes, &None);
    assert_eq!(
        sink,
        vec![Debug::AttrUnknownSkipped(0x63, AttrFlags::OPTIONAL)]
    );
}

#[test]
fn test_decode_unknown_truncated() {
    let bytes = [0xc0, 0x63, 0x04, 0xab];
    let error = UpdateMessageError::AttributeLengthError(
        Bytes::copy_from_slice(&bytes),
    );
    test_decode_attr_error(&bytes, &error);
}

#[test]
fn test_decode_unknown_well_known() {
    let bytes = [0x40, 0x63, 0x00];
    let error = UpdateMessageError::UnrecognizedWellKnownAttribute(
        Bytes::copy_from_slice(&bytes),
    );
    test_decode_attr_error(&bytes, &error);
}

#[test]
fn test_decode_attrs_unknown_kept_in_order() {
    let bytes = [
        0x40, 0x01, 0x01, 0x01, 0x80, 0x62, 0x00, 0xc0, 0x63, 0x01, 0x07,
    ];
    let (result, _) = decode_attrs(&bytes);
    let result = result.unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.origin(), Some(Origin::Egp));
    let unknown = result.unknown().collect::<Vec<_>>();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].attr_type, 0x63);
    assert_eq!(unknown[0].value, Bytes::from_static(&[0x07]));
}

#[test]
fn test_decode_path_attrs_with_nlri() {
    let mut bytes = ATTRS2.clone();
    let attr_len = bytes.len() as u16;
    // NLRI: 10.0.0.0/8
    bytes.extend_from_slice(&[0x08, 0x0a]);

    let mut buf = Bytes::from(bytes);
    let attrs = decode_path_attrs(
        &mut buf,
        attr_len,
        &DecodeCxt::default(),
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(attrs.len(), 3);
    assert_eq!(attrs.origin(), Some(Origin::Incomplete));
    assert_eq!(attrs.nexthop(), Some(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(buf, Bytes::from_static(&[0x08, 0x0a]));
    assert_eq!(attrs.check_mandatory(true), Ok(()));
}

#[test]
fn test_decode_path_attrs_too_large() {
    let mut buf = Bytes::from(ATTRS2.clone());
    let attr_len = buf.len() as u16 + 1;
    let mut sink = Vec::new();
    let error = UpdateMessageError::MalformedAttributeList(Bytes::new());
    let result =
        decode_path_attrs(&mut buf, attr_len, &DecodeCxt::default(), &mut sink);
    assert_eq!(result, Err(error.clone()));
    assert_eq!(sink, vec![Debug::AttrListError(attr_len, error)]);
}

#[test]
fn test_decode_path_attrs_split_attribute() {
    // The attribute section ends in the middle of the ORIGIN value.
    let mut buf = Bytes::from_static(&[0x40, 0x01, 0x01, 0x00]);
    let error = UpdateMessageError::AttributeLengthError(Bytes::from_static(
        &[0x40, 0x01, 0x01],
    ));
    let result =
        decode_path_attrs(&mut buf, 3, &DecodeCxt::default(), &mut Vec::new());
    assert_eq!(result, Err(error));
}

#[test]
fn test_check_mandatory() {
    let (result, _) = decode_attrs(&ATTRS2);
    let attrs = result.unwrap();
    assert_eq!(attrs.check_mandatory(true), Ok(()));

    // NEXT_HOP missing.
    let (result, _) = decode_attrs(&ATTRS2[..11]);
    let attrs = result.unwrap();
    assert_eq!(
        attrs.check_mandatory(true),
        Err(UpdateMessageError::MissingWellKnownAttribute(
            Bytes::from_static(&[0x03])
        ))
    );
    // Without NLRI nothing is mandatory.
    assert_eq!(attrs.check_mandatory(false), Ok(()));

    let attrs = PathAttrs::default();
    assert_eq!(
        attrs.check_mandatory(true),
        Err(UpdateMessageError::MissingWellKnownAttribute(
            Bytes::from_static(&[0x01])
        ))
    );
}

#[test]
fn test_decode_attrs_tracing() {
    init_tracing();

    let (ref bytes, ref attrs) = *ATTRS1;
    let mut buf = Bytes::copy_from_slice(bytes);
    let result =
        PathAttrs::decode(&mut buf, &DecodeCxt::default(), &mut TracingSink);
    assert_eq!(result.map(|result| result.len()), Ok(attrs.len()));

    let mut buf = Bytes::from_static(&[0x40, 0x01, 0x01, 0x05]);
    let result =
        PathAttrs::decode(&mut buf, &DecodeCxt::default(), &mut TracingSink);
    assert!(matches!(
        result,
        Err(UpdateMessageError::InvalidOriginAttribute(..))
    ));
}
