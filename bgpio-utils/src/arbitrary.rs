//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use arbitrary::{Arbitrary, Result as ArbitraryResult, Unstructured};
use bytes::Bytes;

// Used when implementing external traits on Bytes e.g Arbitrary.
#[derive(Debug)]
pub struct BytesArbitrary(pub Bytes);

// ====== impl BytesArbitrary =====

impl Arbitrary<'_> for BytesArbitrary {
    fn arbitrary(u: &mut Unstructured<'_>) -> ArbitraryResult<Self> {
        let len = u.arbitrary_len::<u8>()?;
        let bytes = u.bytes(len)?;
        Ok(Self(Bytes::copy_from_slice(bytes)))
    }

    fn arbitrary_take_rest(u: Unstructured<'_>) -> ArbitraryResult<Self> {
        let bytes = u.take_rest();
        Ok(Self(Bytes::copy_from_slice(bytes)))
    }
}
