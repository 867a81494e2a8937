//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, Bytes, TryGetError};

// Extension methods for Bytes.
//
// `Bytes` already provides most of what a bounds-checked cursor needs:
// `try_get_u8`/`try_get_u16`/`try_get_u32` for big-endian integers,
// `remaining` for the number of readable bytes, and `clone` for a duplicate
// that shares the same storage but advances independently.
pub trait BytesExt {
    /// Splits off the next `len` bytes of `self` as a new `Bytes`.
    ///
    /// The current position is advanced by `len`. Nothing is consumed when
    /// fewer than `len` bytes remain.
    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes, TryGetError>;

    /// Gets an IPv4 addr from `self` in big-endian byte order.
    ///
    /// The current position is advanced by 4.
    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError>;

    /// Returns at most the first `len` bytes of `self` without advancing the
    /// current position.
    fn peek_bytes(&self, len: usize) -> Bytes;
}

// ===== impl Bytes =====

impl BytesExt for Bytes {
    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes, TryGetError> {
        if self.remaining() < len {
            return Err(TryGetError {
                requested: len,
                available: self.remaining(),
            });
        }

        Ok(self.split_to(len))
    }

    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError> {
        self.try_get_u32().map(Ipv4Addr::from)
    }

    fn peek_bytes(&self, len: usize) -> Bytes {
        self.slice(..len.min(self.len()))
    }
}

// ===== unit tests =====
