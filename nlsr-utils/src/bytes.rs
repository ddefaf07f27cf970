//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cell::RefCell;

use bytes::{Buf, BufMut, Bytes, BytesMut, TryGetError};

thread_local!(
    pub static TLS_BUF: RefCell<BytesMut> =
        RefCell::new(BytesMut::with_capacity(65536))
);

// Extension methods for Bytes.
pub trait BytesExt {
    /// Gets an NDN variable-length number from `self` in the big-endian byte
    /// order.
    ///
    /// The current position is advanced by 1, 3, 5 or 9, depending on the
    /// first octet.
    ///
    /// # Panics
    ///
    /// This function panics if there is no more remaining data in `self`.
    fn get_varnum(&mut self) -> u64;

    /// Gets an NDN variable-length number from `self` in the big-endian byte
    /// order.
    ///
    /// The current position is advanced by 1, 3, 5 or 9, depending on the
    /// first octet.
    ///
    /// Returns `Err(TryGetError)` when there are not enough remaining bytes to
    /// read the value.
    fn try_get_varnum(&mut self) -> Result<u64, TryGetError>;
}

// Extension methods for BytesMut.
pub trait BytesMutExt {
    /// Writes an NDN variable-length number to `self` in big-endian byte
    /// order.
    ///
    /// The current position is advanced by 1, 3, 5 or 9, depending on the
    /// value.
    ///
    /// # Panics
    ///
    /// This function panics if there is not enough remaining capacity in
    /// `self`.
    fn put_varnum(&mut self, n: u64);
}

/// Returns the number of octets `put_varnum` uses to encode `n`.
pub const fn varnum_len(n: u64) -> usize {
    if n < 253 {
        1
    } else if n <= u16::MAX as u64 {
        3
    } else if n <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

// ===== impl Bytes =====

impl BytesExt for Bytes {
    fn get_varnum(&mut self) -> u64 {
        self.try_get_varnum().unwrap()
    }

    fn try_get_varnum(&mut self) -> Result<u64, TryGetError> {
        let first = self.try_get_u8()?;
        match first {
            253 => Ok(self.try_get_u16()?.into()),
            254 => Ok(self.try_get_u32()?.into()),
            255 => self.try_get_u64(),
            _ => Ok(first.into()),
        }
    }
}

// ===== impl BytesMut =====

impl BytesMutExt for BytesMut {
    fn put_varnum(&mut self, n: u64) {
        if n < 253 {
            self.put_u8(n as u8);
        } else if n <= u16::MAX as u64 {
            self.put_u8(253);
            self.put_u16(n as u16);
        } else if n <= u32::MAX as u64 {
            self.put_u8(254);
            self.put_u32(n as u32);
        } else {
            self.put_u8(255);
            self.put_u64(n);
        }
    }
}
