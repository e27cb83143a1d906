// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! 128-bit globally unique identifiers.
//!
//! [`Guid`] is the shared representation underneath [`ClassId`] (which object
//! kind to build) and [`InterfaceId`] (which view of the object to hand out).
//! Both are opaque lookup keys: equality is exact bitwise comparison and the
//! fields are never interpreted.
//!
//! # Display Format
//! Registry form, upper-case hex with braces:
//! `{BF94C121-5B05-4E6F-8000-BA598961414D}`

use std::fmt;
use std::str::FromStr;

/// 128-bit identifier with the classic `{data1-data2-data3-data4}` layout.
///
/// `#[repr(C)]` so it can be passed by pointer across the C ABI unchanged.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Build a GUID from its big-endian 128-bit value.
    ///
    /// # Examples
    /// ```
    /// use w4all::Guid;
    ///
    /// let guid = Guid::from_u128(0xbf94c121_5b05_4e6f_8000_ba598961414d);
    /// assert_eq!(guid.data1, 0xbf94c121);
    /// assert_eq!(guid.data4[0], 0x80);
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u128(value: u128) -> Self {
        Self {
            data1: (value >> 96) as u32,
            data2: (value >> 80) as u16,
            data3: (value >> 64) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    /// Big-endian 128-bit value of this GUID.
    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | (u64::from_be_bytes(self.data4) as u128)
    }

    /// All-zero GUID (`GUID_NULL`).
    pub const fn zero() -> Self {
        Self::from_u128(0)
    }

    /// Check if GUID is all zeros
    pub const fn is_zero(&self) -> bool {
        self.to_u128() == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1]
        )?;
        for byte in &self.data4[2..] {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

/// Error returned when a string is not a GUID in registry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGuidError {
    input: String,
}

impl fmt::Display for ParseGuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid GUID '{}' (expected XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX)",
            self.input
        )
    }
}

impl std::error::Error for ParseGuidError {}

impl FromStr for Guid {
    type Err = ParseGuidError;

    /// Parse `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`; braces optional, hex
    /// digits case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGuidError {
            input: s.to_string(),
        };

        let body = match (s.strip_prefix('{'), s.strip_suffix('}')) {
            (Some(_), Some(_)) if s.len() >= 2 => &s[1..s.len() - 1],
            (None, None) => s,
            _ => return Err(err()),
        };

        if body.len() != 36 {
            return Err(err());
        }

        let mut hex = String::with_capacity(32);
        for (i, c) in body.chars().enumerate() {
            match i {
                8 | 13 | 18 | 23 => {
                    if c != '-' {
                        return Err(err());
                    }
                }
                _ if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(err()),
            }
        }

        u128::from_str_radix(&hex, 16)
            .map(Self::from_u128)
            .map_err(|_| err())
    }
}

macro_rules! guid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        pub struct $name(pub Guid);

        impl $name {
            /// Build from the big-endian 128-bit value.
            pub const fn from_u128(value: u128) -> Self {
                Self(Guid::from_u128(value))
            }

            /// Underlying GUID.
            pub const fn guid(&self) -> Guid {
                self.0
            }
        }

        impl From<Guid> for $name {
            fn from(guid: Guid) -> Self {
                Self(guid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseGuidError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

guid_newtype!(
    /// Type identifier (CLSID): selects which object kind the factory builds.
    ClassId
);

guid_newtype!(
    /// Capability identifier (IID): selects which view of an object is returned.
    InterfaceId
);
