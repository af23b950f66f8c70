use chrono::{DateTime, Utc};
use std::{fmt, ops, str};

/// Largest value the 48-bit `timestamp` field can hold.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// Largest value the 26-bit `counter` field can hold.
pub const MAX_COUNTER: u32 = (1 << 26) - 1;

/// Largest value the 48-bit `random_tail` field can hold.
pub const MAX_RANDOM_TAIL: u64 = (1 << 48) - 1;

/// Represents a 128-bit time-ordered unique identifier.
///
/// The identifier is stored as a 16-byte big-endian array, so the derived ordering and hashing
/// follow the unsigned 128-bit value: identifiers sort by timestamp, then by counter, then by the
/// random tail. See the [crate documentation](crate) for the field layout.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TimeOrderedId([u8; 16]);

impl TimeOrderedId {
    /// Nil identifier (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max identifier (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates an identifier from its field values, setting the version and variant bits.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields(timestamp: u64, counter: u32, random_tail: u64) -> Self {
        if timestamp > MAX_TIMESTAMP || counter > MAX_COUNTER || random_tail > MAX_RANDOM_TAIL {
            panic!("invalid field value");
        }

        Self([
            (timestamp >> 40) as u8,
            (timestamp >> 32) as u8,
            (timestamp >> 24) as u8,
            (timestamp >> 16) as u8,
            (timestamp >> 8) as u8,
            timestamp as u8,
            0x70 | (counter >> 22) as u8,
            (counter >> 14) as u8,
            0x80 | ((counter >> 8) & 0x3f) as u8,
            counter as u8,
            (random_tail >> 40) as u8,
            (random_tail >> 32) as u8,
            (random_tail >> 24) as u8,
            (random_tail >> 16) as u8,
            (random_tail >> 8) as u8,
            random_tail as u8,
        ])
    }

    /// Returns the 48-bit `timestamp` field (milliseconds since the Unix epoch).
    pub const fn timestamp(&self) -> u64 {
        let b = &self.0;
        (b[0] as u64) << 40
            | (b[1] as u64) << 32
            | (b[2] as u64) << 24
            | (b[3] as u64) << 16
            | (b[4] as u64) << 8
            | b[5] as u64
    }

    /// Returns the 26-bit `counter` field.
    pub const fn counter(&self) -> u32 {
        let b = &self.0;
        ((b[6] & 0x0f) as u32) << 22
            | (b[7] as u32) << 14
            | ((b[8] & 0x3f) as u32) << 8
            | b[9] as u32
    }

    /// Returns the 48-bit `random_tail` field.
    pub const fn random_tail(&self) -> u64 {
        let b = &self.0;
        (b[10] as u64) << 40
            | (b[11] as u64) << 32
            | (b[12] as u64) << 24
            | (b[13] as u64) << 16
            | (b[14] as u64) << 8
            | b[15] as u64
    }

    /// Returns the 4-bit version tag, which is `7` for identifiers built by this crate.
    pub const fn version(&self) -> u8 {
        self.0[6] >> 4
    }

    /// Returns the top two bits of byte 8, which are `0b10` for identifiers built by this crate.
    pub const fn variant(&self) -> u8 {
        self.0[8] >> 6
    }

    /// Returns the `timestamp` field as a UTC instant.
    pub fn datetime(&self) -> DateTime<Utc> {
        // 48-bit millisecond values are always within chrono's range
        DateTime::from_timestamp_millis(self.timestamp() as i64).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// structure that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sortid::TimeOrderedId;
    ///
    /// let x = "018bcfe5-6800-7000-8001-2c7a44f90e3d".parse::<TimeOrderedId>()?;
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "018bcfe5-6800-7000-8001-2c7a44f90e3d");
    /// assert_eq!(x.timestamp(), 1_700_000_000_000);
    /// assert_eq!(x.counter(), 1);
    /// # Ok::<(), sortid::ParseError>(())
    /// ```
    pub fn encode(&self) -> impl ops::Deref<Target = str> + fmt::Display {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
            if i == 3 || i == 5 || i == 7 || i == 9 {
                buffer[pos] = b'-';
                pos += 1;
            }
        }
        debug_assert!(buffer.is_ascii());
        IdStr(buffer)
    }
}

impl fmt::Display for TimeOrderedId {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for TimeOrderedId {
    type Err = ParseError;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const ERR: ParseError = ParseError {};
        let mut dst = [0u8; 16];
        let mut iter = src.chars();
        for (i, e) in dst.iter_mut().enumerate() {
            let hi = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            let lo = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            *e = (hi << 4) | lo;
            if (i == 3 || i == 5 || i == 7 || i == 9) && iter.next().ok_or(ERR)? != '-' {
                return Err(ERR);
            }
        }
        if iter.next().is_none() {
            Ok(Self(dst))
        } else {
            Err(ERR)
        }
    }
}

impl From<TimeOrderedId> for [u8; 16] {
    fn from(src: TimeOrderedId) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for TimeOrderedId {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for TimeOrderedId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<TimeOrderedId> for u128 {
    fn from(src: TimeOrderedId) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for TimeOrderedId {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<TimeOrderedId> for String {
    fn from(src: TimeOrderedId) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for TimeOrderedId {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

/// Concrete return type of [`TimeOrderedId::encode()`] containing the stack-allocated
/// 8-4-4-4-12 string representation.
struct IdStr([u8; 36]);

impl ops::Deref for IdStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        debug_assert!(self.0.is_ascii());
        unsafe { str::from_utf8_unchecked(&self.0) }
    }
}

impl fmt::Display for IdStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

/// Error parsing an invalid string representation of an identifier or version.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid string representation")
    }
}

impl std::error::Error for ParseError {}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::TimeOrderedId;

    impl From<TimeOrderedId> for uuid::Uuid {
        fn from(src: TimeOrderedId) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for TimeOrderedId {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, TimeOrderedId};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for TimeOrderedId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for TimeOrderedId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = TimeOrderedId;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a time-ordered identifier representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 16]>::try_from(value)
                .map(Self::Value::from)
                .map_err(de::Error::custom)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::TimeOrderedId;
        use serde_test::{assert_tokens, Configure, Token};

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("00000000-0000-0000-0000-000000000000", &[0u8; 16]),
                (
                    "018bcfe5-6800-7000-8000-9d3c01b4a7e2",
                    &[
                        1, 139, 207, 229, 104, 0, 112, 0, 128, 0, 157, 60, 1, 180, 167, 226,
                    ],
                ),
                (
                    "018bcfe5-6800-7000-8001-2c7a44f90e3d",
                    &[
                        1, 139, 207, 229, 104, 0, 112, 0, 128, 1, 44, 122, 68, 249, 14, 61,
                    ],
                ),
                (
                    "018bcfe5-6801-7fff-bfff-000000000000",
                    &[
                        1, 139, 207, 229, 104, 1, 127, 255, 191, 255, 0, 0, 0, 0, 0, 0,
                    ],
                ),
            ];

            for (text, bytes) in cases {
                let e = text.parse::<TimeOrderedId>().unwrap();
                assert_tokens(&e.readable(), &[Token::String(text)]);
                assert_tokens(&e.compact(), &[Token::Bytes(bytes)]);
            }
        }
    }
}
