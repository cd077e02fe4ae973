use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::{
    convert::{TryFrom, TryInto},
    fmt,
    ops::BitXor,
    str::FromStr,
};
use thiserror::Error;

/// Length of an identifier in bytes.
pub const ID_LEN: usize = 20;

/// Number of bits in an identifier, and so the number of bit distances a chain can hold.
pub const ID_BITS: usize = ID_LEN * 8;

/// Largest bit distance between two identifiers.
pub const MAX_BIT_DISTANCE: u8 = (ID_BITS - 1) as u8;

const ADDRESS_DIGITS: usize = ID_LEN * 2;

#[allow(dead_code, clippy::assign_op_pattern)]
mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 192-bit unsigned integer, wide enough for any 160-bit XOR distance.
        pub(crate) struct U192(3);
    }
}

use wide::U192;

/// 160-bit peer identifier stored least-significant byte first.
///
/// Byte 0 holds the last hex pair of the textual address, so the canonical form is the address
/// bytes reversed. Text is parsed from and rendered to checksum-cased Ethereum addresses.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Identifier(#[serde(with = "byte_array")] [u8; ID_LEN]);

impl Identifier {
    /// Wrap bytes already in canonical (least-significant first) order.
    pub const fn from_canonical(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from address bytes in the order they are written in text.
    pub fn from_address_bytes(mut bytes: [u8; ID_LEN]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    /// Parse an address with or without the `0x` prefix.
    ///
    /// All-lowercase and all-uppercase digits are accepted as they are. Mixed case is taken as
    /// a checksummed address and rejected unless the casing matches.
    pub fn parse(text: &str) -> Result<Self, InvalidIdentifier> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);

        if digits.len() != ADDRESS_DIGITS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidIdentifier::Format(text.to_owned()));
        }

        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| InvalidIdentifier::Format(text.to_owned()))?;

        let lowercase = !digits.bytes().any(|b| b.is_ascii_uppercase());
        let uppercase = !digits.bytes().any(|b| b.is_ascii_lowercase());
        if !lowercase && !uppercase && checksum_digits(&bytes) != digits {
            return Err(InvalidIdentifier::Checksum(text.to_owned()));
        }

        Ok(Self::from_address_bytes(bytes))
    }

    /// Canonical bytes, least-significant first.
    pub fn to_canonical(self) -> [u8; ID_LEN] {
        self.0
    }

    /// Address bytes in the order they are written in text.
    pub fn to_address_bytes(self) -> [u8; ID_LEN] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    /// `0x` prefixed, checksum-cased address text.
    pub fn to_checksum(self) -> String {
        format!("0x{}", checksum_digits(&self.to_address_bytes()))
    }

    /// XOR distance to `other` as a full-width integer.
    pub fn xor_distance(self, other: Identifier) -> Distance {
        Distance::from(self ^ other)
    }

    /// Position of the highest bit at which the two identifiers differ.
    ///
    /// Identical identifiers yield 0, the same as identifiers differing only in the lowest bit.
    pub fn bit_distance(self, other: Identifier) -> u8 {
        self.xor_distance(other).bit_distance()
    }
}

/// EIP-55 casing of the 40 hex digits of `address`: a letter is uppercased when the matching
/// nibble of the Keccak-256 hash of the lowercase digits is 8 or more.
fn checksum_digits(address: &[u8; ID_LEN]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    lower
        .char_indices()
        .map(|(index, digit)| {
            let byte = hash[index / 2];
            let nibble = if index % 2 == 0 { byte >> 4 } else { byte & 0x0f };

            if nibble >= 8 {
                digit.to_ascii_uppercase()
            } else {
                digit
            }
        })
        .collect()
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Identifier> for [u8; ID_LEN] {
    fn from(id: Identifier) -> [u8; ID_LEN] {
        id.0
    }
}

impl From<[u8; ID_LEN]> for Identifier {
    fn from(bytes: [u8; ID_LEN]) -> Identifier {
        Self(bytes)
    }
}

/// Malformed identifier input at the codec boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidIdentifier {
    #[error("identifier must be 20 bytes, got {0}")]
    Length(usize),
    #[error("invalid address {0:?}")]
    Format(String),
    #[error("address {0:?} does not match its checksum casing")]
    Checksum(String),
}

impl<'a> TryFrom<&'a [u8]> for Identifier {
    type Error = InvalidIdentifier;

    fn try_from(slice: &'a [u8]) -> Result<Self, Self::Error> {
        Ok(Self(
            slice
                .try_into()
                .map_err(|_| InvalidIdentifier::Length(slice.len()))?,
        ))
    }
}

impl FromStr for Identifier {
    type Err = InvalidIdentifier;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl BitXor for Identifier {
    type Output = Self;

    fn bitxor(mut self, rhs: Self) -> Self {
        for (src, dst) in rhs.0.iter().zip(self.0.iter_mut()) {
            *dst ^= *src;
        }

        self
    }
}

impl Distribution<Identifier> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Identifier {
        Identifier(rng.gen())
    }
}

/// Canonical bytes in storage order.
impl fmt::LowerHex for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }

        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

mod byte_array {
    use super::ID_LEN;
    use serde::{
        de::{Deserialize, Deserializer, Error},
        ser::{Serialize, Serializer},
    };
    use serde_bytes::{ByteBuf, Bytes};
    use std::convert::TryInto;

    pub(super) fn serialize<S: Serializer>(bytes: &[u8; ID_LEN], s: S) -> Result<S::Ok, S::Error> {
        Bytes::new(bytes.as_ref()).serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; ID_LEN], D::Error> {
        let buf = ByteBuf::deserialize(d)?;
        let buf = buf.into_vec();
        let len = buf.len();

        buf.try_into().map_err(|_| {
            let expected = format!("{}", ID_LEN);
            D::Error::invalid_length(len, &expected.as_ref())
        })
    }
}

// ----------------------------------------------------------------------------//

/// XOR distance between two identifiers, `sum(xor[i] * 256^i)` over the canonical bytes.
///
/// Kept as an exact 160-bit quantity: far apart pairs exceed the 53 bits a float could order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Distance(U192);

impl Distance {
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Number of significant bits.
    pub fn bits(&self) -> usize {
        self.0.bits()
    }

    /// Index of the highest set bit, `floor(log2(distance))`, or 0 for a zero distance.
    pub fn bit_distance(&self) -> u8 {
        self.bits().saturating_sub(1) as u8
    }
}

impl From<Identifier> for Distance {
    fn from(xor: Identifier) -> Distance {
        Distance(U192::from_little_endian(&xor.0))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Distance({:#x})", self.0)
    }
}

// ----------------------------------------------------------------------------//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test;

    const CHECKSUMMED: &str = "0x9Da2FbFf722be805ce3618CFDeF731d50aDBcB27";

    #[test]
    fn positive_parse_any_casing_and_prefix() {
        let expected = Identifier::parse(CHECKSUMMED).unwrap();

        for text in [
            CHECKSUMMED.to_owned(),
            CHECKSUMMED[2..].to_owned(),
            CHECKSUMMED.to_lowercase(),
            CHECKSUMMED[2..].to_lowercase(),
            CHECKSUMMED[2..].to_uppercase(),
        ] {
            assert_eq!(Identifier::parse(&text).unwrap(), expected);
            assert_eq!(Identifier::parse(&text).unwrap().to_string(), CHECKSUMMED);
        }
    }

    #[test]
    fn positive_eip55_vectors() {
        for address in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let id: Identifier = address.to_lowercase().parse().unwrap();
            assert_eq!(id.to_checksum(), address);
        }
    }

    #[test]
    fn positive_canonical_byte_order() {
        let id = test::id("0x0000000000000000000000000000000000000001");
        assert_eq!(id.to_canonical()[0], 1);

        let id = test::id("0x0100000000000000000000000000000000000000");
        assert_eq!(id.to_canonical()[ID_LEN - 1], 1);
        assert_eq!(id.to_address_bytes()[0], 1);
    }

    #[test]
    fn positive_address_bytes_match_text() {
        let bytes = hex::decode(&CHECKSUMMED[2..]).unwrap();
        let bytes: [u8; ID_LEN] = bytes.try_into().unwrap();

        assert_eq!(Identifier::from_address_bytes(bytes), test::id(CHECKSUMMED));
    }

    #[test]
    fn negative_wrong_digit_count() {
        let text = format!("{}ff", CHECKSUMMED);
        assert_eq!(
            Identifier::parse(&text),
            Err(InvalidIdentifier::Format(text.clone()))
        );
        assert!(Identifier::parse(&CHECKSUMMED[..40]).is_err());
        assert!(Identifier::parse("").is_err());
    }

    #[test]
    fn negative_non_hex_digits() {
        assert!(Identifier::parse("0xzz00000000000000000000000000000000000000").is_err());
    }

    #[test]
    fn negative_bad_checksum() {
        // 'D' is the correct casing for the first letter.
        let text = "0x9da2FbFf722be805ce3618CFDeF731d50aDBcB27";
        assert_eq!(
            Identifier::parse(text),
            Err(InvalidIdentifier::Checksum(text.to_owned()))
        );
    }

    #[test]
    fn negative_slice_length() {
        let canonical = test::id(CHECKSUMMED).to_canonical();

        assert_eq!(
            Identifier::try_from(&canonical[2..]),
            Err(InvalidIdentifier::Length(ID_LEN - 2))
        );
        assert_eq!(
            Identifier::try_from(&canonical[..]).unwrap(),
            test::id(CHECKSUMMED)
        );
    }

    #[test]
    fn positive_bit_distance() {
        let zero = test::id("0x0000000000000000000000000000000000000000");

        assert_eq!(zero.bit_distance(zero), 0);
        assert_eq!(
            zero.bit_distance(test::id("0x0000000000000000000000000000000000000001")),
            0
        );
        assert_eq!(
            zero.bit_distance(test::id("0x0000000000000000000000000000000000000002")),
            1
        );
        assert_eq!(
            zero.bit_distance(test::id("0x0000000000000000000000000000000000000005")),
            2
        );
        assert_eq!(
            zero.bit_distance(test::id("0x0000000000000000000000000000000000000100")),
            8
        );
        assert_eq!(
            zero.bit_distance(test::id("0x0100000000000000000000000000000000000000")),
            152
        );
        assert_eq!(
            zero.bit_distance(test::id("0xffffffffffffffffffffffffffffffffffffffff")),
            MAX_BIT_DISTANCE
        );
    }

    #[test]
    fn positive_distance_identity_and_symmetry() {
        let a = test::id(CHECKSUMMED);
        let b = test::id("0x1010101010101010101010101010101010101010");

        assert!(a.xor_distance(a).is_zero());
        assert_eq!(a.xor_distance(b), b.xor_distance(a));
        assert!(!a.xor_distance(b).is_zero());
    }

    #[test]
    fn positive_distance_orders_beyond_float_precision() {
        let zero = test::id("0x0000000000000000000000000000000000000000");
        let high = test::id("0x8000000000000000000000000000000000000000");
        let high_plus_one = test::id("0x8000000000000000000000000000000000000001");

        assert!(zero.xor_distance(high) < zero.xor_distance(high_plus_one));
        assert_eq!(zero.xor_distance(high).bits(), ID_BITS);
    }

    #[test]
    fn positive_serde_canonical_bytes() {
        let id = test::id(CHECKSUMMED);

        let encoded = serde_bencode::to_bytes(&id).unwrap();
        assert_eq!(&encoded[..3], b"20:");
        assert_eq!(&encoded[3..], &id.to_canonical()[..]);

        let decoded: Identifier = serde_bencode::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, id);
    }
}
