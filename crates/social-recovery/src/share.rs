//! recovery share type and its text encoding
//!
//! a share is packed into bytes, checksummed, and written in crockford base32
//! so it can be copied by hand from paper:
//!
//! ```text
//! version | set id (4) | index | total | needed | flags | [not before, u64 be]
//!         | value len | value | zero padding | checksum (5)
//! ```
//!
//! padding brings the byte length to a multiple of 5, so every symbol carries
//! five real bits and any single changed symbol trips the checksum. the text is
//! grouped in blocks of five separated by `-`.

use std::fmt;
use std::str::FromStr;

use crate::crypto::{ct_eq, mac, SHARE_CHECKSUM_DOMAIN};
use crate::split::SplitParams;
use crate::timelock::TimeLock;
use crate::{Error, Result};

/// current share format version
pub const SHARE_VERSION: u8 = 1;

/// identifies the split a share came from
pub type SetId = [u8; 4];

const CHECKSUM_LEN: usize = 5;
const FLAG_TIME_LOCKED: u8 = 0x01;
const HEADER_LEN: usize = 1 + 4 + 1 + 1 + 1 + 1;
/// header + value length + one value byte + checksum
const MIN_ENCODED_LEN: usize = HEADER_LEN + 1 + 1 + CHECKSUM_LEN;

/// crockford base32, no I L O U
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const GROUP_LEN: usize = 5;
const GROUP_SEPARATOR: char = '-';

/// one point of the split polynomial plus the metadata needed to use it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    /// random tag shared by every share of one split
    pub set_id: SetId,
    /// x coordinate, 1..=total_shares
    pub index: u8,
    pub params: SplitParams,
    /// set on the emergency share only
    pub time_lock: Option<TimeLock>,
    /// one evaluation per payload byte
    pub value: Vec<u8>,
}

impl Share {
    pub fn is_time_delayed(&self) -> bool {
        self.time_lock.is_some()
    }

    /// pack into the checksummed binary form
    ///
    /// fails when the value does not fit the one-byte length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let value_len = u8::try_from(self.value.len())
            .map_err(|_| Error::MalformedShare("share value longer than 255 bytes"))?;

        let mut bytes = Vec::with_capacity(MIN_ENCODED_LEN + 8 + self.value.len() + GROUP_LEN);
        bytes.push(SHARE_VERSION);
        bytes.extend_from_slice(&self.set_id);
        bytes.push(self.index);
        bytes.push(self.params.total_shares);
        bytes.push(self.params.needed_shares);
        match self.time_lock {
            Some(lock) => {
                bytes.push(FLAG_TIME_LOCKED);
                bytes.extend_from_slice(&lock.not_before.to_be_bytes());
            }
            None => bytes.push(0),
        }
        bytes.push(value_len);
        bytes.extend_from_slice(&self.value);

        while (bytes.len() + CHECKSUM_LEN) % GROUP_LEN != 0 {
            bytes.push(0);
        }
        let checksum = mac(SHARE_CHECKSUM_DOMAIN, &[bytes.as_slice()]);
        bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        Ok(bytes)
    }

    /// unpack the binary form, verifying the checksum before reading any field
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_ENCODED_LEN {
            return Err(Error::MalformedShare("too short"));
        }

        let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let expected = mac(SHARE_CHECKSUM_DOMAIN, &[body]);
        if !ct_eq(checksum, &expected[..CHECKSUM_LEN]) {
            return Err(Error::CorruptShare);
        }

        let mut reader = Reader::new(body);
        if reader.byte()? != SHARE_VERSION {
            return Err(Error::MalformedShare("unsupported version"));
        }
        let mut set_id = [0u8; 4];
        set_id.copy_from_slice(reader.take(4)?);
        let index = reader.byte()?;
        let total = reader.byte()?;
        let needed = reader.byte()?;
        let params = SplitParams::new(u32::from(total), u32::from(needed))
            .map_err(|_| Error::MalformedShare("invalid split parameters"))?;
        if index == 0 || index > params.total_shares {
            return Err(Error::MalformedShare("share index out of range"));
        }

        let time_lock = match reader.byte()? {
            0 => None,
            FLAG_TIME_LOCKED => {
                let mut ts = [0u8; 8];
                ts.copy_from_slice(reader.take(8)?);
                Some(TimeLock {
                    not_before: u64::from_be_bytes(ts),
                })
            }
            _ => return Err(Error::MalformedShare("unknown flags")),
        };

        let value_len = reader.byte()? as usize;
        if value_len == 0 {
            return Err(Error::MalformedShare("empty share value"));
        }
        let value = reader.take(value_len)?.to_vec();

        let padding = reader.rest();
        if padding.len() >= GROUP_LEN || padding.iter().any(|&b| b != 0) {
            return Err(Error::MalformedShare("invalid padding"));
        }

        Ok(Self {
            set_id,
            index,
            params,
            time_lock,
            value,
        })
    }

    /// text form handed to share holders
    pub fn encode(&self) -> Result<String> {
        let symbols = base32_encode(&self.to_bytes()?);
        let mut out = String::with_capacity(symbols.len() + symbols.len() / GROUP_LEN);
        for (i, c) in symbols.chars().enumerate() {
            if i > 0 && i % GROUP_LEN == 0 {
                out.push(GROUP_SEPARATOR);
            }
            out.push(c);
        }
        Ok(out)
    }

    /// parse the text form
    pub fn decode(s: &str) -> Result<Self> {
        let bytes = base32_decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode().map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Share {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// bounds-checked cursor over a decoded body
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(Error::MalformedShare("truncated"))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        out
    }
}

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 31) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 31) as usize] as char);
    }
    out
}

/// map a transcribed symbol to its 5-bit value
///
/// case-insensitive; `O` reads as `0`, `I` and `L` read as `1`.
fn symbol_value(c: char) -> Option<u8> {
    let c = match c.to_ascii_uppercase() {
        'O' => '0',
        'I' | 'L' => '1',
        other => other,
    };
    ALPHABET.iter().position(|&a| a as char == c).map(|i| i as u8)
}

fn base32_decode(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    let mut symbols = 0usize;

    for c in s.chars() {
        if c == GROUP_SEPARATOR || c.is_whitespace() {
            continue;
        }
        let v = symbol_value(c).ok_or(Error::MalformedShare("invalid character"))?;
        symbols += 1;
        buffer = (buffer << 5) | u32::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    // shares always pack into whole 40-bit groups
    if symbols % 8 != 0 {
        return Err(Error::MalformedShare("invalid length"));
    }
    Ok(out)
}
