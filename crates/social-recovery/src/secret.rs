//! the wallet master secret

use std::fmt;

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::ct_eq;
use crate::{Error, Result};

/// secret lengths accepted by the splitter and backup codec
pub const SUPPORTED_LENGTHS: [usize; 2] = [16, 32];

/// default master secret length
pub const DEFAULT_SECRET_LEN: usize = 32;

/// master key material, wiped on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// draw a fresh secret of `len` bytes
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, len: usize) -> Result<Self> {
        check_len(len)?;
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        check_len(bytes.len())?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

fn check_len(len: usize) -> Result<()> {
    if SUPPORTED_LENGTHS.contains(&len) {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!(
            "secret must be 16 or 32 bytes, got {}",
            len
        )))
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.0, &other.0)
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {}])", self.0.len())
    }
}
