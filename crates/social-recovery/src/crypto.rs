//! cryptographic helpers
//!
//! - csprng draws behind `RngCore + CryptoRng` so tests can inject seeded rngs
//! - hmac-sha256 for share checksums and payload tags
//! - constant-time comparison

use hmac::{digest::KeyInit, Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// domain tag for the per-share transcription checksum
pub(crate) const SHARE_CHECKSUM_DOMAIN: &[u8] = b"social-recovery:share_checksum:v1";

/// domain tag for the integrity tag appended to the split payload
pub(crate) const PAYLOAD_TAG_DOMAIN: &[u8] = b"social-recovery:payload_tag:v1";

/// domain tag for the user backup checksum
pub(crate) const BACKUP_CHECKSUM_DOMAIN: &[u8] = b"social-recovery:user_backup:v1";

/// generate random bytes from the given csprng
pub fn random_bytes<const N: usize, R>(rng: &mut R) -> [u8; N]
where
    R: RngCore + CryptoRng,
{
    let mut bytes = [0u8; N];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// compute hmac-sha256 tag
pub fn mac(key: &[u8], data: &[&[u8]]) -> [u8; 32] {
    let mut h: HmacSha256 = KeyInit::new_from_slice(key).expect("hmac accepts any key length");
    for d in data {
        Mac::update(&mut h, d);
    }
    h.finalize().into_bytes().into()
}

/// constant-time equality for checksums and tags
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
