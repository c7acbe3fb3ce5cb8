//! the user's own backup
//!
//! unlike the recovery shares this is the whole secret, unsplit. it gives the
//! wallet owner unconditional control and is kept apart from the shares handed
//! to friends. the split parameters and delay are recorded alongside so the
//! owner knows what the recovery set looks like.

use std::time::Duration;

use crate::crypto::{ct_eq, mac, BACKUP_CHECKSUM_DOMAIN};
use crate::secret::Secret;
use crate::split::SplitParams;
use crate::{Error, Result};

pub const BACKUP_VERSION: u8 = 1;

const CHECKSUM_LEN: usize = 4;

/// version | total | needed | delay secs (u64 be) | secret len | secret | checksum
const FIXED_LEN: usize = 1 + 1 + 1 + 8 + 1 + CHECKSUM_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserBackup {
    pub params: SplitParams,
    pub time_delay: Duration,
    pub secret: Secret,
}

impl UserBackup {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FIXED_LEN + self.secret.len());
        bytes.push(BACKUP_VERSION);
        bytes.push(self.params.total_shares);
        bytes.push(self.params.needed_shares);
        bytes.extend_from_slice(&self.time_delay.as_secs().to_be_bytes());
        bytes.push(self.secret.len() as u8);
        bytes.extend_from_slice(self.secret.as_bytes());
        let checksum = mac(BACKUP_CHECKSUM_DOMAIN, &[bytes.as_slice()]);
        bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIXED_LEN {
            return Err(Error::InvalidBackup("too short"));
        }
        let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let expected = mac(BACKUP_CHECKSUM_DOMAIN, &[body]);
        if !ct_eq(checksum, &expected[..CHECKSUM_LEN]) {
            return Err(Error::InvalidBackup("checksum mismatch"));
        }

        if body[0] != BACKUP_VERSION {
            return Err(Error::InvalidBackup("unsupported version"));
        }
        let params = SplitParams::new(u32::from(body[1]), u32::from(body[2]))
            .map_err(|_| Error::InvalidBackup("invalid split parameters"))?;
        let mut delay = [0u8; 8];
        delay.copy_from_slice(&body[3..11]);
        let secret_len = body[11] as usize;
        let secret_bytes = &body[12..];
        if secret_bytes.len() != secret_len {
            return Err(Error::InvalidBackup("length mismatch"));
        }
        let secret = Secret::from_bytes(secret_bytes.to_vec())
            .map_err(|_| Error::InvalidBackup("unsupported secret length"))?;

        Ok(Self {
            params,
            time_delay: Duration::from_secs(u64::from_be_bytes(delay)),
            secret,
        })
    }

    /// lowercase hex, as handed to the wallet owner
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| Error::InvalidBackup("not hex"))?;
        Self::from_bytes(&bytes)
    }
}
