//! threshold splitting using shamir's scheme over GF(256)
//!
//! every byte of the payload gets its own random polynomial of degree
//! `needed_shares - 1` whose constant term is that byte. share `i` holds the
//! evaluations at `x = i`.
//!
//! the payload is `secret || tag`, where the 4-byte tag is a mac over the set
//! id, the parameters and the secret. it is shared like the rest of the secret,
//! so below threshold it is as hidden as the secret itself, and after
//! interpolation it tells us whether the shares really belonged together.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{mac, random_bytes, PAYLOAD_TAG_DOMAIN};
use crate::field::{eval_poly, Gf256};
use crate::secret::Secret;
use crate::share::{SetId, Share};
use crate::{Error, Result};

/// smallest threshold that actually splits anything
pub const MIN_THRESHOLD: u8 = 2;

/// largest share count, one per nonzero field element
pub const MAX_SHARES: u8 = 255;

/// length of the integrity tag appended to the secret before splitting
pub const PAYLOAD_TAG_LEN: usize = 4;

/// k-of-n parameters of a split
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitParams {
    pub total_shares: u8,
    pub needed_shares: u8,
}

impl SplitParams {
    /// validate `2 <= needed <= total <= 255`
    ///
    /// takes wide integers so out-of-range input is rejected, not truncated.
    pub fn new(total_shares: u32, needed_shares: u32) -> Result<Self> {
        if needed_shares < u32::from(MIN_THRESHOLD) {
            return Err(Error::InvalidParams(format!(
                "needed_shares must be at least {}, got {}",
                MIN_THRESHOLD, needed_shares
            )));
        }
        if total_shares > u32::from(MAX_SHARES) {
            return Err(Error::InvalidParams(format!(
                "total_shares must be at most {}, got {}",
                MAX_SHARES, total_shares
            )));
        }
        if needed_shares > total_shares {
            return Err(Error::InvalidParams(format!(
                "needed_shares ({}) exceeds total_shares ({})",
                needed_shares, total_shares
            )));
        }
        Ok(Self {
            total_shares: total_shares as u8,
            needed_shares: needed_shares as u8,
        })
    }
}

/// integrity tag bound to one split
pub(crate) fn payload_tag(
    set_id: &SetId,
    params: &SplitParams,
    secret: &[u8],
) -> [u8; PAYLOAD_TAG_LEN] {
    let full = mac(
        PAYLOAD_TAG_DOMAIN,
        &[set_id, &[params.total_shares, params.needed_shares], secret],
    );
    let mut tag = [0u8; PAYLOAD_TAG_LEN];
    tag.copy_from_slice(&full[..PAYLOAD_TAG_LEN]);
    tag
}

/// split a secret into `params.total_shares` shares, any `params.needed_shares`
/// of which recover it
pub fn split_secret<R>(secret: &Secret, params: SplitParams, rng: &mut R) -> Result<Vec<Share>>
where
    R: RngCore + CryptoRng,
{
    // params may have been built by hand
    let params = SplitParams::new(
        u32::from(params.total_shares),
        u32::from(params.needed_shares),
    )?;

    let set_id: SetId = random_bytes(rng);

    let mut payload = Zeroizing::new(Vec::with_capacity(secret.len() + PAYLOAD_TAG_LEN));
    payload.extend_from_slice(secret.as_bytes());
    payload.extend_from_slice(&payload_tag(&set_id, &params, secret.as_bytes()));

    let total = usize::from(params.total_shares);
    let degree = usize::from(params.needed_shares) - 1;

    let mut values = vec![vec![0u8; payload.len()]; total];
    let mut random = Zeroizing::new(vec![0u8; degree]);
    let mut coeffs = Zeroizing::new(vec![Gf256::ZERO; degree + 1]);

    for (pos, &byte) in payload.iter().enumerate() {
        rng.fill_bytes(&mut random);
        coeffs[0] = Gf256(byte);
        for (c, &r) in coeffs[1..].iter_mut().zip(random.iter()) {
            *c = Gf256(r);
        }

        for (i, share_values) in values.iter_mut().enumerate() {
            let x = Gf256(i as u8 + 1);
            share_values[pos] = eval_poly(&coeffs, x).0;
        }
    }

    debug!(
        total = params.total_shares,
        needed = params.needed_shares,
        secret_len = secret.len(),
        set_id = %hex::encode(set_id),
        "split secret"
    );

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Share {
            set_id,
            index: i as u8 + 1,
            params,
            time_lock: None,
            value,
        })
        .collect())
}
