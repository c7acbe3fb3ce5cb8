//! lagrange reconstruction of the secret from shares
//!
//! given points (x_i, y_i) the secret byte is
//!
//! ```text
//! f(0) = Σ y_i · Π_{j≠i} (0 - x_j) / (x_i - x_j)
//!      = Σ y_i · Π_{j≠i} x_j / (x_i + x_j)      (characteristic 2)
//! ```
//!
//! the shares are checked to come from one split before anything is
//! interpolated, and the recovered payload tag is checked afterwards. a wrong
//! share set is reported, never turned into a wrong secret.

use std::collections::HashSet;

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::ct_eq;
use crate::field::Gf256;
use crate::secret::Secret;
use crate::share::Share;
use crate::split::{payload_tag, MIN_THRESHOLD, PAYLOAD_TAG_LEN};
use crate::{Error, Result};

/// check that shares share one split and carry distinct indices
///
/// does not look at thresholds or time locks.
pub fn check_consistency(shares: &[Share]) -> Result<()> {
    let Some(first) = shares.first() else {
        return Ok(());
    };

    let mut seen = HashSet::with_capacity(shares.len());
    for share in shares {
        if share.set_id != first.set_id {
            return Err(Error::InconsistentShareSet("shares come from different splits"));
        }
        if share.params != first.params {
            return Err(Error::InconsistentShareSet("split parameters differ"));
        }
        if share.value.len() != first.value.len() {
            return Err(Error::InconsistentShareSet("share lengths differ"));
        }
        if !seen.insert(share.index) {
            return Err(Error::DuplicateShare(share.index));
        }
    }
    Ok(())
}

/// recover the secret from at least `needed_shares` shares of one split
///
/// the first `needed_shares` shares fix the polynomial; any further share
/// must lie on it.
pub fn combine_shares(shares: &[Share]) -> Result<Secret> {
    let Some(first) = shares.first() else {
        return Err(Error::InsufficientShares {
            have: 0,
            need: usize::from(MIN_THRESHOLD),
        });
    };
    check_consistency(shares)?;

    let need = usize::from(first.params.needed_shares);
    if shares.len() < need {
        return Err(Error::InsufficientShares {
            have: shares.len(),
            need,
        });
    }
    if first.value.len() <= PAYLOAD_TAG_LEN {
        return Err(Error::InconsistentShareSet("share value too short"));
    }

    let (basis, surplus) = shares.split_at(need);
    let xs: Vec<Gf256> = basis.iter().map(|s| Gf256(s.index)).collect();
    let weights = lagrange_weights(&xs, Gf256::ZERO)?;

    let mut payload = Zeroizing::new(vec![0u8; first.value.len()]);
    for (pos, byte) in payload.iter_mut().enumerate() {
        *byte = weights
            .iter()
            .zip(basis)
            .fold(Gf256::ZERO, |acc, (&w, s)| acc + w * Gf256(s.value[pos]))
            .0;
    }

    // surplus shares must agree with the polynomial the basis defines
    for extra in surplus {
        let weights = lagrange_weights(&xs, Gf256(extra.index))?;
        for (pos, &y) in extra.value.iter().enumerate() {
            let expected = weights
                .iter()
                .zip(basis)
                .fold(Gf256::ZERO, |acc, (&w, s)| acc + w * Gf256(s.value[pos]));
            if expected != Gf256(y) {
                return Err(Error::InconsistentShareSet(
                    "share does not lie on the recovered polynomial",
                ));
            }
        }
    }

    let (secret, tag) = payload.split_at(payload.len() - PAYLOAD_TAG_LEN);
    let expected = payload_tag(&first.set_id, &first.params, secret);
    if !ct_eq(tag, &expected) {
        return Err(Error::InconsistentShareSet("integrity tag mismatch"));
    }

    debug!(
        used = need,
        verified = surplus.len(),
        set_id = %hex::encode(first.set_id),
        "combined shares"
    );

    Secret::from_bytes(secret.to_vec())
        .map_err(|_| Error::InconsistentShareSet("unexpected secret length"))
}

/// lagrange basis values L_i(x) for the given distinct nonzero points
///
/// L_i(x) = Π_{j≠i} (x - x_j) / (x_i - x_j)
fn lagrange_weights(xs: &[Gf256], x: Gf256) -> Result<Vec<Gf256>> {
    xs.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let mut num = Gf256::ONE;
            let mut den = Gf256::ONE;
            for (j, &xj) in xs.iter().enumerate() {
                if i != j {
                    num *= x - xj;
                    den *= xi - xj;
                }
            }
            num.div(den)
        })
        .collect()
}
