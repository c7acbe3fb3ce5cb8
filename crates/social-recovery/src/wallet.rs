//! wallet creation and recovery
//!
//! ties together: secret generation, splitting, the emergency time lock,
//! share encoding and the user backup.

use std::time::Duration;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backup::UserBackup;
use crate::reconstruct::{check_consistency, combine_shares};
use crate::secret::{Secret, DEFAULT_SECRET_LEN, SUPPORTED_LENGTHS};
use crate::share::Share;
use crate::split::{split_secret, SplitParams};
use crate::timelock::{parse_delay, partition_usable, remaining_delay, unix_now, TimeLock};
use crate::{Error, Result};

/// which share carries the time lock when a delay is requested
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayedShare {
    First,
    #[default]
    Last,
    Index(u8),
}

impl DelayedShare {
    fn resolve(self, params: &SplitParams) -> Result<u8> {
        match self {
            DelayedShare::First => Ok(1),
            DelayedShare::Last => Ok(params.total_shares),
            DelayedShare::Index(i) if i >= 1 && i <= params.total_shares => Ok(i),
            DelayedShare::Index(i) => Err(Error::InvalidParams(format!(
                "delayed share #{} outside 1..={}",
                i, params.total_shares
            ))),
        }
    }
}

/// tunables for wallet creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// master secret length in bytes, 16 or 32
    pub secret_len: usize,
    pub delayed_share: DelayedShare,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            secret_len: DEFAULT_SECRET_LEN,
            delayed_share: DelayedShare::Last,
        }
    }
}

impl WalletConfig {
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_LENGTHS.contains(&self.secret_len) {
            return Err(Error::InvalidParams(format!(
                "secret_len must be 16 or 32, got {}",
                self.secret_len
            )));
        }
        Ok(())
    }
}

/// what the caller asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletRequest {
    pub total_shares: u32,
    pub needed_shares: u32,
    pub time_delay: Duration,
    /// free-form name printed above each share
    pub label: Option<String>,
}

impl WalletRequest {
    /// build a request from the textual delay form (`"0"`, `"30d"`, ...)
    pub fn new(total_shares: u32, needed_shares: u32, time_delay: &str) -> Result<Self> {
        Ok(Self {
            total_shares,
            needed_shares,
            time_delay: parse_delay(time_delay)?,
            label: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// everything the owner walks away with; the core keeps nothing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletResult {
    pub params: SplitParams,
    pub time_delay_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub user_backup_hex: String,
    pub shares: Vec<String>,
}

impl WalletResult {
    /// heading for the `n`th share (1-based), e.g.
    /// `Recovery Share #2 for 'family' (requires 3-of-5)`
    pub fn share_title(&self, n: usize) -> String {
        let label = match &self.label {
            Some(label) if !label.is_empty() => format!("for '{}' ", label),
            _ => String::new(),
        };
        format!(
            "Recovery Share #{} {}(requires {}-of-{})",
            n, label, self.params.needed_shares, self.params.total_shares
        )
    }
}

/// create a wallet with os randomness and the current time
pub fn create_wallet(
    total_shares: u32,
    needed_shares: u32,
    time_delay: &str,
) -> Result<WalletResult> {
    // validate before parsing anything else
    SplitParams::new(total_shares, needed_shares)?;
    let request = WalletRequest::new(total_shares, needed_shares, time_delay)?;
    create_wallet_with(&request, &WalletConfig::default(), &mut OsRng, unix_now()?)
}

/// create a wallet with an explicit config, rng and clock
pub fn create_wallet_with<R>(
    request: &WalletRequest,
    config: &WalletConfig,
    rng: &mut R,
    now: u64,
) -> Result<WalletResult>
where
    R: RngCore + CryptoRng,
{
    let params = SplitParams::new(request.total_shares, request.needed_shares)?;
    config.validate()?;
    let delayed = if request.time_delay.is_zero() {
        None
    } else {
        let index = config.delayed_share.resolve(&params)?;
        Some((index, TimeLock::after(now, request.time_delay)?))
    };

    let secret = Secret::generate(rng, config.secret_len)?;
    let mut shares = split_secret(&secret, params, rng)?;

    if let Some((index, lock)) = delayed {
        if let Some(share) = shares.iter_mut().find(|s| s.index == index) {
            share.time_lock = Some(lock);
        }
        debug!(index, not_before = lock.not_before, "time-locked emergency share");
    }

    let user_backup = UserBackup {
        params,
        time_delay: request.time_delay,
        secret,
    };

    info!(
        total = params.total_shares,
        needed = params.needed_shares,
        delay_secs = request.time_delay.as_secs(),
        "created wallet"
    );

    Ok(WalletResult {
        params,
        time_delay_secs: request.time_delay.as_secs(),
        label: request.label.clone(),
        user_backup_hex: user_backup.to_hex(),
        shares: shares.iter().map(Share::encode).collect::<Result<_>>()?,
    })
}

/// decode share strings
pub fn decode_shares<S: AsRef<str>>(shares: &[S]) -> Result<Vec<Share>> {
    shares.iter().map(|s| Share::decode(s.as_ref())).collect()
}

/// recover the secret from share strings at the current time
pub fn reconstruct<S: AsRef<str>>(shares: &[S]) -> Result<Secret> {
    reconstruct_at(shares, unix_now()?)
}

/// recover the secret from share strings as of `now`
///
/// a share whose time lock is still closed is left out. if that leaves too few
/// shares but the locked ones would make up the difference, the error names
/// the locked share that opens first and how long it has left. when even the
/// locked shares cannot reach the threshold, waiting does not help and the
/// plain threshold error is returned.
pub fn reconstruct_at<S: AsRef<str>>(shares: &[S], now: u64) -> Result<Secret> {
    let decoded = decode_shares(shares)?;
    check_consistency(&decoded)?;
    reconstruct_shares_at(decoded, now)
}

/// time-gate already decoded shares and combine the usable ones
pub fn reconstruct_shares_at(shares: Vec<Share>, now: u64) -> Result<Secret> {
    let (usable, locked) = partition_usable(shares, now);

    if !locked.is_empty() {
        let need = usable
            .first()
            .or(locked.first())
            .map(|s| usize::from(s.params.needed_shares))
            .unwrap_or_default();

        let have = usable.len() + locked.len();
        if have < need {
            return Err(Error::InsufficientShares { have, need });
        }

        if usable.len() < need {
            let (index, remaining) = locked
                .iter()
                .filter_map(|s| remaining_delay(s, now).map(|r| (s.index, r)))
                .min_by_key(|&(_, r)| r)
                .unwrap_or((locked[0].index, Duration::ZERO));
            return Err(Error::ShareNotYetUsable { index, remaining });
        }

        for share in &locked {
            warn!(index = share.index, "time-locked share left out of recovery");
        }
    }

    combine_shares(&usable)
}

/// recover the secret from the user backup
pub fn recover_from_backup(user_backup_hex: &str) -> Result<Secret> {
    Ok(UserBackup::from_hex(user_backup_hex)?.secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const NOW: u64 = 1_700_000_000;
    const DAY: u64 = 86_400;

    fn wallet(total: u32, needed: u32, delay: &str, seed: u64) -> WalletResult {
        let request = WalletRequest::new(total, needed, delay).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        create_wallet_with(&request, &WalletConfig::default(), &mut rng, NOW).unwrap()
    }

    #[test]
    fn test_create_and_recover() {
        let result = create_wallet(5, 3, "0").unwrap();
        assert_eq!(result.shares.len(), 5);
        let secret = recover_from_backup(&result.user_backup_hex).unwrap();
        let picked = [&result.shares[0], &result.shares[2], &result.shares[4]];
        assert_eq!(reconstruct(&picked).unwrap(), secret);
    }

    #[test]
    fn test_invalid_params_rejected_up_front() {
        for (total, needed, delay) in [(5, 1, "0"), (3, 4, "0"), (300, 3, "0"), (5, 3, "soon")] {
            let err = create_wallet(total, needed, delay).unwrap_err();
            assert!(
                matches!(err, Error::InvalidParams(_) | Error::InvalidDelay(_)),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_delay_marks_configured_share() {
        let result = wallet(5, 3, "30d", 1);
        let shares = decode_shares(&result.shares).unwrap();
        let locked: Vec<_> = shares.iter().filter(|s| s.is_time_delayed()).collect();
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].index, 5);
        assert_eq!(
            locked[0].time_lock,
            Some(TimeLock {
                not_before: NOW + 30 * DAY
            })
        );
        assert_eq!(result.time_delay_secs, 30 * DAY);

        let config = WalletConfig {
            delayed_share: DelayedShare::Index(2),
            ..Default::default()
        };
        let request = WalletRequest::new(5, 3, "1h").unwrap();
        let result =
            create_wallet_with(&request, &config, &mut ChaCha20Rng::seed_from_u64(2), NOW).unwrap();
        let shares = decode_shares(&result.shares).unwrap();
        assert!(shares[1].is_time_delayed());
        assert!(!shares[4].is_time_delayed());
    }

    #[test]
    fn test_bad_config_rejected() {
        let request = WalletRequest::new(3, 2, "1d").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for config in [
            WalletConfig {
                secret_len: 20,
                ..Default::default()
            },
            WalletConfig {
                delayed_share: DelayedShare::Index(4),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                create_wallet_with(&request, &config, &mut rng, NOW),
                Err(Error::InvalidParams(_))
            ));
        }
    }

    #[test]
    fn test_locked_share_gating() {
        let result = wallet(5, 3, "30d", 4);
        let secret = recover_from_backup(&result.user_backup_hex).unwrap();
        let with_locked = [&result.shares[0], &result.shares[1], &result.shares[4]];

        assert_eq!(
            reconstruct_at(&with_locked, NOW + DAY),
            Err(Error::ShareNotYetUsable {
                index: 5,
                remaining: Duration::from_secs(29 * DAY)
            })
        );
        assert_eq!(reconstruct_at(&with_locked, NOW + 30 * DAY).unwrap(), secret);

        // enough unlocked shares: the locked one is simply ignored
        let plenty = [
            &result.shares[0],
            &result.shares[1],
            &result.shares[2],
            &result.shares[4],
        ];
        assert_eq!(reconstruct_at(&plenty, NOW).unwrap(), secret);
    }

    #[test]
    fn test_too_few_shares_even_after_unlock() {
        let result = wallet(5, 3, "30d", 5);
        let short = [&result.shares[0], &result.shares[4]];

        let expected = Err(Error::InsufficientShares { have: 2, need: 3 });
        assert_eq!(reconstruct_at(&short, NOW), expected);
        assert_eq!(reconstruct_at(&short, NOW + 31 * DAY), expected);
    }

    #[test]
    fn test_sixteen_byte_config() {
        let config = WalletConfig {
            secret_len: 16,
            ..Default::default()
        };
        let request = WalletRequest::new(3, 2, "0").unwrap();
        let result =
            create_wallet_with(&request, &config, &mut ChaCha20Rng::seed_from_u64(6), NOW).unwrap();
        let secret = recover_from_backup(&result.user_backup_hex).unwrap();
        assert_eq!(secret.len(), 16);
        assert_eq!(reconstruct_at(&result.shares[1..], NOW).unwrap(), secret);
    }

    #[test]
    fn test_share_title() {
        let mut result = wallet(5, 3, "0", 7);
        assert_eq!(result.share_title(1), "Recovery Share #1 (requires 3-of-5)");
        result.label = Some("family".into());
        assert_eq!(
            result.share_title(2),
            "Recovery Share #2 for 'family' (requires 3-of-5)"
        );
    }

    #[test]
    fn test_result_json_shape() {
        let request = WalletRequest::new(3, 2, "0").unwrap().with_label("cold");
        let result = create_wallet_with(
            &request,
            &WalletConfig::default(),
            &mut ChaCha20Rng::seed_from_u64(8),
            NOW,
        )
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["params"]["total_shares"], 3);
        assert_eq!(json["params"]["needed_shares"], 2);
        assert_eq!(json["label"], "cold");
        assert!(json["user_backup_hex"].is_string());
        assert_eq!(json["shares"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_config_from_toml() {
        let config: WalletConfig =
            toml::from_str("secret_len = 16\ndelayed_share = \"first\"\n").unwrap();
        assert_eq!(config.secret_len, 16);
        assert_eq!(config.delayed_share, DelayedShare::First);

        let config: WalletConfig = toml::from_str("[delayed_share]\nindex = 3\n").unwrap();
        assert_eq!(config.secret_len, DEFAULT_SECRET_LEN);
        assert_eq!(config.delayed_share, DelayedShare::Index(3));

        let config: WalletConfig = toml::from_str("").unwrap();
        assert_eq!(config, WalletConfig::default());
    }
}
