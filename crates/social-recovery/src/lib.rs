//! # social-recovery
//!
//! k-of-n social recovery for a wallet master secret, with an optional
//! time-delayed emergency share.
//!
//! ## architecture
//!
//! ```text
//!        ┌──────────────┐
//!        │ master secret│──────────────► user backup (hex, unsplit)
//!        └──────┬───────┘
//!               │ shamir over GF(256), per byte
//!     ┌────┬────┼────┬────┐
//!     ▼    ▼    ▼    ▼    ▼
//!   ┌──┐ ┌──┐ ┌──┐ ┌──┐ ┌──┐
//!   │#1│ │#2│ │#3│ │#4│ │#5│  (3-of-5, #5 locked for 30 days)
//!   └──┘ └──┘ └──┘ └──┘ └──┘
//!     │    │    │    │    │  base32 + checksum, handed to friends
//! ```
//!
//! ## security properties
//!
//! - any `needed_shares` shares of one split recover the secret
//! - fewer shares reveal nothing about it
//! - shares from different splits are detected, never combined into a wrong secret
//! - a single mistyped symbol in a share is caught by its checksum
//! - the time lock is a procedural gate only, see [`timelock`]
//!
//! ## usage
//!
//! ```rust
//! use social_recovery::{create_wallet, reconstruct, recover_from_backup};
//!
//! let wallet = create_wallet(5, 3, "0")?;
//! let secret = recover_from_backup(&wallet.user_backup_hex)?;
//!
//! let picked = [&wallet.shares[0], &wallet.shares[2], &wallet.shares[4]];
//! assert_eq!(reconstruct(&picked)?, secret);
//! # Ok::<(), social_recovery::Error>(())
//! ```

pub mod backup;
pub mod crypto;
pub mod error;
pub mod field;
pub mod reconstruct;
pub mod secret;
pub mod share;
pub mod split;
pub mod timelock;
pub mod wallet;

pub use backup::UserBackup;
pub use error::{Error, Result};
pub use field::Gf256;
pub use reconstruct::combine_shares;
pub use secret::Secret;
pub use share::Share;
pub use split::{split_secret, SplitParams};
pub use timelock::{is_currently_valid, parse_delay, TimeLock};
pub use wallet::{
    create_wallet, create_wallet_with, reconstruct, reconstruct_at, recover_from_backup,
    DelayedShare, WalletConfig, WalletRequest, WalletResult,
};
