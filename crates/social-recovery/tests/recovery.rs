//! end-to-end recovery scenarios and threshold properties

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use social_recovery::{
    combine_shares, create_wallet, create_wallet_with, reconstruct, reconstruct_at,
    recover_from_backup, split_secret, Error, Secret, Share, SplitParams, WalletConfig,
    WalletRequest,
};

const NOW: u64 = 1_750_000_000;
const DAY: u64 = 86_400;

#[test]
fn test_five_three_no_delay() {
    let wallet = create_wallet(5, 3, "0").unwrap();
    assert_eq!(wallet.params, SplitParams::new(5, 3).unwrap());
    assert_eq!(wallet.shares.len(), 5);

    let mut distinct = wallet.shares.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 5);

    let from_backup = recover_from_backup(&wallet.user_backup_hex).unwrap();
    let a = reconstruct(&[&wallet.shares[0], &wallet.shares[2], &wallet.shares[4]]).unwrap();
    let b = reconstruct(&[&wallet.shares[1], &wallet.shares[3], &wallet.shares[4]]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, from_backup);
}

#[test]
fn test_thirty_day_emergency_share() {
    let request = WalletRequest::new(5, 3, "30d").unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(30);
    let wallet = create_wallet_with(&request, &WalletConfig::default(), &mut rng, NOW).unwrap();
    let secret = recover_from_backup(&wallet.user_backup_hex).unwrap();

    let locked = wallet
        .shares
        .iter()
        .find(|s| Share::decode(s).unwrap().is_time_delayed())
        .unwrap();
    let others: Vec<_> = wallet.shares.iter().filter(|s| *s != locked).collect();
    let attempt = [others[0], others[1], locked];

    match reconstruct_at(&attempt, NOW + 10 * DAY) {
        Err(Error::ShareNotYetUsable { remaining, .. }) => {
            assert_eq!(remaining.as_secs(), 20 * DAY)
        }
        other => panic!("expected time lock, got {:?}", other),
    }
    assert_eq!(reconstruct_at(&attempt, NOW + 30 * DAY).unwrap(), secret);
    assert_eq!(reconstruct_at(&attempt, NOW + 365 * DAY).unwrap(), secret);
}

#[test]
fn test_mixing_two_wallets() {
    let first = create_wallet(5, 3, "0").unwrap();
    let second = create_wallet(5, 3, "0").unwrap();
    let mixed = [&first.shares[0], &first.shares[1], &second.shares[2]];
    assert!(matches!(
        reconstruct(&mixed),
        Err(Error::InconsistentShareSet(_))
    ));
}

#[test]
fn test_corrupted_share_string() {
    let wallet = create_wallet(3, 2, "0").unwrap();
    let mut typo: Vec<char> = wallet.shares[0].chars().collect();
    typo[3] = if typo[3] == 'X' { 'Y' } else { 'X' };
    let typo: String = typo.into_iter().collect();
    assert_eq!(
        reconstruct(&[typo.as_str(), wallet.shares[1].as_str()]),
        Err(Error::CorruptShare)
    );
}

#[test]
fn test_every_subset_of_small_split() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let secret = Secret::generate(&mut rng, 32).unwrap();
    let shares = split_secret(&secret, SplitParams::new(6, 3).unwrap(), &mut rng).unwrap();

    for a in 0..6 {
        for b in a + 1..6 {
            for c in b + 1..6 {
                let subset = [shares[a].clone(), shares[b].clone(), shares[c].clone()];
                assert_eq!(combine_shares(&subset).unwrap(), secret);
            }
        }
    }
}

#[test]
fn test_concurrent_wallets() {
    let recovered: Vec<(Secret, Secret)> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let wallet = create_wallet(5, 3, "0").unwrap();
                    let backup = recover_from_backup(&wallet.user_backup_hex).unwrap();
                    let shares = reconstruct(&wallet.shares[1..4]).unwrap();
                    (backup, shares)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for (backup, shares) in &recovered {
        assert_eq!(backup, shares);
    }
    // independent wallets never share a secret
    assert_ne!(recovered[0].0, recovered[1].0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn threshold_subsets_recover(
        total in 2u32..=255,
        needed_frac in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let needed = 2 + ((total - 2) as f64 * needed_frac) as u32;
        let params = SplitParams::new(total, needed).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let secret = Secret::generate(&mut rng, 32).unwrap();
        let shares = split_secret(&secret, params, &mut rng).unwrap();

        let first: Vec<Share> = shares
            .choose_multiple(&mut rng, needed as usize)
            .cloned()
            .collect();
        let second: Vec<Share> = shares
            .choose_multiple(&mut rng, needed as usize)
            .cloned()
            .collect();
        prop_assert_eq!(combine_shares(&first).unwrap(), secret.clone());
        prop_assert_eq!(combine_shares(&second).unwrap(), secret);

        let short = &first[..needed as usize - 1];
        prop_assert_eq!(
            combine_shares(short),
            Err(Error::InsufficientShares { have: needed as usize - 1, need: needed as usize })
        );
    }

    #[test]
    fn share_text_roundtrip(
        total in 2u8..=255,
        index_seed in any::<u8>(),
        locked in proptest::option::of(any::<u64>()),
        set_id in any::<[u8; 4]>(),
        value in proptest::collection::vec(any::<u8>(), 1..=255),
    ) {
        let share = Share {
            set_id,
            index: index_seed % total + 1,
            params: SplitParams::new(u32::from(total), 2).unwrap(),
            time_lock: locked.map(|not_before| social_recovery::TimeLock { not_before }),
            value,
        };
        let text = share.encode().unwrap();
        prop_assert_eq!(Share::decode(&text).unwrap(), share);
    }
}
