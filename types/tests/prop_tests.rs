use proptest::prelude::*;

use tally_types::{ProposalId, Timestamp, TokenAmount, SECONDS_PER_DAY};

proptest! {
    /// ProposalId::next is strictly greater than its predecessor.
    #[test]
    fn proposal_id_next_increases(raw in 0u64..u64::MAX) {
        let id = ProposalId::new(raw);
        let next = id.next().unwrap();
        prop_assert!(next > id);
        prop_assert_eq!(next.get(), raw + 1);
    }

    /// ProposalId bincode serialization keeps ordering information intact.
    #[test]
    fn proposal_id_bincode_roundtrip(raw in 0u64..u64::MAX) {
        let id = ProposalId::new(raw);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: ProposalId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// plus_days agrees with manual arithmetic inside the non-saturating range.
    #[test]
    fn timestamp_plus_days(base in 0u64..1_000_000_000, days in 0u64..10_000) {
        let t = Timestamp::new(base).plus_days(days);
        prop_assert_eq!(t.as_secs(), base + days * SECONDS_PER_DAY);
    }

    /// remaining_from counts down to zero and then stays there.
    #[test]
    fn timestamp_remaining_from(deadline in 0u64..1_000_000, now in 0u64..2_000_000) {
        let remaining = Timestamp::new(deadline).remaining_from(Timestamp::new(now));
        if now >= deadline {
            prop_assert_eq!(remaining, 0);
        } else {
            prop_assert_eq!(remaining, deadline - now);
        }
    }

    /// TokenAmount: checked_add(a, b) == Some(a + b) when no overflow.
    #[test]
    fn token_amount_checked_add(a in 0u128..u128::MAX / 2, b in 0u128..u128::MAX / 2) {
        let sum = TokenAmount::new(a).checked_add(TokenAmount::new(b));
        prop_assert_eq!(sum, Some(TokenAmount::new(a + b)));
    }

    /// TokenAmount: only a non-zero amount is positive.
    #[test]
    fn token_amount_positive_iff_nonzero(raw in 0u128..1_000) {
        prop_assert_eq!(TokenAmount::new(raw).is_positive(), raw != 0);
    }
}

#[test]
fn timestamp_plus_days_saturates() {
    let t = Timestamp::new(u64::MAX - 10).plus_days(1);
    assert_eq!(t.as_secs(), u64::MAX);
}
