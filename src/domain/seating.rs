//! Seating optimizer: spreads participants across tables so that people who
//! already shared a table in earlier rounds are unlikely to meet again.
//!
//! The policy is greedy, table by table and seat by seat. For each open seat
//! every unseated participant is scored by how many times they already sat
//! with the people at this table; the lowest score wins and ties are broken
//! uniformly at random with the caller's RNG. The result is locally minimal
//! per seat, not a global optimum over all rounds.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use super::event::check_seat_count;
use super::round_clock::SEATS_PER_TABLE;
use super::{EventId, RoundAssignment, TableId, UserId};
use crate::error::SchedulerError;

/// How many prior rounds each unordered pair of participants shared a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingHistory {
    counts: HashMap<(UserId, UserId), u32>,
}

impl PairingHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the history from previously seated rounds.
    #[must_use]
    pub fn from_rounds<'a>(rounds: impl IntoIterator<Item = &'a RoundAssignment>) -> Self {
        let mut history = Self::new();
        for round in rounds {
            history.record_table(&round.user_ids);
        }
        history
    }

    /// Counts one shared round for every pair at the given table.
    pub fn record_table(&mut self, users: &[UserId]) {
        for (i, a) in users.iter().enumerate() {
            for b in users.iter().skip(i + 1) {
                *self.counts.entry(pair_key(*a, *b)).or_insert(0) += 1;
            }
        }
    }

    /// Number of rounds `a` and `b` shared a table.
    #[must_use]
    pub fn count(&self, a: UserId, b: UserId) -> u32 {
        self.counts.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    /// Sum of shared rounds between `candidate` and everyone in `seated`.
    #[must_use]
    pub fn score(&self, candidate: UserId, seated: &[UserId]) -> u32 {
        seated.iter().map(|other| self.count(candidate, *other)).sum()
    }

    /// Highest count over all pairs, `0` for an empty history.
    #[must_use]
    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Number of pairs that met at least once.
    #[must_use]
    pub fn distinct_pairs(&self) -> usize {
        self.counts.len()
    }

    /// Number of pairs that met more than once.
    #[must_use]
    pub fn repeated_pairs(&self) -> usize {
        self.counts.values().filter(|c| **c > 1).count()
    }
}

fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Seats every participant for one round.
///
/// `prior_rounds` should hold every assignment of this event for rounds
/// before `round_id`. Returns one assignment per table, in table order.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfiguration`] unless there are exactly
/// [`SEATS_PER_TABLE`] participants per table.
pub fn generate_round_seating<R: Rng + ?Sized>(
    event_id: EventId,
    round_id: u32,
    participants: &[UserId],
    tables: &[TableId],
    prior_rounds: &[RoundAssignment],
    rng: &mut R,
) -> Result<Vec<RoundAssignment>, SchedulerError> {
    check_seat_count(participants.len(), tables.len())?;

    let history = PairingHistory::from_rounds(prior_rounds);
    let groups = match greedy_groups(participants, tables.len(), &history, rng) {
        Some(groups) => groups,
        None => {
            tracing::warn!(%event_id, round_id, "greedy seating failed, reshuffling at random");
            random_groups(participants, rng)
        }
    };

    Ok(tables
        .iter()
        .zip(groups)
        .map(|(table_id, users)| RoundAssignment::new(event_id, round_id, *table_id, users))
        .collect())
}

fn greedy_groups<R: Rng + ?Sized>(
    participants: &[UserId],
    table_count: usize,
    history: &PairingHistory,
    rng: &mut R,
) -> Option<Vec<Vec<UserId>>> {
    let mut pool = participants.to_vec();
    let mut groups = Vec::with_capacity(table_count);

    for _ in 0..table_count {
        let mut table = Vec::with_capacity(SEATS_PER_TABLE);
        for _ in 0..SEATS_PER_TABLE {
            let pick = pick_candidate(&pool, &table, history, rng)?;
            table.push(pool.swap_remove(pick));
        }
        groups.push(table);
    }

    Some(groups)
}

/// Index into `pool` of a minimum-score candidate, chosen uniformly among ties.
fn pick_candidate<R: Rng + ?Sized>(
    pool: &[UserId],
    seated: &[UserId],
    history: &PairingHistory,
    rng: &mut R,
) -> Option<usize> {
    let scores: Vec<u32> = pool.iter().map(|c| history.score(*c, seated)).collect();
    let best = scores.iter().copied().min()?;
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == best)
        .map(|(idx, _)| idx)
        .collect();
    tied.choose(rng).copied()
}

fn random_groups<R: Rng + ?Sized>(participants: &[UserId], rng: &mut R) -> Vec<Vec<UserId>> {
    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);
    shuffled
        .chunks(SEATS_PER_TABLE)
        .map(<[UserId]>::to_vec)
        .collect()
}

/// Returns `true` if `a` and `b` sat at the same table in any of `prior_rounds`.
#[must_use]
pub fn has_users_previously_met(a: UserId, b: UserId, prior_rounds: &[RoundAssignment]) -> bool {
    prior_rounds
        .iter()
        .any(|round| round.seats(a) && round.seats(b))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn users(n: u64) -> Vec<UserId> {
        (1..=n).map(UserId::new).collect()
    }

    fn tables(n: u64) -> Vec<TableId> {
        (1..=n).map(TableId::new).collect()
    }

    fn seat_all_rounds(seed: u64) -> Vec<RoundAssignment> {
        let mut rng = StdRng::seed_from_u64(seed);
        let participants = users(40);
        let tables = tables(10);
        let mut rounds: Vec<RoundAssignment> = Vec::new();
        for round_id in 1..=5 {
            let Ok(seated) = generate_round_seating(
                EventId::new(1),
                round_id,
                &participants,
                &tables,
                &rounds,
                &mut rng,
            ) else {
                panic!("valid layout");
            };
            rounds.extend(seated);
        }
        rounds
    }

    #[test]
    fn first_round_covers_everyone_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let participants = users(40);
        let Ok(seated) =
            generate_round_seating(EventId::new(1), 1, &participants, &tables(10), &[], &mut rng)
        else {
            panic!("valid layout");
        };

        assert_eq!(seated.len(), 10);
        let mut all: Vec<UserId> = Vec::new();
        for (a, table_id) in seated.iter().zip(tables(10)) {
            assert_eq!(a.user_ids.len(), SEATS_PER_TABLE);
            assert_eq!(a.table_id, table_id);
            assert_eq!(a.round_id, 1);
            assert_eq!(a.event_id, EventId::new(1));
            all.extend(a.user_ids.iter().copied());
        }
        all.sort();
        assert_eq!(all, participants);
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result =
            generate_round_seating(EventId::new(1), 1, &users(39), &tables(10), &[], &mut rng);
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidConfiguration(_))
        ));

        let result = generate_round_seating(EventId::new(1), 1, &users(4), &[], &[], &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn every_round_is_a_partition() {
        let rounds = seat_all_rounds(11);
        assert_eq!(rounds.len(), 50);
        for round_id in 1..=5 {
            let seated: Vec<UserId> = rounds
                .iter()
                .filter(|a| a.round_id == round_id)
                .flat_map(|a| a.user_ids.iter().copied())
                .collect();
            let unique: HashSet<UserId> = seated.iter().copied().collect();
            assert_eq!(seated.len(), 40);
            assert_eq!(unique.len(), 40);
        }
    }

    #[test]
    fn repeat_pairings_stay_low_across_seeds() {
        for seed in [1_u64, 2, 3, 42, 2025] {
            let history = PairingHistory::from_rounds(&seat_all_rounds(seed));
            assert!(
                history.max_count() <= 3,
                "seed {seed}: max pair count {}",
                history.max_count()
            );
            #[allow(clippy::cast_precision_loss)]
            let repeat_ratio = history.repeated_pairs() as f64 / history.distinct_pairs() as f64;
            assert!(repeat_ratio < 0.4, "seed {seed}: repeat ratio {repeat_ratio}");
        }
    }

    #[test]
    fn second_round_avoids_first_round_tablemates() {
        let mut rng = StdRng::seed_from_u64(5);
        let participants = users(8);
        let tables = tables(2);
        let Ok(first) =
            generate_round_seating(EventId::new(1), 1, &participants, &tables, &[], &mut rng)
        else {
            panic!("valid layout");
        };
        let Ok(second) =
            generate_round_seating(EventId::new(1), 2, &participants, &tables, &first, &mut rng)
        else {
            panic!("valid layout");
        };

        // The first table of round two can always be filled with strangers:
        // two people from each round-one table.
        let Some(opening) = second.first() else {
            panic!("two tables seated");
        };
        let history = PairingHistory::from_rounds(&first);
        let mut meetings = 0;
        for (i, a) in opening.user_ids.iter().enumerate() {
            for b in opening.user_ids.iter().skip(i + 1) {
                meetings += history.count(*a, *b);
            }
        }
        assert_eq!(meetings, 2);
    }

    #[test]
    fn same_seed_same_seating() {
        let a = seat_all_rounds(99);
        let b = seat_all_rounds(99);
        assert_eq!(a, b);
    }

    #[test]
    fn pairing_history_counts() {
        let mut history = PairingHistory::new();
        history.record_table(&users(4));
        history.record_table(&[UserId::new(2), UserId::new(1)]);
        assert_eq!(history.count(UserId::new(1), UserId::new(2)), 2);
        assert_eq!(history.count(UserId::new(2), UserId::new(1)), 2);
        assert_eq!(history.count(UserId::new(3), UserId::new(4)), 1);
        assert_eq!(history.count(UserId::new(1), UserId::new(5)), 0);
        assert_eq!(history.distinct_pairs(), 6);
        assert_eq!(history.repeated_pairs(), 1);
        assert_eq!(history.max_count(), 2);
        assert_eq!(
            history.score(UserId::new(1), &[UserId::new(2), UserId::new(3)]),
            3
        );
    }

    #[test]
    fn previously_met_queries() {
        let prior = vec![
            RoundAssignment::new(EventId::new(1), 1, TableId::new(1), users(4)),
            RoundAssignment::new(
                EventId::new(1),
                2,
                TableId::new(1),
                (5..=8).map(UserId::new).collect(),
            ),
            RoundAssignment::new(
                EventId::new(1),
                3,
                TableId::new(1),
                [1, 5, 9, 10].into_iter().map(UserId::new).collect(),
            ),
        ];
        assert!(has_users_previously_met(UserId::new(1), UserId::new(2), &prior));
        assert!(has_users_previously_met(UserId::new(1), UserId::new(5), &prior));
        assert!(!has_users_previously_met(UserId::new(2), UserId::new(6), &prior));
    }

    #[test]
    fn random_groups_partition() {
        let mut rng = StdRng::seed_from_u64(3);
        let groups = random_groups(&users(12), &mut rng);
        assert_eq!(groups.len(), 3);
        let all: HashSet<UserId> = groups.iter().flatten().copied().collect();
        assert_eq!(all.len(), 12);
    }
}
