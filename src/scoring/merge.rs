use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::scoring::rounds::{MAX_ROUNDS_PER_MATCH, RoundRecord};

/// Summary of where the working round list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// At least one round is backed by the server.
    Server,
    /// Only locally cached rounds are present.
    Local,
    /// No rounds at all.
    New,
}

/// Output of [`merge_rounds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRounds {
    /// Ordered, deduplicated, capped round list.
    pub rounds: Vec<RoundRecord>,
    /// Provenance summary of `rounds`.
    pub data_origin: DataOrigin,
    /// Number of rounds dropped by the cap.
    pub truncated: usize,
}

/// Combine authoritative server rounds with locally cached rounds.
///
/// A local round whose number already appears in `server_rounds` is dropped.
/// The result is sorted by round number, keeps the first entry for any
/// duplicated number, and never exceeds [`MAX_ROUNDS_PER_MATCH`] entries.
pub fn merge_rounds(server_rounds: &[RoundRecord], local_rounds: &[RoundRecord]) -> MergedRounds {
    let server_numbers: HashSet<u32> = server_rounds.iter().map(|round| round.round).collect();

    let mut rounds: Vec<RoundRecord> = server_rounds
        .iter()
        .chain(
            local_rounds
                .iter()
                .filter(|round| !server_numbers.contains(&round.round)),
        )
        .cloned()
        .collect();

    // Stable sort keeps server entries ahead of anything sharing their number.
    rounds.sort_by_key(|round| round.round);
    rounds.dedup_by_key(|round| round.round);

    let mut truncated = 0;
    if rounds.len() > MAX_ROUNDS_PER_MATCH {
        truncated = rounds.len() - MAX_ROUNDS_PER_MATCH;
        let dropped_rounds: Vec<u32> = rounds[MAX_ROUNDS_PER_MATCH..]
            .iter()
            .map(|r| r.round)
            .collect();
        warn!(
            kept = MAX_ROUNDS_PER_MATCH,
            dropped = truncated,
            ?dropped_rounds,
            "merged round list exceeds the round limit; truncating"
        );
        rounds.truncate(MAX_ROUNDS_PER_MATCH);
    }

    if !is_contiguous(&rounds) {
        let numbers: Vec<u32> = rounds.iter().map(|r| r.round).collect();
        warn!(
            rounds = ?numbers,
            "merged round numbers are not contiguous from 1"
        );
    }

    let data_origin = if rounds.iter().any(RoundRecord::is_authoritative) {
        DataOrigin::Server
    } else if rounds.is_empty() {
        DataOrigin::New
    } else {
        DataOrigin::Local
    };

    MergedRounds {
        rounds,
        data_origin,
        truncated,
    }
}

fn is_contiguous(rounds: &[RoundRecord]) -> bool {
    rounds
        .iter()
        .zip(1u32..)
        .all(|(round, expected)| round.round == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::rounds::Origin;

    fn round(number: u32, origin: Origin, team1: i32) -> RoundRecord {
        RoundRecord {
            id: i64::from(number) * 100 + if origin == Origin::Server { 1 } else { 2 },
            match_id: 9,
            round: number,
            note: String::new(),
            half: 1,
            team1_score: team1,
            team2_score: 5,
            log: Vec::new(),
            origin,
        }
    }

    #[test]
    fn server_round_supersedes_local_round() {
        let server = vec![round(1, Origin::Server, 11)];
        let local = vec![round(1, Origin::Local, 12), round(2, Origin::Local, 11)];

        let merged = merge_rounds(&server, &local);

        assert_eq!(merged.rounds, vec![server[0].clone(), local[1].clone()]);
        assert_eq!(merged.data_origin, DataOrigin::Server);
        assert_eq!(merged.truncated, 0);
    }

    #[test]
    fn every_shared_round_number_keeps_server_origin() {
        let server = vec![round(3, Origin::Server, 11), round(1, Origin::Server, 11)];
        let local = vec![
            round(1, Origin::Local, 13),
            round(2, Origin::Local, 11),
            round(3, Origin::Local, 14),
        ];

        let merged = merge_rounds(&server, &local);

        let numbers: Vec<u32> = merged.rounds.iter().map(|r| r.round).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(merged.rounds[0].origin, Origin::Server);
        assert_eq!(merged.rounds[1].origin, Origin::Local);
        assert_eq!(merged.rounds[2].origin, Origin::Server);
    }

    #[test]
    fn merge_is_idempotent() {
        let server = vec![round(2, Origin::Server, 11)];
        let local = vec![
            round(1, Origin::Local, 11),
            round(2, Origin::Local, 15),
            round(3, Origin::Local, 11),
        ];

        let once = merge_rounds(&server, &local);
        let twice = merge_rounds(&once.rounds, &local);

        assert_eq!(twice.rounds, once.rounds);
        assert_eq!(twice.data_origin, once.data_origin);
    }

    #[test]
    fn output_is_capped_at_round_limit() {
        let server = vec![round(1, Origin::Server, 11), round(2, Origin::Server, 11)];
        let local = vec![round(3, Origin::Local, 11), round(4, Origin::Local, 11)];

        let merged = merge_rounds(&server, &local);

        assert_eq!(merged.rounds.len(), MAX_ROUNDS_PER_MATCH);
        assert_eq!(merged.truncated, 1);
        assert_eq!(merged.rounds.last().map(|r| r.round), Some(3));
    }

    #[test]
    fn duplicated_local_numbers_collapse() {
        let local = vec![round(1, Origin::Local, 11), round(1, Origin::Local, 12)];

        let merged = merge_rounds(&[], &local);

        assert_eq!(merged.rounds, vec![local[0].clone()]);
        assert_eq!(merged.data_origin, DataOrigin::Local);
    }

    #[test]
    fn empty_sources_yield_new_match() {
        let merged = merge_rounds(&[], &[]);
        assert!(merged.rounds.is_empty());
        assert_eq!(merged.data_origin, DataOrigin::New);
    }
}
