use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::scoring::{
    error::ScoringError,
    rounds::{PointEvent, Team},
    win_target::WinTarget,
};

/// Half marker a fresh session starts in.
const FIRST_HALF: u32 = 1;

/// Live state of the round currently being scored.
///
/// Invariant: each team's score equals the sum of its history entries and
/// never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSession {
    round: u32,
    team1_score: i32,
    team2_score: i32,
    history: Vec<PointEvent>,
    notes: String,
    half: u32,
}

impl ScoringSession {
    /// Start an empty session for round `round`.
    pub fn new(round: u32) -> Self {
        Self {
            round: round.max(1),
            team1_score: 0,
            team2_score: 0,
            history: Vec::new(),
            notes: String::new(),
            half: FIRST_HALF,
        }
    }

    /// Round number being scored.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Running total for `team`.
    pub fn score(&self, team: Team) -> i32 {
        match team {
            Team::One => self.team1_score,
            Team::Two => self.team2_score,
        }
    }

    /// Running total for team 1.
    pub fn team1_score(&self) -> i32 {
        self.team1_score
    }

    /// Running total for team 2.
    pub fn team2_score(&self) -> i32 {
        self.team2_score
    }

    /// Recorded point events, oldest first.
    pub fn history(&self) -> &[PointEvent] {
        &self.history
    }

    /// Scorer notes attached to the round.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Current half/phase marker.
    pub fn half(&self) -> u32 {
        self.half
    }

    /// True when nothing has been scored in this round.
    pub fn is_empty(&self) -> bool {
        self.team1_score == 0 && self.team2_score == 0 && self.history.is_empty()
    }

    /// Credit `points` to `team` and record the event.
    pub fn add_point(&mut self, team: Team, points: u32) -> Result<&PointEvent, ScoringError> {
        let delta = i32::try_from(points).map_err(|_| ScoringError::InvalidPoints)?;
        if delta == 0 {
            return Err(ScoringError::InvalidPoints);
        }
        self.record(team, delta, OffsetDateTime::now_utc())
    }

    /// Take one point away from `team`, recorded as a `-1` event.
    pub fn remove_point(&mut self, team: Team) -> Result<&PointEvent, ScoringError> {
        if self.score(team) < 1 {
            return Err(ScoringError::NegativeScore { team });
        }
        self.record(team, -1, OffsetDateTime::now_utc())
    }

    /// Pop the most recent event and reverse its effect.
    pub fn undo_last(&mut self) -> Result<PointEvent, ScoringError> {
        let event = self.history.pop().ok_or(ScoringError::UndoUnavailable)?;
        *self.score_mut(event.team) -= event.points;
        Ok(event)
    }

    /// Replace the scorer notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Move the live round to another number, keeping its points.
    pub fn set_round(&mut self, round: u32) {
        self.round = round.max(1);
    }

    /// Move the session to another half/phase.
    pub fn set_half(&mut self, half: u32) {
        self.half = half;
    }

    /// Team on game point, if any.
    pub fn game_point(&self, target: &WinTarget) -> Option<Team> {
        let target_score = i64::from(target.target_score);
        Team::ALL.into_iter().find(|team| {
            let own = i64::from(self.score(*team));
            let other = i64::from(self.score(team.other()));
            own >= target_score - 1 && own >= other + 1
        })
    }

    /// Team that has won the round, if any.
    ///
    /// A team wins by reaching the target with a two-point margin, or by
    /// reaching the overtime limit regardless of margin.
    pub fn winner(&self, target: &WinTarget) -> Option<Team> {
        let (target_score, overtime_limit) = (
            i64::from(target.target_score),
            i64::from(target.overtime_limit),
        );
        Team::ALL.into_iter().find(|team| {
            let own = i64::from(self.score(*team));
            let other = i64::from(self.score(team.other()));
            (own >= target_score && own >= other + 2) || own >= overtime_limit
        })
    }

    /// Clear scores, history, and notes, and move on to the next round.
    pub fn reset(&mut self) {
        self.team1_score = 0;
        self.team2_score = 0;
        self.history.clear();
        self.notes.clear();
        self.round += 1;
    }

    /// Check the totals against the history, used when restoring a snapshot.
    pub fn is_consistent(&self) -> bool {
        let total = |team: Team| -> i64 {
            self.history
                .iter()
                .filter(|event| event.team == team)
                .map(|event| i64::from(event.points))
                .sum()
        };

        self.round >= 1
            && self.team1_score >= 0
            && self.team2_score >= 0
            && total(Team::One) == i64::from(self.team1_score)
            && total(Team::Two) == i64::from(self.team2_score)
    }

    fn record(
        &mut self,
        team: Team,
        points: i32,
        timestamp: OffsetDateTime,
    ) -> Result<&PointEvent, ScoringError> {
        let next = self
            .score(team)
            .checked_add(points)
            .ok_or(ScoringError::InvalidPoints)?;
        if next < 0 {
            return Err(ScoringError::NegativeScore { team });
        }

        *self.score_mut(team) = next;
        self.history.push(PointEvent {
            team,
            points,
            timestamp,
        });
        Ok(&self.history[self.history.len() - 1])
    }

    fn score_mut(&mut self, team: Team) -> &mut i32 {
        match team {
            Team::One => &mut self.team1_score,
            Team::Two => &mut self.team2_score,
        }
    }
}

impl Default for ScoringSession {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::win_target::WinScoreSetting;

    fn eleven() -> WinTarget {
        WinTarget::resolve(WinScoreSetting::Eleven)
    }

    fn session_at(team1: u32, team2: u32) -> ScoringSession {
        let mut session = ScoringSession::new(1);
        for _ in 0..team1 {
            session.add_point(Team::One, 1).unwrap();
        }
        for _ in 0..team2 {
            session.add_point(Team::Two, 1).unwrap();
        }
        session
    }

    #[test]
    fn three_points_then_undo_leaves_two() {
        let mut session = ScoringSession::new(1);
        session.add_point(Team::One, 1).unwrap();
        session.add_point(Team::One, 1).unwrap();
        session.add_point(Team::One, 1).unwrap();

        let undone = session.undo_last().unwrap();

        assert_eq!(undone.team, Team::One);
        assert_eq!(session.team1_score(), 2);
        assert_eq!(session.history().len(), 2);
        assert!(session.is_consistent());
    }

    #[test]
    fn undo_restores_scores_before_last_event() {
        let mut session = ScoringSession::new(1);
        session.add_point(Team::One, 2).unwrap();
        session.add_point(Team::Two, 1).unwrap();
        session.add_point(Team::One, 3).unwrap();
        session.remove_point(Team::Two).unwrap();

        let before_last = (session.team1_score(), session.team2_score() + 1);
        session.undo_last().unwrap();
        assert_eq!((session.team1_score(), session.team2_score()), before_last);

        let before_last = (session.team1_score() - 3, session.team2_score());
        session.undo_last().unwrap();
        assert_eq!((session.team1_score(), session.team2_score()), before_last);
    }

    #[test]
    fn undo_on_empty_history_is_rejected() {
        let mut session = ScoringSession::new(1);
        assert_eq!(session.undo_last(), Err(ScoringError::UndoUnavailable));
        assert!(session.is_empty());
    }

    #[test]
    fn remove_point_below_zero_is_rejected() {
        let mut session = ScoringSession::new(1);
        assert_eq!(
            session.remove_point(Team::Two).unwrap_err(),
            ScoringError::NegativeScore { team: Team::Two }
        );
        assert!(session.history().is_empty());

        session.add_point(Team::Two, 1).unwrap();
        let event = session.remove_point(Team::Two).unwrap();
        assert_eq!(event.points, -1);
        assert_eq!(session.team2_score(), 0);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn zero_points_are_rejected() {
        let mut session = ScoringSession::new(1);
        assert_eq!(
            session.add_point(Team::One, 0).unwrap_err(),
            ScoringError::InvalidPoints
        );
        assert_eq!(
            session.add_point(Team::One, u32::MAX).unwrap_err(),
            ScoringError::InvalidPoints
        );
        assert!(session.is_empty());
    }

    #[test]
    fn winner_detection_at_eleven() {
        let target = eleven();
        assert_eq!(session_at(11, 9).winner(&target), Some(Team::One));
        assert_eq!(session_at(10, 9).winner(&target), None);
        assert_eq!(session_at(11, 10).winner(&target), None);
        assert_eq!(session_at(9, 11).winner(&target), Some(Team::Two));
        assert_eq!(session_at(13, 11).winner(&target), Some(Team::One));
    }

    #[test]
    fn overtime_limit_wins_without_margin() {
        let target = eleven();
        assert_eq!(session_at(16, 14).winner(&target), Some(Team::One));
        assert_eq!(session_at(16, 15).winner(&target), Some(Team::One));
        assert_eq!(session_at(15, 16).winner(&target), Some(Team::Two));
        assert_eq!(session_at(15, 14).winner(&target), None);
    }

    #[test]
    fn extreme_scores_are_judged_without_overflow() {
        let mut session = ScoringSession::new(1);
        session.add_point(Team::One, 20).unwrap();
        session.add_point(Team::Two, i32::MAX as u32).unwrap();

        assert_eq!(session.team2_score(), i32::MAX);
        assert_eq!(session.winner(&eleven()), Some(Team::Two));
        assert_eq!(session.game_point(&eleven()), Some(Team::Two));
        assert_eq!(
            session.add_point(Team::Two, 1).unwrap_err(),
            ScoringError::InvalidPoints
        );
    }

    #[test]
    fn game_point_needs_lead_and_target_minus_one() {
        let target = eleven();
        assert_eq!(session_at(10, 8).game_point(&target), Some(Team::One));
        assert_eq!(session_at(10, 10).game_point(&target), None);
        assert_eq!(session_at(9, 3).game_point(&target), None);
        assert_eq!(session_at(11, 12).game_point(&target), Some(Team::Two));
    }

    #[test]
    fn reset_clears_round_state_and_advances() {
        let mut session = session_at(11, 4);
        session.set_notes("net fault");
        session.set_half(2);

        session.reset();

        assert_eq!(session.round(), 2);
        assert!(session.is_empty());
        assert_eq!(session.notes(), "");
        assert_eq!(session.half(), 2);
    }

    #[test]
    fn snapshot_round_trips_and_detects_tampering() {
        let session = session_at(3, 2);
        let json = serde_json::to_string(&session).unwrap();
        let restored: ScoringSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
        assert!(restored.is_consistent());

        let tampered = json.replace("\"team1Score\":3", "\"team1Score\":7");
        let tampered: ScoringSession = serde_json::from_str(&tampered).unwrap();
        assert!(!tampered.is_consistent());
    }
}
