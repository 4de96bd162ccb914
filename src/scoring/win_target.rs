use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points added to the target to obtain the overtime cap.
pub const OVERTIME_MARGIN: i32 = 5;

/// Win-score preset configured on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinScoreSetting {
    /// Rounds are played to 11.
    #[default]
    Eleven,
    /// Rounds are played to 15.
    Fifteen,
    /// Rounds are played to 21.
    TwentyOne,
}

/// Raw codes used by the REST backend for each preset.
const WIN_SCORE_CODES: [(i32, WinScoreSetting); 3] = [
    (1, WinScoreSetting::Eleven),
    (2, WinScoreSetting::Fifteen),
    (3, WinScoreSetting::TwentyOne),
];

impl WinScoreSetting {
    /// Map a raw backend code to a preset. Unknown or missing codes fall back to the default.
    pub fn from_code(code: Option<i32>) -> Self {
        let Some(code) = code else {
            return Self::default();
        };

        WIN_SCORE_CODES
            .iter()
            .find(|(raw, _)| *raw == code)
            .map(|(_, setting)| *setting)
            .unwrap_or_else(|| {
                debug!(code, "unknown win-score code; using default target");
                Self::default()
            })
    }

    /// Raw backend code of the preset.
    pub fn code(self) -> i32 {
        WIN_SCORE_CODES
            .iter()
            .find(|(_, setting)| *setting == self)
            .map(|(raw, _)| *raw)
            .unwrap_or(1)
    }

    /// Points needed to win a round under this preset.
    pub fn target_score(self) -> i32 {
        match self {
            WinScoreSetting::Eleven => 11,
            WinScoreSetting::Fifteen => 15,
            WinScoreSetting::TwentyOne => 21,
        }
    }
}

/// Resolved thresholds used by win and game-point detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinTarget {
    /// Points a team needs, with a two-point margin, to win.
    pub target_score: i32,
    /// Score at which the round ends regardless of margin.
    pub overtime_limit: i32,
}

impl WinTarget {
    /// Resolve thresholds for a preset.
    pub fn resolve(setting: WinScoreSetting) -> Self {
        let target_score = setting.target_score();
        Self {
            target_score,
            overtime_limit: target_score + OVERTIME_MARGIN,
        }
    }
}

impl Default for WinTarget {
    fn default() -> Self {
        Self::resolve(WinScoreSetting::default())
    }
}

impl From<WinScoreSetting> for WinTarget {
    fn from(setting: WinScoreSetting) -> Self {
        Self::resolve(setting)
    }
}
