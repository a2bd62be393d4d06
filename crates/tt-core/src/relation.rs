//! Relationship scores between two players.
//!
//! The row lives in the side-table store and is mutated only by operations,
//! but the kernel reads it during invite-candidate scoring, so the plain
//! data shape sits here where both sides can reach it.

/// Directed relationship scores from one player toward another.
///
/// All scores are unbounded integers in practice clamped by the operations
/// that adjust them; the kernel only ever reads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relationship {
    pub trust:   i32,
    pub revenge: i32,
    pub loyalty: i32,
    pub fear:    i32,
}

impl Relationship {
    /// Invite-candidate base score:
    /// `50 + 0.5·trust − 2·revenge + 0.3·loyalty − 0.5·fear`.
    ///
    /// Distance attenuation is applied by the caller, which also excludes
    /// candidates with `revenge > 70` outright.
    pub fn invite_score(&self) -> f32 {
        50.0 + 0.5 * self.trust as f32 - 2.0 * self.revenge as f32
            + 0.3 * self.loyalty as f32
            - 0.5 * self.fear as f32
    }
}
