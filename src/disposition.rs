//! Dynamic disposition records — directed affinity between characters.
//!
//! A [`DispositionRecord`] tracks four dimensions of how one character feels
//! toward another, each clamped to `[-100, 100]` on every write, with a
//! bounded history of the gameplay deltas that produced the current state.
//! Records are created lazily on the first delta and mutated only through
//! [`DispositionRecord::apply`]. At recall time a record is projected into the
//! merged graph as a synthetic `approves` edge — it is never persisted as a
//! graph edge.

use serde::{Deserialize, Serialize};

pub const DISPOSITION_MIN: i32 = -100;
pub const DISPOSITION_MAX: i32 = 100;

/// Additive changes to apply to a disposition; absent dimensions are
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispositionDeltas {
    pub approval: Option<i32>,
    pub trust: Option<i32>,
    pub fear: Option<i32>,
    pub romance: Option<i32>,
}

/// One history entry: what changed, why, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispositionEvent {
    pub deltas: DispositionDeltas,
    pub reason: String,
    /// In-game day the event fired, if the caller tracks one.
    pub day: Option<u32>,
    /// Wall-clock RFC 3339 timestamp of the write.
    pub at: String,
}

/// Directed multi-dimensional affinity from `character_id` toward
/// `target_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispositionRecord {
    pub character_id: String,
    pub target_id: String,
    pub approval: i32,
    pub trust: i32,
    pub fear: i32,
    pub romance: i32,
    pub history: Vec<DispositionEvent>,
}

impl DispositionRecord {
    /// A fresh neutral record, created lazily on the first delta.
    pub fn neutral(character_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            target_id: target_id.into(),
            approval: 0,
            trust: 0,
            fear: 0,
            romance: 0,
            history: Vec::new(),
        }
    }

    /// Apply deltas additively, clamp every dimension to `[-100, 100]`, and
    /// append a history entry. History is bounded: once `history_cap` is
    /// exceeded the oldest entries are dropped.
    pub fn apply(
        &mut self,
        deltas: &DispositionDeltas,
        reason: &str,
        day: Option<u32>,
        history_cap: usize,
    ) {
        if let Some(d) = deltas.approval {
            self.approval = clamp_dimension(self.approval, d);
        }
        if let Some(d) = deltas.trust {
            self.trust = clamp_dimension(self.trust, d);
        }
        if let Some(d) = deltas.fear {
            self.fear = clamp_dimension(self.fear, d);
        }
        if let Some(d) = deltas.romance {
            self.romance = clamp_dimension(self.romance, d);
        }

        self.history.push(DispositionEvent {
            deltas: deltas.clone(),
            reason: reason.to_string(),
            day,
            at: chrono::Utc::now().to_rfc3339(),
        });
        if self.history.len() > history_cap {
            let excess = self.history.len() - history_cap;
            self.history.drain(..excess);
        }
    }

    /// Weight of the synthetic `approves` edge: `(approval + 100) / 200`,
    /// clamped to `[0.0, 1.0]`.
    pub fn approves_weight(&self) -> f64 {
        ((self.approval + 100) as f64 / 200.0).clamp(0.0, 1.0)
    }
}

fn clamp_dimension(current: i32, delta: i32) -> i32 {
    current
        .saturating_add(delta)
        .clamp(DISPOSITION_MIN, DISPOSITION_MAX)
}
