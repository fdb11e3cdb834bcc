//! Edit instructions and the edit plan.

use serde::{Deserialize, Serialize};

/// Action carried by an edit instruction.
///
/// Decoding is strict: an unknown action string fails deserialization,
/// which routes the whole model response to the fallback plan instead
/// of being silently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    InsertBroll,
}

/// One b-roll insertion.
///
/// `clip_id` must equal the keyword of a resolved [`crate::BrollClip`];
/// the plan generator enforces that before a plan is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditInstruction {
    /// Always `insert_broll`
    pub action: EditAction,
    /// Where in the main video the b-roll starts, seconds
    pub timestamp: f64,
    /// How long the b-roll runs, seconds (2-5 s band is advisory)
    pub duration: f64,
    /// Keyword of the clip to insert
    pub clip_id: String,
}

/// Ordered set of insertions derived for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditPlan(pub Vec<EditInstruction>);

impl EditPlan {
    pub fn new(instructions: Vec<EditInstruction>) -> Self {
        Self(instructions)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn instructions(&self) -> &[EditInstruction] {
        &self.0
    }

    /// Instructions sorted by timestamp ascending, ties keeping their
    /// original order.
    pub fn sorted(&self) -> Vec<EditInstruction> {
        let mut instructions = self.0.clone();
        instructions.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        instructions
    }
}
