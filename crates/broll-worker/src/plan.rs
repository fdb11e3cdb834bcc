//! Edit-plan generation stage.
//!
//! Asks the model to place the resolved clips on the main video's
//! timeline. The reply is decoded strictly and checked for referential
//! integrity against the resolved clip set; any rejection routes to the
//! deterministic fallback plan.

use std::collections::HashSet;

use tracing::warn;

use broll_models::{BrollClip, EditAction, EditInstruction, EditPlan};

use crate::error::PipelineResult;
use crate::llm_json::{self, ModelResponseError};
use crate::services::Completion;

/// Fallback duration cap, seconds.
const FALLBACK_MAX_DURATION: f64 = 3.0;

const PLAN_SYSTEM_PROMPT: &str = "You are a video editor placing stock cutaway clips into a \
main video. Respond with a JSON array only, no prose, no markdown. Each element must be an \
object with exactly four keys: \"action\" (always the string \"insert_broll\"), \"timestamp\" \
(seconds into the main video where the cutaway starts, as a number), \"duration\" (seconds \
the cutaway runs, as a number, ideally between 2 and 5), and \"clip_id\" (the keyword of one \
of the available clips, verbatim). Only reference clips from the provided list.";

/// Generate an edit plan for the resolved clips.
///
/// An empty clip set short-circuits to an empty plan without calling
/// the model. Upstream failures propagate; malformed or unreferenced
/// replies are logged and replaced by [`fallback_plan`].
pub async fn generate(
    completion: &dyn Completion,
    transcript: &str,
    clips: &[BrollClip],
) -> PipelineResult<EditPlan> {
    if clips.is_empty() {
        return Ok(EditPlan::default());
    }

    let user_prompt = format!(
        "Transcript:\n{}\n\nAvailable clips (JSON):\n{}",
        transcript,
        serde_json::to_string(clips).unwrap_or_default()
    );
    let reply = completion.complete(PLAN_SYSTEM_PROMPT, &user_prompt).await?;
    match parse_plan(&reply, clips) {
        Ok(plan) => Ok(plan),
        Err(reason) => {
            warn!("edit plan reply rejected ({}), using fallback", reason);
            Ok(fallback_plan(clips))
        }
    }
}

/// Decode and validate a model reply as an edit plan.
///
/// Strict decode already enforces the four-key shape and the known
/// action string; this adds clip referential integrity and the
/// advisory duration band.
fn parse_plan(raw: &str, clips: &[BrollClip]) -> Result<EditPlan, ModelResponseError> {
    let instructions: Vec<EditInstruction> = llm_json::decode(raw)?;
    let known: HashSet<&str> = clips.iter().map(|c| c.keyword.as_str()).collect();

    for instruction in &instructions {
        if !known.contains(instruction.clip_id.as_str()) {
            return Err(ModelResponseError::schema(format!(
                "unknown clip_id '{}'",
                instruction.clip_id
            )));
        }
        if !instruction.timestamp.is_finite() || instruction.timestamp < 0.0 {
            return Err(ModelResponseError::schema(format!(
                "bad timestamp {} for clip '{}'",
                instruction.timestamp, instruction.clip_id
            )));
        }
        if !instruction.duration.is_finite() || instruction.duration <= 0.0 {
            return Err(ModelResponseError::schema(format!(
                "bad duration {} for clip '{}'",
                instruction.duration, instruction.clip_id
            )));
        }
        if !(2.0..=5.0).contains(&instruction.duration) {
            warn!(
                "duration {:.1}s for clip '{}' outside the 2-5s band",
                instruction.duration, instruction.clip_id
            );
        }
    }
    Ok(EditPlan::new(instructions))
}

/// One insertion per resolved clip, at the clip's own timestamp, capped
/// at three seconds.
pub fn fallback_plan(clips: &[BrollClip]) -> EditPlan {
    EditPlan::new(
        clips
            .iter()
            .map(|clip| EditInstruction {
                action: EditAction::InsertBroll,
                timestamp: clip.timestamp,
                duration: FALLBACK_MAX_DURATION.min(clip.duration),
                clip_id: clip.keyword.clone(),
            })
            .collect(),
    )
}
