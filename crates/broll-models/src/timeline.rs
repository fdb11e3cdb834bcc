//! Assembly timeline derivation.
//!
//! Turns an edit plan plus the main video duration into the ordered
//! segment list the renderer concatenates. Pure and single-pass: sort
//! the instructions, walk a cursor, emit main-video gaps and b-roll
//! slices, then a trailing main segment if anything is left.

use crate::plan::EditPlan;

/// One slice of the assembled output.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineSegment {
    /// Half-open slice `[start, end)` of the main video
    Main { start: f64, end: f64 },
    /// Slice `[0, duration)` of a b-roll clip, rendered with a fade-in
    Broll { clip_id: String, duration: f64 },
}

impl TimelineSegment {
    /// Length of this segment in seconds.
    pub fn length(&self) -> f64 {
        match self {
            TimelineSegment::Main { start, end } => end - start,
            TimelineSegment::Broll { duration, .. } => *duration,
        }
    }
}

/// Derive the assembly timeline for a plan over a main video of
/// `main_duration` seconds.
///
/// Invariants upheld:
/// - the cursor is monotonically non-decreasing and never exceeds
///   `main_duration`;
/// - an instruction at or before the cursor emits no preceding main
///   segment (b-roll can sit back-to-back);
/// - instructions past the end of the main video still insert their
///   b-roll, with the preceding gap clamped to the video end.
pub fn build_timeline(plan: &EditPlan, main_duration: f64) -> Vec<TimelineSegment> {
    let mut segments = Vec::with_capacity(plan.len() * 2 + 1);
    let mut cursor: f64 = 0.0;

    for instruction in plan.sorted() {
        let gap_end = instruction.timestamp.min(main_duration);
        if gap_end > cursor {
            segments.push(TimelineSegment::Main {
                start: cursor,
                end: gap_end,
            });
        }

        segments.push(TimelineSegment::Broll {
            clip_id: instruction.clip_id.clone(),
            duration: instruction.duration,
        });

        let resume = (instruction.timestamp + instruction.duration).min(main_duration);
        cursor = cursor.max(resume);
    }

    if cursor < main_duration {
        segments.push(TimelineSegment::Main {
            start: cursor,
            end: main_duration,
        });
    }

    segments
}

/// Total covered length of a timeline in seconds.
pub fn covered_length(segments: &[TimelineSegment]) -> f64 {
    segments.iter().map(TimelineSegment::length).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{EditAction, EditInstruction};

    fn insert(timestamp: f64, duration: f64, clip_id: &str) -> EditInstruction {
        EditInstruction {
            action: EditAction::InsertBroll,
            timestamp,
            duration,
            clip_id: clip_id.to_string(),
        }
    }

    #[test]
    fn mountain_river_scenario() {
        // main[0,10) broll(mountain,3s) main[13,25) broll(river,3s) main[28,end)
        let plan = EditPlan::new(vec![
            insert(10.0, 3.0, "mountain"),
            insert(25.0, 3.0, "river"),
        ]);
        let segments = build_timeline(&plan, 40.0);

        assert_eq!(
            segments,
            vec![
                TimelineSegment::Main { start: 0.0, end: 10.0 },
                TimelineSegment::Broll { clip_id: "mountain".into(), duration: 3.0 },
                TimelineSegment::Main { start: 13.0, end: 25.0 },
                TimelineSegment::Broll { clip_id: "river".into(), duration: 3.0 },
                TimelineSegment::Main { start: 28.0, end: 40.0 },
            ]
        );
    }

    #[test]
    fn empty_plan_yields_whole_main_video() {
        let segments = build_timeline(&EditPlan::default(), 37.5);
        assert_eq!(
            segments,
            vec![TimelineSegment::Main { start: 0.0, end: 37.5 }]
        );
    }

    #[test]
    fn back_to_back_broll_emits_no_gap() {
        let plan = EditPlan::new(vec![
            insert(10.0, 3.0, "mountain"),
            insert(11.0, 2.0, "river"), // at or before cursor (13)
        ]);
        let segments = build_timeline(&plan, 30.0);
        assert_eq!(
            segments,
            vec![
                TimelineSegment::Main { start: 0.0, end: 10.0 },
                TimelineSegment::Broll { clip_id: "mountain".into(), duration: 3.0 },
                TimelineSegment::Broll { clip_id: "river".into(), duration: 2.0 },
                TimelineSegment::Main { start: 13.0, end: 30.0 },
            ]
        );
    }

    #[test]
    fn instruction_at_zero_emits_no_leading_gap() {
        let plan = EditPlan::new(vec![insert(0.0, 3.0, "intro")]);
        let segments = build_timeline(&plan, 10.0);
        assert_eq!(
            segments,
            vec![
                TimelineSegment::Broll { clip_id: "intro".into(), duration: 3.0 },
                TimelineSegment::Main { start: 3.0, end: 10.0 },
            ]
        );
    }

    #[test]
    fn instruction_past_end_clamps_cursor() {
        let plan = EditPlan::new(vec![insert(9.0, 4.0, "outro")]);
        let segments = build_timeline(&plan, 10.0);
        // Gap up to 9, broll, cursor clamps to 10 so no trailing segment.
        assert_eq!(
            segments,
            vec![
                TimelineSegment::Main { start: 0.0, end: 9.0 },
                TimelineSegment::Broll { clip_id: "outro".into(), duration: 4.0 },
            ]
        );
    }

    #[test]
    fn unsorted_plan_is_ordered_by_timestamp() {
        let plan = EditPlan::new(vec![
            insert(25.0, 3.0, "river"),
            insert(10.0, 3.0, "mountain"),
        ]);
        let segments = build_timeline(&plan, 40.0);
        assert_eq!(
            segments[1],
            TimelineSegment::Broll { clip_id: "mountain".into(), duration: 3.0 }
        );
        assert_eq!(
            segments[3],
            TimelineSegment::Broll { clip_id: "river".into(), duration: 3.0 }
        );
    }

    #[test]
    fn segment_count_and_coverage_properties() {
        let plan = EditPlan::new(vec![
            insert(10.0, 3.0, "a"),
            insert(25.0, 2.0, "b"),
            insert(26.0, 4.0, "c"), // back-to-back, no gap before it
        ]);
        let main_duration = 60.0;
        let segments = build_timeline(&plan, main_duration);

        // gaps: [0,10), [13,25); instructions: 3; trailing: [31,60)
        let gaps = 2;
        let trailing = 1;
        assert_eq!(segments.len(), gaps + plan.len() + trailing);

        let broll_total: f64 = plan.instructions().iter().map(|i| i.duration).sum();
        let covered = covered_length(&segments);
        assert!((covered - (main_duration + broll_total)).abs() < 1e-9);
    }

    #[test]
    fn cursor_is_monotone_and_bounded() {
        let plan = EditPlan::new(vec![
            insert(5.0, 10.0, "long"),
            insert(6.0, 1.0, "short"), // would rewind a naive cursor
        ]);
        let segments = build_timeline(&plan, 20.0);
        // Main segments must be disjoint and in order.
        let mut last_end = 0.0;
        for segment in &segments {
            if let TimelineSegment::Main { start, end } = segment {
                assert!(*start >= last_end);
                assert!(end > start);
                assert!(*end <= 20.0);
                last_end = *end;
            }
        }
    }
}
