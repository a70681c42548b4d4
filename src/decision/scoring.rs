//! Candidate scoring for both strategies.

use crate::blackboard::KeyStore;
use crate::core::{State, Utility};
use crate::decision::transition::{Scoring, Transition};
use std::collections::HashMap;
use tracing::trace;

/// Score one candidate, `None` when it is gated out or has no usable score.
pub(crate) fn score<S: State, C: KeyStore>(
    scoring: Scoring,
    transition: &Transition<S>,
    utilities: &HashMap<S, Utility<C>>,
    ctx: &C,
) -> Option<f32> {
    if !conditions_hold(transition, ctx) {
        return None;
    }

    let score = match scoring {
        Scoring::Averaged => averaged(transition, ctx)?,
        Scoring::Utility => match utilities.get(&transition.to) {
            Some(utility) => utility.score(ctx),
            None => {
                trace!(target_state = transition.to.name(), "no utility registered for target");
                return None;
            }
        },
    };

    (!score.is_nan()).then_some(score)
}

fn conditions_hold<S: State, C: KeyStore>(transition: &Transition<S>, ctx: &C) -> bool {
    transition.conditions.iter().all(|key| match ctx.get_bool(key) {
        Some(value) => value,
        None => {
            trace!(key = key.as_str(), "condition key missing, treated as false");
            false
        }
    })
}

fn averaged<S: State, C: KeyStore>(transition: &Transition<S>, ctx: &C) -> Option<f32> {
    if transition.evaluations.is_empty() {
        return Some(0.0);
    }

    let mut sum = 0.0;
    let mut resolved = 0u32;
    for key in &transition.evaluations {
        match ctx.get_f32(key) {
            Some(value) => {
                sum += value;
                resolved += 1;
            }
            None => trace!(key = key.as_str(), "evaluation key missing, skipped"),
        }
    }

    (resolved > 0).then(|| sum / resolved as f32)
}
