//! Assertions over drained worker messages.

use anvil_types::{FeatureId, FeatureStatus};
use worker_bridge::ResultMessage;

/// The single rebuild-complete in a batch; panics if there is not
/// exactly one.
pub fn rebuild_complete(messages: &[ResultMessage]) -> &ResultMessage {
    let completes: Vec<&ResultMessage> = messages
        .iter()
        .filter(|m| matches!(m, ResultMessage::RebuildComplete { .. }))
        .collect();
    assert_eq!(
        completes.len(),
        1,
        "expected exactly one rebuild-complete, got {}",
        completes.len()
    );
    completes[0]
}

pub fn body_count(messages: &[ResultMessage]) -> usize {
    match rebuild_complete(messages) {
        ResultMessage::RebuildComplete { bodies, .. } => bodies.len(),
        _ => unreachable!(),
    }
}

pub fn face_counts(messages: &[ResultMessage]) -> Vec<u32> {
    match rebuild_complete(messages) {
        ResultMessage::RebuildComplete { bodies, .. } => {
            bodies.iter().map(|b| b.face_count).collect()
        }
        _ => unreachable!(),
    }
}

pub fn error_count(messages: &[ResultMessage]) -> usize {
    match rebuild_complete(messages) {
        ResultMessage::RebuildComplete { errors, .. } => errors.len(),
        _ => unreachable!(),
    }
}

pub fn status_of(messages: &[ResultMessage], feature: FeatureId) -> FeatureStatus {
    match rebuild_complete(messages) {
        ResultMessage::RebuildComplete { status, .. } => status[&feature],
        _ => unreachable!(),
    }
}

/// Check the per-rebuild emission order: rebuild-start before any mesh,
/// rebuild-complete after every sketch-solved, meshes after complete.
pub fn assert_message_order(messages: &[ResultMessage]) {
    let position = |pred: fn(&ResultMessage) -> bool| messages.iter().position(pred);
    let start = position(|m| matches!(m, ResultMessage::RebuildStart));
    let complete = position(|m| matches!(m, ResultMessage::RebuildComplete { .. }));
    if let (Some(start), Some(complete)) = (start, complete) {
        for (i, msg) in messages.iter().enumerate() {
            match msg {
                ResultMessage::Mesh { .. } => {
                    assert!(i > start, "mesh before rebuild-start");
                    assert!(i > complete, "mesh before rebuild-complete");
                }
                ResultMessage::SketchSolved { .. } => {
                    assert!(i > start && i < complete, "sketch-solved out of order");
                }
                _ => {}
            }
        }
    }
}
