//! Scripted fault-tolerance lesson
//!
//! Builds a small friendship network, picks a route between two students
//! and then knocks students out to show how the route adapts.

use serde::Serialize;
use tracing::info;

use nodes_core::{CoreError, GraphStore, NodeId, Position, TapOutcome};
use nodes_state_inmemory::SAMPLE_STUDENTS;

/// One observation made during the lesson
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonStep {
    /// What just happened
    pub title: &'static str,
    /// Names along the displayed route; empty when there is none
    pub path: Vec<String>,
    /// Number of simple routes among active students
    pub alternatives: usize,
}

/// Everything the lesson observed, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LessonReport {
    /// Observations in the order they were made
    pub steps: Vec<LessonStep>,
}

impl LessonReport {
    /// Route recorded for the step with `title`
    pub fn path_at(&self, title: &str) -> Option<&[String]> {
        self.steps
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.path.as_slice())
    }
}

struct Cast {
    alice: NodeId,
    bob: NodeId,
    charlie: NodeId,
    diana: NodeId,
    eve: NodeId,
}

/// Find each sample student by name, adding any that are missing
fn cast(store: &mut GraphStore) -> Cast {
    let ids: Vec<NodeId> = SAMPLE_STUDENTS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let existing = store.nodes().find(|n| n.name == *name).map(|n| n.id);
            existing.unwrap_or_else(|| {
                let offset = 100.0 + 50.0 * i as f64;
                store.add_node(*name, Position::new(offset, offset)).id
            })
        })
        .collect();

    Cast {
        alice: ids[0],
        bob: ids[1],
        charlie: ids[2],
        diana: ids[3],
        eve: ids[4],
    }
}

fn observe(store: &GraphStore, title: &'static str, from: NodeId, to: NodeId) -> LessonStep {
    let path: Vec<String> = store
        .current_path()
        .iter()
        .filter_map(|id| store.node(*id).map(|n| n.name.clone()))
        .collect();
    let alternatives = store.all_simple_paths(from, to).len();

    info!(step = title, route = %path.join(" -> "), alternatives, "Lesson step");
    LessonStep {
        title,
        path,
        alternatives,
    }
}

/// Run the walkthrough against `store`, leaving every mode off at the end
pub fn run_lesson(store: &mut GraphStore) -> Result<LessonReport, CoreError> {
    let c = cast(store);
    for id in [c.alice, c.bob, c.charlie, c.diana, c.eve] {
        store.set_active(id, true);
    }

    // The first friendship is drawn the way a user would: tap, tap, label.
    store.set_path_finding_mode(false);
    store.set_multi_select_mode(false);
    store.tap_node(c.alice);
    store.tap_node(c.bob);
    store.commit_connection("Chess")?;

    store.add_connection(c.bob, c.charlie, "Soccer");
    store.add_connection(c.charlie, c.diana, "Music");
    store.add_connection(c.alice, c.eve, "Art");
    store.add_connection(c.eve, c.diana, "Robotics");

    let mut report = LessonReport::default();
    let (from, to) = (c.alice, c.diana);

    store.set_path_finding_mode(true);
    store.tap_node(from);
    if let TapOutcome::Path(outcome) = store.tap_node(to) {
        info!(?outcome, "Selected route endpoints");
    }
    report.steps.push(observe(store, "route selected", from, to));

    store.set_active(c.eve, false);
    report.steps.push(observe(store, "eve absent", from, to));

    store.set_active(c.charlie, false);
    report.steps.push(observe(store, "charlie absent", from, to));

    store.undo();
    report.steps.push(observe(store, "charlie back", from, to));

    store.set_multi_select_mode(true);
    store.tap_node(c.bob);
    store.tap_node(c.charlie);
    store.deactivate_selected_nodes();
    report.steps.push(observe(store, "bob and charlie absent", from, to));

    store.set_multi_select_mode(true);
    store.tap_node(c.bob);
    store.tap_node(c.charlie);
    store.tap_node(c.eve);
    store.activate_selected_nodes();
    report.steps.push(observe(store, "everyone back", from, to));

    store.set_path_finding_mode(false);
    Ok(report)
}
