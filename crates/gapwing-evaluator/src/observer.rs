//! Read-only hooks into a running generation.
//!
//! An observer sees the state after each completed tick and every finished agent. It
//! cannot influence the simulation; rendering, progress reporting and trace capture all
//! sit on this side of the boundary.

use gapwing_engine::{Obstacle, Position, WorldConfig};

use crate::generation::{AgentId, AgentOutcome};

/// A live agent as seen at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub position: Position,
    pub fitness: f64,
}

/// World state at the end of one tick, after eliminated agents were removed.
#[derive(Debug, Clone)]
pub struct TickSnapshot<'a> {
    pub tick: u64,
    pub agents: Vec<AgentView>,
    pub obstacles: &'a [Obstacle],
    pub world: &'a WorldConfig,
}

pub trait GenerationObserver {
    /// Whether [`Self::on_tick`] should be called. Building snapshots is skipped when
    /// this returns `false`.
    fn wants_snapshots(&self) -> bool {
        true
    }

    fn on_tick(&mut self, _snapshot: &TickSnapshot<'_>) {}

    fn on_agent_finished(&mut self, _outcome: &AgentOutcome) {}
}

impl GenerationObserver for () {
    fn wants_snapshots(&self) -> bool {
        false
    }
}

impl<T> GenerationObserver for &mut T
where
    T: GenerationObserver + ?Sized,
{
    fn wants_snapshots(&self) -> bool {
        (**self).wants_snapshots()
    }

    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        (**self).on_tick(snapshot);
    }

    fn on_agent_finished(&mut self, outcome: &AgentOutcome) {
        (**self).on_agent_finished(outcome);
    }
}

/// Records every snapshot's alive count and obstacle positions.
///
/// Mostly useful in tests and for dumping a trace of a run.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    pub ticks: Vec<TraceEntry>,
    pub finished: Vec<AgentOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub tick: u64,
    pub alive: usize,
    pub obstacle_xs: Vec<f32>,
}

impl GenerationObserver for TraceRecorder {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        self.ticks.push(TraceEntry {
            tick: snapshot.tick,
            alive: snapshot.agents.len(),
            obstacle_xs: snapshot.obstacles.iter().map(Obstacle::x).collect(),
        });
    }

    fn on_agent_finished(&mut self, outcome: &AgentOutcome) {
        self.finished.push(outcome.clone());
    }
}
