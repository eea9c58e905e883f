use serde::{Deserialize, Serialize};

use crate::{
    config::{PhysicsConfig, WorldConfig},
    geometry::{Position, Rect},
};

/// Movement chosen for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Action {
    /// Move up by the ascend step.
    Ascend,
    /// Move down by the (smaller) descend step.
    Descend,
    /// Stay in place.
    Hold,
}

/// Physical state of one agent.
///
/// The horizontal position never changes; only `y` moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    position: Position,
}

impl AgentBody {
    /// Places a body at the world's start position.
    #[must_use]
    pub fn spawn(world: &WorldConfig) -> Self {
        Self {
            position: world.agent_start(),
        }
    }

    #[must_use]
    pub const fn at(position: Position) -> Self {
        Self { position }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn bounds(&self, world: &WorldConfig) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            world.agent_width,
            world.agent_height,
        )
    }

    pub fn apply(&mut self, action: Action, physics: &PhysicsConfig) {
        match action {
            Action::Ascend => self.position.y -= physics.ascend_step,
            Action::Descend => self.position.y += physics.descend_step,
            Action::Hold => {}
        }
    }
}
