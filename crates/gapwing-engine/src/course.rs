use std::fmt;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    config::{Cadence, WorldConfig},
    geometry::Rect,
};

/// Identifier of an obstacle, increasing in creation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display,
)]
#[display("#{_0}")]
pub struct ObstacleId(u64);

/// A moving barrier pair with a passable gap.
///
/// Only the horizontal position changes after spawning; the gap is fixed for the
/// obstacle's lifetime. The two solid regions are derived from the world geometry:
///
/// ```text
///  x   x + obstacle_width
///  +---+ y = 0
///  |   |  upper region
///  +---+ gap_center - gap_width / 2
///
///  +---+ gap_center + gap_width / 2
///  |   |  lower region
///  +---+ y = world height + agent height
/// ```
///
/// The lower region reaches one agent height past the floor, so it keeps a positive
/// height even when the gap ends exactly at the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    id: ObstacleId,
    x: f32,
    gap_center: f32,
}

impl Obstacle {
    #[must_use]
    pub const fn id(&self) -> ObstacleId {
        self.id
    }

    /// Horizontal position of the obstacle's left edge.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub const fn gap_center(&self) -> f32 {
        self.gap_center
    }

    #[must_use]
    pub fn upper_region(&self, world: &WorldConfig) -> Rect {
        Rect::new(
            self.x,
            0.0,
            world.obstacle_width,
            self.gap_center - world.gap_half(),
        )
    }

    #[must_use]
    pub fn lower_region(&self, world: &WorldConfig) -> Rect {
        let top = self.gap_center + world.gap_half();
        let bottom = world.height + world.agent_height;
        Rect::new(self.x, top, world.obstacle_width, bottom - top)
    }

    /// Returns `true` once the obstacle has fully left the world on the left side.
    #[must_use]
    pub fn is_offscreen(&self, world: &WorldConfig) -> bool {
        self.x + world.obstacle_width <= 0.0
    }
}

/// What happened to the course during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseTick {
    pub advanced: bool,
    pub spawned: Option<ObstacleId>,
    pub pruned: usize,
}

/// Seed for deterministic obstacle generation.
///
/// A 128-bit seed for the course's random number generator. Two courses built with the
/// same seed and world produce identical gap sequences. Serialized as a 32-character
/// hex string.
///
/// # Example
///
/// ```
/// use gapwing_engine::course::CourseSeed;
/// use rand::Rng as _;
///
/// let seed: CourseSeed = rand::rng().random();
/// let fixed = CourseSeed::from_u64(42);
/// assert_ne!(fixed, CourseSeed::from_u64(43));
/// # let _ = seed;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CourseSeed([u8; 16]);

impl CourseSeed {
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(u128::from(value).to_be_bytes())
    }

    /// Derives the seed for the `index`-th course of a run.
    #[must_use]
    pub fn derive(self, index: u64) -> Self {
        const MIX: u128 = 0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835;
        let mixed = u128::from_be_bytes(self.0) ^ u128::from(index).wrapping_mul(MIX);
        Self(mixed.to_be_bytes())
    }

    /// Raw seed material, usable with any `SeedableRng` taking 16 bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for CourseSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Serialize for CourseSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CourseSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid seed: expected 32 hex characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid seed: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<CourseSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CourseSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        CourseSeed(seed)
    }
}

/// Spawns and moves obstacles on a fixed tick cadence.
///
/// The course owns its schedule: [`ObstacleCourse::on_tick`] is called once per tick
/// with the 1-based tick number and decides whether obstacles move and whether a new
/// one appears. Movement is applied before spawning, so a new obstacle first moves on
/// the following movement tick.
///
/// Obstacles are kept in creation order. Because every obstacle moves at the same speed,
/// creation order is also left-to-right order.
///
/// # Example
///
/// ```
/// use gapwing_engine::{Cadence, ObstacleCourse, WorldConfig, course::CourseSeed};
///
/// let world = WorldConfig::default();
/// let mut course = ObstacleCourse::with_seed(world, Cadence::new(1, 5), CourseSeed::from_u64(1));
/// for tick in 1..=5 {
///     course.on_tick(tick);
/// }
/// assert_eq!(course.obstacles().len(), 1);
/// assert_eq!(course.obstacles()[0].x(), world.width);
/// ```
#[derive(Debug, Clone)]
pub struct ObstacleCourse {
    world: WorldConfig,
    cadence: Cadence,
    rng: Pcg32,
    obstacles: Vec<Obstacle>,
    next_id: u64,
}

impl ObstacleCourse {
    /// Creates an empty course with a random seed.
    #[must_use]
    pub fn new(world: WorldConfig, cadence: Cadence) -> Self {
        Self::with_seed(world, cadence, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for a reproducible course.
    #[must_use]
    pub fn with_seed(world: WorldConfig, cadence: Cadence, seed: CourseSeed) -> Self {
        Self {
            world,
            cadence,
            rng: Pcg32::from_seed(seed.0),
            obstacles: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    /// Active obstacles in creation order.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Runs the cadence for `tick`.
    pub fn on_tick(&mut self, tick: u64) -> CourseTick {
        let mut result = CourseTick::default();
        if self.cadence.is_move_tick(tick) {
            result.advanced = true;
            result.pruned = self.advance();
        }
        if self.cadence.is_spawn_tick(tick) {
            result.spawned = Some(self.spawn());
        }
        result
    }

    /// Moves every obstacle left by one step and drops those that left the world.
    ///
    /// Returns the number of dropped obstacles.
    pub fn advance(&mut self) -> usize {
        for obstacle in &mut self.obstacles {
            obstacle.x -= self.world.move_step;
        }
        let before = self.obstacles.len();
        let world = &self.world;
        self.obstacles.retain(|obstacle| !obstacle.is_offscreen(world));
        before - self.obstacles.len()
    }

    /// Adds an obstacle at the right edge of the world.
    ///
    /// The gap center is a whole number drawn uniformly from the gap center range.
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn spawn(&mut self) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;
        let (min, max) = self.world.gap_center_steps();
        let gap_center = self.rng.random_range(min as i64..=max as i64) as f32;
        self.obstacles.push(Obstacle {
            id,
            x: self.world.width,
            gap_center,
        });
        id
    }
}
