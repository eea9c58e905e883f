//! Geometric predicates deciding whether an agent is eliminated.
//!
//! Both checks are pure functions of their arguments. Collision is instant elimination;
//! there is no damage model.

use crate::{body::AgentBody, config::WorldConfig, course::Obstacle};

/// Returns `true` if the agent left the vertical extent of the world.
///
/// The ceiling test uses the top edge of the agent's box, the floor test uses its
/// vertical center, so an agent is lost once half of it sinks below the floor.
#[must_use]
pub fn is_out_of_bounds(body: &AgentBody, world: &WorldConfig) -> bool {
    let y = body.position().y;
    y < 0.0 || y + world.agent_height / 2.0 > world.height
}

/// Returns `true` if the agent's box overlaps either solid region of `obstacle`.
#[must_use]
pub fn collides(body: &AgentBody, obstacle: &Obstacle, world: &WorldConfig) -> bool {
    let bounds = body.bounds(world);
    bounds.intersects(&obstacle.upper_region(world))
        || bounds.intersects(&obstacle.lower_region(world))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Cadence,
        course::{CourseSeed, ObstacleCourse},
        geometry::Position,
    };

    fn obstacle_at(world: &WorldConfig, x: f32) -> Obstacle {
        let mut course =
            ObstacleCourse::with_seed(*world, Cadence::new(1, 1), CourseSeed::from_u64(9));
        course.spawn();
        while course.obstacles()[0].x() > x {
            course.advance();
        }
        course.obstacles()[0]
    }

    #[test]
    fn test_bounds_edges() {
        let world = WorldConfig::default();
        let at = |y| AgentBody::at(Position::new(100.0, y));
        assert!(!is_out_of_bounds(&at(0.0), &world));
        assert!(is_out_of_bounds(&at(-0.5), &world));
        assert!(!is_out_of_bounds(&at(725.0), &world));
        assert!(is_out_of_bounds(&at(725.5), &world));
    }

    #[test]
    fn test_collides_with_upper_and_lower_regions() {
        let world = WorldConfig::default();
        let obstacle = obstacle_at(&world, 100.0);
        let gap_top = obstacle.gap_center() - world.gap_half();
        let gap_bottom = obstacle.gap_center() + world.gap_half();

        let in_upper = AgentBody::at(Position::new(100.0, gap_top - 10.0));
        let in_lower = AgentBody::at(Position::new(100.0, gap_bottom - 40.0));
        let in_gap = AgentBody::at(Position::new(100.0, gap_top + 50.0));
        let touching_top = AgentBody::at(Position::new(100.0, gap_top));
        let touching_bottom = AgentBody::at(Position::new(100.0, gap_bottom - 50.0));

        assert!(collides(&in_upper, &obstacle, &world));
        assert!(collides(&in_lower, &obstacle, &world));
        assert!(!collides(&in_gap, &obstacle, &world));
        assert!(!collides(&touching_top, &obstacle, &world));
        assert!(!collides(&touching_bottom, &obstacle, &world));
    }

    #[test]
    fn test_no_collision_when_horizontally_apart() {
        let world = WorldConfig::default();
        let obstacle = obstacle_at(&world, 500.0);
        let body = AgentBody::at(Position::new(100.0, 0.0));
        assert!(!collides(&body, &obstacle, &world));
    }

    #[test]
    fn test_collides_is_idempotent() {
        let world = WorldConfig::default();
        let obstacle = obstacle_at(&world, 120.0);
        for y in [0.0, 150.0, 300.0, 450.0, 600.0] {
            let body = AgentBody::at(Position::new(100.0, y));
            let first = collides(&body, &obstacle, &world);
            assert_eq!(first, collides(&body, &obstacle, &world));
        }
    }
}
