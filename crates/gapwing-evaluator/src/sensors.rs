use gapwing_engine::{Obstacle, Position, WorldConfig};

use crate::decision::SensorInputs;

/// Selects the obstacle whose upper region origin is closest to `position`.
///
/// Distances are Euclidean. On a tie the obstacle that appears first in `obstacles`
/// (the earliest created) wins.
#[must_use]
pub fn nearest_obstacle<'a>(
    position: Position,
    obstacles: &'a [Obstacle],
    world: &WorldConfig,
) -> Option<&'a Obstacle> {
    let mut nearest: Option<(&Obstacle, f32)> = None;
    for obstacle in obstacles {
        let distance = position.distance(obstacle.upper_region(world).origin());
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((obstacle, distance));
        }
    }
    nearest.map(|(obstacle, _)| obstacle)
}

impl SensorInputs {
    /// Inputs describing `obstacle` as seen from `position`.
    #[must_use]
    pub fn observe(position: Position, obstacle: &Obstacle, world: &WorldConfig) -> Self {
        let top = obstacle.upper_region(world).origin();
        let bottom = obstacle.lower_region(world).origin();
        Self {
            agent_y: position.y,
            top_x: top.x,
            top_y: top.y,
            bottom_x: bottom.x,
            bottom_y: bottom.y,
        }
    }

    /// Inputs for a course without obstacles: a "gap" spanning the whole world at its
    /// right edge.
    #[must_use]
    pub fn empty_course(position: Position, world: &WorldConfig) -> Self {
        Self {
            agent_y: position.y,
            top_x: world.width,
            top_y: 0.0,
            bottom_x: world.width,
            bottom_y: world.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use gapwing_engine::{Cadence, ObstacleCourse, course::CourseSeed};

    use super::*;

    fn course_with_spacing(
        world: WorldConfig,
        count: usize,
        moves_between: usize,
    ) -> ObstacleCourse {
        let mut course =
            ObstacleCourse::with_seed(world, Cadence::new(1, 1), CourseSeed::from_u64(21));
        for _ in 0..count {
            course.spawn();
            for _ in 0..moves_between {
                course.advance();
            }
        }
        course
    }

    #[test]
    fn test_no_obstacle() {
        let world = WorldConfig::default();
        assert!(nearest_obstacle(world.agent_start(), &[], &world).is_none());
    }

    #[test]
    fn test_nearest_is_closest_to_upper_origin() {
        let world = WorldConfig::default();
        let course = course_with_spacing(world, 3, 20);
        let xs = course.obstacles().iter().map(Obstacle::x).collect::<Vec<_>>();
        assert_eq!(xs, [400.0, 600.0, 800.0]);
        let nearest = nearest_obstacle(world.agent_start(), course.obstacles(), &world).unwrap();
        assert_eq!(nearest.id(), course.obstacles()[0].id());
    }

    #[test]
    fn test_passed_obstacle_loses_to_closer_one() {
        let world = WorldConfig::default();
        let course = course_with_spacing(world, 2, 60);
        // first at -200 (offscreen, pruned), second at 400
        assert_eq!(course.obstacles().len(), 1);

        let course = course_with_spacing(world, 2, 45);
        let xs = course.obstacles().iter().map(Obstacle::x).collect::<Vec<_>>();
        assert_eq!(xs, [100.0, 550.0]);
        let at = Position::new(100.0, 0.0);
        assert_eq!(
            nearest_obstacle(at, course.obstacles(), &world).map(Obstacle::id),
            Some(course.obstacles()[0].id())
        );
        let far_right = Position::new(400.0, 0.0);
        assert_eq!(
            nearest_obstacle(far_right, course.obstacles(), &world).map(Obstacle::id),
            Some(course.obstacles()[1].id())
        );
    }

    #[test]
    fn test_obstacle_behind_agent_can_be_nearest() {
        let world = WorldConfig::default();
        let course = course_with_spacing(world, 2, 45);
        let behind = &course.obstacles()[0];
        let at = Position::new(300.0, 0.0);
        assert!(behind.x() + world.obstacle_width < at.x);
        assert_eq!(
            nearest_obstacle(at, course.obstacles(), &world).map(Obstacle::id),
            Some(behind.id())
        );
    }

    #[test]
    fn test_tie_goes_to_earliest() {
        let world = WorldConfig::default();
        let course = course_with_spacing(world, 2, 20);
        let xs = course.obstacles().iter().map(Obstacle::x).collect::<Vec<_>>();
        assert_eq!(xs, [600.0, 800.0]);
        let midway = Position::new(700.0, 0.0);
        assert_eq!(
            nearest_obstacle(midway, course.obstacles(), &world).map(Obstacle::id),
            Some(course.obstacles()[0].id())
        );
    }

    #[test]
    fn test_observe_reports_region_origins() {
        let world = WorldConfig::default();
        let course = course_with_spacing(world, 1, 0);
        let obstacle = &course.obstacles()[0];
        let inputs = SensorInputs::observe(world.agent_start(), obstacle, &world);
        assert_eq!(inputs.agent_y, 200.0);
        assert_eq!(inputs.top_x, 1000.0);
        assert_eq!(inputs.top_y, 0.0);
        assert_eq!(inputs.bottom_x, 1000.0);
        assert_eq!(inputs.bottom_y, obstacle.gap_center() + 100.0);
    }
}
