use super::math::{Aabb, Vec2};
use super::tile_world::{CellCoord, TileWorld};
use super::tuning::PhysicsTuning;

// Shrinks the scanned span so a body resting exactly on a tile edge does not
// count the neighbouring row or column as overlapped.
const EDGE_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blocked {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Contacts produced by the most recent `integrate` call. Rebuilt from
/// scratch every step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contacts {
    pub blocked: Blocked,
    pub ground_cells: Vec<CellCoord>,
}

impl Contacts {
    fn clear(&mut self) {
        self.blocked = Blocked::default();
        self.ground_cells.clear();
    }
}

/// Player-sized box driven by acceleration, drag, and gravity, resolved
/// against a `TileWorld` one axis at a time. `position` is the box center.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    drag_x: f32,
    size: Vec2,
    grounded: bool,
    world_bounds: Option<Aabb>,
    contacts: Contacts,
}

impl KinematicBody {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag_x: 0.0,
            size,
            grounded: false,
            world_bounds: None,
            contacts: Contacts::default(),
        }
    }

    pub fn with_world_bounds(mut self, bounds: Aabb) -> Self {
        self.world_bounds = Some(bounds);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn drag_x(&self) -> f32 {
        self.drag_x
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn contacts(&self) -> &Contacts {
        &self.contacts
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }

    /// Replaces the current acceleration; it persists until changed.
    pub fn apply_acceleration(&mut self, ax: f32, ay: f32) {
        self.acceleration = Vec2::new(ax, ay);
    }

    pub fn apply_drag(&mut self, drag_x: f32) {
        self.drag_x = drag_x;
    }

    pub fn set_velocity_y(&mut self, vy: f32) {
        self.velocity.y = vy;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Puts the body at `position` at rest with no contacts.
    pub fn reset_to(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.drag_x = 0.0;
        self.grounded = false;
        self.contacts.clear();
    }

    pub fn integrate(&mut self, dt: f32, world: &TileWorld, tuning: &PhysicsTuning) {
        self.contacts.clear();
        self.grounded = false;
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        self.velocity.x = step_horizontal_velocity(
            self.velocity.x,
            self.acceleration.x,
            self.drag_x,
            dt,
        );
        self.velocity.y += (self.acceleration.y + tuning.gravity) * dt;
        self.velocity.x = self
            .velocity
            .x
            .clamp(-tuning.max_velocity.x, tuning.max_velocity.x);
        self.velocity.y = self
            .velocity
            .y
            .clamp(-tuning.max_velocity.y, tuning.max_velocity.y);
        // Left for the caller to detect and recover.
        if !self.is_finite() {
            return;
        }

        let delta = self.velocity * dt;
        self.resolve_x(delta.x, world);
        self.resolve_y(delta.y, world);
        self.clamp_to_world_bounds();
    }

    fn resolve_x(&mut self, dx: f32, world: &TileWorld) {
        if dx == 0.0 {
            return;
        }
        let half = self.size * 0.5;
        let row_min = world.world_to_cell_y(self.position.y - half.y + EDGE_EPSILON);
        let row_max = world.world_to_cell_y(self.position.y + half.y - EDGE_EPSILON);
        let target = self.position.x + dx;

        if dx > 0.0 {
            let from = world.world_to_cell_x(self.position.x + half.x - EDGE_EPSILON);
            let to = world.world_to_cell_x(target + half.x - EDGE_EPSILON);
            for column in from.saturating_add(1)..=to {
                if (row_min..=row_max).any(|row| world.is_solid(column, row)) {
                    self.position.x = (world.cell_left(column) - half.x).max(self.position.x);
                    self.velocity.x = 0.0;
                    self.contacts.blocked.right = true;
                    return;
                }
            }
        } else {
            let from = world.world_to_cell_x(self.position.x - half.x + EDGE_EPSILON);
            let to = world.world_to_cell_x(target - half.x + EDGE_EPSILON);
            let mut column = from.saturating_sub(1);
            while column >= to {
                if (row_min..=row_max).any(|row| world.is_solid(column, row)) {
                    self.position.x = (world.cell_right(column) + half.x).min(self.position.x);
                    self.velocity.x = 0.0;
                    self.contacts.blocked.left = true;
                    return;
                }
                column -= 1;
            }
        }
        self.position.x = target;
    }

    fn resolve_y(&mut self, dy: f32, world: &TileWorld) {
        if dy == 0.0 {
            return;
        }
        let half = self.size * 0.5;
        let column_min = world.world_to_cell_x(self.position.x - half.x + EDGE_EPSILON);
        let column_max = world.world_to_cell_x(self.position.x + half.x - EDGE_EPSILON);
        let target = self.position.y + dy;

        if dy > 0.0 {
            let from = world.world_to_cell_y(self.position.y + half.y - EDGE_EPSILON);
            let to = world.world_to_cell_y(target + half.y - EDGE_EPSILON);
            for row in from.saturating_add(1)..=to {
                let mut landed = false;
                for column in column_min..=column_max {
                    if world.is_solid(column, row) {
                        self.contacts.ground_cells.push(CellCoord::new(column, row));
                        landed = true;
                    }
                }
                if landed {
                    self.position.y = (world.cell_top(row) - half.y).max(self.position.y);
                    self.velocity.y = 0.0;
                    self.contacts.blocked.down = true;
                    self.grounded = true;
                    return;
                }
            }
        } else {
            let from = world.world_to_cell_y(self.position.y - half.y + EDGE_EPSILON);
            let to = world.world_to_cell_y(target - half.y + EDGE_EPSILON);
            let mut row = from.saturating_sub(1);
            while row >= to {
                if (column_min..=column_max).any(|column| world.is_solid(column, row)) {
                    self.position.y = (world.cell_bottom(row) + half.y).min(self.position.y);
                    self.velocity.y = 0.0;
                    self.contacts.blocked.up = true;
                    return;
                }
                row -= 1;
            }
        }
        self.position.y = target;
    }

    /// World edges stop the body but never count as ground.
    fn clamp_to_world_bounds(&mut self) {
        let Some(bounds) = self.world_bounds else {
            return;
        };
        let half = self.size * 0.5;
        if self.position.x - half.x < bounds.min.x {
            self.position.x = bounds.min.x + half.x;
            self.velocity.x = self.velocity.x.max(0.0);
            self.contacts.blocked.left = true;
        } else if self.position.x + half.x > bounds.max.x {
            self.position.x = bounds.max.x - half.x;
            self.velocity.x = self.velocity.x.min(0.0);
            self.contacts.blocked.right = true;
        }
        if self.position.y - half.y < bounds.min.y {
            self.position.y = bounds.min.y + half.y;
            self.velocity.y = self.velocity.y.max(0.0);
            self.contacts.blocked.up = true;
        } else if self.position.y + half.y > bounds.max.y {
            self.position.y = bounds.max.y - half.y;
            self.velocity.y = self.velocity.y.min(0.0);
            self.contacts.blocked.down = true;
        }
    }
}

/// Acceleration alone drives horizontal change while it is non-zero;
/// otherwise linear drag pulls the velocity toward zero without crossing it.
fn step_horizontal_velocity(velocity: f32, acceleration: f32, drag: f32, dt: f32) -> f32 {
    if !velocity.is_finite() {
        return velocity;
    }
    if acceleration != 0.0 {
        return velocity + acceleration * dt;
    }
    if drag <= 0.0 {
        return velocity;
    }
    let decay = drag * dt;
    if velocity - decay > 0.0 {
        velocity - decay
    } else if velocity + decay < 0.0 {
        velocity + decay
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tile_world::test_support::world_from_rows;

    const DT: f32 = 1.0 / 60.0;
    const TILE: f32 = 18.0;

    fn no_gravity() -> PhysicsTuning {
        PhysicsTuning {
            gravity: 0.0,
            ..PhysicsTuning::default()
        }
    }

    fn floor_world() -> TileWorld {
        world_from_rows(
            &[
                "..........",
                "..........",
                "..........",
                "..........",
                "##########",
            ],
            TILE,
        )
    }

    #[test]
    fn falling_body_lands_on_floor_and_is_grounded() {
        let world = floor_world();
        let tuning = PhysicsTuning::default();
        let mut body = KinematicBody::new(Vec2::new(45.0, 30.0), Vec2::new(12.0, 12.0));

        let mut ticks = 0;
        while !body.grounded() {
            body.integrate(DT, &world, &tuning);
            ticks += 1;
            assert!(ticks < 120, "body never landed");
        }

        assert_eq!(body.aabb().max.y, 4.0 * TILE);
        assert_eq!(body.velocity().y, 0.0);
        assert!(body.contacts().blocked.down);
        assert!(!body.contacts().ground_cells.is_empty());
        assert!(body
            .contacts()
            .ground_cells
            .iter()
            .all(|cell| cell.y == 4));
    }

    #[test]
    fn grounded_is_revalidated_every_step() {
        let world = floor_world();
        let tuning = PhysicsTuning::default();
        let mut body = KinematicBody::new(Vec2::new(45.0, 4.0 * TILE - 6.0), Vec2::new(12.0, 12.0));

        body.integrate(DT, &world, &tuning);
        assert!(body.grounded(), "resting body stays grounded under gravity");

        body.set_velocity_y(tuning.jump_velocity);
        body.integrate(DT, &world, &tuning);
        assert!(!body.grounded(), "moving up clears grounded");
        assert!(body.contacts().ground_cells.is_empty());
    }

    #[test]
    fn ceiling_contact_never_sets_grounded() {
        let world = world_from_rows(&["####", "....", "....", "...."], TILE);
        let tuning = no_gravity();
        let mut body = KinematicBody::new(Vec2::new(27.0, TILE + 8.0), Vec2::new(12.0, 12.0));
        body.set_velocity_y(-600.0);

        body.integrate(DT, &world, &tuning);

        assert_eq!(body.aabb().min.y, TILE);
        assert!(body.contacts().blocked.up);
        assert!(!body.grounded());
        assert_eq!(body.velocity().y, 0.0);
    }

    #[test]
    fn horizontal_wall_clamps_and_zeroes_vx() {
        let world = world_from_rows(&["....#", "....#", "....#"], TILE);
        let tuning = no_gravity();
        let mut body = KinematicBody::new(Vec2::new(60.0, 27.0), Vec2::new(12.0, 12.0));
        body.set_velocity(Vec2::new(900.0, 0.0));

        body.integrate(DT, &world, &tuning);

        assert_eq!(body.aabb().max.x, 4.0 * TILE);
        assert_eq!(body.velocity().x, 0.0);
        assert!(body.contacts().blocked.right);
        assert!(!body.grounded());
    }

    #[test]
    fn x_is_resolved_before_y() {
        // Diagonal motion into an inside corner: X stops at the wall, then Y
        // lands on the floor at the clamped X instead of catching the corner.
        let world = world_from_rows(&["...#", "...#", "####"], TILE);
        let tuning = no_gravity();
        let mut body = KinematicBody::new(Vec2::new(40.0, 20.0), Vec2::new(12.0, 12.0));
        body.set_velocity(Vec2::new(600.0, 720.0));

        body.integrate(DT, &world, &tuning);

        assert!(body.contacts().blocked.right);
        assert!(body.contacts().blocked.down);
        assert!(body.grounded());
        assert_eq!(body.aabb().max.x, 3.0 * TILE);
        assert_eq!(body.aabb().max.y, 2.0 * TILE);
    }

    #[test]
    fn fast_body_does_not_tunnel_through_thin_floor() {
        let world = world_from_rows(
            &["...", "...", "...", "...", "...", "###", "...", "...", "...", "..."],
            TILE,
        );
        let tuning = no_gravity();
        let mut body = KinematicBody::new(Vec2::new(27.0, 20.0), Vec2::new(12.0, 12.0));
        body.set_velocity_y(9000.0);

        body.integrate(DT, &world, &tuning);

        assert!(body.grounded());
        assert_eq!(body.aabb().max.y, 5.0 * TILE);
    }

    #[test]
    fn non_solid_tiles_do_not_block_or_ground() {
        let world = world_from_rows(&["....", "....", "~~~~", "...."], TILE);
        let tuning = PhysicsTuning::default();
        let mut body = KinematicBody::new(Vec2::new(36.0, 20.0), Vec2::new(12.0, 12.0));
        for _ in 0..30 {
            body.integrate(DT, &world, &tuning);
            assert!(!body.grounded());
        }
        assert!(body.position().y > 3.0 * TILE);
    }

    #[test]
    fn drag_only_applies_without_acceleration() {
        assert_eq!(step_horizontal_velocity(0.0, -400.0, 300.0, 0.5), -200.0);
        assert_eq!(step_horizontal_velocity(100.0, 0.0, 300.0, 0.1), 70.0);
        assert_eq!(step_horizontal_velocity(-100.0, 0.0, 300.0, 0.1), -70.0);
        assert_eq!(step_horizontal_velocity(10.0, 0.0, 300.0, 0.1), 0.0);
        assert_eq!(step_horizontal_velocity(10.0, 0.0, 0.0, 0.1), 10.0);
    }

    #[test]
    fn drag_does_not_mask_non_finite_velocity() {
        assert!(step_horizontal_velocity(f32::NAN, 0.0, 300.0, DT).is_nan());
        assert_eq!(
            step_horizontal_velocity(f32::INFINITY, 0.0, 300.0, DT),
            f32::INFINITY
        );

        let world = floor_world();
        let mut body = KinematicBody::new(Vec2::new(45.0, 30.0), Vec2::new(12.0, 12.0));
        body.apply_drag(300.0);
        body.set_velocity(Vec2::new(f32::NAN, 0.0));
        body.integrate(DT, &world, &PhysicsTuning::default());

        assert!(!body.is_finite());
        assert_eq!(body.position(), Vec2::new(45.0, 30.0));
        assert!(!body.grounded());
    }

    #[test]
    fn world_bounds_clamp_without_grounding() {
        let world = world_from_rows(&["....", "....", "...."], TILE);
        let bounds = Aabb::from_top_left(Vec2::ZERO, world.pixel_size());
        let tuning = PhysicsTuning::default();
        let mut body =
            KinematicBody::new(Vec2::new(36.0, 40.0), Vec2::new(12.0, 12.0)).with_world_bounds(bounds);
        body.set_velocity(Vec2::new(-5000.0, 0.0));

        for _ in 0..60 {
            body.integrate(DT, &world, &tuning);
        }

        assert_eq!(body.aabb().min.x, 0.0);
        assert_eq!(body.aabb().max.y, 3.0 * TILE);
        assert!(body.contacts().blocked.down);
        assert!(!body.grounded());
    }

    #[test]
    fn reset_to_clears_motion_and_contacts() {
        let world = floor_world();
        let mut body = KinematicBody::new(Vec2::new(45.0, 66.0), Vec2::new(12.0, 12.0));
        body.apply_acceleration(-400.0, 0.0);
        body.apply_drag(300.0);
        body.integrate(DT, &world, &PhysicsTuning::default());
        assert!(body.grounded());

        body.reset_to(Vec2::new(10.0, 10.0));

        assert_eq!(body.position(), Vec2::new(10.0, 10.0));
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.acceleration(), Vec2::ZERO);
        assert!(!body.grounded());
        assert_eq!(body.contacts(), &Contacts::default());
    }
}
