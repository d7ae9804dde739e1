//! Per-tick engine
//!
//! Drives the shot state machine (`Turn -> Simulate -> Outcome`) and advances
//! ball motion. The host loop calls `Engine::tick` once per frame with the
//! elapsed time and an input snapshot; the engine mutates entities in place
//! and never creates or removes them.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{
    ball_contact_distance, clamp_to_table, placement_is_legal, pocket_entry_distance,
    rail_distance, reflect_velocity,
};
use super::entity::{
    Ball, BallType, Entity, EntityId, EntityKind, ShooterState, Table, find_shooter, find_table,
    index_of,
};
use super::state::EnginePhase;
use crate::config::SimConfig;
use crate::consts::*;
use crate::{angle_to_dir, dir_to_angle, wrap_angle};

/// Input snapshot for a single tick.
///
/// `confirm` and `cancel` are edge-triggered: the host sets them only on the
/// frame the key/button goes down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub power_increase: bool,
    pub power_decrease: bool,
    pub rotate_cw: bool,
    pub rotate_ccw: bool,
    pub confirm: bool,
    pub cancel: bool,
    /// Absolute pointer position (drag-to-aim, click-to-place)
    pub pointer: Option<Vec2>,
}

impl TickInput {
    pub fn confirm() -> Self {
        Self {
            confirm: true,
            ..Default::default()
        }
    }

    /// Aim at `target` and shoot in the same frame
    pub fn shoot_at(target: Vec2) -> Self {
        Self {
            confirm: true,
            pointer: Some(target),
            ..Default::default()
        }
    }
}

/// Nearest thing a moving ball runs into
#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Rail { flip_x: bool, flip_y: bool },
    /// Entity index of the pocket
    Pocket(usize),
    /// Entity index of the struck ball
    Ball(usize),
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    distance: f32,
    event: Event,
}

fn keep_closer(best: &mut Option<Hit>, distance: f32, event: Event) {
    if best.is_none_or(|b| distance < b.distance) {
        *best = Some(Hit { distance, event });
    }
}

/// Cue-ball contact bookkeeping for the current shot
#[derive(Debug, Clone, Copy)]
struct ContactLog {
    cue: Option<EntityId>,
    first_hit: Option<BallType>,
}

impl ContactLog {
    fn record(&mut self, a: (EntityId, BallType), b: (EntityId, BallType)) {
        if self.first_hit.is_some() {
            return;
        }
        if Some(a.0) == self.cue {
            self.first_hit = Some(b.1);
        } else if Some(b.0) == self.cue {
            self.first_hit = Some(a.1);
        }
        if let Some(kind) = self.first_hit {
            log::debug!("Cue ball first contact: {:?}", kind);
        }
    }
}

/// The simulation engine: phase machine plus motion stepper
#[derive(Debug, Clone)]
pub struct Engine {
    config: SimConfig,
    phase: EnginePhase,
    rng: Pcg32,
    /// Seconds every ball has been at rest
    settle_timer: f32,
    /// Ticks processed since creation
    time_ticks: u64,
}

impl Engine {
    /// Create an engine with a seeded RNG
    pub fn new(config: SimConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    /// Create an engine with an injected RNG
    pub fn with_rng(config: SimConfig, rng: Pcg32) -> Self {
        Self {
            config,
            phase: EnginePhase::Turn,
            rng,
            settle_timer: 0.0,
            time_ticks: 0,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Set the next phase explicitly (the driver does this after the rules run).
    ///
    /// Entering `Turn` this way leaves the shooter `Off`; the first `Turn`
    /// tick re-arms it for aiming from the cue ball. Use `begin_turn` for
    /// ball in hand.
    pub fn set_phase(&mut self, phase: EnginePhase) {
        if phase != self.phase {
            log::debug!("Engine phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.settle_timer = 0.0;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Prepare the shooter for a new turn and enter `Turn`.
    ///
    /// With `ball_in_hand` the cue ball floats with the shooter until a legal
    /// spot is confirmed; otherwise aiming starts from where it came to rest.
    pub fn begin_turn(&mut self, entities: &mut [Entity], ball_in_hand: bool) {
        self.set_phase(EnginePhase::Turn);

        let Some(si) = find_shooter(entities) else {
            log::warn!("No shooter entity; turn cannot start");
            return;
        };
        arm_shooter(entities, si, ball_in_hand);
    }

    /// Add a velocity impulse to a ball. Without an angle a uniformly random
    /// direction is drawn from the engine RNG.
    pub fn apply_impulse(&mut self, ball: &mut Ball, power: f32, angle: Option<f32>) {
        let angle = angle.unwrap_or_else(|| self.rng.random_range(0.0..TAU));
        ball.vel += angle_to_dir(angle) * power;
    }

    /// Advance the engine by `dt` seconds
    pub fn tick(&mut self, dt: f32, entities: &mut [Entity], input: &TickInput) {
        self.time_ticks += 1;
        match self.phase {
            EnginePhase::Turn => self.tick_turn(dt, entities, input),
            EnginePhase::Simulate => self.tick_simulate(dt, entities),
            EnginePhase::Outcome | EnginePhase::Send | EnginePhase::Waiting => {}
        }
    }

    fn tick_turn(&mut self, dt: f32, entities: &mut [Entity], input: &TickInput) {
        let Some(si) = find_shooter(entities) else {
            log::warn!("No shooter entity; ignoring input");
            return;
        };
        let Some(mut shooter) = entities[si].as_shooter().copied() else {
            return;
        };
        let Some(ci) = index_of(entities, shooter.cue_ball) else {
            log::warn!("Cue ball {} is not active; ignoring input", shooter.cue_ball);
            return;
        };

        if shooter.state == ShooterState::Off {
            log::debug!("Re-arming shooter for a new turn");
            arm_shooter(entities, si, false);
            let Some(armed) = entities[si].as_shooter().copied() else {
                return;
            };
            shooter = armed;
        }

        match shooter.state {
            ShooterState::Move => {
                let mut delta = Vec2::ZERO;
                if input.left {
                    delta.x -= 1.0;
                }
                if input.right {
                    delta.x += 1.0;
                }
                if input.up {
                    delta.y -= 1.0;
                }
                if input.down {
                    delta.y += 1.0;
                }
                shooter.pos += delta.normalize_or_zero() * self.config.cue_move_speed * dt;
                if let Some(pointer) = input.pointer {
                    shooter.pos = pointer;
                }

                let mut radius = 0.0;
                if let Some(cue) = entities[ci].as_ball_mut() {
                    cue.pos = shooter.pos;
                    cue.vel = Vec2::ZERO;
                    radius = cue.radius + self.config.placement_padding;
                }

                if input.confirm {
                    if placement_is_legal(entities, shooter.cue_ball, shooter.pos, radius) {
                        shooter.state = ShooterState::Aim;
                        log::debug!(
                            "Cue ball placed at ({:.1}, {:.1})",
                            shooter.pos.x,
                            shooter.pos.y
                        );
                    } else {
                        log::debug!(
                            "Rejected cue placement at ({:.1}, {:.1})",
                            shooter.pos.x,
                            shooter.pos.y
                        );
                    }
                }
            }
            ShooterState::Aim => {
                if input.cancel {
                    shooter.state = ShooterState::Move;
                } else {
                    if let Some(pointer) = input.pointer {
                        let drag = pointer - shooter.pos;
                        let len = drag.length();
                        let max_drag = self.config.max_drag_distance;
                        shooter.power = shooter.power_max * len.min(max_drag) / max_drag;
                        if len > f32::EPSILON {
                            shooter.angle = dir_to_angle(drag);
                        }
                    }

                    let mut power = shooter.power;
                    if input.power_increase {
                        power += self.config.power_rate * dt;
                    }
                    if input.power_decrease {
                        power -= self.config.power_rate * dt;
                    }
                    shooter.power = power.max(0.0).min(shooter.power_max);

                    let mut angle = shooter.angle;
                    if input.rotate_ccw {
                        angle += self.config.rotate_speed * dt;
                    }
                    if input.rotate_cw {
                        angle -= self.config.rotate_speed * dt;
                    }
                    shooter.angle = wrap_angle(angle);

                    if input.confirm {
                        let (power, angle) = (shooter.power, shooter.angle);
                        if let Some(cue) = entities[ci].as_ball_mut() {
                            self.apply_impulse(cue, power, Some(angle));
                        }
                        shooter.state = ShooterState::Off;
                        self.set_phase(EnginePhase::Simulate);
                        log::info!("Shot taken: power {:.0}, angle {:.3}", power, angle);
                    }
                }
            }
            ShooterState::Off => {}
        }

        if let Some(slot) = entities[si].as_shooter_mut() {
            *slot = shooter;
        }
    }

    fn tick_simulate(&mut self, dt: f32, entities: &mut [Entity]) {
        let table = find_table(entities);
        if table.is_none() {
            log::warn!("No table entity; balls have no rails");
        }
        let shooter_index = find_shooter(entities);
        let shooter = shooter_index.and_then(|i| entities[i].as_shooter().copied());
        let mut contacts = ContactLog {
            cue: shooter.map(|s| s.cue_ball),
            first_hit: shooter.and_then(|s| s.first_hit),
        };

        for i in 0..entities.len() {
            let Some(ball) = entities[i].as_ball().copied() else {
                continue;
            };
            if ball.fully_sunk {
                continue;
            }
            let ball = self.step_ball(i, ball, dt, entities, table.as_ref(), &mut contacts);
            if let Some(slot) = entities[i].as_ball_mut() {
                *slot = ball;
            }
        }

        if let Some(shooter) = shooter_index.and_then(|i| entities[i].as_shooter_mut()) {
            shooter.first_hit = contacts.first_hit;
        }

        let at_rest = entities
            .iter()
            .filter_map(Entity::as_ball)
            .filter(|b| !b.fully_sunk)
            .all(|b| b.speed() <= SPEED_EPSILON && !(b.is_sinking() && b.scale > SINK_EPSILON));

        if at_rest {
            self.settle_timer += dt;
            if self.settle_timer >= self.config.settle_time {
                log::info!("Balls settled after tick {}", self.time_ticks);
                self.phase = EnginePhase::Outcome;
                self.settle_timer = 0.0;
            }
        } else {
            self.settle_timer = 0.0;
        }
    }

    /// Move one ball through this tick's travel budget, resolving events in
    /// order of distance, then apply friction and the sink animation.
    fn step_ball(
        &self,
        index: usize,
        mut ball: Ball,
        dt: f32,
        entities: &mut [Entity],
        table: Option<&Table>,
        contacts: &mut ContactLog,
    ) -> Ball {
        let id = entities[index].id;
        let friction = self.config.friction_floor;
        let mut speed = ball.speed();
        let mut dir = ball.vel.normalize_or_zero();
        let mut remaining = (speed * dt - 0.5 * friction * dt * dt).max(0.0);
        let mut steps = 0;

        while remaining > 0.0 {
            if steps >= self.config.max_substeps {
                log::debug!("Ball {} hit the sub-step cap; deferring {:.3}", id, remaining);
                break;
            }
            steps += 1;

            if let Some(pocket_id) = ball.sinking_pocket {
                let center = index_of(entities, pocket_id)
                    .and_then(|p| entities[p].as_pocket())
                    .map_or(ball.pos, |p| p.pos);
                let to_center = center - ball.pos;
                let dist = to_center.length();
                if dist <= POCKET_CENTER_EPSILON {
                    ball.pos = center;
                    speed = 0.0;
                    break;
                }
                dir = to_center / dist;
                if remaining >= dist {
                    ball.pos = center;
                    speed = 0.0;
                } else {
                    ball.pos += dir * remaining;
                }
                break;
            }

            let hit = match nearest_event(index, &ball, dir, entities, table) {
                Some(hit) if hit.distance <= remaining => hit,
                _ => {
                    ball.pos += dir * remaining;
                    break;
                }
            };
            ball.pos += dir * hit.distance;
            remaining -= hit.distance;

            match hit.event {
                Event::Rail { flip_x, flip_y } => {
                    if flip_x {
                        dir = reflect_velocity(dir, Vec2::X);
                    }
                    if flip_y {
                        dir = reflect_velocity(dir, Vec2::Y);
                    }
                    if let Some(table) = table {
                        ball.pos = clamp_to_table(ball.pos, ball.radius, table);
                    }
                    log::debug!(
                        "Ball {} bounced off rail at ({:.1}, {:.1})",
                        id,
                        ball.pos.x,
                        ball.pos.y
                    );
                }
                Event::Pocket(pi) => {
                    let pocket_id = entities[pi].id;
                    if let Some(pocket) = entities[pi].as_pocket_mut() {
                        pocket.is_full = true;
                    }
                    ball.sinking_pocket = Some(pocket_id);
                    log::debug!(
                        "Ball {} ({:?}) captured by pocket {}",
                        id,
                        ball.ball_type,
                        pocket_id
                    );
                }
                Event::Ball(oi) => {
                    let old_speed = speed;
                    let (new_dir, new_speed) =
                        self.resolve_contact(index, &ball, dir, speed, entities, oi);
                    dir = new_dir;
                    speed = new_speed;
                    remaining = if old_speed > 0.0 {
                        remaining * speed / old_speed
                    } else {
                        0.0
                    };
                    if dir == Vec2::ZERO {
                        remaining = 0.0;
                    }

                    let other_id = entities[oi].id;
                    let other_type = entities[oi].ball_type().unwrap_or_default();
                    contacts.record((id, ball.ball_type), (other_id, other_type));
                }
            }
        }

        speed = (speed - friction * dt).max(0.0);
        ball.vel = if speed > 0.0 { dir * speed } else { Vec2::ZERO };

        if let Some(pocket_id) = ball.sinking_pocket {
            ball.scale = (ball.scale - self.config.sink_rate * dt).max(0.0);
            ball.radius = ball.base_radius * ball.scale;
            if ball.scale <= SINK_EPSILON {
                ball.scale = 0.0;
                ball.radius = 0.0;
                ball.vel = Vec2::ZERO;
                ball.fully_sunk = true;
                ball.sinking_pocket = None;
                if let Some(pocket) =
                    index_of(entities, pocket_id).and_then(|p| entities[p].as_pocket_mut())
                {
                    pocket.is_full = false;
                }
                log::info!("Ball {} ({:?}) sunk in pocket {}", id, ball.ball_type, pocket_id);
            }
        }

        ball
    }

    /// Resolve the mover at `index` hitting the ball at `other`. Pushes the
    /// struck ball along the impact normal and returns the mover's new
    /// direction and speed.
    fn resolve_contact(
        &self,
        index: usize,
        ball: &Ball,
        dir: Vec2,
        speed: f32,
        entities: &mut [Entity],
        other: usize,
    ) -> (Vec2, f32) {
        let Some(struck) = entities[other].as_ball().copied() else {
            return (dir, speed);
        };

        let normal = (struck.pos - ball.pos).normalize_or_zero();
        let closing = dir.dot(normal).max(0.0);
        let total_mass = ball.mass + struck.mass;
        let mass_ratio = if total_mass > 0.0 {
            2.0 * ball.mass / total_mass
        } else {
            1.0
        };

        // A struck ball already rolling into another ball (or back into the
        // mover) loses that closing component before taking the new push.
        let mut vel = struck.vel;
        if let Some(course) = collision_course(other, &struck, index, ball, entities) {
            vel -= course * vel.dot(course).max(0.0);
        }
        vel += normal * (speed * closing * self.config.collision_transfer * mass_ratio);
        if let Some(slot) = entities[other].as_ball_mut() {
            slot.vel = vel;
        }

        let tangent = dir - normal * dir.dot(normal);
        let new_speed = (speed * 0.5 + self.config.friction_bounce).min(speed);
        (tangent.normalize_or_zero(), new_speed)
    }
}

/// Put the shooter at `si` into a fresh turn: clear first hit and power, then
/// either float the cue ball with it (`Move`) or aim from the cue ball (`Aim`).
fn arm_shooter(entities: &mut [Entity], si: usize, ball_in_hand: bool) {
    let Some(mut shooter) = entities[si].as_shooter().copied() else {
        return;
    };
    let cue = index_of(entities, shooter.cue_ball).and_then(|i| entities[i].as_ball_mut());

    shooter.first_hit = None;
    shooter.power = 0.0;
    match cue {
        Some(cue) if !ball_in_hand => {
            shooter.pos = cue.pos;
            shooter.state = ShooterState::Aim;
        }
        Some(cue) => {
            cue.pos = shooter.pos;
            cue.vel = Vec2::ZERO;
            shooter.state = ShooterState::Move;
        }
        None => {
            log::warn!("Cue ball {} is not active", shooter.cue_ball);
            shooter.state = ShooterState::Move;
        }
    }

    if let Some(slot) = entities[si].as_shooter_mut() {
        *slot = shooter;
    }
}

/// Contact normal for the first ball `struck` would run into on its current
/// heading. The mover is checked at its contact position, not its stored one.
fn collision_course(
    struck_index: usize,
    struck: &Ball,
    mover_index: usize,
    mover: &Ball,
    entities: &[Entity],
) -> Option<Vec2> {
    let dir = struck.vel.normalize_or_zero();
    if dir == Vec2::ZERO {
        return None;
    }

    let others = entities
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != struck_index && *j != mover_index)
        .filter_map(|(_, e)| e.as_ball())
        .filter(|b| b.on_table())
        .map(|b| (b.pos, b.radius))
        .chain(std::iter::once((mover.pos, mover.radius)));

    let mut best: Option<(f32, Vec2)> = None;
    for (pos, radius) in others {
        if let Some(d) = ball_contact_distance(struck.pos, dir, struck.radius, pos, radius) {
            if best.is_none_or(|(closest, _)| d < closest) {
                best = Some((d, pos));
            }
        }
    }

    best.map(|(d, pos)| (pos - (struck.pos + dir * d)).normalize_or_zero())
}

/// Nearest pocket, ball or rail along the travel direction
fn nearest_event(
    index: usize,
    ball: &Ball,
    dir: Vec2,
    entities: &[Entity],
    table: Option<&Table>,
) -> Option<Hit> {
    let mut best = None;

    for (j, entity) in entities.iter().enumerate() {
        if j == index {
            continue;
        }
        match &entity.kind {
            EntityKind::Pocket(pocket) if !pocket.is_full => {
                if let Some(d) =
                    pocket_entry_distance(ball.pos, dir, ball.radius, pocket.pos, pocket.radius)
                {
                    keep_closer(&mut best, d, Event::Pocket(j));
                }
            }
            EntityKind::Ball(other) if other.on_table() => {
                if let Some(d) =
                    ball_contact_distance(ball.pos, dir, ball.radius, other.pos, other.radius)
                {
                    keep_closer(&mut best, d, Event::Ball(j));
                }
            }
            _ => {}
        }
    }

    if let Some(rail) = table.and_then(|t| rail_distance(ball.pos, dir, ball.radius, t)) {
        keep_closer(
            &mut best,
            rail.distance,
            Event::Rail {
                flip_x: rail.flip_x,
                flip_y: rail.flip_y,
            },
        );
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{IdAllocator, Pocket, Shooter};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    struct Setup {
        entities: Vec<Entity>,
        ids: IdAllocator,
        cue: EntityId,
        shooter: EntityId,
    }

    impl Setup {
        /// Default table with a cue ball and shooter, no pockets
        fn new(cue_pos: Vec2) -> Self {
            let mut ids = IdAllocator::new();
            let table = Entity::new(
                ids.next_id(),
                EntityKind::Table(Table::new(Vec2::new(150.0, 270.0), Vec2::new(700.0, 350.0))),
            );
            let cue = ids.next_id();
            let shooter = ids.next_id();
            let entities = vec![
                table,
                Entity::new(
                    cue,
                    EntityKind::Ball(Ball::new(cue_pos, BALL_RADIUS, 1.0, BallType::Cue)),
                ),
                Entity::new(
                    shooter,
                    EntityKind::Shooter(Shooter::new(cue_pos, cue, POWER_MAX)),
                ),
            ];
            Self {
                entities,
                ids,
                cue,
                shooter,
            }
        }

        fn add_ball(&mut self, pos: Vec2, ball_type: BallType) -> EntityId {
            let id = self.ids.next_id();
            self.entities.push(Entity::new(
                id,
                EntityKind::Ball(Ball::new(pos, BALL_RADIUS, 1.0, ball_type)),
            ));
            id
        }

        fn add_pocket(&mut self, pos: Vec2) -> EntityId {
            let id = self.ids.next_id();
            self.entities
                .push(Entity::new(id, EntityKind::Pocket(Pocket::new(pos, POCKET_RADIUS))));
            id
        }

        fn ball(&self, id: EntityId) -> Ball {
            *self.entities[index_of(&self.entities, id).unwrap()].as_ball().unwrap()
        }

        fn ball_mut(&mut self, id: EntityId) -> &mut Ball {
            let i = index_of(&self.entities, id).unwrap();
            self.entities[i].as_ball_mut().unwrap()
        }

        fn shooter(&self) -> Shooter {
            *self.entities[index_of(&self.entities, self.shooter).unwrap()]
                .as_shooter()
                .unwrap()
        }

        fn pocket(&self, id: EntityId) -> Pocket {
            *self.entities[index_of(&self.entities, id).unwrap()].as_pocket().unwrap()
        }
    }

    fn simulating(config: SimConfig) -> Engine {
        let mut engine = Engine::new(config, 1);
        engine.set_phase(EnginePhase::Simulate);
        engine
    }

    #[test]
    fn test_legal_placement_moves_to_aim() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());
        assert_eq!(s.shooter().state, ShooterState::Aim);
        assert_eq!(engine.phase(), EnginePhase::Turn);
    }

    #[test]
    fn test_overlapping_placement_is_rejected() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        s.add_ball(Vec2::new(310.0, 445.0), BallType::Solids);
        let mut engine = Engine::new(SimConfig::default(), 1);

        engine.tick(DT, &mut s.entities, &TickInput::confirm());
        assert_eq!(s.shooter().state, ShooterState::Move);
        assert_eq!(engine.phase(), EnginePhase::Turn);
    }

    #[test]
    fn test_move_input_drags_cue_ball() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        engine.tick(0.5, &mut s.entities, &input);

        let expected = 300.0 + CUE_MOVE_SPEED * 0.5;
        assert!((s.shooter().pos.x - expected).abs() < 1e-3);
        assert_eq!(s.ball(s.cue).pos, s.shooter().pos);
    }

    #[test]
    fn test_pointer_aim_sets_power_and_angle() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());

        // half the max drag, straight up the screen
        let input = TickInput {
            pointer: Some(Vec2::new(300.0, 445.0 - MAX_DRAG_DISTANCE / 2.0)),
            ..Default::default()
        };
        engine.tick(DT, &mut s.entities, &input);
        let shooter = s.shooter();
        assert!((shooter.power - POWER_MAX / 2.0).abs() < 1e-2);
        assert!((shooter.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);

        // dragging past the limit caps at full power
        let input = TickInput {
            pointer: Some(Vec2::new(300.0 + MAX_DRAG_DISTANCE * 3.0, 445.0)),
            ..Default::default()
        };
        engine.tick(DT, &mut s.entities, &input);
        assert!((s.shooter().power - POWER_MAX).abs() < 1e-2);
        assert!(s.shooter().angle.abs() < 1e-4);
    }

    #[test]
    fn test_power_clamps_and_angle_wraps() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());

        let input = TickInput {
            power_decrease: true,
            rotate_cw: true,
            ..Default::default()
        };
        engine.tick(0.1, &mut s.entities, &input);
        let shooter = s.shooter();
        assert_eq!(shooter.power, 0.0);
        assert!((0.0..TAU).contains(&shooter.angle));
        assert!((shooter.angle - (TAU - ROTATE_SPEED * 0.1)).abs() < 1e-4);

        let input = TickInput {
            power_increase: true,
            ..Default::default()
        };
        engine.tick(100.0, &mut s.entities, &input);
        assert_eq!(s.shooter().power, POWER_MAX);
    }

    #[test]
    fn test_cancel_returns_to_move() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());
        let input = TickInput {
            cancel: true,
            ..Default::default()
        };
        engine.tick(DT, &mut s.entities, &input);
        assert_eq!(s.shooter().state, ShooterState::Move);
    }

    #[test]
    fn test_confirm_in_aim_shoots() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());
        engine.tick(
            DT,
            &mut s.entities,
            &TickInput::shoot_at(Vec2::new(300.0 + MAX_DRAG_DISTANCE, 445.0)),
        );

        assert_eq!(engine.phase(), EnginePhase::Simulate);
        assert_eq!(s.shooter().state, ShooterState::Off);
        let vel = s.ball(s.cue).vel;
        assert!((vel.x - POWER_MAX).abs() < 1e-2);
        assert!(vel.y.abs() < 1e-3);
    }

    #[test]
    fn test_straight_line_without_friction() {
        let mut s = Setup::new(Vec2::new(400.0, 445.0));
        let dir = Vec2::new(3.0, -4.0).normalize();
        s.ball_mut(s.cue).vel = dir * 100.0;
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        let ball = s.ball(s.cue);
        let expected = Vec2::new(400.0, 445.0) + dir * 10.0;
        assert!(ball.pos.distance(expected) < 1e-3);
        assert!((ball.speed() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_rail_bounce_flips_x() {
        let mut s = Setup::new(Vec2::new(830.0, 445.0));
        s.ball_mut(s.cue).vel = Vec2::new(600.0, 0.0);
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        let ball = s.ball(s.cue);
        assert!(ball.vel.x < 0.0);
        // 10 to the rail at x = 840, then 50 back
        assert!((ball.pos.x - 790.0).abs() < 1e-3);
    }

    #[test]
    fn test_substep_cap_defers_remaining_distance() {
        let mut s = Setup::new(Vec2::new(835.0, 445.0));
        s.ball_mut(s.cue).vel = Vec2::new(600.0, 0.0);
        let config = SimConfig {
            max_substeps: 1,
            ..SimConfig::frictionless()
        };
        let mut engine = simulating(config);

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        let ball = s.ball(s.cue);
        // the single sub-step is spent reaching the rail
        assert!((ball.pos.x - 840.0).abs() < 1e-3);
        assert!(ball.vel.x < 0.0);

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        assert!((s.ball(s.cue).pos.x - 780.0).abs() < 1e-3);
    }

    #[test]
    fn test_pocket_capture_and_sink() {
        let mut s = Setup::new(Vec2::new(800.0, 445.0));
        let pocket = s.add_pocket(Vec2::new(850.0, 445.0));
        s.ball_mut(s.cue).vel = Vec2::new(300.0, 0.0);
        let mut engine = simulating(SimConfig::default());

        let mut ticks = 0;
        while !s.ball(s.cue).is_sinking() {
            engine.tick(DT, &mut s.entities, &TickInput::default());
            ticks += 1;
            assert!(ticks < 100, "ball never reached the pocket");
        }
        assert!(s.pocket(pocket).is_full);

        let center = s.pocket(pocket).pos;
        let mut reached_center = false;
        let mut last_scale = s.ball(s.cue).scale;
        while !s.ball(s.cue).fully_sunk {
            engine.tick(DT, &mut s.entities, &TickInput::default());
            let ball = s.ball(s.cue);
            assert!(ball.scale < last_scale);
            if !ball.fully_sunk {
                assert!(s.pocket(pocket).is_full);
            }
            // once at the center the ball stays there, stopped
            if ball.pos.distance(center) <= POCKET_CENTER_EPSILON {
                assert_eq!(ball.speed(), 0.0);
                reached_center = true;
            } else {
                assert!(!reached_center, "ball drifted off the pocket center");
            }
            last_scale = ball.scale;
            ticks += 1;
            assert!(ticks < 200, "ball never finished sinking");
        }

        let ball = s.ball(s.cue);
        assert!(reached_center);
        assert!(ball.pos.distance(center) <= POCKET_CENTER_EPSILON);
        assert_eq!(ball.speed(), 0.0);
        assert_eq!(ball.scale, 0.0);
        assert!(ball.sinking_pocket.is_none());
        assert!(!s.pocket(pocket).is_full);
    }

    #[test]
    fn test_full_pocket_is_skipped() {
        let mut s = Setup::new(Vec2::new(800.0, 445.0));
        let pocket = s.add_pocket(Vec2::new(850.0, 445.0));
        let i = index_of(&s.entities, pocket).unwrap();
        s.entities[i].as_pocket_mut().unwrap().is_full = true;
        s.ball_mut(s.cue).vel = Vec2::new(600.0, 0.0);
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        let ball = s.ball(s.cue);
        assert!(!ball.is_sinking());
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_first_hit_records_stripes() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let stripe = s.add_ball(Vec2::new(400.0, 445.0), BallType::Stripes);
        s.add_ball(Vec2::new(600.0, 447.0), BallType::Solids);
        s.ball_mut(s.cue).vel = Vec2::new(500.0, 0.0);
        let mut engine = simulating(SimConfig::default());

        let mut ticks = 0;
        while s.shooter().first_hit.is_none() {
            engine.tick(DT, &mut s.entities, &TickInput::default());
            ticks += 1;
            assert!(ticks < 100, "cue ball never made contact");
        }
        assert_eq!(s.shooter().first_hit, Some(BallType::Stripes));
        assert!(s.ball(stripe).speed() > 0.0);

        while engine.phase() == EnginePhase::Simulate && ticks < 2000 {
            engine.tick(DT, &mut s.entities, &TickInput::default());
            assert_eq!(s.shooter().first_hit, Some(BallType::Stripes));
            ticks += 1;
        }
    }

    #[test]
    fn test_head_on_contact_transfers_speed() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let target = s.add_ball(Vec2::new(330.0, 445.0), BallType::Solids);
        s.ball_mut(s.cue).vel = Vec2::new(400.0, 0.0);
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.1, &mut s.entities, &TickInput::default());
        let struck = s.ball(target);
        assert!(struck.vel.x > 0.0);
        assert!(struck.vel.y.abs() < 1e-3);
        // head-on leaves no tangent for the cue ball to follow
        assert_eq!(s.ball(s.cue).speed(), 0.0);
        assert!(s.ball(s.cue).pos.x <= 310.0 + 1e-3);
    }

    #[test]
    fn test_struck_ball_loses_course_toward_third_ball() {
        let mut s = Setup::new(Vec2::new(400.0, 445.0));
        let struck = s.add_ball(Vec2::new(430.0, 445.0), BallType::Solids);
        let third = s.add_ball(Vec2::new(430.0, 500.0), BallType::Stripes);
        s.ball_mut(s.cue).vel = Vec2::new(400.0, 0.0);
        s.ball_mut(struck).vel = Vec2::new(0.0, 300.0);
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.03, &mut s.entities, &TickInput::default());
        let ball = s.ball(struck);
        // the roll toward the third ball is cancelled, the push remains
        assert!(ball.vel.y.abs() < 1e-3, "still heading for the third ball: {:?}", ball.vel);
        assert!((ball.vel.x - 400.0 * COLLISION_TRANSFER).abs() < 1e-2);
        assert_eq!(s.ball(third).vel, Vec2::ZERO);
    }

    #[test]
    fn test_struck_ball_off_course_keeps_its_roll() {
        let mut s = Setup::new(Vec2::new(400.0, 445.0));
        let struck = s.add_ball(Vec2::new(430.0, 445.0), BallType::Solids);
        s.add_ball(Vec2::new(600.0, 500.0), BallType::Stripes);
        s.ball_mut(s.cue).vel = Vec2::new(400.0, 0.0);
        s.ball_mut(struck).vel = Vec2::new(0.0, 300.0);
        let mut engine = simulating(SimConfig::frictionless());

        engine.tick(0.03, &mut s.entities, &TickInput::default());
        let ball = s.ball(struck);
        assert!((ball.vel.y - 300.0).abs() < 1e-2);
        assert!((ball.vel.x - 400.0 * COLLISION_TRANSFER).abs() < 1e-2);
    }

    #[test]
    fn test_set_phase_turn_rearms_shooter() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        let mut engine = Engine::new(SimConfig::default(), 1);
        engine.tick(DT, &mut s.entities, &TickInput::confirm());
        engine.tick(
            DT,
            &mut s.entities,
            &TickInput::shoot_at(Vec2::new(300.0 + MAX_DRAG_DISTANCE, 445.0)),
        );
        assert_eq!(s.shooter().state, ShooterState::Off);

        let i = index_of(&s.entities, s.shooter).unwrap();
        s.entities[i].as_shooter_mut().unwrap().first_hit = Some(BallType::Solids);
        s.ball_mut(s.cue).vel = Vec2::ZERO;
        s.ball_mut(s.cue).pos = Vec2::new(500.0, 400.0);
        engine.set_phase(EnginePhase::Turn);

        engine.tick(DT, &mut s.entities, &TickInput::default());
        let shooter = s.shooter();
        assert_eq!(shooter.state, ShooterState::Aim);
        assert_eq!(shooter.first_hit, None);
        assert_eq!(shooter.power, 0.0);
        assert_eq!(shooter.pos, Vec2::new(500.0, 400.0));

        // and it accepts input again
        engine.tick(
            DT,
            &mut s.entities,
            &TickInput::shoot_at(Vec2::new(500.0, 400.0 - MAX_DRAG_DISTANCE)),
        );
        assert_eq!(engine.phase(), EnginePhase::Simulate);
        assert!(s.ball(s.cue).vel.y < 0.0);
    }

    #[test]
    fn test_settle_is_debounced() {
        let mut s = Setup::new(Vec2::new(400.0, 445.0));
        let mut engine = simulating(SimConfig::default());

        engine.tick(SETTLE_TIME / 2.0, &mut s.entities, &TickInput::default());
        assert_eq!(engine.phase(), EnginePhase::Simulate);

        // motion resets the window
        s.ball_mut(s.cue).vel = Vec2::new(1.0, 0.0);
        engine.tick(0.001, &mut s.entities, &TickInput::default());
        assert_eq!(engine.phase(), EnginePhase::Simulate);
        s.ball_mut(s.cue).vel = Vec2::ZERO;

        engine.tick(SETTLE_TIME / 2.0, &mut s.entities, &TickInput::default());
        assert_eq!(engine.phase(), EnginePhase::Simulate);
        engine.tick(SETTLE_TIME / 2.0, &mut s.entities, &TickInput::default());
        assert_eq!(engine.phase(), EnginePhase::Outcome);
    }

    #[test]
    fn test_reserved_phases_do_nothing() {
        let mut s = Setup::new(Vec2::new(400.0, 445.0));
        s.ball_mut(s.cue).vel = Vec2::new(100.0, 0.0);
        for phase in [EnginePhase::Send, EnginePhase::Waiting, EnginePhase::Outcome] {
            let mut engine = Engine::new(SimConfig::default(), 1);
            engine.set_phase(phase);
            engine.tick(DT, &mut s.entities, &TickInput::confirm());
            assert_eq!(engine.phase(), phase);
            assert_eq!(s.ball(s.cue).pos, Vec2::new(400.0, 445.0));
        }
    }

    #[test]
    fn test_begin_turn_without_ball_in_hand_aims_from_cue() {
        let mut s = Setup::new(Vec2::new(300.0, 445.0));
        s.ball_mut(s.cue).pos = Vec2::new(500.0, 400.0);
        let i = index_of(&s.entities, s.shooter).unwrap();
        s.entities[i].as_shooter_mut().unwrap().first_hit = Some(BallType::Solids);
        let mut engine = simulating(SimConfig::default());

        engine.begin_turn(&mut s.entities, false);
        let shooter = s.shooter();
        assert_eq!(engine.phase(), EnginePhase::Turn);
        assert_eq!(shooter.state, ShooterState::Aim);
        assert_eq!(shooter.pos, Vec2::new(500.0, 400.0));
        assert_eq!(shooter.first_hit, None);
    }

    #[test]
    fn test_random_impulse_is_seeded() {
        let mut a = Engine::new(SimConfig::default(), 42);
        let mut b = Engine::new(SimConfig::default(), 42);
        let mut ball_a = Ball::new(Vec2::ZERO, 10.0, 1.0, BallType::Solids);
        let mut ball_b = ball_a;

        a.apply_impulse(&mut ball_a, 100.0, None);
        b.apply_impulse(&mut ball_b, 100.0, None);
        assert_eq!(ball_a.vel, ball_b.vel);
        assert!((ball_a.speed() - 100.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn friction_never_speeds_up_a_free_ball(
            speed in 0.0f32..1500.0,
            angle in 0.0f32..6.28,
            dt in 0.001f32..0.05,
        ) {
            let mut s = Setup::new(Vec2::new(500.0, 445.0));
            s.ball_mut(s.cue).vel = angle_to_dir(angle) * speed;
            let before = s.ball(s.cue).speed();
            let mut engine = simulating(SimConfig::default());

            engine.tick(dt, &mut s.entities, &TickInput::default());
            prop_assert!(s.ball(s.cue).speed() <= before + 1e-3);
        }
    }
}
