//! Eight Ball headless runner
//!
//! Plays a seeded match between two naive auto-aim players and prints the
//! final table snapshot as JSON. Pass a config file path to override the
//! defaults.

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use glam::Vec2;

    use eight_ball::consts::SIM_DT;
    use eight_ball::sim::{BallType, EnginePhase, ShooterState, TickInput};
    use eight_ball::{Config, PoolMatch};

    const MAX_SHOTS: u32 = 200;
    const MAX_TICKS_PER_SHOT: u32 = 240 * 120;

    /// Pick the ball the current player should go for
    fn pick_target(game: &PoolMatch, cue: Vec2) -> Option<Vec2> {
        let own = game.state().current_player().ball_type;
        let balls = || game.entities_active().iter().filter_map(|e| e.as_ball());
        let wanted = |t: BallType| {
            if own.is_group() {
                t == own
            } else {
                t.is_group()
            }
        };

        let nearest = |pred: &dyn Fn(BallType) -> bool| {
            balls()
                .filter(|b| b.on_table() && pred(b.ball_type))
                .map(|b| b.pos)
                .min_by(|a, b| a.distance(cue).total_cmp(&b.distance(cue)))
        };

        nearest(&wanted).or_else(|| nearest(&|t| t == BallType::Eight))
    }

    /// Input for the frame where the shooter is waiting on us
    fn plan_input(game: &PoolMatch, rejected: bool) -> TickInput {
        let Some(shooter) = game.shooter() else {
            return TickInput::default();
        };
        match shooter.state {
            ShooterState::Move if rejected => TickInput {
                down: true,
                confirm: true,
                ..Default::default()
            },
            ShooterState::Move => TickInput::confirm(),
            ShooterState::Aim => {
                let cue = shooter.pos;
                let Some(target) = pick_target(game, cue) else {
                    return TickInput::confirm();
                };
                let sim = game.engine().config();
                let distance = target.distance(cue);
                let power = ((2.0 * sim.friction_floor * distance).sqrt() * 2.0)
                    .clamp(shooter.power_max * 0.2, shooter.power_max);
                let drag = sim.max_drag_distance * power / shooter.power_max;
                let dir = (target - cue).normalize_or_zero();
                TickInput::shoot_at(cue + dir * drag)
            }
            ShooterState::Off => TickInput::default(),
        }
    }

    pub fn run() {
        env_logger::init();

        let config = match std::env::args().nth(1) {
            Some(path) => Config::load(&path).unwrap_or_else(|e| {
                log::error!("Failed to load config from {}: {}; using defaults", path, e);
                Config::default()
            }),
            None => Config::default(),
        };
        log::info!("Eight Ball starting (seed {})", config.seed);

        let mut game = PoolMatch::new(config);
        let mut rejected = false;

        'shots: while !game.is_over() && game.state().shot_count < MAX_SHOTS {
            let shot = game.state().shot_count;
            let mut ticks = 0;
            while game.state().shot_count == shot && !game.is_over() {
                let input = if game.phase() == EnginePhase::Turn {
                    plan_input(&game, rejected)
                } else {
                    TickInput::default()
                };
                let placing = game.shooter().map(|s| s.state) == Some(ShooterState::Move);
                game.update(SIM_DT, &input);
                rejected =
                    placing && game.shooter().map(|s| s.state) == Some(ShooterState::Move);

                ticks += 1;
                if ticks > MAX_TICKS_PER_SHOT {
                    log::warn!("Shot {} did not finish; stopping", shot + 1);
                    break 'shots;
                }
            }

            if let Some(summary) = &game.state().last_shot {
                log::info!(
                    "Shot {}: {:?} hit {:?} first, pocketed {:?}, fouls {:?}",
                    game.state().shot_count,
                    summary.shooter,
                    summary.first_hit,
                    summary.pocketed,
                    summary.fouls
                );
            }
        }

        match game.state().match_result {
            Some(result) => println!("Winner: {:?}", result.winner),
            None => println!("No result after {} shots", game.state().shot_count),
        }
        match game.snapshot().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize snapshot: {}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    runner::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}
