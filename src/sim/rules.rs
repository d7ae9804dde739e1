//! Post-shot rule evaluation
//!
//! Runs once per completed shot, after every ball has settled. Decides group
//! assignment, fouls, the eight-ball result and who shoots next.

use super::entity::{BallType, Entity};
use super::state::{EnginePhase, Foul, GameState, MatchResult, PlayerId, ShotSummary};
use crate::consts::FOUL_SHOTS;

/// Evaluate the shot that just settled and update `state`.
///
/// `active` holds entities still in play (balls on the table, the shooter,
/// pockets, table); `pocketed` holds the balls that went down this shot.
/// Always returns `EnginePhase::Turn`.
pub fn apply_rules(active: &[Entity], pocketed: &[Entity], state: &mut GameState) -> EnginePhase {
    let shooter_player = state.current;
    let opponent = shooter_player.other();
    let first_hit = active
        .iter()
        .chain(pocketed)
        .find_map(Entity::as_shooter)
        .and_then(|s| s.first_hit);
    let mut fouls = Vec::new();

    if !state.ball_types_determined {
        if let Some(group) = first_hit.filter(|t| t.is_group()) {
            state.player_mut(shooter_player).ball_type = group;
            state.player_mut(opponent).ball_type = group.complement();
            state.ball_types_determined = true;
            log::info!(
                "{:?} takes {:?}, {:?} takes {:?}",
                shooter_player,
                group,
                opponent,
                group.complement()
            );
        }
    }

    if first_hit.is_none() {
        log::info!("Foul by {:?}: no ball hit", shooter_player);
        fouls.push(Foul::NoBallHit);
    }

    let pocketed_types: Vec<BallType> = pocketed.iter().filter_map(Entity::ball_type).collect();
    let eight_down = pocketed_types.contains(&BallType::Eight);
    let cue_down = pocketed_types.contains(&BallType::Cue);

    if eight_down {
        let own = state.player(shooter_player).ball_type;
        let own_left = active
            .iter()
            .filter_map(Entity::as_ball)
            .filter(|b| !b.fully_sunk && b.ball_type == own)
            .count();
        let result = if own_left > 0 {
            log::info!(
                "{:?} loses: eight ball down with {} of own group left",
                shooter_player,
                own_left
            );
            MatchResult {
                winner: opponent,
                loser: shooter_player,
            }
        } else {
            log::info!("{:?} wins: eight ball down", shooter_player);
            MatchResult {
                winner: shooter_player,
                loser: opponent,
            }
        };
        state.match_result = Some(result);
    } else if cue_down {
        log::info!("Foul by {:?}: scratch", shooter_player);
        fouls.push(Foul::Scratch);
    }

    let turn_passed = if !fouls.is_empty() {
        state.give_turn(opponent, FOUL_SHOTS);
        true
    } else if state.is_over() {
        false
    } else {
        pass_turn_if_missed(state, shooter_player, &pocketed_types)
    };

    state.shot_count += 1;
    state.last_shot = Some(ShotSummary {
        shooter: shooter_player,
        first_hit,
        pocketed: pocketed_types,
        fouls,
        turn_passed,
    });

    EnginePhase::Turn
}

/// Clean shot bookkeeping: potting your own group keeps the table, anything
/// else uses up a visit. Returns true if the table passed.
fn pass_turn_if_missed(state: &mut GameState, shooter: PlayerId, pocketed: &[BallType]) -> bool {
    let own = state.player(shooter).ball_type;
    let potted_own = pocketed.iter().any(|&t| {
        if own.is_group() {
            t == own
        } else {
            t.is_group()
        }
    });

    let player = state.player_mut(shooter);
    if potted_own {
        player.shots_remaining = player.shots_remaining.max(1);
        return false;
    }

    player.shots_remaining = player.shots_remaining.saturating_sub(1);
    if player.shots_remaining == 0 {
        state.give_turn(shooter.other(), 1);
        log::info!("Turn passes to {:?}", shooter.other());
        true
    } else {
        false
    }
}
