//! Fixed timestep simulation tick
//!
//! Per tick, in order: power-up timers, danger-zone slow motion, chain and
//! projectile motion, defeat check, collision, matches, victory check, combo
//! decay. Every step runs to completion; nothing suspends mid-tick.

use glam::Vec2;
use std::collections::BTreeSet;

use super::collision::{check_collision, find_insertion_point};
use super::orb::{OrbKind, OrbState};
use super::state::{GameEvent, GamePhase, GameState, RuntimeModifiers, ScheduledAction, SoundCue};
use crate::consts::*;
use crate::sanitize_dt;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim point in field coordinates (from mouse/touch position)
    pub aim: Option<Vec2>,
    /// Fire the loaded orb
    pub fire: bool,
    /// Swap loaded and next
    pub swap: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - AI plays the game
    pub autoplay: bool,
    /// Replacement runtime modifiers, read once per tick
    pub modifiers: Option<RuntimeModifiers>,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = sanitize_dt(dt);

    if let Some(modifiers) = input.modifiers {
        if modifiers != state.modifiers {
            state.modifiers = modifiers;
            state.apply_modifiers();
        }
    }

    if input.pause {
        match state.phase {
            GamePhase::Paused => {
                state.resume();
            }
            _ => {
                state.pause();
            }
        }
    }

    match state.phase {
        GamePhase::Idle | GamePhase::Paused => return,
        _ => {}
    }

    state.time += dt;
    state.time_ticks += 1;

    run_schedule(state, dt);

    match state.phase {
        GamePhase::LevelTransition { progress } => {
            let progress = progress + dt * LEVEL_TRANSITION_RATE;
            state.phase = if progress >= 1.0 {
                GamePhase::Running
            } else {
                GamePhase::LevelTransition { progress }
            };
            if let Some(aim) = input.aim {
                state.shooter.aim_at(aim);
            }
            return;
        }
        GamePhase::Running => {}
        _ => return,
    }

    // Player input
    let mut input = input.clone();
    if input.autoplay {
        autoplay(state, &mut input);
    }
    if let Some(aim) = input.aim {
        state.shooter.aim_at(aim);
    }
    if input.swap && state.shooter.swap() {
        state.play(SoundCue::Power);
    }
    if input.fire && state.shooter.fire(&mut state.rng) {
        state.play(SoundCue::Shoot);
    }

    // Power-ups
    state.powerups.update(dt);
    let powerup_mult = state.powerups.speed_multiplier();

    update_danger_zone(state, dt);

    // Motion
    let cheat_mult = state.modifiers.speed_multiplier.max(0.0);
    let chain_dt = dt * state.slow_motion_factor * powerup_mult * cheat_mult;
    state.chain.update(chain_dt, &mut state.rng);
    // Reverse never flies the projectile backward
    let projectile_dt = dt * state.slow_motion_factor * powerup_mult.abs() * cheat_mult;
    state.shooter.update(projectile_dt);

    // Defeat: the head went through the portal
    let limit = state.chain.path().total_length() + PORTAL_BUFFER;
    if !state.modifiers.no_clip && state.chain.head_distance() >= limit {
        defeat(state);
        return;
    }

    handle_collision(state);
    handle_matches(state);

    // Victory: everything spawned and nothing left
    if state.phase == GamePhase::Running && state.chain.is_cleared() {
        complete_level(state);
    }

    state.combo.update(dt);
}

/// Count down the pending transition and run it when due
fn run_schedule(state: &mut GameState, dt: f32) {
    let Some(mut scheduled) = state.pending else {
        return;
    };
    scheduled.remaining -= dt;
    if scheduled.remaining > 0.0 {
        state.pending = Some(scheduled);
        return;
    }
    state.pending = None;

    match scheduled.action {
        ScheduledAction::StartLevel(level) => state.start_level(level),
        ScheduledAction::ShowGameOver => {
            log::info!("Showing game over screen");
            state.emit(GameEvent::ShowGameOverScreen);
        }
        ScheduledAction::ShowVictory => {
            log::info!("Victory! Final score {}", state.score);
            state.phase = GamePhase::Victory;
            state.emit(GameEvent::Victory { score: state.score });
        }
    }
}

/// Slow everything down as the head nears the portal
fn update_danger_zone(state: &mut GameState, dt: f32) {
    let total = state.chain.path().total_length();
    let threshold = total * DANGER_ZONE_START;
    let head = state.chain.head_distance();

    if !state.chain.is_empty() && head >= threshold && total > threshold {
        let danger = ((head - threshold) / (total - threshold)).clamp(0.0, 1.0);
        state.slow_motion_factor = 1.0 - danger * (1.0 - DANGER_MIN_FACTOR);
        state.danger_time += dt;
    } else {
        if state.danger_time > 0.0 {
            let seconds = state.danger_time;
            log::debug!("Escaped the danger zone after {:.1}s", seconds);
            state.emit(GameEvent::DangerEscaped { seconds });
        }
        state.slow_motion_factor = 1.0;
        state.danger_time = 0.0;
    }
}

/// Seat the projectile in the chain if it touched an orb
fn handle_collision(state: &mut GameState) {
    let Some(projectile) = state.shooter.projectile.as_ref() else {
        return;
    };
    if state.chain.is_empty() {
        return;
    }
    let Some(hit) = check_collision(projectile, &state.chain) else {
        return;
    };

    let index = state
        .chain
        .index_of(hit.orb_id)
        .unwrap_or_else(|| find_insertion_point(projectile.pos, &state.chain));
    let Some(projectile) = state.shooter.take_projectile() else {
        return;
    };

    let orb = state.chain.make_orb(projectile.kind);
    let index = state.chain.insert_orb(orb, index);
    state.chain.resolve_overlaps_from(index);
    log::debug!("Projectile {:?} inserted at {}", projectile.kind, index);
}

/// Clear every run in one batch, then fire the power-ups it caught
fn handle_matches(state: &mut GameState) {
    let runs = state.chain.check_matches();
    if runs.is_empty() {
        return;
    }

    let len = state.chain.len();
    let mut doomed: BTreeSet<usize> = BTreeSet::new();
    let mut triggered: Vec<(u32, OrbKind)> = Vec::new();
    for run in &runs {
        doomed.extend(run.indices());
        // Power-ups inside the run or touching either end
        let lo = run.start.saturating_sub(1);
        let hi = (run.end() + 1).min(len);
        for i in lo..hi {
            if let Some(orb) = state.chain.get(i) {
                if orb.is_powerup()
                    && orb.state == OrbState::Normal
                    && !triggered.iter().any(|(id, _)| *id == orb.id)
                {
                    triggered.push((orb.id, orb.kind));
                    doomed.insert(i);
                }
            }
        }
    }

    let removed = state.chain.remove_orbs(doomed.iter().copied());
    if removed == 0 {
        return;
    }

    let mut bonus = 0;
    let mut bombed = 0;
    for (id, kind) in triggered {
        let outcome = state.powerups.activate(kind, Some(id), &mut state.chain);
        bonus += outcome.bonus_score;
        bombed += outcome.orbs_destroyed;
        state.emit(GameEvent::PowerUpActivated { kind });
        state.play(SoundCue::Power);
    }

    let multiplier = state.combo.add_match(removed);
    let points = removed as u64 * POINTS_PER_ORB * multiplier as u64 + bonus;
    state.orbs_destroyed += (removed + bombed) as u64;

    log::debug!(
        "Matched {} orbs in {} runs (+{} bombed), combo x{}, +{}",
        removed,
        runs.len(),
        bombed,
        multiplier,
        points
    );
    state.play(SoundCue::Match);
    if multiplier >= 3 {
        state.play(SoundCue::Combo);
    }
    state.emit(GameEvent::MatchOccurred {
        orbs: removed + bombed,
        combo: state.combo.current_combo,
        points,
    });
    state.award_points(points);
}

/// Finish the level: save progress and schedule what comes next
pub fn complete_level(state: &mut GameState) {
    if matches!(
        state.phase,
        GamePhase::LevelComplete | GamePhase::Victory | GamePhase::GameOver
    ) {
        return;
    }
    let level = state.level;
    state.phase = GamePhase::LevelComplete;
    state.shooter.projectile = None;
    if state.danger_time > 0.0 {
        let seconds = state.danger_time;
        log::debug!("Cleared the level {:.1}s into the danger zone", seconds);
        state.emit(GameEvent::DangerEscaped { seconds });
    }
    state.danger_time = 0.0;
    state.slow_motion_factor = 1.0;
    log::info!("Level {} complete! Score {}", level, state.score);
    state.emit(GameEvent::LevelComplete {
        level,
        score: state.score,
    });

    if level >= FINAL_LEVEL {
        state.request_save(level);
        state.schedule(ScheduledAction::ShowVictory, LEVEL_COMPLETE_DELAY);
    } else {
        state.request_save(level + 1);
        state.schedule(ScheduledAction::StartLevel(level + 1), LEVEL_COMPLETE_DELAY);
    }
}

/// The chain reached the portal: retry the level or end the run
pub fn defeat(state: &mut GameState) {
    let level = state.level;
    state.shooter.projectile = None;

    if !state.modifiers.god_mode {
        state.lives = state.lives.saturating_sub(1);
    }
    log::info!("Level {} failed, {} lives left", level, state.lives);
    state.emit(GameEvent::LevelFailed {
        level,
        lives_left: state.lives,
    });
    state.request_save(level);

    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        log::info!("Game over at level {} with {} points", level, state.score);
        state.play(SoundCue::GameOver);
        state.emit(GameEvent::GameOver {
            level,
            score: state.score,
        });
        state.schedule(ScheduledAction::ShowGameOver, GAME_OVER_DELAY);
    } else {
        state.phase = GamePhase::Retry;
        state.schedule(ScheduledAction::StartLevel(level), RETRY_DELAY);
    }
}

/// Demo AI: aim at the orb nearest the portal that matches what is loaded
fn autoplay(state: &mut GameState, input: &mut TickInput) {
    if state.shooter.is_busy() {
        return;
    }

    let visible = |d: f32| d > 0.0;
    let target = |kind: OrbKind| {
        state
            .chain
            .orbs()
            .iter()
            .rev()
            .find(|o| o.is_normal() && visible(o.path_distance) && (o.kind == kind || o.kind == OrbKind::Rainbow))
            .map(|o| o.pos)
    };

    if let Some(pos) = target(state.shooter.loaded) {
        input.aim = Some(pos);
        input.fire = true;
    } else if target(state.shooter.next).is_some() {
        input.swap = true;
    } else if let Some(head) = state
        .chain
        .orbs()
        .iter()
        .rev()
        .find(|o| o.is_normal() && visible(o.path_distance))
    {
        input.aim = Some(head.pos);
        input.fire = true;
    }
}
