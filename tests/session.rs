//! Whole-session scenarios driven through the public API

use std::cell::RefCell;
use std::rc::Rc;

use orb_portal::Session;
use orb_portal::consts::*;
use orb_portal::persistence::{JsonFileStore, MemoryStore, SaveData, SaveStore, StoreError};
use orb_portal::sim::{GameEvent, GamePhase, OrbChain, OrbKind};

/// Save store the test can still look into after handing it to the session
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl SaveStore for SharedStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        self.0.borrow_mut().save(data)
    }

    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        self.0.borrow().load()
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.0.borrow_mut().clear()
    }
}

fn session_with_store(seed: u64) -> (Session, SharedStore) {
    let store = SharedStore::default();
    let mut session = Session::new(seed).with_save_store(Box::new(store.clone()));
    session.new_game(1);
    session.drain_events();
    (session, store)
}

/// Chain of exactly `kinds`, nothing left to spawn
fn set_chain(session: &mut Session, kinds: &[OrbKind]) {
    let state = &mut session.state;
    let mut config = state.tuning.chain_config(state.level);
    config.max_total_orbs = kinds.len() as u32;
    state.chain = OrbChain::from_kinds(state.chain.path().clone(), config, kinds);
}

/// A single orb already past the portal
fn head_through_portal(session: &mut Session) {
    let state = &mut session.state;
    let config = state.tuning.chain_config(state.level);
    let path = state.chain.path().clone();
    let beyond = path.total_length() + PORTAL_BUFFER + 5.0;
    state.chain = OrbChain::empty(path, config);
    state.chain.add_orb_at_distance(OrbKind::Blue, beyond);
}

fn run(session: &mut Session, seconds: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..(seconds / SIM_DT).ceil() as u32 {
        session.step();
        events.extend(session.drain_events());
    }
    events
}

/// Step until `done` holds, giving up after `seconds` of game time
fn run_until(session: &mut Session, seconds: f32, done: impl Fn(&Session) -> bool) -> bool {
    for _ in 0..(seconds / SIM_DT).ceil() as u32 {
        session.step();
        session.drain_events();
        if done(session) {
            return true;
        }
    }
    false
}

#[test]
fn test_clearing_the_chain_completes_the_level() {
    let (mut session, store) = session_with_store(7);
    set_chain(&mut session, &[OrbKind::Green, OrbKind::Green, OrbKind::Green]);

    let events = run(&mut session, 0.6);
    assert_eq!(session.state.phase, GamePhase::LevelComplete);
    assert_eq!(session.state.score, 3 * POINTS_PER_ORB);
    let completions = events
        .iter()
        .filter(|e| matches!(e, GameEvent::LevelComplete { level: 1, .. }))
        .count();
    assert_eq!(completions, 1);

    // Progress is saved pointing at the next level
    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.level, 2);
    assert_eq!(saved.score, 30);

    assert!(run_until(&mut session, LEVEL_COMPLETE_DELAY + 0.1, |s| s.state.level == 2));
    assert!(matches!(session.state.phase, GamePhase::LevelTransition { .. }));
    assert!(run_until(&mut session, 0.6, |s| s.state.phase == GamePhase::Running));
}

#[test]
fn test_losing_with_lives_left_retries_the_level() {
    let (mut session, store) = session_with_store(11);
    session.state.lives = 2;
    session.state.score = 250;
    head_through_portal(&mut session);

    session.step();
    assert_eq!(session.state.phase, GamePhase::Retry);
    assert_eq!(session.state.lives, 1);
    assert_eq!(store.load().unwrap().map(|d| d.lives), Some(1));

    run(&mut session, RETRY_DELAY + 0.1);
    assert_eq!(session.state.phase, GamePhase::Running);
    assert_eq!(session.state.level, 1);
    assert_eq!(session.state.score, 250);
}

#[test]
fn test_losing_the_last_life_ends_the_run() {
    let (mut session, store) = session_with_store(11);
    session.state.lives = 1;
    session.state.score = 1234;
    head_through_portal(&mut session);

    session.step();
    let events = session.drain_events();
    assert_eq!(session.state.phase, GamePhase::GameOver);
    assert!(events.contains(&GameEvent::GameOver { level: 1, score: 1234 }));
    assert_eq!(
        store.load().unwrap(),
        Some(SaveData {
            level: 1,
            score: 1234,
            lives: 0,
        })
    );
    assert!(!session.has_save());
    assert_eq!(session.last_rank(), Some(1));
    assert_eq!(session.high_scores().top_score(), Some(1234));

    let events = run(&mut session, GAME_OVER_DELAY + 0.1);
    let shown = events
        .iter()
        .filter(|e| **e == GameEvent::ShowGameOverScreen)
        .count();
    assert_eq!(shown, 1);
    assert_eq!(session.state.phase, GamePhase::GameOver);

    // The finished run stays on record but cannot be resumed
    let mut resumed = Session::new(12).with_save_store(Box::new(store.clone()));
    assert!(!resumed.has_save());
    assert!(!resumed.continue_game());
    assert_eq!(resumed.state.phase, GamePhase::Idle);
}

#[test]
fn test_god_mode_keeps_lives() {
    let (mut session, _store) = session_with_store(11);
    session.execute_cheat("GODMODE").unwrap();
    session.state.lives = 1;
    head_through_portal(&mut session);
    session.step();
    assert_eq!(session.state.phase, GamePhase::Retry);
    assert_eq!(session.state.lives, 1);
}

#[test]
fn test_crossing_the_bonus_threshold_grants_a_life() {
    let (mut session, store) = session_with_store(5);
    session.state.score = LIFE_BONUS_THRESHOLD - 10;
    let lives = session.state.lives;
    set_chain(
        &mut session,
        &[OrbKind::Red, OrbKind::Red, OrbKind::Red, OrbKind::Yellow],
    );

    let events = run(&mut session, 0.1);
    assert_eq!(session.state.lives, lives + 1);
    assert!(events.contains(&GameEvent::LifeBonus { lives: lives + 1 }));
    assert_eq!(store.load().unwrap().map(|d| d.lives), Some(lives + 1));
}

#[test]
fn test_continue_from_disk() {
    let dir = std::env::temp_dir().join(format!("orb-portal-it-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let mut session = Session::new(9).with_save_store(Box::new(JsonFileStore::in_dir(&dir)));
    session.new_game(1);
    session.execute_cheat("richman").unwrap();
    session.execute_cheat("skipthis").unwrap();

    let mut resumed = Session::new(10).with_save_store(Box::new(JsonFileStore::in_dir(&dir)));
    assert!(resumed.has_save());
    assert!(resumed.continue_game());
    assert_eq!(resumed.state.level, 2);
    assert_eq!(resumed.state.score, 10_000);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_same_seed_same_run() {
    let play = |seed| {
        let mut session = Session::new(seed);
        session.set_autoplay(true);
        session.new_game(1);
        run(&mut session, 20.0);
        (
            session.state.score,
            session.state.chain.len(),
            session.state.chain.spawned(),
            session.state.orbs_destroyed,
        )
    };
    assert_eq!(play(2024), play(2024));
}

#[test]
fn test_paused_session_does_not_advance() {
    let (mut session, _store) = session_with_store(3);
    run(&mut session, 0.5);
    assert!(session.pause());
    let head = session.state.chain.head_distance();
    let time = session.state.time;
    run(&mut session, 1.0);
    assert_eq!(session.state.chain.head_distance(), head);
    assert_eq!(session.state.time, time);
    assert!(session.resume());
    run(&mut session, 0.5);
    assert!(session.state.chain.head_distance() > head);
}
