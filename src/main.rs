//! Headless runner: plays a session at the fixed timestep and prints what
//! happened. Useful for balance checks and reproducing seeds.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use orb_portal::audio::LogAudio;
use orb_portal::consts::SIM_DT;
use orb_portal::persistence::JsonFileStore;
use orb_portal::settings::JsonSettingsStore;
use orb_portal::sim::{GameEvent, GamePhase};
use orb_portal::{Session, Tuning};

#[derive(Parser, Debug)]
#[command(about = "Run an Orb Portal session without a window", version)]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Level to start on
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Let the demo AI play
    #[arg(long)]
    autoplay: bool,
    /// Directory for the save file and settings
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Continue from the save in --save-dir instead of starting fresh
    #[arg(long)]
    resume: bool,
    /// Balance overrides (JSON)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Cheat console lines to run after the level starts (repeatable)
    #[arg(long = "cheat")]
    cheats: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading tuning file {}", path.display()))?;
            Tuning::from_json(&text)
                .with_context(|| format!("parsing tuning file {}", path.display()))?
        }
        None => Tuning::default(),
    };

    let mut session = Session::with_tuning(args.seed, tuning).with_audio(Box::new(LogAudio::default()));
    if let Some(dir) = &args.save_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        session = session
            .with_save_store(Box::new(JsonFileStore::in_dir(dir)))
            .with_settings_store(Box::new(JsonSettingsStore::open(dir.join("settings.json"))));
    }
    session.set_autoplay(args.autoplay);

    if !(args.resume && session.continue_game()) {
        session.new_game(args.level);
    }
    log::info!("Orb Portal (headless) seed {} level {}", args.seed, session.state.level);

    for line in &args.cheats {
        match session.execute_cheat(line) {
            Ok(outcome) => println!("cheat {}: {}", line, outcome.message),
            Err(e) => eprintln!("cheat {}: {}", line, e),
        }
    }

    let ticks = (args.seconds.max(0.0) / SIM_DT).round() as u64;
    let mut matches = 0u64;
    let mut levels_cleared = 0u32;
    for _ in 0..ticks {
        session.step();
        let mut finished = false;
        for event in session.drain_events() {
            match event {
                GameEvent::MatchOccurred { .. } => matches += 1,
                GameEvent::LevelComplete { level, score } => {
                    levels_cleared += 1;
                    println!("level {} complete, score {}", level, score);
                }
                GameEvent::LevelFailed { level, lives_left } => {
                    println!("level {} failed, {} lives left", level, lives_left);
                }
                GameEvent::ShowGameOverScreen | GameEvent::Victory { .. } => finished = true,
                _ => {}
            }
        }
        if finished {
            break;
        }
    }

    let hud = session.hud();
    let outcome = match hud.phase {
        GamePhase::GameOver => "game over",
        GamePhase::Victory => "victory",
        _ => "time up",
    };
    println!(
        "{} after {:.1}s: level {}, score {} (best {}), lives {}, {} matches, {} levels cleared",
        outcome,
        session.state.time,
        hud.level,
        hud.score,
        hud.high_score,
        hud.lives,
        matches,
        levels_cleared
    );
    if let Some(rank) = session.last_rank() {
        println!("leaderboard rank #{}", rank);
    }
    Ok(())
}
