//! Orb Climber headless runner
//!
//! Drives the gameplay core with a fixed-timestep loop and a simple tap
//! autopilot. Useful for smoke-testing tuning files and level generation
//! without a renderer.
//!
//! Usage: `orb-climber [tuning.json] [seed]`

use orb_climber::consts::{MAX_SUBSTEPS, SIM_DT};
use orb_climber::services::LogAnalytics;
use orb_climber::sim::{GamePhase, TickInput};
use orb_climber::{Game, JsonFileStore, LoadOutcome, Services, Tuning};

/// Length of the run in simulated seconds
const RUN_SECONDS: f32 = 120.0;
/// Host frame rate the runner pretends to render at
const FRAME_DT: f32 = 1.0 / 30.0;
const MAX_RESTARTS: u32 = 5;

/// Host-side loop state
struct Runner {
    game: Game,
    accumulator: f32,
    input: TickInput,
    restarts: u32,
}

impl Runner {
    fn new(game: Game) -> Self {
        Self {
            game,
            accumulator: 0.0,
            input: TickInput::default(),
            restarts: 0,
        }
    }

    /// Run simulation ticks for one host frame
    async fn update(&mut self, dt: f32) {
        let dt = dt.min(self.game.tuning().max_frame_dt);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.input.jump = self.wants_jump();
            let input = self.input.clone();
            let report = self.game.update(SIM_DT, &input).await;
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in &report.events {
                log::trace!("{:?}", event);
            }

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.pause = false;
        }
    }

    /// Tap when standing under a platform the player can reach
    fn wants_jump(&self) -> bool {
        let Some(world) = self.game.world() else {
            return false;
        };
        let player = &world.player;
        if !player.on_ground {
            return false;
        }
        let rect = player.rect();
        world.platforms.iter().any(|p| {
            let gap = rect.top() - p.rect.bottom();
            gap > 0.0 && gap < 120.0 && p.rect.overlaps_x(&rect)
        })
    }

    /// Advance after a terminal phase. Returns false when the run should stop.
    async fn handle_terminal(&mut self) -> bool {
        match self.game.phase() {
            GamePhase::LevelComplete => {
                log::info!("Cleared level {}", self.game.session().current_level);
                self.game.next_level().await == LoadOutcome::Started
            }
            GamePhase::GameOver(reason) => {
                log::info!("Game over: {}", reason.as_str());
                if self.restarts >= MAX_RESTARTS {
                    return false;
                }
                self.restarts += 1;
                self.game.restart_level().await == LoadOutcome::Started
            }
            _ => true,
        }
    }
}

fn parse_args() -> (Tuning, u64) {
    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load_or_default(&path),
        None => Tuning::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
    (tuning, seed)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    log::info!("Orb Climber (headless) starting...");

    let (tuning, seed) = parse_args();
    log::info!("Run seed: {}", seed);

    let services = Services::default()
        .with_store(JsonFileStore::new("progress.json"))
        .with_analytics(LogAnalytics);
    let mut runner = Runner::new(Game::new(seed, tuning, services));

    if runner.game.start().await != LoadOutcome::Started {
        log::error!("Could not load the first level");
        return;
    }

    let mut simulated = 0.0;
    let mut next_report = 0.0;
    while simulated < RUN_SECONDS {
        runner.update(FRAME_DT).await;
        simulated += FRAME_DT;

        if simulated >= next_report {
            if let Some(view) = runner.game.view() {
                let hud = view.hud;
                log::info!(
                    "L{} orbs {}/{} score {} hp {}/{} time {}",
                    hud.level,
                    hud.orbs_collected,
                    hud.required_orbs,
                    hud.score,
                    hud.health,
                    hud.max_health,
                    hud.time_remaining
                        .map(|t| format!("{:.1}s", t))
                        .unwrap_or_else(|| "-".into())
                );
            }
            next_report += 5.0;
        }

        if runner.game.phase().is_terminal() && !runner.handle_terminal().await {
            break;
        }
    }

    let session = runner.game.session();
    log::info!(
        "Finished on level {} with score {} and {} currency",
        session.current_level,
        session.score,
        session.total_currency
    );
}
