//! Level/session state machine
//!
//! `Loading -> Playing -> {Paused <-> Playing} -> {LevelComplete | GameOver}`.
//! Terminal states stay put until `restart_level`, `next_level` or
//! `go_to_level` starts a new load. The game owns the session, the live world
//! and the injected collaborators; nothing here is global.
//!
//! Collaborator calls (store, ads, assets) are awaited under
//! `Tuning::collaborator_timeout`; expiry counts as that call failing.

use crate::consts::MAX_LEVEL;
use crate::persistence::{ProgressSnapshot, load_or_default, save_within};
use crate::progression::Progression;
use crate::services::{AnalyticsEvent, Services, prepare_within, show_ad_within};
use crate::sim::level::{generate_with, required_orbs, time_limit};
use crate::sim::{GameOverReason, GamePhase, LevelOutcome, Session, TickInput, TickReport, World, tick};
use crate::tuning::Tuning;
use crate::view::FrameView;

/// Handle for an in-flight level load. Only the newest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    level: u32,
}

impl LoadTicket {
    pub fn level(&self) -> u32 {
        self.level
    }
}

/// Result of finishing (or requesting) a level load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Level is live and `Playing`
    Started,
    /// Level is not unlocked; the unlock prompt was reported
    Locked,
    /// No such level (0 or past `MAX_LEVEL`); nothing changed
    Invalid,
    /// A newer load was started; this one was discarded
    Superseded,
    /// Assets or generation failed; session is `GameOver(LoadFailure)`
    Failed,
}

/// Result of a rewarded-ad unlock request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Ad completed, level unlocked and loaded
    Granted(LoadOutcome),
    /// Ad declined, failed or timed out; nothing changed
    Denied,
    AlreadyUnlocked,
    /// Only the next locked level can be bought with an ad
    NotEligible,
}

/// The game: session record, live level and collaborators
pub struct Game {
    session: Session,
    world: Option<World>,
    tuning: Tuning,
    progression: Progression,
    services: Services,
    /// Run seed; each level derives its own stream from it
    seed: u64,
    load_generation: u64,
}

impl Game {
    pub fn new(seed: u64, tuning: Tuning, services: Services) -> Self {
        Self {
            session: Session::default(),
            world: None,
            tuning,
            progression: Progression::default(),
            services,
            seed,
            load_generation: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.progression.is_unlocked(&self.session, level)
    }

    /// Read-only snapshot for the renderer (None while loading)
    pub fn view(&self) -> Option<FrameView> {
        self.world
            .as_ref()
            .map(|world| FrameView::capture(&self.session, world))
    }

    /// Restore saved progress and load the level the player left off on
    pub async fn start(&mut self) -> LoadOutcome {
        let limit = self.tuning.collaborator_timeout();
        let snapshot = load_or_default(self.services.store.as_mut(), limit).await;
        self.session.current_level = snapshot.current_level;
        self.session.total_currency = snapshot.total_currency;
        self.session.score = snapshot.score;
        self.session.level_start_score = snapshot.score;
        self.session.highest_unlocked_level = snapshot.highest_unlocked_level;

        self.services.track(&AnalyticsEvent::GameStart);

        let level = self
            .progression
            .playable_level(&self.session, snapshot.current_level);
        self.go_to_level(level).await
    }

    /// Enter `Loading` for `level`, invalidating any older ticket.
    /// Leaving a level that is still running reports it as abandoned.
    pub fn begin_load(&mut self, level: u32) -> LoadTicket {
        if matches!(self.session.phase, GamePhase::Playing | GamePhase::Paused) {
            self.report_failure(GameOverReason::Abandoned);
        }

        self.load_generation += 1;
        self.world = None;
        self.session.begin_level(level);
        log::info!("Loading level {}", level);
        LoadTicket {
            generation: self.load_generation,
            level,
        }
    }

    /// Prepare assets, generate the layout and go live
    pub async fn finish_load(&mut self, ticket: LoadTicket) -> LoadOutcome {
        if ticket.generation != self.load_generation || self.session.phase != GamePhase::Loading {
            log::debug!("Discarding stale load of level {}", ticket.level);
            return LoadOutcome::Superseded;
        }

        let level = ticket.level;
        let limit = self.tuning.collaborator_timeout();
        if let Err(e) = prepare_within(self.services.assets.as_mut(), level, limit).await {
            log::warn!("Level {} assets failed: {}", level, e);
            return self.fail_load();
        }

        let config = match generate_with(level, self.seed, self.tuning.placement_attempts) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Level {} generation failed: {}", level, e);
                return self.fail_load();
            }
        };

        self.session.required_orbs = config.required_orb_count;
        self.session.time_limit = config.time_limit;
        self.world = Some(World::from_config(&config, &self.tuning));
        self.session.phase = GamePhase::Playing;

        self.services.track(&AnalyticsEvent::LevelStart {
            level,
            required_orbs: config.required_orb_count,
            time_limit: config.time_limit,
        });
        log::info!("Level {} started", level);
        LoadOutcome::Started
    }

    fn fail_load(&mut self) -> LoadOutcome {
        self.world = None;
        self.finish_failed(GameOverReason::LoadFailure);
        LoadOutcome::Failed
    }

    /// Load `level` if it exists and the player may enter it
    pub async fn go_to_level(&mut self, level: u32) -> LoadOutcome {
        if !self.progression.exists(level) {
            log::warn!("Ignoring request for level {} (levels are 1..={})", level, MAX_LEVEL);
            return LoadOutcome::Invalid;
        }
        if !self.is_unlocked(level) {
            log::info!("Level {} is locked", level);
            self.services
                .track(&AnalyticsEvent::UnlockPromptShown { level });
            return LoadOutcome::Locked;
        }
        let ticket = self.begin_load(level);
        self.finish_load(ticket).await
    }

    /// Replay the current level from scratch
    pub async fn restart_level(&mut self) -> LoadOutcome {
        self.go_to_level(self.session.current_level).await
    }

    pub async fn next_level(&mut self) -> LoadOutcome {
        self.go_to_level(self.session.current_level.saturating_add(1))
            .await
    }

    pub fn pause(&mut self) {
        if self.session.phase == GamePhase::Playing {
            self.session.phase = GamePhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.session.phase == GamePhase::Paused {
            self.session.phase = GamePhase::Playing;
        }
    }

    /// Advance one rendered frame. Completing a level awaits the progress save.
    pub async fn update(&mut self, dt: f32, input: &TickInput) -> TickReport {
        let Some(world) = self.world.as_mut() else {
            return TickReport::default();
        };

        let report = tick(&mut self.session, world, input, &self.tuning, dt);
        match report.outcome {
            Some(LevelOutcome::Complete) => self.finish_complete().await,
            Some(LevelOutcome::Failed(reason)) => self.finish_failed(reason),
            None => {}
        }
        report
    }

    async fn finish_complete(&mut self) {
        let level = self.session.current_level;
        let bonus = self
            .session
            .time_remaining()
            .map(|remaining| self.tuning.time_bonus(remaining))
            .unwrap_or(0);

        self.session.score += bonus;
        self.session.level_start_score = self.session.score;
        self.session.total_currency += self.tuning.level_currency_reward;
        self.progression.record_completion(&mut self.session, level);

        log::info!(
            "Level {} complete in {:.1}s (bonus {}, score {})",
            level,
            self.session.elapsed,
            bonus,
            self.session.score
        );
        self.services.track(&AnalyticsEvent::LevelComplete {
            level,
            score: self.session.score,
            time_taken: self.session.elapsed,
            orbs_collected: self.session.orbs_collected_this_level,
        });

        // Resume point is the level after the one just cleared
        let mut snapshot = ProgressSnapshot::from_session(&self.session);
        snapshot.current_level = level.saturating_add(1).min(MAX_LEVEL);
        self.save(&snapshot).await;
    }

    fn finish_failed(&mut self, reason: GameOverReason) {
        self.session.phase = GamePhase::GameOver(reason);
        self.report_failure(reason);
    }

    fn report_failure(&mut self, reason: GameOverReason) {
        log::info!(
            "Level {} failed: {}",
            self.session.current_level,
            reason.as_str()
        );
        self.services.track(&AnalyticsEvent::LevelFail {
            level: self.session.current_level,
            reason,
            time_taken: self.session.elapsed,
            orbs_collected: self.session.orbs_collected_this_level,
        });
    }

    async fn save(&mut self, snapshot: &ProgressSnapshot) -> bool {
        let limit = self.tuning.collaborator_timeout();
        match save_within(self.services.store.as_mut(), snapshot, limit).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save progress: {}", e);
                false
            }
        }
    }

    /// Try to open `level` by showing a rewarded ad.
    /// A granted unlock replaces whatever level is running.
    pub async fn unlock_via_ad(&mut self, level: u32) -> UnlockOutcome {
        if self.is_unlocked(level) {
            return UnlockOutcome::AlreadyUnlocked;
        }
        if !self.progression.can_unlock_via_ad(&self.session, level) {
            return UnlockOutcome::NotEligible;
        }

        self.services
            .track(&AnalyticsEvent::RewardedAdStarted { level });
        let limit = self.tuning.collaborator_timeout();
        let granted = match show_ad_within(self.services.ads.as_mut(), limit).await {
            Ok(granted) => granted,
            Err(e) => {
                log::warn!("Rewarded ad failed: {}", e);
                false
            }
        };

        if !granted {
            self.services
                .track(&AnalyticsEvent::RewardedAdFailed { level });
            return UnlockOutcome::Denied;
        }

        self.progression.grant_unlock(&mut self.session, level);
        self.services
            .track(&AnalyticsEvent::RewardedAdCompleted { level });

        let mut snapshot = ProgressSnapshot::from_session(&self.session);
        snapshot.current_level = level;
        snapshot.score = self.session.level_start_score;
        self.save(&snapshot).await;

        UnlockOutcome::Granted(self.go_to_level(level).await)
    }

    /// Difficulty parameters the next load of `level` would use
    pub fn preview(&self, level: u32) -> (u32, Option<f32>) {
        (required_orbs(level), time_limit(level))
    }
}
