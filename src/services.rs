//! External collaborators injected into the game
//!
//! The core only talks to the outside world through these traits. Every call
//! is non-fatal to gameplay: failures are logged or turned into events.
//! Ads and asset loading may suspend; analytics is fire-and-forget.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::{AdError, AnalyticsError, AssetError};
use crate::persistence::{MemoryStore, ProgressStore};
use crate::sim::GameOverReason;

/// Analytics parameters
pub type EventParams = Map<String, Value>;

/// Events the core reports
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    GameStart,
    LevelStart {
        level: u32,
        required_orbs: u32,
        time_limit: Option<f32>,
    },
    LevelComplete {
        level: u32,
        score: u64,
        time_taken: f64,
        orbs_collected: u32,
    },
    LevelFail {
        level: u32,
        reason: GameOverReason,
        time_taken: f64,
        orbs_collected: u32,
    },
    UnlockPromptShown {
        level: u32,
    },
    RewardedAdStarted {
        level: u32,
    },
    RewardedAdCompleted {
        level: u32,
    },
    RewardedAdFailed {
        level: u32,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::GameStart => "game_start",
            AnalyticsEvent::LevelStart { .. } => "level_start",
            AnalyticsEvent::LevelComplete { .. } => "level_complete",
            AnalyticsEvent::LevelFail { .. } => "level_fail",
            AnalyticsEvent::UnlockPromptShown { .. } => "unlock_prompt_shown",
            AnalyticsEvent::RewardedAdStarted { .. } => "rewarded_ad_started",
            AnalyticsEvent::RewardedAdCompleted { .. } => "rewarded_ad_completed",
            AnalyticsEvent::RewardedAdFailed { .. } => "rewarded_ad_failed",
        }
    }

    pub fn params(&self) -> EventParams {
        let value = match *self {
            AnalyticsEvent::GameStart => json!({}),
            AnalyticsEvent::LevelStart {
                level,
                required_orbs,
                time_limit,
            } => json!({ "level": level, "requiredOrbs": required_orbs, "timeLimit": time_limit }),
            AnalyticsEvent::LevelComplete {
                level,
                score,
                time_taken,
                orbs_collected,
            } => json!({
                "level": level,
                "score": score,
                "timeTaken": time_taken,
                "orbsCollected": orbs_collected,
            }),
            AnalyticsEvent::LevelFail {
                level,
                reason,
                time_taken,
                orbs_collected,
            } => json!({
                "level": level,
                "reason": reason.as_str(),
                "timeTaken": time_taken,
                "orbsCollected": orbs_collected,
            }),
            AnalyticsEvent::UnlockPromptShown { level }
            | AnalyticsEvent::RewardedAdStarted { level }
            | AnalyticsEvent::RewardedAdCompleted { level }
            | AnalyticsEvent::RewardedAdFailed { level } => json!({ "level": level }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Analytics collaborator (fire-and-forget)
pub trait Analytics {
    fn log_event(&mut self, name: &str, params: &EventParams) -> Result<(), AnalyticsError>;
}

/// Drops every event
#[derive(Debug, Default)]
pub struct NullAnalytics;

impl Analytics for NullAnalytics {
    fn log_event(&mut self, _name: &str, _params: &EventParams) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

/// Writes events to the log
#[derive(Debug, Default)]
pub struct LogAnalytics;

impl Analytics for LogAnalytics {
    fn log_event(&mut self, name: &str, params: &EventParams) -> Result<(), AnalyticsError> {
        log::info!("[analytics] {} {}", name, Value::Object(params.clone()));
        Ok(())
    }
}

/// Keeps every event in a shared buffer; clones see the same buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingAnalytics {
    events: Rc<RefCell<Vec<(String, EventParams)>>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Params of the most recent event called `name`
    pub fn last(&self, name: &str) -> Option<EventParams> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.clone())
    }
}

impl Analytics for RecordingAnalytics {
    fn log_event(&mut self, name: &str, params: &EventParams) -> Result<(), AnalyticsError> {
        self.events.borrow_mut().push((name.to_string(), params.clone()));
        Ok(())
    }
}

/// Rewarded-ad collaborator. `Ok(true)` grants the reward.
#[async_trait(?Send)]
pub trait AdProvider {
    async fn show_rewarded_ad(&mut self) -> Result<bool, AdError>;
}

/// Show an ad with a deadline; expiry is reported as `AdError::TimedOut`
pub async fn show_ad_within(ads: &mut dyn AdProvider, limit: Duration) -> Result<bool, AdError> {
    match tokio::time::timeout(limit, ads.show_rewarded_ad()).await {
        Ok(result) => result,
        Err(_) => Err(AdError::TimedOut(limit)),
    }
}

/// No ad network configured
#[derive(Debug, Default)]
pub struct NoAds;

#[async_trait(?Send)]
impl AdProvider for NoAds {
    async fn show_rewarded_ad(&mut self) -> Result<bool, AdError> {
        Err(AdError::Unavailable("no ad provider configured".into()))
    }
}

/// Replays queued results, then declines
#[derive(Debug, Clone, Default)]
pub struct ScriptedAds {
    results: VecDeque<Result<bool, AdError>>,
}

impl ScriptedAds {
    pub fn new(results: impl IntoIterator<Item = Result<bool, AdError>>) -> Self {
        Self {
            results: results.into_iter().collect(),
        }
    }
}

#[async_trait(?Send)]
impl AdProvider for ScriptedAds {
    async fn show_rewarded_ad(&mut self) -> Result<bool, AdError> {
        self.results.pop_front().unwrap_or(Ok(false))
    }
}

/// Level asset loading collaborator
#[async_trait(?Send)]
pub trait LevelAssets {
    async fn prepare(&mut self, level: u32) -> Result<(), AssetError>;
}

/// Prepare assets with a deadline; expiry is reported as `AssetError::TimedOut`
pub async fn prepare_within(
    assets: &mut dyn LevelAssets,
    level: u32,
    limit: Duration,
) -> Result<(), AssetError> {
    match tokio::time::timeout(limit, assets.prepare(level)).await {
        Ok(result) => result,
        Err(_) => Err(AssetError::TimedOut(limit)),
    }
}

/// Everything ships with the binary; always ready
#[derive(Debug, Default)]
pub struct BundledAssets;

#[async_trait(?Send)]
impl LevelAssets for BundledAssets {
    async fn prepare(&mut self, _level: u32) -> Result<(), AssetError> {
        Ok(())
    }
}

/// The full capability set handed to the game at construction
pub struct Services {
    pub store: Box<dyn ProgressStore>,
    pub analytics: Box<dyn Analytics>,
    pub ads: Box<dyn AdProvider>,
    pub assets: Box<dyn LevelAssets>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            analytics: Box::new(NullAnalytics),
            ads: Box::new(NoAds),
            assets: Box::new(BundledAssets),
        }
    }
}

impl Services {
    pub fn with_store(mut self, store: impl ProgressStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_analytics(mut self, analytics: impl Analytics + 'static) -> Self {
        self.analytics = Box::new(analytics);
        self
    }

    pub fn with_ads(mut self, ads: impl AdProvider + 'static) -> Self {
        self.ads = Box::new(ads);
        self
    }

    pub fn with_assets(mut self, assets: impl LevelAssets + 'static) -> Self {
        self.assets = Box::new(assets);
        self
    }

    /// Report an event; delivery failures are swallowed
    pub fn track(&mut self, event: &AnalyticsEvent) {
        if let Err(e) = self.analytics.log_event(event.name(), &event.params()) {
            log::debug!("Dropped analytics event {}: {}", event.name(), e);
        }
    }
}
