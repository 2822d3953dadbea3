use rand::Rng;
use std::time::Duration;
use tracing::debug;

use crate::config::{bounded_duration, DelayRange, PacingConfig, MAX_WAIT_SECS};

/// Which configured delay to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    PageStart,
    AfterConsent,
    AfterScroll,
    BeforeClick,
    AfterAdvance,
    PerCard,
}

/// Randomized, human-looking delays between browser actions
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self::new(PacingConfig::disabled())
    }

    fn range(&self, pause: Pause) -> DelayRange {
        match pause {
            Pause::PageStart => self.config.page_start,
            Pause::AfterConsent => self.config.after_consent,
            Pause::AfterScroll => self.config.after_scroll,
            Pause::BeforeClick => self.config.before_click,
            Pause::AfterAdvance => self.config.after_advance,
            Pause::PerCard => self.config.per_card,
        }
    }

    /// Draw a delay for `pause` without sleeping. Never longer than
    /// [`MAX_WAIT_SECS`], whatever the configured range.
    pub fn draw(&self, pause: Pause) -> Duration {
        let range = self.range(pause);
        if range.is_disabled() || range.max.is_nan() {
            return Duration::ZERO;
        }
        let max = range.max.min(MAX_WAIT_SECS);
        let min = if range.min.is_nan() { 0.0 } else { range.min.clamp(0.0, max) };
        let secs = if min >= max {
            max
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        bounded_duration(secs)
    }

    pub async fn pause(&self, pause: Pause) {
        let delay = self.draw(pause);
        if delay.is_zero() {
            return;
        }
        if pause != Pause::PerCard {
            debug!("Pausing {:.2}s ({:?})", delay.as_secs_f64(), pause);
        }
        tokio::time::sleep(delay).await;
    }
}
