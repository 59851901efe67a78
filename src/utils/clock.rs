use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, SubsecRound};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    /// Current wall-clock time together with the local UTC offset.
    fn time(&self) -> DateTime<FixedOffset>;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<FixedOffset> {
        // Record files keep 100ns ticks, anything finer would be lost on save.
        Local::now().fixed_offset().trunc_subsecs(7)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
