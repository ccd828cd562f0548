use async_trait::async_trait;

use crate::error::MetricsError;
use crate::state::EngagementMetrics;

/// Source of engagement measurements for a post
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch(&self, post_reference: &str) -> Result<EngagementMetrics, MetricsError>;
}
