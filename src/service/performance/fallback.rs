use async_trait::async_trait;
use url::Url;

use super::PerformanceProvider;
use crate::domain::models::{Device, DevicePerformance};

/// Reports every device as unmeasured.
pub struct FallbackPerformance {
    reason: String,
}

impl FallbackPerformance {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn missing_key() -> Self {
        Self::new("PAGESPEED_API_KEY is not configured")
    }
}

#[async_trait]
impl PerformanceProvider for FallbackPerformance {
    async fn measure(&self, _url: &Url, device: Device) -> DevicePerformance {
        DevicePerformance::fallback(device, self.reason.clone())
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
