//! Performance measurement providers.
//!
//! - **PageSpeed**: Google PageSpeed Insights (Lighthouse) per device
//! - **Fallback**: placeholder result with a reason, used when no API key is set
//!
//! Providers never fail: a live provider that cannot measure a device returns
//! the fallback entry for it instead.

mod fallback;
mod pagespeed;

pub use fallback::FallbackPerformance;
pub use pagespeed::PageSpeedProvider;

use async_trait::async_trait;
use futures::future::join_all;
use url::Url;

use crate::domain::models::{Device, DevicePerformance, DevicePreference, PerformanceResult};

#[async_trait]
pub trait PerformanceProvider: Send + Sync {
    /// Measure a single device. Always yields an entry for `device`.
    async fn measure(&self, url: &Url, device: Device) -> DevicePerformance;

    /// Human-readable name for this provider.
    fn name(&self) -> &'static str;
}

/// Measure every requested device concurrently.
pub async fn measure_all(
    provider: &dyn PerformanceProvider,
    url: &Url,
    preference: DevicePreference,
) -> PerformanceResult {
    let devices = preference.devices();
    log::info!(
        "[PERFORMANCE] Measuring {} ({}) with {}",
        url,
        devices.iter().map(Device::as_str).collect::<Vec<_>>().join(", "),
        provider.name()
    );
    let results = join_all(devices.into_iter().map(|device| provider.measure(url, device))).await;
    PerformanceResult::from_devices(results)
}
