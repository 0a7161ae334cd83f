//! Service configuration.

use crate::region::DEFAULT_REGION_CAPACITY;
use crate::sweeper::SweeperConfig;

/// Configuration for [`super::SpatialLocationService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum concurrently monitored regions.
    pub region_capacity: usize,

    /// Expiration sweeping behavior.
    pub sweeper: SweeperConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region_capacity: DEFAULT_REGION_CAPACITY,
            sweeper: SweeperConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_matches_platform_limit() {
        assert_eq!(ServiceConfig::default().region_capacity, 20);
    }
}
