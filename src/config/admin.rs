//! Admin editor configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Behaviour of the list editors and tables
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    /// Rows per table page when none is requested
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page a table may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Pointer travel in pixels before a press becomes a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: u32,

    /// Reload open editors when another session changes their collection
    #[serde(default = "default_live_refresh")]
    pub live_refresh: bool,
}

impl AdminConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_page_size == 0 || self.max_page_size > 500 {
            return Err(ValidationError::InvalidPageSize {
                max: 500,
                actual: self.max_page_size,
            });
        }
        if self.default_page_size == 0 {
            return Err(ValidationError::InvalidPageSize {
                max: self.max_page_size,
                actual: 0,
            });
        }
        if self.default_page_size > self.max_page_size {
            return Err(ValidationError::DefaultPageSizeTooLarge);
        }
        if self.drag_threshold_px > 100 {
            return Err(ValidationError::DragThresholdTooLarge);
        }
        Ok(())
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            drag_threshold_px: default_drag_threshold(),
            live_refresh: default_live_refresh(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_drag_threshold() -> u32 {
    5
}

fn default_live_refresh() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AdminConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.drag_threshold_px, 5);
        assert!(config.live_refresh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_page_may_not_exceed_maximum() {
        let config = AdminConfig {
            default_page_size: 50,
            max_page_size: 25,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::DefaultPageSizeTooLarge));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = AdminConfig {
            max_page_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPageSize { actual: 0, .. })
        ));
    }

    #[test]
    fn huge_drag_threshold_is_rejected() {
        let config = AdminConfig {
            drag_threshold_px: 400,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::DragThresholdTooLarge));
    }
}
