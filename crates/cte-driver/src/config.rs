//! Platform configuration of one CTE instance.

/// Reference input clock of the CTE.
pub const DEFAULT_INPUT_CLOCK_HZ: u32 = 80_000_000;
/// Interrupt line of the CTE on the S32R family.
pub const DEFAULT_IRQ_NUMBER: u32 = 263;
/// MIPI-CSI2 virtual channels selectable as trigger source.
pub const CSI2_VIRTUAL_CHANNEL_COUNT: u8 = 4;

/// SoC variant hosting the CTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Platform {
    /// S32R45, four MIPI-CSI2 receivers.
    #[default]
    S32R45,
    /// S32R294, two MIPI-CSI2 receivers.
    S32R294,
}

impl Platform {
    /// Number of MIPI-CSI2 units usable as slave trigger source.
    #[must_use]
    pub const fn csi2_unit_count(self) -> u8 {
        match self {
            Self::S32R45 => 4,
            Self::S32R294 => 2,
        }
    }
}

/// Instance configuration consumed by [`crate::Cte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CteConfig {
    /// SoC variant.
    pub platform: Platform,
    /// Interrupt number handed to the interrupt registrar.
    pub irq_number: u32,
    /// Nominal input clock, used by callers building [`crate::SetupParams`].
    pub input_clock_hz: u32,
}

impl Default for CteConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            irq_number: DEFAULT_IRQ_NUMBER,
            input_clock_hz: DEFAULT_INPUT_CLOCK_HZ,
        }
    }
}

impl CteConfig {
    /// Default configuration for `platform`.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CteConfig, Platform, DEFAULT_INPUT_CLOCK_HZ, DEFAULT_IRQ_NUMBER};

    #[test]
    fn default_config_targets_s32r45() {
        let config = CteConfig::default();
        assert_eq!(config.platform, Platform::S32R45);
        assert_eq!(config.irq_number, DEFAULT_IRQ_NUMBER);
        assert_eq!(config.input_clock_hz, DEFAULT_INPUT_CLOCK_HZ);
    }

    #[test]
    fn csi2_unit_count_depends_on_platform() {
        assert_eq!(Platform::S32R45.csi2_unit_count(), 4);
        assert_eq!(
            CteConfig::for_platform(Platform::S32R294)
                .platform
                .csi2_unit_count(),
            2
        );
    }
}
