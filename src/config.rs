use crate::consts;
use crate::numbering::BoardPinMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for opening a GPIO driver.
///
/// # Examples
///
/// ```
/// use bcm_gpiomem::DriverConfig;
/// use std::time::Duration;
///
/// // /dev/gpiomem with a 20 ms debounce on event detection
/// let config = DriverConfig::gpiomem().with_debounce(Duration::from_millis(20));
/// assert_eq!(config.debounce, Duration::from_millis(20));
///
/// // /dev/mem on a BCM2837 (peripherals at 0x3F00_0000)
/// let config = DriverConfig::devmem(0x3F00_0000);
/// assert_eq!(config.base_offset, 0x3F20_0000);
/// ```
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Character device exposing the GPIO registers.
    pub device_path: PathBuf,
    /// Byte offset of the GPIO block within the device. Must be page aligned.
    pub base_offset: u64,
    /// Minimum time between two accepted events on the same pin.
    pub debounce: Duration,
    /// Spin iterations per settle delay; raised to 150 if lower.
    pub settle_cycles: u32,
    /// Optional board pin table enabling cross-scheme numbering conversion.
    pub board_map: Option<BoardPinMap>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(consts::DEFAULT_DEVICE_PATH),
            base_offset: 0,
            debounce: Duration::ZERO,
            settle_cycles: consts::MIN_SETTLE_CYCLES,
            board_map: None,
        }
    }
}

impl DriverConfig {
    /// Maps the GPIO block through `/dev/gpiomem`. No root needed.
    pub fn gpiomem() -> Self {
        Self::default()
    }

    /// Maps the GPIO block through `/dev/mem` given the SoC peripheral base.
    pub fn devmem(peripheral_base: u64) -> Self {
        Self {
            device_path: PathBuf::from(consts::DEVMEM_DEVICE_PATH),
            base_offset: peripheral_base + consts::GPIO_BLOCK_OFFSET,
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_board_map(mut self, board_map: BoardPinMap) -> Self {
        self.board_map = Some(board_map);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_config_default() {
        let config = DriverConfig::default();
        assert_eq!(config.device_path, PathBuf::from("/dev/gpiomem"));
        assert_eq!(config.base_offset, 0);
        assert_eq!(config.debounce, Duration::ZERO);
        assert_eq!(config.settle_cycles, 150);
        assert!(config.board_map.is_none());
    }

    #[test]
    fn test_driver_config_devmem() {
        let config = DriverConfig::devmem(0xFE00_0000);
        assert_eq!(config.device_path, PathBuf::from("/dev/mem"));
        assert_eq!(config.base_offset, 0xFE20_0000);
        assert_eq!(config.debounce, Duration::ZERO);
    }

    #[test]
    fn test_driver_config_builders() {
        let table = BoardPinMap::new([(7, 4)]).unwrap();
        let config = DriverConfig::gpiomem()
            .with_debounce(Duration::from_millis(5))
            .with_board_map(table.clone());
        assert_eq!(config.debounce, Duration::from_millis(5));
        assert_eq!(config.board_map, Some(table));
    }
}
