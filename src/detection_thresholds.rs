use crate::registers::InterruptConfig;
use crate::results::{fixpoint1616_to_fixpoint97, fixpoint97_to_fixpoint1616};
use crate::preset::INTERRUPT_CONFIG_NEW_SAMPLE_READY;
use crate::{BusOperation, Vl53l1x, Error, OutputPin, DelayNs};

/// When a threshold fires, relative to its low/high bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ThresholdMode {
    Below = 0,
    Above = 1,
    OutOfWindow = 2,
    InWindow = 3,
}

impl ThresholdMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ThresholdMode::Below,
            1 => ThresholdMode::Above,
            2 => ThresholdMode::OutOfWindow,
            _ => ThresholdMode::InWindow,
        }
    }

    fn is_window(self) -> bool {
        matches!(self, ThresholdMode::OutOfWindow | ThresholdMode::InWindow)
    }
}

/// What raises the interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DetectionMode {
    /// Every new measurement.
    NormalRun = 0,
    DistanceOnly = 1,
    RateOnly = 2,
    DistanceAndRate = 3,
    DistanceOrRate = 4,
}

/// Distance bounds in millimetres.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceThreshold {
    pub cross_mode: ThresholdMode,
    pub high: u16,
    pub low: u16,
}

/// Signal rate bounds in Mcps, 16.16.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateThreshold {
    pub cross_mode: ThresholdMode,
    pub high: u32,
    pub low: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectionConfig {
    pub detection_mode: DetectionMode,
    /// Also interrupt when no target is found.
    pub intr_no_target: bool,
    pub distance: DistanceThreshold,
    pub rate: RateThreshold,
}

/* Interrupt configuration byte plus the four threshold registers */
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct GpioInterruptConfig {
    config: InterruptConfig,
    threshold_distance_high: u16,
    threshold_distance_low: u16,
    threshold_rate_high: u16,
    threshold_rate_low: u16,
}

fn bad_bounds<V: PartialOrd>(cross_mode: ThresholdMode, low: V, high: V) -> bool {
    cross_mode.is_window() && low > high
}

/* Device distance thresholds are compared against the range before gain correction */
fn distance_to_device(distance_mm: u16, gain: u32) -> u16 {
    ((((distance_mm as u32) << 16) + 32768) / gain & 0xFFFF) as u16
}

/// Builds the interrupt configuration for `config`. `None` when window
/// bounds are reversed.
fn build_interrupt_config(config: &DetectionConfig, gain_factor: u16, current: GpioInterruptConfig) -> Option<GpioInterruptConfig> {
    let mut gpio = current;

    if config.detection_mode == DetectionMode::NormalRun {
        gpio.config = InterruptConfig(INTERRUPT_CONFIG_NEW_SAMPLE_READY);
        return Some(gpio);
    }

    if bad_bounds(config.distance.cross_mode, config.distance.low, config.distance.high)
        || bad_bounds(config.rate.cross_mode, config.rate.low, config.rate.high)
    {
        return None;
    }

    let mut interrupt = InterruptConfig(0);
    interrupt.set_no_target(config.intr_no_target);
    interrupt.set_distance_mode(config.distance.cross_mode as u8);
    interrupt.set_rate_mode(config.rate.cross_mode as u8);
    interrupt.set_combined(config.detection_mode != DetectionMode::DistanceAndRate);
    gpio.config = interrupt;

    if gain_factor != 0 {
        let gain = (gain_factor as u32) << 5;
        gpio.threshold_distance_high = distance_to_device(config.distance.high, gain);
        gpio.threshold_distance_low = distance_to_device(config.distance.low, gain);
    }
    gpio.threshold_rate_high = fixpoint1616_to_fixpoint97(config.rate.high);
    gpio.threshold_rate_low = fixpoint1616_to_fixpoint97(config.rate.low);

    match config.detection_mode {
        DetectionMode::DistanceOnly => {
            gpio.threshold_rate_high = 0;
            gpio.threshold_rate_low = 0;
        }
        DetectionMode::RateOnly => {
            gpio.threshold_distance_high = 0;
            gpio.threshold_distance_low = 0;
        }
        _ => {}
    }

    Some(gpio)
}

fn detection_config_from(gpio: &GpioInterruptConfig) -> DetectionConfig {
    let interrupt = gpio.config;

    let detection_mode = if interrupt.new_sample_ready() {
        DetectionMode::NormalRun
    } else if !interrupt.combined() {
        DetectionMode::DistanceAndRate
    } else if gpio.threshold_distance_high == 0 && gpio.threshold_distance_low == 0 {
        DetectionMode::RateOnly
    } else if gpio.threshold_rate_high == 0 && gpio.threshold_rate_low == 0 {
        DetectionMode::DistanceOnly
    } else {
        DetectionMode::DistanceOrRate
    };

    DetectionConfig {
        detection_mode,
        intr_no_target: interrupt.no_target(),
        distance: DistanceThreshold {
            cross_mode: ThresholdMode::from_bits(interrupt.distance_mode()),
            high: gpio.threshold_distance_high,
            low: gpio.threshold_distance_low,
        },
        rate: RateThreshold {
            cross_mode: ThresholdMode::from_bits(interrupt.rate_mode()),
            high: fixpoint97_to_fixpoint1616(gpio.threshold_rate_high),
            low: fixpoint97_to_fixpoint1616(gpio.threshold_rate_low),
        },
    }
}

impl<B: BusOperation, XS: OutputPin, T: DelayNs> Vl53l1x<B, XS, T> {
    fn get_gpio_interrupt_config(&self) -> GpioInterruptConfig {
        GpioInterruptConfig {
            config: InterruptConfig(self.cfg.gen_cfg.system_interrupt_config_gpio),
            threshold_distance_high: self.cfg.dyn_cfg.system_thresh_high,
            threshold_distance_low: self.cfg.dyn_cfg.system_thresh_low,
            threshold_rate_high: self.cfg.gen_cfg.system_thresh_rate_high,
            threshold_rate_low: self.cfg.gen_cfg.system_thresh_rate_low,
        }
    }

    fn set_gpio_interrupt_config(&mut self, gpio: &GpioInterruptConfig) {
        self.cfg.gen_cfg.system_interrupt_config_gpio = gpio.config.0;
        self.cfg.dyn_cfg.system_thresh_high = gpio.threshold_distance_high;
        self.cfg.dyn_cfg.system_thresh_low = gpio.threshold_distance_low;
        self.cfg.gen_cfg.system_thresh_rate_high = gpio.threshold_rate_high;
        self.cfg.gen_cfg.system_thresh_rate_low = gpio.threshold_rate_low;
    }

    /// This function programs the threshold detection. It is applied at the next start.
    ///
    /// # Arguments
    ///
    /// * `config` : Detection mode and thresholds. Window modes need `low <= high`.
    pub fn set_threshold_config(&mut self, config: &DetectionConfig) -> Result<(), Error<B::Error>> {
        let current = self.get_gpio_interrupt_config();
        let gpio = build_interrupt_config(config, self.gain_factor, current).ok_or(Error::InvalidParams)?;
        self.set_gpio_interrupt_config(&gpio);

        log::debug!("vl53l1x: threshold detection {:?}", config.detection_mode);
        Ok(())
    }

    /// This function gets the threshold detection configuration.
    ///
    /// # Return
    ///
    /// `config` : Distances are returned as programmed in the device, before gain correction.
    pub fn get_threshold_config(&self) -> DetectionConfig {
        detection_config_from(&self.get_gpio_interrupt_config())
    }
}
