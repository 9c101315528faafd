//! Device presets, distance modes and tuning parameters.
//!
//! Only the configurations the ranging API can select are carried: standard
//! (lite), timed (autonomous) and low-power autonomous ranging, each in a
//! short, medium and long distance flavour.

use crate::registers::*;

/// Ranging preset selected through the ranging API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PresetMode {
    Autonomous = 3,
    LiteRanging = 4,
    LowPowerAutonomous = 8,
}

/// Raw value that names no supported preset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedPresetMode(pub u8);

impl TryFrom<u8> for PresetMode {
    type Error = UnsupportedPresetMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(PresetMode::Autonomous),
            4 => Ok(PresetMode::LiteRanging),
            8 => Ok(PresetMode::LowPowerAutonomous),
            other => Err(UnsupportedPresetMode(other)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DistanceMode {
    Short = 1,
    Medium = 2,
    Long = 3,
}

/// Raw value that names no distance mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidDistanceMode(pub u8);

impl TryFrom<u8> for DistanceMode {
    type Error = InvalidDistanceMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DistanceMode::Short),
            2 => Ok(DistanceMode::Medium),
            3 => Ok(DistanceMode::Long),
            other => Err(InvalidDistanceMode(other)),
        }
    }
}

/// Configuration the low-level driver applies to the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DevicePresetMode {
    StandardRangingShort,
    StandardRanging,
    StandardRangingLong,
    TimedRangingShort,
    TimedRanging,
    TimedRangingLong,
    LowPowerAutoShort,
    LowPowerAutoMedium,
    LowPowerAutoLong,
}

impl DevicePresetMode {
    pub fn is_low_power_auto(self) -> bool {
        matches!(
            self,
            DevicePresetMode::LowPowerAutoShort | DevicePresetMode::LowPowerAutoMedium | DevicePresetMode::LowPowerAutoLong
        )
    }
}

pub fn compute_device_preset_mode(preset_mode: PresetMode, distance_mode: DistanceMode) -> DevicePresetMode {
    use DevicePresetMode::*;

    match (preset_mode, distance_mode) {
        (PresetMode::LiteRanging, DistanceMode::Short) => StandardRangingShort,
        (PresetMode::LiteRanging, DistanceMode::Medium) => StandardRanging,
        (PresetMode::LiteRanging, DistanceMode::Long) => StandardRangingLong,
        (PresetMode::Autonomous, DistanceMode::Short) => TimedRangingShort,
        (PresetMode::Autonomous, DistanceMode::Medium) => TimedRanging,
        (PresetMode::Autonomous, DistanceMode::Long) => TimedRangingLong,
        (PresetMode::LowPowerAutonomous, DistanceMode::Short) => LowPowerAutoShort,
        (PresetMode::LowPowerAutonomous, DistanceMode::Medium) => LowPowerAutoMedium,
        (PresetMode::LowPowerAutonomous, DistanceMode::Long) => LowPowerAutoLong,
    }
}

/// Reference SPAD characterisation settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefSpadCharConfig {
    pub device_test_mode: u8,
    pub vcsel_period: u8,
    pub timeout_us: u32,
    pub target_count_rate_mcps: u16,
    pub min_count_rate_limit_mcps: u16,
    pub max_count_rate_limit_mcps: u16,
}

/// Tuning parameters. `Default` gives the factory values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TuningParams {
    pub lite_phasecal_config_timeout_us: u32,
    pub lite_mm_config_timeout_us: u32,
    pub lite_range_config_timeout_us: u32,
    pub timed_phasecal_config_timeout_us: u32,
    pub timed_mm_config_timeout_us: u32,
    pub timed_range_config_timeout_us: u32,
    pub lowpowerauto_mm_config_timeout_us: u32,
    pub lowpowerauto_range_config_timeout_us: u32,
    pub dss_config_target_total_rate_mcps: u16,

    pub lite_sigma_est_pulse_width_ns: u8,
    pub lite_sigma_est_amb_width_ns: u8,
    pub lite_sigma_ref_mm: u8,
    pub lite_min_clip_mm: u8,
    pub consistency_lite_phase_tolerance: u8,
    pub lite_sigma_thresh_mm: u16,
    pub lite_min_count_rate_rtn_mcps: u16,
    pub phasecal_target: u8,
    pub cal_repeat_rate: u16,
    pub lite_seed_config: u8,
    pub timed_seed_config: u8,
    pub lite_quantifier: u8,
    pub lite_first_order_select: u8,
    pub init_phase_rtn_lite_short: u8,
    pub init_phase_rtn_lite_med: u8,
    pub init_phase_rtn_lite_long: u8,
    pub init_phase_ref_lite_short: u8,
    pub init_phase_ref_lite_med: u8,
    pub init_phase_ref_lite_long: u8,

    pub vhv_loop_bound: u8,
    pub lowpowerauto_vhv_loop_bound: u8,
    pub lite_ranging_gain_factor: u16,
    /// Negative ranges below this are reported as invalid instead of 0.
    pub proxy_min_mm: i16,
    pub offset_cal_max_samples: u32,
    pub offset_cal_repeat: u32,
    pub ref_spad_char: RefSpadCharConfig,
}

impl Default for TuningParams {
    fn default() -> Self {
        TuningParams {
            lite_phasecal_config_timeout_us: 1000,
            lite_mm_config_timeout_us: 2000,
            lite_range_config_timeout_us: 63000,
            timed_phasecal_config_timeout_us: 1000,
            timed_mm_config_timeout_us: 2000,
            timed_range_config_timeout_us: 13000,
            lowpowerauto_mm_config_timeout_us: 1,
            lowpowerauto_range_config_timeout_us: 8700,
            dss_config_target_total_rate_mcps: 0x0A00,

            lite_sigma_est_pulse_width_ns: 8,
            lite_sigma_est_amb_width_ns: 16,
            lite_sigma_ref_mm: 1,
            lite_min_clip_mm: 0,
            consistency_lite_phase_tolerance: 2,
            lite_sigma_thresh_mm: 360,
            lite_min_count_rate_rtn_mcps: 192,
            phasecal_target: 0x21,
            cal_repeat_rate: 0,
            lite_seed_config: 2,
            timed_seed_config: 1,
            lite_quantifier: 2,
            lite_first_order_select: 0,
            init_phase_rtn_lite_short: 6,
            init_phase_rtn_lite_med: 10,
            init_phase_rtn_lite_long: 14,
            init_phase_ref_lite_short: 6,
            init_phase_ref_lite_med: 10,
            init_phase_ref_lite_long: 14,

            vhv_loop_bound: 32,
            lowpowerauto_vhv_loop_bound: 3,
            lite_ranging_gain_factor: 2011,
            proxy_min_mm: -30,
            offset_cal_max_samples: 50,
            offset_cal_repeat: 1,
            ref_spad_char: RefSpadCharConfig {
                device_test_mode: 0x08,
                vcsel_period: 0x0B,
                timeout_us: 1000,
                target_count_rate_mcps: 0x0A00,
                min_count_rate_limit_mcps: 0x0500,
                max_count_rate_limit_mcps: 0x1400,
            },
        }
    }
}

/// Timing inputs of a preset: DSS target rate and the phasecal, MM and
/// range timeouts in microseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresetTiming {
    pub dss_config_target_total_rate_mcps: u16,
    pub phasecal_config_timeout_us: u32,
    pub mm_config_timeout_us: u32,
    pub range_config_timeout_us: u32,
}

pub fn get_preset_mode_timing_cfg(device_preset: DevicePresetMode, tuning: &TuningParams) -> PresetTiming {
    use DevicePresetMode::*;

    let dss = tuning.dss_config_target_total_rate_mcps;
    match device_preset {
        StandardRangingShort | StandardRanging | StandardRangingLong => PresetTiming {
            dss_config_target_total_rate_mcps: dss,
            phasecal_config_timeout_us: tuning.lite_phasecal_config_timeout_us,
            mm_config_timeout_us: tuning.lite_mm_config_timeout_us,
            range_config_timeout_us: tuning.lite_range_config_timeout_us,
        },
        TimedRangingShort | TimedRanging | TimedRangingLong => PresetTiming {
            dss_config_target_total_rate_mcps: dss,
            phasecal_config_timeout_us: tuning.timed_phasecal_config_timeout_us,
            mm_config_timeout_us: tuning.timed_mm_config_timeout_us,
            range_config_timeout_us: tuning.timed_range_config_timeout_us,
        },
        LowPowerAutoShort | LowPowerAutoMedium | LowPowerAutoLong => PresetTiming {
            dss_config_target_total_rate_mcps: dss,
            phasecal_config_timeout_us: tuning.timed_phasecal_config_timeout_us,
            mm_config_timeout_us: tuning.lowpowerauto_mm_config_timeout_us,
            range_config_timeout_us: tuning.lowpowerauto_range_config_timeout_us,
        },
    }
}

/// Shadow of the writable configuration groups.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub stat_cfg: StaticConfig,
    pub gen_cfg: GeneralConfig,
    pub tim_cfg: TimingConfig,
    pub dyn_cfg: DynamicConfig,
    pub sys_ctrl: SystemControl,
}

/// Low-power autonomous bookkeeping carried across ranges.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPowerAutoData {
    pub vhv_loop_bound: u8,
    pub is_low_power_auto_mode: bool,
    pub low_power_auto_range_count: u8,
    pub saved_interrupt_config: u8,
    pub saved_vhv_init: u8,
    pub saved_vhv_timeout: u8,
    pub first_run_phasecal_result: u8,
    pub dss_total_rate_per_spad_mcps: u32,
    pub dss_required_spads: u16,
}

impl LowPowerAutoData {
    pub fn new(tuning: &TuningParams) -> Self {
        LowPowerAutoData { vhv_loop_bound: tuning.lowpowerauto_vhv_loop_bound, ..Default::default() }
    }
}

/* Device interrupt and DSS mode values used by the presets */
const DEVICE_INTERRUPT_POLARITY_ACTIVE_LOW: u8 = 0x10;
const DEVICE_GPIO_MODE_OUTPUT_RANGE_AND_ERROR_INTERRUPTS: u8 = 0x01;
pub const INTERRUPT_CONFIG_NEW_SAMPLE_READY: u8 = 0x20;
pub const DEVICE_DSS_MODE_TARGET_RATE: u8 = 0x01;
pub const DEVICE_DSS_MODE_REQUESTED_EFFECTIVE_SPADS: u8 = 0x02;
pub const CLEAR_RANGE_INT: u8 = 0x01;
const DEVICE_SCHEDULER_MODE_STREAMING: u8 = 0x01;
const DEVICE_READOUT_MODE_SINGLE_SD: u8 = 0x00;

/* The full configuration write covers the pad register set by data_init */
#[cfg(feature = "VL53L1X_I2C_2V8")]
const PAD_I2C_HV_EXTSUP_CONFIG: u8 = 0x01;
#[cfg(not(feature = "VL53L1X_I2C_2V8"))]
const PAD_I2C_HV_EXTSUP_CONFIG: u8 = 0x00;

fn preset_standard_ranging(tuning: &TuningParams, cfg: &mut DeviceConfig) {
    cfg.stat_cfg = StaticConfig {
        dss_config_target_total_rate_mcps: 0x0A00,
        debug_ctrl: 0x00,
        test_mode_ctrl: 0x00,
        clk_gating_ctrl: 0x00,
        nvm_bist_ctrl: 0x00,
        nvm_bist_num_nvm_words: 0x00,
        nvm_bist_start_address: 0x00,
        host_if_status: 0x00,
        pad_i2c_hv_config: 0x00,
        pad_i2c_hv_extsup_config: PAD_I2C_HV_EXTSUP_CONFIG,
        gpio_hv_pad_ctrl: 0x00,
        gpio_hv_mux_ctrl: DEVICE_INTERRUPT_POLARITY_ACTIVE_LOW | DEVICE_GPIO_MODE_OUTPUT_RANGE_AND_ERROR_INTERRUPTS,
        gpio_tio_hv_status: 0x02,
        gpio_fio_hv_status: 0x00,
        ana_config_spad_sel_pswidth: 0x02,
        ana_config_vcsel_pulse_width_offset: 0x08,
        ana_config_fast_osc_config_ctrl: 0x00,
        sigma_estimator_effective_pulse_width_ns: tuning.lite_sigma_est_pulse_width_ns,
        sigma_estimator_effective_ambient_width_ns: tuning.lite_sigma_est_amb_width_ns,
        sigma_estimator_sigma_ref_mm: tuning.lite_sigma_ref_mm,
        algo_crosstalk_compensation_valid_height_mm: 0x01,
        spare_host_config_static_config_spare_0: 0x00,
        spare_host_config_static_config_spare_1: 0x00,
        algo_range_ignore_threshold_mcps: 0x0000,
        algo_range_ignore_valid_height_mm: 0xFF,
        algo_range_min_clip: tuning.lite_min_clip_mm,
        algo_consistency_check_tolerance: tuning.consistency_lite_phase_tolerance,
        spare_host_config_static_config_spare_2: 0x00,
        sd_config_reset_stages_msb: 0x00,
        sd_config_reset_stages_lsb: 0x00,
    };

    cfg.gen_cfg = GeneralConfig {
        gph_config_stream_count_update_value: 0x00,
        global_config_stream_divider: 0x00,
        system_interrupt_config_gpio: INTERRUPT_CONFIG_NEW_SAMPLE_READY,
        cal_config_vcsel_start: 0x0B,
        cal_config_repeat_rate: tuning.cal_repeat_rate,
        global_config_vcsel_width: 0x02,
        phasecal_config_timeout_macrop: 0x0D,
        phasecal_config_target: tuning.phasecal_target,
        phasecal_config_override: 0x00,
        dss_config_roi_mode_control: DEVICE_DSS_MODE_TARGET_RATE,
        system_thresh_rate_high: 0x0000,
        system_thresh_rate_low: 0x0000,
        dss_config_manual_effective_spads_select: 0x8C00,
        dss_config_manual_block_select: 0x00,
        dss_config_aperture_attenuation: 0x38,
        dss_config_max_spads_limit: 0xFF,
        dss_config_min_spads_limit: 0x01,
    };

    cfg.tim_cfg = TimingConfig {
        mm_config_timeout_macrop_a: 0x001A,
        mm_config_timeout_macrop_b: 0x0020,
        range_config_timeout_macrop_a: 0x01CC,
        range_config_vcsel_period_a: 0x0B,
        range_config_timeout_macrop_b: 0x01F5,
        range_config_vcsel_period_b: 0x09,
        range_config_sigma_thresh: tuning.lite_sigma_thresh_mm,
        range_config_min_count_rate_rtn_limit_mcps: tuning.lite_min_count_rate_rtn_mcps,
        range_config_valid_phase_low: 0x08,
        range_config_valid_phase_high: 0x78,
        system_intermeasurement_period: 0,
        system_fractional_enable: 0,
    };

    cfg.dyn_cfg = DynamicConfig {
        system_grouped_parameter_hold_0: 0x01,
        system_thresh_high: 0x0000,
        system_thresh_low: 0x0000,
        system_enable_xtalk_per_quadrant: 0x00,
        system_seed_config: tuning.lite_seed_config,
        sd_config_woi_sd0: 0x0B,
        sd_config_woi_sd1: 0x09,
        sd_config_initial_phase_sd0: tuning.init_phase_rtn_lite_med,
        sd_config_initial_phase_sd1: tuning.init_phase_ref_lite_med,
        system_grouped_parameter_hold_1: 0x01,
        sd_config_first_order_select: tuning.lite_first_order_select,
        sd_config_quantifier: tuning.lite_quantifier,
        roi_config_user_roi_centre_spad: 0xC7,
        roi_config_user_roi_requested_global_xy_size: 0xFF,
        system_sequence_config: SEQUENCE_VHV_EN
            | SEQUENCE_PHASECAL_EN
            | SEQUENCE_DSS1_EN
            | SEQUENCE_DSS2_EN
            | SEQUENCE_MM2_EN
            | SEQUENCE_RANGE_EN,
        system_grouped_parameter_hold: 0x02,
    };

    cfg.sys_ctrl = SystemControl {
        power_management_go1_power_force: cfg.sys_ctrl.power_management_go1_power_force,
        system_stream_count_ctrl: 0x00,
        firmware_enable: 0x01,
        system_interrupt_clear: CLEAR_RANGE_INT,
        system_mode_start: DEVICE_SCHEDULER_MODE_STREAMING
            | DEVICE_READOUT_MODE_SINGLE_SD
            | crate::state::DeviceMeasurementMode::BackToBack.bits(),
    };
}

fn preset_standard_ranging_short(tuning: &TuningParams, cfg: &mut DeviceConfig) {
    preset_standard_ranging(tuning, cfg);

    cfg.tim_cfg.range_config_vcsel_period_a = 0x07;
    cfg.tim_cfg.range_config_vcsel_period_b = 0x05;
    cfg.tim_cfg.range_config_valid_phase_high = 0x38;

    cfg.dyn_cfg.sd_config_woi_sd0 = 0x07;
    cfg.dyn_cfg.sd_config_woi_sd1 = 0x05;
    cfg.dyn_cfg.sd_config_initial_phase_sd0 = tuning.init_phase_rtn_lite_short;
    cfg.dyn_cfg.sd_config_initial_phase_sd1 = tuning.init_phase_ref_lite_short;
}

fn preset_standard_ranging_long(tuning: &TuningParams, cfg: &mut DeviceConfig) {
    preset_standard_ranging(tuning, cfg);

    cfg.tim_cfg.range_config_vcsel_period_a = 0x0F;
    cfg.tim_cfg.range_config_vcsel_period_b = 0x0D;
    cfg.tim_cfg.range_config_valid_phase_high = 0xB8;

    cfg.dyn_cfg.sd_config_woi_sd0 = 0x0F;
    cfg.dyn_cfg.sd_config_woi_sd1 = 0x0D;
    cfg.dyn_cfg.sd_config_initial_phase_sd0 = tuning.init_phase_rtn_lite_long;
    cfg.dyn_cfg.sd_config_initial_phase_sd1 = tuning.init_phase_ref_lite_long;
}

/// Turns a standard ranging configuration into timed ranging.
fn make_timed(tuning: &TuningParams, cfg: &mut DeviceConfig) {
    cfg.dyn_cfg.system_grouped_parameter_hold = 0x00;

    cfg.tim_cfg.range_config_timeout_macrop_a = 0x00B1;
    cfg.tim_cfg.range_config_timeout_macrop_b = 0x00D4;
    cfg.tim_cfg.system_intermeasurement_period = 0x0000_0600;
    cfg.dyn_cfg.system_seed_config = tuning.timed_seed_config;

    cfg.sys_ctrl.system_mode_start = DEVICE_SCHEDULER_MODE_STREAMING
        | DEVICE_READOUT_MODE_SINGLE_SD
        | crate::state::DeviceMeasurementMode::Timed.bits();
}

/// Low-power autonomous: MM1, MM2 and DSS2 off, manual effective SPADs.
pub fn config_low_power_auto_mode(cfg: &mut DeviceConfig, lpa: &mut LowPowerAutoData) {
    lpa.is_low_power_auto_mode = true;
    lpa.low_power_auto_range_count = 0;

    cfg.dyn_cfg.system_sequence_config = SEQUENCE_VHV_EN | SEQUENCE_PHASECAL_EN | SEQUENCE_DSS1_EN | SEQUENCE_RANGE_EN;

    cfg.gen_cfg.dss_config_manual_effective_spads_select = 200 << 8;
    cfg.gen_cfg.dss_config_roi_mode_control = DEVICE_DSS_MODE_REQUESTED_EFFECTIVE_SPADS;
}

/// Loads the register configuration of `device_preset` into `cfg`.
pub fn apply_device_preset(
    device_preset: DevicePresetMode,
    tuning: &TuningParams,
    cfg: &mut DeviceConfig,
    lpa: &mut LowPowerAutoData,
) {
    use DevicePresetMode::*;

    lpa.is_low_power_auto_mode = false;

    match device_preset {
        StandardRangingShort | TimedRangingShort | LowPowerAutoShort => preset_standard_ranging_short(tuning, cfg),
        StandardRanging | TimedRanging | LowPowerAutoMedium => preset_standard_ranging(tuning, cfg),
        StandardRangingLong | TimedRangingLong | LowPowerAutoLong => preset_standard_ranging_long(tuning, cfg),
    }

    match device_preset {
        StandardRangingShort | StandardRanging | StandardRangingLong => {}
        TimedRangingShort | TimedRanging | TimedRangingLong => make_timed(tuning, cfg),
        LowPowerAutoShort | LowPowerAutoMedium | LowPowerAutoLong => {
            make_timed(tuning, cfg);
            config_low_power_auto_mode(cfg, lpa);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(preset: DevicePresetMode) -> (DeviceConfig, LowPowerAutoData) {
        let tuning = TuningParams::default();
        let mut cfg = DeviceConfig::default();
        let mut lpa = LowPowerAutoData::new(&tuning);
        apply_device_preset(preset, &tuning, &mut cfg, &mut lpa);
        (cfg, lpa)
    }

    #[test]
    fn raw_modes() {
        assert_eq!(PresetMode::try_from(4), Ok(PresetMode::LiteRanging));
        assert_eq!(PresetMode::try_from(1), Err(UnsupportedPresetMode(1)));
        assert_eq!(DistanceMode::try_from(3), Ok(DistanceMode::Long));
        assert_eq!(DistanceMode::try_from(0), Err(InvalidDistanceMode(0)));
    }

    #[test]
    fn standard_ranging_is_back_to_back_with_gph() {
        let (cfg, lpa) = apply(DevicePresetMode::StandardRanging);
        assert_eq!(cfg.sys_ctrl.system_mode_start, 0x21);
        assert_eq!(cfg.dyn_cfg.system_grouped_parameter_hold, 0x02);
        assert_eq!(cfg.dyn_cfg.system_sequence_config, 0xDB);
        assert_eq!(cfg.tim_cfg.range_config_vcsel_period_a, 0x0B);
        assert_eq!(cfg.tim_cfg.range_config_sigma_thresh, 360);
        assert_eq!(cfg.tim_cfg.range_config_min_count_rate_rtn_limit_mcps, 192);
        assert_eq!(cfg.stat_cfg.gpio_hv_mux_ctrl, 0x11);
        assert!(!lpa.is_low_power_auto_mode);
    }

    #[test]
    fn reapplying_a_preset_resets_the_whole_static_config() {
        let tuning = TuningParams::default();
        let mut lpa = LowPowerAutoData::new(&tuning);
        let mut cfg = DeviceConfig::default();
        cfg.stat_cfg.test_mode_ctrl = 0x08;
        cfg.stat_cfg.debug_ctrl = 0x01;
        cfg.stat_cfg.nvm_bist_ctrl = 0x1F;
        cfg.stat_cfg.sd_config_reset_stages_lsb = 0x07;

        apply_device_preset(DevicePresetMode::LowPowerAutoLong, &tuning, &mut cfg, &mut lpa);

        let (fresh, _) = apply(DevicePresetMode::LowPowerAutoLong);
        assert_eq!(cfg.stat_cfg, fresh.stat_cfg);
        assert_eq!(cfg.stat_cfg.test_mode_ctrl, 0x00);
    }

    #[test]
    fn distance_flavours_change_vcsel_and_windows() {
        let (short, _) = apply(DevicePresetMode::StandardRangingShort);
        assert_eq!((short.tim_cfg.range_config_vcsel_period_a, short.tim_cfg.range_config_vcsel_period_b), (0x07, 0x05));
        assert_eq!(short.tim_cfg.range_config_valid_phase_high, 0x38);
        assert_eq!((short.dyn_cfg.sd_config_initial_phase_sd0, short.dyn_cfg.sd_config_initial_phase_sd1), (6, 6));

        let (long, _) = apply(DevicePresetMode::TimedRangingLong);
        assert_eq!((long.dyn_cfg.sd_config_woi_sd0, long.dyn_cfg.sd_config_woi_sd1), (0x0F, 0x0D));
        assert_eq!(long.tim_cfg.range_config_valid_phase_high, 0xB8);
        assert_eq!((long.dyn_cfg.sd_config_initial_phase_sd0, long.dyn_cfg.sd_config_initial_phase_sd1), (14, 14));
    }

    #[test]
    fn timed_ranging_drops_gph_and_uses_timed_seed() {
        let (cfg, _) = apply(DevicePresetMode::TimedRanging);
        assert_eq!(cfg.sys_ctrl.system_mode_start, 0x41);
        assert_eq!(cfg.dyn_cfg.system_grouped_parameter_hold, 0x00);
        assert_eq!(cfg.dyn_cfg.system_seed_config, 1);
        assert_eq!(cfg.tim_cfg.system_intermeasurement_period, 0x600);
    }

    #[test]
    fn low_power_auto_uses_requested_spads() {
        let (cfg, lpa) = apply(DevicePresetMode::LowPowerAutoLong);
        assert!(lpa.is_low_power_auto_mode);
        assert_eq!(lpa.low_power_auto_range_count, 0);
        assert_eq!(lpa.vhv_loop_bound, 3);
        assert_eq!(cfg.dyn_cfg.system_sequence_config, 0x8B);
        assert_eq!(cfg.gen_cfg.dss_config_manual_effective_spads_select, 200 << 8);
        assert_eq!(cfg.gen_cfg.dss_config_roi_mode_control, 2);
        assert_eq!(cfg.tim_cfg.range_config_vcsel_period_a, 0x0F);
    }

    #[test]
    fn preset_timing_per_family() {
        let tuning = TuningParams::default();
        let lite = get_preset_mode_timing_cfg(DevicePresetMode::StandardRangingLong, &tuning);
        assert_eq!((lite.phasecal_config_timeout_us, lite.mm_config_timeout_us, lite.range_config_timeout_us), (1000, 2000, 63000));
        let timed = get_preset_mode_timing_cfg(DevicePresetMode::TimedRangingShort, &tuning);
        assert_eq!(timed.range_config_timeout_us, 13000);
        let lpa = get_preset_mode_timing_cfg(DevicePresetMode::LowPowerAutoMedium, &tuning);
        assert_eq!((lpa.mm_config_timeout_us, lpa.range_config_timeout_us), (1, 8700));
        assert_eq!(lpa.dss_config_target_total_rate_mcps, 0x0A00);
    }

    #[test]
    fn api_modes_map_to_device_presets() {
        assert_eq!(compute_device_preset_mode(PresetMode::LiteRanging, DistanceMode::Medium), DevicePresetMode::StandardRanging);
        assert_eq!(compute_device_preset_mode(PresetMode::Autonomous, DistanceMode::Short), DevicePresetMode::TimedRangingShort);
        assert_eq!(
            compute_device_preset_mode(PresetMode::LowPowerAutonomous, DistanceMode::Long),
            DevicePresetMode::LowPowerAutoLong
        );
    }
}
