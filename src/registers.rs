//! Register groups shadowed in RAM and transferred as contiguous big-endian
//! byte images. Field names follow the device register map with the
//! double underscores collapsed.

use bitfield::bitfield;
use crate::consts::*;
use crate::utils::*;

/// A contiguous block of device registers.
pub trait RegisterGroup {
    const INDEX: u16;
    const SIZE: usize;
}

/// Writes the group into `buf`, which must be at least `SIZE` bytes long.
pub trait Encode: RegisterGroup {
    fn encode(&self, buf: &mut [u8]);
}

/// Builds the group from `buf`, which must be at least `SIZE` bytes long.
pub trait Decode: RegisterGroup + Sized {
    fn decode(buf: &[u8]) -> Self;
}

bitfield! {
    /// SYSTEM__MODE_START.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ModeStart(u8);
    impl Debug;
    pub scheduler_mode, set_scheduler_mode: 1, 0;
    pub readout_mode, set_readout_mode: 3, 2;
    pub measurement_mode, set_measurement_mode: 7, 4;
}

bitfield! {
    /// SYSTEM__SEQUENCE_CONFIG.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SequenceConfig(u8);
    impl Debug;
    pub vhv, set_vhv: 0;
    pub phasecal, set_phasecal: 1;
    pub refphase, set_refphase: 2;
    pub dss1, set_dss1: 3;
    pub dss2, set_dss2: 4;
    pub mm1, set_mm1: 5;
    pub mm2, set_mm2: 6;
    pub range, set_range: 7;
}

bitfield! {
    /// SYSTEM__INTERRUPT_CONFIG_GPIO.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct InterruptConfig(u8);
    impl Debug;
    pub distance_mode, set_distance_mode: 1, 0;
    pub rate_mode, set_rate_mode: 3, 2;
    pub combined, set_combined: 4;
    pub new_sample_ready, set_new_sample_ready: 5;
    pub no_target, set_no_target: 6;
}

pub const SEQUENCE_VHV_EN: u8 = 0x01;
pub const SEQUENCE_PHASECAL_EN: u8 = 0x02;
pub const SEQUENCE_REFERENCE_PHASE_EN: u8 = 0x04;
pub const SEQUENCE_DSS1_EN: u8 = 0x08;
pub const SEQUENCE_DSS2_EN: u8 = 0x10;
pub const SEQUENCE_MM1_EN: u8 = 0x20;
pub const SEQUENCE_MM2_EN: u8 = 0x40;
pub const SEQUENCE_RANGE_EN: u8 = 0x80;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StaticNvmManaged {
    pub i2c_slave_device_address: u8,
    pub ana_config_vhv_ref_sel_vddpix: u8,
    pub ana_config_vhv_ref_sel_vquench: u8,
    pub ana_config_reg_avdd1v2_sel: u8,
    pub ana_config_fast_osc_trim: u8,
    pub osc_measured_fast_osc_frequency: u16,
    pub vhv_config_timeout_macrop_loop_bound: u8,
    pub vhv_config_count_thresh: u8,
    pub vhv_config_offset: u8,
    pub vhv_config_init: u8,
}

impl RegisterGroup for StaticNvmManaged {
    const INDEX: u16 = VL53L1X_STATIC_NVM_MANAGED_INDEX;
    const SIZE: usize = VL53L1X_STATIC_NVM_MANAGED_SIZE;
}

impl Encode for StaticNvmManaged {
    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.i2c_slave_device_address & 0x7F;
        buf[1] = self.ana_config_vhv_ref_sel_vddpix & 0x0F;
        buf[2] = self.ana_config_vhv_ref_sel_vquench & 0x7F;
        buf[3] = self.ana_config_reg_avdd1v2_sel & 0x03;
        buf[4] = self.ana_config_fast_osc_trim & 0x7F;
        from_u16_to_u8(self.osc_measured_fast_osc_frequency, &mut buf[5..]);
        buf[7] = self.vhv_config_timeout_macrop_loop_bound;
        buf[8] = self.vhv_config_count_thresh;
        buf[9] = self.vhv_config_offset & 0x3F;
        buf[10] = self.vhv_config_init;
    }
}

impl Decode for StaticNvmManaged {
    fn decode(buf: &[u8]) -> Self {
        StaticNvmManaged {
            i2c_slave_device_address: buf[0] & 0x7F,
            ana_config_vhv_ref_sel_vddpix: buf[1] & 0x0F,
            ana_config_vhv_ref_sel_vquench: buf[2] & 0x7F,
            ana_config_reg_avdd1v2_sel: buf[3] & 0x03,
            ana_config_fast_osc_trim: buf[4] & 0x7F,
            osc_measured_fast_osc_frequency: from_u8_to_u16(&buf[5..]),
            vhv_config_timeout_macrop_loop_bound: buf[7],
            vhv_config_count_thresh: buf[8],
            vhv_config_offset: buf[9] & 0x3F,
            vhv_config_init: buf[10],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CustomerNvmManaged {
    pub global_config_spad_enables_ref: [u8; 6],
    pub global_config_ref_en_start_select: u8,
    pub ref_spad_man_num_requested_ref_spads: u8,
    pub ref_spad_man_ref_location: u8,
    pub algo_crosstalk_compensation_plane_offset_kcps: u16,
    pub algo_crosstalk_compensation_x_plane_gradient_kcps: i16,
    pub algo_crosstalk_compensation_y_plane_gradient_kcps: i16,
    pub ref_spad_char_total_rate_target_mcps: u16,
    /// 13-bit signed, 10.2 mm.
    pub algo_part_to_part_range_offset_mm: i16,
    pub mm_config_inner_offset_mm: i16,
    pub mm_config_outer_offset_mm: i16,
}

impl RegisterGroup for CustomerNvmManaged {
    const INDEX: u16 = VL53L1X_CUSTOMER_NVM_MANAGED_INDEX;
    const SIZE: usize = VL53L1X_CUSTOMER_NVM_MANAGED_SIZE;
}

impl Encode for CustomerNvmManaged {
    fn encode(&self, buf: &mut [u8]) {
        buf[..6].copy_from_slice(&self.global_config_spad_enables_ref);
        buf[5] &= 0x0F;
        buf[6] = self.global_config_ref_en_start_select;
        buf[7] = self.ref_spad_man_num_requested_ref_spads & 0x3F;
        buf[8] = self.ref_spad_man_ref_location & 0x03;
        from_u16_to_u8(self.algo_crosstalk_compensation_plane_offset_kcps, &mut buf[9..]);
        from_i16_to_u8(self.algo_crosstalk_compensation_x_plane_gradient_kcps, &mut buf[11..]);
        from_i16_to_u8(self.algo_crosstalk_compensation_y_plane_gradient_kcps, &mut buf[13..]);
        from_u16_to_u8(self.ref_spad_char_total_rate_target_mcps, &mut buf[15..]);
        from_u16_to_u8(self.algo_part_to_part_range_offset_mm as u16 & 0x1FFF, &mut buf[17..]);
        from_i16_to_u8(self.mm_config_inner_offset_mm, &mut buf[19..]);
        from_i16_to_u8(self.mm_config_outer_offset_mm, &mut buf[21..]);
    }
}

impl Decode for CustomerNvmManaged {
    fn decode(buf: &[u8]) -> Self {
        let mut spad_enables = [0u8; 6];
        spad_enables.copy_from_slice(&buf[..6]);
        spad_enables[5] &= 0x0F;
        CustomerNvmManaged {
            global_config_spad_enables_ref: spad_enables,
            global_config_ref_en_start_select: buf[6],
            ref_spad_man_num_requested_ref_spads: buf[7] & 0x3F,
            ref_spad_man_ref_location: buf[8] & 0x03,
            algo_crosstalk_compensation_plane_offset_kcps: from_u8_to_u16(&buf[9..]),
            algo_crosstalk_compensation_x_plane_gradient_kcps: from_u8_to_i16(&buf[11..]),
            algo_crosstalk_compensation_y_plane_gradient_kcps: from_u8_to_i16(&buf[13..]),
            ref_spad_char_total_rate_target_mcps: from_u8_to_u16(&buf[15..]),
            algo_part_to_part_range_offset_mm: sign_extend(from_u8_to_u16(&buf[17..]) & 0x1FFF, 13),
            mm_config_inner_offset_mm: from_u8_to_i16(&buf[19..]),
            mm_config_outer_offset_mm: from_u8_to_i16(&buf[21..]),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StaticConfig {
    pub dss_config_target_total_rate_mcps: u16,
    pub debug_ctrl: u8,
    pub test_mode_ctrl: u8,
    pub clk_gating_ctrl: u8,
    pub nvm_bist_ctrl: u8,
    pub nvm_bist_num_nvm_words: u8,
    pub nvm_bist_start_address: u8,
    pub host_if_status: u8,
    pub pad_i2c_hv_config: u8,
    pub pad_i2c_hv_extsup_config: u8,
    pub gpio_hv_pad_ctrl: u8,
    pub gpio_hv_mux_ctrl: u8,
    pub gpio_tio_hv_status: u8,
    pub gpio_fio_hv_status: u8,
    pub ana_config_spad_sel_pswidth: u8,
    pub ana_config_vcsel_pulse_width_offset: u8,
    pub ana_config_fast_osc_config_ctrl: u8,
    pub sigma_estimator_effective_pulse_width_ns: u8,
    pub sigma_estimator_effective_ambient_width_ns: u8,
    pub sigma_estimator_sigma_ref_mm: u8,
    pub algo_crosstalk_compensation_valid_height_mm: u8,
    pub spare_host_config_static_config_spare_0: u8,
    pub spare_host_config_static_config_spare_1: u8,
    pub algo_range_ignore_threshold_mcps: u16,
    pub algo_range_ignore_valid_height_mm: u8,
    pub algo_range_min_clip: u8,
    pub algo_consistency_check_tolerance: u8,
    pub spare_host_config_static_config_spare_2: u8,
    pub sd_config_reset_stages_msb: u8,
    pub sd_config_reset_stages_lsb: u8,
}

impl RegisterGroup for StaticConfig {
    const INDEX: u16 = VL53L1X_STATIC_CONFIG_INDEX;
    const SIZE: usize = VL53L1X_STATIC_CONFIG_SIZE;
}

impl Encode for StaticConfig {
    fn encode(&self, buf: &mut [u8]) {
        from_u16_to_u8(self.dss_config_target_total_rate_mcps, &mut buf[0..]);
        buf[2] = self.debug_ctrl & 0x01;
        buf[3] = self.test_mode_ctrl & 0x0F;
        buf[4] = self.clk_gating_ctrl & 0x0F;
        buf[5] = self.nvm_bist_ctrl & 0x1F;
        buf[6] = self.nvm_bist_num_nvm_words & 0x7F;
        buf[7] = self.nvm_bist_start_address & 0x7F;
        buf[8] = self.host_if_status & 0x01;
        buf[9] = self.pad_i2c_hv_config;
        buf[10] = self.pad_i2c_hv_extsup_config & 0x01;
        buf[11] = self.gpio_hv_pad_ctrl & 0x03;
        buf[12] = self.gpio_hv_mux_ctrl & 0x1F;
        buf[13] = self.gpio_tio_hv_status & 0x03;
        buf[14] = self.gpio_fio_hv_status & 0x03;
        buf[15] = self.ana_config_spad_sel_pswidth & 0x07;
        buf[16] = self.ana_config_vcsel_pulse_width_offset & 0x1F;
        buf[17] = self.ana_config_fast_osc_config_ctrl & 0x01;
        buf[18] = self.sigma_estimator_effective_pulse_width_ns;
        buf[19] = self.sigma_estimator_effective_ambient_width_ns;
        buf[20] = self.sigma_estimator_sigma_ref_mm;
        buf[21] = self.algo_crosstalk_compensation_valid_height_mm;
        buf[22] = self.spare_host_config_static_config_spare_0;
        buf[23] = self.spare_host_config_static_config_spare_1;
        from_u16_to_u8(self.algo_range_ignore_threshold_mcps, &mut buf[24..]);
        buf[26] = self.algo_range_ignore_valid_height_mm;
        buf[27] = self.algo_range_min_clip;
        buf[28] = self.algo_consistency_check_tolerance & 0x0F;
        buf[29] = self.spare_host_config_static_config_spare_2;
        buf[30] = self.sd_config_reset_stages_msb & 0x0F;
        buf[31] = self.sd_config_reset_stages_lsb;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeneralConfig {
    pub gph_config_stream_count_update_value: u8,
    pub global_config_stream_divider: u8,
    pub system_interrupt_config_gpio: u8,
    pub cal_config_vcsel_start: u8,
    pub cal_config_repeat_rate: u16,
    pub global_config_vcsel_width: u8,
    pub phasecal_config_timeout_macrop: u8,
    pub phasecal_config_target: u8,
    pub phasecal_config_override: u8,
    pub dss_config_roi_mode_control: u8,
    pub system_thresh_rate_high: u16,
    pub system_thresh_rate_low: u16,
    pub dss_config_manual_effective_spads_select: u16,
    pub dss_config_manual_block_select: u8,
    pub dss_config_aperture_attenuation: u8,
    pub dss_config_max_spads_limit: u8,
    pub dss_config_min_spads_limit: u8,
}

impl RegisterGroup for GeneralConfig {
    const INDEX: u16 = VL53L1X_GENERAL_CONFIG_INDEX;
    const SIZE: usize = VL53L1X_GENERAL_CONFIG_SIZE;
}

impl Encode for GeneralConfig {
    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.gph_config_stream_count_update_value;
        buf[1] = self.global_config_stream_divider;
        buf[2] = self.system_interrupt_config_gpio;
        buf[3] = self.cal_config_vcsel_start & 0x7F;
        from_u16_to_u8(self.cal_config_repeat_rate & 0x0FFF, &mut buf[4..]);
        buf[6] = self.global_config_vcsel_width & 0x7F;
        buf[7] = self.phasecal_config_timeout_macrop;
        buf[8] = self.phasecal_config_target;
        buf[9] = self.phasecal_config_override & 0x01;
        buf[10] = 0;
        buf[11] = self.dss_config_roi_mode_control & 0x07;
        from_u16_to_u8(self.system_thresh_rate_high, &mut buf[12..]);
        from_u16_to_u8(self.system_thresh_rate_low, &mut buf[14..]);
        from_u16_to_u8(self.dss_config_manual_effective_spads_select, &mut buf[16..]);
        buf[18] = self.dss_config_manual_block_select;
        buf[19] = self.dss_config_aperture_attenuation;
        buf[20] = self.dss_config_max_spads_limit;
        buf[21] = self.dss_config_min_spads_limit;
    }
}

/// Timeouts are kept in their encoded `(ms << 8) | ls` form; only the low
/// nibble of the high byte reaches the device.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    pub mm_config_timeout_macrop_a: u16,
    pub mm_config_timeout_macrop_b: u16,
    pub range_config_timeout_macrop_a: u16,
    pub range_config_vcsel_period_a: u8,
    pub range_config_timeout_macrop_b: u16,
    pub range_config_vcsel_period_b: u8,
    pub range_config_sigma_thresh: u16,
    pub range_config_min_count_rate_rtn_limit_mcps: u16,
    pub range_config_valid_phase_low: u8,
    pub range_config_valid_phase_high: u8,
    pub system_intermeasurement_period: u32,
    pub system_fractional_enable: u8,
}

impl RegisterGroup for TimingConfig {
    const INDEX: u16 = VL53L1X_TIMING_CONFIG_INDEX;
    const SIZE: usize = VL53L1X_TIMING_CONFIG_SIZE;
}

fn encode_timeout_bytes(timeout: u16, buf: &mut [u8]) {
    buf[0] = (timeout >> 8) as u8 & 0x0F;
    buf[1] = (timeout & 0xFF) as u8;
}

impl Encode for TimingConfig {
    fn encode(&self, buf: &mut [u8]) {
        encode_timeout_bytes(self.mm_config_timeout_macrop_a, &mut buf[0..]);
        encode_timeout_bytes(self.mm_config_timeout_macrop_b, &mut buf[2..]);
        encode_timeout_bytes(self.range_config_timeout_macrop_a, &mut buf[4..]);
        buf[6] = self.range_config_vcsel_period_a & 0x3F;
        encode_timeout_bytes(self.range_config_timeout_macrop_b, &mut buf[7..]);
        buf[9] = self.range_config_vcsel_period_b & 0x3F;
        from_u16_to_u8(self.range_config_sigma_thresh, &mut buf[10..]);
        from_u16_to_u8(self.range_config_min_count_rate_rtn_limit_mcps, &mut buf[12..]);
        buf[14] = self.range_config_valid_phase_low;
        buf[15] = self.range_config_valid_phase_high;
        buf[16] = 0;
        buf[17] = 0;
        from_u32_to_u8(self.system_intermeasurement_period, &mut buf[18..]);
        buf[22] = self.system_fractional_enable & 0x01;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DynamicConfig {
    pub system_grouped_parameter_hold_0: u8,
    pub system_thresh_high: u16,
    pub system_thresh_low: u16,
    pub system_enable_xtalk_per_quadrant: u8,
    pub system_seed_config: u8,
    pub sd_config_woi_sd0: u8,
    pub sd_config_woi_sd1: u8,
    pub sd_config_initial_phase_sd0: u8,
    pub sd_config_initial_phase_sd1: u8,
    pub system_grouped_parameter_hold_1: u8,
    pub sd_config_first_order_select: u8,
    pub sd_config_quantifier: u8,
    pub roi_config_user_roi_centre_spad: u8,
    pub roi_config_user_roi_requested_global_xy_size: u8,
    pub system_sequence_config: u8,
    pub system_grouped_parameter_hold: u8,
}

impl RegisterGroup for DynamicConfig {
    const INDEX: u16 = VL53L1X_DYNAMIC_CONFIG_INDEX;
    const SIZE: usize = VL53L1X_DYNAMIC_CONFIG_SIZE;
}

impl Encode for DynamicConfig {
    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.system_grouped_parameter_hold_0 & 0x03;
        from_u16_to_u8(self.system_thresh_high, &mut buf[1..]);
        from_u16_to_u8(self.system_thresh_low, &mut buf[3..]);
        buf[5] = self.system_enable_xtalk_per_quadrant & 0x01;
        buf[6] = self.system_seed_config & 0x07;
        buf[7] = self.sd_config_woi_sd0;
        buf[8] = self.sd_config_woi_sd1;
        buf[9] = self.sd_config_initial_phase_sd0 & 0x7F;
        buf[10] = self.sd_config_initial_phase_sd1 & 0x7F;
        buf[11] = self.system_grouped_parameter_hold_1 & 0x03;
        buf[12] = self.sd_config_first_order_select & 0x03;
        buf[13] = self.sd_config_quantifier & 0x0F;
        buf[14] = self.roi_config_user_roi_centre_spad;
        buf[15] = self.roi_config_user_roi_requested_global_xy_size;
        buf[16] = self.system_sequence_config;
        buf[17] = self.system_grouped_parameter_hold & 0x03;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemControl {
    pub power_management_go1_power_force: u8,
    pub system_stream_count_ctrl: u8,
    pub firmware_enable: u8,
    pub system_interrupt_clear: u8,
    pub system_mode_start: u8,
}

impl RegisterGroup for SystemControl {
    const INDEX: u16 = VL53L1X_SYSTEM_CONTROL_INDEX;
    const SIZE: usize = VL53L1X_SYSTEM_CONTROL_SIZE;
}

impl Encode for SystemControl {
    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.power_management_go1_power_force & 0x01;
        buf[1] = self.system_stream_count_ctrl & 0x01;
        buf[2] = self.firmware_enable & 0x01;
        buf[3] = self.system_interrupt_clear & 0x03;
        buf[4] = self.system_mode_start;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemResults {
    pub result_interrupt_status: u8,
    pub result_range_status: u8,
    pub result_report_status: u8,
    pub result_stream_count: u8,
    pub result_dss_actual_effective_spads_sd0: u16,
    pub result_peak_signal_count_rate_mcps_sd0: u16,
    pub result_ambient_count_rate_mcps_sd0: u16,
    pub result_sigma_sd0: u16,
    pub result_phase_sd0: u16,
    pub result_final_crosstalk_corrected_range_mm_sd0: u16,
    pub result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0: u16,
    pub result_mm_inner_actual_effective_spads_sd0: u16,
    pub result_mm_outer_actual_effective_spads_sd0: u16,
    pub result_avg_signal_count_rate_mcps_sd0: u16,
    pub result_dss_actual_effective_spads_sd1: u16,
    pub result_peak_signal_count_rate_mcps_sd1: u16,
    pub result_ambient_count_rate_mcps_sd1: u16,
    pub result_sigma_sd1: u16,
    pub result_phase_sd1: u16,
    pub result_final_crosstalk_corrected_range_mm_sd1: u16,
    pub result_spare_0_sd1: u16,
    pub result_spare_1_sd1: u16,
    pub result_spare_2_sd1: u16,
    pub result_spare_3_sd1: u8,
    pub result_thresh_info: u8,
}

impl RegisterGroup for SystemResults {
    const INDEX: u16 = VL53L1X_SYSTEM_RESULTS_INDEX;
    const SIZE: usize = VL53L1X_SYSTEM_RESULTS_SIZE;
}

impl Decode for SystemResults {
    fn decode(buf: &[u8]) -> Self {
        SystemResults {
            result_interrupt_status: buf[0] & 0x3F,
            result_range_status: buf[1],
            result_report_status: buf[2] & 0x0F,
            result_stream_count: buf[3],
            result_dss_actual_effective_spads_sd0: from_u8_to_u16(&buf[4..]),
            result_peak_signal_count_rate_mcps_sd0: from_u8_to_u16(&buf[6..]),
            result_ambient_count_rate_mcps_sd0: from_u8_to_u16(&buf[8..]),
            result_sigma_sd0: from_u8_to_u16(&buf[10..]),
            result_phase_sd0: from_u8_to_u16(&buf[12..]),
            result_final_crosstalk_corrected_range_mm_sd0: from_u8_to_u16(&buf[14..]),
            result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0: from_u8_to_u16(&buf[16..]),
            result_mm_inner_actual_effective_spads_sd0: from_u8_to_u16(&buf[18..]),
            result_mm_outer_actual_effective_spads_sd0: from_u8_to_u16(&buf[20..]),
            result_avg_signal_count_rate_mcps_sd0: from_u8_to_u16(&buf[22..]),
            result_dss_actual_effective_spads_sd1: from_u8_to_u16(&buf[24..]),
            result_peak_signal_count_rate_mcps_sd1: from_u8_to_u16(&buf[26..]),
            result_ambient_count_rate_mcps_sd1: from_u8_to_u16(&buf[28..]),
            result_sigma_sd1: from_u8_to_u16(&buf[30..]),
            result_phase_sd1: from_u8_to_u16(&buf[32..]),
            result_final_crosstalk_corrected_range_mm_sd1: from_u8_to_u16(&buf[34..]),
            result_spare_0_sd1: from_u8_to_u16(&buf[36..]),
            result_spare_1_sd1: from_u8_to_u16(&buf[38..]),
            result_spare_2_sd1: from_u8_to_u16(&buf[40..]),
            result_spare_3_sd1: buf[42],
            result_thresh_info: buf[43],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreResults {
    pub result_core_ambient_window_events_sd0: u32,
    pub result_core_ranging_total_events_sd0: u32,
    pub result_core_signal_total_events_sd0: i32,
    pub result_core_total_periods_elapsed_sd0: u32,
    pub result_core_ambient_window_events_sd1: u32,
    pub result_core_ranging_total_events_sd1: u32,
    pub result_core_signal_total_events_sd1: i32,
    pub result_core_total_periods_elapsed_sd1: u32,
    pub result_core_spare_0: u8,
}

impl RegisterGroup for CoreResults {
    const INDEX: u16 = VL53L1X_CORE_RESULTS_INDEX;
    const SIZE: usize = VL53L1X_CORE_RESULTS_SIZE;
}

impl Decode for CoreResults {
    fn decode(buf: &[u8]) -> Self {
        CoreResults {
            result_core_ambient_window_events_sd0: from_u8_to_u32(&buf[0..]),
            result_core_ranging_total_events_sd0: from_u8_to_u32(&buf[4..]),
            result_core_signal_total_events_sd0: from_u8_to_i32(&buf[8..]),
            result_core_total_periods_elapsed_sd0: from_u8_to_u32(&buf[12..]),
            result_core_ambient_window_events_sd1: from_u8_to_u32(&buf[16..]),
            result_core_ranging_total_events_sd1: from_u8_to_u32(&buf[20..]),
            result_core_signal_total_events_sd1: from_u8_to_i32(&buf[24..]),
            result_core_total_periods_elapsed_sd1: from_u8_to_u32(&buf[28..]),
            result_core_spare_0: buf[32],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugResults {
    pub phasecal_result_reference_phase: u16,
    pub phasecal_result_vcsel_start: u8,
    pub ref_spad_char_result_num_actual_ref_spads: u8,
    pub ref_spad_char_result_ref_location: u8,
    pub vhv_result_coldboot_status: u8,
    pub vhv_result_search_result: u8,
    pub vhv_result_latest_setting: u8,
    pub result_osc_calibrate_val: u16,
    pub test_mode_status: u8,
    pub firmware_system_status: u8,
    pub firmware_mode_status: u8,
    pub gph_system_thresh_high: u16,
    pub gph_system_thresh_low: u16,
    pub gph_roi_config_user_roi_centre_spad: u8,
    pub gph_roi_config_user_roi_requested_global_xy_size: u8,
    pub gph_system_sequence_config: u8,
    pub gph_gph_id: u8,
    pub system_interrupt_set: u8,
    pub interrupt_manager_status: u8,
}

impl RegisterGroup for DebugResults {
    const INDEX: u16 = VL53L1X_DEBUG_RESULTS_INDEX;
    const SIZE: usize = VL53L1X_DEBUG_RESULTS_SIZE;
}

impl Decode for DebugResults {
    fn decode(buf: &[u8]) -> Self {
        DebugResults {
            phasecal_result_reference_phase: from_u8_to_u16(&buf[0..]),
            phasecal_result_vcsel_start: buf[2] & 0x7F,
            ref_spad_char_result_num_actual_ref_spads: buf[3] & 0x3F,
            ref_spad_char_result_ref_location: buf[4] & 0x03,
            vhv_result_coldboot_status: buf[5] & 0x01,
            vhv_result_search_result: buf[6] & 0x3F,
            vhv_result_latest_setting: buf[7] & 0x3F,
            result_osc_calibrate_val: from_u8_to_u16(&buf[8..]) & 0x03FF,
            test_mode_status: buf[14] & 0x01,
            firmware_system_status: buf[15] & 0x03,
            firmware_mode_status: buf[16],
            gph_system_thresh_high: from_u8_to_u16(&buf[22..]),
            gph_system_thresh_low: from_u8_to_u16(&buf[24..]),
            gph_roi_config_user_roi_centre_spad: buf[34],
            gph_roi_config_user_roi_requested_global_xy_size: buf[35],
            gph_system_sequence_config: buf[36],
            gph_gph_id: buf[37] & 0x01,
            system_interrupt_set: buf[38] & 0x03,
            interrupt_manager_status: buf[41] & 0x1F,
        }
    }
}

/// Identification and mode ROI taken from the NVM copy block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NvmCopyData {
    pub identification_model_id: u8,
    pub identification_module_type: u8,
    pub identification_revision_id: u8,
    pub identification_module_id: u16,
    pub roi_config_mode_roi_centre_spad: u8,
    pub roi_config_mode_roi_xy_size: u8,
}

impl RegisterGroup for NvmCopyData {
    const INDEX: u16 = VL53L1X_NVM_COPY_DATA_INDEX;
    const SIZE: usize = VL53L1X_NVM_COPY_DATA_SIZE;
}

impl Decode for NvmCopyData {
    fn decode(buf: &[u8]) -> Self {
        NvmCopyData {
            identification_model_id: buf[0],
            identification_module_type: buf[1],
            identification_revision_id: buf[2],
            identification_module_id: from_u8_to_u16(&buf[3..]),
            roi_config_mode_roi_centre_spad: buf[47],
            roi_config_mode_roi_xy_size: buf[48],
        }
    }
}

/// Byte offset of a group inside an image that starts at `base`.
pub const fn offset_of<G: RegisterGroup>(base: u16) -> usize {
    (G::INDEX - base) as usize
}

/// Encodes `group` at its place inside an image starting at register `base`.
pub fn encode_into<G: Encode>(group: &G, base: u16, image: &mut [u8]) {
    let start = offset_of::<G>(base);
    group.encode(&mut image[start..start + G::SIZE]);
}

/// Decodes the group found at its place inside an image starting at `base`.
pub fn decode_from<G: Decode>(base: u16, image: &[u8]) -> G {
    let start = offset_of::<G>(base);
    G::decode(&image[start..start + G::SIZE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_tile_the_configuration_space() {
        assert_eq!(StaticNvmManaged::INDEX as usize + StaticNvmManaged::SIZE + 1, CustomerNvmManaged::INDEX as usize);
        assert_eq!(CustomerNvmManaged::INDEX as usize + CustomerNvmManaged::SIZE, StaticConfig::INDEX as usize);
        assert_eq!(StaticConfig::INDEX as usize + StaticConfig::SIZE, GeneralConfig::INDEX as usize);
        assert_eq!(GeneralConfig::INDEX as usize + GeneralConfig::SIZE, TimingConfig::INDEX as usize);
        assert_eq!(TimingConfig::INDEX as usize + TimingConfig::SIZE, DynamicConfig::INDEX as usize);
        assert_eq!(DynamicConfig::INDEX as usize + DynamicConfig::SIZE, SystemControl::INDEX as usize);
        assert_eq!(SystemControl::INDEX as usize + SystemControl::SIZE, SystemResults::INDEX as usize);
        assert_eq!(VL53L1X_RESULTS_IMAGE_SIZE, 134);
    }

    #[test]
    fn timing_timeouts_keep_only_the_low_nibble_of_the_exponent() {
        let timing = TimingConfig {
            mm_config_timeout_macrop_a: 0xF1AB,
            range_config_timeout_macrop_b: 0x0302,
            range_config_vcsel_period_a: 0xCB,
            system_intermeasurement_period: 0x0000_0600,
            ..Default::default()
        };
        let mut buf = [0xEEu8; TimingConfig::SIZE];
        timing.encode(&mut buf);
        assert_eq!(buf[0..2], [0x01, 0xAB]);
        assert_eq!(buf[6], 0x0B);
        assert_eq!(buf[7..9], [0x03, 0x02]);
        assert_eq!(buf[16..18], [0, 0]);
        assert_eq!(buf[18..22], [0x00, 0x00, 0x06, 0x00]);
    }

    #[test]
    fn customer_nvm_offsets_survive_the_thirteen_bit_field() {
        let customer = CustomerNvmManaged {
            global_config_spad_enables_ref: [0xFF, 0x01, 0x02, 0x03, 0x04, 0xF5],
            ref_spad_man_num_requested_ref_spads: 0x45,
            algo_part_to_part_range_offset_mm: -120,
            mm_config_inner_offset_mm: -30,
            mm_config_outer_offset_mm: 25,
            ..Default::default()
        };
        let mut buf = [0u8; CustomerNvmManaged::SIZE];
        customer.encode(&mut buf);
        assert_eq!(buf[5], 0x05);
        assert_eq!(buf[7], 0x05);
        assert_eq!(buf[17..19], [0x1F, 0x88]);

        let decoded = CustomerNvmManaged::decode(&buf);
        assert_eq!(decoded.algo_part_to_part_range_offset_mm, -120);
        assert_eq!(decoded.mm_config_inner_offset_mm, -30);
        assert_eq!(decoded.mm_config_outer_offset_mm, 25);
        assert_eq!(decoded.global_config_spad_enables_ref[5], 0x05);
    }

    #[test]
    fn system_results_decode_masks_status_fields() {
        let mut buf = [0u8; SystemResults::SIZE];
        buf[0] = 0xE7;
        buf[1] = 0x89;
        buf[2] = 0xF8;
        buf[3] = 0x80;
        buf[14] = 0x04;
        buf[15] = 0xD2;
        let results = SystemResults::decode(&buf);
        assert_eq!(results.result_interrupt_status, 0x27);
        assert_eq!(results.result_range_status, 0x89);
        assert_eq!(results.result_report_status, 0x08);
        assert_eq!(results.result_stream_count, 0x80);
        assert_eq!(results.result_final_crosstalk_corrected_range_mm_sd0, 1234);
    }

    #[test]
    fn bit_views() {
        let mut mode_start = ModeStart(0x21);
        assert_eq!(mode_start.measurement_mode(), 0x2);
        assert_eq!(mode_start.scheduler_mode(), 0x1);
        mode_start.set_measurement_mode(0x4);
        assert_eq!(mode_start.0, 0x41);

        let sequence = SequenceConfig(SEQUENCE_VHV_EN | SEQUENCE_PHASECAL_EN | SEQUENCE_DSS1_EN | SEQUENCE_RANGE_EN);
        assert!(sequence.vhv() && sequence.phasecal() && sequence.dss1() && sequence.range());
        assert!(!sequence.dss2() && !sequence.mm1() && !sequence.mm2());

        let mut interrupt = InterruptConfig(0);
        interrupt.set_distance_mode(3);
        interrupt.set_rate_mode(2);
        interrupt.set_combined(true);
        assert_eq!(interrupt.0, 0x1B);
        assert!(!interrupt.new_sample_ready());
    }

    #[test]
    fn groups_land_at_their_offset_in_an_image() {
        let control = SystemControl { system_mode_start: 0x21, firmware_enable: 1, ..Default::default() };
        let mut image = [0u8; (VL53L1X_CONFIG_IMAGE_END - VL53L1X_STATIC_NVM_MANAGED_INDEX) as usize];
        encode_into(&control, VL53L1X_STATIC_NVM_MANAGED_INDEX, &mut image);
        assert_eq!(image.len(), 135);
        assert_eq!(image[0x0085 - 1], 1);
        assert_eq!(image[0x0087 - 1], 0x21);
    }
}
