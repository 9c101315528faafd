//! Calibration: low-power autonomous manual calibration and DSS update,
//! calibration data exchange, and (unless `VL53L1X_NOCALIB`) the reference
//! SPAD, NVM and offset procedures.

use crate::consts::*;
use crate::preset::{DeviceConfig, LowPowerAutoData, DEVICE_DSS_MODE_REQUESTED_EFFECTIVE_SPADS};
use crate::registers::*;
use crate::{BusOperation, Vl53l1x, Error, OutputPin, DelayNs};

#[cfg(not(feature = "VL53L1X_NOCALIB"))]
use crate::results::{RangeStatus, DEVICE_ERROR_REF_SPAD_CHAR_LESS_THAN_TARGET,
    DEVICE_ERROR_REF_SPAD_CHAR_MORE_THAN_TARGET, DEVICE_ERROR_REF_SPAD_CHAR_NOT_ENOUGH_SPADS};
#[cfg(not(feature = "VL53L1X_NOCALIB"))]
use crate::timing::{calc_macro_period_us, calc_timeout_mclks};

/* Effective SPADs requested when the DSS rate cannot be computed */
const DSS_FALLBACK_REQUIRED_SPADS: u16 = 0x8000;

/// Optical centre of the module, x and y in 4.4 SPAD units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpticalCentre {
    pub x_centre: u8,
    pub y_centre: u8,
}

/// Per-part calibration that can be saved by the host and restored later.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationData {
    pub customer: CustomerNvmManaged,
    pub optical_centre: OpticalCentre,
    pub standard_ranging_gain_factor: u16,
}

/// After the first low-power range: keep VHV on its last result, bound its
/// search loop and lock phasecal to the VCSEL start just measured.
pub fn low_power_auto_setup_manual_calibration(
    stat_nvm: &mut StaticNvmManaged,
    cfg: &mut DeviceConfig,
    dbg_results: &DebugResults,
    lpa: &mut LowPowerAutoData,
) {
    lpa.saved_vhv_init = stat_nvm.vhv_config_init;
    lpa.saved_vhv_timeout = stat_nvm.vhv_config_timeout_macrop_loop_bound;

    stat_nvm.vhv_config_init &= 0x7F;
    stat_nvm.vhv_config_timeout_macrop_loop_bound =
        (stat_nvm.vhv_config_timeout_macrop_loop_bound & 0x03).wrapping_add(lpa.vhv_loop_bound.wrapping_shl(2));

    cfg.gen_cfg.phasecal_config_override = 0x01;
    lpa.first_run_phasecal_result = dbg_results.phasecal_result_vcsel_start;
    cfg.gen_cfg.cal_config_vcsel_start = lpa.first_run_phasecal_result;
}

/// Derives the effective SPAD count for the next range from the measured
/// signal plus ambient rate per SPAD.
pub fn low_power_auto_update_dss(cfg: &mut DeviceConfig, sys_results: &SystemResults, lpa: &mut LowPowerAutoData) {
    let total_rate = (sys_results.result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0 as u32
        + sys_results.result_ambient_count_rate_mcps_sd0 as u32)
        .min(0xFFFF)
        << 16;

    let required_spads = match sys_results.result_dss_actual_effective_spads_sd0 {
        0 => None,
        spads => {
            lpa.dss_total_rate_per_spad_mcps = total_rate / spads as u32;
            match lpa.dss_total_rate_per_spad_mcps {
                0 => None,
                rate_per_spad => {
                    let target = (cfg.stat_cfg.dss_config_target_total_rate_mcps as u32) << 16;
                    Some((target / rate_per_spad).min(0xFFFF) as u16)
                }
            }
        }
    };

    lpa.dss_required_spads = required_spads.unwrap_or(DSS_FALLBACK_REQUIRED_SPADS);
    cfg.gen_cfg.dss_config_manual_effective_spads_select = lpa.dss_required_spads;
    cfg.gen_cfg.dss_config_roi_mode_control = DEVICE_DSS_MODE_REQUESTED_EFFECTIVE_SPADS;
}

/// Undoes the manual calibration when low-power ranging stops.
pub fn low_power_auto_data_stop_range(stat_nvm: &mut StaticNvmManaged, cfg: &mut DeviceConfig, lpa: &mut LowPowerAutoData) {
    lpa.low_power_auto_range_count = 0xFF;
    lpa.first_run_phasecal_result = 0;
    lpa.dss_total_rate_per_spad_mcps = 0;
    lpa.dss_required_spads = 0;

    if lpa.saved_vhv_init != 0 {
        stat_nvm.vhv_config_init = lpa.saved_vhv_init;
    }
    if lpa.saved_vhv_timeout != 0 {
        stat_nvm.vhv_config_timeout_macrop_loop_bound = lpa.saved_vhv_timeout;
    }

    cfg.gen_cfg.phasecal_config_override = 0x00;
}

fn without_xtalk(customer: &CustomerNvmManaged) -> CustomerNvmManaged {
    CustomerNvmManaged {
        algo_crosstalk_compensation_plane_offset_kcps: 0,
        algo_crosstalk_compensation_x_plane_gradient_kcps: 0,
        algo_crosstalk_compensation_y_plane_gradient_kcps: 0,
        ..*customer
    }
}

impl<B: BusOperation, XS: OutputPin, T: DelayNs> Vl53l1x<B, XS, T> {

    /// Customer NVM shadow, optical centre and ranging gain.
    ///
    /// # Return
    ///
    /// `CalibrationData` : crosstalk plane fields are always 0, crosstalk compensation is not supported.
    pub fn get_calibration_data(&self) -> CalibrationData {
        CalibrationData {
            customer: without_xtalk(&self.customer),
            optical_centre: self.optical_centre,
            standard_ranging_gain_factor: self.gain_factor,
        }
    }

    /// Restores calibration data saved with `get_calibration_data`. Applied
    /// to the device at the next range start.
    ///
    /// # Arguments
    ///
    /// * `calibration_data` : Data to restore. The optical centre is factory data and is not restored.
    pub fn set_calibration_data(&mut self, calibration_data: &CalibrationData) {
        self.customer = without_xtalk(&calibration_data.customer);
        self.gain_factor = calibration_data.standard_ranging_gain_factor;
    }

    /// Optical centre in SPAD units, 16.16.
    ///
    /// # Return
    ///
    /// `(x, y)` : Optical centre coordinates.
    pub fn get_optical_center(&self) -> (u32, u32) {
        (
            (self.optical_centre.x_centre as u32) << 12,
            (self.optical_centre.y_centre as u32) << 12,
        )
    }

    /// Writes the customer NVM shadow to the device.
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn set_customer_nvm_managed(&mut self) -> Result<(), Error<B::Error>> {
        self.customer.encode(&mut self.temp_buffer[..CustomerNvmManaged::SIZE]);
        self.write_multi_to_register_temp_buffer(CustomerNvmManaged::INDEX, CustomerNvmManaged::SIZE)
    }

    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    fn set_ref_spad_char_config(&mut self) -> Result<(), Error<B::Error>> {
        let ref_spad_char = self.tuning.ref_spad_char;
        let fast_osc = self.stat_nvm.osc_measured_fast_osc_frequency;
        if fast_osc == 0 {
            return Err(Error::DivisionByZero);
        }

        let macro_period_us = calc_macro_period_us(fast_osc, ref_spad_char.vcsel_period);
        let timeout_mclks = calc_timeout_mclks(ref_spad_char.timeout_us, macro_period_us).min(0xFF) as u8;

        self.cfg.gen_cfg.phasecal_config_timeout_macrop = timeout_mclks;
        self.write_to_register(VL53L1X_PHASECAL_CONFIG_TIMEOUT_MACROP, timeout_mclks)?;

        self.cfg.tim_cfg.range_config_vcsel_period_a = ref_spad_char.vcsel_period;
        self.write_to_register(VL53L1X_RANGE_CONFIG_VCSEL_PERIOD_A, ref_spad_char.vcsel_period)?;

        self.cfg.dyn_cfg.sd_config_woi_sd0 = ref_spad_char.vcsel_period;
        self.cfg.dyn_cfg.sd_config_woi_sd1 = ref_spad_char.vcsel_period;
        self.write_multi_to_register(VL53L1X_SD_CONFIG_WOI_SD0, &[ref_spad_char.vcsel_period, ref_spad_char.vcsel_period])?;

        self.customer.ref_spad_char_total_rate_target_mcps = ref_spad_char.target_count_rate_mcps;
        self.write_word(VL53L1X_REF_SPAD_CHAR_TOTAL_RATE_TARGET_MCPS, ref_spad_char.target_count_rate_mcps)?;

        self.cfg.tim_cfg.range_config_sigma_thresh = ref_spad_char.max_count_rate_limit_mcps;
        self.write_word(VL53L1X_RANGE_CONFIG_SIGMA_THRESH, ref_spad_char.max_count_rate_limit_mcps)?;

        self.cfg.tim_cfg.range_config_min_count_rate_rtn_limit_mcps = ref_spad_char.min_count_rate_limit_mcps;
        self.write_word(VL53L1X_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT_MCPS, ref_spad_char.min_count_rate_limit_mcps)?;

        Ok(())
    }

    /**
     * @brief Runs the reference SPAD characterisation and stores the
     * selected reference SPADs in the customer NVM registers.
     */
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn run_ref_spad_char(&mut self) -> Result<(), Error<B::Error>> {
        self.enable_powerforce()?;
        self.set_ref_spad_char_config()?;
        self.run_device_test(self.tuning.ref_spad_char.device_test_mode)?;

        self.read_from_register(VL53L1X_REF_SPAD_CHAR_RESULT_NUM_ACTUAL_REF_SPADS, 2)?;
        let (num_ref_spads, ref_location) = (self.temp_buffer[0], self.temp_buffer[1]);
        self.dbg_results.ref_spad_char_result_num_actual_ref_spads = num_ref_spads;
        self.dbg_results.ref_spad_char_result_ref_location = ref_location;

        self.write_multi_to_register(VL53L1X_REF_SPAD_MAN_NUM_REQUESTED_REF_SPADS, &[num_ref_spads, ref_location])?;
        self.customer.ref_spad_man_num_requested_ref_spads = num_ref_spads;
        self.customer.ref_spad_man_ref_location = ref_location;

        self.read_from_register(VL53L1X_RESULT_SPARE_0_SD1, 6)?;
        let mut spad_enables: [u8; 6] = [0; 6];
        spad_enables.copy_from_slice(&self.temp_buffer[..6]);
        self.write_multi_to_register(VL53L1X_GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &spad_enables)?;
        self.customer.global_config_spad_enables_ref = spad_enables;

        self.disable_powerforce()?;

        match self.sys_results.result_range_status {
            DEVICE_ERROR_REF_SPAD_CHAR_NOT_ENOUGH_SPADS => Err(Error::RefSpadCharNotEnoughSpads),
            DEVICE_ERROR_REF_SPAD_CHAR_MORE_THAN_TARGET => Err(Error::RefSpadCharRateTooHigh),
            DEVICE_ERROR_REF_SPAD_CHAR_LESS_THAN_TARGET => Err(Error::RefSpadCharRateTooLow),
            _ => Ok(()),
        }
    }

    /**
     * @brief Reference SPAD management. When the characterisation finds a
     * rate above target, the factory reference SPADs stored in NVM are used.
     */
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn perform_ref_spad_management(&mut self) -> Result<(), Error<B::Error>> {
        match self.run_ref_spad_char() {
            Ok(()) => {
                log::debug!(
                    "vl53l1x: ref spad char done, {} spads at location {}",
                    self.customer.ref_spad_man_num_requested_ref_spads,
                    self.customer.ref_spad_man_ref_location
                );
                self.set_preset_mode(self.preset_mode)
            }
            Err(Error::RefSpadCharRateTooHigh) => {
                log::warn!("vl53l1x: ref spad rate too high, using NVM reference spads");

                let mut dcr_buffer: [u8; VL53L1X_NVM_REF_SPAD_WORD_COUNT * 4] = [0; VL53L1X_NVM_REF_SPAD_WORD_COUNT * 4];
                self.read_nvm_raw_data(VL53L1X_NVM_REF_SPAD_START_WORD, VL53L1X_NVM_REF_SPAD_WORD_COUNT, &mut dcr_buffer)?;

                let (num_ref_spads, ref_location) = (5u8, 3u8);
                self.write_multi_to_register(VL53L1X_REF_SPAD_MAN_NUM_REQUESTED_REF_SPADS, &[num_ref_spads, ref_location])?;
                self.customer.ref_spad_man_num_requested_ref_spads = num_ref_spads;
                self.customer.ref_spad_man_ref_location = ref_location;

                let mut spad_enables: [u8; 6] = [0; 6];
                spad_enables.copy_from_slice(&dcr_buffer[16..22]);
                self.write_multi_to_register(VL53L1X_GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &spad_enables)?;
                self.customer.global_config_spad_enables_ref = spad_enables;

                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn nvm_enable(&mut self, nvm_ctrl_pulse_width: u16, nvm_power_up_delay_us: u32) -> Result<(), Error<B::Error>> {
        self.disable_firmware()?;
        self.enable_powerforce()?;
        self.delay_us(VL53L1X_ENABLE_POWERFORCE_SETTLING_TIME_US);

        self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_PDN, 0x01)?;
        self.write_to_register(VL53L1X_RANGING_CORE_CLK_CTRL1, 0x05)?;
        self.delay_us(nvm_power_up_delay_us);

        self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_MODE, 0x01)?;
        self.write_word(VL53L1X_RANGING_CORE_NVM_CTRL_PULSE_WIDTH_MSB, nvm_ctrl_pulse_width)?;

        Ok(())
    }

    /// Reads `count` 32-bit NVM words from `start_address` into `data`,
    /// which must hold `4 * count` bytes. NVM must be enabled.
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn nvm_read(&mut self, start_address: u8, count: usize, data: &mut [u8]) -> Result<(), Error<B::Error>> {
        if data.len() < count * 4 {
            return Err(Error::InvalidParams);
        }

        for (i, word) in data.chunks_exact_mut(4).take(count).enumerate() {
            let nvm_addr = start_address.wrapping_add(i as u8);
            self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_ADDR, nvm_addr)?;
            self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_READN, 0x00)?;
            self.delay_us(VL53L1X_NVM_READ_TRIGGER_DELAY_US);
            self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_READN, 0x01)?;

            self.read_from_register(VL53L1X_RANGING_CORE_NVM_CTRL_DATAOUT_MMM, 4)?;
            word.copy_from_slice(&self.temp_buffer[..4]);
        }

        Ok(())
    }

    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn nvm_disable(&mut self) -> Result<(), Error<B::Error>> {
        self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_READN, 0x01)?;
        self.write_to_register(VL53L1X_RANGING_CORE_NVM_CTRL_PDN, 0x00)?;
        self.disable_powerforce()?;
        self.enable_firmware()?;

        Ok(())
    }

    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn read_nvm_raw_data(&mut self, start_address: u8, count: usize, data: &mut [u8]) -> Result<(), Error<B::Error>> {
        self.nvm_enable(VL53L1X_NVM_PULSE_WIDTH, VL53L1X_NVM_POWER_UP_DELAY_US)?;
        let read = self.nvm_read(start_address, count, data);
        let disable = self.nvm_disable();
        read?;
        disable
    }

    /* One calibration run: discards the first range, then sums valid ranges */
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    fn offset_cal_collect(&mut self, max_samples: u32, over_max: u32) -> Result<(i32, u32), Error<B::Error>> {
        self.start_measurement()?;
        self.wait_measurement_data_ready()?;
        self.get_ranging_measurement_data()?;
        self.clear_interrupt_and_start_measurement()?;

        let mut sum_ranging: i32 = 0;
        let mut inloop_count: u32 = 0;
        let mut meas_count: u32 = 0;
        while inloop_count < max_samples && meas_count < over_max {
            self.wait_measurement_data_ready()?;
            let data = self.get_ranging_measurement_data()?;
            if data.range_status == RangeStatus::RangeValid {
                sum_ranging = sum_ranging.saturating_add(data.range_milli_meter as i32);
                inloop_count += 1;
            }
            self.clear_interrupt_and_start_measurement()?;
            meas_count += 1;
        }

        Ok((sum_ranging, inloop_count))
    }

    /**
     * @brief Simple offset calibration against a target at a known
     * distance. The offset is written to the inner and outer MM offsets.
     *
     * # Arguments
     *
     * * `cal_distance_mm` : Target distance in millimetres.
     */
    #[cfg(not(feature = "VL53L1X_NOCALIB"))]
    pub fn perform_offset_simple_calibration(&mut self, cal_distance_mm: i32) -> Result<(), Error<B::Error>> {
        self.customer.algo_part_to_part_range_offset_mm = 0;
        self.customer.mm_config_inner_offset_mm = 0;
        self.customer.mm_config_outer_offset_mm = 0;

        let max_samples = self.tuning.offset_cal_max_samples;
        let under_max = 1 + max_samples / 2;
        let over_max = max_samples + max_samples / 2;

        let mut sum_ranging: i32 = 0;
        let mut total_count: u32 = 0;

        for _ in 0..self.tuning.offset_cal_repeat {
            let collected = self.offset_cal_collect(max_samples, over_max);
            let stopped = self.stop_measurement();
            let (sum, count) = collected?;
            stopped?;

            sum_ranging = sum_ranging.saturating_add(sum);
            total_count += count;
            if count < under_max {
                log::warn!("vl53l1x: offset calibration got {} valid samples of {}", count, max_samples);
                return Err(Error::OffsetCalNoSampleFail);
            }
        }

        if sum_ranging < 0 || sum_ranging as u64 > total_count as u64 * VL53L1X_OFFSET_CAL_MAX_SIGMA as u64 {
            return Err(Error::OffsetCalSigmaTooHigh);
        }

        if total_count > 0 {
            let mean_range = (sum_ranging as u32 + total_count / 2) / total_count;
            let offset_mm = (cal_distance_mm - mean_range as i32) as i16;

            self.customer.algo_part_to_part_range_offset_mm = 0;
            self.customer.mm_config_inner_offset_mm = offset_mm;
            self.customer.mm_config_outer_offset_mm = offset_mm;
            self.set_customer_nvm_managed()?;
            log::debug!("vl53l1x: offset calibration {} mm over {} samples", offset_mm, total_count);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpa() -> LowPowerAutoData {
        LowPowerAutoData { vhv_loop_bound: 3, is_low_power_auto_mode: true, ..Default::default() }
    }

    #[test]
    fn manual_calibration_saves_and_bounds_vhv() {
        let mut stat_nvm = StaticNvmManaged { vhv_config_init: 0xA5, vhv_config_timeout_macrop_loop_bound: 0x81, ..Default::default() };
        let mut cfg = DeviceConfig::default();
        let dbg = DebugResults { phasecal_result_vcsel_start: 0x0C, ..Default::default() };
        let mut lpa = lpa();

        low_power_auto_setup_manual_calibration(&mut stat_nvm, &mut cfg, &dbg, &mut lpa);

        assert_eq!(lpa.saved_vhv_init, 0xA5);
        assert_eq!(lpa.saved_vhv_timeout, 0x81);
        assert_eq!(stat_nvm.vhv_config_init, 0x25);
        assert_eq!(stat_nvm.vhv_config_timeout_macrop_loop_bound, 0x01 + (3 << 2));
        assert_eq!(cfg.gen_cfg.phasecal_config_override, 1);
        assert_eq!(cfg.gen_cfg.cal_config_vcsel_start, 0x0C);
        assert_eq!(lpa.first_run_phasecal_result, 0x0C);

        low_power_auto_data_stop_range(&mut stat_nvm, &mut cfg, &mut lpa);
        assert_eq!(stat_nvm.vhv_config_init, 0xA5);
        assert_eq!(stat_nvm.vhv_config_timeout_macrop_loop_bound, 0x81);
        assert_eq!(cfg.gen_cfg.phasecal_config_override, 0);
        assert_eq!(lpa.low_power_auto_range_count, 0xFF);
        assert_eq!(lpa.first_run_phasecal_result, 0);
    }

    #[test]
    fn dss_requests_spads_for_the_target_rate() {
        let mut cfg = DeviceConfig::default();
        cfg.stat_cfg.dss_config_target_total_rate_mcps = 0x0A00;
        let sys = SystemResults {
            result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0: 0x0300,
            result_ambient_count_rate_mcps_sd0: 0x0100,
            result_dss_actual_effective_spads_sd0: 0x1000,
            ..Default::default()
        };
        let mut lpa = lpa();

        low_power_auto_update_dss(&mut cfg, &sys, &mut lpa);

        let rate_per_spad = (0x0400u32 << 16) / 0x1000;
        assert_eq!(lpa.dss_total_rate_per_spad_mcps, rate_per_spad);
        assert_eq!(lpa.dss_required_spads, ((0x0A00u32 << 16) / rate_per_spad) as u16);
        assert_eq!(cfg.gen_cfg.dss_config_manual_effective_spads_select, lpa.dss_required_spads);
        assert_eq!(cfg.gen_cfg.dss_config_roi_mode_control, DEVICE_DSS_MODE_REQUESTED_EFFECTIVE_SPADS);
    }

    #[test]
    fn dss_falls_back_without_spads_or_signal() {
        let mut cfg = DeviceConfig::default();
        cfg.stat_cfg.dss_config_target_total_rate_mcps = 0x0A00;
        let mut lpa = lpa();

        low_power_auto_update_dss(&mut cfg, &SystemResults::default(), &mut lpa);
        assert_eq!(lpa.dss_required_spads, 0x8000);
        assert_eq!(cfg.gen_cfg.dss_config_manual_effective_spads_select, 0x8000);

        let no_signal = SystemResults { result_dss_actual_effective_spads_sd0: 0x2000, ..Default::default() };
        low_power_auto_update_dss(&mut cfg, &no_signal, &mut lpa);
        assert_eq!(lpa.dss_total_rate_per_spad_mcps, 0);
        assert_eq!(lpa.dss_required_spads, 0x8000);
    }

    #[test]
    fn dss_clips_the_request() {
        let mut cfg = DeviceConfig::default();
        cfg.stat_cfg.dss_config_target_total_rate_mcps = 0xFFFF;
        let sys = SystemResults {
            result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0: 1,
            result_dss_actual_effective_spads_sd0: 0xFFFF,
            ..Default::default()
        };
        let mut lpa = lpa();

        low_power_auto_update_dss(&mut cfg, &sys, &mut lpa);
        assert_eq!(lpa.dss_total_rate_per_spad_mcps, 1);
        assert_eq!(lpa.dss_required_spads, 0xFFFF);
    }

    #[test]
    fn stop_range_keeps_unsaved_vhv_settings() {
        let mut stat_nvm = StaticNvmManaged { vhv_config_init: 0x20, vhv_config_timeout_macrop_loop_bound: 0x80, ..Default::default() };
        let mut cfg = DeviceConfig::default();
        let mut lpa = lpa();

        low_power_auto_data_stop_range(&mut stat_nvm, &mut cfg, &mut lpa);
        assert_eq!(stat_nvm.vhv_config_init, 0x20);
        assert_eq!(stat_nvm.vhv_config_timeout_macrop_loop_bound, 0x80);
    }

    #[test]
    fn calibration_data_drops_crosstalk() {
        let customer = CustomerNvmManaged {
            algo_crosstalk_compensation_plane_offset_kcps: 12,
            algo_crosstalk_compensation_x_plane_gradient_kcps: -3,
            mm_config_inner_offset_mm: 7,
            ..Default::default()
        };
        let cleaned = without_xtalk(&customer);
        assert_eq!(cleaned.algo_crosstalk_compensation_plane_offset_kcps, 0);
        assert_eq!(cleaned.algo_crosstalk_compensation_x_plane_gradient_kcps, 0);
        assert_eq!(cleaned.mm_config_inner_offset_mm, 7);
    }
}
