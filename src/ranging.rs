//! Low-level range engine: preset application, timeouts, configuration
//! writes, start/stop and result readout.

use crate::consts::*;
use crate::calibration::{low_power_auto_data_stop_range, low_power_auto_setup_manual_calibration, low_power_auto_update_dss};
use crate::preset::*;
use crate::registers::*;
use crate::results::{copy_sys_and_core_results, RangeResults};
use crate::roi::UserZone;
use crate::state::*;
use crate::timing::*;
use crate::{BusOperation, Vl53l1x, Error, OutputPin, DelayNs};

/// How much of the configuration is rewritten when ranging (re)starts.
/// Each level includes every group of the levels below it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceConfigLevel {
    SystemControl,
    DynamicOnwards,
    TimingOnwards,
    GeneralOnwards,
    StaticOnwards,
    CustomerOnwards,
    Full,
}

impl DeviceConfigLevel {
    /// First register written for this level.
    pub fn start_index(self) -> u16 {
        match self {
            DeviceConfigLevel::Full => StaticNvmManaged::INDEX,
            DeviceConfigLevel::CustomerOnwards => CustomerNvmManaged::INDEX,
            DeviceConfigLevel::StaticOnwards => StaticConfig::INDEX,
            DeviceConfigLevel::GeneralOnwards => GeneralConfig::INDEX,
            DeviceConfigLevel::TimingOnwards => TimingConfig::INDEX,
            DeviceConfigLevel::DynamicOnwards => DynamicConfig::INDEX,
            DeviceConfigLevel::SystemControl => SystemControl::INDEX,
        }
    }
}

impl<B: BusOperation, XS: OutputPin, T: DelayNs> Vl53l1x<B, XS, T> {

    /// Loads a device preset and recomputes its timeouts and
    /// inter-measurement period. Nothing is written to the device until the
    /// next range start.
    pub fn set_device_preset_mode(
        &mut self,
        device_preset: DevicePresetMode,
        dss_config_target_total_rate_mcps: u16,
        phasecal_config_timeout_us: u32,
        mm_config_timeout_us: u32,
        range_config_timeout_us: u32,
        inter_measurement_period_ms: u32,
    ) -> Result<(), Error<B::Error>> {
        self.ll_state.init(DeviceState::SwStandby);
        self.device_preset = device_preset;

        apply_device_preset(device_preset, &self.tuning, &mut self.cfg, &mut self.lpa);

        self.cfg.stat_cfg.dss_config_target_total_rate_mcps = dss_config_target_total_rate_mcps;
        self.dss_config_target_total_rate_mcps = dss_config_target_total_rate_mcps;

        self.set_timeouts_us(phasecal_config_timeout_us, mm_config_timeout_us, range_config_timeout_us)?;
        self.set_device_inter_measurement_period_ms(inter_measurement_period_ms)?;

        log::debug!("vl53l1x: device preset {:?}", device_preset);
        Ok(())
    }

    pub fn set_timeouts_us(
        &mut self,
        phasecal_config_timeout_us: u32,
        mm_config_timeout_us: u32,
        range_config_timeout_us: u32,
    ) -> Result<(), Error<B::Error>> {
        self.phasecal_config_timeout_us = phasecal_config_timeout_us;
        self.mm_config_timeout_us = mm_config_timeout_us;
        self.range_config_timeout_us = range_config_timeout_us;

        calc_timeout_register_values(
            phasecal_config_timeout_us,
            mm_config_timeout_us,
            range_config_timeout_us,
            self.stat_nvm.osc_measured_fast_osc_frequency,
            &mut self.cfg.gen_cfg,
            &mut self.cfg.tim_cfg,
        )
        .ok_or(Error::DivisionByZero)
    }

    /// Timeouts as programmed, decoded back from the timing registers:
    /// `(phasecal_us, mm_us, range_us)`.
    pub fn get_timeouts_us(&mut self) -> Result<(u32, u32, u32), Error<B::Error>> {
        let fast_osc = self.stat_nvm.osc_measured_fast_osc_frequency;
        if fast_osc == 0 {
            return Err(Error::DivisionByZero);
        }

        let macro_period_us = calc_macro_period_us(fast_osc, self.cfg.tim_cfg.range_config_vcsel_period_a);

        let phasecal_us = calc_timeout_us(self.cfg.gen_cfg.phasecal_config_timeout_macrop as u32, macro_period_us);
        let mm_us = calc_decoded_timeout_us(self.cfg.tim_cfg.mm_config_timeout_macrop_a & 0x0FFF, macro_period_us);
        let range_us = calc_decoded_timeout_us(self.cfg.tim_cfg.range_config_timeout_macrop_a & 0x0FFF, macro_period_us);

        self.phasecal_config_timeout_us = phasecal_us;
        self.mm_config_timeout_us = mm_us;
        self.range_config_timeout_us = range_us;

        Ok((phasecal_us, mm_us, range_us))
    }

    /// Programs the inter-measurement period in oscillator clocks.
    pub fn set_device_inter_measurement_period_ms(&mut self, inter_measurement_period_ms: u32) -> Result<(), Error<B::Error>> {
        let osc_calibrate_val = self.dbg_results.result_osc_calibrate_val;
        if osc_calibrate_val == 0 {
            return Err(Error::DivisionByZero);
        }

        self.inter_measurement_period_ms = inter_measurement_period_ms;
        self.cfg.tim_cfg.system_intermeasurement_period =
            inter_measurement_period_ms.saturating_mul(osc_calibrate_val as u32);

        Ok(())
    }

    pub fn get_device_inter_measurement_period_ms(&mut self) -> Result<u32, Error<B::Error>> {
        let osc_calibrate_val = self.dbg_results.result_osc_calibrate_val;
        if osc_calibrate_val == 0 {
            return Err(Error::DivisionByZero);
        }

        Ok(self.cfg.tim_cfg.system_intermeasurement_period / osc_calibrate_val as u32)
    }

    pub fn set_vhv_loopbound(&mut self, vhv_loopbound: u8) {
        self.stat_nvm.vhv_config_timeout_macrop_loop_bound =
            (self.stat_nvm.vhv_config_timeout_macrop_loop_bound & 0x03).wrapping_add(vhv_loopbound.wrapping_mul(4));
    }

    pub fn set_lite_sigma_threshold(&mut self, lite_sigma: u16) {
        self.cfg.tim_cfg.range_config_sigma_thresh = lite_sigma;
    }

    pub fn get_lite_sigma_threshold(&self) -> u16 {
        self.cfg.tim_cfg.range_config_sigma_thresh
    }

    pub fn set_lite_min_count_rate(&mut self, lite_mincountrate: u16) {
        self.cfg.tim_cfg.range_config_min_count_rate_rtn_limit_mcps = lite_mincountrate;
    }

    pub fn get_lite_min_count_rate(&self) -> u16 {
        self.cfg.tim_cfg.range_config_min_count_rate_rtn_limit_mcps
    }

    pub fn set_user_zone(&mut self, user_zone: &UserZone) {
        let (centre_spad, xy_size) = user_zone.encode();
        self.cfg.dyn_cfg.roi_config_user_roi_centre_spad = centre_spad;
        self.cfg.dyn_cfg.roi_config_user_roi_requested_global_xy_size = xy_size;
    }

    pub fn get_user_zone(&self) -> UserZone {
        UserZone::decode(
            self.cfg.dyn_cfg.roi_config_user_roi_centre_spad,
            self.cfg.dyn_cfg.roi_config_user_roi_requested_global_xy_size,
        )
    }

    /// Zone calibrated at the factory for the reference measurements.
    pub fn get_mode_mitigation_roi(&self) -> UserZone {
        self.mm_roi
    }

    /// Sets or clears one step of the ranging sequence, `bit_id` 0 (VHV) to
    /// 7 (RANGE).
    pub fn set_sequence_config_bit(&mut self, bit_id: u8, value: bool) -> Result<(), Error<B::Error>> {
        if bit_id >= VL53L1X_SEQUENCESTEP_NUMBER_OF_ITEMS {
            return Err(Error::InvalidParams);
        }

        let bit_mask: u8 = 1 << bit_id;
        let sequence = &mut self.cfg.dyn_cfg.system_sequence_config;
        *sequence = (*sequence & !bit_mask) | if value { bit_mask } else { 0 };

        Ok(())
    }

    pub fn get_sequence_config_bit(&self, bit_id: u8) -> Result<bool, Error<B::Error>> {
        if bit_id >= VL53L1X_SEQUENCESTEP_NUMBER_OF_ITEMS {
            return Err(Error::InvalidParams);
        }

        Ok((self.cfg.dyn_cfg.system_sequence_config >> bit_id) & 0x01 == 0x01)
    }

    /**
     * @brief Writes the configuration from `device_config_level` onwards
     * and starts ranging in `measurement_mode`.
     */
    pub fn init_and_start_range(
        &mut self,
        measurement_mode: DeviceMeasurementMode,
        device_config_level: DeviceConfigLevel,
    ) -> Result<(), Error<B::Error>> {
        let mut level = device_config_level;

        self.measurement_mode = measurement_mode;
        let mut mode_start = ModeStart(self.cfg.sys_ctrl.system_mode_start);
        mode_start.set_measurement_mode(measurement_mode.bits() >> 4);
        self.cfg.sys_ctrl.system_mode_start = mode_start.0;

        /* Range ignore is only meaningful with crosstalk compensation */
        self.cfg.stat_cfg.algo_range_ignore_threshold_mcps = 0;

        if self.lpa.low_power_auto_range_count == 0xFF {
            self.lpa.low_power_auto_range_count = 0x00;
        }

        if self.lpa.is_low_power_auto_mode && self.lpa.low_power_auto_range_count == 0 {
            /* First range: interrupt on every sample, VHV and phasecal run */
            self.lpa.saved_interrupt_config = self.cfg.gen_cfg.system_interrupt_config_gpio;
            self.cfg.gen_cfg.system_interrupt_config_gpio = INTERRUPT_CONFIG_NEW_SAMPLE_READY;

            if self.cfg.dyn_cfg.system_sequence_config & (SEQUENCE_MM1_EN | SEQUENCE_MM2_EN) == 0 {
                self.customer.algo_part_to_part_range_offset_mm =
                    self.customer.mm_config_outer_offset_mm.wrapping_mul(4);
            } else {
                self.customer.algo_part_to_part_range_offset_mm = 0;
            }

            if level < DeviceConfigLevel::CustomerOnwards {
                level = DeviceConfigLevel::CustomerOnwards;
            }
        }

        if self.lpa.is_low_power_auto_mode && self.lpa.low_power_auto_range_count == 1 {
            self.cfg.gen_cfg.system_interrupt_config_gpio = self.lpa.saved_interrupt_config;
            level = DeviceConfigLevel::Full;
        }

        let start = level.start_index();
        let size = (VL53L1X_CONFIG_IMAGE_END - start) as usize;
        self.temp_buffer[..size].fill(0);

        if level >= DeviceConfigLevel::Full {
            encode_into(&self.stat_nvm, start, &mut self.temp_buffer);
        }
        if level >= DeviceConfigLevel::CustomerOnwards {
            encode_into(&self.customer, start, &mut self.temp_buffer);
        }
        if level >= DeviceConfigLevel::StaticOnwards {
            encode_into(&self.cfg.stat_cfg, start, &mut self.temp_buffer);
        }
        if level >= DeviceConfigLevel::GeneralOnwards {
            encode_into(&self.cfg.gen_cfg, start, &mut self.temp_buffer);
        }
        if level >= DeviceConfigLevel::TimingOnwards {
            encode_into(&self.cfg.tim_cfg, start, &mut self.temp_buffer);
        }
        if level >= DeviceConfigLevel::DynamicOnwards {
            let mode_start = self.cfg.sys_ctrl.system_mode_start;
            let back_to_back = DeviceMeasurementMode::BackToBack.bits();
            if mode_start & back_to_back == back_to_back {
                self.cfg.dyn_cfg.system_grouped_parameter_hold_0 = self.ll_state.cfg.gph_id | 0x01;
                self.cfg.dyn_cfg.system_grouped_parameter_hold_1 = self.ll_state.cfg.gph_id | 0x01;
                self.cfg.dyn_cfg.system_grouped_parameter_hold = self.ll_state.cfg.gph_id;
            }
            encode_into(&self.cfg.dyn_cfg, start, &mut self.temp_buffer);
        }
        encode_into(&self.cfg.sys_ctrl, start, &mut self.temp_buffer);

        self.write_multi_to_register_temp_buffer(start, size)?;

        let mode_start = self.cfg.sys_ctrl.system_mode_start;
        self.ll_state.update_readout_state(mode_start, self.cfg.dyn_cfg.system_grouped_parameter_hold);
        self.ll_state.update_config_state(mode_start);

        Ok(())
    }

    /// Aborts ranging and returns the firmware to software standby.
    pub fn stop_range(&mut self) -> Result<(), Error<B::Error>> {
        let mut mode_start = ModeStart(self.cfg.sys_ctrl.system_mode_start);
        mode_start.set_measurement_mode(DeviceMeasurementMode::Abort.bits() >> 4);
        self.cfg.sys_ctrl.system_mode_start = mode_start.0;

        self.cfg.sys_ctrl.encode(&mut self.temp_buffer[..SystemControl::SIZE]);
        self.write_multi_to_register_temp_buffer(SystemControl::INDEX, SystemControl::SIZE)?;

        mode_start.set_measurement_mode(DeviceMeasurementMode::Stop.bits() >> 4);
        self.cfg.sys_ctrl.system_mode_start = mode_start.0;
        self.ll_state.init(DeviceState::SwStandby);

        if self.lpa.is_low_power_auto_mode {
            low_power_auto_data_stop_range(&mut self.stat_nvm, &mut self.cfg, &mut self.lpa);
        }

        Ok(())
    }

    /// Reads the system, core and debug result groups in one transfer.
    pub fn get_measurement_results(&mut self) -> Result<(), Error<B::Error>> {
        self.read_from_register(SystemResults::INDEX, VL53L1X_RESULTS_IMAGE_SIZE)?;

        self.sys_results = decode_from(SystemResults::INDEX, &self.temp_buffer);
        self.core_results = decode_from(SystemResults::INDEX, &self.temp_buffer);
        self.dbg_results = decode_from(SystemResults::INDEX, &self.temp_buffer);

        Ok(())
    }

    /**
     * @brief Reads the last result, runs the low-power auto bookkeeping and
     * checks that the result belongs to the expected stream.
     */
    pub fn get_device_results(&mut self) -> Result<RangeResults, Error<B::Error>> {
        self.get_measurement_results()?;

        let range_results = copy_sys_and_core_results(self.gain_factor, &self.sys_results, &self.core_results);

        if self.lpa.is_low_power_auto_mode {
            if self.lpa.low_power_auto_range_count == 0 {
                low_power_auto_setup_manual_calibration(&mut self.stat_nvm, &mut self.cfg, &self.dbg_results, &mut self.lpa);
                self.lpa.low_power_auto_range_count = 1;
            } else if self.lpa.low_power_auto_range_count == 1 {
                self.lpa.low_power_auto_range_count = 2;
            }

            if self.lpa.low_power_auto_range_count != 0xFF {
                low_power_auto_update_dss(&mut self.cfg, &self.sys_results, &mut self.lpa);
            }
        }

        self.ll_state.check_readout_state(&self.sys_results, self.cfg.sys_ctrl.system_mode_start)?;

        Ok(range_results)
    }

    pub fn clear_interrupt_and_enable_next_range(&mut self, measurement_mode: DeviceMeasurementMode) -> Result<(), Error<B::Error>> {
        self.init_and_start_range(measurement_mode, DeviceConfigLevel::GeneralOnwards)
    }

    /* GPIO1 level meaning "result ready" for the given mux control */
    fn interrupt_ready_level(gpio_hv_mux_ctrl: u8) -> u8 {
        if gpio_hv_mux_ctrl & VL53L1X_INTERRUPT_POLARITY_MASK == 0x00 { 0x01 } else { 0x00 }
    }

    pub fn is_new_data_ready(&mut self) -> Result<bool, Error<B::Error>> {
        let ready_level = Self::interrupt_ready_level(self.cfg.stat_cfg.gpio_hv_mux_ctrl);
        let tio_hv_status = self.read_byte(VL53L1X_GPIO_TIO_HV_STATUS)?;

        Ok(tio_hv_status & 0x01 == ready_level)
    }

    pub fn poll_for_range_completion(&mut self, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        let gpio_hv_mux_ctrl = self.read_byte(VL53L1X_GPIO_HV_MUX_CTRL)?;
        let ready_level = Self::interrupt_ready_level(gpio_hv_mux_ctrl);

        self.poll_for_answer(VL53L1X_GPIO_TIO_HV_STATUS, 0x01, ready_level, timeout_ms)
    }

    /**
     * @brief Runs one firmware test (e.g. reference SPAD characterisation)
     * and leaves its range status in `sys_results`.
     */
    pub fn run_device_test(&mut self, device_test_mode: u8) -> Result<(), Error<B::Error>> {
        self.cfg.stat_cfg.gpio_hv_mux_ctrl = self.read_byte(VL53L1X_GPIO_HV_MUX_CTRL)?;

        /* Written straight to the device, the shadow keeps ranging mode */
        self.write_to_register(VL53L1X_TEST_MODE_CTRL, device_test_mode)?;

        self.poll_for_range_completion(VL53L1X_TEST_COMPLETION_POLLING_TIMEOUT_MS)?;

        self.read_from_register(VL53L1X_RESULT_RANGE_STATUS, 2)?;
        self.sys_results.result_range_status = self.temp_buffer[0] & 0x1F;
        self.sys_results.result_report_status = self.temp_buffer[1];
        log::debug!(
            "vl53l1x: device test {:#04x} range status {}",
            device_test_mode,
            self.sys_results.result_range_status
        );

        self.clear_interrupt()
    }
}
