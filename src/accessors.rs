use consts::*;

use crate::{consts, BusOperation, Vl53l1x, Error, OutputPin, DelayNs, PalState, InterruptPolarity};
use crate::preset::*;
use crate::registers::SequenceConfig;
use crate::results::{fixpoint1616_to_fixpoint142, fixpoint1616_to_fixpoint97, fixpoint142_to_fixpoint1616, fixpoint97_to_fixpoint1616};
use crate::roi::{roi_to_zone, zone_to_roi, UserRoi};
use crate::state::DeviceMeasurementMode;

/// Identification of the sensor read from its NVM copy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    pub name: &'static str,
    pub device_type: &'static str,
    pub product_type: u8,
    pub product_revision_major: u8,
    pub product_revision_minor: u8,
}

impl<B: BusOperation, XS: OutputPin, T: DelayNs> Vl53l1x<B, XS, T> {

    /// This function gets the product revision, read from the NVM copy during `data_init`.
    ///
    /// # Return
    ///
    /// `(major, minor)` : Major is always 1, minor comes from the upper nibble of the revision id.
    pub fn get_product_revision(&self) -> (u8, u8) {
        (1, (self.nvm_copy_data.identification_revision_id & 0xF0) >> 4)
    }

    pub fn get_device_info(&self) -> DeviceInfo {
        let (major, minor) = self.get_product_revision();
        DeviceInfo {
            name: "VL53L1 cut1.1",
            device_type: "VL53L1",
            product_type: self.nvm_copy_data.identification_module_type,
            product_revision_major: major,
            product_revision_minor: minor,
        }
    }

    pub fn get_pal_state(&self) -> PalState {
        self.pal_state
    }

    /// Current tuning parameters.
    pub fn tuning_params(&self) -> &TuningParams {
        &self.tuning
    }

    /// This function replaces the tuning parameters. They are used from the next preset change on,
    /// so call `set_preset_mode` afterwards to apply them.
    ///
    /// # Arguments
    ///
    /// * `tuning` : New tuning parameters.
    pub fn set_tuning_params(&mut self, tuning: TuningParams) {
        self.tuning = tuning;
        self.gain_factor = tuning.lite_ranging_gain_factor;
        log::debug!("vl53l1x: tuning parameters replaced");
    }

    /**
     * @brief Inner function. Loads the device preset matching the ranging
     * preset and distance mode with its default timeouts.
     */
    pub(crate) fn apply_preset_mode(
        &mut self,
        preset_mode: PresetMode,
        distance_mode: DistanceMode,
        inter_measurement_period_ms: u32,
    ) -> Result<(), Error<B::Error>> {
        let measurement_mode = match preset_mode {
            PresetMode::Autonomous | PresetMode::LowPowerAutonomous => DeviceMeasurementMode::Timed,
            PresetMode::LiteRanging => DeviceMeasurementMode::BackToBack,
        };

        let device_preset = compute_device_preset_mode(preset_mode, distance_mode);
        let timing = get_preset_mode_timing_cfg(device_preset, &self.tuning);

        self.set_device_preset_mode(
            device_preset,
            timing.dss_config_target_total_rate_mcps,
            timing.phasecal_config_timeout_us,
            timing.mm_config_timeout_us,
            timing.range_config_timeout_us,
            inter_measurement_period_ms,
        )?;

        self.measurement_mode = measurement_mode;
        self.preset_mode = preset_mode;

        Ok(())
    }

    /// This function sets the ranging preset. The distance mode goes back to long, the timing budget
    /// to 41 ms and the inter-measurement period to 1 s.
    ///
    /// # Arguments
    ///
    /// * `preset_mode` : Lite ranging, autonomous or low-power autonomous.
    pub fn set_preset_mode(&mut self, preset_mode: PresetMode) -> Result<(), Error<B::Error>> {
        self.lpa = LowPowerAutoData::new(&self.tuning);

        self.apply_preset_mode(preset_mode, DistanceMode::Long, VL53L1X_PRESET_INTER_MEASUREMENT_MS)?;
        self.internal_distance_mode = DistanceMode::Long;
        self.new_distance_mode = DistanceMode::Long;
        self.distance_mode = DistanceMode::Long;

        self.set_measurement_timing_budget_us(VL53L1X_PRESET_TIMING_BUDGET_US)?;
        self.set_inter_measurement_period_ms(VL53L1X_PRESET_INTER_MEASUREMENT_MS)?;

        Ok(())
    }

    pub fn get_preset_mode(&self) -> PresetMode {
        self.preset_mode
    }

    /// This function sets the distance mode. User zone, timing budget and inter-measurement period are kept.
    ///
    /// # Arguments
    ///
    /// * `distance_mode` : Short, medium or long.
    pub fn set_distance_mode(&mut self, distance_mode: DistanceMode) -> Result<(), Error<B::Error>> {
        let user_zone = self.get_user_zone();
        let inter_measurement_period_ms = self.inter_measurement_period_ms;
        let (phasecal_us, mm_us, range_us) = self.get_timeouts_us()?;

        self.apply_preset_mode(self.preset_mode, distance_mode, inter_measurement_period_ms)?;
        self.internal_distance_mode = distance_mode;
        self.new_distance_mode = distance_mode;
        self.distance_mode = distance_mode;

        self.set_timeouts_us(phasecal_us, mm_us, range_us)?;
        self.range_config_timeout_us = range_us;
        self.set_user_zone(&user_zone);

        log::debug!("vl53l1x: distance mode {:?}", distance_mode);
        Ok(())
    }

    pub fn get_distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    /* Overhead added to the range timeout(s) of the current preset */
    fn timing_guard_us(&self) -> u32 {
        let sequence = SequenceConfig(self.cfg.dyn_cfg.system_sequence_config);
        let mm_enabled = sequence.mm1() || sequence.mm2();
        match self.preset_mode {
            PresetMode::LiteRanging => if mm_enabled { VL53L1X_LITE_MM_GUARD_US } else { VL53L1X_LITE_GUARD_US },
            PresetMode::Autonomous => if mm_enabled { VL53L1X_TIMED_MM_GUARD_US } else { VL53L1X_TIMED_GUARD_US },
            PresetMode::LowPowerAutonomous => {
                let vhv_loops = self.tuning.lowpowerauto_vhv_loop_bound as u32;
                VL53L1X_LOWPOWER_GUARD_BASE_US
                    + VL53L1X_LOWPOWER_VHV_LOOP_DURATION_US
                    + vhv_loops * VL53L1X_LOWPOWER_VHV_LOOP_DURATION_US
            }
        }
    }

    /// This function sets the time allowed for one full measurement.
    ///
    /// # Arguments
    ///
    /// * `timing_budget_us` : Budget in microseconds. Must exceed the guard time of the preset, the
    /// range timeout it leaves must stay below 550 ms (1.1 s for the timed presets) and the budget
    /// below 10 s.
    pub fn set_measurement_timing_budget_us(&mut self, timing_budget_us: u32) -> Result<(), Error<B::Error>> {
        if timing_budget_us > VL53L1X_MAX_TIMING_BUDGET_US {
            return Err(Error::InvalidParams);
        }

        let (phasecal_us, mm_us, _) = self.get_timeouts_us()?;
        let guard_us = self.timing_guard_us();
        let (fda_max_us, divisor) = match self.preset_mode {
            PresetMode::LiteRanging => (VL53L1X_FDA_MAX_TIMING_BUDGET_US, 1),
            PresetMode::Autonomous | PresetMode::LowPowerAutonomous => (VL53L1X_FDA_MAX_TIMING_BUDGET_US * 2, 2),
        };

        if timing_budget_us <= guard_us {
            return Err(Error::InvalidParams);
        }
        let range_budget_us = timing_budget_us - guard_us;
        if range_budget_us > fda_max_us {
            return Err(Error::InvalidParams);
        }

        let range_us = range_budget_us / divisor;
        self.set_timeouts_us(phasecal_us, mm_us, range_us)?;
        self.range_config_timeout_us = range_us;
        self.measurement_timing_budget_us = timing_budget_us;

        log::debug!("vl53l1x: timing budget {} us, range timeout {} us", timing_budget_us, range_us);
        Ok(())
    }

    /// This function gets the timing budget, recomputed from the programmed range timeout.
    ///
    /// # Return
    ///
    /// `timing_budget_us` : Budget in microseconds.
    pub fn get_measurement_timing_budget_us(&mut self) -> Result<u32, Error<B::Error>> {
        let (_, _, range_us) = self.get_timeouts_us()?;
        let guard_us = self.timing_guard_us();

        let timing_budget_us = match self.preset_mode {
            PresetMode::LiteRanging => range_us + guard_us,
            PresetMode::Autonomous | PresetMode::LowPowerAutonomous => 2 * range_us + guard_us,
        };
        self.measurement_timing_budget_us = timing_budget_us;

        Ok(timing_budget_us)
    }

    /// This function sets the delay between two measurements of the timed presets. The internal
    /// oscillator runs 6.4 % slow, so the programmed period is stretched by that much.
    ///
    /// # Arguments
    ///
    /// * `inter_measurement_period_ms` : Period in milliseconds.
    pub fn set_inter_measurement_period_ms(&mut self, inter_measurement_period_ms: u32) -> Result<(), Error<B::Error>> {
        let adjusted_imp = inter_measurement_period_ms.saturating_add(inter_measurement_period_ms.saturating_mul(64) / 1000);
        self.set_device_inter_measurement_period_ms(adjusted_imp)
    }

    pub fn get_inter_measurement_period_ms(&mut self) -> Result<u32, Error<B::Error>> {
        let adjusted_imp = self.get_device_inter_measurement_period_ms()?;
        Ok(adjusted_imp - adjusted_imp.saturating_mul(64) / 1000)
    }

    /* Programs the device threshold behind a limit check, 0 disables it */
    fn set_limit_value(&mut self, check_id: usize, value: u32) -> Result<(), Error<B::Error>> {
        match check_id {
            VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE => self.set_lite_sigma_threshold(fixpoint1616_to_fixpoint142(value)),
            VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE => self.set_lite_min_count_rate(fixpoint1616_to_fixpoint97(value)),
            _ => return Err(Error::InvalidParams),
        }
        Ok(())
    }

    /// This function enables or disables a limit check. A disabled check programs a threshold of 0.
    ///
    /// # Arguments
    ///
    /// * `check_id` : `VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE` or `VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE`.
    /// * `enable` : New state of the check.
    pub fn set_limit_check_enable(&mut self, check_id: usize, enable: bool) -> Result<(), Error<B::Error>> {
        if check_id >= VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            return Err(Error::InvalidParams);
        }

        let value = if enable { self.limit_checks.value[check_id] } else { 0 };
        self.set_limit_value(check_id, value)?;
        self.limit_checks.enable[check_id] = enable;

        Ok(())
    }

    pub fn get_limit_check_enable(&self, check_id: usize) -> Result<bool, Error<B::Error>> {
        if check_id >= VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            return Err(Error::InvalidParams);
        }

        Ok(self.limit_checks.enable[check_id])
    }

    /// This function sets a limit check value. It reaches the device only while the check is enabled.
    ///
    /// # Arguments
    ///
    /// * `check_id` : Limit check id.
    /// * `value` : Limit in 16.16 fixed point (mm for sigma, Mcps for the signal rate).
    pub fn set_limit_check_value(&mut self, check_id: usize, value: u32) -> Result<(), Error<B::Error>> {
        if self.get_limit_check_enable(check_id)? {
            self.set_limit_value(check_id, value)?;
        }
        self.limit_checks.value[check_id] = value;

        Ok(())
    }

    /// This function gets a limit check value from the programmed threshold. A threshold of 0 means
    /// the check is disabled, the stored value is returned then.
    ///
    /// # Return
    ///
    /// `value` : Limit in 16.16 fixed point.
    pub fn get_limit_check_value(&mut self, check_id: usize) -> Result<u32, Error<B::Error>> {
        let value = match check_id {
            VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE => fixpoint142_to_fixpoint1616(self.get_lite_sigma_threshold()),
            VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE => fixpoint97_to_fixpoint1616(self.get_lite_min_count_rate()),
            _ => return Err(Error::InvalidParams),
        };

        if value == 0 {
            self.limit_checks.enable[check_id] = false;
            Ok(self.limit_checks.value[check_id])
        } else {
            self.limit_checks.enable[check_id] = true;
            self.limit_checks.value[check_id] = value;
            Ok(value)
        }
    }

    /// Returns 1 when the last measurement failed this check.
    pub fn get_limit_check_status(&self, check_id: usize) -> Result<u8, Error<B::Error>> {
        if check_id >= VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            return Err(Error::InvalidParams);
        }

        Ok(self.limit_checks.status[check_id])
    }

    /// Value the last measurement produced for this check, 16.16.
    pub fn get_limit_check_current(&self, check_id: usize) -> Result<u32, Error<B::Error>> {
        if check_id >= VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            return Err(Error::InvalidParams);
        }

        Ok(self.limit_checks.current[check_id])
    }

    /// This function sets the region of interest. It is applied at the next start.
    ///
    /// # Arguments
    ///
    /// * `roi` : Rectangle of at least 4x4 SPADs inside the 16x16 array.
    pub fn set_user_roi(&mut self, roi: &UserRoi) -> Result<(), Error<B::Error>> {
        let user_zone = roi_to_zone(roi).ok_or(Error::InvalidParams)?;
        self.set_user_zone(&user_zone);

        Ok(())
    }

    pub fn get_user_roi(&self) -> UserRoi {
        zone_to_roi(&self.get_user_zone())
    }

    /// This function enables or disables one step of the ranging sequence, then re-applies the
    /// timing budget so that the guard time follows the MM steps.
    ///
    /// # Arguments
    ///
    /// * `sequence_step_id` : One of the `VL53L1X_SEQUENCESTEP_*` constants.
    /// * `enable` : New state of the step.
    pub fn set_sequence_step_enable(&mut self, sequence_step_id: u8, enable: bool) -> Result<(), Error<B::Error>> {
        let timing_budget_us = self.measurement_timing_budget_us;
        self.set_sequence_config_bit(sequence_step_id, enable)?;

        if self.set_measurement_timing_budget_us(timing_budget_us).is_err() {
            log::warn!("vl53l1x: timing budget {} us not re-applied", timing_budget_us);
        }

        Ok(())
    }

    pub fn get_sequence_step_enable(&self, sequence_step_id: u8) -> Result<bool, Error<B::Error>> {
        self.get_sequence_config_bit(sequence_step_id)
    }

    /// This function sets the GPIO1 level that signals a new measurement. It is applied at the next start.
    pub fn set_interrupt_polarity(&mut self, polarity: InterruptPolarity) {
        let mux = &mut self.cfg.stat_cfg.gpio_hv_mux_ctrl;
        *mux = (*mux & !VL53L1X_INTERRUPT_POLARITY_MASK) | (polarity as u8 & VL53L1X_INTERRUPT_POLARITY_MASK);
    }

    pub fn get_interrupt_polarity(&self) -> InterruptPolarity {
        if self.cfg.stat_cfg.gpio_hv_mux_ctrl & VL53L1X_INTERRUPT_POLARITY_MASK == 0 {
            InterruptPolarity::ActiveHigh
        } else {
            InterruptPolarity::ActiveLow
        }
    }
}
