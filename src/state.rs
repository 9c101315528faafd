//! Low-level driver state machine.
//!
//! The driver mirrors what the firmware does with every configuration it is
//! handed (`cfg`) and every result it publishes (`rd`), so a result that
//! does not belong to the expected stream can be rejected.

use crate::registers::SystemResults;

pub const GROUPED_PARAMETER_HOLD_ID_MASK: u8 = 0x02;
pub const DEVICE_MEASUREMENT_MODE_MASK: u8 = 0xF0;

/* Range status reported while waiting for grouped parameter hold sync */
const DEVICE_ERROR_GPH_STREAM_COUNT_0_READY: u8 = 18;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceState {
    PowerDown = 0,
    HwStandby = 1,
    FwColdboot = 2,
    SwStandby = 3,
    RangingDssAuto = 4,
    RangingDssManual = 5,
    RangingWaitGphSync = 6,
    RangingGatherData = 7,
    RangingOutputData = 8,
    Unknown = 98,
    Error = 99,
}

/// Measurement mode bits of SYSTEM__MODE_START.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceMeasurementMode {
    Stop = 0x00,
    SingleShot = 0x10,
    BackToBack = 0x20,
    Timed = 0x40,
    Abort = 0x80,
}

impl DeviceMeasurementMode {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubState {
    pub device_state: DeviceState,
    pub stream_count: u8,
    pub gph_id: u8,
    pub timing_status: u8,
}

impl SubState {
    fn new(device_state: DeviceState) -> Self {
        SubState {
            device_state,
            stream_count: 0,
            gph_id: GROUPED_PARAMETER_HOLD_ID_MASK,
            timing_status: 0,
        }
    }

    fn advance_stream(&mut self) {
        self.stream_count = if self.stream_count == 0xFF { 0x80 } else { self.stream_count + 1 };
        self.gph_id ^= GROUPED_PARAMETER_HOLD_ID_MASK;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateCheckError {
    GphSyncCheckFail,
    StreamCountCheckFail,
    GphIdCheckFail,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LlState {
    pub cfg: SubState,
    pub rd: SubState,
}

impl LlState {
    pub fn new(device_state: DeviceState) -> Self {
        LlState { cfg: SubState::new(device_state), rd: SubState::new(device_state) }
    }

    pub fn init(&mut self, device_state: DeviceState) {
        *self = LlState::new(device_state);
    }

    /// Tracks the configuration the firmware holds after a mode start write.
    pub fn update_config_state(&mut self, mode_start: u8) {
        if mode_start & DEVICE_MEASUREMENT_MODE_MASK == 0 {
            self.cfg = SubState::new(DeviceState::SwStandby);
            return;
        }

        self.cfg.advance_stream();
        match self.cfg.device_state {
            DeviceState::SwStandby => {
                self.cfg.timing_status ^= 0x01;
                self.cfg.stream_count = 1;
                self.cfg.device_state = DeviceState::RangingDssAuto;
            }
            DeviceState::RangingDssAuto => {
                self.cfg.timing_status ^= 0x01;
            }
            _ => self.cfg = SubState::new(DeviceState::SwStandby),
        }
    }

    /// Tracks which result the firmware will publish next.
    pub fn update_readout_state(&mut self, mode_start: u8, grouped_parameter_hold: u8) {
        if mode_start & DEVICE_MEASUREMENT_MODE_MASK == 0 {
            self.rd = SubState::new(DeviceState::SwStandby);
            return;
        }

        self.rd.advance_stream();
        match self.rd.device_state {
            DeviceState::SwStandby => {
                let next = if grouped_parameter_hold & GROUPED_PARAMETER_HOLD_ID_MASK > 0 {
                    DeviceState::RangingWaitGphSync
                } else {
                    DeviceState::RangingOutputData
                };
                self.rd = SubState::new(next);
            }
            DeviceState::RangingWaitGphSync => {
                self.rd.stream_count = 0;
                self.rd.device_state = DeviceState::RangingOutputData;
            }
            DeviceState::RangingGatherData => {
                self.rd.device_state = DeviceState::RangingOutputData;
            }
            DeviceState::RangingOutputData => {
                self.rd.timing_status ^= 0x01;
            }
            _ => self.rd = SubState::new(DeviceState::SwStandby),
        }
    }

    /// Checks a freshly read result against the expected readout state.
    /// Only back-to-back ranging is checked.
    pub fn check_readout_state(&self, results: &SystemResults, mode_start: u8) -> Result<(), StateCheckError> {
        if mode_start & DeviceMeasurementMode::BackToBack.bits() != DeviceMeasurementMode::BackToBack.bits() {
            return Ok(());
        }

        let device_range_status = results.result_range_status & 0x1F;
        let device_stream_count = results.result_stream_count;
        let device_gph_id = (results.result_interrupt_status & 0x30) >> 4;

        if self.rd.device_state == DeviceState::RangingWaitGphSync {
            if device_range_status != DEVICE_ERROR_GPH_STREAM_COUNT_0_READY {
                return Err(StateCheckError::GphSyncCheckFail);
            }
            return Ok(());
        }

        /* A gph id mismatch takes precedence over a stream count mismatch */
        if self.rd.gph_id != device_gph_id {
            return Err(StateCheckError::GphIdCheckFail);
        }
        if self.rd.stream_count != device_stream_count {
            return Err(StateCheckError::StreamCountCheckFail);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACK_TO_BACK: u8 = 0x21;
    const STOP: u8 = 0x01;

    #[test]
    fn init_resets_both_sub_states() {
        let mut state = LlState::new(DeviceState::Unknown);
        state.cfg.stream_count = 9;
        state.init(DeviceState::SwStandby);
        assert_eq!(state.cfg, state.rd);
        assert_eq!(state.cfg.device_state, DeviceState::SwStandby);
        assert_eq!(state.cfg.gph_id, 0x02);
        assert_eq!(state.cfg.stream_count, 0);
    }

    #[test]
    fn config_state_enters_dss_auto_and_toggles_timing() {
        let mut state = LlState::new(DeviceState::SwStandby);
        state.update_config_state(BACK_TO_BACK);
        assert_eq!(state.cfg.device_state, DeviceState::RangingDssAuto);
        assert_eq!(state.cfg.stream_count, 1);
        assert_eq!(state.cfg.timing_status, 1);
        assert_eq!(state.cfg.gph_id, 0x00);

        state.update_config_state(BACK_TO_BACK);
        assert_eq!(state.cfg.stream_count, 2);
        assert_eq!(state.cfg.timing_status, 0);
        assert_eq!(state.cfg.gph_id, 0x02);

        state.update_config_state(STOP);
        assert_eq!(state.cfg, SubState::new(DeviceState::SwStandby));
    }

    #[test]
    fn stream_count_wraps_to_0x80() {
        let mut state = LlState::new(DeviceState::SwStandby);
        state.update_readout_state(BACK_TO_BACK, 0x00);
        assert_eq!(state.rd.device_state, DeviceState::RangingOutputData);
        state.rd.stream_count = 0xFF;
        state.update_readout_state(BACK_TO_BACK, 0x00);
        assert_eq!(state.rd.stream_count, 0x80);

        state.cfg.device_state = DeviceState::RangingDssAuto;
        state.cfg.stream_count = 0xFF;
        state.update_config_state(BACK_TO_BACK);
        assert_eq!(state.cfg.stream_count, 0x80);
    }

    #[test]
    fn readout_waits_for_gph_sync_when_hold_is_active() {
        let mut state = LlState::new(DeviceState::SwStandby);
        state.update_readout_state(BACK_TO_BACK, 0x02);
        assert_eq!(state.rd.device_state, DeviceState::RangingWaitGphSync);
        assert_eq!(state.rd.stream_count, 0);

        let mut results = SystemResults { result_range_status: 9, ..Default::default() };
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Err(StateCheckError::GphSyncCheckFail));
        results.result_range_status = 18;
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Ok(()));

        state.update_readout_state(BACK_TO_BACK, 0x02);
        assert_eq!(state.rd.device_state, DeviceState::RangingOutputData);
        assert_eq!(state.rd.stream_count, 0);
        assert_eq!(state.rd.gph_id, 0x00);
    }

    #[test]
    fn readout_gph_id_mismatch_wins_over_stream_count() {
        let mut state = LlState::new(DeviceState::SwStandby);
        state.update_readout_state(BACK_TO_BACK, 0x00);
        state.update_readout_state(BACK_TO_BACK, 0x00);
        assert_eq!(state.rd.stream_count, 1);
        assert_eq!(state.rd.gph_id, 0x00);
        assert_eq!(state.rd.timing_status, 1);

        let mut results = SystemResults { result_range_status: 9, result_stream_count: 2, ..Default::default() };
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Err(StateCheckError::StreamCountCheckFail));
        results.result_interrupt_status = 0x20;
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Err(StateCheckError::GphIdCheckFail));
        results.result_stream_count = 1;
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Err(StateCheckError::GphIdCheckFail));
        results.result_interrupt_status = 0x00;
        assert_eq!(state.check_readout_state(&results, BACK_TO_BACK), Ok(()));

        /* timed ranging is never checked */
        results.result_stream_count = 77;
        assert_eq!(state.check_readout_state(&results, 0x41), Ok(()));
    }
}
