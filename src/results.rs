//! Range result decoding: device result groups to per-stream range data, and
//! range data to the measurement reported to the user.

use crate::consts::*;
use crate::registers::{CoreResults, SystemResults};

pub const RANGE_STATUS_MASK: u8 = 0x1F;

/* Device error codes found in RESULT__RANGE_STATUS */
pub const DEVICE_ERROR_NO_UPDATE: u8 = 0;
pub const DEVICE_ERROR_VCSEL_CONTINUITY_TEST_FAILURE: u8 = 1;
pub const DEVICE_ERROR_VCSEL_WATCHDOG_TEST_FAILURE: u8 = 2;
pub const DEVICE_ERROR_NO_VHV_VALUE_FOUND: u8 = 3;
pub const DEVICE_ERROR_MSRC_NO_TARGET: u8 = 4;
pub const DEVICE_ERROR_RANGE_PHASE_CHECK: u8 = 5;
pub const DEVICE_ERROR_SIGMA_THRESHOLD_CHECK: u8 = 6;
pub const DEVICE_ERROR_PHASE_CONSISTENCY: u8 = 7;
pub const DEVICE_ERROR_MIN_CLIP: u8 = 8;
pub const DEVICE_ERROR_RANGE_COMPLETE: u8 = 9;
pub const DEVICE_ERROR_RANGE_IGNORE_THRESHOLD: u8 = 12;
pub const DEVICE_ERROR_USER_ROI_CLIP: u8 = 13;
pub const DEVICE_ERROR_REF_SPAD_CHAR_NOT_ENOUGH_SPADS: u8 = 14;
pub const DEVICE_ERROR_REF_SPAD_CHAR_MORE_THAN_TARGET: u8 = 15;
pub const DEVICE_ERROR_REF_SPAD_CHAR_LESS_THAN_TARGET: u8 = 16;
pub const DEVICE_ERROR_MULTI_CLIP_FAIL: u8 = 17;
pub const DEVICE_ERROR_GPH_STREAM_COUNT_0_READY: u8 = 18;
pub const DEVICE_ERROR_RANGE_COMPLETE_NO_WRAP_CHECK: u8 = 19;

/* RESULT__REPORT_STATUS values selecting the effective SPAD count */
const DEVICE_REPORT_STATUS_MM1: u8 = 7;
const DEVICE_REPORT_STATUS_MM2: u8 = 8;

/// Range status reported to the user.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RangeStatus {
    RangeValid = 0,
    SigmaFail = 1,
    SignalFail = 2,
    RangeValidMinRangeClipped = 3,
    OutOfBoundsFail = 4,
    HardwareFail = 5,
    RangeValidNoWrapCheckFail = 6,
    WrapTargetFail = 7,
    ProcessingFail = 8,
    XtalkSignalFail = 9,
    SynchronisationInt = 10,
    RangeValidMergedPulse = 11,
    TargetPresentLackOfSignal = 12,
    MinRangeFail = 13,
    RangeInvalid = 14,
    #[default]
    None = 255,
}

/// Range data of one stream (SD0 or SD1) after gain and sigma correction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeData {
    pub range_id: u8,
    pub time_stamp: u32,
    pub range_status: u8,
    pub actual_effective_spads: u16,
    /// 9.7 Mcps.
    pub peak_signal_count_rate_mcps: u16,
    pub avg_signal_count_rate_mcps: u16,
    pub ambient_count_rate_mcps: u16,
    /// 9.7 mm.
    pub sigma_mm: u16,
    pub median_phase: u16,
    pub median_range_mm: i16,
    pub ranging_total_events: u32,
    pub signal_total_events: i32,
    pub total_periods_elapsed: u32,
    pub ambient_window_events: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeResults {
    pub stream_count: u8,
    pub device_status: u8,
    pub data: [RangeData; 2],
}

/// Measurement handed to the user. Rates and sigma are 16.16 fixed point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangingMeasurementData {
    pub time_stamp: u32,
    pub stream_count: u8,
    pub range_quality_level: u8,
    pub signal_rate_rtn_mega_cps: u32,
    pub ambient_rate_rtn_mega_cps: u32,
    pub effective_spad_rtn_count: u16,
    pub sigma_milli_meter: u32,
    pub range_milli_meter: i16,
    pub range_fractional_part: u8,
    pub range_status: RangeStatus,
}

/// Sigma and signal rate limit checks, indexed by the `VL53L1X_CHECKENABLE_*`
/// constants. Values are 16.16 fixed point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitChecks {
    pub enable: [bool; VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS],
    pub value: [u32; VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS],
    pub status: [u8; VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS],
    pub current: [u32; VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS],
}

pub fn fixpoint97_to_fixpoint1616(value: u16) -> u32 {
    (value as u32) << 9
}

pub fn fixpoint1616_to_fixpoint97(value: u32) -> u16 {
    ((value >> 9) & 0xFFFF) as u16
}

pub fn fixpoint1616_to_fixpoint142(value: u32) -> u16 {
    ((value >> 14) & 0xFFFF) as u16
}

pub fn fixpoint142_to_fixpoint1616(value: u16) -> u32 {
    (value as u32) << 14
}

fn sigma_to_fixpoint97(sigma: u16) -> u16 {
    ((sigma as u32) << 5).min(0xFFFF) as u16
}

fn apply_gain(raw_range_mm: u16, gain_factor: u16) -> i16 {
    let range_mm = (raw_range_mm as i16) as i32 * gain_factor as i32;
    ((range_mm + 0x0400) / 0x0800) as i16
}

/// Builds the per-stream range data from the system and core result groups.
///
/// Device level failures are moved out of the range status into
/// `device_status`.
pub fn copy_sys_and_core_results(gain_factor: u16, sys: &SystemResults, core: &CoreResults) -> RangeResults {
    let raw_status = sys.result_range_status & RANGE_STATUS_MASK;
    let range_status = if sys.result_stream_count == 0 && raw_status == DEVICE_ERROR_RANGE_COMPLETE {
        DEVICE_ERROR_RANGE_COMPLETE_NO_WRAP_CHECK
    } else {
        raw_status
    };

    let sd0_spads = match sys.result_report_status {
        DEVICE_REPORT_STATUS_MM1 => sys.result_mm_inner_actual_effective_spads_sd0,
        DEVICE_REPORT_STATUS_MM2 => sys.result_mm_outer_actual_effective_spads_sd0,
        _ => sys.result_dss_actual_effective_spads_sd0,
    };

    let mut results = RangeResults {
        stream_count: sys.result_stream_count,
        device_status: DEVICE_ERROR_NO_UPDATE,
        data: [
            RangeData {
                range_id: 0,
                time_stamp: 0,
                range_status,
                actual_effective_spads: sd0_spads,
                peak_signal_count_rate_mcps: sys.result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0,
                avg_signal_count_rate_mcps: sys.result_avg_signal_count_rate_mcps_sd0,
                ambient_count_rate_mcps: sys.result_ambient_count_rate_mcps_sd0,
                sigma_mm: sigma_to_fixpoint97(sys.result_sigma_sd0),
                median_phase: sys.result_phase_sd0,
                median_range_mm: apply_gain(sys.result_final_crosstalk_corrected_range_mm_sd0, gain_factor),
                ranging_total_events: core.result_core_ranging_total_events_sd0,
                signal_total_events: core.result_core_signal_total_events_sd0,
                total_periods_elapsed: core.result_core_total_periods_elapsed_sd0,
                ambient_window_events: core.result_core_ambient_window_events_sd0,
            },
            RangeData {
                range_id: 1,
                time_stamp: 0,
                range_status,
                actual_effective_spads: sys.result_dss_actual_effective_spads_sd1,
                peak_signal_count_rate_mcps: sys.result_peak_signal_count_rate_mcps_sd1,
                avg_signal_count_rate_mcps: 0xFFFF,
                ambient_count_rate_mcps: sys.result_ambient_count_rate_mcps_sd1,
                sigma_mm: sigma_to_fixpoint97(sys.result_sigma_sd1),
                median_phase: sys.result_phase_sd1,
                median_range_mm: apply_gain(sys.result_final_crosstalk_corrected_range_mm_sd1, gain_factor),
                ranging_total_events: core.result_core_ranging_total_events_sd1,
                signal_total_events: core.result_core_signal_total_events_sd1,
                total_periods_elapsed: core.result_core_total_periods_elapsed_sd1,
                ambient_window_events: core.result_core_ambient_window_events_sd1,
            },
        ],
    };

    match raw_status {
        DEVICE_ERROR_VCSEL_CONTINUITY_TEST_FAILURE
        | DEVICE_ERROR_VCSEL_WATCHDOG_TEST_FAILURE
        | DEVICE_ERROR_NO_VHV_VALUE_FOUND
        | DEVICE_ERROR_USER_ROI_CLIP
        | DEVICE_ERROR_MULTI_CLIP_FAIL => {
            results.device_status = raw_status;
            results.data[0].range_status = DEVICE_ERROR_NO_UPDATE;
        }
        _ => {}
    }

    results
}

/// Range quality level, 50 (poor) to 100 (good), 0 when nothing was measured.
pub fn compute_rql(active_results: u8, filtered_range_status: u8, data: &RangeData) -> u8 {
    const SRL: i16 = 300;
    const SRAS: u32 = 30;
    const GI: u32 = 7_713_587; /* 117.7 */
    const GGM: u32 = 3_198_157; /* 48.8 */
    const LRAP: u32 = 6554; /* 0.1 */

    if active_results == 0 {
        return 0;
    }
    if filtered_range_status == DEVICE_ERROR_PHASE_CONSISTENCY {
        return 50;
    }

    let ras: u64 = if data.median_range_mm < SRL {
        SRAS as u64 * 65536
    } else {
        LRAP as u64 * data.median_range_mm as u64
    };

    let srql: u64 = if ras != 0 {
        let partial = ((GGM as u64 * data.sigma_mm as u64 + (ras >> 1)) / ras) * 65536;
        if partial <= GI as u64 { GI as u64 - partial } else { 50 * 65536 }
    } else {
        100 * 65536
    };

    ((srql >> 16) as u8).clamp(50, 100)
}

pub fn convert_status_lite(filtered_range_status: u8) -> RangeStatus {
    match filtered_range_status {
        DEVICE_ERROR_GPH_STREAM_COUNT_0_READY => RangeStatus::SynchronisationInt,
        DEVICE_ERROR_RANGE_COMPLETE_NO_WRAP_CHECK => RangeStatus::RangeValidNoWrapCheckFail,
        DEVICE_ERROR_RANGE_PHASE_CHECK => RangeStatus::OutOfBoundsFail,
        DEVICE_ERROR_MSRC_NO_TARGET => RangeStatus::SignalFail,
        DEVICE_ERROR_SIGMA_THRESHOLD_CHECK => RangeStatus::SigmaFail,
        DEVICE_ERROR_PHASE_CONSISTENCY => RangeStatus::WrapTargetFail,
        DEVICE_ERROR_RANGE_IGNORE_THRESHOLD => RangeStatus::XtalkSignalFail,
        DEVICE_ERROR_MIN_CLIP => RangeStatus::RangeValidMinRangeClipped,
        DEVICE_ERROR_RANGE_COMPLETE => RangeStatus::RangeValid,
        _ => RangeStatus::None,
    }
}

/// Converts range data into the user measurement and refreshes the limit
/// check current values and status flags.
pub fn set_simple_data(
    active_results: u8,
    device_status: u8,
    data: &RangeData,
    proxy_min_mm: i16,
    limits: &mut LimitChecks,
) -> RangingMeasurementData {
    let filtered_range_status = data.range_status & RANGE_STATUS_MASK;

    let mut measurement = RangingMeasurementData {
        time_stamp: data.time_stamp,
        stream_count: 0,
        range_quality_level: compute_rql(active_results, filtered_range_status, data),
        signal_rate_rtn_mega_cps: fixpoint97_to_fixpoint1616(data.peak_signal_count_rate_mcps),
        ambient_rate_rtn_mega_cps: fixpoint97_to_fixpoint1616(data.ambient_count_rate_mcps),
        effective_spad_rtn_count: data.actual_effective_spads,
        sigma_milli_meter: fixpoint97_to_fixpoint1616(data.sigma_mm),
        range_milli_meter: data.median_range_mm,
        range_fractional_part: 0,
        range_status: RangeStatus::RangeValid,
    };

    measurement.range_status = match device_status {
        DEVICE_ERROR_MULTI_CLIP_FAIL
        | DEVICE_ERROR_VCSEL_WATCHDOG_TEST_FAILURE
        | DEVICE_ERROR_VCSEL_CONTINUITY_TEST_FAILURE
        | DEVICE_ERROR_NO_VHV_VALUE_FOUND => RangeStatus::HardwareFail,
        DEVICE_ERROR_USER_ROI_CLIP => RangeStatus::MinRangeFail,
        _ => convert_status_lite(filtered_range_status),
    };

    limits.current[VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE] = measurement.sigma_milli_meter;
    limits.current[VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE] = measurement.signal_rate_rtn_mega_cps;

    let sigma_flag = filtered_range_status == DEVICE_ERROR_SIGMA_THRESHOLD_CHECK;
    limits.status[VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE] =
        (limits.enable[VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE] && sigma_flag) as u8;

    let signal_flag = filtered_range_status == DEVICE_ERROR_MSRC_NO_TARGET;
    limits.status[VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE] =
        (limits.enable[VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE] && signal_flag) as u8;

    if measurement.range_status == RangeStatus::RangeValid && measurement.range_milli_meter < 0 {
        if measurement.range_milli_meter < proxy_min_mm {
            measurement.range_status = RangeStatus::RangeInvalid;
        } else {
            measurement.range_milli_meter = 0;
        }
    }

    measurement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_results(range_status: u8, stream_count: u8, range_mm: u16) -> SystemResults {
        SystemResults {
            result_range_status: range_status,
            result_stream_count: stream_count,
            result_final_crosstalk_corrected_range_mm_sd0: range_mm,
            result_dss_actual_effective_spads_sd0: 0x1000,
            result_mm_inner_actual_effective_spads_sd0: 0x2000,
            result_mm_outer_actual_effective_spads_sd0: 0x3000,
            result_sigma_sd0: 0x0900,
            result_peak_signal_count_rate_crosstalk_corrected_mcps_sd0: 0x0280,
            ..Default::default()
        }
    }

    fn enabled_limits() -> LimitChecks {
        LimitChecks { enable: [true; VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS], ..Default::default() }
    }

    #[test]
    fn gain_is_applied_with_rounding() {
        let results = copy_sys_and_core_results(2011, &system_results(9, 3, 1000), &CoreResults::default());
        assert_eq!(results.data[0].median_range_mm, ((1000 * 2011 + 0x400) / 0x800) as i16);
        assert_eq!(results.data[0].range_status, 9);
        assert_eq!(results.stream_count, 3);
        assert_eq!(results.device_status, DEVICE_ERROR_NO_UPDATE);
    }

    #[test]
    fn first_stream_has_no_wrap_check() {
        let results = copy_sys_and_core_results(2011, &system_results(0xC9, 0, 500), &CoreResults::default());
        assert_eq!(results.data[0].range_status, DEVICE_ERROR_RANGE_COMPLETE_NO_WRAP_CHECK);
    }

    #[test]
    fn sigma_is_shifted_and_clipped() {
        let results = copy_sys_and_core_results(2048, &system_results(9, 1, 0), &CoreResults::default());
        assert_eq!(results.data[0].sigma_mm, 0xFFFF);
        let mut sys = system_results(9, 1, 0);
        sys.result_sigma_sd0 = 0x10;
        let results = copy_sys_and_core_results(2048, &sys, &CoreResults::default());
        assert_eq!(results.data[0].sigma_mm, 0x200);
    }

    #[test]
    fn effective_spads_follow_the_report_status() {
        let mut sys = system_results(9, 1, 0);
        sys.result_report_status = 7;
        assert_eq!(copy_sys_and_core_results(2011, &sys, &CoreResults::default()).data[0].actual_effective_spads, 0x2000);
        sys.result_report_status = 8;
        assert_eq!(copy_sys_and_core_results(2011, &sys, &CoreResults::default()).data[0].actual_effective_spads, 0x3000);
        sys.result_report_status = 9;
        assert_eq!(copy_sys_and_core_results(2011, &sys, &CoreResults::default()).data[0].actual_effective_spads, 0x1000);
    }

    #[test]
    fn device_failures_move_into_device_status() {
        let results = copy_sys_and_core_results(2011, &system_results(2, 5, 0), &CoreResults::default());
        assert_eq!(results.device_status, DEVICE_ERROR_VCSEL_WATCHDOG_TEST_FAILURE);
        assert_eq!(results.data[0].range_status, DEVICE_ERROR_NO_UPDATE);

        let mut limits = enabled_limits();
        let measurement = set_simple_data(1, results.device_status, &results.data[0], -30, &mut limits);
        assert_eq!(measurement.range_status, RangeStatus::HardwareFail);

        let results = copy_sys_and_core_results(2011, &system_results(13, 5, 0), &CoreResults::default());
        let measurement = set_simple_data(1, results.device_status, &results.data[0], -30, &mut limits);
        assert_eq!(measurement.range_status, RangeStatus::MinRangeFail);
    }

    #[test]
    fn status_conversion() {
        assert_eq!(convert_status_lite(9), RangeStatus::RangeValid);
        assert_eq!(convert_status_lite(4), RangeStatus::SignalFail);
        assert_eq!(convert_status_lite(6), RangeStatus::SigmaFail);
        assert_eq!(convert_status_lite(18), RangeStatus::SynchronisationInt);
        assert_eq!(convert_status_lite(19), RangeStatus::RangeValidNoWrapCheckFail);
        assert_eq!(convert_status_lite(0), RangeStatus::None);
    }

    #[test]
    fn rql_bounds() {
        let data = RangeData { median_range_mm: 100, sigma_mm: 0, ..Default::default() };
        assert_eq!(compute_rql(0, 9, &data), 0);
        assert_eq!(compute_rql(1, DEVICE_ERROR_PHASE_CONSISTENCY, &data), 50);
        assert_eq!(compute_rql(1, 9, &data), 100);

        let noisy = RangeData { median_range_mm: 100, sigma_mm: 0xFFFF, ..Default::default() };
        assert_eq!(compute_rql(1, 9, &noisy), 50);
    }

    #[test]
    fn rql_close_target_uses_a_fixed_allowance() {
        /* 117.7 - 48.8 * sigma / 30, sigma in 9.7 mm */
        let data = RangeData { median_range_mm: 100, sigma_mm: 36, ..Default::default() };
        assert_eq!(compute_rql(1, 9, &data), 58);

        let far = RangeData { median_range_mm: 2000, sigma_mm: 36, ..Default::default() };
        assert_eq!(compute_rql(1, 9, &far), 100);
    }

    #[test]
    fn negative_ranges_clamp_or_invalidate() {
        let mut limits = enabled_limits();
        let close = RangeData { range_status: 9, median_range_mm: -10, ..Default::default() };
        let measurement = set_simple_data(1, 0, &close, -30, &mut limits);
        assert_eq!(measurement.range_status, RangeStatus::RangeValid);
        assert_eq!(measurement.range_milli_meter, 0);

        let behind = RangeData { range_status: 9, median_range_mm: -31, ..Default::default() };
        let measurement = set_simple_data(1, 0, &behind, -30, &mut limits);
        assert_eq!(measurement.range_status, RangeStatus::RangeInvalid);
        assert_eq!(measurement.range_milli_meter, -31);
    }

    #[test]
    fn negative_raw_ranges_stay_negative() {
        let results = copy_sys_and_core_results(2011, &system_results(9, 4, (-16i16) as u16), &CoreResults::default());
        assert!(results.data[0].median_range_mm < 0);
        assert!(results.data[0].median_range_mm >= -16);
    }

    #[test]
    fn limit_checks_track_the_measurement() {
        let mut limits = enabled_limits();
        let sigma_fail = RangeData {
            range_status: DEVICE_ERROR_SIGMA_THRESHOLD_CHECK,
            sigma_mm: 0x0A00,
            peak_signal_count_rate_mcps: 0x0080,
            median_range_mm: 800,
            ..Default::default()
        };
        let measurement = set_simple_data(1, 0, &sigma_fail, -30, &mut limits);
        assert_eq!(measurement.range_status, RangeStatus::SigmaFail);
        assert_eq!(limits.status, [1, 0]);
        assert_eq!(limits.current[VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE], 0x0A00 << 9);
        assert_eq!(limits.current[VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE], 0x0080 << 9);

        limits.enable[VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE] = false;
        let signal_fail = RangeData { range_status: DEVICE_ERROR_MSRC_NO_TARGET, ..Default::default() };
        set_simple_data(1, 0, &signal_fail, -30, &mut limits);
        assert_eq!(limits.status, [0, 0]);
    }

    #[test]
    fn fixed_point_conversions() {
        assert_eq!(fixpoint97_to_fixpoint1616(0x80), 0x10000);
        assert_eq!(fixpoint1616_to_fixpoint97(0x10000), 0x80);
        assert_eq!(fixpoint1616_to_fixpoint142(0x10000), 0x4);
        assert_eq!(fixpoint142_to_fixpoint1616(0x4), 0x10000);
    }
}
