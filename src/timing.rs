//! Fixed-point timing arithmetic shared by the preset, timeout and
//! calibration code. Nothing here touches the bus.

use crate::registers::{GeneralConfig, TimingConfig};

/* Macro period is 2304 VCSEL periods */
const MACRO_PERIOD_VCSEL_PERIODS: u64 = 2304;

/// PLL period in 6.26 format, 0 for an unknown oscillator frequency.
pub fn calc_pll_period_us(fast_osc_frequency: u16) -> u32 {
    if fast_osc_frequency == 0 {
        return 0;
    }
    (1u32 << 30) / fast_osc_frequency as u32
}

pub fn decode_vcsel_period(vcsel_period_reg: u8) -> u8 {
    (vcsel_period_reg.wrapping_add(1)) << 1
}

pub fn encode_vcsel_period(vcsel_period_pclks: u8) -> u8 {
    (vcsel_period_pclks >> 1).wrapping_sub(1)
}

/// Macro period in 12.12 format.
pub fn calc_macro_period_us(fast_osc_frequency: u16, vcsel_period_reg: u8) -> u32 {
    let pll_period_us = calc_pll_period_us(fast_osc_frequency) as u64;
    let vcsel_period_pclks = decode_vcsel_period(vcsel_period_reg) as u64;

    let mut macro_period_us = (MACRO_PERIOD_VCSEL_PERIODS * pll_period_us) >> 6;
    macro_period_us = (macro_period_us * vcsel_period_pclks) >> 6;

    clip_u32(macro_period_us)
}

/// Converts microseconds into macro periods, rounding to nearest.
pub fn calc_timeout_mclks(timeout_us: u32, macro_period_us: u32) -> u32 {
    if macro_period_us == 0 {
        return 0;
    }
    let mclks = (((timeout_us as u64) << 12) + (macro_period_us as u64 >> 1)) / macro_period_us as u64;
    clip_u32(mclks)
}

pub fn calc_timeout_us(timeout_mclks: u32, macro_period_us: u32) -> u32 {
    let us = (timeout_mclks as u64 * macro_period_us as u64 + 0x800) >> 12;
    clip_u32(us)
}

/// Encodes macro periods as `(ms << 8) | ls` with `mclks = (ls << ms) + 1`.
pub fn encode_timeout(timeout_mclks: u32) -> u16 {
    if timeout_mclks == 0 {
        return 0;
    }

    let mut ls_byte = timeout_mclks - 1;
    let mut ms_byte: u16 = 0;
    while ls_byte & 0xFFFF_FF00 > 0 {
        ls_byte >>= 1;
        ms_byte += 1;
    }

    (ms_byte << 8) | (ls_byte & 0xFF) as u16
}

pub fn decode_timeout(encoded_timeout: u16) -> u32 {
    let ls_byte = (encoded_timeout & 0xFF) as u32;
    let ms_byte = (encoded_timeout >> 8) as u32;
    ls_byte.checked_shl(ms_byte).unwrap_or(0) + 1
}

pub fn calc_encoded_timeout(timeout_us: u32, macro_period_us: u32) -> u16 {
    encode_timeout(calc_timeout_mclks(timeout_us, macro_period_us))
}

pub fn calc_decoded_timeout_us(encoded_timeout: u16, macro_period_us: u32) -> u32 {
    calc_timeout_us(decode_timeout(encoded_timeout), macro_period_us)
}

/// Fills in the phasecal, MM and range timeouts of `general` and `timing`.
///
/// VCSEL period A drives the phasecal timeout (at most 0xFF macro periods)
/// and the A timeouts, VCSEL period B drives the B timeouts. Returns `None`
/// when the oscillator frequency is unknown.
pub fn calc_timeout_register_values(
    phasecal_config_timeout_us: u32,
    mm_config_timeout_us: u32,
    range_config_timeout_us: u32,
    fast_osc_frequency: u16,
    general: &mut GeneralConfig,
    timing: &mut TimingConfig,
) -> Option<()> {
    if fast_osc_frequency == 0 {
        return None;
    }

    let macro_period_us = calc_macro_period_us(fast_osc_frequency, timing.range_config_vcsel_period_a);

    let phasecal_mclks = calc_timeout_mclks(phasecal_config_timeout_us, macro_period_us);
    general.phasecal_config_timeout_macrop = phasecal_mclks.min(0xFF) as u8;

    timing.mm_config_timeout_macrop_a = calc_encoded_timeout(mm_config_timeout_us, macro_period_us);
    timing.range_config_timeout_macrop_a = calc_encoded_timeout(range_config_timeout_us, macro_period_us);

    let macro_period_us = calc_macro_period_us(fast_osc_frequency, timing.range_config_vcsel_period_b);

    timing.mm_config_timeout_macrop_b = calc_encoded_timeout(mm_config_timeout_us, macro_period_us);
    timing.range_config_timeout_macrop_b = calc_encoded_timeout(range_config_timeout_us, macro_period_us);

    Some(())
}

fn clip_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 { u32::MAX } else { value as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_OSC: u16 = 0xBCCC;

    #[test]
    fn pll_period_of_a_nominal_oscillator() {
        assert_eq!(calc_pll_period_us(FAST_OSC), (1u32 << 30) / 0xBCCC);
        assert_eq!(calc_pll_period_us(0), 0);
    }

    #[test]
    fn vcsel_period_encoding() {
        assert_eq!(decode_vcsel_period(0x0B), 24);
        assert_eq!(decode_vcsel_period(0x07), 16);
        assert_eq!(encode_vcsel_period(24), 0x0B);
        assert_eq!(encode_vcsel_period(decode_vcsel_period(0x0F)), 0x0F);
    }

    #[test]
    fn macro_period_scales_with_the_vcsel_period() {
        let pll = calc_pll_period_us(FAST_OSC) as u64;
        let expected = (((2304 * pll) >> 6) * 24) >> 6;
        assert_eq!(calc_macro_period_us(FAST_OSC, 0x0B) as u64, expected);
        assert!(calc_macro_period_us(FAST_OSC, 0x0F) > calc_macro_period_us(FAST_OSC, 0x0B));
        assert_eq!(calc_macro_period_us(0, 0x0B), 0);
    }

    #[test]
    fn timeout_encoding() {
        assert_eq!(encode_timeout(0), 0);
        assert_eq!(encode_timeout(1), 0x0000);
        assert_eq!(encode_timeout(256), 0x00FF);
        assert_eq!(encode_timeout(257), 0x0180);
        assert_eq!(decode_timeout(0x0180), 257);
        assert_eq!(decode_timeout(0x00FF), 256);
    }

    #[test]
    fn decoded_timeout_covers_the_request_within_one_step() {
        for &mclks in &[1u32, 2, 100, 255, 256, 257, 1000, 4097, 65_000, 1_000_000] {
            let encoded = encode_timeout(mclks);
            let decoded = decode_timeout(encoded);
            let step = 1u32 << (encoded >> 8);
            assert!(decoded <= mclks, "{} -> {}", mclks, decoded);
            assert!(mclks - decoded < step, "{} -> {}", mclks, decoded);
        }
    }

    #[test]
    fn microsecond_round_trip_stays_close() {
        let macro_period_us = calc_macro_period_us(FAST_OSC, 0x0B);
        let mclks = calc_timeout_mclks(33_000, macro_period_us);
        let us = calc_timeout_us(mclks, macro_period_us);
        assert!(us.abs_diff(33_000) <= macro_period_us >> 12);
        assert_eq!(calc_timeout_mclks(1000, 0), 0);
    }

    #[test]
    fn huge_timeouts_saturate_instead_of_wrapping() {
        assert_eq!(calc_timeout_us(u32::MAX, u32::MAX), u32::MAX);
        assert!(calc_timeout_mclks(u32::MAX, 1) == u32::MAX);
    }

    #[test]
    fn register_values_for_medium_range() {
        let mut general = GeneralConfig::default();
        let mut timing = TimingConfig {
            range_config_vcsel_period_a: 0x0B,
            range_config_vcsel_period_b: 0x09,
            ..Default::default()
        };
        calc_timeout_register_values(1000, 2000, 13000, FAST_OSC, &mut general, &mut timing).unwrap();

        let macro_a = calc_macro_period_us(FAST_OSC, 0x0B);
        let macro_b = calc_macro_period_us(FAST_OSC, 0x09);
        assert_eq!(general.phasecal_config_timeout_macrop as u32, calc_timeout_mclks(1000, macro_a).min(0xFF));
        assert_eq!(timing.range_config_timeout_macrop_a, calc_encoded_timeout(13000, macro_a));
        assert_eq!(timing.range_config_timeout_macrop_b, calc_encoded_timeout(13000, macro_b));
        assert_eq!(timing.mm_config_timeout_macrop_b, calc_encoded_timeout(2000, macro_b));

        let decoded = calc_decoded_timeout_us(timing.range_config_timeout_macrop_a, macro_a);
        assert!(decoded.abs_diff(13000) <= macro_a >> 12);

        assert!(calc_timeout_register_values(1000, 2000, 13000, 0, &mut general, &mut timing).is_none());
    }
}
