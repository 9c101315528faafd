/* Register data is big-endian on the VL53L1X */

pub fn from_u8_to_u16(src: &[u8]) -> u16 {
    u16::from_be_bytes([src[0], src[1]])
}

pub fn from_u8_to_i16(src: &[u8]) -> i16 {
    i16::from_be_bytes([src[0], src[1]])
}

pub fn from_u8_to_u32(src: &[u8]) -> u32 {
    u32::from_be_bytes([src[0], src[1], src[2], src[3]])
}

pub fn from_u8_to_i32(src: &[u8]) -> i32 {
    i32::from_be_bytes([src[0], src[1], src[2], src[3]])
}

pub fn from_u16_to_u8(src: u16, dst: &mut [u8]) {
    dst[..2].copy_from_slice(&src.to_be_bytes());
}

pub fn from_i16_to_u8(src: i16, dst: &mut [u8]) {
    dst[..2].copy_from_slice(&src.to_be_bytes());
}

pub fn from_u32_to_u8(src: u32, dst: &mut [u8]) {
    dst[..4].copy_from_slice(&src.to_be_bytes());
}

/// Sign-extends the low `bits` bits of `value`.
pub fn sign_extend(value: u16, bits: u32) -> i16 {
    let shift = 16 - bits;
    ((value << shift) as i16) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_scalars() {
        let buf = [0xEA, 0xCC, 0xFF, 0xFE];
        assert_eq!(from_u8_to_u16(&buf), 0xEACC);
        assert_eq!(from_u8_to_i16(&buf[2..]), -2);
        assert_eq!(from_u8_to_u32(&buf), 0xEACC_FFFE);
        assert_eq!(from_u8_to_i32(&[0xFF, 0xFF, 0xFF, 0x85]), -123);

        let mut out = [0u8; 4];
        from_u16_to_u8(0x0A00, &mut out);
        assert_eq!(out[..2], [0x0A, 0x00]);
        from_i16_to_u8(-30, &mut out[2..]);
        assert_eq!(out[2..], [0xFF, 0xE2]);
        from_u32_to_u8(0x0000_0600, &mut out);
        assert_eq!(out, [0x00, 0x00, 0x06, 0x00]);
    }

    #[test]
    fn thirteen_bit_offsets_keep_their_sign() {
        assert_eq!(sign_extend(0x1FFF, 13), -1);
        assert_eq!(sign_extend(0x0FFF, 13), 4095);
        assert_eq!(sign_extend(0x1000, 13), -4096);
        assert_eq!(sign_extend((-120i16 as u16) & 0x1FFF, 13), -120);
    }
}
