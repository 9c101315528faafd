//! User region of interest on the 16x16 SPAD array.

use crate::consts::VL53L1X_SPAD_ARRAY_WIDTH;

/// Rectangle in SPAD coordinates, `(0, 15)` top left to `(15, 0)` bottom right.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserRoi {
    pub top_left_x: u8,
    pub top_left_y: u8,
    pub bot_right_x: u8,
    pub bot_right_y: u8,
}

/// Zone as programmed into the device: optical centre plus size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserZone {
    pub x_centre: u8,
    pub y_centre: u8,
    pub width: u8,
    pub height: u8,
}

/* Smallest zone the firmware accepts is 4x4 SPADs */
const MIN_ZONE_SPAN: u8 = 3;

pub fn check_valid_rect_roi(roi: &UserRoi) -> bool {
    let max = VL53L1X_SPAD_ARRAY_WIDTH - 1;
    if roi.top_left_x > max || roi.top_left_y > max || roi.bot_right_x > max || roi.bot_right_y > max {
        return false;
    }
    roi.top_left_x <= roi.bot_right_x && roi.top_left_y >= roi.bot_right_y
}

/// Converts a rectangle into a zone. `None` when the rectangle is invalid
/// or smaller than 4x4 SPADs.
pub fn roi_to_zone(roi: &UserRoi) -> Option<UserZone> {
    if !check_valid_rect_roi(roi) {
        return None;
    }

    let zone = UserZone {
        x_centre: ((roi.bot_right_x as u16 + roi.top_left_x as u16 + 1) / 2) as u8,
        y_centre: ((roi.top_left_y as u16 + roi.bot_right_y as u16 + 1) / 2) as u8,
        width: roi.bot_right_x - roi.top_left_x,
        height: roi.top_left_y - roi.bot_right_y,
    };

    if zone.width < MIN_ZONE_SPAN || zone.height < MIN_ZONE_SPAN {
        return None;
    }
    Some(zone)
}

pub fn zone_to_roi(zone: &UserZone) -> UserRoi {
    let x = zone.x_centre as i16;
    let y = zone.y_centre as i16;
    let w = zone.width as i16;
    let h = zone.height as i16;
    let clip = |v: i16| v.clamp(0, 0xFF) as u8;

    UserRoi {
        top_left_x: clip((2 * x - w) >> 1),
        top_left_y: clip((2 * y + h) >> 1),
        bot_right_x: clip((2 * x + w) >> 1),
        bot_right_y: clip((2 * y - h) >> 1),
    }
}

/// SPAD number of a `(row, col)` position.
pub fn encode_row_col(row: u8, col: u8) -> u8 {
    if row > 7 {
        128 + (col << 3) + (15 - row)
    } else {
        ((15 - col) << 3) + row
    }
}

/// `(row, col)` of a SPAD number.
pub fn decode_row_col(spad_number: u8) -> (u8, u8) {
    if spad_number > 127 {
        (8 + ((255 - spad_number) & 0x07), (spad_number - 128) >> 3)
    } else {
        (spad_number & 0x07, (127 - spad_number) >> 3)
    }
}

pub fn encode_zone_size(width: u8, height: u8) -> u8 {
    (height << 4) + width
}

/// `(width, height)` of an encoded zone size.
pub fn decode_zone_size(encoded_xy_size: u8) -> (u8, u8) {
    (encoded_xy_size & 0x0F, encoded_xy_size >> 4)
}

impl UserZone {
    pub fn encode(&self) -> (u8, u8) {
        (encode_row_col(self.y_centre, self.x_centre), encode_zone_size(self.width, self.height))
    }

    pub fn decode(centre_spad: u8, xy_size: u8) -> Self {
        let (y_centre, x_centre) = decode_row_col(centre_spad);
        let (width, height) = decode_zone_size(xy_size);
        UserZone { x_centre, y_centre, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_zone_covers_the_whole_array() {
        let zone = UserZone::decode(0xC7, 0xFF);
        assert_eq!(zone, UserZone { x_centre: 8, y_centre: 8, width: 15, height: 15 });
        assert_eq!(zone_to_roi(&zone), UserRoi { top_left_x: 0, top_left_y: 15, bot_right_x: 15, bot_right_y: 0 });
    }

    #[test]
    fn full_array_roi_encodes_to_the_default_registers() {
        let roi = UserRoi { top_left_x: 0, top_left_y: 15, bot_right_x: 15, bot_right_y: 0 };
        let zone = roi_to_zone(&roi).unwrap();
        assert_eq!(zone.encode(), (0xC7, 0xFF));
    }

    #[test]
    fn spad_numbering_both_halves() {
        for row in 0..16u8 {
            for col in 0..16u8 {
                assert_eq!(decode_row_col(encode_row_col(row, col)), (row, col));
            }
        }
        assert_eq!(encode_row_col(0, 15), 0);
        assert_eq!(encode_row_col(15, 0), 128);
    }

    #[test]
    fn rejects_inverted_or_out_of_range_rectangles() {
        assert!(!check_valid_rect_roi(&UserRoi { top_left_x: 16, top_left_y: 15, bot_right_x: 15, bot_right_y: 0 }));
        assert!(!check_valid_rect_roi(&UserRoi { top_left_x: 10, top_left_y: 15, bot_right_x: 5, bot_right_y: 0 }));
        assert!(!check_valid_rect_roi(&UserRoi { top_left_x: 0, top_left_y: 2, bot_right_x: 15, bot_right_y: 8 }));
        assert!(roi_to_zone(&UserRoi { top_left_x: 10, top_left_y: 15, bot_right_x: 5, bot_right_y: 0 }).is_none());
    }

    #[test]
    fn rejects_zones_smaller_than_four_spads() {
        assert!(roi_to_zone(&UserRoi { top_left_x: 4, top_left_y: 11, bot_right_x: 6, bot_right_y: 4 }).is_none());
        let zone = roi_to_zone(&UserRoi { top_left_x: 4, top_left_y: 11, bot_right_x: 7, bot_right_y: 8 }).unwrap();
        assert_eq!(zone, UserZone { x_centre: 6, y_centre: 10, width: 3, height: 3 });
    }

    #[test]
    fn small_roi_survives_the_register_encoding() {
        let roi = UserRoi { top_left_x: 6, top_left_y: 9, bot_right_x: 9, bot_right_y: 6 };
        let zone = roi_to_zone(&roi).unwrap();
        let (centre, size) = zone.encode();
        let back = zone_to_roi(&UserZone::decode(centre, size));
        assert_eq!(back, roi);
    }
}
