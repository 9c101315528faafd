use embedded_hal::i2c::SevenBitAddress;

pub const VL53L1X_DEFAULT_I2C_ADDRESS: SevenBitAddress = 0x52 >> 1;

/* Model id (0xEA) and module type (0xCC) read as one word */
pub const VL53L1X_MODEL_ID: u16 = 0xEACC;

pub const VL53L1X_SOFT_RESET: u16 = 0x0000;
pub const VL53L1X_I2C_SLAVE_DEVICE_ADDRESS: u16 = 0x0001;
pub const VL53L1X_GLOBAL_CONFIG_SPAD_ENABLES_REF_0: u16 = 0x000D;
pub const VL53L1X_REF_SPAD_MAN_NUM_REQUESTED_REF_SPADS: u16 = 0x0014;
pub const VL53L1X_REF_SPAD_CHAR_TOTAL_RATE_TARGET_MCPS: u16 = 0x001C;
pub const VL53L1X_TEST_MODE_CTRL: u16 = 0x0027;
pub const VL53L1X_PAD_I2C_HV_EXTSUP_CONFIG: u16 = 0x002E;
pub const VL53L1X_GPIO_HV_MUX_CTRL: u16 = 0x0030;
pub const VL53L1X_GPIO_TIO_HV_STATUS: u16 = 0x0031;
pub const VL53L1X_PHASECAL_CONFIG_TIMEOUT_MACROP: u16 = 0x004B;
pub const VL53L1X_RANGE_CONFIG_VCSEL_PERIOD_A: u16 = 0x0060;
pub const VL53L1X_RANGE_CONFIG_SIGMA_THRESH: u16 = 0x0064;
pub const VL53L1X_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT_MCPS: u16 = 0x0066;
pub const VL53L1X_SD_CONFIG_WOI_SD0: u16 = 0x0078;
pub const VL53L1X_POWER_MANAGEMENT_GO1_POWER_FORCE: u16 = 0x0083;
pub const VL53L1X_FIRMWARE_ENABLE: u16 = 0x0085;
pub const VL53L1X_SYSTEM_INTERRUPT_CLEAR: u16 = 0x0086;
pub const VL53L1X_SYSTEM_MODE_START: u16 = 0x0087;
pub const VL53L1X_RESULT_RANGE_STATUS: u16 = 0x0089;
pub const VL53L1X_RESULT_SPARE_0_SD1: u16 = 0x00AC;
pub const VL53L1X_REF_SPAD_CHAR_RESULT_NUM_ACTUAL_REF_SPADS: u16 = 0x00D9;
pub const VL53L1X_RESULT_OSC_CALIBRATE_VAL: u16 = 0x00DE;
pub const VL53L1X_FIRMWARE_SYSTEM_STATUS: u16 = 0x00E5;
pub const VL53L1X_IDENTIFICATION_MODEL_ID: u16 = 0x010F;

pub const VL53L1X_RANGING_CORE_CLK_CTRL1: u16 = 0x0683;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_MODE: u16 = 0x0780;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_PDN: u16 = 0x0781;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_READN: u16 = 0x0783;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_PULSE_WIDTH_MSB: u16 = 0x0784;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_DATAOUT_MMM: u16 = 0x0790;
pub const VL53L1X_RANGING_CORE_NVM_CTRL_ADDR: u16 = 0x0794;

/* Register groups: first index and size in bytes */
pub const VL53L1X_STATIC_NVM_MANAGED_INDEX: u16 = 0x0001;
pub const VL53L1X_STATIC_NVM_MANAGED_SIZE: usize = 11;
pub const VL53L1X_CUSTOMER_NVM_MANAGED_INDEX: u16 = 0x000D;
pub const VL53L1X_CUSTOMER_NVM_MANAGED_SIZE: usize = 23;
pub const VL53L1X_STATIC_CONFIG_INDEX: u16 = 0x0024;
pub const VL53L1X_STATIC_CONFIG_SIZE: usize = 32;
pub const VL53L1X_GENERAL_CONFIG_INDEX: u16 = 0x0044;
pub const VL53L1X_GENERAL_CONFIG_SIZE: usize = 22;
pub const VL53L1X_TIMING_CONFIG_INDEX: u16 = 0x005A;
pub const VL53L1X_TIMING_CONFIG_SIZE: usize = 23;
pub const VL53L1X_DYNAMIC_CONFIG_INDEX: u16 = 0x0071;
pub const VL53L1X_DYNAMIC_CONFIG_SIZE: usize = 18;
pub const VL53L1X_SYSTEM_CONTROL_INDEX: u16 = 0x0083;
pub const VL53L1X_SYSTEM_CONTROL_SIZE: usize = 5;
pub const VL53L1X_SYSTEM_RESULTS_INDEX: u16 = 0x0088;
pub const VL53L1X_SYSTEM_RESULTS_SIZE: usize = 44;
pub const VL53L1X_CORE_RESULTS_INDEX: u16 = 0x00B4;
pub const VL53L1X_CORE_RESULTS_SIZE: usize = 33;
pub const VL53L1X_DEBUG_RESULTS_INDEX: u16 = 0x00D6;
pub const VL53L1X_DEBUG_RESULTS_SIZE: usize = 56;
pub const VL53L1X_NVM_COPY_DATA_INDEX: u16 = 0x010F;
pub const VL53L1X_NVM_COPY_DATA_SIZE: usize = 49;

/* Full configuration image 0x0001..=0x0087 and full result image 0x0088..=0x010D */
pub const VL53L1X_MAX_I2C_XFER_SIZE: usize = 256;
pub const VL53L1X_CONFIG_IMAGE_END: u16 = VL53L1X_SYSTEM_RESULTS_INDEX;
pub const VL53L1X_RESULTS_IMAGE_SIZE: usize =
    (VL53L1X_DEBUG_RESULTS_INDEX - VL53L1X_SYSTEM_RESULTS_INDEX) as usize + VL53L1X_DEBUG_RESULTS_SIZE;

/* I2C transfers are split so that a write (index + payload) never exceeds this */
pub const I2C_CHUNK_SIZE: usize = 32;

pub const VL53L1X_BOOT_COMPLETION_POLLING_TIMEOUT_MS: u32 = 500;
pub const VL53L1X_RANGE_COMPLETION_POLLING_TIMEOUT_MS: u32 = 2000;
pub const VL53L1X_TEST_COMPLETION_POLLING_TIMEOUT_MS: u32 = 60000;
pub const VL53L1X_POLLING_DELAY_MS: u32 = 1;

pub const VL53L1X_FIRMWARE_BOOT_TIME_US: u32 = 1200;
pub const VL53L1X_SOFTWARE_RESET_DURATION_US: u32 = 100;
pub const VL53L1X_ENABLE_POWERFORCE_SETTLING_TIME_US: u32 = 250;
pub const VL53L1X_NVM_POWER_UP_DELAY_US: u32 = 50;
pub const VL53L1X_NVM_READ_TRIGGER_DELAY_US: u32 = 5;
pub const VL53L1X_PRESET_CHANGE_DELAY_US: u32 = 500;

pub const VL53L1X_NVM_PULSE_WIDTH: u16 = 0x0004;
pub const VL53L1X_NVM_REF_SPAD_START_WORD: u8 = 0xA0 >> 2;
pub const VL53L1X_NVM_REF_SPAD_WORD_COUNT: usize = 24 >> 2;

/* Oscillator calibration floor applied when the NVM holds no trimmed value */
pub const VL53L1X_FAST_OSC_FREQUENCY_MIN: u16 = 0x1000;
pub const VL53L1X_FAST_OSC_FREQUENCY_DEFAULT: u16 = 0xBCCC;

pub const VL53L1X_SPAD_ARRAY_WIDTH: u8 = 16;

/* Interrupt polarity, bit 4 of GPIO_HV_MUX__CTRL */
pub const VL53L1X_INTERRUPT_POLARITY_MASK: u8 = 0x10;

pub const VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE: usize = 0;
pub const VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE: usize = 1;
pub const VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS: usize = 2;

pub const VL53L1X_MAX_TIMING_BUDGET_US: u32 = 10_000_000;
pub const VL53L1X_FDA_MAX_TIMING_BUDGET_US: u32 = 550_000;
pub const VL53L1X_LITE_MM_GUARD_US: u32 = 5000;
pub const VL53L1X_LITE_GUARD_US: u32 = 1000;
pub const VL53L1X_TIMED_MM_GUARD_US: u32 = 26600;
pub const VL53L1X_TIMED_GUARD_US: u32 = 21600;
pub const VL53L1X_LOWPOWER_GUARD_BASE_US: u32 = 1448 + 2100;
pub const VL53L1X_LOWPOWER_VHV_LOOP_DURATION_US: u32 = 245;
pub const VL53L1X_PRESET_TIMING_BUDGET_US: u32 = 41000;
pub const VL53L1X_PRESET_INTER_MEASUREMENT_MS: u32 = 1000;
pub const VL53L1X_IMP_MARGIN_MS: u32 = 4;

/* Default limit check values, 16.16 */
pub const VL53L1X_DEFAULT_SIGMA_LIMIT: u32 = 18 * 65536;
pub const VL53L1X_DEFAULT_SIGNAL_RATE_LIMIT: u32 = 25 * 65536 / 100;

pub const VL53L1X_OFFSET_CAL_MAX_SIGMA: u32 = 0xFFFF;

/* Sequence step ids, bit positions in SYSTEM__SEQUENCE_CONFIG */
pub const VL53L1X_SEQUENCESTEP_VHV: u8 = 0;
pub const VL53L1X_SEQUENCESTEP_PHASECAL: u8 = 1;
pub const VL53L1X_SEQUENCESTEP_REFPHASE: u8 = 2;
pub const VL53L1X_SEQUENCESTEP_DSS1: u8 = 3;
pub const VL53L1X_SEQUENCESTEP_DSS2: u8 = 4;
pub const VL53L1X_SEQUENCESTEP_MM1: u8 = 5;
pub const VL53L1X_SEQUENCESTEP_MM2: u8 = 6;
pub const VL53L1X_SEQUENCESTEP_RANGE: u8 = 7;
pub const VL53L1X_SEQUENCESTEP_NUMBER_OF_ITEMS: u8 = 8;
