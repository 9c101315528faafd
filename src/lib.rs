#![no_std]

pub mod accessors;
pub mod bus_operation;
pub mod calibration;
pub mod consts;
pub mod detection_thresholds;
pub mod preset;
pub mod ranging;
pub mod registers;
pub mod results;
pub mod roi;
pub mod state;
pub mod timing;
pub mod utils;

pub use accessors::DeviceInfo;
pub use bus_operation::*;
pub use calibration::{CalibrationData, OpticalCentre};
pub use detection_thresholds::*;
pub use preset::{DistanceMode, PresetMode, TuningParams};
pub use ranging::DeviceConfigLevel;
pub use results::{LimitChecks, RangeStatus, RangingMeasurementData};
pub use roi::UserRoi;
use consts::*;
use preset::*;
use registers::*;
use results::RangeResults;
use roi::UserZone;
use state::*;

use embedded_hal::{
    i2c::{I2c, SevenBitAddress},
    digital::OutputPin,
    delay::DelayNs
};

pub struct Vl53l1x<B: BusOperation, XS: OutputPin, T: DelayNs> {
    pub temp_buffer: [u8; VL53L1X_MAX_I2C_XFER_SIZE],

    /* Register shadows */
    pub stat_nvm: StaticNvmManaged,
    pub customer: CustomerNvmManaged,
    pub nvm_copy_data: NvmCopyData,
    pub cfg: DeviceConfig,
    pub sys_results: SystemResults,
    pub core_results: CoreResults,
    pub dbg_results: DebugResults,

    /* Low-level driver data */
    pub ll_state: LlState,
    pub lpa: LowPowerAutoData,
    pub tuning: TuningParams,
    pub device_preset: DevicePresetMode,
    pub measurement_mode: DeviceMeasurementMode,
    pub phasecal_config_timeout_us: u32,
    pub mm_config_timeout_us: u32,
    pub range_config_timeout_us: u32,
    pub inter_measurement_period_ms: u32,
    pub dss_config_target_total_rate_mcps: u16,
    pub gain_factor: u16,
    pub mm_roi: UserZone,
    pub optical_centre: OpticalCentre,

    /* Ranging API data */
    pub pal_state: PalState,
    pub preset_mode: PresetMode,
    pub internal_distance_mode: DistanceMode,
    pub new_distance_mode: DistanceMode,
    pub distance_mode: DistanceMode,
    pub measurement_timing_budget_us: u32,
    pub limit_checks: LimitChecks,

    pub xshut_pin: XS,
    pub bus: B,
    pub tim: T
}

#[derive(Copy, Clone, Debug)]
pub enum Error<B> {
    Bus(B),
    Timeout,
    InvalidParams,
    InvalidCommand,
    DivisionByZero,
    ModeNotSupported,
    GphSyncCheckFail,
    StreamCountCheckFail,
    GphIdCheckFail,
    InvalidModelId(u16),
    RefSpadCharNotEnoughSpads,
    RefSpadCharRateTooHigh,
    RefSpadCharRateTooLow,
    OffsetCalNoSampleFail,
    OffsetCalSigmaTooHigh,
    Xshut
}

impl<B> From<StateCheckError> for Error<B> {
    fn from(e: StateCheckError) -> Self {
        match e {
            StateCheckError::GphSyncCheckFail => Error::GphSyncCheckFail,
            StateCheckError::StreamCountCheckFail => Error::StreamCountCheckFail,
            StateCheckError::GphIdCheckFail => Error::GphIdCheckFail,
        }
    }
}

impl<B> From<UnsupportedPresetMode> for Error<B> {
    fn from(_: UnsupportedPresetMode) -> Self {
        Error::ModeNotSupported
    }
}

impl<B> From<InvalidDistanceMode> for Error<B> {
    fn from(_: InvalidDistanceMode) -> Self {
        Error::InvalidParams
    }
}

/// State of the ranging API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PalState {
    PowerDown = 0,
    WaitStaticInit = 1,
    Standby = 2,
    Idle = 3,
    Running = 4,
    Reset = 5,
    Unknown = 98,
    Error = 99,
}

/// Level of GPIO1 that signals a new result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum InterruptPolarity {
    ActiveHigh = 0x00,
    ActiveLow = 0x10,
}

impl<B: BusOperation, XS: OutputPin, T: DelayNs> Vl53l1x<B, XS, T> {
    pub(crate) fn with_bus(bus: B, xshut_pin: XS, tim: T) -> Self {
        let tuning = TuningParams::default();
        Vl53l1x {
            temp_buffer: [0; VL53L1X_MAX_I2C_XFER_SIZE],
            stat_nvm: StaticNvmManaged::default(),
            customer: CustomerNvmManaged::default(),
            nvm_copy_data: NvmCopyData::default(),
            cfg: DeviceConfig::default(),
            sys_results: SystemResults::default(),
            core_results: CoreResults::default(),
            dbg_results: DebugResults::default(),
            ll_state: LlState::new(DeviceState::Unknown),
            lpa: LowPowerAutoData::new(&tuning),
            device_preset: DevicePresetMode::StandardRanging,
            measurement_mode: DeviceMeasurementMode::Stop,
            phasecal_config_timeout_us: 0,
            mm_config_timeout_us: 0,
            range_config_timeout_us: 0,
            inter_measurement_period_ms: 0,
            dss_config_target_total_rate_mcps: 0,
            gain_factor: tuning.lite_ranging_gain_factor,
            mm_roi: UserZone::default(),
            optical_centre: OpticalCentre::default(),
            tuning,
            pal_state: PalState::PowerDown,
            preset_mode: PresetMode::LowPowerAutonomous,
            internal_distance_mode: DistanceMode::Long,
            new_distance_mode: DistanceMode::Long,
            distance_mode: DistanceMode::Long,
            measurement_timing_budget_us: 0,
            limit_checks: LimitChecks::default(),
            xshut_pin,
            bus,
            tim
        }
    }

    pub fn read_from_register(&mut self, reg: u16, size: usize) -> Result<(), Error<B::Error>> {
        let mut read_size: usize;
        for i in (0..size).step_by(I2C_CHUNK_SIZE) {
            read_size = if size - i > I2C_CHUNK_SIZE { I2C_CHUNK_SIZE } else { size - i };
            let a: u8 = ((reg + i as u16) >> 8) as u8;
            let b: u8 = ((reg + i as u16) & 0xFF) as u8;
            self.bus.write_read(&[a, b], &mut self.temp_buffer[i..i+read_size]).map_err(Error::Bus)?;
        }
        Ok(())
    }

    pub fn read_byte(&mut self, reg: u16) -> Result<u8, Error<B::Error>> {
        self.read_from_register(reg, 1)?;
        Ok(self.temp_buffer[0])
    }

    pub fn read_word(&mut self, reg: u16) -> Result<u16, Error<B::Error>> {
        self.read_from_register(reg, 2)?;
        Ok(utils::from_u8_to_u16(&self.temp_buffer[..2]))
    }

    pub fn write_to_register(&mut self, reg: u16, val: u8) -> Result<(), Error<B::Error>> {
        let a: u8 = (reg >> 8) as u8;
        let b: u8 = (reg & 0xFF) as u8;
        self.bus.write(&[a, b, val]).map_err(Error::Bus)?;

        Ok(())
    }

    pub fn write_word(&mut self, reg: u16, val: u16) -> Result<(), Error<B::Error>> {
        let mut wbuf: [u8; 2] = [0; 2];
        utils::from_u16_to_u8(val, &mut wbuf);
        self.write_multi_to_register(reg, &wbuf)
    }

    pub fn write_multi_to_register(&mut self, reg: u16, wbuf: &[u8]) -> Result<(), Error<B::Error>> {
        let size = wbuf.len();
        let mut write_size: usize;
        let mut tmp: [u8; I2C_CHUNK_SIZE] = [0; I2C_CHUNK_SIZE];
        for i in (0..size).step_by(I2C_CHUNK_SIZE-2) {
            write_size = if size - i > I2C_CHUNK_SIZE-2 { I2C_CHUNK_SIZE-2 } else { size - i };
            tmp[0] = ((reg + i as u16) >> 8) as u8;
            tmp[1] = ((reg + i as u16) & 0xFF) as u8;
            tmp[2..2+write_size].copy_from_slice(&wbuf[i..i+write_size]);
            self.bus.write(&tmp[..2+write_size]).map_err(Error::Bus)?;
        }
        Ok(())
    }

    pub fn write_multi_to_register_temp_buffer(&mut self, reg: u16, size: usize) -> Result<(), Error<B::Error>> {
        let mut write_size: usize;
        let mut tmp: [u8; I2C_CHUNK_SIZE] = [0; I2C_CHUNK_SIZE];

        for i in (0..size).step_by(I2C_CHUNK_SIZE-2) {
            write_size = if size - i > I2C_CHUNK_SIZE-2 { I2C_CHUNK_SIZE-2 } else { size - i };
            tmp[0] = ((reg + i as u16) >> 8) as u8;
            tmp[1] = ((reg + i as u16) & 0xFF) as u8;
            tmp[2..2+write_size].copy_from_slice(&self.temp_buffer[i..i+write_size]);
            self.bus.write(&tmp[..2+write_size]).map_err(Error::Bus)?;
        }
        Ok(())
    }

    pub fn delay(&mut self, ms: u32) {
        self.tim.delay_ms(ms);
    }

    pub fn delay_us(&mut self, us: u32) {
        self.tim.delay_us(us);
    }

    pub fn on(&mut self) -> Result<(), Error<B::Error>> {
        self.xshut_pin.set_high().map_err(|_| Error::Xshut)?;
        self.delay(10);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), Error<B::Error>> {
        self.xshut_pin.set_low().map_err(|_| Error::Xshut)?;
        self.delay(10);
        self.pal_state = PalState::PowerDown;
        Ok(())
    }

    /**
     * @brief Inner function. Polls `reg` every millisecond until
     * `value & mask == expected_val` or `timeout_ms` has elapsed.
     */
    pub fn poll_for_answer(&mut self, reg: u16, mask: u8, expected_val: u8, timeout_ms: u32) -> Result<(), Error<B::Error>> {
        let mut elapsed: u32 = 0;

        loop {
            self.read_from_register(reg, 1)?;
            if self.temp_buffer[0] & mask == expected_val {
                return Ok(());
            }
            if elapsed >= timeout_ms {
                return Err(Error::Timeout);
            }
            self.delay(VL53L1X_POLLING_DELAY_MS);
            elapsed += VL53L1X_POLLING_DELAY_MS;
        }
    }

    /**
     * @brief Waits for the firmware to leave its boot sequence. Must be
     * called after every power on or software reset.
     */
    pub fn wait_device_booted(&mut self) -> Result<(), Error<B::Error>> {
        self.delay_us(VL53L1X_FIRMWARE_BOOT_TIME_US);
        self.poll_for_answer(VL53L1X_FIRMWARE_SYSTEM_STATUS, 0x01, 0x01, VL53L1X_BOOT_COMPLETION_POLLING_TIMEOUT_MS)?;
        self.ll_state.init(DeviceState::SwStandby);
        log::debug!("vl53l1x: firmware booted");
        Ok(())
    }

    pub fn software_reset(&mut self) -> Result<(), Error<B::Error>> {
        self.write_to_register(VL53L1X_SOFT_RESET, 0x00)?;
        self.delay_us(VL53L1X_SOFTWARE_RESET_DURATION_US);
        self.write_to_register(VL53L1X_SOFT_RESET, 0x01)?;
        self.wait_device_booted()
    }

    /**
     * @brief Check if the VL53L1X sensor is alive (answers on the bus with
     * the expected model id and module type).
     */
    pub fn is_alive(&mut self) -> Result<(), Error<B::Error>> {
        let model_id = self.read_word(VL53L1X_IDENTIFICATION_MODEL_ID)?;
        if model_id != VL53L1X_MODEL_ID {
            return Err(Error::InvalidModelId(model_id));
        }

        Ok(())
    }

    pub fn enable_powerforce(&mut self) -> Result<(), Error<B::Error>> {
        self.cfg.sys_ctrl.power_management_go1_power_force = 0x01;
        self.write_to_register(VL53L1X_POWER_MANAGEMENT_GO1_POWER_FORCE, 0x01)
    }

    pub fn disable_powerforce(&mut self) -> Result<(), Error<B::Error>> {
        self.cfg.sys_ctrl.power_management_go1_power_force = 0x00;
        self.write_to_register(VL53L1X_POWER_MANAGEMENT_GO1_POWER_FORCE, 0x00)
    }

    pub fn enable_firmware(&mut self) -> Result<(), Error<B::Error>> {
        self.cfg.sys_ctrl.firmware_enable = 0x01;
        self.write_to_register(VL53L1X_FIRMWARE_ENABLE, 0x01)
    }

    pub fn disable_firmware(&mut self) -> Result<(), Error<B::Error>> {
        self.cfg.sys_ctrl.firmware_enable = 0x00;
        self.write_to_register(VL53L1X_FIRMWARE_ENABLE, 0x00)
    }

    pub fn clear_interrupt(&mut self) -> Result<(), Error<B::Error>> {
        self.cfg.sys_ctrl.system_interrupt_clear = CLEAR_RANGE_INT;
        self.write_to_register(VL53L1X_SYSTEM_INTERRUPT_CLEAR, CLEAR_RANGE_INT)
    }

    /**
     * @brief Reads the part-to-part data: static and customer NVM shadows,
     * identification block and oscillator calibration.
     */
    pub fn read_p2p_data(&mut self) -> Result<(), Error<B::Error>> {
        self.read_from_register(StaticNvmManaged::INDEX, StaticNvmManaged::SIZE)?;
        self.stat_nvm = StaticNvmManaged::decode(&self.temp_buffer);

        self.read_from_register(CustomerNvmManaged::INDEX, CustomerNvmManaged::SIZE)?;
        self.customer = CustomerNvmManaged::decode(&self.temp_buffer);

        self.read_from_register(NvmCopyData::INDEX, NvmCopyData::SIZE)?;
        self.nvm_copy_data = NvmCopyData::decode(&self.temp_buffer);

        self.dbg_results.result_osc_calibrate_val = self.read_word(VL53L1X_RESULT_OSC_CALIBRATE_VAL)?;

        /* Untrimmed parts report a tiny oscillator frequency */
        if self.stat_nvm.osc_measured_fast_osc_frequency < VL53L1X_FAST_OSC_FREQUENCY_MIN {
            log::warn!(
                "vl53l1x: fast osc frequency {:#06x} below minimum, using {:#06x}",
                self.stat_nvm.osc_measured_fast_osc_frequency,
                VL53L1X_FAST_OSC_FREQUENCY_DEFAULT
            );
            self.stat_nvm.osc_measured_fast_osc_frequency = VL53L1X_FAST_OSC_FREQUENCY_DEFAULT;
        }

        self.mm_roi = UserZone::decode(
            self.nvm_copy_data.roi_config_mode_roi_centre_spad,
            self.nvm_copy_data.roi_config_mode_roi_xy_size,
        );
        if self.optical_centre.x_centre == 0 && self.optical_centre.y_centre == 0 {
            self.optical_centre.x_centre = self.mm_roi.x_centre << 4;
            self.optical_centre.y_centre = self.mm_roi.y_centre << 4;
        }

        Ok(())
    }

    /**
     * @brief Low-level data init: resets the driver state, loads the
     * standard ranging preset and the low-power auto defaults.
     */
    pub fn ll_data_init(&mut self, read_p2p_data: bool) -> Result<(), Error<B::Error>> {
        self.ll_state.init(DeviceState::Unknown);
        self.device_preset = DevicePresetMode::StandardRanging;
        self.measurement_mode = DeviceMeasurementMode::Stop;
        self.gain_factor = self.tuning.lite_ranging_gain_factor;

        if read_p2p_data {
            self.read_p2p_data()?;
        }

        self.set_vhv_loopbound(self.tuning.vhv_loop_bound);
        self.set_device_preset_mode(
            DevicePresetMode::StandardRanging,
            self.tuning.dss_config_target_total_rate_mcps,
            self.tuning.timed_phasecal_config_timeout_us,
            self.tuning.timed_mm_config_timeout_us,
            self.tuning.timed_range_config_timeout_us,
            100,
        )?;

        self.lpa = LowPowerAutoData::new(&self.tuning);

        Ok(())
    }

    /**
     * @brief One time device initialisation. Leaves the ranging API waiting
     * for `static_init`, with both limit checks enabled.
     */
    pub fn data_init(&mut self) -> Result<(), Error<B::Error>> {
        #[cfg(feature = "VL53L1X_I2C_2V8")]
        {
            let extsup = self.read_byte(VL53L1X_PAD_I2C_HV_EXTSUP_CONFIG)?;
            self.write_to_register(VL53L1X_PAD_I2C_HV_EXTSUP_CONFIG, (extsup & 0xFE) | 0x01)?;
        }

        self.ll_data_init(true)?;

        self.pal_state = PalState::WaitStaticInit;
        self.preset_mode = PresetMode::LowPowerAutonomous;

        for check_id in 0..VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            self.set_limit_check_enable(check_id, true)?;
        }
        self.set_limit_check_value(VL53L1X_CHECKENABLE_SIGMA_FINAL_RANGE, VL53L1X_DEFAULT_SIGMA_LIMIT)?;
        self.set_limit_check_value(VL53L1X_CHECKENABLE_SIGNAL_RATE_FINAL_RANGE, VL53L1X_DEFAULT_SIGNAL_RATE_LIMIT)?;

        Ok(())
    }

    pub fn static_init(&mut self) -> Result<(), Error<B::Error>> {
        self.pal_state = PalState::Idle;
        self.measurement_mode = DeviceMeasurementMode::BackToBack;
        self.new_distance_mode = DistanceMode::Long;
        self.internal_distance_mode = DistanceMode::Long;
        self.distance_mode = DistanceMode::Long;

        self.set_preset_mode(PresetMode::LowPowerAutonomous)
    }

    /**
     * @brief Mandatory function used to initialize the sensor after boot.
     */
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        self.data_init()?;
        self.static_init()?;
        log::debug!("vl53l1x: initialised, preset {:?}", self.preset_mode);
        Ok(())
    }

    /**
     * @brief Starts ranging with the current preset. Only allowed from the
     * Idle state; timed presets need an inter-measurement period at least
     * 4 ms longer than the timing budget.
     */
    pub fn start_measurement(&mut self) -> Result<(), Error<B::Error>> {
        if self.pal_state != PalState::Idle {
            return Err(Error::InvalidCommand);
        }

        if self.measurement_mode == DeviceMeasurementMode::Timed {
            let budget_ms = self.get_measurement_timing_budget_us()? / 1000;
            let imp_ms = self.get_inter_measurement_period_ms()?;
            if imp_ms < budget_ms + VL53L1X_IMP_MARGIN_MS {
                return Err(Error::InvalidParams);
            }
        }

        self.init_and_start_range(self.measurement_mode, DeviceConfigLevel::Full)?;
        self.pal_state = PalState::Running;
        log::debug!("vl53l1x: ranging started ({:?})", self.measurement_mode);

        Ok(())
    }

    pub fn stop_measurement(&mut self) -> Result<(), Error<B::Error>> {
        self.stop_range()?;
        self.pal_state = PalState::Idle;
        log::debug!("vl53l1x: ranging stopped");

        Ok(())
    }

    /* Restarts ranging with the requested distance mode, keeping timeouts and zone */
    fn change_preset_mode(&mut self) -> Result<(), Error<B::Error>> {
        let user_zone = self.get_user_zone();
        let preset_mode = self.preset_mode;
        let new_distance_mode = self.new_distance_mode;
        let (phasecal_us, mm_us, range_us) = self.get_timeouts_us()?;

        self.stop_range()?;
        self.delay_us(VL53L1X_PRESET_CHANGE_DELAY_US);

        let imp_ms = self.inter_measurement_period_ms;
        self.apply_preset_mode(preset_mode, new_distance_mode, imp_ms)?;
        self.set_timeouts_us(phasecal_us, mm_us, range_us)?;
        self.range_config_timeout_us = range_us;

        self.set_user_zone(&user_zone);
        self.init_and_start_range(self.measurement_mode, DeviceConfigLevel::Full)?;
        self.internal_distance_mode = new_distance_mode;
        log::debug!("vl53l1x: distance mode changed to {:?}", new_distance_mode);

        Ok(())
    }

    /**
     * @brief Clears the range interrupt and arms the next range. A pending
     * distance mode change is applied here.
     */
    pub fn clear_interrupt_and_start_measurement(&mut self) -> Result<(), Error<B::Error>> {
        if self.new_distance_mode != self.internal_distance_mode {
            self.change_preset_mode()
        } else {
            self.clear_interrupt_and_enable_next_range(self.measurement_mode)
        }
    }

    /// Returns `true` when a new result is available.
    pub fn check_data_ready(&mut self) -> Result<bool, Error<B::Error>> {
        self.is_new_data_ready()
    }

    /// Blocks until a new result is available, at most 2 s.
    pub fn wait_measurement_data_ready(&mut self) -> Result<(), Error<B::Error>> {
        self.poll_for_range_completion(VL53L1X_RANGE_COMPLETION_POLLING_TIMEOUT_MS)
    }

    /**
     * @brief Reads the last result and converts it into a user measurement.
     * The limit check flags are refreshed from the device thresholds first.
     */
    pub fn get_ranging_measurement_data(&mut self) -> Result<RangingMeasurementData, Error<B::Error>> {
        let range_results: RangeResults = self.get_device_results()?;

        for check_id in 0..VL53L1X_CHECKENABLE_NUMBER_OF_CHECKS {
            self.get_limit_check_value(check_id)?;
        }

        let mut data = results::set_simple_data(
            1,
            range_results.device_status,
            &range_results.data[0],
            self.tuning.proxy_min_mm,
            &mut self.limit_checks,
        );
        data.stream_count = range_results.stream_count;

        Ok(data)
    }
}
