#![no_std]
#![no_main]

use vl53l1x::{
    consts::VL53L1X_DEFAULT_I2C_ADDRESS,
    DistanceMode,
    RangingMeasurementData,
    Vl53l1x
};

use panic_halt as _;
use cortex_m_rt::entry;

use core::{fmt::Write, cell::RefCell};

use embedded_hal::i2c::SevenBitAddress;

use stm32f4xx_hal::{
    gpio::{
        Output,
        Pin,
        PinState::High,
        gpioa,
        gpiob,
        Alternate},
    pac::{USART2, Peripherals, TIM1},
    prelude::*,
    serial::{Config, Tx},
    timer::Delay,
    rcc::{Rcc, Clocks}
};

// I2C related imports
use stm32f4xx_hal::{
    pac::I2C1,
    i2c::{I2c as StmI2c, I2c1, Mode}};
use embedded_hal_bus::i2c::RefCellDevice;

fn write_results(tx: &mut Tx<USART2>, data: &RangingMeasurementData) {
    writeln!(
        tx,
        "Status = {sta:>3}, Distance = {dis:>5} mm, Signal = {sig:>4}.{sigf:02} Mcps, Ambient = {amb:>4}.{ambf:02} Mcps",
        sta = data.range_status as u8,
        dis = data.range_milli_meter,
        sig = data.signal_rate_rtn_mega_cps >> 16,
        sigf = ((data.signal_rate_rtn_mega_cps & 0xFFFF) * 100) >> 16,
        amb = data.ambient_rate_rtn_mega_cps >> 16,
        ambf = ((data.ambient_rate_rtn_mega_cps & 0xFFFF) * 100) >> 16
    ).unwrap();
}

#[entry]
fn main() -> ! {
    let dp: Peripherals = Peripherals::take().unwrap();
    let rcc: Rcc = dp.RCC.constrain();
    let clocks: Clocks = rcc.cfgr.use_hse(8.MHz()).sysclk(48.MHz()).freeze();
    let tim_top: Delay<TIM1, 1000> = dp.TIM1.delay_ms(&clocks);

    let gpioa: gpioa::Parts = dp.GPIOA.split();
    let gpiob: gpiob::Parts = dp.GPIOB.split();

    let xshut_pin: Pin<'A', 7, Output> = gpioa.pa7.into_push_pull_output_in_state(High);
    let tx_pin: Pin<'A', 2, Alternate<7>> = gpioa.pa2.into_alternate();

    let mut tx: Tx<USART2> = dp.USART2.tx(
        tx_pin,
        Config::default()
        .baudrate(460800.bps())
        .wordlength_8()
        .parity_none(),
        &clocks).unwrap();

    let scl: Pin<'B', 8> = gpiob.pb8;
    let sda: Pin<'B', 9> = gpiob.pb9;

    let i2c: StmI2c<I2C1> = I2c1::new(
        dp.I2C1,
        (scl, sda),
        Mode::Standard{frequency:400.kHz()},
        &clocks);

    let i2c_bus: RefCell<StmI2c<I2C1>> = RefCell::new(i2c);
    let address: SevenBitAddress = VL53L1X_DEFAULT_I2C_ADDRESS;

    let mut sensor_top = Vl53l1x::new_i2c(
        RefCellDevice::new(&i2c_bus),
        xshut_pin,
        tim_top).unwrap();

    sensor_top.init_sensor(address).unwrap();
    sensor_top.set_distance_mode(DistanceMode::Long).unwrap();
    sensor_top.set_measurement_timing_budget_us(50_000).unwrap();
    sensor_top.set_inter_measurement_period_ms(100).unwrap();

    writeln!(tx, "\x1B[2J\x1B[H53L1A2 Simple Ranging demo application\n").unwrap();

    sensor_top.start_measurement().unwrap();

    loop {
        sensor_top.wait_measurement_data_ready().unwrap(); // Wait for data to be ready
        let data = sensor_top.get_ranging_measurement_data().unwrap(); // Get and parse the result data
        write_results(&mut tx, &data); // Print the result to the output
        sensor_top.clear_interrupt_and_start_measurement().unwrap();
    }
}
