#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation, SevenBitAddress};

use vl53l1x::{Vl53l1x, Vl53l1xI2C};

pub const REG_RANGE_STATUS: u16 = 0x0089;
pub const REG_STREAM_COUNT: u16 = 0x008B;
pub const REG_FINAL_RANGE_MM_SD0: u16 = 0x0096;
pub const REG_NVM_DATAOUT: u16 = 0x0790;
pub const REG_TIO_HV_STATUS: u16 = 0x0031;

/// Register space of a simulated VL53L1X. Every write is logged; pinned
/// registers keep their value whatever the host writes.
pub struct RegisterFile {
    pub mem: Vec<u8>,
    pub writes: Vec<(u16, Vec<u8>)>,
    pub last_address: SevenBitAddress,
    pinned: Vec<u16>,
}

impl RegisterFile {
    fn new() -> Self {
        let mut regs = RegisterFile { mem: vec![0; 0x10000], writes: Vec::new(), last_address: 0, pinned: Vec::new() };

        regs.mem[0x0001] = 0x29;
        regs.mem[0x0006] = 0xBC;
        regs.mem[0x0007] = 0xCC;
        regs.mem[0x0030] = 0x11;
        regs.mem[0x0031] = 0x02;
        regs.mem[0x00DE] = 0x01;
        regs.mem[0x00DF] = 0x00;
        regs.mem[0x00E5] = 0x01;
        regs.mem[0x010F] = 0xEA;
        regs.mem[0x0110] = 0xCC;
        regs.mem[0x0111] = 0x10;
        regs.mem[0x013E] = 0xC7;
        regs.mem[0x013F] = 0xFF;

        regs
    }

    pub fn set(&mut self, reg: u16, data: &[u8]) {
        let start = reg as usize;
        self.mem[start..start + data.len()].copy_from_slice(data);
    }

    pub fn word(&self, reg: u16) -> u16 {
        u16::from_be_bytes([self.mem[reg as usize], self.mem[reg as usize + 1]])
    }

    pub fn pin(&mut self, reg: u16, value: u8) {
        self.mem[reg as usize] = value;
        self.pinned.push(reg);
    }

    /// Sets up a finished range: status, stream count and raw range in mm.
    pub fn set_range_result(&mut self, range_status: u8, stream_count: u8, raw_range_mm: u16) {
        self.mem[REG_RANGE_STATUS as usize] = range_status;
        self.mem[REG_STREAM_COUNT as usize] = stream_count;
        self.set(REG_FINAL_RANGE_MM_SD0, &raw_range_mm.to_be_bytes());
    }

    pub fn was_written(&self, reg: u16, data: &[u8]) -> bool {
        self.writes.iter().any(|(r, d)| *r == reg && d.as_slice() == data)
    }

    fn write(&mut self, reg: u16, data: &[u8]) {
        self.writes.push((reg, data.to_vec()));
        for (i, byte) in data.iter().enumerate() {
            let r = reg.wrapping_add(i as u16);
            if !self.pinned.contains(&r) {
                self.mem[r as usize] = *byte;
            }
        }
    }
}

pub struct FakeI2c {
    regs: Rc<RefCell<RegisterFile>>,
    pointer: u16,
}

impl i2c::ErrorType for FakeI2c {
    type Error = Infallible;
}

impl I2c for FakeI2c {
    fn transaction(&mut self, address: SevenBitAddress, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut regs = self.regs.borrow_mut();
        regs.last_address = address;

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if bytes.len() >= 2 {
                        self.pointer = u16::from_be_bytes([bytes[0], bytes[1]]);
                        if bytes.len() > 2 {
                            regs.write(self.pointer, &bytes[2..]);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let start = self.pointer as usize;
                    buffer.copy_from_slice(&regs.mem[start..start + buffer.len()]);
                }
            }
        }

        Ok(())
    }
}

pub struct FakePin {
    pub high: Rc<Cell<bool>>,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type Sensor = Vl53l1x<Vl53l1xI2C<FakeI2c>, FakePin, NoDelay>;

pub struct Harness {
    pub sensor: Sensor,
    pub regs: Rc<RefCell<RegisterFile>>,
    pub xshut: Rc<Cell<bool>>,
}

/// Sensor on a fresh simulated device, not yet initialised.
pub fn harness() -> Harness {
    let regs = Rc::new(RefCell::new(RegisterFile::new()));
    let xshut = Rc::new(Cell::new(false));
    let i2c = FakeI2c { regs: Rc::clone(&regs), pointer: 0 };
    let pin = FakePin { high: Rc::clone(&xshut) };

    let sensor = Vl53l1x::new_i2c(i2c, pin, NoDelay).unwrap();

    Harness { sensor, regs, xshut }
}

/// Sensor booted and initialised at the default address.
pub fn initialised() -> Harness {
    let mut h = harness();
    assert!(h.sensor.init_sensor(vl53l1x::consts::VL53L1X_DEFAULT_I2C_ADDRESS).is_ok());
    h.regs.borrow_mut().writes.clear();
    h
}
