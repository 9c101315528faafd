use consts::*;
use crate::{consts, Vl53l1x, Error, SevenBitAddress, I2c, OutputPin, DelayNs};

pub trait BusOperation {
    type Error;

    fn read(&mut self, rbuf: &mut [u8]) -> Result<(), Self::Error>;
    fn write(&mut self, wbuf: &[u8]) -> Result<(), Self::Error>;
    fn write_read(&mut self, wbuf: &[u8], rbuf: &mut [u8]) -> Result<(), Self::Error>;
}

pub struct Vl53l1xI2C<P> {
    i2c: P,
    address: SevenBitAddress,
}

impl<P: I2c> Vl53l1xI2C<P> {
    pub(crate) fn new(i2c: P) -> Self {
        Vl53l1xI2C { i2c, address: VL53L1X_DEFAULT_I2C_ADDRESS }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }
}

impl<P: I2c> BusOperation for Vl53l1xI2C<P> {
    type Error = P::Error;
    #[inline]
    fn read(&mut self, rbuf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(self.address, rbuf)?;

        Ok(())
    }

    #[inline]
    fn write(&mut self, wbuf: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, wbuf)?;

        Ok(())
    }

    #[inline]
    fn write_read(&mut self, wbuf: &[u8], rbuf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, wbuf, rbuf)?;

        Ok(())
    }
}

impl<P, XS, T> Vl53l1x<Vl53l1xI2C<P>, XS, T>
    where
    P: I2c,
    XS: OutputPin,
    T: DelayNs
{
    pub fn new_i2c(i2c: P, xshut_pin: XS, tim: T) -> Result<Self, Error<P::Error>> {
        Ok(Vl53l1x::with_bus(Vl53l1xI2C::new(i2c), xshut_pin, tim))
    }

    /// Moves the sensor to a new 7-bit address. The register holds the
    /// address in 7-bit form, the bus handle follows it right away.
    ///
    /// # Arguments
    ///
    /// * `i2c_address` : New 7-bit address.
    pub fn set_i2c_address(&mut self, i2c_address: SevenBitAddress) -> Result<(), Error<P::Error>> {
        self.write_to_register(VL53L1X_I2C_SLAVE_DEVICE_ADDRESS, i2c_address & 0x7F)?;
        self.bus.address = i2c_address & 0x7F;
        self.stat_nvm.i2c_slave_device_address = i2c_address & 0x7F;

        Ok(())
    }

    /**
     * @brief Power cycles the sensor through XSHUT, waits for the firmware
     * boot, moves it to `address` and runs the data and static init.
     */
    pub fn init_sensor(&mut self, address: SevenBitAddress) -> Result<(), Error<P::Error>> {
        self.off()?;
        self.on()?;
        self.wait_device_booted()?;
        if address != self.bus.address {
            self.set_i2c_address(address)?;
        }
        self.is_alive()?;
        self.init()?;
        Ok(())
    }
}
