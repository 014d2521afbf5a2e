use ad7980::Ad7980;
use rppal::gpio::Gpio;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

/// BCM pin wired to the AD7980's CNV / chip-select input.
const CS_PIN: u8 = 24;

/// Reference voltage on the REF pin.
const V_REF: f32 = 5.0;

fn main() -> Result<(), anyhow::Error> {
    let gpio = Gpio::new()?;

    let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, 1_000_000, Mode::Mode0)?;

    let cs = gpio.get(CS_PIN)?.into_output();

    let mut adc = Ad7980::new(spi, cs).map_err(|(_spi, _cs, e)| e)?;

    let raw = adc.convert()?;

    let volts = ad7980::to_volts(raw, V_REF);

    println!("AD7980: raw = {raw:#06X}, {volts:.5} V (vref {V_REF} V)");

    let (_spi, _cs) = adc.release();

    Ok(())
}
