use super::Error;

/// Value-level `enum` for pull resistor types.
///
/// The discriminants are the raw values accepted by
/// [`Pin::set_field`](super::Pin::set_field).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Pull {
    /// No pull resistor, the pin floats.
    None = 0x8,
    #[allow(missing_docs)]
    Up = 0xA,
    #[allow(missing_docs)]
    Down = 0xC,
}

impl TryFrom<u32> for Pull {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0x8 => Ok(Pull::None),
            0xA => Ok(Pull::Up),
            0xC => Ok(Pull::Down),
            _ => Err(Error::InvalidArgument),
        }
    }
}
