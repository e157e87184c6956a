//! AT-command catalog.
//!
//! XBee modules are configured through two-ASCII-character AT commands
//! carried inside API frames (type 0x08). [`AtCommand`] enumerates every
//! command the library issues and maps each one to its wire code.
//!
//! The mapping is total: every variant has a code, so an invalid command
//! can never reach the encoder. Raw codes received from the module are
//! resolved with [`AtCommand::from_code`], which returns `None` for codes
//! the library does not know.

use std::fmt;

/// A symbolic AT-command identifier.
///
/// The `code()` of each variant is the exact two-byte ASCII sequence sent
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCommand {
    /// `VR` -- firmware version (4-byte response).
    FirmwareVersion,
    /// `HV` -- hardware version (2-byte response).
    HardwareVersion,
    /// `DB` -- last-hop RSSI as a positive offset in dBm.
    LastHopRssi,
    /// `SH` -- high 32 bits of the factory serial number.
    SerialHigh,
    /// `SL` -- low 32 bits of the factory serial number.
    SerialLow,
    /// `RE` -- module reboot.
    SoftReset,
    /// `FR` -- restore factory defaults.
    FactoryReset,
    /// `CN` -- exit legacy `+++` command mode.
    ExitCommandMode,
    /// `AP` -- API mode select (0 transparent, 1 API, 2 API-escaped).
    ApiEnable,
    /// `BD` -- UART baud-rate code.
    BaudRate,
    /// `WR` -- write configuration to non-volatile memory.
    WriteConfig,
    /// `AC` -- apply pending configuration changes.
    ApplyChanges,
    /// `AO` -- API options.
    ApiOptions,
    /// `AI` -- association/attach indication.
    AssociationIndication,

    // Cellular (LTE / NB-IoT) commands.
    /// `PN` -- SIM unlock PIN.
    SimPin,
    /// `AN` -- access point name.
    AccessPointName,
    /// `CP` -- carrier profile.
    CarrierProfile,
    /// `SD` -- graceful modem shutdown.
    Shutdown,

    // LoRaWAN commands.
    /// `JN` -- start an OTAA join.
    Join,
    /// `AE` -- application EUI (8 bytes).
    AppEui,
    /// `AK` -- application key (16 bytes).
    AppKey,
    /// `NK` -- network key (16 bytes).
    NwkKey,
    /// `DE` -- device EUI, read-only (16 ASCII hex characters).
    DevEui,
    /// `LC` -- LoRaWAN device class (ASCII 'A', 'B', or 'C').
    LoRaClass,
    /// `LR` -- LoRaWAN region code.
    Region,
    /// `J1` -- join RX1 window delay in milliseconds.
    JoinRx1Delay,
    /// `J2` -- join RX2 window delay in milliseconds.
    JoinRx2Delay,
    /// `XF` -- RX2 window frequency in hertz.
    Rx2Frequency,
}

impl AtCommand {
    /// The two-byte ASCII code sent on the wire.
    pub const fn code(self) -> [u8; 2] {
        match self {
            AtCommand::FirmwareVersion => *b"VR",
            AtCommand::HardwareVersion => *b"HV",
            AtCommand::LastHopRssi => *b"DB",
            AtCommand::SerialHigh => *b"SH",
            AtCommand::SerialLow => *b"SL",
            AtCommand::SoftReset => *b"RE",
            AtCommand::FactoryReset => *b"FR",
            AtCommand::ExitCommandMode => *b"CN",
            AtCommand::ApiEnable => *b"AP",
            AtCommand::BaudRate => *b"BD",
            AtCommand::WriteConfig => *b"WR",
            AtCommand::ApplyChanges => *b"AC",
            AtCommand::ApiOptions => *b"AO",
            AtCommand::AssociationIndication => *b"AI",
            AtCommand::SimPin => *b"PN",
            AtCommand::AccessPointName => *b"AN",
            AtCommand::CarrierProfile => *b"CP",
            AtCommand::Shutdown => *b"SD",
            AtCommand::Join => *b"JN",
            AtCommand::AppEui => *b"AE",
            AtCommand::AppKey => *b"AK",
            AtCommand::NwkKey => *b"NK",
            AtCommand::DevEui => *b"DE",
            AtCommand::LoRaClass => *b"LC",
            AtCommand::Region => *b"LR",
            AtCommand::JoinRx1Delay => *b"J1",
            AtCommand::JoinRx2Delay => *b"J2",
            AtCommand::Rx2Frequency => *b"XF",
        }
    }

    /// Resolve a raw two-byte code back to a command, if known.
    pub fn from_code(code: [u8; 2]) -> Option<Self> {
        const ALL: &[AtCommand] = &[
            AtCommand::FirmwareVersion,
            AtCommand::HardwareVersion,
            AtCommand::LastHopRssi,
            AtCommand::SerialHigh,
            AtCommand::SerialLow,
            AtCommand::SoftReset,
            AtCommand::FactoryReset,
            AtCommand::ExitCommandMode,
            AtCommand::ApiEnable,
            AtCommand::BaudRate,
            AtCommand::WriteConfig,
            AtCommand::ApplyChanges,
            AtCommand::ApiOptions,
            AtCommand::AssociationIndication,
            AtCommand::SimPin,
            AtCommand::AccessPointName,
            AtCommand::CarrierProfile,
            AtCommand::Shutdown,
            AtCommand::Join,
            AtCommand::AppEui,
            AtCommand::AppKey,
            AtCommand::NwkKey,
            AtCommand::DevEui,
            AtCommand::LoRaClass,
            AtCommand::Region,
            AtCommand::JoinRx1Delay,
            AtCommand::JoinRx2Delay,
            AtCommand::Rx2Frequency,
        ];
        ALL.iter().copied().find(|cmd| cmd.code() == code)
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        write!(f, "AT{}{}", code[0] as char, code[1] as char)
    }
}

impl std::str::FromStr for AtCommand {
    type Err = crate::error::Error;

    /// Parse a two-character code, with or without the `AT` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.strip_prefix("AT").unwrap_or(s).as_bytes();
        match code {
            [a, b] => AtCommand::from_code([*a, *b])
                .ok_or_else(|| crate::error::Error::InvalidCommand(s.to_string())),
            _ => Err(crate::error::Error::InvalidCommand(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_two_ascii_uppercase_or_digit() {
        let cmds = [
            AtCommand::FirmwareVersion,
            AtCommand::AssociationIndication,
            AtCommand::JoinRx1Delay,
            AtCommand::Rx2Frequency,
        ];
        for cmd in cmds {
            for b in cmd.code() {
                assert!(b.is_ascii_uppercase() || b.is_ascii_digit(), "{cmd}: 0x{b:02X}");
            }
        }
    }

    #[test]
    fn code_round_trip() {
        assert_eq!(AtCommand::from_code(*b"VR"), Some(AtCommand::FirmwareVersion));
        assert_eq!(AtCommand::from_code(*b"AI"), Some(AtCommand::AssociationIndication));
        assert_eq!(AtCommand::from_code(*b"J2"), Some(AtCommand::JoinRx2Delay));
        assert_eq!(AtCommand::from_code(*b"??"), None);
    }

    #[test]
    fn display_includes_at_prefix() {
        assert_eq!(AtCommand::FirmwareVersion.to_string(), "ATVR");
        assert_eq!(AtCommand::AccessPointName.to_string(), "ATAN");
    }

    #[test]
    fn from_str_accepts_bare_and_prefixed_codes() {
        assert_eq!("VR".parse::<AtCommand>().unwrap(), AtCommand::FirmwareVersion);
        assert_eq!("ATAI".parse::<AtCommand>().unwrap(), AtCommand::AssociationIndication);
    }

    #[test]
    fn from_str_rejects_unknown_codes() {
        use crate::error::Error;
        assert!(matches!(
            "ZZ".parse::<AtCommand>(),
            Err(Error::InvalidCommand(_))
        ));
        assert!(matches!(
            "VRX".parse::<AtCommand>(),
            Err(Error::InvalidCommand(_))
        ));
    }
}
