//! Device identity and selection
//!
//! GigE devices advertise a serial number, an IPv4 address, and a MAC
//! address; on the wire the latter two are plain integers. This module
//! carries the identity record stamped into frame metadata and the selector
//! logic used to pick one device out of several detected ones.

use std::net::Ipv4Addr;

/// Identity record for a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Vendor name (e.g., "FLIR Systems")
    pub vendor: String,
    /// Model name (e.g., "ThermoVision A320")
    pub model: String,
    /// Serial number
    pub serial: String,
    /// Advertised IPv4 address, if known
    pub ip: Option<Ipv4Addr>,
    /// Advertised MAC address as a 48-bit integer, if known
    pub mac: Option<u64>,
}

impl DeviceIdentity {
    /// Create an identity with only vendor/model/serial populated
    pub fn new(
        vendor: impl Into<String>,
        model: impl Into<String>,
        serial: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            serial: serial.into(),
            ip: None,
            mac: None,
        }
    }

    /// Set the IPv4 address
    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Set the MAC address
    pub fn with_mac(mut self, mac: u64) -> Self {
        self.mac = Some(mac);
        self
    }

    /// Label stamped into frame metadata
    pub fn label(&self) -> String {
        format!("{} ({})", self.model, self.serial)
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.vendor, self.model, self.serial)?;
        if let Some(ip) = self.ip {
            write!(f, ", {}", ip)?;
        }
        if let Some(mac) = self.mac {
            write!(f, ", {}", mac_to_string(mac))?;
        }
        Ok(())
    }
}

/// Criteria for selecting a device among the detected ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// First detected device
    Any,
    /// Match by serial number (surrounding whitespace ignored)
    Serial(String),
    /// Match by IPv4 address
    Ip(Ipv4Addr),
    /// Match by MAC address
    Mac(u64),
}

impl DeviceSelector {
    /// Build a MAC selector from a string form
    ///
    /// Accepts `:`, `.`, `-`, and space separators.
    pub fn mac(s: &str) -> Option<Self> {
        mac_from_str(s).map(DeviceSelector::Mac)
    }

    /// Whether this selector matches the given identity
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        match self {
            DeviceSelector::Any => true,
            DeviceSelector::Serial(serial) => identity.serial.trim() == serial.trim(),
            DeviceSelector::Ip(ip) => identity.ip == Some(*ip),
            DeviceSelector::Mac(mac) => identity.mac == Some(*mac),
        }
    }
}

/// Find the first identity matching the selector
pub fn find_device(devices: &[DeviceIdentity], selector: &DeviceSelector) -> Option<usize> {
    devices.iter().position(|d| selector.matches(d))
}

/// Convert an IPv4 address to its GigE register form (network-order u32)
pub fn ip_to_gige(ip: Ipv4Addr) -> u32 {
    u32::from(ip)
}

/// Convert a GigE IP register value back to an IPv4 address
pub fn ip_from_gige(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw)
}

/// Format a 48-bit MAC integer as lowercase colon-separated hex pairs
pub fn mac_to_string(mac: u64) -> String {
    let bytes = mac.to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse a MAC address string into its 48-bit integer form
///
/// Accepts `:`, `.`, `-`, and space separators; returns `None` for anything
/// that is not exactly 12 hex digits after stripping them.
pub fn mac_from_str(s: &str) -> Option<u64> {
    let hex: String = s.chars().filter(|c| !":.- ".contains(*c)).collect();
    if hex.len() != 12 {
        return None;
    }
    u64::from_str_radix(&hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("FLIR Systems", "ThermoVision A320", "70500123")
            .with_ip(Ipv4Addr::new(192, 168, 1, 42))
            .with_mac(0x00_11_1c_01_02_03)
    }

    #[test]
    fn test_ip_gige_round_trip() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(ip_from_gige(ip_to_gige(ip)), ip);
        assert_eq!(ip_to_gige(Ipv4Addr::new(0, 0, 0, 1)), 1);
    }

    #[test]
    fn test_mac_string_round_trip() {
        let mac = 0x00_11_1c_01_02_03u64;
        let s = mac_to_string(mac);
        assert_eq!(s, "00:11:1c:01:02:03");
        assert_eq!(mac_from_str(&s), Some(mac));
    }

    #[test]
    fn test_mac_from_str_separators() {
        assert_eq!(mac_from_str("00-11-1C-01-02-03"), Some(0x00_11_1c_01_02_03));
        assert_eq!(mac_from_str("0011.1c01.0203"), Some(0x00_11_1c_01_02_03));
        assert_eq!(mac_from_str("00 11 1c 01 02 03"), Some(0x00_11_1c_01_02_03));
        assert_eq!(mac_from_str("00:11:1c"), None);
        assert_eq!(mac_from_str("not a mac"), None);
    }

    #[test]
    fn test_selector_matching() {
        let id = identity();
        assert!(DeviceSelector::Any.matches(&id));
        assert!(DeviceSelector::Serial(" 70500123 ".to_string()).matches(&id));
        assert!(DeviceSelector::Ip(Ipv4Addr::new(192, 168, 1, 42)).matches(&id));
        assert!(DeviceSelector::mac("00:11:1c:01:02:03").unwrap().matches(&id));
        assert!(!DeviceSelector::Serial("other".to_string()).matches(&id));
        assert!(!DeviceSelector::Ip(Ipv4Addr::new(10, 0, 0, 1)).matches(&id));
    }

    #[test]
    fn test_find_device() {
        let devices = vec![
            DeviceIdentity::new("FLIR Systems", "A320", "1111"),
            identity(),
        ];
        assert_eq!(
            find_device(&devices, &DeviceSelector::Serial("70500123".to_string())),
            Some(1)
        );
        assert_eq!(find_device(&devices, &DeviceSelector::Any), Some(0));
        assert_eq!(
            find_device(&devices, &DeviceSelector::Serial("9999".to_string())),
            None
        );
    }

    #[test]
    fn test_identity_label() {
        assert_eq!(identity().label(), "ThermoVision A320 (70500123)");
    }
}
