//! Station configuration data structures.
//!
//! Platform-independent types describing the access point the station should
//! join. They can be built and tested on the host machine.
//!
//! # Truncation policy
//!
//! The radio driver stores the SSID and passphrase in fixed-size fields. Inputs
//! longer than a field are cut to the field size rather than rejected, so
//! building a configuration never fails. Every [`BoundedBytes`] remembers
//! whether it was cut ([`BoundedBytes::was_truncated`]) and
//! [`StationConfig::from_credentials`] logs a warning when that happens.
//! Callers that prefer a hard error use the `TryFrom<&[u8]>` conversion.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_station::station::{PmfConfig, StationConfig};
//!
//! let config = StationConfig::from_credentials(b"MyNetwork", b"MyPassword");
//! assert_eq!(config.ssid().as_bytes(), b"MyNetwork");
//! assert_eq!(config.pmf(), PmfConfig::STATION_DEFAULT);
//! ```

use log::warn;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the driver's SSID field (IEEE 802.11 maximum).
pub const MAX_SSID_LEN: usize = 32;

/// Size of the driver's passphrase field (WPA2 PSK as 64 hex digits).
pub const MAX_PASSWORD_LEN: usize = 64;

/// Byte sequence with a fixed capacity of `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedBytes<const N: usize> {
    buf: [u8; N],
    len: usize,
    truncated: bool,
}

impl<const N: usize> BoundedBytes<N> {
    /// An empty field.
    pub const fn empty() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            truncated: false,
        }
    }

    /// Copy `bytes`, keeping at most the first `N` of them.
    pub fn from_truncating(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        let mut buf = [0; N];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            buf,
            len,
            truncated: bytes.len() > N,
        }
    }

    /// The stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The whole zero-padded field, as the driver lays it out.
    pub fn as_padded(&self) -> &[u8; N] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the input this field was built from exceeded `N` bytes.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// The stored bytes as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl<const N: usize> Default for BoundedBytes<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> TryFrom<&[u8]> for BoundedBytes<N> {
    type Error = ConfigError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() > N {
            return Err(ConfigError::TooLong {
                len: bytes.len(),
                max: N,
            });
        }
        Ok(Self::from_truncating(bytes))
    }
}

impl<const N: usize> TryFrom<&str> for BoundedBytes<N> {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.as_bytes())
    }
}

impl<const N: usize> fmt::Debug for BoundedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> Zeroize for BoundedBytes<N> {
    fn zeroize(&mut self) {
        self.buf.zeroize();
        self.len.zeroize();
        self.truncated = false;
    }
}

/// Network name as stored by the driver.
pub type Ssid = BoundedBytes<MAX_SSID_LEN>;

/// Network passphrase. Wiped from memory on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase(BoundedBytes<MAX_PASSWORD_LEN>);

impl Passphrase {
    pub fn from_truncating(bytes: &[u8]) -> Self {
        Self(BoundedBytes::from_truncating(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_padded(&self) -> &[u8; MAX_PASSWORD_LEN] {
        self.0.as_padded()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty passphrase selects an open network.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn was_truncated(&self) -> bool {
        self.0.was_truncated()
    }
}

impl TryFrom<&[u8]> for Passphrase {
    type Error = ConfigError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        BoundedBytes::try_from(bytes).map(Self)
    }
}

impl TryFrom<&str> for Passphrase {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.as_bytes())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passphrase(<{} bytes redacted>)", self.len())
    }
}

/// Protected management frame (802.11w) capability advertised to the AP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmfConfig {
    /// Station supports PMF when the AP offers it.
    pub capable: bool,
    /// Station refuses APs without PMF.
    pub required: bool,
}

impl PmfConfig {
    /// Policy used when building from plain credentials.
    pub const STATION_DEFAULT: Self = Self {
        capable: true,
        required: false,
    };
}

impl Default for PmfConfig {
    fn default() -> Self {
        Self::STATION_DEFAULT
    }
}

/// Station-mode configuration handed to the radio driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    ssid: Ssid,
    passphrase: Passphrase,
    bssid: Option<[u8; 6]>,
    channel: u8,
    pmf: PmfConfig,
}

impl StationConfig {
    /// Build a configuration from already-bounded fields.
    pub fn new(ssid: Ssid, passphrase: Passphrase) -> Self {
        Self {
            ssid,
            passphrase,
            bssid: None,
            channel: 0,
            pmf: PmfConfig::STATION_DEFAULT,
        }
    }

    /// Build a configuration from raw credentials.
    ///
    /// SSID and passphrase are truncated to [`MAX_SSID_LEN`] and
    /// [`MAX_PASSWORD_LEN`] bytes. PMF is fixed to capable, not required.
    pub fn from_credentials(ssid: &[u8], passphrase: &[u8]) -> Self {
        let ssid = Ssid::from_truncating(ssid);
        let passphrase = Passphrase::from_truncating(passphrase);

        if ssid.was_truncated() {
            warn!(
                target: crate::LOG_TARGET,
                "SSID longer than {} bytes, truncated to {:?}", MAX_SSID_LEN, ssid
            );
        }
        if passphrase.was_truncated() {
            warn!(
                target: crate::LOG_TARGET,
                "Passphrase longer than {} bytes, truncated", MAX_PASSWORD_LEN
            );
        }

        Self::new(ssid, passphrase)
    }

    /// Only associate with the AP that has this BSSID.
    pub fn with_bssid(mut self, bssid: [u8; 6]) -> Self {
        self.bssid = Some(bssid);
        self
    }

    /// Restrict the scan to one channel (0 scans all channels).
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_pmf(mut self, pmf: PmfConfig) -> Self {
        self.pmf = pmf;
        self
    }

    pub fn ssid(&self) -> &Ssid {
        &self.ssid
    }

    pub fn passphrase(&self) -> &Passphrase {
        &self.passphrase
    }

    pub fn bssid(&self) -> Option<[u8; 6]> {
        self.bssid
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn pmf(&self) -> PmfConfig {
        self.pmf
    }

    /// Check if this is an open network (no passphrase).
    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

/// Errors from strict (non-truncating) field construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Input exceeds the field capacity.
    TooLong { len: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { len, max } => {
                write!(f, "value too long: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== BoundedBytes Tests ====================

    #[test]
    fn test_short_input_kept_verbatim() {
        let ssid = Ssid::from_truncating(b"TestNetwork");
        assert_eq!(ssid.as_bytes(), b"TestNetwork");
        assert_eq!(ssid.len(), 11);
        assert!(!ssid.was_truncated());
    }

    #[test]
    fn test_long_input_truncated_to_capacity() {
        let long = [b'a'; 40];
        let ssid = Ssid::from_truncating(&long);
        assert_eq!(ssid.len(), MAX_SSID_LEN);
        assert_eq!(ssid.as_bytes(), &long[..MAX_SSID_LEN]);
        assert!(ssid.was_truncated());
    }

    #[test]
    fn test_exact_capacity_not_truncated() {
        let exact = [b'x'; MAX_SSID_LEN];
        let ssid = Ssid::from_truncating(&exact);
        assert_eq!(ssid.len(), MAX_SSID_LEN);
        assert!(!ssid.was_truncated());
    }

    #[test]
    fn test_padding_is_zeroed() {
        let ssid = Ssid::from_truncating(b"abc");
        let padded = ssid.as_padded();
        assert_eq!(&padded[..3], b"abc");
        assert!(padded[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_strict_conversion_rejects_long_input() {
        let long = "a".repeat(33);
        let result = Ssid::try_from(long.as_str());
        assert_eq!(result, Err(ConfigError::TooLong { len: 33, max: 32 }));
    }

    #[test]
    fn test_strict_conversion_accepts_max() {
        let max = "a".repeat(32);
        let ssid = Ssid::try_from(max.as_str()).unwrap();
        assert_eq!(ssid.len(), 32);
    }

    #[test]
    fn test_empty_input() {
        let ssid = Ssid::from_truncating(b"");
        assert!(ssid.is_empty());
        assert_eq!(ssid, Ssid::default());
    }

    // ==================== Passphrase Tests ====================

    #[test]
    fn test_passphrase_truncated() {
        let long = [b'p'; 100];
        let pass = Passphrase::from_truncating(&long);
        assert_eq!(pass.len(), MAX_PASSWORD_LEN);
        assert!(pass.was_truncated());
    }

    #[test]
    fn test_passphrase_debug_is_redacted() {
        let pass = Passphrase::from_truncating(b"hunter22");
        let shown = format!("{:?}", pass);
        assert!(!shown.contains("hunter22"));
        assert!(shown.contains("8 bytes"));
    }

    #[test]
    fn test_passphrase_zeroize() {
        let mut pass = Passphrase::from_truncating(b"secret-pass");
        pass.zeroize();
        assert!(pass.is_empty());
        assert!(pass.as_padded().iter().all(|&b| b == 0));
    }

    // ==================== StationConfig Tests ====================

    #[test]
    fn test_from_credentials_sets_pmf_policy() {
        let config = StationConfig::from_credentials(b"Net", b"password123");
        assert!(config.pmf().capable);
        assert!(!config.pmf().required);
    }

    #[test]
    fn test_from_credentials_truncates_both_fields() {
        let config = StationConfig::from_credentials(&[b's'; 50], &[b'p'; 80]);
        assert_eq!(config.ssid().len(), MAX_SSID_LEN);
        assert_eq!(config.passphrase().len(), MAX_PASSWORD_LEN);
    }

    #[test]
    fn test_open_network() {
        let config = StationConfig::from_credentials(b"OpenNetwork", b"");
        assert!(config.is_open());
    }

    #[test]
    fn test_builders() {
        let ssid = Ssid::try_from("Lab").unwrap();
        let pass = Passphrase::try_from("labpassword").unwrap();
        let pmf = PmfConfig {
            capable: true,
            required: true,
        };
        let config = StationConfig::new(ssid, pass)
            .with_bssid([1, 2, 3, 4, 5, 6])
            .with_channel(11)
            .with_pmf(pmf);

        assert_eq!(config.bssid(), Some([1, 2, 3, 4, 5, 6]));
        assert_eq!(config.channel(), 11);
        assert_eq!(config.pmf(), pmf);
        assert!(!config.is_open());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::TooLong { len: 40, max: 32 };
        assert_eq!(err.to_string(), "value too long: 40 bytes (max 32)");
    }
}
