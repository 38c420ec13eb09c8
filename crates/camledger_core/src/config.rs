//! Ledger configuration.

/// The demonstration camera written by `InitLedger`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisCamera {
    /// Device identifier.
    pub device_id: String,
    /// Device public key.
    pub public_key: String,
    /// Identity recorded as the registrant.
    pub registered_by: String,
    /// Physical location.
    pub location: String,
    /// Hardware model.
    pub model: String,
}

impl Default for GenesisCamera {
    fn default() -> Self {
        Self {
            device_id: "RPI5-TEST-001".to_string(),
            public_key: "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE...".to_string(),
            registered_by: "Org1MSP".to_string(),
            location: "UTRGV Lab Room".to_string(),
            model: "Raspberry Pi 5".to_string(),
        }
    }
}

/// Configuration for a [`crate::Ledger`].
#[derive(Debug, Clone)]
pub struct Config {
    /// A scan visiting more entries than this logs a warning.
    ///
    /// Every query is a linear pass over the whole world state, which is
    /// only acceptable while the ledger stays small.
    pub scan_warn_threshold: usize,

    /// Camera seeded by `InitLedger`.
    pub genesis_camera: GenesisCamera,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_warn_threshold: 10_000,
            genesis_camera: GenesisCamera::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan size that triggers a warning.
    #[must_use]
    pub const fn scan_warn_threshold(mut self, entries: usize) -> Self {
        self.scan_warn_threshold = entries;
        self
    }

    /// Sets the camera seeded by `InitLedger`.
    #[must_use]
    pub fn genesis_camera(mut self, camera: GenesisCamera) -> Self {
        self.genesis_camera = camera;
        self
    }
}
