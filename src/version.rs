pub const API_VERSION: u16 = 0x0001;
pub const DRV_VERSION: u16 = 0x0001;

/// Informational only; no behavior depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverVersion {
    /// Version of the operation set the driver implements.
    pub api: u16,
    /// Version of this implementation of it.
    pub drv: u16,
}

pub const DRIVER_VERSION: DriverVersion = DriverVersion {
    api: API_VERSION,
    drv: DRV_VERSION,
};
