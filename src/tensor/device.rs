use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Device classes a value may live on. Only `Cpu` buffers participate in
/// serialization and content comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Cpu,
    Cuda,
    Rocm,
    Vulkan,
    Metal,
}

impl DeviceType {
    pub fn as_i32(self) -> i32 {
        match self {
            DeviceType::Cpu => 1,
            DeviceType::Cuda => 2,
            DeviceType::Rocm => 10,
            DeviceType::Vulkan => 7,
            DeviceType::Metal => 8,
        }
    }

    pub fn from_i32(code: i32) -> Result<Self> {
        match code {
            1 => Ok(DeviceType::Cpu),
            2 => Ok(DeviceType::Cuda),
            10 => Ok(DeviceType::Rocm),
            7 => Ok(DeviceType::Vulkan),
            8 => Ok(DeviceType::Metal),
            _ => Err(anyhow!("unsupported device type {}", code)),
        }
    }
}

/// A (device type, ordinal) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub device_type: DeviceType,
    pub device_id: i32,
}

impl Device {
    pub const fn new(device_type: DeviceType, device_id: i32) -> Self {
        Self {
            device_type,
            device_id,
        }
    }

    pub const fn cpu() -> Self {
        Self::new(DeviceType::Cpu, 0)
    }

    pub fn is_cpu(&self) -> bool {
        self.device_type == DeviceType::Cpu
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self.device_type, self.device_id)
    }
}
