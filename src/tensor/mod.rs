mod device;
mod dtype;
mod ndarray;
mod shape;

pub use device::{Device, DeviceType};
pub use dtype::{DataType, DataTypeCode};
pub use ndarray::{NDArray, NDArrayData};
pub use shape::{numel, Shape};
