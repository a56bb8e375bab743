use std::rc::Rc;

use anyhow::{anyhow, Result};
use bytemuck::Pod;

use super::dtype::{DataType, DataTypeCode};
use super::device::{Device, DeviceType};
use super::shape::numel;

const BLOB_MAGIC: u64 = 0xDD5E_40F0_96B4_A13F;

/// Dense tensor payload: dtype, shape and a contiguous CPU byte buffer.
#[derive(Debug)]
pub struct NDArrayData {
    dtype: DataType,
    shape: Vec<i64>,
    device: Device,
    data: Vec<u8>,
}

/// Shared handle to a tensor. Sharing is by reference identity; two handles
/// to the same allocation serialize as one node.
pub type NDArray = Rc<NDArrayData>;

impl NDArrayData {
    /// Build a tensor from raw bytes, validating the byte count.
    pub fn from_bytes(dtype: DataType, shape: Vec<i64>, data: Vec<u8>) -> Result<NDArray> {
        let expect = numel(&shape) * dtype.bytes();
        if data.len() != expect {
            return Err(anyhow!(
                "tensor byte size mismatch: shape {:?} dtype {} wants {} bytes, got {}",
                shape,
                dtype,
                expect,
                data.len()
            ));
        }
        Ok(Rc::new(Self {
            dtype,
            shape,
            device: Device::cpu(),
            data,
        }))
    }

    /// Build a tensor from a typed slice.
    pub fn from_slice<T: Pod>(dtype: DataType, shape: Vec<i64>, values: &[T]) -> Result<NDArray> {
        Self::from_bytes(dtype, shape, bytemuck::cast_slice(values).to_vec())
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The buffer layout is row-major without padding, so a handle is
    /// contiguous by construction; kept as an explicit check point for
    /// content comparison prerequisites.
    pub fn is_contiguous(&self) -> bool {
        true
    }

    /// Typed view of the buffer.
    pub fn as_slice<T: Pod>(&self) -> Result<&[T]> {
        bytemuck::try_cast_slice(&self.data).map_err(|err| anyhow!("tensor view cast: {}", err))
    }

    /// Encode into the binary blob carried by `b64ndarrays`.
    pub fn encode_blob(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.shape.len() * 8 + self.data.len());
        out.extend_from_slice(&BLOB_MAGIC.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&(self.device.device_type.as_i32() as u32).to_le_bytes());
        out.extend_from_slice(&(self.device.device_id as u32).to_le_bytes());
        out.extend_from_slice(&(self.shape.len() as u32).to_le_bytes());
        out.push(self.dtype.code.as_u8());
        out.push(self.dtype.bits);
        out.extend_from_slice(&self.dtype.lanes.to_le_bytes());
        for dim in &self.shape {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        out.extend_from_slice(&(self.data.len() as i64).to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode a blob produced by [`NDArrayData::encode_blob`].
    pub fn decode_blob(blob: &[u8]) -> Result<NDArray> {
        let mut cursor = 0usize;
        let magic = read_u64(blob, &mut cursor)?;
        if magic != BLOB_MAGIC {
            return Err(anyhow!("invalid tensor blob magic {:#x}", magic));
        }
        let _reserved = read_u64(blob, &mut cursor)?;
        let device_type = DeviceType::from_i32(read_u32(blob, &mut cursor)? as i32)?;
        let _device_id = read_u32(blob, &mut cursor)?;
        if device_type != DeviceType::Cpu {
            return Err(anyhow!("tensor blob device must be cpu, got {:?}", device_type));
        }
        let ndim = read_u32(blob, &mut cursor)? as usize;
        let code = DataTypeCode::from_u8(read_u8(blob, &mut cursor)?)?;
        let bits = read_u8(blob, &mut cursor)?;
        let lanes = read_u16(blob, &mut cursor)?;
        let dtype = DataType::new(code, bits, lanes);
        let mut shape = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            shape.push(read_u64(blob, &mut cursor)? as i64);
        }
        let byte_size = read_u64(blob, &mut cursor)? as usize;
        if byte_size != numel(&shape) * dtype.bytes() {
            return Err(anyhow!("tensor blob byte size mismatch"));
        }
        let rest = &blob[cursor..];
        if rest.len() != byte_size {
            return Err(anyhow!(
                "tensor blob truncated: want {} data bytes, got {}",
                byte_size,
                rest.len()
            ));
        }
        Self::from_bytes(dtype, shape, rest.to_vec())
    }
}

fn read_u8(data: &[u8], cursor: &mut usize) -> Result<u8> {
    let end = *cursor + 1;
    if end > data.len() {
        return Err(anyhow!("tensor blob too short"));
    }
    let value = data[*cursor];
    *cursor = end;
    Ok(value)
}

fn read_u16(data: &[u8], cursor: &mut usize) -> Result<u16> {
    let end = *cursor + 2;
    if end > data.len() {
        return Err(anyhow!("tensor blob too short"));
    }
    let value = u16::from_le_bytes(data[*cursor..end].try_into().unwrap());
    *cursor = end;
    Ok(value)
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32> {
    let end = *cursor + 4;
    if end > data.len() {
        return Err(anyhow!("tensor blob too short"));
    }
    let value = u32::from_le_bytes(data[*cursor..end].try_into().unwrap());
    *cursor = end;
    Ok(value)
}

fn read_u64(data: &[u8], cursor: &mut usize) -> Result<u64> {
    let end = *cursor + 8;
    if end > data.len() {
        return Err(anyhow!("tensor blob too short"));
    }
    let value = u64::from_le_bytes(data[*cursor..end].try_into().unwrap());
    *cursor = end;
    Ok(value)
}
