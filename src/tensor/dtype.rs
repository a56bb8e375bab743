use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Scalar category of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeCode {
    Int,
    UInt,
    Float,
    Handle,
    BFloat,
    Bool,
}

impl DataTypeCode {
    pub fn as_u8(self) -> u8 {
        match self {
            DataTypeCode::Int => 0,
            DataTypeCode::UInt => 1,
            DataTypeCode::Float => 2,
            DataTypeCode::Handle => 3,
            DataTypeCode::BFloat => 4,
            DataTypeCode::Bool => 6,
        }
    }

    pub fn from_u8(code: u8) -> Result<Self> {
        match code {
            0 => Ok(DataTypeCode::Int),
            1 => Ok(DataTypeCode::UInt),
            2 => Ok(DataTypeCode::Float),
            3 => Ok(DataTypeCode::Handle),
            4 => Ok(DataTypeCode::BFloat),
            6 => Ok(DataTypeCode::Bool),
            _ => Err(anyhow!("unsupported dtype code {}", code)),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            DataTypeCode::Int => "int",
            DataTypeCode::UInt => "uint",
            DataTypeCode::Float => "float",
            DataTypeCode::Handle => "handle",
            DataTypeCode::BFloat => "bfloat",
            DataTypeCode::Bool => "bool",
        }
    }
}

/// Machine data type as a (code, bits, lanes) triple.
///
/// The canonical string form is `<prefix><bits>` with an optional `x<lanes>`
/// suffix for vector types, e.g. `float32`, `int8x4`, `uint1`, `bfloat16`.
/// `bool` and `handle` omit the bit count in their canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub code: DataTypeCode,
    pub bits: u8,
    pub lanes: u16,
}

impl DataType {
    pub const fn new(code: DataTypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const fn float32() -> Self {
        Self::new(DataTypeCode::Float, 32, 1)
    }

    pub const fn float64() -> Self {
        Self::new(DataTypeCode::Float, 64, 1)
    }

    pub const fn int32() -> Self {
        Self::new(DataTypeCode::Int, 32, 1)
    }

    pub const fn int64() -> Self {
        Self::new(DataTypeCode::Int, 64, 1)
    }

    pub const fn bool() -> Self {
        Self::new(DataTypeCode::Bool, 1, 1)
    }

    /// Storage bytes per element (vector lanes included, bit types rounded up).
    pub fn bytes(&self) -> usize {
        let bits = self.bits as usize * self.lanes as usize;
        bits.div_ceil(8)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.bits, self.lanes) {
            (DataTypeCode::Bool, 1, 1) => return write!(f, "bool"),
            (DataTypeCode::Handle, 64, 1) => return write!(f, "handle"),
            _ => {}
        }
        write!(f, "{}{}", self.code.prefix(), self.bits)?;
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "bool" => return Ok(DataType::bool()),
            "handle" => return Ok(DataType::new(DataTypeCode::Handle, 64, 1)),
            _ => {}
        }
        let (head, lanes) = match value.split_once('x') {
            Some((head, lanes)) => (
                head,
                lanes
                    .parse::<u16>()
                    .map_err(|_| anyhow!("unsupported dtype: {}", value))?,
            ),
            None => (value, 1),
        };
        let split = head
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(|| anyhow!("unsupported dtype: {}", value))?;
        let (prefix, bits) = head.split_at(split);
        let bits = bits
            .parse::<u8>()
            .map_err(|_| anyhow!("unsupported dtype: {}", value))?;
        let code = match prefix {
            "int" => DataTypeCode::Int,
            "uint" => DataTypeCode::UInt,
            "float" => DataTypeCode::Float,
            "handle" => DataTypeCode::Handle,
            "bfloat" => DataTypeCode::BFloat,
            "bool" => DataTypeCode::Bool,
            _ => return Err(anyhow!("unsupported dtype: {}", value)),
        };
        Ok(DataType::new(code, bits, lanes))
    }
}
