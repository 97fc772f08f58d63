//! Dense n-dimensional arrays
//!
//! Row-major (C order) storage with a small closed set of element types,
//! enough to round-trip the dtypes commonly written to `.npy` files.

use serde::{Deserialize, Serialize};

use crate::core::error::{CacheError, Result};
use crate::core::value::{tuple_repr, Value};

/// Element type of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    U8,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    /// Little-endian array-protocol type string
    pub fn descr(self) -> &'static str {
        match self {
            DType::Bool => "|b1",
            DType::U8 => "|u1",
            DType::I32 => "<i4",
            DType::I64 => "<i8",
            DType::F32 => "<f4",
            DType::F64 => "<f8",
        }
    }

    /// Parse a type string; big-endian and unknown types yield `None`
    pub fn from_descr(descr: &str) -> Option<Self> {
        let (order, code) = match descr.chars().next() {
            Some(c @ ('<' | '>' | '|' | '=')) => (c, &descr[1..]),
            _ => ('=', descr),
        };

        let dtype = match code {
            "b1" | "?" => DType::Bool,
            "u1" => DType::U8,
            "i4" => DType::I32,
            "i8" => DType::I64,
            "f4" => DType::F32,
            "f8" => DType::F64,
            _ => return None,
        };

        // Single-byte types carry no byte order
        if order == '>' && dtype.item_size() > 1 {
            return None;
        }
        Some(dtype)
    }

    pub fn item_size(self) -> usize {
        match self {
            DType::Bool | DType::U8 => 1,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::U8 => "uint8",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::F32 => "float32",
            DType::F64 => "float64",
        }
    }
}

/// Flat element storage, one variant per dtype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum ArrayData {
    Bool(Vec<bool>),
    U8(Vec<u8>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(#[serde(with = "crate::core::serde_float::vec_f32")] Vec<f32>),
    F64(#[serde(with = "crate::core::serde_float::vec_f64")] Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::U8(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::U8(_) => DType::U8,
            ArrayData::I32(_) => DType::I32,
            ArrayData::I64(_) => DType::I64,
            ArrayData::F32(_) => DType::F32,
            ArrayData::F64(_) => DType::F64,
        }
    }

    /// Raw little-endian element bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.dtype().item_size());
        match self {
            ArrayData::Bool(v) => out.extend(v.iter().map(|&b| b as u8)),
            ArrayData::U8(v) => out.extend_from_slice(v),
            ArrayData::I32(v) => v.iter().for_each(|x| out.extend(x.to_le_bytes())),
            ArrayData::I64(v) => v.iter().for_each(|x| out.extend(x.to_le_bytes())),
            ArrayData::F32(v) => v.iter().for_each(|x| out.extend(x.to_le_bytes())),
            ArrayData::F64(v) => v.iter().for_each(|x| out.extend(x.to_le_bytes())),
        }
        out
    }

    /// Decode `bytes` as little-endian elements of `dtype`.
    ///
    /// Returns `None` when the byte count is not a multiple of the item size.
    pub fn from_le_bytes(dtype: DType, bytes: &[u8]) -> Option<Self> {
        if bytes.len() % dtype.item_size() != 0 {
            return None;
        }

        macro_rules! decode {
            ($ty:ty, $n:expr) => {
                bytes
                    .chunks_exact($n)
                    .map(|c| {
                        let mut buf = [0u8; $n];
                        buf.copy_from_slice(c);
                        <$ty>::from_le_bytes(buf)
                    })
                    .collect()
            };
        }

        let data = match dtype {
            DType::Bool => ArrayData::Bool(bytes.iter().map(|&b| b != 0).collect()),
            DType::U8 => ArrayData::U8(bytes.to_vec()),
            DType::I32 => ArrayData::I32(decode!(i32, 4)),
            DType::I64 => ArrayData::I64(decode!(i64, 8)),
            DType::F32 => ArrayData::F32(decode!(f32, 4)),
            DType::F64 => ArrayData::F64(decode!(f64, 8)),
        };
        Some(data)
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(v: Vec<f64>) -> Self {
        ArrayData::F64(v)
    }
}

impl From<Vec<f32>> for ArrayData {
    fn from(v: Vec<f32>) -> Self {
        ArrayData::F32(v)
    }
}

impl From<Vec<i64>> for ArrayData {
    fn from(v: Vec<i64>) -> Self {
        ArrayData::I64(v)
    }
}

impl From<Vec<i32>> for ArrayData {
    fn from(v: Vec<i32>) -> Self {
        ArrayData::I32(v)
    }
}

impl From<Vec<u8>> for ArrayData {
    fn from(v: Vec<u8>) -> Self {
        ArrayData::U8(v)
    }
}

impl From<Vec<bool>> for ArrayData {
    fn from(v: Vec<bool>) -> Self {
        ArrayData::Bool(v)
    }
}

/// Serialized form, validated on the way back in
#[derive(Deserialize)]
struct RawArray {
    shape: Vec<usize>,
    data: ArrayData,
}

/// A dense array in C order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArray")]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl TryFrom<RawArray> for NdArray {
    type Error = CacheError;

    fn try_from(raw: RawArray) -> Result<Self> {
        NdArray::new(raw.shape, raw.data)
    }
}

/// Number of elements described by `shape`; `None` if it overflows `usize`
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

impl NdArray {
    /// Create an array, checking the element count against the shape
    pub fn new(shape: Vec<usize>, data: impl Into<ArrayData>) -> Result<Self> {
        let data = data.into();
        let Some(expected) = element_count(&shape) else {
            return Err(CacheError::ShapeOverflow(shape));
        };
        if expected != data.len() {
            return Err(CacheError::Shape {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Array of `f64` produced by `f(flat_index)`
    pub fn from_fn(shape: Vec<usize>, f: impl Fn(usize) -> f64) -> Result<Self> {
        let Some(len) = element_count(&shape) else {
            return Err(CacheError::ShapeOverflow(shape));
        };
        let data = ArrayData::F64((0..len).map(f).collect());
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Short description: `array(shape=(2, 3), dtype=float64)`
    pub fn summary(&self) -> String {
        format!(
            "array(shape={}, dtype={})",
            tuple_repr(&self.shape),
            self.dtype().name()
        )
    }

    /// Coerce an array-like value into an array.
    ///
    /// Accepts arrays, numeric scalars (0-d result) and rectangular nestings
    /// of lists/tuples of numbers. The error string names the problem.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        if let Value::Array(array) = value {
            return Ok(array.clone());
        }

        let mut shape = Vec::new();
        let mut leaves = Vec::new();
        let mut leaf_depth = None;
        collect_leaves(value, 0, &mut shape, &mut leaf_depth, &mut leaves)?;

        let all_bool = leaves.iter().all(|v| matches!(v, Value::Bool(_)));
        let any_float = leaves.iter().any(|v| matches!(v, Value::Float(_)));

        let data = if all_bool && !leaves.is_empty() {
            ArrayData::Bool(
                leaves
                    .iter()
                    .map(|v| matches!(v, Value::Bool(true)))
                    .collect(),
            )
        } else if any_float || leaves.is_empty() {
            ArrayData::F64(leaves.iter().filter_map(|v| v.as_f64()).collect())
        } else {
            ArrayData::I64(leaves.iter().filter_map(|v| v.as_i64()).collect())
        };

        NdArray::new(shape, data).map_err(|e| e.to_string())
    }
}

fn collect_leaves<'a>(
    value: &'a Value,
    depth: usize,
    shape: &mut Vec<usize>,
    leaf_depth: &mut Option<usize>,
    leaves: &mut Vec<&'a Value>,
) -> std::result::Result<(), String> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            if depth == shape.len() {
                if leaf_depth.is_some() {
                    return Err("ragged nested sequence".to_string());
                }
                shape.push(items.len());
            } else if shape[depth] != items.len() {
                return Err("ragged nested sequence".to_string());
            }
            for item in items {
                collect_leaves(item, depth + 1, shape, leaf_depth, leaves)?;
            }
            Ok(())
        }
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
            let seen = *leaf_depth;
            match seen {
                Some(d) if d != depth => return Err("ragged nested sequence".to_string()),
                _ if depth != shape.len() => {
                    return Err("ragged nested sequence".to_string())
                }
                _ => *leaf_depth = Some(depth),
            }
            leaves.push(value);
            Ok(())
        }
        other => Err(format!("{} is not array-like", other.type_name())),
    }
}
