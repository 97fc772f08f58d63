//! Artifact codecs, selected by file extension
//!
//! - `.npy`: a single dense array (NPY format)
//! - `.npz`: a zip of named `.npy` members, deflate compressed
//! - anything else: any [`Value`] as JSON

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::array::{element_count, ArrayData, DType, NdArray};
use crate::core::error::{CacheError, Result};
use crate::core::value::{tuple_repr, Value};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

static DESCR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'descr'\s*:\s*'([^']*)'").expect("Invalid DESCR_RE regex"));
static FORTRAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'fortran_order'\s*:\s*(True|False)").expect("Invalid FORTRAN_RE regex")
});
static SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").expect("Invalid SHAPE_RE regex"));

type FormatResult<T> = std::result::Result<T, FormatError>;

/// Why npy/npz content could not be written or read
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("file is too short to be an npy array")]
    TooShort,

    #[error("missing npy magic string")]
    BadMagic,

    #[error("unsupported npy version {0}.{1}")]
    Version(u8, u8),

    #[error("truncated npy header")]
    TruncatedHeader,

    /// A required key is absent from the header dict
    #[error("npy header has no '{0}'")]
    MissingKey(&'static str),

    #[error("unsupported dtype '{0}'")]
    DType(String),

    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,

    #[error("invalid dimension '{0}'")]
    Dimension(String),

    #[error("shape {0:?} overflows")]
    ShapeOverflow(Vec<usize>),

    #[error("payload holds {actual} bytes, header describes {expected}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("payload is not a whole number of elements")]
    PartialElement,

    /// The value cannot be stored as a dense array
    #[error("{0}")]
    NotArray(String),

    #[error("expected a dict of arrays, got {0}")]
    NotMapping(&'static str),

    #[error("member '{name}': {source}")]
    Member {
        name: String,
        #[source]
        source: Box<FormatError>,
    },

    #[error(transparent)]
    Array(#[from] CacheError),

    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FormatError {
    fn member(name: &str, source: FormatError) -> Self {
        FormatError::Member {
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}

/// Serialization strategy for an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Npy,
    Npz,
    Object,
}

impl Codec {
    /// Pick the codec from the path's extension
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("npy") => Codec::Npy,
            Some("npz") => Codec::Npz,
            _ => Codec::Object,
        }
    }

    /// Encode `value` into `writer`; `path` is only used for error reporting
    pub fn encode<W: Write + Seek>(self, path: &Path, value: &Value, mut writer: W) -> Result<()> {
        let encoded = match self {
            Codec::Npy => NdArray::from_value(value)
                .map_err(FormatError::NotArray)
                .and_then(|array| write_npy(&array, &mut writer)),
            Codec::Npz => value
                .as_dict()
                .ok_or_else(|| FormatError::NotMapping(value.type_name()))
                .and_then(|members| write_npz(members, writer)),
            Codec::Object => {
                return serde_json::to_writer(&mut writer, value)
                    .map_err(|e| CacheError::serialization(path, e));
            }
        };
        encoded.map_err(|e| CacheError::serialization(path, e))
    }

    /// Decode a value from `reader`; `path` is only used for error reporting
    pub fn decode<R: Read + Seek>(self, path: &Path, mut reader: R) -> Result<Value> {
        let decoded = match self {
            Codec::Npy => read_npy(&mut reader).map(Value::Array),
            Codec::Npz => read_npz(reader).map(Value::Dict),
            Codec::Object => {
                return serde_json::from_reader(reader)
                    .map_err(|e| CacheError::deserialization(path, e));
            }
        };
        decoded.map_err(|e| CacheError::deserialization(path, e))
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Npy => "npy",
            Codec::Npz => "npz",
            Codec::Object => "object",
        })
    }
}

/// Write one array in NPY format (version 1.0, or 2.0 for huge headers)
pub fn write_npy<W: Write>(array: &NdArray, writer: &mut W) -> FormatResult<()> {
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        array.dtype().descr(),
        tuple_repr(array.shape())
    );

    // Header length counts the dict, the padding and the closing newline
    let padded_len = |len_field: usize| {
        let unpadded = NPY_MAGIC.len() + 2 + len_field + dict.len() + 1;
        dict.len() + (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN + 1
    };
    let (version, header_len) = match padded_len(2) {
        len if len <= u16::MAX as usize => (1u8, len),
        _ => (2u8, padded_len(4)),
    };

    let mut out = Vec::with_capacity(16 + header_len + array.len() * 8);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[version, 0]);
    if version == 1 {
        out.extend((header_len as u16).to_le_bytes());
    } else {
        out.extend((header_len as u32).to_le_bytes());
    }
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + header_len - dict.len() - 1, b' ');
    out.push(b'\n');
    out.extend(array.data().to_le_bytes());

    writer.write_all(&out)?;
    Ok(())
}

/// Read one array in NPY format, validating the payload length
pub fn read_npy<R: Read>(reader: &mut R) -> FormatResult<NdArray> {
    let mut preamble = [0u8; 8];
    reader
        .read_exact(&mut preamble)
        .map_err(|_| FormatError::TooShort)?;
    if &preamble[..6] != NPY_MAGIC {
        return Err(FormatError::BadMagic);
    }

    let header_len = match preamble[6] {
        1 => {
            let mut buf = [0u8; 2];
            reader
                .read_exact(&mut buf)
                .map_err(|_| FormatError::TruncatedHeader)?;
            u16::from_le_bytes(buf) as u64
        }
        2 | 3 => {
            let mut buf = [0u8; 4];
            reader
                .read_exact(&mut buf)
                .map_err(|_| FormatError::TruncatedHeader)?;
            u32::from_le_bytes(buf) as u64
        }
        major => return Err(FormatError::Version(major, preamble[7])),
    };

    let mut header = Vec::new();
    reader.by_ref().take(header_len).read_to_end(&mut header)?;
    if header.len() as u64 != header_len {
        return Err(FormatError::TruncatedHeader);
    }
    let header = String::from_utf8_lossy(&header);

    let (dtype, shape) = parse_npy_header(&header)?;
    let expected = element_count(&shape)
        .and_then(|count| count.checked_mul(dtype.item_size()))
        .ok_or_else(|| FormatError::ShapeOverflow(shape.clone()))?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(FormatError::PayloadLength {
            expected,
            actual: payload.len(),
        });
    }

    let data = ArrayData::from_le_bytes(dtype, &payload).ok_or(FormatError::PartialElement)?;
    Ok(NdArray::new(shape, data)?)
}

fn parse_npy_header(header: &str) -> FormatResult<(DType, Vec<usize>)> {
    let descr = DESCR_RE
        .captures(header)
        .map(|c| c[1].to_string())
        .ok_or(FormatError::MissingKey("descr"))?;
    let dtype = DType::from_descr(&descr).ok_or(FormatError::DType(descr))?;

    let fortran = FORTRAN_RE
        .captures(header)
        .map(|c| &c[1] == "True")
        .ok_or(FormatError::MissingKey("fortran_order"))?;
    if fortran {
        return Err(FormatError::FortranOrder);
    }

    let shape = SHAPE_RE
        .captures(header)
        .ok_or(FormatError::MissingKey("shape"))?;
    let shape = shape[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| FormatError::Dimension(s.to_string()))
        })
        .collect::<FormatResult<Vec<_>>>()?;

    Ok((dtype, shape))
}

/// Write a compressed archive with one `<name>.npy` member per entry
pub fn write_npz<W: Write + Seek>(
    members: &BTreeMap<String, Value>,
    writer: W,
) -> FormatResult<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    for (name, value) in members {
        let array = NdArray::from_value(value)
            .map_err(|e| FormatError::member(name, FormatError::NotArray(e)))?;
        zip.start_file(format!("{}.npy", name), options)?;
        write_npy(&array, &mut zip).map_err(|e| FormatError::member(name, e))?;
    }

    zip.finish()?;
    Ok(())
}

/// Read every member of an archive eagerly; any bad member fails the load
pub fn read_npz<R: Read + Seek>(reader: R) -> FormatResult<BTreeMap<String, Value>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut members = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        let key = name.strip_suffix(".npy").unwrap_or(&name).to_string();
        let array = read_npy(&mut file).map_err(|e| FormatError::member(&name, e))?;
        members.insert(key, Value::Array(array));
    }

    Ok(members)
}
