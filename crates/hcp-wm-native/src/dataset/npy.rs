//! Array file readers
//!
//! Numeric arrays go through `ndarray-npy`. Fixed-width unicode arrays
//! (`<U` / `>U`, as written by numpy for string tables) are not supported
//! there, so this module carries a small reader and writer for them.
//!
//! # npy layout
//!
//! ```text
//! \x93NUMPY | major | minor | header_len (u16 v1, u32 v2+) | dict header | data
//! ```

use std::fs::{self, File};
use std::path::Path;

use ndarray::{Array1, Array2};
use ndarray_npy::{read_npy, NpzReader};

use crate::error::{DatasetError, DatasetResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Read a 2D float array, accepting float64 or float32 storage
///
/// # Errors
///
/// Fails if the file is missing, not 2D, or not a float dtype.
pub fn read_f64_matrix(path: &Path) -> DatasetResult<Array2<f64>> {
    match read_npy::<_, Array2<f64>>(path) {
        Ok(array) => Ok(array),
        Err(first) => read_npy::<_, Array2<f32>>(path)
            .map(|array| array.mapv(f64::from))
            .map_err(|_| DatasetError::Npy {
                path: path.to_path_buf(),
                reason: first.to_string(),
            }),
    }
}

/// Open an npz archive
///
/// # Errors
///
/// Fails if the file cannot be opened or is not a zip archive.
pub fn open_npz(path: &Path) -> DatasetResult<NpzReader<File>> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    NpzReader::new(file).map_err(|e| DatasetError::Npz {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read a 1D integer array from an npz archive, accepting int64 or int32
///
/// `name` may be given with or without the `.npy` suffix.
///
/// # Errors
///
/// Fails if the array is absent or not an integer vector.
pub fn read_npz_labels(
    npz: &mut NpzReader<File>,
    path: &Path,
    name: &'static str,
) -> DatasetResult<Array1<i64>> {
    let npz_err = |e: ndarray_npy::ReadNpzError| DatasetError::Npz {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let suffixed = format!("{name}.npy");
    let entry = npz
        .names()
        .map_err(npz_err)?
        .into_iter()
        .find(|n| n == name || *n == suffixed)
        .ok_or_else(|| DatasetError::MissingArray {
            path: path.to_path_buf(),
            name,
        })?;

    match npz.by_name::<ndarray::OwnedRepr<i64>, ndarray::Ix1>(&entry) {
        Ok(labels) => Ok(labels),
        Err(first) => npz
            .by_name::<ndarray::OwnedRepr<i32>, ndarray::Ix1>(&entry)
            .map(|labels| labels.mapv(i64::from))
            .map_err(|_| npz_err(first)),
    }
}

/// A fixed-width unicode array in C order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnicodeArray {
    /// Array shape
    pub shape: Vec<usize>,
    /// Elements in row-major order
    pub values: Vec<String>,
}

impl UnicodeArray {
    /// Row `i` of a 2D array
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[String]> {
        let cols = *self.shape.get(1)?;
        self.values.get(i * cols..(i + 1) * cols)
    }
}

struct Header {
    little_endian: bool,
    width: usize,
    fortran_order: bool,
    shape: Vec<usize>,
    data_offset: usize,
}

/// Read a `<U` / `>U` npy file
///
/// # Errors
///
/// Fails on I/O errors, a bad magic string, a non-unicode dtype, or a
/// truncated payload.
pub fn read_unicode_npy(path: &Path) -> DatasetResult<UnicodeArray> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |reason: String| DatasetError::MalformedNpy {
        path: path.to_path_buf(),
        reason,
    };

    let header = parse_header(&bytes).map_err(malformed)?;
    let count: usize = header.shape.iter().product();
    let item_bytes = header.width * 4;
    let data = &bytes[header.data_offset..];
    if data.len() < count * item_bytes {
        return Err(malformed(format!(
            "payload has {} bytes, need {}",
            data.len(),
            count * item_bytes
        )));
    }

    // `<U0` items occupy no bytes and are all empty
    let stored: Vec<String> = if item_bytes == 0 {
        vec![String::new(); count]
    } else {
        data.chunks_exact(item_bytes)
            .take(count)
            .map(|item| decode_utf32(item, header.little_endian))
            .collect::<Result<_, _>>()
            .map_err(malformed)?
    };
    if stored.len() != count {
        return Err(malformed(format!("payload holds {} values, shape needs {count}", stored.len())));
    }

    let values = if header.fortran_order && header.shape.len() > 1 {
        fortran_to_c(&stored, &header.shape)
            .ok_or_else(|| malformed("fortran-order payload does not match shape".to_string()))?
    } else {
        stored
    };

    Ok(UnicodeArray {
        shape: header.shape,
        values,
    })
}

/// Write a 2D array of strings as a little-endian `<U` npy file
///
/// # Errors
///
/// Fails on I/O errors or if `values` does not match `shape`.
pub fn write_unicode_npy(path: &Path, shape: (usize, usize), values: &[String]) -> DatasetResult<()> {
    if values.len() != shape.0 * shape.1 {
        return Err(DatasetError::Shape {
            what: "unicode array",
            expected: format!("{} elements", shape.0 * shape.1),
            got: vec![values.len()],
        });
    }
    let width = values.iter().map(|v| v.chars().count()).max().unwrap_or(0).max(1);

    let mut header = format!(
        "{{'descr': '<U{width}', 'fortran_order': False, 'shape': ({}, {}), }}",
        shape.0, shape.1
    );
    // Pad so the payload starts on a 64-byte boundary, header ends with '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut bytes = Vec::with_capacity(unpadded + values.len() * width * 4 + 64);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    let header_len = u16::try_from(header.len()).map_err(|_| DatasetError::Shape {
        what: "unicode header",
        expected: "at most 65535 bytes".to_string(),
        got: vec![header.len()],
    })?;
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in values {
        let mut n = 0;
        for ch in value.chars() {
            bytes.extend_from_slice(&u32::from(ch).to_le_bytes());
            n += 1;
        }
        for _ in n..width {
            bytes.extend_from_slice(&0u32.to_le_bytes());
        }
    }

    fs::write(path, bytes).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_header(bytes: &[u8]) -> Result<Header, String> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err("missing npy magic".to_string());
    }
    let major = bytes[6];
    let (header_len, start) = if major == 1 {
        (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10)
    } else {
        if bytes.len() < 12 {
            return Err("truncated header length".to_string());
        }
        let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        (len as usize, 12)
    };
    let end = start + header_len;
    let text = bytes
        .get(start..end)
        .map(String::from_utf8_lossy)
        .ok_or_else(|| "truncated header".to_string())?;

    let descr = dict_value(&text, "descr").ok_or("no 'descr' key")?;
    let descr = descr.trim().trim_matches(|c| c == '\'' || c == '"');
    let mut chars = descr.chars();
    let little_endian = match chars.next() {
        Some('<' | '|' | '=') => true,
        Some('>') => false,
        _ => return Err(format!("unsupported descr '{descr}'")),
    };
    if chars.next() != Some('U') {
        return Err(format!("descr '{descr}' is not a unicode dtype"));
    }
    let width: usize = chars
        .as_str()
        .parse()
        .map_err(|_| format!("bad unicode width in '{descr}'"))?;

    let fortran_order = dict_value(&text, "fortran_order")
        .is_some_and(|v| v.trim().starts_with("True"));

    let shape_text = dict_value(&text, "shape").ok_or("no 'shape' key")?;
    let inner = shape_text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| format!("bad shape '{shape_text}'"))?;
    let shape = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('L').parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("bad shape '{inner}'"))?;

    Ok(Header {
        little_endian,
        width,
        fortran_order,
        shape,
        data_offset: end,
    })
}

/// Raw text following `'key':` up to the next top-level separator
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let rest = &header[header.find(&pattern)? + pattern.len()..];
    let rest = rest.trim_start();
    if rest.starts_with('(') {
        let close = rest.find(')')?;
        return Some(&rest[..=close]);
    }
    let end = rest.find([',', '}']).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn decode_utf32(item: &[u8], little_endian: bool) -> Result<String, String> {
    let mut out = String::new();
    for unit in item.chunks_exact(4) {
        let raw = [unit[0], unit[1], unit[2], unit[3]];
        let code = if little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        };
        if code == 0 {
            break;
        }
        out.push(char::from_u32(code).ok_or_else(|| format!("invalid code point {code:#x}"))?);
    }
    Ok(out)
}

fn fortran_to_c(stored: &[String], shape: &[usize]) -> Option<Vec<String>> {
    let count = stored.len();
    let mut out = Vec::with_capacity(count);
    let mut index = vec![0usize; shape.len()];
    for _ in 0..count {
        // Column-major offset of the current row-major index
        let mut offset = 0;
        let mut stride = 1;
        for (i, &dim) in shape.iter().enumerate() {
            offset += index[i] * stride;
            stride *= dim;
        }
        out.push(stored.get(offset)?.clone());

        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    Some(out)
}
