//! Index range selectors for array, matrix and string values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common_error::{ModelError, ModelResult, ensure};

use super::{Array, Variant};

/// A per-dimension selection of inclusive index bounds.
///
/// Text form: `2`, `1:4`, or comma-separated per dimension such as `0:1,2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericRange {
    ranges: Vec<(u32, u32)>,
}

impl NumericRange {
    /// Select a single index in one dimension.
    pub fn index(i: u32) -> Self {
        Self {
            ranges: vec![(i, i)],
        }
    }

    /// Select an inclusive span in one dimension.
    pub fn span(low: u32, high: u32) -> ModelResult<Self> {
        ensure!(low < high, InvalidIndexRange: "{low}:{high} is not increasing");
        Ok(Self {
            ranges: vec![(low, high)],
        })
    }

    /// The inclusive bounds per dimension.
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// Number of dimensions selected.
    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// Select the addressed part of `value`.
    ///
    /// The upper bound of a dimension is clipped to the value's extent; a
    /// lower bound outside the extent, or a dimension count that differs from
    /// the value's, is `IndexOutOfRange`.
    pub fn apply(&self, value: &Variant) -> ModelResult<Variant> {
        match value {
            Variant::Array(array) => self.apply_array(array),
            Variant::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (low, high) = self.single_dimension(chars.len())?;
                Ok(Variant::String(chars[low..=high].iter().collect()))
            }
            Variant::ByteString(bytes) => {
                let (low, high) = self.single_dimension(bytes.len())?;
                Ok(Variant::ByteString(bytes[low..=high].to_vec()))
            }
            other => Err(ModelError::index_out_of_range(format!(
                "{} value has no indexable dimensions",
                other.type_name()
            ))),
        }
    }

    /// Replace the addressed slice of a one-dimensional array with `source`.
    pub fn write_into(&self, target: &mut Variant, source: &Variant) -> ModelResult<()> {
        let Variant::Array(target) = target else {
            return Err(ModelError::index_out_of_range("write target is not an array"));
        };
        ensure!(target.rank() == 1, IndexOutOfRange: "partial writes need a one-dimensional array");
        let (low, high) = self.single_dimension(target.values.len())?;
        ensure!(
            (high as u32) == self.ranges[0].1,
            IndexOutOfRange: "range {} exceeds {} elements",
            self,
            target.values.len()
        );
        let Variant::Array(source) = source else {
            return Err(ModelError::incompatible("partial write needs an array value"));
        };
        ensure!(
            source.values.len() == high - low + 1,
            IndexOutOfRange: "range {} selects {} elements, got {}",
            self,
            high - low + 1,
            source.values.len()
        );
        ensure!(
            source.value_type == target.value_type,
            IncompatibleDataType: "cannot write {} elements into {} array",
            source.value_type,
            target.value_type
        );
        target.values.splice(low..=high, source.values.iter().cloned());
        Ok(())
    }

    fn single_dimension(&self, len: usize) -> ModelResult<(usize, usize)> {
        ensure!(
            self.ranges.len() == 1,
            IndexOutOfRange: "range {} has {} dimensions, value has 1",
            self,
            self.ranges.len()
        );
        let (low, high) = self.ranges[0];
        let (low, high) = (low as usize, high as usize);
        ensure!(low < len, IndexOutOfRange: "index {low} outside length {len}");
        Ok((low, high.min(len - 1)))
    }

    fn apply_array(&self, array: &Array) -> ModelResult<Variant> {
        ensure!(
            array.is_well_formed(),
            IndexOutOfRange: "dimensions {:?} do not cover {} values",
            array.dimensions(),
            array.values.len()
        );
        let dims = array.dimensions();
        ensure!(
            self.ranges.len() == dims.len(),
            IndexOutOfRange: "range {} has {} dimensions, value has {}",
            self,
            self.ranges.len(),
            dims.len()
        );

        let mut bounds = Vec::with_capacity(dims.len());
        for (&(low, high), &extent) in self.ranges.iter().zip(&dims) {
            ensure!(low < extent, IndexOutOfRange: "index {low} outside dimension {extent}");
            bounds.push((low as usize, high.min(extent - 1) as usize));
        }

        if dims.len() == 1 {
            let (low, high) = bounds[0];
            let values = array
                .values
                .get(low..=high)
                .ok_or_else(|| ModelError::index_out_of_range(format!("range {self} outside array")))?;
            return Ok(Array::new(array.value_type, values.to_vec()).into());
        }

        // Row-major walk over the selected sub-matrix.
        let mut values = Vec::new();
        let mut cursor: Vec<usize> = bounds.iter().map(|(low, _)| *low).collect();
        loop {
            let flat = cursor
                .iter()
                .zip(&dims)
                .fold(0usize, |acc, (i, extent)| acc * (*extent as usize) + i);
            let value = array
                .values
                .get(flat)
                .ok_or_else(|| ModelError::index_out_of_range(format!("flat index {flat} outside array")))?;
            values.push(value.clone());

            let mut axis = cursor.len();
            loop {
                if axis == 0 {
                    let shape = bounds.iter().map(|(l, h)| (h - l + 1) as u32).collect();
                    return Ok(Array::matrix(array.value_type, values, shape)?.into());
                }
                axis -= 1;
                if cursor[axis] < bounds[axis].1 {
                    cursor[axis] += 1;
                    break;
                }
                cursor[axis] = bounds[axis].0;
            }
        }
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (low, high)) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if low == high {
                write!(f, "{low}")?;
            } else {
                write!(f, "{low}:{high}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for NumericRange {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| ModelError::invalid_index_range(format!("bad index '{part}' in '{s}'")))
        };
        let mut ranges = Vec::new();
        for dimension in s.split(',') {
            let range = match dimension.split_once(':') {
                Some((low, high)) => {
                    let (low, high) = (parse(low)?, parse(high)?);
                    ensure!(low < high, InvalidIndexRange: "{low}:{high} is not increasing");
                    (low, high)
                }
                None => {
                    let i = parse(dimension)?;
                    (i, i)
                }
            };
            ranges.push(range);
        }
        Ok(Self { ranges })
    }
}
