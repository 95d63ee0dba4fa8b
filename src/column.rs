//! Typed dataset contents.
//!
//! Catalogue datasets hold either one integer, one float, or a fixed-width
//! float vector per subhalo row. [`Column`] keeps the whole dataset;
//! [`PropertyValue`] is the value of a single row.

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// Contents of one dataset, one entry per catalogue row.
///
/// Deserialization rejects vector columns whose values do not split into
/// whole rows.
///
/// # Examples
///
/// ```
/// use eagle_db::Column;
///
/// let pos = Column::float_vector(3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(pos.len(), 2);
/// assert_eq!(pos.width(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    try_from = "RawColumn"
)]
pub enum Column {
    /// One integer per row.
    Int(Vec<i64>),
    /// One float per row.
    Float(Vec<f64>),
    /// Row-major `rows x width` values.
    FloatVector {
        /// Components per row.
        width: usize,
        /// Flattened values, `width` per row.
        values: Vec<f64>,
    },
}

/// Wire form of [`Column`], checked before conversion.
#[derive(Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum RawColumn {
    Int(Vec<i64>),
    Float(Vec<f64>),
    FloatVector { width: usize, values: Vec<f64> },
}

impl TryFrom<RawColumn> for Column {
    type Error = StorageError;

    fn try_from(raw: RawColumn) -> Result<Self, Self::Error> {
        match raw {
            RawColumn::Int(v) => Ok(Self::Int(v)),
            RawColumn::Float(v) => Ok(Self::Float(v)),
            RawColumn::FloatVector { width, values } => Self::float_vector(width, values),
        }
    }
}

impl Column {
    /// Builds a vector column, checking that `values` splits evenly into rows.
    pub fn float_vector(width: usize, values: Vec<f64>) -> Result<Self, StorageError> {
        let column = Self::FloatVector { width, values };
        column.validate()?;
        Ok(column)
    }

    /// Checks that a vector column has a non-zero width and whole rows.
    pub fn validate(&self) -> Result<(), StorageError> {
        match self {
            Self::FloatVector { width, values } if *width == 0 || values.len() % width != 0 => {
                Err(StorageError::Backend(format!(
                    "{} values cannot be split into rows of width {width}",
                    values.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::FloatVector { width, values } => values.len() / (*width).max(1),
        }
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of components per row (1 for scalar columns).
    #[must_use]
    pub const fn width(&self) -> usize {
        match self {
            Self::Int(_) | Self::Float(_) => 1,
            Self::FloatVector { width, .. } => *width,
        }
    }

    /// Returns true if every row holds a single value.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.width() == 1
    }

    /// Integer values, if this is an integer column.
    #[must_use]
    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Float values, if this is a one-dimensional float column.
    #[must_use]
    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar values widened to `f64`, or `None` for columns with more than
    /// one component per row.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Float(v) => Some(v.clone()),
            Self::FloatVector { width: 1, values } => Some(values.clone()),
            Self::FloatVector { .. } => None,
        }
    }

    /// Returns the value stored at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<PropertyValue> {
        match self {
            Self::Int(v) => v.get(row).copied().map(PropertyValue::Int),
            Self::Float(v) => v.get(row).copied().map(PropertyValue::Float),
            Self::FloatVector { width, values } => {
                let start = row.checked_mul(*width)?;
                let end = start.checked_add(*width)?;
                values
                    .get(start..end)
                    .map(|s| PropertyValue::Vector(s.to_vec()))
            }
        }
    }

    /// Gathers `rows` (in the given order) into a new column of the same kind.
    pub fn select(&self, rows: &[usize]) -> Result<Self, StorageError> {
        let len = self.len();
        if let Some(&bad) = rows.iter().find(|&&r| r >= len) {
            return Err(StorageError::RowOutOfRange { row: bad, len });
        }
        Ok(match self {
            Self::Int(v) => Self::Int(rows.iter().map(|&r| v[r]).collect()),
            Self::Float(v) => Self::Float(rows.iter().map(|&r| v[r]).collect()),
            Self::FloatVector { width, values } => {
                let mut out = Vec::with_capacity(rows.len() * width);
                for &r in rows {
                    out.extend_from_slice(&values[r * width..(r + 1) * width]);
                }
                Self::FloatVector {
                    width: *width,
                    values: out,
                }
            }
        })
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::FloatVector { .. } => "float_vector",
        }
    }
}

/// Value of a single catalogue row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Components of a vector value.
    Vector(Vec<f64>),
}

impl PropertyValue {
    /// Scalar value widened to `f64`; `None` for vectors.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Vector(_) => None,
        }
    }

    /// Components, if this is a vector value.
    #[must_use]
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Scalar header attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Integer attribute.
    Int(i64),
    /// Float attribute.
    Float(f64),
}

impl AttributeValue {
    /// Value widened to `f64`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
