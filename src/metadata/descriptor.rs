use serde::{Deserialize, Serialize};

/// A (min, max) pair for one column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl ValueRange {
    /// Create a range from its bounds
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range spanned by the finite values of `values`, `(0, 0)` when there are none
    pub fn of_values<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Self {
        let mut range: Option<(f64, f64)> = None;
        for &v in values.into_iter().filter(|v| v.is_finite()) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range.map(|(lo, hi)| Self::new(lo, hi)).unwrap_or_default()
    }

    /// The bounds as a tuple
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl From<(f64, f64)> for ValueRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// Per-column parameter descriptor
///
/// Position in the descriptor list is the matrix column index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Instrument channel name, unique within a frame
    pub channel: String,
    /// Biological marker label, may be empty
    pub marker: String,
    /// Range the instrument can record
    pub instrument_range: ValueRange,
    /// Range observed in the stored events
    pub data_range: ValueRange,
}

impl ColumnDescriptor {
    /// Create a descriptor with an empty marker and zeroed ranges
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    /// Set the marker label
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the instrument range
    pub fn with_instrument_range(mut self, min: f64, max: f64) -> Self {
        self.instrument_range = ValueRange::new(min, max);
        self
    }

    /// Set the data range
    pub fn with_data_range(mut self, min: f64, max: f64) -> Self {
        self.data_range = ValueRange::new(min, max);
        self
    }
}
