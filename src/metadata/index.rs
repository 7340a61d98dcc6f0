use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::descriptor::{ColumnDescriptor, ValueRange};
use super::MetadataError;

/// Which naming scheme a column lookup uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Instrument channel name (`$PnN`)
    Channel,
    /// Assigned marker label (`$PnS`)
    Marker,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Channel => write!(f, "channel"),
            ColumnType::Marker => write!(f, "marker"),
        }
    }
}

/// Selects the descriptor field a [`NameIndex`] is keyed on
pub trait ColumnField {
    /// Which column type this field answers for
    const TYPE: ColumnType;

    /// The name this field contributes for one descriptor
    fn name(descriptor: &ColumnDescriptor) -> &str;
}

/// Index keyed on [`ColumnDescriptor::channel`]
#[derive(Debug)]
pub struct ChannelField;

/// Index keyed on [`ColumnDescriptor::marker`]
#[derive(Debug)]
pub struct MarkerField;

impl ColumnField for ChannelField {
    const TYPE: ColumnType = ColumnType::Channel;

    fn name(descriptor: &ColumnDescriptor) -> &str {
        &descriptor.channel
    }
}

impl ColumnField for MarkerField {
    const TYPE: ColumnType = ColumnType::Marker;

    fn name(descriptor: &ColumnDescriptor) -> &str {
        &descriptor.marker
    }
}

/// Case-normalized key used by every name lookup in this crate
pub(crate) fn normalize(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive name -> position map over one descriptor field
///
/// Empty names are not indexed. When a name repeats, the first position wins.
pub struct NameIndex<F> {
    map: HashMap<String, usize>,
    _field: PhantomData<fn() -> F>,
}

impl<F> fmt::Debug for NameIndex<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameIndex").field("map", &self.map).finish()
    }
}

impl<F> Clone for NameIndex<F> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            _field: PhantomData,
        }
    }
}

impl<F> Default for NameIndex<F> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            _field: PhantomData,
        }
    }
}

impl<F: ColumnField> NameIndex<F> {
    /// Build the index from scratch
    pub fn build(params: &[ColumnDescriptor]) -> Self {
        let mut map = HashMap::with_capacity(params.len());
        for (position, descriptor) in params.iter().enumerate() {
            let name = F::name(descriptor);
            if name.is_empty() {
                continue;
            }
            map.entry(normalize(name)).or_insert(position);
        }
        Self {
            map,
            _field: PhantomData,
        }
    }

    /// Position of `name`, compared case-insensitively
    pub fn get(&self, name: &str) -> Option<usize> {
        self.map.get(&normalize(name)).copied()
    }

    /// Number of indexed names
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Ordered column descriptors together with their channel and marker indices
///
/// Every mutator rebuilds both indices before returning, so the channel index
/// size always equals the column count after a successful call.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    params: Vec<ColumnDescriptor>,
    channels: NameIndex<ChannelField>,
    markers: NameIndex<MarkerField>,
}

impl PartialEq for ColumnSet {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

impl ColumnSet {
    /// Create a column set, rejecting empty and duplicate channel names
    pub fn new(params: Vec<ColumnDescriptor>) -> Result<Self, MetadataError> {
        ensure_unique(params.iter().map(|d| d.channel.as_str()))?;
        let mut set = Self {
            params,
            ..Self::default()
        };
        set.rebuild();
        Ok(set)
    }

    fn rebuild(&mut self) {
        self.channels = NameIndex::build(&self.params);
        self.markers = NameIndex::build(&self.params);
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether there are no columns
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The descriptors in column order
    pub fn params(&self) -> &[ColumnDescriptor] {
        &self.params
    }

    /// Descriptor at a position
    pub fn get(&self, position: usize) -> Option<&ColumnDescriptor> {
        self.params.get(position)
    }

    /// Whether the indices match the descriptor list
    pub fn is_indexed(&self) -> bool {
        self.channels.len() == self.params.len()
    }

    /// Number of channel index entries
    pub fn index_len(&self) -> usize {
        self.channels.len()
    }

    /// Names for one column type, in column order
    pub fn names(&self, col_type: ColumnType) -> Vec<String> {
        self.params
            .iter()
            .map(|d| match col_type {
                ColumnType::Channel => d.channel.clone(),
                ColumnType::Marker => d.marker.clone(),
            })
            .collect()
    }

    /// Position of a column, looked up case-insensitively
    pub fn position(&self, name: &str, col_type: ColumnType) -> Result<usize, MetadataError> {
        let hit = if self.is_indexed() {
            match col_type {
                ColumnType::Channel => self.channels.get(name),
                ColumnType::Marker => self.markers.get(name),
            }
        } else {
            self.scan(name, col_type)
        };
        hit.ok_or_else(|| MetadataError::NotFound(format!("{} '{}'", col_type, name)))
    }

    // Stale index: answer from the descriptors directly.
    fn scan(&self, name: &str, col_type: ColumnType) -> Option<usize> {
        let key = normalize(name);
        self.params.iter().position(|d| {
            let candidate = match col_type {
                ColumnType::Channel => &d.channel,
                ColumnType::Marker => &d.marker,
            };
            !candidate.is_empty() && normalize(candidate) == key
        })
    }

    /// Replace every descriptor; the column count may not change
    pub fn replace(&mut self, params: Vec<ColumnDescriptor>) -> Result<(), MetadataError> {
        if params.len() != self.params.len() {
            return Err(MetadataError::SizeMismatch {
                expected: self.params.len(),
                found: params.len(),
            });
        }
        ensure_unique(params.iter().map(|d| d.channel.as_str()))?;
        self.params = params;
        self.rebuild();
        Ok(())
    }

    /// Replace every channel name positionally
    pub fn set_channels(&mut self, channels: &[String]) -> Result<(), MetadataError> {
        if channels.len() != self.params.len() {
            return Err(MetadataError::SizeMismatch {
                expected: self.params.len(),
                found: channels.len(),
            });
        }
        ensure_unique(channels.iter().map(String::as_str))?;
        for (descriptor, channel) in self.params.iter_mut().zip(channels) {
            descriptor.channel = channel.clone();
        }
        self.rebuild();
        Ok(())
    }

    /// Rename one channel, returning its position
    pub fn rename(&mut self, old: &str, new: &str) -> Result<usize, MetadataError> {
        let position = self.position(old, ColumnType::Channel)?;
        ensure_named(position, new)?;
        if let Some(other) = self.scan(new, ColumnType::Channel) {
            if other != position {
                return Err(MetadataError::DuplicateName(new.to_string()));
            }
        }
        self.params[position].channel = new.to_string();
        self.rebuild();
        Ok(position)
    }

    /// Apply several renames at once, returning the touched positions
    ///
    /// The resulting channel list is validated as a whole, so swapping two
    /// names in one call is allowed.
    pub fn rename_many(&mut self, renames: &[(String, String)]) -> Result<Vec<usize>, MetadataError> {
        let mut channels = self.names(ColumnType::Channel);
        let mut touched = Vec::with_capacity(renames.len());
        for (old, new) in renames {
            let position = self.position(old, ColumnType::Channel)?;
            channels[position] = new.clone();
            touched.push(position);
        }
        self.set_channels(&channels)?;
        Ok(touched)
    }

    /// Set the marker of a channel, returning its position
    pub fn set_marker(&mut self, channel: &str, marker: &str) -> Result<usize, MetadataError> {
        let position = self.position(channel, ColumnType::Channel)?;
        self.params[position].marker = marker.to_string();
        self.rebuild();
        Ok(position)
    }

    /// Overwrite the instrument range of a column
    pub fn set_instrument_range(&mut self, position: usize, range: ValueRange) -> Result<(), MetadataError> {
        let descriptor = self
            .params
            .get_mut(position)
            .ok_or_else(|| MetadataError::NotFound(format!("column position {}", position)))?;
        descriptor.instrument_range = range;
        Ok(())
    }

    /// Overwrite every data range, in column order
    pub fn set_data_ranges(&mut self, ranges: Vec<ValueRange>) -> Result<(), MetadataError> {
        if ranges.len() != self.params.len() {
            return Err(MetadataError::SizeMismatch {
                expected: self.params.len(),
                found: ranges.len(),
            });
        }
        for (descriptor, range) in self.params.iter_mut().zip(ranges) {
            descriptor.data_range = range;
        }
        Ok(())
    }

    /// New column set holding the selected positions in the given order
    pub fn select(&self, positions: &[usize]) -> Result<Self, MetadataError> {
        let params = positions
            .iter()
            .map(|&p| {
                self.params
                    .get(p)
                    .cloned()
                    .ok_or_else(|| MetadataError::NotFound(format!("column position {}", p)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(params)
    }
}

// Every channel must be indexable: the channel index size is the validity check.
fn ensure_named(position: usize, name: &str) -> Result<(), MetadataError> {
    if name.is_empty() {
        return Err(MetadataError::InvalidName(format!(
            "column {} has an empty channel name",
            position + 1
        )));
    }
    Ok(())
}

fn ensure_unique<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Result<(), MetadataError> {
    let mut seen = HashSet::new();
    for (position, name) in names.into_iter().enumerate() {
        ensure_named(position, name)?;
        if !seen.insert(normalize(name)) {
            return Err(MetadataError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}
