use serde::{Deserialize, Serialize};

/// Keyword holding the number of parameters
pub const PARAMETER_COUNT_KEYWORD: &str = "$PAR";

/// `$P<n>N` keyword for a 0-based column position
pub fn channel_keyword(position: usize) -> String {
    format!("$P{}N", position + 1)
}

/// `flowCore_$P<n>Rmin` keyword for a 0-based column position
pub fn range_min_keyword(position: usize) -> String {
    format!("flowCore_$P{}Rmin", position + 1)
}

/// `flowCore_$P<n>Rmax` keyword for a 0-based column position
pub fn range_max_keyword(position: usize) -> String {
    format!("flowCore_$P{}Rmax", position + 1)
}

/// Ordered instrument keyword pairs
///
/// Duplicate names are kept as stored; lookups return the first
/// case-insensitive match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keywords(Vec<(String, String)>);

impl Keywords {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no pairs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs in stored order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Iterate over `(name, value)` in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Value of the first pair whose name matches case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|i| self.0[i].1.as_str())
    }

    /// Replace the first match, or append a new pair
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.find(&name) {
            Some(i) => self.0[i].1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Remove every pair matching `name`, returning how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before - self.0.len()
    }

    /// Rewrite the per-parameter keyword families after a column subset
    ///
    /// `positions` lists the kept 0-based source columns in their new order.
    /// `$P<n>*` and `flowCore_$P<n>*` entries are renumbered to the new
    /// position, entries of dropped columns are removed, and `$PAR` is set to
    /// the new column count.
    pub fn renumber_parameters(&self, positions: &[usize]) -> Self {
        let mut out = Vec::with_capacity(self.0.len());
        let mut moved: Vec<Vec<(String, String)>> = vec![Vec::new(); positions.len()];

        for (name, value) in &self.0 {
            if name.eq_ignore_ascii_case(PARAMETER_COUNT_KEYWORD) {
                out.push((name.clone(), positions.len().to_string()));
                continue;
            }
            match parse_parameter_keyword(name) {
                Some((prefix, number, suffix)) => {
                    // The same source column may be selected more than once.
                    for (new_position, &source) in positions.iter().enumerate() {
                        if source + 1 == number {
                            moved[new_position].push((
                                format!("{}{}{}", prefix, new_position + 1, suffix),
                                value.clone(),
                            ));
                        }
                    }
                }
                None => out.push((name.clone(), value.clone())),
            }
        }

        out.extend(moved.into_iter().flatten());
        Self(out)
    }
}

/// Split `$P12N` / `flowCore_$P3Rmax` into prefix, 1-based number and suffix
fn parse_parameter_keyword(name: &str) -> Option<(&str, usize, &str)> {
    let lower = name.to_ascii_lowercase();
    let prefix_len = if lower.starts_with("flowcore_$p") {
        "flowcore_$p".len()
    } else if lower.starts_with("$p") {
        2
    } else {
        return None;
    };

    let rest = &name[prefix_len..];
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let suffix = &rest[digits..];
    if !suffix.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let number = rest[..digits].parse().ok()?;
    Some((&name[..prefix_len], number, suffix))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Keywords {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Vec<(String, String)>> for Keywords {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}
