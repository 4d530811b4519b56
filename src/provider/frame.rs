// =============================================================================
// Untyped provider tables
// =============================================================================
//
// The provider speaks in loosely-shaped tables whose column names differ per
// venue. `RawFrame` holds a daily series (date index + numeric columns) and
// `ListingFrame` holds an instrument listing (rows of string fields). Column
// clean-up happens later in `series::normalize`.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// One named numeric column, aligned with `RawFrame::dates`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Daily series as returned by the provider. Missing cells are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl RawFrame {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Builder-style column append. Values are padded with `NaN` or truncated
    /// so every column stays aligned with the date index.
    pub fn with_column(mut self, name: impl Into<String>, mut values: Vec<f64>) -> Self {
        values.resize(self.dates.len(), f64::NAN);
        let name = name.into();
        self.columns.retain(|c| c.name != name);
        self.columns.push(Column { name, values });
        self
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    #[cfg(test)]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Remove `name`. Returns whether a column was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        self.columns.len() != before
    }

    /// Rename `from` to `to`, replacing any existing `to` column so only one
    /// survives. Returns whether `from` was present.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if !self.has_column(from) {
            return false;
        }
        if from != to {
            self.columns.retain(|c| c.name != to);
        }
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == from) {
            col.name = to.to_string();
        }
        true
    }
}

/// Instrument listing: one map of field name to value per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFrame {
    pub rows: Vec<BTreeMap<String, String>>,
}

impl ListingFrame {
    pub fn from_rows<I, R, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
