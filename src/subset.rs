use ahash::AHashMap;

use crate::error::{check_len, Result};

/// The items relevant to one user, with their ground-truth values.
///
/// Any identifier not in the set is irrelevant. Membership is a hash lookup.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    lookup: AHashMap<String, usize>,
    ids: Vec<String>,
    values: Vec<f64>,
}

impl TargetSet {
    pub fn new<S: AsRef<str>>(ids: &[S], values: &[f64]) -> Result<Self> {
        check_len(ids.len(), values.len())?;
        Ok(Self::from_pairs(
            ids.iter().map(|id| id.as_ref()).zip(values.iter().copied()),
        ))
    }

    /// Build from `(id, value)` pairs. A repeated id keeps its last value.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut set = TargetSet::default();
        for (id, value) in pairs {
            set.insert(id, value);
        }
        set
    }

    /// Implicit feedback: every id is relevant with value 1.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Self {
        Self::from_pairs(ids.iter().map(|id| (id.as_ref(), 1.0)))
    }

    pub(crate) fn insert(&mut self, id: &str, value: f64) {
        match self.lookup.get(id) {
            Some(&pos) => self.values[pos] = value,
            None => {
                self.lookup.insert(id.to_owned(), self.ids.len());
                self.ids.push(id.to_owned());
                self.values.push(value);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.lookup.get(id).map(|&pos| self.values[pos])
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
