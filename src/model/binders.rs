use std::collections::BTreeSet;

/// Allow-list of HLA ids predicted to bind a peptide. Empty means "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinderList {
    ids: BTreeSet<String>,
}

impl BinderList {
    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl<S: Into<String>> FromIterator<S> for BinderList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
