use crate::metadata::MetaCategory;

/// Persistence state of one metadata category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaState {
    /// Cache matches the store
    #[default]
    Clean,
    /// Cache changed since the last flush or load
    Dirty,
}

/// Per-category dirty state of a disk frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlags([MetaState; 3]);

impl DirtyFlags {
    /// All categories clean
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a category dirty
    pub fn mark(&mut self, category: MetaCategory) {
        self.0[category.slot()] = MetaState::Dirty;
    }

    /// Mark a category clean
    pub fn clear(&mut self, category: MetaCategory) {
        self.0[category.slot()] = MetaState::Clean;
    }

    /// Mark every category clean
    pub fn clear_all(&mut self) {
        self.0 = [MetaState::Clean; 3];
    }

    /// State of one category
    pub fn state(&self, category: MetaCategory) -> MetaState {
        self.0[category.slot()]
    }

    /// Whether a category is dirty
    pub fn is_dirty(&self, category: MetaCategory) -> bool {
        self.state(category) == MetaState::Dirty
    }

    /// Whether any category is dirty
    pub fn any(&self) -> bool {
        self.0.contains(&MetaState::Dirty)
    }

    /// Dirty categories in flush order
    pub fn dirty_categories(&self) -> Vec<MetaCategory> {
        MetaCategory::ALL
            .into_iter()
            .filter(|&c| self.is_dirty(c))
            .collect()
    }
}
