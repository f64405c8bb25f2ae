use crate::MissionState;

/// Append-only record of committed mission states with a navigation cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History<M, R> {
    entries: Vec<MissionState<M, R>>,
    cursor: Option<usize>,
}

impl<M, R> History<M, R> {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
        }
    }

    /// Number of committed states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry the cursor points at, if any entry exists.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Committed state stored at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MissionState<M, R>> {
        self.entries.get(index)
    }

    /// Iterator over committed states, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MissionState<M, R>> {
        self.entries.iter()
    }

    /// Reports whether the cursor can move toward older entries.
    #[must_use]
    pub fn can_go_previous(&self) -> bool {
        matches!(self.cursor, Some(index) if index > 0)
    }

    /// Reports whether the cursor can move toward newer entries.
    #[must_use]
    pub fn can_go_next(&self) -> bool {
        matches!(self.cursor, Some(index) if index + 1 < self.entries.len())
    }

    pub(crate) fn step_previous(&mut self) -> Option<(usize, &MissionState<M, R>)> {
        if !self.can_go_previous() {
            return None;
        }
        let index = self.cursor? - 1;
        self.cursor = Some(index);
        self.entries.get(index).map(|entry| (index, entry))
    }

    pub(crate) fn step_next(&mut self) -> Option<(usize, &MissionState<M, R>)> {
        if !self.can_go_next() {
            return None;
        }
        let index = self.cursor? + 1;
        self.cursor = Some(index);
        self.entries.get(index).map(|entry| (index, entry))
    }
}

impl<M: PartialEq, R: PartialEq> History<M, R> {
    /// Index of a committed state equal to `state`, if one exists.
    #[must_use]
    pub fn position(&self, state: &MissionState<M, R>) -> Option<usize> {
        self.entries.iter().position(|entry| entry == state)
    }

    /// Records `state` unless an equal entry exists, then points the cursor at it.
    ///
    /// Returns the entry index and whether a new entry was appended.
    pub(crate) fn record(&mut self, state: MissionState<M, R>) -> (usize, bool) {
        if let Some(index) = self.position(&state) {
            self.cursor = Some(index);
            return (index, false);
        }
        self.entries.push(state);
        let index = self.entries.len() - 1;
        self.cursor = Some(index);
        (index, true)
    }
}

impl<M, R> Default for History<M, R> {
    fn default() -> Self {
        Self::new()
    }
}
