use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use arbor_engine::SurfaceId;

use super::model::{Tab, TabId};

/// Ordered tabs plus the worktree/tab selection.
///
/// Worktree paths are stored standardized. Whenever `selected_tab` is set
/// it names a tab of `selected_worktree`.
#[derive(Debug, Default)]
pub(crate) struct TabState {
    tabs: Vec<Tab>,
    selected_tab: Option<TabId>,
    selected_worktree: Option<PathBuf>,
    last_selected: HashMap<PathBuf, TabId>,
}

impl TabState {
    pub(crate) fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub(crate) fn tabs_mut(&mut self) -> &mut [Tab] {
        &mut self.tabs
    }

    pub(crate) fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id() == id)
    }

    pub(crate) fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.id() == id)
    }

    pub(crate) fn tab_by_surface_mut(
        &mut self,
        surface: SurfaceId,
    ) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.surface() == surface)
    }

    pub(crate) fn push(&mut self, tab: Tab) {
        self.tabs.push(tab);
    }

    pub(crate) fn remove(&mut self, id: TabId) -> Option<Tab> {
        let index = self.tabs.iter().position(|tab| tab.id() == id)?;
        Some(self.tabs.remove(index))
    }

    pub(crate) fn selected_tab(&self) -> Option<TabId> {
        self.selected_tab
    }

    pub(crate) fn selected_worktree(&self) -> Option<&Path> {
        self.selected_worktree.as_deref()
    }

    /// Select `tab` inside `worktree`.
    pub(crate) fn select(&mut self, worktree: PathBuf, tab: Option<TabId>) {
        self.selected_worktree = Some(worktree);
        self.selected_tab = tab;
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected_worktree = None;
        self.selected_tab = None;
    }

    pub(crate) fn set_selected_tab(&mut self, tab: Option<TabId>) {
        self.selected_tab = tab;
    }

    pub(crate) fn last_selected(&self, worktree: &Path) -> Option<TabId> {
        self.last_selected.get(worktree).copied()
    }

    pub(crate) fn remember(&mut self, worktree: PathBuf, tab: TabId) {
        self.last_selected.insert(worktree, tab);
    }

    /// Drop the memory for `worktree` if it points at `tab`.
    pub(crate) fn forget(&mut self, worktree: &Path, tab: TabId) {
        if self.last_selected.get(worktree) == Some(&tab) {
            self.last_selected.remove(worktree);
        }
    }

    /// Tabs of `worktree`, in tab order.
    pub(crate) fn tabs_in<'a>(
        &'a self,
        worktree: &'a Path,
    ) -> impl Iterator<Item = &'a Tab> + 'a {
        self.tabs.iter().filter(move |tab| tab.worktree() == worktree)
    }

    /// Ids of the tabs in the selected worktree.
    pub(crate) fn visible_ids(&self) -> Vec<TabId> {
        match self.selected_worktree.as_deref() {
            Some(worktree) => self.tabs_in(worktree).map(Tab::id).collect(),
            None => Vec::new(),
        }
    }

    /// Unique worktrees with open tabs, in first-opened order.
    pub(crate) fn active_worktrees(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.tabs
            .iter()
            .filter(|tab| seen.insert(tab.worktree()))
            .map(|tab| tab.worktree().to_path_buf())
            .collect()
    }

    /// Whether the selection points at live tabs of the right worktree.
    pub(crate) fn is_consistent(&self) -> bool {
        match (self.selected_tab, self.selected_worktree.as_deref()) {
            (None, _) => true,
            (Some(id), Some(worktree)) => {
                self.tab(id).is_some_and(|tab| tab.worktree() == worktree)
            },
            (Some(_), None) => false,
        }
    }
}
