use std::collections::BTreeMap;

pub type TabId = u32;

/// Toolbar icon flavour for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Inactive,
    Active,
}

impl IconVariant {
    pub fn for_state(active: bool) -> Self {
        if active {
            IconVariant::Active
        } else {
            IconVariant::Inactive
        }
    }

    /// `(size, path)` pairs for every icon size the extension ships.
    pub fn paths(self) -> [(u32, String); 3] {
        let suffix = match self {
            IconVariant::Inactive => "",
            IconVariant::Active => "-active",
        };
        [16, 48, 128].map(|size| (size, format!("icons/icon{size}{suffix}.png")))
    }
}

/// Background-side bookkeeping of which tabs are in reading mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabRegistry {
    states: BTreeMap<TabId, bool>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a broadcast from a page and returns the icon to show.
    pub fn state_changed(&mut self, tab: TabId, active: bool) -> IconVariant {
        self.states.insert(tab, active);
        IconVariant::for_state(active)
    }

    /// A finished navigation always starts outside reading mode.
    pub fn tab_reloaded(&mut self, tab: TabId) -> IconVariant {
        self.states.remove(&tab);
        IconVariant::Inactive
    }

    pub fn tab_closed(&mut self, tab: TabId) {
        self.states.remove(&tab);
    }

    pub fn is_active(&self, tab: TabId) -> bool {
        self.states.get(&tab).copied().unwrap_or(false)
    }

    pub fn tracked_tabs(&self) -> usize {
        self.states.len()
    }
}
