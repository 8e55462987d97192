//! Workspaces (virtual desktops)

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Snapshot of a workspace as reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub index: usize,
    pub name: String,
}

impl WorkspaceInfo {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// A tracked workspace, identified by its index
pub struct Workspace {
    index: usize,
    name: RefCell<String>,
}

pub type WorkspaceHandle = Rc<Workspace>;

impl Workspace {
    pub(crate) fn new(info: WorkspaceInfo) -> WorkspaceHandle {
        Rc::new(Self {
            index: info.index,
            name: RefCell::new(info.name),
        })
    }

    pub fn number(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Returns true if the name changed
    pub(crate) fn set_name(&self, name: &str) -> bool {
        let mut current = self.name.borrow_mut();
        if *current == name {
            return false;
        }
        *current = name.to_string();
        true
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("index", &self.index)
            .field("name", &*self.name.borrow())
            .finish()
    }
}
