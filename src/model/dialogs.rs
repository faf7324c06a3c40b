use std::collections::BTreeMap;

/// The prompt shown when an anonymous user tries to vote or submit.
pub const SIGN_IN_DIALOG: &str = "sign-in";

/// Open/closed state of dialogs, keyed by an arbitrary identifier.
/// Unknown identifiers are closed; an entry is created the first time one is used.
/// Navigation clears everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogStates(BTreeMap<String, bool>);

impl DialogStates {
    fn set(&mut self, id: &str, open: bool) {
        self.0.insert(id.to_string(), open);
    }

    pub fn open(&mut self, id: &str) {
        self.set(id, true);
    }

    pub fn close(&mut self, id: &str) {
        self.set(id, false);
    }

    /// Identifiers of all open dialogs, sorted.
    pub fn open_ids(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, open)| **open)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Forget every dialog.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}
