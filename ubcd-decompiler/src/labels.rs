use std::collections::{BTreeMap, BTreeSet};

/// Where a label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrigin {
    /// A state label from a label table.
    State,
    /// Synthesized for a local `goto`.
    Goto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub position: u32,
    pub origin: LabelOrigin,
}

/// Name of a synthesized label for a jump target.
pub fn goto_label_name(position: u32) -> String {
    format!("J0x{position:04X}")
}

/// Labels of one decompile pass, keyed by target position.
#[derive(Debug, Default)]
pub struct LabelTable {
    pending: BTreeMap<u32, Label>,
    emitted: BTreeMap<u32, String>,
    missed: BTreeSet<u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label; the first label registered at a position wins.
    pub fn register(&mut self, name: String, position: u32, origin: LabelOrigin) {
        if self.emitted.contains_key(&position) {
            return;
        }
        self.pending.entry(position).or_insert(Label {
            name,
            position,
            origin,
        });
    }

    /// Label name for a `goto` at `from` targeting `target`, creating one if
    /// needed. Targets already walked past without a label are remembered as
    /// missed.
    pub fn goto_target(&mut self, target: u32, from: u32) -> String {
        if let Some(name) = self.emitted.get(&target) {
            return name.clone();
        }
        if let Some(label) = self.pending.get(&target) {
            return label.name.clone();
        }
        let name = goto_label_name(target);
        if target <= from {
            self.missed.insert(target);
        } else {
            self.register(name.clone(), target, LabelOrigin::Goto);
        }
        name
    }

    /// Take the label to emit before the instruction at `position`.
    pub fn take(&mut self, position: u32) -> Option<Label> {
        let label = self.pending.remove(&position)?;
        self.emitted.insert(position, label.name.clone());
        Some(label)
    }

    /// Labels never emitted, in position order.
    pub fn drain_pending(&mut self) -> Vec<Label> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Backward targets that had no label when they were walked.
    pub fn missed(&self) -> &BTreeSet<u32> {
        &self.missed
    }
}
