//! Pending block markers and the chain of open blocks.
//!
//! Jump-bearing instructions push Begin/End markers keyed by the logical
//! position where they take effect. The driver asks for the markers that are
//! ready at its cursor and turns them into braces.

/// Block type of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestKind {
    If,
    Else,
    ForEach,
    Switch,
    Case,
    Default,
    /// A `break;` statement; never opens a block.
    SwitchBreak,
    /// `while` and `do ... until` loops.
    Loop,
}

impl NestKind {
    /// Blocks a `break` can leave.
    pub fn is_breakable(&self) -> bool {
        matches!(self, NestKind::Switch | NestKind::Loop | NestKind::ForEach)
    }

    /// Blocks written without braces.
    pub fn is_label_like(&self) -> bool {
        matches!(self, NestKind::Case | NestKind::Default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestFlavor {
    Begin,
    End,
}

/// A pending marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Nest {
    pub kind: NestKind,
    pub flavor: NestFlavor,
    /// Logical position at which the marker is emitted.
    pub position: u32,
    /// Position of the instruction that created the marker.
    pub creator: u32,
    /// Shared by a Begin and its End.
    pub id: usize,
    /// Where the block ends, as known when it was opened.
    pub block_end: u32,
    /// Header or footer text (`if(a)`, `until(b)`, `break;`).
    pub text: Option<String>,
    /// Emitted after the Ends at the same position.
    pub deferred: bool,
}

/// An open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub kind: NestKind,
    pub id: usize,
    pub creator: u32,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Default)]
pub struct NestManager {
    pending: Vec<Nest>,
    chain: Vec<ChainEntry>,
    next_id: usize,
}

impl NestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a Begin marker; returns the id its End must use.
    pub fn push_begin(
        &mut self,
        kind: NestKind,
        position: u32,
        creator: u32,
        block_end: u32,
        text: Option<String>,
    ) -> usize {
        self.push(kind, NestFlavor::Begin, position, creator, block_end, text, false)
    }

    /// Queue a Begin marker emitted after closers at the same position.
    pub fn push_deferred_begin(
        &mut self,
        kind: NestKind,
        position: u32,
        creator: u32,
        block_end: u32,
        text: Option<String>,
    ) -> usize {
        self.push(kind, NestFlavor::Begin, position, creator, block_end, text, true)
    }

    /// Queue the End marker of block `id`.
    pub fn push_end(&mut self, kind: NestKind, id: usize, position: u32, text: Option<String>) {
        let creator = self
            .chain
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.creator)
            .or_else(|| self.pending.iter().find(|n| n.id == id).map(|n| n.creator))
            .unwrap_or(position);
        self.pending.push(Nest {
            kind,
            flavor: NestFlavor::End,
            position,
            creator,
            id,
            block_end: position,
            text,
            deferred: false,
        });
    }

    /// Queue a Begin and its End together.
    pub fn open(
        &mut self,
        kind: NestKind,
        position: u32,
        creator: u32,
        end: u32,
        text: Option<String>,
    ) -> usize {
        let id = self.push_begin(kind, position, creator, end, text);
        self.push_end(kind, id, end, None);
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        kind: NestKind,
        flavor: NestFlavor,
        position: u32,
        creator: u32,
        block_end: u32,
        text: Option<String>,
        deferred: bool,
    ) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Nest {
            kind,
            flavor,
            position,
            creator,
            id,
            block_end,
            text,
            deferred,
        });
        id
    }

    pub fn chain(&self) -> &[ChainEntry] {
        &self.chain
    }

    pub fn innermost(&self) -> Option<&ChainEntry> {
        self.chain.last()
    }

    /// Any open block of `kind`, however deep.
    pub fn is_inside(&self, kind: NestKind) -> bool {
        self.chain.iter().any(|c| c.kind == kind)
    }

    /// Innermost open block whose kind satisfies `pred`.
    pub fn innermost_where(&self, pred: impl Fn(NestKind) -> bool) -> Option<&ChainEntry> {
        self.chain.iter().rev().find(|c| pred(c.kind))
    }

    /// Pending End of block `id`.
    pub fn pending_end(&self, id: usize) -> Option<&Nest> {
        self.pending
            .iter()
            .find(|n| n.id == id && n.flavor == NestFlavor::End)
    }

    /// Id of a pending or open block created at `creator`.
    pub fn find_by_creator(&self, kind: NestKind, creator: u32) -> Option<usize> {
        self.chain
            .iter()
            .find(|c| c.kind == kind && c.creator == creator)
            .map(|c| c.id)
            .or_else(|| {
                self.pending
                    .iter()
                    .find(|n| n.kind == kind && n.creator == creator && n.flavor == NestFlavor::Begin)
                    .map(|n| n.id)
            })
    }

    /// Drop the pending End of block `id`, returning it.
    pub fn cancel_end(&mut self, id: usize) -> Option<Nest> {
        let index = self
            .pending
            .iter()
            .position(|n| n.id == id && n.flavor == NestFlavor::End)?;
        Some(self.pending.remove(index))
    }

    /// Begins ready at `cursor`, in queue order; deferred ones open outermost
    /// block first.
    pub fn take_ready_begins(&mut self, cursor: u32, deferred: bool) -> Vec<Nest> {
        let mut ready = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            let n = &self.pending[i];
            if n.flavor == NestFlavor::Begin && n.deferred == deferred && n.position <= cursor {
                ready.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        if deferred {
            ready.sort_by(|a, b| a.position.cmp(&b.position).then(b.block_end.cmp(&a.block_end)));
        }
        ready
    }

    /// End of the innermost open block, if it is ready at `cursor`.
    pub fn take_ready_end(&mut self, cursor: u32) -> Option<Nest> {
        let top = self.chain.last()?.id;
        let index = self
            .pending
            .iter()
            .position(|n| n.id == top && n.flavor == NestFlavor::End && n.position <= cursor)?;
        Some(self.pending.remove(index))
    }

    /// Outermost open block whose End is ready at `cursor` while blocks
    /// opened inside it are still waiting for theirs.
    pub fn blocked_end(&self, cursor: u32) -> Option<usize> {
        let (_, inner) = self.chain.split_last()?;
        inner
            .iter()
            .map(|c| c.id)
            .find(|&id| self.pending_end(id).is_some_and(|n| n.position <= cursor))
    }

    /// Record that a Begin was emitted.
    pub fn enter(&mut self, nest: &Nest) {
        self.chain.push(ChainEntry {
            kind: nest.kind,
            id: nest.id,
            creator: nest.creator,
            start: nest.position,
            end: nest.block_end,
        });
    }

    /// Remove block `id` and anything opened inside it.
    pub fn leave(&mut self, id: usize) -> Option<ChainEntry> {
        let index = self.chain.iter().rposition(|c| c.id == id)?;
        let entry = self.chain[index];
        self.chain.truncate(index);
        Some(entry)
    }

    /// Take every pending marker, Begins first.
    pub fn drain_pending(&mut self) -> Vec<Nest> {
        let mut all = std::mem::take(&mut self.pending);
        all.sort_by_key(|n| n.flavor == NestFlavor::End);
        all
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_follow_the_chain() {
        let mut m = NestManager::new();
        let outer = m.open(NestKind::If, 4, 0, 20, Some("if(a)".into()));
        let inner = m.open(NestKind::If, 8, 4, 20, Some("if(b)".into()));

        let begins = m.take_ready_begins(8, false);
        assert_eq!(begins.len(), 2);
        for b in &begins {
            m.enter(b);
        }
        assert_eq!(m.innermost().map(|c| c.id), Some(inner));

        assert_eq!(m.take_ready_end(19), None);
        assert_eq!(m.take_ready_end(20).map(|n| n.id), Some(inner));
        m.leave(inner);
        assert_eq!(m.take_ready_end(20).map(|n| n.id), Some(outer));
        m.leave(outer);
        assert!(!m.has_pending());
    }

    #[test]
    fn deferred_begins_open_outermost_first() {
        let mut m = NestManager::new();
        let inner = m.push_deferred_begin(NestKind::Loop, 0, 10, 10, None);
        let outer = m.push_deferred_begin(NestKind::Loop, 0, 20, 20, None);
        assert!(m.take_ready_begins(0, false).is_empty());
        let ids: Vec<_> = m.take_ready_begins(0, true).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![outer, inner]);
    }

    #[test]
    fn innermost_where_skips_other_kinds() {
        let mut m = NestManager::new();
        m.open(NestKind::Switch, 5, 0, 50, None);
        m.open(NestKind::Case, 9, 5, 20, None);
        m.open(NestKind::If, 14, 10, 18, None);
        for b in m.take_ready_begins(14, false) {
            m.enter(&b);
        }
        let breakable = m.innermost_where(|k| k.is_breakable());
        assert_eq!(breakable.map(|c| c.end), Some(50));
        assert!(m.is_inside(NestKind::Case));
        assert!(!m.is_inside(NestKind::ForEach));
    }

    #[test]
    fn outer_end_blocked_by_inner_block() {
        let mut m = NestManager::new();
        let outer = m.open(NestKind::If, 4, 0, 20, Some("if(a)".into()));
        let inner = m.open(NestKind::Switch, 8, 4, 30, Some("switch(b)".into()));
        for b in m.take_ready_begins(8, false) {
            m.enter(&b);
        }

        assert_eq!(m.blocked_end(19), None);
        assert_eq!(m.take_ready_end(20), None);
        assert_eq!(m.blocked_end(20), Some(outer));
        assert_eq!(m.cancel_end(inner).map(|n| n.position), Some(30));
        m.leave(inner);
        assert_eq!(m.blocked_end(20), None);
        assert_eq!(m.take_ready_end(20).map(|n| n.id), Some(outer));
    }

    #[test]
    fn cancel_end_removes_marker() {
        let mut m = NestManager::new();
        let id = m.open(NestKind::If, 3, 0, 12, None);
        assert!(m.pending_end(id).is_some());
        assert_eq!(m.cancel_end(id).map(|n| n.position), Some(12));
        assert!(m.pending_end(id).is_none());
    }
}
