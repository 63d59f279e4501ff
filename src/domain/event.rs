use super::{Serial, Transaction};

/// Change notification emitted by a `Ledger` after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Added(Transaction),
    Deleted(Serial),
    /// The whole state was replaced by an imported snapshot
    Replaced { count: usize },
    Cleared,
}

/// Handle returned by `Ledger::subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub type Listener = Box<dyn FnMut(&LedgerEvent)>;

/// Registered listeners, notified in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, event: &LedgerEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
