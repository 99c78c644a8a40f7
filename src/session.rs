use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

/// Identifies one request issued through [`PreviewSession::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

struct Applied<T> {
    generation: u64,
    value: Arc<T>,
}

/// "Last request wins" holder for results of overlapping requests.
///
/// Every request takes a ticket from [`begin`](Self::begin). A result is only stored if its
/// ticket is still the newest one issued; anything older is dropped on arrival, so a slow
/// request can never overwrite what a newer one already applied.
pub struct PreviewSession<T> {
    generation: AtomicU64,
    applied: Mutex<Option<Applied<T>>>,
}

impl<T> Default for PreviewSession<T> {
    fn default() -> Self {
        Self {
            generation: AtomicU64::new(0),
            applied: Mutex::new(None),
        }
    }
}

impl<T> PreviewSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `value` if `ticket` is still current. Returns whether it was stored.
    pub fn apply(&self, ticket: RequestTicket, value: T) -> bool {
        let mut slot = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.generation.load(Ordering::SeqCst),
                "dropping stale result"
            );
            return false;
        }
        if slot.as_ref().is_some_and(|a| a.generation >= ticket.0) {
            return false;
        }
        *slot = Some(Applied {
            generation: ticket.0,
            value: Arc::new(value),
        });
        true
    }

    pub fn current(&self) -> Option<Arc<T>> {
        let slot = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|a| Arc::clone(&a.value))
    }

    /// Generation of the value returned by [`current`](Self::current).
    pub fn applied_generation(&self) -> Option<u64> {
        let slot = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|a| a.generation)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread};

    use super::*;

    #[test]
    fn tickets_increase_and_supersede() {
        let s = PreviewSession::<u32>::new();
        let a = s.begin();
        let b = s.begin();
        assert!(b > a);
        assert!(!s.is_current(a));
        assert!(s.is_current(b));
    }

    #[test]
    fn stale_result_is_dropped_even_if_it_arrives_last() {
        let s = PreviewSession::new();
        let a = s.begin();
        let b = s.begin();
        assert!(s.apply(b, "b"));
        assert!(!s.apply(a, "a"));
        assert_eq!(*s.current().unwrap(), "b");
        assert_eq!(s.applied_generation(), Some(b.generation()));
    }

    #[test]
    fn stale_result_is_dropped_before_newer_resolves() {
        let s = PreviewSession::new();
        let a = s.begin();
        let b = s.begin();
        assert!(!s.apply(a, 1));
        assert!(s.current().is_none());
        assert!(s.apply(b, 2));
        assert_eq!(*s.current().unwrap(), 2);
    }

    #[test]
    fn same_ticket_applies_once() {
        let s = PreviewSession::new();
        let a = s.begin();
        assert!(s.apply(a, 1));
        assert!(!s.apply(a, 2));
        assert_eq!(*s.current().unwrap(), 1);
    }

    #[test]
    fn concurrent_requests_keep_only_the_newest() {
        let s = Arc::new(PreviewSession::new());
        let (tx, rx) = mpsc::channel();

        let tickets: Vec<_> = (0..8).map(|_| s.begin()).collect();
        let newest = *tickets.last().unwrap();

        let handles: Vec<_> = tickets
            .into_iter()
            .rev()
            .map(|t| {
                let s = Arc::clone(&s);
                let tx = tx.clone();
                thread::spawn(move || {
                    let stored = s.apply(t, t.generation());
                    tx.send((t, stored)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        drop(tx);

        for (t, stored) in rx {
            assert_eq!(stored, t == newest);
        }
        assert_eq!(*s.current().unwrap(), newest.generation());
    }
}
