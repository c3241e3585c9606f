//! Rollback-capable allocation tracking for deserialization.
//!
//! Decoding a composite value can fail halfway through, after strings,
//! nested records, and container elements have already been built. A
//! [`Transaction`] records each such value as it is constructed; on success
//! the values are moved out and the transaction committed, on failure the
//! transaction drops everything still staged in reverse construction order.
//! Dropping an uncommitted transaction performs the rollback, so a plain `?`
//! return unwinds a failed decode without leaks.
//!
//! A transaction also enforces an optional byte budget: decoders claim bytes
//! before allocating, which bounds how much memory a malicious input can
//! demand regardless of the lengths it declares.

use crate::Error;
use std::any::Any;
use std::marker::PhantomData;

/// Typed handle to a value staged in a [`Transaction`].
#[derive(Debug)]
pub struct Slot<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

/// The rollback-capable allocator used during decode to guarantee
/// all-or-nothing construction.
pub struct Transaction {
    slots: Vec<Option<Box<dyn Any>>>,
    limit: Option<usize>,
    claimed: usize,
    committed: bool,
}

impl Transaction {
    /// Opens a transaction with no allocation budget.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            limit: None,
            claimed: 0,
            committed: false,
        }
    }

    /// Opens a transaction that refuses to claim more than `limit` bytes in
    /// total.
    pub fn with_budget(limit: usize) -> Self {
        let mut txn = Self::new();
        txn.limit = Some(limit);
        txn
    }

    /// Claims `n` bytes against the budget. Decoders call this before
    /// allocating storage whose size is dictated by the input.
    pub fn claim(&mut self, n: usize) -> Result<(), Error> {
        if let Some(limit) = self.limit {
            let remaining = limit.saturating_sub(self.claimed);
            if n > remaining {
                return Err(Error::BudgetExceeded {
                    requested: n,
                    remaining,
                });
            }
        }
        self.claimed = self.claimed.saturating_add(n);
        Ok(())
    }

    /// Returns `n` bytes to the budget, e.g. after scratch storage is freed.
    pub fn release(&mut self, n: usize) {
        self.claimed = self.claimed.saturating_sub(n);
    }

    /// Total bytes claimed so far.
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Stages an owned value. If the transaction rolls back before the value
    /// is taken, the value is dropped (its destructor obligation runs) in
    /// reverse staging order.
    pub fn stage<T: Any>(&mut self, value: T) -> Slot<T> {
        let index = self.slots.len();
        self.slots.push(Some(Box::new(value)));
        Slot {
            index,
            _marker: PhantomData,
        }
    }

    /// Mutable access to a staged value.
    ///
    /// # Panics
    ///
    /// Panics if the slot was already taken or belongs to another
    /// transaction.
    pub fn get_mut<T: Any>(&mut self, slot: &Slot<T>) -> &mut T {
        self.slots
            .get_mut(slot.index)
            .and_then(|s| s.as_deref_mut())
            .and_then(|v| v.downcast_mut::<T>())
            .expect("slot is live and belongs to this transaction")
    }

    /// Moves a staged value out of the transaction, ending its tracking. The
    /// emptied slot stays behind as an inert tombstone.
    ///
    /// # Panics
    ///
    /// Panics if the slot was already taken or belongs to another
    /// transaction.
    pub fn take<T: Any>(&mut self, slot: Slot<T>) -> T {
        let boxed = self
            .slots
            .get_mut(slot.index)
            .and_then(Option::take)
            .expect("slot is live and belongs to this transaction");
        match boxed.downcast::<T>() {
            Ok(value) => *value,
            Err(_) => panic!("slot type does not match staged value"),
        }
    }

    /// Number of values still staged.
    pub fn outstanding(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Drops every still-staged value in reverse staging order and resets the
    /// claimed budget. Idempotent; the transaction stays usable afterwards.
    pub fn rollback(&mut self) {
        while let Some(slot) = self.slots.pop() {
            drop(slot);
        }
        self.claimed = 0;
    }

    /// Discards tracking without destroying anything: every staged value must
    /// already have been taken into the caller's object graph.
    pub fn commit(mut self) {
        debug_assert_eq!(
            self.outstanding(),
            0,
            "committed transaction still holds staged values"
        );
        self.committed = true;
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records its label at drop time so tests can observe unwind order.
    struct Tracked {
        label: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.label);
        }
    }

    fn tracked(label: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Tracked {
        Tracked {
            label,
            log: log.clone(),
        }
    }

    #[test]
    fn test_rollback_runs_drops_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut txn = Transaction::new();
        txn.stage(tracked("a", &log));
        txn.stage(tracked("b", &log));
        txn.stage(tracked("c", &log));
        assert_eq!(txn.outstanding(), 3);
        txn.rollback();
        assert_eq!(txn.outstanding(), 0);
        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);

        // Idempotent.
        txn.rollback();
        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_drop_of_uncommitted_transaction_rolls_back() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut txn = Transaction::new();
            txn.stage(tracked("x", &log));
            txn.stage(tracked("y", &log));
        }
        assert_eq!(*log.borrow(), vec!["y", "x"]);
    }

    #[test]
    fn test_take_removes_from_tracking() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut txn = Transaction::new();
        let keep = txn.stage(tracked("keep", &log));
        txn.stage(tracked("discard", &log));
        let kept = txn.take(keep);
        assert_eq!(txn.outstanding(), 1);
        txn.rollback();
        assert_eq!(*log.borrow(), vec!["discard"]);
        drop(kept);
        assert_eq!(*log.borrow(), vec!["discard", "keep"]);
    }

    #[test]
    fn test_commit_after_taking_everything() {
        let mut txn = Transaction::new();
        let slot = txn.stage(String::from("value"));
        let value = txn.take(slot);
        txn.commit();
        assert_eq!(value, "value");
    }

    #[test]
    fn test_get_mut() {
        let mut txn = Transaction::new();
        let slot = txn.stage(vec![1u8, 2]);
        txn.get_mut(&slot).push(3);
        assert_eq!(txn.take(slot), vec![1, 2, 3]);
        txn.commit();
    }

    #[test]
    fn test_budget_enforced() {
        let mut txn = Transaction::with_budget(10);
        txn.claim(6).unwrap();
        assert!(matches!(
            txn.claim(5),
            Err(Error::BudgetExceeded {
                requested: 5,
                remaining: 4
            })
        ));
        txn.release(2);
        txn.claim(5).unwrap();
        assert_eq!(txn.claimed(), 9);
    }

    #[test]
    fn test_rollback_resets_budget() {
        let mut txn = Transaction::with_budget(4);
        txn.claim(4).unwrap();
        txn.rollback();
        txn.claim(4).unwrap();
    }

    #[test]
    fn test_unbounded_budget() {
        let mut txn = Transaction::new();
        txn.claim(usize::MAX).unwrap();
        txn.claim(usize::MAX).unwrap();
    }

    #[test]
    fn test_nested_pair_assembly() {
        // Build one key/value pair in an inner transaction, move both halves
        // into the permanent structure, then commit the scratch.
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut outer: Vec<(Tracked, Tracked)> = Vec::new();
        let mut scratch = Transaction::new();
        let k = scratch.stage(tracked("k", &log));
        let v = scratch.stage(tracked("v", &log));
        let pair = (scratch.take(k), scratch.take(v));
        outer.push(pair);
        scratch.commit();
        assert!(log.borrow().is_empty());
        drop(outer);
        assert_eq!(*log.borrow(), vec!["k", "v"]);
    }
}
