//! Virtual-clock event loop for the page.
//!
//! Tasks run in due-time order; ties run in scheduling order. The clock only
//! moves when [`crate::Page::advance`] or [`crate::Page::tick`] is called, so
//! toast animations and deferred replies are deterministic under test.

use super::Page;
use std::collections::BTreeMap;

pub type Task = Box<dyn FnOnce(&mut Page)>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimerId(u64);

#[derive(Default)]
pub struct Timers {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), Task>,
}

impl Timers {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((self.now_ms.saturating_add(delay_ms), seq), task);
        TimerId(seq)
    }

    /// Cancel a scheduled task. Returns false when it already ran.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let key = self.queue.keys().find(|(_, seq)| *seq == id.0).copied();
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Pop the earliest task due at or before `until`, moving the clock to it.
    pub(crate) fn pop_due(&mut self, until: u64) -> Option<Task> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if due > until {
            return None;
        }
        let task = self.queue.remove(&(due, seq))?;
        self.now_ms = self.now_ms.max(due);
        Some(task)
    }

    pub(crate) fn settle_clock(&mut self, until: u64) {
        self.now_ms = self.now_ms.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn tasks_run_in_due_then_schedule_order() {
        let mut page = Page::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(20, "late"), (5, "early"), (5, "early-second"), (0, "now")] {
            let seen = Rc::clone(&seen);
            page.timers
                .set_timeout(delay, Box::new(move |_| seen.borrow_mut().push(label)));
        }

        page.advance(10);
        assert_eq!(*seen.borrow(), vec!["now", "early", "early-second"]);
        assert_eq!(page.timers.now_ms(), 10);

        page.advance(10);
        assert_eq!(seen.borrow().last(), Some(&"late"));
        assert_eq!(page.timers.pending(), 0);
    }

    #[test]
    fn cleared_timer_never_runs() {
        let mut page = Page::default();
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        let id = page
            .timers
            .set_timeout(1, Box::new(move |_| *flag.borrow_mut() = true));
        assert!(page.timers.clear_timeout(id));
        assert!(!page.timers.clear_timeout(id));
        page.advance(5);
        assert!(!*ran.borrow());
    }

    #[test]
    fn tasks_scheduled_during_advance_run_when_due() {
        let mut page = Page::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let outer = Rc::clone(&seen);
        page.timers.set_timeout(
            10,
            Box::new(move |page| {
                outer.borrow_mut().push(page.timers.now_ms());
                let inner = Rc::clone(&outer);
                page.timers.set_timeout(
                    5,
                    Box::new(move |page| inner.borrow_mut().push(page.timers.now_ms())),
                );
            }),
        );
        page.advance(12);
        assert_eq!(*seen.borrow(), vec![10]);
        page.advance(3);
        assert_eq!(*seen.borrow(), vec![10, 15]);
    }
}
