use std::collections::{HashSet, VecDeque};

use reporter_core::{config::OverflowPolicy, ReportId, ResultRecord};

/// What happened to an id offered to the [`PendingQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Appended at the tail.
    Queued,
    /// Already pending; the queue is unchanged.
    Duplicate,
    /// Appended after evicting the returned oldest id.
    Evicted(ReportId),
    /// Queue full under `reject_new`; the id was not added.
    Rejected,
}

/// FIFO of report ids awaiting a result.
///
/// An id is held at most once. Capacity is unbounded unless set, in which
/// case the overflow policy decides between evicting the head and refusing
/// the newcomer.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: VecDeque<ReportId>,
    members: HashSet<ReportId>,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
}

impl PendingQueue {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            overflow,
            ..Self::default()
        }
    }

    pub fn with_limit(capacity: Option<usize>, overflow: OverflowPolicy) -> Self {
        match capacity {
            Some(cap) => Self::bounded(cap, overflow),
            None => Self::unbounded(),
        }
    }

    /// Offer `id` at the tail.
    pub fn push(&mut self, id: ReportId) -> Admission {
        if self.members.contains(&id) {
            return Admission::Duplicate;
        }

        let mut evicted = None;
        if self.capacity.is_some_and(|cap| self.items.len() >= cap) {
            match self.overflow {
                OverflowPolicy::RejectNew => return Admission::Rejected,
                OverflowPolicy::DropOldest => evicted = self.pop(),
            }
        }

        self.members.insert(id.clone());
        self.items.push_back(id);
        match evicted {
            Some(old) => Admission::Evicted(old),
            None => Admission::Queued,
        }
    }

    /// Remove and return the oldest id.
    pub fn pop(&mut self) -> Option<ReportId> {
        let id = self.items.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ReportId) -> bool {
        self.members.contains(id)
    }

    /// Ids in poll order, head first.
    pub fn iter(&self) -> impl Iterator<Item = &ReportId> {
        self.items.iter()
    }
}

/// Observable scheduler events, mirrored onto the optional event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Created(ReportId),
    AlreadyExists(ReportId),
    /// Dropped from a full queue to make room.
    Evicted(ReportId),
    /// Refused by a full queue.
    Rejected(ReportId),
    Saved {
        report_id: ReportId,
        record: ResultRecord,
    },
    Requeued(ReportId),
    NotFound(ReportId),
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// 1-based tick number.
    pub tick: u64,
    pub create_fired: bool,
    /// The id the poll action attempted, if the queue was non-empty.
    pub polled: Option<ReportId>,
    pub events: Vec<ReportEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ReportId {
        ReportId::from(s)
    }

    #[test]
    fn fifo_order() {
        let mut q = PendingQueue::unbounded();
        q.push(id("a"));
        q.push(id("b"));
        q.push(id("c"));
        assert_eq!(q.pop(), Some(id("a")));
        assert_eq!(q.pop(), Some(id("b")));
        assert_eq!(q.pop(), Some(id("c")));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn duplicate_push_is_refused() {
        let mut q = PendingQueue::unbounded();
        assert_eq!(q.push(id("a")), Admission::Queued);
        assert_eq!(q.push(id("a")), Admission::Duplicate);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn popped_id_can_be_requeued() {
        let mut q = PendingQueue::unbounded();
        q.push(id("a"));
        q.push(id("b"));
        let head = q.pop().unwrap();
        assert!(!q.contains(&head));
        assert_eq!(q.push(head), Admission::Queued);
        assert_eq!(q.iter().cloned().collect::<Vec<_>>(), vec![id("b"), id("a")]);
    }

    #[test]
    fn drop_oldest_evicts_head() {
        let mut q = PendingQueue::bounded(2, OverflowPolicy::DropOldest);
        q.push(id("a"));
        q.push(id("b"));
        assert_eq!(q.push(id("c")), Admission::Evicted(id("a")));
        assert_eq!(q.iter().cloned().collect::<Vec<_>>(), vec![id("b"), id("c")]);
        assert!(!q.contains(&id("a")));
    }

    #[test]
    fn reject_new_keeps_existing() {
        let mut q = PendingQueue::bounded(2, OverflowPolicy::RejectNew);
        q.push(id("a"));
        q.push(id("b"));
        assert_eq!(q.push(id("c")), Admission::Rejected);
        assert_eq!(q.len(), 2);
        assert!(!q.contains(&id("c")));
    }

    #[test]
    fn requeue_after_pop_fits_full_queue() {
        let mut q = PendingQueue::bounded(1, OverflowPolicy::RejectNew);
        q.push(id("a"));
        let head = q.pop().unwrap();
        assert_eq!(q.push(head), Admission::Queued);
    }
}
