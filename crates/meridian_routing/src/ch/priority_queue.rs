use thiserror::Error;

/// Indexed binary min-heap over ids `0..capacity`, allowing priority updates in place
pub(crate) struct PriorityQueue<P> {
    heap: Vec<(usize, P)>,
    positions: Vec<Option<usize>>,
}

#[derive(Error, Debug, PartialEq)]
pub(crate) enum PriorityQueueError {
    #[error("Id {id} is out of bounds, capacity is {capacity}")]
    OutOfBounds { id: usize, capacity: usize },
    #[error("Element {0} is already queued")]
    ElementAlreadyExists(usize),
}

impl<P> PriorityQueue<P>
where
    P: Ord + Copy,
{
    pub fn new(capacity: usize) -> Self {
        PriorityQueue {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.positions.get(id).is_some_and(Option::is_some)
    }

    pub fn push(&mut self, id: usize, priority: P) -> Result<(), PriorityQueueError> {
        if id >= self.positions.len() {
            return Err(PriorityQueueError::OutOfBounds {
                id,
                capacity: self.positions.len(),
            });
        }

        if self.contains(id) {
            return Err(PriorityQueueError::ElementAlreadyExists(id));
        }

        self.heap.push((id, priority));
        let index = self.heap.len() - 1;
        self.positions[id] = Some(index);
        self.sift_up(index);

        Ok(())
    }

    pub fn peek(&self) -> Option<&(usize, P)> {
        self.heap.first()
    }

    pub fn pop(&mut self) -> Option<(usize, P)> {
        if self.heap.is_empty() {
            return None;
        }

        let (id, priority) = self.heap.swap_remove(0);
        self.positions[id] = None;

        if let Some(&(first, _)) = self.heap.first() {
            self.positions[first] = Some(0);
            self.sift_down(0);
        }

        Some((id, priority))
    }

    /// No-op for ids that are not queued
    pub fn update_priority(&mut self, id: usize, priority: P) {
        let Some(index) = self.positions.get(id).copied().flatten() else {
            return;
        };

        let current = self.heap[index].1;
        self.heap[index].1 = priority;

        if priority < current {
            self.sift_up(index);
        } else if priority > current {
            self.sift_down(index);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].0] = Some(a);
        self.positions[self.heap[b].0] = Some(b);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].1 >= self.heap[parent].1 {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = left + 1;

            let mut smallest = index;
            if left < self.heap.len() && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == index {
                break;
            }

            self.swap(index, smallest);
            index = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pop() {
        let mut queue = PriorityQueue::<i64>::new(10);
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn pops_in_priority_order() {
        let mut queue = PriorityQueue::new(5);
        queue.push(1, 5).unwrap();
        queue.push(2, 3).unwrap();
        queue.push(3, 4).unwrap();
        queue.push(0, -2).unwrap();

        assert_eq!(queue.peek(), Some(&(0, -2)));
        assert_eq!(queue.pop(), Some((0, -2)));
        assert_eq!(queue.pop(), Some((2, 3)));
        assert_eq!(queue.pop(), Some((3, 4)));
        assert_eq!(queue.pop(), Some((1, 5)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn rejects_duplicates_and_out_of_bounds() {
        let mut queue = PriorityQueue::new(2);
        queue.push(1, 5).unwrap();
        assert_eq!(queue.push(1, 4), Err(PriorityQueueError::ElementAlreadyExists(1)));
        assert_eq!(
            queue.push(2, 4),
            Err(PriorityQueueError::OutOfBounds { id: 2, capacity: 2 })
        );
        assert!(queue.contains(1));
        assert!(!queue.contains(0));
        assert!(!queue.contains(7));
    }

    #[test]
    fn update_priority_both_ways() {
        let mut queue = PriorityQueue::new(5);
        queue.push(1, 5).unwrap();
        queue.push(2, 3).unwrap();
        queue.push(3, 4).unwrap();

        queue.update_priority(1, 2);
        queue.update_priority(2, 10);
        queue.update_priority(4, 0);

        assert_eq!(queue.pop(), Some((1, 2)));
        assert_eq!(queue.pop(), Some((3, 4)));
        assert_eq!(queue.pop(), Some((2, 10)));
    }
}
