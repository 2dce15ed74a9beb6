//! Fixed-capacity circular buffer shared by both queue modes.

use crate::Error;

pub(crate) struct Ring<T> {
    slots: Box<[Option<T>]>,
    /// Read cursor.
    head: usize,
    /// Write cursor, always `(head + count) % capacity`.
    tail: usize,
    count: usize,
}

impl<T> Ring<T> {
    pub(crate) fn with_capacity(capacity: u16) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidParameter("capacity must be positive"));
        }

        let capacity = usize::from(capacity);
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure)?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    /// Writes at the tail, handing the value back if every slot is taken.
    pub(crate) fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }

        self.slots[self.tail] = Some(value);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
        debug_assert_eq!(self.tail, (self.head + self.count) % self.slots.len());
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        debug_assert!(value.is_some(), "occupied slot was empty");
        value
    }

    /// Empties the buffer and rewinds both cursors to zero.
    pub(crate) fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
        self.tail = 0;
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    #[cfg(test)]
    fn cursors(&self) -> (usize, usize) {
        (self.head, self.tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity() {
        assert!(matches!(
            Ring::<u8>::with_capacity(0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn wraps_around() {
        let mut r = Ring::with_capacity(3).unwrap();

        for round in 0..10 {
            r.push(round).unwrap();
            r.push(round + 100).unwrap();
            assert_eq!(r.pop(), Some(round));
            assert_eq!(r.pop(), Some(round + 100));
            assert!(r.is_empty());
        }

        let (head, tail) = r.cursors();
        assert_eq!(head, tail);
        assert_eq!(head, 20 % 3);
    }

    #[test]
    fn full_hands_value_back() {
        let mut r = Ring::with_capacity(2).unwrap();
        r.push("a").unwrap();
        r.push("b").unwrap();
        assert_eq!(r.push("c"), Err("c"));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn clear_rewinds() {
        let mut r = Ring::with_capacity(4).unwrap();
        r.push(1).unwrap();
        r.push(2).unwrap();
        r.push(3).unwrap();
        r.pop();

        r.clear();
        assert_eq!(r.cursors(), (0, 0));
        assert!(r.is_empty());

        r.clear();
        assert_eq!(r.cursors(), (0, 0));
        assert_eq!(r.capacity(), 4);
    }
}
