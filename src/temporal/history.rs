use crate::buffer::ColourBuffer;

/// Two history slots with alternating ownership. Each frame reads the slot
/// committed last frame and writes the other one, so a slot is never read and
/// written by the same pass.
pub struct HistoryBuffers {
    slots: [ColourBuffer; 2],
    latest: usize,
    valid: bool,
}

impl HistoryBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            slots: [ColourBuffer::new(width, height), ColourBuffer::new(width, height)],
            latest: 0,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn latest(&self) -> &ColourBuffer {
        &self.slots[self.latest]
    }

    /// Last frame's history (if any) and the slot this frame writes.
    pub fn split(&mut self) -> (Option<&ColourBuffer>, &mut ColourBuffer) {
        let (first, second) = self.slots.split_at_mut(1);
        let (read, write) = if self.latest == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        (self.valid.then_some(read), write)
    }

    /// Makes the slot written by [`split`](Self::split) the new history.
    pub fn commit(&mut self) {
        self.latest = 1 - self.latest;
        self.valid = true;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn first_frame_has_no_history() {
        let mut history = HistoryBuffers::new(2, 2);
        let (previous, _) = history.split();
        assert!(previous.is_none());
    }

    #[test]
    fn slots_alternate() {
        let mut history = HistoryBuffers::new(1, 1);

        let (_, write) = history.split();
        write.set(0, 0, Vector3::new(1.0, 0.0, 0.0));
        history.commit();
        assert_eq!(history.latest().get(0, 0), Vector3::new(1.0, 0.0, 0.0));

        let (previous, write) = history.split();
        assert_eq!(previous.map(|p| p.get(0, 0)), Some(Vector3::new(1.0, 0.0, 0.0)));
        write.set(0, 0, Vector3::new(0.0, 1.0, 0.0));
        history.commit();

        assert_eq!(history.latest().get(0, 0), Vector3::new(0.0, 1.0, 0.0));
        let (previous, _) = history.split();
        assert_eq!(previous.map(|p| p.get(0, 0)), Some(Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn invalidate_hides_history() {
        let mut history = HistoryBuffers::new(1, 1);
        history.commit();
        history.invalidate();
        assert!(!history.is_valid());
        assert!(history.split().0.is_none());
    }
}
