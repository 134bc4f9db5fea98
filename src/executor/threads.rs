use crate::automata::program::InstPtr;
use crate::errors::Overflow;
use crate::semiring::Semiring;

/// The live threads at one input offset, at most one per instruction.
///
/// Storage is dense and indexed by instruction address; `live` records which
/// entries are set so that clearing costs only what was used. With `nslots`
/// zero no capture rows are kept at all.
pub struct Threads<W> {
    weights: Vec<Option<W>>,
    slots: Vec<Option<usize>>,
    nslots: usize,
    live: Vec<InstPtr>,
}

impl<W: Clone> Threads<W> {
    pub fn new(len: usize, nslots: usize) -> Threads<W> {
        Threads {
            weights: vec![None; len],
            slots: vec![None; len * nslots],
            nslots,
            live: Vec::with_capacity(len),
        }
    }

    pub fn live(&self) -> &[InstPtr] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn weight(&self, pc: InstPtr) -> Option<&W> {
        self.weights[pc].as_ref()
    }

    pub fn slots(&self, pc: InstPtr) -> &[Option<usize>] {
        &self.slots[pc * self.nslots..(pc + 1) * self.nslots]
    }

    pub fn slots_mut(&mut self, pc: InstPtr) -> &mut [Option<usize>] {
        &mut self.slots[pc * self.nslots..(pc + 1) * self.nslots]
    }

    /// Adds weight `w` into `pc` and leaves its captures alone. Returns true
    /// if `pc` was not live before.
    pub fn add<S>(&mut self, semiring: &S, pc: InstPtr, w: &W) -> Result<bool, Overflow>
    where
        S: Semiring<Weight = W>,
    {
        let sum = match self.weights[pc] {
            None => {
                self.weights[pc] = Some(w.clone());
                self.live.push(pc);
                return Ok(true);
            }
            Some(ref kept) => semiring.add(kept, w)?,
        };
        self.weights[pc] = Some(sum);
        Ok(false)
    }

    /// Adds a path of weight `w` carrying `slots` into `pc`. Returns true if
    /// `pc` was not live before.
    pub fn merge<S>(
        &mut self,
        semiring: &S,
        pc: InstPtr,
        w: &W,
        slots: &[Option<usize>],
    ) -> Result<bool, Overflow>
    where
        S: Semiring<Weight = W>,
    {
        let (sum, take) = match self.weights[pc] {
            None => {
                self.weights[pc] = Some(w.clone());
                self.slots_mut(pc).copy_from_slice(slots);
                self.live.push(pc);
                return Ok(true);
            }
            Some(ref kept) => (semiring.add(kept, w)?, semiring.prefer(kept, w)),
        };
        if take {
            self.slots_mut(pc).copy_from_slice(slots);
        }
        self.weights[pc] = Some(sum);
        Ok(false)
    }

    pub fn clear(&mut self) {
        for pc in self.live.drain(..) {
            self.weights[pc] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Threads;
    use crate::semiring::{Counting, Extent, LeftmostLongest};
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_adds_weights() {
        let mut threads = Threads::new(4, 2);
        let c = Counting::exact();
        assert_eq!(threads.merge(&c, 2, &3, &[Some(0), None]), Ok(true));
        assert_eq!(threads.merge(&c, 2, &4, &[Some(1), Some(1)]), Ok(false));
        assert_eq!(threads.weight(2), Some(&7));
        assert_eq!(threads.slots(2), &[Some(0), None]);
        assert_eq!(threads.live(), &[2]);

        threads.clear();
        assert!(threads.is_empty());
        assert_eq!(threads.weight(2), None);
    }

    #[test]
    fn add_leaves_captures_alone() {
        let mut threads = Threads::new(3, 0);
        let c = Counting::exact();
        assert_eq!(threads.add(&c, 1, &2), Ok(true));
        assert_eq!(threads.add(&c, 1, &5), Ok(false));
        assert_eq!(threads.weight(1), Some(&7));
        assert!(threads.slots(1).is_empty());
    }

    #[test]
    fn merge_takes_preferred_slots() {
        let mut threads = Threads::new(1, 2);
        let ll = LeftmostLongest;
        let late = Extent::Span { start: 2, end: 3 };
        let early = Extent::Span { start: 0, end: 3 };
        threads.merge(&ll, 0, &late, &[Some(2), None]).unwrap();
        threads.merge(&ll, 0, &early, &[Some(0), None]).unwrap();
        assert_eq!(threads.weight(0), Some(&early));
        assert_eq!(threads.slots(0), &[Some(0), None]);
    }
}
