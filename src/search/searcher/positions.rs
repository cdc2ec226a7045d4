//! Positional templates for ordered conjunctions.
//!
//! A template fixes, for every child of a conjunction, the span of phrase
//! positions the child covers. A document satisfies the template when one hit
//! run can be picked per child such that every run starts exactly as far after
//! the previous run's end as the template's spans are apart.

use std::mem;

use crate::error::{PhalanxError, Result};

/// Span of phrase positions covered by one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSlot {
    /// First phrase position covered.
    pub first_pos: u64,
    /// Last phrase position covered.
    pub last_pos: u64,
}

impl TemplateSlot {
    /// Create a slot covering `first_pos..=last_pos`.
    pub fn new(first_pos: u64, last_pos: u64) -> Self {
        TemplateSlot {
            first_pos,
            last_pos,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Slot whose run is being chosen.
    slot: usize,
    /// Next candidate run within the slot.
    next_run: usize,
    /// Last position of the run chosen for the previous slot.
    anchor: u64,
}

/// Validated template plus the scratch state used to check it.
#[derive(Debug, Clone)]
pub struct PhraseTemplate {
    slots: Vec<TemplateSlot>,
    /// Required distance from the end of slot i-1 to the start of slot i.
    offsets: Vec<i64>,
    stack: Vec<Frame>,
}

impl PhraseTemplate {
    /// Validate slots and build a template.
    ///
    /// Slots must be non-empty, each span must be well formed and every slot
    /// must start after the previous one ends.
    pub fn new(slots: Vec<TemplateSlot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(PhalanxError::invalid_template("template has no slots"));
        }

        let mut offsets = Vec::with_capacity(slots.len());
        for (i, slot) in slots.iter().enumerate() {
            if slot.first_pos > slot.last_pos {
                return Err(PhalanxError::invalid_template(format!(
                    "slot {i} starts at {} after it ends at {}",
                    slot.first_pos, slot.last_pos
                )));
            }
            if i == 0 {
                offsets.push(0);
                continue;
            }
            let previous = &slots[i - 1];
            if slot.first_pos <= previous.last_pos {
                return Err(PhalanxError::invalid_template(format!(
                    "slot {i} starts at {} before slot {} ends at {}",
                    slot.first_pos,
                    i - 1,
                    previous.last_pos
                )));
            }
            offsets.push(slot.first_pos as i64 - previous.last_pos as i64);
        }

        let stack = Vec::with_capacity(slots.len());
        Ok(PhraseTemplate {
            slots,
            offsets,
            stack,
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a template has at least one slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The validated slots.
    pub fn slots(&self) -> &[TemplateSlot] {
        &self.slots
    }

    /// Check whether one run per slot can be chained along the template.
    ///
    /// `runs_of(i)` returns the hit runs reported by child `i`. Every
    /// combination is explored, so a run that dead-ends later never hides a
    /// different run of the same slot that would complete the chain.
    pub fn matches<'a, F>(&mut self, runs_of: F) -> bool
    where
        F: Fn(usize) -> &'a [Vec<u64>],
    {
        let slot_count = self.slots.len();

        for first_run in runs_of(0) {
            let Some(&anchor) = first_run.last() else {
                continue;
            };

            self.stack.clear();
            self.stack.push(Frame {
                slot: 1,
                next_run: 0,
                anchor,
            });

            while let Some(frame) = self.stack.last_mut() {
                if frame.slot == slot_count {
                    return true;
                }

                let offset = self.offsets[frame.slot];
                let candidates = runs_of(frame.slot);
                let mut chosen = None;
                while frame.next_run < candidates.len() {
                    let run = &candidates[frame.next_run];
                    frame.next_run += 1;
                    if let (Some(&first), Some(&last)) = (run.first(), run.last()) {
                        if first as i64 - frame.anchor as i64 == offset {
                            chosen = Some(last);
                            break;
                        }
                    }
                }

                let slot = frame.slot;
                match chosen {
                    Some(last) => self.stack.push(Frame {
                        slot: slot + 1,
                        next_run: 0,
                        anchor: last,
                    }),
                    None => {
                        self.stack.pop();
                    }
                }
            }
        }

        false
    }

    /// Approximate size in bytes.
    pub fn size(&self) -> usize {
        mem::size_of::<PhraseTemplate>()
            + self.slots.capacity() * mem::size_of::<TemplateSlot>()
            + self.offsets.capacity() * mem::size_of::<i64>()
            + self.stack.capacity() * mem::size_of::<Frame>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(spans: &[(u64, u64)]) -> PhraseTemplate {
        PhraseTemplate::new(
            spans
                .iter()
                .map(|&(first, last)| TemplateSlot::new(first, last))
                .collect(),
        )
        .unwrap()
    }

    fn check(template: &mut PhraseTemplate, runs: &[Vec<Vec<u64>>]) -> bool {
        template.matches(move |i| runs[i].as_slice())
    }

    #[test]
    fn test_validation() {
        assert!(PhraseTemplate::new(Vec::new()).is_err());
        assert!(PhraseTemplate::new(vec![TemplateSlot::new(3, 2)]).is_err());
        assert!(
            PhraseTemplate::new(vec![TemplateSlot::new(1, 3), TemplateSlot::new(3, 4)]).is_err()
        );
        let ok = PhraseTemplate::new(vec![TemplateSlot::new(4, 4), TemplateSlot::new(6, 8)])
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.slots()[1], TemplateSlot::new(6, 8));
    }

    #[test]
    fn test_gapped_template() {
        // slots at 4, 6..8 and 13..16
        let mut t = template(&[(4, 4), (6, 8), (13, 16)]);

        let runs = vec![
            vec![vec![10]],
            vec![vec![12, 13, 14]],
            vec![vec![19, 20, 21, 22]],
        ];
        assert!(check(&mut t, &runs));

        // third slot one position too early
        let runs = vec![
            vec![vec![10]],
            vec![vec![12, 13, 14]],
            vec![vec![18, 19, 20, 21]],
        ];
        assert!(!check(&mut t, &runs));
    }

    #[test]
    fn test_backtracks_over_dead_ends() {
        let mut t = template(&[(1, 1), (2, 2), (3, 3)]);

        // 5 -> 6 leads nowhere, 9 -> 10 -> 11 completes the chain
        let runs = vec![vec![vec![5], vec![9]], vec![vec![6], vec![10]], vec![vec![11]]];
        assert!(check(&mut t, &runs));

        // a second run for the middle slot rescues the chain
        let mut t = template(&[(1, 1), (2, 3), (4, 4)]);
        let runs = vec![
            vec![vec![1]],
            vec![vec![2, 3], vec![2, 4]],
            vec![vec![5]],
        ];
        assert!(check(&mut t, &runs));
    }

    #[test]
    fn test_single_slot_and_empty_runs() {
        let mut t = template(&[(1, 2)]);
        assert!(check(&mut t, &[vec![vec![7, 8]]]));
        assert!(!check(&mut t, &[vec![]]));
        assert!(!check(&mut t, &[vec![vec![]]]));

        let mut t = template(&[(1, 1), (2, 2)]);
        assert!(!check(&mut t, &[vec![vec![1]], vec![vec![]]]));
    }
}
