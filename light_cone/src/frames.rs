//! Reference frame forest
//!
//! Each frame is an event reached by an observer departing from its source
//! frame. Frames form a forest rooted at the origin; a frame can only be
//! created strictly inside its source's future light cone, so cycles are
//! impossible by construction and every source index precedes its children.

use crate::relativity;

/// An event in the diagram, causally linked to the frame it departed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    pub x: f64,
    pub t: f64,
    /// Index of the causal parent; None only for the origin
    pub source: Option<usize>,
}

impl ReferenceFrame {
    pub fn origin() -> Self {
        Self {
            x: 0.0,
            t: 0.0,
            source: None,
        }
    }
}

/// The editable set of reference frames
#[derive(Debug, Clone)]
pub struct Diagram {
    pub frames: Vec<ReferenceFrame>,
}

impl Diagram {
    pub fn new() -> Self {
        Self {
            frames: vec![ReferenceFrame::origin()],
        }
    }

    /// Replace the whole diagram with a prebuilt chain (demo scenarios)
    pub fn from_frames(frames: Vec<ReferenceFrame>) -> Self {
        if frames.is_empty() {
            return Self::new();
        }
        Self { frames }
    }

    /// Add a frame inside the future light cone of `source`.
    /// Returns the new index, or None if the event is not reachable.
    pub fn add_frame(&mut self, x: f64, t: f64, source: usize) -> Option<usize> {
        let src = self.frames.get(source)?;
        if !relativity::is_reachable_from(x, t, src) {
            return None;
        }

        self.frames.push(ReferenceFrame {
            x,
            t,
            source: Some(source),
        });
        Some(self.frames.len() - 1)
    }

    /// Whether a frame could be moved to (x, t) without breaking causal
    /// links to its source or to any of its children
    pub fn can_move_frame(&self, index: usize, x: f64, t: f64) -> bool {
        if index == 0 {
            // The origin anchors the diagram
            return false;
        }
        let Some(frame) = self.frames.get(index) else {
            return false;
        };

        if let Some(source) = frame.source {
            let src = self.frames[source];
            if !relativity::is_reachable_from(x, t, &src) {
                return false;
            }
        }

        let moved = ReferenceFrame {
            x,
            t,
            source: frame.source,
        };
        self.frames
            .iter()
            .filter(|f| f.source == Some(index))
            .all(|child| relativity::is_reachable_from(child.x, child.t, &moved))
    }

    /// Move a frame if the move keeps every causal link valid
    pub fn move_frame(&mut self, index: usize, x: f64, t: f64) -> bool {
        if !self.can_move_frame(index, x, t) {
            return false;
        }
        self.frames[index].x = x;
        self.frames[index].t = t;
        true
    }

    /// Remove a frame and every frame causally descended from it, then
    /// renumber the survivors so indices stay contiguous and every source
    /// reference stays valid. Returns the number of frames removed.
    pub fn remove_frame(&mut self, index: usize) -> usize {
        if index == 0 || index >= self.frames.len() {
            return 0;
        }

        // Sources always precede their children, so one forward pass marks
        // the whole subtree
        let mut doomed = vec![false; self.frames.len()];
        doomed[index] = true;
        for i in 0..self.frames.len() {
            if let Some(source) = self.frames[i].source {
                if doomed[source] {
                    doomed[i] = true;
                }
            }
        }

        let mut remap = vec![usize::MAX; self.frames.len()];
        let mut kept = 0;
        for (i, dead) in doomed.iter().enumerate() {
            if !dead {
                remap[i] = kept;
                kept += 1;
            }
        }

        let removed = self.frames.len() - kept;
        self.frames = self
            .frames
            .iter()
            .enumerate()
            .filter(|(i, _)| !doomed[*i])
            .map(|(_, f)| ReferenceFrame {
                x: f.x,
                t: f.t,
                source: f.source.map(|s| remap[s]),
            })
            .collect();

        removed
    }
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_diagram_has_only_the_origin() {
        let d = Diagram::new();
        assert_eq!(d.frames.len(), 1);
        assert_eq!(d.frames[0], ReferenceFrame::origin());
    }

    #[test]
    fn unreachable_frames_are_rejected() {
        let mut d = Diagram::new();
        assert!(d.add_frame(20.0, 10.0, 0).is_none()); // outside the cone
        assert!(d.add_frame(1.0, -5.0, 0).is_none()); // in the past
        assert!(d.add_frame(1.0, 5.0, 7).is_none()); // no such source
        assert_eq!(d.frames.len(), 1);

        assert!(d.add_frame(3.0, 10.0, 0).is_some());
    }

    #[test]
    fn subtree_removal_renumbers_sources() {
        let mut d = Diagram::new();
        let a = d.add_frame(2.0, 10.0, 0).unwrap(); // 1
        let b = d.add_frame(4.0, 20.0, a).unwrap(); // 2
        let _c = d.add_frame(6.0, 30.0, b).unwrap(); // 3
        let e = d.add_frame(-2.0, 10.0, 0).unwrap(); // 4
        let _f = d.add_frame(-4.0, 20.0, e).unwrap(); // 5

        // Removing a takes b and c with it
        let removed = d.remove_frame(a);
        assert_eq!(removed, 3);
        assert_eq!(d.frames.len(), 3);

        // Indices are contiguous and sources still point at real frames
        for (i, frame) in d.frames.iter().enumerate() {
            if let Some(s) = frame.source {
                assert!(s < d.frames.len());
                assert!(s < i, "source must precede child");
            }
        }

        // The surviving branch kept its shape: origin <- e <- f
        assert_eq!(d.frames[1].x, -2.0);
        assert_eq!(d.frames[1].source, Some(0));
        assert_eq!(d.frames[2].x, -4.0);
        assert_eq!(d.frames[2].source, Some(1));
    }

    #[test]
    fn the_origin_cannot_be_removed_or_moved() {
        let mut d = Diagram::new();
        d.add_frame(2.0, 10.0, 0).unwrap();
        assert_eq!(d.remove_frame(0), 0);
        assert_eq!(d.frames.len(), 2);
        assert!(!d.move_frame(0, 5.0, 5.0));
    }

    #[test]
    fn moves_are_validated_against_source_and_children() {
        let mut d = Diagram::new();
        let a = d.add_frame(2.0, 10.0, 0).unwrap();
        let _b = d.add_frame(4.0, 20.0, a).unwrap();

        // Fine: still reachable from the origin, child still reachable
        assert!(d.move_frame(a, -2.0, 10.0));

        // Breaks the link to the child (child would be outside a's cone)
        assert!(!d.move_frame(a, -8.0, 19.5));
        assert_eq!(d.frames[a].x, -2.0);

        // Breaks the link to the source
        assert!(!d.move_frame(a, 15.0, 10.0));
    }
}
