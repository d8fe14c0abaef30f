// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brush reference resolution
//!
//! Maps each brush model to the compiled brushes it owns. Formats differ in
//! how they record this:
//!
//! - Nightfire stores a leaf range per model, each leaf a mark-brush range
//! - the Quake 3 family and Call of Duty store a brush range per model
//! - Quake 2 and Source store a head node; the tree is walked to its leaves
//!
//! A brush reached from more than one leaf or model is only returned once.

use crate::progress::MessageSink;
use bsp_lite_model::{EngineFamily, FormatVersion, Vector3D};
use bsp_lite_parser::{BspFile, Leaf, Model};
use std::ops::Range;

/// How a format links models to brushes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveStrategy {
    LeafIndirect,
    ModelRange,
    NodeTree,
    /// No brush lumps
    Unsupported,
}

impl ResolveStrategy {
    pub fn for_version(version: FormatVersion) -> Self {
        match version.family() {
            EngineFamily::Nightfire => ResolveStrategy::LeafIndirect,
            EngineFamily::Quake3
            | EngineFamily::Raven
            | EngineFamily::Fakk
            | EngineFamily::CallOfDuty => ResolveStrategy::ModelRange,
            EngineFamily::Quake2 | EngineFamily::Source => ResolveStrategy::NodeTree,
            EngineFamily::Quake | EngineFamily::Doom => ResolveStrategy::Unsupported,
        }
    }
}

/// Fixed-size bit set
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1 << (i % 64)) != 0
    }

    /// Set bit `i`; `false` if it was already set or is out of range
    pub fn insert(&mut self, i: usize) -> bool {
        if i >= self.len || self.contains(i) {
            return false;
        }
        self.words[i / 64] |= 1 << (i % 64);
        true
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Resolves models to brush indices for one file
pub struct BrushResolver<'a> {
    file: &'a BspFile,
    strategy: ResolveStrategy,
    used: BitSet,
    /// First side of every brush when the format leaves it implicit
    implicit_first_sides: Option<Vec<usize>>,
}

impl<'a> BrushResolver<'a> {
    pub fn new(file: &'a BspFile) -> Self {
        let implicit_first_sides = file
            .brushes
            .iter()
            .any(|b| b.first_side.is_none())
            .then(|| {
                file.brushes
                    .iter()
                    .scan(0usize, |next, b| {
                        let first = *next;
                        *next += b.num_sides();
                        Some(first)
                    })
                    .collect()
            });
        Self {
            file,
            strategy: ResolveStrategy::for_version(file.version),
            used: BitSet::new(file.brushes.len()),
            implicit_first_sides,
        }
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Brushes not yet claimed by another model
    pub fn unclaimed(&self) -> usize {
        self.used.len() - self.used.count()
    }

    /// Range of brush sides belonging to `brush`
    pub fn side_range(&self, brush: usize) -> Option<Range<usize>> {
        let b = self.file.brushes.get(brush)?;
        let first = match (&self.implicit_first_sides, b.first_side) {
            (Some(firsts), _) => *firsts.get(brush)?,
            (None, Some(first)) => usize::try_from(first).ok()?,
            (None, None) => return None,
        };
        let end = first.checked_add(b.num_sides())?;
        (end <= self.file.brush_sides.len()).then_some(first..end)
    }

    /// Claim and return the brushes of model `index`, in encounter order
    ///
    /// Stored ranges running past their lump are cut at the lump end with a
    /// warning.
    pub fn resolve(&mut self, index: usize, sink: &mut MessageSink<'_>) -> Vec<usize> {
        let Some(model) = self.file.models.get(index) else {
            log::debug!("model {} not in model lump", index);
            return Vec::new();
        };
        let candidates = match self.strategy {
            ResolveStrategy::LeafIndirect => self.leaf_indirect(index, model, sink),
            ResolveStrategy::ModelRange => {
                let stored = model.first_brush.zip(model.num_brushes);
                match stored {
                    Some((first, count)) => {
                        clamp_range(first, count, self.file.brushes.len(), index, "brush", sink)
                            .collect()
                    }
                    None => Vec::new(),
                }
            }
            ResolveStrategy::NodeTree => self.node_tree(model),
            ResolveStrategy::Unsupported => Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|&b| self.used.insert(b))
            .collect()
    }

    fn leaf_indirect(&self, index: usize, model: &Model, sink: &mut MessageSink<'_>) -> Vec<usize> {
        let stored = match (model.first_leaf, model.num_leaves) {
            (Some(first), Some(count)) if count > 0 => {
                clamp_range(first, count, self.file.leaves.len(), index, "leaf", sink).collect()
            }
            _ => self.leaves_inside(&model.mins, &model.maxs),
        };
        self.mark_brushes_of(stored)
    }

    /// Leaves whose bounds lie inside a model's bounds
    fn leaves_inside(&self, mins: &Vector3D, maxs: &Vector3D) -> Vec<usize> {
        let inside = |leaf: &Leaf| {
            leaf.bounds.is_some_and(|(lo, hi)| {
                (0..3).all(|a| lo[a] >= mins[a] && hi[a] <= maxs[a])
            })
        };
        self.file
            .leaves
            .iter()
            .enumerate()
            .filter(|(_, leaf)| inside(leaf))
            .map(|(i, _)| i)
            .collect()
    }

    fn node_tree(&self, model: &Model) -> Vec<usize> {
        let Some(head) = model.head_node else {
            return Vec::new();
        };
        let nodes = &self.file.nodes;
        let mut visited = BitSet::new(nodes.len());
        let mut leaves = Vec::new();
        let mut stack = vec![head];
        while let Some(child) = stack.pop() {
            if child < 0 {
                leaves.push((-(child + 1)) as usize);
                continue;
            }
            let i = child as usize;
            if !visited.insert(i) {
                continue;
            }
            let node = &nodes[i];
            stack.push(node.children[1]);
            stack.push(node.children[0]);
        }
        self.mark_brushes_of(leaves)
    }

    fn mark_brushes_of(&self, leaves: Vec<usize>) -> Vec<usize> {
        let marks = &self.file.mark_brushes;
        leaves
            .into_iter()
            .filter_map(|l| self.file.leaves.get(l))
            .flat_map(|leaf| {
                let first = leaf.first_mark_brush as usize;
                let end = first
                    .saturating_add(leaf.num_mark_brushes as usize)
                    .min(marks.len());
                marks.get(first..end).unwrap_or(&[])
            })
            .filter_map(|m| usize::try_from(m.0).ok())
            .collect()
    }
}

/// `first..first + count` cut to `0..len`
fn clamp_range(
    first: u32,
    count: u32,
    len: usize,
    model: usize,
    what: &str,
    sink: &mut MessageSink<'_>,
) -> Range<usize> {
    let start = (first as usize).min(len);
    let end = (first as usize).saturating_add(count as usize);
    if end > len {
        sink.warn(format_args!(
            "model {}: {} range {}..{} exceeds {} records, truncated",
            model, what, first, end, len
        ));
    }
    start..end.min(len)
}
