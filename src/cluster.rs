//! Agglomerative color clustering and near-duplicate merging.
//!
//! Clusters live in an arena indexed by their discovery slot and are
//! bucketed in a Lab grid. Each live cluster caches its nearest partner;
//! the caches feed a min-heap from which the globally closest pair is taken.
//! Nearest-partner searches visit grid cells outwards and skip any cell or
//! candidate whose [`DeltaFormula::lower_bound`] already exceeds the best
//! pair found, so the result is the one a scan over every pair would give.
//!
//! After a merge only the merged cluster and the clusters whose cached
//! partner was one of the two inputs are searched again. A cache that a
//! newer cluster would beat is left alone: the better pair is also the
//! newer cluster's own nearest pair, so the heap still sees it.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::color::{self, ColorKey, DeltaFormula, LabColor};
use crate::grid::{CellIndex, LabGrid};
use crate::histogram::Sample;

/// Merge radius of the first clustering round.
const INITIAL_MERGE_RADIUS: f32 = 2.3;
/// Factor applied to the radius whenever a round runs out of pairs.
const RADIUS_GROWTH: f32 = 1.5;

// Lower bounds are compared against f32 distances computed along a different
// path; these keep rounding from pruning a pair that is actually closer.
const BOUND_SLACK: f32 = 0.99;
const BOUND_EPSILON: f32 = 1e-3;

/// A representative color with the total weight of its members.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    pub color: ColorKey,
    pub lab: LabColor,
    pub weight: u64,
}

impl Cluster {
    pub fn new(color: ColorKey, weight: u64) -> Self {
        Self {
            color,
            lab: color::to_lab(color),
            weight,
        }
    }

    /// Weight-proportional average of two clusters, taken in Lab and
    /// snapped back to an sRGB triple.
    pub fn merge(&self, other: &Cluster) -> Cluster {
        let weight = self.weight + other.weight;
        let (wa, wb) = (self.weight as f64, other.weight as f64);
        let total = wa + wb;
        let mix = |a: f32, b: f32| ((a as f64 * wa + b as f64 * wb) / total) as f32;

        let lab = LabColor::new(
            mix(self.lab.l, other.lab.l),
            mix(self.lab.a, other.lab.a),
            mix(self.lab.b, other.lab.b),
        );
        Cluster::new(color::from_lab(lab), weight)
    }
}

impl From<Sample> for Cluster {
    fn from(sample: Sample) -> Self {
        Cluster::new(sample.color, sample.count)
    }
}

// ------------------------------------------------------------
// Pair ordering
// ------------------------------------------------------------

/// Total order over candidate pairs: closest first, then the heavier pair,
/// then the lexicographically lower color keys, then the lower slots.
#[derive(Clone, Copy, Debug)]
struct PairKey {
    distance: f32,
    combined: u64,
    colors: (ColorKey, ColorKey),
    slots: (usize, usize),
}

impl PairKey {
    fn is_better_than(&self, other: Option<&PairKey>) -> bool {
        other.is_none_or(|o| self < o)
    }
}

impl Ord for PairKey {
    fn cmp(&self, other: &PairKey) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| Reverse(self.combined).cmp(&Reverse(other.combined)))
            .then_with(|| self.colors.cmp(&other.colors))
            .then_with(|| self.slots.cmp(&other.slots))
    }
}

impl PartialOrd for PairKey {
    fn partial_cmp(&self, other: &PairKey) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PairKey {
    fn eq(&self, other: &PairKey) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PairKey {}

fn pair_key(formula: DeltaFormula, a: usize, ca: &Cluster, b: usize, cb: &Cluster) -> PairKey {
    let colors = if ca.color <= cb.color {
        (ca.color, cb.color)
    } else {
        (cb.color, ca.color)
    };
    PairKey {
        distance: formula.pair_distance(ca.lab, cb.lab),
        combined: ca.weight + cb.weight,
        colors,
        slots: (a.min(b), a.max(b)),
    }
}

#[derive(Clone, Copy, Debug)]
struct Neighbor {
    slot: usize,
    key: PairKey,
}

/// A cached nearest pair as pushed on the heap. Stale once `stamp` no
/// longer matches the owning slot's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    key: PairKey,
    slot: usize,
    stamp: u32,
}

// ------------------------------------------------------------
// Cluster arena
// ------------------------------------------------------------

struct ClusterSet {
    formula: DeltaFormula,
    slots: Vec<Option<Cluster>>,
    nearest: Vec<Option<Neighbor>>,
    stamps: Vec<u32>,
    /// Slots whose cached partner was, at some point, the indexed slot.
    followers: Vec<Vec<usize>>,
    heap: BinaryHeap<Reverse<Candidate>>,
    grid: LabGrid,
    live: usize,
}

impl ClusterSet {
    fn new(clusters: Vec<Cluster>, formula: DeltaFormula) -> Self {
        let live = clusters.len();
        let mut grid = LabGrid::new();
        for (slot, c) in clusters.iter().enumerate() {
            grid.insert(slot, c.lab);
        }
        let mut set = ClusterSet {
            formula,
            nearest: vec![None; live],
            stamps: vec![0; live],
            followers: vec![Vec::new(); live],
            heap: BinaryHeap::with_capacity(live * 2),
            slots: clusters.into_iter().map(Some).collect(),
            grid,
            live,
        };
        for slot in 0..set.slots.len() {
            let found = set.find_nearest(slot);
            set.set_nearest(slot, found);
        }
        set
    }

    fn len(&self) -> usize {
        self.live
    }

    /// Offer `other` as a partner for `slot` unless its lower bound already
    /// loses to `best`.
    fn consider(
        &self,
        slot: usize,
        c: &Cluster,
        chroma: f32,
        other: usize,
        best: &mut Option<Neighbor>,
    ) {
        if other == slot {
            return;
        }
        let Some(o) = self.slots[other].as_ref() else {
            return;
        };
        if let Some(b) = best.as_ref() {
            let dl = (c.lab.l - o.lab.l).abs();
            let dab = (c.lab.a - o.lab.a).hypot(c.lab.b - o.lab.b);
            let bound = self.formula.lower_bound(dl, dab, chroma.max(color::chroma(o.lab)));
            if bound * BOUND_SLACK - BOUND_EPSILON > b.key.distance {
                return;
            }
        }
        let key = pair_key(self.formula, slot, c, other, o);
        if key.is_better_than(best.as_ref().map(|n| &n.key)) {
            *best = Some(Neighbor { slot: other, key });
        }
    }

    fn scan_cells(
        &self,
        slot: usize,
        c: &Cluster,
        chroma: f32,
        (lo, hi): (CellIndex, CellIndex),
        best: &mut Option<Neighbor>,
    ) {
        for il in lo[0]..=hi[0] {
            let gl = LabGrid::gap(0, il, c.lab.l);
            for ia in lo[1]..=hi[1] {
                let ga = LabGrid::gap(1, ia, c.lab.a);
                for ib in lo[2]..=hi[2] {
                    let cell = self.grid.slots([il, ia, ib]);
                    if cell.is_empty() {
                        continue;
                    }
                    if let Some(b) = best.as_ref() {
                        let gb = LabGrid::gap(2, ib, c.lab.b);
                        let far = chroma.max(LabGrid::chroma_bound(ia, ib));
                        let bound = self.formula.lower_bound(gl, ga.hypot(gb), far);
                        if bound * BOUND_SLACK - BOUND_EPSILON > b.key.distance {
                            continue;
                        }
                    }
                    for &other in cell {
                        self.consider(slot, c, chroma, other, best);
                    }
                }
            }
        }
    }

    fn scan_all(&self, slot: usize, c: &Cluster, chroma: f32, best: &mut Option<Neighbor>) {
        for other in 0..self.slots.len() {
            self.consider(slot, c, chroma, other, best);
        }
    }

    /// Best partner of `slot` under [`PairKey`]'s order among all live
    /// clusters.
    fn find_nearest(&self, slot: usize) -> Option<Neighbor> {
        let c = self.slots[slot]?;
        let chroma = color::chroma(c.lab);
        let home = LabGrid::cell_of(c.lab);

        // Widen a cube around the home cell until some partner turns up.
        let mut best = None;
        let mut radius = 1;
        loop {
            let cube = LabGrid::around(home, radius);
            if LabGrid::cell_count(cube) > self.live {
                self.scan_all(slot, &c, chroma, &mut best);
                return best;
            }
            self.scan_cells(slot, &c, chroma, cube, &mut best);
            if best.is_some() || LabGrid::covers_all(cube) {
                break;
            }
            radius *= 2;
        }
        let found = best?;

        // Anything closer lies inside the box the found distance bounds.
        let budget = found.key.distance / BOUND_SLACK + BOUND_EPSILON;
        let dl = budget / self.formula.lightness_weight();
        let dab = self.formula.ab_reach(budget, chroma);
        let span = LabGrid::span(c.lab, dl, dab);
        if LabGrid::cell_count(span) > self.live {
            self.scan_all(slot, &c, chroma, &mut best);
        } else {
            self.scan_cells(slot, &c, chroma, span, &mut best);
        }
        best
    }

    fn set_nearest(&mut self, slot: usize, neighbor: Option<Neighbor>) {
        self.stamps[slot] = self.stamps[slot].wrapping_add(1);
        self.nearest[slot] = neighbor;
        if let Some(n) = neighbor {
            self.followers[n.slot].push(slot);
            self.heap.push(Reverse(Candidate {
                key: n.key,
                slot,
                stamp: self.stamps[slot],
            }));
        }
    }

    /// The globally best pair under [`PairKey`]'s order.
    fn closest_pair(&mut self) -> Option<(usize, usize, PairKey)> {
        while let Some(&Reverse(top)) = self.heap.peek() {
            if self.slots[top.slot].is_some() && self.stamps[top.slot] == top.stamp {
                if let Some(n) = self.nearest[top.slot] {
                    return Some((top.slot, n.slot, n.key));
                }
            }
            self.heap.pop();
        }
        None
    }

    /// Merge the clusters in slots `a` and `b`. The survivor takes the earlier
    /// slot so discovery order is preserved.
    fn merge(&mut self, a: usize, b: usize) {
        let (keep, gone) = (a.min(b), a.max(b));
        let (Some(x), Some(y)) = (self.slots[keep], self.slots[gone]) else {
            return;
        };

        let merged = x.merge(&y);
        self.grid.remove(keep, x.lab);
        self.grid.remove(gone, y.lab);
        self.grid.insert(keep, merged.lab);
        self.slots[keep] = Some(merged);
        self.slots[gone] = None;
        self.set_nearest(gone, None);
        self.live -= 1;

        let mut orphans = std::mem::take(&mut self.followers[keep]);
        orphans.append(&mut self.followers[gone]);
        orphans.sort_unstable();
        orphans.dedup();

        let found = self.find_nearest(keep);
        self.set_nearest(keep, found);
        for slot in orphans {
            if slot == keep || self.slots[slot].is_none() {
                continue;
            }
            if matches!(self.nearest[slot], Some(n) if n.slot == keep || n.slot == gone) {
                let found = self.find_nearest(slot);
                self.set_nearest(slot, found);
            }
        }
    }

    fn into_clusters(self) -> Vec<Cluster> {
        self.slots.into_iter().flatten().collect()
    }
}

// ------------------------------------------------------------
// Public passes
// ------------------------------------------------------------

/// Reduce `samples` to at most `max_clusters` clusters by repeatedly merging
/// the closest pair.
///
/// Merges proceed in rounds bounded by a merge radius; a round ends when the
/// closest pair lies outside the radius, which then grows geometrically. The
/// closest pair is always the one merged, so the radius shapes the rounds
/// but never the result. Output is in discovery order (the input order).
pub fn cluster(samples: &[Sample], max_clusters: usize, formula: DeltaFormula) -> Vec<Cluster> {
    let initial: Vec<Cluster> = samples.iter().copied().map(Cluster::from).collect();
    let max_clusters = max_clusters.max(1);
    if initial.len() <= max_clusters {
        return initial;
    }

    let distinct = initial.len();
    let mut set = ClusterSet::new(initial, formula);
    let mut radius = INITIAL_MERGE_RADIUS;
    let mut rounds = 1usize;
    let mut merged_in_round = 0usize;

    while set.len() > max_clusters {
        let Some((a, b, key)) = set.closest_pair() else {
            break;
        };
        if key.distance < radius || !key.distance.is_finite() {
            set.merge(a, b);
            merged_in_round += 1;
        } else {
            log::trace!(
                "round {rounds}: radius {radius:.2} merged {merged_in_round}, {} clusters left",
                set.len()
            );
            while radius <= key.distance {
                radius *= RADIUS_GROWTH;
            }
            rounds += 1;
            merged_in_round = 0;
        }
    }

    log::debug!(
        "clustered {distinct} colors into {} with {formula} after {rounds} rounds (radius {radius:.2})",
        set.len()
    );
    set.into_clusters()
}

/// Merge every pair of clusters closer than `threshold`, closest pair first,
/// until no such pair remains. Running it again on its own output is a
/// no-op.
pub fn deduplicate_clusters(
    clusters: Vec<Cluster>,
    threshold: f32,
    formula: DeltaFormula,
) -> Vec<Cluster> {
    if clusters.len() < 2 || threshold.is_nan() || threshold <= 0.0 {
        return clusters;
    }

    let before = clusters.len();
    let mut set = ClusterSet::new(clusters, formula);
    while let Some((a, b, key)) = set.closest_pair() {
        if key.distance >= threshold {
            break;
        }
        set.merge(a, b);
    }

    if set.len() != before {
        log::debug!(
            "deduplicated {before} clusters into {} (threshold {threshold})",
            set.len()
        );
    }
    set.into_clusters()
}
