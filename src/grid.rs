//! Uniform bucket grid over Lab space.
//!
//! Border cells are open towards infinity, so every color has a home cell
//! and [`LabGrid::gap`] stays a true lower bound on the per-axis distance.

use crate::color::{LabColor, MAX_SRGB_CHROMA};

/// Edge length of a cell in Lab units.
const CELL: f32 = 4.0;
const ORIGIN: [f32; 3] = [0.0, -128.0, -128.0];
pub(crate) const DIMS: [usize; 3] = [26, 64, 64];

/// `[L, a, b]` cell coordinates.
pub(crate) type CellIndex = [usize; 3];

fn axis_index(axis: usize, v: f32) -> usize {
    let i = ((v - ORIGIN[axis]) / CELL).floor();
    if i.is_nan() || i < 0.0 {
        0
    } else {
        (i as usize).min(DIMS[axis] - 1)
    }
}

fn extent(axis: usize, idx: usize) -> (f32, f32) {
    let lo = if idx == 0 {
        f32::NEG_INFINITY
    } else {
        ORIGIN[axis] + idx as f32 * CELL
    };
    let hi = if idx + 1 == DIMS[axis] {
        f32::INFINITY
    } else {
        ORIGIN[axis] + (idx + 1) as f32 * CELL
    };
    (lo, hi)
}

fn components(lab: LabColor) -> [f32; 3] {
    [lab.l, lab.a, lab.b]
}

/// Slots bucketed by the cell their Lab color falls in.
pub(crate) struct LabGrid {
    cells: Vec<Vec<usize>>,
}

impl LabGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![Vec::new(); DIMS[0] * DIMS[1] * DIMS[2]],
        }
    }

    pub fn cell_of(lab: LabColor) -> CellIndex {
        let [l, a, b] = components(lab);
        [axis_index(0, l), axis_index(1, a), axis_index(2, b)]
    }

    fn flat([l, a, b]: CellIndex) -> usize {
        (l * DIMS[1] + a) * DIMS[2] + b
    }

    pub fn insert(&mut self, slot: usize, lab: LabColor) {
        self.cells[Self::flat(Self::cell_of(lab))].push(slot);
    }

    pub fn remove(&mut self, slot: usize, lab: LabColor) {
        let cell = &mut self.cells[Self::flat(Self::cell_of(lab))];
        if let Some(pos) = cell.iter().position(|&s| s == slot) {
            cell.swap_remove(pos);
        }
    }

    pub fn slots(&self, idx: CellIndex) -> &[usize] {
        &self.cells[Self::flat(idx)]
    }

    /// Inclusive cell range covering `lab` widened by `dl` along L* and
    /// `dab` along a* and b*.
    pub fn span(lab: LabColor, dl: f32, dab: f32) -> (CellIndex, CellIndex) {
        let center = components(lab);
        let reach = [dl, dab, dab];
        let lo = [0, 1, 2].map(|axis| axis_index(axis, center[axis] - reach[axis]));
        let hi = [0, 1, 2].map(|axis| axis_index(axis, center[axis] + reach[axis]));
        (lo, hi)
    }

    /// Cube of cells `radius` steps around `home`, clipped to the grid.
    pub fn around(home: CellIndex, radius: usize) -> (CellIndex, CellIndex) {
        let lo = home.map(|i| i.saturating_sub(radius));
        let hi = [0, 1, 2].map(|axis| (home[axis] + radius).min(DIMS[axis] - 1));
        (lo, hi)
    }

    pub fn covers_all((lo, hi): (CellIndex, CellIndex)) -> bool {
        lo == [0, 0, 0] && hi == DIMS.map(|d| d - 1)
    }

    pub fn cell_count((lo, hi): (CellIndex, CellIndex)) -> usize {
        (0..3).map(|axis| hi[axis] + 1 - lo[axis]).product()
    }

    /// Distance from `v` to cell `idx` along `axis`.
    pub fn gap(axis: usize, idx: usize, v: f32) -> f32 {
        let (lo, hi) = extent(axis, idx);
        if v < lo {
            lo - v
        } else if v > hi {
            v - hi
        } else {
            0.0
        }
    }

    /// Upper bound on the chroma of any stored color whose a*, b* fall in
    /// cells `ia`, `ib`.
    pub fn chroma_bound(ia: usize, ib: usize) -> f32 {
        let far = |axis, idx| {
            let (lo, hi) = extent(axis, idx);
            lo.abs().max(hi.abs())
        };
        far(1, ia).hypot(far(2, ib)).min(MAX_SRGB_CHROMA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn every_color_lands_in_its_cell() {
        let mut grid = LabGrid::new();
        for (slot, key) in [[0, 0, 0], [255, 255, 255], [0, 0, 255], [12, 200, 40]]
            .into_iter()
            .enumerate()
        {
            let lab = color::to_lab(key);
            grid.insert(slot, lab);
            let idx = LabGrid::cell_of(lab);
            assert!(grid.slots(idx).contains(&slot));
            for (axis, v) in components(lab).into_iter().enumerate() {
                assert_eq!(LabGrid::gap(axis, idx[axis], v), 0.0);
            }
            assert!(color::chroma(lab) <= LabGrid::chroma_bound(idx[1], idx[2]));
        }

        let blue = color::to_lab([0, 0, 255]);
        grid.remove(2, blue);
        assert!(!grid.slots(LabGrid::cell_of(blue)).contains(&2));
    }

    #[test]
    fn border_cells_are_open() {
        assert_eq!(LabGrid::gap(0, 0, -50.0), 0.0);
        assert_eq!(LabGrid::gap(1, DIMS[1] - 1, 900.0), 0.0);
        assert_eq!(LabGrid::gap(0, 3, 0.0), 12.0);
        assert_eq!(LabGrid::cell_of(LabColor::new(f32::NAN, 0.0, 0.0))[0], 0);
    }

    #[test]
    fn spans_clip_to_the_grid() {
        let mid = LabColor::new(50.0, 0.0, 0.0);
        let everything = LabGrid::span(mid, f32::INFINITY, f32::INFINITY);
        assert!(LabGrid::covers_all(everything));
        assert_eq!(LabGrid::cell_count(everything), DIMS[0] * DIMS[1] * DIMS[2]);

        let near = LabGrid::around(LabGrid::cell_of(mid), 1);
        assert_eq!(LabGrid::cell_count(near), 27);
        assert!(!LabGrid::covers_all(near));
    }
}
