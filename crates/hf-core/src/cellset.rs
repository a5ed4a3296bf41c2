//! Cell index sets.
//!
//! Cell sets (channel, tip, ribbon, crack) are kept as sorted, duplicate-free
//! `Vec<usize>` so that the elasticity gathers see a stable row order. The
//! helpers here keep that representation closed under the set operations the
//! step algorithm needs.

/// Sorts and removes duplicates in place.
pub fn normalize(cells: &mut Vec<usize>) {
    cells.sort_unstable();
    cells.dedup();
}

/// Union of two sorted sets.
pub fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Elements of `a` not in `b` (both sorted).
pub fn difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|x| b.binary_search(x).is_err())
        .collect()
}

/// Elements present in both sorted sets.
pub fn intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|x| b.binary_search(x).is_ok())
        .collect()
}

/// Dense membership mask over all cells of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMask {
    bits: Vec<bool>,
}

impl CellMask {
    pub fn new(num_cells: usize) -> Self {
        Self {
            bits: vec![false; num_cells],
        }
    }

    pub fn from_cells(num_cells: usize, cells: &[usize]) -> Self {
        let mut mask = Self::new(num_cells);
        for &c in cells {
            mask.insert(c);
        }
        mask
    }

    #[inline]
    pub fn contains(&self, cell: usize) -> bool {
        self.bits.get(cell).copied().unwrap_or(false)
    }

    #[inline]
    pub fn insert(&mut self, cell: usize) {
        if let Some(b) = self.bits.get_mut(cell) {
            *b = true;
        }
    }

    #[inline]
    pub fn remove(&mut self, cell: usize) {
        if let Some(b) = self.bits.get_mut(cell) {
            *b = false;
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Members in ascending order.
    pub fn to_cells(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

/// Position lookup from cell index to its row in a gathered sub-system.
///
/// Built once per assembly so that neighbor lookups during matrix assembly
/// are O(1).
#[derive(Debug, Clone)]
pub struct LocalIndex {
    row_of: Vec<Option<usize>>,
}

impl LocalIndex {
    pub fn new(num_cells: usize, cells: &[usize]) -> Self {
        let mut row_of = vec![None; num_cells];
        for (row, &c) in cells.iter().enumerate() {
            if let Some(slot) = row_of.get_mut(c) {
                *slot = Some(row);
            }
        }
        Self { row_of }
    }

    #[inline]
    pub fn row(&self, cell: usize) -> Option<usize> {
        self.row_of.get(cell).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let a = vec![1, 3, 5, 7];
        let b = vec![3, 4, 5];
        assert_eq!(union(&a, &b), vec![1, 3, 4, 5, 7]);
        assert_eq!(difference(&a, &b), vec![1, 7]);
        assert_eq!(intersection(&a, &b), vec![3, 5]);
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut v = vec![5, 1, 5, 3, 1];
        normalize(&mut v);
        assert_eq!(v, vec![1, 3, 5]);
    }

    #[test]
    fn mask_roundtrip() {
        let mut m = CellMask::from_cells(10, &[2, 8]);
        assert!(m.contains(2));
        assert!(!m.contains(3));
        assert!(!m.contains(42));
        m.insert(3);
        m.remove(8);
        assert_eq!(m.to_cells(), vec![2, 3]);
        assert_eq!(m.count(), 2);
    }

    #[test]
    fn local_index_rows() {
        let idx = LocalIndex::new(6, &[4, 1, 5]);
        assert_eq!(idx.row(4), Some(0));
        assert_eq!(idx.row(5), Some(2));
        assert_eq!(idx.row(0), None);
        assert_eq!(idx.row(99), None);
    }
}
