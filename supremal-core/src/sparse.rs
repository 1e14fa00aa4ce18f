//! Row-major compressed sparse matrices over lattice values.
//!
//! The automaton engine keeps two adjacency matrices per system: one over
//! [`EventSet`] cells (which events lead from `i` to `j`) and one over `bool`
//! (is there any edge at all). Both share this representation: classic CSR
//! arrays plus a pending-edit overlay so that single cells can be updated
//! without rebuilding the whole structure on every write.
//!
//! Bulk construction goes through [`SparseMatrix::from_triplets`], which
//! groups by row, sorts within each row by column and merges duplicate
//! coordinates with [`Lattice::join`]. Incremental edits are staged by
//! [`SparseMatrix::join_cell`] / [`SparseMatrix::set_cell`] and folded into
//! fresh CSR arrays by [`SparseMatrix::make_compressed`]. Read-side
//! operations ([`row_iter`](SparseMatrix::row_iter),
//! [`transpose`](SparseMatrix::transpose), [`multiply`](SparseMatrix::multiply))
//! refuse to run while edits are pending and fail with
//! [`Error::NotCompressed`].

use crate::error::{Error, Result};
use crate::events::EventSet;
use crate::lattice::Lattice;
use crate::math::OrderedMap;

/// Boolean adjacency matrix; nonzero cells mark the existence of an edge.
pub type SparseBitMatrix = SparseMatrix<bool>;
/// Event-labeled adjacency matrix; each cell holds the events on that edge.
pub type SparseEventMatrix = SparseMatrix<EventSet>;

/// A staged, not yet compressed edit to a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit<T> {
    /// Join the value into whatever the cell currently holds.
    Join(T),
    /// Replace the cell outright; assigning bottom clears it.
    Assign(T),
}

impl<T: Lattice> Edit<T> {
    fn apply(self, base: T) -> T {
        match self {
            Edit::Join(v) => base.join(&v),
            Edit::Assign(v) => v,
        }
    }
}

/// Row-major compressed sparse matrix with values from a join/meet lattice.
///
/// Cells equal to [`Lattice::bottom`] are structurally absent. The matrix is
/// either *compressed* (CSR arrays describe the current content) or carries
/// pending edits; [`SparseMatrix::make_compressed`] moves it back to the
/// former state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<u32>,
    values: Vec<T>,
    pending: OrderedMap<(u32, u32), Edit<T>>,
    compressed: bool,
}

impl<T: Lattice> SparseMatrix<T> {
    /// Creates an empty `nrows x ncols` matrix. The result is compressed.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_ptr: vec![0; nrows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
            pending: OrderedMap::new(),
            compressed: true,
        }
    }

    /// Builds a compressed matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are merged with [`Lattice::join`]; values equal
    /// to bottom are dropped.
    ///
    /// # Panics
    /// If any triplet lies outside the declared shape.
    pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, T)>,
    {
        let mut entries: Vec<(u32, u32, T)> = triplets.into_iter().collect();
        for &(r, c, _) in &entries {
            assert!((r as usize) < nrows && (c as usize) < ncols, "triplet ({r}, {c}) outside {nrows}x{ncols}");
        }
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut merged: Vec<(u32, u32, T)> = Vec::with_capacity(entries.len());
        for (r, c, v) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2.join_assign(&v),
                _ => merged.push((r, c, v)),
            }
        }

        let mut matrix = Self::new(nrows, ncols);
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        row_ptr.push(0);
        let mut row = 0u32;
        for (r, c, v) in merged {
            if v.is_bottom() {
                continue;
            }
            while row < r {
                row_ptr.push(matrix.col_idx.len());
                row += 1;
            }
            matrix.col_idx.push(c);
            matrix.values.push(v);
        }
        while row_ptr.len() < nrows + 1 {
            row_ptr.push(matrix.col_idx.len());
        }
        matrix.row_ptr = row_ptr;
        matrix
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.ncols
    }

    /// Number of structurally nonzero cells. Meaningful only on a compressed
    /// matrix.
    pub fn nnz(&self) -> usize {
        debug_assert!(self.compressed, "nnz read from a matrix with pending edits");
        self.values.len()
    }

    /// True if no edits are pending.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Stages `value` to be joined into cell `(row, col)`.
    ///
    /// # Panics
    /// If the coordinates lie outside the matrix.
    pub fn join_cell(&mut self, row: u32, col: u32, value: T) {
        self.check_cell(row, col);
        self.compressed = false;
        self.pending
            .entry((row, col))
            .and_modify(|edit| {
                *edit = match *edit {
                    Edit::Join(v) => Edit::Join(v.join(&value)),
                    Edit::Assign(v) => Edit::Assign(v.join(&value)),
                }
            })
            .or_insert(Edit::Join(value));
    }

    /// Stages an absolute assignment of cell `(row, col)`. Assigning bottom
    /// clears the cell.
    ///
    /// # Panics
    /// If the coordinates lie outside the matrix.
    pub fn set_cell(&mut self, row: u32, col: u32, value: T) {
        self.check_cell(row, col);
        self.compressed = false;
        self.pending.insert((row, col), Edit::Assign(value));
    }

    fn check_cell(&self, row: u32, col: u32) {
        assert!(
            (row as usize) < self.nrows && (col as usize) < self.ncols,
            "cell ({row}, {col}) outside {}x{}",
            self.nrows,
            self.ncols
        );
    }

    /// Current value of cell `(row, col)`, pending edits included. Reading a
    /// cell never requires compression; this is what the write path uses for
    /// its own bookkeeping.
    pub fn coeff(&self, row: u32, col: u32) -> T {
        self.check_cell(row, col);
        let base = self.csr_coeff(row, col);
        match self.pending.get(&(row, col)) {
            Some(edit) => edit.apply(base),
            None => base,
        }
    }

    fn csr_coeff(&self, row: u32, col: u32) -> T {
        let range = self.row_ptr[row as usize]..self.row_ptr[row as usize + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(offset) => self.values[range.start + offset],
            Err(_) => T::bottom(),
        }
    }

    /// Current content of `row` in column order, pending edits included.
    /// Cells equal to bottom are omitted.
    pub fn row_entries(&self, row: u32) -> Vec<(u32, T)> {
        assert!((row as usize) < self.nrows, "row {row} outside {} rows", self.nrows);
        let mut entries = Vec::new();
        let mut csr = self.compressed_row(row).peekable();
        let mut edits = self
            .pending
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, c), &e)| (c, e))
            .peekable();
        loop {
            let value = match (csr.peek().copied(), edits.peek().copied()) {
                (Some((cc, cv)), Some((ec, _))) if cc < ec => {
                    csr.next();
                    (cc, cv)
                }
                (Some((cc, cv)), Some((ec, ev))) if cc == ec => {
                    csr.next();
                    edits.next();
                    (cc, ev.apply(cv))
                }
                (_, Some((ec, ev))) => {
                    edits.next();
                    (ec, ev.apply(T::bottom()))
                }
                (Some((cc, cv)), None) => {
                    csr.next();
                    (cc, cv)
                }
                (None, None) => break,
            };
            if !value.1.is_bottom() {
                entries.push(value);
            }
        }
        entries
    }

    fn compressed_row(&self, row: u32) -> impl Iterator<Item = (u32, T)> + '_ {
        let range = self.row_ptr[row as usize]..self.row_ptr[row as usize + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Folds all pending edits into fresh CSR arrays. Idempotent.
    pub fn make_compressed(&mut self) {
        if self.compressed {
            return;
        }
        let mut row_ptr = Vec::with_capacity(self.nrows + 1);
        let mut col_idx = Vec::with_capacity(self.col_idx.len() + self.pending.len());
        let mut values = Vec::with_capacity(col_idx.capacity());
        row_ptr.push(0);
        for row in 0..self.nrows as u32 {
            for (col, value) in self.row_entries(row) {
                col_idx.push(col);
                values.push(value);
            }
            row_ptr.push(col_idx.len());
        }
        self.row_ptr = row_ptr;
        self.col_idx = col_idx;
        self.values = values;
        self.pending.clear();
        self.compressed = true;
    }

    /// Iterates over `(column, value)` pairs of `row` in column order.
    ///
    /// Fails with [`Error::NotCompressed`] while edits are pending.
    pub fn row_iter(&self, row: u32) -> Result<RowIter<'_, T>> {
        if !self.compressed {
            return Err(Error::NotCompressed);
        }
        assert!((row as usize) < self.nrows, "row {row} outside {} rows", self.nrows);
        let range = self.row_ptr[row as usize]..self.row_ptr[row as usize + 1];
        Ok(RowIter {
            cols: &self.col_idx[range.clone()],
            values: &self.values[range],
            pos: 0,
        })
    }

    /// Indices of rows holding at least one nonzero cell.
    ///
    /// Fails with [`Error::NotCompressed`] while edits are pending.
    pub fn nonempty_rows(&self) -> Result<impl Iterator<Item = u32> + '_> {
        if !self.compressed {
            return Err(Error::NotCompressed);
        }
        Ok((0..self.nrows as u32).filter(|&i| self.row_ptr[i as usize] < self.row_ptr[i as usize + 1]))
    }

    /// Returns the transpose as a new compressed matrix in O(nnz).
    ///
    /// Fails with [`Error::NotCompressed`] while edits are pending.
    pub fn transpose(&self) -> Result<Self> {
        if !self.compressed {
            return Err(Error::NotCompressed);
        }
        let nnz = self.values.len();
        let mut row_ptr = vec![0usize; self.ncols + 1];
        for &c in &self.col_idx {
            row_ptr[c as usize + 1] += 1;
        }
        for i in 0..self.ncols {
            row_ptr[i + 1] += row_ptr[i];
        }
        let mut cursor = row_ptr.clone();
        let mut col_idx = vec![0u32; nnz];
        let mut values = vec![T::bottom(); nnz];
        for r in 0..self.nrows {
            for k in self.row_ptr[r]..self.row_ptr[r + 1] {
                let c = self.col_idx[k] as usize;
                col_idx[cursor[c]] = r as u32;
                values[cursor[c]] = self.values[k];
                cursor[c] += 1;
            }
        }
        Ok(Self {
            nrows: self.ncols,
            ncols: self.nrows,
            row_ptr,
            col_idx,
            values,
            pending: OrderedMap::new(),
            compressed: true,
        })
    }
}

impl SparseBitMatrix {
    /// Builds the `n x n` boolean identity.
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n as u32).collect(),
            values: vec![true; n],
            pending: OrderedMap::new(),
            compressed: true,
        }
    }

    /// Boolean sparse matrix product `self * rhs` with row-wise accumulation
    /// and a size-`rhs.cols()` scratch marker. The result is compressed.
    ///
    /// Fails with [`Error::NotCompressed`] if either operand has pending
    /// edits.
    ///
    /// # Panics
    /// If the inner dimensions disagree.
    pub fn multiply(&self, rhs: &SparseBitMatrix) -> Result<SparseBitMatrix> {
        if !self.compressed || !rhs.compressed {
            return Err(Error::NotCompressed);
        }
        assert_eq!(self.ncols, rhs.nrows, "inner dimensions must agree");

        let mut marker = vec![false; rhs.ncols];
        let mut touched: Vec<u32> = Vec::new();
        let mut row_ptr = Vec::with_capacity(self.nrows + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for r in 0..self.nrows {
            touched.clear();
            for k in self.row_ptr[r]..self.row_ptr[r + 1] {
                let mid = self.col_idx[k] as usize;
                for kk in rhs.row_ptr[mid]..rhs.row_ptr[mid + 1] {
                    let c = rhs.col_idx[kk];
                    if !marker[c as usize] {
                        marker[c as usize] = true;
                        touched.push(c);
                    }
                }
            }
            touched.sort_unstable();
            for &c in &touched {
                marker[c as usize] = false;
                col_idx.push(c);
            }
            row_ptr.push(col_idx.len());
        }
        let values = vec![true; col_idx.len()];
        Ok(SparseBitMatrix {
            nrows: self.nrows,
            ncols: rhs.ncols,
            row_ptr,
            col_idx,
            values,
            pending: OrderedMap::new(),
            compressed: true,
        })
    }
}

/// Iterator over one row of a compressed matrix, yielding `(column, value)`.
#[derive(Debug, Clone)]
pub struct RowIter<'a, T> {
    cols: &'a [u32],
    values: &'a [T],
    pos: usize,
}

impl<T: Copy> Iterator for RowIter<'_, T> {
    type Item = (u32, T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.cols.len() {
            let item = (self.cols[self.pos], self.values[self.pos]);
            self.pos += 1;
            Some(item)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSet;
    use itertools::Itertools;

    #[test]
    fn triplets_merge_duplicates() {
        let m = SparseEventMatrix::from_triplets(
            3,
            3,
            [
                (0, 1, EventSet::singleton(2)),
                (2, 0, EventSet::singleton(1)),
                (0, 1, EventSet::singleton(5)),
            ],
        );
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.coeff(0, 1), [2, 5].into_iter().collect());
        assert_eq!(m.coeff(2, 0), EventSet::singleton(1));
        assert!(m.coeff(1, 1).is_empty());
    }

    #[test]
    fn row_iteration_is_column_ordered() {
        let m = SparseBitMatrix::from_triplets(2, 4, [(0, 3, true), (0, 0, true), (0, 2, true)]);
        assert_eq!(m.row_iter(0).unwrap().map(|(c, _)| c).collect_vec(), vec![0, 2, 3]);
        assert_eq!(m.row_iter(1).unwrap().count(), 0);
    }

    #[test]
    fn pending_edits_block_reads() {
        let mut m = SparseBitMatrix::identity(2);
        m.join_cell(0, 1, true);
        assert_eq!(m.row_iter(0).unwrap_err(), Error::NotCompressed);
        assert_eq!(m.transpose().unwrap_err(), Error::NotCompressed);
        assert!(m.coeff(0, 1));
        m.make_compressed();
        assert_eq!(m.row_iter(0).unwrap().map(|(c, _)| c).collect_vec(), vec![0, 1]);
    }

    #[test]
    fn assigning_bottom_clears_a_cell() {
        let mut m = SparseEventMatrix::from_triplets(2, 2, [(0, 1, EventSet::singleton(0))]);
        m.set_cell(0, 1, EventSet::new());
        assert!(m.coeff(0, 1).is_empty());
        assert!(m.row_entries(0).is_empty());
        m.make_compressed();
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn transpose_roundtrip() {
        let m = SparseBitMatrix::from_triplets(3, 2, [(0, 1, true), (2, 0, true), (2, 1, true)]);
        let t = m.transpose().unwrap();
        assert_eq!(t.rows(), 2);
        assert_eq!(t.cols(), 3);
        assert!(t.coeff(1, 0) && t.coeff(0, 2) && t.coeff(1, 2));
        assert_eq!(t.transpose().unwrap(), m);
    }

    #[test]
    fn boolean_product() {
        // Path graph 0 -> 1 -> 2 with identity overlay.
        let mut g = SparseBitMatrix::identity(3);
        g.join_cell(0, 1, true);
        g.join_cell(1, 2, true);
        g.make_compressed();

        let x = SparseBitMatrix::from_triplets(3, 1, [(0, 0, true)]);
        let one = g.transpose().unwrap().multiply(&x).unwrap();
        assert_eq!(one.nonempty_rows().unwrap().collect_vec(), vec![0, 1]);
        let two = g.transpose().unwrap().multiply(&one).unwrap();
        assert_eq!(two.nonempty_rows().unwrap().collect_vec(), vec![0, 1, 2]);
    }
}
