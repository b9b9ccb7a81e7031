use nalgebra::DMatrix;

/// Triplet structure of a sparse matrix.
///
/// Entries are stored in a fixed order; value arrays produced against this
/// structure (such as constraint Jacobian values) follow the same order.
/// Repeated `(row, col)` pairs are allowed and sum when densified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sparsity {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize)>,
}

impl Sparsity {
    /// Creates an empty structure of the given shape.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    /// Appends an entry and returns its position in value arrays.
    ///
    /// # Panics
    ///
    /// Panics if the entry lies outside the declared shape.
    pub fn push(&mut self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "entry ({row}, {col}) outside a {}x{} structure",
            self.rows,
            self.cols
        );
        self.entries.push((row, col));
        self.entries.len() - 1
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    /// Scatters `values`, given in structure order, into a dense matrix.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold one value per entry.
    #[must_use]
    pub fn to_dense(&self, values: &[f64]) -> DMatrix<f64> {
        assert_eq!(values.len(), self.nnz(), "one value per entry");
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for (&(row, col), value) in self.entries.iter().zip(values) {
            dense[(row, col)] += value;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_insertion_order() {
        let mut s = Sparsity::new(2, 3);
        assert_eq!(s.push(1, 2), 0);
        assert_eq!(s.push(0, 0), 1);
        assert_eq!(s.push(1, 2), 2);
        assert_eq!(s.nnz(), 3);

        let dense = s.to_dense(&[1.0, 2.0, 3.0]);
        assert_eq!(dense[(0, 0)], 2.0);
        assert_eq!(dense[(1, 2)], 4.0);
        assert_eq!(dense[(0, 1)], 0.0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_shape_entries_panic() {
        Sparsity::new(1, 1).push(1, 0);
    }
}
