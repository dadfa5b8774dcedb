//! Sparse matrix utilities for the girder-line solves
//!
//! Girder-line stiffness matrices are narrow-banded once the nodes are ordered
//! along the line, so a skyline Cholesky factorization is both compact and fast.
//! The factorization is kept and reused for every right-hand side of a stage
//! (influence-line dislocations, unit loads, load sets).

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::error::{BridgeError, BridgeResult};

/// Pivots smaller than this fraction of the original diagonal are treated as zero
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-12;

/// Sparse matrix builder using COO format
/// More efficient for incremental assembly
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // A frame element touches 12 DOFs: 144 entries shared by two nodes
        Self {
            size,
            entries: Vec::with_capacity(size * 24),
        }
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    /// Scatter a 12x12 element matrix into the global DOFs
    pub fn add_element_matrix(&mut self, dofs: &[usize; 12], k_elem: &crate::math::Mat12) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k_elem[(i, j)]);
            }
        }
    }

    /// Convert to CSR format for efficient solves
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Get estimated non-zero count
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// Skyline Cholesky solver for symmetric positive definite matrices
///
/// Built once per stage; `solve` can then be called for any number of
/// right-hand sides.
#[derive(Debug, Clone)]
pub struct SparseCholeskySolver {
    size: usize,
    // Skyline storage: for each row, from the first non-zero to the diagonal
    skyline: Vec<Vec<f64>>,
    // Row heights (distance from the diagonal to the first non-zero)
    heights: Vec<usize>,
    pivot_tolerance: f64,
    factorized: bool,
}

impl SparseCholeskySolver {
    /// Create solver from CSR matrix (lower triangle is read)
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut skyline: Vec<Vec<f64>> = heights.iter().map(|&h| vec![0.0; h + 1]).collect();

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                let start = row - heights[row];
                skyline[row][col - start] += val;
            }
        }

        Self {
            size,
            skyline,
            heights,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            factorized: false,
        }
    }

    /// Override the relative pivot tolerance
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    /// Build and factorize in one step
    pub fn factorized(csr: &CsrMatrix<f64>, pivot_tolerance: f64) -> BridgeResult<Self> {
        let mut solver = Self::new(csr).with_pivot_tolerance(pivot_tolerance);
        solver.factorize()?;
        Ok(solver)
    }

    /// Matrix dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Factorize the matrix in place (L stored in the skyline)
    ///
    /// A pivot that is not positive, or that falls below `pivot_tolerance`
    /// times the original diagonal entry, means the structure is a mechanism.
    pub fn factorize(&mut self) -> BridgeResult<()> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let start_i = i - hi;
            let original_diag = self.skyline[i][hi];

            for j in start_i..i {
                let start_j = j - self.heights[j];
                let start = start_i.max(start_j);

                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }

                let diag_j = self.skyline[j][self.heights[j]];
                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / diag_j;
            }

            let mut sum = 0.0;
            for j in start_i..i {
                let val = self.get(i, j);
                sum += val * val;
            }

            let diag = self.skyline[i][hi] - sum;
            if !(diag > self.pivot_tolerance * original_diag.abs()) || !diag.is_finite() {
                return Err(BridgeError::Singularity {
                    context: format!("pivot {diag:.3e} at equation {i}"),
                });
            }
            self.skyline[i][hi] = diag.sqrt();
        }

        self.factorized = true;
        Ok(())
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        if col > row {
            return self.get(col, row);
        }
        let start = row - self.heights[row];
        if col < start {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Solve L * L^T * x = b
    pub fn solve(&self, b: &DVector<f64>) -> BridgeResult<DVector<f64>> {
        if !self.factorized {
            return Err(BridgeError::InvalidInput(
                "solve called before factorization".into(),
            ));
        }
        if b.len() != self.size {
            return Err(BridgeError::InvalidInput(format!(
                "right-hand side has {} entries, expected {}",
                b.len(),
                self.size
            )));
        }

        let mut x = b.clone();

        // Forward substitution: L * y = b
        for i in 0..self.size {
            let start = i - self.heights[i];
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // Backward substitution: L^T * x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        Ok(x)
    }
}

/// Bandwidth reduction using Reverse Cuthill-McKee algorithm
///
/// `adjacency[i]` lists the neighbours of node `i`. Returns the new order:
/// `result[k]` is the old index placed at position `k`.
pub fn reverse_cuthill_mckee(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    if n == 0 {
        return vec![];
    }

    let degrees: Vec<usize> = adjacency.iter().map(|v| v.len()).collect();

    let mut adj: Vec<Vec<usize>> = adjacency.to_vec();
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| (degrees[i], i));
        neighbors.dedup();
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();

    let start = (0..n).min_by_key(|&i| (degrees[i], i)).unwrap_or(0);
    queue.push_back(start);
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        result.push(node);

        for &neighbor in &adj[node] {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }

        // Handle disconnected components
        if queue.is_empty() && result.len() < n {
            if let Some(next) = (0..n)
                .filter(|&i| !visited[i])
                .min_by_key(|&i| (degrees[i], i))
            {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    result.reverse();
    result
}

/// Create inverse permutation
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}
