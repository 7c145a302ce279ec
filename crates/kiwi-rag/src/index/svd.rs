//! Randomized truncated SVD for dimensionality reduction of the TF-IDF
//! matrix. Deterministic for a fixed seed; no LAPACK, just a range finder
//! with power iterations, Gram-Schmidt QR and a Jacobi eigensolver on the
//! small projected matrix.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::SparseVec;

const OVERSAMPLING: usize = 10;
const POWER_ITERATIONS: usize = 2;
const JACOBI_SWEEPS: usize = 30;
const JACOBI_EPS: f32 = 1e-9;

/// Fitted projection: `components` maps a TF-IDF vector (dim d) onto the
/// reduced space (dim k), columns scaled so projected rows match U·Σ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncatedSvd {
    components: Array2<f32>,
    n_components: usize,
}

impl TruncatedSvd {
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Decompose the sparse corpus matrix (n rows, `dim` columns) and return
    /// the fitted projection together with the reduced row matrix (n × k).
    pub fn fit_transform(
        rows: &[SparseVec],
        dim: usize,
        k: usize,
        seed: u64,
    ) -> (Self, Array2<f32>) {
        let n = rows.len();
        let l = (k + OVERSAMPLING).min(n).min(dim);

        // Range finder: Y = A·Ω with a seeded Gaussian test matrix, then
        // power iterations to sharpen the captured subspace.
        let mut rng = StdRng::seed_from_u64(seed);
        let omega = Array2::from_shape_fn((dim, l), |_| standard_normal(&mut rng));
        let mut q = orthonormalize(sparse_matmul(rows, &omega));
        for _ in 0..POWER_ITERATIONS {
            let z = orthonormalize(sparse_t_matmul(rows, &q));
            q = orthonormalize(sparse_matmul(rows, &z));
        }

        // B = Qᵀ·A is small (l × dim); its Gram matrix B·Bᵀ gives the
        // singular values and left factors via a symmetric eigensolve.
        let b = transpose_times_sparse(&q, rows, dim);
        let gram = b.dot(&b.t());
        let (eigvals, eigvecs) = jacobi_eigen(gram);

        let mut order: Vec<usize> = (0..eigvals.len()).collect();
        order.sort_by(|&a, &c| {
            eigvals[c]
                .partial_cmp(&eigvals[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(k);

        // V·Σ⁻¹ columns from B: components[:, j] = Bᵀ·u_j / σ_j, so a row
        // projected through them lands at u·Σ scale.
        let mut components = Array2::<f32>::zeros((dim, order.len()));
        for (j, &idx) in order.iter().enumerate() {
            let sigma = eigvals[idx].max(0.0).sqrt();
            if sigma <= f32::EPSILON {
                continue;
            }
            let u_j = eigvecs.column(idx);
            for d in 0..dim {
                let mut acc = 0.0f32;
                for r in 0..b.nrows() {
                    acc += b[[r, d]] * u_j[r];
                }
                components[[d, j]] = acc / sigma;
            }
        }

        let svd = Self {
            n_components: components.ncols(),
            components,
        };
        let reduced = svd.transform_rows(rows);
        (svd, reduced)
    }

    /// Project one sparse vector into the reduced space.
    pub fn transform(&self, row: &SparseVec) -> Array1<f32> {
        let mut out = Array1::<f32>::zeros(self.n_components);
        for &(col, weight) in row {
            let col = col as usize;
            if col >= self.components.nrows() {
                continue;
            }
            for j in 0..self.n_components {
                out[j] += weight * self.components[[col, j]];
            }
        }
        out
    }

    fn transform_rows(&self, rows: &[SparseVec]) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((rows.len(), self.n_components));
        for (i, row) in rows.iter().enumerate() {
            out.row_mut(i).assign(&self.transform(row));
        }
        out
    }
}

/// Box-Muller sample from N(0, 1).
fn standard_normal(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// A·M for sparse A (n × d) and dense M (d × l).
fn sparse_matmul(rows: &[SparseVec], m: &Array2<f32>) -> Array2<f32> {
    let l = m.ncols();
    let mut out = Array2::<f32>::zeros((rows.len(), l));
    for (i, row) in rows.iter().enumerate() {
        for &(col, weight) in row {
            let col = col as usize;
            for j in 0..l {
                out[[i, j]] += weight * m[[col, j]];
            }
        }
    }
    out
}

/// Aᵀ·M for sparse A (n × d) and dense M (n × l), giving d × l.
fn sparse_t_matmul(rows: &[SparseVec], m: &Array2<f32>) -> Array2<f32> {
    let d = rows
        .iter()
        .flat_map(|r| r.iter().map(|&(c, _)| c as usize + 1))
        .max()
        .unwrap_or(0)
        .max(1);
    let l = m.ncols();
    let mut out = Array2::<f32>::zeros((d, l));
    for (i, row) in rows.iter().enumerate() {
        for &(col, weight) in row {
            let col = col as usize;
            for j in 0..l {
                out[[col, j]] += weight * m[[i, j]];
            }
        }
    }
    out
}

/// Qᵀ·A for dense Q (n × l) and sparse A (n × d), giving l × d.
fn transpose_times_sparse(q: &Array2<f32>, rows: &[SparseVec], dim: usize) -> Array2<f32> {
    let l = q.ncols();
    let mut out = Array2::<f32>::zeros((l, dim));
    for (i, row) in rows.iter().enumerate() {
        for &(col, weight) in row {
            let col = col as usize;
            for j in 0..l {
                out[[j, col]] += q[[i, j]] * weight;
            }
        }
    }
    out
}

/// Modified Gram-Schmidt: orthonormal basis for the column span of `m`.
/// Near-zero columns collapse to zero instead of being renormalized.
fn orthonormalize(mut m: Array2<f32>) -> Array2<f32> {
    let cols = m.ncols();
    for j in 0..cols {
        for i in 0..j {
            let proj = m.column(i).dot(&m.column(j));
            let prior = m.column(i).to_owned();
            m.column_mut(j).scaled_add(-proj, &prior);
        }
        let norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm > 1e-8 {
            m.column_mut(j).mapv_inplace(|x| x / norm);
        } else {
            m.column_mut(j).fill(0.0);
        }
    }
    m
}

/// Cyclic Jacobi eigendecomposition of a small symmetric matrix. Returns
/// (eigenvalues, eigenvectors as columns), unsorted.
fn jacobi_eigen(mut a: Array2<f32>) -> (Vec<f32>, Array2<f32>) {
    let n = a.nrows();
    let mut v = Array2::<f32>::eye(n);

    for _ in 0..JACOBI_SWEEPS {
        let mut off_diag = 0.0f32;
        for p in 0..n {
            for q in (p + 1)..n {
                off_diag += a[[p, q]] * a[[p, q]];
            }
        }
        if off_diag < JACOBI_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[[p, q]].abs() < JACOBI_EPS {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * a[[p, q]]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for i in 0..n {
                    let aip = a[[i, p]];
                    let aiq = a[[i, q]];
                    a[[i, p]] = c * aip - s * aiq;
                    a[[i, q]] = s * aip + c * aiq;
                }
                for i in 0..n {
                    let api = a[[p, i]];
                    let aqi = a[[q, i]];
                    a[[p, i]] = c * api - s * aqi;
                    a[[q, i]] = s * api + c * aqi;
                }
                for i in 0..n {
                    let vip = v[[i, p]];
                    let viq = v[[i, q]];
                    v[[i, p]] = c * vip - s * viq;
                    v[[i, q]] = s * vip + c * viq;
                }
            }
        }
    }

    let eigvals = a.diag().to_vec();
    (eigvals, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> (Vec<SparseVec>, usize) {
        // Two topic clusters in a 6-dim space.
        let rows = vec![
            vec![(0, 0.9), (1, 0.4)],
            vec![(0, 0.8), (1, 0.5), (2, 0.1)],
            vec![(3, 0.7), (4, 0.7)],
            vec![(3, 0.6), (4, 0.6), (5, 0.4)],
            vec![(0, 0.5), (3, 0.5)],
        ];
        (rows, 6)
    }

    fn cosine(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
        let dot = a.dot(b);
        let na = a.dot(a).sqrt();
        let nb = b.dot(b).sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    #[test]
    fn test_reduced_shape_matches_request() {
        let (rows, dim) = sample_rows();
        let (svd, reduced) = TruncatedSvd::fit_transform(&rows, dim, 3, 42);
        assert_eq!(svd.n_components(), 3);
        assert_eq!(reduced.nrows(), 5);
        assert_eq!(reduced.ncols(), 3);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (rows, dim) = sample_rows();
        let (_, a) = TruncatedSvd::fit_transform(&rows, dim, 2, 42);
        let (_, b) = TruncatedSvd::fit_transform(&rows, dim, 2, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_matches_fit_rows() {
        let (rows, dim) = sample_rows();
        let (svd, reduced) = TruncatedSvd::fit_transform(&rows, dim, 2, 42);
        for (i, row) in rows.iter().enumerate() {
            let projected = svd.transform(row);
            for j in 0..2 {
                assert!((projected[j] - reduced[[i, j]]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_cluster_structure_survives_reduction() {
        let (rows, dim) = sample_rows();
        let (_, reduced) = TruncatedSvd::fit_transform(&rows, dim, 2, 42);
        let r0 = reduced.row(0).to_owned();
        let r1 = reduced.row(1).to_owned();
        let r2 = reduced.row(2).to_owned();
        // Same-cluster rows stay closer than cross-cluster rows.
        assert!(cosine(&r0, &r1) > cosine(&r0, &r2));
    }

    #[test]
    fn test_serde_round_trip() {
        let (rows, dim) = sample_rows();
        let (svd, _) = TruncatedSvd::fit_transform(&rows, dim, 2, 42);
        let bytes = bincode::serialize(&svd).unwrap();
        let restored: TruncatedSvd = bincode::deserialize(&bytes).unwrap();
        let query: SparseVec = vec![(0, 1.0)];
        assert_eq!(svd.transform(&query), restored.transform(&query));
    }
}
