//! A dense, row-major matrix: the language's one aggregate value. Built on a
//! flat `Vec<Complex>` plus a `(rows, cols)` shape, the way a tensor buffer
//! would be, rather than nested `Vec<Vec<_>>` — that keeps element access and
//! reshaping a single index computation instead of a walk through row
//! vectors. A real-only matrix is simply one whose elements all carry a zero
//! imaginary part; `is_real` reports which kind a given instance is, and the
//! handful of operations only meaningfully defined over the reals (`max`,
//! `min`, non-square `rank`'s pivoting) require it.

use std::fmt;

use crate::complex::Complex;
use crate::error::RuntimeError;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<Complex>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// The empty matrix has shape `(1, 0)` (§3), not `(0, 0)` — so that a
    /// single `concat` onto it (appending the first row/column) is a
    /// well-defined shape transition rather than a special case.
    pub fn empty() -> Matrix {
        Matrix { data: Vec::new(), rows: 1, cols: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix, RuntimeError> {
        Matrix::from_rows_complex(rows.into_iter().map(|r| r.into_iter().map(Complex::from).collect()).collect())
    }

    pub fn from_rows_complex(rows: Vec<Vec<Complex>>) -> Result<Matrix, RuntimeError> {
        if rows.is_empty() {
            return Ok(Matrix::empty());
        }
        let cols = rows[0].len();
        if rows.iter().any(|r| r.len() != cols) {
            return Err(RuntimeError::MatrixDimension(
                "matrix literal rows have inconsistent lengths".to_string(),
            ));
        }
        let nrows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Matrix { data, rows: nrows, cols })
    }

    pub fn from_flat(data: Vec<f64>, rows: usize, cols: usize) -> Matrix {
        Matrix::from_flat_complex(data.into_iter().map(Complex::from).collect(), rows, cols)
    }

    pub fn from_flat_complex(data: Vec<Complex>, rows: usize, cols: usize) -> Matrix {
        debug_assert_eq!(data.len(), rows * cols);
        Matrix { data, rows, cols }
    }

    pub fn scalar(value: f64) -> Matrix {
        Matrix::scalar_complex(Complex::from(value))
    }

    pub fn scalar_complex(value: Complex) -> Matrix {
        Matrix { data: vec![value], rows: 1, cols: 1 }
    }

    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { data: vec![Complex::new(0.0, 0.0); rows * cols], rows, cols }
    }

    pub fn ones(rows: usize, cols: usize) -> Matrix {
        Matrix { data: vec![Complex::new(1.0, 0.0); rows * cols], rows, cols }
    }

    pub fn eye(n: usize) -> Matrix {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.set_raw(i, i, Complex::new(1.0, 0.0));
        }
        m
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// Every element's imaginary part is exactly zero.
    pub fn is_real(&self) -> bool {
        self.data.iter().all(|c| c.im == 0.0)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        self.as_scalar_complex().filter(|c| c.im == 0.0).map(|c| c.re)
    }

    pub fn as_scalar_complex(&self) -> Option<Complex> {
        if self.is_scalar() {
            Some(self.data[0])
        } else {
            None
        }
    }

    fn get_raw(&self, r: usize, c: usize) -> Complex {
        self.data[r * self.cols + c]
    }

    fn set_raw(&mut self, r: usize, c: usize, value: Complex) {
        self.data[r * self.cols + c] = value;
    }

    /// Translates a 1-based surface index into a 0-based `(row, col)` pair,
    /// the single place `.hk`'s 1-based element access meets the 0-based
    /// storage underneath.
    pub fn resolve_index(&self, row1: i64, col1: i64) -> Result<(usize, usize), RuntimeError> {
        if row1 < 1 || col1 < 1 || row1 as usize > self.rows || col1 as usize > self.cols {
            return Err(RuntimeError::IndexArity(format!(
                "index ({row1}, {col1}) out of bounds for a {}x{} matrix",
                self.rows, self.cols
            )));
        }
        Ok((row1 as usize - 1, col1 as usize - 1))
    }

    pub fn get(&self, row1: i64, col1: i64) -> Result<Complex, RuntimeError> {
        let (r, c) = self.resolve_index(row1, col1)?;
        Ok(self.get_raw(r, c))
    }

    pub fn set(&mut self, row1: i64, col1: i64, value: Complex) -> Result<(), RuntimeError> {
        let (r, c) = self.resolve_index(row1, col1)?;
        self.set_raw(r, c, value);
        Ok(())
    }

    /// Row-major flat view of every element (§4.1 `vector()`).
    pub fn vector(&self) -> Vec<Complex> {
        self.data.clone()
    }

    /// List-of-rows view (§4.1 `rows()`) — a real-only projection, since
    /// nothing in the language currently surfaces a complex-valued list.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|r| self.data[r * self.cols..(r + 1) * self.cols].iter().map(|c| c.re).collect()).collect()
    }

    /// List-of-columns view (§4.1 `columns()`), real-only like `rows()`.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.cols).map(|c| (0..self.rows).map(|r| self.get_raw(r, c).re).collect()).collect()
    }

    pub fn row(&self, row1: i64) -> Result<Matrix, RuntimeError> {
        let (r, _) = self.resolve_index(row1, 1)?;
        Ok(Matrix::from_flat_complex(self.data[r * self.cols..(r + 1) * self.cols].to_vec(), 1, self.cols))
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set_raw(c, r, self.get_raw(r, c));
            }
        }
        out
    }

    fn elementwise(&self, other: &Matrix, op: impl Fn(Complex, Complex) -> Complex) -> Result<Matrix, RuntimeError> {
        if self.shape() != other.shape() {
            return Err(RuntimeError::MatrixDimension(format!(
                "shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        let data = self.data.iter().zip(&other.data).map(|(a, b)| op(*a, *b)).collect();
        Ok(Matrix::from_flat_complex(data, self.rows, self.cols))
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        self.elementwise(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        self.elementwise(other, |a, b| a - b)
    }

    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        self.elementwise(other, |a, b| a * b)
    }

    pub fn scale(&self, k: f64) -> Matrix {
        self.scale_complex(Complex::from(k))
    }

    pub fn scale_complex(&self, k: Complex) -> Matrix {
        Matrix::from_flat_complex(self.data.iter().map(|v| *v * k).collect(), self.rows, self.cols)
    }

    pub fn matmul(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        if self.cols != other.rows {
            return Err(RuntimeError::MatrixDimension(format!(
                "cannot multiply a {}x{} matrix by a {}x{} matrix",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut acc = Complex::new(0.0, 0.0);
                for k in 0..self.cols {
                    acc = acc + self.get_raw(r, k) * other.get_raw(k, c);
                }
                out.set_raw(r, c, acc);
            }
        }
        Ok(out)
    }

    pub fn concat_horizontal(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        if self.rows != other.rows {
            return Err(RuntimeError::MatrixDimension("concat requires matching row counts".to_string()));
        }
        let mut out = Matrix::zeros(self.rows, self.cols + other.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set_raw(r, c, self.get_raw(r, c));
            }
            for c in 0..other.cols {
                out.set_raw(r, self.cols + c, other.get_raw(r, c));
            }
        }
        Ok(out)
    }

    pub fn concat_vertical(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        if self.cols != other.cols {
            return Err(RuntimeError::MatrixDimension("concat requires matching column counts".to_string()));
        }
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        Ok(Matrix::from_flat_complex(data, self.rows + other.rows, self.cols))
    }

    /// `concat(other, axis)` (§4.1): axis 0 appends rows (vertical), axis 1
    /// appends columns (horizontal). An empty `self` is simply replaced by
    /// `other` rather than dimension-checked, so building up a matrix by
    /// repeated concat from `Matrix::empty()` works regardless of axis.
    pub fn concat(&mut self, other: &Matrix, axis: usize) -> Result<(), RuntimeError> {
        if self.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if other.is_empty() {
            return Ok(());
        }
        *self = match axis {
            0 => self.concat_vertical(other)?,
            1 => self.concat_horizontal(other)?,
            _ => return Err(RuntimeError::MatrixDimension(format!("concat axis must be 0 or 1, got {axis}"))),
        };
        Ok(())
    }

    /// Elementwise `self + k` (scalar broadcast).
    pub fn add_scalar(&self, k: f64) -> Matrix {
        let k = Complex::from(k);
        Matrix::from_flat_complex(self.data.iter().map(|v| *v + k).collect(), self.rows, self.cols)
    }

    /// Elementwise `self - k`.
    pub fn sub_scalar(&self, k: f64) -> Matrix {
        let k = Complex::from(k);
        Matrix::from_flat_complex(self.data.iter().map(|v| *v - k).collect(), self.rows, self.cols)
    }

    /// Elementwise `k - self` — kept distinct from `sub_scalar` since `-` is
    /// not commutative; `2 - M` and `M - 2` must not produce the same result.
    pub fn scalar_sub(&self, k: f64) -> Matrix {
        let k = Complex::from(k);
        Matrix::from_flat_complex(self.data.iter().map(|v| k - *v).collect(), self.rows, self.cols)
    }

    /// Elementwise `self / k`.
    pub fn div_scalar(&self, k: f64) -> Matrix {
        let k = Complex::from(k);
        Matrix::from_flat_complex(self.data.iter().map(|v| *v / k).collect(), self.rows, self.cols)
    }

    /// Elementwise `k / self`.
    pub fn scalar_div(&self, k: f64) -> Matrix {
        let k = Complex::from(k);
        Matrix::from_flat_complex(self.data.iter().map(|v| k / *v).collect(), self.rows, self.cols)
    }

    /// `.^` with a scalar exponent: elementwise `v.powf(k)`, generalized to a
    /// complex base through its polar form when `v` genuinely carries an
    /// imaginary part (a real `v` takes the exact same path `f64::powf` did).
    pub fn pow_scalar(&self, k: f64) -> Matrix {
        Matrix::from_flat_complex(self.data.iter().map(|v| complex_powf(*v, k)).collect(), self.rows, self.cols)
    }

    /// `.^` between two equal-shaped matrices: elementwise `a.powf(b)`. The
    /// exponent matrix must be real — a complex exponent has no defined
    /// meaning here.
    pub fn pow_elementwise(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        if self.shape() != other.shape() {
            return Err(RuntimeError::MatrixDimension(format!(
                "shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        if !other.is_real() {
            return Err(RuntimeError::TypeMismatch(".^ requires a real exponent matrix".to_string()));
        }
        let data = self.data.iter().zip(&other.data).map(|(a, b)| complex_powf(*a, b.re)).collect();
        Ok(Matrix::from_flat_complex(data, self.rows, self.cols))
    }

    /// `^` with an integer exponent: ordinary matrix power. `0` gives the
    /// identity, negative exponents go through `inv()`, and a fractional
    /// exponent is rejected (that is `.^`'s job, not `^`'s).
    pub fn pow_integer(&self, exp: f64) -> Result<Matrix, RuntimeError> {
        if self.rows != self.cols {
            return Err(RuntimeError::MatrixDimension("^ requires a square matrix".to_string()));
        }
        if exp.fract() != 0.0 {
            return Err(RuntimeError::MatrixExponent(format!("matrix exponent must be an integer, got {exp}")));
        }
        let n = exp as i64;
        if n == 0 {
            return Ok(Matrix::eye(self.rows));
        }
        let (base, count) = if n < 0 { (self.inv()?, -n) } else { (self.clone(), n) };
        let mut out = Matrix::eye(self.rows);
        for _ in 0..count {
            out = out.matmul(&base)?;
        }
        Ok(out)
    }

    /// Gathers rows by 1-based index, in the given order (repeats allowed) —
    /// used for both slice-materialized and fancy vector-Matrix row indexing.
    pub fn select_rows(&self, idx1: &[i64]) -> Result<Matrix, RuntimeError> {
        let mut data = Vec::with_capacity(idx1.len() * self.cols);
        for &i in idx1 {
            let (r, _) = self.resolve_index(i, 1)?;
            data.extend_from_slice(&self.data[r * self.cols..(r + 1) * self.cols]);
        }
        Ok(Matrix::from_flat_complex(data, idx1.len(), self.cols))
    }

    /// Gathers columns by 1-based index, mirroring `select_rows`.
    pub fn select_cols(&self, idx1: &[i64]) -> Result<Matrix, RuntimeError> {
        let mut data = vec![Complex::new(0.0, 0.0); self.rows * idx1.len()];
        for (out_c, &i) in idx1.iter().enumerate() {
            let (_, c) = self.resolve_index(1, i)?;
            for r in 0..self.rows {
                data[r * idx1.len() + out_c] = self.get_raw(r, c);
            }
        }
        Ok(Matrix::from_flat_complex(data, self.rows, idx1.len()))
    }

    /// Two-index fancy selection: the cross product of `rows1 x cols1`.
    pub fn select(&self, rows1: &[i64], cols1: &[i64]) -> Result<Matrix, RuntimeError> {
        let mut data = Vec::with_capacity(rows1.len() * cols1.len());
        for &r1 in rows1 {
            for &c1 in cols1 {
                data.push(self.get(r1, c1)?);
            }
        }
        Ok(Matrix::from_flat_complex(data, rows1.len(), cols1.len()))
    }

    pub fn reshape(&self, rows: usize, cols: usize) -> Result<Matrix, RuntimeError> {
        if rows * cols != self.data.len() {
            return Err(RuntimeError::MatrixDimension(format!(
                "cannot reshape a {}-element matrix into {}x{}",
                self.data.len(),
                rows,
                cols
            )));
        }
        Ok(Matrix::from_flat_complex(self.data.clone(), rows, cols))
    }

    pub fn trace(&self) -> Result<Complex, RuntimeError> {
        if self.rows != self.cols {
            return Err(RuntimeError::MatrixDimension("trace requires a square matrix".to_string()));
        }
        Ok((0..self.rows).map(|i| self.get_raw(i, i)).fold(Complex::new(0.0, 0.0), |a, b| a + b))
    }

    /// Constructs an N×N diagonal matrix from this matrix's elements (taken
    /// row-major, via `vector()`) — the constructor the spec's `diag`
    /// alongside `eye`/`zeros`/`ones`, not an extractor.
    pub fn diagonal(&self) -> Matrix {
        let v = self.vector();
        let n = v.len();
        let mut out = Matrix::zeros(n, n);
        for (i, c) in v.into_iter().enumerate() {
            out.set_raw(i, i, c);
        }
        out
    }

    pub fn max(&self) -> Result<f64, RuntimeError> {
        if !self.is_real() {
            return Err(RuntimeError::TypeMismatch("max requires a real matrix".to_string()));
        }
        Ok(self.data.iter().map(|c| c.re).fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn min(&self) -> Result<f64, RuntimeError> {
        if !self.is_real() {
            return Err(RuntimeError::TypeMismatch("min requires a real matrix".to_string()));
        }
        Ok(self.data.iter().map(|c| c.re).fold(f64::INFINITY, f64::min))
    }

    pub fn norm(&self) -> f64 {
        self.data.iter().map(|c| c.re * c.re + c.im * c.im).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &Matrix) -> Result<Complex, RuntimeError> {
        if self.data.len() != other.data.len() {
            return Err(RuntimeError::MatrixDimension("dot requires matrices of equal size".to_string()));
        }
        Ok(self.data.iter().zip(&other.data).map(|(a, b)| *a * *b).fold(Complex::new(0.0, 0.0), |a, b| a + b))
    }

    pub fn cross(&self, other: &Matrix) -> Result<Matrix, RuntimeError> {
        if self.data.len() != 3 || other.data.len() != 3 {
            return Err(RuntimeError::MatrixDimension("cross requires two 3-element vectors".to_string()));
        }
        let (a, b) = (&self.data, &other.data);
        Ok(Matrix::from_flat_complex(
            vec![
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ],
            self.rows,
            self.cols,
        ))
    }

    /// Gauss-Jordan elimination with partial (magnitude) pivoting; used by
    /// `det`, `inv` and `rank` alike so the three share one numerically
    /// stable core. Works over `Complex` throughout — a real matrix stays
    /// real end to end since every operation involved preserves a zero
    /// imaginary part.
    fn gauss_jordan(&self) -> Option<(Vec<Vec<Complex>>, Complex, usize)> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        let mut a: Vec<Vec<Complex>> = (0..n).map(|r| (0..n).map(|c| self.get_raw(r, c)).collect()).collect();
        let mut inv: Vec<Vec<Complex>> = (0..n)
            .map(|r| (0..n).map(|c| if r == c { Complex::new(1.0, 0.0) } else { Complex::new(0.0, 0.0) }).collect())
            .collect();
        let mut det = Complex::new(1.0, 0.0);
        let mut rank = 0;
        for col in 0..n {
            let pivot_row = (col..n).max_by(|&r1, &r2| a[r1][col].norm().partial_cmp(&a[r2][col].norm()).unwrap());
            let Some(pivot_row) = pivot_row else { continue };
            if a[pivot_row][col].norm() < 1e-12 {
                det = Complex::new(0.0, 0.0);
                continue;
            }
            if pivot_row != col {
                a.swap(pivot_row, col);
                inv.swap(pivot_row, col);
                det = -det;
            }
            let pivot = a[col][col];
            det = det * pivot;
            for v in a[col].iter_mut() {
                *v = *v / pivot;
            }
            for v in inv[col].iter_mut() {
                *v = *v / pivot;
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[r][col];
                if factor.norm() == 0.0 {
                    continue;
                }
                for c in 0..n {
                    a[r][c] = a[r][c] - factor * a[col][c];
                    inv[r][c] = inv[r][c] - factor * inv[col][c];
                }
            }
            rank += 1;
        }
        Some((inv, det, rank))
    }

    pub fn det(&self) -> Result<Complex, RuntimeError> {
        let (_, det, _) = self
            .gauss_jordan()
            .ok_or_else(|| RuntimeError::MatrixDimension("det requires a square matrix".to_string()))?;
        Ok(det)
    }

    pub fn inv(&self) -> Result<Matrix, RuntimeError> {
        let (inv, det, _) = self
            .gauss_jordan()
            .ok_or_else(|| RuntimeError::MatrixDimension("inv requires a square matrix".to_string()))?;
        if det.norm() < 1e-12 {
            return Err(RuntimeError::MatrixDimension("matrix is singular".to_string()));
        }
        Ok(Matrix::from_flat_complex(inv.into_iter().flatten().collect(), self.rows, self.cols))
    }

    pub fn rank(&self) -> Result<usize, RuntimeError> {
        if self.rows == self.cols {
            let (_, _, rank) = self
                .gauss_jordan()
                .ok_or_else(|| RuntimeError::MatrixDimension("rank requires a matrix".to_string()))?;
            return Ok(rank);
        }
        // Non-square: row-reduce a copy to count nonzero pivot rows.
        let mut a: Vec<Vec<Complex>> = (0..self.rows).map(|r| (0..self.cols).map(|c| self.get_raw(r, c)).collect()).collect();
        let mut rank = 0;
        let mut lead = 0;
        for r in 0..self.rows {
            if lead >= self.cols {
                break;
            }
            let mut i = r;
            while a[i][lead].norm() < 1e-12 {
                i += 1;
                if i == self.rows {
                    i = r;
                    lead += 1;
                    if lead == self.cols {
                        return Ok(rank);
                    }
                }
            }
            a.swap(i, r);
            let div = a[r][lead];
            for v in a[r].iter_mut() {
                *v = *v / div;
            }
            for i in 0..self.rows {
                if i != r {
                    let factor = a[i][lead];
                    for c in 0..self.cols {
                        a[i][c] = a[i][c] - factor * a[r][c];
                    }
                }
            }
            rank += 1;
            lead += 1;
        }
        Ok(rank)
    }

    /// Single-line `[[1, 2], [3, 4]]` rendering used when pretty-printing
    /// is switched off.
    pub fn compact(&self) -> String {
        let rows: Vec<String> = (0..self.rows)
            .map(|r| {
                let cells: Vec<String> = (0..self.cols).map(|c| format_cell(self.get_raw(r, c))).collect();
                format!("[{}]", cells.join(", "))
            })
            .collect();
        format!("[{}]", rows.join(", "))
    }

    /// One outer `[ … ]` pair, columns padded to the widest cell and
    /// space-separated, continuation rows indented to line up under the
    /// first row's cells (`A'` of `[1,2;3,4]` prints `[ 1 3\n  2 4 ]`, §8
    /// scenario 4).
    pub fn pretty_print(&self) -> String {
        let cells: Vec<Vec<String>> = (0..self.rows)
            .map(|r| (0..self.cols).map(|c| format_cell(self.get_raw(r, c))).collect())
            .collect();
        let width = cells.iter().flatten().map(|s| s.len()).max().unwrap_or(1);
        let lines: Vec<String> = cells
            .iter()
            .map(|row| row.iter().map(|c| format!("{c:>width$}")).collect::<Vec<_>>().join(" "))
            .collect();
        let mut out = String::from("[ ");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push_str("\n  ");
            }
            out.push_str(line);
        }
        out.push_str(" ]");
        out
    }
}

/// `v.powf(k)` generalized to a complex base via its polar form. A real `v`
/// (the common case) takes the exact same `f64::powf` path as before.
fn complex_powf(v: Complex, k: f64) -> Complex {
    if v.im == 0.0 {
        Complex::new(v.re.powf(k), 0.0)
    } else {
        let (r, theta) = v.polar();
        Complex::from_polar(r.powf(k), theta * k)
    }
}

fn format_cell(v: Complex) -> String {
    if v.im == 0.0 {
        format_real(v.re)
    } else {
        v.to_string()
    }
}

fn format_real(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_based_indexing_resolves_to_zero_based_storage() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.get(1, 1).unwrap().re, 1.0);
        assert_eq!(m.get(2, 2).unwrap().re, 4.0);
        assert!(m.get(0, 1).is_err());
    }

    #[test]
    fn transpose_swaps_shape() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 1));
    }

    #[test]
    fn identity_times_anything_is_itself() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let i = Matrix::eye(2);
        assert_eq!(m.matmul(&i).unwrap(), m);
    }

    #[test]
    fn inverse_of_identity_is_identity() {
        let i = Matrix::eye(3);
        assert_eq!(i.inv().unwrap(), i);
    }

    #[test]
    fn det_of_singular_matrix_is_zero() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert_eq!(m.det().unwrap(), Complex::new(0.0, 0.0));
    }

    #[test]
    fn mismatched_shapes_are_a_dimension_error() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(matches!(a.add(&b), Err(RuntimeError::MatrixDimension(_))));
    }

    #[test]
    fn pretty_print_matches_single_bracket_pair_layout() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(a.transpose().pretty_print(), "[ 1 3\n  2 4 ]");
    }

    #[test]
    fn concat_onto_empty_is_a_plain_replacement() {
        let mut m = Matrix::empty();
        let row = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        m.concat(&row, 0).unwrap();
        assert_eq!(m.shape(), (1, 2));
        let row2 = Matrix::from_rows(vec![vec![3.0, 4.0]]).unwrap();
        m.concat(&row2, 0).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(2, 1).unwrap().re, 3.0);
    }

    #[test]
    fn non_commutative_scalar_broadcast_respects_operand_order() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(m.sub_scalar(1.0).get(1, 1).unwrap().re, 0.0);
        assert_eq!(m.scalar_sub(1.0).get(1, 1).unwrap().re, 0.0);
        assert_eq!(m.scalar_sub(1.0).get(1, 2).unwrap().re, -1.0);
    }

    #[test]
    fn integer_power_zero_is_identity() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.pow_integer(0.0).unwrap(), Matrix::eye(2));
        assert_eq!(m.pow_integer(1.0).unwrap(), m);
    }

    #[test]
    fn select_rows_gathers_in_requested_order() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let picked = m.select_rows(&[3, 1]).unwrap();
        assert_eq!(picked.shape(), (2, 2));
        assert_eq!(picked.get(1, 1).unwrap().re, 5.0);
        assert_eq!(picked.get(2, 1).unwrap().re, 1.0);
    }

    #[test]
    fn diagonal_constructs_a_square_matrix_from_a_vector() {
        let v = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let d = v.diagonal();
        assert_eq!(d.shape(), (3, 3));
        assert_eq!(d.get(1, 1).unwrap().re, 1.0);
        assert_eq!(d.get(2, 2).unwrap().re, 2.0);
        assert_eq!(d.get(3, 3).unwrap().re, 3.0);
        assert_eq!(d.get(1, 2).unwrap().re, 0.0);
    }

    #[test]
    fn matrix_holds_complex_elements_without_losing_their_imaginary_part() {
        let m = Matrix::from_rows_complex(vec![vec![Complex::new(0.0, 1.0), Complex::new(2.0, 0.0)]]).unwrap();
        assert!(!m.is_real());
        assert_eq!(m.get(1, 1).unwrap(), Complex::new(0.0, 1.0));
        assert_eq!(m.compact(), "[[0.0 + 1.0i, 2]]");
    }
}
