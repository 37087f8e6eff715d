use num_traits::Zero;
use std::ops::{Add, AddAssign, Mul};

/// Dense matrix with values stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Mat<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T> Mat<T>
where
    T: Copy + Zero,
{
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![T::zero(); rows * cols],
        }
    }

    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> T,
    {
        let mut values = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                values.push(f(i, j));
            }
        }
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn ix(&self, row: usize, col: usize) -> usize {
        assert!(row < self.rows);
        assert!(col < self.cols);
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.values[self.ix(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: T) {
        let i = self.ix(row, col);
        self.values[i] = v
    }

    /// Adds `v` to the element at (`row`, `col`).
    pub fn push(&mut self, row: usize, col: usize, v: T)
    where
        T: AddAssign,
    {
        let i = self.ix(row, col);
        self.values[i] += v
    }

    /// Elements in row-major order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn row(&self, row: usize) -> &[T] {
        let i = self.ix(row, 0);
        &self.values[i..i + self.cols]
    }

    /// Returns the sub-matrix of the given rows and columns.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        Self::from_fn(rows.len(), cols.len(), |i, j| self.get(rows[i], cols[j]))
    }

    pub fn mat_vec(&self, b: &[T]) -> Vec<T>
    where
        T: Mul<Output = T> + Add<Output = T>,
    {
        assert_eq!(b.len(), self.cols);
        (0..self.rows).map(|i| dot(self.row(i), b)).collect()
    }
}

/// Computes the dot-product of `a` and `b`.
pub fn dot<T>(a: &[T], b: &[T]) -> T
where
    T: Mul<Output = T> + Add<Output = T> + Zero + Copy,
{
    a.iter()
        .zip(b)
        .map(|(&ai, &bi)| ai * bi)
        .fold(T::zero(), |x, y| x + y)
}

/// Computes the infinity norm: `max(abs(a))`.
pub fn norm_inf(a: &[f64]) -> f64 {
    a.iter().fold(0.0, |max, v| {
        if max.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            max.max(v.abs())
        }
    })
}
