//! Vector Similarity Functions
//!
//! Dot products and unit normalization over dense `f32` rows. Every row in a
//! `VectorStore` is unit length, so ranking only ever needs `unit_similarity`.

/// Dot product with four independent accumulators.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut lanes = [0.0f32; 4];
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail: f32 = a_chunks
        .remainder()
        .iter()
        .zip(b_chunks.remainder())
        .map(|(x, y)| x * y)
        .sum();

    for (x, y) in a_chunks.zip(b_chunks) {
        lanes[0] += x[0] * y[0];
        lanes[1] += x[1] * y[1];
        lanes[2] += x[2] * y[2];
        lanes[3] += x[3] * y[3];
    }

    (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]) + tail
}

/// Similarity of two unit-length rows, clamped to [-1, 1] against rounding
#[inline]
pub fn unit_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot_product(a, b).clamp(-1.0, 1.0)
}

#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Scale `v` to unit length. A zero row stays zero.
pub fn normalize_vector(v: &mut [f32]) {
    let mag = magnitude(v);
    if mag == 0.0 {
        return;
    }
    v.iter_mut().for_each(|x| *x /= mag);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_with_tail() {
        let a: Vec<f32> = (1..=7).map(|x| x as f32).collect();
        let b = vec![1.0; 7];
        assert!((dot_product(&a, &b) - 28.0).abs() < 1e-6);
        assert!((dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_unit_similarity_of_normalized_rows() {
        let mut a = vec![2.0, 0.0, 0.0];
        let mut b = vec![-5.0, 0.0, 0.0];
        normalize_vector(&mut a);
        normalize_vector(&mut b);
        assert!((unit_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!((unit_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_row_stays_zero() {
        let mut v = vec![0.0, 0.0, 0.0];
        normalize_vector(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normalize_to_unit_length() {
        let mut n = vec![3.0, 4.0, 0.0];
        normalize_vector(&mut n);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
        assert!((magnitude(&n) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unit_similarity_is_clamped() {
        let v = [1.000_001f32, 0.0];
        assert_eq!(unit_similarity(&v, &v), 1.0);
    }
}
