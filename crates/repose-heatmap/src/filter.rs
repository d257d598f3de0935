//! Separable Gaussian smoothing for 2-D occupancy grids.

use ndarray::Array2;

/// Fixed-sigma Gaussian filter with precomputed taps.
///
/// The kernel is truncated at four standard deviations and normalized to
/// unit sum; borders are handled by reflection, so total mass away from the
/// edges is preserved.
pub struct GaussianFilter {
    taps: Vec<f32>,
    radius: usize,
}

impl GaussianFilter {
    pub fn new(sigma: f32) -> Self {
        let radius = (4.0 * sigma + 0.5) as usize;
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let d = i as f32 - radius as f32;
                (-d * d / denom).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { taps, radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Smooth the grid, convolving rows then columns.
    pub fn apply(&self, grid: &Array2<f32>) -> Array2<f32> {
        let (h, w) = grid.dim();
        let mut rows = Array2::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, &tap) in self.taps.iter().enumerate() {
                    let src = reflect(x as isize + k as isize - self.radius as isize, w);
                    acc += tap * grid[[y, src]];
                }
                rows[[y, x]] = acc;
            }
        }

        let mut out = Array2::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, &tap) in self.taps.iter().enumerate() {
                    let src = reflect(y as isize + k as isize - self.radius as isize, h);
                    acc += tap * rows[[src, x]];
                }
                out[[y, x]] = acc;
            }
        }
        out
    }
}

/// Reflect an out-of-range index back into `0..len`, duplicating the edge
/// sample: `(d c b a | a b c d | d c b a)`.
fn reflect(idx: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let period = 2 * len;
    let mut i = ((idx % period) + period) % period;
    if i >= len {
        i = period - 1 - i;
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_indexing() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(0, 4), 0);
        assert_eq!(reflect(3, 4), 3);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
    }

    #[test]
    fn test_taps_sum_to_one() {
        let filter = GaussianFilter::new(5.0);
        let sum: f32 = filter.taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(filter.radius(), 20);
    }

    #[test]
    fn test_mass_preserved_under_reflection() {
        // With reflected borders the kernel never loses mass, so the total
        // stays the impulse count wherever the impulse sits.
        let mut grid = Array2::zeros((64, 64));
        grid[[2, 3]] = 1.0;
        let smoothed = GaussianFilter::new(5.0).apply(&grid);
        let total: f32 = smoothed.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_peak_at_impulse_location() {
        let mut grid = Array2::zeros((128, 128));
        grid[[64, 64]] = 1.0;
        let smoothed = GaussianFilter::new(5.0).apply(&grid);
        let peak = smoothed
            .indexed_iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(peak, (64, 64));
    }
}
