use crate::{Error, Result};

/// A single (x, y) sample, e.g. (frequency, power) or (bin, count).
pub type Point = (f64, f64);

/// Largest Triangle Three Buckets (LTTB) downsampling algorithm.
///
/// Reduces an ordered slice of (x, y) data points to exactly `target_size`
/// points while preserving the visual shape of the data. Every returned point
/// is a verbatim copy of an input point, and the first and last input points
/// are always kept.
///
/// Returns the original data unchanged if `data.len() <= 2` or
/// `target_size >= data.len()`. Otherwise a `target_size` below 3 is an error.
/// Non-finite values are passed through; callers mask them beforehand.
pub fn downsample(data: &[Point], target_size: usize) -> Result<Vec<Point>> {
    let n = data.len();
    if n <= 2 || target_size >= n {
        return Ok(data.to_vec());
    }
    if target_size < 3 {
        return Err(Error::TargetTooSmall(target_size));
    }

    let buckets = target_size - 2;
    let mut sampled = Vec::with_capacity(target_size);
    sampled.push(data[0]);

    let mut a_idx = 0usize;

    for b in 0..buckets {
        let bucket_start = bucket_boundary(b, n, buckets);
        let bucket_end = bucket_boundary(b + 1, n, buckets).min(n - 1);

        // Average of next bucket for the triangle area calculation.
        let next_start = bucket_end;
        let next_end = bucket_boundary(b + 2, n, buckets).min(n);
        let avg = mean_point(&data[next_start..next_end]);

        let a = data[a_idx];
        let mut max_area = -1.0f64;
        let mut max_idx = bucket_start;

        for (j, &p) in data
            .iter()
            .enumerate()
            .take(bucket_end)
            .skip(bucket_start)
        {
            let area = triangle_area(a, p, avg);
            if area > max_area {
                max_area = area;
                max_idx = j;
            }
        }

        sampled.push(data[max_idx]);
        a_idx = max_idx;
    }

    sampled.push(data[n - 1]);
    Ok(sampled)
}

/// Column-oriented variant of [`downsample`] for callers that keep x and y in
/// separate arrays (e.g. frequencies and spectra).
pub fn downsample_columns(
    xs: &[f64],
    ys: &[f64],
    target_size: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if xs.len() != ys.len() {
        return Err(Error::ShapeMismatch {
            x: xs.len(),
            y: ys.len(),
        });
    }

    let points: Vec<Point> = xs.iter().copied().zip(ys.iter().copied()).collect();
    Ok(downsample(&points, target_size)?.into_iter().unzip())
}

/// Area of the triangle spanned by the last selected point `a`, a candidate
/// `p` and the next bucket's average `avg`.
pub fn triangle_area(a: Point, p: Point, avg: Point) -> f64 {
    0.5 * ((a.0 - avg.0) * (p.1 - a.1) - (a.0 - p.0) * (avg.1 - a.1)).abs()
}

/// First input index of interior bucket `k`, i.e. `floor(k * (n-2)/buckets) + 1`.
/// Integer division gives the exact floor.
fn bucket_boundary(k: usize, n: usize, buckets: usize) -> usize {
    ((k as u128 * (n - 2) as u128) / buckets as u128) as usize + 1
}

fn mean_point(points: &[Point]) -> Point {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.0, sy + p.1));
    let len = points.len() as f64;
    (sx / len, sy / len)
}
