//! Marching-squares extraction of iso-value line segments from a grid.

use ndarray::Array2;

/// A straight piece of an iso-line.
pub type Segment = [(f64, f64); 2];

/// Line segments where the grid crosses `level`.
///
/// `z` has shape `(y.len(), x.len())`. Cells with a NaN corner are skipped.
/// Saddle cells are resolved with the mean of the four corners.
pub fn isoline_segments(x: &[f64], y: &[f64], z: &Array2<f64>, level: f64) -> Vec<Segment> {
    let (ny, nx) = z.dim();
    let mut segments = Vec::new();
    if nx < 2 || ny < 2 || x.len() != nx || y.len() != ny {
        return segments;
    }

    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            // corners counter-clockwise from bottom-left
            let v = [z[[j, i]], z[[j, i + 1]], z[[j + 1, i + 1]], z[[j + 1, i]]];
            if v.iter().any(|c| c.is_nan()) {
                continue;
            }
            let p = [(x[i], y[j]), (x[i + 1], y[j]), (x[i + 1], y[j + 1]), (x[i], y[j + 1])];

            let case = v
                .iter()
                .enumerate()
                .fold(0u8, |acc, (k, &c)| if c > level { acc | (1 << k) } else { acc });
            if case == 0 || case == 15 {
                continue;
            }

            // crossing point on edge k, which joins corner k to corner k + 1
            let cross = |k: usize| {
                let (a, b) = (k, (k + 1) % 4);
                let t = (level - v[a]) / (v[b] - v[a]);
                (
                    p[a].0 + t * (p[b].0 - p[a].0),
                    p[a].1 + t * (p[b].1 - p[a].1),
                )
            };

            let edge_pairs: &[(usize, usize)] = match case {
                1 | 14 => &[(3, 0)],
                2 | 13 => &[(0, 1)],
                3 | 12 => &[(3, 1)],
                4 | 11 => &[(1, 2)],
                6 | 9 => &[(0, 2)],
                7 | 8 => &[(2, 3)],
                5 | 10 => {
                    let center = v.iter().sum::<f64>() / 4.0;
                    let center_high = center > level;
                    // case 5: corners 0 and 2 high
                    if (case == 5) == center_high {
                        &[(3, 2), (0, 1)]
                    } else {
                        &[(3, 0), (1, 2)]
                    }
                }
                _ => &[],
            };
            segments.extend(edge_pairs.iter().map(|&(a, b)| [cross(a), cross(b)]));
        }
    }
    segments
}
