use std::collections::HashMap;
use std::fmt;

// ============================================================
// Descriptive statistics
// ============================================================

/// count/mean/std/min/quartiles/max over the present values of a column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe_numeric(values: impl IntoIterator<Item = Option<f64>>) -> NumericSummary {
    let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
    if sorted.is_empty() {
        return NumericSummary::default();
    }
    sorted.sort_by(f64::total_cmp);

    NumericSummary {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// count/unique/most-frequent over a text column. Ties go to the value seen first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

pub fn describe_text<'a>(values: impl IntoIterator<Item = &'a str>) -> TextSummary {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut total = 0;
    for (idx, value) in values.into_iter().enumerate() {
        let entry = counts.entry(value).or_insert((0, idx));
        entry.0 += 1;
        total += 1;
    }

    let top = counts
        .iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    TextSummary {
        count: total,
        unique: counts.len(),
        freq: top.as_ref().map(|(_, f)| *f).unwrap_or(0),
        top: top.map(|(v, _)| v),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated quantile of already sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

// ============================================================
// Correlation
// ============================================================

/// Pearson correlation over rows where both values are present.
/// `None` when fewer than two pairs exist or either side is constant.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `values[row][col]`.
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn correlation_matrix(columns: &[(&str, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, row)| {
            columns
                .iter()
                .map(|(_, col)| pearson(row, col))
                .collect()
        })
        .collect();

    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    }
}

// ============================================================
// Distribution
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// `(left edge, right edge, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        let width = self.bin_width();
        self.counts.iter().enumerate().map(move |(i, count)| {
            let left = self.lower + width * i as f64;
            (left, left + width, *count)
        })
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Equal-width histogram over `[min, max]`; the last bin is closed on the right.
/// A constant column gets a unit-wide range centred on its value.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lower, upper) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };

    let width = (upper - lower) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lower) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram {
        lower,
        upper,
        counts,
    })
}

/// Gaussian kernel density estimate (Scott's bandwidth) sampled at `points`
/// evenly spaced positions across the histogram range, scaled to bin counts
/// so it overlays the bars.
pub fn kde_curve(values: &[f64], hist: &Histogram, points: usize) -> Option<Vec<(f64, f64)>> {
    let sd = sample_std(values)?;
    if sd == 0.0 || points < 2 {
        return None;
    }

    let n = values.len() as f64;
    let bandwidth = sd * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let scale = n * hist.bin_width();
    let step = (hist.upper - hist.lower) / (points - 1) as f64;

    Some(
        (0..points)
            .map(|i| {
                let x = hist.lower + step * i as f64;
                let density: f64 = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                (x, density * scale)
            })
            .collect(),
    )
}

// ============================================================
// Describe table
// ============================================================

/// Console rendering of the per-column summaries.
#[derive(Debug, Clone)]
pub struct DescribeTable {
    pub numeric: Vec<(String, NumericSummary)>,
    pub text: Vec<(String, TextSummary)>,
}

impl fmt::Display for DescribeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "NaN".to_string());

        write!(f, "{:<8}", "")?;
        for (name, _) in &self.numeric {
            write!(f, "{:>16}", name)?;
        }
        writeln!(f)?;

        let rows: [(&str, fn(&NumericSummary) -> Option<f64>); 8] = [
            ("count", |s| Some(s.count as f64)),
            ("mean", |s| s.mean),
            ("std", |s| s.std),
            ("min", |s| s.min),
            ("25%", |s| s.q25),
            ("50%", |s| s.median),
            ("75%", |s| s.q75),
            ("max", |s| s.max),
        ];
        for (label, get) in rows {
            write!(f, "{:<8}", label)?;
            for (_, summary) in &self.numeric {
                write!(f, "{:>16}", cell(get(summary)))?;
            }
            writeln!(f)?;
        }

        if !self.text.is_empty() {
            writeln!(f)?;
            writeln!(f, "{:<16}{:>8}{:>8}  {:<44}{:>6}", "", "count", "unique", "top", "freq")?;
            for (name, summary) in &self.text {
                writeln!(
                    f,
                    "{:<16}{:>8}{:>8}  {:<44}{:>6}",
                    name,
                    summary.count,
                    summary.unique,
                    summary.top.as_deref().unwrap_or("-"),
                    summary.freq
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_describe_numeric_matches_pandas() {
        let summary = describe_numeric([Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        assert_eq!(summary.count, 4);
        assert!(approx(summary.mean.unwrap(), 2.5));
        assert!(approx(summary.std.unwrap(), 1.2909944487358056));
        assert!(approx(summary.q25.unwrap(), 1.75));
        assert!(approx(summary.median.unwrap(), 2.5));
        assert!(approx(summary.q75.unwrap(), 3.25));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(4.0));
    }

    #[test]
    fn test_describe_numeric_all_missing() {
        let summary = describe_numeric([None, None]);
        assert_eq!(summary, NumericSummary::default());
    }

    #[test]
    fn test_describe_text() {
        let summary = describe_text(["WETH", "USDC", "WETH", "DAI"]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.unique, 3);
        assert_eq!(summary.top.as_deref(), Some("WETH"));
        assert_eq!(summary.freq, 2);

        let tie = describe_text(["B", "A"]);
        assert_eq!(tie.top.as_deref(), Some("B"));
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = vec![Some(1.0), Some(2.0), Some(3.0)];
        let y = vec![Some(2.0), Some(4.0), Some(6.0)];
        let z = vec![Some(3.0), Some(2.0), Some(1.0)];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));
        assert!(approx(pearson(&x, &z).unwrap(), -1.0));
    }

    #[test]
    fn test_pearson_skips_missing_pairs() {
        let x = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        let y = vec![Some(1.0), Some(100.0), Some(2.0), Some(3.0)];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));
    }

    #[test]
    fn test_pearson_undefined() {
        let constant = vec![Some(5.0), Some(5.0), Some(5.0)];
        let x = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&constant, &x), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(1.0)]), None);
    }

    #[test]
    fn test_correlation_matrix_shape_and_diagonal() {
        let matrix = correlation_matrix(&[
            ("amount0", vec![Some(1.0), Some(2.0), Some(4.0)]),
            ("amount1", vec![Some(-1.0), Some(-2.0), Some(-4.0)]),
            ("price", vec![Some(3.0), Some(1.0), Some(2.0)]),
        ]);
        assert_eq!(matrix.labels, vec!["amount0", "amount1", "price"]);
        assert_eq!(matrix.values.len(), 3);
        for i in 0..3 {
            assert!(approx(matrix.values[i][i].unwrap(), 1.0));
        }
        assert!(approx(matrix.values[0][1].unwrap(), -1.0));
        assert_eq!(matrix.values[0][2], matrix.values[2][0]);
    }

    #[test]
    fn test_histogram_counts_and_edges() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let hist = histogram(&values, 5).unwrap();
        assert_eq!(hist.lower, 0.0);
        assert_eq!(hist.upper, 10.0);
        assert_eq!(hist.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());
        assert_eq!(hist.max_count(), 2);
    }

    #[test]
    fn test_histogram_constant_values() {
        let hist = histogram(&[7.0, 7.0, 7.0], 50).unwrap();
        assert_eq!(hist.lower, 6.5);
        assert_eq!(hist.upper, 7.5);
        assert_eq!(hist.counts.iter().sum::<usize>(), 3);
        assert!(histogram(&[], 50).is_none());
    }

    #[test]
    fn test_kde_curve_area_matches_count() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let hist = histogram(&values, 20).unwrap();
        let curve = kde_curve(&values, &hist, 200).unwrap();
        assert_eq!(curve.len(), 200);

        // Trapezoid integral of the scaled curve / bin width approximates the sample size
        // (minus the tails that fall outside the histogram range).
        let area: f64 = curve
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum::<f64>()
            / hist.bin_width();
        assert!(area > 150.0 && area <= 200.0, "area = {}", area);
    }

    #[test]
    fn test_kde_curve_needs_spread() {
        let hist = histogram(&[1.0, 1.0], 10).unwrap();
        assert!(kde_curve(&[1.0, 1.0], &hist, 50).is_none());
    }

    #[test]
    fn test_describe_table_renders() {
        let table = DescribeTable {
            numeric: vec![("price".to_string(), describe_numeric([Some(1.0), Some(3.0)]))],
            text: vec![("sender".to_string(), describe_text(["0xa", "0xa"]))],
        };
        let out = table.to_string();
        assert!(out.contains("price"));
        assert!(out.contains("count"));
        assert!(out.contains("2.0000"));
        assert!(out.contains("0xa"));
    }
}
