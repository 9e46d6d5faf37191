//! Statistical Features Computation

/// Summary statistics for a small set of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatisticalFeatures {
    /// Compute statistics from a slice of values.
    ///
    /// NaN entries are skipped, so `[1, NaN, 2]` has mean 1.5. When nothing
    /// usable remains every field is NaN.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let usable: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if usable.is_empty() {
            return Self {
                mean: f64::NAN,
                std_dev: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }

        let n = usable.len() as f64;
        let mean = usable.iter().sum::<f64>() / n;

        let min = usable.iter().copied().fold(f64::INFINITY, f64::min);
        let max = usable.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Sample variance; a single value has no spread estimate
        let std_dev = if usable.len() > 1 {
            let m2: f64 = usable.iter().map(|v| (v - mean) * (v - mean)).sum();
            (m2 / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Self { mean, std_dev, min, max }
    }

    /// max - min
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}
