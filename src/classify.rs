//! Threshold classification and the color ramp.

use std::collections::HashSet;

use anyhow::{Result, bail, ensure};
use palette::{FromColor, Lab, Mix, Srgb};

/// 8-bit sRGB color.
pub type Rgb = Srgb<u8>;

/// Anchor stops of the nine-class sequential "Blues" scheme, light to dark.
const BLUES: [(u8, u8, u8); 9] = [
    (0xf7, 0xfb, 0xff),
    (0xde, 0xeb, 0xf7),
    (0xc6, 0xdb, 0xef),
    (0x9e, 0xca, 0xe1),
    (0x6b, 0xae, 0xd6),
    (0x42, 0x92, 0xc6),
    (0x21, 0x71, 0xb5),
    (0x08, 0x51, 0x9c),
    (0x08, 0x30, 0x6b),
];

/// Formats a color as `#rrggbb`.
pub fn hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

fn lab(stop: (u8, u8, u8)) -> Lab {
    Lab::from_color(Srgb::new(stop.0, stop.1, stop.2).into_format::<f32>())
}

/// Samples `n` evenly spaced colors from the Blues ramp, interpolating
/// between anchors in CIE Lab.
pub fn blues(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        let (r, g, b) = BLUES[BLUES.len() / 2];
        return vec![Srgb::new(r, g, b)];
    }

    let segments = (BLUES.len() - 1) as f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32 * segments;
            let seg = (t.floor() as usize).min(BLUES.len() - 2);
            let local = t - seg as f32;
            let mixed = lab(BLUES[seg]).mix(lab(BLUES[seg + 1]), local);
            Srgb::<f32>::from_color(mixed).into_format::<u8>()
        })
        .collect()
}

/// Ascending bucket boundaries `t1 < t2 < … < tk`, splitting the line into
/// `k + 1` half-open buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds(Vec<f64>);

impl Thresholds {
    /// # Errors
    ///
    /// Rejects an empty list, non-finite values and any pair that is not
    /// strictly ascending.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        ensure!(!values.is_empty(), "at least one threshold is required");
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            bail!("threshold {bad} is not finite");
        }
        if let Some(pair) = values.windows(2).find(|w| w[0] >= w[1]) {
            bail!(
                "thresholds must be strictly ascending ({} is followed by {})",
                pair[0],
                pair[1]
            );
        }
        Ok(Self(values))
    }

    /// `start, start + step, …` up to but excluding `stop`.
    pub fn range(start: f64, stop: f64, step: f64) -> Result<Self> {
        ensure!(step > 0.0, "threshold step must be positive");
        let count = ((stop - start) / step).ceil().max(0.0) as usize;
        Self::new((0..count).map(|i| start + step * i as f64).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn bucket_count(&self) -> usize {
        self.0.len() + 1
    }

    /// Bucket index for `value`. Values below the first threshold (and NaN)
    /// land in bucket 0, values at or above the last in bucket `k`.
    pub fn bucket(&self, value: f64) -> usize {
        if value.is_nan() {
            return 0;
        }
        self.0.partition_point(|t| *t <= value)
    }

    /// Inclusive lower bound of a bucket; `None` for the first bucket.
    pub fn lower_bound(&self, bucket: usize) -> Option<f64> {
        bucket.checked_sub(1).and_then(|i| self.0.get(i).copied())
    }

    /// Exclusive upper bound of a bucket; `None` for the last bucket.
    pub fn upper_bound(&self, bucket: usize) -> Option<f64> {
        self.0.get(bucket).copied()
    }
}

/// One row of the legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub bucket: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub color: Rgb,
    pub label: String,
}

/// Thresholds paired with one distinct color per bucket.
#[derive(Debug, Clone)]
pub struct ColorScale {
    thresholds: Thresholds,
    palette: Vec<Rgb>,
}

impl ColorScale {
    /// # Errors
    ///
    /// Fails when the palette has fewer colors than there are buckets, or
    /// repeats a color among the ones in use.
    pub fn new(thresholds: Thresholds, palette: Vec<Rgb>) -> Result<Self> {
        let buckets = thresholds.bucket_count();
        ensure!(
            palette.len() >= buckets,
            "palette has {} colors but {} thresholds need {}",
            palette.len(),
            thresholds.values().len(),
            buckets
        );

        let mut seen = HashSet::new();
        for color in &palette[..buckets] {
            ensure!(
                seen.insert((color.red, color.green, color.blue)),
                "palette repeats color {}",
                hex(*color)
            );
        }

        Ok(Self {
            thresholds,
            palette,
        })
    }

    /// Scale sized for `thresholds` using the Blues ramp.
    pub fn blues(thresholds: Thresholds) -> Result<Self> {
        let palette = blues(thresholds.bucket_count());
        Self::new(thresholds, palette)
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn bucket_count(&self) -> usize {
        self.thresholds.bucket_count()
    }

    /// Bucket for an optional percentage; absence counts as 0.
    pub fn classify(&self, value: Option<f64>) -> usize {
        self.thresholds.bucket(value.unwrap_or(0.0))
    }

    /// Color of a bucket. Indices past the end clamp to the last bucket.
    pub fn color(&self, bucket: usize) -> Rgb {
        self.palette[bucket.min(self.bucket_count() - 1)]
    }

    pub fn color_for(&self, value: Option<f64>) -> Rgb {
        self.color(self.classify(value))
    }

    /// One entry per bucket, labelled with its lower bound (`0%` for the
    /// first bucket).
    pub fn legend(&self) -> Vec<LegendEntry> {
        (0..self.bucket_count())
            .map(|bucket| {
                let lower = self.thresholds.lower_bound(bucket);
                LegendEntry {
                    bucket,
                    lower,
                    upper: self.thresholds.upper_bound(bucket),
                    color: self.color(bucket),
                    label: format!("{}%", lower.unwrap_or(0.0)),
                }
            })
            .collect()
    }
}
