use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dataset::YearValue;

/// How strong a correlation is, by absolute value of r.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

pub fn classify(r: f64) -> Strength {
    let r = r.abs();
    if r >= 0.7 {
        Strength::Strong
    } else if r >= 0.5 {
        Strength::Moderate
    } else if r >= 0.3 {
        Strength::Weak
    } else {
        Strength::VeryWeak
    }
}

/// Pearson's r for two equally long series. `None` with fewer than two
/// points or when either series has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedPoint {
    pub year: i32,
    pub health: f64,
    pub economic: f64,
}

/// Pairs up the years present in both series, oldest first.
pub fn align(health: &[YearValue], economic: &[YearValue]) -> Vec<AlignedPoint> {
    let economic: BTreeMap<i32, f64> = economic.iter().map(|p| (p.year, p.value)).collect();
    let health: BTreeMap<i32, f64> = health.iter().map(|p| (p.year, p.value)).collect();
    health
        .into_iter()
        .filter_map(|(year, h)| {
            economic.get(&year).map(|e| AlignedPoint {
                year,
                health: h,
                economic: *e,
            })
        })
        .collect()
}
