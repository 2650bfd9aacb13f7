use serde::{Deserialize, Serialize};

use crate::layout::Cell;

/// Summary of a heightfield snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightStats {
    pub cells: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub mean_height: f32,
    pub total_water: f32,
    pub nan_count: usize,
}

impl HeightStats {
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut min_height = f32::INFINITY;
        let mut max_height = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut total_water = 0.0f64;
        let mut nan_count = 0;

        for c in cells {
            if !c.height.is_finite() || !c.water.is_finite() {
                nan_count += 1;
                continue;
            }
            min_height = min_height.min(c.height);
            max_height = max_height.max(c.height);
            sum += c.height as f64;
            total_water += c.water as f64;
        }

        let finite = cells.len() - nan_count;
        Self {
            cells: cells.len(),
            min_height: if finite > 0 { min_height } else { 0.0 },
            max_height: if finite > 0 { max_height } else { 0.0 },
            mean_height: if finite > 0 { (sum / finite as f64) as f32 } else { 0.0 },
            total_water: total_water as f32,
            nan_count,
        }
    }
}
