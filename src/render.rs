use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::cluster::complete_linkage_order;
use crate::score::ScoreTable;

const LOW: [u8; 3] = [59, 76, 192];
const MID: [u8; 3] = [247, 247, 247];
const HIGH: [u8; 3] = [180, 4, 38];
const MISSING: [u8; 3] = [150, 150, 150];

pub const DEFAULT_CELL_SIZE: u32 = 16;

/// Reason a heatmap could not be produced. Never fatal for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSkipped(pub String);

/// Clustered heatmap of a score table: samples on the vertical axis, gene
/// sets on the horizontal axis, both in dendrogram leaf order.
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub image: RgbImage,
    pub sample_order: Vec<usize>,
    pub gene_set_order: Vec<usize>,
}

impl Heatmap {
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderSkipped> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|err| RenderSkipped(format!("png encoding failed: {err}")))?;
        Ok(buffer.into_inner())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeatmapRenderer {
    cell_size: u32,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl HeatmapRenderer {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(1),
        }
    }

    pub fn render(&self, table: &ScoreTable) -> Result<Heatmap, RenderSkipped> {
        let n_samples = table.n_samples();
        let n_sets = table.n_gene_sets();
        if n_samples < 2 || n_sets < 2 {
            return Err(RenderSkipped(format!(
                "clustering needs at least 2 samples and 2 gene sets, got {n_samples} x {n_sets}"
            )));
        }
        let Some((min, max)) = finite_range(table) else {
            return Err(RenderSkipped("score table has no finite scores".to_string()));
        };

        let imputed = impute_by_gene_set_mean(table);
        let sample_order = complete_linkage_order(&imputed);
        let gene_set_order = complete_linkage_order(&transpose(&imputed, n_sets));

        let width = (n_sets as u32)
            .checked_mul(self.cell_size)
            .ok_or_else(|| RenderSkipped("heatmap width overflows".to_string()))?;
        let height = (n_samples as u32)
            .checked_mul(self.cell_size)
            .ok_or_else(|| RenderSkipped("heatmap height overflows".to_string()))?;
        let mut image = RgbImage::new(width, height);
        for (y_cell, &sample_idx) in sample_order.iter().enumerate() {
            for (x_cell, &set_idx) in gene_set_order.iter().enumerate() {
                let color = Rgb(color_for(table.get(sample_idx, set_idx), min, max));
                let x0 = x_cell as u32 * self.cell_size;
                let y0 = y_cell as u32 * self.cell_size;
                for y in y0..y0 + self.cell_size {
                    for x in x0..x0 + self.cell_size {
                        image.put_pixel(x, y, color);
                    }
                }
            }
        }

        Ok(Heatmap {
            image,
            sample_order,
            gene_set_order,
        })
    }
}

fn finite_range(table: &ScoreTable) -> Option<(f64, f64)> {
    (0..table.n_samples())
        .flat_map(|sample_idx| table.row(sample_idx).iter().copied())
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

/// One row per sample with NaN cells replaced by the gene set's mean score.
/// Used for distances only; reported scores keep their NaN.
fn impute_by_gene_set_mean(table: &ScoreTable) -> Vec<Vec<f64>> {
    let means: Vec<f64> = (0..table.n_gene_sets())
        .map(|set_idx| {
            let finite: Vec<f64> = table
                .column(set_idx)
                .into_iter()
                .filter(|value| value.is_finite())
                .collect();
            if finite.is_empty() {
                0.0
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            }
        })
        .collect();

    (0..table.n_samples())
        .map(|sample_idx| {
            table
                .row(sample_idx)
                .iter()
                .zip(&means)
                .map(|(value, mean)| if value.is_finite() { *value } else { *mean })
                .collect()
        })
        .collect()
}

fn transpose(rows: &[Vec<f64>], width: usize) -> Vec<Vec<f64>> {
    (0..width)
        .map(|column| rows.iter().map(|row| row[column]).collect())
        .collect()
}

fn color_for(value: f64, min: f64, max: f64) -> [u8; 3] {
    if !value.is_finite() {
        return MISSING;
    }
    let t = if max > min {
        (value - min) / (max - min)
    } else {
        0.5
    };
    if t < 0.5 {
        lerp(LOW, MID, t * 2.0)
    } else {
        lerp(MID, HIGH, (t - 0.5) * 2.0)
    }
}

fn lerp(from: [u8; 3], to: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for (channel, slot) in out.iter_mut().enumerate() {
        let a = from[channel] as f64;
        let b = to[channel] as f64;
        *slot = (a + (b - a) * t).round() as u8;
    }
    out
}
