//! Raster rendering of curves and confusion-matrix heatmaps.
//!
//! Both axes of every curve span `[0, 1]`; values outside are clamped.
//!
//! Images carry no text: curves have no title or axis captions and heatmap
//! cells are not annotated. The axis meaning is given by the file name
//! (`pr-*` is precision over recall, `f1-*` is F1 over threshold); label names
//! and counts are in `confusion_matrix.txt`.

use image::{Rgb, RgbImage};

use crate::metrics::ConfusionMatrix;

pub const CURVE_WIDTH: u32 = 640;
pub const CURVE_HEIGHT: u32 = 480;
const MARGIN: u32 = 48;
const GRID_STEPS: u32 = 10;
const DASH_ON: f32 = 8.0;
const DASH_OFF: f32 = 5.0;
const HEATMAP_CELL: u32 = 40;
/// Largest heatmap side in pixels.
pub const MAX_HEATMAP_SIDE: u32 = 2000;
const MIN_GRID_CELL: usize = 4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const CURVE: Rgb<u8> = Rgb([214, 39, 40]);
const REDS_LOW: [f32; 3] = [255.0, 245.0, 240.0];
const REDS_HIGH: [f32; 3] = [103.0, 0.0, 13.0];

/// Draw `ys` against `xs` as a dashed red line on a gridded unit square.
pub fn render_curve(xs: &[f64], ys: &[f64]) -> RgbImage {
    let mut image = RgbImage::from_pixel(CURVE_WIDTH, CURVE_HEIGHT, BACKGROUND);
    let plot_w = (CURVE_WIDTH - 2 * MARGIN) as f32;
    let plot_h = (CURVE_HEIGHT - 2 * MARGIN) as f32;
    let left = MARGIN as f32;
    let bottom = (CURVE_HEIGHT - MARGIN) as f32;

    for step in 0..=GRID_STEPS {
        let frac = step as f32 / GRID_STEPS as f32;
        let x = left + frac * plot_w;
        let y = bottom - frac * plot_h;
        let color = if step == 0 { AXIS } else { GRID };
        draw_segment(&mut image, (x, bottom), (x, bottom - plot_h), color, None);
        draw_segment(&mut image, (left, y), (left + plot_w, y), color, None);
    }

    let to_px = |x: f64, y: f64| -> (f32, f32) {
        (
            left + (x.clamp(0.0, 1.0) as f32) * plot_w,
            bottom - (y.clamp(0.0, 1.0) as f32) * plot_h,
        )
    };
    let mut dash_offset = 0.0_f32;
    let points: Vec<(f32, f32)> = xs.iter().zip(ys).map(|(&x, &y)| to_px(x, y)).collect();
    for pair in points.windows(2) {
        dash_offset = draw_segment(&mut image, pair[0], pair[1], CURVE, Some(dash_offset));
        draw_segment(
            &mut image,
            (pair[0].0, pair[0].1 + 1.0),
            (pair[1].0, pair[1].1 + 1.0),
            CURVE,
            Some(dash_offset),
        );
    }
    if let [single] = points.as_slice() {
        put(&mut image, single.0, single.1, CURVE);
    }
    image
}

/// Draw the matrix as a grid of cells shaded by count, rows = predicted.
///
/// The image side never exceeds [`MAX_HEATMAP_SIDE`]; with more labels than
/// pixels, each pixel shows the cell under its sample point and grid lines
/// are left out.
pub fn render_heatmap(matrix: &ConfusionMatrix) -> RgbImage {
    let n = matrix.label_count().max(1);
    let side = heatmap_side(n);
    let mut image = RgbImage::from_pixel(side, side, BACKGROUND);
    let draw_grid = side as usize >= n * MIN_GRID_CELL;
    let max = matrix.max_cell().max(1) as f32;
    let cell_of = |px: u32| px as usize * n / side as usize;
    for y in 0..side {
        let row = cell_of(y);
        let row_start = y == 0 || cell_of(y - 1) != row;
        for x in 0..side {
            let col = cell_of(x);
            let col_start = x == 0 || cell_of(x - 1) != col;
            let on_edge = x == side - 1 || y == side - 1;
            let on_border = draw_grid && (row_start || col_start || on_edge);
            let color = if on_border {
                GRID
            } else {
                reds(matrix.get(row, col) as f32 / max)
            };
            image.put_pixel(x, y, color);
        }
    }
    image
}

/// Pixel side of the heatmap for `label_count` labels.
fn heatmap_side(label_count: usize) -> u32 {
    let wanted = label_count
        .saturating_mul(HEATMAP_CELL as usize)
        .min(MAX_HEATMAP_SIDE as usize);
    u32::try_from(wanted).unwrap_or(MAX_HEATMAP_SIDE).max(1)
}

fn reds(t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |c: usize| (REDS_LOW[c] + (REDS_HIGH[c] - REDS_LOW[c]) * t).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Rasterize a segment; with `dash` set, returns the dash phase at its end.
fn draw_segment(
    image: &mut RgbImage,
    from: (f32, f32),
    to: (f32, f32),
    color: Rgb<u8>,
    dash: Option<f32>,
) -> f32 {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let length = (dx * dx + dy * dy).sqrt();
    let steps = length.ceil().max(1.0) as usize;
    let period = DASH_ON + DASH_OFF;
    let mut phase = dash.unwrap_or(0.0);
    let step_len = length / steps as f32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let visible = dash.is_none() || phase % period < DASH_ON;
        if visible {
            put(image, from.0 + dx * t, from.1 + dy * t, color);
        }
        if i < steps {
            phase += step_len;
        }
    }
    phase
}

fn put(image: &mut RgbImage, x: f32, y: f32, color: Rgb<u8>) {
    let (x, y) = (x.round(), y.round());
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_has_fixed_size_and_draws_points() {
        let image = render_curve(&[0.0, 1.0], &[0.0, 1.0]);
        assert_eq!(image.dimensions(), (CURVE_WIDTH, CURVE_HEIGHT));
        let bottom_left = image.get_pixel(MARGIN, CURVE_HEIGHT - MARGIN);
        assert_eq!(*bottom_left, CURVE);
        assert!(image.pixels().any(|p| *p == CURVE));
    }

    fn empty_matrix(label_count: usize) -> ConfusionMatrix {
        let records = crate::dataset::InferenceRecordStore::default();
        let truth = crate::dataset::GroundTruthIndex::default();
        crate::metrics::build_confusion_matrix(&records, &truth, label_count, 1)
            .unwrap()
            .matrix
    }

    #[test]
    fn heatmap_uses_full_cells_for_few_labels() {
        let image = render_heatmap(&empty_matrix(2));
        assert_eq!(image.dimensions(), (80, 80));
        assert_eq!(*image.get_pixel(0, 0), GRID);
        assert_eq!(*image.get_pixel(40, 10), GRID);
        assert_eq!(*image.get_pixel(10, 10), reds(0.0));
    }

    #[test]
    fn heatmap_side_is_capped_for_many_labels() {
        let image = render_heatmap(&empty_matrix(300));
        assert_eq!(image.dimensions(), (MAX_HEATMAP_SIDE, MAX_HEATMAP_SIDE));
        assert_eq!(heatmap_side(1_000), MAX_HEATMAP_SIDE);
        assert_eq!(heatmap_side(usize::MAX), MAX_HEATMAP_SIDE);
    }

    #[test]
    fn reds_spans_palette() {
        assert_eq!(reds(0.0), Rgb([255, 245, 240]));
        assert_eq!(reds(1.0), Rgb([103, 0, 13]));
    }
}
