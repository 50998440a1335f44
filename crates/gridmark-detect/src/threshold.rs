//! Thresholding: local-mean adaptive segmentation of the frame and global
//! Otsu binarisation of rectified patches.

use gridmark_core::{GrayImage, GrayImageView};

/// Adaptive mean threshold over an `aperture × aperture` neighbourhood.
///
/// A pixel becomes foreground (255) when it is brighter than the local mean
/// minus `bias`; pixels noticeably darker than their surroundings (the dark
/// side of edges) become 0. Borders are replicated. `aperture` must already
/// be validated (odd, >= 3).
pub fn adaptive_threshold_mean(src: &GrayImageView<'_>, aperture: usize, bias: i32) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let r = (aperture / 2) as isize;
    let area = (aperture * aperture) as u32;

    // Horizontal running sums with replicated borders.
    let mut row_sums = vec![0u32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        let at = |x: isize| row[x.clamp(0, w as isize - 1) as usize] as u32;
        let mut acc: u32 = (-r..=r).map(at).sum();
        for x in 0..w {
            row_sums[y * w + x] = acc;
            let xi = x as isize;
            acc = acc + at(xi + r + 1) - at(xi - r);
        }
    }

    let mut out = vec![0u8; w * h];
    for x in 0..w {
        let at = |y: isize| row_sums[y.clamp(0, h as isize - 1) as usize * w + x];
        let mut acc: u32 = (-r..=r).map(at).sum();
        for y in 0..h {
            let mean = ((2 * acc + area) / (2 * area)) as i32;
            let v = src.data[y * w + x] as i32;
            out[y * w + x] = if v - mean > -bias { 255 } else { 0 };
            let yi = y as isize;
            acc = acc + at(yi + r + 1) - at(yi - r);
        }
    }

    GrayImage {
        width: w,
        height: h,
        data: out,
    }
}

/// Compute the Otsu threshold of a set of intensities.
///
/// Values `<= threshold` form the dark class.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut hist = [0u32; 256];
    let (mut min_v, mut max_v) = (255u8, 0u8);
    for &v in samples {
        hist[v as usize] += 1;
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }
    if hist.iter().filter(|&&c| c > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &c) in hist.iter().enumerate() {
        w_b += c as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * c as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Binarise a patch with its own Otsu threshold (`> t` → 255).
pub fn binarize_otsu(src: &GrayImage) -> (GrayImage, u8) {
    let t = otsu_threshold(&src.data);
    let data = src
        .data
        .iter()
        .map(|&v| if v > t { 255 } else { 0 })
        .collect();
    (
        GrayImage {
            width: src.width,
            height: src.height,
            data,
        },
        t,
    )
}
