//! Pure calculation functions for normalization dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit dimensions within a longer-edge limit, preserving aspect ratio.
///
/// Images already inside the limit are returned unchanged; nothing is ever
/// upscaled. Neither output edge is allowed to round down to zero.
///
/// # Examples
/// ```
/// # use simple_drop::imaging::fit_within;
/// // 4000x3000 landscape into 1024 → 1024x768
/// assert_eq!(fit_within((4000, 3000), 1024), (1024, 768));
///
/// // Already small enough
/// assert_eq!(fit_within((640, 480), 1024), (640, 480));
/// ```
pub fn fit_within(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);
    if longer_edge <= max_edge || longer_edge == 0 {
        return original;
    }

    if orig_w >= orig_h {
        // Landscape or square
        let ratio = max_edge as f64 / orig_w as f64;
        (max_edge, ((orig_h as f64 * ratio).round() as u32).max(1))
    } else {
        // Portrait
        let ratio = max_edge as f64 / orig_h as f64;
        (((orig_w as f64 * ratio).round() as u32).max(1), max_edge)
    }
}

/// Shrink both edges by `factor` (0 < factor < 1) for another size-budget
/// round. Returns `None` once the image cannot get any smaller.
pub fn shrink_step(current: (u32, u32), factor: f64) -> Option<(u32, u32)> {
    let (w, h) = current;
    let next = (
        ((w as f64 * factor).round() as u32).max(1),
        ((h as f64 * factor).round() as u32).max(1),
    );
    (next != current).then_some(next)
}

/// Budget in bytes for a `max_size_mb` option (MiB, like the browser
/// compressors this mirrors).
pub fn size_budget_bytes(max_size_mb: f64) -> usize {
    (max_size_mb.max(0.0) * 1024.0 * 1024.0).round() as usize
}
