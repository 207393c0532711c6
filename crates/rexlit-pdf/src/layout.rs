//! Bates stamp placement math (§4.9): safe-area rectangle, label box
//! sizing, and corner-anchored centering, independent of PDF I/O so it can
//! be exercised without a renderer.

/// Half-inch safe-area inset, in PDF points (1 inch = 72 points).
pub const SAFE_AREA_INSET_PT: f64 = 0.5 * 72.0;

/// An axis-aligned rectangle in PDF user-space points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Anchor corner for the stamp, relative to the safe area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    BottomRight,
    BottomCenter,
    TopRight,
}

impl Corner {
    /// `(x_ratio, y_ratio)` of the safe area this corner centers on.
    pub fn ratios(&self) -> (f64, f64) {
        match self {
            Corner::BottomRight => (1.0, 0.0),
            Corner::BottomCenter => (0.5, 0.0),
            Corner::TopRight => (1.0, 1.0),
        }
    }
}

/// The page rect inset by the safe-area margin on every side (§4.9).
pub fn safe_area(page_width: f64, page_height: f64) -> Rect {
    Rect {
        x0: SAFE_AREA_INSET_PT,
        y0: SAFE_AREA_INSET_PT,
        x1: (page_width - SAFE_AREA_INSET_PT).max(SAFE_AREA_INSET_PT),
        y1: (page_height - SAFE_AREA_INSET_PT).max(SAFE_AREA_INSET_PT),
    }
}

/// `text_width = max(0.5 * font_size * |label|, 2 * font_size)`,
/// `text_height = 1.2 * font_size` (§4.9).
pub fn label_box_size(font_size: f64, label_len: usize) -> (f64, f64) {
    let text_width = (0.5 * font_size * label_len as f64).max(2.0 * font_size);
    let text_height = 1.2 * font_size;
    (text_width, text_height)
}

/// The label box for `label`, centered on `corner`'s ratio point of the
/// safe area, clamped so it never extends past the safe area's edges.
pub fn label_box(safe: &Rect, corner: Corner, font_size: f64, label_len: usize) -> Rect {
    let (width, height) = label_box_size(font_size, label_len);
    let (x_ratio, y_ratio) = corner.ratios();

    let raw_center_x = safe.x0 + x_ratio * safe.width();
    let raw_center_y = safe.y0 + y_ratio * safe.height();

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    let center_x = clamp_center(raw_center_x, safe.x0, safe.x1, half_w);
    let center_y = clamp_center(raw_center_y, safe.y0, safe.y1, half_h);

    Rect {
        x0: center_x - half_w,
        y0: center_y - half_h,
        x1: center_x + half_w,
        y1: center_y + half_h,
    }
}

fn clamp_center(center: f64, lo: f64, hi: f64, half_extent: f64) -> f64 {
    if hi - lo < 2.0 * half_extent {
        // Box wider than the safe area itself: center it exactly.
        (lo + hi) / 2.0
    } else {
        center.clamp(lo + half_extent, hi - half_extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_area_insets_by_half_inch() {
        let rect = safe_area(612.0, 792.0); // US Letter in points
        assert_eq!(rect.x0, 36.0);
        assert_eq!(rect.y0, 36.0);
        assert_eq!(rect.x1, 576.0);
        assert_eq!(rect.y1, 756.0);
    }

    #[test]
    fn label_box_size_uses_floor_of_two_font_sizes() {
        let (w, h) = label_box_size(10.0, 1); // tiny label clamps to the floor
        assert_eq!(w, 20.0);
        assert_eq!(h, 12.0);

        let (w, _) = label_box_size(10.0, 20); // longer label grows past the floor
        assert_eq!(w, 100.0);
    }

    #[test]
    fn bottom_right_box_sits_inside_the_safe_area() {
        let safe = safe_area(612.0, 792.0);
        let bbox = label_box(&safe, Corner::BottomRight, 10.0, 12);
        assert!(bbox.x1 <= safe.x1 + 1e-9);
        assert!(bbox.y0 >= safe.y0 - 1e-9);
        assert!(bbox.x0 >= safe.x0);
    }

    #[test]
    fn bottom_center_box_is_horizontally_centered() {
        let safe = safe_area(612.0, 792.0);
        let bbox = label_box(&safe, Corner::BottomCenter, 10.0, 12);
        let safe_mid = (safe.x0 + safe.x1) / 2.0;
        let box_mid = (bbox.x0 + bbox.x1) / 2.0;
        assert!((box_mid - safe_mid).abs() < 1e-9);
    }

    #[test]
    fn oversized_label_is_centered_rather_than_overflowing_ratio() {
        let safe = safe_area(100.0, 100.0);
        let bbox = label_box(&safe, Corner::TopRight, 40.0, 50);
        let safe_mid_x = (safe.x0 + safe.x1) / 2.0;
        assert!((((bbox.x0 + bbox.x1) / 2.0) - safe_mid_x).abs() < 1e-6);
    }
}
