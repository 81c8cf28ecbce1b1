//! Conversion from CSS pixels reported by the page to the physical pixels
//! used for synthesized input.

use crate::error::RunError;
use cadence_common::{DisplayRectangle, Point};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportInfo {
    pixel_ratio: f64,
    content_window: DisplayRectangle,
    element_rect: Option<DisplayRectangle>,
}

impl ViewportInfo {
    /// `window_bounds` is the browser window as reported by the platform, in
    /// physical pixels. `inner_width`/`inner_height` are the page's
    /// `window.innerWidth`/`innerHeight` and `element_rect` its
    /// `getBoundingClientRect()`, all in CSS pixels.
    ///
    /// The pixel ratio is derived from widths because a zoomed page reports a
    /// stale `devicePixelRatio`. Any height the platform reports beyond the
    /// scaled viewport is treated as a border above the content area.
    pub fn new(
        window_bounds: DisplayRectangle,
        inner_width: f64,
        inner_height: f64,
        element_rect: Option<DisplayRectangle>,
    ) -> Result<Self, RunError> {
        if !(inner_width.is_finite() && inner_width > 0.0) {
            return Err(RunError::UnexpectedValue(format!(
                "Invalid viewport width: {}",
                inner_width
            )));
        }
        let pixel_ratio = window_bounds.width / inner_width;
        let scaled_height = (inner_height * pixel_ratio).round();
        let top_border = window_bounds.height - scaled_height;
        let content_window = DisplayRectangle::new(
            window_bounds.left(),
            window_bounds.top() + top_border,
            window_bounds.width,
            window_bounds.height - top_border,
        );
        let element_rect = element_rect.map(|rect| rect.scale(pixel_ratio).shift_by(&content_window));
        Ok(Self {
            pixel_ratio,
            content_window,
            element_rect,
        })
    }

    /// Builds the info from the reply of [`crate::selector::viewport_script`]:
    /// `[found, innerHeight, innerWidth, left, top, width, height]`.
    pub fn from_reply(window_bounds: DisplayRectangle, reply: &Value) -> Result<Self, RunError> {
        let fields = reply
            .as_array()
            .filter(|fields| fields.len() == 7)
            .ok_or_else(|| RunError::UnexpectedValue(format!("viewport reply {}", reply)))?;
        let found = fields[0].as_bool().unwrap_or(false);
        let mut numbers = [0.0; 6];
        for (slot, value) in numbers.iter_mut().zip(&fields[1..]) {
            *slot = value
                .as_f64()
                .ok_or_else(|| RunError::UnexpectedValue(format!("viewport reply {}", reply)))?;
        }
        let [inner_height, inner_width, left, top, width, height] = numbers;
        let element_rect = found.then(|| DisplayRectangle::new(left, top, width, height));
        Self::new(window_bounds, inner_width, inner_height, element_rect)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// The part of the window that shows page content.
    pub fn content_window(&self) -> DisplayRectangle {
        self.content_window
    }

    pub fn element_rect(&self) -> Option<DisplayRectangle> {
        self.element_rect
    }

    pub fn element_center(&self) -> Option<Point> {
        self.element_rect.map(|rect| rect.center())
    }

    pub fn css_to_native_distance(&self, distance: f64) -> f64 {
        distance * self.pixel_ratio
    }
}
