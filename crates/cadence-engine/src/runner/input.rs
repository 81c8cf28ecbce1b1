//! Handlers that synthesize pointer input at physical window coordinates.

use super::script::{mismatched, reject_click_duration};
use super::{ActionHandler, RunContext};
use crate::error::RunError;
use crate::surface::Surface;
use async_trait::async_trait;
use cadence_common::{DisplayRectangle, Point, Pointer};
use cadence_parser::{ActionBody, ActionSpec};
use std::time::Duration;
use tracing::debug;

/// One swipe gesture of a decomposed scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeSegment {
    pub from: Point,
    pub to: Point,
    pub duration: Duration,
}

/// Splits a scroll of `distance` physical pixels inside `area` into swipes no
/// longer than the area's height. Scrolling down swipes upwards from the
/// bottom edge; a negative distance swipes downwards from the top edge. Each
/// segment gets the share of `duration` matching its share of the distance.
pub fn swipe_segments(
    area: DisplayRectangle,
    distance: f64,
    duration: Duration,
) -> Result<Vec<SwipeSegment>, RunError> {
    let max_swipe = area.height;
    if !(max_swipe.is_finite() && max_swipe > 0.0) {
        return Err(RunError::UnexpectedValue(format!(
            "Scroll area has no height: {:?}",
            area
        )));
    }
    let total = distance.abs();
    let x = area.mid_x().round();
    let mut remaining = total;
    let mut segments = Vec::new();
    while remaining > 0.0 {
        let current = max_swipe.min(remaining);
        let (start_y, end_y) = if distance < 0.0 {
            (area.top(), area.top() + current)
        } else {
            (area.bottom(), area.bottom() - current)
        };
        segments.push(SwipeSegment {
            from: Point::new(x, start_y.round()),
            to: Point::new(x, end_y.round()),
            duration: duration.mul_f64(current / total),
        });
        remaining -= current;
    }
    Ok(segments)
}

/// Taps the given coordinates, or the center of the element matching the
/// selector after optionally scrolling it into view.
pub struct PointerClickHandler {
    pub pointer: Pointer,
}

#[async_trait]
impl ActionHandler for PointerClickHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Click(click) = action.body() else {
            return Err(mismatched(action, "click"));
        };
        reject_click_duration(ctx, action, click)?;

        let point = match (click.target().point(), click.selector()) {
            (Some(point), _) => point,
            (None, Some(selector)) => {
                let viewport = ctx
                    .viewport(surface, Some(selector), click.scroll_into_view())
                    .await?;
                match viewport.element_center() {
                    Some(center) => Point::new(center.x.round(), center.y.round()),
                    None if click.required() => {
                        return Err(RunError::ElementNotFound {
                            selector: selector.to_string(),
                        });
                    }
                    None => {
                        debug!("Skipping {} click, no element matches '{}'", self.pointer, selector);
                        return Ok(());
                    }
                }
            }
            (None, None) => return Err(RunError::UnexpectedValue("Click without target".into())),
        };
        surface.synthesize_tap(point, self.pointer).await?;
        Ok(())
    }
}

/// Scrolls by swiping inside the content window or the selected element.
pub struct PointerScrollHandler {
    pub pointer: Pointer,
}

#[async_trait]
impl ActionHandler for PointerScrollHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Scroll(scroll) = action.body() else {
            return Err(mismatched(action, "scroll"));
        };
        let viewport = ctx.viewport(surface, scroll.selector(), false).await?;
        let area = match (scroll.selector(), viewport.element_rect()) {
            (None, _) => viewport.content_window(),
            (Some(_), Some(rect)) => rect,
            (Some(selector), None) => {
                if scroll.required() {
                    return Err(RunError::ElementNotFound {
                        selector: selector.to_string(),
                    });
                }
                debug!("Skipping {} scroll, no element matches '{}'", self.pointer, selector);
                return Ok(());
            }
        };

        let distance = viewport.css_to_native_distance(scroll.distance());
        for segment in swipe_segments(area, distance, scroll.duration())? {
            surface
                .synthesize_swipe(segment.from, segment.to, segment.duration, self.pointer)
                .await?;
        }
        Ok(())
    }
}

pub struct SwipeHandler;

#[async_trait]
impl ActionHandler for SwipeHandler {
    async fn run(
        &self,
        _ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Swipe(swipe) = action.body() else {
            return Err(mismatched(action, "swipe"));
        };
        surface
            .synthesize_swipe(swipe.start(), swipe.end(), swipe.duration(), Pointer::Touch)
            .await?;
        Ok(())
    }
}
