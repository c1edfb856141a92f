//! Bounds, content bounds and size constraints.
//!
//! Setters validate everything before touching state, so a rejected call
//! leaves the window exactly as it was. While the window is not `Normal`,
//! new geometry is recorded as the normal bounds and applied when the
//! window returns to `Normal`.

use casement_common::{HostError, Rect, Size, WindowEvent, WindowState};
use tracing::debug;

use super::{Window, WindowData};

/// The content area of a window with outer `bounds`.
pub(crate) fn content_rect(bounds: Rect, frame: bool, titlebar_height: i32) -> Rect {
    if !frame {
        return bounds;
    }
    let inset = titlebar_height.min(bounds.height).max(0);
    Rect::new(
        bounds.x,
        bounds.y.saturating_add(inset),
        bounds.width,
        bounds.height - inset,
    )
}

/// Outer height for a content area of `content_height` below `inset`.
fn framed_height(content_height: i32, inset: i32) -> Result<i32, HostError> {
    content_height.checked_add(inset).ok_or_else(|| {
        HostError::InvalidGeometry(format!(
            "content height {content_height} plus titlebar {inset} does not fit in i32"
        ))
    })
}

/// `min` and `max` are compatible. Zero components are unbounded.
pub(crate) fn check_constraints(min: Size, max: Size) -> Result<(), HostError> {
    if min.width < 0 || min.height < 0 || max.width < 0 || max.height < 0 {
        return Err(HostError::InvalidGeometry(format!(
            "size limits must not be negative: min {}x{}, max {}x{}",
            min.width, min.height, max.width, max.height
        )));
    }
    let width_conflict = max.width > 0 && min.width > max.width;
    let height_conflict = max.height > 0 && min.height > max.height;
    if width_conflict || height_conflict {
        return Err(HostError::InvalidConstraint(format!(
            "minimum size {}x{} exceeds maximum size {}x{}",
            min.width, min.height, max.width, max.height
        )));
    }
    Ok(())
}

/// Clamp `size` into `[min, max]`, ignoring unbounded components.
pub(crate) fn clamp_size(size: Size, min: Size, max: Size) -> Size {
    let clamp = |v: i32, lo: i32, hi: i32| {
        let v = if lo > 0 { v.max(lo) } else { v };
        if hi > 0 {
            v.min(hi)
        } else {
            v
        }
    };
    Size::new(
        clamp(size.width, min.width, max.width),
        clamp(size.height, min.height, max.height),
    )
}

fn check_size(size: Size, min: Size, max: Size) -> Result<(), HostError> {
    if size.width <= 0 || size.height <= 0 {
        return Err(HostError::InvalidGeometry(format!(
            "size must be positive, got {}x{}",
            size.width, size.height
        )));
    }
    if clamp_size(size, min, max) != size {
        return Err(HostError::ConstraintViolation(format!(
            "size {}x{} is outside the limits min {}x{}, max {}x{}",
            size.width, size.height, min.width, min.height, max.width, max.height
        )));
    }
    Ok(())
}

impl Window {
    pub fn bounds(&self) -> Result<Rect, HostError> {
        Ok(self.data()?.bounds)
    }

    pub fn content_bounds(&self) -> Result<Rect, HostError> {
        let data = self.data()?;
        Ok(content_rect(data.bounds, data.frame, self.inner.titlebar_height))
    }

    /// Bounds the window returns to when it is next `Normal`.
    pub fn normal_bounds(&self) -> Result<Rect, HostError> {
        let data = self.data()?;
        Ok(if data.state == WindowState::Normal {
            data.bounds
        } else {
            data.normal_bounds
        })
    }

    pub fn size(&self) -> Result<Size, HostError> {
        Ok(self.bounds()?.size())
    }

    pub fn content_size(&self) -> Result<Size, HostError> {
        Ok(self.content_bounds()?.size())
    }

    pub fn position(&self) -> Result<(i32, i32), HostError> {
        Ok(self.bounds()?.position())
    }

    pub fn minimum_size(&self) -> Result<Size, HostError> {
        Ok(self.data()?.min_size)
    }

    pub fn maximum_size(&self) -> Result<Size, HostError> {
        Ok(self.data()?.max_size)
    }

    pub fn set_bounds(&self, bounds: Rect) -> Result<(), HostError> {
        self.apply_geometry(|_, _| Ok(bounds))
    }

    pub fn set_size(&self, width: i32, height: i32) -> Result<(), HostError> {
        self.apply_geometry(|current, _| Ok(Rect::new(current.x, current.y, width, height)))
    }

    pub fn set_position(&self, x: i32, y: i32) -> Result<(), HostError> {
        self.apply_geometry(|current, _| Ok(Rect::new(x, y, current.width, current.height)))
    }

    /// Size the content area; the frame grows around it.
    pub fn set_content_size(&self, width: i32, height: i32) -> Result<(), HostError> {
        let titlebar = self.inner.titlebar_height;
        self.apply_geometry(move |current, frame| {
            check_content(width, height)?;
            let inset = if frame { titlebar } else { 0 };
            Ok(Rect::new(
                current.x,
                current.y,
                width,
                framed_height(height, inset)?,
            ))
        })
    }

    pub fn set_content_bounds(&self, content: Rect) -> Result<(), HostError> {
        let titlebar = self.inner.titlebar_height;
        self.apply_geometry(move |_, frame| {
            check_content(content.width, content.height)?;
            let inset = if frame { titlebar } else { 0 };
            let y = content.y.checked_sub(inset).ok_or_else(|| {
                HostError::InvalidGeometry(format!(
                    "content y {} leaves no room for the titlebar",
                    content.y
                ))
            })?;
            Ok(Rect::new(
                content.x,
                y,
                content.width,
                framed_height(content.height, inset)?,
            ))
        })
    }

    /// A minimum above the current size grows the window to fit.
    pub fn set_minimum_size(&self, width: i32, height: i32) -> Result<(), HostError> {
        let min = Size::new(width, height);
        self.apply_limits(|data| {
            check_constraints(min, data.max_size)?;
            data.min_size = min;
            Ok(())
        })
    }

    /// A maximum below the current size shrinks the window to fit.
    pub fn set_maximum_size(&self, width: i32, height: i32) -> Result<(), HostError> {
        let max = Size::new(width, height);
        self.apply_limits(|data| {
            check_constraints(data.min_size, max)?;
            data.max_size = max;
            Ok(())
        })
    }

    /// Keep the content area at `ratio` (width / height) on resize. 0 clears.
    pub fn set_aspect_ratio(&self, ratio: f64) -> Result<(), HostError> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(HostError::InvalidGeometry(format!(
                "aspect ratio must be a non-negative number, got {ratio}"
            )));
        }
        self.data()?.aspect_ratio = ratio;
        Ok(())
    }

    pub fn aspect_ratio(&self) -> Result<f64, HostError> {
        Ok(self.data()?.aspect_ratio)
    }

    /// Validate and commit new outer bounds computed from the current
    /// normal geometry and the frame flag.
    fn apply_geometry(
        &self,
        compute: impl FnOnce(Rect, bool) -> Result<Rect, HostError>,
    ) -> Result<(), HostError> {
        let mut events = Vec::new();
        {
            let mut data = self.data()?;
            let current = if data.state == WindowState::Normal {
                data.bounds
            } else {
                data.normal_bounds
            };
            let requested = compute(current, data.frame)?;
            let bounds = self.with_aspect_ratio(&data, requested)?;
            check_size(bounds.size(), data.min_size, data.max_size)?;
            self.place(&mut data, bounds, &mut events);
        }
        self.emit(events);
        Ok(())
    }

    /// Update size limits through `update`, then pull the window inside
    /// them.
    fn apply_limits(
        &self,
        update: impl FnOnce(&mut WindowData) -> Result<(), HostError>,
    ) -> Result<(), HostError> {
        let mut events = Vec::new();
        {
            let mut data = self.data()?;
            update(&mut data)?;
            let current = if data.state == WindowState::Normal {
                data.bounds
            } else {
                data.normal_bounds
            };
            let size = clamp_size(current.size(), data.min_size, data.max_size);
            if size != current.size() {
                debug!(window_id = %self.inner.id, ?size, "Resizing to fit new size limits");
                let bounds = Rect::new(current.x, current.y, size.width, size.height);
                self.place(&mut data, bounds, &mut events);
            }
        }
        self.emit(events);
        Ok(())
    }

    /// Commit validated normal geometry: applied now when `Normal`,
    /// recorded for later otherwise.
    fn place(
        &self,
        data: &mut WindowData,
        bounds: Rect,
        events: &mut Vec<WindowEvent>,
    ) {
        data.normal_bounds = bounds;
        if data.state == WindowState::Normal {
            self.commit_bounds(data, bounds, events);
        } else {
            debug!(
                window_id = %self.inner.id,
                state = %data.state,
                "Recorded geometry for return to normal"
            );
        }
    }

    /// Adjust the height so the content area keeps the aspect ratio.
    fn with_aspect_ratio(&self, data: &WindowData, bounds: Rect) -> Result<Rect, HostError> {
        if data.aspect_ratio <= 0.0 {
            return Ok(bounds);
        }
        let inset = if data.frame {
            self.inner.titlebar_height
        } else {
            0
        };
        let content_height = (f64::from(bounds.width) / data.aspect_ratio).round();
        if !content_height.is_finite() || content_height > f64::from(i32::MAX) {
            return Err(HostError::InvalidGeometry(format!(
                "width {} at aspect ratio {} gives a content height out of range",
                bounds.width, data.aspect_ratio
            )));
        }
        let height = framed_height(content_height as i32, inset)?;
        Ok(Rect::new(bounds.x, bounds.y, bounds.width, height))
    }
}

fn check_content(width: i32, height: i32) -> Result<(), HostError> {
    if width <= 0 || height <= 0 {
        return Err(HostError::InvalidGeometry(format!(
            "content size must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framed_content_sits_below_titlebar() {
        let bounds = Rect::new(10, 20, 300, 200);
        assert_eq!(content_rect(bounds, true, 28), Rect::new(10, 48, 300, 172));
        assert_eq!(content_rect(bounds, false, 28), bounds);
        assert_eq!(content_rect(Rect::new(0, 0, 10, 5), true, 28).height, 0);
    }

    #[test]
    fn content_rect_saturates_at_the_bottom_edge() {
        let bounds = Rect::new(0, i32::MAX - 10, 300, 200);
        let content = content_rect(bounds, true, 28);
        assert_eq!(content.y, i32::MAX);
        assert_eq!(content.height, 172);
    }

    #[test]
    fn framed_height_rejects_overflow() {
        assert_eq!(framed_height(100, 28).unwrap(), 128);
        assert!(matches!(
            framed_height(i32::MAX - 10, 28),
            Err(HostError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn zero_limits_are_unbounded() {
        let size = Size::new(5000, 1);
        assert_eq!(clamp_size(size, Size::UNBOUNDED, Size::UNBOUNDED), size);
        assert_eq!(
            clamp_size(size, Size::new(0, 100), Size::new(1000, 0)),
            Size::new(1000, 100)
        );
    }

    #[test]
    fn conflicting_limits_are_invalid() {
        assert!(check_constraints(Size::new(100, 100), Size::new(50, 0)).is_err());
        assert!(check_constraints(Size::new(100, 100), Size::new(0, 0)).is_ok());
        assert!(matches!(
            check_constraints(Size::new(-1, 0), Size::UNBOUNDED),
            Err(HostError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn size_checks_distinguish_invalid_from_violation() {
        let min = Size::new(200, 200);
        let max = Size::new(800, 600);
        assert!(matches!(
            check_size(Size::new(0, 300), min, max),
            Err(HostError::InvalidGeometry(_))
        ));
        assert!(matches!(
            check_size(Size::new(100, 300), min, max),
            Err(HostError::ConstraintViolation(_))
        ));
        assert!(check_size(Size::new(400, 300), min, max).is_ok());
    }
}
