mod color;
mod core;

pub use self::core::*;
pub use color::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_size_and_position() {
        let r = Rect::new(10, 20, 800, 600);
        assert_eq!(r.size(), Size::new(800, 600));
        assert_eq!(r.position(), (10, 20));
    }

    #[test]
    fn rect_serialization() {
        let r = Rect::new(0, 0, 1920, 1080);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"x":0,"y":0,"width":1920,"height":1080}"#);
        let back: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn centered_rect_sits_in_middle_of_area() {
        let area = Rect::new(0, 25, 1920, 1055);
        let r = Rect::centered_in(area, Size::new(800, 600));
        assert_eq!(r, Rect::new(560, 252, 800, 600));
    }

    #[test]
    fn centered_rect_larger_than_area_pins_to_origin() {
        let area = Rect::new(0, 0, 640, 480);
        let r = Rect::centered_in(area, Size::new(800, 600));
        assert_eq!(r.x, 0);
        assert_eq!(r.y, 0);
    }

    #[test]
    fn intersect_clips_to_overlap() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 60, 100, 100);
        assert_eq!(a.intersect(&b), Some(Rect::new(50, 60, 50, 40)));
        assert_eq!(a.intersect(&Rect::new(200, 200, 10, 10)), None);
    }

    #[test]
    fn intersect_near_i32_max_does_not_overflow() {
        let image = Rect::new(0, 0, 100, 100);
        assert_eq!(image.intersect(&Rect::new(i32::MAX - 5, 0, 100, 100)), None);

        let a = Rect::new(i32::MAX - 10, 0, 100, 10);
        let b = Rect::new(i32::MAX - 20, 0, 100, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(i32::MAX - 10, 0, 90, 10)));
    }

    #[test]
    fn size_unbounded_means_zero() {
        assert!(Size::UNBOUNDED.is_unbounded());
        assert!(!Size::new(1, 0).is_unbounded());
    }

    #[test]
    fn window_state_serializes_lowercase() {
        let json = serde_json::to_string(&WindowState::FullScreen).unwrap();
        assert_eq!(json, "\"fullscreen\"");
        assert_eq!(WindowState::Minimized.to_string(), "minimized");
    }

    #[test]
    fn color_from_hex_6() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert_eq!(c, Color::from_rgba(255, 136, 0, 255));
    }

    #[test]
    fn color_from_hex_8_is_argb() {
        let c = Color::from_hex("#80ff8800").unwrap();
        assert_eq!(c, Color::from_rgba(255, 136, 0, 128));
    }

    #[test]
    fn color_from_short_hex() {
        let c = Color::from_hex("#0f0").unwrap();
        assert_eq!(c, Color::from_rgba(0, 255, 0, 255));
    }

    #[test]
    fn color_from_hex_invalid() {
        assert!(Color::from_hex("zzzzzz").is_none());
        assert!(Color::from_hex("#abcd").is_none());
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn color_to_hex_roundtrip() {
        let opaque = Color::from_rgba(171, 205, 239, 255);
        assert_eq!(opaque.to_hex(), "#abcdef");
        let translucent = Color::from_rgba(255, 0, 128, 128);
        assert_eq!(translucent.to_hex(), "#80ff0080");
        assert_eq!(Color::from_hex(&translucent.to_hex()), Some(translucent));
    }

    #[test]
    fn default_color_is_white() {
        assert_eq!(Color::default().to_hex(), "#ffffff");
    }
}
