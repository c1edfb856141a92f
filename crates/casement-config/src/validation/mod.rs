//! Full configuration validation.
//!
//! Each section is checked independently and all problems are collected
//! into a single `ConfigError`.

mod helpers;


use crate::schema::HostConfig;
use casement_common::{Color, ConfigError};

use helpers::{validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HostConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_window(&mut errors, config);
    validate_display(&mut errors, config);
    validate_content(&mut errors, config);

    if config.ipc.queue_warn_depth == 0 {
        errors.push("ipc.queue_warn_depth must be at least 1".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_window(errors: &mut Vec<String>, config: &HostConfig) {
    let w = &config.window;
    validate_range(errors, "window.default_width", w.default_width, 1, 16_384);
    validate_range(errors, "window.default_height", w.default_height, 1, 16_384);
    validate_range(errors, "window.titlebar_height", w.titlebar_height, 0, 200);
    if w.titlebar_height >= w.default_height {
        errors.push(format!(
            "window.titlebar_height = {} leaves no room for content in default_height = {}",
            w.titlebar_height, w.default_height
        ));
    }
    if Color::from_hex(&w.background_color).is_none() {
        errors.push(format!(
            "window.background_color = {:?} is not a hex colour",
            w.background_color
        ));
    }
}

fn validate_display(errors: &mut Vec<String>, config: &HostConfig) {
    let d = &config.display;
    validate_range(errors, "display.width", d.width, 1, 16_384);
    validate_range(errors, "display.height", d.height, 1, 16_384);
    if d.menu_bar_height >= d.height {
        errors.push(format!(
            "display.menu_bar_height = {} must be smaller than display.height = {}",
            d.menu_bar_height, d.height
        ));
    }
}

fn validate_content(errors: &mut Vec<String>, config: &HostConfig) {
    let c = &config.content;
    if c.render_timeout_ms < 100 || c.render_timeout_ms > 600_000 {
        errors.push(format!(
            "content.render_timeout_ms = {} is out of range [100, 600000]",
            c.render_timeout_ms
        ));
    }
    validate_range_f64(errors, "content.default_zoom", c.default_zoom, 0.25, 5.0);
    validate_range(errors, "content.frame_rate", c.frame_rate, 1, 240);
}
