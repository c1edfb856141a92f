//! Commented default config written on first run.

pub fn default_config_toml() -> &'static str {
    r##"# Casement configuration
# Every key is optional; removed keys fall back to the values shown here.

[window]
default_width = 800
default_height = 600
# Title bar height for framed windows. Content bounds start below it.
titlebar_height = 28
show_on_create = true
background_color = "#ffffff"

[display]
width = 1920
height = 1080
menu_bar_height = 25

[content]
# Print/save operations fail with a render timeout after this many ms.
render_timeout_ms = 30000
user_agent = "Casement/0.1"
default_zoom = 1.0
devtools = false
frame_rate = 60

[ipc]
# Queues never reject; a warning is logged past this depth.
queue_warn_depth = 10000

[logging]
# TRACE, DEBUG, INFO, WARNING or ERROR
level = "INFO"
"##
}
