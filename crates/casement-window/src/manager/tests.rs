use std::sync::{Arc, Mutex};
use std::time::Duration;

use casement_config::HostConfig;
use casement_ipc::Listener;
use casement_platform::{Clipboard, ClipboardType, MemoryClipboard};
use casement_webview::{HeadlessFactory, SharedClipboard};
use serde_json::{json, Value};

use super::*;
use crate::window::Window;

fn manager() -> (WindowManager, Arc<HeadlessFactory>) {
    manager_with(HostConfig::default())
}

fn manager_with(config: HostConfig) -> (WindowManager, Arc<HeadlessFactory>) {
    let factory = Arc::new(HeadlessFactory::new());
    let manager = WindowManager::new(config, factory.clone()).unwrap();
    (manager, factory)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn create_uses_config_defaults_and_centres() {
    let (manager, _) = manager();
    let w = manager.create(WindowOptions::default()).unwrap();
    assert_eq!(w.bounds().unwrap(), Rect::new(560, 252, 800, 600));
    assert!(w.is_visible().unwrap());
    assert!(w.is_focused().unwrap());
    assert!(w.is_normal().unwrap());
    assert_eq!(w.background_color().unwrap(), Color::from_hex("#ffffff").unwrap());
}

#[tokio::test]
async fn explicit_position_is_kept() {
    let (manager, _) = manager();
    let w = manager
        .create(WindowOptions {
            x: Some(10),
            y: Some(20),
            ..WindowOptions::sized(300, 200)
        })
        .unwrap();
    assert_eq!(w.bounds().unwrap(), Rect::new(10, 20, 300, 200));

    let centred = manager
        .create(WindowOptions {
            x: Some(10),
            y: Some(20),
            center: true,
            ..WindowOptions::sized(300, 200)
        })
        .unwrap();
    assert_ne!(centred.position().unwrap(), (10, 20));
}

#[tokio::test]
async fn create_validates_geometry() {
    let (manager, factory) = manager();
    assert!(matches!(
        manager.create(WindowOptions::sized(0, 100)),
        Err(HostError::InvalidGeometry(_))
    ));
    assert!(matches!(
        manager.create(WindowOptions {
            min_width: 500,
            max_width: 400,
            ..WindowOptions::sized(450, 300)
        }),
        Err(HostError::InvalidConstraint(_))
    ));
    assert_eq!(manager.count(), 0);
    assert!(factory.engine(ContentId(1)).is_none());
}

#[tokio::test]
async fn create_clamps_into_limits() {
    let (manager, _) = manager();
    let w = manager
        .create(WindowOptions {
            min_width: 500,
            max_height: 250,
            ..WindowOptions::sized(400, 300)
        })
        .unwrap();
    assert_eq!(w.size().unwrap(), Size::new(500, 250));
}

#[tokio::test]
async fn hidden_creation_and_config_default() {
    let mut config = HostConfig::default();
    config.window.show_on_create = false;
    let (manager, _) = manager_with(config);

    let hidden = manager.create(WindowOptions::default()).unwrap();
    assert!(!hidden.is_visible().unwrap());
    assert!(manager.focused().is_none());

    let shown = manager
        .create(WindowOptions {
            show: Some(true),
            ..WindowOptions::default()
        })
        .unwrap();
    assert!(shown.is_visible().unwrap());
}

#[tokio::test]
async fn invalid_background_falls_back_to_config() {
    let mut config = HostConfig::default();
    config.window.background_color = "#202020".into();
    let (manager, _) = manager_with(config);
    let w = manager
        .create(WindowOptions {
            background_color: Some("not-a-colour".into()),
            ..WindowOptions::default()
        })
        .unwrap();
    assert_eq!(w.background_color().unwrap(), Color::from_hex("#202020").unwrap());
}

#[tokio::test]
async fn ids_start_at_one_and_are_not_reused() {
    let (manager, _) = manager();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    assert_eq!(a.id(), WindowId(1));
    assert_eq!(b.id(), WindowId(2));
    assert_eq!(a.web_contents().unwrap().id(), ContentId(1));

    a.destroy();
    let c = manager.create(WindowOptions::default()).unwrap();
    assert_eq!(c.id(), WindowId(3));
    assert_eq!(c.web_contents().unwrap().id(), ContentId(3));
}

#[tokio::test]
async fn lookup_and_destroy() {
    let (manager, _) = manager();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    assert_eq!(manager.count(), 2);
    assert_eq!(manager.get(a.id()).unwrap().id(), a.id());
    let ids: Vec<WindowId> = manager.all().iter().map(Window::id).collect();
    assert_eq!(ids, vec![a.id(), b.id()]);

    let content = b.web_contents().unwrap().id();
    assert_eq!(manager.from_content(content).unwrap().id(), b.id());

    let a_content = a.web_contents().unwrap().id();
    manager.destroy(a.id());
    manager.destroy(a.id());
    manager.destroy(WindowId(99));
    assert!(a.is_destroyed());
    assert!(manager.get(a.id()).is_none());
    assert_eq!(manager.count(), 1);
    assert!(!manager.router().is_live(a_content.0));
    assert!(manager.from_content(a_content).is_none());
}

#[tokio::test]
async fn destroy_all_releases_every_window() {
    let (manager, factory) = manager();
    let windows: Vec<Window> = (0..3)
        .map(|_| manager.create(WindowOptions::default()).unwrap())
        .collect();
    manager.destroy_all();

    assert_eq!(manager.count(), 0);
    assert!(manager.z_order().is_empty());
    assert!(manager.focused().is_none());
    for (i, w) in windows.iter().enumerate() {
        assert!(w.is_destroyed());
        let engine = factory.engine(ContentId(i as u32 + 1)).unwrap();
        assert!(engine.is_shut_down());
    }
    assert_eq!(manager.router().live_ids(), vec![0]);
}

#[tokio::test]
async fn dropped_windows_release_their_engines() {
    let (manager, factory) = manager();
    let kept = manager.create(WindowOptions::default()).unwrap();
    let gone = manager.create(WindowOptions::default()).unwrap();
    let gone_content = gone.web_contents().unwrap().id();

    gone.destroy();
    drop(gone);
    assert!(factory.engine(gone_content).is_none());

    let next = manager.create(WindowOptions::default()).unwrap();
    let live = vec![
        kept.web_contents().unwrap().id(),
        next.web_contents().unwrap().id(),
    ];
    assert_eq!(factory.live_ids(), live);
}

#[tokio::test]
async fn focus_is_exclusive() {
    let (manager, _) = manager();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    assert!(b.is_focused().unwrap());
    assert!(!a.is_focused().unwrap());

    a.focus().unwrap();
    assert!(a.is_focused().unwrap());
    assert!(!b.is_focused().unwrap());
    assert_eq!(manager.focused().unwrap().id(), a.id());
    assert_eq!(manager.z_order(), vec![a.id(), b.id()]);

    a.blur().unwrap();
    assert!(manager.focused().is_none());

    b.focus().unwrap();
    b.destroy();
    assert!(manager.focused().is_none());
}

#[tokio::test]
async fn always_on_top_stays_in_front() {
    let (manager, _) = manager();
    let pinned = manager
        .create(WindowOptions {
            always_on_top: true,
            ..WindowOptions::default()
        })
        .unwrap();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    assert_eq!(manager.z_order(), vec![pinned.id(), b.id(), a.id()]);

    a.focus().unwrap();
    assert_eq!(manager.z_order(), vec![pinned.id(), a.id(), b.id()]);

    pinned.set_always_on_top(false).unwrap();
    b.move_top().unwrap();
    assert_eq!(manager.z_order()[0], b.id());

    a.set_always_on_top(true).unwrap();
    assert!(a.is_always_on_top().unwrap());
    assert_eq!(manager.z_order()[0], a.id());
}

#[tokio::test]
async fn subscribers_see_focus_moves() {
    let (manager, _) = manager();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    let mut rx = manager.subscribe();

    a.focus().unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            WindowEvent::FocusChanged {
                window_id: b.id(),
                focused: false
            },
            WindowEvent::FocusChanged {
                window_id: a.id(),
                focused: true
            },
        ]
    );
}

#[tokio::test]
async fn content_processes_message_each_other() {
    let (manager, _) = manager();
    let a = manager.create(WindowOptions::default()).unwrap();
    let b = manager.create(WindowOptions::default()).unwrap();
    let from_a = a.web_contents().unwrap().ipc().unwrap();
    let to_b = b.web_contents().unwrap().ipc().unwrap();

    let seen: Arc<Mutex<Vec<(u32, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    to_b.on(
        "greeting",
        Listener::new(move |event, args| {
            sink.lock()
                .unwrap()
                .push((event.sender_id, args[0].clone()));
        }),
    );

    from_a.send_to(to_b.id(), "greeting", vec![json!("hello")]);
    wait_until(|| !seen.lock().unwrap().is_empty()).await;
    assert_eq!(seen.lock().unwrap()[0], (from_a.id(), json!("hello")));
}

#[tokio::test]
async fn clipboard_reaches_later_windows() {
    let (manager, factory) = manager();
    let clipboard: SharedClipboard = Arc::new(Mutex::new(MemoryClipboard::new()));
    manager.set_clipboard(clipboard.clone());
    let w = manager
        .create(WindowOptions {
            web_preferences: casement_webview::WebPreferences {
                capabilities: Some(
                    [casement_webview::Capability::ClipboardWriteText]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            },
            ..WindowOptions::default()
        })
        .unwrap();

    let engine = factory.engine(w.web_contents().unwrap().id()).unwrap();
    assert!(engine.post_from_page(
        r#"{"id":1,"call":{"op":"clipboard_write_text","text":"copied"}}"#
    ));
    wait_until(|| {
        clipboard
            .lock()
            .unwrap()
            .read_text(ClipboardType::Clipboard)
            .map(|t| t == "copied")
            .unwrap_or(false)
    })
    .await;
}
