//! JavaScript side of the capability bridge.
//!
//! Pages call into the host through `window.casement`. Each call posts
//! `{"id": n, "call": {...}}` through `window.ipc.postMessage` and returns
//! a promise; the host settles it by evaluating [`js_settle`].

use std::collections::BTreeSet;

use serde_json::Value;

use super::Capability;

const METHODS_PLACEHOLDER: &str = "/*METHODS*/";

const SHIM_TEMPLATE: &str = r#"
(function() {
    // casement capability bridge
    var pending = {};
    var nextId = 1;
    function call(payload) {
        return new Promise(function(resolve, reject) {
            var id = nextId++;
            pending[id] = { resolve: resolve, reject: reject };
            window.ipc.postMessage(JSON.stringify({ id: id, call: payload }));
        });
    }
    var api = {
/*METHODS*/
    };
    Object.defineProperty(window, "casement", {
        value: Object.freeze(api),
        writable: false,
        configurable: false
    });
    Object.defineProperty(window, "__casementSettle", {
        value: function(id, ok, value) {
            var entry = pending[id];
            if (!entry) {
                return;
            }
            delete pending[id];
            if (ok) {
                entry.resolve(value);
            } else {
                entry.reject(new Error(value));
            }
        },
        writable: false,
        configurable: false
    });
})();
"#;

fn method_source(capability: Capability) -> &'static str {
    match capability {
        Capability::SendToHost => {
            r#"        sendToHost: function(channel) {
            return call({ op: "send_to_host", channel: channel, args: Array.prototype.slice.call(arguments, 1) });
        },"#
        }
        Capability::SendToContent => {
            r#"        sendTo: function(id, channel) {
            return call({ op: "send_to_content", id: id, channel: channel, args: Array.prototype.slice.call(arguments, 2) });
        },"#
        }
        Capability::ClipboardReadText => {
            r#"        readClipboardText: function() {
            return call({ op: "clipboard_read_text" });
        },"#
        }
        Capability::ClipboardWriteText => {
            r#"        writeClipboardText: function(text) {
            return call({ op: "clipboard_write_text", text: String(text) });
        },"#
        }
    }
}

/// Render the shim exposing exactly `grants`.
pub(crate) fn init_script(grants: &BTreeSet<Capability>) -> String {
    let methods: Vec<&str> = grants.iter().map(|cap| method_source(*cap)).collect();
    SHIM_TEMPLATE.replace(METHODS_PLACEHOLDER, &methods.join("\n"))
}

/// Script that settles the page-side promise for call `id`.
pub fn js_settle(id: u64, ok: bool, value: &Value) -> String {
    let value_json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    format!("window.__casementSettle({id}, {ok}, {value_json});")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shim_exposes_only_granted_methods() {
        let grants: BTreeSet<_> = [Capability::SendToHost, Capability::ClipboardWriteText].into();
        let script = init_script(&grants);
        assert!(script.contains("sendToHost: function"));
        assert!(script.contains("writeClipboardText: function"));
        assert!(!script.contains("readClipboardText"));
        assert!(!script.contains("sendTo: function"));
        assert!(!script.contains(METHODS_PLACEHOLDER));
    }

    #[test]
    fn empty_grant_set_still_defines_global() {
        let script = init_script(&BTreeSet::new());
        assert!(script.contains("Object.defineProperty(window, \"casement\""));
        assert!(!script.contains("function(channel)"));
    }

    #[test]
    fn settle_script_embeds_json() {
        assert_eq!(
            js_settle(7, true, &json!("copied")),
            "window.__casementSettle(7, true, \"copied\");"
        );
        assert_eq!(
            js_settle(8, false, &json!("denied: \"x\"")),
            "window.__casementSettle(8, false, \"denied: \\\"x\\\"\");"
        );
    }
}
