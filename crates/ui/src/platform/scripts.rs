//! JavaScript rendered from the lockdown policy and run in the webview.

use services::session::{EventKind, LockdownPolicy};

/// Capture-phase listeners applying `policy`, registered under `id` so the
/// matching removal script can find them again.
pub(crate) fn lockdown_install_script(id: u64, kinds: &[EventKind], policy: LockdownPolicy) -> String {
    let kinds: Vec<&str> = kinds.iter().map(|kind| kind.dom_name()).collect();
    let kinds = serde_json::to_string(&kinds).unwrap_or_else(|_| "[]".to_string());
    let chords = serde_json::to_string(policy.chords()).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(function() {{
                const registry = window.__proctorLockdown || (window.__proctorLockdown = {{}});
                const id = {id};
                if (registry[id]) return;
                const kinds = {kinds};
                const chords = {chords};
                const editable = (t) => !!t && (t.tagName === "INPUT" || t.tagName === "TEXTAREA" || t.isContentEditable === true);
                const primary = (e) => e.ctrlKey || e.metaKey;
                const handler = (e) => {{
                    let block = true;
                    if (e.type === "keydown") {{
                        const key = (e.key || "").toLowerCase();
                        block = chords.some((c) => c.key === key && (!c.primary || primary(e)) && (!c.shift || e.shiftKey));
                    }} else if (e.type === "wheel") {{
                        block = primary(e);
                    }} else if (e.type === "selectstart") {{
                        block = !editable(e.target);
                    }}
                    if (block) {{
                        e.preventDefault();
                        e.stopPropagation();
                    }}
                }};
                const opts = {{ capture: true, passive: false }};
                kinds.forEach((k) => document.addEventListener(k, handler, opts));
                registry[id] = {{ kinds, handler, opts }};
            }})();"#
    )
}

pub(crate) fn lockdown_remove_script(id: u64) -> String {
    format!(
        r#"(function() {{
                const registry = window.__proctorLockdown;
                const entry = registry && registry[{id}];
                if (!entry) return;
                entry.kinds.forEach((k) => document.removeEventListener(k, entry.handler, entry.opts));
                delete registry[{id}];
            }})();"#
    )
}

/// Removes every registration left in the document and clears the inline
/// selection style, whichever guard installed them.
pub(crate) fn release_all_script() -> &'static str {
    r#"(function() {
                const registry = window.__proctorLockdown;
                if (registry) {
                    Object.keys(registry).forEach((id) => {
                        const entry = registry[id];
                        entry.kinds.forEach((k) => document.removeEventListener(k, entry.handler, entry.opts));
                        delete registry[id];
                    });
                }
                const body = document.body;
                if (!body) return;
                body.style.userSelect = "";
                body.style.webkitUserSelect = "";
            })();"#
}

pub(crate) fn user_select_script(value: &str) -> String {
    format!(
        r#"(function() {{
                const body = document.body;
                if (!body) return;
                body.style.userSelect = {value:?};
                body.style.webkitUserSelect = {value:?};
            }})();"#
    )
}

/// Forwards focus-loss signals to Rust as `"hidden"`, `"blur"` and `"focus"`.
/// Listeners are registered once; a later evaluation only retargets them.
pub(crate) const FOCUS_BRIDGE_SCRIPT: &str = r#"
    const first = !window.__proctorFocusBridge;
    window.__proctorFocusBridge = (signal) => dioxus.send(signal);
    if (first) {
        document.addEventListener("visibilitychange", () => {
            if (document.hidden) window.__proctorFocusBridge("hidden");
        });
        window.addEventListener("blur", () => window.__proctorFocusBridge("blur"));
        window.addEventListener("focus", () => window.__proctorFocusBridge("focus"));
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_script_uses_capture_phase_and_policy_table() {
        let js = lockdown_install_script(7, &EventKind::GUARDED, LockdownPolicy);
        assert!(js.contains("capture: true"));
        assert!(js.contains(r#""contextmenu""#));
        assert!(js.contains(r#""selectstart""#));
        assert!(js.contains(r#""key":"f12""#));
        assert!(js.contains("const id = 7;"));
    }

    #[test]
    fn remove_script_targets_same_registration() {
        let js = lockdown_remove_script(7);
        assert!(js.contains("registry[7]"));
        assert!(js.contains("removeEventListener"));
    }

    #[test]
    fn release_script_clears_every_registration() {
        let js = release_all_script();
        assert!(js.contains("Object.keys(registry)"));
        assert!(js.contains("removeEventListener"));
        assert!(js.contains(r#"userSelect = """#));
    }

    #[test]
    fn user_select_value_is_quoted() {
        assert!(user_select_script("none").contains(r#"userSelect = "none""#));
        assert!(user_select_script("").contains(r#"userSelect = """#));
    }
}
