use wasm_bindgen::JsValue;
use web_sys::{window, Storage};

/// Get the base HTTP URL (e.g., "http://localhost:8080" or "https://kportal.example.com")
pub fn get_base_url() -> String {
    let Some(window) = window() else {
        return "http://localhost:8080".to_string();
    };
    let location = window.location();

    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let host = location
        .host()
        .unwrap_or_else(|_| "localhost:8080".to_string());

    format!("{}//{}", protocol, host)
}

/// Current URL fragment including the leading `#`, or empty.
pub fn current_fragment() -> String {
    window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

/// Drop the fragment from the address bar without adding a history entry.
pub fn clear_fragment() {
    let Some(window) = window() else {
        return;
    };
    let location = window.location();
    let path = location.pathname().unwrap_or_else(|_| "/".to_string());
    let search = location.search().unwrap_or_default();
    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(&format!("{}{}", path, search)));
    }
}

/// Whether the tab is in the background or minimized.
pub fn is_page_hidden() -> bool {
    window()
        .and_then(|w| w.document())
        .map(|d| d.hidden())
        .unwrap_or(false)
}

/// Unix time in seconds.
pub fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

pub fn session_storage() -> Option<Storage> {
    window().and_then(|w| w.session_storage().ok().flatten())
}

/// Load a JSON value from sessionStorage
pub fn load_session<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    session_storage()
        .and_then(|storage| storage.get_item(key).ok().flatten())
        .and_then(|json| serde_json::from_str(&json).ok())
}

/// Save a JSON value to sessionStorage
pub fn save_session<T: serde::Serialize>(key: &str, value: &T) {
    if let Some(storage) = session_storage() {
        if let Ok(json) = serde_json::to_string(value) {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub fn remove_session(key: &str) {
    if let Some(storage) = session_storage() {
        let _ = storage.remove_item(key);
    }
}
