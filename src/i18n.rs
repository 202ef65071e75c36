// i18n.rs
//
// Lightweight runtime i18n:
// - English strings are compiled in (assets/i18n/en.json) and are the fallback
// - Other languages load from assets/i18n/<lang>.json next to the exe or in
//   the working directory
// - Lookup: tr("key") / tr_with("key", &[("name", ...)]) with {name} placeholders
//
// Language selection:
// - CLI: --lang <code>
// - Env: PANORAMA_LANG
// - Default: en

use once_cell::sync::{Lazy, OnceCell};
use std::{collections::HashMap, path::PathBuf, sync::RwLock};

pub const DEFAULT_LANG: &str = "en";

static BUILTIN: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../assets/i18n/en.json")).unwrap_or_default()
});

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{}.json", lang);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n").join(&file);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("i18n").join(&file);
    p.exists().then_some(p)
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    if lang == DEFAULT_LANG {
        return HashMap::new();
    }
    let Some(path) = find_lang_file(lang) else {
        log::warn!("no strings for language {lang}; falling back to {DEFAULT_LANG}");
        return HashMap::new();
    };
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(map) => map,
        Err(e) => {
            log::warn!("ignoring {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Initialize global i18n. Later calls replace the active language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let i = I18n {
        map: load_lang(&lang),
        lang,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

/// Get localized text by key. If the key is missing everywhere, returns the key.
pub fn tr(key: &str) -> String {
    if let Some(v) = I18N
        .get()
        .and_then(|l| l.read().ok())
        .and_then(|i| i.map.get(key).cloned())
    {
        return v;
    }
    BUILTIN.get(key).cloned().unwrap_or_else(|| key.to_string())
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

/// Language from `--lang`, then `PANORAMA_LANG`, then the default.
pub fn resolve_lang(cli: Option<&str>) -> String {
    if let Some(v) = cli.filter(|v| !v.trim().is_empty()) {
        return v.to_string();
    }
    if let Ok(v) = std::env::var("PANORAMA_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }
    DEFAULT_LANG.to_string()
}
