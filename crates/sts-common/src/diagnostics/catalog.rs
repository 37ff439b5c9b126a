//! Immutable message catalog.
//!
//! The catalog maps diagnostic codes to message templates. It starts from
//! the built-in English table and may be overlaid once with a locale table
//! (a JSON object of `"<key>_<code>": "<template>"` entries, the format
//! TypeScript ships its translations in). After construction it is never
//! mutated; callers pass it by reference into diagnostic formatting.

use rustc_hash::FxHashMap;

use super::{DIAGNOSTIC_MESSAGES, format_message};

/// Map from diagnostic code to message template.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    /// Locale overrides; codes not present fall back to the built-in table.
    overrides: FxHashMap<u32, String>,
    locale_id: Option<String>,
}

impl MessageCatalog {
    /// The built-in English catalog.
    pub fn english() -> Self {
        MessageCatalog::default()
    }

    /// Build a catalog from a locale's JSON text.
    ///
    /// Returns `None` if the text is not a JSON object.
    pub fn from_locale_json(locale_id: &str, json_content: &str) -> Option<Self> {
        let overrides = parse_locale_json(json_content)?;
        Some(MessageCatalog {
            overrides,
            locale_id: Some(locale_id.to_ascii_lowercase()),
        })
    }

    pub fn locale_id(&self) -> Option<&str> {
        self.locale_id.as_deref()
    }

    /// Template for `code`, preferring the locale override.
    pub fn template(&self, code: u32) -> Option<&str> {
        if let Some(message) = self.overrides.get(&code) {
            return Some(message);
        }
        DIAGNOSTIC_MESSAGES
            .iter()
            .find(|m| m.code == code)
            .map(|m| m.message)
    }

    /// Format the message for `code` with its interpolation arguments.
    pub fn format(&self, code: u32, args: &[String]) -> String {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.template(code) {
            Some(template) => format_message(template, &args),
            None => format!("Unknown diagnostic {code}."),
        }
    }

    pub fn has_translation(&self, code: u32) -> bool {
        self.overrides.contains_key(&code)
    }
}

/// Parse `{"Cannot_find_name_0_2304": "..."}` into code -> template.
fn parse_locale_json(json_content: &str) -> Option<FxHashMap<u32, String>> {
    let value: serde_json::Value = serde_json::from_str(json_content).ok()?;
    let object = value.as_object()?;

    let mut messages = FxHashMap::default();
    for (key, text) in object {
        let Some(text) = text.as_str() else {
            continue;
        };
        let Some(code) = key
            .rsplit('_')
            .next()
            .and_then(|suffix| suffix.parse::<u32>().ok())
        else {
            continue;
        };
        messages.insert(code, text.to_string());
    }
    Some(messages)
}
