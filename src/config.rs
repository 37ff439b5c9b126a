//! Compiler configuration.
//!
//! Options come from a tsconfig-style JSON document (comments and trailing
//! commas allowed). Only the `compilerOptions` the sound checker understands
//! are read; everything else in the document is ignored.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use sts_checker::CheckerOptions;
use sts_common::MessageCatalog;

/// Boolean options accept `true` as well as `"true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub compiler_options: Option<CompilerOptions>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub sound: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub continue_on_diagnostics: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub no_implicit_any_flow: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub runtime_checks: Option<bool>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Options with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCompilerOptions {
    pub checker: CheckerOptions,
    /// Keep going past syntax errors instead of skipping the later phases.
    pub continue_on_diagnostics: bool,
    pub locale: Option<String>,
}

pub fn resolve_compiler_options(options: Option<&CompilerOptions>) -> Result<ResolvedCompilerOptions> {
    let mut resolved = ResolvedCompilerOptions::default();
    let Some(options) = options else {
        return Ok(resolved);
    };

    if let Some(sound) = options.sound {
        resolved.checker.sound = sound;
    }
    if let Some(no_implicit_any_flow) = options.no_implicit_any_flow {
        resolved.checker.no_implicit_any_flow = no_implicit_any_flow;
    }
    if let Some(runtime_checks) = options.runtime_checks {
        resolved.checker.runtime_checks = runtime_checks;
    }
    if let Some(continue_on_diagnostics) = options.continue_on_diagnostics {
        resolved.continue_on_diagnostics = continue_on_diagnostics;
    }
    if let Some(locale) = options.locale.as_deref() {
        resolved.locale = Some(normalize_locale(locale)?);
    }
    Ok(resolved)
}

/// `pt-BR` -> `pt-br`. Rejects anything that is not `ll` or `ll-rr`.
fn normalize_locale(value: &str) -> Result<String> {
    let normalized = value.trim().to_ascii_lowercase();
    let mut parts = normalized.split('-');
    let language = parts.next().unwrap_or_default();
    let region = parts.next();
    let valid_language = language.len() == 2 && language.bytes().all(|b| b.is_ascii_lowercase());
    let valid_region = region.is_none_or(|r| !r.is_empty() && r.bytes().all(|b| b.is_ascii_alphanumeric()));
    if !valid_language || !valid_region || parts.next().is_some() {
        bail!("unsupported locale '{value}'");
    }
    Ok(normalized)
}

pub fn parse_tsconfig(source: &str) -> Result<TsConfig> {
    let normalized = strip_jsonc(source);
    let config = serde_json::from_str(&normalized).context("failed to parse tsconfig JSON")?;
    Ok(config)
}

pub fn load_tsconfig(path: &Path) -> Result<TsConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tsconfig: {}", path.display()))?;
    parse_tsconfig(&source).with_context(|| format!("failed to parse tsconfig: {}", path.display()))
}

/// Message catalog for `options`. `locale_json` is the translation table's
/// text when the caller has one for the configured locale.
pub fn message_catalog(options: &ResolvedCompilerOptions, locale_json: Option<&str>) -> Result<MessageCatalog> {
    match (options.locale.as_deref(), locale_json) {
        (Some(locale), Some(text)) => MessageCatalog::from_locale_json(locale, text)
            .with_context(|| format!("locale table for '{locale}' is not a JSON object")),
        _ => Ok(MessageCatalog::english()),
    }
}

/// Drop `//` and `/* */` comments and trailing commas, leaving strings intact.
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    previous = next;
                }
            }
            ',' => {
                let rest = chars.clone().skip_while(|c| c.is_whitespace()).next();
                if !matches!(rest, Some('}' | ']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boolean_true() {
        let json = r#"{"sound": true}"#;
        let opts: CompilerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.sound, Some(true));
    }

    #[test]
    fn test_parse_string_false() {
        let json = r#"{"runtimeChecks": "false"}"#;
        let opts: CompilerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.runtime_checks, Some(false));
    }

    #[test]
    fn test_parse_invalid_string() {
        let json = r#"{"sound": "maybe"}"#;
        let result: Result<CompilerOptions, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_tsconfig_with_comments_and_trailing_commas() {
        let source = r#"{
            // sound checking
            "compilerOptions": {
                "noImplicitAnyFlow": true, /* warn */
                "continueOnDiagnostics": "yes",
                "locale": "pt-BR",
            },
            "files": ["a.ts", "b//c.ts",],
        }"#;
        let config = parse_tsconfig(source).unwrap();
        assert_eq!(config.files, Some(vec!["a.ts".to_string(), "b//c.ts".to_string()]));

        let resolved = resolve_compiler_options(config.compiler_options.as_ref()).unwrap();
        assert!(resolved.checker.sound);
        assert!(resolved.checker.no_implicit_any_flow);
        assert!(resolved.checker.runtime_checks);
        assert!(resolved.continue_on_diagnostics);
        assert_eq!(resolved.locale.as_deref(), Some("pt-br"));
    }

    #[test]
    fn test_defaults_without_compiler_options() {
        let resolved = resolve_compiler_options(None).unwrap();
        assert_eq!(resolved, ResolvedCompilerOptions::default());
        assert!(resolved.checker.sound);
        assert!(!resolved.continue_on_diagnostics);
    }

    #[test]
    fn test_bad_locale_is_an_error() {
        let options = CompilerOptions {
            locale: Some("english".to_string()),
            ..CompilerOptions::default()
        };
        let err = resolve_compiler_options(Some(&options)).unwrap_err();
        assert!(err.to_string().contains("english"));
    }

    #[test]
    fn test_message_catalog_falls_back_to_english() {
        let resolved = resolve_compiler_options(None).unwrap();
        let catalog = message_catalog(&resolved, None).unwrap();
        assert_eq!(catalog.locale_id(), None);

        let localized = ResolvedCompilerOptions {
            locale: Some("de".to_string()),
            ..ResolvedCompilerOptions::default()
        };
        assert!(message_catalog(&localized, Some("[1, 2]")).is_err());
        let catalog = message_catalog(&localized, Some(r#"{"Cannot_find_name_0_2304": "Name '{0}' fehlt."}"#)).unwrap();
        assert_eq!(catalog.format(2304, &["x".to_string()]), "Name 'x' fehlt.");
    }
}
