//! Project configuration: `.ucn.json` ({aliases, exclude}) and
//! `tsconfig.json` path mappings consumed by the import resolver.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UcnConfig {
    /// Bare-specifier prefixes → project-relative directories.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Extra exclude patterns merged into query filters.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One `compilerOptions.paths` mapping: a pattern with at most one `*` and
/// its target list.
#[derive(Debug, Clone)]
pub struct TsPathMapping {
    pub pattern: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub aliases: HashMap<String, String>,
    pub exclude: Vec<String>,
    pub ts_paths: Vec<TsPathMapping>,
    pub ts_base_url: Option<String>,
}

impl Config {
    /// Load `.ucn.json` and `tsconfig.json` from the project root. Missing
    /// or unparsable files are simply absent configuration.
    pub fn load(root: &Path) -> Config {
        let mut config = Config::default();

        match fs::read_to_string(root.join(".ucn.json")) {
            Ok(text) => match serde_json::from_str::<UcnConfig>(&text) {
                Ok(ucn) => {
                    config.aliases = ucn.aliases;
                    config.exclude = ucn.exclude;
                }
                Err(e) => tracing::warn!(".ucn.json is not valid JSON: {e}"),
            },
            Err(_) => {}
        }

        if let Ok(text) = fs::read_to_string(root.join("tsconfig.json")) {
            let stripped = strip_json_comments(&text);
            match serde_json::from_str::<serde_json::Value>(&stripped) {
                Ok(json) => {
                    let opts = json.get("compilerOptions");
                    if let Some(base) = opts
                        .and_then(|o| o.get("baseUrl"))
                        .and_then(|b| b.as_str())
                    {
                        config.ts_base_url = Some(base.trim_start_matches("./").to_string());
                    }
                    if let Some(paths) = opts
                        .and_then(|o| o.get("paths"))
                        .and_then(|p| p.as_object())
                    {
                        for (pattern, targets) in paths {
                            let targets: Vec<String> = targets
                                .as_array()
                                .map(|arr| {
                                    arr.iter()
                                        .filter_map(|t| t.as_str())
                                        .map(String::from)
                                        .collect()
                                })
                                .unwrap_or_default();
                            if !targets.is_empty() {
                                config.ts_paths.push(TsPathMapping {
                                    pattern: pattern.clone(),
                                    targets,
                                });
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("tsconfig.json is not valid JSON after comment strip: {e}"),
            }
        }

        config
    }
}

/// Strip `//` and `/* */` comments from JSONC text. String contents are
/// preserved verbatim, so URLs like `"https://…"` survive.
pub fn strip_json_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_comments_but_keeps_urls() {
        let text = "{\n  // line comment\n  \"homepage\": \"https://example.com\", /* block */\n  \"a\": 1\n}";
        let stripped = strip_json_comments(text);
        let json: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(json["homepage"], "https://example.com");
        assert_eq!(json["a"], 1);
    }

    #[test]
    fn loads_ucn_json_and_tsconfig() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(".ucn.json"),
            r#"{"aliases": {"@app": "src/app"}, "exclude": ["generated"]}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("tsconfig.json"),
            "{\n  \"compilerOptions\": {\n    // path aliases\n    \"baseUrl\": \"./\",\n    \"paths\": { \"@lib/*\": [\"src/lib/*\"] }\n  }\n}",
        )
        .unwrap();

        let config = Config::load(tmp.path());
        assert_eq!(config.aliases.get("@app").map(String::as_str), Some("src/app"));
        assert_eq!(config.exclude, vec!["generated"]);
        assert_eq!(config.ts_paths.len(), 1);
        assert_eq!(config.ts_paths[0].pattern, "@lib/*");
        assert_eq!(config.ts_paths[0].targets, vec!["src/lib/*"]);
    }

    #[test]
    fn missing_files_mean_empty_config() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path());
        assert!(config.aliases.is_empty());
        assert!(config.ts_paths.is_empty());
    }
}
