use serde::{Deserialize, Serialize};
use tree_sitter::Language as TsLanguage;

/// Supported languages. `.ts` files use the TypeScript grammar, `.tsx` the
/// TSX grammar — running the JavaScript grammar on either would silently
/// drop type annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Tsx,
    Python,
    Go,
    Rust,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
        }
    }

    /// The JS family shares extraction logic (and most node kinds).
    pub fn is_js_family(&self) -> bool {
        matches!(
            self,
            Language::Javascript | Language::Typescript | Language::Tsx
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the language from a file extension. Anything unlisted is not
/// indexable.
pub fn detect_language(extension: &str) -> Option<Language> {
    match extension {
        "js" | "jsx" | "mjs" | "cjs" => Some(Language::Javascript),
        "ts" => Some(Language::Typescript),
        "tsx" => Some(Language::Tsx),
        "py" => Some(Language::Python),
        "go" => Some(Language::Go),
        "rs" => Some(Language::Rust),
        "java" => Some(Language::Java),
        _ => None,
    }
}

/// Detect the language for a path by its extension.
pub fn detect_language_for_path(path: &std::path::Path) -> Option<Language> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(detect_language)
}

/// Return the tree-sitter grammar for the given language.
///
/// Grammars are feature-gated — only those enabled at compile time are
/// available.
pub fn get_language(lang: Language) -> anyhow::Result<TsLanguage> {
    match lang {
        #[cfg(feature = "lang-javascript")]
        Language::Javascript => Ok(tree_sitter_javascript::LANGUAGE.into()),

        #[cfg(feature = "lang-typescript")]
        Language::Typescript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),

        #[cfg(feature = "lang-typescript")]
        Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),

        #[cfg(feature = "lang-python")]
        Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),

        #[cfg(feature = "lang-go")]
        Language::Go => Ok(tree_sitter_go::LANGUAGE.into()),

        #[cfg(feature = "lang-rust")]
        Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),

        #[cfg(feature = "lang-java")]
        Language::Java => Ok(tree_sitter_java::LANGUAGE.into()),

        #[allow(unreachable_patterns)]
        _ => anyhow::bail!("language not enabled at compile time: {lang}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_supported_extensions() {
        assert_eq!(detect_language("js"), Some(Language::Javascript));
        assert_eq!(detect_language("jsx"), Some(Language::Javascript));
        assert_eq!(detect_language("mjs"), Some(Language::Javascript));
        assert_eq!(detect_language("cjs"), Some(Language::Javascript));
        assert_eq!(detect_language("ts"), Some(Language::Typescript));
        assert_eq!(detect_language("tsx"), Some(Language::Tsx));
        assert_eq!(detect_language("py"), Some(Language::Python));
        assert_eq!(detect_language("go"), Some(Language::Go));
        assert_eq!(detect_language("rs"), Some(Language::Rust));
        assert_eq!(detect_language("java"), Some(Language::Java));
    }

    #[test]
    fn rejects_everything_else() {
        for ext in ["c", "cpp", "rb", "cs", "md", "txt", "json", "pyc", ""] {
            assert_eq!(detect_language(ext), None, "{ext} should not be indexable");
        }
    }
}
