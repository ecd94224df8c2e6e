//! Import resolution: map an import fact to the project files it refers
//! to. Unresolvable specifiers (external packages, dynamic imports) resolve
//! to nothing and stay on the per-file record instead of the import graph.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use regex::Regex;

use crate::config::Config;
use crate::parser::facts::{ImportFact, ImportKind};
use crate::parser::languages::Language;

/// Everything resolution needs, borrowed from the index mid-build.
pub struct ResolveCtx<'a> {
    pub root: &'a Path,
    pub config: &'a Config,
    /// Every discovered relative path, for existence checks without IO.
    pub files: &'a BTreeSet<String>,
    /// Java `package` declaration → files declaring it.
    pub java_packages: &'a HashMap<String, Vec<String>>,
    /// The `module` line of go.mod, when present.
    pub go_module: Option<&'a str>,
}

const JS_SUFFIXES: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", "/index.ts", "/index.tsx", "/index.js",
    "/index.jsx",
];

/// Resolve one import to project-relative paths. Empty means external or
/// dynamic.
pub fn resolve_import(
    import: &ImportFact,
    from_rel: &str,
    lang: Language,
    ctx: &ResolveCtx,
) -> Vec<String> {
    if import.is_dynamic {
        return Vec::new();
    }
    match lang {
        Language::Javascript | Language::Typescript | Language::Tsx => {
            resolve_js(&import.module, from_rel, ctx)
                .into_iter()
                .collect()
        }
        Language::Python => resolve_python(import, from_rel, ctx),
        Language::Go => resolve_go(&import.module, ctx),
        Language::Rust => resolve_rust(import, from_rel, ctx),
        Language::Java => resolve_java(import, ctx),
    }
}

/// Normalize `a/b/../c` and `./` segments within a relative path.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(seg),
        }
    }
    parts.join("/")
}

fn parent_dir(rel: &str) -> &str {
    rel.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn file_stem(rel: &str) -> &str {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

// ---------------------------------------------------------------------------
// JavaScript / TypeScript
// ---------------------------------------------------------------------------

fn resolve_js(spec: &str, from_rel: &str, ctx: &ResolveCtx) -> Option<String> {
    if spec.starts_with("./") || spec.starts_with("../") || spec == "." || spec == ".." {
        let base = normalize(&format!("{}/{}", parent_dir(from_rel), spec));
        return try_js_suffixes(&base, ctx);
    }

    // `.ucn.json` aliases: longest-prefix replacement.
    let mut alias_hits: Vec<(&String, &String)> = ctx
        .config
        .aliases
        .iter()
        .filter(|(prefix, _)| spec == prefix.as_str() || spec.starts_with(&format!("{prefix}/")))
        .collect();
    alias_hits.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
    if let Some((prefix, target)) = alias_hits.first() {
        let rest = &spec[prefix.len()..];
        let base = normalize(&format!("{target}{rest}"));
        if let Some(hit) = try_js_suffixes(&base, ctx) {
            return Some(hit);
        }
    }

    // tsconfig `paths`: escape dots, then `*` becomes a capture.
    for mapping in &ctx.config.ts_paths {
        let escaped = mapping.pattern.replace('.', r"\.").replace('*', "(.*)");
        let Ok(re) = Regex::new(&format!("^{escaped}$")) else {
            continue;
        };
        let Some(caps) = re.captures(spec) else {
            continue;
        };
        let wildcard = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        for target in &mapping.targets {
            let substituted = target.replace('*', wildcard);
            let base = match &ctx.config.ts_base_url {
                Some(base_url) if !base_url.is_empty() && base_url != "." => {
                    normalize(&format!("{base_url}/{substituted}"))
                }
                _ => normalize(&substituted),
            };
            if let Some(hit) = try_js_suffixes(&base, ctx) {
                return Some(hit);
            }
        }
    }

    None
}

fn try_js_suffixes(base: &str, ctx: &ResolveCtx) -> Option<String> {
    for suffix in JS_SUFFIXES {
        let candidate = format!("{base}{suffix}");
        if ctx.files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

fn resolve_python(import: &ImportFact, from_rel: &str, ctx: &ResolveCtx) -> Vec<String> {
    let module = import.module.as_str();
    let mut out = Vec::new();

    let try_module = |dotted_path: &str, out: &mut Vec<String>| {
        if dotted_path.is_empty() {
            return false;
        }
        let slashed = dotted_path.replace('.', "/");
        for candidate in [format!("{slashed}.py"), format!("{slashed}/__init__.py")] {
            if ctx.files.contains(&candidate) {
                out.push(candidate);
                return true;
            }
        }
        false
    };

    if module.starts_with('.') {
        // `.x` / `..x`: N leading dots walk N-1 directories up from the
        // importing package.
        let dots = module.chars().take_while(|&c| c == '.').count();
        let rest = &module[dots..];
        let mut base = parent_dir(from_rel).to_string();
        for _ in 1..dots {
            base = parent_dir(&base).to_string();
        }
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("{base}/")
        };
        let base_path = if rest.is_empty() {
            base.clone()
        } else {
            format!("{prefix}{}", rest.replace('.', "/"))
        };

        let mut resolve_one = |suffix: Option<&str>| {
            let path = match suffix {
                Some(name) if !base_path.is_empty() => format!("{base_path}/{name}"),
                Some(name) => name.to_string(),
                None => base_path.clone(),
            };
            for candidate in [format!("{path}.py"), format!("{path}/__init__.py")] {
                if ctx.files.contains(&candidate) {
                    out.push(candidate);
                    return true;
                }
            }
            false
        };

        if !resolve_one(None) && import.kind == ImportKind::FromImport {
            // `from . import sub` / `from .pkg import sub`: the names may be
            // modules themselves.
            for name in &import.names {
                if name != "*" {
                    resolve_one(Some(name));
                }
            }
        }
        out.dedup();
        return out;
    }

    if try_module(module, &mut out) {
        // `from pkg import sub` where pkg resolved to a package: the names
        // may still be submodules.
        if import.kind == ImportKind::FromImport && out[0].ends_with("/__init__.py") {
            for name in &import.names {
                if name != "*" {
                    try_module(&format!("{module}.{name}"), &mut out);
                }
            }
        }
        out.dedup();
        return out;
    }

    // `from pkg import sub` with no pkg module file: try pkg/sub directly.
    if import.kind == ImportKind::FromImport {
        for name in &import.names {
            if name != "*" {
                try_module(&format!("{module}.{name}"), &mut out);
            }
        }
    }
    out.dedup();
    out
}

// ---------------------------------------------------------------------------
// Go
// ---------------------------------------------------------------------------

fn resolve_go(spec: &str, ctx: &ResolveCtx) -> Vec<String> {
    let Some(module) = ctx.go_module else {
        return Vec::new();
    };
    let local = if spec == module {
        ""
    } else if let Some(rest) = spec.strip_prefix(&format!("{module}/")) {
        rest
    } else {
        return Vec::new();
    };

    ctx.files
        .iter()
        .filter(|f| f.ends_with(".go") && parent_dir(f) == local)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Rust
// ---------------------------------------------------------------------------

/// The `src/` directory of the crate owning a file: the nearest ancestor
/// with a Cargo.toml, preferring its `src/`.
fn crate_src_dir(from_rel: &str, ctx: &ResolveCtx) -> String {
    let mut dir = parent_dir(from_rel).to_string();
    loop {
        let manifest = if dir.is_empty() {
            ctx.root.join("Cargo.toml")
        } else {
            ctx.root.join(&dir).join("Cargo.toml")
        };
        if manifest.exists() {
            let src = if dir.is_empty() {
                "src".to_string()
            } else {
                format!("{dir}/src")
            };
            if ctx.root.join(&src).is_dir() {
                return src;
            }
            return dir;
        }
        if dir.is_empty() {
            return "src".to_string();
        }
        dir = parent_dir(&dir).to_string();
    }
}

fn resolve_rust(import: &ImportFact, from_rel: &str, ctx: &ResolveCtx) -> Vec<String> {
    match import.kind {
        ImportKind::Mod => {
            // `mod x;` — x.rs or x/mod.rs next to the declaring module.
            let dir = rust_module_dir(from_rel);
            let prefix = if dir.is_empty() {
                String::new()
            } else {
                format!("{dir}/")
            };
            for candidate in [
                format!("{prefix}{}.rs", import.module),
                format!("{prefix}{}/mod.rs", import.module),
            ] {
                if ctx.files.contains(&candidate) {
                    return vec![candidate];
                }
            }
            Vec::new()
        }
        ImportKind::Include => {
            let candidate = normalize(&format!("{}/{}", parent_dir(from_rel), import.module));
            if ctx.files.contains(&candidate) {
                vec![candidate]
            } else {
                Vec::new()
            }
        }
        ImportKind::Use => {
            let segments: Vec<&str> = import.module.split("::").collect();
            let (base, rest): (String, &[&str]) = match segments.first() {
                Some(&"crate") => (crate_src_dir(from_rel, ctx), &segments[1..]),
                Some(&"super") => {
                    let mut dir = rust_module_dir(from_rel);
                    let mut rest = &segments[1..];
                    // Chained `super::super::…`
                    while rest.first() == Some(&"super") {
                        dir = parent_dir(&dir).to_string();
                        rest = &rest[1..];
                    }
                    (dir, rest)
                }
                Some(&"self") => (rust_module_dir(from_rel), &segments[1..]),
                _ => return Vec::new(),
            };
            resolve_rust_path(&base, rest, ctx)
        }
        _ => Vec::new(),
    }
}

/// The directory whose entries are this module's children: `a/mod.rs`,
/// `src/lib.rs` and `src/main.rs` own their directory; `a/x.rs` owns `a/x/`.
fn rust_module_dir(from_rel: &str) -> String {
    let name = from_rel.rsplit('/').next().unwrap_or(from_rel);
    if matches!(name, "mod.rs" | "lib.rs" | "main.rs") {
        parent_dir(from_rel).to_string()
    } else {
        let dir = parent_dir(from_rel);
        let stem = file_stem(from_rel);
        if dir.is_empty() {
            stem.to_string()
        } else {
            format!("{dir}/{stem}")
        }
    }
}

/// Walk module segments longest-first: `crate::a::b::Item` tries `a/b/Item`
/// then `a/b` then `a` as module files under the base.
fn resolve_rust_path(base: &str, segments: &[&str], ctx: &ResolveCtx) -> Vec<String> {
    if segments.is_empty() {
        // Bare `super::item` — the parent module file itself.
        for candidate in [format!("{base}/mod.rs"), format!("{base}.rs")] {
            if ctx.files.contains(&candidate) {
                return vec![candidate];
            }
        }
        return Vec::new();
    }
    for take in (1..=segments.len()).rev() {
        let path = segments[..take].join("/");
        let full = if base.is_empty() {
            path
        } else {
            format!("{base}/{path}")
        };
        for candidate in [format!("{full}.rs"), format!("{full}/mod.rs")] {
            if ctx.files.contains(&candidate) {
                return vec![candidate];
            }
        }
    }
    // `use crate::Item` — an item in the crate root.
    for candidate in [format!("{base}/lib.rs"), format!("{base}/main.rs")] {
        if ctx.files.contains(&candidate) {
            return vec![candidate];
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Java
// ---------------------------------------------------------------------------

fn resolve_java(import: &ImportFact, ctx: &ResolveCtx) -> Vec<String> {
    let module = import.module.as_str();

    // Wildcard: every file of the package.
    if let Some(package) = module.strip_suffix(".*") {
        return ctx
            .java_packages
            .get(package)
            .cloned()
            .unwrap_or_default();
    }

    // `com.x.Y`, `com.x.Y.Inner.CONST` (static): strip trailing segments
    // until a (package, Class) pair matches a declaring file.
    let segments: Vec<&str> = module.split('.').collect();
    for split in (1..segments.len()).rev() {
        let package = segments[..split].join(".");
        let class = segments[split];
        if let Some(files) = ctx.java_packages.get(&package) {
            let hits: Vec<String> = files
                .iter()
                .filter(|f| file_stem(f) == class)
                .cloned()
                .collect();
            if !hits.is_empty() {
                return hits;
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::facts::ImportKind;

    fn fact(module: &str, kind: ImportKind, names: &[&str]) -> ImportFact {
        ImportFact {
            module: module.into(),
            names: names.iter().map(|s| s.to_string()).collect(),
            kind,
            is_dynamic: false,
            line: 1,
            aliases: Vec::new(),
        }
    }

    fn ctx<'a>(
        root: &'a Path,
        config: &'a Config,
        files: &'a BTreeSet<String>,
        java: &'a HashMap<String, Vec<String>>,
    ) -> ResolveCtx<'a> {
        ResolveCtx {
            root,
            config,
            files,
            java_packages: java,
            go_module: Some("example.com/app"),
        }
    }

    #[test]
    fn js_relative_with_extension_probing() {
        let files: BTreeSet<String> =
            ["src/lib/util.ts", "src/lib/index.ts", "src/main.ts"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        let config = Config::default();
        let java = HashMap::new();
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        let import = fact("./lib/util", ImportKind::Esm, &["util"]);
        assert_eq!(
            resolve_import(&import, "src/main.ts", Language::Typescript, &c),
            vec!["src/lib/util.ts"]
        );

        let import = fact("./lib", ImportKind::Esm, &[]);
        assert_eq!(
            resolve_import(&import, "src/main.ts", Language::Typescript, &c),
            vec!["src/lib/index.ts"]
        );
    }

    #[test]
    fn tsconfig_paths_wildcard() {
        let files: BTreeSet<String> = ["src/lib/store.ts", "src/app.ts"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut config = Config::default();
        config.ts_paths.push(crate::config::TsPathMapping {
            pattern: "@lib/*".into(),
            targets: vec!["src/lib/*".into()],
        });
        let java = HashMap::new();
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        let import = fact("@lib/store", ImportKind::Esm, &["store"]);
        assert_eq!(
            resolve_import(&import, "src/app.ts", Language::Typescript, &c),
            vec!["src/lib/store.ts"]
        );
    }

    #[test]
    fn python_relative_dots() {
        let files: BTreeSet<String> = [
            "pkg/core/engine.py",
            "pkg/core/util.py",
            "pkg/api/handlers.py",
            "pkg/__init__.py",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let config = Config::default();
        let java = HashMap::new();
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        // one dot: same package
        let import = fact(".util", ImportKind::FromImport, &["helper"]);
        assert_eq!(
            resolve_import(&import, "pkg/core/engine.py", Language::Python, &c),
            vec!["pkg/core/util.py"]
        );

        // two dots: one package up
        let import = fact("..api.handlers", ImportKind::FromImport, &["handle"]);
        assert_eq!(
            resolve_import(&import, "pkg/core/engine.py", Language::Python, &c),
            vec!["pkg/api/handlers.py"]
        );
    }

    #[test]
    fn python_dotted_module() {
        let files: BTreeSet<String> = ["pkg/sub/mod.py", "pkg/sub/__init__.py", "main.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = Config::default();
        let java = HashMap::new();
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        let import = fact("pkg.sub.mod", ImportKind::Import, &["mod"]);
        assert_eq!(
            resolve_import(&import, "main.py", Language::Python, &c),
            vec!["pkg/sub/mod.py"]
        );

        // `from pkg.sub import mod` resolves the submodule too.
        let import = fact("pkg.sub", ImportKind::FromImport, &["mod"]);
        let resolved = resolve_import(&import, "main.py", Language::Python, &c);
        assert!(resolved.contains(&"pkg/sub/__init__.py".to_string()));
        assert!(resolved.contains(&"pkg/sub/mod.py".to_string()));
    }

    #[test]
    fn go_module_packages() {
        let files: BTreeSet<String> = ["server/http.go", "server/routes.go", "main.go"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = Config::default();
        let java = HashMap::new();
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        let import = fact("example.com/app/server", ImportKind::Import, &["server"]);
        let resolved = resolve_import(&import, "main.go", Language::Go, &c);
        assert_eq!(resolved, vec!["server/http.go", "server/routes.go"]);

        let import = fact("fmt", ImportKind::Import, &["fmt"]);
        assert!(resolve_import(&import, "main.go", Language::Go, &c).is_empty());
    }

    #[test]
    fn rust_mod_and_use() {
        let files: BTreeSet<String> = [
            "src/lib.rs",
            "src/cache.rs",
            "src/engine/mod.rs",
            "src/engine/core.rs",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let config = Config::default();
        let java = HashMap::new();
        // No Cargo.toml exists under /nonexistent, so crate_src_dir falls
        // back to `src`.
        let c = ctx(Path::new("/nonexistent"), &config, &files, &java);

        let import = fact("cache", ImportKind::Mod, &[]);
        assert_eq!(
            resolve_import(&import, "src/lib.rs", Language::Rust, &c),
            vec!["src/cache.rs"]
        );

        let import = fact("crate::engine::core::Engine", ImportKind::Use, &["Engine"]);
        assert_eq!(
            resolve_import(&import, "src/cache.rs", Language::Rust, &c),
            vec!["src/engine/core.rs"]
        );

        // super from a mod.rs: parent is the directory above.
        let import = fact("super::cache::Cache", ImportKind::Use, &["Cache"]);
        assert_eq!(
            resolve_import(&import, "src/engine/mod.rs", Language::Rust, &c),
            vec!["src/cache.rs"]
        );

        // super from a regular file: parent is the containing directory.
        let import = fact("super::mod_sibling", ImportKind::Use, &["mod_sibling"]);
        assert!(resolve_import(&import, "src/engine/core.rs", Language::Rust, &c).is_empty());
    }

    #[test]
    fn java_package_scan() {
        let files: BTreeSet<String> = ["src/com/x/Y.java", "src/com/x/Z.java"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = Config::default();
        let mut java = HashMap::new();
        java.insert(
            "com.x".to_string(),
            vec!["src/com/x/Y.java".to_string(), "src/com/x/Z.java".to_string()],
        );
        let c = ctx(Path::new("/tmp"), &config, &files, &java);

        let import = fact("com.x.Y", ImportKind::JavaImport, &["Y"]);
        assert_eq!(
            resolve_import(&import, "src/com/a/App.java", Language::Java, &c),
            vec!["src/com/x/Y.java"]
        );

        // Static member import resolves to the declaring class.
        let import = fact("com.x.Y.helper", ImportKind::JavaStaticImport, &["helper"]);
        assert_eq!(
            resolve_import(&import, "src/com/a/App.java", Language::Java, &c),
            vec!["src/com/x/Y.java"]
        );

        // Wildcard resolves to every file of the package.
        let import = fact("com.x.*", ImportKind::JavaImport, &["*"]);
        assert_eq!(
            resolve_import(&import, "src/com/a/App.java", Language::Java, &c).len(),
            2
        );
    }
}
