//! TypeScript/TSX extraction.
//!
//! The TS grammars superset the JavaScript node kinds, so the shared
//! JS-family walk does the work; what differs is only which grammar parsed
//! the tree (`.ts` → TypeScript, `.tsx` → TSX — chosen in
//! [`crate::parser::parse_tree`]).

use tree_sitter::Tree;

use crate::parser::LanguageAdapter;
use crate::parser::facts::ParsedFile;
use crate::parser::javascript;
use crate::parser::languages::Language;

pub struct TypescriptAdapter;

impl LanguageAdapter for TypescriptAdapter {
    fn language(&self) -> Language {
        Language::Typescript
    }

    fn extract(&self, tree: &Tree, source: &str, out: &mut ParsedFile) {
        javascript::extract(tree, source, out);
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::facts::SymbolKind;
    use crate::parser::languages::Language;
    use crate::parser::parse_source;

    #[test]
    fn type_annotations_survive() {
        let src = "/** Doc. */\nexport function f(x: number): string { return String(x); }\n";
        let parsed = parse_source(Language::Typescript, src).unwrap();
        assert_eq!(parsed.functions.len(), 1);
        let f = &parsed.functions[0];
        assert_eq!(f.name, "f");
        assert_eq!(f.params, "x: number");
        assert_eq!(f.return_type.as_deref(), Some("string"));
        assert!(f.is_exported);
        assert_eq!(f.docstring.as_deref(), Some("Doc."));
    }

    #[test]
    fn interfaces_enums_and_aliases() {
        let src = "export interface Shape { area(): number; }\nenum Color { Red, Green }\ntype Id = string;\n";
        let parsed = parse_source(Language::Typescript, src).unwrap();
        let kinds: Vec<_> = parsed.classes.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&SymbolKind::Interface));
        assert!(kinds.contains(&SymbolKind::Enum));
        assert!(kinds.contains(&SymbolKind::Type));
        let shape = parsed.classes.iter().find(|c| c.name == "Shape").unwrap();
        assert!(shape.is_exported);
        assert_eq!(shape.members.len(), 1);
        assert_eq!(shape.members[0].name, "area");
    }

    #[test]
    fn tsx_components_are_call_sites() {
        let src = "function App() {\n  return <div><Child name=\"x\" onClick={handleClick} /></div>;\n}\n";
        let parsed = parse_source(Language::Tsx, src).unwrap();
        let child = parsed.calls.iter().find(|c| c.name == "Child").unwrap();
        assert_eq!(child.line, 2);
        assert_eq!(child.enclosing_function.as_deref(), Some("App"));
        let cb = parsed.calls.iter().find(|c| c.name == "handleClick").unwrap();
        assert!(cb.is_potential_callback);
        // <div> is lowercase: never a component call.
        assert!(parsed.calls.iter().all(|c| c.name != "div"));
    }

    #[test]
    fn exported_const_records_type_annotation() {
        let src = "export const LIMIT: number = 10;\n";
        let parsed = parse_source(Language::Typescript, src).unwrap();
        let export = parsed.exports.iter().find(|e| e.name == "LIMIT").unwrap();
        assert_eq!(export.decl_kind.as_deref(), Some("const"));
        assert_eq!(export.type_annotation.as_deref(), Some("number"));
    }
}
