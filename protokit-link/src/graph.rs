use std::collections::{HashMap, HashSet};

use protokit_front::{self as front, Diagnostic, File};

/// Recursively loads every transitive import of `path`, parsing each with
/// `protokit_front::parse` and recording diagnostics along the way.
/// `visiting` tracks the files on the current DFS path so re-entering one
/// of them is reported as an import cycle instead of looping forever.
pub fn visit(
    path: &str,
    files: &mut HashMap<String, File>,
    loader: &mut dyn FnMut(&str) -> Result<String, String>,
    visiting: &mut HashSet<String>,
    done: &mut HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if done.contains(path) {
        return;
    }
    if !visiting.insert(path.to_string()) {
        return;
    }

    let imports = files.get(path).map(|f| f.imports.clone()).unwrap_or_default();
    for import in &imports {
        if visiting.contains(&import.path) {
            log::warn!("import cycle detected at '{}'", import.path);
            diagnostics.push(Diagnostic::error(
                import.location.clone(),
                format!("import cycle detected at '{}'", import.path),
            ));
            continue;
        }
        if !files.contains_key(&import.path) {
            match loader(&import.path) {
                Ok(source) => {
                    let (parsed, mut parse_diagnostics) = front::parse(import.path.clone(), &source);
                    diagnostics.append(&mut parse_diagnostics);
                    files.insert(import.path.clone(), parsed);
                }
                Err(reason) => {
                    log::warn!("failed to load import '{}': {reason}", import.path);
                    diagnostics.push(Diagnostic::error(
                        import.location.clone(),
                        format!("failed to load import '{}': {reason}", import.path),
                    ));
                    continue;
                }
            }
        }
        visit(&import.path, files, loader, visiting, done, diagnostics);
    }

    visiting.remove(path);
    done.insert(path.to_string());
}

/// Every file whose symbols are visible from `entry` for unqualified name
/// resolution: direct imports, plus the transitive closure of `public`
/// imports reachable from them (§4.5).
pub fn visible_files(entry: &str, files: &HashMap<String, File>) -> HashSet<String> {
    let mut visible = HashSet::new();
    let mut stack = Vec::new();

    if let Some(file) = files.get(entry) {
        for import in &file.imports {
            if visible.insert(import.path.clone()) {
                stack.push(import.path.clone());
            }
        }
    }

    while let Some(current) = stack.pop() {
        let Some(file) = files.get(&current) else { continue };
        for import in &file.imports {
            if import.public && visible.insert(import.path.clone()) {
                stack.push(import.path.clone());
            }
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(files: &mut HashMap<String, File>, name: &str, imports: Vec<(&str, bool)>) {
        let (mut file, _) = front::parse(name, "syntax = \"proto3\";");
        file.imports = imports
            .into_iter()
            .map(|(path, public)| front::Import {
                path: path.to_string(),
                public,
                weak: false,
                location: front::Location::new(name.into(), 1, 1),
            })
            .collect();
        files.insert(name.to_string(), file);
    }

    #[test]
    fn loads_transitive_imports_and_reports_missing_ones() {
        let mut files = HashMap::new();
        insert(&mut files, "a.proto", vec![("b.proto", false)]);
        let mut loader = |path: &str| -> Result<String, String> {
            if path == "b.proto" {
                Ok("syntax = \"proto3\"; message B {}".to_string())
            } else {
                Err("not found".to_string())
            }
        };
        let mut diagnostics = Vec::new();
        let mut visiting = HashSet::new();
        let mut done = HashSet::new();
        visit("a.proto", &mut files, &mut loader, &mut visiting, &mut done, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(files.contains_key("b.proto"));
    }

    #[test]
    fn detects_import_cycles() {
        let mut files = HashMap::new();
        insert(&mut files, "a.proto", vec![("b.proto", false)]);
        insert(&mut files, "b.proto", vec![("a.proto", false)]);
        let mut loader = |_: &str| -> Result<String, String> { Err("unreachable".to_string()) };
        let mut diagnostics = Vec::new();
        let mut visiting = HashSet::new();
        let mut done = HashSet::new();
        visit("a.proto", &mut files, &mut loader, &mut visiting, &mut done, &mut diagnostics);
        assert!(diagnostics.iter().any(|d| d.message.contains("cycle")));
    }

    #[test]
    fn public_imports_extend_visibility_transitively() {
        let mut files = HashMap::new();
        insert(&mut files, "a.proto", vec![("b.proto", false)]);
        insert(&mut files, "b.proto", vec![("c.proto", true)]);
        insert(&mut files, "c.proto", vec![]);
        let visible = visible_files("a.proto", &files);
        assert!(visible.contains("b.proto"));
        assert!(visible.contains("c.proto"));
    }
}
