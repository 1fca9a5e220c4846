// compiler.rs
// Copyright 2022 Matti Hänninen
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

// Walks the parsed configuration tree, populates the lexeme dictionary, and
// builds the ordered list of replacement stages that the chain driver turns
// into an executable pipeline.

use crate::error::Error;
use crate::io::FileLoader;
use crate::lexeme::{Dictionary, Lexeme};
use crate::parser::{self, ConfigVisitor, Node, NodeCtx};

/// One ordered replacement step: a non-empty set of `(source, target)` name
/// pairs, resolved to lexeme names. Resolution against the dictionary's
/// actual byte views happens in the chain builder, which borrows both the
/// dictionary and the stage list for the lifetime of the compiled chain.
#[derive(Debug, Clone)]
pub struct Stage {
    pub pairs: Vec<(String, String)>,
}

/// Compiles a configuration document into a dictionary and stage list.
pub fn compile(
    config_text: &str,
    file_loader: &dyn FileLoader,
) -> Result<(Dictionary, Vec<Stage>), Error> {
    let root = parser::parse(config_text)?;
    let mut compiler = RuleCompiler::new(file_loader);
    parser::walk(&root, &mut compiler)?;
    compiler.finish()
}

struct RuleCompiler<'a> {
    dictionary: Dictionary,
    composites: Vec<(String, Vec<String>)>,
    stage_specs: Vec<Vec<(String, String)>>,
    file_loader: &'a dyn FileLoader,
}

impl<'a> RuleCompiler<'a> {
    fn new(file_loader: &'a dyn FileLoader) -> Self {
        Self {
            dictionary: Dictionary::new(),
            composites: Vec::new(),
            stage_specs: Vec::new(),
            file_loader,
        }
    }

    fn process_numeric_object(&mut self, node: &Node, base: u32) -> Result<(), Error> {
        for (name, value) in expect_object(node, "dictionary.decimal/hexadecimal")? {
            let items = value
                .as_array()
                .ok_or_else(|| Error::Schema(format!("{name:?}: expected an array of elements")))?;
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                let byte = if base == 10 {
                    let n = item.as_f64().ok_or_else(|| {
                        Error::Schema(format!("{name:?}: decimal elements must be numbers"))
                    })?;
                    to_byte(n, name)?
                } else {
                    let s = item.as_str().ok_or_else(|| {
                        Error::Schema(format!("{name:?}: hexadecimal elements must be strings"))
                    })?;
                    u8::from_str_radix(s, 16).map_err(|_| {
                        Error::Range(format!("{name:?}: {s:?} is not a valid 2-digit hex byte"))
                    })?
                };
                bytes.push(byte);
            }
            self.dictionary.insert(Lexeme::from_bytes(name.clone(), bytes))?;
        }
        Ok(())
    }

    fn process_text_object(&mut self, node: &Node) -> Result<(), Error> {
        for (name, value) in expect_object(node, "dictionary.text")? {
            let s = value
                .as_str()
                .ok_or_else(|| Error::Schema(format!("{name:?}: text entries must be strings")))?;
            self.dictionary
                .insert(Lexeme::from_bytes(name.clone(), s.as_bytes().to_vec()))?;
        }
        Ok(())
    }

    fn process_file_object(&mut self, node: &Node) -> Result<(), Error> {
        for (name, value) in expect_object(node, "dictionary.file")? {
            let filename = value
                .as_str()
                .ok_or_else(|| Error::Schema(format!("{name:?}: file entries must be strings")))?;
            let bytes = self.file_loader.load(filename)?;
            self.dictionary.insert(Lexeme::from_bytes(name.clone(), bytes))?;
        }
        Ok(())
    }

    fn process_composite_array(&mut self, node: &Node) -> Result<(), Error> {
        let items = node.as_array().expect("array_end only fires for arrays");
        for item in items {
            let entries = expect_object(item, "dictionary.composite[]")?;
            if entries.len() != 1 {
                return Err(Error::Schema(
                    "each dictionary.composite[] entry must have exactly one name".into(),
                ));
            }
            let (name, refs_node) = &entries[0];
            let refs = refs_node
                .as_array()
                .ok_or_else(|| Error::Schema(format!("{name:?}: composite must list reference names")))?
                .iter()
                .map(|n| {
                    n.as_str().map(str::to_owned).ok_or_else(|| {
                        Error::Schema(format!("{name:?}: composite references must be strings"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.composites.push((name.clone(), refs));
        }
        Ok(())
    }

    fn process_todo_array(&mut self, node: &Node) -> Result<(), Error> {
        let items = node.as_array().expect("array_end only fires for arrays");
        for item in items {
            let entries = expect_object(item, "todo[]")?;
            let replace = entries
                .iter()
                .find(|(k, _)| k == "replace")
                .map(|(_, v)| v)
                .ok_or_else(|| Error::Schema("todo[] entries must have a 'replace' object".into()))?;
            let pairs_src = expect_object(replace, "todo[].replace")?;
            let mut pairs = Vec::with_capacity(pairs_src.len());
            for (src, trg) in pairs_src {
                let trg_name = trg.as_str().ok_or_else(|| {
                    Error::Schema(format!(
                        "todo[].replace: target for {src:?} must be a string name"
                    ))
                })?;
                pairs.push((src.clone(), trg_name.to_owned()));
            }
            if pairs.is_empty() {
                log::warn!("skipping empty replacement stage");
                continue;
            }
            self.stage_specs.push(pairs);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(Dictionary, Vec<Stage>), Error> {
        let composites = std::mem::take(&mut self.composites);
        for (name, refs) in composites {
            let mut parts = Vec::with_capacity(refs.len());
            for r in &refs {
                let lexeme = self
                    .dictionary
                    .get(r)
                    .ok_or_else(|| Error::UnknownName(r.clone()))?;
                parts.push(lexeme.clone());
            }
            let part_refs: Vec<&Lexeme> = parts.iter().collect();
            self.dictionary
                .insert(Lexeme::concat(name, &part_refs))?;
        }

        let mut stages = Vec::with_capacity(self.stage_specs.len());
        for spec in &self.stage_specs {
            let mut seen_sources = std::collections::HashSet::new();
            let mut pairs = Vec::with_capacity(spec.len());
            for (src, trg) in spec {
                let (src_lex, _trg_lex) = self
                    .dictionary
                    .get_pair(src, trg)
                    .ok_or_else(|| {
                        if self.dictionary.get(src).is_none() {
                            Error::UnknownName(src.clone())
                        } else {
                            Error::UnknownName(trg.clone())
                        }
                    })?;
                if src_lex.is_empty() {
                    return Err(Error::Range(format!(
                        "{src:?}: a source pattern must not be empty"
                    )));
                }
                if !seen_sources.insert(src.clone()) {
                    log::warn!("duplicate source {src:?} within a stage; ignoring later pair");
                    continue;
                }
                pairs.push((src.clone(), trg.clone()));
            }
            if !pairs.is_empty() {
                stages.push(Stage { pairs });
            }
        }

        if stages.is_empty() {
            return Err(Error::EmptyTodo);
        }

        Ok((self.dictionary, stages))
    }
}

impl ConfigVisitor for RuleCompiler<'_> {
    fn object_end(&mut self, ctx: &NodeCtx) -> Result<(), Error> {
        if !path_eq(ctx.path, &["", "dictionary"]) {
            return Ok(());
        }
        match ctx.key {
            "decimal" => self.process_numeric_object(ctx.node, 10),
            "hexadecimal" => self.process_numeric_object(ctx.node, 16),
            "text" => self.process_text_object(ctx.node),
            "file" => self.process_file_object(ctx.node),
            _ => Ok(()),
        }
    }

    fn array_end(&mut self, ctx: &NodeCtx) -> Result<(), Error> {
        if path_eq(ctx.path, &["", "dictionary"]) && ctx.key == "composite" {
            self.process_composite_array(ctx.node)
        } else if path_eq(ctx.path, &[""]) && ctx.key == "todo" {
            self.process_todo_array(ctx.node)
        } else {
            Ok(())
        }
    }
}

fn path_eq(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

fn expect_object<'a>(node: &'a Node, context: &str) -> Result<&'a [(String, Node)], Error> {
    node.as_object()
        .ok_or_else(|| Error::Schema(format!("{context}: expected an object")))
}

fn to_byte(n: f64, name: &str) -> Result<u8, Error> {
    if n.fract() != 0.0 || !(0.0..=255.0).contains(&n) {
        return Err(Error::Range(format!(
            "{name:?}: decimal element {n} is not a byte (0..255)"
        )));
    }
    Ok(n as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FileLoader;

    struct NoFiles;
    impl FileLoader for NoFiles {
        fn load(&self, relative_name: &str) -> Result<Vec<u8>, Error> {
            Err(Error::FileNotFound(relative_name.to_owned()))
        }
    }

    #[test]
    fn compiles_decimal_and_hex_and_text() {
        let cfg = r#"{
            "dictionary": {
                "decimal": {"a": [65, 66]},
                "hexadecimal": {"b": ["41", "42"]},
                "text": {"c": "Q"}
            },
            "todo": [{"replace": {"a": "c"}}]
        }"#;
        let (dict, stages) = compile(cfg, &NoFiles).unwrap();
        assert_eq!(dict.get("a").unwrap().bytes(), b"AB");
        assert_eq!(dict.get("b").unwrap().bytes(), b"AB");
        assert_eq!(dict.get("c").unwrap().bytes(), b"Q");
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].pairs, vec![("a".to_string(), "c".to_string())]);
    }

    #[test]
    fn composites_concatenate_in_order() {
        let cfg = r#"{
            "dictionary": {
                "text": {"a": "X", "b": "Y"},
                "composite": [{"ab": ["a", "b"]}]
            },
            "todo": [{"replace": {"ab": "a"}}]
        }"#;
        let (dict, _stages) = compile(cfg, &NoFiles).unwrap();
        assert_eq!(dict.get("ab").unwrap().bytes(), b"XY");
    }

    #[test]
    fn composite_can_reference_earlier_composite() {
        let cfg = r#"{
            "dictionary": {
                "text": {"a": "X"},
                "composite": [{"aa": ["a", "a"]}, {"aaaa": ["aa", "aa"]}]
            },
            "todo": [{"replace": {"aaaa": "a"}}]
        }"#;
        let (dict, _stages) = compile(cfg, &NoFiles).unwrap();
        assert_eq!(dict.get("aaaa").unwrap().bytes(), b"XXXX");
    }

    #[test]
    fn unknown_name_in_stage_fails() {
        let cfg = r#"{
            "dictionary": {"text": {"a": "X"}},
            "todo": [{"replace": {"a": "nope"}}]
        }"#;
        assert!(matches!(
            compile(cfg, &NoFiles).unwrap_err(),
            Error::UnknownName(n) if n == "nope"
        ));
    }

    #[test]
    fn empty_todo_fails() {
        let cfg = r#"{"dictionary": {"text": {"a": "X"}}, "todo": []}"#;
        assert!(matches!(compile(cfg, &NoFiles).unwrap_err(), Error::EmptyTodo));
    }

    #[test]
    fn empty_stage_is_skipped_with_warning_not_error() {
        let cfg = r#"{
            "dictionary": {"text": {"a": "X", "b": "Y"}},
            "todo": [{"replace": {}}, {"replace": {"a": "b"}}]
        }"#;
        let (_dict, stages) = compile(cfg, &NoFiles).unwrap();
        assert_eq!(stages.len(), 1);
    }

    #[test]
    fn out_of_range_decimal_byte_fails() {
        let cfg = r#"{
            "dictionary": {"decimal": {"a": [999]}},
            "todo": [{"replace": {"a": "a"}}]
        }"#;
        assert!(matches!(compile(cfg, &NoFiles).unwrap_err(), Error::Range(_)));
    }

    #[test]
    fn duplicate_dictionary_name_fails() {
        let cfg = r#"{
            "dictionary": {"text": {"a": "X"}, "decimal": {"a": [1]}},
            "todo": [{"replace": {"a": "a"}}]
        }"#;
        assert!(matches!(
            compile(cfg, &NoFiles).unwrap_err(),
            Error::DuplicateName(n) if n == "a"
        ));
    }
}
