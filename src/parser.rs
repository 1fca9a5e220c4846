// parser.rs
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

// A recursive-descent parser for the structured configuration document
// (a subset of JSON: objects, arrays, strings with a fixed escape table,
// numbers, and the `true`/`false`/`null` literals — no `\uXXXX`).
//
// Unlike the original C++ parser, which rewrites escaped strings in place
// inside the input buffer so that consumers can borrow zero-copy views
// into it, this implementation allocates decoded strings separately. Both
// are conformant (see design notes); allocating keeps the parsed tree free
// of a lifetime tied to the input buffer, which is worth the extra copies
// for a config document that is parsed once per run.
//
// The parser exposes its structure to callers as a [`Node`] tree. A
// caller that wants callback semantics at object/array boundaries — the
// shape the rule compiler (`compiler.rs`) relies on — drives [`walk`]
// with a [`ConfigVisitor`].

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Vec<(String, Node)>),
    Array(Vec<Node>),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Object(_) | Node::Array(_))
    }
}

/// Node descriptor passed to a [`ConfigVisitor`] at object/array boundaries.
pub struct NodeCtx<'a> {
    /// Empty for array members.
    pub key: &'a str,
    /// Depth from the root object; the root itself is depth 1.
    pub depth: usize,
    /// Ancestor keys from the root down to (not including) this node.
    pub path: &'a [String],
    pub node: &'a Node,
}

pub trait ConfigVisitor {
    fn object_begin(&mut self, _ctx: &NodeCtx) -> Result<(), Error> {
        Ok(())
    }
    fn object_end(&mut self, _ctx: &NodeCtx) -> Result<(), Error> {
        Ok(())
    }
    fn array_begin(&mut self, _ctx: &NodeCtx) -> Result<(), Error> {
        Ok(())
    }
    fn array_end(&mut self, _ctx: &NodeCtx) -> Result<(), Error> {
        Ok(())
    }
}

pub fn walk(root: &Node, visitor: &mut impl ConfigVisitor) -> Result<(), Error> {
    let mut path = Vec::new();
    walk_node("", 1, &mut path, root, visitor)
}

fn walk_node(
    key: &str,
    depth: usize,
    path: &mut Vec<String>,
    node: &Node,
    visitor: &mut impl ConfigVisitor,
) -> Result<(), Error> {
    match node {
        Node::Object(entries) => {
            visitor.object_begin(&NodeCtx { key, depth, path, node })?;
            path.push(key.to_owned());
            for (k, v) in entries {
                walk_node(k, depth + 1, path, v, visitor)?;
            }
            path.pop();
            visitor.object_end(&NodeCtx { key, depth, path, node })?;
        }
        Node::Array(items) => {
            visitor.array_begin(&NodeCtx { key, depth, path, node })?;
            path.push(key.to_owned());
            for item in items {
                walk_node("", depth + 1, path, item, visitor)?;
            }
            path.pop();
            visitor.array_end(&NodeCtx { key, depth, path, node })?;
        }
        Node::Str(_) | Node::Num(_) | Node::Bool(_) | Node::Null => {}
    }
    Ok(())
}

pub fn parse(input: &str) -> Result<Node, Error> {
    let mut p = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    p.skip_ws();
    if p.peek() != Some(b'{') {
        return Err(p.err("top-level value must be an object"));
    }
    let root = p.parse_object()?;
    p.skip_ws();
    if p.pos != p.bytes.len() {
        return Err(p.err("trailing data after top-level object"));
    }
    Ok(root)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

const WHITESPACE: &[u8] = b" \t\n\r";

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if WHITESPACE.contains(&b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn err(&self, reason: impl Into<String>) -> Error {
        let (line, column) = self.line_col(self.pos);
        Error::Parse {
            line,
            column,
            reason: reason.into(),
        }
    }

    /// Line/column for a byte offset. Honors both LF and CR as line
    /// terminators, counting by whichever produces the larger line number
    /// (a mixed CRLF/LF/CR document is otherwise ambiguous to count).
    fn line_col(&self, offset: usize) -> (usize, usize) {
        let scanned = &self.bytes[..offset.min(self.bytes.len())];
        let lf_count = scanned.iter().filter(|&&b| b == b'\n').count();
        let cr_count = scanned.iter().filter(|&&b| b == b'\r').count();
        let line = lf_count.max(cr_count) + 1;
        let last_term = scanned
            .iter()
            .rposition(|&b| b == b'\n' || b == b'\r')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = offset - last_term + 1;
        (line, column)
    }

    fn expect(&mut self, b: u8) -> Result<(), Error> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}", b as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Node, Error> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Node::Str),
            Some(b't') => self.parse_literal("true", Node::Bool(true)),
            Some(b'f') => self.parse_literal("false", Node::Bool(false)),
            Some(b'n') => self.parse_literal("null", Node::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(other) => Err(self.err(format!("unexpected byte {:?}", other as char))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn parse_literal(&mut self, word: &str, value: Node) -> Result<Node, Error> {
        let start = self.pos;
        if self.bytes[start..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.err(format!("expected literal {:?}", word)))
        }
    }

    fn parse_object(&mut self) -> Result<Node, Error> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::Object(entries));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err("expected object key string"));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            self.expect(b':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => break,
                _ => return Err(self.err("expected ',' or '}' in object")),
            }
        }
        Ok(Node::Object(entries))
    }

    fn parse_array(&mut self) -> Result<Node, Error> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node::Array(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => break,
                _ => return Err(self.err("expected ',' or ']' in array")),
            }
        }
        Ok(Node::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, Error> {
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    let decoded = match self.bump() {
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(b'/') => '/',
                        Some(b'b') => '\u{8}',
                        Some(b'f') => '\u{c}',
                        Some(b'n') => '\n',
                        Some(b'r') => '\r',
                        Some(b't') => '\t',
                        Some(b'u') => {
                            return Err(self.err("\\uXXXX escapes are not supported"))
                        }
                        _ => return Err(self.err("invalid escape sequence")),
                    };
                    out.push(decoded);
                }
                Some(b) => {
                    // Re-decode UTF-8 multi-byte sequences verbatim; config
                    // text is typically ASCII but need not be.
                    if b < 0x80 {
                        out.push(b as char);
                    } else {
                        let start = self.pos - 1;
                        let width = utf8_width(b);
                        let end = (start + width).min(self.bytes.len());
                        let s = std::str::from_utf8(&self.bytes[start..end])
                            .map_err(|_| self.err("invalid utf-8 in string"))?;
                        out.push_str(s);
                        self.pos = end;
                    }
                }
            }
        }
        Ok(out)
    }

    fn parse_number(&mut self) -> Result<Node, Error> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        text.parse::<f64>()
            .map(Node::Num)
            .map_err(|_| self.err("invalid number"))
    }
}

fn utf8_width(lead: u8) -> usize {
    if lead & 0b1110_0000 == 0b1100_0000 {
        2
    } else if lead & 0b1111_0000 == 0b1110_0000 {
        3
    } else if lead & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_object() {
        assert_eq!(parse("{}").unwrap(), Node::Object(vec![]));
    }

    #[test]
    fn parses_nested_structure() {
        let node = parse(r#"{"a": [1, 2, "three"], "b": {"c": true, "d": null}}"#).unwrap();
        let obj = node.as_object().unwrap();
        assert_eq!(obj[0].0, "a");
        assert_eq!(
            obj[0].1.as_array().unwrap(),
            &[Node::Num(1.0), Node::Num(2.0), Node::Str("three".into())]
        );
        let b = obj[1].1.as_object().unwrap();
        assert_eq!(b[0], ("c".to_string(), Node::Bool(true)));
        assert_eq!(b[1], ("d".to_string(), Node::Null));
    }

    #[test]
    fn decodes_escapes() {
        let node = parse(r#"{"s": "a\"b\\c\/d\be\ff\ng\rh\ti"}"#).unwrap();
        let obj = node.as_object().unwrap();
        assert_eq!(obj[0].1.as_str().unwrap(), "a\"b\\c/d\u{8}e\u{c}f\ng\rh\ti");
    }

    #[test]
    fn rejects_unicode_escapes() {
        let err = parse("{\"s\": \"\\u0041\"}").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn rejects_non_object_top_level() {
        assert!(parse("[]").is_err());
        assert!(parse("42").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("{} garbage").is_err());
    }

    #[test]
    fn reports_line_and_column() {
        let err = parse("{\n  \"a\": tru\n}").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn walk_reports_depth_and_path() {
        struct Collector(Vec<(usize, String)>);
        impl ConfigVisitor for Collector {
            fn object_begin(&mut self, ctx: &NodeCtx) -> Result<(), Error> {
                self.0.push((ctx.depth, ctx.key.to_string()));
                Ok(())
            }
        }
        let node = parse(r#"{"dictionary": {"text": {"a": "x"}}}"#).unwrap();
        let mut c = Collector(Vec::new());
        walk(&node, &mut c).unwrap();
        assert_eq!(
            c.0,
            vec![
                (1, "".to_string()),
                (2, "dictionary".to_string()),
                (3, "text".to_string()),
            ]
        );
    }
}
