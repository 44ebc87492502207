//!
//! Render passes over the flattened document
//!
//! * `select`: conditional inclusion. Lower-case `#ifndef/#define/#endif`
//!   lines are evaluated against the partition tag and removed; every other
//!   directive is kept with its directive word lower-cased, so `#IFNDEF`
//!   reaches the output as an ordinary `#ifndef`.
//! * `indent`: four spaces per unmatched `{`, ignoring braces in string and
//!   character literals and in comments. Directive lines are not indented.
//!
use crate::error::{fail, ErrorKind, Result};
use fnv::FnvHashSet;
use log::warn;

pub const INDENT: &str = "    ";

fn directive(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace())
        .unwrap_or_else(|| rest.len());
    Some((&rest[..end], rest[end..].trim()))
}

///
/// Keep the lines visible when `tag` is defined.
///
pub fn select(text: &str, tag: &str) -> String {
    let mut defined: FnvHashSet<String> = FnvHashSet::default();
    if !tag.is_empty() {
        defined.insert(tag.to_string());
    }
    let mut stack: Vec<bool> = Vec::new();
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let active = stack.iter().all(|&b| b);
        match directive(line) {
            Some(("ifndef", symbol)) => stack.push(!defined.contains(symbol)),
            Some(("define", symbol)) => {
                if active {
                    defined.insert(symbol.to_string());
                }
            }
            Some(("endif", _)) => {
                if stack.pop().is_none() {
                    warn!("#endif without #ifndef in generated code");
                }
            }
            Some((word, arg)) => {
                if active {
                    out.push('#');
                    out.push_str(&word.to_lowercase());
                    if !arg.is_empty() {
                        out.push(' ');
                        out.push_str(arg);
                    }
                    out.push('\n');
                }
            }
            None => {
                if active {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    if !stack.is_empty() {
        warn!("{} unterminated #ifndef in generated code", stack.len());
    }
    out
}

///
/// Brace balance of one line
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Braces {
    /// `}` before any other code on the line
    pub leading_closes: i64,
    /// opened minus closed
    pub net: i64,
}

///
/// Scan one line; `in_comment` carries an open `/* */` comment across lines.
///
pub fn braces(line: &str, in_comment: &mut bool) -> Result<Braces> {
    let mut b = Braces::default();
    let mut leading = true;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if *in_comment {
            if c == '*' && chars.get(i + 1) == Some(&'/') {
                *in_comment = false;
                i += 1;
            }
            i += 1;
            continue;
        }
        match c {
            '/' if chars.get(i + 1) == Some(&'/') => break,
            '/' if chars.get(i + 1) == Some(&'*') => {
                *in_comment = true;
                i += 1;
            }
            '"' | '\'' => {
                leading = false;
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => {
                            return fail(ErrorKind::UnterminatedLiteral {
                                line: line.to_string(),
                            })
                        }
                        Some('\\') => j += 2,
                        Some(&q) if q == c => break,
                        Some(_) => j += 1,
                    }
                }
                i = j;
            }
            '{' => {
                leading = false;
                b.net += 1;
            }
            '}' => {
                if leading {
                    b.leading_closes += 1;
                }
                b.net -= 1;
            }
            c if c.is_whitespace() => {}
            _ => leading = false,
        }
        i += 1;
    }
    Ok(b)
}

///
/// Re-indent `text`; returns the indented text and the final brace depth.
///
pub fn indent(text: &str) -> Result<(String, i64)> {
    let mut out = String::with_capacity(text.len() * 2);
    let mut depth: i64 = 0;
    let mut in_comment = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            out.push('\n');
            continue;
        }
        if line.starts_with('#') && !in_comment {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        let b = braces(line, &mut in_comment)?;
        let level = (depth - b.leading_closes).max(0);
        for _ in 0..level {
            out.push_str(INDENT);
        }
        out.push_str(line);
        out.push('\n');
        depth += b.net;
        if depth < 0 {
            warn!("unbalanced `}}` in generated code: `{}`", line);
            depth = 0;
        }
    }
    Ok((out, depth))
}
