// SPDX-License-Identifier: GPL-3.0-only

//! Line tokenizer for codecs.conf
//!
//! A token is a run of non-whitespace characters, or a `"`/`'` quoted string
//! (quotes stripped, running to the matching quote or the end of the line).
//! A `#` or `;` at the start of a token comments out the rest of the line.

/// Tokens of a single line
#[derive(Debug, Clone)]
pub struct LineTokens<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> LineTokens<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }
}

impl<'a> Iterator for LineTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.line[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
        let rest = &self.line[self.pos..];

        let quote = match rest.chars().next() {
            None | Some('#') | Some(';') => {
                self.pos = self.line.len();
                return None;
            }
            Some(c @ ('"' | '\'')) => Some(c),
            Some(_) => None,
        };

        if let Some(quote) = quote {
            let body = &rest[1..];
            match body.find(quote) {
                Some(end) => {
                    self.pos += 1 + end + 1;
                    Some(&body[..end])
                }
                None => {
                    self.pos = self.line.len();
                    Some(body)
                }
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            self.pos += end;
            Some(&rest[..end])
        }
    }
}

/// Split a line into tokens
pub fn tokenize(line: &str) -> Vec<&str> {
    LineTokens::new(line).collect()
}

/// Iterate non-empty lines as `(line_number, tokens)`, line numbers starting at 1
pub fn token_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, tokenize(line)))
        .filter(|(_, tokens)| !tokens.is_empty())
}
