//! C-preprocessor style macro engine for the code-generation templates.
//!
//! The engine does two things over the token stream produced by
//! [`tokenizer::tokenize`]: it extracts `#define NAME VALUE` directives for
//! an allow-list of names, and it substitutes known macro names elsewhere in
//! the text. Substitution is whole-word (a macro never expands inside a
//! larger identifier), skips unescaped double-quoted spans, and repeats to a
//! fixed point so macros may expand into other macros.
//!
//! There is deliberately no cycle detection: a macro whose value transitively
//! contains its own name will never reach a fixed point and
//! [`expand_macros`] will not return. A self-referential macro is treated as
//! malformed template input, not an engine error.

pub mod tokenizer;

pub use tokenizer::tokenize;

/// Insertion-ordered macro table.
///
/// Expansion iterates the table in insertion order, which keeps fixed-point
/// expansion deterministic; a plain hash map would make the output depend on
/// hashing.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: Vec<(String, String)>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a macro, keeping the original insertion position on
    /// update.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for MacroTable {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (n, v) in iter {
            table.insert(n, v);
        }
        table
    }
}

/// Parse `#define NAME VALUE` directives for the names in `macros_to_parse`
/// and expand all known macros in `input`.
///
/// Directives whose name is allow-listed are consumed (they do not appear in
/// the output); every other token, including `#define`s for names not in the
/// allow-list, passes through expanded. `predefined` seeds the macro table
/// and is expanded from the start.
pub fn expand_macros(input: &str, macros_to_parse: &[&str], predefined: &MacroTable) -> String {
    let mut cursor = TokenCursor::new(tokenize(input), predefined.clone());
    let mut output: Vec<String> = Vec::new();

    while let Some(token) = cursor.next() {
        if token == "#define" {
            if let Some(name) = cursor.peek(1) {
                if macros_to_parse.iter().any(|m| *m == name) {
                    parse_directive(&mut cursor, &name, &mut output);
                    continue;
                }
            }
        }
        output.push(token);
    }
    output.concat()
}

/// Consume the remainder of an allow-listed `#define` directive.
///
/// The value runs to the first newline that is not preceded by a `\` line
/// continuation; the terminating newline is dropped with the directive, but
/// any text following it inside the same coarse whitespace token is emitted
/// verbatim.
fn parse_directive(cursor: &mut TokenCursor, name: &str, output: &mut Vec<String>) {
    // peek(1) is the macro name, peek(2) the whitespace after it; the value
    // starts at peek(3).
    let mut n = 3;
    let mut value = String::new();
    let mut pending_backslash = false;

    'value: loop {
        let Some(token) = cursor.peek(n) else {
            n += 1;
            break;
        };
        n += 1;

        let chars: Vec<char> = token.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if pending_backslash {
                pending_backslash = false;
                if c == '\n' {
                    // Line continuation: both the backslash and the newline
                    // are elided from the value.
                    i += 1;
                    continue;
                }
                if c == '\r' && chars.get(i + 1) == Some(&'\n') {
                    i += 2;
                    continue;
                }
                value.push('\\');
            }

            if c == '\\' {
                pending_backslash = true;
            } else if c == '\n' {
                // End of the value. The tokenizer's whitespace runs are
                // coarse, so re-emit whatever follows the newline verbatim.
                let rest: String = chars[i + 1..].iter().collect();
                if !rest.is_empty() {
                    output.push(rest);
                }
                break 'value;
            } else {
                value.push(c);
            }
            i += 1;
        }
    }

    if pending_backslash {
        value.push('\\');
    }

    cursor.add_macro(name, value);
    cursor.consume(n);
}

/// Cursor over the token stream with a growing macro table.
///
/// Tokens are expanded lazily as they are read or peeked, so a macro defined
/// earlier in the stream applies to everything after its directive.
struct TokenCursor {
    tokens: Vec<String>,
    index: usize,
    macros: MacroTable,
}

impl TokenCursor {
    fn new(tokens: Vec<String>, macros: MacroTable) -> Self {
        Self {
            tokens,
            index: 0,
            macros,
        }
    }

    /// Next token, expanded, or `None` at end of stream.
    fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(self.expand(token))
    }

    /// The n-th token ahead of the cursor, expanded.
    fn peek(&self, n: usize) -> Option<String> {
        self.tokens.get(self.index + n).map(|t| self.expand(t))
    }

    fn consume(&mut self, n: usize) {
        self.index = (self.index + n).min(self.tokens.len());
    }

    fn add_macro(&mut self, name: &str, value: String) {
        self.macros.insert(name, value);
    }

    /// Substitute known macros in `token` until no substitution applies.
    ///
    /// Occurrences only count when bounded by whitespace or the token edges
    /// and when outside an unescaped string span. No cycle guard, see the
    /// module docs.
    fn expand(&self, token: &str) -> String {
        let mut expanded = token.to_string();
        loop {
            let mut changed = false;
            for (name, value) in self.macros.iter() {
                if name.is_empty() {
                    continue;
                }
                let mut search = 0;
                while let Some(found) = expanded[search..].find(name) {
                    let start = search + found;
                    let end = start + name.len();

                    let at_word_boundary = expanded[..start]
                        .chars()
                        .next_back()
                        .map_or(true, char::is_whitespace)
                        && expanded[end..].chars().next().map_or(true, char::is_whitespace);

                    if at_word_boundary && !inside_string(&expanded, start) {
                        expanded.replace_range(start..end, value);
                        changed = true;
                        search = start + value.len();
                    } else {
                        search = end;
                    }
                }
            }
            if !changed {
                return expanded;
            }
        }
    }
}

/// Whether the byte offset `index` falls inside an unescaped double-quoted
/// span of `text`.
fn inside_string(text: &str, index: usize) -> bool {
    let mut inside = false;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        if i >= index {
            break;
        }
        if c == '"' && prev != '\\' {
            inside = !inside;
        }
        prev = c;
    }
    inside
}
