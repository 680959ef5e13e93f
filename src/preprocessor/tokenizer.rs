//! Lossless tokenizer for the template preprocessor.
//!
//! The token stream is deliberately coarse: a token is either a maximal run
//! of non-whitespace characters, a maximal run of whitespace (space, tab, CR,
//! LF in any mixture), or a double-quoted string literal kept as one
//! indivisible token, quotes included. Concatenating the tokens in order
//! reproduces the input byte for byte.

/// Split `input` into word / whitespace / string-literal tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    #[derive(PartialEq)]
    enum State {
        Start,
        Word,
        Whitespace,
        StringLiteral,
    }

    let mut tokens = Vec::new();
    let mut state = State::Start;
    let mut current = String::new();
    let mut prev_char = '\0';

    for c in input.chars() {
        let next_state = match state {
            State::StringLiteral => {
                // An unescaped quote closes the literal; the quote itself
                // still belongs to it.
                if c == '"' && prev_char != '\\' {
                    current.push(c);
                    prev_char = c;
                    tokens.push(std::mem::take(&mut current));
                    state = State::Start;
                    continue;
                }
                State::StringLiteral
            }
            // An escaped quote outside a literal does not open one either.
            _ if c == '"' && prev_char != '\\' => State::StringLiteral,
            _ if c.is_whitespace() => State::Whitespace,
            _ => State::Word,
        };

        if state != State::Start && next_state != state {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_char = c;
        state = next_state;
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: &[&str]) {
        assert_eq!(tokenize(input), expected, "input: {:?}", input);
        assert_eq!(tokenize(input).concat(), input, "round-trip: {:?}", input);
    }

    #[test]
    fn words_and_spaces() {
        assert_tokens("foo bar", &["foo", " ", "bar"]);
        assert_tokens("foo bar ", &["foo", " ", "bar", " "]);
        assert_tokens("foo\nbar", &["foo", "\n", "bar"]);
        assert_tokens("foo bar    bar", &["foo", " ", "bar", "    ", "bar"]);
    }

    #[test]
    fn mixed_whitespace_runs_stay_single_tokens() {
        assert_tokens("foo bar\r\n foo", &["foo", " ", "bar", "\r\n ", "foo"]);
        assert_tokens(
            "foo bar\r\n\n\r\n \n foo",
            &["foo", " ", "bar", "\r\n\n\r\n \n ", "foo"],
        );
    }

    #[test]
    fn string_literals_are_indivisible() {
        assert_tokens("foo \"bar\"", &["foo", " ", "\"bar\""]);
        assert_tokens("foo \"bar bar\"", &["foo", " ", "\"bar bar\""]);
        assert_tokens(
            "bar \"bar\" foo \"bar\"",
            &["bar", " ", "\"bar\"", " ", "foo", " ", "\"bar\""],
        );
    }

    #[test]
    fn escaped_quote_does_not_close_a_literal() {
        assert_tokens("foo \"bar \\\" bar\"", &["foo", " ", "\"bar \\\" bar\""]);
    }

    #[test]
    fn unterminated_literal_runs_to_end_of_input() {
        assert_tokens("foo \"bar", &["foo", " ", "\"bar"]);
    }

    #[test]
    fn empty_input() {
        assert_tokens("", &[]);
    }

    #[test]
    fn round_trip_is_lossless_on_template_text() {
        let input = "#define BIFROST_NAMESPACE_BEGIN namespace foo {\n\
                     BIFROST_NAMESPACE_BEGIN\n  int x = \"a b c\";\n";
        assert_eq!(tokenize(input).concat(), input);
    }
}
