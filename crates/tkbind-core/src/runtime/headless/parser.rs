//! Script parser for the command protocol
//!
//! A script is a sequence of commands separated by newlines or `;`. A
//! command is a sequence of words separated by blanks. A word is either
//! braced (`{...}`, taken literally, braces nest), double-quoted (`"..."`,
//! with substitutions) or bare (with substitutions). Substitutions are
//! backslash escapes, `$name` / `${name}` variable reads and `[script]`
//! nested evaluation. Parsing is separated from evaluation: variable and
//! script parts are resolved by the evaluator.

use std::fmt;

/// One piece of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Literal text (escapes already resolved)
    Text(String),
    /// Variable read
    Var(String),
    /// Nested script whose result is spliced in
    Script(String),
}

/// A word made of parts that are concatenated after substitution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub parts: Vec<Part>,
}

impl Word {
    fn push_char(&mut self, c: char) {
        if let Some(Part::Text(text)) = self.parts.last_mut() {
            text.push(c);
        } else {
            self.parts.push(Part::Text(c.to_string()));
        }
    }

    /// The word's text if it contains no substitutions
    #[must_use]
    pub fn literal(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(t) => out.push_str(t),
                _ => return None,
            }
        }
        Some(out)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub words: Vec<Word>,
}

/// A syntax error in a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

/// Parse a script into commands
pub fn parse_script(src: &str) -> Result<Vec<Command>, ParseError> {
    let mut parser = Parser {
        chars: src.chars().collect(),
        pos: 0,
    };
    parser.script()
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn script(&mut self) -> Result<Vec<Command>, ParseError> {
        let mut commands = Vec::new();
        loop {
            // Skip command separators and leading blanks
            while let Some(c) = self.peek() {
                if c.is_whitespace() || c == ';' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            match self.peek() {
                None => break,
                Some('#') => self.skip_comment(),
                Some(_) => {
                    let command = self.command()?;
                    if !command.words.is_empty() {
                        commands.push(command);
                    }
                }
            }
        }
        Ok(commands)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\\' {
                self.pos += 1;
            } else if c == '\n' {
                break;
            }
        }
    }

    fn command(&mut self) -> Result<Command, ParseError> {
        let mut command = Command::default();
        loop {
            self.skip_blanks();
            match self.peek() {
                None | Some('\n' | ';') => break,
                Some(_) => command.words.push(self.word()?),
            }
        }
        Ok(command)
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.pos += 1;
            } else if c == '\\' && self.peek_at(1) == Some('\n') {
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn at_word_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => c.is_whitespace() || c == ';',
        }
    }

    fn word(&mut self) -> Result<Word, ParseError> {
        match self.peek() {
            Some('{') => {
                let text = self.braced()?;
                if !self.at_word_end() {
                    return Err(ParseError("extra characters after close-brace".into()));
                }
                Ok(Word {
                    parts: vec![Part::Text(text)],
                })
            }
            Some('"') => {
                self.pos += 1;
                let word = self.substituted(|c| c == '"')?;
                if self.peek() != Some('"') {
                    return Err(ParseError("missing \"".into()));
                }
                self.pos += 1;
                if !self.at_word_end() {
                    return Err(ParseError("extra characters after close-quote".into()));
                }
                Ok(word)
            }
            _ => self.substituted(|c| c.is_whitespace() || c == ';'),
        }
    }

    /// Braced word: literal text up to the matching close brace
    fn braced(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let mut depth = 1usize;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some('\n') => {
                        self.pos += 1;
                        while matches!(self.peek(), Some(' ' | '\t')) {
                            self.pos += 1;
                        }
                        out.push(' ');
                    }
                    Some(next) => {
                        self.pos += 1;
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                '{' => {
                    depth += 1;
                    out.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        Err(ParseError("missing close-brace".into()))
    }

    /// Word body with substitutions, stopping before `stop` matches
    fn substituted(&mut self, stop: impl Fn(char) -> bool) -> Result<Word, ParseError> {
        let mut word = Word::default();
        while let Some(c) = self.peek() {
            if stop(c) {
                break;
            }
            match c {
                '\\' => {
                    self.pos += 1;
                    self.backslash(&mut word);
                }
                '$' => {
                    self.pos += 1;
                    match self.variable_name()? {
                        Some(name) => word.parts.push(Part::Var(name)),
                        None => word.push_char('$'),
                    }
                }
                '[' => {
                    self.pos += 1;
                    let script = self.bracketed()?;
                    word.parts.push(Part::Script(script));
                }
                _ => {
                    self.pos += 1;
                    word.push_char(c);
                }
            }
        }
        Ok(word)
    }

    fn backslash(&mut self, word: &mut Word) {
        let Some(c) = self.peek() else {
            word.push_char('\\');
            return;
        };
        self.pos += 1;
        match c {
            'n' => word.push_char('\n'),
            't' => word.push_char('\t'),
            'r' => word.push_char('\r'),
            'a' => word.push_char('\u{7}'),
            'b' => word.push_char('\u{8}'),
            'f' => word.push_char('\u{c}'),
            'v' => word.push_char('\u{b}'),
            '\n' => {
                while matches!(self.peek(), Some(' ' | '\t')) {
                    self.pos += 1;
                }
                word.push_char(' ');
            }
            other => word.push_char(other),
        }
    }

    fn variable_name(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek() == Some('{') {
            self.pos += 1;
            let mut name = String::new();
            while let Some(c) = self.peek() {
                self.pos += 1;
                if c == '}' {
                    return Ok(Some(name));
                }
                name.push(c);
            }
            return Err(ParseError("missing close-brace for variable name".into()));
        }

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.pos += 1;
            } else if c == ':' && self.peek_at(1) == Some(':') {
                name.push_str("::");
                self.pos += 2;
            } else {
                break;
            }
        }
        Ok(if name.is_empty() { None } else { Some(name) })
    }

    /// Nested script up to the matching close bracket
    fn bracketed(&mut self) -> Result<String, ParseError> {
        let mut depth = 1usize;
        let mut brace_depth = 0usize;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(next) = self.peek() {
                        self.pos += 1;
                        out.push(next);
                    }
                    continue;
                }
                '{' => brace_depth += 1,
                '}' => brace_depth = brace_depth.saturating_sub(1),
                '[' if brace_depth == 0 => depth += 1,
                ']' if brace_depth == 0 => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        Err(ParseError("missing close-bracket".into()))
    }
}

/// Quote a string so that it parses back as exactly one word
#[must_use]
pub fn quote_word(s: &str) -> String {
    if s.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ' ' | ';' | '"' | '$' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Join strings into a list that parses back into the same elements
#[must_use]
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| quote_word(s.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_words(src: &str) -> Vec<String> {
        let commands = parse_script(src).unwrap();
        assert_eq!(commands.len(), 1);
        commands[0]
            .words
            .iter()
            .map(|w| w.literal().expect("literal word"))
            .collect()
    }

    #[test]
    fn test_bare_words() {
        assert_eq!(literal_words("pack .f1 -side left"), vec!["pack", ".f1", "-side", "left"]);
    }

    #[test]
    fn test_separators_and_comments() {
        let commands = parse_script("set a 1; set b 2\n# comment\n\nset c 3").unwrap();
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn test_quoted_word_with_escapes() {
        let words = literal_words(r#"label .l -text "He said \"hi\" \\now \[x\]""#);
        assert_eq!(words[3], r#"He said "hi" \now [x]"#);
    }

    #[test]
    fn test_braced_word_is_literal() {
        let words = literal_words("bind .b <Button-1> {cb %x $y [z]}");
        assert_eq!(words[3], "cb %x $y [z]");

        let words = literal_words("x {a {b c} d}");
        assert_eq!(words[1], "a {b c} d");
    }

    #[test]
    fn test_substitution_parts() {
        let commands = parse_script("puts \"v=$name [get ${other}]\"").unwrap();
        let parts = &commands[0].words[1].parts;
        assert_eq!(
            parts,
            &vec![
                Part::Text("v=".into()),
                Part::Var("name".into()),
                Part::Text(" ".into()),
                Part::Script("get ${other}".into()),
            ]
        );
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        assert_eq!(literal_words("x a$ $")[1..], ["a$".to_string(), "$".to_string()]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_script("x {unclosed").is_err());
        assert!(parse_script("x \"unclosed").is_err());
        assert!(parse_script("x [unclosed").is_err());
        assert!(parse_script("x {a}b").is_err());
    }

    #[test]
    fn test_quote_word_round_trip() {
        for s in ["", "plain", "two words", "{brace", "a\"b", "$x[y]", "back\\slash", "line\nbreak"] {
            let quoted = quote_word(s);
            let words = literal_words(&format!("cmd {quoted}"));
            assert_eq!(words[1], s, "round trip of {s:?} via {quoted:?}");
        }
    }
}
