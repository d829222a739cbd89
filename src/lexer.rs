//! Lexical analysis of a command line into argument tokens.
//!
//! The lexer understands single quotes, double quotes and backslash escapes.
//! It is deliberately lenient: an unterminated quote simply stops applying at
//! the end of the line and a trailing backslash is kept as a literal.

/// Which kind of quotes the scanner is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

/// Characters a backslash escapes inside double quotes. Any other character
/// keeps the backslash.
const DOUBLE_QUOTE_ESCAPABLE: [char; 4] = ['$', '"', '\\', '\n'];

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: QuoteState,
    escaped: bool,
    buffer: String,
    /// Set once the current token contained a quoted section, so `''` and
    /// `""` still produce an (empty) token.
    quoted: bool,
}

impl LexingFSM {
    /// Creates a new lexer over `line`.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: QuoteState::Unquoted,
            escaped: false,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Runs the state machine over the whole input and returns the tokens.
    fn make_tokens(&mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            if self.escaped {
                self.handle_escaped(ch);
                continue;
            }
            match self.state {
                QuoteState::Unquoted => self.handle_unquoted(ch, &mut out),
                QuoteState::SingleQuoted => self.handle_single_quote(ch),
                QuoteState::DoubleQuoted => self.handle_double_quote(ch),
            }
        }

        if self.escaped {
            self.buffer.push('\\');
            self.escaped = false;
        }
        self.flush(&mut out);

        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_escaped(&mut self, ch: char) {
        if self.state == QuoteState::DoubleQuoted && !DOUBLE_QUOTE_ESCAPABLE.contains(&ch) {
            self.buffer.push('\\');
        }
        self.buffer.push(ch);
        self.escaped = false;
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            ' ' | '\t' | '\n' => self.flush(out),
            '\\' => self.escaped = true,
            '\'' => {
                self.quoted = true;
                self.state = QuoteState::SingleQuoted;
            }
            '"' => {
                self.quoted = true;
                self.state = QuoteState::DoubleQuoted;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = QuoteState::Unquoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = QuoteState::Unquoted,
            '\\' => self.escaped = true,
            c => self.buffer.push(c),
        }
    }

    /// Emits the current token if it has content or was explicitly quoted.
    fn flush(&mut self, out: &mut Vec<String>) {
        if !self.buffer.is_empty() || self.quoted {
            out.push(std::mem::take(&mut self.buffer));
        }
        self.quoted = false;
    }
}

/// Splits a raw input line into argument tokens.
///
/// Never fails: malformed quoting is resolved leniently.
///
/// ```
/// use mini_shell::tokenize;
/// assert_eq!(tokenize("echo 'a  b' c"), vec!["echo", "a  b", "c"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
