use crate::position::{Position, Range};

/// Terminal kinds produced by the lexer and consumed by the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// Identifiers that are not reserved words
    Name,
    /// Integer or decimal literal, optional exponent
    Number,
    /// Double-quoted string literal (quotes included in the text)
    Str,
    /// A line break plus any whitespace and blank lines after it
    Newline,
    // Punctuation
    Semicolon,
    Colon,
    Comma,
    LParen,
    RParen,
    Dollar,
    Prime, // '
    // Operators
    Arrow, // -> and =>
    Equal,
    ColonEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    // Reserved words
    VarModifier,  // var, const
    SubModifier,  // substanceOnly
    TypeModifier, // species, compartment, formula
    In,
    Model,
    End,
    Function,
    Unit,
    Has,
    Is,
    AnnotKeyword,
    /// End of input
    Eof,
    /// A character no pattern matches. Never fed to the automaton.
    Invalid,
}

impl Token {
    pub const COUNT: usize = Token::Invalid as usize + 1;

    pub const ALL: [Token; Token::COUNT] = [
        Token::Name,
        Token::Number,
        Token::Str,
        Token::Newline,
        Token::Semicolon,
        Token::Colon,
        Token::Comma,
        Token::LParen,
        Token::RParen,
        Token::Dollar,
        Token::Prime,
        Token::Arrow,
        Token::Equal,
        Token::ColonEqual,
        Token::Plus,
        Token::Minus,
        Token::Star,
        Token::Slash,
        Token::Caret,
        Token::VarModifier,
        Token::SubModifier,
        Token::TypeModifier,
        Token::In,
        Token::Model,
        Token::End,
        Token::Function,
        Token::Unit,
        Token::Has,
        Token::Is,
        Token::AnnotKeyword,
        Token::Eof,
        Token::Invalid,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether this token is a reserved word.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Token::VarModifier
                | Token::SubModifier
                | Token::TypeModifier
                | Token::In
                | Token::Model
                | Token::End
                | Token::Function
                | Token::Unit
                | Token::Has
                | Token::Is
                | Token::AnnotKeyword
        )
    }
}

/// Annotation qualifiers accepted between a name and a URI string.
pub const ANNOTATION_KEYWORDS: &[&str] = &[
    "identity",
    "biological_entity_is",
    "hasPart",
    "part",
    "isPartOf",
    "parthood",
    "isVersionOf",
    "hypernym",
    "hasVersion",
    "version",
    "isHomologTo",
    "homolog",
    "isDescribedBy",
    "description",
    "isEncodedBy",
    "encoder",
    "encodes",
    "encodement",
    "occursIn",
    "container",
    "hasProperty",
    "isPropertyOf",
    "hasTaxon",
    "taxon",
    "model_entity_is",
    "origin",
];

fn keyword(word: &str) -> Option<Token> {
    let tok = match word {
        "var" | "const" => Token::VarModifier,
        "substanceOnly" => Token::SubModifier,
        "species" | "compartment" | "formula" => Token::TypeModifier,
        "in" => Token::In,
        "model" => Token::Model,
        "end" => Token::End,
        "function" => Token::Function,
        "unit" => Token::Unit,
        "has" => Token::Has,
        "is" => Token::Is,
        w if ANNOTATION_KEYWORDS.contains(&w) => Token::AnnotKeyword,
        _ => return None,
    };
    Some(tok)
}

/// A token with its exact text, the whitespace/comments before it, and
/// where it sits in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    /// Whitespace and comments between the previous token and this one.
    pub trivia: String,
    pub range: Range,
    /// Byte offset of `text` in the source.
    pub offset: usize,
}

impl Spanned {
    /// A token that does not come from the source, e.g. end of input.
    pub fn synthetic(token: Token, at: Position, offset: usize) -> Self {
        Spanned {
            token,
            text: String::new(),
            trivia: String::new(),
            range: Range::new(at, at),
            offset,
        }
    }
}

/// A character that starts no token. The lexer does not move past it
/// until [`Lexer::skip_char`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub ch: char,
    pub pos: Position,
    pub offset: usize,
}

/// On-demand lexer. Keeps its own line/column counter so the parser can
/// step over characters it could not tokenize.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    at: Position,
    trivia: String,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            offset: 0,
            at: Position::start(),
            trivia: String::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.at
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, len: usize) -> &'a str {
        let text = &self.src[self.offset..self.offset + len];
        self.offset += len;
        self.at = self.at.advanced_by(text);
        text
    }

    /// Consume whitespace and comments into the pending trivia buffer.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let Some(c) = rest.chars().next() else { return };

            if c == ' ' || c == '\t' || c == '\x0c' || (c == '\r' && !rest.starts_with("\r\n")) {
                let len = c.len_utf8();
                let text = self.bump(len);
                self.trivia.push_str(text);
                continue;
            }
            if c == '#' || rest.starts_with("//") {
                let len = rest.find('\n').unwrap_or(rest.len());
                let len = if rest[..len].ends_with('\r') { len - 1 } else { len };
                let text = self.bump(len);
                self.trivia.push_str(text);
                continue;
            }
            if rest.starts_with("/*") {
                // An unterminated block comment is left for the caller to
                // report as an unexpected character.
                let Some(close) = rest[2..].find("*/") else { return };
                let text = self.bump(close + 4);
                self.trivia.push_str(text);
                continue;
            }
            return;
        }
    }

    /// Lex the next token. `Ok(None)` at end of input (any trailing
    /// trivia stays pending and is reported by [`Lexer::take_trivia`]).
    pub fn next_token(&mut self) -> Result<Option<Spanned>, LexError> {
        self.skip_trivia();
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(None);
        };
        let start = self.at;
        let offset = self.offset;

        let (token, len) = match c {
            '\n' => (Token::Newline, newline_len(rest)),
            '\r' if rest.starts_with("\r\n") => (Token::Newline, newline_len(rest)),
            ';' => (Token::Semicolon, 1),
            ',' => (Token::Comma, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '$' => (Token::Dollar, 1),
            '\'' => (Token::Prime, 1),
            '+' => (Token::Plus, 1),
            '*' => (Token::Star, 1),
            '/' if !rest.starts_with("/*") => (Token::Slash, 1),
            '^' => (Token::Caret, 1),
            ':' if rest.starts_with(":=") => (Token::ColonEqual, 2),
            ':' => (Token::Colon, 1),
            '-' if rest.starts_with("->") => (Token::Arrow, 2),
            '-' => (Token::Minus, 1),
            '=' if rest.starts_with("=>") => (Token::Arrow, 2),
            '=' => (Token::Equal, 1),
            '"' => match string_len(rest) {
                Some(len) => (Token::Str, len),
                None => return Err(self.error(c, start, offset)),
            },
            c if c.is_ascii_digit() || (c == '.' && starts_with_digit(&rest[1..])) => {
                (Token::Number, number_len(rest))
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len());
                (keyword(&rest[..len]).unwrap_or(Token::Name), len)
            }
            _ => return Err(self.error(c, start, offset)),
        };

        let text = self.bump(len).to_owned();
        let trivia = std::mem::take(&mut self.trivia);
        Ok(Some(Spanned {
            token,
            range: Range::of_text(start, &text),
            text,
            trivia,
            offset,
        }))
    }

    fn error(&self, ch: char, pos: Position, offset: usize) -> LexError {
        LexError { ch, pos, offset }
    }

    /// Step over one character that no pattern matched, returning it as a
    /// token of kind [`Token::Invalid`] carrying the pending trivia.
    pub fn skip_char(&mut self) -> Option<Spanned> {
        self.skip_trivia();
        let c = self.peek_char()?;
        let start = self.at;
        let offset = self.offset;
        let text = self.bump(c.len_utf8()).to_owned();
        let trivia = std::mem::take(&mut self.trivia);
        Some(Spanned {
            token: Token::Invalid,
            range: Range::of_text(start, &text),
            text,
            trivia,
            offset,
        })
    }

    /// Trivia consumed since the last token.
    pub fn take_trivia(&mut self) -> String {
        std::mem::take(&mut self.trivia)
    }
}

fn newline_len(rest: &str) -> usize {
    rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len())
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn digits_len(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())
}

fn number_len(s: &str) -> usize {
    let mut len = digits_len(s);
    if s[len..].starts_with('.') {
        len += 1;
        len += digits_len(&s[len..]);
    }
    let rest = &s[len..];
    if rest.starts_with('e') || rest.starts_with('E') {
        let mut exp = 1;
        if rest[1..].starts_with('+') || rest[1..].starts_with('-') {
            exp += 1;
        }
        let digits = digits_len(&rest[exp..]);
        if digits > 0 {
            len += exp + digits;
        }
    }
    len
}

/// Length of a string literal at the start of `s`, or `None` when the
/// closing quote is missing on this line.
fn string_len(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '\n' => return None,
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i + 1),
            _ => escaped = false,
        }
    }
    None
}

/// Lex a whole string, turning unmatched characters into
/// [`Token::Invalid`] tokens. Trailing trivia is returned separately.
pub fn tokenize(src: &str) -> (Vec<Spanned>, String) {
    let mut lexer = Lexer::new(src);
    let mut out = Vec::new();
    loop {
        match lexer.next_token() {
            Ok(Some(tok)) => out.push(tok),
            Ok(None) => break,
            Err(_) => {
                if let Some(tok) = lexer.skip_char() {
                    out.push(tok);
                }
            }
        }
    }
    (out, lexer.take_trivia())
}
