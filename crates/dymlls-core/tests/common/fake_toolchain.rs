use dymlls_core::dyml::{
    Document, LexError, Pos, Token, TokenKind, TokenStream, Toolchain, ToolchainError,
};

/// Toolchain returning a fixed token list regardless of input.
///
/// Parsing always succeeds with an empty document and encoding always fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedToolchain {
    tokens: Vec<Result<Token, LexError>>,
}

impl ScriptedToolchain {
    pub const fn new(tokens: Vec<Result<Token, LexError>>) -> Self {
        Self { tokens }
    }
}

impl Toolchain for ScriptedToolchain {
    fn tokenize<'a>(&self, _text: &'a str) -> TokenStream<'a> {
        Box::new(self.tokens.clone().into_iter())
    }

    fn parse(&self, _text: &str) -> Result<Document, ToolchainError> {
        Ok(Document::default())
    }

    fn encode_xml(&self, _text: &str) -> Result<String, ToolchainError> {
        Err(ToolchainError::Generic {
            message: "encoding disabled".to_string(),
        })
    }
}

/// Single-line token covering `begin..end` bytes of line 1.
pub fn token(kind: TokenKind, begin: usize, end: usize) -> Token {
    #[allow(clippy::cast_possible_truncation)]
    let col = |byte: usize| byte as u32 + 1;
    Token {
        kind,
        begin: Pos::new(1, col(begin)),
        end: Pos::new(1, col(end)),
        byte_begin: begin,
        byte_end: end,
    }
}
