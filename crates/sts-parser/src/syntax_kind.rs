//! Token and node kinds.

use serde::Serialize;

/// Kinds of tokens and syntax nodes.
///
/// Tokens come first, then keywords, then node kinds. Contextual keywords
/// (`declare`, `module`, `namespace`, `constructor`, and the primitive type
/// names) scan as `Identifier` and are recognised by the parser by text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,

    // Literals and names
    Identifier,
    NumericLiteral,
    StringLiteral,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    DotDotDotToken,
    SemicolonToken,
    CommaToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    GreaterThanEqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    EqualsEqualsEqualsToken,
    ExclamationEqualsEqualsToken,
    EqualsGreaterThanToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    PercentToken,
    ExclamationToken,
    AmpersandAmpersandToken,
    BarBarToken,
    QuestionToken,
    ColonToken,
    EqualsToken,

    // Reserved words
    ClassKeyword,
    ConstKeyword,
    ElseKeyword,
    EnumKeyword,
    ExportKeyword,
    ExtendsKeyword,
    FalseKeyword,
    FunctionKeyword,
    IfKeyword,
    ImplementsKeyword,
    InterfaceKeyword,
    LetKeyword,
    NewKeyword,
    NullKeyword,
    PrivateKeyword,
    PublicKeyword,
    ReturnKeyword,
    StaticKeyword,
    ThisKeyword,
    TrueKeyword,
    VarKeyword,
    VoidKeyword,
    WhileKeyword,

    // Declarations
    SourceFile,
    ModuleDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMember,
    FunctionDeclaration,
    VariableStatement,
    VariableDeclaration,
    Parameter,
    TypeParameter,
    PropertyDeclaration,
    MethodDeclaration,
    Constructor,
    PropertySignature,
    MethodSignature,
    CallSignature,
    ConstructSignature,
    IndexSignature,

    // Statements
    Block,
    ReturnStatement,
    IfStatement,
    WhileStatement,
    ExpressionStatement,
    EmptyStatement,

    // Expressions
    ThisExpression,
    BooleanLiteral,
    NullLiteral,
    ArrayLiteralExpression,
    ObjectLiteralExpression,
    PropertyAssignment,
    FunctionExpression,
    CallExpression,
    NewExpression,
    PropertyAccessExpression,
    ElementAccessExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    TypeAssertionExpression,
    ParenthesizedExpression,

    // Types
    KeywordType,
    TypeReference,
    QualifiedName,
    ArrayType,
    TupleType,
    TypeLiteral,
    FunctionType,
}

impl SyntaxKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassKeyword
                | SyntaxKind::ConstKeyword
                | SyntaxKind::ElseKeyword
                | SyntaxKind::EnumKeyword
                | SyntaxKind::ExportKeyword
                | SyntaxKind::ExtendsKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::FunctionKeyword
                | SyntaxKind::IfKeyword
                | SyntaxKind::ImplementsKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::LetKeyword
                | SyntaxKind::NewKeyword
                | SyntaxKind::NullKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::PublicKeyword
                | SyntaxKind::ReturnKeyword
                | SyntaxKind::StaticKeyword
                | SyntaxKind::ThisKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::VarKeyword
                | SyntaxKind::VoidKeyword
                | SyntaxKind::WhileKeyword
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::NumericLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::ThisExpression
                | SyntaxKind::BooleanLiteral
                | SyntaxKind::NullLiteral
                | SyntaxKind::ArrayLiteralExpression
                | SyntaxKind::ObjectLiteralExpression
                | SyntaxKind::FunctionExpression
                | SyntaxKind::CallExpression
                | SyntaxKind::NewExpression
                | SyntaxKind::PropertyAccessExpression
                | SyntaxKind::ElementAccessExpression
                | SyntaxKind::BinaryExpression
                | SyntaxKind::PrefixUnaryExpression
                | SyntaxKind::TypeAssertionExpression
                | SyntaxKind::ParenthesizedExpression
        )
    }

    pub fn is_type_node(self) -> bool {
        matches!(
            self,
            SyntaxKind::KeywordType
                | SyntaxKind::TypeReference
                | SyntaxKind::ArrayType
                | SyntaxKind::TupleType
                | SyntaxKind::TypeLiteral
                | SyntaxKind::FunctionType
        )
    }

    /// Function-like nodes share `NodeData::Function`.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::FunctionDeclaration
                | SyntaxKind::FunctionExpression
                | SyntaxKind::MethodDeclaration
                | SyntaxKind::MethodSignature
                | SyntaxKind::Constructor
                | SyntaxKind::CallSignature
                | SyntaxKind::ConstructSignature
        )
    }
}

/// Map reserved word text to its keyword kind.
pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    Some(match text {
        "class" => SyntaxKind::ClassKeyword,
        "const" => SyntaxKind::ConstKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "enum" => SyntaxKind::EnumKeyword,
        "export" => SyntaxKind::ExportKeyword,
        "extends" => SyntaxKind::ExtendsKeyword,
        "false" => SyntaxKind::FalseKeyword,
        "function" => SyntaxKind::FunctionKeyword,
        "if" => SyntaxKind::IfKeyword,
        "implements" => SyntaxKind::ImplementsKeyword,
        "interface" => SyntaxKind::InterfaceKeyword,
        "let" => SyntaxKind::LetKeyword,
        "new" => SyntaxKind::NewKeyword,
        "null" => SyntaxKind::NullKeyword,
        "private" => SyntaxKind::PrivateKeyword,
        "public" => SyntaxKind::PublicKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "static" => SyntaxKind::StaticKeyword,
        "this" => SyntaxKind::ThisKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "var" => SyntaxKind::VarKeyword,
        "void" => SyntaxKind::VoidKeyword,
        "while" => SyntaxKind::WhileKeyword,
        _ => return None,
    })
}

/// Source text of a punctuation or keyword token, for "'x' expected." messages.
pub fn token_to_text(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::OpenBraceToken => "{",
        SyntaxKind::CloseBraceToken => "}",
        SyntaxKind::OpenParenToken => "(",
        SyntaxKind::CloseParenToken => ")",
        SyntaxKind::OpenBracketToken => "[",
        SyntaxKind::CloseBracketToken => "]",
        SyntaxKind::DotToken => ".",
        SyntaxKind::DotDotDotToken => "...",
        SyntaxKind::SemicolonToken => ";",
        SyntaxKind::CommaToken => ",",
        SyntaxKind::LessThanToken => "<",
        SyntaxKind::GreaterThanToken => ">",
        SyntaxKind::LessThanEqualsToken => "<=",
        SyntaxKind::GreaterThanEqualsToken => ">=",
        SyntaxKind::EqualsEqualsToken => "==",
        SyntaxKind::ExclamationEqualsToken => "!=",
        SyntaxKind::EqualsEqualsEqualsToken => "===",
        SyntaxKind::ExclamationEqualsEqualsToken => "!==",
        SyntaxKind::EqualsGreaterThanToken => "=>",
        SyntaxKind::PlusToken => "+",
        SyntaxKind::MinusToken => "-",
        SyntaxKind::AsteriskToken => "*",
        SyntaxKind::SlashToken => "/",
        SyntaxKind::PercentToken => "%",
        SyntaxKind::ExclamationToken => "!",
        SyntaxKind::AmpersandAmpersandToken => "&&",
        SyntaxKind::BarBarToken => "||",
        SyntaxKind::QuestionToken => "?",
        SyntaxKind::ColonToken => ":",
        SyntaxKind::EqualsToken => "=",
        SyntaxKind::ClassKeyword => "class",
        SyntaxKind::ConstKeyword => "const",
        SyntaxKind::ElseKeyword => "else",
        SyntaxKind::EnumKeyword => "enum",
        SyntaxKind::ExportKeyword => "export",
        SyntaxKind::ExtendsKeyword => "extends",
        SyntaxKind::FalseKeyword => "false",
        SyntaxKind::FunctionKeyword => "function",
        SyntaxKind::IfKeyword => "if",
        SyntaxKind::ImplementsKeyword => "implements",
        SyntaxKind::InterfaceKeyword => "interface",
        SyntaxKind::LetKeyword => "let",
        SyntaxKind::NewKeyword => "new",
        SyntaxKind::NullKeyword => "null",
        SyntaxKind::PrivateKeyword => "private",
        SyntaxKind::PublicKeyword => "public",
        SyntaxKind::ReturnKeyword => "return",
        SyntaxKind::StaticKeyword => "static",
        SyntaxKind::ThisKeyword => "this",
        SyntaxKind::TrueKeyword => "true",
        SyntaxKind::VarKeyword => "var",
        SyntaxKind::VoidKeyword => "void",
        SyntaxKind::WhileKeyword => "while",
        SyntaxKind::Identifier => "identifier",
        _ => "token",
    }
}
