//! Recursive-descent parser.
//!
//! `ParserState` drives a `Scanner` and builds nodes into a `NodeArena`.
//! Errors never abort the parse: a diagnostic is recorded (at most one per
//! source position, so a single mistake does not cascade) and the parser
//! resynchronises at the next statement or member boundary.

use sts_common::diagnostics::diagnostic_codes;
use sts_common::{Diagnostic, LineMap, Span};
use tracing::{debug, trace};

use crate::node::{ModifierFlags, Node, NodeArena, NodeData, NodeIndex, NodeList};
use crate::scanner::{Scanner, ScannerState};
use crate::syntax_kind::{SyntaxKind, token_to_text};

/// Result of parsing one file.
#[derive(Debug)]
pub struct ParsedFile {
    pub file_name: String,
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub diagnostics: Vec<Diagnostic>,
    pub line_map: LineMap,
}

impl ParsedFile {
    /// Parse `source` as `file_name`.
    pub fn parse(file_name: &str, source: &str) -> ParsedFile {
        ParserState::new(file_name.to_string(), source).parse_source_file()
    }
}

/// Keyword type names that scan as identifiers.
const KEYWORD_TYPE_NAMES: &[&str] = &["any", "number", "string", "boolean", "undefined"];

pub struct ParserState<'a> {
    file_name: String,
    source: &'a str,
    scanner: Scanner<'a>,
    arena: NodeArena,
    diagnostics: Vec<Diagnostic>,
    /// End offset of the last consumed token.
    last_end: u32,
    /// Start offset of the last reported error, to suppress cascades.
    last_error_pos: Option<u32>,
}

struct Snapshot {
    scanner: ScannerState,
    last_end: u32,
    arena_len: usize,
    diagnostics_len: usize,
    last_error_pos: Option<u32>,
}

impl<'a> ParserState<'a> {
    pub fn new(file_name: String, source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        scanner.scan();
        ParserState {
            file_name,
            source,
            scanner,
            arena: NodeArena::new(),
            diagnostics: Vec::new(),
            last_end: 0,
            last_error_pos: None,
        }
    }

    /// Parse the whole file.
    pub fn parse_source_file(mut self) -> ParsedFile {
        let _span = tracing::debug_span!("parse_source_file", file = %self.file_name).entered();

        let mut statements = Vec::new();
        while self.token() != SyntaxKind::EndOfFileToken {
            let before = self.scanner.token_start();
            let stmt = self.parse_statement();
            if stmt.is_some() {
                statements.push(stmt);
            }
            if self.scanner.token_start() == before && self.token() != SyntaxKind::EndOfFileToken {
                // No progress: drop the offending token.
                self.next();
            }
        }

        let end = self.source.len() as u32;
        let root = self.arena.add(Node {
            kind: SyntaxKind::SourceFile,
            pos: 0,
            end,
            flags: ModifierFlags::empty(),
            data: NodeData::SourceFile {
                file_name: self.file_name.clone(),
                statements: NodeList::new(statements),
            },
        });

        for error in self.scanner.take_errors() {
            self.diagnostics
                .push(Diagnostic::error(&self.file_name, error.span, error.code, Vec::new()));
        }
        self.diagnostics.sort_by_key(|d| d.span.start);

        debug!(
            nodes = self.arena.len(),
            diagnostics = self.diagnostics.len(),
            "parsed"
        );

        ParsedFile {
            line_map: LineMap::build(self.source),
            file_name: self.file_name,
            arena: self.arena,
            root,
            diagnostics: self.diagnostics,
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    #[inline]
    fn token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    fn token_text(&self) -> &str {
        self.scanner.token_value()
    }

    fn is_contextual(&self, text: &str) -> bool {
        self.token() == SyntaxKind::Identifier && self.scanner.token_value() == text
    }

    fn next(&mut self) -> SyntaxKind {
        self.last_end = self.scanner.token_end();
        self.scanner.scan()
    }

    fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.token() == kind {
            self.next();
            true
        } else {
            false
        }
    }

    fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_at_token(
            diagnostic_codes::TOKEN_EXPECTED,
            vec![token_to_text(kind).to_string()],
        );
        false
    }

    /// `;` is optional before `}`, end of file, or a line break.
    fn parse_semicolon(&mut self) {
        if self.parse_optional(SyntaxKind::SemicolonToken) {
            return;
        }
        if matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) || self.scanner.has_preceding_line_break()
        {
            return;
        }
        self.parse_expected(SyntaxKind::SemicolonToken);
    }

    fn error_at_token(&mut self, code: u32, args: Vec<String>) {
        let span = self.scanner.token_span();
        self.error_at(span, code, args);
    }

    fn error_at(&mut self, span: Span, code: u32, args: Vec<String>) {
        if self.last_error_pos == Some(span.start) {
            return;
        }
        self.last_error_pos = Some(span.start);
        trace!(code, pos = span.start, "syntax error");
        self.diagnostics
            .push(Diagnostic::error(&self.file_name, span, code, args));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            scanner: self.scanner.save(),
            last_end: self.last_end,
            arena_len: self.arena.len(),
            diagnostics_len: self.diagnostics.len(),
            last_error_pos: self.last_error_pos,
        }
    }

    fn rewind(&mut self, snapshot: Snapshot) {
        self.scanner.restore(snapshot.scanner);
        self.last_end = snapshot.last_end;
        self.arena.nodes.truncate(snapshot.arena_len);
        self.diagnostics.truncate(snapshot.diagnostics_len);
        self.last_error_pos = snapshot.last_error_pos;
    }

    /// Run `f` speculatively and rewind afterwards.
    fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.snapshot();
        let result = f(self);
        self.rewind(snapshot);
        result
    }

    fn finish(&mut self, kind: SyntaxKind, pos: u32, flags: ModifierFlags, data: NodeData) -> NodeIndex {
        let end = self.last_end.max(pos);
        self.arena.add(Node {
            kind,
            pos,
            end,
            flags,
            data,
        })
    }

    // =========================================================================
    // Names
    // =========================================================================

    fn parse_identifier(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        if self.token() == SyntaxKind::Identifier {
            let text = self.token_text().to_string();
            self.next();
            return self.finish(
                SyntaxKind::Identifier,
                pos,
                ModifierFlags::empty(),
                NodeData::Identifier { text },
            );
        }
        self.error_at_token(diagnostic_codes::IDENTIFIER_EXPECTED, Vec::new());
        self.arena.add(Node {
            kind: SyntaxKind::Identifier,
            pos,
            end: pos,
            flags: ModifierFlags::empty(),
            data: NodeData::Identifier {
                text: String::new(),
            },
        })
    }

    /// Property names may be identifiers, reserved words, or string/numeric
    /// literals. String-literal names set `QUOTED_NAME` on the returned flags.
    fn parse_property_name(&mut self) -> (NodeIndex, ModifierFlags) {
        let pos = self.scanner.token_start();
        match self.token() {
            SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => {
                let quoted = self.token() == SyntaxKind::StringLiteral;
                let text = self.token_text().to_string();
                self.next();
                let kind = if quoted {
                    SyntaxKind::StringLiteral
                } else {
                    SyntaxKind::NumericLiteral
                };
                let name = self.finish(kind, pos, ModifierFlags::empty(), NodeData::Literal { text });
                let flags = if quoted {
                    ModifierFlags::QUOTED_NAME
                } else {
                    ModifierFlags::empty()
                };
                (name, flags)
            }
            kind if kind.is_keyword() => {
                let text = token_to_text(kind).to_string();
                self.next();
                let name = self.finish(
                    SyntaxKind::Identifier,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::Identifier { text },
                );
                (name, ModifierFlags::empty())
            }
            _ => (self.parse_identifier(), ModifierFlags::empty()),
        }
    }

    fn parse_entity_name(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let mut name = self.parse_identifier();
        while self.token() == SyntaxKind::DotToken {
            self.next();
            let right = self.parse_identifier();
            name = self.finish(
                SyntaxKind::QualifiedName,
                pos,
                ModifierFlags::empty(),
                NodeData::QualifiedName { left: name, right },
            );
        }
        name
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn is_declaration_start(&mut self) -> bool {
        match self.token() {
            SyntaxKind::VarKeyword
            | SyntaxKind::LetKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::FunctionKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::InterfaceKeyword
            | SyntaxKind::EnumKeyword => true,
            SyntaxKind::Identifier => self.is_module_start(),
            _ => false,
        }
    }

    fn is_module_start(&mut self) -> bool {
        if !(self.is_contextual("module") || self.is_contextual("namespace")) {
            return false;
        }
        self.look_ahead(|p| {
            p.next();
            p.token() == SyntaxKind::Identifier && !p.scanner.has_preceding_line_break()
        })
    }

    /// `export` and `declare` prefixes.
    fn parse_declaration_modifiers(&mut self) -> ModifierFlags {
        let mut flags = ModifierFlags::empty();
        loop {
            if self.token() == SyntaxKind::ExportKeyword {
                flags |= ModifierFlags::EXPORT;
                self.next();
            } else if self.is_contextual("declare")
                && self.look_ahead(|p| {
                    p.next();
                    !p.scanner.has_preceding_line_break() && p.is_declaration_start()
                })
            {
                flags |= ModifierFlags::DECLARE;
                self.next();
            } else {
                return flags;
            }
        }
    }

    fn parse_statement(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let modifiers = self.parse_declaration_modifiers();

        match self.token() {
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_statement(pos, modifiers)
            }
            SyntaxKind::FunctionKeyword => self.parse_function_declaration(pos, modifiers),
            SyntaxKind::ClassKeyword => self.parse_class_declaration(pos, modifiers),
            SyntaxKind::InterfaceKeyword => self.parse_interface_declaration(pos, modifiers),
            SyntaxKind::EnumKeyword => self.parse_enum_declaration(pos, modifiers),
            SyntaxKind::Identifier if self.is_module_start() => {
                self.parse_module_declaration(pos, modifiers)
            }
            _ if !modifiers.is_empty() => {
                self.error_at_token(diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED, Vec::new());
                NodeIndex::NONE
            }
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::SemicolonToken => {
                self.next();
                self.finish(
                    SyntaxKind::EmptyStatement,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::None,
                )
            }
            _ if self.is_start_of_expression() => {
                let expression = self.parse_expression();
                self.parse_semicolon();
                self.finish(
                    SyntaxKind::ExpressionStatement,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::ExpressionStatement { expression },
                )
            }
            _ => {
                self.error_at_token(diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED, Vec::new());
                NodeIndex::NONE
            }
        }
    }

    fn parse_block(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let statements = self.parse_statement_list();
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(
            SyntaxKind::Block,
            pos,
            ModifierFlags::empty(),
            NodeData::Block { statements },
        )
    }

    /// Statements up to (not including) `}` or end of file.
    fn parse_statement_list(&mut self) -> NodeList {
        let mut statements = Vec::new();
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            let before = self.scanner.token_start();
            let stmt = self.parse_statement();
            if stmt.is_some() {
                statements.push(stmt);
            }
            if self.scanner.token_start() == before {
                self.next();
            }
        }
        NodeList::new(statements)
    }

    fn parse_variable_statement(&mut self, pos: u32, mut flags: ModifierFlags) -> NodeIndex {
        match self.token() {
            SyntaxKind::ConstKeyword => flags |= ModifierFlags::CONST,
            SyntaxKind::LetKeyword => flags |= ModifierFlags::LET,
            _ => {}
        }
        self.next();

        let mut declarations = Vec::new();
        loop {
            let decl_pos = self.scanner.token_start();
            let name = self.parse_identifier();
            let type_annotation = self.parse_type_annotation();
            let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
                self.parse_assignment_expression()
            } else {
                NodeIndex::NONE
            };
            declarations.push(self.finish(
                SyntaxKind::VariableDeclaration,
                decl_pos,
                flags,
                NodeData::Variable {
                    name,
                    type_annotation,
                    initializer,
                },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_semicolon();

        self.finish(
            SyntaxKind::VariableStatement,
            pos,
            flags,
            NodeData::VariableStatement {
                declarations: NodeList::new(declarations),
            },
        )
    }

    fn parse_type_annotation(&mut self) -> NodeIndex {
        if self.parse_optional(SyntaxKind::ColonToken) {
            self.parse_type()
        } else {
            NodeIndex::NONE
        }
    }

    fn parse_function_declaration(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.parse_expected(SyntaxKind::FunctionKeyword);
        let name = self.parse_identifier();
        self.parse_function_rest(SyntaxKind::FunctionDeclaration, pos, flags, name, true)
    }

    /// Type parameters, parameters, return type and optional body.
    fn parse_function_rest(
        &mut self,
        kind: SyntaxKind,
        pos: u32,
        flags: ModifierFlags,
        name: NodeIndex,
        allow_body: bool,
    ) -> NodeIndex {
        let type_params = self.parse_type_parameters();
        let params = self.parse_parameter_list();
        let return_type = self.parse_type_annotation();
        let body = if allow_body && self.token() == SyntaxKind::OpenBraceToken {
            self.parse_block()
        } else {
            if kind != SyntaxKind::FunctionExpression {
                self.parse_semicolon();
            } else {
                self.parse_expected(SyntaxKind::OpenBraceToken);
            }
            NodeIndex::NONE
        };
        self.finish(
            kind,
            pos,
            flags,
            NodeData::Function {
                name,
                type_params,
                params,
                return_type,
                body,
            },
        )
    }

    fn parse_type_parameters(&mut self) -> NodeList {
        let mut params = Vec::new();
        if !self.parse_optional(SyntaxKind::LessThanToken) {
            return NodeList::default();
        }
        loop {
            let pos = self.scanner.token_start();
            let name = self.parse_identifier();
            let constraint = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
                self.parse_type()
            } else {
                NodeIndex::NONE
            };
            params.push(self.finish(
                SyntaxKind::TypeParameter,
                pos,
                ModifierFlags::empty(),
                NodeData::TypeParameter { name, constraint },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThanToken);
        NodeList::new(params)
    }

    fn parse_parameter_list(&mut self) -> NodeList {
        let mut params = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenParenToken) {
            return NodeList::default();
        }
        while !matches!(
            self.token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            params.push(self.parse_parameter());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        NodeList::new(params)
    }

    fn parse_parameter(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let mut flags = ModifierFlags::empty();
        loop {
            match self.token() {
                SyntaxKind::PublicKeyword => flags |= ModifierFlags::PUBLIC,
                SyntaxKind::PrivateKeyword => flags |= ModifierFlags::PRIVATE,
                _ => break,
            }
            self.next();
        }
        if self.parse_optional(SyntaxKind::DotDotDotToken) {
            flags |= ModifierFlags::REST;
        }
        let name = self.parse_identifier();
        if self.parse_optional(SyntaxKind::QuestionToken) {
            flags |= ModifierFlags::OPTIONAL;
        }
        let type_annotation = self.parse_type_annotation();
        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            flags |= ModifierFlags::OPTIONAL;
            self.parse_assignment_expression()
        } else {
            NodeIndex::NONE
        };
        self.finish(
            SyntaxKind::Parameter,
            pos,
            flags,
            NodeData::Parameter {
                name,
                type_annotation,
                initializer,
            },
        )
    }

    fn parse_class_declaration(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.parse_expected(SyntaxKind::ClassKeyword);
        let name = self.parse_identifier();
        let type_params = self.parse_type_parameters();
        let extends = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            self.parse_type_reference()
        } else {
            NodeIndex::NONE
        };
        let mut implements = Vec::new();
        if self.parse_optional(SyntaxKind::ImplementsKeyword) {
            loop {
                implements.push(self.parse_type_reference());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }

        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut members = Vec::new();
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            let before = self.scanner.token_start();
            if self.parse_optional(SyntaxKind::SemicolonToken) {
                continue;
            }
            let member = self.parse_class_member();
            if member.is_some() {
                members.push(member);
            }
            if self.scanner.token_start() == before {
                self.next();
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);

        self.finish(
            SyntaxKind::ClassDeclaration,
            pos,
            flags,
            NodeData::Class {
                name,
                type_params,
                extends,
                implements: NodeList::new(implements),
                members: NodeList::new(members),
            },
        )
    }

    /// A modifier keyword used as a member name (`static: number`) is a name.
    fn is_member_modifier(&mut self) -> bool {
        if !matches!(
            self.token(),
            SyntaxKind::PublicKeyword | SyntaxKind::PrivateKeyword | SyntaxKind::StaticKeyword
        ) {
            return false;
        }
        self.look_ahead(|p| {
            p.next();
            !matches!(
                p.token(),
                SyntaxKind::OpenParenToken
                    | SyntaxKind::ColonToken
                    | SyntaxKind::SemicolonToken
                    | SyntaxKind::EqualsToken
                    | SyntaxKind::QuestionToken
            )
        })
    }

    fn parse_class_member(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let mut flags = ModifierFlags::empty();
        while self.is_member_modifier() {
            flags |= match self.token() {
                SyntaxKind::PublicKeyword => ModifierFlags::PUBLIC,
                SyntaxKind::PrivateKeyword => ModifierFlags::PRIVATE,
                _ => ModifierFlags::STATIC,
            };
            self.next();
        }

        if self.token() == SyntaxKind::OpenBracketToken {
            return self.parse_index_signature(pos, flags);
        }

        if self.is_contextual("constructor")
            && self.look_ahead(|p| {
                p.next();
                p.token() == SyntaxKind::OpenParenToken
            })
        {
            self.next();
            return self.parse_function_rest(
                SyntaxKind::Constructor,
                pos,
                flags,
                NodeIndex::NONE,
                true,
            );
        }

        let (name, name_flags) = self.parse_property_name();
        flags |= name_flags;
        if self.parse_optional(SyntaxKind::QuestionToken) {
            flags |= ModifierFlags::OPTIONAL;
        }

        if matches!(
            self.token(),
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
        ) {
            return self.parse_function_rest(SyntaxKind::MethodDeclaration, pos, flags, name, true);
        }

        let type_annotation = self.parse_type_annotation();
        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            self.parse_assignment_expression()
        } else {
            NodeIndex::NONE
        };
        self.parse_semicolon();
        self.finish(
            SyntaxKind::PropertyDeclaration,
            pos,
            flags,
            NodeData::Variable {
                name,
                type_annotation,
                initializer,
            },
        )
    }

    fn parse_index_signature(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.parse_expected(SyntaxKind::OpenBracketToken);
        let param_pos = self.scanner.token_start();
        let param_name = self.parse_identifier();
        let key_type = self.parse_type_annotation();
        let parameter = self.finish(
            SyntaxKind::Parameter,
            param_pos,
            ModifierFlags::empty(),
            NodeData::Parameter {
                name: param_name,
                type_annotation: key_type,
                initializer: NodeIndex::NONE,
            },
        );
        self.parse_expected(SyntaxKind::CloseBracketToken);
        let value_type = self.parse_type_annotation();
        self.parse_type_member_separator();
        self.finish(
            SyntaxKind::IndexSignature,
            pos,
            flags,
            NodeData::IndexSignature {
                parameter,
                key_type,
                value_type,
            },
        )
    }

    fn parse_interface_declaration(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.parse_expected(SyntaxKind::InterfaceKeyword);
        let name = self.parse_identifier();
        let type_params = self.parse_type_parameters();
        let mut extends = Vec::new();
        if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            loop {
                extends.push(self.parse_type_reference());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        let members = self.parse_type_members();
        self.finish(
            SyntaxKind::InterfaceDeclaration,
            pos,
            flags,
            NodeData::Interface {
                name,
                type_params,
                extends: NodeList::new(extends),
                members,
            },
        )
    }

    /// `{ member; member, ... }` shared by interfaces and type literals.
    fn parse_type_members(&mut self) -> NodeList {
        let mut members = Vec::new();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            let before = self.scanner.token_start();
            let member = self.parse_type_member();
            if member.is_some() {
                members.push(member);
            }
            if self.scanner.token_start() == before {
                self.next();
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        NodeList::new(members)
    }

    fn parse_type_member_separator(&mut self) {
        if !self.parse_optional(SyntaxKind::SemicolonToken) {
            self.parse_optional(SyntaxKind::CommaToken);
        }
    }

    fn parse_type_member(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        match self.token() {
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken => {
                let sig = self.parse_function_rest(
                    SyntaxKind::CallSignature,
                    pos,
                    ModifierFlags::empty(),
                    NodeIndex::NONE,
                    false,
                );
                self.parse_type_member_separator();
                return sig;
            }
            SyntaxKind::NewKeyword
                if self.look_ahead(|p| {
                    p.next();
                    matches!(
                        p.token(),
                        SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
                    )
                }) =>
            {
                self.next();
                let sig = self.parse_function_rest(
                    SyntaxKind::ConstructSignature,
                    pos,
                    ModifierFlags::empty(),
                    NodeIndex::NONE,
                    false,
                );
                self.parse_type_member_separator();
                return sig;
            }
            SyntaxKind::OpenBracketToken => {
                return self.parse_index_signature(pos, ModifierFlags::empty());
            }
            _ => {}
        }

        let (name, mut flags) = self.parse_property_name();
        if self.parse_optional(SyntaxKind::QuestionToken) {
            flags |= ModifierFlags::OPTIONAL;
        }
        if matches!(
            self.token(),
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
        ) {
            let sig = self.parse_function_rest(SyntaxKind::MethodSignature, pos, flags, name, false);
            self.parse_type_member_separator();
            return sig;
        }
        let type_annotation = self.parse_type_annotation();
        self.parse_type_member_separator();
        self.finish(
            SyntaxKind::PropertySignature,
            pos,
            flags,
            NodeData::Variable {
                name,
                type_annotation,
                initializer: NodeIndex::NONE,
            },
        )
    }

    fn parse_enum_declaration(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.parse_expected(SyntaxKind::EnumKeyword);
        let name = self.parse_identifier();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut members = Vec::new();
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            let member_pos = self.scanner.token_start();
            let (member_name, member_flags) = self.parse_property_name();
            let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
                self.parse_assignment_expression()
            } else {
                NodeIndex::NONE
            };
            members.push(self.finish(
                SyntaxKind::EnumMember,
                member_pos,
                member_flags,
                NodeData::EnumMember {
                    name: member_name,
                    initializer,
                },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(
            SyntaxKind::EnumDeclaration,
            pos,
            flags,
            NodeData::Enum {
                name,
                members: NodeList::new(members),
            },
        )
    }

    /// `module A.B { ... }` is sugar for `module A { export module B { ... } }`.
    fn parse_module_declaration(&mut self, pos: u32, flags: ModifierFlags) -> NodeIndex {
        self.next();
        let mut names = vec![self.parse_identifier()];
        while self.parse_optional(SyntaxKind::DotToken) {
            names.push(self.parse_identifier());
        }
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut body = self.parse_statement_list();
        self.parse_expected(SyntaxKind::CloseBraceToken);

        let inner_flags = (flags & ModifierFlags::DECLARE) | ModifierFlags::EXPORT;
        let mut module = NodeIndex::NONE;
        for (depth, name) in names.iter().enumerate().rev() {
            let module_flags = if depth == 0 { flags } else { inner_flags };
            let name_pos = self.arena.span(*name).start;
            let module_pos = if depth == 0 { pos } else { name_pos };
            module = self.finish(
                SyntaxKind::ModuleDeclaration,
                module_pos,
                module_flags,
                NodeData::Module { name: *name, body },
            );
            body = NodeList::new(vec![module]);
        }
        module
    }

    fn parse_return_statement(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.next();
        let expression = if matches!(
            self.token(),
            SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) || self.scanner.has_preceding_line_break()
        {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_semicolon();
        self.finish(
            SyntaxKind::ReturnStatement,
            pos,
            ModifierFlags::empty(),
            NodeData::Return { expression },
        )
    }

    fn parse_if_statement(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.next();
        self.parse_expected(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParenToken);
        let then_statement = self.parse_statement();
        let else_statement = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statement()
        } else {
            NodeIndex::NONE
        };
        self.finish(
            SyntaxKind::IfStatement,
            pos,
            ModifierFlags::empty(),
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            },
        )
    }

    fn parse_while_statement(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.next();
        self.parse_expected(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();
        self.finish(
            SyntaxKind::WhileStatement,
            pos,
            ModifierFlags::empty(),
            NodeData::While { condition, body },
        )
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn is_start_of_expression(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::Identifier
                | SyntaxKind::NumericLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::NullKeyword
                | SyntaxKind::ThisKeyword
                | SyntaxKind::NewKeyword
                | SyntaxKind::FunctionKeyword
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken
                | SyntaxKind::OpenBraceToken
                | SyntaxKind::ExclamationToken
                | SyntaxKind::MinusToken
                | SyntaxKind::PlusToken
                | SyntaxKind::LessThanToken
        )
    }

    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let left = self.parse_binary_expression(0);
        if self.token() == SyntaxKind::EqualsToken {
            self.next();
            let right = self.parse_assignment_expression();
            return self.finish(
                SyntaxKind::BinaryExpression,
                pos,
                ModifierFlags::empty(),
                NodeData::Binary {
                    left,
                    operator: SyntaxKind::EqualsToken,
                    right,
                },
            );
        }
        left
    }

    fn binary_precedence(kind: SyntaxKind) -> u8 {
        match kind {
            SyntaxKind::BarBarToken => 1,
            SyntaxKind::AmpersandAmpersandToken => 2,
            SyntaxKind::EqualsEqualsToken
            | SyntaxKind::ExclamationEqualsToken
            | SyntaxKind::EqualsEqualsEqualsToken
            | SyntaxKind::ExclamationEqualsEqualsToken => 3,
            SyntaxKind::LessThanToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::LessThanEqualsToken
            | SyntaxKind::GreaterThanEqualsToken => 4,
            SyntaxKind::PlusToken | SyntaxKind::MinusToken => 5,
            SyntaxKind::AsteriskToken | SyntaxKind::SlashToken | SyntaxKind::PercentToken => 6,
            _ => 0,
        }
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let pos = self.scanner.token_start();
        let mut left = self.parse_unary_expression();
        loop {
            let operator = self.token();
            let precedence = Self::binary_precedence(operator);
            if precedence == 0 || precedence <= min_precedence {
                return left;
            }
            self.next();
            let right = self.parse_binary_expression(precedence);
            left = self.finish(
                SyntaxKind::BinaryExpression,
                pos,
                ModifierFlags::empty(),
                NodeData::Binary {
                    left,
                    operator,
                    right,
                },
            );
        }
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        match self.token() {
            SyntaxKind::ExclamationToken | SyntaxKind::MinusToken | SyntaxKind::PlusToken => {
                let operator = self.token();
                self.next();
                let operand = self.parse_unary_expression();
                self.finish(
                    SyntaxKind::PrefixUnaryExpression,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::PrefixUnary { operator, operand },
                )
            }
            SyntaxKind::LessThanToken => {
                self.next();
                let type_node = self.parse_type();
                self.parse_expected(SyntaxKind::GreaterThanToken);
                let expression = self.parse_unary_expression();
                self.finish(
                    SyntaxKind::TypeAssertionExpression,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::TypeAssertion {
                        type_node,
                        expression,
                    },
                )
            }
            _ => self.parse_left_hand_side_expression(),
        }
    }

    fn parse_left_hand_side_expression(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let expression = if self.token() == SyntaxKind::NewKeyword {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        self.parse_member_and_call_suffixes(pos, expression, true)
    }

    fn parse_member_and_call_suffixes(
        &mut self,
        pos: u32,
        mut expression: NodeIndex,
        allow_calls: bool,
    ) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::DotToken => {
                    self.next();
                    let (name, _) = self.parse_property_name();
                    expression = self.finish(
                        SyntaxKind::PropertyAccessExpression,
                        pos,
                        ModifierFlags::empty(),
                        NodeData::PropertyAccess { expression, name },
                    );
                }
                SyntaxKind::OpenBracketToken => {
                    self.next();
                    let argument = self.parse_expression();
                    self.parse_expected(SyntaxKind::CloseBracketToken);
                    expression = self.finish(
                        SyntaxKind::ElementAccessExpression,
                        pos,
                        ModifierFlags::empty(),
                        NodeData::ElementAccess {
                            expression,
                            argument,
                        },
                    );
                }
                SyntaxKind::OpenParenToken if allow_calls => {
                    let arguments = self.parse_argument_list();
                    expression = self.finish(
                        SyntaxKind::CallExpression,
                        pos,
                        ModifierFlags::empty(),
                        NodeData::Call {
                            callee: expression,
                            arguments,
                        },
                    );
                }
                _ => return expression,
            }
        }
    }

    fn parse_new_expression(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.next();
        let callee_pos = self.scanner.token_start();
        let primary = if self.token() == SyntaxKind::NewKeyword {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        let callee = self.parse_member_and_call_suffixes(callee_pos, primary, false);
        let arguments = if self.token() == SyntaxKind::OpenParenToken {
            self.parse_argument_list()
        } else {
            NodeList::default()
        };
        self.finish(
            SyntaxKind::NewExpression,
            pos,
            ModifierFlags::empty(),
            NodeData::Call { callee, arguments },
        )
    }

    fn parse_argument_list(&mut self) -> NodeList {
        let mut arguments = Vec::new();
        self.parse_expected(SyntaxKind::OpenParenToken);
        while !matches!(
            self.token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            arguments.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        NodeList::new(arguments)
    }

    fn parse_primary_expression(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        match self.token() {
            SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral => {
                let kind = self.token();
                let text = self.token_text().to_string();
                self.next();
                self.finish(kind, pos, ModifierFlags::empty(), NodeData::Literal { text })
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.token() == SyntaxKind::TrueKeyword;
                self.next();
                self.finish(
                    SyntaxKind::BooleanLiteral,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::BooleanLiteral { value },
                )
            }
            SyntaxKind::NullKeyword => {
                self.next();
                self.finish(
                    SyntaxKind::NullLiteral,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::None,
                )
            }
            SyntaxKind::ThisKeyword => {
                self.next();
                self.finish(
                    SyntaxKind::ThisExpression,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::None,
                )
            }
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::OpenParenToken => {
                self.next();
                let expression = self.parse_expression();
                self.parse_expected(SyntaxKind::CloseParenToken);
                self.finish(
                    SyntaxKind::ParenthesizedExpression,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::Parenthesized { expression },
                )
            }
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => {
                self.next();
                let name = if self.token() == SyntaxKind::Identifier {
                    self.parse_identifier()
                } else {
                    NodeIndex::NONE
                };
                self.parse_function_rest(
                    SyntaxKind::FunctionExpression,
                    pos,
                    ModifierFlags::empty(),
                    name,
                    true,
                )
            }
            _ => {
                self.error_at_token(diagnostic_codes::EXPRESSION_EXPECTED, Vec::new());
                self.arena.add(Node {
                    kind: SyntaxKind::Identifier,
                    pos,
                    end: pos,
                    flags: ModifierFlags::empty(),
                    data: NodeData::Identifier {
                        text: String::new(),
                    },
                })
            }
        }
    }

    fn parse_array_literal(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.parse_expected(SyntaxKind::OpenBracketToken);
        let mut elements = Vec::new();
        while !matches!(
            self.token(),
            SyntaxKind::CloseBracketToken | SyntaxKind::EndOfFileToken
        ) {
            elements.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken);
        self.finish(
            SyntaxKind::ArrayLiteralExpression,
            pos,
            ModifierFlags::empty(),
            NodeData::ArrayLiteral {
                elements: NodeList::new(elements),
            },
        )
    }

    fn parse_object_literal(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut properties = Vec::new();
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            let prop_pos = self.scanner.token_start();
            let (name, flags) = self.parse_property_name();
            let initializer = if self.token() == SyntaxKind::OpenParenToken {
                // Method shorthand `m(a) { ... }`
                self.parse_function_rest(
                    SyntaxKind::FunctionExpression,
                    prop_pos,
                    ModifierFlags::empty(),
                    NodeIndex::NONE,
                    true,
                )
            } else {
                self.parse_expected(SyntaxKind::ColonToken);
                self.parse_assignment_expression()
            };
            properties.push(self.finish(
                SyntaxKind::PropertyAssignment,
                prop_pos,
                flags,
                NodeData::PropertyAssignment { name, initializer },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish(
            SyntaxKind::ObjectLiteralExpression,
            pos,
            ModifierFlags::empty(),
            NodeData::ObjectLiteral {
                properties: NodeList::new(properties),
            },
        )
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub(crate) fn parse_type(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        if self.token() == SyntaxKind::OpenParenToken && self.is_start_of_function_type() {
            let params = self.parse_parameter_list();
            self.parse_expected(SyntaxKind::EqualsGreaterThanToken);
            let return_type = self.parse_type();
            return self.finish(
                SyntaxKind::FunctionType,
                pos,
                ModifierFlags::empty(),
                NodeData::FunctionType {
                    params,
                    return_type,
                },
            );
        }

        let mut ty = self.parse_primary_type();
        while self.token() == SyntaxKind::OpenBracketToken
            && self.look_ahead(|p| {
                p.next();
                p.token() == SyntaxKind::CloseBracketToken
            })
        {
            self.next();
            self.next();
            ty = self.finish(
                SyntaxKind::ArrayType,
                pos,
                ModifierFlags::empty(),
                NodeData::ArrayType { element: ty },
            );
        }
        ty
    }

    fn is_start_of_function_type(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next();
            match p.token() {
                SyntaxKind::CloseParenToken | SyntaxKind::DotDotDotToken => true,
                SyntaxKind::Identifier | SyntaxKind::PublicKeyword | SyntaxKind::PrivateKeyword => {
                    p.next();
                    match p.token() {
                        SyntaxKind::ColonToken
                        | SyntaxKind::CommaToken
                        | SyntaxKind::QuestionToken
                        | SyntaxKind::EqualsToken => true,
                        SyntaxKind::CloseParenToken => {
                            p.next();
                            p.token() == SyntaxKind::EqualsGreaterThanToken
                        }
                        _ => false,
                    }
                }
                _ => false,
            }
        })
    }

    fn parse_type_reference(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        let name = self.parse_entity_name();
        let mut type_args = Vec::new();
        if self.token() == SyntaxKind::LessThanToken {
            self.next();
            loop {
                type_args.push(self.parse_type());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::GreaterThanToken);
        }
        self.finish(
            SyntaxKind::TypeReference,
            pos,
            ModifierFlags::empty(),
            NodeData::TypeReference {
                name,
                type_args: NodeList::new(type_args),
            },
        )
    }

    fn parse_primary_type(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        match self.token() {
            SyntaxKind::Identifier if KEYWORD_TYPE_NAMES.contains(&self.token_text()) => {
                let keyword = self.token_text().to_string();
                self.next();
                self.finish(
                    SyntaxKind::KeywordType,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::KeywordType { keyword },
                )
            }
            SyntaxKind::VoidKeyword | SyntaxKind::NullKeyword => {
                let keyword = token_to_text(self.token()).to_string();
                self.next();
                self.finish(
                    SyntaxKind::KeywordType,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::KeywordType { keyword },
                )
            }
            SyntaxKind::Identifier => self.parse_type_reference(),
            SyntaxKind::OpenBracketToken => self.parse_tuple_type(),
            SyntaxKind::OpenBraceToken => {
                let members = self.parse_type_members();
                self.finish(
                    SyntaxKind::TypeLiteral,
                    pos,
                    ModifierFlags::empty(),
                    NodeData::TypeLiteral { members },
                )
            }
            SyntaxKind::OpenParenToken => {
                self.next();
                let ty = self.parse_type();
                self.parse_expected(SyntaxKind::CloseParenToken);
                ty
            }
            _ => {
                self.error_at_token(diagnostic_codes::TYPE_EXPECTED, Vec::new());
                self.arena.add(Node {
                    kind: SyntaxKind::KeywordType,
                    pos,
                    end: pos,
                    flags: ModifierFlags::empty(),
                    data: NodeData::KeywordType {
                        keyword: "any".to_string(),
                    },
                })
            }
        }
    }

    /// `[A, B, ...C, D]`; the element after `...` starts the repeating tail.
    fn parse_tuple_type(&mut self) -> NodeIndex {
        let pos = self.scanner.token_start();
        self.parse_expected(SyntaxKind::OpenBracketToken);
        let mut elements = Vec::new();
        let mut rest_start = None;
        while !matches!(
            self.token(),
            SyntaxKind::CloseBracketToken | SyntaxKind::EndOfFileToken
        ) {
            if self.token() == SyntaxKind::DotDotDotToken {
                if rest_start.is_some() {
                    self.error_at_token(diagnostic_codes::TYPE_EXPECTED, Vec::new());
                } else {
                    rest_start = Some(elements.len() as u32);
                }
                self.next();
            }
            elements.push(self.parse_type());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken);
        self.finish(
            SyntaxKind::TupleType,
            pos,
            ModifierFlags::empty(),
            NodeData::TupleType {
                elements: NodeList::new(elements),
                rest_start,
            },
        )
    }
}
