//! Built-in diagnostic message table.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const IDENTIFIER_EXPECTED: u32 = 1003;
    pub const TOKEN_EXPECTED: u32 = 1005;
    pub const EXPRESSION_EXPECTED: u32 = 1109;
    pub const TYPE_EXPECTED: u32 = 1110;
    pub const DECLARATION_OR_STATEMENT_EXPECTED: u32 = 1128;
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1002;
    pub const INVALID_CHARACTER: u32 = 1127;
    pub const DUPLICATE_IDENTIFIER: u32 = 2300;
    pub const CANNOT_FIND_NAME: u32 = 2304;
    pub const GENERIC_TYPE_REQUIRES_TYPE_ARGUMENTS: u32 = 2314;
    pub const TYPE_NOT_ASSIGNABLE: u32 = 2322;
    pub const PROPERTY_DOES_NOT_EXIST: u32 = 2339;
    pub const ARGUMENT_NOT_ASSIGNABLE: u32 = 2345;
    pub const SUPPLIED_PARAMETERS_DO_NOT_MATCH: u32 = 2346;
    pub const EXPRESSION_NOT_CALLABLE: u32 = 2349;
    pub const EXPRESSION_NOT_NEWABLE: u32 = 2351;
    pub const TYPE_ASSERTION_INCOMPATIBLE: u32 = 2352;
    pub const FUNCTION_MUST_RETURN_A_VALUE: u32 = 2355;
    pub const CLASS_INCORRECTLY_EXTENDS: u32 = 2415;
    pub const CLASS_INCORRECTLY_IMPLEMENTS: u32 = 2420;
    pub const TUPLE_WIDTH_MISMATCH: u32 = 2493;
    pub const TYPE_RECURSIVELY_REFERENCES_ITSELF_AS_BASE: u32 = 2506;
    pub const IMPLICIT_ANY_SELF_REFERENCE: u32 = 7022;
    pub const CANNOT_READ_FILE: u32 = 5012;
    pub const ANY_FLOWS_INTO_TYPED_POSITION: u32 = 9001;
}

pub mod diagnostic_messages {
    pub const IDENTIFIER_EXPECTED: &str = "Identifier expected.";
    pub const TOKEN_EXPECTED: &str = "'{0}' expected.";
    pub const EXPRESSION_EXPECTED: &str = "Expression expected.";
    pub const TYPE_EXPECTED: &str = "Type expected.";
    pub const DECLARATION_OR_STATEMENT_EXPECTED: &str = "Declaration or statement expected.";
    pub const UNTERMINATED_STRING_LITERAL: &str = "Unterminated string literal.";
    pub const INVALID_CHARACTER: &str = "Invalid character.";
    pub const DUPLICATE_IDENTIFIER: &str = "Duplicate identifier '{0}'.";
    pub const CANNOT_FIND_NAME: &str = "Cannot find name '{0}'.";
    pub const GENERIC_TYPE_REQUIRES_TYPE_ARGUMENTS: &str =
        "Generic type '{0}' requires {1} type argument(s).";
    pub const TYPE_NOT_ASSIGNABLE: &str = "Type '{0}' is not assignable to type '{1}'.";
    pub const PROPERTY_DOES_NOT_EXIST: &str = "Property '{0}' does not exist on type '{1}'.";
    pub const ARGUMENT_NOT_ASSIGNABLE: &str =
        "Argument of type '{0}' is not assignable to parameter of type '{1}'.";
    pub const SUPPLIED_PARAMETERS_DO_NOT_MATCH: &str =
        "Supplied parameters do not match any signature of call target.";
    pub const EXPRESSION_NOT_CALLABLE: &str = "This expression is not callable. Type '{0}' has no call signatures.";
    pub const EXPRESSION_NOT_NEWABLE: &str =
        "Cannot use 'new' with an expression whose type lacks a construct signature.";
    pub const TYPE_ASSERTION_INCOMPATIBLE: &str =
        "Conversion of type '{0}' to type '{1}' may be a mistake.";
    pub const FUNCTION_MUST_RETURN_A_VALUE: &str =
        "A function whose declared type is neither 'void' nor 'any' must return a value.";
    pub const CLASS_INCORRECTLY_EXTENDS: &str =
        "Class '{0}' incorrectly extends base class '{1}'.";
    pub const CLASS_INCORRECTLY_IMPLEMENTS: &str =
        "Class '{0}' incorrectly implements interface '{1}'.";
    pub const TUPLE_WIDTH_MISMATCH: &str =
        "Tuple type '{0}' of length '{1}' is not assignable to tuple type '{2}'.";
    pub const TYPE_RECURSIVELY_REFERENCES_ITSELF_AS_BASE: &str =
        "'{0}' is referenced directly or indirectly in its own base expression.";
    pub const IMPLICIT_ANY_SELF_REFERENCE: &str = "'{0}' implicitly has type 'any' because it does not have a type annotation and is referenced directly or indirectly in its own initializer.";
    pub const CANNOT_READ_FILE: &str = "Cannot read file '{0}': {1}.";
    pub const ANY_FLOWS_INTO_TYPED_POSITION: &str =
        "Value of type 'any' flows into a position of type '{0}' and will be checked at run time.";
}

macro_rules! message {
    ($name:ident, $category:ident) => {
        DiagnosticMessage {
            code: diagnostic_codes::$name,
            category: DiagnosticCategory::$category,
            message: diagnostic_messages::$name,
        }
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    message!(UNTERMINATED_STRING_LITERAL, Error),
    message!(IDENTIFIER_EXPECTED, Error),
    message!(TOKEN_EXPECTED, Error),
    message!(EXPRESSION_EXPECTED, Error),
    message!(TYPE_EXPECTED, Error),
    message!(INVALID_CHARACTER, Error),
    message!(DECLARATION_OR_STATEMENT_EXPECTED, Error),
    message!(DUPLICATE_IDENTIFIER, Error),
    message!(CANNOT_FIND_NAME, Error),
    message!(GENERIC_TYPE_REQUIRES_TYPE_ARGUMENTS, Error),
    message!(TYPE_NOT_ASSIGNABLE, Error),
    message!(PROPERTY_DOES_NOT_EXIST, Error),
    message!(ARGUMENT_NOT_ASSIGNABLE, Error),
    message!(SUPPLIED_PARAMETERS_DO_NOT_MATCH, Error),
    message!(EXPRESSION_NOT_CALLABLE, Error),
    message!(EXPRESSION_NOT_NEWABLE, Error),
    message!(TYPE_ASSERTION_INCOMPATIBLE, Error),
    message!(FUNCTION_MUST_RETURN_A_VALUE, Error),
    message!(CLASS_INCORRECTLY_EXTENDS, Error),
    message!(CLASS_INCORRECTLY_IMPLEMENTS, Error),
    message!(TUPLE_WIDTH_MISMATCH, Error),
    message!(TYPE_RECURSIVELY_REFERENCES_ITSELF_AS_BASE, Error),
    message!(CANNOT_READ_FILE, Error),
    message!(IMPLICIT_ANY_SELF_REFERENCE, Error),
    message!(ANY_FLOWS_INTO_TYPED_POSITION, Warning),
];
