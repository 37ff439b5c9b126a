//! Type display for diagnostics.

use crate::intern::TypeInterner;
use crate::subtype::TypeResolver;
use crate::types::{ObjectShape, ParamInfo, SignatureShape, TupleShape, TypeId, TypeKey};
use std::fmt::Write;
use sts_binder::SymbolId;

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    resolver: Option<&'a dyn TypeResolver>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        TypeFormatter {
            interner,
            resolver: None,
        }
    }

    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a dyn TypeResolver) -> Self {
        TypeFormatter {
            interner,
            resolver: Some(resolver),
        }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    pub fn format_signature(&self, signature: &SignatureShape) -> String {
        let mut out = String::new();
        self.write_signature(&mut out, signature, " => ");
        out
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        match self.resolver {
            Some(resolver) => resolver.symbol_name(symbol),
            None => format!("symbol#{}", symbol.0),
        }
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        let Some(key) = self.interner.lookup(ty) else {
            out.push_str("error");
            return;
        };
        match key.as_ref() {
            TypeKey::Intrinsic(kind) => out.push_str(kind.name()),
            TypeKey::Array(element) => {
                let needs_parens = self.interner.function_signature(*element).is_some();
                if needs_parens {
                    out.push('(');
                }
                self.write_type(out, *element);
                if needs_parens {
                    out.push(')');
                }
                out.push_str("[]");
            }
            TypeKey::Tuple(shape) => self.write_tuple(out, shape),
            TypeKey::Object(shape) => self.write_object(out, shape),
            TypeKey::Ref(symbol) | TypeKey::TypeParameter(symbol) => {
                out.push_str(&self.symbol_name(*symbol));
            }
            TypeKey::Application { base, args } => {
                out.push_str(&self.symbol_name(*base));
                out.push('<');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, *arg);
                }
                out.push('>');
            }
            TypeKey::ClassConstructor(symbol) | TypeKey::Namespace(symbol) => {
                out.push_str("typeof ");
                out.push_str(&self.symbol_name(*symbol));
            }
        }
    }

    /// `[number, ...string, boolean]`: the element after `...` starts the
    /// repeating tail.
    fn write_tuple(&self, out: &mut String, shape: &TupleShape) {
        out.push('[');
        for (i, element) in shape.elements.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if i == shape.rest_start() && !shape.is_fixed() {
                out.push_str("...");
            }
            self.write_type(out, *element);
        }
        out.push(']');
    }

    fn write_object(&self, out: &mut String, shape: &ObjectShape) {
        if shape.call_signatures.len() == 1
            && shape.properties.is_empty()
            && shape.construct_signatures.is_empty()
            && shape.string_index.is_none()
            && shape.number_index.is_none()
        {
            self.write_signature(out, &shape.call_signatures[0], " => ");
            return;
        }
        if shape.is_empty() {
            out.push_str("{}");
            return;
        }

        let mut members: Vec<String> = Vec::new();
        for signature in &shape.call_signatures {
            let mut member = String::new();
            self.write_signature(&mut member, signature, ": ");
            members.push(member);
        }
        for signature in &shape.construct_signatures {
            let mut member = String::from("new ");
            self.write_signature(&mut member, signature, ": ");
            members.push(member);
        }
        if let Some(index) = shape.string_index {
            members.push(format!("[key: string]: {}", self.format(index)));
        }
        if let Some(index) = shape.number_index {
            members.push(format!("[index: number]: {}", self.format(index)));
        }
        for prop in &shape.properties {
            let optional = if prop.optional { "?" } else { "" };
            let method = prop
                .is_method
                .then(|| self.interner.function_signature(prop.type_id))
                .flatten();
            match method {
                Some(signature) => {
                    let mut member = format!("{}{optional}", prop.name);
                    self.write_signature(&mut member, &signature, ": ");
                    members.push(member);
                }
                None => members.push(format!("{}{optional}: {}", prop.name, self.format(prop.type_id))),
            }
        }
        let _ = write!(out, "{{ {} }}", members.join("; "));
    }

    fn write_signature(&self, out: &mut String, signature: &SignatureShape, arrow: &str) {
        if !signature.type_params.is_empty() {
            out.push('<');
            for (i, param) in signature.type_params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&self.symbol_name(*param));
            }
            out.push('>');
        }
        out.push('(');
        for (i, param) in signature.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_param(out, param);
        }
        out.push(')');
        out.push_str(arrow);
        self.write_type(out, signature.return_type);
    }

    fn write_param(&self, out: &mut String, param: &ParamInfo) {
        if param.rest {
            out.push_str("...");
        }
        out.push_str(&param.name);
        if param.optional {
            out.push('?');
        }
        out.push_str(": ");
        self.write_type(out, param.type_id);
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
