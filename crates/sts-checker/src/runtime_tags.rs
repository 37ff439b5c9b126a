//! Runtime tag synthesis.
//!
//! The checker hands code generation two things per file: descriptors for
//! every class, interface and flagged tuple type, and an ordered list of tag
//! annotations saying which expressions need a runtime operation. Both are
//! plain serializable values. `RuntimeCall` renders them as calls into the
//! runtime library (`RT.registerType`, `RT.registerClass`, `RT.Tuple`,
//! `RT.checkAndTag`, `RT.shallowTag`).

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;
use sts_binder::{DeclId, DeclKind, FileId};
use sts_common::Span;
use sts_parser::NodeIndex;
use sts_solver::{ObjectShape, SignatureShape, TypeId, TypeKey, TypeResolver};
use tracing::trace;

use crate::state::CheckerState;
use crate::symbols::{Symbol, SymbolId, SymbolKind};

/// Which runtime operation a flagged position needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TagKind {
    /// Attach the descriptor without validating; the checker proved the value fits.
    Tag,
    /// Validate the value against the descriptor, then attach it.
    CheckAndTag,
}

/// Runtime representation of a static type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuntimeType {
    Any,
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
    /// A registered class or interface.
    Named { name: String },
    Array { element: Box<RuntimeType> },
    /// Index into the file's tuple descriptors.
    Tuple { index: usize },
    Object { fields: IndexMap<String, RuntimeType> },
    Function {
        params: Vec<RuntimeType>,
        #[serde(rename = "returnType")]
        return_type: Box<RuntimeType>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub params: Vec<RuntimeType>,
    pub return_type: RuntimeType,
    pub optional_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDescriptor {
    pub name: String,
    pub methods: IndexMap<String, MethodDescriptor>,
    pub fields: IndexMap<String, RuntimeType>,
    pub supers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    pub name: String,
    pub methods: IndexMap<String, MethodDescriptor>,
    pub fields: IndexMap<String, RuntimeType>,
    pub constructor: MethodDescriptor,
    pub supers: Vec<String>,
    pub statics: IndexMap<String, RuntimeType>,
    /// Expression naming the generated constructor function.
    pub constructor_ref: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleDescriptor {
    pub elements: Vec<RuntimeType>,
    pub rest_start: usize,
}

/// One flagged expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAnnotation {
    pub node: NodeIndex,
    pub span: Span,
    pub kind: TagKind,
    /// Static type of the value, for messages raised at run time.
    pub source: RuntimeType,
    pub expected: RuntimeType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptors {
    pub interfaces: Vec<InterfaceDescriptor>,
    pub classes: Vec<ClassDescriptor>,
    pub tuples: Vec<TupleDescriptor>,
}

impl FileDescriptors {
    /// Index of `tuple`, added on first use.
    pub fn intern_tuple(&mut self, tuple: TupleDescriptor) -> usize {
        if let Some(index) = self.tuples.iter().position(|existing| *existing == tuple) {
            return index;
        }
        self.tuples.push(tuple);
        self.tuples.len() - 1
    }
}

/// Everything the emitter needs from one file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTags {
    /// In walk order.
    pub annotations: Vec<TagAnnotation>,
    pub descriptors: FileDescriptors,
}

impl FileTags {
    pub fn annotation_at(&self, node: NodeIndex) -> Option<&TagAnnotation> {
        self.annotations.iter().find(|a| a.node == node)
    }

    /// Registration calls for every descriptor, in declaration order.
    pub fn registrations(&self) -> Vec<String> {
        let interfaces = self
            .descriptors
            .interfaces
            .iter()
            .map(RuntimeCall::RegisterType);
        let classes = self
            .descriptors
            .classes
            .iter()
            .map(RuntimeCall::RegisterClass);
        interfaces
            .chain(classes)
            .map(|call| call.render(&self.descriptors))
            .collect()
    }
}

/// A call into the runtime library.
#[derive(Clone, Copy, Debug)]
pub enum RuntimeCall<'a> {
    RegisterType(&'a InterfaceDescriptor),
    RegisterClass(&'a ClassDescriptor),
    Tuple(&'a TupleDescriptor),
    /// `value` is the emitted text of the flagged expression.
    Annotate {
        value: &'a str,
        annotation: &'a TagAnnotation,
    },
}

impl RuntimeCall<'_> {
    pub fn render(&self, descriptors: &FileDescriptors) -> String {
        match self {
            RuntimeCall::RegisterType(interface) => format!(
                "RT.registerType({}, {}, {}, {})",
                quote(&interface.name),
                render_methods(&interface.methods, descriptors),
                render_fields(&interface.fields, descriptors),
                render_names(&interface.supers),
            ),
            RuntimeCall::RegisterClass(class) => format!(
                "RT.registerClass({}, {}, {}, {}, {}, {}, {})",
                quote(&class.name),
                render_methods(&class.methods, descriptors),
                render_fields(&class.fields, descriptors),
                render_method(&class.constructor, descriptors),
                render_names(&class.supers),
                render_fields(&class.statics, descriptors),
                class.constructor_ref,
            ),
            RuntimeCall::Tuple(tuple) => render_tuple(tuple, descriptors),
            RuntimeCall::Annotate { value, annotation } => match annotation.kind {
                TagKind::CheckAndTag => format!(
                    "RT.checkAndTag({value}, {}, {})",
                    render_type(&annotation.source, descriptors),
                    render_type(&annotation.expected, descriptors),
                ),
                TagKind::Tag => format!(
                    "RT.shallowTag({value}, {})",
                    render_type(&annotation.expected, descriptors),
                ),
            },
        }
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

pub fn render_type(ty: &RuntimeType, descriptors: &FileDescriptors) -> String {
    match ty {
        RuntimeType::Any => "RT.Any".to_string(),
        RuntimeType::Number => "RT.Num".to_string(),
        RuntimeType::String => "RT.Str".to_string(),
        RuntimeType::Boolean => "RT.Bool".to_string(),
        RuntimeType::Void => "RT.Void".to_string(),
        RuntimeType::Null => "RT.Null".to_string(),
        RuntimeType::Undefined => "RT.Undefined".to_string(),
        RuntimeType::Named { name } => format!("RT.getNamedType({})", quote(name)),
        RuntimeType::Array { element } => {
            format!("RT.ArrayType({})", render_type(element, descriptors))
        }
        RuntimeType::Tuple { index } => match descriptors.tuples.get(*index) {
            Some(tuple) => render_tuple(tuple, descriptors),
            None => "RT.Any".to_string(),
        },
        RuntimeType::Object { fields } => {
            format!("RT.StructuredType({})", render_fields(fields, descriptors))
        }
        RuntimeType::Function {
            params,
            return_type,
        } => {
            let params: Vec<String> = params.iter().map(|p| render_type(p, descriptors)).collect();
            format!(
                "RT.FunctionType([{}], {})",
                params.join(", "),
                render_type(return_type, descriptors)
            )
        }
    }
}

fn render_tuple(tuple: &TupleDescriptor, descriptors: &FileDescriptors) -> String {
    let elements: Vec<String> = tuple
        .elements
        .iter()
        .map(|element| render_type(element, descriptors))
        .collect();
    format!("RT.Tuple([{}], {})", elements.join(", "), tuple.rest_start)
}

fn render_fields(fields: &IndexMap<String, RuntimeType>, descriptors: &FileDescriptors) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{ ");
    for (i, (name, ty)) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: {}", quote(name), render_type(ty, descriptors));
    }
    out.push_str(" }");
    out
}

fn render_method(method: &MethodDescriptor, descriptors: &FileDescriptors) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| render_type(p, descriptors))
        .collect();
    format!(
        "RT.Method([{}], {}, {})",
        params.join(", "),
        render_type(&method.return_type, descriptors),
        method.optional_count
    )
}

fn render_methods(
    methods: &IndexMap<String, MethodDescriptor>,
    descriptors: &FileDescriptors,
) -> String {
    if methods.is_empty() {
        return "{}".to_string();
    }
    let entries: Vec<String> = methods
        .iter()
        .map(|(name, method)| format!("{}: {}", quote(name), render_method(method, descriptors)))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

fn render_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| quote(name)).collect();
    format!("[{}]", quoted.join(", "))
}

// =============================================================================
// Synthesis
// =============================================================================

impl<'a> CheckerState<'a> {
    /// Runtime form of `ty`. Tuple descriptors go into the current file.
    pub(crate) fn runtime_type(&mut self, ty: TypeId) -> RuntimeType {
        if !self.ctx.expr_depth.enter() {
            return RuntimeType::Any;
        }
        let result = self.runtime_type_inner(ty);
        self.ctx.expr_depth.leave();
        result
    }

    fn runtime_type_inner(&mut self, ty: TypeId) -> RuntimeType {
        match ty {
            TypeId::NUMBER => return RuntimeType::Number,
            TypeId::STRING => return RuntimeType::String,
            TypeId::BOOLEAN => return RuntimeType::Boolean,
            TypeId::VOID => return RuntimeType::Void,
            TypeId::NULL => return RuntimeType::Null,
            TypeId::UNDEFINED => return RuntimeType::Undefined,
            _ if ty.is_intrinsic() => return RuntimeType::Any,
            _ => {}
        }
        let Some(key) = self.ctx.types.lookup(ty) else {
            return RuntimeType::Any;
        };
        match key.as_ref() {
            TypeKey::Intrinsic(_) => RuntimeType::Any,
            TypeKey::Array(element) => RuntimeType::Array {
                element: Box::new(self.runtime_type(*element)),
            },
            TypeKey::Tuple(shape) => {
                let elements = shape
                    .elements
                    .iter()
                    .map(|&element| self.runtime_type(element))
                    .collect();
                let descriptor = TupleDescriptor {
                    elements,
                    rest_start: shape.rest_start(),
                };
                let index = self.file_tags_mut().descriptors.intern_tuple(descriptor);
                RuntimeType::Tuple { index }
            }
            TypeKey::Object(shape) => self.runtime_object(shape),
            TypeKey::Ref(symbol) if self.ctx.is_enum_type(ty) => {
                trace!(?symbol, "enum erases to number");
                RuntimeType::Number
            }
            TypeKey::Ref(_) | TypeKey::Application { .. } => RuntimeType::Named {
                name: self.format_type(ty),
            },
            TypeKey::TypeParameter(_) | TypeKey::ClassConstructor(_) | TypeKey::Namespace(_) => {
                RuntimeType::Any
            }
        }
    }

    fn runtime_object(&mut self, shape: &ObjectShape) -> RuntimeType {
        if shape.properties.is_empty()
            && let [signature] = shape.call_signatures.as_slice()
        {
            let method = self.method_descriptor(signature);
            return RuntimeType::Function {
                params: method.params,
                return_type: Box::new(method.return_type),
            };
        }
        let fields = shape
            .properties
            .iter()
            .map(|property| (property.name.clone(), self.runtime_type(property.type_id)))
            .collect();
        RuntimeType::Object { fields }
    }

    fn method_descriptor(&mut self, signature: &SignatureShape) -> MethodDescriptor {
        MethodDescriptor {
            params: signature
                .params
                .iter()
                .map(|param| self.runtime_type(param.type_id))
                .collect(),
            return_type: self.runtime_type(signature.return_type),
            optional_count: signature.optional_count(),
        }
    }

    /// Method descriptor of a function-typed member; a non-function member
    /// reads as `(...) => any`.
    fn member_method(&mut self, ty: TypeId) -> MethodDescriptor {
        let signature = self
            .ctx
            .types
            .lookup(ty)
            .and_then(|key| match key.as_ref() {
                TypeKey::Object(shape) => shape.call_signatures.first().cloned(),
                _ => None,
            });
        match signature {
            Some(signature) => self.method_descriptor(&signature),
            None => MethodDescriptor {
                params: Vec::new(),
                return_type: RuntimeType::Any,
                optional_count: 0,
            },
        }
    }

    fn split_members(
        &mut self,
        shape: &ObjectShape,
    ) -> (IndexMap<String, MethodDescriptor>, IndexMap<String, RuntimeType>) {
        let mut methods = IndexMap::new();
        let mut fields = IndexMap::new();
        for property in &shape.properties {
            if property.is_method {
                let method = self.member_method(property.type_id);
                methods.insert(property.name.clone(), method);
            } else {
                let ty = self.runtime_type(property.type_id);
                fields.insert(property.name.clone(), ty);
            }
        }
        (methods, fields)
    }

    pub(crate) fn file_tags_mut(&mut self) -> &mut FileTags {
        let file = self.ctx.current_file;
        self.tags_for(file)
    }

    fn tags_for(&mut self, file: FileId) -> &mut FileTags {
        self.ctx.tags.entry(file).or_default()
    }

    /// Flag `node` for a runtime operation converting `source` to `target`.
    pub(crate) fn record_tag(&mut self, node: NodeIndex, kind: TagKind, source: TypeId, target: TypeId) {
        if self.ctx.is_speculative() || !self.ctx.options.runtime_checks {
            return;
        }
        let span = self
            .current_arena()
            .map(|arena| arena.span(node))
            .unwrap_or_default();
        let source = self.runtime_type(source);
        let expected = self.runtime_type(target);
        trace!(?node, ?kind, "runtime tag");
        self.file_tags_mut().annotations.push(TagAnnotation {
            node,
            span,
            kind,
            source,
            expected,
        });
    }

    /// Descriptors for every class and interface first declared in `file`.
    /// Tuple descriptors they reference land in the same file.
    pub(crate) fn synthesize_descriptors(&mut self, file: FileId) {
        self.in_file(file, |state| state.synthesize_file_descriptors(file));
    }

    fn synthesize_file_descriptors(&mut self, file: FileId) {
        self.tags_for(file);
        let Some(tree) = self.registry().tree(file) else {
            return;
        };
        let decls: Vec<DeclId> = tree
            .ids()
            .filter(|&id| {
                tree.get(id)
                    .is_some_and(|decl| matches!(decl.kind, DeclKind::Class | DeclKind::Interface))
            })
            .collect();
        for decl_id in decls {
            let Some(symbol) = self.bind(decl_id) else {
                continue;
            };
            let first = self.ctx.symbols.get(symbol).and_then(Symbol::first_declaration);
            if first != Some(decl_id) {
                continue;
            }
            if self.ctx.symbols.get(symbol).is_some_and(Symbol::is_class) {
                if let Some(descriptor) = self.class_descriptor(symbol) {
                    self.tags_for(file).descriptors.classes.push(descriptor);
                }
            } else if let Some(descriptor) = self.interface_descriptor(symbol) {
                self.tags_for(file).descriptors.interfaces.push(descriptor);
            }
        }
    }

    fn super_names(&mut self, types: &[TypeId]) -> Vec<String> {
        types.iter().map(|&ty| self.format_type(ty)).collect()
    }

    fn interface_descriptor(&mut self, symbol: SymbolId) -> Option<InterfaceDescriptor> {
        let shape = self.interface_members(symbol)?;
        let extends = match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Interface(interface) => interface.extends.clone(),
            _ => return None,
        };
        let (methods, fields) = self.split_members(&shape);
        Some(InterfaceDescriptor {
            name: self.ctx.symbol_name(symbol),
            methods,
            fields,
            supers: self.super_names(&extends),
        })
    }

    fn class_descriptor(&mut self, symbol: SymbolId) -> Option<ClassDescriptor> {
        let members = self.class_members(symbol)?;
        let statics = self.class_statics(symbol)?;
        let mut supers = match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => class.base_type.into_iter().collect::<Vec<_>>(),
            _ => return None,
        };
        if let SymbolKind::Class(class) = &self.ctx.symbols.get(symbol)?.kind {
            supers.extend(class.implements.iter().copied());
        }
        let (methods, fields) = self.split_members(&members);
        let constructor = match statics.construct_signatures.first() {
            Some(signature) => self.method_descriptor(signature),
            None => MethodDescriptor {
                params: Vec::new(),
                return_type: RuntimeType::Any,
                optional_count: 0,
            },
        };
        let static_fields = statics
            .properties
            .iter()
            .map(|property| (property.name.clone(), self.runtime_type(property.type_id)))
            .collect();
        let name = self.ctx.symbol_name(symbol);
        Some(ClassDescriptor {
            constructor_ref: name.clone(),
            name,
            methods,
            fields,
            constructor,
            supers: self.super_names(&supers),
            statics: static_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors_with_tuple() -> FileDescriptors {
        let mut descriptors = FileDescriptors::default();
        descriptors.intern_tuple(TupleDescriptor {
            elements: vec![RuntimeType::Number, RuntimeType::String],
            rest_start: 1,
        });
        descriptors
    }

    #[test]
    fn tuple_descriptors_are_deduplicated() {
        let mut descriptors = descriptors_with_tuple();
        let again = descriptors.intern_tuple(TupleDescriptor {
            elements: vec![RuntimeType::Number, RuntimeType::String],
            rest_start: 1,
        });
        let other = descriptors.intern_tuple(TupleDescriptor {
            elements: vec![RuntimeType::Number, RuntimeType::String],
            rest_start: 2,
        });
        assert_eq!(again, 0);
        assert_eq!(other, 1);
        assert_eq!(descriptors.tuples.len(), 2);
    }

    #[test]
    fn renders_tag_calls() {
        let descriptors = descriptors_with_tuple();
        let annotation = TagAnnotation {
            node: NodeIndex(4),
            span: Span::default(),
            kind: TagKind::Tag,
            source: RuntimeType::Tuple { index: 0 },
            expected: RuntimeType::Tuple { index: 0 },
        };
        let call = RuntimeCall::Annotate {
            value: "[4]",
            annotation: &annotation,
        };
        assert_eq!(
            call.render(&descriptors),
            "RT.shallowTag([4], RT.Tuple([RT.Num, RT.Str], 1))"
        );

        let checked = TagAnnotation {
            kind: TagKind::CheckAndTag,
            source: RuntimeType::Any,
            expected: RuntimeType::Named {
                name: "Point".to_string(),
            },
            ..annotation
        };
        let call = RuntimeCall::Annotate {
            value: "p",
            annotation: &checked,
        };
        assert_eq!(
            call.render(&descriptors),
            "RT.checkAndTag(p, RT.Any, RT.getNamedType(\"Point\"))"
        );
    }

    #[test]
    fn renders_interface_registration() {
        let mut methods = IndexMap::new();
        methods.insert(
            "foo".to_string(),
            MethodDescriptor {
                params: vec![],
                return_type: RuntimeType::Void,
                optional_count: 0,
            },
        );
        let mut fields = IndexMap::new();
        fields.insert("bar".to_string(), RuntimeType::String);
        let interface = InterfaceDescriptor {
            name: "I".to_string(),
            methods,
            fields,
            supers: vec!["J".to_string()],
        };
        let rendered = RuntimeCall::RegisterType(&interface).render(&FileDescriptors::default());
        assert_eq!(
            rendered,
            "RT.registerType(\"I\", { \"foo\": RT.Method([], RT.Void, 0) }, { \"bar\": RT.Str }, [\"J\"])"
        );
    }

    #[test]
    fn runtime_types_serialize_with_kind_tags() {
        let ty = RuntimeType::Array {
            element: Box::new(RuntimeType::Named {
                name: "C".to_string(),
            }),
        };
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"array","element":{"kind":"named","name":"C"}}"#
        );
    }
}
