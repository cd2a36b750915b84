//! A dynamic, shareable object graph that can be browsed
//!
//! `Value` models the kind of data an interactive session holds: scalars,
//! text, lists, tuples, sets, dicts, user objects with fields and computed
//! properties, and functions. Container variants are reference counted and
//! interior-mutable, so the same value can be changed by the program while
//! a tree holds a handle to it, and graphs may contain cycles.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::error::InspectError;
use crate::inspect::{Inspect, SortKey};

/// Getter of a computed property
pub type Getter = Rc<dyn Fn(&Object) -> Result<Value, InspectError>>;

/// Item source of an object that behaves like a sequence
pub type ItemsFn = Rc<dyn Fn(&Object) -> Result<Vec<Value>, InspectError>>;

/// Width under which containers are pretty printed on one line
const PRETTY_WIDTH: usize = 72;

/// A dynamically typed value
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<[Value]>),
    Set(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<Dict>),
    Object(Rc<Object>),
    Function(Rc<Function>),
}

/// A mapping from keys to values
pub struct Dict {
    ordered: bool,
    entries: RefCell<Vec<(Value, Value)>>,
}

/// An instance of a user-defined class
pub struct Object {
    class_name: String,
    doc: Option<String>,
    fields: RefCell<Vec<(String, Value)>>,
    properties: Vec<(String, Getter)>,
    methods: Vec<Rc<Function>>,
    items: Option<ItemsFn>,
}

/// A callable
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    doc: Option<String>,
    source: Option<String>,
    builtin: bool,
}

impl Value {
    pub fn str(text: impl Into<String>) -> Value {
        Value::Str(Rc::from(text.into()))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(Rc::from(data.into()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::from(items))
    }

    /// A set of the given items; duplicates are dropped
    pub fn set(items: Vec<Value>) -> Value {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|u| u.same_key(&item)) {
                unique.push(item);
            }
        }
        Value::Set(Rc::new(RefCell::new(unique)))
    }

    /// A dict whose entries are shown sorted by key
    pub fn dict(entries: Vec<(Value, Value)>) -> Value {
        Value::Dict(Rc::new(Dict::from_entries(false, entries)))
    }

    /// A dict whose entries are shown in insertion order
    pub fn ordered_dict(entries: Vec<(Value, Value)>) -> Value {
        Value::Dict(Rc::new(Dict::from_entries(true, entries)))
    }

    pub fn object(object: Object) -> Value {
        Value::Object(Rc::new(object))
    }

    pub fn function(function: Function) -> Value {
        Value::Function(Rc::new(function))
    }

    pub fn as_list(&self) -> Option<&RefCell<Vec<Value>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Append to a list
    pub fn push(&self, item: Value) -> Result<(), InspectError> {
        match self {
            Value::List(items) => {
                items.borrow_mut().push(item);
                Ok(())
            }
            _ => Err(self.unsupported("append")),
        }
    }

    /// Add to a set; returns false if an equal element was already present
    pub fn add(&self, item: Value) -> Result<bool, InspectError> {
        match self {
            Value::Set(items) => {
                let mut items = items.borrow_mut();
                if items.iter().any(|u| u.same_key(&item)) {
                    return Ok(false);
                }
                items.push(item);
                Ok(true)
            }
            _ => Err(self.unsupported("add")),
        }
    }

    /// True if both values are interchangeable as dict keys or set elements
    pub fn same_key(&self, other: &Value) -> bool {
        if let (Value::None, Value::None) = (self, other) {
            return true;
        }
        match (self.sort_key(), other.sort_key()) {
            (Some(a), Some(b)) => a.try_cmp(&b) == Some(Ordering::Equal),
            _ => matches!((self.identity(), other.identity()), (Some(a), Some(b)) if a == b),
        }
    }

    fn builtin_methods(&self) -> &'static [&'static str] {
        match self {
            Value::Str(_) => &["__len__", "lower", "split", "upper"],
            Value::Bytes(_) => &["__len__", "decode"],
            Value::List(_) => &["__len__", "append", "pop", "sort"],
            Value::Tuple(_) => &["__len__", "count", "index"],
            Value::Set(_) => &["__len__", "add", "discard"],
            Value::Dict(_) => &["__len__", "get", "items", "keys", "values"],
            _ => &[],
        }
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<usize>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::Str(s) => quote_str(s, out),
            Value::Bytes(b) => quote_bytes(b, out),
            Value::List(items) => {
                guarded(addr(items), seen, out, "[...]", |out, seen| {
                    write_items("[", "]", &items.borrow(), out, seen)
                });
            }
            Value::Tuple(items) => {
                if items.len() == 1 {
                    out.push('(');
                    items[0].write_repr(out, seen);
                    out.push_str(",)");
                } else {
                    write_items("(", ")", items, out, seen);
                }
            }
            Value::Set(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    out.push_str("set()");
                } else {
                    write_items("{", "}", &items, out, seen);
                }
            }
            Value::Dict(dict) => {
                guarded(addr(dict), seen, out, "{...}", |out, seen| {
                    out.push('{');
                    for (i, (key, value)) in dict.entries.borrow().iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        key.write_repr(out, seen);
                        out.push_str(": ");
                        value.write_repr(out, seen);
                    }
                    out.push('}');
                });
            }
            Value::Object(object) => {
                out.push_str(&format!(
                    "<{} object at 0x{:x}>",
                    object.class_name,
                    addr(object)
                ));
            }
            Value::Function(function) => {
                let kind = if function.builtin {
                    "built-in method"
                } else {
                    "function"
                };
                out.push_str(&format!("<{} {}>", kind, function.name));
            }
        }
    }

    fn write_pretty(&self, out: &mut String, indent: usize, seen: &mut Vec<usize>) {
        let mut flat = String::new();
        self.write_repr(&mut flat, &mut seen.clone());
        if flat.len() + indent <= PRETTY_WIDTH {
            out.push_str(&flat);
            return;
        }

        let pad = " ".repeat(indent + 4);
        match self {
            Value::List(items) => {
                guarded(addr(items), seen, out, "[...]", |out, seen| {
                    out.push_str("[\n");
                    for item in items.borrow().iter() {
                        out.push_str(&pad);
                        item.write_pretty(out, indent + 4, seen);
                        out.push_str(",\n");
                    }
                    out.push_str(&" ".repeat(indent));
                    out.push(']');
                });
            }
            Value::Tuple(items) => {
                out.push_str("(\n");
                for item in items.iter() {
                    out.push_str(&pad);
                    item.write_pretty(out, indent + 4, seen);
                    out.push_str(",\n");
                }
                out.push_str(&" ".repeat(indent));
                out.push(')');
            }
            Value::Dict(dict) => {
                guarded(addr(dict), seen, out, "{...}", |out, seen| {
                    out.push_str("{\n");
                    for (key, value) in dict.entries.borrow().iter() {
                        out.push_str(&pad);
                        key.write_repr(out, seen);
                        out.push_str(": ");
                        value.write_pretty(out, indent + 4, seen);
                        out.push_str(",\n");
                    }
                    out.push_str(&" ".repeat(indent));
                    out.push('}');
                });
            }
            _ => out.push_str(&flat),
        }
    }
}

fn write_items(open: &str, close: &str, items: &[Value], out: &mut String, seen: &mut Vec<usize>) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, seen);
    }
    out.push_str(close);
}

/// Run `write` unless the container at `address` is already being written
fn guarded(
    address: usize,
    seen: &mut Vec<usize>,
    out: &mut String,
    placeholder: &str,
    write: impl FnOnce(&mut String, &mut Vec<usize>),
) {
    if seen.contains(&address) {
        out.push_str(placeholder);
        return;
    }
    seen.push(address);
    write(out, seen);
    seen.pop();
}

fn addr<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{f:?}")
    }
}

fn quote_str(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn quote_bytes(bytes: &[u8], out: &mut String) {
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
}

fn builtin_doc(type_name: &str) -> Option<&'static str> {
    let doc = match type_name {
        "NoneType" => "The type of the None singleton.",
        "bool" => "Returns True when the argument is true, False otherwise.",
        "int" => "A 64-bit signed integer.",
        "float" => "A double precision floating point number.",
        "str" => "An immutable sequence of Unicode code points.",
        "bytes" => "An immutable sequence of bytes.",
        "list" => "A mutable sequence of values.",
        "tuple" => "An immutable sequence of values.",
        "set" => "An unordered collection of unique elements.",
        "dict" | "OrderedDict" => "A mapping from keys to values.",
        _ => return None,
    };
    Some(doc)
}

impl Dict {
    fn from_entries(ordered: bool, entries: Vec<(Value, Value)>) -> Self {
        let dict = Dict {
            ordered,
            entries: RefCell::new(Vec::with_capacity(entries.len())),
        };
        for (key, value) in entries {
            dict.insert(key, value);
        }
        dict
    }

    /// Insert or overwrite; returns the previous value for the key
    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| k.same_key(&key)) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .borrow()
            .iter()
            .find(|(k, _)| k.same_key(key))
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        let mut entries = self.entries.borrow_mut();
        let index = entries.iter().position(|(k, _)| k.same_key(key))?;
        Some(entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// A snapshot of the entries in insertion order
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.borrow().clone()
    }
}

impl Object {
    pub fn new(class_name: impl Into<String>) -> Self {
        Object {
            class_name: class_name.into(),
            doc: None,
            fields: RefCell::new(Vec::new()),
            properties: Vec::new(),
            methods: Vec::new(),
            items: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_field(self, name: impl Into<String>, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    /// Add a computed attribute. The getter runs every time it is read.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&Object) -> Result<Value, InspectError> + 'static,
    ) -> Self {
        self.properties.push((name.into(), Rc::new(getter)));
        self
    }

    pub fn with_method(mut self, method: Function) -> Self {
        self.methods.push(Rc::new(method));
        self
    }

    /// Make the object indexable like a sequence
    pub fn with_items(
        mut self,
        items: impl Fn(&Object) -> Result<Vec<Value>, InspectError> + 'static,
    ) -> Self {
        self.items = Some(Rc::new(items));
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Set a field, replacing any previous value
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name, value)),
        }
    }

    pub fn remove_field(&self, name: &str) -> Option<Value> {
        let mut fields = self.fields.borrow_mut();
        let index = fields.iter().position(|(n, _)| n == name)?;
        Some(fields.remove(index).1)
    }
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            doc: None,
            source: None,
            builtin: false,
        }
    }

    fn builtin(type_name: &str, method: &str) -> Self {
        Function {
            name: format!("{type_name}.{method}"),
            doc: None,
            source: None,
            builtin: true,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Inspect for Value {
    fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(dict) if dict.ordered => "OrderedDict",
            Value::Dict(_) => "dict",
            Value::Object(object) => return object.class_name.clone(),
            Value::Function(f) if f.builtin => "builtin_function_or_method",
            Value::Function(_) => "function",
        }
        .to_string()
    }

    fn is_sequence(&self) -> bool {
        match self {
            Value::List(_) | Value::Tuple(_) => true,
            Value::Object(object) => object.items.is_some(),
            _ => false,
        }
    }

    fn sequence_items(&self) -> Result<Vec<Value>, InspectError> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            Value::Object(object) => match &object.items {
                Some(items) => items(object),
                None => Err(self.unsupported("sequence iteration")),
            },
            _ => Err(self.unsupported("sequence iteration")),
        }
    }

    fn is_set(&self) -> bool {
        matches!(self, Value::Set(_))
    }

    fn set_items(&self) -> Result<Vec<Value>, InspectError> {
        match self {
            Value::Set(items) => Ok(items.borrow().clone()),
            _ => Err(self.unsupported("set iteration")),
        }
    }

    fn is_mapping(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    fn preserves_insertion_order(&self) -> bool {
        matches!(self, Value::Dict(dict) if dict.ordered)
    }

    fn mapping_entries(&self) -> Result<Vec<(Value, Value)>, InspectError> {
        match self {
            Value::Dict(dict) => Ok(dict.entries()),
            _ => Err(self.unsupported("mapping iteration")),
        }
    }

    fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = vec!["__class__".into(), "__doc__".into()];
        names.extend(self.builtin_methods().iter().map(|m| m.to_string()));
        match self {
            Value::Int(_) | Value::Float(_) => {
                names.push("imag".into());
                names.push("real".into());
            }
            Value::Object(object) => {
                names.push("__dict__".into());
                names.extend(object.fields.borrow().iter().map(|(n, _)| n.clone()));
                names.extend(object.properties.iter().map(|(n, _)| n.clone()));
                names.extend(object.methods.iter().map(|m| m.name.clone()));
            }
            Value::Function(_) => names.push("__name__".into()),
            _ => {}
        }
        names
    }

    fn attribute(&self, name: &str) -> Result<Value, InspectError> {
        match name {
            "__class__" => return Ok(Value::str(self.type_name())),
            "__doc__" => return Ok(self.doc().map(Value::str).unwrap_or(Value::None)),
            _ => {}
        }
        if self.builtin_methods().contains(&name) {
            return Ok(Value::function(Function::builtin(&self.type_name(), name)));
        }
        match (self, name) {
            (Value::Int(i), "real") => Ok(Value::Int(*i)),
            (Value::Int(_), "imag") => Ok(Value::Int(0)),
            (Value::Float(f), "real") => Ok(Value::Float(*f)),
            (Value::Float(_), "imag") => Ok(Value::Float(0.0)),
            (Value::Function(f), "__name__") => Ok(Value::str(f.name.clone())),
            (Value::Object(object), "__dict__") => Ok(Value::ordered_dict(
                object
                    .fields
                    .borrow()
                    .iter()
                    .map(|(n, v)| (Value::str(n.clone()), v.clone()))
                    .collect(),
            )),
            (Value::Object(object), _) => {
                if let Some(value) = object.field(name) {
                    return Ok(value);
                }
                if let Some((_, getter)) = object.properties.iter().find(|(n, _)| n == name) {
                    return getter(object);
                }
                object
                    .methods
                    .iter()
                    .find(|m| m.name == name)
                    .map(|m| Value::Function(m.clone()))
                    .ok_or_else(|| InspectError::NoSuchAttribute(name.to_string()))
            }
            _ => Err(InspectError::NoSuchAttribute(name.to_string())),
        }
    }

    fn to_text(&self) -> Result<String, InspectError> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            _ => self.repr(),
        }
    }

    fn repr(&self) -> Result<String, InspectError> {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        Ok(out)
    }

    fn pretty(&self) -> Result<String, InspectError> {
        let mut out = String::new();
        self.write_pretty(&mut out, 0, &mut Vec::new());
        Ok(out)
    }

    fn doc(&self) -> Option<String> {
        match self {
            Value::Object(object) => object.doc.clone(),
            Value::Function(f) => f.doc.clone(),
            _ => builtin_doc(&self.type_name()).map(str::to_string),
        }
    }

    fn source(&self) -> Option<String> {
        match self {
            Value::Function(f) => f.source.clone(),
            _ => None,
        }
    }

    fn length(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) | Value::Set(items) => Some(items.borrow().len()),
            Value::Tuple(items) => Some(items.len()),
            Value::Dict(dict) => Some(dict.len()),
            _ => None,
        }
    }

    fn identity(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(addr(s)),
            Value::Bytes(b) => Some(addr(b)),
            Value::List(items) | Value::Set(items) => Some(addr(items)),
            Value::Tuple(items) => Some(addr(items)),
            Value::Dict(dict) => Some(addr(dict)),
            Value::Object(object) => Some(addr(object)),
            Value::Function(f) => Some(addr(f)),
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) => None,
        }
    }

    fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    fn is_routine(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    fn sort_key(&self) -> Option<SortKey> {
        match self {
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            Value::Int(i) => Some(SortKey::Int(*i)),
            Value::Float(f) => Some(SortKey::Float(*f)),
            Value::Str(s) => Some(SortKey::Text(s.to_string())),
            Value::Bytes(b) => Some(SortKey::Bytes(b.to_vec())),
            Value::Tuple(items) => items
                .iter()
                .map(Inspect::sort_key)
                .collect::<Option<Vec<_>>>()
                .map(SortKey::Tuple),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        f.write_str(&out)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
