//! Core types for spark-thunk.
//!
//! These types define the data that flows between the diff/patch driver, the
//! lifecycle dispatcher and user components.
//!
//! Identity matters here. The diff gate skips work by comparing references,
//! so every shared value is `Rc`-backed and exposes its identity explicitly:
//! - [`Value::same`] - strict identity (scalars by value, shared data by pointer)
//! - [`Record::ptr_eq`] - identity of a props/context map
//! - [`VNode::ptr_eq`] - identity of a render output

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::local_action::LocalAction;

/// Ordered key/value map backing [`Record`] and [`Value::Map`].
pub type Map = BTreeMap<String, Value>;

/// Opaque host node handed to post-render hooks by the node locator.
pub type HostNode = Rc<dyn Any>;

// =============================================================================
// Value
// =============================================================================

/// Kind tag of a [`Value`], used by shape descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Action,
    Node,
    Opaque,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Action => "action",
            ValueKind::Node => "node",
            ValueKind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// A dynamic prop, state or context value.
///
/// `PartialEq` is deep structural equality. The lifecycle engine never uses
/// it; it compares with [`Value::same`], which follows reference semantics
/// for everything that is shared.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    Map(Rc<Map>),
    /// A local action descriptor (see [`crate::local_action`]).
    Action(Rc<LocalAction>),
    /// Render output passed around as data.
    Node(VNode),
    /// Anything else the host wants to thread through props.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build a list value.
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Wrap an arbitrary host value.
    pub fn opaque<T: Any>(value: T) -> Self {
        Value::Opaque(Rc::new(value))
    }

    /// Strict identity.
    ///
    /// Scalars and strings compare by value, shared containers, actions,
    /// nodes and opaque values compare by pointer. `Float` follows IEEE
    /// semantics, so `NaN` is never the same as itself.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Action(a), Value::Action(b)) => Rc::ptr_eq(a, b),
            (Value::Node(a), Value::Node(b)) => VNode::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Action(_) => ValueKind::Action,
            Value::Node(_) => ValueKind::Node,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_action(&self) -> Option<&Rc<LocalAction>> {
        match self {
            Value::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Downcast an opaque value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref(),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Copy-on-write update of a map value, returning a new identity.
    ///
    /// Non-map values are replaced by a single-entry map.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Value {
        let mut map = self.as_map().cloned().unwrap_or_default();
        map.insert(key.into(), value.into());
        Value::Map(Rc::new(map))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Action(a), Value::Action(b)) => a == b,
            _ => self.same(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b:?}"),
            Value::Int(i) => write!(f, "{i:?}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Action(action) => action.fmt(f),
            Value::Node(node) => node.fmt(f),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(Rc::new(value))
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(Rc::new(value))
    }
}

impl From<Rc<LocalAction>> for Value {
    fn from(value: Rc<LocalAction>) -> Self {
        Value::Action(value)
    }
}

impl From<VNode> for Value {
    fn from(value: VNode) -> Self {
        Value::Node(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Map(value.0)
    }
}

// =============================================================================
// Record - props and context maps
// =============================================================================

/// Shared, cheaply cloned string-keyed map.
///
/// Cloning a record shares the map; [`Record::ptr_eq`] tells two clones
/// apart from two structurally equal maps.
#[derive(Clone, Default, PartialEq)]
pub struct Record(Rc<Map>);

/// External input of a component.
pub type Props = Record;

/// Ambient value threaded from context roots to their descendants.
pub type Context = Record;

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an owned map.
    pub fn from_map(map: Map) -> Self {
        Self(Rc::new(map))
    }

    /// Builder-style insert. Copies the map if it is shared.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Rc::make_mut(&mut self.0).insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[inline]
    pub fn as_map(&self) -> &Map {
        &self.0
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(a: &Record, b: &Record) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Map> for Record {
    fn from(map: Map) -> Self {
        Self::from_map(map)
    }
}

// =============================================================================
// VNode - render output
// =============================================================================

/// Render output node.
pub enum Node {
    /// Renders nothing.
    Empty,
    /// Text content.
    Text(String),
    /// Host element.
    Element {
        tag: String,
        attrs: Props,
        children: Vec<VNode>,
    },
    /// Nested component placeholder, turned into a thunk by the diff engine.
    Component {
        component: Rc<Component>,
        props: Props,
        children: Vec<VNode>,
        key: Option<String>,
    },
}

/// Shared render output. Cloning shares the node.
#[derive(Clone)]
pub struct VNode(Rc<Node>);

impl VNode {
    pub fn new(node: Node) -> Self {
        Self(Rc::new(node))
    }

    pub fn empty() -> Self {
        Self::new(Node::Empty)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Node::Text(content.into()))
    }

    pub fn element(tag: impl Into<String>, attrs: Props, children: Vec<VNode>) -> Self {
        Self::new(Node::Element {
            tag: tag.into(),
            attrs,
            children,
        })
    }

    pub fn component(component: &Rc<Component>, props: Props, children: Vec<VNode>) -> Self {
        Self::new(Node::Component {
            component: Rc::clone(component),
            props,
            children,
            key: None,
        })
    }

    pub fn keyed_component(
        component: &Rc<Component>,
        key: impl Into<String>,
        props: Props,
        children: Vec<VNode>,
    ) -> Self {
        Self::new(Node::Component {
            component: Rc::clone(component),
            props,
            children,
            key: Some(key.into()),
        })
    }

    #[inline]
    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(a: &VNode, b: &VNode) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Empty => f.write_str("Empty"),
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::Element {
                tag,
                attrs,
                children,
            } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attrs", attrs)
                .field("children", children)
                .finish(),
            Node::Component {
                component,
                props,
                key,
                ..
            } => f
                .debug_struct("Component")
                .field("name", &component.name())
                .field("key", key)
                .field("props", props)
                .finish(),
        }
    }
}
