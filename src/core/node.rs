//! Type descriptors for configuration nodes and their members
//!
//! A build carries its object graph as a neutral [`serde_json::Value`] document and
//! only produces typed instances at the boundaries. The descriptors in this module are
//! what the engine knows about the types involved:
//!
//! - [`ConfigNode`] - implemented by every type a file can be loaded into
//! - [`NodeType`] - a small vtable for one node type: construct a default instance,
//!   check that a document fits the type, and describe its directive-bearing members
//! - [`MemberType`] - the declared type of a member, as seen by directive validation
//!
//! # Example
//!
//! ```rust,no_run
//! use beantree::{Bean, ConfigNode, SchemaBuilder};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Database {
//!     url: String,
//! }
//!
//! impl ConfigNode for Database {}
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct App {
//!     port: u16,
//!     database: Option<Database>,
//! }
//!
//! impl ConfigNode for App {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.bean::<Database>("database", Bean::from_file("database"));
//!     }
//! }
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::schema::SchemaBuilder;

/// A type that can be loaded from a file of the tree.
///
/// Instances start from [`Default`] (or a registered factory), have file content
/// merged onto them, and are finally deserialized. Types that carry directives
/// declare them in [`describe`](ConfigNode::describe); plain data types can rely on the
/// empty default.
///
/// Serialized and deserialized shapes must agree: the engine serializes the default
/// instance, merges file content onto it, and deserializes the result.
pub trait ConfigNode: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Declare the directive-bearing members of this type.
    ///
    /// Members are referenced by their serialized key. Use
    /// [`SchemaBuilder::include`] to pull in the members of a composed parent type.
    fn describe(schema: &mut SchemaBuilder) {
        let _ = schema;
    }
}

/// Identity of a Rust type, with its name kept for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Full type name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// True for the owned and shared string types a name can be written into
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        [
            TypeId::of::<String>(),
            TypeId::of::<Box<str>>(),
            TypeId::of::<Arc<str>>(),
            TypeId::of::<Rc<str>>(),
            TypeId::of::<Cow<'static, str>>(),
        ]
        .contains(&self.id)
    }

    /// True for string-like types and [`PathBuf`]
    #[must_use]
    pub fn is_path_like(&self) -> bool {
        self.is_string_like() || self.id == TypeId::of::<PathBuf>()
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Runtime descriptor of a node type.
///
/// Either a concrete [`ConfigNode`] or the dynamic node, which accepts any document
/// and is carried as a raw [`Value`].
#[derive(Clone, Copy)]
pub struct NodeType {
    key: TypeKey,
    dynamic: bool,
    construct: fn() -> Result<Value, serde_json::Error>,
    verify: fn(Value) -> Result<(), serde_json::Error>,
    describe: fn(&mut SchemaBuilder),
}

impl NodeType {
    /// Descriptor of `T`
    #[must_use]
    pub fn of<T: ConfigNode>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            dynamic: false,
            construct: construct_default::<T>,
            verify: verify_shape::<T>,
            describe: T::describe,
        }
    }

    /// Descriptor of the dynamic node: an untyped [`Value`] that starts as an empty
    /// object and accepts any content
    #[must_use]
    pub fn dynamic() -> Self {
        Self {
            key: TypeKey::of::<Value>(),
            dynamic: true,
            construct: empty_object,
            verify: accept_any,
            describe: describe_nothing,
        }
    }

    /// Type key
    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Type name, for diagnostics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.key.name
    }

    /// True for the dynamic node
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Whether a value of type `other` can be stored where `self` is declared
    #[must_use]
    pub fn accepts(&self, other: &Self) -> bool {
        self.dynamic || self.key == other.key
    }

    /// Serialize a default-constructed instance
    pub fn construct(&self) -> Result<Value, serde_json::Error> {
        (self.construct)()
    }

    /// Check that `value` deserializes into this type
    pub fn verify(&self, value: Value) -> Result<(), serde_json::Error> {
        (self.verify)(value)
    }

    pub(crate) fn describe_into(&self, schema: &mut SchemaBuilder) {
        (self.describe)(schema);
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeType").field(&self.key).finish()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.name)
    }
}

fn construct_default<T: ConfigNode>() -> Result<Value, serde_json::Error> {
    serde_json::to_value(T::default())
}

fn verify_shape<T: ConfigNode>(value: Value) -> Result<(), serde_json::Error> {
    serde_json::from_value::<T>(value).map(|_| ())
}

fn empty_object() -> Result<Value, serde_json::Error> {
    Ok(Value::Object(Map::new()))
}

fn accept_any(_: Value) -> Result<(), serde_json::Error> {
    Ok(())
}

fn describe_nothing(_: &mut SchemaBuilder) {}

/// Role a collection member plays, which decides how directory entries are stored
/// and which default container it starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionRole {
    /// Keyed by entry name; stored as an object
    Map,
    /// Ordered entries; stored as an array
    List,
    /// Unique entries; stored as an array
    Set,
    /// FIFO entries; stored as an array
    Queue,
}

impl CollectionRole {
    /// Whether entries are keyed by name
    #[must_use]
    pub const fn is_keyed(self) -> bool {
        matches!(self, Self::Map)
    }

    /// The empty container this role starts from
    #[must_use]
    pub fn empty(self) -> Value {
        if self.is_keyed() {
            Value::Object(Map::new())
        } else {
            Value::Array(Vec::new())
        }
    }
}

impl fmt::Display for CollectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Map => "Map",
            Self::List => "List",
            Self::Set => "Set",
            Self::Queue => "Queue",
        };
        f.write_str(name)
    }
}

/// Declared shape of a collection member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionType {
    /// How entries are stored
    pub role: CollectionRole,
    /// The container type itself, for per-type factories
    pub container: TypeKey,
    /// Key type, when known (maps only)
    pub key: Option<TypeKey>,
    /// Element type, when known
    pub element: Option<NodeType>,
}

/// Declared type of a member, as directive validation sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    /// A nested node, typed or dynamic
    Node(NodeType),
    /// A collection of nodes
    Collection(CollectionType),
    /// Any other value: strings, paths, numbers
    Scalar(TypeKey),
}

impl MemberType {
    /// A nested node of type `T`
    #[must_use]
    pub fn node<T: ConfigNode>() -> Self {
        Self::Node(NodeType::of::<T>())
    }

    /// A nested dynamic node
    #[must_use]
    pub fn dynamic() -> Self {
        Self::Node(NodeType::dynamic())
    }

    /// A scalar of type `T`
    #[must_use]
    pub fn scalar<T: 'static>() -> Self {
        Self::Scalar(TypeKey::of::<T>())
    }

    /// A [`String`] scalar
    #[must_use]
    pub fn text() -> Self {
        Self::scalar::<String>()
    }

    /// A [`PathBuf`] scalar
    #[must_use]
    pub fn path() -> Self {
        Self::scalar::<PathBuf>()
    }

    /// A string-keyed map of `V`
    #[must_use]
    pub fn map<V: ConfigNode>() -> Self {
        Self::map_keyed::<String, V>()
    }

    /// A map of `V` keyed by `K`; only string-like keys pass validation
    #[must_use]
    pub fn map_keyed<K: 'static, V: ConfigNode>() -> Self {
        Self::Collection(CollectionType {
            role: CollectionRole::Map,
            container: TypeKey::of::<std::collections::HashMap<K, V>>(),
            key: Some(TypeKey::of::<K>()),
            element: Some(NodeType::of::<V>()),
        })
    }

    /// A list of `V`
    #[must_use]
    pub fn list<V: ConfigNode>() -> Self {
        Self::sequence::<Vec<V>, V>(CollectionRole::List)
    }

    /// A set of `V`
    #[must_use]
    pub fn set<V: ConfigNode>() -> Self {
        Self::sequence::<std::collections::HashSet<V>, V>(CollectionRole::Set)
    }

    /// A queue of `V`
    #[must_use]
    pub fn queue<V: ConfigNode>() -> Self {
        Self::sequence::<std::collections::VecDeque<V>, V>(CollectionRole::Queue)
    }

    /// A collection whose key and element types are unknown; the directive must
    /// name an element type
    #[must_use]
    pub fn untyped(role: CollectionRole) -> Self {
        Self::Collection(CollectionType {
            role,
            container: TypeKey::of::<Value>(),
            key: None,
            element: None,
        })
    }

    /// A collection with an explicit container type.
    ///
    /// A keyed role declared without a key type only validates when the directive
    /// names an element type with `with_type`.
    #[must_use]
    pub fn collection<C: 'static>(
        role: CollectionRole,
        key: Option<TypeKey>,
        element: Option<NodeType>,
    ) -> Self {
        Self::Collection(CollectionType {
            role,
            container: TypeKey::of::<C>(),
            key,
            element,
        })
    }

    fn sequence<C: 'static, V: ConfigNode>(role: CollectionRole) -> Self {
        Self::collection::<C>(role, None, Some(NodeType::of::<V>()))
    }

    /// Name of the declared type, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Node(node) => node.name(),
            Self::Collection(collection) => collection.container.name(),
            Self::Scalar(key) => key.name(),
        }
    }
}
