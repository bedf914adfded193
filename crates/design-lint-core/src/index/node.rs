//! Class objects of the document tree.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Field holding a node's discriminator tag.
pub const CLASS_KEY: &str = "_class";
/// Field holding a node's stable unique id.
pub const ID_KEY: &str = "do_objectID";
/// Field holding a node's name.
pub const NAME_KEY: &str = "name";
/// Field whose presence marks a node as a layer.
pub const FRAME_KEY: &str = "frame";
/// Field whose presence marks a node as a group.
pub const LAYERS_KEY: &str = "layers";

macro_rules! node_classes {
    ($($(#[$meta:meta])* $variant:ident => $tag:literal,)+) => {
        /// Known discriminator values of the document format.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeClass {
            $($(#[$meta])* $variant,)+
        }

        impl NodeClass {
            /// Every known class.
            pub const ALL: &'static [NodeClass] = &[$(NodeClass::$variant,)+];

            /// The discriminator tag as it appears in the document.
            #[must_use]
            pub fn tag(self) -> &'static str {
                match self {
                    $(NodeClass::$variant => $tag,)+
                }
            }
        }
    };
}

node_classes! {
    /// Artboard layer.
    Artboard => "artboard",
    /// Bitmap image layer.
    Bitmap => "bitmap",
    /// Blur style.
    Blur => "blur",
    /// Border style.
    Border => "border",
    /// Border options style.
    BorderOptions => "borderOptions",
    /// Color value.
    Color => "color",
    /// Document root.
    Document => "document",
    /// Export format.
    ExportFormat => "exportFormat",
    /// Fill style.
    Fill => "fill",
    /// Library layer style.
    ForeignLayerStyle => "MSImmutableForeignLayerStyle",
    /// Library swatch.
    ForeignSwatch => "MSImmutableForeignSwatch",
    /// Library symbol.
    ForeignSymbol => "MSImmutableForeignSymbol",
    /// Library text style.
    ForeignTextStyle => "MSImmutableForeignTextStyle",
    /// Gradient value.
    Gradient => "gradient",
    /// Group layer.
    Group => "group",
    /// Prototyping hotspot layer.
    Hotspot => "MSImmutableHotspotLayer",
    /// Inner shadow style.
    InnerShadow => "innerShadow",
    /// Reference to a packed file, such as an image.
    FileReference => "MSJSONFileReference",
    /// Oval shape.
    Oval => "oval",
    /// Page.
    Page => "page",
    /// Polygon shape.
    Polygon => "polygon",
    /// Rectangle shape.
    Rectangle => "rectangle",
    /// Frame rectangle.
    Rect => "rect",
    /// Shadow style.
    Shadow => "shadow",
    /// Boolean shape group.
    ShapeGroup => "shapeGroup",
    /// Vector path.
    ShapePath => "shapePath",
    /// Shared layer style.
    SharedStyle => "sharedStyle",
    /// Slice layer.
    Slice => "slice",
    /// Star shape.
    Star => "star",
    /// Layer style.
    Style => "style",
    /// Color swatch.
    Swatch => "swatch",
    /// Symbol instance layer.
    SymbolInstance => "symbolInstance",
    /// Symbol master layer.
    SymbolMaster => "symbolMaster",
    /// Text layer.
    Text => "text",
    /// Text style.
    TextStyle => "textStyle",
    /// Triangle shape.
    Triangle => "triangle",
}

fn registry() -> &'static HashMap<&'static str, NodeClass> {
    static REGISTRY: OnceLock<HashMap<&'static str, NodeClass>> = OnceLock::new();
    REGISTRY.get_or_init(|| NodeClass::ALL.iter().map(|c| (c.tag(), *c)).collect())
}

impl NodeClass {
    /// Looks up the class for a discriminator tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        registry().get(tag).copied()
    }
}

impl std::fmt::Display for NodeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of a node: the address of its value inside the tree.
///
/// Only meaningful while the tree the node was taken from is alive and unmoved,
/// which borrowing guarantees for every [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub(crate) fn of(value: &Value) -> Self {
        Self(std::ptr::addr_of!(*value) as usize)
    }
}

/// A class object borrowed from the document tree.
///
/// Nodes are never copied out of the tree: equality is identity.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    value: &'a Value,
    fields: &'a Map<String, Value>,
    tag: &'a str,
}

impl<'a> Node<'a> {
    /// Wraps a value if it is an object carrying a string discriminator.
    #[must_use]
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let fields = value.as_object()?;
        let tag = fields.get(CLASS_KEY)?.as_str()?;
        Some(Self { value, fields, tag })
    }

    /// The raw discriminator tag.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    /// The typed class, when the tag is known.
    #[must_use]
    pub fn class(&self) -> Option<NodeClass> {
        NodeClass::from_tag(self.tag)
    }

    /// True when this node is of the given class.
    #[must_use]
    pub fn is(&self, class: NodeClass) -> bool {
        self.tag == class.tag()
    }

    /// The stable unique id.
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.fields.get(ID_KEY).and_then(Value::as_str)
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.fields.get(NAME_KEY).and_then(Value::as_str)
    }

    /// A field of this node.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key)
    }

    /// The node as a raw value.
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The node's fields.
    #[must_use]
    pub fn fields(&self) -> &'a Map<String, Value> {
        self.fields
    }

    /// True when the node has a bounding frame.
    #[must_use]
    pub fn is_layer(&self) -> bool {
        self.fields.contains_key(FRAME_KEY)
    }

    /// True when the node has a child list.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.fields.get(LAYERS_KEY).is_some_and(Value::is_array)
    }

    /// Child class objects of a group, in order.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        self.fields
            .get(LAYERS_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Node::from_value)
    }

    /// Identity key of this node.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        NodeKey::of(self.value)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.value, other.value)
    }
}

impl Eq for Node<'_> {}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_round_trip() {
        for class in NodeClass::ALL {
            assert_eq!(NodeClass::from_tag(class.tag()), Some(*class));
        }
        assert_eq!(NodeClass::from_tag("not-a-class"), None);
    }

    #[test]
    fn test_node_from_value() {
        let value = json!({"_class": "rectangle", "do_objectID": "r1", "name": "Box", "frame": {}});
        let node = Node::from_value(&value).unwrap();
        assert_eq!(node.class(), Some(NodeClass::Rectangle));
        assert_eq!(node.id(), Some("r1"));
        assert_eq!(node.name(), Some("Box"));
        assert!(node.is_layer());
        assert!(!node.is_group());
    }

    #[test]
    fn test_untagged_values_are_not_nodes() {
        assert!(Node::from_value(&json!({"name": "x"})).is_none());
        assert!(Node::from_value(&json!({"_class": 3})).is_none());
        assert!(Node::from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_identity_equality() {
        let a = json!({"_class": "oval"});
        let b = json!({"_class": "oval"});
        let na = Node::from_value(&a).unwrap();
        assert_eq!(na, Node::from_value(&a).unwrap());
        assert_ne!(na, Node::from_value(&b).unwrap());
    }

    #[test]
    fn test_children() {
        let value = json!({"_class": "group", "layers": [{"_class": "oval"}, 1, {"_class": "text"}]});
        let node = Node::from_value(&value).unwrap();
        let tags: Vec<&str> = node.children().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["oval", "text"]);
        assert!(node.is_group());
    }
}
