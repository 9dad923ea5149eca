use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::node::{DeltaType, Keyword, Node, NodeBody};

/// Nodes serialize to a `{ kind, span, ...payload, children }` map, with
/// text fields rendered lossily and absent payloads omitted. This is the
/// stable tooling/debugging shape, not a round-trippable encoding of the
/// source.
impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", &self.kind())?;
        map.serialize_entry("span", &[self.start(), self.end()])?;

        match self.body() {
            NodeBody::Section(section) => {
                map.serialize_entry("level", &section.level)?;
                map.serialize_entry("title", &section.title.to_str_lossy())?;
                if section.delta != DeltaType::None {
                    map.serialize_entry("delta", section.delta.as_str())?;
                }
            }
            NodeBody::Requirement(requirement) => {
                map.serialize_entry("name", &*requirement.name)?;
            }
            NodeBody::Scenario(scenario) => {
                map.serialize_entry("name", &*scenario.name)?;
            }
            NodeBody::List(list) => {
                map.serialize_entry("ordered", &list.ordered)?;
            }
            NodeBody::ListItem(item) => {
                if item.checked.is_some() {
                    map.serialize_entry("checked", &item.checked)?;
                }
                if item.keyword != Keyword::None {
                    map.serialize_entry("keyword", item.keyword.as_str())?;
                }
            }
            NodeBody::CodeBlock(code) => {
                map.serialize_entry("language", &code.language.to_str_lossy())?;
                map.serialize_entry("content", &code.content.to_str_lossy())?;
            }
            NodeBody::Code(code) => {
                map.serialize_entry("content", &code.content.to_str_lossy())?;
            }
            NodeBody::Link(link) => {
                map.serialize_entry("url", &link.url.to_str_lossy())?;
                if let Some(title) = &link.title {
                    map.serialize_entry("title", &title.to_str_lossy())?;
                }
            }
            NodeBody::LinkDef(def) => {
                map.serialize_entry("url", &def.url.to_str_lossy())?;
                if let Some(title) = &def.title {
                    map.serialize_entry("title", &title.to_str_lossy())?;
                }
            }
            NodeBody::Wikilink(wikilink) => {
                map.serialize_entry("target", &*wikilink.target)?;
                if let Some(display) = &wikilink.display {
                    map.serialize_entry("display", &**display)?;
                }
                if let Some(anchor) = &wikilink.anchor {
                    map.serialize_entry("anchor", &**anchor)?;
                }
            }
            NodeBody::Text => {
                map.serialize_entry("text", &self.text_lossy())?;
            }
            NodeBody::Document
            | NodeBody::Paragraph
            | NodeBody::Blockquote
            | NodeBody::Strong
            | NodeBody::Emphasis
            | NodeBody::Strikethrough => {}
        }

        if !self.children().is_empty() {
            map.serialize_entry("children", self.children())?;
        }
        map.end()
    }
}
