use super::node::{Node, NodeBody};
use crate::syntax::TextPointer;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A plain FNV-1a accumulator. The hash is deliberately non-cryptographic:
/// it is a cache key for subtree identity, and every consumer that needs a
/// real answer confirms with [`Node::deep_equal`].
pub(crate) struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    pub(crate) fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub(crate) fn write_u8(&mut self, byte: u8) {
        self.write(&[byte]);
    }

    pub(crate) fn write_u64(&mut self, value: u64) {
        self.write(&value.to_be_bytes());
    }

    pub(crate) fn finish(&self) -> u64 {
        self.state
    }
}

/// Compute a node's content hash. The hash covers, in order: one byte for
/// the kind, each child's hash as 8 big-endian bytes, the node's source
/// bytes, and the kind-specific payload bytes. Anything observable about a
/// node therefore feeds the hash, and unchanged subtrees hash identically
/// across independent parses.
pub(crate) fn compute_node_hash(body: &NodeBody, text: &TextPointer, children: &[Node]) -> u64 {
    let mut hasher = FnvHasher::new();
    hasher.write_u8(body.kind() as u8);
    for child in children {
        hasher.write_u64(child.hash());
    }
    hasher.write(text.as_bytes());

    match body {
        NodeBody::Document
        | NodeBody::Paragraph
        | NodeBody::Blockquote
        | NodeBody::Text
        | NodeBody::Strong
        | NodeBody::Emphasis
        | NodeBody::Strikethrough
        | NodeBody::Code(_) => {}
        NodeBody::Section(section) => {
            hasher.write_u8(section.level);
            hasher.write(section.title.as_bytes());
            hasher.write(section.delta.as_str().as_bytes());
        }
        NodeBody::Requirement(requirement) => hasher.write(requirement.name.as_bytes()),
        NodeBody::Scenario(scenario) => hasher.write(scenario.name.as_bytes()),
        NodeBody::List(list) => hasher.write_u8(list.ordered as u8),
        NodeBody::ListItem(item) => {
            hasher.write_u8(match item.checked {
                None => 0,
                Some(false) => 1,
                Some(true) => 2,
            });
            hasher.write(item.keyword.as_str().as_bytes());
        }
        NodeBody::CodeBlock(code) => {
            hasher.write(code.language.as_bytes());
            hasher.write_u8(0);
            hasher.write(code.content.as_bytes());
        }
        NodeBody::Link(link) => {
            hasher.write(link.url.as_bytes());
            hasher.write_u8(0);
            if let Some(title) = &link.title {
                hasher.write(title.as_bytes());
            }
        }
        NodeBody::LinkDef(def) => {
            hasher.write(def.url.as_bytes());
            hasher.write_u8(0);
            if let Some(title) = &def.title {
                hasher.write(title.as_bytes());
            }
        }
        NodeBody::Wikilink(wikilink) => {
            hasher.write(wikilink.target.as_bytes());
            hasher.write_u8(0);
            if let Some(display) = &wikilink.display {
                hasher.write(display.as_bytes());
            }
            hasher.write_u8(0);
            if let Some(anchor) = &wikilink.anchor {
                hasher.write(anchor.as_bytes());
            }
        }
    }

    hasher.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fnv1a_reference_values() {
        // Standard FNV-1a test vectors.
        let mut hasher = FnvHasher::new();
        hasher.write(b"");
        assert_eq!(hasher.finish(), 0xcbf2_9ce4_8422_2325);

        let mut hasher = FnvHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63_dc4c_8601_ec8c);

        let mut hasher = FnvHasher::new();
        hasher.write(b"foobar");
        assert_eq!(hasher.finish(), 0x85dd_5e30_0323_2ab0);
    }
}
