/// One block of an a2l file, or the synthetic root of the file.
///
/// A block starts with `/begin KEY` and ends with `/end KEY`. All plain words and strings that
/// appear directly inside the block are stored in `words`, nested blocks are stored in `children`.
/// Both keep the order of the input.
///
/// The root node has an empty `key` and line 0, since it does not correspond to any text in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub line: u32,
    pub words: Vec<String>,
    pub children: Vec<Node>,
}

impl Node {
    /// create a new empty node for a block that starts on the given line
    #[must_use]
    pub fn new(key: String, line: u32) -> Self {
        Self {
            key,
            line,
            words: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }

    /// get the first direct child block with the given key
    #[must_use]
    pub fn get_child(&self, key: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.key == key)
    }

    /// iterate over all direct child blocks with the given key
    pub fn children_by_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.key == key)
    }

    /// find all blocks with the given key anywhere below this node, in depth-first order
    #[must_use]
    pub fn find_all(&self, key: &str) -> Vec<&Node> {
        self.iter()
            .skip(1)
            .filter(|node| node.key == key)
            .collect()
    }

    /// depth-first iterator over this node and all nodes below it
    #[must_use]
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }
}

/// Depth-first (pre-order) iterator over a tree of [`Node`]s
#[derive(Debug)]
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // push in reverse, so that the first child is visited next
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = NodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/*************************************************************************************************/
