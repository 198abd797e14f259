use std::fmt::{self, Write};
use std::iter::FusedIterator;
use std::mem;

use tracing::{debug, trace};

use crate::error::{Result, RopeError};

enum Node {
    Leaf(Vec<char>),
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        size: usize,
        size_left: usize,
    },
}

/// A subtree left behind while descending to a split point, and the side of
/// the split it belongs to.
enum Sibling {
    Left(Node),
    Right(Node),
}

impl Node {
    fn empty() -> Self {
        Node::Leaf(Vec::new())
    }

    fn size(&self) -> usize {
        match self {
            Node::Leaf(fragment) => fragment.len(),
            Node::Internal { size, .. } => *size,
        }
    }

    fn concat(left: Node, right: Node) -> Node {
        Node::Internal {
            size: left.size() + right.size(),
            size_left: left.size(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Partitions this subtree into `[0, i)` and `[i, size)`.
    ///
    /// Requires `i < self.size()`. Descent keeps `i` strictly inside the
    /// child it enters, and an exact child boundary is answered by handing
    /// back the two children, so a leaf is never split at its right edge.
    ///
    /// The siblings passed on the way down are kept on an explicit stack and
    /// joined back onto the two halves afterwards, so the depth of the tree
    /// does not bound the call stack.
    fn split(self, mut i: usize) -> (Node, Node) {
        assert!(i < self.size(), "split at {i} in a subtree of size {}", self.size());

        let mut siblings = Vec::new();
        let mut node = self;

        let (mut head, mut tail) = loop {
            match node {
                Node::Leaf(mut fragment) => {
                    let tail = fragment.split_off(i);
                    break (Node::Leaf(fragment), Node::Leaf(tail));
                }
                Node::Internal { left, right, size_left, .. } => {
                    if i < size_left {
                        siblings.push(Sibling::Right(*right));
                        node = *left;
                    } else if i > size_left {
                        siblings.push(Sibling::Left(*left));
                        i -= size_left;
                        node = *right;
                    } else {
                        break (*left, *right);
                    }
                }
            }
        };

        while let Some(sibling) = siblings.pop() {
            match sibling {
                Sibling::Left(left) => head = Node::concat(left, head),
                Sibling::Right(right) => tail = Node::concat(tail, right),
            }
        }

        (head, tail)
    }

    /// Tears the subtree down without recursing, so arbitrarily deep trees
    /// can be dropped on a small stack.
    fn release(self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Internal { left, right, .. } = node {
                stack.push(*left);
                stack.push(*right);
            }
        }
    }

    /// Consumes the tree, returning its non-empty leaves in order.
    fn into_leaves(self) -> Vec<Node> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                Node::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
                leaf => {
                    if leaf.size() > 0 {
                        leaves.push(leaf);
                    }
                }
            }
        }

        leaves
    }

    /// Builds a tree of height `ceil(log2(n))` over an ordered list of leaves.
    fn build(mut leaves: Vec<Node>) -> Node {
        if leaves.len() <= 1 {
            return leaves.pop().unwrap_or_else(Node::empty);
        }

        let right = leaves.split_off((leaves.len() + 1) / 2);
        Node::concat(Node::build(leaves), Node::build(right))
    }
}

/// A mutable character sequence stored as a binary tree of fragments.
///
/// Positions address `char`s. Every operation validates its arguments
/// before touching the tree, so a failed call leaves the rope unchanged.
/// The tree is never rebalanced implicitly; call [`Rope::rebalance`] after
/// long runs of edits.
pub struct Rope {
    root: Node,
}

impl Rope {
    pub fn new() -> Self {
        Self { root: Node::empty() }
    }

    /// Builds a balanced rope with one leaf per non-empty fragment.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let leaves = fragments
            .into_iter()
            .map(|fragment| Node::Leaf(fragment.as_ref().chars().collect()))
            .filter(|leaf| leaf.size() > 0)
            .collect::<Vec<_>>();

        Self { root: Node::build(leaves) }
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the character at position `i`.
    pub fn index(&self, i: usize) -> Result<char> {
        let out_of_range = || RopeError::out_of_range("index", i, 1, self.size());

        let mut node = &self.root;
        let mut local = i;
        loop {
            match node {
                Node::Internal { left, right, size, size_left } => {
                    if local >= *size {
                        return Err(out_of_range());
                    }

                    if *size_left > local {
                        node = left;
                    } else {
                        local -= size_left;
                        node = right;
                    }
                }
                Node::Leaf(fragment) => return fragment.get(local).copied().ok_or_else(out_of_range),
            }
        }
    }

    /// Returns the `len` characters starting at position `i`.
    ///
    /// Walks the tree with an explicit work list rather than recursion so
    /// badly skewed trees cannot exhaust the call stack.
    pub fn report(&self, i: usize, len: usize) -> Result<String> {
        let size = self.size();
        let out_of_range = || RopeError::out_of_range("report", i, len, size);

        match i.checked_add(len) {
            Some(end) if end <= size => {}
            _ => return Err(out_of_range()),
        }

        let mut report = String::with_capacity(len);
        if len == 0 {
            return Ok(report);
        }

        let mut work = vec![(&self.root, i, len)];
        while let Some((node, i, len)) = work.pop() {
            if i + len > node.size() {
                return Err(out_of_range());
            }

            match node {
                Node::Leaf(fragment) => report.extend(&fragment[i..i + len]),
                Node::Internal { left, right, size_left, .. } => {
                    let size_left = *size_left;
                    if i + len <= size_left {
                        work.push((left.as_ref(), i, len));
                    } else if i >= size_left {
                        work.push((right.as_ref(), i - size_left, len));
                    } else {
                        // Right first so the left part is popped, and emitted, first.
                        work.push((right.as_ref(), 0, i + len - size_left));
                        work.push((left.as_ref(), i, size_left - i));
                    }
                }
            }
        }

        Ok(report)
    }

    /// Inserts `fragment` so that its first character lands at position `i`.
    pub fn insert(&mut self, fragment: &str, i: usize) -> Result<()> {
        let size = self.size();
        if i > size {
            return Err(RopeError::out_of_range("insert", i, 0, size));
        }

        let fragment = fragment.chars().collect::<Vec<_>>();
        if fragment.is_empty() {
            return Ok(());
        }

        let len = fragment.len();
        if i == 0 {
            self.prepend(fragment);
        } else if i == size {
            self.append(fragment);
        } else {
            let (head, tail) = self.take_root().split(i);
            self.root = Node::concat(Node::concat(head, Node::Leaf(fragment)), tail);
        }

        trace!(pos = i, len, size = self.size(), "insert");
        Ok(())
    }

    fn prepend(&mut self, fragment: Vec<char>) {
        let len = fragment.len();

        let mut curr = &mut self.root;
        while let Node::Internal { ref mut left, ref mut size, ref mut size_left, .. } = *curr {
            *size += len;
            *size_left += len;
            curr = left;
        }

        *curr = match mem::replace(curr, Node::empty()) {
            Node::Leaf(old) if old.is_empty() => Node::Leaf(fragment),
            leaf => Node::concat(Node::Leaf(fragment), leaf),
        };
    }

    fn append(&mut self, fragment: Vec<char>) {
        let len = fragment.len();

        let mut curr = &mut self.root;
        while let Node::Internal { ref mut right, ref mut size, .. } = *curr {
            *size += len;
            curr = right;
        }

        *curr = match mem::replace(curr, Node::empty()) {
            Node::Leaf(old) if old.is_empty() => Node::Leaf(fragment),
            leaf => Node::concat(leaf, Node::Leaf(fragment)),
        };
    }

    /// Removes the `len` characters starting at position `i`.
    ///
    /// The range may run up to and including the last character.
    pub fn erase(&mut self, i: usize, len: usize) -> Result<()> {
        let size = self.size();
        let end = match i.checked_add(len) {
            Some(end) if end <= size => end,
            _ => return Err(RopeError::out_of_range("erase", i, len, size)),
        };

        if len == 0 {
            return Ok(());
        }

        let root = self.take_root();
        let (head, rest) = if i == 0 {
            (None, root)
        } else {
            let (head, rest) = root.split(i);
            (Some(head), rest)
        };

        let tail = if end == size {
            rest.release();
            None
        } else {
            let (middle, tail) = rest.split(len);
            middle.release();
            Some(tail)
        };

        self.root = match (head, tail) {
            (Some(head), Some(tail)) => Node::concat(head, tail),
            (Some(node), None) | (None, Some(node)) => node,
            (None, None) => Node::empty(),
        };

        trace!(pos = i, len, size = self.size(), "erase");
        Ok(())
    }

    /// Rebuilds the tree from its leaves so its height is logarithmic in
    /// the number of leaves. Content is unchanged.
    pub fn rebalance(&mut self) {
        let before = self.height();

        let leaves = self.take_root().into_leaves();
        let count = leaves.len();
        self.root = Node::build(leaves);

        debug!(leaves = count, before, after = self.height(), "rebalance");
    }

    /// Splits the rope at `at`, keeping `[0, at)` and returning the rest.
    pub fn split_off(&mut self, at: usize) -> Result<Rope> {
        let size = self.size();
        if at > size {
            return Err(RopeError::out_of_range("split_off", at, 0, size));
        }

        if at == size {
            return Ok(Rope::new());
        }
        if at == 0 {
            return Ok(Rope { root: self.take_root() });
        }

        let (head, tail) = self.take_root().split(at);
        self.root = head;
        Ok(Rope { root: tail })
    }

    /// Joins `other` onto the end of this rope without copying any text.
    pub fn append_rope(&mut self, mut other: Rope) {
        let tail = other.take_root();
        if tail.size() == 0 {
            return;
        }

        self.root = if self.is_empty() { tail } else { Node::concat(self.take_root(), tail) };
    }

    /// Number of edges on the longest root to leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(&self.root, 0)];

        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Leaf(_) => height = height.max(depth),
                Node::Internal { left, right, .. } => {
                    stack.push((left.as_ref(), depth + 1));
                    stack.push((right.as_ref(), depth + 1));
                }
            }
        }

        height
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(_) => count += 1,
                Node::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        count
    }

    /// Iterates over the non-empty leaf fragments in order.
    pub fn fragments(&self) -> Fragments<'_> {
        Fragments { stack: vec![&self.root] }
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.fragments().flat_map(|fragment| fragment.iter().copied())
    }

    fn take_root(&mut self) -> Node {
        mem::replace(&mut self.root, Node::empty())
    }
}

impl Drop for Rope {
    fn drop(&mut self) {
        self.take_root().release();
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        Self { root: Node::Leaf(text.chars().collect()) }
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl PartialEq<str> for Rope {
    fn eq(&self, other: &str) -> bool {
        self.chars().eq(other.chars())
    }
}

impl PartialEq<&str> for Rope {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in self.fragments() {
            for &c in fragment {
                f.write_char(c)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rope")
            .field("size", &self.size())
            .field("height", &self.height())
            .field("content", &self.to_string())
            .finish()
    }
}

pub struct Fragments<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = &'a [char];

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(fragment) if fragment.is_empty() => {}
                Node::Leaf(fragment) => return Some(fragment.as_slice()),
                Node::Internal { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }

        None
    }
}

impl FusedIterator for Fragments<'_> {}
