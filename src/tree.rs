use crate::rng::SplittableRng;

/// One generated node. Only lives for the duration of its own expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node<S> {
    pub height: u32,
    num_children: Option<u32>,
    pub state: S,
}

impl<S: Copy> Node<S> {
    #[must_use]
    pub const fn new(height: u32, state: S) -> Self {
        Self {
            height,
            num_children: None,
            state,
        }
    }

    #[must_use]
    pub fn root<R: SplittableRng<State = S>>(seed: u32) -> Self {
        Self::new(0, R::init(seed))
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.height == 0
    }

    #[must_use]
    pub const fn num_children(&self) -> Option<u32> {
        self.num_children
    }

    /// Fixes the child count. Returns the count already set if the node was
    /// decided before; the first decision always wins.
    pub fn decide_children(&mut self, count: u32) -> u32 {
        *self.num_children.get_or_insert(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ShaRng;

    #[test]
    fn root_starts_undecided() {
        let root = Node::root::<ShaRng>(0);
        assert!(root.is_root());
        assert_eq!(root.num_children(), None);
        assert_eq!(root.state, ShaRng::init(0));
    }

    #[test]
    fn child_count_is_set_once() {
        let mut node = Node::new(3, ShaRng::init(1));
        assert_eq!(node.decide_children(4), 4);
        assert_eq!(node.decide_children(0), 4);
        assert_eq!(node.num_children(), Some(4));
    }
}
