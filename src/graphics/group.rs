use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use uuid::Uuid;

/// Node in the draw-order tree. Cheap to clone; equality is identity.
///
/// Siblings are drawn by ascending `order`. Siblings sharing an order may be
/// reordered freely, which the batch uses to merge equal descriptors.
#[derive(Clone)]
pub struct Group(Rc<GroupNode>);

struct GroupNode {
    id: Uuid,
    parent: Option<Group>,
    order: i32,
}

impl Group {
    /// A root group.
    pub fn new(order: i32) -> Self {
        Self(Rc::new(GroupNode {
            id: Uuid::new_v4(),
            parent: None,
            order,
        }))
    }

    pub fn child_of(parent: &Group, order: i32) -> Self {
        Self(Rc::new(GroupNode {
            id: Uuid::new_v4(),
            parent: Some(parent.clone()),
            order,
        }))
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn parent(&self) -> Option<&Group> {
        self.0.parent.as_ref()
    }

    pub fn order(&self) -> i32 {
        self.0.order
    }

    /// Orders from the root down to this group.
    pub fn order_path(&self) -> Vec<i32> {
        let mut path = vec![self.order()];
        let mut cur = self.parent();
        while let Some(g) = cur {
            path.push(g.order());
            cur = g.parent();
        }
        path.reverse();
        path
    }

    pub fn is_descendant_of(&self, other: &Group) -> bool {
        let mut cur = self.parent();
        while let Some(g) = cur {
            if g == other {
                return true;
            }
            cur = g.parent();
        }
        false
    }
}

impl Default for Group {
    fn default() -> Self {
        Group::new(0)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.0.id)
            .field("order", &self.0.order)
            .field("parent", &self.0.parent.as_ref().map(|p| p.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_parents() {
        let root = Group::new(2);
        let mid = Group::child_of(&root, 0);
        let leaf = Group::child_of(&mid, 5);
        assert_eq!(leaf.order_path(), vec![2, 0, 5]);
        assert!(leaf.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&leaf));
        assert_eq!(leaf.parent(), Some(&mid));
        assert_ne!(Group::new(0), Group::new(0));
    }
}
