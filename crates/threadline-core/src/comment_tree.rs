use std::collections::HashMap;
use threadline_models::Comment;

/// Nest a flat list of comments under their parents.
///
/// Returns the top-level comments in input order, each with `replies`
/// filled in (also in input order). Comments whose parent is absent from
/// the list are dropped together with their descendants, as are comments
/// caught in a parent cycle. Runs in linear time without recursion.
pub fn build_tree(flat: Vec<Comment>) -> Vec<Comment> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(flat.len());
    for (pos, comment) in flat.iter().enumerate() {
        index.entry(comment.id).or_insert(pos);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    for (pos, comment) in flat.iter().enumerate() {
        match comment.parent_comment_id {
            None => roots.push(pos),
            Some(parent_id) if parent_id == comment.id => {}
            Some(parent_id) => {
                if let Some(&parent_pos) = index.get(&parent_id) {
                    children[parent_pos].push(pos);
                }
            }
        }
    }

    // Parents always precede their children in this order.
    let mut preorder = Vec::with_capacity(flat.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        preorder.push(pos);
        stack.extend(children[pos].iter().rev());
    }

    let mut slots: Vec<Option<Comment>> = flat.into_iter().map(Some).collect();
    for &pos in preorder.iter().rev() {
        let replies: Vec<Comment> = children[pos]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(comment) = slots[pos].as_mut() {
            comment.replies = replies;
        }
    }

    roots
        .into_iter()
        .filter_map(|pos| slots[pos].take())
        .collect()
}
