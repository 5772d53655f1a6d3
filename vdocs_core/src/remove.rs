use crate::DirectiveBlock;
use crate::Node;
use crate::PipelineError;
use crate::PipelineResult;

/// Delete the nodes of `block` from `root`, both markers included.
///
/// The range is tracked across sibling lists while descending, so markers
/// may sit at different depths. An ancestor holding the `BEGIN` marker is
/// always kept since it also holds content before the range. An ancestor
/// holding the `END` marker is kept unless the removal emptied it, which
/// preserves prose that follows the marker inside a shared list item.
pub fn remove_block(root: &mut Node, block: &DirectiveBlock) -> PipelineResult<()> {
	if !root.contains(block.start) || !root.contains(block.end) {
		return Err(PipelineError::DetachedBlock {
			content: block.content.clone(),
			start_line: block.start_line,
			end_line: block.end_line,
		});
	}

	remove_from_nodes(&mut root.children, block, false);

	Ok(())
}

/// Returns whether the range is still open after `nodes`.
fn remove_from_nodes(nodes: &mut Vec<Node>, block: &DirectiveBlock, parent_inside: bool) -> bool {
	let mut inside = parent_inside;
	let mut remove = vec![false; nodes.len()];

	for (index, node) in nodes.iter_mut().enumerate() {
		if node.id == block.start {
			inside = true;
			remove[index] = true;
			continue;
		}

		if node.id == block.end {
			inside = false;
			remove[index] = true;
			continue;
		}

		let was_inside = inside;
		inside = remove_from_nodes(&mut node.children, block, inside);

		remove[index] = match (was_inside, inside) {
			// Fully enclosed.
			(true, true) => true,
			// Closed somewhere below: drop only an emptied container.
			(true, false) => node.children.is_empty(),
			// Opened somewhere below, or untouched.
			(false, _) => false,
		};
	}

	let mut flags = remove.into_iter();
	nodes.retain(|_| !flags.next().unwrap_or(false));

	inside
}
