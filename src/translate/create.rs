//! Create translation.
//!
//! Each top-level input item becomes one `CALL { CREATE ... RETURN thisN }`
//! block; nested relationship creations recurse depth-first, so a create
//! with N nested creations yields exactly N+1 CREATE clauses and N MERGE
//! relationship clauses.

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::operation::CreateOperation;
use super::projection::build_projection;
use super::write;

pub fn translate_create(
    ctx: &mut TranslationContext<'_>,
    op: &CreateOperation,
) -> Result<String, TranslationError> {
    let node = ctx
        .model
        .node(&op.node)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(op.node.clone()))?;
    if op.input.is_empty() {
        return Err(TranslationError::invalid("create requires at least one input"));
    }

    let mut clauses = Vec::new();
    let mut vars = Vec::new();
    for (index, input) in op.input.iter().enumerate() {
        let var = format!("this{}", index);
        let mut block = Vec::new();
        write::create_node_block(ctx, &node, &var, input, &mut block)?;
        block.push(format!("RETURN {}", var));
        clauses.push(format!("CALL {{\n{}\n}}", block.join("\n")));
        vars.push(var);
    }

    // The mutation response nests the created nodes under the plural key.
    let node_selection = op
        .selection
        .iter()
        .find(|s| s.name == node.plural)
        .map(|s| s.selection.clone())
        .unwrap_or_default();

    let mut returns = Vec::new();
    for var in &vars {
        let projection =
            build_projection(ctx, &node, var, var, &node_selection, false, false)?;
        returns.push(format!("{} AS {}", projection.map_projection(var), var));
    }
    clauses.push(format!("RETURN {}", returns.join(", ")));

    Ok(clauses.join("\n"))
}
