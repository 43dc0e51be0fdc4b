use std::collections::HashSet;

use crate::error::{FishboneError, Result};
use crate::ir::Diagram;

/// Parses a diagram description. Accepts JSON5, so plain JSON works too.
pub fn parse_diagram(input: &str) -> Result<Diagram> {
    let mut diagram: Diagram =
        json5::from_str(input).map_err(|err| FishboneError::Parse(err.to_string()))?;
    normalize(&mut diagram)?;
    Ok(diagram)
}

fn normalize(diagram: &mut Diagram) -> Result<()> {
    diagram.source.label = diagram.source.label.trim().to_string();
    if let Some(title) = diagram.title.take() {
        let title = title.trim();
        if !title.is_empty() {
            diagram.title = Some(title.to_string());
        }
    }

    let mut seen = HashSet::new();
    for (index, category) in diagram.categories.iter_mut().enumerate() {
        let code = category.code.0.trim().to_string();
        if code.is_empty() {
            return Err(FishboneError::EmptyCategoryCode { index });
        }
        if !seen.insert(code.clone()) {
            return Err(FishboneError::DuplicateCategory(code));
        }
        category.code.0 = code;
        category.label = category.label.trim().to_string();
        category.rows.retain(|row| {
            !row.problem.trim().is_empty()
                || row
                    .solution
                    .as_deref()
                    .is_some_and(|solution| !solution.trim().is_empty())
        });
        for row in &mut category.rows {
            row.problem = row.problem.trim().to_string();
            if let Some(solution) = row.solution.take() {
                let solution = solution.trim();
                if !solution.is_empty() {
                    row.solution = Some(solution.to_string());
                }
            }
        }
    }
    Ok(())
}
