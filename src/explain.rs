//! Plan-based nullability inference
//!
//! `EXPLAIN (VERBOSE, FORMAT JSON) EXECUTE <stmt>` exposes, per plan node,
//! its output columns, its join type, and its relationship to the parent
//! node. A result column whose only source sits on the nullable side of an
//! outer join is nullable at runtime no matter what `pg_attribute` says about
//! the underlying column; this walk finds those.

use postgres::Client;
use serde::Deserialize;

use crate::describe::{NullabilityOverride, UnresolvedColumn};
use crate::error::Error;

/// Outer-join kinds the walk cares about. Inner joins and plain nodes carry
/// no join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn from_raw(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("Left") => Some(Self::Left),
            Some("Right") => Some(Self::Right),
            Some("Full") => Some(Self::Full),
            _ => None,
        }
    }
}

/// How a node relates to its parent. `Inner` means the node feeds the
/// nullable half of the parent's outer join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRelation {
    Inner,
    Outer,
}

impl ParentRelation {
    fn from_raw(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("Inner") => Some(Self::Inner),
            Some("Outer") => Some(Self::Outer),
            _ => None,
        }
    }
}

/// One node of the parsed plan tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub join: Option<JoinKind>,
    pub parent: Option<ParentRelation>,
    pub output: Vec<String>,
    pub children: Vec<PlanNode>,
}

#[derive(Deserialize)]
struct RawExplain {
    #[serde(rename = "Plan")]
    plan: RawPlan,
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(rename = "Join Type")]
    join_type: Option<String>,
    #[serde(rename = "Parent Relationship")]
    parent_relation: Option<String>,
    #[serde(rename = "Output")]
    output: Option<Vec<String>>,
    #[serde(rename = "Plans")]
    plans: Option<Vec<RawPlan>>,
}

impl PlanNode {
    /// Unknown join-type or relationship strings map to none rather than
    /// failing; the planner grows node kinds faster than we care about them.
    fn from_raw(raw: RawPlan) -> Self {
        PlanNode {
            join: JoinKind::from_raw(raw.join_type.as_deref()),
            parent: ParentRelation::from_raw(raw.parent_relation.as_deref()),
            output: raw.output.unwrap_or_default(),
            children: raw
                .plans
                .unwrap_or_default()
                .into_iter()
                .map(PlanNode::from_raw)
                .collect(),
        }
    }
}

/// Walk the plan and mark which of the root's outputs are nullable.
///
/// A node's outputs are forced nullable when the node is a Full join, or when
/// it is the inner relation of its parent (only one side of an outer join
/// contributes it). The walk descends only through Left and Right join nodes;
/// any other node terminates its branch, so an outer join hidden below a
/// Sort, Aggregate, or similar node is never reached. Known
/// under-approximation: such columns keep their catalog nullability.
pub fn nullable_outputs(root: &PlanNode) -> Vec<bool> {
    let mut nullable = vec![false; root.output.len()];
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.join == Some(JoinKind::Full) || node.parent == Some(ParentRelation::Inner) {
            for col in &node.output {
                if let Some(i) = root.output.iter().position(|o| o == col) {
                    nullable[i] = true;
                }
            }
        }
        if matches!(node.join, Some(JoinKind::Left | JoinKind::Right)) {
            stack.extend(&node.children);
        }
    }

    nullable
}

/// Run EXPLAIN against the named prepared statement and derive overrides for
/// the columns the plan proves nullable.
///
/// The root plan's output list aligns positionally with the described result
/// columns, so overrides are emitted by index, named after the display name.
pub fn collect_explain_nullability(
    client: &mut Client,
    statement: &str,
    columns: &[UnresolvedColumn],
) -> Result<Vec<NullabilityOverride>, Error> {
    let params: i32 = client
        .query_opt(
            "SELECT coalesce(array_length(parameter_types, 1), 0) \
             FROM pg_prepared_statements WHERE name = $1",
            &[&statement],
        )?
        .ok_or_else(|| Error::MissingPreparedStatement {
            statement: statement.to_string(),
        })?
        .try_get(0)?;

    let mut explain = format!("EXPLAIN (VERBOSE, FORMAT JSON) EXECUTE {statement}");
    if params > 0 {
        explain.push('(');
        for i in 0..params {
            if i > 0 {
                explain.push_str(", ");
            }
            // NULL binds against any inferred parameter type.
            explain.push_str("NULL");
        }
        explain.push(')');
    }

    let row = client
        .query_opt(explain.as_str(), &[])?
        .ok_or(Error::EmptyExplain)?;
    let value: serde_json::Value = row.try_get(0)?;
    let [raw]: [RawExplain; 1] = serde_json::from_value(value)?;

    let plan = PlanNode::from_raw(raw.plan);
    Ok(columns
        .iter()
        .zip(nullable_outputs(&plan))
        .filter(|(_, nullable)| *nullable)
        .map(|(col, _)| NullabilityOverride {
            name: col.name.clone(),
            is_nullable: true,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(plan: serde_json::Value) -> PlanNode {
        let raw: RawPlan = serde_json::from_value(plan).unwrap();
        PlanNode::from_raw(raw)
    }

    #[test]
    fn left_join_marks_only_the_inner_side() {
        let plan = parse(serde_json::json!({
            "Join Type": "Left",
            "Output": ["cards.front", "reviews.score"],
            "Plans": [
                {
                    "Parent Relationship": "Outer",
                    "Output": ["cards.front"],
                },
                {
                    "Parent Relationship": "Inner",
                    "Output": ["reviews.score"],
                },
            ],
        }));
        assert_eq!(nullable_outputs(&plan), vec![false, true]);
    }

    #[test]
    fn full_join_marks_every_root_output() {
        let plan = parse(serde_json::json!({
            "Join Type": "Full",
            "Output": ["cards.front", "reviews.score"],
            "Plans": [
                { "Parent Relationship": "Outer", "Output": ["cards.front"] },
                { "Parent Relationship": "Inner", "Output": ["reviews.score"] },
            ],
        }));
        assert_eq!(nullable_outputs(&plan), vec![true, true]);
    }

    #[test]
    fn inner_join_marks_nothing() {
        let plan = parse(serde_json::json!({
            "Join Type": "Inner",
            "Output": ["cards.front", "reviews.score"],
            "Plans": [
                { "Parent Relationship": "Outer", "Output": ["cards.front"] },
                { "Parent Relationship": "Inner", "Output": ["reviews.score"] },
            ],
        }));
        // "Inner" is not an outer-join kind, so the node neither marks its
        // outputs nor descends.
        assert_eq!(nullable_outputs(&plan), vec![false, false]);
    }

    #[test]
    fn walk_stops_at_non_join_nodes() {
        // A sort above a left join hides the join from the walk entirely.
        let plan = parse(serde_json::json!({
            "Output": ["reviews.score"],
            "Plans": [
                {
                    "Join Type": "Left",
                    "Parent Relationship": "Outer",
                    "Output": ["reviews.score"],
                    "Plans": [
                        { "Parent Relationship": "Inner", "Output": ["reviews.score"] },
                    ],
                },
            ],
        }));
        assert_eq!(nullable_outputs(&plan), vec![false]);
    }

    #[test]
    fn nested_left_joins_propagate_through_the_outer_path() {
        let plan = parse(serde_json::json!({
            "Join Type": "Left",
            "Output": ["a.x", "b.y", "c.z"],
            "Plans": [
                {
                    "Join Type": "Left",
                    "Parent Relationship": "Outer",
                    "Output": ["a.x", "b.y"],
                    "Plans": [
                        { "Parent Relationship": "Outer", "Output": ["a.x"] },
                        { "Parent Relationship": "Inner", "Output": ["b.y"] },
                    ],
                },
                { "Parent Relationship": "Inner", "Output": ["c.z"] },
            ],
        }));
        assert_eq!(nullable_outputs(&plan), vec![false, true, true]);
    }

    #[test]
    fn unknown_join_kind_is_treated_as_no_join() {
        let plan = parse(serde_json::json!({
            "Join Type": "Semi",
            "Output": ["a.x"],
            "Plans": [
                { "Parent Relationship": "Inner", "Output": ["a.x"] },
            ],
        }));
        assert_eq!(nullable_outputs(&plan), vec![false]);
    }

    #[test]
    fn deep_plans_do_not_exhaust_the_stack() {
        let mut node = PlanNode {
            join: None,
            parent: Some(ParentRelation::Inner),
            output: vec!["t.v".to_string()],
            children: Vec::new(),
        };
        for _ in 0..2048 {
            node = PlanNode {
                join: Some(JoinKind::Left),
                parent: Some(ParentRelation::Outer),
                output: vec!["t.v".to_string()],
                children: vec![node],
            };
        }
        assert_eq!(nullable_outputs(&node), vec![true]);

        // Tear the tree down without recursive drop glue.
        while let Some(child) = node.children.pop() {
            node = child;
        }
    }
}
