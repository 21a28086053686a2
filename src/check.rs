//! Shape checking
//!
//! Pure comparison of resolved columns against an expectation. Errors
//! accumulate; only the scalar column-count guard short-circuits. Per column
//! the order is fixed: type mismatch first, then nullability.

use crate::error::ValidationError;
use crate::nullability::ResolvedColumn;
use crate::shape::{ExpectedColumn, ExpectedScalar, TypeSet};

/// Check one resolved column against an allowed-type set.
pub fn check_column(col: &ResolvedColumn, expected: &TypeSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !expected.allows(&col.host) {
        errors.push(ValidationError::TypeMismatch {
            column: col.name.clone(),
            expected: expected.allowed().to_vec(),
            actual: col.host,
        });
    }
    if col.nullable && !expected.allows_null() {
        errors.push(ValidationError::Nullability {
            column: col.name.clone(),
        });
    }
    errors
}

/// A scalar shape expects exactly one result column.
pub fn check_scalar(resolved: &[ResolvedColumn], expected: &ExpectedScalar) -> Vec<ValidationError> {
    match resolved {
        [col] => check_column(col, &expected.types),
        _ => vec![ValidationError::ColumnCountMismatch {
            expected: 1,
            actual: resolved.len(),
        }],
    }
}

/// Check a record shape: every declared field must have a result column of
/// the same name. Extra result columns the shape does not mention are
/// ignored. Errors follow the shape's declaration order.
pub fn check_record(
    resolved: &[ResolvedColumn],
    expected: &[ExpectedColumn],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for exp in expected {
        match resolved.iter().find(|c| c.name == exp.name) {
            Some(col) => errors.extend(check_column(col, &exp.types)),
            None => errors.push(ValidationError::ColumnNotFound {
                column: exp.name.clone(),
            }),
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::TypeSet;
    use crate::types::{HostType, Scalar};

    fn resolved(name: &str, host: Scalar, nullable: bool) -> ResolvedColumn {
        ResolvedColumn {
            name: name.to_string(),
            host: HostType::Scalar(host),
            nullable,
        }
    }

    fn expected(name: &str, types: TypeSet) -> ExpectedColumn {
        ExpectedColumn {
            name: name.to_string(),
            types,
        }
    }

    #[test]
    fn matching_column_is_clean() {
        let errors = check_column(
            &resolved("front", Scalar::Text, false),
            &TypeSet::of(Scalar::Text),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn type_mismatch_comes_before_nullability() {
        let errors = check_column(
            &resolved("score", Scalar::Text, true),
            &TypeSet::of(Scalar::I32),
        );
        insta::assert_debug_snapshot!(errors, @r###"
        [
            TypeMismatch {
                column: "score",
                expected: [
                    Scalar(
                        I32,
                    ),
                ],
                actual: Scalar(
                    Text,
                ),
            },
            Nullability {
                column: "score",
            },
        ]
        "###);
    }

    #[test]
    fn non_null_column_satisfies_nullable_expectation() {
        let errors = check_column(
            &resolved("front", Scalar::Text, false),
            &TypeSet::of(Scalar::Text).or_null(),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn scalar_count_guard_stops_checking() {
        let cols = [
            resolved("front", Scalar::Text, false),
            resolved("back", Scalar::I32, true),
        ];
        let errors = check_scalar(
            &cols,
            &ExpectedScalar {
                types: TypeSet::of(Scalar::Text),
            },
        );
        assert_eq!(
            errors,
            vec![ValidationError::ColumnCountMismatch {
                expected: 1,
                actual: 2
            }]
        );
    }

    #[test]
    fn zero_columns_against_scalar_is_a_count_mismatch() {
        let errors = check_scalar(
            &[],
            &ExpectedScalar {
                types: TypeSet::of(Scalar::Text),
            },
        );
        assert_eq!(
            errors,
            vec![ValidationError::ColumnCountMismatch {
                expected: 1,
                actual: 0
            }]
        );
    }

    #[test]
    fn missing_field_reports_column_not_found() {
        let cols = [resolved("front", Scalar::Text, false)];
        let errors = check_record(
            &cols,
            &[
                expected("front", TypeSet::of(Scalar::Text)),
                expected("back", TypeSet::of(Scalar::Text)),
            ],
        );
        assert_eq!(
            errors,
            vec![ValidationError::ColumnNotFound {
                column: "back".into()
            }]
        );
    }

    #[test]
    fn extra_result_columns_are_ignored() {
        let cols = [
            resolved("front", Scalar::Text, false),
            resolved("back", Scalar::Text, false),
        ];
        let errors = check_record(&cols, &[expected("front", TypeSet::of(Scalar::Text))]);
        assert!(errors.is_empty());
    }

    #[test]
    fn errors_follow_declaration_order_not_result_order() {
        let cols = [
            resolved("front", Scalar::I32, false),
            resolved("back", Scalar::I32, false),
        ];
        let errors = check_record(
            &cols,
            &[
                expected("back", TypeSet::of(Scalar::Text)),
                expected("front", TypeSet::of(Scalar::Text)),
            ],
        );
        let columns: Vec<_> = errors
            .iter()
            .map(|e| match e {
                ValidationError::TypeMismatch { column, .. } => column.clone(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(columns, ["back", "front"]);
    }

    #[test]
    fn matching_is_by_name_not_position() {
        let cols = [
            resolved("front", Scalar::Text, false),
            resolved("back", Scalar::Text, false),
        ];
        let errors = check_record(
            &cols,
            &[
                expected("back", TypeSet::of(Scalar::Text)),
                expected("front", TypeSet::of(Scalar::Text)),
            ],
        );
        assert!(errors.is_empty());
    }
}
