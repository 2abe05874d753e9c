use crate::ops::{Operation, OperationList};
use thiserror::Error;

/// Contract violations while replaying an edit script.
///
/// These indicate a core-level bug, never a transient condition, and are
/// propagated immediately instead of being clamped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("retain of {count} exceeds remaining base length {remaining}")]
    RetainExceedsBase { count: usize, remaining: usize },

    #[error("delete of {count} exceeds remaining base length {remaining}")]
    DeleteExceedsBase { count: usize, remaining: usize },
}

// Compute an edit script turning `before` into `after`.
//
// Prefix/suffix-anchored: retain the longest common prefix, then the longest
// common suffix of the remainders (bounded so the two never overlap), and
// replace whatever sits between with a single delete-then-insert pair. A
// cheap linear scan, deterministic, not required to be globally minimal.
pub fn diff(before: &str, after: &str) -> OperationList {
    if before == after {
        return Vec::new();
    }

    let before_chars: Vec<char> = before.chars().collect();
    let after_chars: Vec<char> = after.chars().collect();

    let max_prefix = before_chars.len().min(after_chars.len());
    let mut prefix = 0;
    while prefix < max_prefix && before_chars[prefix] == after_chars[prefix] {
        prefix += 1;
    }

    // The suffix scan runs over the remainders only, so it can never
    // re-consume characters already claimed by the prefix.
    let max_suffix = (before_chars.len() - prefix).min(after_chars.len() - prefix);
    let mut suffix = 0;
    while suffix < max_suffix
        && before_chars[before_chars.len() - 1 - suffix] == after_chars[after_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let mut ops = Vec::new();
    if prefix > 0 {
        ops.push(Operation::Retain { count: prefix });
    }

    let deleted = before_chars.len() - prefix - suffix;
    if deleted > 0 {
        ops.push(Operation::Delete { count: deleted });
    }

    let inserted: String = after_chars[prefix..after_chars.len() - suffix].iter().collect();
    if !inserted.is_empty() {
        ops.push(Operation::Insert { text: inserted });
    }

    if suffix > 0 {
        ops.push(Operation::Retain { count: suffix });
    }

    ops
}

// Replay an edit script against a base string.
//
// Any unconsumed base suffix is appended after the last operation, so a
// script consisting of a lone leading insert is a valid prepend without a
// trailing retain.
pub fn apply(base: &str, ops: &[Operation]) -> Result<String, ApplyError> {
    let base_chars: Vec<char> = base.chars().collect();
    let mut cursor = 0usize;
    let mut out = String::with_capacity(base.len());

    for op in ops {
        match op {
            Operation::Retain { count } => {
                let remaining = base_chars.len() - cursor;
                if *count > remaining {
                    return Err(ApplyError::RetainExceedsBase {
                        count: *count,
                        remaining,
                    });
                }
                out.extend(&base_chars[cursor..cursor + count]);
                cursor += count;
            }
            Operation::Delete { count } => {
                let remaining = base_chars.len() - cursor;
                if *count > remaining {
                    return Err(ApplyError::DeleteExceedsBase {
                        count: *count,
                        remaining,
                    });
                }
                cursor += count;
            }
            Operation::Insert { text } => {
                // Empty inserts are a defensive no-op, not an error.
                if !text.is_empty() {
                    out.push_str(text);
                }
            }
        }
    }

    out.extend(&base_chars[cursor..]);
    Ok(out)
}
