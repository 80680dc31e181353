//! Unified line diff between a program's output and the reference output

use std::ops::Range;

use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffTag};

use crate::constants::{DIFF_CONTEXT_LINES, DIFF_FROM_LABEL, DIFF_TO_LABEL};

/// Diff captured output against reference output.
///
/// Both sides are trimmed before splitting into lines. An empty result
/// means the trimmed texts are identical.
pub fn output_diff(captured: &str, reference: &str) -> Vec<String> {
    unified_diff(
        captured.trim(),
        reference.trim(),
        DIFF_FROM_LABEL,
        DIFF_TO_LABEL,
        DIFF_CONTEXT_LINES,
    )
}

/// Render a unified diff of `old` against `new`, one entry per line.
pub fn unified_diff(old: &str, new: &str, from: &str, to: &str, context: usize) -> Vec<String> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let ops = capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines);
    if ops.iter().all(|op| op.tag() == DiffTag::Equal) {
        return Vec::new();
    }

    let mut out = vec![format!("--- {}", from), format!("+++ {}", to)];

    for group in group_diff_ops(ops, context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_span = first.old_range().start..last.old_range().end;
        let new_span = first.new_range().start..last.new_range().end;
        out.push(format!(
            "@@ -{} +{} @@",
            hunk_range(&old_span),
            hunk_range(&new_span)
        ));

        for op in &group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    out.extend(old_lines[old_range].iter().map(|l| format!(" {}", l)));
                }
                DiffTag::Delete => {
                    out.extend(old_lines[old_range].iter().map(|l| format!("-{}", l)));
                }
                DiffTag::Insert => {
                    out.extend(new_lines[new_range].iter().map(|l| format!("+{}", l)));
                }
                DiffTag::Replace => {
                    out.extend(old_lines[old_range].iter().map(|l| format!("-{}", l)));
                    out.extend(new_lines[new_range].iter().map(|l| format!("+{}", l)));
                }
            }
        }
    }

    out
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before it.
fn hunk_range(range: &Range<usize>) -> String {
    let len = range.end - range.start;
    match len {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        _ => format!("{},{}", range.start + 1, len),
    }
}
