//! Human-readable summary renderer for diffs.

use crate::codec;
use crate::diff::model::Diff;

/// Render a Markdown table of the changes in a [`Diff`].
///
/// Informational only; values are shown in their wire form.
pub fn render_human_summary(diff: &Diff) -> String {
    let mut out = String::from("## Document Diff\n\n");

    if diff.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }

    out.push_str(&format!("**Changes**: {}\n\n", diff.len()));
    out.push_str("| Path | From | To |\n|---|---|---|\n");
    for (path, change) in diff.iter() {
        out.push_str(&format!(
            "| `{}` | `{}` | `{}` |\n",
            path,
            codec::encode_field(change.from()),
            codec::encode_field(change.to()),
        ));
    }
    out
}
