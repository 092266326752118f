//! Best-effort heuristics
//!
//! The provider offers no stable link from a finished offline task to the files
//! it produced, and sometimes omits the id of a task it just accepted. The
//! functions here fill those gaps by guessing. Each one is a heuristic with
//! known false positives and false negatives, documented on the function, and
//! is kept separate so its behaviour stays visible and testable.

use crate::types::TaskId;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn subgroup_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[\[【]([^\]】]+)[\]】]").expect("static regex")
    })
}

/// Subtitle group from a leading `[Group]` or `【Group】` in a release name
pub fn extract_subgroup(display_name: &str) -> Option<String> {
    subgroup_pattern()
        .captures(display_name.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|group| !group.is_empty())
}

/// `name` without its last extension; a leading dot is not an extension
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Whether a remote file looks like it belongs to a task with `display_name`
///
/// Heuristic. A file matches when its name equals the display name, when both
/// names are equal without their extension, or when the file name contains
/// the display name's stem. The last rule picks up companion files such as
/// `Show - 01.sc.ass` next to `Show - 01.mkv`.
///
/// False positives: an unrelated file whose name contains a short stem
/// (a display name of `01.mkv` matches `S01E01.mkv`). False negatives: files
/// the provider renamed on extraction, or multi-file releases whose inner
/// names share nothing with the task's display name.
pub fn matches_display_name(file_name: &str, display_name: &str) -> bool {
    if file_name == display_name {
        return true;
    }

    let display_stem = strip_extension(display_name);
    if display_stem.is_empty() {
        return false;
    }

    strip_extension(file_name) == display_stem || file_name.contains(display_stem)
}

/// Recover the id of a task whose submission response carried none
///
/// Heuristic. Returns the first task in the provider's listing order that no
/// submission record claims. The listing is newest-first, so right after a
/// submission this is usually the task just created.
///
/// Known gap: with two submissions in flight at once, both can adopt the same
/// task, or each the other's. Nothing here guards against that.
pub fn adopt_first_untracked(listed: &[TaskId], tracked: &HashSet<TaskId>) -> Option<TaskId> {
    listed.iter().copied().find(|id| !tracked.contains(id))
}
