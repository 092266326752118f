//! Renaming collaborator
//!
//! Episode naming lives outside this crate. The driver only needs two things
//! from it: a target name template for a finished task whose template was not
//! recorded at submission, and the final file name for a given template and
//! current file name.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Context handed to [`Renamer::template_for`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenameHint {
    /// Save path recorded at submission, used to find the show
    pub download_dir: String,
    /// Display name reported by the provider
    pub title: String,
    /// Subtitle group parsed from the display name
    pub subgroup: Option<String>,
}

/// Produces target names for downloaded files
pub trait Renamer: Send + Sync {
    /// Synthesize a target name template, or `None` when no show matches
    fn template_for(&self, hint: &RenameHint) -> Option<String>;

    /// Apply `template` to `current_file_name`, producing the final file name
    fn final_name(&self, template: &str, current_file_name: &str) -> String;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Extensions treated as subtitle tracks
const SUBTITLE_EXTENSIONS: &[&str] = &["ass", "ssa", "srt", "vtt", "sup"];

fn language_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[A-Za-z]{2,4}(?:[-_][A-Za-z]{2,4})?$").expect("static regex")
    })
}

/// Default renamer: keeps the file's extension and subtitle language tag
///
/// `[Group] Show - 01.mkv` with template `Show S01E01` becomes `Show S01E01.mkv`,
/// `[Group] Show - 01.sc.ass` becomes `Show S01E01.sc.ass`. It has no show
/// catalog, so it never synthesizes templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionRenamer;

impl Renamer for ExtensionRenamer {
    fn template_for(&self, _hint: &RenameHint) -> Option<String> {
        None
    }

    fn final_name(&self, template: &str, current_file_name: &str) -> String {
        let path = Path::new(current_file_name);
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return template.to_string();
        };

        let is_subtitle = SUBTITLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str());
        let lang = path
            .file_stem()
            .map(Path::new)
            .and_then(|stem| stem.extension())
            .and_then(|l| l.to_str())
            .filter(|l| is_subtitle && language_tag().is_match(l));

        match lang {
            Some(lang) => format!("{template}.{lang}.{ext}"),
            None => format!("{template}.{ext}"),
        }
    }

    fn name(&self) -> &'static str {
        "extension"
    }
}
