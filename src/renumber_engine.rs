//! The renumbering engine.
//!
//! Three operations share one ordering/padding core: separator
//! substitution, marker expansion (`preserve` mode) and absolute-to-season
//! conversion (the default). Per-folder planning is pure; the filesystem is
//! only touched in the apply step, so a dry run (`noact`) reports exactly
//! what a real run would do.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::config::Config;
use crate::error::{RenameError, Result};

/// One planned rename inside a season folder. `new_name == original_name`
/// means the entry is reported but the rename syscall is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRename {
    pub original_name: String,
    pub new_name: String,
}

/// Outcome counters for a run, merged across folders and root paths.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub failures: Vec<RenameError>,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.renamed += other.renamed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

pub struct RenumberEngine {
    config: Config,
    digits: Regex,
}

impl RenumberEngine {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let digits = Regex::new(r"\d+")?;
        Ok(Self { config, digits })
    }

    /// All maximal digit runs in `name`, left to right. Leading zeros are
    /// preserved as text.
    pub fn numeric_tokens<'a>(&self, name: &'a str) -> Vec<&'a str> {
        self.digits.find_iter(name).map(|m| m.as_str()).collect()
    }

    /// The first digit run in `name`. Callers treat the error as "skip
    /// this entry", never as fatal.
    pub fn first_numeric_token<'a>(&self, name: &'a str) -> Result<&'a str> {
        self.digits
            .find(name)
            .map(|m| m.as_str())
            .ok_or_else(|| RenameError::NoDigitsFound(name.to_string()))
    }

    /// Run the operation selected by the configuration over one root path.
    /// `preserve` wins over `doubleep`.
    pub fn process_root(&self, root: &Path) -> Result<RunSummary> {
        if self.config.options.preserve {
            self.expand_markers(root)
        } else if self.config.options.doubleep {
            self.convert_absolute(root, 2)
        } else {
            self.convert_absolute(root, 1)
        }
    }

    /// Marker expansion over every season folder directly under `root`.
    pub fn expand_markers(&self, root: &Path) -> Result<RunSummary> {
        self.process_folders(root, |season_token, files| {
            self.plan_marker_expansion(season_token, files)
        })
    }

    /// Absolute-to-season conversion over every season folder directly
    /// under `root`.
    pub fn convert_absolute(&self, root: &Path, episodes_per_file: u32) -> Result<RunSummary> {
        self.process_folders(root, |season_token, files| {
            self.plan_absolute_conversion(season_token, files, episodes_per_file)
        })
    }

    fn process_folders<F>(&self, root: &Path, plan: F) -> Result<RunSummary>
    where
        F: Fn(&str, &[String]) -> Vec<PlannedRename>,
    {
        let mut summary = RunSummary::default();
        for folder in list_entries(root, true)? {
            let Ok(season_token) = self.first_numeric_token(&folder) else {
                // No digit in the folder name: not a season folder.
                continue;
            };
            let folder_path = root.join(&folder);
            let files = list_entries(&folder_path, false)?;
            let planned = plan(season_token, &files);
            self.apply(&folder, &folder_path, &planned, &mut summary);
        }
        Ok(summary)
    }

    /// Plan `preserve`-mode renames for one season folder.
    ///
    /// Files sharing a first numeric token form one episode split into
    /// parts; the episode counter advances when the token changes, so
    /// numbering stays sequential from 1 regardless of gaps in the
    /// original numbers. Files without the marker keep their name.
    pub fn plan_marker_expansion(
        &self,
        season_token: &str,
        file_names: &[String],
    ) -> Vec<PlannedRename> {
        let files = self.sorted_by_token(file_names);

        let mut token_counts: HashMap<&str, usize> = HashMap::new();
        for name in &files {
            if let Ok(token) = self.first_numeric_token(name) {
                *token_counts.entry(token).or_default() += 1;
            }
        }

        let mut planned = Vec::with_capacity(files.len());
        let mut episode: u32 = 0;
        let mut part: u32 = 0;
        let mut last_token: Option<&str> = None;

        for name in &files {
            let Ok(token) = self.first_numeric_token(name) else {
                continue;
            };
            if last_token != Some(token) {
                episode += 1;
                part = 0;
            }
            last_token = Some(token);

            let core = if token_counts.get(token).copied().unwrap_or(0) > 1 {
                part += 1;
                format!(
                    "S{}{}E{}{} Part {}{}",
                    season_pad(season_token),
                    season_token,
                    episode_pad(files.len(), episode),
                    episode,
                    part_pad(part),
                    part,
                )
            } else {
                part = 0;
                format!(
                    "S{}{}E{}{}",
                    season_pad(season_token),
                    season_token,
                    episode_pad(files.len(), episode),
                    episode,
                )
            };

            let new_name = match name.find(&self.config.marker) {
                Some(pos) => self.splice(name, pos, self.config.marker.len(), &core, true),
                None => name.to_string(),
            };
            planned.push(PlannedRename {
                original_name: name.to_string(),
                new_name,
            });
        }
        planned
    }

    /// Plan absolute-to-season renames for one season folder.
    ///
    /// One running episode counter per folder; each file consumes
    /// `episodes_per_file` episode numbers and the rendered fragments are
    /// joined with the episode separator. Under `keepep` the file's
    /// original token text is reused as the episode number.
    ///
    /// The label replaces the first digit run in the name. That splice is
    /// not idempotent: on an already-converted name the first digit run is
    /// the season or episode number, not the absolute number. Pinned by
    /// regression tests below.
    pub fn plan_absolute_conversion(
        &self,
        season_token: &str,
        file_names: &[String],
        episodes_per_file: u32,
    ) -> Vec<PlannedRename> {
        let files = self.sorted_by_token(file_names);

        let mut planned = Vec::with_capacity(files.len());
        let mut episode: u32 = 0;

        for name in &files {
            let Some(token_match) = self.digits.find(name) else {
                continue;
            };
            let token = token_match.as_str();

            let mut fragments = Vec::with_capacity(episodes_per_file as usize);
            for _ in 0..episodes_per_file {
                episode += 1;
                let fragment = if self.config.options.keepep {
                    format!("S{}{}E{}", season_pad(season_token), season_token, token)
                } else {
                    format!(
                        "S{}{}E{}{}",
                        season_pad(season_token),
                        season_token,
                        episode_pad(files.len(), episode),
                        episode,
                    )
                };
                fragments.push(fragment);
            }
            let label = fragments.join(&self.config.episode_separator);

            let new_name = self.splice(name, token_match.start(), token.len(), &label, false);
            planned.push(PlannedRename {
                original_name: name.to_string(),
                new_name,
            });
        }
        planned
    }

    /// Digit-bearing names, stable-sorted by the integer value of the
    /// first token. Input order (lexicographic from enumeration) breaks
    /// ties.
    fn sorted_by_token<'a>(&self, file_names: &'a [String]) -> Vec<&'a str> {
        let mut files: Vec<&str> = file_names
            .iter()
            .map(String::as_str)
            .filter(|name| self.first_numeric_token(name).is_ok())
            .collect();
        files.sort_by_key(|name| {
            self.first_numeric_token(name)
                .map(token_value)
                .unwrap_or(u128::MAX)
        });
        files
    }

    /// Rebuild `name` with `label` replacing `len` bytes at `pos`. The
    /// field separator is prepended only when the splice point is not at
    /// the start of the name; `preserve` mode also appends the episode
    /// separator before the preserved remainder.
    fn splice(&self, name: &str, pos: usize, len: usize, label: &str, with_episode_sep: bool) -> String {
        let mut out = String::with_capacity(name.len() + label.len() + 8);
        out.push_str(&name[..pos]);
        if pos > 0 {
            out.push_str(&self.config.field_separator);
        }
        out.push_str(label);
        if with_episode_sep {
            out.push_str(&self.config.episode_separator);
        }
        out.push_str(&name[pos + len..]);
        out
    }

    /// Report and apply one folder's plan. Unchanged names skip the
    /// syscall; failed renames are collected and never abort the batch.
    fn apply(
        &self,
        folder: &str,
        folder_path: &Path,
        planned: &[PlannedRename],
        summary: &mut RunSummary,
    ) {
        for rename in planned {
            if self.config.options.print {
                println!(
                    "{:<25}/{:<50} -> {:<25}/{:<50}",
                    folder, rename.original_name, folder, rename.new_name
                );
            }
            if rename.new_name == rename.original_name {
                summary.skipped += 1;
                continue;
            }
            if self.config.options.noact {
                summary.renamed += 1;
                continue;
            }
            let from = folder_path.join(&rename.original_name);
            let to = folder_path.join(&rename.new_name);
            match fs::rename(&from, &to) {
                Ok(()) => summary.renamed += 1,
                Err(source) => summary
                    .failures
                    .push(RenameError::RenameFailed { from, to, source }),
            }
        }
    }
}

/// Replace the first occurrence of `old` with `new` in every non-hidden
/// entry name directly under `parent`, renaming on disk. Entries without an
/// occurrence are counted as skipped; rename failures are collected.
pub fn replace_separator(parent: &Path, old: &str, new: &str) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for entry in list_entries(parent, false)? {
        if entry.starts_with('.') {
            continue;
        }
        let new_name = entry.replacen(old, new, 1);
        if new_name == entry {
            summary.skipped += 1;
            continue;
        }
        let from = parent.join(&entry);
        let to = parent.join(&new_name);
        match fs::rename(&from, &to) {
            Ok(()) => summary.renamed += 1,
            Err(source) => summary
                .failures
                .push(RenameError::RenameFailed { from, to, source }),
        }
    }
    Ok(summary)
}

/// Immediate child names of `path`, lexicographically sorted. No recursion.
pub fn list_entries(path: &Path, directories_only: bool) -> Result<Vec<String>> {
    let read_dir = fs::read_dir(path).map_err(|source| RenameError::InvalidPath {
        path: path.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| RenameError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;
        if directories_only && !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Season zero-padding: pad iff the value is below 10 and the raw token is
/// not already zero-prefixed ("7" pads to "07"; "07" and "007" stay).
pub fn season_pad(season_token: &str) -> &'static str {
    if token_value(season_token) < 10 && !season_token.starts_with('0') {
        "0"
    } else {
        ""
    }
}

/// Episode zero-padding scales with the size of the season folder: three
/// digits for folders holding 100 files or more, two otherwise.
pub fn episode_pad(file_count: usize, episode: u32) -> &'static str {
    if file_count >= 100 && episode < 10 {
        "00"
    } else if file_count >= 100 && episode < 100 {
        "0"
    } else if episode < 10 {
        "0"
    } else {
        ""
    }
}

/// Part zero-padding: two digits up to part 99.
pub fn part_pad(part: u32) -> &'static str {
    if part < 10 { "0" } else { "" }
}

// Digit runs too long for u128 saturate; ordering stays deterministic.
fn token_value(token: &str) -> u128 {
    token.parse().unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn engine() -> RenumberEngine {
        RenumberEngine::new(Config::default()).unwrap()
    }

    fn engine_with(args: &[&str]) -> RenumberEngine {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        RenumberEngine::new(Config::from_args(&args).unwrap()).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn new_names(planned: &[PlannedRename]) -> Vec<&str> {
        planned.iter().map(|p| p.new_name.as_str()).collect()
    }

    #[test]
    fn test_numeric_tokens() {
        let engine = engine();
        assert_eq!(engine.numeric_tokens("S01E02 - 003.mkv"), vec!["01", "02", "003"]);
        assert!(engine.numeric_tokens("cover.jpg").is_empty());
    }

    #[test]
    fn test_first_numeric_token_missing() {
        let err = engine().first_numeric_token("extras.mkv").unwrap_err();
        assert!(matches!(err, RenameError::NoDigitsFound(_)));
    }

    #[test]
    fn test_season_pad() {
        assert_eq!(season_pad("7"), "0");
        assert_eq!(season_pad("07"), "");
        assert_eq!(season_pad("007"), "");
        assert_eq!(season_pad("12"), "");
    }

    #[test]
    fn test_episode_pad() {
        assert_eq!(episode_pad(30, 5), "0");
        assert_eq!(episode_pad(30, 12), "");
        assert_eq!(episode_pad(120, 5), "00");
        assert_eq!(episode_pad(120, 50), "0");
        assert_eq!(episode_pad(120, 100), "");
    }

    #[test]
    fn test_part_pad() {
        assert_eq!(part_pad(9), "0");
        assert_eq!(part_pad(10), "");
    }

    #[test]
    fn test_absolute_basic() {
        let planned = engine().plan_absolute_conversion("1", &names(&["01.mkv", "02.mkv"]), 1);
        assert_eq!(new_names(&planned), vec!["S01E01.mkv", "S01E02.mkv"]);
    }

    #[test]
    fn test_absolute_gaps_become_sequential() {
        let planned =
            engine().plan_absolute_conversion("3", &names(&["03.mkv", "07.mkv", "09.mkv"]), 1);
        assert_eq!(
            new_names(&planned),
            vec!["S03E01.mkv", "S03E02.mkv", "S03E03.mkv"]
        );
    }

    #[test]
    fn test_absolute_sorts_by_token_value_not_text() {
        let planned = engine().plan_absolute_conversion("1", &names(&["10.mkv", "2.mkv"]), 1);
        assert_eq!(planned[0].original_name, "2.mkv");
        assert_eq!(new_names(&planned), vec!["S01E01.mkv", "S01E02.mkv"]);
    }

    #[test]
    fn test_absolute_skips_digitless_files() {
        let planned =
            engine().plan_absolute_conversion("1", &names(&["cover.jpg", "05.mkv"]), 1);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].original_name, "05.mkv");
    }

    #[test]
    fn test_absolute_mid_name_token_gets_field_separator() {
        let planned = engine().plan_absolute_conversion("1", &names(&["Show05.mkv"]), 1);
        assert_eq!(new_names(&planned), vec!["Show - S01E01.mkv"]);
    }

    #[test]
    fn test_keepep_reuses_original_token() {
        let planned =
            engine_with(&["-options:keepep"]).plan_absolute_conversion("1", &names(&["05.mkv"]), 1);
        assert_eq!(new_names(&planned), vec!["S01E05.mkv"]);
    }

    #[test]
    fn test_doubleep_combines_two_episodes() {
        let planned =
            engine().plan_absolute_conversion("1", &names(&["01.mkv", "02.mkv"]), 2);
        assert_eq!(
            new_names(&planned),
            vec!["S01E01 - S01E02.mkv", "S01E03 - S01E04.mkv"]
        );
    }

    #[test]
    fn test_doubleep_uses_configured_episode_separator() {
        let planned = engine_with(&["-eseparator:."])
            .plan_absolute_conversion("1", &names(&["01.mkv"]), 2);
        assert_eq!(new_names(&planned), vec!["S01E01.S01E02.mkv"]);
    }

    #[test]
    fn test_doubleep_keepep_repeats_token() {
        let planned = engine_with(&["-options:keepep"])
            .plan_absolute_conversion("1", &names(&["05.mkv"]), 2);
        assert_eq!(new_names(&planned), vec!["S01E05 - S01E05.mkv"]);
    }

    #[test]
    fn test_large_folder_uses_three_digit_episodes() {
        let files: Vec<String> = (1..=100).map(|i| format!("{i}.mkv")).collect();
        let planned = engine().plan_absolute_conversion("1", &files, 1);
        assert_eq!(planned[0].new_name, "S01E001.mkv");
        assert_eq!(planned[99].new_name, "S01E100.mkv");
    }

    // Running the conversion twice corrupts names: the first digit run of
    // an already-converted name is the season number.
    #[test]
    fn test_absolute_is_not_idempotent() {
        let planned = engine().plan_absolute_conversion("1", &names(&["S01E01.mkv"]), 1);
        assert_eq!(new_names(&planned), vec!["S - S01E01E01.mkv"]);
    }

    // A filename that starts with the season text gets spliced there, not
    // at the absolute number.
    #[test]
    fn test_absolute_season_text_in_filename() {
        let planned =
            engine().plan_absolute_conversion("02", &names(&["02 episode 05.mkv"]), 1);
        assert_eq!(new_names(&planned), vec!["S02E01 episode 05.mkv"]);
    }

    #[test]
    fn test_marker_expansion_basic() {
        let planned =
            engine().plan_marker_expansion("02", &names(&["***01.mkv", "***02.mkv"]));
        assert_eq!(
            new_names(&planned),
            vec!["S02E01 - 01.mkv", "S02E02 - 02.mkv"]
        );
    }

    #[test]
    fn test_marker_expansion_multi_part() {
        let planned = engine().plan_marker_expansion(
            "1",
            &names(&["***05 cd1.mkv", "***05 cd2.mkv", "***06.mkv"]),
        );
        assert_eq!(
            new_names(&planned),
            vec![
                "S01E01 Part 01 - 05 cd1.mkv",
                "S01E01 Part 02 - 05 cd2.mkv",
                "S01E02 - 06.mkv",
            ]
        );
    }

    #[test]
    fn test_marker_expansion_mid_name() {
        let planned = engine().plan_marker_expansion("1", &names(&["Show***01.mkv"]));
        assert_eq!(new_names(&planned), vec!["Show - S01E01 - 01.mkv"]);
    }

    #[test]
    fn test_marker_expansion_custom_marker() {
        let planned =
            engine_with(&["-marker:@@"]).plan_marker_expansion("1", &names(&["@@07.mkv"]));
        assert_eq!(new_names(&planned), vec!["S01E01 - 07.mkv"]);
    }

    // A digit-bearing file without the marker keeps its name but still
    // consumes an episode number.
    #[test]
    fn test_marker_expansion_without_marker_consumes_episode() {
        let planned =
            engine().plan_marker_expansion("1", &names(&["***01.mkv", "02.mkv", "***03.mkv"]));
        assert_eq!(
            new_names(&planned),
            vec!["S01E01 - 01.mkv", "02.mkv", "S01E03 - 03.mkv"]
        );
    }

    #[test]
    fn test_marker_expansion_keeps_zero_prefixed_season() {
        let planned = engine().plan_marker_expansion("007", &names(&["***01.mkv"]));
        assert_eq!(new_names(&planned), vec!["S007E01 - 01.mkv"]);
    }
}
