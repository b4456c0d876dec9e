//! Per-project file table, edits and analysis jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use super::error::ProjectError;
use crate::base::{FileId, LineCol, LineIndex, Location};
use crate::parser::SyntaxError;
use crate::reparse::{ReparseUpdater, TextEdit};
use crate::semantic::{
    AnalysisOptions, AnalysisReport, Diagnostic, ModuleSet, analyze, codes,
};
use crate::syntax::{Module, Reference, parse_file};

/// One source file of a project.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: Arc<str>,
    pub line_index: Arc<LineIndex>,
    /// Frozen snapshot; edits replace it instead of mutating it.
    pub module: Option<Arc<Module>>,
    pub syntax_errors: Vec<SyntaxError>,
}

/// How an edit reached the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The existing tree was patched.
    Patched,
    /// The file was parsed again.
    Reparsed,
}

#[derive(Debug, Default)]
struct FileTable {
    next_id: u32,
    ids: FxHashMap<PathBuf, FileId>,
    files: IndexMap<FileId, SourceFile>,
}

/// The last completed analysis together with the modules it checked.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub modules: ModuleSet,
    pub report: Arc<AnalysisReport>,
}

/// Owns the files of one project and runs analyses over them.
///
/// Readers always work on `Arc<Module>` snapshots, so an analysis running in
/// the background is never affected by edits applied meanwhile. Analyses of
/// one project run one at a time.
#[derive(Debug)]
pub struct ProjectSourceParser {
    name: String,
    options: AnalysisOptions,
    files: RwLock<FileTable>,
    /// Held for a whole check cycle.
    analysis_lock: Mutex<()>,
    last_analysis: Mutex<Option<AnalysisSnapshot>>,
}

fn parse(file: FileId, path: PathBuf, text: Arc<str>) -> SourceFile {
    let parsed = parse_file(file, &text);
    if parsed.module.is_none() {
        tracing::warn!(path = %path.display(), "no module found in file");
    }
    SourceFile {
        path,
        line_index: Arc::new(LineIndex::new(&text)),
        module: parsed.module.map(Arc::new),
        syntax_errors: parsed.errors,
        text,
    }
}

impl ProjectSourceParser {
    pub fn new(name: impl Into<String>, options: AnalysisOptions) -> Self {
        Self {
            name: name.into(),
            options,
            files: RwLock::new(FileTable::default()),
            analysis_lock: Mutex::new(()),
            last_analysis: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Set the full text of a file, parsing it from scratch.
    pub fn set_file_content(&self, path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> FileId {
        let path = path.into();
        let mut table = self.files.write();
        let id = match table.ids.get(&path) {
            Some(id) => *id,
            None => {
                let id = FileId::new(table.next_id);
                table.next_id += 1;
                table.ids.insert(path.clone(), id);
                id
            }
        };
        let source = parse(id, path, text.into());
        tracing::debug!(
            project = %self.name,
            file = %id,
            errors = source.syntax_errors.len(),
            "file set"
        );
        table.files.insert(id, source);
        id
    }

    pub fn remove_file(&self, path: &Path) -> bool {
        let mut table = self.files.write();
        let Some(id) = table.ids.remove(path) else {
            return false;
        };
        table.files.shift_remove(&id).is_some()
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.files.read().ids.get(path).copied()
    }

    pub fn file(&self, file: FileId) -> Option<SourceFile> {
        self.files.read().files.get(&file).cloned()
    }

    pub fn module(&self, file: FileId) -> Option<Arc<Module>> {
        self.files.read().files.get(&file)?.module.clone()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().files.len()
    }

    /// The module snapshots of every file, in file order.
    pub fn module_set(&self) -> ModuleSet {
        let table = self.files.read();
        ModuleSet::new(table.files.values().filter_map(|f| f.module.clone()))
    }

    /// The 0-indexed line and column where `location` starts in the
    /// current text of its file.
    pub fn line_col(&self, location: &Location) -> Option<LineCol> {
        if location.is_none() {
            return None;
        }
        let table = self.files.read();
        let source = table.files.get(&location.file())?;
        Some(source.line_index.line_col(location.range().start()))
    }

    /// Syntax errors of all files as diagnostics.
    pub fn syntax_diagnostics(&self) -> Vec<Diagnostic> {
        let table = self.files.read();
        table
            .files
            .iter()
            .flat_map(|(id, source)| {
                source.syntax_errors.iter().map(move |error| {
                    Diagnostic::error(Location::new(*id, error.range), error.message.clone())
                        .with_code(codes::SYNTAX_ERROR)
                })
            })
            .collect()
    }

    /// Apply an edit to a file.
    ///
    /// A tree without syntax errors is patched incrementally on a copy; the
    /// file is parsed again when the patch is not possible.
    pub fn apply_edit(&self, file: FileId, edit: &TextEdit) -> Result<EditOutcome, ProjectError> {
        let mut table = self.files.write();
        let source = table
            .files
            .get_mut(&file)
            .ok_or(ProjectError::UnknownFile(file))?;
        let text: Arc<str> = edit.apply(&source.text)?.into();

        if let Some(module) = source.module.as_ref().filter(|_| source.syntax_errors.is_empty()) {
            let mut patched = Module::clone(module);
            let mut updater = ReparseUpdater::for_edit(&text, edit);
            match patched.update_syntax(&mut updater) {
                Ok(()) => {
                    if patched.name() != module.name() {
                        tracing::debug!(
                            from = %module.name(),
                            to = %patched.name(),
                            "module renamed"
                        );
                    }
                    source.module = Some(Arc::new(patched));
                    source.line_index = Arc::new(LineIndex::new(&text));
                    source.text = text;
                    return Ok(EditOutcome::Patched);
                }
                Err(err) => {
                    tracing::debug!(file = %file, error = %err, "incremental reparse failed");
                }
            }
        }

        *source = parse(file, source.path.clone(), text);
        Ok(EditOutcome::Reparsed)
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Check every module of the project, blocking until done.
    ///
    /// Waits for a running analysis of this project to finish first. Two
    /// interleaved cycles would each skip the nodes the other already
    /// stamped and report only part of the diagnostics.
    pub fn analyze(&self, cancel: &CancellationToken) -> Arc<AnalysisReport> {
        let _running = self.analysis_lock.lock();
        let modules = self.module_set();
        let report = Arc::new(analyze(&modules, &self.options, cancel));
        if !report.cancelled {
            self.record_analysis(AnalysisSnapshot {
                modules,
                report: Arc::clone(&report),
            });
        }
        report
    }

    /// Store `snapshot` as the last analysis unless a later one is stored.
    fn record_analysis(&self, snapshot: AnalysisSnapshot) -> bool {
        let mut last = self.last_analysis.lock();
        let newer = last
            .as_ref()
            .is_none_or(|stored| stored.report.timestamp.is_less(snapshot.report.timestamp));
        if !newer {
            tracing::debug!(
                project = %self.name,
                timestamp = ?snapshot.report.timestamp,
                "discarding analysis older than the recorded one"
            );
            return false;
        }
        *last = Some(snapshot);
        true
    }

    /// Run [`analyze`](Self::analyze) on a worker thread.
    pub fn analyze_in_background(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<Arc<AnalysisReport>> {
        let project = Arc::clone(self);
        std::thread::spawn(move || project.analyze(&cancel))
    }

    /// The last analysis that ran to completion.
    pub fn last_analysis(&self) -> Option<AnalysisSnapshot> {
        self.last_analysis.lock().clone()
    }

    /// Unresolved references of the module in `file` from its last check.
    pub fn missing_references(&self, file: FileId) -> Vec<Reference> {
        let Some(module) = self.module(file) else {
            return Vec::new();
        };
        // Edits replace snapshots, so look up the one that was checked.
        self.last_analysis()
            .and_then(|snapshot| {
                snapshot
                    .modules
                    .modules()
                    .find(|m| m.file() == file)
                    .map(|m| m.missing_references())
            })
            .unwrap_or_else(|| module.missing_references())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectSourceParser {
        ProjectSourceParser::new("test", AnalysisOptions::default())
    }

    #[test]
    fn test_set_file_content_reuses_ids() {
        let project = project();
        let a = project.set_file_content("a.ttcn", "module A { }");
        let b = project.set_file_content("b.ttcn", "module B { }");
        assert_ne!(a, b);
        assert_eq!(project.set_file_content("a.ttcn", "module A2 { }"), a);
        assert_eq!(project.module(a).unwrap().name(), "A2");
        assert_eq!(project.file_count(), 2);
        assert!(project.remove_file(Path::new("b.ttcn")));
        assert!(project.module(b).is_none());
    }

    #[test]
    fn test_apply_edit_patches_or_reparses() {
        let project = project();
        let text = "module A { const integer c := 1; }";
        let file = project.set_file_content("a.ttcn", text);
        let before = project.module(file).unwrap();

        let rename = TextEdit::new(25, 26, "limit");
        assert_eq!(project.apply_edit(file, &rename).unwrap(), EditOutcome::Patched);
        let after = project.module(file).unwrap();
        assert!(after.definition("limit").is_some());
        // the old snapshot is still intact
        assert!(before.definition("c").is_some());

        let broken = TextEdit::insert(11, "}}");
        assert_eq!(project.apply_edit(file, &broken).unwrap(), EditOutcome::Reparsed);
        assert!(!project.file(file).unwrap().syntax_errors.is_empty());
        assert!(!project.syntax_diagnostics().is_empty());
    }

    #[test]
    fn test_line_col_follows_edits() {
        let project = project();
        let file = project.set_file_content("a.ttcn", "module A {\n  const integer c := x;\n}\n");
        let report = project.analyze(&CancellationToken::new());
        let errors = report.markers.for_file(file);
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert_eq!(
            project.line_col(&errors[0].location),
            Some(LineCol { line: 1, col: 21 })
        );

        project.apply_edit(file, &TextEdit::insert(0, "\n\n")).unwrap();
        assert_eq!(
            project.line_col(&Location::from_offsets(file, 2, 8)),
            Some(LineCol { line: 2, col: 0 })
        );
        assert_eq!(project.line_col(&Location::none()), None);
        assert_eq!(project.line_col(&Location::from_offsets(FileId::new(99), 0, 1)), None);
    }

    #[test]
    fn test_apply_edit_errors() {
        let project = project();
        let file = project.set_file_content("a.ttcn", "module A { }");
        assert!(matches!(
            project.apply_edit(FileId::new(99), &TextEdit::insert(0, " ")),
            Err(ProjectError::UnknownFile(_))
        ));
        assert!(matches!(
            project.apply_edit(file, &TextEdit::insert(100, " ")),
            Err(ProjectError::Edit(_))
        ));
    }

    #[test]
    fn test_background_analysis_reports_missing_references() {
        let project = Arc::new(project());
        let m = project.set_file_content(
            "m.ttcn",
            "module M { import from N all; const integer a := foo; const integer b := bar; }",
        );
        project.set_file_content(
            "n.ttcn",
            "module N { const integer foo := 1; private const integer bar := 2; }",
        );
        let report = project
            .analyze_in_background(CancellationToken::new())
            .join()
            .unwrap();
        assert!(report.has_errors());
        let missing: Vec<_> = project
            .missing_references(m)
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(missing, vec!["bar"]);
        assert!(project.last_analysis().is_some());
    }

    #[test]
    fn test_older_analysis_does_not_replace_newer() {
        let project = project();
        project.set_file_content("a.ttcn", "module A { const integer c := missing; }");
        let cancel = CancellationToken::new();
        let first = project.analyze(&cancel);
        let second = project.analyze(&cancel);
        assert!(first.timestamp.is_less(second.timestamp));

        let stale = AnalysisSnapshot {
            modules: project.module_set(),
            report: Arc::clone(&first),
        };
        assert!(!project.record_analysis(stale));
        let last = project.last_analysis().unwrap();
        assert_eq!(last.report.timestamp, second.timestamp);
        assert_eq!(last.report.markers.error_count(), 1);
    }

    #[test]
    fn test_concurrent_analyses_report_every_diagnostic() {
        let project = Arc::new(project());
        project.set_file_content(
            "m.ttcn",
            "module M { import from N all; const integer a := foo; const integer b := bar; }",
        );
        project.set_file_content(
            "n.ttcn",
            "module N { const integer foo := 1; private const integer bar := 2; }",
        );
        let handles: Vec<_> = (0..4)
            .map(|_| project.analyze_in_background(CancellationToken::new()))
            .collect();
        let mut reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        reports.sort_by_key(|report| report.timestamp);
        for report in &reports {
            assert!(!report.cancelled);
            assert_eq!(report.markers.error_count(), 1, "{:?}", report.markers.all());
        }
        let latest = reports.last().unwrap().timestamp;
        assert_eq!(project.last_analysis().unwrap().report.timestamp, latest);
    }

    #[test]
    fn test_cancelled_analysis_is_not_recorded() {
        let project = project();
        project.set_file_content("a.ttcn", "module A { }");
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(project.analyze(&cancel).cancelled);
        assert!(project.last_analysis().is_none());
    }
}
