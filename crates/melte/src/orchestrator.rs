//! Main orchestration logic.

use crate::cli::Args;
use crate::config::{ConfigError, MelteConfig};
use crate::output::{BuildSummary, Renderer};
use bun_runner::{BunError, BunRunner, BunToolchain, HostConfig};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use melte_pipeline::{
    Compiled, DocumentError, DocumentInput, HtmlSection, HtmlSectionKind, InternalError, Pipeline,
    Reporter, Toolchain,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bun(#[from] BunError),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: Utf8PathBuf, message: String },

    #[error("{path}: {source}")]
    Internal {
        path: Utf8PathBuf,
        source: InternalError,
    },

    /// Watch error.
    #[error("watch error: {0}")]
    WatchFailed(String),
}

/// The workspace being built: where documents are found and where their
/// output goes.
#[derive(Debug)]
pub struct Project {
    pub workspace: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,
    pub config: MelteConfig,
    ignore: GlobSet,
}

impl Project {
    pub fn new(args: &Args) -> Result<Self, OrchestratorError> {
        let workspace = absolute(&args.workspace);
        let workspace = workspace.canonicalize_utf8().unwrap_or(workspace);
        let config = MelteConfig::load(&workspace, args.config.as_deref())?;
        let out_dir = if args.out_dir.is_relative() {
            workspace.join(&args.out_dir)
        } else {
            args.out_dir.clone()
        };

        let mut ignore_builder = GlobSetBuilder::new();
        for pattern in config.ignore_patterns(args) {
            let glob =
                Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
            ignore_builder.add(glob);
        }

        // Add default ignores
        for pattern in ["**/node_modules/**", "**/.git/**"] {
            if let Ok(glob) = Glob::new(pattern) {
                ignore_builder.add(glob);
            }
        }
        if let Ok(relative) = out_dir.strip_prefix(&workspace) {
            if let Ok(glob) = Glob::new(&format!("{relative}/**")) {
                ignore_builder.add(glob);
            }
        }

        let ignore = ignore_builder
            .build()
            .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;

        Ok(Self {
            workspace,
            out_dir,
            config,
            ignore,
        })
    }

    /// Finds every document in the workspace, as workspace-relative paths.
    pub fn discover(&self) -> Vec<Utf8PathBuf> {
        let mut files: Vec<Utf8PathBuf> = WalkDir::new(&self.workspace)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter_map(|p| self.document_path(&p))
            .collect();
        files.sort();
        files
    }

    /// The workspace-relative path of `path` if it is a document to build.
    pub fn document_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        let relative = path.strip_prefix(&self.workspace).ok()?;
        if !self.config.matches_extension(relative) || self.ignore.is_match(relative.as_str()) {
            return None;
        }
        Some(relative.to_path_buf())
    }

    /// Writes the build output for the document at `relative`.
    ///
    /// Components become `<out>/<path>.js` with a `.js.map` next to it;
    /// markup-only documents become `<out>/<path>.head.html` and
    /// `<out>/<path>.body.html`.
    pub async fn write_output(
        &self,
        relative: &Utf8Path,
        compiled: Compiled,
    ) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
        let base = self.out_dir.join(relative);
        let mut written = Vec::new();

        match compiled {
            Compiled::Component { mut code, map } => {
                let js_path = Utf8PathBuf::from(format!("{base}.js"));
                if let Some(map) = map {
                    let map_path = Utf8PathBuf::from(format!("{js_path}.map"));
                    let js_name = js_path.file_name().unwrap_or(js_path.as_str()).to_string();
                    let json = map.with_file(js_name.as_str()).to_json().map_err(|e| {
                        OrchestratorError::WriteFailed {
                            path: map_path.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    if !code.ends_with('\n') {
                        code.push('\n');
                    }
                    code.push_str(&format!("//# sourceMappingURL={js_name}.map\n"));
                    write_file(&map_path, &json).await?;
                    written.push(map_path);
                }
                write_file(&js_path, &code).await?;
                written.insert(0, js_path);
            }
            Compiled::Markup(sections) => {
                for kind in [HtmlSectionKind::Head, HtmlSectionKind::Body] {
                    let Some(content) = join_sections(&sections, kind) else {
                        continue;
                    };
                    let path = Utf8PathBuf::from(format!("{base}.{}.html", kind.as_str()));
                    write_file(&path, &content).await?;
                    written.push(path);
                }
            }
        }

        Ok(written)
    }
}

fn absolute(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_relative() {
        std::env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .unwrap_or_default()
            .join(path)
    } else {
        path.to_path_buf()
    }
}

fn join_sections(sections: &[HtmlSection], kind: HtmlSectionKind) -> Option<String> {
    let parts: Vec<&str> = sections
        .iter()
        .filter(|section| section.section == kind)
        .map(|section| section.data.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n") + "\n")
}

async fn write_file(path: &Utf8Path, content: &str) -> Result<(), OrchestratorError> {
    let failed = |e: std::io::Error| OrchestratorError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(failed)?;
    }
    fs::write(path, content).await.map_err(failed)
}

/// Collects document errors and the files each document depends on.
#[derive(Debug)]
pub struct BuildReporter {
    workspace: Utf8PathBuf,
    errors: Mutex<Vec<(Utf8PathBuf, DocumentError)>>,
    /// Absolute dependency path to the workspace-relative documents using it.
    dependents: Mutex<FxHashMap<Utf8PathBuf, FxHashSet<Utf8PathBuf>>>,
}

impl BuildReporter {
    pub fn new(workspace: Utf8PathBuf) -> Self {
        Self {
            workspace,
            errors: Mutex::new(Vec::new()),
            dependents: Mutex::new(FxHashMap::default()),
        }
    }

    /// Removes and returns the errors reported for `path`.
    pub fn take_errors(&self, path: &Utf8Path) -> Vec<DocumentError> {
        let mut errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner);
        let mut taken = Vec::new();
        errors.retain(|(document, error)| {
            if document == path {
                taken.push(error.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    /// Drops the dependencies recorded for `path` before it is rebuilt.
    pub fn forget(&self, path: &Utf8Path) {
        let mut dependents = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
        dependents.retain(|_, documents| {
            documents.remove(path);
            !documents.is_empty()
        });
    }

    /// Documents that registered `dependency`.
    pub fn dependents_of(&self, dependency: &Utf8Path) -> Vec<Utf8PathBuf> {
        let dependents = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
        dependents
            .get(&normalize_path(dependency))
            .map(|documents| documents.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Reporter for BuildReporter {
    fn error(&self, path: &Utf8Path, error: DocumentError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.to_path_buf(), error));
    }

    fn dependency(&self, path: &Utf8Path, dependency: &Utf8Path) {
        // Relative dependencies are relative to the importing document.
        let dependency = if dependency.is_relative() {
            let document = self.workspace.join(path);
            document
                .parent()
                .unwrap_or(&self.workspace)
                .join(dependency)
        } else {
            dependency.to_path_buf()
        };
        let dependency = normalize_path(&dependency);
        debug!(%path, %dependency, "registered dependency");
        self.dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dependency)
            .or_default()
            .insert(path.to_path_buf());
    }
}

/// Resolves `.` and `..` components without touching the file system.
fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match normalized.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            _ => normalized.push(component),
        }
    }
    normalized
}

/// Everything a build pass needs, shared by the per-document tasks.
pub struct BuildContext<T> {
    pub project: Project,
    pub pipeline: Pipeline<T>,
    pub reporter: BuildReporter,
    pub renderer: Renderer,
}

impl<T: Toolchain + 'static> BuildContext<T> {
    pub fn new(project: Project, toolchain: T, args: &Args) -> Self {
        let options = project.config.pipeline_options(args);
        let reporter = BuildReporter::new(project.workspace.clone());
        Self {
            pipeline: Pipeline::new(toolchain, options),
            reporter,
            renderer: Renderer::new(std::io::stderr().is_terminal()),
            project,
        }
    }

    /// Workspace-relative documents affected by changes to `paths`: changed
    /// documents themselves and documents that depend on a changed file.
    pub fn affected_documents(&self, paths: &[PathBuf]) -> Vec<Utf8PathBuf> {
        let mut documents = BTreeSet::new();
        for path in paths {
            let Ok(path) = Utf8PathBuf::try_from(path.clone()) else {
                continue;
            };
            if let Some(document) = self.project.document_path(&path) {
                if path.is_file() {
                    documents.insert(document);
                }
            }
            documents.extend(self.reporter.dependents_of(&path));
        }
        documents.into_iter().collect()
    }
}

/// Builds `files` concurrently and prints their errors.
pub async fn build<T: Toolchain + 'static>(
    ctx: &Arc<BuildContext<T>>,
    files: Vec<Utf8PathBuf>,
) -> BuildSummary {
    let start = Instant::now();
    let mut summary = BuildSummary {
        file_count: files.len(),
        error_count: 0,
    };

    let mut tasks = JoinSet::new();
    for file in files {
        let ctx = Arc::clone(ctx);
        tasks.spawn(async move { build_document(ctx, file).await });
    }

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => summary.error_count += 1,
            Ok(Err(err)) => {
                eprintln!("Error: {}", err);
                summary.error_count += 1;
            }
            Err(err) => {
                warn!(%err, "build task failed");
                summary.error_count += 1;
            }
        }
    }

    info!(
        files = summary.file_count,
        errors = summary.error_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "build finished"
    );
    summary
}

/// Builds one document. Returns whether it compiled.
async fn build_document<T: Toolchain>(
    ctx: Arc<BuildContext<T>>,
    relative: Utf8PathBuf,
) -> Result<bool, OrchestratorError> {
    let path = ctx.project.workspace.join(&relative);
    let source = fs::read_to_string(&path)
        .await
        .map_err(|source| OrchestratorError::ReadFailed {
            path: path.clone(),
            source,
        })?;

    ctx.reporter.forget(&relative);
    let input = DocumentInput::new(relative.clone(), source);
    let compiled = ctx
        .pipeline
        .run(&input, &ctx.reporter)
        .await
        .map_err(|source| OrchestratorError::Internal {
            path: relative.clone(),
            source,
        })?;

    match compiled {
        Some(compiled) => {
            let written = ctx.project.write_output(&relative, compiled).await?;
            debug!(path = %relative, outputs = written.len(), "wrote output");
            Ok(true)
        }
        None => {
            for error in ctx.reporter.take_errors(&relative) {
                eprintln!("{}", ctx.renderer.render(&relative, &input.source, &error));
            }
            Ok(false)
        }
    }
}

/// Runs the build on all documents.
pub async fn run(args: Args) -> Result<BuildSummary, OrchestratorError> {
    let project = Project::new(&args)?;
    let files = project.discover();
    info!(workspace = %project.workspace, documents = files.len(), "discovered documents");

    let bun_path =
        BunRunner::find_bun(Some(project.workspace.as_path())).ok_or(BunError::NotFound)?;
    let host_config = HostConfig {
        postcss_plugins: project.config.postcss.clone(),
    };
    let runner = BunRunner::new(bun_path, project.workspace.clone(), &host_config)?;
    let toolchain = BunToolchain::new(runner, project.config.worker_count(&args));
    debug!(workers = toolchain.worker_count(), "bun toolchain ready");

    let ctx = Arc::new(BuildContext::new(project, toolchain, &args));

    if args.watch {
        run_watch_mode(&args, &ctx, files).await
    } else {
        let summary = build(&ctx, files).await;
        println!("{}", summary.format());
        Ok(summary)
    }
}

/// Runs in watch mode.
async fn run_watch_mode<T: Toolchain + 'static>(
    args: &Args,
    ctx: &Arc<BuildContext<T>>,
    initial_files: Vec<Utf8PathBuf>,
) -> Result<BuildSummary, OrchestratorError> {
    use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    println!("Starting watch mode...\n");

    // Initial build
    let summary = build(ctx, initial_files).await;
    println!("{}", summary.format());

    // Set up file watcher with tokio channel
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )
    .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    watcher
        .watch(ctx.project.workspace.as_std_path(), RecursiveMode::Recursive)
        .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    println!("Watching for changes... (Ctrl+C to stop)\n");

    while let Some(event) = rx.recv().await {
        let mut paths = Vec::new();
        let mut collect = |event: notify::Event| {
            if !matches!(event.kind, EventKind::Access(_)) {
                paths.extend(event.paths);
            }
        };
        collect(event);
        // Editors emit bursts of events for one save
        while let Ok(event) = rx.try_recv() {
            collect(event);
        }

        let documents = ctx.affected_documents(&paths);
        if documents.is_empty() {
            continue;
        }

        if !args.preserve_watch_output {
            // Clear screen
            print!("\x1B[2J\x1B[1;1H");
        }

        println!("File changed, rebuilding {} documents...\n", documents.len());

        let summary = build(ctx, documents).await;
        println!("{}", summary.format());
    }

    Err(OrchestratorError::WatchFailed(
        "watch channel closed unexpectedly".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use melte_pipeline::{
        CompileRequest, InstrumentRequest, PreprocessOutput, PreprocessRequest, StageOutput,
        ToolError, TranspileRequest,
    };
    use pretty_assertions::assert_eq;
    use source_map::{LineCol, PositionMap};
    use std::fs as std_fs;

    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let path = path.canonicalize_utf8().unwrap();
        (dir, path)
    }

    fn touch(root: &Utf8Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std_fs::create_dir_all(path.parent().unwrap()).unwrap();
        std_fs::write(path, content).unwrap();
    }

    fn args(root: &Utf8Path, extra: &[&str]) -> Args {
        let mut argv = vec!["melte", "--workspace", root.as_str()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    /// Passes code through every stage unchanged.
    struct EchoToolchain;

    impl Toolchain for EchoToolchain {
        async fn preprocess(
            &self,
            request: PreprocessRequest,
        ) -> Result<PreprocessOutput, ToolError> {
            Ok(PreprocessOutput {
                code: request.content,
                map: None,
                dependencies: vec![Utf8PathBuf::from("theme.scss")],
            })
        }

        async fn compile(&self, request: CompileRequest) -> Result<StageOutput, ToolError> {
            Ok(StageOutput {
                code: request.code,
                map: None,
            })
        }

        async fn instrument(&self, request: InstrumentRequest) -> Result<String, ToolError> {
            Ok(request.code)
        }

        async fn transpile(&self, request: TranspileRequest) -> Result<StageOutput, ToolError> {
            let mut map = PositionMap::new();
            let source = map.add_source(&request.filename);
            map.add(LineCol::new(0, 0), source, LineCol::new(0, 0));
            Ok(StageOutput {
                code: request.code,
                map: Some(map),
            })
        }
    }

    #[test]
    fn test_discover_filters_extensions_and_ignores() {
        let (_guard, root) = workspace();
        touch(&root, "src/App.svelte", "<h1>hi</h1>");
        touch(&root, "src/lib/Button.svelte", "<button />");
        touch(&root, "client/main.html", "<head><title>x</title></head>");
        touch(&root, "src/main.js", "");
        touch(&root, "node_modules/pkg/Dep.svelte", "");
        touch(&root, "build/src/Old.svelte", "");
        touch(&root, "src/legacy/Old.svelte", "");

        let project = Project::new(&args(&root, &["--ignore", "src/legacy/**"])).unwrap();
        assert_eq!(
            project.discover(),
            vec![
                Utf8PathBuf::from("client/main.html"),
                Utf8PathBuf::from("src/App.svelte"),
                Utf8PathBuf::from("src/lib/Button.svelte"),
            ]
        );
    }

    #[test]
    fn test_config_extensions_limit_discovery() {
        let (_guard, root) = workspace();
        touch(&root, "melte.config.json", r#"{ "extensions": [".svelte"] }"#);
        touch(&root, "src/App.svelte", "");
        touch(&root, "client/main.html", "");

        let project = Project::new(&args(&root, &[])).unwrap();
        assert_eq!(project.discover(), vec![Utf8PathBuf::from("src/App.svelte")]);
    }

    #[test]
    fn test_invalid_ignore_glob() {
        let (_guard, root) = workspace();
        let err = Project::new(&args(&root, &["--ignore", "src/[legacy"])).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidGlob(_)));
    }

    #[tokio::test]
    async fn test_component_output_links_its_map() {
        let (_guard, root) = workspace();
        let project = Project::new(&args(&root, &[])).unwrap();

        let mut map = PositionMap::new();
        let source = map.add_source("src/App.svelte");
        map.add(LineCol::new(0, 0), source, LineCol::new(2, 4));
        let written = project
            .write_output(
                Utf8Path::new("src/App.svelte"),
                Compiled::Component {
                    code: "export default App;".to_string(),
                    map: Some(map),
                },
            )
            .await
            .unwrap();

        let js = root.join("build/src/App.svelte.js");
        let map_path = root.join("build/src/App.svelte.js.map");
        assert_eq!(written, vec![js.clone(), map_path.clone()]);
        assert_eq!(
            std_fs::read_to_string(&js).unwrap(),
            "export default App;\n//# sourceMappingURL=App.svelte.js.map\n"
        );

        let decoded = PositionMap::from_json(&std_fs::read(&map_path).unwrap()).unwrap();
        assert_eq!(decoded.file(), Some("App.svelte.js"));
        assert_eq!(decoded.sources(), &["src/App.svelte".to_string()]);
    }

    #[tokio::test]
    async fn test_markup_output_split_by_section() {
        let (_guard, root) = workspace();
        let project = Project::new(&args(&root, &["--out-dir", "dist"])).unwrap();

        let written = project
            .write_output(
                Utf8Path::new("client/main.html"),
                Compiled::Markup(vec![
                    HtmlSection {
                        section: HtmlSectionKind::Head,
                        data: "<title>Todos</title>".to_string(),
                    },
                    HtmlSection {
                        section: HtmlSectionKind::Body,
                        data: "<div id=\"app\"></div>".to_string(),
                    },
                    HtmlSection {
                        section: HtmlSectionKind::Head,
                        data: "<meta charset=\"utf-8\">".to_string(),
                    },
                ]),
            )
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            std_fs::read_to_string(root.join("dist/client/main.html.head.html")).unwrap(),
            "<title>Todos</title>\n<meta charset=\"utf-8\">\n"
        );
        assert_eq!(
            std_fs::read_to_string(root.join("dist/client/main.html.body.html")).unwrap(),
            "<div id=\"app\"></div>\n"
        );
    }

    #[test]
    fn test_reporter_tracks_dependents() {
        let reporter = BuildReporter::new(Utf8PathBuf::from("/app"));
        reporter.dependency(Utf8Path::new("src/App.svelte"), Utf8Path::new("theme.scss"));
        reporter.dependency(
            Utf8Path::new("src/lib/Button.svelte"),
            Utf8Path::new("/app/src/theme.scss"),
        );
        reporter.dependency(
            Utf8Path::new("src/lib/Button.svelte"),
            Utf8Path::new("/app/shared/vars.scss"),
        );

        let mut dependents = reporter.dependents_of(Utf8Path::new("/app/src/theme.scss"));
        dependents.sort();
        assert_eq!(
            dependents,
            vec![
                Utf8PathBuf::from("src/App.svelte"),
                Utf8PathBuf::from("src/lib/Button.svelte"),
            ]
        );

        reporter.forget(Utf8Path::new("src/lib/Button.svelte"));
        assert_eq!(
            reporter.dependents_of(Utf8Path::new("/app/src/theme.scss")),
            vec![Utf8PathBuf::from("src/App.svelte")]
        );
        assert!(reporter
            .dependents_of(Utf8Path::new("/app/shared/vars.scss"))
            .is_empty());
    }

    #[test]
    fn test_reporter_normalizes_dependency_paths() {
        let reporter = BuildReporter::new(Utf8PathBuf::from("/app"));
        reporter.dependency(
            Utf8Path::new("src/App.svelte"),
            Utf8Path::new("../styles/theme.scss"),
        );
        reporter.dependency(
            Utf8Path::new("src/lib/Card.svelte"),
            Utf8Path::new("/app/src/./lib/../../styles/theme.scss"),
        );

        let mut dependents = reporter.dependents_of(Utf8Path::new("/app/styles/theme.scss"));
        dependents.sort();
        assert_eq!(
            dependents,
            vec![
                Utf8PathBuf::from("src/App.svelte"),
                Utf8PathBuf::from("src/lib/Card.svelte"),
            ]
        );
        assert_eq!(
            reporter.dependents_of(Utf8Path::new("/app/src/../styles/theme.scss")),
            dependents
        );
    }

    #[test]
    fn test_reporter_hands_out_errors_per_document() {
        let reporter = BuildReporter::new(Utf8PathBuf::from("/app"));
        reporter.error(Utf8Path::new("a.svelte"), DocumentError::new("first"));
        reporter.error(Utf8Path::new("b.svelte"), DocumentError::new("second"));

        assert_eq!(
            reporter.take_errors(Utf8Path::new("a.svelte")),
            vec![DocumentError::new("first")]
        );
        assert!(reporter.take_errors(Utf8Path::new("a.svelte")).is_empty());
        assert_eq!(reporter.take_errors(Utf8Path::new("b.svelte")).len(), 1);
    }

    #[tokio::test]
    async fn test_build_continues_past_failing_document() {
        let (_guard, root) = workspace();
        touch(
            &root,
            "src/App.svelte",
            "<script lang=\"ts\">\n  let count: number = 0;\n</script>\n<p>{count}</p>\n",
        );
        touch(&root, "src/Broken.svelte", "\n<script>let a;");
        touch(&root, "client/main.html", "<body><div id=\"app\"></div></body>");

        let args = args(&root, &[]);
        let project = Project::new(&args).unwrap();
        let files = project.discover();
        let ctx = Arc::new(BuildContext::new(project, EchoToolchain, &args));

        let summary = build(&ctx, files).await;
        assert_eq!(
            summary,
            BuildSummary {
                file_count: 3,
                error_count: 1,
            }
        );
        assert!(root.join("build/src/App.svelte.js").is_file());
        assert!(root.join("build/src/App.svelte.js.map").is_file());
        assert!(!root.join("build/src/Broken.svelte.js").exists());
        assert!(root.join("build/client/main.html.body.html").is_file());
    }

    #[tokio::test]
    async fn test_changed_dependency_selects_dependents() {
        let (_guard, root) = workspace();
        touch(
            &root,
            "src/App.svelte",
            "<style lang=\"scss\">\n  p { color: red; }\n</style>\n<p>hi</p>\n",
        );
        touch(&root, "src/Other.svelte", "<p>other</p>\n");
        touch(&root, "src/theme.scss", "");
        touch(&root, "README.md", "");

        let args = args(&root, &[]);
        let project = Project::new(&args).unwrap();
        let files = project.discover();
        let ctx = Arc::new(BuildContext::new(project, EchoToolchain, &args));
        build(&ctx, files).await;

        let changed = |relative: &str| vec![root.join(relative).into_std_path_buf()];
        assert_eq!(
            ctx.affected_documents(&changed("src/theme.scss")),
            vec![Utf8PathBuf::from("src/App.svelte")]
        );
        assert_eq!(
            ctx.affected_documents(&changed("src/Other.svelte")),
            vec![Utf8PathBuf::from("src/Other.svelte")]
        );
        assert!(ctx.affected_documents(&changed("README.md")).is_empty());
        assert!(ctx
            .affected_documents(&changed("build/src/App.svelte.js"))
            .is_empty());
    }
}
