//! # Domus App
//!
//! The session controller. Wires staging, the engine, the rendering surface
//! and the export actions together the way the front end drives them: pick or
//! upload an input, compute, look at the fitted drawing, save the results.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use domus_core::{
    Artifact, ComputationInvoker, CorpusError, Engine, ExampleCorpus, InputSource, Invocation,
    Outcome, StagingArea, StagingError, SubprocessEngine,
};
use domus_io::{download_example, export_artifact, ConfigError, ExportError, ExportState, SessionConfig};
use domus_renderer::{ClientRect, Drawing, FitResult, Presentation, RenderError, Surface, ViewBox, ViewportFitter};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no input staged; upload a graph or select an example first")]
    NoInput,

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot encode report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot display drawing: {0}")]
    Render(#[from] RenderError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Engine described by the session configuration.
pub fn subprocess_engine(config: &SessionConfig) -> SubprocessEngine {
    SubprocessEngine::new(&config.engine.program).with_args(config.engine.args.iter().cloned())
}

/// Fitter described by the session configuration.
pub fn viewport_fitter(config: &SessionConfig) -> ViewportFitter {
    let viewport = &config.viewport;
    ViewportFitter {
        padding: viewport.padding,
        fallback_width: viewport.fallback_width,
        fallback_height: viewport.fallback_height,
        presentation: Presentation::default().with_size_percent(viewport.size_percent),
    }
}

fn client_rect(config: &SessionConfig) -> ClientRect {
    ClientRect::new(config.viewport.client_width, config.viewport.client_height)
}

/// Summary of one computation, as reported to the user.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub id: Uuid,
    pub input: Option<String>,
    pub outcome: Outcome,
    pub status: i32,
    pub message: String,
    pub elapsed_ms: u64,
    pub view_box: Option<String>,
    pub exported: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(invocation: &Invocation, input: Option<String>) -> Self {
        Self {
            id: invocation.id,
            input,
            outcome: invocation.outcome,
            status: invocation.status,
            message: invocation.outcome.message().to_string(),
            elapsed_ms: invocation.elapsed_ms,
            view_box: None,
            exported: Vec::new(),
        }
    }
}

/// One user session: a staged input, the last computation's drawing and the
/// export buttons' state.
pub struct Session<E: Engine> {
    staging: StagingArea,
    corpus: ExampleCorpus,
    invoker: ComputationInvoker<E>,
    surface: Surface,
    fitter: ViewportFitter,
    exports: ExportState,
    input: Option<InputSource>,
    last_outcome: Option<Outcome>,
    last_fit: Rc<Cell<Option<FitResult>>>,
}

impl<E: Engine> Session<E> {
    pub fn new(config: &SessionConfig, engine: E) -> Result<Self, AppError> {
        let staging = StagingArea::new(&config.staging_dir)?;
        log::info!(
            "session started (staging {}, examples {}, engine '{}')",
            staging.root().display(),
            config.examples_dir.display(),
            engine.name()
        );
        Ok(Self {
            staging,
            corpus: ExampleCorpus::new(&config.examples_dir),
            invoker: ComputationInvoker::new(engine),
            surface: Surface::new(client_rect(config)),
            fitter: viewport_fitter(config),
            exports: ExportState::new(),
            input: None,
            last_outcome: None,
            last_fit: Rc::new(Cell::new(None)),
        })
    }

    // ── Input ─────────────────────────────────────────────────────────

    pub fn list_examples(&self) -> Result<Vec<String>, AppError> {
        Ok(self.corpus.list()?)
    }

    pub fn select_example(&mut self, name: &str) -> Result<&InputSource, AppError> {
        let source = self.staging.stage_example(&self.corpus, name)?;
        Ok(&*self.input.insert(source))
    }

    pub fn upload(&mut self, path: &Path) -> Result<&InputSource, AppError> {
        let source = self.staging.stage_file(path)?;
        Ok(&*self.input.insert(source))
    }

    /// Stage raw content received from the host, labelled `name`.
    pub fn upload_bytes(&mut self, name: &str, content: &[u8]) -> Result<&InputSource, AppError> {
        self.staging.stage(content)?;
        Ok(&*self.input.insert(InputSource::Upload(PathBuf::from(name))))
    }

    pub fn input_label(&self) -> Option<String> {
        self.input.as_ref().map(InputSource::label)
    }

    // ── Computation ───────────────────────────────────────────────────

    /// Run the engine on the staged input.
    ///
    /// On success the drawing is inserted into the surface with a fit queued
    /// for the next [`next_frame`](Self::next_frame), and both exports are
    /// enabled. Any other outcome leaves the surface and exports as they were,
    /// as does a success that did not leave both artifacts behind.
    pub fn compute(&mut self) -> Result<Invocation, AppError> {
        if !self.staging.input_path().is_file() {
            return Err(AppError::NoInput);
        }

        let invocation = self.invoker.invoke(&self.staging);
        self.last_outcome = Some(invocation.outcome);
        if !invocation.is_success() {
            log::warn!("invocation {}: {}", invocation.id, invocation.outcome.message());
            return Ok(invocation);
        }

        if let Some(missing) = Artifact::ALL
            .into_iter()
            .find(|artifact| !self.staging.has_artifact(*artifact))
        {
            log::error!("invocation {}: engine reported success but wrote no {missing}", invocation.id);
            return Err(StagingError::NotFound { artifact: missing }.into());
        }

        self.exports.enable_all();
        let drawing = Drawing::from_bytes(&self.staging.read_artifact(Artifact::Drawing)?)?;
        self.show(drawing);
        Ok(invocation)
    }

    fn show(&mut self, drawing: Drawing) {
        self.last_fit.set(None);
        self.surface.insert(drawing);
        let fitter = self.fitter.clone();
        let last_fit = Rc::clone(&self.last_fit);
        self.surface.on_ready(move |drawing, layout| {
            last_fit.set(Some(fitter.fit(drawing, layout)));
        });
    }

    /// Give the surface its scheduling turn. Returns how many queued
    /// continuations ran.
    pub fn next_frame(&mut self) -> usize {
        self.surface.settle()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Result of the most recent fit, once the surface has settled.
    pub fn last_fit(&self) -> Option<FitResult> {
        self.last_fit.get()
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.surface
            .drawing()
            .and_then(Drawing::view_box)
            .and_then(ViewBox::parse)
    }

    pub fn rendered_svg(&self) -> Option<String> {
        self.surface.rendered_svg()
    }

    pub fn set_client_rect(&mut self, client: ClientRect) {
        self.surface.set_client_rect(client);
    }

    // ── Export ────────────────────────────────────────────────────────

    pub fn export_state(&self) -> ExportState {
        self.exports
    }

    pub fn export(&self, artifact: Artifact, dest_dir: &Path) -> Result<PathBuf, AppError> {
        Ok(export_artifact(&self.staging, &self.exports, artifact, dest_dir)?)
    }

    /// Export every artifact the session can currently save.
    pub fn export_all(&self, dest_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
        Artifact::ALL
            .into_iter()
            .map(|artifact| self.export(artifact, dest_dir))
            .collect()
    }

    pub fn download_example(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, AppError> {
        Ok(download_example(&self.corpus, name, dest_dir)?)
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }
}

/// Fit a standalone SVG document the way the session fits engine drawings.
pub fn fit_svg(
    svg: &[u8],
    fitter: &ViewportFitter,
    client: ClientRect,
) -> Result<(String, FitResult), AppError> {
    let drawing = Drawing::from_bytes(svg)?;
    let mut surface = Surface::new(client);
    surface.insert(drawing);

    let result = Rc::new(Cell::new(FitResult::Abandoned));
    let slot = Rc::clone(&result);
    let fitter = fitter.clone();
    surface.on_ready(move |drawing, layout| slot.set(fitter.fit(drawing, layout)));
    surface.settle();

    let rendered = surface.rendered_svg().unwrap_or_default();
    Ok((rendered, result.get()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use domus_core::FnEngine;

    const DRAWING: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <g stroke="#000">
    <line x1="20" y1="40" x2="120" y2="40"/>
    <line x1="120" y1="40" x2="120" y2="90"/>
    <circle cx="20" cy="40" r="4"/>
    <circle cx="120" cy="90" r="4"/>
  </g>
</svg>
"##;

    /// Stand-in for the drawing engine: counts `v` lines in the input and
    /// fails the way the real engine does.
    fn fake_engine(staging: &StagingArea) -> i32 {
        let input = match staging.read_input() {
            Ok(input) => String::from_utf8_lossy(&input).into_owned(),
            Err(_) => return -3,
        };
        if input.contains("disconnected") {
            return -2;
        }
        if input.lines().filter(|l| l.starts_with('v')).count() > 30 {
            return -1;
        }
        fs::write(staging.artifact_path(Artifact::Drawing), DRAWING).unwrap();
        fs::write(staging.artifact_path(Artifact::Exchange), "<graphml/>").unwrap();
        0
    }

    struct Fixture {
        dir: tempfile::TempDir,
        session: Session<FnEngine<fn(&StagingArea) -> i32>>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let examples = dir.path().join("examples");
        fs::create_dir_all(&examples).unwrap();
        fs::write(examples.join("graph.txt"), "v 0\nv 1\nv 2\ne 0 1\ne 1 2\n").unwrap();
        let big: String = (0..50).map(|i| format!("v {i}\n")).collect();
        fs::write(examples.join("big.txt"), big).unwrap();

        let config = SessionConfig {
            staging_dir: dir.path().join("stage"),
            examples_dir: examples,
            ..SessionConfig::default()
        };
        let engine = FnEngine::new("fake", fake_engine as fn(&StagingArea) -> i32);
        let session = Session::new(&config, engine).unwrap();
        Fixture { dir, session }
    }

    #[test]
    fn test_lists_examples() {
        let f = fixture();
        assert_eq!(f.session.list_examples().unwrap(), vec!["big.txt", "graph.txt"]);
    }

    #[test]
    fn test_compute_without_input() {
        let mut f = fixture();
        assert!(matches!(f.session.compute(), Err(AppError::NoInput)));
    }

    #[test]
    fn test_successful_run_fits_after_next_frame() {
        let mut f = fixture();
        f.session.select_example("graph.txt").unwrap();
        assert_eq!(f.session.input_label().as_deref(), Some("graph.txt"));

        let invocation = f.session.compute().unwrap();
        assert_eq!(invocation.outcome, Outcome::Success);
        assert!(f.session.export_state().is_enabled(Artifact::Drawing));
        assert!(f.session.export_state().is_enabled(Artifact::Exchange));

        // Nothing is measured before the surface settles.
        assert_eq!(f.session.last_fit(), None);
        assert_eq!(f.session.view_box(), Some(ViewBox::new(0.0, 0.0, 10.0, 10.0)));

        assert_eq!(f.session.next_frame(), 1);
        let expected = ViewBox::new(8.0, 28.0, 124.0, 74.0);
        assert_eq!(f.session.last_fit(), Some(FitResult::Group(expected)));
        assert_eq!(f.session.view_box(), Some(expected));

        let rendered = Drawing::parse(&f.session.rendered_svg().unwrap()).unwrap();
        assert_eq!(rendered.root().attr("preserveAspectRatio"), Some("xMidYMid meet"));
        assert_eq!(rendered.root().style_property("width").as_deref(), Some("90%"));
    }

    #[test]
    fn test_too_large_changes_nothing() {
        let mut f = fixture();
        f.session.select_example("big.txt").unwrap();
        let invocation = f.session.compute().unwrap();
        assert_eq!(invocation.outcome, Outcome::TooLarge);
        assert_eq!(
            invocation.outcome.message(),
            "Error: The graph is too large (more than 30 vertices)."
        );
        assert_eq!(f.session.export_state(), ExportState::new());
        assert_eq!(f.session.next_frame(), 0);
        assert!(f.session.rendered_svg().is_none());
        assert!(f.session.view_box().is_none());
    }

    #[test]
    fn test_failure_keeps_previous_drawing() {
        let mut f = fixture();
        f.session.select_example("graph.txt").unwrap();
        f.session.compute().unwrap();
        f.session.next_frame();
        let before = f.session.rendered_svg();

        f.session.upload_bytes("broken.txt", b"v 0\ndisconnected\n").unwrap();
        assert_eq!(f.session.input_label().as_deref(), Some("broken.txt"));
        let invocation = f.session.compute().unwrap();
        assert_eq!(invocation.outcome, Outcome::Disconnected);
        assert_eq!(f.session.last_outcome(), Some(Outcome::Disconnected));
        assert_eq!(f.session.rendered_svg(), before);
        assert!(f.session.export_state().is_enabled(Artifact::Drawing));
    }

    #[test]
    fn test_failure_reads_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            staging_dir: dir.path().to_path_buf(),
            examples_dir: dir.path().join("none"),
            ..SessionConfig::default()
        };
        // Leaves an unreadable drawing behind; a failed run must not touch it.
        let engine = FnEngine::new("garbage", |staging: &StagingArea| {
            fs::write(staging.artifact_path(Artifact::Drawing), "not svg").unwrap();
            -3
        });
        let mut session = Session::new(&config, engine).unwrap();
        session.upload_bytes("g.txt", b"v 0\n").unwrap();

        let invocation = session.compute().unwrap();
        assert_eq!(invocation.outcome, Outcome::UnknownFailure);
        assert!(session.rendered_svg().is_none());
        assert_eq!(session.export_state(), ExportState::new());
    }

    #[test]
    fn test_success_without_artifacts_enables_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            staging_dir: dir.path().to_path_buf(),
            examples_dir: dir.path().join("none"),
            ..SessionConfig::default()
        };
        let engine = FnEngine::new("forgetful", |staging: &StagingArea| {
            fs::write(staging.artifact_path(Artifact::Exchange), "<graphml/>").unwrap();
            0
        });
        let mut session = Session::new(&config, engine).unwrap();
        session.upload_bytes("g.txt", b"v 0\n").unwrap();

        assert!(matches!(
            session.compute(),
            Err(AppError::Staging(StagingError::NotFound {
                artifact: Artifact::Drawing
            }))
        ));
        assert_eq!(session.export_state(), ExportState::new());
        assert!(session.rendered_svg().is_none());
        assert!(session.export_all(dir.path()).is_err());
    }

    #[test]
    fn test_export_drawing_byte_identical() {
        let mut f = fixture();
        f.session.select_example("graph.txt").unwrap();
        f.session.compute().unwrap();
        f.session.next_frame();

        let out = f.dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let path = f.session.export(Artifact::Drawing, &out).unwrap();
        assert_eq!(path, out.join("drawing.svg"));
        assert_eq!(fs::read_to_string(path).unwrap(), DRAWING);

        let paths = f.session.export_all(&out).unwrap();
        assert_eq!(paths, vec![out.join("drawing.svg"), out.join("graph.graphml")]);
    }

    #[test]
    fn test_export_before_compute() {
        let f = fixture();
        assert!(matches!(
            f.session.export(Artifact::Exchange, f.dir.path()),
            Err(AppError::Export(ExportError::ArtifactUnavailable(Artifact::Exchange)))
        ));
    }

    #[test]
    fn test_upload_file_and_download_example() {
        let mut f = fixture();
        let upload = f.dir.path().join("mine.txt");
        fs::write(&upload, "v 0\n").unwrap();
        f.session.upload(&upload).unwrap();
        assert_eq!(f.session.staging().read_input().unwrap(), b"v 0\n");
        assert_eq!(f.session.input_label().as_deref(), Some("mine.txt"));

        let dest = f.dir.path().join("dl");
        fs::create_dir_all(&dest).unwrap();
        let path = f.session.download_example("graph.txt", &dest).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "v 0\nv 1\nv 2\ne 0 1\ne 1 2\n");
    }

    #[test]
    fn test_fit_svg_standalone() {
        let svg = br#"<svg><rect x="10" y="10" width="20" height="5"/><rect x="40" y="0" width="10" height="10"/></svg>"#;
        let (rendered, result) =
            fit_svg(svg, &ViewportFitter::default(), ClientRect::default()).unwrap();
        let expected = ViewBox::new(2.0, -8.0, 56.0, 31.0);
        assert_eq!(
            result,
            FitResult::Children {
                view_box: expected,
                measured: 2,
                skipped: 0
            }
        );
        assert!(rendered.contains(r#"viewBox="2 -8 56 31""#));
    }

    #[test]
    fn test_fitter_from_config() {
        let mut config = SessionConfig::default();
        config.viewport.padding = 2.0;
        config.viewport.size_percent = 50.0;
        let fitter = viewport_fitter(&config);
        assert_eq!(fitter.padding, 2.0);
        assert_eq!(fitter.presentation.size_percent, 50.0);
        assert_eq!(fitter.fallback_width, 800.0);
    }
}
