//! Pipeline orchestrator: extraction, then one explanation + verification
//! chain per term, merged into an observable [`PipelineRunState`].
//!
//! A single actor task owns the run state and is the only place it is
//! mutated. Extraction and the per-term chains run on their own tasks and
//! report back over a channel, tagged with the [`RunId`] they belong to.
//! Reports for any run other than the current one are dropped, so submitting
//! a new request supersedes an in-flight run without cancelling its calls.
//!
//! Observers read the state through a `tokio::sync::watch` receiver.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, debug, info, info_span, warn};

use clarifymd_shared::{
    AnalysisRequest, ClarifyError, FailedStage, PipelineRunState, Result, RunId, RunPhase,
    TermAnalysis, TermFailure, VerificationStatus,
};

use crate::stages::MedicalAnalysis;

/// Shown when extraction succeeds with no terms.
pub const NO_TERMS_MESSAGE: &str =
    "Nenhum termo médico identificado. Por favor, reformule o texto.";

/// Explanation placeholder for a term whose explanation failed.
pub const EXPLANATION_FAILED: &str = "Erro ao gerar explicação.";

const COMMAND_BUFFER: usize = 16;

// ---------------------------------------------------------------------------
// Public handle
// ---------------------------------------------------------------------------

/// Handle to the orchestrator actor. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PipelineRunState>,
}

impl Orchestrator {
    /// Start the actor on the current tokio runtime.
    pub fn spawn(analysis: MedicalAnalysis) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PipelineRunState::default());

        let actor = Actor {
            analysis,
            state: state_tx,
            events: event_tx,
            countdown: None,
        };
        tokio::spawn(actor.run(command_rx, event_rx));

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Start a new run, superseding any run still in flight.
    ///
    /// When this returns, the published state already belongs to the new run.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<RunId> {
        if request.is_blank() {
            return Err(ClarifyError::validation("input text is empty"));
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Submit {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| stopped())?;

        reply_rx.await.map_err(|_| stopped())
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PipelineRunState> {
        self.state.clone()
    }

    /// Current state.
    pub fn snapshot(&self) -> PipelineRunState {
        self.state.borrow().clone()
    }

    /// Wait until `run_id` settles and return its final state.
    ///
    /// Fails if another run replaces it first.
    pub async fn wait_settled(&self, run_id: RunId) -> Result<PipelineRunState> {
        let mut rx = self.subscribe();
        let state = PipelineRunState::clone(
            &*rx.wait_for(|s| s.run_id != Some(run_id) || s.phase == RunPhase::Settled)
                .await
                .map_err(|_| stopped())?,
        );

        if state.run_id != Some(run_id) {
            return Err(ClarifyError::Pipeline(format!(
                "run {run_id} was superseded by a newer request"
            )));
        }
        Ok(state)
    }

    /// Submit `request` and wait for it to settle.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<PipelineRunState> {
        let run_id = self.submit(request).await?;
        self.wait_settled(run_id).await
    }
}

fn stopped() -> ClarifyError {
    ClarifyError::Pipeline("orchestrator is not running".into())
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

enum Command {
    Submit {
        request: AnalysisRequest,
        reply: oneshot::Sender<RunId>,
    },
}

/// Stage completions reported back to the actor.
enum Event {
    Extracted {
        run: RunId,
        result: Result<Vec<String>>,
    },
    Explained {
        run: RunId,
        index: usize,
        result: Result<String>,
    },
    Verified {
        run: RunId,
        index: usize,
        result: Result<String>,
    },
}

impl Event {
    fn run(&self) -> RunId {
        match self {
            Self::Extracted { run, .. } | Self::Explained { run, .. } | Self::Verified { run, .. } => {
                *run
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// Completion barrier for the chains of one run.
#[derive(Debug)]
struct Countdown {
    remaining: usize,
}

impl Countdown {
    fn new(total: usize) -> Self {
        Self { remaining: total }
    }

    /// Record one completion. Returns true exactly once: on the last arrival.
    fn arrive(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct Actor {
    analysis: MedicalAnalysis,
    state: watch::Sender<PipelineRunState>,
    events: mpsc::UnboundedSender<Event>,
    countdown: Option<Countdown>,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        let mut accepting = true;

        loop {
            // Once every handle is gone, finish the current run and stop.
            if !accepting && !self.state.borrow().is_loading {
                break;
            }

            tokio::select! {
                command = commands.recv(), if accepting => match command {
                    Some(Command::Submit { request, reply }) => self.start(request, reply),
                    None => accepting = false,
                },
                Some(event) = events.recv() => self.apply(event),
            }
        }

        debug!("orchestrator stopped");
    }

    fn current_run(&self) -> Option<RunId> {
        self.state.borrow().run_id
    }

    // --- Idle -> Extracting ---

    fn start(&mut self, request: AnalysisRequest, reply: oneshot::Sender<RunId>) {
        let run_id = RunId::new();

        {
            let previous = self.state.borrow();
            if previous.is_loading {
                if let Some(old) = previous.run_id {
                    warn!(%old, new = %run_id, "superseding a run that has not settled");
                }
            }
        }

        self.countdown = None;
        self.state.send_replace(PipelineRunState {
            run_id: Some(run_id),
            phase: RunPhase::Extracting,
            is_loading: true,
            started_at: Some(Utc::now()),
            ..Default::default()
        });
        let _ = reply.send(run_id);

        info!(%run_id, text_len = request.text.len(), preview = ?request.preview, "run started");

        let analysis = self.analysis.clone();
        let events = self.events.clone();
        tokio::spawn(
            async move {
                let result = analysis.extract_terms(&request.text).await;
                let _ = events.send(Event::Extracted {
                    run: run_id,
                    result,
                });
            }
            .instrument(info_span!("extraction", %run_id)),
        );
    }

    fn apply(&mut self, event: Event) {
        if self.current_run() != Some(event.run()) {
            debug!(run = %event.run(), "dropping report from a superseded run");
            return;
        }

        match event {
            Event::Extracted { run, result } => self.on_extracted(run, result),
            Event::Explained { index, result, .. } => self.on_explained(index, result),
            Event::Verified { index, result, .. } => self.on_verified(index, result),
        }
    }

    // --- Extracting -> Processing | Settled ---

    fn on_extracted(&mut self, run_id: RunId, result: Result<Vec<String>>) {
        let terms = match result {
            Ok(terms) if terms.is_empty() => {
                info!(%run_id, "no terms found");
                self.state.send_modify(|s| {
                    s.error_message = Some(NO_TERMS_MESSAGE.to_string());
                    settle(s);
                });
                return;
            }
            Ok(terms) => terms,
            Err(e) => {
                warn!(%run_id, error = %e, "term extraction failed");
                self.state.send_modify(|s| {
                    s.error_message = Some(format!("Erro ao identificar termos: {e}"));
                    settle(s);
                });
                return;
            }
        };

        info!(%run_id, count = terms.len(), "launching term chains");

        self.countdown = Some(Countdown::new(terms.len()));
        self.state.send_modify(|s| {
            s.terms = terms.iter().map(TermAnalysis::new).collect();
            s.phase = RunPhase::Processing;
        });

        for (index, term) in terms.into_iter().enumerate() {
            self.launch_chain(run_id, index, term);
        }
    }

    // --- Processing ---

    /// Explanation, then (only on success) verification for one term.
    fn launch_chain(&self, run_id: RunId, index: usize, term: String) {
        let analysis = self.analysis.clone();
        let events = self.events.clone();
        let span = info_span!("chain", %run_id, index, term = %term);

        tokio::spawn(
            async move {
                let explanation = match analysis.explain(&term).await {
                    Ok(explanation) => explanation,
                    Err(e) => {
                        let _ = events.send(Event::Explained {
                            run: run_id,
                            index,
                            result: Err(e),
                        });
                        return;
                    }
                };

                let _ = events.send(Event::Explained {
                    run: run_id,
                    index,
                    result: Ok(explanation.clone()),
                });

                let result = analysis.verify(&term, &explanation).await;
                let _ = events.send(Event::Verified {
                    run: run_id,
                    index,
                    result,
                });
            }
            .instrument(span),
        );
    }

    fn on_explained(&mut self, index: usize, result: Result<String>) {
        match result {
            Ok(explanation) => {
                self.state.send_modify(|s| {
                    if let Some(row) = s.terms.get_mut(index) {
                        row.explanation = Some(explanation);
                    }
                });
            }
            Err(e) => {
                let done = self.chain_finished();
                self.state.send_modify(|s| {
                    let Some(row) = s.terms.get_mut(index) else {
                        return;
                    };
                    warn!(term = %row.term, error = %e, "explanation failed");
                    row.explanation = Some(EXPLANATION_FAILED.to_string());
                    row.verification_status = Some(VerificationStatus::Error);
                    let term = row.term.clone();

                    // Last failure wins; the full list is kept in `failures`.
                    s.error_message = Some(format!("Falha ao processar termo '{term}': {e}"));
                    s.failures.push(TermFailure {
                        index,
                        term,
                        stage: FailedStage::Explanation,
                        message: e.to_string(),
                    });
                    if done {
                        settle(s);
                    }
                });
            }
        }
    }

    fn on_verified(&mut self, index: usize, result: Result<String>) {
        let done = self.chain_finished();
        self.state.send_modify(|s| {
            if let Some(row) = s.terms.get_mut(index) {
                match result {
                    Ok(verdict) => {
                        row.verification_status = Some(VerificationStatus::Verdict(verdict));
                    }
                    Err(e) => {
                        warn!(term = %row.term, error = %e, "verification failed");
                        row.verification_status = Some(VerificationStatus::Error);
                        let term = row.term.clone();
                        s.failures.push(TermFailure {
                            index,
                            term,
                            stage: FailedStage::Verification,
                            message: e.to_string(),
                        });
                    }
                }
            }
            if done {
                settle(s);
            }
        });
    }

    /// Count one chain as complete. True when it was the last one.
    fn chain_finished(&mut self) -> bool {
        self.countdown.as_mut().is_some_and(Countdown::arrive)
    }
}

/// Processing -> Settled.
fn settle(state: &mut PipelineRunState) {
    state.is_loading = false;
    state.phase = RunPhase::Settled;
    state.settled_at = Some(Utc::now());

    info!(
        terms = state.terms.len(),
        failures = state.failures.len(),
        "run settled"
    );
}
