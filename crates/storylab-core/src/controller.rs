//! The generation request lifecycle shared by every panel.
//!
//! `submit` validates, flips the panel to busy and spawns the remote call.
//! The result is only written back by the owner, through [`GenerationController::poll`]
//! or [`GenerationController::settle`], so panel state is never touched from
//! inside the spawned task. At most one request per panel is in flight; a
//! trigger while busy is dropped, not queued.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactKind, PanelId};
use crate::error::{ErrorKind, GenerationError};
use crate::generation::{GenerationBackend, GenerationRequest, GenerationResult, Parameters};
use crate::notify::NotificationCenter;
use crate::state::PanelState;
use crate::transcript::ChatTranscript;

type TaskOutput = Result<GenerationResult, GenerationError>;

struct InFlight {
    kind: ArtifactKind,
    handle: JoinHandle<TaskOutput>,
}

struct PanelSlot {
    state: PanelState,
    transcript: Option<ChatTranscript>,
    in_flight: Option<InFlight>,
}

impl PanelSlot {
    fn new(panel: PanelId) -> Self {
        Self {
            state: PanelState::default(),
            transcript: panel.is_chat().then(ChatTranscript::new),
            in_flight: None,
        }
    }
}

/// What a trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request sent; the panel is now busy
    Started,
    /// A request was already in flight, so this one was dropped
    Busy,
    /// Required input missing; nothing was sent
    Invalid(String),
    /// The panel is not registered (or was disposed)
    UnknownPanel,
}

/// A finished request whose result has been applied to its panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub panel: PanelId,
    pub kind: ArtifactKind,
    pub outcome: Result<(), ErrorKind>,
}

pub struct GenerationController {
    backend: Arc<dyn GenerationBackend>,
    notifier: NotificationCenter,
    panels: HashMap<PanelId, PanelSlot>,
}

impl GenerationController {
    /// Controller with every panel registered and idle
    pub fn new(backend: Arc<dyn GenerationBackend>, notifier: NotificationCenter) -> Self {
        let panels = PanelId::all()
            .into_iter()
            .map(|panel| (panel, PanelSlot::new(panel)))
            .collect();

        Self {
            backend,
            notifier,
            panels,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn notifier(&self) -> &NotificationCenter {
        &self.notifier
    }

    pub fn state(&self, panel: PanelId) -> Option<&PanelState> {
        self.panels.get(&panel).map(|slot| &slot.state)
    }

    pub fn is_busy(&self, panel: PanelId) -> bool {
        self.state(panel).is_some_and(|state| state.busy)
    }

    pub fn last_result(&self, panel: PanelId) -> Option<&GenerationResult> {
        self.state(panel).and_then(|state| state.last_result.as_ref())
    }

    pub fn transcript(&self, panel: PanelId) -> Option<&ChatTranscript> {
        self.panels.get(&panel).and_then(|slot| slot.transcript.as_ref())
    }

    /// Trigger a request of `kind` on `panel`.
    ///
    /// Invalid input raises an error notification and sends nothing. A busy
    /// panel ignores the trigger. `kind` must be the panel's own kind.
    pub fn submit(&mut self, panel: PanelId, kind: ArtifactKind, parameters: Parameters) -> SubmitOutcome {
        if kind != panel.kind() {
            warn!(panel = ?panel, kind = kind.as_str(), "request kind does not belong to panel");
            return SubmitOutcome::Invalid(format!(
                "{} requests cannot be sent from the {} panel",
                kind.display_name(),
                panel.display_name()
            ));
        }

        let request = GenerationRequest::new(kind, parameters);

        if let Err(e) = request.validate() {
            debug!(panel = ?panel, kind = kind.as_str(), "request rejected before sending");
            let message = e.to_string();
            self.notifier.error(message.clone());
            return SubmitOutcome::Invalid(message);
        }

        self.start(panel, request)
    }

    /// Send a chat message: the user's text goes into the transcript and a
    /// request for the panel's kind goes out. Blank text does nothing.
    pub fn submit_chat(&mut self, panel: PanelId, text: &str) -> SubmitOutcome {
        let kind = panel.kind();
        let parameters = {
            let Some(slot) = self.panels.get_mut(&panel) else {
                return SubmitOutcome::UnknownPanel;
            };
            if slot.state.busy {
                debug!(panel = ?panel, "chat panel busy, message dropped");
                return SubmitOutcome::Busy;
            }
            let Some(transcript) = slot.transcript.as_mut() else {
                warn!(panel = ?panel, "chat message sent to a panel without a transcript");
                return SubmitOutcome::UnknownPanel;
            };
            if transcript.append_user(text).is_none() {
                return SubmitOutcome::Invalid(kind.validation_message().to_string());
            }

            let mut parameters = Parameters::new();
            match kind {
                ArtifactKind::Revision => {
                    parameters.insert("instructions".to_string(), text.to_string());
                    if let Some(document) = transcript.latest_document() {
                        parameters.insert("document".to_string(), document.to_string());
                    }
                }
                _ => {
                    parameters.insert("message".to_string(), text.to_string());
                }
            }
            parameters
        };

        self.submit(panel, kind, parameters)
    }

    /// Record an uploaded document in a chat panel's transcript
    pub fn append_document(&mut self, panel: PanelId, name: &str) -> bool {
        match self.panels.get_mut(&panel).and_then(|slot| slot.transcript.as_mut()) {
            Some(transcript) => {
                transcript.append_document(name);
                info!(panel = ?panel, document = name, "document attached");
                true
            }
            None => false,
        }
    }

    fn start(&mut self, panel: PanelId, request: GenerationRequest) -> SubmitOutcome {
        let Some(slot) = self.panels.get_mut(&panel) else {
            warn!(panel = ?panel, "submit to unknown panel");
            return SubmitOutcome::UnknownPanel;
        };
        if slot.state.busy {
            debug!(panel = ?panel, "panel busy, trigger dropped");
            return SubmitOutcome::Busy;
        }

        let kind = request.kind();
        let backend = Arc::clone(&self.backend);
        slot.state.busy = true;
        slot.in_flight = Some(InFlight {
            kind,
            handle: tokio::spawn(async move { backend.generate(&request).await }),
        });

        info!(panel = ?panel, kind = kind.as_str(), backend = self.backend.name(), "generation started");
        SubmitOutcome::Started
    }

    /// Apply every request that has finished, without waiting
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut finished = Vec::new();

        for (panel, slot) in self.panels.iter_mut() {
            let Some(in_flight) = slot.in_flight.as_mut() else {
                continue;
            };
            if !in_flight.handle.is_finished() {
                continue;
            }
            if let Some(joined) = (&mut in_flight.handle).now_or_never() {
                let kind = in_flight.kind;
                slot.in_flight = None;
                finished.push((*panel, kind, joined));
            }
        }

        finished
            .into_iter()
            .map(|(panel, kind, joined)| self.apply(panel, kind, joined))
            .collect()
    }

    /// Wait for `panel`'s request and apply it. `None` when nothing is in flight.
    pub async fn settle(&mut self, panel: PanelId) -> Option<Completion> {
        let slot = self.panels.get_mut(&panel)?;
        let in_flight = slot.in_flight.as_mut()?;
        let joined = (&mut in_flight.handle).await;
        let kind = in_flight.kind;
        slot.in_flight = None;
        Some(self.apply(panel, kind, joined))
    }

    fn apply(
        &mut self,
        panel: PanelId,
        kind: ArtifactKind,
        joined: Result<TaskOutput, JoinError>,
    ) -> Completion {
        let outcome = joined.unwrap_or_else(|e| Err(GenerationError::Cancelled(e.to_string())));

        let Some(slot) = self.panels.get_mut(&panel) else {
            return Completion {
                panel,
                kind,
                outcome: Err(ErrorKind::NetworkError),
            };
        };

        // Cleared on every path out of the lifecycle
        slot.state.busy = false;

        match outcome {
            Ok(result) => {
                info!(panel = ?panel, kind = kind.as_str(), chars = result.content.len(), "generation finished");
                if let Some(transcript) = slot.transcript.as_mut() {
                    transcript.append_ai(&result.content);
                }
                slot.state.last_result = Some(result);
                slot.state.last_error = None;
                Completion {
                    panel,
                    kind,
                    outcome: Ok(()),
                }
            }
            Err(e) => {
                warn!(panel = ?panel, kind = kind.as_str(), error = %e, "generation failed");
                let error_kind = e.kind();
                slot.state.last_error = Some(error_kind);
                self.notifier.error(kind.failure_message());
                Completion {
                    panel,
                    kind,
                    outcome: Err(error_kind),
                }
            }
        }
    }

    /// Tear a panel down. Its in-flight request is aborted and its result, if
    /// one still arrives, is discarded.
    pub fn dispose(&mut self, panel: PanelId) -> bool {
        let Some(slot) = self.panels.remove(&panel) else {
            return false;
        };
        if let Some(in_flight) = slot.in_flight {
            in_flight.handle.abort();
            debug!(panel = ?panel, "in-flight request aborted on dispose");
        }
        true
    }

    /// Bring a disposed panel back, idle and with an empty transcript
    pub fn register(&mut self, panel: PanelId) {
        self.panels
            .entry(panel)
            .or_insert_with(|| PanelSlot::new(panel));
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        for slot in self.panels.values() {
            if let Some(in_flight) = &slot.in_flight {
                in_flight.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    enum Reply {
        Ok(GenerationResult),
        Fail,
        Panic,
    }

    struct StubBackend {
        calls: AtomicUsize,
        gate: Option<Semaphore>,
        reply: Reply,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl StubBackend {
        fn new(reply: Reply, gated: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: gated.then(|| Semaphore::new(0)),
                reply,
                last_request: Mutex::new(None),
            })
        }

        fn replying(content: &str) -> Arc<Self> {
            Self::new(Reply::Ok(result(content)), false)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            match &self.reply {
                Reply::Ok(result) => Ok(result.clone()),
                Reply::Fail => Err(GenerationError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
                Reply::Panic => panic!("backend exploded"),
            }
        }
    }

    fn result(content: &str) -> GenerationResult {
        GenerationResult {
            content: content.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            echoed_parameters: Parameters::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn error_messages(controller: &GenerationController) -> Vec<String> {
        controller
            .notifier()
            .visible()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message)
            .collect()
    }

    async fn poll_until_done(controller: &mut GenerationController) -> Vec<Completion> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                tokio::task::yield_now().await;
                let done = controller.poll();
                if !done.is_empty() {
                    return done;
                }
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_kind_must_match_panel() {
        let backend = StubBackend::replying("A thief...");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        let outcome = controller.submit(
            PanelId::Creation,
            ArtifactKind::Idea,
            params(&[("genre", "fantasy")]),
        );
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(!controller.is_busy(PanelId::Creation));
        assert!(controller.transcript(PanelId::Creation).unwrap().is_empty());

        let outcome = controller.submit(
            PanelId::Plot,
            ArtifactKind::Dialogue,
            params(&[("characters", "Ada"), ("scene_context", "A ferry")]),
        );
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));

        tokio::task::yield_now().await;
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_idea_result_is_recorded() {
        let backend = StubBackend::replying("A thief...");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        let outcome = controller.submit(
            PanelId::Idea,
            ArtifactKind::Idea,
            params(&[("genre", "fantasy"), ("style", "noir"), ("theme", "betrayal")]),
        );
        assert_eq!(outcome, SubmitOutcome::Started);
        assert!(controller.is_busy(PanelId::Idea));

        let completion = controller.settle(PanelId::Idea).await.unwrap();
        assert_eq!(completion.outcome, Ok(()));

        let state = controller.state(PanelId::Idea).unwrap();
        assert!(!state.busy);
        assert_eq!(state.last_result, Some(result("A thief...")));
        assert_eq!(state.last_error, None);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_trigger_while_busy_is_dropped() {
        let backend = StubBackend::new(Reply::Ok(result("outline")), true);
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());
        let request = params(&[("story_idea", "A lighthouse keeper")]);

        assert_eq!(
            controller.submit(PanelId::Plot, ArtifactKind::Plot, request.clone()),
            SubmitOutcome::Started
        );
        assert_eq!(
            controller.submit(PanelId::Plot, ArtifactKind::Plot, request),
            SubmitOutcome::Busy
        );

        backend.release();
        controller.settle(PanelId::Plot).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert!(controller.state(PanelId::Plot).unwrap().is_idle());
        assert!(controller.settle(PanelId::Plot).await.is_none());
    }

    #[tokio::test]
    async fn test_panels_are_independent() {
        let backend = StubBackend::new(Reply::Ok(result("text")), true);
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        controller.submit(PanelId::Idea, ArtifactKind::Idea, Parameters::new());
        let outcome = controller.submit(PanelId::Prompt, ArtifactKind::Prompt, params(&[("type", "setting")]));
        assert_eq!(outcome, SubmitOutcome::Started);

        backend.release();
        backend.release();
        controller.settle(PanelId::Idea).await.unwrap();
        controller.settle(PanelId::Prompt).await.unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let backend = StubBackend::replying("unused");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        let outcome = controller.submit(PanelId::Plot, ArtifactKind::Plot, params(&[("story_idea", "")]));

        assert_eq!(
            outcome,
            SubmitOutcome::Invalid("Please enter a story idea first.".to_string())
        );
        assert_eq!(backend.calls(), 0);
        assert_eq!(controller.state(PanelId::Plot), Some(&PanelState::default()));
        assert_eq!(error_messages(&controller), ["Please enter a story idea first."]);
    }

    #[tokio::test]
    async fn test_failure_clears_busy_and_notifies() {
        let backend = StubBackend::new(Reply::Fail, true);
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        controller.submit(
            PanelId::Dialogue,
            ArtifactKind::Dialogue,
            params(&[("characters", "Ada"), ("scene_context", "A ferry")]),
        );
        assert!(controller.poll().is_empty());
        assert!(controller.is_busy(PanelId::Dialogue));

        backend.release();
        let done = poll_until_done(&mut controller).await;

        assert_eq!(done.len(), 1);
        assert_eq!(done[0].outcome, Err(ErrorKind::NetworkError));
        let state = controller.state(PanelId::Dialogue).unwrap();
        assert!(!state.busy);
        assert_eq!(state.last_error, Some(ErrorKind::NetworkError));
        assert_eq!(
            error_messages(&controller),
            ["Failed to generate dialogue. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let good = StubBackend::replying("first");
        let mut controller = GenerationController::new(good, NotificationCenter::new());
        controller.submit(PanelId::Idea, ArtifactKind::Idea, Parameters::new());
        controller.settle(PanelId::Idea).await.unwrap();

        let failing: Arc<dyn GenerationBackend> = StubBackend::new(Reply::Fail, false);
        controller.backend = failing;
        controller.submit(PanelId::Idea, ArtifactKind::Idea, Parameters::new());
        controller.settle(PanelId::Idea).await.unwrap();

        let state = controller.state(PanelId::Idea).unwrap();
        assert_eq!(state.last_result.as_ref().map(|r| r.content.as_str()), Some("first"));
        assert_eq!(state.last_error, Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn test_panicking_backend_does_not_leave_panel_busy() {
        let backend = StubBackend::new(Reply::Panic, false);
        let mut controller = GenerationController::new(backend, NotificationCenter::new());

        controller.submit(PanelId::Prompt, ArtifactKind::Prompt, Parameters::new());
        let completion = controller.settle(PanelId::Prompt).await.unwrap();

        assert_eq!(completion.outcome, Err(ErrorKind::NetworkError));
        assert!(controller.state(PanelId::Prompt).unwrap().is_idle());
        assert_eq!(
            error_messages(&controller),
            ["Failed to generate prompt. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_chat_success_appends_ai_reply() {
        let backend = StubBackend::replying("The robot hummed a tune.");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        assert_eq!(
            controller.submit_chat(PanelId::Creation, "a robot who discovers music"),
            SubmitOutcome::Started
        );
        controller.settle(PanelId::Creation).await.unwrap();

        let transcript = controller.transcript(PanelId::Creation).unwrap();
        let roles: Vec<ChatRole> = transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [ChatRole::User, ChatRole::Ai]);
        assert_eq!(transcript.messages()[1].content, "The robot hummed a tune.");

        let sent = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.kind(), ArtifactKind::Story);
        assert_eq!(sent.get("message"), Some("a robot who discovers music"));
    }

    #[tokio::test]
    async fn test_chat_failure_appends_nothing() {
        let backend = StubBackend::new(Reply::Fail, false);
        let mut controller = GenerationController::new(backend, NotificationCenter::new());

        controller.submit_chat(PanelId::Creation, "hello");
        controller.settle(PanelId::Creation).await.unwrap();

        let transcript = controller.transcript(PanelId::Creation).unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role, ChatRole::User);
        assert_eq!(
            error_messages(&controller),
            ["Failed to generate story. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_blank_chat_message_is_silent_noop() {
        let backend = StubBackend::replying("unused");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        let outcome = controller.submit_chat(PanelId::Creation, "   ");

        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(controller.transcript(PanelId::Creation).unwrap().is_empty());
        assert!(controller.notifier().visible().is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_busy_chat_drops_message() {
        let backend = StubBackend::new(Reply::Ok(result("reply")), true);
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        controller.submit_chat(PanelId::Improvement, "tighten chapter one");
        assert_eq!(
            controller.submit_chat(PanelId::Improvement, "and chapter two"),
            SubmitOutcome::Busy
        );
        assert_eq!(controller.transcript(PanelId::Improvement).unwrap().len(), 1);

        backend.release();
        controller.settle(PanelId::Improvement).await.unwrap();
        assert_eq!(controller.transcript(PanelId::Improvement).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_improvement_sends_latest_document() {
        let backend = StubBackend::replying("Cut the prologue.");
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        assert!(controller.append_document(PanelId::Improvement, "draft.docx"));
        assert!(!controller.append_document(PanelId::Plot, "draft.docx"));
        controller.submit_chat(PanelId::Improvement, "make it shorter");
        controller.settle(PanelId::Improvement).await.unwrap();

        let sent = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.kind(), ArtifactKind::Revision);
        assert_eq!(sent.get("instructions"), Some("make it shorter"));
        assert_eq!(sent.get("document"), Some("draft.docx"));

        let roles: Vec<ChatRole> = controller
            .transcript(PanelId::Improvement)
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, [ChatRole::Document, ChatRole::User, ChatRole::Ai]);
    }

    #[tokio::test]
    async fn test_dispose_discards_late_result() {
        let backend = StubBackend::new(Reply::Ok(result("late")), true);
        let mut controller = GenerationController::new(backend.clone(), NotificationCenter::new());

        controller.submit_chat(PanelId::Creation, "hello");
        assert!(controller.dispose(PanelId::Creation));
        assert!(!controller.dispose(PanelId::Creation));

        backend.release();
        tokio::task::yield_now().await;
        assert!(controller.poll().is_empty());
        assert!(controller.state(PanelId::Creation).is_none());
        assert_eq!(
            controller.submit_chat(PanelId::Creation, "again"),
            SubmitOutcome::UnknownPanel
        );

        controller.register(PanelId::Creation);
        assert!(controller.state(PanelId::Creation).unwrap().is_idle());
        assert!(controller.transcript(PanelId::Creation).unwrap().is_empty());
    }
}
