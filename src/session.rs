//! Generation session state and the controller that drives it.
//!
//! The controller owns the form, the session and the gallery. Each accepted
//! submission gets a sequence number and runs on its own task; the task reports
//! back through a single event channel that only the controller reads. Events
//! carrying anything but the latest sequence are dropped, as are events for a
//! submission that has already settled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    download,
    error::{ForgeError, Result, ValidationError},
    fal::ImageService,
    gallery::CreativeGallery,
    logger::Timer,
    models::{FormState, GenerationOutput, GenerationParameters, ProgressUpdate, SavedCreative},
    request,
};

/// Shown for every failure after a request was issued.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate image. Please try again with a different prompt.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSession {
    status: SessionStatus,
    progress_log: Vec<String>,
    result_image_url: Option<String>,
    request_id: Option<String>,
    error_message: Option<String>,
    validation_error: Option<ValidationError>,
    parameters: Option<GenerationParameters>,
    sequence: u64,
}

impl GenerationSession {
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn progress_log(&self) -> &[String] {
        &self.progress_log
    }

    pub fn result_image_url(&self) -> Option<&str> {
        self.result_image_url.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    /// Parameters of the submission this session tracks.
    pub fn parameters(&self) -> Option<&GenerationParameters> {
        self.parameters.as_ref()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == SessionStatus::InFlight
    }

    pub(crate) fn begin(&mut self, sequence: u64, parameters: GenerationParameters) {
        *self = GenerationSession {
            status: SessionStatus::InFlight,
            parameters: Some(parameters),
            sequence,
            ..Default::default()
        };
    }

    pub(crate) fn append_progress(&mut self, update: ProgressUpdate) {
        self.progress_log.extend(update.messages);
    }

    /// The first image wins. An empty image list counts as a failure.
    pub(crate) fn succeed(&mut self, output: GenerationOutput) {
        let Some(url) = output.first_image_url() else {
            self.fail(GENERATION_FAILED_MESSAGE);
            return;
        };
        self.status = SessionStatus::Succeeded;
        self.result_image_url = Some(url.to_string());
        self.request_id = Some(output.request_id);
        self.error_message = None;
    }

    pub(crate) fn fail(&mut self, message: &str) {
        self.status = SessionStatus::Failed;
        self.result_image_url = None;
        self.request_id = None;
        self.error_message = Some(message.to_string());
    }

    pub(crate) fn reject_input(&mut self, error: ValidationError) {
        self.validation_error = Some(error);
    }
}

#[derive(Debug)]
pub enum GenerationEvent {
    Progress(ProgressUpdate),
    Resolved(Result<GenerationOutput>),
}

/// An event from the task running submission `sequence`.
#[derive(Debug)]
pub struct TaggedEvent {
    pub sequence: u64,
    pub event: GenerationEvent,
}

pub struct SessionController<S: ImageService + 'static> {
    service: Arc<S>,
    form: FormState,
    session: GenerationSession,
    gallery: CreativeGallery,
    latest_sequence: u64,
    events_tx: UnboundedSender<TaggedEvent>,
    events_rx: UnboundedReceiver<TaggedEvent>,
}

impl<S: ImageService + 'static> SessionController<S> {
    pub fn new(service: S) -> Self {
        Self::with_shared_service(Arc::new(service))
    }

    pub fn with_shared_service(service: Arc<S>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service,
            form: FormState::default(),
            session: GenerationSession::default(),
            gallery: CreativeGallery::new(),
            latest_sequence: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    pub fn gallery(&self) -> &CreativeGallery {
        &self.gallery
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    /// Validates the form and starts a generation. The session is InFlight when
    /// this returns. Must be called from within a tokio runtime.
    ///
    /// A request that is still running is not cancelled; its events are
    /// discarded once this submission takes over.
    pub fn submit(&mut self) -> std::result::Result<u64, ValidationError> {
        let params = match request::build(&self.form) {
            Ok(params) => params,
            Err(e) => {
                log::warn!("Submission rejected: {}", e);
                self.session.reject_input(e.clone());
                return Err(e);
            }
        };

        if self.session.is_in_flight() {
            log::warn!(
                "Submission #{} superseded before it resolved",
                self.session.sequence()
            );
        }

        self.latest_sequence += 1;
        let sequence = self.latest_sequence;
        log::info!(
            "Submission #{}: aspect_ratio={} style={} expand_prompt={} seed={:?}",
            sequence,
            params.aspect_ratio,
            params.style,
            params.expand_prompt,
            params.seed
        );
        self.session.begin(sequence, params.clone());

        tokio::spawn(drive_generation(
            Arc::clone(&self.service),
            sequence,
            params,
            self.events_tx.clone(),
        ));
        Ok(sequence)
    }

    /// Applies one event to the session. Returns false when the event was
    /// ignored as superseded or late.
    pub fn apply(&mut self, tagged: TaggedEvent) -> bool {
        if tagged.sequence != self.latest_sequence || tagged.sequence != self.session.sequence() {
            log::debug!(
                "Dropping event for superseded submission #{} (latest #{})",
                tagged.sequence,
                self.latest_sequence
            );
            return false;
        }
        if !self.session.is_in_flight() {
            log::debug!(
                "Dropping late event for settled submission #{}",
                tagged.sequence
            );
            return false;
        }

        match tagged.event {
            GenerationEvent::Progress(update) => self.session.append_progress(update),
            GenerationEvent::Resolved(Ok(output)) => {
                self.session.succeed(output);
                match self.session.status() {
                    SessionStatus::Succeeded => log::info!(
                        "Submission #{} succeeded (request {})",
                        tagged.sequence,
                        self.session.request_id().unwrap_or("unknown")
                    ),
                    _ => log::error!("Submission #{} returned no images", tagged.sequence),
                }
            }
            GenerationEvent::Resolved(Err(e)) => {
                log::error!("Submission #{} failed: {}", tagged.sequence, e);
                self.session.fail(GENERATION_FAILED_MESSAGE);
            }
        }
        true
    }

    /// Waits for the next event from any running submission.
    pub async fn next_event(&mut self) -> Option<TaggedEvent> {
        self.events_rx.recv().await
    }

    /// Applies every event that is already waiting, without blocking.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(tagged) = self.events_rx.try_recv() {
            if self.apply(tagged) {
                applied += 1;
            }
        }
        applied
    }

    /// Consumes events until the tracked submission leaves InFlight.
    pub async fn settle(&mut self) -> &GenerationSession {
        while self.session.is_in_flight() {
            match self.events_rx.recv().await {
                Some(tagged) => {
                    self.apply(tagged);
                }
                None => break,
            }
        }
        &self.session
    }

    /// Back to a blank form and an Idle session. Anything still in flight is
    /// treated as superseded. The gallery is kept.
    pub fn reset(&mut self) {
        self.latest_sequence += 1;
        self.form.reset();
        self.session = GenerationSession::default();
        log::info!("Form and session reset");
    }

    pub fn save(&mut self) -> Option<&SavedCreative> {
        self.gallery.save(&self.session)
    }

    pub fn delete_saved(&mut self, index: usize) -> Option<SavedCreative> {
        self.gallery.delete(index)
    }

    /// The raw result URL, for opening the image at full size.
    pub fn full_size_url(&self) -> Option<&str> {
        match self.session.status() {
            SessionStatus::Succeeded => self.session.result_image_url(),
            _ => None,
        }
    }

    /// Fetches the current result and writes it into `dir`.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let url = self.full_size_url().ok_or(ForgeError::NoResult)?;
        let bytes = self.service.fetch_image(url).await?;
        download::write_image(dir.as_ref(), &bytes, Utc::now()).await
    }
}

async fn drive_generation<S: ImageService + ?Sized + 'static>(
    service: Arc<S>,
    sequence: u64,
    params: GenerationParameters,
    events: UnboundedSender<TaggedEvent>,
) {
    let _timer = Timer::new(&format!("submission #{}", sequence));

    let forward_events = events.clone();
    let call = tokio::spawn(async move {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let forward = async move {
            let mut updates = UnboundedReceiverStream::new(progress_rx);
            while let Some(update) = updates.next().await {
                let _ = forward_events.send(TaggedEvent {
                    sequence,
                    event: GenerationEvent::Progress(update),
                });
            }
        };

        // The progress stream closes when `generate` drops its sender, so every
        // notification is forwarded before the resolution.
        let (outcome, ()) = futures::join!(service.generate(&params, progress_tx), forward);
        outcome
    });

    // A panicking service must still resolve the submission.
    let outcome = match call.await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Submission #{} task aborted: {}", sequence, e);
            Err(ForgeError::GenerationFailed(format!(
                "generation task aborted: {}",
                e
            )))
        }
    };
    let _ = events.send(TaggedEvent {
        sequence,
        event: GenerationEvent::Resolved(outcome),
    });
}
