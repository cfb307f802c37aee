use crate::config::DEFAULT_IMAGE_OUTPUT;
use crate::history::HistoryBuffer;
use crate::image::save_base64_image;
use crate::inference::{Completion, Inference, Modality};
use crate::models::{Credentials, Error, ModelDescriptor, Result, Turn};
use crate::ui::commands::Command;
use std::path::{Path, PathBuf};

pub const INPUT_PROMPT: &str =
    "Enter your message for the assistant (or press 'Enter' or type 'q' to exit): ";

/// What to do when a single turn fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Report the error and wait for the next input.
    #[default]
    Continue,
    /// Stop the session and hand the error to the caller.
    Abort,
}

/// Blocking source of user input lines.
pub trait LineSource {
    /// Returns `Ok(None)` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Everything the engine shows to the user.
pub trait Presenter {
    fn render_models(&mut self, models: &[ModelDescriptor]) -> Result<()>;

    fn notify(&mut self, message: &str) -> Result<()>;

    fn thinking(&mut self) -> Result<()>;

    fn present(&mut self, reply: &str) -> Result<()>;

    fn image_saved(&mut self, path: &Path, bytes: usize) -> Result<()>;

    fn report_error(&mut self, error: &Error);

    fn farewell(&mut self) -> Result<()>;
}

#[derive(Debug)]
enum SessionState {
    AwaitingInput,
    Dispatching(String),
    Presenting(Completion),
    Terminated,
}

/// Read-eval-print loop over one model. Owns the conversation history for its
/// whole lifetime.
pub struct SessionLoop<'a, C: ?Sized, U> {
    client: &'a C,
    credentials: &'a Credentials,
    model: &'a ModelDescriptor,
    modality: Modality,
    history: HistoryBuffer,
    policy: FailurePolicy,
    image_output: PathBuf,
    io: &'a mut U,
    state: SessionState,
    completed_turns: usize,
}

impl<'a, C, U> SessionLoop<'a, C, U>
where
    C: Inference + ?Sized,
    U: LineSource + Presenter,
{
    pub fn new(
        client: &'a C,
        credentials: &'a Credentials,
        model: &'a ModelDescriptor,
        modality: Modality,
        history: HistoryBuffer,
        io: &'a mut U,
    ) -> Self {
        Self {
            client,
            credentials,
            model,
            modality,
            history,
            policy: FailurePolicy::default(),
            image_output: PathBuf::from(DEFAULT_IMAGE_OUTPUT),
            io,
            state: SessionState::AwaitingInput,
            completed_turns: 0,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Where generated images are written.
    pub fn with_image_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_output = path.into();
        self
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn completed_turns(&self) -> usize {
        self.completed_turns
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated)
    }

    /// Drive the loop until the user leaves. Returns the number of answered turns.
    pub async fn run(&mut self) -> Result<usize> {
        tracing::info!(model = %self.model.name, modality = ?self.modality, "session started");
        while !self.is_terminated() {
            self.step().await?;
        }
        tracing::info!(turns = self.completed_turns, "session finished");
        Ok(self.completed_turns)
    }

    /// Perform a single state transition.
    pub async fn step(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, SessionState::Terminated);
        self.state = match state {
            SessionState::AwaitingInput => self.await_input()?,
            SessionState::Dispatching(input) => self.dispatch(input).await?,
            SessionState::Presenting(completion) => self.present(completion)?,
            SessionState::Terminated => SessionState::Terminated,
        };
        Ok(())
    }

    fn await_input(&mut self) -> Result<SessionState> {
        let line = match self.io.read_line(INPUT_PROMPT) {
            Ok(line) => line,
            Err(Error::UserExit) => None,
            Err(e) => return Err(e),
        };

        match line.map(|l| l.parse::<Command>()) {
            Some(Ok(Command::Message(text))) => Ok(SessionState::Dispatching(text)),
            Some(Ok(Command::Quit)) | Some(Err(_)) | None => {
                self.io.farewell()?;
                Ok(SessionState::Terminated)
            }
        }
    }

    /// The user turn only becomes part of the history once the service answers,
    /// so a failed turn leaves the stored conversation untouched.
    async fn dispatch(&mut self, input: String) -> Result<SessionState> {
        let mut staged = self.history.clone();
        if self.modality.uses_history() {
            staged.append(Turn::user(input.as_str()));
        }
        let payload = self.modality.build_payload(&staged, &input);

        self.io.thinking()?;
        match self
            .client
            .send(self.model, self.credentials, &payload)
            .await
        {
            Ok(completion) => {
                self.history = staged;
                Ok(SessionState::Presenting(completion))
            }
            Err(e) => self.recover(e),
        }
    }

    fn present(&mut self, completion: Completion) -> Result<SessionState> {
        match completion {
            Completion::Text(reply) => {
                if self.modality.uses_history() {
                    self.history.append(Turn::assistant(reply.as_str()));
                }
                self.io.present(&reply)?;
            }
            Completion::Image(data) => match save_base64_image(&data, &self.image_output) {
                Ok(bytes) => self.io.image_saved(&self.image_output, bytes)?,
                Err(e) => return self.recover(e),
            },
        }
        self.completed_turns += 1;
        Ok(SessionState::AwaitingInput)
    }

    /// A failed turn ends the session only when it is fatal or the policy says so.
    fn recover(&mut self, error: Error) -> Result<SessionState> {
        if error.is_fatal() || self.policy == FailurePolicy::Abort {
            tracing::error!(error = %error, "turn failed, ending session");
            return Err(error);
        }
        tracing::warn!(error = %error, "turn failed");
        self.io.report_error(&error);
        Ok(SessionState::AwaitingInput)
    }
}
