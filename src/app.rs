//! Session setup: credentials, catalog, mode, model and history size, then the
//! conversation loop itself.

use crate::catalog::ModelCatalog;
use crate::config::{Settings, DEFAULT_IMAGE_OUTPUT, TOKEN_HELP_URL};
use crate::credentials::CredentialStore;
use crate::history::{HistoryBuffer, DEFAULT_HISTORY_SIZE};
use crate::inference::{Inference, Modality};
use crate::models::{Credentials, Error, Result};
use crate::selector::ModelSelector;
use crate::session::{FailurePolicy, LineSource, Presenter, SessionLoop};
use crate::ui::commands::{history_menu, parse_history_size, parse_mode, MODE_MENU};
use rand::Rng;
use std::path::PathBuf;

pub struct App<'a, S, C, U, R> {
    store: &'a S,
    client: &'a C,
    io: &'a mut U,
    rng: R,
    env_credentials: Option<Credentials>,
    failure_policy: FailurePolicy,
    image_output: PathBuf,
}

impl<'a, S, C, U, R> App<'a, S, C, U, R>
where
    S: CredentialStore,
    C: ModelCatalog + Inference,
    U: LineSource + Presenter,
    R: Rng,
{
    pub fn new(store: &'a S, client: &'a C, io: &'a mut U, rng: R) -> Self {
        Self {
            store,
            client,
            io,
            rng,
            env_credentials: None,
            failure_policy: FailurePolicy::default(),
            image_output: PathBuf::from(DEFAULT_IMAGE_OUTPUT),
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.env_credentials = settings.env_credentials.clone();
        self.failure_policy = settings.failure_policy;
        self.image_output = settings.image_output.clone();
        self
    }

    pub fn with_image_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_output = path.into();
        self
    }

    /// Run one full session. Returns the number of answered turns.
    pub async fn run(mut self) -> Result<usize> {
        let credentials = self.credentials()?;

        let catalog = self.client.fetch(&credentials).await?;

        let modality = self.choose_mode()?;
        self.io.render_models(&catalog)?;
        let choice = self.ask("Enter the number corresponding to the model you'd like to use: ")?;
        let selection = ModelSelector::select(
            &catalog,
            Some(choice.as_str()),
            modality.capability(),
            &mut self.rng,
        )?;
        if selection.fallback {
            self.io
                .notify(&format!("We selected \"{}\" for you.", selection.model.base_name()))?;
        }
        let model = selection.model;

        let capacity = if modality.uses_history() {
            self.choose_history_size()?
        } else {
            DEFAULT_HISTORY_SIZE
        };

        let mut session = SessionLoop::new(
            self.client,
            &credentials,
            &model,
            modality,
            HistoryBuffer::new(capacity),
            &mut *self.io,
        )
        .with_policy(self.failure_policy)
        .with_image_output(self.image_output.clone());
        session.run().await
    }

    /// Environment override, then the store, then an interactive prompt whose
    /// answers are saved for next time.
    fn credentials(&mut self) -> Result<Credentials> {
        if let Some(credentials) = self.env_credentials.clone() {
            tracing::debug!("using credentials from environment");
            credentials.validate()?;
            return Ok(credentials);
        }

        if let Some(credentials) = self.store.load()? {
            credentials.validate()?;
            return Ok(credentials);
        }

        self.io.notify(&format!(
            "To use this service you need a Cloudflare API Token with Workers AI Read and Edit access from {TOKEN_HELP_URL}"
        ))?;
        let account_id = self.ask("Enter your Cloudflare Account ID: ")?;
        let token = self.ask("Enter your Cloudflare API Token: ")?;
        let credentials = Credentials::new(account_id.trim(), token.trim());
        self.store.save(&credentials)?;
        Ok(credentials)
    }

    fn choose_mode(&mut self) -> Result<Modality> {
        self.io.notify(MODE_MENU)?;
        let answer = self.ask("Mode: ")?;
        Ok(parse_mode(&answer))
    }

    fn choose_history_size(&mut self) -> Result<usize> {
        self.io.notify(&history_menu())?;
        let answer = self.ask("History size: ")?;
        match parse_history_size(&answer) {
            Some(size) => Ok(size),
            None => {
                self.io.notify(&format!(
                    "Invalid selection. We select the {DEFAULT_HISTORY_SIZE} size for you."
                ))?;
                Ok(DEFAULT_HISTORY_SIZE)
            }
        }
    }

    /// End of input while setting up is a request to leave.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.io.read_line(prompt)?.ok_or(Error::UserExit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Completion, Payload};
    use crate::models::ModelDescriptor;
    use crate::selector::{TEXT_GENERATION, TEXT_TO_IMAGE};
    use crate::session::tests::{FakeConsole, ScriptedInference};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Option<Credentials>>,
    }

    impl CredentialStore for MemoryStore {
        fn load(&self) -> Result<Option<Credentials>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, credentials: &Credentials) -> Result<()> {
            credentials.validate()?;
            *self.saved.lock().unwrap() = Some(credentials.clone());
            Ok(())
        }
    }

    struct FakeService {
        catalog: Option<Vec<ModelDescriptor>>,
        inference: ScriptedInference,
        used_models: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn new(catalog: Vec<ModelDescriptor>) -> Self {
            Self {
                catalog: Some(catalog),
                inference: ScriptedInference::default(),
                used_models: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelCatalog for FakeService {
        async fn fetch(&self, credentials: &Credentials) -> Result<Vec<ModelDescriptor>> {
            credentials.validate()?;
            self.catalog
                .clone()
                .ok_or_else(|| Error::Service("failed to fetch models".into()))
        }
    }

    #[async_trait]
    impl Inference for FakeService {
        async fn send(
            &self,
            model: &ModelDescriptor,
            credentials: &Credentials,
            payload: &Payload,
        ) -> Result<Completion> {
            self.used_models.lock().unwrap().push(model.name.clone());
            self.inference.send(model, credentials, payload).await
        }
    }

    fn model(name: &str, capability: &str) -> ModelDescriptor {
        ModelDescriptor {
            id: name.into(),
            name: format!("@cf/test/{name}"),
            description: String::new(),
            capability: capability.into(),
        }
    }

    fn catalog() -> Vec<ModelDescriptor> {
        vec![model("painter", TEXT_TO_IMAGE), model("llama", TEXT_GENERATION)]
    }

    #[tokio::test]
    async fn prompts_for_and_saves_missing_credentials() {
        let store = MemoryStore::default();
        let service = FakeService::new(catalog());
        let mut console =
            FakeConsole::with_inputs(&["acct-1", "tok-1", "1", "2", "4", "hello", "q"]);

        let turns = App::new(&store, &service, &mut console, StdRng::seed_from_u64(3))
            .run()
            .await
            .unwrap();

        assert_eq!(turns, 1);
        assert_eq!(
            *store.saved.lock().unwrap(),
            Some(Credentials::new("acct-1", "tok-1"))
        );
        assert_eq!(*service.used_models.lock().unwrap(), vec!["@cf/test/llama"]);
        assert_eq!(console.rendered_models, 1);
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_before_any_request() {
        let store = MemoryStore::default();
        let service = FakeService::new(catalog());
        let mut console = FakeConsole::with_inputs(&["", "", "1"]);

        let err = App::new(&store, &service, &mut console, StdRng::seed_from_u64(3))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(store.saved.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_model_choice_falls_back_by_mode_capability() {
        let store = MemoryStore::default();
        store.save(&Credentials::new("acct", "tok")).unwrap();
        let service = FakeService::new(catalog());
        let mut console = FakeConsole::with_inputs(&["2", "99", "a lighthouse", "q"]);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lighthouse.png");

        App::new(&store, &service, &mut console, StdRng::seed_from_u64(9))
            .with_image_output(&output)
            .run()
            .await
            .unwrap();

        assert_eq!(*service.used_models.lock().unwrap(), vec!["@cf/test/painter"]);
        assert!(console
            .notices
            .iter()
            .any(|n| n == "We selected \"painter\" for you."));
        assert_eq!(
            service.inference.requests(),
            vec![Payload::Prompt {
                prompt: "a lighthouse".into()
            }]
        );
        assert_eq!(console.saved_images, vec![(output, 5)]);
    }

    #[tokio::test]
    async fn invalid_history_size_defaults_to_six() {
        let store = MemoryStore::default();
        let service = FakeService::new(catalog());
        let mut console = FakeConsole::with_inputs(&["1", "2", "42", "q"]);
        let settings = Settings::from_lookup(|key| match key {
            "CLOUDFLARE_ACCOUNT_ID" => Some("env-acct".into()),
            "CLOUDFLARE_API_TOKEN" => Some("env-tok".into()),
            _ => None,
        })
        .unwrap();

        App::new(&store, &service, &mut console, StdRng::seed_from_u64(1))
            .with_settings(&settings)
            .run()
            .await
            .unwrap();

        assert!(console
            .notices
            .iter()
            .any(|n| n.starts_with("Invalid selection. We select the 6 size")));
        assert!(store.saved.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn no_capable_model_aborts_before_any_turn() {
        let store = MemoryStore::default();
        store.save(&Credentials::new("acct", "tok")).unwrap();
        let service = FakeService::new(vec![model("painter", TEXT_TO_IMAGE)]);
        let mut console = FakeConsole::with_inputs(&["1", "", "hello"]);

        let err = App::new(&store, &service, &mut console, StdRng::seed_from_u64(1))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoCapableModel(_)));
        assert!(service.inference.requests().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_aborts_session() {
        let store = MemoryStore::default();
        store.save(&Credentials::new("acct", "tok")).unwrap();
        let mut service = FakeService::new(Vec::new());
        service.catalog = None;
        let mut console = FakeConsole::with_inputs(&["1", "1", "hello"]);

        let err = App::new(&store, &service, &mut console, StdRng::seed_from_u64(1))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Service(_)));
        assert_eq!(console.rendered_models, 0);
    }

    #[tokio::test]
    async fn end_of_input_during_setup_is_user_exit() {
        let store = MemoryStore::default();
        store.save(&Credentials::new("acct", "tok")).unwrap();
        let service = FakeService::new(catalog());
        let mut console = FakeConsole::with_inputs(&[]);

        let err = App::new(&store, &service, &mut console, StdRng::seed_from_u64(1))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UserExit));
    }
}
