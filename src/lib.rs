pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod credentials;
pub mod history;
pub mod image;
pub mod inference;
pub mod models;
pub mod renderer;
pub mod selector;
pub mod session;
pub mod ui;

pub use app::App;
pub use catalog::ModelCatalog;
pub use client::WorkersAiClient;
pub use config::Settings;
pub use credentials::{CredentialStore, FileCredentialStore};
pub use history::HistoryBuffer;
pub use inference::{Completion, Inference, Modality, Payload};
pub use models::{Credentials, Error, ModelDescriptor, Result, Role, Turn};
pub use selector::{ModelSelector, Selection};
pub use session::{FailurePolicy, LineSource, Presenter, SessionLoop};
