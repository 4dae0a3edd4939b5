//! Submission dispatch and the authenticated request executor.

use std::collections::VecDeque;

use crate::auth::{
    register_then_login, AuthError, AuthResult, AuthSession, CredentialApi, SessionPersistence,
    SignUpOutcome,
};
use crate::form::{ErrorState, FieldState, FormDescriptor, FormFlags, FormMode, Notice};
use crate::gifs::{GifApiError, GifApiResult, GifFile, GifRecord, GifStore, GifSubmission};

/// Shared success notice for gif create and update.
const GIF_SUCCESS_NOTICE: &str = "Successfully uploaded the gif!";
const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";
const REGISTERED_NOTICE: &str = "Account created, but signing in failed. Please log in.";
const NOT_LOGGED_IN_NOTICE: &str = "You must be logged in to submit gifs.";

/// What a call to [`FormController::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The active form's operation succeeded and the form was closed.
    Completed,
    /// The operation failed; errors were recorded on the form state.
    Failed,
    /// Nothing was submitted (form closed, already loading, or the
    /// completion arrived for a stale form generation).
    Ignored,
}

/// Drives the four-mode form: mode transitions, field state, and the
/// mode-specific submit routines, including transparent access-token
/// refresh-and-retry for authenticated gif requests.
///
/// Collaborators are injected: credential routes, gif storage routes, and
/// durable session persistence. All state the embedding surface renders
/// (mode, descriptor, fields, errors, loading, notices, gallery tags) is
/// owned here rather than in a global store.
pub struct FormController<C, G, S>
where
    C: CredentialApi,
    G: GifStore,
    S: SessionPersistence,
{
    credentials: C,
    gifs: G,
    sessions: S,
    session: Option<AuthSession>,
    authenticated: bool,
    loading: bool,
    flags: FormFlags,
    fields: FieldState,
    errors: ErrorState,
    descriptor: FormDescriptor,
    /// Bumped on every mode transition; async completions captured under an
    /// older generation are discarded instead of mutating reset state.
    generation: u64,
    target_gif: Option<u64>,
    gallery_tags: Vec<String>,
    notices: VecDeque<Notice>,
}

impl<C, G, S> FormController<C, G, S>
where
    C: CredentialApi,
    G: GifStore,
    S: SessionPersistence,
{
    pub fn new(credentials: C, gifs: G, sessions: S) -> AuthResult<Self> {
        let session = sessions.load_session()?;
        Ok(Self {
            credentials,
            gifs,
            sessions,
            authenticated: session.is_some(),
            session,
            loading: false,
            flags: FormFlags::default(),
            fields: FieldState::default(),
            errors: ErrorState::default(),
            descriptor: FormDescriptor::for_mode(FormMode::Closed),
            generation: 0,
            target_gif: None,
            gallery_tags: Vec::new(),
            notices: VecDeque::new(),
        })
    }

    // --- Mode transitions ---

    pub fn open_login(&mut self) {
        self.transition(FormMode::Login);
    }

    pub fn open_sign_up(&mut self) {
        self.transition(FormMode::SignUp);
    }

    pub fn open_upload(&mut self) {
        self.transition(FormMode::Upload);
    }

    pub fn open_update(&mut self, gif_id: u64) {
        self.transition(FormMode::Update);
        self.target_gif = Some(gif_id);
    }

    pub fn close(&mut self) {
        self.transition(FormMode::Closed);
    }

    /// Switch to `mode`, enforcing the one-active-form invariant.
    ///
    /// Entering Upload resets field and error state. Every transition bumps
    /// the generation counter and drops the loading flag, so completions of
    /// requests issued before the transition are discarded.
    fn transition(&mut self, mode: FormMode) {
        if self.mode() == mode {
            return;
        }
        self.flags = FormFlags::for_mode(mode);
        self.descriptor = FormDescriptor::for_mode(mode);
        self.generation += 1;
        self.loading = false;
        if mode != FormMode::Update {
            self.target_gif = None;
        }
        if mode == FormMode::Upload {
            self.fields.reset();
            self.errors.clear();
        }
    }

    // --- Field events ---

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.fields.name = value.into();
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.fields.password = value.into();
    }

    pub fn set_password_confirm(&mut self, value: impl Into<String>) {
        self.fields.password_confirm = value.into();
    }

    pub fn set_file(&mut self, file: Option<GifFile>) {
        self.fields.file = file;
    }

    pub fn set_tag_input(&mut self, value: impl Into<String>) {
        self.fields.tag_input = value.into();
    }

    pub fn select_tag(&mut self, tag: impl Into<String>) {
        self.fields.select_tag(tag);
    }

    pub fn deselect_tag(&mut self, tag: &str) {
        self.fields.deselect_tag(tag);
    }

    // --- Accessors ---

    pub fn mode(&self) -> FormMode {
        FormMode::resolve(&self.flags)
    }

    pub fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    pub fn fields(&self) -> &FieldState {
        &self.fields
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn target_gif(&self) -> Option<u64> {
        self.target_gif
    }

    /// The gallery-wide tag list, replaced from each successful submission.
    pub fn gallery_tags(&self) -> &[String] {
        &self.gallery_tags
    }

    /// Take all queued notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Drop the stored session and mark the controller unauthenticated.
    pub fn sign_out(&mut self) -> AuthResult<()> {
        self.sessions.clear_session()?;
        self.session = None;
        self.authenticated = false;
        Ok(())
    }

    // --- Submission dispatch ---

    /// Route a submit event to the active mode's routine.
    ///
    /// No-op while the form is closed. Re-entrant submits are rejected
    /// while a previous submission is still loading.
    pub async fn submit(&mut self) -> AuthResult<SubmitOutcome> {
        if self.loading {
            tracing::debug!("submit ignored: a submission is already in flight");
            return Ok(SubmitOutcome::Ignored);
        }

        match self.mode() {
            FormMode::Closed => Ok(SubmitOutcome::Ignored),
            FormMode::Upload => self.submit_gif(None).await,
            FormMode::Update => match self.target_gif {
                Some(gif_id) => self.submit_gif(Some(gif_id)).await,
                None => {
                    self.push_notice(Notice::Error("No gif selected for update.".to_string()));
                    Ok(SubmitOutcome::Failed)
                }
            },
            FormMode::Login => self.submit_login().await,
            FormMode::SignUp => self.submit_sign_up().await,
        }
    }

    // --- Credential flows ---

    async fn submit_login(&mut self) -> AuthResult<SubmitOutcome> {
        let generation = self.generation;
        let result = self
            .credentials
            .login(&self.fields.name, &self.fields.password)
            .await;

        if generation != self.generation {
            tracing::debug!("discarding login completion for a stale form generation");
            return Ok(SubmitOutcome::Ignored);
        }

        match result {
            Ok(session) => {
                self.store_session(session)?;
                self.close();
                Ok(SubmitOutcome::Completed)
            }
            Err(AuthError::Rejected(errors)) => {
                self.errors.name = errors.username;
                self.errors.password = errors.password;
                if !errors.non_field_errors.is_empty() {
                    self.push_notice(Notice::Error(errors.non_field_errors));
                }
                Ok(SubmitOutcome::Failed)
            }
            Err(error) => {
                self.push_notice(Notice::Error(error.to_string()));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    async fn submit_sign_up(&mut self) -> AuthResult<SubmitOutcome> {
        let generation = self.generation;
        let result = register_then_login(
            &self.credentials,
            &self.fields.name,
            &self.fields.password,
            &self.fields.password_confirm,
        )
        .await;

        if generation != self.generation {
            tracing::debug!("discarding sign-up completion for a stale form generation");
            return Ok(SubmitOutcome::Ignored);
        }

        match result {
            Ok(SignUpOutcome::SignedIn(session)) => {
                self.store_session(session)?;
                self.close();
                Ok(SubmitOutcome::Completed)
            }
            Ok(SignUpOutcome::Registered) => {
                self.push_notice(Notice::Error(REGISTERED_NOTICE.to_string()));
                self.transition(FormMode::Login);
                Ok(SubmitOutcome::Failed)
            }
            Err(AuthError::Rejected(errors)) => {
                self.errors.name = errors.username;
                self.errors.password = errors.password;
                // Password-confirmation mismatch arrives as a non-field
                // error and belongs to the confirmation input.
                self.errors.password_confirm = errors.non_field_errors;
                Ok(SubmitOutcome::Failed)
            }
            Err(error) => {
                self.push_notice(Notice::Error(error.to_string()));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    fn store_session(&mut self, session: AuthSession) -> AuthResult<()> {
        self.sessions.save_session(&session)?;
        self.session = Some(session);
        self.authenticated = true;
        Ok(())
    }

    // --- Authenticated request executor ---

    /// Perform a gif create (`target` is `None`) or update, refreshing the
    /// access token and retrying exactly once on an authorization failure.
    async fn submit_gif(&mut self, target: Option<u64>) -> AuthResult<SubmitOutcome> {
        let Some(session) = self.session.clone() else {
            self.push_notice(Notice::Error(NOT_LOGGED_IN_NOTICE.to_string()));
            return Ok(SubmitOutcome::Failed);
        };

        let submission = GifSubmission {
            name: self.fields.name.clone(),
            tags: self.fields.selected_tags.clone(),
            // The file part is only ever sent on create.
            file: if target.is_none() {
                self.fields.file.clone()
            } else {
                None
            },
        };

        self.loading = true;
        let generation = self.generation;

        let first = self.perform(target, &session.access_token, &submission).await;
        if !matches!(first, Err(GifApiError::Unauthorized)) {
            return self.apply_gif_completion(generation, first);
        }

        match self.credentials.refresh(&session.refresh_token).await {
            Ok(refreshed_access) => {
                self.store_refreshed_access(&refreshed_access)?;
                // Retry once, with the refreshed token as the explicit
                // input - never the token captured at request-build time.
                let retry = self.perform(target, &refreshed_access, &submission).await;
                self.apply_gif_completion(generation, retry)
            }
            Err(error) => {
                tracing::warn!("access token refresh failed: {error}");
                if generation != self.generation {
                    return Ok(SubmitOutcome::Ignored);
                }
                self.loading = false;
                self.push_notice(Notice::Error(SESSION_EXPIRED_NOTICE.to_string()));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    async fn perform(
        &self,
        target: Option<u64>,
        access_token: &str,
        submission: &GifSubmission,
    ) -> GifApiResult<GifRecord> {
        match target {
            None => self.gifs.create(access_token, submission).await,
            Some(gif_id) => self.gifs.update(access_token, gif_id, submission).await,
        }
    }

    /// Apply a gif request completion, unless the form moved on since the
    /// request was issued.
    fn apply_gif_completion(
        &mut self,
        generation: u64,
        result: GifApiResult<GifRecord>,
    ) -> AuthResult<SubmitOutcome> {
        if generation != self.generation {
            tracing::debug!("discarding gif completion for a stale form generation");
            return Ok(SubmitOutcome::Ignored);
        }

        self.loading = false;
        match result {
            Ok(record) => {
                self.close();
                self.push_notice(Notice::Info(GIF_SUCCESS_NOTICE.to_string()));
                self.gallery_tags = record.tags;
                Ok(SubmitOutcome::Completed)
            }
            Err(GifApiError::Rejected(errors)) => {
                self.errors.name = errors.name;
                self.errors.file = errors.file;
                self.errors.tags = errors.tags;
                Ok(SubmitOutcome::Failed)
            }
            Err(error) => {
                self.push_notice(Notice::Error(error.to_string()));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    /// Persist a refreshed access token alongside the existing refresh
    /// token. Applied regardless of form generation: the credentials are
    /// session-scoped, not form-scoped.
    fn store_refreshed_access(&mut self, access_token: &str) -> AuthResult<()> {
        if let Some(session) = &mut self.session {
            session.access_token = access_token.to_string();
            self.sessions.save_session(session)?;
        }
        Ok(())
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }
}
