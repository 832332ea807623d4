use chrono::Utc;

use crate::config::InvitationConfig;
use crate::crypto::{generate_token, hash_token};
use crate::events::{EventDispatcher, InvitationEvent};
use crate::mail::{InvitationMail, Mailer};
use crate::validators::InviteeEmail;
use crate::workspaces::{
    CreateInvitation, UserRepository, WorkspaceInvitation, WorkspaceInvitationRepository,
    WorkspaceRepository, WorkspaceRole,
};
use crate::{SecretString, WorkspaceError};

/// Input data for issuing an invitation.
///
/// The email is normalized (trimmed, lowercased) before validation and storage.
#[derive(Debug, Clone)]
pub struct IssueInvitationInput {
    pub workspace_id: i64,
    pub invited_by: i64,
    pub email: String,
    pub role: WorkspaceRole,
}

/// Output from issuing an invitation.
#[derive(Debug)]
pub struct IssueInvitationOutput {
    pub invitation: WorkspaceInvitation,
    /// The plain token. Only its hash is stored, so this is the one chance to
    /// read it.
    pub token: SecretString,
    /// Acceptance link embedding the plain token.
    pub accept_url: SecretString,
}

/// Issues a workspace invitation and queues the invitation email.
///
/// This action:
/// 1. Loads the workspace and the inviting user
/// 2. Refuses if the email already has a pending invitation to the workspace
/// 3. Stores the invitation under the hash of a fresh random token, retrying
///    with a new token on collision
/// 4. Renders the notification and hands it to the mailer without waiting for
///    delivery
pub struct IssueInvitationAction<W, U, I, ML>
where
    W: WorkspaceRepository,
    U: UserRepository,
    I: WorkspaceInvitationRepository,
    ML: Mailer,
{
    workspace_repo: W,
    user_repo: U,
    invitation_repo: I,
    mailer: ML,
    config: InvitationConfig,
    renderer: InvitationMail,
    events: EventDispatcher,
}

impl<W, U, I, ML> IssueInvitationAction<W, U, I, ML>
where
    W: WorkspaceRepository,
    U: UserRepository,
    I: WorkspaceInvitationRepository,
    ML: Mailer,
{
    /// Creates the action with default configuration.
    pub fn new(workspace_repo: W, user_repo: U, invitation_repo: I, mailer: ML) -> Self {
        Self::with_config(
            workspace_repo,
            user_repo,
            invitation_repo,
            mailer,
            InvitationConfig::default(),
        )
    }

    pub fn with_config(
        workspace_repo: W,
        user_repo: U,
        invitation_repo: I,
        mailer: ML,
        config: InvitationConfig,
    ) -> Self {
        Self {
            workspace_repo,
            user_repo,
            invitation_repo,
            mailer,
            config,
            renderer: InvitationMail::default(),
            events: EventDispatcher::default(),
        }
    }

    /// Sets the email renderer (sender identity).
    #[must_use]
    pub fn renderer(mut self, renderer: InvitationMail) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Issues the invitation.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - invitation stored and notification queued
    /// - `Err(WorkspaceError::InvalidEmail)` - malformed email
    /// - `Err(WorkspaceError::NotFound)` - workspace does not exist
    /// - `Err(WorkspaceError::UserNotFound)` - inviter does not exist
    /// - `Err(WorkspaceError::AlreadyInvited)` - a pending invitation exists
    /// - `Err(WorkspaceError::DuplicateToken)` - every generated token collided
    /// - `Err(_)` - database errors
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "issue_invitation", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: IssueInvitationInput,
    ) -> Result<IssueInvitationOutput, WorkspaceError> {
        let email = InviteeEmail::parse(&input.email)?.into_inner();

        let workspace = self
            .workspace_repo
            .find_by_id(input.workspace_id)
            .await?
            .ok_or(WorkspaceError::NotFound)?;

        let inviter = self
            .user_repo
            .find_by_id(input.invited_by)
            .await?
            .ok_or(WorkspaceError::UserNotFound)?;

        let now = Utc::now();

        // create() repeats this check atomically for concurrent issues
        if self
            .invitation_repo
            .find_pending_for(workspace.id, &email, now)
            .await?
            .is_some()
        {
            return Err(WorkspaceError::AlreadyInvited);
        }

        let (invitation, token) = self
            .store_with_fresh_token(CreateInvitation {
                workspace_id: workspace.id,
                email,
                role: input.role,
                token_hash: String::new(),
                invited_by: inviter.id,
                expires_at: now + self.config.expiry,
            })
            .await?;

        let accept_url = self.config.accept_url(token.expose_secret());
        let message = self
            .renderer
            .render(&invitation, &workspace, &inviter, &accept_url);

        // the invitation stands even if the mail cannot be queued
        if let Err(e) = self.mailer.queue(message).await {
            log::error!(
                target: "tenancy",
                "msg=\"failed to queue invitation email\", invitation_id={}, error=\"{e}\"",
                invitation.id
            );
        }

        log::info!(
            target: "tenancy",
            "msg=\"invitation issued\", workspace_id={}, invitation_id={}, role={}",
            invitation.workspace_id,
            invitation.id,
            invitation.role
        );

        self.events
            .dispatch(&InvitationEvent::Issued {
                invitation_id: invitation.id,
                workspace_id: invitation.workspace_id,
                email: invitation.email.clone(),
                role: invitation.role,
                invited_by: invitation.invited_by,
                at: invitation.created_at,
            })
            .await;

        Ok(IssueInvitationOutput {
            invitation,
            token,
            accept_url: SecretString::new(accept_url),
        })
    }

    async fn store_with_fresh_token(
        &self,
        mut data: CreateInvitation,
    ) -> Result<(WorkspaceInvitation, SecretString), WorkspaceError> {
        let max_attempts = self.config.max_token_attempts.max(1);
        let mut attempt = 1;

        loop {
            let token = generate_token(self.config.effective_token_length());
            data.token_hash = hash_token(&token);

            match self.invitation_repo.create(data.clone()).await {
                Ok(invitation) => return Ok((invitation, SecretString::new(token))),
                Err(WorkspaceError::DuplicateToken) if attempt < max_attempts => {
                    log::warn!(
                        target: "tenancy",
                        "msg=\"invitation token collision, regenerating\", attempt={attempt}"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
