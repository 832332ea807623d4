use std::fmt::Write;

use super::MailMessage;
use crate::config::MailConfig;
use crate::workspaces::{User, Workspace, WorkspaceInvitation};

const EXPIRY_FORMAT: &str = "%B %-d, %Y at %H:%M UTC";

/// Renders the "you're invited" email.
#[derive(Debug, Clone)]
pub struct InvitationMail {
    from: String,
}

impl Default for InvitationMail {
    fn default() -> Self {
        Self::new(&MailConfig::default())
    }
}

impl InvitationMail {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: format!("{} <{}>", config.from_name, config.from_address),
        }
    }

    pub fn subject(workspace: &Workspace) -> String {
        format!("You're invited to join {}", workspace.name)
    }

    /// Builds the message for `invitation`. `accept_url` already carries the
    /// plain token; it is shown as a link and again as plain text.
    pub fn render(
        &self,
        invitation: &WorkspaceInvitation,
        workspace: &Workspace,
        inviter: &User,
        accept_url: &str,
    ) -> MailMessage {
        let expires = invitation.expires_at.format(EXPIRY_FORMAT).to_string();
        let role = invitation.role.label();
        let description = workspace
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        MailMessage {
            from: self.from.clone(),
            to: invitation.email.clone(),
            subject: Self::subject(workspace),
            html_body: render_html(workspace, inviter, role, description, &expires, accept_url),
            text_body: render_text(workspace, inviter, role, description, &expires, accept_url),
        }
    }
}

fn render_text(
    workspace: &Workspace,
    inviter: &User,
    role: &str,
    description: Option<&str>,
    expires: &str,
    accept_url: &str,
) -> String {
    let mut body = format!(
        "Hello,\n\n{} has invited you to join the workspace \"{}\" as {}.\n",
        inviter.name,
        workspace.name,
        article(role)
    );
    if let Some(description) = description {
        let _ = write!(body, "\nAbout {}:\n{description}\n", workspace.name);
    }
    let _ = write!(
        body,
        "\nAccept the invitation:\n{accept_url}\n\n\
         This invitation expires on {expires}.\n\
         If you were not expecting it, you can ignore this email.\n"
    );
    body
}

fn render_html(
    workspace: &Workspace,
    inviter: &User,
    role: &str,
    description: Option<&str>,
    expires: &str,
    accept_url: &str,
) -> String {
    let name = escape_html(&workspace.name);
    let url = escape_html(accept_url);

    let mut body = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
    let _ = writeln!(body, "<h1>You're invited to join {name}</h1>");
    let _ = writeln!(
        body,
        "<p><strong>{}</strong> has invited you to join <strong>{name}</strong> as {}.</p>",
        escape_html(&inviter.name),
        article(role)
    );
    if let Some(description) = description {
        let _ = writeln!(body, "<blockquote>{}</blockquote>", escape_html(description));
    }
    let _ = writeln!(body, "<p><a href=\"{url}\">Accept invitation</a></p>");
    let _ = writeln!(
        body,
        "<p>If the button does not work, copy this link into your browser:<br>{url}</p>"
    );
    let _ = writeln!(body, "<p>This invitation expires on {expires}.</p>");
    body.push_str("</body>\n</html>\n");
    body
}

fn article(role: &str) -> String {
    match role.chars().next() {
        Some('A' | 'E' | 'I' | 'O' | 'U') => format!("an {role}"),
        _ => format!("a {role}"),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
