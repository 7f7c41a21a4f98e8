//! Render surfaces.
//!
//! A [`Surface`] is the only place where view models become output. User
//! supplied text is escaped here and nowhere else.

use std::io::Write;

use tracing::{debug, warn};

use crate::view::{HealthView, Notice, NoticeId, UsersView};

/// Target the controller renders into.
pub trait Surface: Send {
    /// Replace the users list.
    fn render_users(&mut self, view: &UsersView);

    /// Update the health indicator.
    fn set_health(&mut self, view: &HealthView);

    /// Add a notice to the form section.
    fn show_notice(&mut self, id: NoticeId, notice: &Notice);

    /// Remove a notice; unknown ids are ignored.
    fn dismiss_notice(&mut self, id: NoticeId);
}

/// Escape text for insertion into HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Make text safe to print on a terminal.
///
/// Control characters (ESC, BEL, carriage return, newline...) are written as
/// their Rust escape sequence so server text cannot move the cursor or
/// inject terminal commands.
pub fn escape_terminal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Markup for the users list container.
pub fn users_markup(view: &UsersView) -> String {
    match view {
        UsersView::Empty => format!(
            r#"<p class="loading">{}</p>"#,
            escape_html(crate::view::NO_USERS_PLACEHOLDER)
        ),
        UsersView::Failed => format!(
            r#"<p class="error">{}</p>"#,
            escape_html(crate::view::LOAD_ERROR_PLACEHOLDER)
        ),
        UsersView::Rows(rows) => rows
            .iter()
            .map(|row| {
                format!(
                    concat!(
                        r#"<div class="user-item">"#,
                        r#"<div class="user-info">"#,
                        r#"<div class="user-name">{}</div>"#,
                        r#"<div class="user-email">{}</div>"#,
                        "</div>",
                        r#"<span class="user-id">{}</span>"#,
                        "</div>"
                    ),
                    escape_html(&row.name),
                    escape_html(&row.email),
                    escape_html(&row.badge()),
                )
            })
            .collect(),
    }
}

/// In-memory model of the page: users list, status indicator and notices.
#[derive(Debug, Clone, Default)]
pub struct HtmlSurface {
    users_list: String,
    indicator_class: String,
    status_text: String,
    notices: Vec<(NoticeId, String)>,
}

impl HtmlSurface {
    /// Create a surface with the page's initial markup.
    pub fn new() -> Self {
        Self {
            indicator_class: "status-indicator".to_string(),
            ..Default::default()
        }
    }

    /// Inner HTML of the users list.
    pub fn users_list(&self) -> &str {
        &self.users_list
    }

    /// Class attribute of the status indicator.
    pub fn indicator_class(&self) -> &str {
        &self.indicator_class
    }

    /// Text next to the status indicator.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Number of notices currently shown.
    pub fn notice_count(&self) -> usize {
        self.notices.len()
    }

    /// Markup of the notices, oldest first.
    pub fn notices_markup(&self) -> String {
        self.notices.iter().map(|(_, html)| html.as_str()).collect()
    }

    /// Number of rendered user rows.
    pub fn row_count(&self) -> usize {
        self.users_list.matches(r#"<div class="user-item">"#).count()
    }
}

impl Surface for HtmlSurface {
    fn render_users(&mut self, view: &UsersView) {
        self.users_list = users_markup(view);
    }

    fn set_health(&mut self, view: &HealthView) {
        self.indicator_class = format!("status-indicator {}", view.state);
        self.status_text = view.label.clone();
    }

    fn show_notice(&mut self, id: NoticeId, notice: &Notice) {
        let html = format!(
            r#"<div class="{}">{}</div>"#,
            notice.kind,
            escape_html(&notice.text)
        );
        self.notices.push((id, html));
    }

    fn dismiss_notice(&mut self, id: NoticeId) {
        self.notices.retain(|(shown, _)| *shown != id);
    }
}

/// Text surface writing to a terminal or any other writer.
pub struct ConsoleSurface<W> {
    out: W,
    last_users: Option<UsersView>,
}

impl<W: Write + Send> ConsoleSurface<W> {
    /// Create a surface writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_users: None,
        }
    }

    /// Consume the surface and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write to console");
        }
    }
}

impl<W: Write + Send> Surface for ConsoleSurface<W> {
    fn render_users(&mut self, view: &UsersView) {
        if self.last_users.as_ref() == Some(view) {
            debug!("Users unchanged, skipping redraw");
            return;
        }

        let text = match view {
            UsersView::Rows(rows) => {
                let lines: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        format!(
                            "{:>6}  {} <{}>",
                            row.badge(),
                            escape_terminal(&row.name),
                            escape_terminal(&row.email)
                        )
                    })
                    .collect();
                format!("Users ({}):\n{}", rows.len(), lines.join("\n"))
            }
            UsersView::Empty | UsersView::Failed => {
                view.placeholder().unwrap_or_default().to_string()
            }
        };

        self.emit(&text);
        self.last_users = Some(view.clone());
    }

    fn set_health(&mut self, view: &HealthView) {
        self.emit(&format!("[{}] {}", view.state, escape_terminal(&view.label)));
    }

    fn show_notice(&mut self, _id: NoticeId, notice: &Notice) {
        self.emit(&format!("[{}] {}", notice.kind, escape_terminal(&notice.text)));
    }

    fn dismiss_notice(&mut self, id: NoticeId) {
        debug!(id, "Notice expired");
    }
}
