use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::{debug, info};

use slw_config::{CommitConfig, SessionConfig, TargetConfig, WatchConfig};
use slw_core::{CandidateDate, SlotListing};

use crate::error::{AuthError, CommitError, FetchError, NavigationError, OpenError};
use crate::feed;
use crate::session::{AppointmentSession, CommitReceipt, ScheduleRef, SessionFactory};

/// Builds [`HttpSession`]s from the config's target, session, and commit
/// sections. Each `open` call produces a session with a fresh connection pool.
pub struct HttpSessionFactory {
    target: TargetConfig,
    session: SessionConfig,
    commit: CommitConfig,
}

impl HttpSessionFactory {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            target: config.target.clone(),
            session: config.session.clone(),
            commit: config.commit.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn AppointmentSession>, OpenError> {
        if self.target.base_url.is_empty() {
            return Err(OpenError::Config("target.base_url is empty".to_string()));
        }
        if self.session.cookies.is_empty() {
            return Err(OpenError::Config(
                "session.cookies is empty; export them from a signed-in browser".to_string(),
            ));
        }
        let headers = build_headers(&self.session)?;
        let client = reqwest::Client::builder()
            .timeout(self.session.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        debug!(base_url = %self.target.base_url, "opened http session");
        Ok(Box::new(HttpSession {
            client,
            headers,
            target: self.target.clone(),
            session: self.session.clone(),
            commit: self.commit.clone(),
        }))
    }
}

/// Drives the scheduling service over plain HTTP using an identity exported
/// from a signed-in browser. One client per session; headers are attached to
/// every request so the remote sees a consistent caller.
pub struct HttpSession {
    client: reqwest::Client,
    headers: HeaderMap,
    target: TargetConfig,
    session: SessionConfig,
    commit: CommitConfig,
}

#[async_trait]
impl AppointmentSession for HttpSession {
    async fn login(&self) -> Result<(), AuthError> {
        let url = format!("{}{}", self.target.base_url, self.session.account_path);
        debug!(url = %url, "probing account page");
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status().as_u16();
        let final_path = response.url().path().to_string();
        classify_login(status, &final_path)?;
        info!("session accepted by the remote");
        Ok(())
    }

    async fn open_schedule_page(&self) -> Result<ScheduleRef, NavigationError> {
        if let Some(id) = &self.target.schedule_id {
            debug!(schedule = %id, "using configured schedule id");
            return Ok(ScheduleRef::new(id.clone()));
        }
        let url = format!("{}{}", self.target.base_url, self.session.account_path);
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::Status {
                status: status.as_u16(),
            });
        }
        let final_url = response.url().to_string();
        let body = response.text().await?;
        let id = extract_schedule_id(&final_url)
            .or_else(|| extract_schedule_id(&body))
            .ok_or(NavigationError::ScheduleIdNotFound)?;
        info!(schedule = %id, "resolved schedule id from account page");
        Ok(ScheduleRef::new(id))
    }

    async fn fetch_listings(
        &self,
        schedule: &ScheduleRef,
    ) -> Result<Vec<SlotListing>, FetchError> {
        let url = format!(
            "{}{}",
            self.target.schedule_url(&schedule.id),
            self.target.feed_suffix
        );
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        feed::parse_days_feed(&body)
    }

    async fn commit(
        &self,
        schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<CommitReceipt, CommitError> {
        let url = format!(
            "{}{}",
            self.target.schedule_url(&schedule.id),
            self.commit.path
        );
        let form = render_commit_form(&self.commit.form, slot);
        if self.commit.dry_run {
            info!(url = %url, date = %slot.date, "dry run, skipping commit POST");
            return Ok(CommitReceipt {
                message: format!("dry run: would book {slot}"),
                dry_run: true,
            });
        }
        debug!(url = %url, date = %slot.date, "posting commit");
        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CommitError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        match confirmation_line(&body, &self.commit.success_marker) {
            Some(line) => {
                info!(confirmation = %line, "commit confirmed by the remote");
                Ok(CommitReceipt {
                    message: line.to_string(),
                    dry_run: false,
                })
            }
            None => Err(CommitError::Unconfirmed {
                marker: self.commit.success_marker.clone(),
            }),
        }
    }

    async fn close(&self) {
        // Dropping the client tears down the connection pool.
        debug!("closing http session");
    }
}

/// Assemble the cookie header the way a browser would send it, sorted by
/// name so the output is stable.
fn cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut names: Vec<&String> = cookies.keys().collect();
    names.sort();
    names
        .iter()
        .map(|name| format!("{}={};", name, cookies[name.as_str()]))
        .collect()
}

fn build_headers(session: &SessionConfig) -> Result<HeaderMap, OpenError> {
    let mut headers = HeaderMap::new();
    let cookie = HeaderValue::from_str(&cookie_header(&session.cookies))
        .map_err(|_| OpenError::Config("session.cookies contain invalid characters".to_string()))?;
    headers.insert(COOKIE, cookie);
    let user_agent = HeaderValue::from_str(&session.user_agent)
        .map_err(|_| OpenError::Config("session.user_agent is not a valid header".to_string()))?;
    headers.insert(USER_AGENT, user_agent);
    for (name, value) in &session.extra_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| OpenError::Config(format!("invalid header name '{name}'")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| OpenError::Config(format!("invalid value for header '{name}'")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// A session is stale when the service bounces the probe to its sign-in
/// page; everything else rides on the status code.
fn classify_login(status: u16, final_path: &str) -> Result<(), AuthError> {
    if final_path.contains("sign_in") {
        return Err(AuthError::RedirectedToSignIn);
    }
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AuthError::SessionRejected { status })
    }
}

fn schedule_id_regex() -> &'static Regex {
    static SCHEDULE_ID_RE: OnceLock<Regex> = OnceLock::new();
    SCHEDULE_ID_RE
        .get_or_init(|| Regex::new(r"/schedule/(\d+)").expect("schedule id regex is valid"))
}

/// Pull the first `/schedule/<digits>` id out of a URL or page body.
fn extract_schedule_id(text: &str) -> Option<String> {
    schedule_id_regex()
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Expand the configured form template for a concrete slot. Sorted by field
/// name so the posted body is stable.
fn render_commit_form(
    template: &HashMap<String, String>,
    slot: &CandidateDate,
) -> Vec<(String, String)> {
    let date = slot.date.format("%Y-%m-%d").to_string();
    let location = slot.location.clone().unwrap_or_default();
    let mut form: Vec<(String, String)> = template
        .iter()
        .map(|(field, value)| {
            (
                field.clone(),
                value.replace("{date}", &date).replace("{location}", &location),
            )
        })
        .collect();
    form.sort();
    form
}

/// First body line carrying the confirmation marker, trimmed.
fn confirmation_line<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    body.lines()
        .map(str::trim)
        .find(|line| line.contains(marker))
}
