//! HTTP client for the levelupd API
//!
//! Thin reqwest wrapper: every call either returns the typed response body
//! or one error carrying the server's code and message. No retries; a
//! failed action is reported once and the user re-runs it.

use anyhow::{anyhow, bail, Result};
use levelup_common::api::{
    AdminUserRow, ApiError, CompletionToggleRequest, CompletionToggleResponse,
    CreateHabitRequest, OnboardingHabit, OnboardingRequest, ProfileView, SignupRequest,
    SignupResponse, SkillsResponse, WhoamiResponse,
};
use levelup_common::types::{Attribute, CompletionRecord, Difficulty, Habit};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:7870";

pub struct ApiClient {
    base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build from flags falling back to $LEVELUP_URL / $LEVELUP_TOKEN.
    pub fn from_env(server: Option<String>, token: Option<String>) -> Self {
        let base = server
            .or_else(|| std::env::var("LEVELUP_URL").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let token = token.or_else(|| std::env::var("LEVELUP_TOKEN").ok());
        Self {
            base: base.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self.token.as_deref().ok_or_else(|| {
            anyhow!("No session token. Run `levelupctl signup <email>` and export LEVELUP_TOKEN")
        })?;
        Ok(req.bearer_auth(token))
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        // Error bodies carry a stable code; surface it verbatim, once.
        match response.json::<ApiError>().await {
            Ok(err) if err.code == "onboarding_required" => {
                bail!("No profile yet. Run `levelupctl onboard <name>` first")
            }
            Ok(err) => bail!("{} ({})", err.message, err.code),
            Err(_) => bail!("Server returned {}", status),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.authed(self.http.get(format!("{}{}", self.base, path)))?;
        Self::read(req.send().await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let req = self.authed(self.http.post(format!("{}{}", self.base, path)))?;
        Self::read(req.json(body).send().await?).await
    }

    pub async fn signup(&self, email: &str) -> Result<SignupResponse> {
        // The one unauthenticated call
        let response = self
            .http
            .post(format!("{}/v1/auth/signup", self.base))
            .json(&SignupRequest {
                email: email.to_string(),
            })
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn whoami(&self) -> Result<WhoamiResponse> {
        self.get("/v1/auth/whoami").await
    }

    pub async fn onboard(
        &self,
        full_name: &str,
        habits: Vec<OnboardingHabit>,
    ) -> Result<ProfileView> {
        self.post(
            "/v1/onboarding",
            &OnboardingRequest {
                full_name: full_name.to_string(),
                habits,
            },
        )
        .await
    }

    pub async fn profile(&self) -> Result<ProfileView> {
        self.get("/v1/profile").await
    }

    pub async fn habits(&self) -> Result<Vec<Habit>> {
        self.get("/v1/habits").await
    }

    pub async fn create_habit(
        &self,
        name: &str,
        attribute: Attribute,
        difficulty: Difficulty,
    ) -> Result<Habit> {
        self.post(
            "/v1/habits",
            &CreateHabitRequest {
                name: name.to_string(),
                attribute,
                difficulty,
            },
        )
        .await
    }

    pub async fn deactivate_habit(&self, habit_id: Uuid) -> Result<serde_json::Value> {
        self.post(
            &format!("/v1/habits/{}/deactivate", habit_id),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn today_completions(&self) -> Result<Vec<CompletionRecord>> {
        self.get("/v1/completions/today").await
    }

    pub async fn toggle(&self, habit_id: Uuid) -> Result<CompletionToggleResponse> {
        self.post(
            "/v1/completions/toggle",
            &CompletionToggleRequest {
                habit_id,
                date: None,
            },
        )
        .await
    }

    pub async fn skills(&self) -> Result<SkillsResponse> {
        self.get("/v1/skills").await
    }

    pub async fn admin_users(&self) -> Result<Vec<AdminUserRow>> {
        self.get("/v1/admin/users").await
    }

    pub async fn admin_delete(&self, user_id: Uuid) -> Result<serde_json::Value> {
        self.post(
            &format!("/v1/admin/users/{}/delete", user_id),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn admin_reset(&self, user_id: Uuid) -> Result<serde_json::Value> {
        self.post(
            &format!("/v1/admin/users/{}/reset", user_id),
            &serde_json::json!({}),
        )
        .await
    }

    /// Resolve a user-supplied habit reference (exact name, case-insensitive
    /// name, or id prefix) against the active habit list.
    pub async fn resolve_habit(&self, reference: &str) -> Result<Habit> {
        let habits = self.habits().await?;
        let lowered = reference.to_lowercase();
        let mut matches: Vec<&Habit> = habits
            .iter()
            .filter(|h| {
                h.name.to_lowercase() == lowered || h.id.to_string().starts_with(&lowered)
            })
            .collect();
        if matches.is_empty() {
            // Fall back to substring match on the name
            matches = habits
                .iter()
                .filter(|h| h.name.to_lowercase().contains(&lowered))
                .collect();
        }
        match matches.as_slice() {
            [habit] => Ok((*habit).clone()),
            [] => bail!("No habit matches '{}'", reference),
            many => bail!(
                "'{}' is ambiguous: {}",
                reference,
                many.iter()
                    .map(|h| h.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Parse "name:attribute:difficulty" (name may itself contain colons).
pub fn parse_onboarding_habit(spec: &str) -> Result<OnboardingHabit> {
    let mut parts = spec.rsplitn(3, ':');
    let difficulty = parts.next().unwrap_or_default().trim();
    let attribute = parts.next().unwrap_or_default().trim();
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() || attribute.is_empty() || difficulty.is_empty() {
        bail!("Habit spec must be name:attribute:difficulty, got '{}'", spec);
    }
    Ok(OnboardingHabit {
        name: name.to_string(),
        attribute: parse_attribute(attribute)?,
        difficulty: parse_difficulty(difficulty)?,
    })
}

pub fn parse_attribute(s: &str) -> Result<Attribute> {
    Attribute::parse(&s.to_lowercase())
        .ok_or_else(|| anyhow!("Unknown attribute '{}' (brain, health, skill, discipline, focus)", s))
}

pub fn parse_difficulty(s: &str) -> Result<Difficulty> {
    Difficulty::parse(&s.to_lowercase())
        .ok_or_else(|| anyhow!("Unknown difficulty '{}' (trivial, easy, medium, hard)", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_onboarding_habit() {
        let habit = parse_onboarding_habit("Read 30 minutes:brain:easy").unwrap();
        assert_eq!(habit.name, "Read 30 minutes");
        assert_eq!(habit.attribute, Attribute::Brain);
        assert_eq!(habit.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_parse_habit_name_may_contain_colons() {
        let habit = parse_onboarding_habit("Duolingo: Spanish:brain:trivial").unwrap();
        assert_eq!(habit.name, "Duolingo: Spanish");
    }

    #[test]
    fn test_parse_habit_rejects_bad_specs() {
        assert!(parse_onboarding_habit("just a name").is_err());
        assert!(parse_onboarding_habit("name:brain:legendary").is_err());
        assert!(parse_onboarding_habit("name:charisma:easy").is_err());
    }

    #[test]
    fn test_parse_enums_are_case_insensitive() {
        assert_eq!(parse_attribute("Brain").unwrap(), Attribute::Brain);
        assert_eq!(parse_difficulty("HARD").unwrap(), Difficulty::Hard);
    }
}
