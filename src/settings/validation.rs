use reqwest::StatusCode;

const OPENAI_VALIDATE_ENDPOINT: &str = "https://api.openai.com/v1/models";

/// Check a key against the model-listing endpoint. The remote API stays the
/// authority; callers log a failure and continue.
pub async fn validate_openai_key(api_key: &str) -> Result<(), String> {
    let trimmed_key = api_key.trim();
    if trimmed_key.is_empty() {
        return Err("OpenAI API key is required.".to_string());
    }

    let client = reqwest::Client::new();
    let response = client
        .get(OPENAI_VALIDATE_ENDPOINT)
        .bearer_auth(trimmed_key)
        .send()
        .await
        .map_err(|err| format!("could not validate OpenAI API key: {err}"))?;

    if response.status().is_success() {
        return Ok(());
    }

    if matches!(
        response.status(),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    ) {
        return Err("Invalid OpenAI API key. Enter a valid key and try again.".to_string());
    }

    Err(format!(
        "OpenAI key validation failed with status {}.",
        response.status()
    ))
}
