use crate::credentials::Credentials;
use crate::error::EvaluationError;
use crate::models::{Conversation, Role};
use async_openai::config::AzureConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)```").expect("fence pattern is valid"));

/// Return the interior of the first ```json fenced block, or the whole reply
/// when there is none
pub fn extract_json_payload(raw: &str) -> &str {
    match JSON_FENCE.captures(raw).and_then(|captures| captures.get(1)) {
        Some(interior) => interior.as_str().trim(),
        None => raw,
    }
}

/// A chat completion backend.
///
/// Implementors only issue the request; fence stripping and logging are
/// shared by [`CompletionClient::complete`]. No implementor retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the conversation once and return the model's raw reply text
    async fn complete_raw(&self, conversation: &Conversation) -> Result<String, EvaluationError>;

    /// Send the conversation and return the JSON payload of the reply
    async fn complete(&self, conversation: &Conversation) -> Result<String, EvaluationError> {
        let raw = match self.complete_raw(conversation).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(error = %err, "completion request failed");
                return Err(err);
            }
        };
        let payload = extract_json_payload(&raw).to_string();
        tracing::debug!(response = %payload, "response from completion service");
        Ok(payload)
    }
}

/// Azure OpenAI chat completions, sampled at temperature 0
pub struct AzureCompletionClient {
    client: Client<AzureConfig>,
    deployment: String,
    timeout: Duration,
}

impl AzureCompletionClient {
    pub fn new(credentials: &Credentials, api_version: &str, timeout: Duration) -> Self {
        let azure_config = AzureConfig::new()
            .with_api_base(&credentials.endpoint)
            .with_api_key(&credentials.api_key)
            .with_deployment_id(&credentials.deployment)
            .with_api_version(api_version);

        Self {
            client: Client::with_config(azure_config),
            deployment: credentials.deployment.clone(),
            timeout,
        }
    }

    /// Build the chat completion request for the whole conversation
    fn build_request(&self, conversation: &Conversation) -> Result<CreateChatCompletionRequest, EvaluationError> {
        let messages = conversation
            .messages()
            .iter()
            .map(|message| to_request_message(message.role, &message.content))
            .collect::<Result<Vec<_>, _>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.deployment)
            .messages(messages)
            .temperature(0.0)
            .build()?;
        Ok(request)
    }

    /// Extract the reply text from the API response
    fn extract_content(response: CreateChatCompletionResponse) -> String {
        match response.choices.first() {
            Some(choice) => match &choice.message.content {
                Some(content) => content.clone(),
                None => String::new(),
            },
            None => String::new(),
        }
    }
}

fn to_request_message(role: Role, content: &str) -> Result<ChatCompletionRequestMessage, EvaluationError> {
    let message: ChatCompletionRequestMessage = match role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.to_string())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content.to_string())
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content.to_string())
            .build()?
            .into(),
    };
    Ok(message)
}

#[async_trait]
impl CompletionClient for AzureCompletionClient {
    async fn complete_raw(&self, conversation: &Conversation) -> Result<String, EvaluationError> {
        let request = self.build_request(conversation)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                EvaluationError::Service(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        Ok(Self::extract_content(response))
    }
}
