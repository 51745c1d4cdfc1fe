//! Chat client for the taxdesk backend.
//!
//! `POST {base_url}/api/chat` answers with a server-sent event stream. The
//! client exposes it two ways: [`ChatClient::open_stream`] returns a pull
//! stream of [`StreamEvent`]s, and [`ChatClient::stream_chat`] drives that
//! stream on a background task and pushes every event into
//! [`StreamHandlers`].

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::handle::{AbortHandle, StreamHandle, StreamOutcome};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use taxdesk_core::{ChatRequest, ResponseMode, StreamEvent};
use taxdesk_streaming::{event_stream, EventStream, SseFrameStream, StreamHandlers};
use tracing::{debug, warn};

/// Path of the streaming chat endpoint.
pub const CHAT_PATH: &str = "api/chat";

/// Event stream over a chat response body.
pub type ChatEventStream = EventStream<SseFrameStream<BoxStream<'static, reqwest::Result<Bytes>>>>;

/// HTTP client for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    config: ClientConfig,
}

impl ChatClient {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a chat request and return the decoded event stream.
    ///
    /// A non-success status is returned as [`ClientError::Http`] before any
    /// event is produced.
    pub async fn open_stream(&self, request: &ChatRequest) -> ClientResult<ChatEventStream> {
        let url = self.config.endpoint(CHAT_PATH);
        debug!(
            url = %url,
            mode = %request.response_mode,
            company_id = ?request.company_id,
            "Opening chat stream"
        );

        let mut builder = self
            .client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request);

        if let Some(token) = self.config.access_token.as_deref() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat request rejected");
            return Err(ClientError::http(status.as_u16(), body));
        }

        Ok(event_stream(response.bytes_stream().boxed()))
    }

    /// Ask a question and push the answer into `handlers`.
    ///
    /// Must be called from within a tokio runtime. Exactly one of these holds
    /// once the returned handle's task finishes:
    /// - the server's terminal events were dispatched, followed by a
    ///   synthesized `on_done` if the server never sent one;
    /// - a request or transport failure was reported once through `on_error`;
    /// - the stream was aborted and nothing further was dispatched.
    pub fn stream_chat(
        &self,
        question: &str,
        company_id: Option<i64>,
        mode: ResponseMode,
        handlers: StreamHandlers,
    ) -> StreamHandle {
        self.stream_request(ChatRequest::new(question, company_id, mode), handlers)
    }

    /// Like [`stream_chat`](Self::stream_chat) with a prepared request.
    pub fn stream_request(&self, request: ChatRequest, mut handlers: StreamHandlers) -> StreamHandle {
        let abort = AbortHandle::new();
        let task_abort = abort.clone();
        let client = self.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_abort.token().cancelled() => {
                    debug!("Chat stream aborted");
                    StreamOutcome::Aborted
                }
                outcome = client.drive(&request, &mut handlers, &task_abort) => outcome,
            }
        });

        StreamHandle::new(abort, task)
    }

    async fn drive(
        &self,
        request: &ChatRequest,
        handlers: &mut StreamHandlers,
        abort: &AbortHandle,
    ) -> StreamOutcome {
        let mut stream = match self.open_stream(request).await {
            Ok(stream) => stream,
            Err(e) => return fail(handlers, abort, &e),
        };

        let mut terminal = false;
        let mut server_error = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if abort.run_unless_aborted(|| handlers.dispatch(&event)).is_none() {
                        return StreamOutcome::Aborted;
                    }
                    terminal |= event.is_terminal();
                    if let StreamEvent::Error { message } = &event {
                        server_error = Some(message.clone());
                    }
                }
                Err(e) => return fail(handlers, abort, &ClientError::from(e)),
            }
        }

        let finished = abort.run_unless_aborted(|| {
            if !terminal {
                handlers.dispatch(&StreamEvent::Done);
            }
        });
        if finished.is_none() {
            return StreamOutcome::Aborted;
        }
        debug!(terminal, "Chat stream finished");

        match server_error {
            Some(message) => StreamOutcome::Failed(message),
            None => StreamOutcome::Completed,
        }
    }
}

fn fail(handlers: &mut StreamHandlers, abort: &AbortHandle, error: &ClientError) -> StreamOutcome {
    let message = error.user_message();
    let event = StreamEvent::error(&message);
    match abort.run_unless_aborted(|| handlers.dispatch(&event)) {
        Some(()) => {
            warn!(error = %error, "Chat stream failed");
            StreamOutcome::Failed(message)
        }
        None => StreamOutcome::Aborted,
    }
}
