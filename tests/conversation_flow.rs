//! End-to-end conversation scenarios
//!
//! The dispatcher runs against a stub forecast provider and a recording
//! transport, so whole flows execute without a network while still crossing
//! the real session store and effect interpreter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use routecast::bot::flow::{ASK_END_POINT, BAD_COORDINATES, Event, UNEXPECTED_ERROR};
use routecast::bot::session::{ChatId, SessionStore};
use routecast::bot::{ChatTransport, ConversationController};
use routecast::error::ForecastError;
use routecast::models::{Coordinate, DailyForecast, ForecastWindow};
use routecast::service::{ForecastProvider, UNAVAILABLE_MESSAGE};

/// What the stub provider should do for every fetch
#[derive(Clone, Copy)]
enum ProviderScript {
    Succeed,
    FailBadRequest,
    FailMalformed,
}

struct StubProvider {
    script: ProviderScript,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new(script: ProviderScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for StubProvider {
    async fn forecast(&self, _point: &Coordinate) -> Result<Vec<DailyForecast>, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            ProviderScript::Succeed => Ok(sample_records()),
            ProviderScript::FailBadRequest => Err(ForecastError::bad_request(UNAVAILABLE_MESSAGE)),
            ProviderScript::FailMalformed => {
                Err(ForecastError::malformed("daily entry 3 missing Date"))
            }
        }
    }
}

fn sample_records() -> Vec<DailyForecast> {
    (1..=5)
        .map(|day| DailyForecast {
            date: format!("2024-05-{day:02}T07:00:00+03:00"),
            min_temperature: 5.0 + f64::from(day),
            max_temperature: 15.0 + f64::from(day),
            humidity: 60,
            wind_speed: 12.0,
            precipitation_probability: 30,
        })
        .collect()
}

/// Records every outbound message instead of talking to a chat service
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ChatId, String)>>,
    choice_prompts: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingTransport {
    async fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }

    async fn choice_prompt_count(&self, chat: ChatId) -> usize {
        self.choice_prompts
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == chat)
            .count()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.sent.lock().await.push((chat, text.to_string()));
        Ok(())
    }

    async fn send_window_choices(&self, chat: ChatId, prompt: &str) -> anyhow::Result<()> {
        self.choice_prompts
            .lock()
            .await
            .push((chat, prompt.to_string()));
        Ok(())
    }
}

fn controller(
    provider: Arc<StubProvider>,
) -> (Arc<ConversationController>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let controller = Arc::new(ConversationController::new(
        provider,
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        SessionStore::new(),
    ));
    (controller, transport)
}

/// Drive one chat through the whole flow up to the end point
async fn run_flow_to_end_point(
    controller: &ConversationController,
    chat: ChatId,
    window: ForecastWindow,
) {
    controller.handle(chat, Event::Weather).await;
    controller.handle(chat, Event::WindowChosen(window)).await;
    controller
        .handle(chat, Event::Text("55.7558,37.6173".to_string()))
        .await;
    controller
        .handle(chat, Event::Text("60.0,30.0".to_string()))
        .await;
}

#[tokio::test]
async fn three_day_flow_produces_two_labeled_sections() {
    let provider = StubProvider::new(ProviderScript::Succeed);
    let (controller, transport) = controller(Arc::clone(&provider));

    run_flow_to_end_point(&controller, 1, ForecastWindow::Three).await;

    assert_eq!(transport.choice_prompt_count(1).await, 1);
    let texts = transport.texts_for(1).await;
    let report = texts.last().expect("a report should have been sent");

    assert!(report.contains("Point 1:"));
    assert!(report.contains("Point 2:"));
    assert_eq!(report.matches("Date: ").count(), 6, "3 dated entries per point");
    assert_eq!(report.matches("Min temperature (°C):").count(), 6);
    assert_eq!(report.matches("Max temperature (°C):").count(), 6);
    assert_eq!(report.matches("Humidity (%):").count(), 6);
    assert_eq!(report.matches("Wind speed (km/h):").count(), 6);
    assert_eq!(report.matches("Precipitation probability (%):").count(), 6);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn five_day_flow_reports_five_entries_per_point() {
    let provider = StubProvider::new(ProviderScript::Succeed);
    let (controller, transport) = controller(provider);

    run_flow_to_end_point(&controller, 9, ForecastWindow::Five).await;

    let texts = transport.texts_for(9).await;
    let report = texts.last().expect("a report should have been sent");
    assert_eq!(report.matches("Date: ").count(), 10);
}

#[tokio::test]
async fn bad_request_sends_fixed_message_and_skips_second_fetch() {
    let provider = StubProvider::new(ProviderScript::FailBadRequest);
    let (controller, transport) = controller(Arc::clone(&provider));

    run_flow_to_end_point(&controller, 2, ForecastWindow::Three).await;

    let texts = transport.texts_for(2).await;
    assert_eq!(texts.last().map(String::as_str), Some(UNAVAILABLE_MESSAGE));
    // The start-point failure suppressed the end-point fetch
    assert_eq!(provider.calls(), 1);

    // The session was cleared: a fresh /weather starts the flow from scratch
    controller.handle(2, Event::Weather).await;
    assert_eq!(transport.choice_prompt_count(2).await, 2);
}

#[tokio::test]
async fn unexpected_failure_sends_fallback_without_crashing() {
    let provider = StubProvider::new(ProviderScript::FailMalformed);
    let (controller, transport) = controller(provider);

    run_flow_to_end_point(&controller, 3, ForecastWindow::Three).await;

    let texts = transport.texts_for(3).await;
    assert_eq!(texts.last().map(String::as_str), Some(UNEXPECTED_ERROR));

    // The dispatcher is still alive and serving this chat
    controller.handle(3, Event::Help).await;
    assert!(transport.texts_for(3).await.len() > texts.len());
}

#[tokio::test]
async fn invalid_coordinate_reprompts_and_keeps_progress() {
    let provider = StubProvider::new(ProviderScript::Succeed);
    let (controller, transport) = controller(provider);

    controller.handle(4, Event::Weather).await;
    controller
        .handle(4, Event::WindowChosen(ForecastWindow::Three))
        .await;
    controller.handle(4, Event::Text("near the lake".to_string())).await;

    let texts = transport.texts_for(4).await;
    assert_eq!(texts.last().map(String::as_str), Some(BAD_COORDINATES));

    // The flow resumes where it left off: a valid start point still advances
    controller
        .handle(4, Event::Text("55.7558,37.6173".to_string()))
        .await;
    let texts = transport.texts_for(4).await;
    assert_eq!(texts.last().map(String::as_str), Some(ASK_END_POINT));
}

#[tokio::test]
async fn concurrent_users_keep_independent_sessions() {
    let provider = StubProvider::new(ProviderScript::Succeed);
    let (controller, transport) = controller(provider);

    // Interleave two users: A picks 3 days, B picks 5 days
    controller.handle(100, Event::Weather).await;
    controller.handle(200, Event::Weather).await;
    controller
        .handle(100, Event::WindowChosen(ForecastWindow::Three))
        .await;
    controller
        .handle(200, Event::WindowChosen(ForecastWindow::Five))
        .await;
    controller
        .handle(100, Event::Text("55.7558,37.6173".to_string()))
        .await;
    controller
        .handle(200, Event::Text("48.8566,2.3522".to_string()))
        .await;

    // Both finish concurrently
    let finish_a = controller.handle(100, Event::Text("60.0,30.0".to_string()));
    let finish_b = controller.handle(200, Event::Text("41.9028,12.4964".to_string()));
    tokio::join!(finish_a, finish_b);

    let report_a = transport.texts_for(100).await.pop().expect("report for A");
    let report_b = transport.texts_for(200).await.pop().expect("report for B");

    // Each user's report reflects their own window choice
    assert_eq!(report_a.matches("Date: ").count(), 6);
    assert_eq!(report_b.matches("Date: ").count(), 10);

    // Neither user saw the other's prompts
    assert_eq!(transport.choice_prompt_count(100).await, 1);
    assert_eq!(transport.choice_prompt_count(200).await, 1);
}
