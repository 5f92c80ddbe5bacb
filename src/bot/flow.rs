//! Conversation flow for the two-point weather comparison
//!
//! The transition function is pure: it maps the current session and an
//! incoming event to the next session plus a list of effects. The dispatcher
//! in the parent module interprets the effects, so every transition here is
//! testable without a transport or a live provider.

use std::fmt::Write;

use crate::models::{Coordinate, ForecastWindow};
use crate::series::ForecastSeries;

/// Callback payloads carried by the two window-choice buttons
pub const CALLBACK_THREE_DAYS: &str = "days:3";
pub const CALLBACK_FIVE_DAYS: &str = "days:5";

pub const GREETING: &str = "Hi! I am a route weather bot: I compare the forecast at the start \
and end points of your route. Use /help for the list of commands.";

pub const HELP: &str = "Available commands:\n\
/start - Greeting and what this bot does\n\
/help - This list of commands\n\
/weather - Compare the forecast along a route";

pub const CHOOSE_WINDOW: &str = "Enter the start and end points of your route as lat,lon \
(for example 55.7558,37.6173) and pick a forecast window.";

pub const ASK_END_POINT: &str = "Start point accepted. Now send the end point of your route (lat,lon).";

pub const BAD_COORDINATES: &str = "Wrong format! Please send coordinates as lat,lon \
(for example 55.7558,37.6173).";

pub const UNEXPECTED_ERROR: &str = "Something unexpected went wrong. Please start over with /weather.";

/// Stages of the comparison flow; Idle is the absence of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingWindowChoice,
    AwaitingStartPoint,
    AwaitingEndPoint,
}

/// Per-chat state collected across messages
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub stage: Stage,
    pub window: Option<ForecastWindow>,
    pub start: Option<Coordinate>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: Stage::AwaitingWindowChoice,
            window: None,
            start: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbound chat events after transport decoding
#[derive(Debug, Clone)]
pub enum Event {
    /// /start command
    Start,
    /// /help command
    Help,
    /// /weather command, begins the flow
    Weather,
    /// One of the two window-choice buttons
    WindowChosen(ForecastWindow),
    /// Free text, meaningful only while a coordinate is awaited
    Text(String),
}

/// Side effects the dispatcher must carry out, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a plain text reply
    Reply(String),
    /// Send a prompt with the two inline window-choice buttons
    OfferWindowChoices(String),
    /// Fetch both route points and send the comparison report
    Report {
        window: ForecastWindow,
        start: Coordinate,
        end: Coordinate,
    },
}

/// Result of one transition step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Session to persist; `None` clears the entry, returning the chat to Idle
    pub next: Option<Session>,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(session: Option<Session>) -> Self {
        Self {
            next: session,
            effects: Vec::new(),
        }
    }

    fn with_effects(session: Option<Session>, effects: Vec<Effect>) -> Self {
        Self {
            next: session,
            effects,
        }
    }
}

/// Advance one chat's conversation by a single event
///
/// Commands are handled in any stage. Inputs that do not fit the current
/// stage are ignored, except that an unparsable coordinate re-prompts
/// without losing progress. Entering the report clears the session
/// unconditionally, so the next flow starts clean even if the report fails.
pub fn transition(session: Option<Session>, event: &Event) -> Transition {
    match event {
        Event::Start => Transition::with_effects(session, vec![Effect::Reply(GREETING.to_string())]),
        Event::Help => Transition::with_effects(session, vec![Effect::Reply(HELP.to_string())]),
        Event::Weather => Transition::with_effects(
            Some(Session::new()),
            vec![Effect::OfferWindowChoices(CHOOSE_WINDOW.to_string())],
        ),
        Event::WindowChosen(window) => window_chosen(session, *window),
        Event::Text(text) => text_received(session, text),
    }
}

fn window_chosen(session: Option<Session>, window: ForecastWindow) -> Transition {
    match session {
        Some(current) if current.stage == Stage::AwaitingWindowChoice => {
            let next = Session {
                stage: Stage::AwaitingStartPoint,
                window: Some(window),
                start: None,
            };
            let prompt = format!(
                "You chose a {}-day forecast. Send the start point of your route (lat,lon).",
                window.days()
            );
            Transition::with_effects(Some(next), vec![Effect::Reply(prompt)])
        }
        // A choice outside its stage is ignored, like any other stray input
        other => Transition::stay(other),
    }
}

fn text_received(session: Option<Session>, text: &str) -> Transition {
    let Some(current) = session else {
        // Idle chats ignore free text
        return Transition::stay(None);
    };

    match current.stage {
        Stage::AwaitingWindowChoice => Transition::stay(Some(current)),
        Stage::AwaitingStartPoint => match Coordinate::parse(text) {
            Ok(start) => {
                let next = Session {
                    stage: Stage::AwaitingEndPoint,
                    window: current.window,
                    start: Some(start),
                };
                Transition::with_effects(
                    Some(next),
                    vec![Effect::Reply(ASK_END_POINT.to_string())],
                )
            }
            Err(_) => Transition::with_effects(
                Some(current),
                vec![Effect::Reply(BAD_COORDINATES.to_string())],
            ),
        },
        Stage::AwaitingEndPoint => match Coordinate::parse(text) {
            Ok(end) => match (current.window, current.start) {
                (Some(window), Some(start)) => Transition::with_effects(
                    None,
                    vec![Effect::Report { window, start, end }],
                ),
                // A session in this stage without both fields is corrupt;
                // treat it as a fatal input error and start over
                _ => Transition::with_effects(
                    None,
                    vec![Effect::Reply(UNEXPECTED_ERROR.to_string())],
                ),
            },
            Err(_) => Transition::with_effects(
                Some(current),
                vec![Effect::Reply(BAD_COORDINATES.to_string())],
            ),
        },
    }
}

/// Render the two-point comparison report from prepared series
#[must_use]
pub fn render_report(start: &ForecastSeries, end: &ForecastSeries) -> String {
    let mut report = String::from("Point 1:\n");
    push_point(&mut report, start);
    report.push_str("--------------------\n\nPoint 2:\n");
    push_point(&mut report, end);
    report
}

fn push_point(report: &mut String, series: &ForecastSeries) {
    for day in 0..series.len() {
        let _ = writeln!(
            report,
            "Date: {}\nMin temperature (°C): {}\nMax temperature (°C): {}\nHumidity (%): {}\nWind speed (km/h): {}\nPrecipitation probability (%): {}\n",
            series.dates[day],
            series.min_temps[day],
            series.max_temps[day],
            series.humidity[day],
            series.wind_speed[day],
            series.precipitation[day],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(stage: Stage) -> Session {
        Session {
            stage,
            window: Some(ForecastWindow::Three),
            start: match stage {
                Stage::AwaitingEndPoint => Some(Coordinate::parse("55.7558,37.6173").unwrap()),
                _ => None,
            },
        }
    }

    #[test]
    fn test_weather_command_starts_flow() {
        let step = transition(None, &Event::Weather);

        let session = step.next.expect("flow should create a session");
        assert_eq!(session.stage, Stage::AwaitingWindowChoice);
        assert_eq!(
            step.effects,
            vec![Effect::OfferWindowChoices(CHOOSE_WINDOW.to_string())]
        );
    }

    #[test]
    fn test_window_choice_advances_and_persists_days() {
        let step = transition(
            Some(Session::new()),
            &Event::WindowChosen(ForecastWindow::Five),
        );

        let session = step.next.expect("session should survive");
        assert_eq!(session.stage, Stage::AwaitingStartPoint);
        assert_eq!(session.window, Some(ForecastWindow::Five));
        assert!(matches!(&step.effects[..], [Effect::Reply(text)] if text.contains("5-day")));
    }

    #[test]
    fn test_window_choice_outside_its_stage_is_ignored() {
        let before = session_at(Stage::AwaitingStartPoint);
        let step = transition(Some(before.clone()), &Event::WindowChosen(ForecastWindow::Five));

        assert_eq!(step.next, Some(before));
        assert!(step.effects.is_empty());
    }

    #[test]
    fn test_free_text_in_window_stage_is_ignored() {
        let before = session_at(Stage::AwaitingWindowChoice);
        let step = transition(Some(before.clone()), &Event::Text("4 days please".to_string()));

        assert_eq!(step.next, Some(before));
        assert!(step.effects.is_empty());
    }

    #[test]
    fn test_valid_start_point_advances() {
        let step = transition(
            Some(session_at(Stage::AwaitingStartPoint)),
            &Event::Text("55.7558,37.6173".to_string()),
        );

        let session = step.next.expect("session should survive");
        assert_eq!(session.stage, Stage::AwaitingEndPoint);
        assert_eq!(
            session.start,
            Some(Coordinate::parse("55.7558,37.6173").unwrap())
        );
        assert_eq!(step.effects, vec![Effect::Reply(ASK_END_POINT.to_string())]);
    }

    #[test]
    fn test_bad_start_point_reprompts_without_advancing() {
        let before = session_at(Stage::AwaitingStartPoint);
        let step = transition(Some(before.clone()), &Event::Text("not a point".to_string()));

        assert_eq!(step.next, Some(before));
        assert_eq!(step.effects, vec![Effect::Reply(BAD_COORDINATES.to_string())]);
    }

    #[test]
    fn test_valid_end_point_reports_and_clears_session() {
        let step = transition(
            Some(session_at(Stage::AwaitingEndPoint)),
            &Event::Text("60.0,30.0".to_string()),
        );

        assert_eq!(step.next, None);
        match &step.effects[..] {
            [Effect::Report { window, start, end }] => {
                assert_eq!(*window, ForecastWindow::Three);
                assert_eq!(start.to_query(), "55.7558,37.6173");
                assert_eq!(end.to_query(), "60.0,30.0");
            }
            other => panic!("expected a report effect, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_end_point_keeps_collected_state() {
        let before = session_at(Stage::AwaitingEndPoint);
        let step = transition(Some(before.clone()), &Event::Text("60,0;30,0".to_string()));

        assert_eq!(step.next, Some(before));
        assert_eq!(step.effects, vec![Effect::Reply(BAD_COORDINATES.to_string())]);
    }

    #[test]
    fn test_commands_work_in_any_stage() {
        let step = transition(Some(session_at(Stage::AwaitingEndPoint)), &Event::Help);
        assert_eq!(step.effects, vec![Effect::Reply(HELP.to_string())]);
        assert!(step.next.is_some());

        let step = transition(None, &Event::Start);
        assert_eq!(step.effects, vec![Effect::Reply(GREETING.to_string())]);
        assert_eq!(step.next, None);
    }

    #[test]
    fn test_weather_command_restarts_a_stalled_flow() {
        let step = transition(Some(session_at(Stage::AwaitingEndPoint)), &Event::Weather);

        let session = step.next.expect("flow should reset the session");
        assert_eq!(session.stage, Stage::AwaitingWindowChoice);
        assert_eq!(session.window, None);
        assert_eq!(session.start, None);
    }

    #[test]
    fn test_report_lists_both_points_with_all_fields() {
        let series = ForecastSeries {
            dates: vec!["2024-05-01".to_string(), "2024-05-02".to_string()],
            min_temps: vec![6.0, 7.0],
            max_temps: vec![16.0, 17.0],
            humidity: vec![61, 62],
            wind_speed: vec![11.0, 12.0],
            precipitation: vec![21, 22],
        };

        let report = render_report(&series, &series);

        assert!(report.contains("Point 1:"));
        assert!(report.contains("Point 2:"));
        assert_eq!(report.matches("Date: 2024-05-01").count(), 2);
        assert!(report.contains("Min temperature (°C): 6"));
        assert!(report.contains("Max temperature (°C): 16"));
        assert!(report.contains("Humidity (%): 61"));
        assert!(report.contains("Wind speed (km/h): 11"));
        assert!(report.contains("Precipitation probability (%): 21"));
    }
}
