//! sora-battery GUI: iced-based battery indicator window.
//!
//! Stands in for a tray icon: shows the battery glyph and tooltip text, and
//! offers Refresh and Quit actions.

use iced::alignment::Vertical;
use iced::widget::{button, column, container, row, text, Space};
use iced::{Background, Border, Color, Element, Length, Subscription, Task as IcedTask, Theme};
use std::sync::Arc;
use std::time::Instant;

use sora_battery_core::battery::BatteryStatus;
use sora_battery_core::config::Settings;
use sora_battery_core::device::DeviceIdentity;
use sora_battery_core::poller::{self, Monitor, PollerConfig};
use sora_battery_core::presentation::{BatteryGlyph, DisplayState, Presentation, Rgba};
use sora_battery_core::profile::DeviceProfile;
use sora_battery_core::transport::HidapiBackend;

/// Glyph canvas size and outline thickness, in logical pixels.
const GLYPH_WIDTH: u32 = 28;
const GLYPH_HEIGHT: u32 = 56;
const GLYPH_OUTLINE: u32 = 2;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (settings, status) = match Settings::load_or_default(None) {
        Ok(settings) => (settings, "Waiting for first reading...".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Invalid settings, using built-in defaults");
            (Settings::default(), format!("Settings error: {e}"))
        }
    };

    let identity = settings.identity().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid device identity, using built-in Sora V2");
        DeviceIdentity::sora_v2()
    });
    let monitor = Arc::new(Monitor::new(HidapiBackend, identity, DeviceProfile::SORA_V2));
    let config = settings.poller_config();

    iced::application(App::title, App::update, App::view)
        .theme(|_| Theme::Dark)
        .subscription(App::subscription)
        .window_size((360.0, 150.0))
        .run_with(move || App::new(monitor, config, status))
}

/// Application state.
struct App {
    monitor: Arc<Monitor<HidapiBackend>>,
    config: PollerConfig,
    presentation: Presentation,
    status: String,
    last_poll: Option<Instant>,
    in_flight: bool,
}

#[derive(Debug, Clone)]
enum Message {
    PollTick,
    Refresh,
    Polled(Presentation),
    Quit,
}

impl App {
    fn new(
        monitor: Arc<Monitor<HidapiBackend>>,
        config: PollerConfig,
        status: String,
    ) -> (Self, IcedTask<Message>) {
        let presentation = monitor.present(&BatteryStatus::NOT_FOUND);

        let app = Self {
            monitor,
            config,
            presentation,
            status,
            last_poll: None,
            in_flight: false,
        };
        (app, IcedTask::done(Message::Refresh))
    }

    fn title(&self) -> String {
        self.presentation.tooltip.clone()
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(self.config.interval).map(|_| Message::PollTick)
    }

    fn update(&mut self, message: Message) -> IcedTask<Message> {
        match message {
            Message::PollTick | Message::Refresh => {
                // One cycle at a time; a tick during a slow cycle is dropped.
                if self.in_flight {
                    tracing::debug!("Poll already in flight, skipping");
                    return IcedTask::none();
                }
                self.in_flight = true;
                return IcedTask::perform(
                    poller::poll_with_timeout(
                        Arc::clone(&self.monitor),
                        self.config.exchange_timeout,
                    ),
                    Message::Polled,
                );
            }
            Message::Polled(presentation) => {
                self.in_flight = false;
                self.last_poll = Some(Instant::now());
                if presentation != self.presentation {
                    tracing::info!(
                        icon = presentation.icon_key,
                        tooltip = %presentation.tooltip,
                        "Battery display changed"
                    );
                }
                self.presentation = presentation;
                self.status = format!("Next poll in {}s", self.config.interval.as_secs());
            }
            Message::Quit => return iced::exit(),
        }
        IcedTask::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let indicator = match self.presentation.glyph() {
            Some(glyph) => battery_glyph(glyph),
            None => badge(self.presentation.state),
        };

        let last_poll = match self.last_poll {
            Some(at) => format!("Last poll: {}s ago", at.elapsed().as_secs()),
            None => "Last poll: never".to_string(),
        };

        let details = column![
            text(&self.presentation.tooltip).size(18),
            text(&self.status).size(13),
            text(last_poll).size(13),
            row![
                button("Refresh").on_press(Message::Refresh),
                button("Quit").on_press(Message::Quit),
            ]
            .spacing(12),
        ]
        .spacing(6);

        let content = row![indicator, details]
            .spacing(18)
            .align_y(Vertical::Center)
            .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn to_color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a as f32 / 255.0)
}

fn outline_style(_theme: &Theme) -> container::Style {
    container::Style {
        border: Border {
            color: Color::WHITE,
            width: GLYPH_OUTLINE as f32,
            radius: 3.0.into(),
        },
        ..container::Style::default()
    }
}

/// Outlined vertical battery filled from the bottom in the band color.
fn battery_glyph<'a>(glyph: BatteryGlyph) -> Element<'a, Message> {
    let rect = glyph.fill_rect(GLYPH_WIDTH, GLYPH_HEIGHT, GLYPH_OUTLINE);
    let fill = to_color(glyph.fill);

    let body = container(Space::new(
        Length::Fixed(rect.width as f32),
        Length::Fixed(rect.height as f32),
    ))
    .style(move |_theme: &Theme| container::Style {
        background: Some(Background::Color(fill)),
        ..container::Style::default()
    });

    container(body)
        .width(Length::Fixed(GLYPH_WIDTH as f32))
        .height(Length::Fixed(GLYPH_HEIGHT as f32))
        .padding(GLYPH_OUTLINE as f32)
        .align_y(Vertical::Bottom)
        .style(outline_style)
        .into()
}

/// Outlined box with a short label for states without a level.
fn badge<'a>(state: DisplayState) -> Element<'a, Message> {
    let label = match state {
        DisplayState::FullyCharged => "FULL",
        _ => "--",
    };

    container(text(label).size(12))
        .center_x(Length::Fixed(GLYPH_WIDTH as f32))
        .center_y(Length::Fixed(GLYPH_HEIGHT as f32))
        .style(outline_style)
        .into()
}
