use ratatui::Frame;

use crate::{ui::analytics::render_analytics, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Session screen - renders the timer UI using the App widget
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Analytics screen - uses dedicated renderer
pub struct AnalyticsScreen;

impl Screen for AnalyticsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_analytics(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Session => Box::new(SessionScreen),
        AppState::Analytics => Box::new(AnalyticsScreen),
    }
}
