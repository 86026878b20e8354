use ratatui::Frame;

use crate::{
    ui::{
        render_intro, render_question_review,
        results::{render_results, render_review},
    },
    App, AppState,
};

/// A UI Screen boundary: renders one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct IntroScreen;

impl Screen for IntroScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_intro(app, f);
    }
}

/// Question screen - renders through the App widget
pub struct ExamScreen;

impl Screen for ExamScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_results(app, f);
    }
}

pub struct ReviewScreen;

impl Screen for ReviewScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_review(app, f);
    }
}

pub struct QuestionReviewScreen;

impl Screen for QuestionReviewScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_question_review(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Intro => Box::new(IntroScreen),
        AppState::Exam => Box::new(ExamScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Review => Box::new(ReviewScreen),
        AppState::QuestionReview => Box::new(QuestionReviewScreen),
    }
}
