//! Dashboard view: query form, one chart per metric, summary and events.

use iced::widget::{Column, column, container, rule, scrollable, text};
use iced::{Element, Length, Theme};

use crate::container::ChartContainer;
use crate::message::Message;
use crate::view::chart::chart_view;
use crate::view::query_form::{QueryForm, query_form_view};
use crate::view::tables::{events_table, summary_table};

/// Render the whole dashboard.
pub fn dashboard_view<'a>(session: &'a ChartContainer, form: &'a QueryForm) -> Element<'a, Message> {
    let header = text("Cistern").size(24);
    let form = query_form_view(form, session);

    let mut body = Column::new().spacing(20);

    if session.charts().is_empty() {
        body = body.push(
            text("No time series for this query")
                .size(14)
                .style(|_theme: &Theme| text::Style {
                    color: Some(iced::Color::from_rgb(0.5, 0.5, 0.5)),
                }),
        );
    }

    let window = session.default_window();
    for chart in session.charts() {
        body = body.push(chart_view(chart, window));
    }

    if let Some(summary) = session.summary_rows().and_then(summary_table) {
        body = body.push(summary);
    }
    if let Some(events) = session.events().and_then(events_table) {
        body = body.push(events);
    }

    let content = column![header, form, rule::horizontal(1), scrollable(body)]
        .spacing(10)
        .padding(20);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
