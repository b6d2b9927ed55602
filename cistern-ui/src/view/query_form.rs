//! Query form: collection, time range and query inputs plus history buttons.

use iced::widget::{Column, button, row, text, text_input};
use iced::{Alignment, Element, Length, Theme};

use cistern_common::format_instant;

use crate::container::ChartContainer;
use crate::message::Message;

/// Draft text of the form inputs.
///
/// Typing edits the draft only; a submit commits it to the container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryForm {
    pub collection: String,
    pub start: String,
    pub end: String,
    pub query: String,
}

impl QueryForm {
    /// Drafts mirroring the container's committed state.
    pub fn from_container(container: &ChartContainer) -> Self {
        let mut form = Self::default();
        form.sync(container);
        form
    }

    /// Reset every draft to the container's committed state.
    pub fn sync(&mut self, container: &ChartContainer) {
        self.collection = container.collection().to_string();
        self.start = format_instant(&container.start());
        self.end = format_instant(&container.end());
        self.query = container.query().to_string();
    }

    /// Reset only the date drafts, e.g. after the backend clamped the range.
    pub fn sync_range(&mut self, container: &ChartContainer) {
        self.start = format_instant(&container.start());
        self.end = format_instant(&container.end());
    }
}

/// Render the form.
pub fn query_form_view<'a>(form: &'a QueryForm, container: &'a ChartContainer) -> Element<'a, Message> {
    let history = container.history();

    let back_button = button(text("Back").size(14))
        .on_press_maybe(history.can_go_back().then_some(Message::HistoryBack))
        .style(iced::widget::button::secondary);

    let forward_button = button(text("Forward").size(14))
        .on_press_maybe(history.can_go_forward().then_some(Message::HistoryForward))
        .style(iced::widget::button::secondary);

    let collection_input = text_input("collection", &form.collection)
        .on_input(Message::CollectionEdited)
        .on_submit(Message::CollectionSubmitted)
        .padding(8)
        .width(Length::Fixed(200.0));

    let start_input = text_input("2024-01-01T00:00:00Z", &form.start)
        .on_input(Message::StartEdited)
        .on_submit(Message::StartSubmitted)
        .padding(8)
        .width(Length::Fixed(220.0));

    let end_input = text_input("2024-01-02T00:00:00Z", &form.end)
        .on_input(Message::EndEdited)
        .on_submit(Message::EndSubmitted)
        .padding(8)
        .width(Length::Fixed(220.0));

    let query_input = text_input("avg(cpu), max(mem) group by host", &form.query)
        .on_input(Message::QueryEdited)
        .on_submit(Message::QuerySubmitted)
        .padding(8)
        .width(Length::Fill);

    let range_row = row![
        back_button,
        forward_button,
        text("Collection").size(14),
        collection_input,
        text("Start").size(14),
        start_input,
        text("End").size(14),
        end_input,
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let query_row = row![text("Query").size(14), query_input]
        .spacing(10)
        .align_y(Alignment::Center);

    let mut content = Column::new().push(range_row).push(query_row).spacing(8);

    if let Some(error) = container.last_error() {
        let error_text = text(format!("Error: {}", error))
            .size(12)
            .style(|_theme: &Theme| text::Style {
                color: Some(iced::Color::from_rgb(0.8, 0.2, 0.2)),
            });
        content = content.push(error_text);
    }

    content.into()
}
