//! Cistern Iced application.

use chrono::Utc;
use iced::{Element, Task, Theme};

use cistern_common::ChartConfig;

use crate::backend::Backend;
use crate::container::{ChartContainer, QueryRequest};
use crate::location::Location;
use crate::message::Message;
use crate::view::dashboard::dashboard_view;
use crate::view::query_form::QueryForm;

/// The main Cistern dashboard application.
pub struct CisternUi {
    /// Query session state.
    container: ChartContainer,
    /// Where queries are sent.
    backend: Backend,
    /// Draft text of the form inputs.
    form: QueryForm,
}

impl CisternUi {
    /// Boot the application and issue the first query.
    pub fn boot(backend: Backend, chart: ChartConfig, location: Location) -> (Self, Task<Message>) {
        tracing::info!(backend = %backend.describe(), location = %location, "Booting dashboard");

        let (container, request) = ChartContainer::new(chart, location, Utc::now());
        let form = QueryForm::from_container(&container);

        let app = Self {
            container,
            backend,
            form,
        };
        let task = app.perform(request);

        (app, task)
    }

    /// Get the window title.
    pub fn title(&self) -> String {
        match self.container.collection() {
            "" => "Cistern".to_string(),
            collection => format!("Cistern - {}", collection),
        }
    }

    /// Handle incoming messages.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryCompleted(generation, Ok(response)) => {
                if self.container.apply_response(generation, response) {
                    // The backend may have clamped the range
                    self.form.sync_range(&self.container);
                }
            }

            Message::QueryCompleted(generation, Err(error)) => {
                self.container.apply_failure(generation, error);
            }

            Message::RangeSelected(start, end) => {
                let request = self.container.on_range_selected(start, end);
                self.form.sync_range(&self.container);
                return self.perform(request);
            }

            Message::CollectionEdited(collection) => {
                self.form.collection = collection;
            }

            Message::CollectionSubmitted => {
                let request = self.container.set_collection(self.form.collection.clone());
                return self.perform(request);
            }

            Message::StartEdited(start) => {
                self.form.start = start;
            }

            Message::StartSubmitted => {
                if let Some(request) = self.container.set_start(&self.form.start) {
                    self.form.sync_range(&self.container);
                    return self.perform(request);
                }
            }

            Message::EndEdited(end) => {
                self.form.end = end;
            }

            Message::EndSubmitted => {
                if let Some(request) = self.container.set_end(&self.form.end) {
                    self.form.sync_range(&self.container);
                    return self.perform(request);
                }
            }

            Message::QueryEdited(query) => {
                self.form.query = query;
            }

            Message::QuerySubmitted => {
                let request = self.container.set_query(self.form.query.clone());
                return self.perform(request);
            }

            Message::HistoryBack => {
                if let Some(request) = self.container.history_back(Utc::now()) {
                    self.form.sync(&self.container);
                    return self.perform(request);
                }
            }

            Message::HistoryForward => {
                if let Some(request) = self.container.history_forward(Utc::now()) {
                    self.form.sync(&self.container);
                    return self.perform(request);
                }
            }
        }

        Task::none()
    }

    /// Render the view.
    pub fn view(&self) -> Element<'_, Message> {
        dashboard_view(&self.container, &self.form)
    }

    /// Get the application theme.
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn container(&self) -> &ChartContainer {
        &self.container
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    /// Run a request on the backend, reporting back under its generation.
    fn perform(&self, request: QueryRequest) -> Task<Message> {
        let backend = self.backend.clone();
        let generation = request.generation;

        Task::perform(
            async move { backend.query(request).await.map_err(|e| e.to_string()) },
            move |result| Message::QueryCompleted(generation, result),
        )
    }
}
