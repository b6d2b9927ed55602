//! Canvas program drawing one chart and handling its pointer gestures.

use chrono::{Duration, Utc};
use iced::alignment::Horizontal;
use iced::mouse;
use iced::widget::canvas::{self, Canvas, Frame, Geometry, Path, Stroke, Text};
use iced::widget::{column, text};
use iced::{Color, Element, Length, Point, Rectangle, Renderer, Size, Theme};

use super::ChartState;
use super::brush::Brush;
use super::scale::{ChartLayout, TIME_TICKS, VALUE_TICKS};
use super::tooltip::tooltip_entries;
use crate::message::Message;
use crate::view::color::color_for;
use crate::view::formatting::{format_hover_instant, format_si, format_time_tick};

const LABEL_SIZE: f32 = 11.0;
const TOOLTIP_LINE_HEIGHT: f32 = 16.0;
const TOOLTIP_PADDING: f32 = 6.0;
const TOOLTIP_WIDTH: f32 = 170.0;

/// Build the titled chart element.
pub fn chart_view(state: &ChartState, default_window: Duration) -> Element<'_, Message> {
    column![
        text(state.name()).size(14),
        Canvas::new(ChartView::new(state, default_window))
            .width(Length::Fill)
            .height(Length::Fixed(state.height())),
    ]
    .spacing(4)
    .into()
}

/// Canvas program for one chart.
pub struct ChartView<'a> {
    state: &'a ChartState,
    default_window: Duration,
}

impl<'a> ChartView<'a> {
    pub fn new(state: &'a ChartState, default_window: Duration) -> Self {
        Self {
            state,
            default_window,
        }
    }
}

/// Per-chart pointer state.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// Hovered position, relative to the canvas.
    hover: Option<Point>,
    brush: Brush,
    /// Canvas size seen by the last event, to detect resizes.
    last_size: Option<Size>,
}

impl ChartInteraction {
    pub fn hover(&self) -> Option<Point> {
        self.hover
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }
}

impl<'a> canvas::Program<Message> for ChartView<'a> {
    type State = ChartInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let size = bounds.size();
        if interaction.last_size != Some(size) {
            // Only this chart's geometry depends on its size
            interaction.last_size = Some(size);
            self.state.cache().clear();
        }

        match event {
            canvas::Event::Mouse(mouse_event) => {
                self.handle_mouse(interaction, mouse_event, bounds, cursor)
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        interaction: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let layout = ChartLayout::new(self.state, bounds.size());

        let lines = self.state.cache().draw(renderer, bounds.size(), |frame| {
            self.draw_axes(frame, &layout, theme);
            self.draw_series(frame, &layout);
        });

        let mut overlay = Frame::new(renderer, bounds.size());
        self.draw_brush(&mut overlay, &layout, &interaction.brush, theme);
        if let Some(hover) = interaction.hover {
            self.draw_tooltip(&mut overlay, &layout, hover, theme);
        }

        vec![lines, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if interaction.brush.is_dragging() {
            return mouse::Interaction::Crosshair;
        }

        let layout = ChartLayout::new(self.state, bounds.size());
        match cursor.position_in(bounds) {
            Some(position) if layout.contains(position) => mouse::Interaction::Crosshair,
            _ => mouse::Interaction::default(),
        }
    }
}

impl<'a> ChartView<'a> {
    fn handle_mouse(
        &self,
        interaction: &mut ChartInteraction,
        event: &mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let layout = ChartLayout::new(self.state, bounds.size());

        match event {
            mouse::Event::CursorMoved { .. } => {
                let position = cursor.position_in(bounds);
                interaction.hover = position.filter(|p| layout.contains(*p));

                if interaction.brush.is_dragging() {
                    if let Some(position) = cursor.position_from(bounds.position()) {
                        interaction.brush.drag(position.x);
                    }
                }
                Some(canvas::Action::request_redraw())
            }
            mouse::Event::CursorLeft => {
                interaction.hover = None;
                Some(canvas::Action::request_redraw())
            }
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                let position = cursor.position_in(bounds)?;
                if !layout.contains(position) {
                    return None;
                }

                interaction.brush.begin(position.x, layout.brush_extent());
                Some(canvas::Action::request_redraw().and_capture())
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                let (start, end) =
                    interaction
                        .brush
                        .finish(&layout.x, Utc::now(), self.default_window)?;

                tracing::debug!(chart = self.state.name(), %start, %end, "Range selected");
                Some(canvas::Action::publish(self.state.range_selected(start, end)).and_capture())
            }
            _ => None,
        }
    }

    fn draw_axes(&self, frame: &mut Frame, layout: &ChartLayout, theme: &Theme) {
        let palette = theme.extended_palette();
        let axis_color = palette.background.strong.color;
        let label_color = palette.background.base.text;

        let left = layout.plot_left();
        let right = layout.plot_right();
        let bottom = layout.plot_bottom();

        if right <= left || bottom <= 0.0 {
            return;
        }

        let axis = Stroke::default().with_color(axis_color).with_width(1.0);
        frame.stroke(
            &Path::line(Point::new(left, bottom), Point::new(right, bottom)),
            axis.clone(),
        );
        frame.stroke(
            &Path::line(Point::new(left, 0.0), Point::new(left, bottom)),
            axis.clone(),
        );

        // Time axis
        let interval = layout.x.tick_interval(TIME_TICKS).unwrap_or_default();
        for tick in layout.x.ticks(TIME_TICKS) {
            let x = layout.x.project(tick);
            frame.stroke(
                &Path::line(Point::new(x, bottom), Point::new(x, bottom + 5.0)),
                axis.clone(),
            );
            frame.fill_text(Text {
                content: format_time_tick(&tick, interval),
                position: Point::new(x, bottom + 8.0),
                color: label_color,
                size: LABEL_SIZE.into(),
                align_x: Horizontal::Center.into(),
                ..Text::default()
            });
        }

        // Value axis
        for tick in layout.y.ticks(VALUE_TICKS) {
            let y = layout.y.project(tick);
            frame.stroke(
                &Path::line(Point::new(left - 5.0, y), Point::new(left, y)),
                axis.clone(),
            );
            frame.fill_text(Text {
                content: format_si(tick, 1),
                position: Point::new(left - 8.0, y - LABEL_SIZE / 2.0),
                color: label_color,
                size: LABEL_SIZE.into(),
                align_x: Horizontal::Right.into(),
                ..Text::default()
            });
        }
    }

    fn draw_series(&self, frame: &mut Frame, layout: &ChartLayout) {
        for (group_id, points) in self.state.series_by_group() {
            if points.len() < 2 {
                continue;
            }

            let mut builder = canvas::path::Builder::new();
            let mut projected = points.iter().map(|point| layout.project(point));
            if let Some(first) = projected.next() {
                builder.move_to(first);
            }
            for point in projected {
                builder.line_to(point);
            }

            frame.stroke(
                &builder.build(),
                Stroke::default()
                    .with_color(color_for(group_id).to_color())
                    .with_width(1.5),
            );
        }
    }

    fn draw_brush(&self, frame: &mut Frame, layout: &ChartLayout, brush: &Brush, theme: &Theme) {
        let Some((lo, hi)) = brush.selection() else {
            return;
        };

        let mut fill = theme.extended_palette().primary.weak.color;
        fill.a = 0.3;

        let selection = Path::rectangle(
            Point::new(lo, 0.0),
            Size::new((hi - lo).max(1.0), layout.plot_bottom()),
        );
        frame.fill(&selection, fill);
    }

    fn draw_tooltip(&self, frame: &mut Frame, layout: &ChartLayout, hover: Point, theme: &Theme) {
        let palette = theme.extended_palette();
        let bottom = layout.plot_bottom();

        frame.stroke(
            &Path::line(Point::new(hover.x, 0.0), Point::new(hover.x, bottom)),
            Stroke::default()
                .with_color(palette.background.strong.text)
                .with_width(1.0),
        );

        let instant = layout.x.invert(hover.x);
        let entries = tooltip_entries(self.state.series_by_group(), instant);

        let height = TOOLTIP_PADDING * 2.0 + TOOLTIP_LINE_HEIGHT * (entries.len() + 1) as f32;
        // Flip to the left of the guideline near the right edge
        let x = if hover.x + 10.0 + TOOLTIP_WIDTH > layout.size.width {
            hover.x - 10.0 - TOOLTIP_WIDTH
        } else {
            hover.x + 10.0
        };
        let y = hover.y.min((layout.size.height - height).max(0.0));

        let mut background = palette.background.weak.color;
        background.a = 0.9;
        frame.fill(
            &Path::rectangle(Point::new(x, y), Size::new(TOOLTIP_WIDTH, height)),
            background,
        );

        let mut line_y = y + TOOLTIP_PADDING;
        frame.fill_text(Text {
            content: format_hover_instant(&instant),
            position: Point::new(x + TOOLTIP_PADDING, line_y),
            color: palette.background.weak.text,
            size: LABEL_SIZE.into(),
            ..Text::default()
        });

        for entry in entries {
            line_y += TOOLTIP_LINE_HEIGHT;
            let color: Color = entry.color.into();
            frame.fill_text(Text {
                content: format!("{}: {}", entry.group_id, format_si(entry.value, 4)),
                position: Point::new(x + TOOLTIP_PADDING, line_y),
                color,
                size: LABEL_SIZE.into(),
                ..Text::default()
            });
        }
    }
}
