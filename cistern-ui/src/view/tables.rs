//! Summary and event tables.

use iced::widget::{Column, Row, column, container, rule, text};
use iced::{Element, Length, Theme};

use cistern_common::{EVENT_ID_COLUMN, GROUP_ID_COLUMN, Row as DataRow};

use crate::message::Message;
use crate::view::color::color_for;
use crate::view::formatting::format_cell;

const CELL_WIDTH: f32 = 160.0;

/// Columns of a table, taken from the first row in key order.
pub fn table_columns(rows: &[DataRow], hidden: &[&str]) -> Vec<String> {
    rows.first()
        .map(|row| {
            row.keys()
                .filter(|key| !hidden.contains(&key.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Header label of a column.
pub fn column_label(column: &str) -> &str {
    if column == GROUP_ID_COLUMN {
        "Group"
    } else {
        column
    }
}

/// Render the summary table, or nothing when there are no rows.
pub fn summary_table(rows: &[DataRow]) -> Option<Element<'_, Message>> {
    table("Summary", rows, &[])
}

/// Render the event table, or nothing when there are no rows.
///
/// Event ids are internal and not shown.
pub fn events_table(rows: &[DataRow]) -> Option<Element<'_, Message>> {
    table("Events", rows, &[EVENT_ID_COLUMN])
}

fn table<'a>(title: &'a str, rows: &'a [DataRow], hidden: &[&str]) -> Option<Element<'a, Message>> {
    if rows.is_empty() {
        return None;
    }

    let columns = table_columns(rows, hidden);

    let header = columns.iter().fold(Row::new().spacing(8), |header, name| {
        header.push(
            text(column_label(name).to_string())
                .size(13)
                .width(Length::Fixed(CELL_WIDTH)),
        )
    });

    let body = rows.iter().fold(Column::new().spacing(4), |body, data_row| {
        let cells = columns.iter().fold(Row::new().spacing(8), |cells, name| {
            let value = data_row.get(name).map(format_cell).unwrap_or_default();
            let cell = text(value.clone()).size(12).width(Length::Fixed(CELL_WIDTH));

            if name == GROUP_ID_COLUMN {
                let color = color_for(&value).to_color();
                cells.push(cell.style(move |_theme: &Theme| text::Style { color: Some(color) }))
            } else {
                cells.push(cell)
            }
        });
        body.push(cells)
    });

    let content = column![text(title).size(16), header, rule::horizontal(1), body].spacing(6);

    Some(container(content).width(Length::Fill).into())
}
