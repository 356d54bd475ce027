use crate::config::CalendarSchema;

/// Semantic meaning of a calendar cell, resolved from its class attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Date,
    Time,
    Currency,
    Impact,
    Event,
    Actual,
    Forecast,
    Previous,
    Detail,
    Unknown,
}

/// One `<td>` as read off the page: its class attribute, its visible text,
/// and the class attribute of every child `<span>` in document order.
/// Impact cells carry their value in icon markup rather than text, which is
/// why the span classes come along.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub class_name: String,
    pub text: String,
    pub icon_classes: Vec<String>,
}

/// One table row, unclassified, in document order.
pub type RawRow = Vec<RawCell>;

/// Placeholder for a cell that is present on the row but renders no text
/// (e.g. the actual column before a figure is released). It keeps the cell
/// countable for row-shape decisions and is rewritten to a real empty
/// string when a record is emitted.
pub const EMPTY_SENTINEL: &str = "empty";

/// Fallback impact value when no icon class maps to a configured color.
pub const IMPACT_FALLBACK: &str = "impact";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCell {
    pub field: FieldKind,
    pub value: String,
}

/// Maps raw cells to classified cells through the static schema tables.
/// Pure lookup: no I/O, no logging, no state.
pub struct CellClassifier {
    schema: CalendarSchema,
}

impl CellClassifier {
    pub fn new(schema: CalendarSchema) -> Self {
        Self { schema }
    }

    /// `None` means the class is on the excluded list (graph/advertising
    /// cells) and is skipped before classification; a class in neither
    /// table classifies as `Unknown`, which `assemble_row` drops.
    pub fn classify(&self, cell: &RawCell) -> Option<ClassifiedCell> {
        let class_name = cell.class_name.trim();
        if self.schema.is_excluded(class_name) {
            return None;
        }
        let Some(field) = self.schema.field_for_class(class_name) else {
            return Some(ClassifiedCell {
                field: FieldKind::Unknown,
                value: String::new(),
            });
        };

        let value = if field == FieldKind::Impact {
            self.impact_color(cell)
        } else {
            let text = cell.text.trim();
            if text.is_empty() {
                EMPTY_SENTINEL.to_string()
            } else {
                text.to_string()
            }
        };

        Some(ClassifiedCell { field, value })
    }

    /// Every span class is mapped through the icon table and the last match
    /// wins — when a cell stacks several impact spans, the most specific
    /// icon is rendered last.
    fn impact_color(&self, cell: &RawCell) -> String {
        let mut color = None;
        for icon_class in &cell.icon_classes {
            if let Some(mapped) = self.schema.color_for_icon(icon_class.trim()) {
                color = Some(mapped);
            }
        }
        match color {
            Some(color) => color.to_string(),
            None => IMPACT_FALLBACK.to_string(),
        }
    }

    /// One raw row → its classified cells, document order preserved,
    /// excluded and unknown cells dropped. Row length is therefore the
    /// number of allowed cells present, not a fixed column count.
    pub fn assemble_row(&self, raw: &RawRow) -> Vec<ClassifiedCell> {
        raw.iter()
            .filter_map(|cell| self.classify(cell))
            .filter(|cell| cell.field != FieldKind::Unknown)
            .collect()
    }
}
