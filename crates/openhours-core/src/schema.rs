//! Arrow view of a schedule: one row per (period, day or date, slot).
//!
//! Closed items and open items without hours get a single row with null
//! `start`/`end`. Unsourced days and overrides produce no rows.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, ListBuilder, StringBuilder, UInt8Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::ScheduleError;
use crate::model::{
    PUBLIC_HOLIDAY_TOKEN, ScheduleDocument, SpecialPeriodKind, TimeSlot, WeeklyPeriodKind,
};

pub fn slot_rows_schema() -> Schema {
    Schema::new(vec![
        Field::new("period", DataType::Utf8, false),
        Field::new("key", DataType::Utf8, false),
        Field::new("open", DataType::Boolean, false),
        Field::new("start", DataType::Utf8, true),
        Field::new("end", DataType::Utf8, true),
        Field::new(
            "occurrence",
            DataType::List(Arc::new(Field::new("item", DataType::UInt8, true))),
            true,
        ),
    ])
}

/// Flatten `doc` into a [`RecordBatch`] with [`slot_rows_schema`].
pub fn to_record_batch(doc: &ScheduleDocument) -> Result<RecordBatch, ScheduleError> {
    let mut rows = SlotRows::default();

    for kind in WeeklyPeriodKind::ALL {
        let period = doc.periods.weekly(kind);
        if !period.source_found {
            continue;
        }
        for (day, schedule) in period.days.iter() {
            if schedule.source_found() {
                rows.push_item(kind.as_str(), day.as_str(), schedule.is_open(), schedule.slots());
            }
        }
    }

    for kind in SpecialPeriodKind::ALL {
        let period = doc.periods.special(kind);
        let mut dated = false;
        for (date, entry) in period.sourced_overrides() {
            dated = true;
            rows.push_item(kind.as_str(), date, entry.status.is_open(), entry.status.slots());
        }
        if !dated && let Some(mode) = period.sourced_mode() {
            rows.push_item(kind.as_str(), PUBLIC_HOLIDAY_TOKEN, mode.is_open(), mode.slots());
        }
    }

    rows.finish()
}

struct SlotRows {
    period: StringBuilder,
    key: StringBuilder,
    open: BooleanBuilder,
    start: StringBuilder,
    end: StringBuilder,
    occurrence: ListBuilder<UInt8Builder>,
}

impl Default for SlotRows {
    fn default() -> Self {
        Self {
            period: StringBuilder::new(),
            key: StringBuilder::new(),
            open: BooleanBuilder::new(),
            start: StringBuilder::new(),
            end: StringBuilder::new(),
            occurrence: ListBuilder::new(UInt8Builder::new()),
        }
    }
}

impl SlotRows {
    fn push_item(&mut self, period: &str, key: &str, open: bool, slots: &[TimeSlot]) {
        if slots.is_empty() {
            self.push_row(period, key, open, None);
        }
        for slot in slots {
            self.push_row(period, key, open, Some(slot));
        }
    }

    fn push_row(&mut self, period: &str, key: &str, open: bool, slot: Option<&TimeSlot>) {
        self.period.append_value(period);
        self.key.append_value(key);
        self.open.append_value(open);
        match slot {
            Some(slot) => {
                self.start.append_value(slot.start.to_string());
                self.end.append_value(slot.end.to_string());
            }
            None => {
                self.start.append_null();
                self.end.append_null();
            }
        }
        match slot.and_then(|s| s.occurrence.as_ref()) {
            Some(occurrence) => {
                for &ordinal in occurrence.ordinals() {
                    self.occurrence.values().append_value(ordinal);
                }
                self.occurrence.append(true);
            }
            None => self.occurrence.append(false),
        }
    }

    fn finish(mut self) -> Result<RecordBatch, ScheduleError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.period.finish()),
            Arc::new(self.key.finish()),
            Arc::new(self.open.finish()),
            Arc::new(self.start.finish()),
            Arc::new(self.end.finish()),
            Arc::new(self.occurrence.finish()),
        ];
        Ok(RecordBatch::try_new(Arc::new(slot_rows_schema()), columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use arrow::array::{Array, BooleanArray, ListArray, StringArray};

    fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
        let column = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        column.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn schema_has_expected_fields() {
        let schema = slot_rows_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name("occurrence").is_ok());
        assert!(!schema.field_with_name("period").unwrap().is_nullable());
    }

    #[test]
    fn one_row_per_slot() {
        let doc = decode("Mo 08:00-12:00,14:00-18:00; Tu off");
        let batch = to_record_batch(&doc).unwrap();

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(
            strings(&batch, "key"),
            [
                Some("monday".to_string()),
                Some("monday".to_string()),
                Some("tuesday".to_string())
            ]
        );
        assert_eq!(
            strings(&batch, "start"),
            [Some("08:00".to_string()), Some("14:00".to_string()), None]
        );

        let open = batch
            .column_by_name("open")
            .unwrap()
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(open.value(0));
        assert!(!open.value(2));
    }

    #[test]
    fn occurrence_column() {
        let doc = decode("We[1,3] 10:00-12:00; Th 10:00-12:00");
        let batch = to_record_batch(&doc).unwrap();
        let occurrence = batch
            .column_by_name("occurrence")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();

        assert!(occurrence.is_valid(0));
        assert_eq!(occurrence.value(0).len(), 2);
        assert!(occurrence.is_null(1));
    }

    #[test]
    fn holiday_rows() {
        let doc = decode("Mo 09:00-12:00; PH off; 2025 Dec 24 09:00-12:00");
        let batch = to_record_batch(&doc).unwrap();

        // Dated entries hide the blanket mode.
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(strings(&batch, "period")[1].as_deref(), Some("public_holidays"));
        assert_eq!(strings(&batch, "key")[1].as_deref(), Some("2025-12-24"));

        let doc = decode("Mo 09:00-12:00; PH off");
        let batch = to_record_batch(&doc).unwrap();
        assert_eq!(strings(&batch, "key")[1].as_deref(), Some("PH"));
    }

    #[test]
    fn empty_document_gives_empty_batch() {
        let batch = to_record_batch(&ScheduleDocument::default()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 6);
    }
}
