//! Domain types shared by the stores, services and HTTP handlers.

pub mod coverage;
pub mod zone;

pub use coverage::{
    DayRecord, DayRecordBundle, EntryPatch, NewSnapshot, PeriodRecord, RawRow, Snapshot,
    ZoneEntry, ZoneEntryInput,
};
pub use zone::{SeriesWindow, SeriesWindowKind, ZoneKind, ZoneProfile};
