pub mod compare;
pub mod decode;
pub mod encode;
pub mod error;
pub mod model;
pub mod schema;

pub use compare::{ComparisonResult, ItemDifference, compare};
pub use decode::{decode, decode_with_metadata};
pub use encode::{EncodedPeriods, encode, encode_periods};
pub use error::{CompareError, ScheduleError};
pub use model::{
    DaySchedule, Metadata, Occurrence, OverrideStatus, ScheduleDocument, SpecialDateOverride,
    TimeSlot, WeeklyPeriodKind, Weekday,
};
