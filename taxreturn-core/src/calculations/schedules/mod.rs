//! Form 1040 schedules: business profit, self-employment tax, pass-through
//! income and capital gains.

pub mod schedule_c;
pub mod schedule_d;
pub mod schedule_e;
pub mod schedule_se;

pub use schedule_c::{
    ScheduleCResult, calculate_schedule_c, regular_home_office_deduction,
    simplified_home_office_deduction,
};
pub use schedule_d::{CapitalGainSources, ScheduleDResult, calculate_schedule_d};
pub use schedule_e::{
    HoldingPeriod, K1Box, K1Destination, K1Entry, ScheduleEResult, calculate_schedule_e,
};
pub use schedule_se::{ScheduleSeResult, SeWorksheet, SeWorksheetConfig, SeWorksheetError};
