//! The return & resampling engine.
//!
//! Leaf-first: normalize → returns → resample / savings → align. Every
//! function here is pure over immutable inputs.

pub mod align;
pub mod normalize;
pub mod resample;
pub mod returns;
pub mod savings;

pub use align::{align_assets, AlignInput, Alignment, AssetColumns, ColumnKind, ConsolidatedTable, TableRow};
pub use normalize::normalize;
pub use resample::{fuse, resample_monthly, resample_view, DailyView, MonthlyEntry, ResampledSeries};
pub use returns::{compute_returns, Anchor, ReturnPoint, ReturnSeries};
pub use savings::{
    accumulate_units, ContributionPoint, SavingsOutcome, SavingsPlan, UnitsPoint, UnitsSeries,
};
