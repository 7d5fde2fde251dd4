pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, import_report, info, section, success, summary_row, warn};
pub use table::{course_table, instructor_table, offering_table, stats_table};
pub use theme::{init_theme, theme, ColorMode, Theme};
